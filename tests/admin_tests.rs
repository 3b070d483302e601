// tests/admin_tests.rs

use std::net::SocketAddr;

use examly::{config::Config, routes, state::AppState, utils::hash::hash_password};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

async fn spawn_app() -> String {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "admin_test_secret".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        admin_email: None,
        admin_password: None,
        sweep_interval_secs: 60,
        sweep_grace_secs: 60,
    };

    let state = AppState::new(pool, config);
    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    address
}

async fn test_pool() -> PgPool {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .unwrap()
}

/// Seeds an admin account directly and logs in through the API.
async fn admin_token(client: &reqwest::Client, address: &str, pool: &PgPool) -> String {
    let email = format!("adm_{}@test.example", &uuid::Uuid::new_v4().to_string()[..8]);
    let password = "admin-password-123";
    let hashed = hash_password(password).unwrap();

    sqlx::query("INSERT INTO users (email, password, role) VALUES ($1, $2, 'admin')")
        .bind(&email)
        .bind(&hashed)
        .execute(pool)
        .await
        .unwrap();

    let login: serde_json::Value = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "email": email, "password": password }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    login["data"]["token"].as_str().unwrap().to_string()
}

async fn student_token(client: &reqwest::Client, address: &str) -> String {
    let email = format!("stu_{}@test.example", &uuid::Uuid::new_v4().to_string()[..8]);
    client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "email": email,
            "password": "password123",
            "full_name": "Student"
        }))
        .send()
        .await
        .unwrap();

    let login: serde_json::Value = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "email": email, "password": "password123" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    login["data"]["token"].as_str().unwrap().to_string()
}

fn exam_payload(title: &str) -> serde_json::Value {
    serde_json::json!({
        "title": title,
        "description": "A test exam",
        "is_active": true,
        "duration_minutes": 30,
        "total_marks": 10,
        "pass_mark_percent": 60,
        "max_attempts": 3,
        "randomize_questions": false,
        "allow_review": true
    })
}

#[tokio::test]
async fn admin_routes_reject_students_and_anonymous() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/api/admin/exams", address))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);

    let token = student_token(&client, &address).await;
    let resp = client
        .get(format!("{}/api/admin/exams", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn exam_crud_roundtrip() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let pool = test_pool().await;
    let token = admin_token(&client, &address, &pool).await;

    // Create
    let title = format!("CRUD Exam {}", &uuid::Uuid::new_v4().to_string()[..8]);
    let resp = client
        .post(format!("{}/api/admin/exams", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&exam_payload(&title))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let created: serde_json::Value = resp.json().await.unwrap();
    let exam_id = created["data"]["id"].as_i64().unwrap();

    // Read
    let fetched: serde_json::Value = client
        .get(format!("{}/api/admin/exams/{}", address, exam_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["data"]["title"], title.as_str());
    assert_eq!(fetched["data"]["max_attempts"], 3);

    // Partial update
    let resp = client
        .put(format!("{}/api/admin/exams/{}", address, exam_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "is_active": false, "pass_mark_percent": 75 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let fetched: serde_json::Value = client
        .get(format!("{}/api/admin/exams/{}", address, exam_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["data"]["is_active"], false);
    assert_eq!(fetched["data"]["pass_mark_percent"], 75);
    assert_eq!(fetched["data"]["title"], title.as_str());

    // Delete
    let resp = client
        .delete(format!("{}/api/admin/exams/{}", address, exam_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    let resp = client
        .get(format!("{}/api/admin/exams/{}", address, exam_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn question_authoring_enforces_exactly_one_correct_option() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let pool = test_pool().await;
    let token = admin_token(&client, &address, &pool).await;

    let resp = client
        .post(format!("{}/api/admin/exams", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&exam_payload("Authoring Exam"))
        .send()
        .await
        .unwrap();
    let exam_id = resp.json::<serde_json::Value>().await.unwrap()["data"]["id"]
        .as_i64()
        .unwrap();

    let question = |correct_flags: &[bool]| {
        serde_json::json!({
            "question_number": 1,
            "prompt": "Which way is up?",
            "marks": 2,
            "options": correct_flags
                .iter()
                .enumerate()
                .map(|(i, c)| serde_json::json!({
                    "label": format!("{}", (b'A' + i as u8) as char),
                    "text": format!("choice {}", i),
                    "is_correct": c,
                }))
                .collect::<Vec<_>>(),
        })
    };

    // Zero correct options
    let resp = client
        .post(format!("{}/api/admin/exams/{}/questions", address, exam_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&question(&[false, false, false]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    // Two correct options
    let resp = client
        .post(format!("{}/api/admin/exams/{}/questions", address, exam_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&question(&[true, true, false]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    // Exactly one correct option
    let resp = client
        .post(format!("{}/api/admin/exams/{}/questions", address, exam_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&question(&[false, true, false]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let question_id = resp.json::<serde_json::Value>().await.unwrap()["data"]["id"]
        .as_i64()
        .unwrap();

    // Duplicate question number within the exam
    let resp = client
        .post(format!("{}/api/admin/exams/{}/questions", address, exam_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&question(&[true, false, false]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);

    // Admin listing shows correctness
    let listing: serde_json::Value = client
        .get(format!("{}/api/admin/exams/{}/questions", address, exam_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let questions = listing["data"].as_array().unwrap();
    assert_eq!(questions.len(), 1);
    let options = questions[0]["options"].as_array().unwrap();
    assert_eq!(options.len(), 3);
    let correct: Vec<_> = options.iter().filter(|o| o["is_correct"] == true).collect();
    assert_eq!(correct.len(), 1);

    // Replacing the option set keeps the invariant checked
    let resp = client
        .put(format!("{}/api/admin/questions/{}", address, question_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "options": [
                { "label": "A", "text": "new right", "is_correct": true },
                { "label": "B", "text": "new wrong", "is_correct": true },
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    let resp = client
        .put(format!("{}/api/admin/questions/{}", address, question_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "prompt": "Updated prompt",
            "options": [
                { "label": "A", "text": "new right", "is_correct": true },
                { "label": "B", "text": "new wrong", "is_correct": false },
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let listing: serde_json::Value = client
        .get(format!("{}/api/admin/exams/{}/questions", address, exam_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let question = &listing["data"].as_array().unwrap()[0];
    assert_eq!(question["prompt"], "Updated prompt");
    assert_eq!(question["options"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn question_prompt_is_sanitized() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let pool = test_pool().await;
    let token = admin_token(&client, &address, &pool).await;

    let resp = client
        .post(format!("{}/api/admin/exams", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&exam_payload("Sanitize Exam"))
        .send()
        .await
        .unwrap();
    let exam_id = resp.json::<serde_json::Value>().await.unwrap()["data"]["id"]
        .as_i64()
        .unwrap();

    let resp = client
        .post(format!("{}/api/admin/exams/{}/questions", address, exam_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "question_number": 1,
            "prompt": "<b>Bold</b><script>alert(1)</script>",
            "marks": 1,
            "options": [
                { "label": "A", "text": "yes", "is_correct": true },
                { "label": "B", "text": "no", "is_correct": false },
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);

    let listing: serde_json::Value = client
        .get(format!("{}/api/admin/exams/{}/questions", address, exam_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let prompt = listing["data"][0]["prompt"].as_str().unwrap();
    assert!(prompt.contains("<b>Bold</b>"));
    assert!(!prompt.contains("script"));
}

#[tokio::test]
async fn results_review_shows_graded_attempts() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let pool = test_pool().await;
    let admin = admin_token(&client, &address, &pool).await;

    // Author an exam with one question through the admin API.
    let resp = client
        .post(format!("{}/api/admin/exams", address))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&exam_payload("Results Exam"))
        .send()
        .await
        .unwrap();
    let exam_id = resp.json::<serde_json::Value>().await.unwrap()["data"]["id"]
        .as_i64()
        .unwrap();

    let resp = client
        .post(format!("{}/api/admin/exams/{}/questions", address, exam_id))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&serde_json::json!({
            "question_number": 1,
            "prompt": "2 + 2?",
            "marks": 10,
            "options": [
                { "label": "A", "text": "4", "is_correct": true },
                { "label": "B", "text": "5", "is_correct": false },
            ]
        }))
        .send()
        .await
        .unwrap();
    let question_id = resp.json::<serde_json::Value>().await.unwrap()["data"]["id"]
        .as_i64()
        .unwrap();

    let (correct_option,): (i64,) =
        sqlx::query_as("SELECT id FROM options WHERE question_id = $1 AND is_correct = TRUE")
            .bind(question_id)
            .fetch_one(&pool)
            .await
            .unwrap();

    // A student takes and submits the exam.
    let student = student_token(&client, &address).await;
    let start: serde_json::Value = client
        .post(format!("{}/api/start-exam", address))
        .header("Authorization", format!("Bearer {}", student))
        .json(&serde_json::json!({ "exam_id": exam_id }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let attempt_id = start["data"]["attempt"]["id"].as_i64().unwrap();

    client
        .post(format!("{}/api/submit-exam", address))
        .header("Authorization", format!("Bearer {}", student))
        .json(&serde_json::json!({
            "attempt_id": attempt_id,
            "answers": { question_id.to_string(): correct_option },
        }))
        .send()
        .await
        .unwrap();

    // The attempt shows up in the admin listing with account context.
    let listing: serde_json::Value = client
        .get(format!("{}/api/admin/results", address))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let row = listing["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["id"].as_i64() == Some(attempt_id))
        .expect("attempt missing from admin results");
    assert_eq!(row["exam_id"].as_i64(), Some(exam_id));
    assert_eq!(row["status"], "completed");
    assert_eq!(row["score"], 10);
    assert!(row["email"].as_str().unwrap().contains("@test.example"));

    // Detail view includes the graded answer rows.
    let detail: serde_json::Value = client
        .get(format!("{}/api/admin/results/{}", address, attempt_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let answers = detail["data"]["answers"].as_array().unwrap();
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0]["graded"], true);
    assert_eq!(answers[0]["is_correct"], true);
    assert_eq!(answers[0]["marks_earned"], 10);
}
