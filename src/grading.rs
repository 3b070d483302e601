// src/grading.rs

use std::collections::HashMap;

use crate::models::question::QuestionWithOptions;

/// The graded outcome for one question.
#[derive(Debug, Clone)]
pub struct GradedAnswer {
    pub question_id: i64,
    pub selected_option_id: Option<i64>,
    pub correct_option_id: Option<i64>,
    pub is_correct: bool,
    pub marks_earned: i32,
}

/// The graded outcome for a whole attempt.
#[derive(Debug)]
pub struct GradeOutcome {
    pub total_score: i32,
    pub questions_correct: usize,
    /// One entry per question, in the order the questions were given.
    pub answers: Vec<GradedAnswer>,
}

/// Grades a submitted answer map against the question set.
///
/// Marks are all-or-nothing: the full question marks for selecting the
/// correct option, zero otherwise. A question absent from the map is a
/// null selection worth zero, never an error. A question whose option set
/// carries no correctness flag (broken authoring) can never be answered
/// correctly.
pub fn grade(questions: &[QuestionWithOptions], answers: &HashMap<i64, i64>) -> GradeOutcome {
    let mut total_score = 0;
    let mut questions_correct = 0;
    let mut graded = Vec::with_capacity(questions.len());

    for q in questions {
        let correct_option_id = q.options.iter().find(|o| o.is_correct).map(|o| o.id);
        let selected_option_id = answers.get(&q.question.id).copied();

        let is_correct = match (selected_option_id, correct_option_id) {
            (Some(sel), Some(correct)) => sel == correct,
            _ => false,
        };
        let marks_earned = if is_correct { q.question.marks } else { 0 };

        total_score += marks_earned;
        if is_correct {
            questions_correct += 1;
        }

        graded.push(GradedAnswer {
            question_id: q.question.id,
            selected_option_id,
            correct_option_id,
            is_correct,
            marks_earned,
        });
    }

    GradeOutcome {
        total_score,
        questions_correct,
        answers: graded,
    }
}

/// Absolute marks threshold required to pass, derived from the
/// percentage: ceil(pass_mark_percent / 100 * total_marks).
pub fn pass_mark(pass_mark_percent: i32, total_marks: i32) -> i32 {
    ((pass_mark_percent as f64 / 100.0) * total_marks as f64).ceil() as i32
}

/// Score as a rounded percentage of the exam total.
pub fn percentage(score: i32, total_marks: i32) -> i32 {
    if total_marks <= 0 {
        return 0;
    }
    ((score as f64 / total_marks as f64) * 100.0).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{AnswerOption, Question};

    fn option(id: i64, question_id: i64, is_correct: bool) -> AnswerOption {
        AnswerOption {
            id,
            question_id,
            label: "A".to_string(),
            text: format!("option {}", id),
            is_correct,
            display_order: 0,
            created_at: None,
        }
    }

    fn question(id: i64, marks: i32, correct_option: i64) -> QuestionWithOptions {
        QuestionWithOptions {
            question: Question {
                id,
                exam_id: 1,
                question_number: id as i32,
                prompt: format!("question {}", id),
                marks,
                explanation: None,
                is_active: true,
                created_at: None,
            },
            options: vec![
                option(correct_option, id, true),
                option(correct_option + 1, id, false),
            ],
        }
    }

    #[test]
    fn correct_selection_earns_full_marks() {
        let questions = vec![question(1, 2, 10)];
        let mut answers = HashMap::new();
        answers.insert(1, 10);

        let outcome = grade(&questions, &answers);
        assert_eq!(outcome.total_score, 2);
        assert_eq!(outcome.questions_correct, 1);
        assert!(outcome.answers[0].is_correct);
        assert_eq!(outcome.answers[0].marks_earned, 2);
    }

    #[test]
    fn wrong_selection_earns_zero() {
        let questions = vec![question(1, 2, 10)];
        let mut answers = HashMap::new();
        answers.insert(1, 11);

        let outcome = grade(&questions, &answers);
        assert_eq!(outcome.total_score, 0);
        assert!(!outcome.answers[0].is_correct);
        assert_eq!(outcome.answers[0].marks_earned, 0);
        assert_eq!(outcome.answers[0].selected_option_id, Some(11));
    }

    #[test]
    fn absent_selection_is_null_not_error() {
        let questions = vec![question(1, 2, 10)];
        let answers = HashMap::new();

        let outcome = grade(&questions, &answers);
        assert_eq!(outcome.answers.len(), 1);
        assert_eq!(outcome.answers[0].selected_option_id, None);
        assert!(!outcome.answers[0].is_correct);
        assert_eq!(outcome.answers[0].marks_earned, 0);
    }

    #[test]
    fn marks_are_all_or_nothing() {
        // 3 questions worth 1, 2, 5; the 5-mark one answered wrong.
        let questions = vec![question(1, 1, 10), question(2, 2, 20), question(3, 5, 30)];
        let mut answers = HashMap::new();
        answers.insert(1, 10);
        answers.insert(2, 20);
        answers.insert(3, 31);

        let outcome = grade(&questions, &answers);
        assert_eq!(outcome.total_score, 3);
        assert_eq!(outcome.questions_correct, 2);
        for a in &outcome.answers {
            let full = questions
                .iter()
                .find(|q| q.question.id == a.question_id)
                .unwrap()
                .question
                .marks;
            assert!(a.marks_earned == 0 || a.marks_earned == full);
        }
    }

    #[test]
    fn score_never_exceeds_total() {
        let questions = vec![question(1, 3, 10), question(2, 7, 20)];
        let mut answers = HashMap::new();
        answers.insert(1, 10);
        answers.insert(2, 20);

        let outcome = grade(&questions, &answers);
        let total: i32 = questions.iter().map(|q| q.question.marks).sum();
        assert_eq!(outcome.total_score, total);
    }

    #[test]
    fn unknown_question_ids_in_answers_are_ignored() {
        let questions = vec![question(1, 2, 10)];
        let mut answers = HashMap::new();
        answers.insert(99, 10);

        let outcome = grade(&questions, &answers);
        assert_eq!(outcome.total_score, 0);
        assert_eq!(outcome.answers.len(), 1);
    }

    #[test]
    fn question_without_correct_flag_never_scores() {
        let mut q = question(1, 2, 10);
        for o in &mut q.options {
            o.is_correct = false;
        }
        let mut answers = HashMap::new();
        answers.insert(1, 10);

        let outcome = grade(&[q], &answers);
        assert_eq!(outcome.total_score, 0);
        assert_eq!(outcome.answers[0].correct_option_id, None);
    }

    #[test]
    fn pass_mark_is_ceiling() {
        assert_eq!(pass_mark(60, 100), 60);
        assert_eq!(pass_mark(60, 50), 30);
        // 33% of 10 = 3.3 -> 4
        assert_eq!(pass_mark(33, 10), 4);
        assert_eq!(pass_mark(0, 100), 0);
        assert_eq!(pass_mark(100, 7), 7);
    }

    #[test]
    fn percentage_is_rounded() {
        assert_eq!(percentage(59, 100), 59);
        assert_eq!(percentage(60, 100), 60);
        // 1/3 = 33.33 -> 33; 2/3 = 66.67 -> 67
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn pass_boundary_is_inclusive() {
        // total_marks=100, pass_mark_percent=60 -> pass mark 60.
        let mark = pass_mark(60, 100);
        assert_eq!(mark, 60);
        assert!(59 < mark);
        assert!(60 >= mark);
        assert_eq!(percentage(59, 100), 59);
        assert_eq!(percentage(60, 100), 60);
    }
}
