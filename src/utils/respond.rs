// src/utils/respond.rs

use axum::Json;
use serde::Serialize;

/// Success envelope: `{ "success": true, "data": ... }`.
/// Failures are produced by `AppError::into_response`.
#[derive(Debug, Serialize)]
pub struct ApiOk<T> {
    pub success: bool,
    pub data: T,
}

pub fn ok<T: Serialize>(data: T) -> Json<ApiOk<T>> {
    Json(ApiOk {
        success: true,
        data,
    })
}
