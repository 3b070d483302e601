// src/repo/mod.rs
//
// Statically-typed query layer: one module per entity, one function per
// query shape the handlers actually use. Write paths that must be atomic
// take `&mut PgConnection` so callers run them inside one transaction.

pub mod answers;
pub mod attempts;
pub mod exams;
pub mod profiles;
pub mod questions;
pub mod users;
