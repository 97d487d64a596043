// src/services/mod.rs

//! Network access and record validation.
//!
//! - `api`: concurrency-limited client for the registry API
//! - `stream`: incremental parsing of very large array responses
//! - `validation`: schema checks for raw records

pub mod api;
pub mod stream;
pub mod validation;

pub use api::{ApiClient, EndpointFamily, parse_module_code};
pub use stream::{ItemStream, LessonStream};
pub use validation::{
    Validation, Violation, parse_semester, validate_exam, validate_lesson, validate_semester,
};
