// src/models/mod.rs

//! Domain models for the scraper application.
//!
//! `api` holds the loose upstream record shapes, `module` and `venue`
//! the canonical records the mapper produces, and `config` the
//! application configuration.

pub mod api;
mod config;
mod module;
mod venue;

// Re-export all public types
pub use api::{
    AcademicGrp, AcademicOrg, BulkPage, Envelope, ModuleExam, ModuleInfo, ModuleInfoMapped,
    OrgRef, TimetableLesson,
};
pub use config::{ApiConfig, ApiKeys, AppConfig, Credentials, StorageConfig};
pub use module::{
    ExamInfo, Module, ModuleCondensed, ModuleInformation, RawLesson, Semester, SemesterData,
    SemesterExam, SemesterModule, SemesterModuleData,
};
pub use venue::{DayAvailability, OCCUPIED, VenueAvailability, VenueLesson};
