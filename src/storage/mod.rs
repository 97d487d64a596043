// src/storage/mod.rs

//! Persistence: the TTL cache and the scraped-data output writer.
//!
//! ## Output Layout
//!
//! ```text
//! {root}/
//! └── 2018-2019/                  # one directory per academic year
//!     ├── cache/                  # TTL cache (one file per key)
//!     ├── facultyDepartments.json
//!     ├── moduleList.json
//!     ├── moduleInfo.json
//!     ├── modules/
//!     │   └── CS1010.json
//!     └── semesters/
//!         └── 1/
//!             ├── venues.json
//!             ├── venueInformation.json
//!             └── CS1010/
//!                 ├── timetable.json
//!                 └── semesterData.json
//! ```

mod cache;
mod writer;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    Module, ModuleCondensed, ModuleInformation, RawLesson, Semester, SemesterData,
    VenueAvailability,
};

// Re-export for convenience
pub use cache::{DEFAULT_EXPIRY, TtlCache};
pub use writer::FsWriter;

/// Destination for scraped data. Each method persists one JSON document;
/// path layout is the implementation's concern.
#[async_trait]
pub trait Persist: Send + Sync {
    /// Condensed module list for the search index.
    async fn module_list(&self, data: &[ModuleCondensed]) -> Result<()>;

    /// Partial module info for the module finder.
    async fn module_info(&self, data: &[ModuleInformation]) -> Result<()>;

    /// Faculty name to the names of its departments.
    async fn faculty_departments(&self, data: &BTreeMap<String, Vec<String>>) -> Result<()>;

    /// One module's full merged record.
    async fn module(&self, module: &Module) -> Result<()>;

    /// One module's timetable for one semester.
    async fn timetable(
        &self,
        semester: Semester,
        module_code: &str,
        timetable: &[RawLesson],
    ) -> Result<()>;

    /// One module's semester data (timetable + exam) for one semester.
    async fn semester_data(
        &self,
        semester: Semester,
        module_code: &str,
        data: &SemesterData,
    ) -> Result<()>;

    /// Names of all venues in use during one semester.
    async fn venues(&self, semester: Semester, venues: &[String]) -> Result<()>;

    /// Venue availability map for one semester.
    async fn venue_information(
        &self,
        semester: Semester,
        availability: &VenueAvailability,
    ) -> Result<()>;
}
