// src/mapper/mod.rs

//! Pure transformations from raw upstream records into canonical
//! domain records.
//!
//! Nothing here performs I/O; records are expected to have passed
//! `services::validation` first.

mod lessons;
mod modules;
mod orgs;
mod venues;

pub use lessons::map_timetable_lessons;
pub use modules::{
    combine_modules, map_exam_info, map_module_info, module_condensed, module_information,
};
pub use orgs::{
    DepartmentCodeMap, FacultyCodeMap, build_department_code_map, build_faculty_code_map,
    map_faculty_departments, resolve_org_names,
};
pub use venues::{extract_venue_availability, merge_venue_availability};
