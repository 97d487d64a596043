// src/models/api.rs

//! Raw record shapes as returned by the upstream registry API.
//!
//! These are deliberately loose: fields the upstream is known to null out
//! or omit are `Option`s, and unknown extra fields are always tolerated.
//! Records must pass through `services::validation` before the mapper
//! trusts them.

use serde::{Deserialize, Serialize};

/// A faculty (academic group) as returned by `config/get-acadgroup`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcademicGrp {
    #[serde(rename = "AcademicGroup")]
    pub academic_group: String,

    #[serde(rename = "Description")]
    pub description: String,
}

/// A department (academic organisation) as returned by `config/get-acadorg`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcademicOrg {
    #[serde(rename = "AcademicOrganisation")]
    pub academic_organisation: String,

    #[serde(rename = "Description")]
    pub description: String,
}

/// Reference to an organisational unit inside a module record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrgRef {
    #[serde(rename = "Code", default)]
    pub code: String,
}

/// A module record as returned by the `module` endpoint.
///
/// The organisation fields hold codes which must be resolved to names via
/// the faculty/department code maps before mapping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleInfo {
    #[serde(rename = "Term")]
    pub term: String,

    #[serde(rename = "AcademicOrganisation")]
    pub academic_organisation: OrgRef,

    #[serde(rename = "AcademicGroup")]
    pub academic_group: OrgRef,

    #[serde(rename = "Subject")]
    pub subject: String,

    #[serde(rename = "CatalogNumber")]
    pub catalog_number: String,

    #[serde(rename = "CourseTitle")]
    pub course_title: String,

    #[serde(rename = "Description")]
    pub description: Option<String>,

    #[serde(rename = "ModularCredit")]
    pub modular_credit: Option<String>,

    #[serde(rename = "WorkLoadHours")]
    pub workload_hours: Option<String>,

    #[serde(rename = "PreRequisite")]
    pub prerequisite: Option<String>,

    #[serde(rename = "CoRequisite")]
    pub corequisite: Option<String>,

    #[serde(rename = "Preclusion")]
    pub preclusion: Option<String>,
}

impl ModuleInfo {
    /// Full module code, eg. "CS1010".
    pub fn module_code(&self) -> String {
        format!("{}{}", self.subject, self.catalog_number)
    }
}

/// A module record whose organisation codes have been resolved to names.
#[derive(Debug, Clone)]
pub struct ModuleInfoMapped {
    pub info: ModuleInfo,

    /// Department name resolved from the academic organisation code
    pub academic_organisation: String,

    /// Faculty name resolved from the academic group code
    pub academic_group: String,
}

/// An exam record as returned by the `examtt` endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleExam {
    pub term: Option<String>,
    pub module: Option<String>,
    pub exam_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub duration: Option<i64>,
    pub acad_org: Option<String>,
}

/// One scheduled class occurrence from the `classtt/withdate` endpoint.
///
/// The upstream emits one record per calendar occurrence; the mapper
/// groups these into recurring lessons.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimetableLesson {
    pub term: Option<String>,
    pub room: Option<String>,
    pub numweeks: Option<i64>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub activity: Option<String>,
    pub modgrp: Option<String>,
    pub csize: Option<i64>,
    pub module: Option<String>,
    pub eventdate: Option<String>,
    pub session: Option<String>,
    pub deptfac: Option<String>,
    pub day: Option<String>,
}

/// Legacy response wrapper carrying an application status code.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub msg: String,

    pub data: Option<T>,

    #[serde(default)]
    pub code: String,
}

/// One page of a paginated bulk response.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkPage<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,

    #[serde(rename = "itemCount", default)]
    pub item_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lesson_tolerates_unknown_and_missing_fields() {
        let lesson: TimetableLesson = serde_json::from_str(
            r#"{"module": "CS1010", "room": null, "someNewField": 42}"#,
        )
        .unwrap();
        assert_eq!(lesson.module.as_deref(), Some("CS1010"));
        assert!(lesson.room.is_none());
        assert!(lesson.day.is_none());
    }

    #[test]
    fn test_module_code_concatenation() {
        let info = ModuleInfo {
            subject: "CS".to_string(),
            catalog_number: "1010S".to_string(),
            ..ModuleInfo::default()
        };
        assert_eq!(info.module_code(), "CS1010S");
    }

    #[test]
    fn test_envelope_decoding() {
        let envelope: Envelope<Vec<String>> =
            serde_json::from_str(r#"{"msg": "ok", "data": ["a"], "code": "00000"}"#).unwrap();
        assert_eq!(envelope.code, "00000");
        assert_eq!(envelope.data.unwrap(), vec!["a".to_string()]);
    }

    #[test]
    fn test_bulk_page_decoding() {
        let page: BulkPage<i32> =
            serde_json::from_str(r#"{"data": [1, 2, 3], "itemCount": 2500}"#).unwrap();
        assert_eq!(page.data, vec![1, 2, 3]);
        assert_eq!(page.item_count, 2500);
    }
}
