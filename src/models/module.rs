// src/models/module.rs

//! Canonical module records produced by the mapper.
//!
//! Field names serialize in PascalCase because that is the shape the
//! downstream consumers (site data files, search index) expect.

use serde::{Deserialize, Serialize};

/// Semester number. 1 and 2 are the regular semesters, 3 and 4 the
/// special terms.
pub type Semester = u8;

/// Canonical module record for a single term.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SemesterModule {
    pub acad_year: String,

    pub module_code: String,

    pub module_title: String,

    pub department: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_credit: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub workload: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub prerequisite: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub corequisite: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub preclusion: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Exam date and duration for one module in one semester.
///
/// Absence of an exam is valid and represented by omitting the whole
/// record, not by an empty one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExamInfo {
    /// Absolute exam start in ISO 8601 with the +08:00 offset preserved
    pub exam_date: String,

    /// Exam length in minutes
    pub exam_duration: u32,
}

/// One recurring lesson slot, collapsed from its per-week occurrences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawLesson {
    pub class_no: String,

    pub start_time: String,

    pub end_time: String,

    /// Inferred recurrence: "Every Week", "Odd Weeks", "Even Weeks" or a
    /// comma-joined sorted week list
    pub week_text: String,

    /// Empty string when the lesson has no venue
    pub venue: String,

    pub day_text: String,

    pub lesson_type: String,
}

/// Timetable plus exam info for one module in one semester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SemesterData {
    pub semester: Semester,

    pub timetable: Vec<RawLesson>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exam_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exam_duration: Option<u32>,
}

impl SemesterData {
    /// Combine a timetable with optional exam info for a semester.
    pub fn new(semester: Semester, timetable: Vec<RawLesson>, exam: Option<ExamInfo>) -> Self {
        let (exam_date, exam_duration) = match exam {
            Some(exam) => (Some(exam.exam_date), Some(exam.exam_duration)),
            None => (None, None),
        };

        Self {
            semester,
            timetable,
            exam_date,
            exam_duration,
        }
    }
}

/// A module's data for one term, keyed by module code for merging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SemesterModuleData {
    pub module_code: String,

    pub module: SemesterModule,

    pub semester_data: SemesterData,
}

/// A module merged across every term it was offered in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Module {
    #[serde(flatten)]
    pub info: SemesterModule,

    /// Per-semester data in ingestion order
    pub history: Vec<SemesterData>,
}

/// Minimal projection for the searchable module list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModuleCondensed {
    pub module_code: String,

    pub module_title: String,

    pub semesters: Vec<Semester>,
}

/// Per-semester exam summary used in the module finder projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SemesterExam {
    pub semester: Semester,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exam_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exam_duration: Option<u32>,
}

/// Projection of a merged module for the module finder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModuleInformation {
    pub module_code: String,

    pub module_title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_credit: Option<String>,

    pub department: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub workload: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub prerequisite: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub preclusion: Option<String>,

    pub history: Vec<SemesterExam>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semester_module_serializes_pascal_case() {
        let module = SemesterModule {
            acad_year: "2018/2019".to_string(),
            module_code: "CS1010".to_string(),
            module_title: "Programming Methodology".to_string(),
            department: "Computer Science".to_string(),
            ..SemesterModule::default()
        };

        let json = serde_json::to_value(&module).unwrap();
        assert_eq!(json["AcadYear"], "2018/2019");
        assert_eq!(json["ModuleCode"], "CS1010");
        // Absent free-text fields are omitted entirely
        assert!(json.get("Prerequisite").is_none());
    }

    #[test]
    fn test_merged_module_flattens_info() {
        let module = Module {
            info: SemesterModule {
                module_code: "ACC1006".to_string(),
                ..SemesterModule::default()
            },
            history: vec![SemesterData::new(1, Vec::new(), None)],
        };

        let json = serde_json::to_value(&module).unwrap();
        assert_eq!(json["ModuleCode"], "ACC1006");
        assert_eq!(json["History"][0]["Semester"], 1);
    }

    #[test]
    fn test_semester_data_from_exam() {
        let data = SemesterData::new(
            2,
            Vec::new(),
            Some(ExamInfo {
                exam_date: "2019-05-08T09:00:00.000+08:00".to_string(),
                exam_duration: 120,
            }),
        );
        assert_eq!(data.exam_duration, Some(120));

        let no_exam = SemesterData::new(2, Vec::new(), None);
        assert!(no_exam.exam_date.is_none());
    }
}
