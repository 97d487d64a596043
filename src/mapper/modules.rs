// src/mapper/modules.rs

//! Mapping and merging of module records.

use std::collections::HashMap;

use chrono::{FixedOffset, NaiveDate, NaiveTime};

use crate::error::{AppError, Result};
use crate::models::{
    ExamInfo, Module, ModuleCondensed, ModuleExam, ModuleInfoMapped, ModuleInformation,
    SemesterExam, SemesterModule, SemesterModuleData,
};
use crate::utils::from_term_code;

/// Exam times are local to the campus timezone.
const UTC_OFFSET_HOURS: i32 = 8;

/// Extract and rename the canonical fields from a resolved module
/// record. The academic year is derived from the record's term code.
pub fn map_module_info(mapped: &ModuleInfoMapped) -> Result<SemesterModule> {
    let info = &mapped.info;
    let (acad_year, _) = from_term_code(&info.term)?;

    Ok(SemesterModule {
        acad_year,
        module_code: info.module_code(),
        module_title: info.course_title.clone(),
        department: mapped.academic_organisation.clone(),
        module_credit: info.modular_credit.clone(),
        workload: info.workload_hours.clone(),
        prerequisite: info.prerequisite.clone(),
        corequisite: info.corequisite.clone(),
        preclusion: info.preclusion.clone(),
        description: info.description.clone(),
    })
}

/// Build an absolute, timezone-normalized exam timestamp and minute
/// duration from a raw exam record.
pub fn map_exam_info(exam: &ModuleExam) -> Result<ExamInfo> {
    let date = exam
        .exam_date
        .as_deref()
        .ok_or_else(|| AppError::validation("exam record has no date"))?;
    let start = exam
        .start_time
        .as_deref()
        .ok_or_else(|| AppError::validation("exam record has no start time"))?;

    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| AppError::validation(format!("bad exam date '{date}': {e}")))?;
    let start = NaiveTime::parse_from_str(start, "%H:%M")
        .map_err(|e| AppError::validation(format!("bad exam start time '{start}': {e}")))?;

    let offset = FixedOffset::east_opt(UTC_OFFSET_HOURS * 3600).expect("campus UTC offset");
    let exam_date = date
        .and_time(start)
        .and_local_timezone(offset)
        .single()
        .ok_or_else(|| AppError::validation("ambiguous exam timestamp"))?
        .format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        .to_string();

    let exam_duration = exam
        .duration
        .and_then(|minutes| u32::try_from(minutes).ok())
        .ok_or_else(|| AppError::validation("exam record has no duration"))?;

    Ok(ExamInfo {
        exam_date,
        exam_duration,
    })
}

/// Fold per-term module data into one record per module code.
///
/// The first occurrence of a code seeds the merged module; every later
/// occurrence appends its semester data. History order follows
/// ingestion order, which is only chronological if the caller ingests
/// terms chronologically.
pub fn combine_modules(
    semesters: impl IntoIterator<Item = Vec<SemesterModuleData>>,
) -> Vec<Module> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut modules: Vec<Module> = Vec::new();

    for semester_modules in semesters {
        for entry in semester_modules {
            match index.get(&entry.module_code) {
                Some(&slot) => modules[slot].history.push(entry.semester_data),
                None => {
                    index.insert(entry.module_code, modules.len());
                    modules.push(Module {
                        info: entry.module,
                        history: vec![entry.semester_data],
                    });
                }
            }
        }
    }

    modules
}

/// Project a merged module down to the search-index fields.
pub fn module_condensed(module: &Module) -> ModuleCondensed {
    ModuleCondensed {
        module_code: module.info.module_code.clone(),
        module_title: module.info.module_title.clone(),
        semesters: module
            .history
            .iter()
            .map(|semester| semester.semester)
            .collect(),
    }
}

/// Project a merged module down to the module-finder fields.
pub fn module_information(module: &Module) -> ModuleInformation {
    let history = module
        .history
        .iter()
        .map(|semester| SemesterExam {
            semester: semester.semester,
            exam_date: semester.exam_date.clone(),
            exam_duration: semester.exam_duration,
        })
        .collect();

    ModuleInformation {
        module_code: module.info.module_code.clone(),
        module_title: module.info.module_title.clone(),
        description: module.info.description.clone(),
        module_credit: module.info.module_credit.clone(),
        department: module.info.department.clone(),
        workload: module.info.workload.clone(),
        prerequisite: module.info.prerequisite.clone(),
        preclusion: module.info.preclusion.clone(),
        history,
    }
}
