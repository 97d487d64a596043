// src/mapper/orgs.rs

//! Faculty and department code resolution.

use std::collections::{BTreeMap, HashMap};

use crate::error::{AppError, Result};
use crate::models::{AcademicGrp, AcademicOrg, ModuleInfo, ModuleInfoMapped};

/// Faculty code to faculty name.
pub type FacultyCodeMap = HashMap<String, String>;

/// Department code to department name.
pub type DepartmentCodeMap = HashMap<String, String>;

/// Fold a faculty list into a code map. A duplicated code keeps the
/// later entry.
pub fn build_faculty_code_map(faculties: &[AcademicGrp]) -> FacultyCodeMap {
    faculties
        .iter()
        .map(|faculty| (faculty.academic_group.clone(), faculty.description.clone()))
        .collect()
}

/// Fold a department list into a code map. A duplicated code keeps the
/// later entry.
pub fn build_department_code_map(departments: &[AcademicOrg]) -> DepartmentCodeMap {
    departments
        .iter()
        .map(|department| {
            (
                department.academic_organisation.clone(),
                department.description.clone(),
            )
        })
        .collect()
}

/// Replace a module record's organisation codes with their resolved
/// names.
///
/// A code that is missing from its map is a data-consistency problem in
/// the upstream data and fails loudly rather than defaulting.
pub fn resolve_org_names(
    info: ModuleInfo,
    faculties: &FacultyCodeMap,
    departments: &DepartmentCodeMap,
) -> Result<ModuleInfoMapped> {
    let department = departments
        .get(&info.academic_organisation.code)
        .ok_or_else(|| AppError::DataConsistency {
            field: "department",
            code: info.academic_organisation.code.clone(),
        })?
        .clone();

    let faculty = faculties
        .get(&info.academic_group.code)
        .ok_or_else(|| AppError::DataConsistency {
            field: "faculty",
            code: info.academic_group.code.clone(),
        })?
        .clone();

    Ok(ModuleInfoMapped {
        info,
        academic_organisation: department,
        academic_group: faculty,
    })
}

/// Map each faculty's name to the names of its departments.
///
/// A department code's first three characters are its faculty's code;
/// departments whose prefix matches no known faculty are skipped.
/// Every faculty appears in the output, even with no departments.
pub fn map_faculty_departments(
    faculties: &[AcademicGrp],
    departments: &[AcademicOrg],
) -> BTreeMap<String, Vec<String>> {
    let mut faculty_names: HashMap<&str, &str> = HashMap::new();
    let mut mappings: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for faculty in faculties {
        faculty_names.insert(&faculty.academic_group, &faculty.description);
        mappings.insert(faculty.description.clone(), Vec::new());
    }

    for department in departments {
        let prefix = department
            .academic_organisation
            .chars()
            .take(3)
            .collect::<String>();

        if let Some(&faculty) = faculty_names.get(prefix.as_str()) {
            if let Some(names) = mappings.get_mut(faculty) {
                if !names.contains(&department.description) {
                    names.push(department.description.clone());
                }
            }
        }
    }

    mappings
}
