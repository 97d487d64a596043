// src/storage/writer.rs

//! Filesystem implementation of the output writer.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::models::{
    Module, ModuleCondensed, ModuleInformation, RawLesson, Semester, SemesterData,
    VenueAvailability,
};
use crate::storage::Persist;

/// Writes scraped data as JSON documents under a per-year directory.
#[derive(Debug, Clone)]
pub struct FsWriter {
    year_root: PathBuf,
}

impl FsWriter {
    /// Create a writer for one academic year under the data root.
    pub fn new(data_root: impl AsRef<Path>, acad_year: &str) -> Self {
        let year_dir = acad_year.replace('/', "-");
        Self {
            year_root: data_root.as_ref().join(year_dir),
        }
    }

    fn semester_dir(&self, semester: Semester) -> PathBuf {
        self.year_root.join("semesters").join(semester.to_string())
    }

    /// Write a JSON document atomically (temp file then rename).
    async fn write_json<T: Serialize + ?Sized>(&self, path: PathBuf, value: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = serde_json::to_vec_pretty(value)?;
        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        log::debug!("Wrote {}", path.display());
        Ok(())
    }
}

#[async_trait]
impl Persist for FsWriter {
    async fn module_list(&self, data: &[ModuleCondensed]) -> Result<()> {
        self.write_json(self.year_root.join("moduleList.json"), data)
            .await
    }

    async fn module_info(&self, data: &[ModuleInformation]) -> Result<()> {
        self.write_json(self.year_root.join("moduleInfo.json"), data)
            .await
    }

    async fn faculty_departments(&self, data: &BTreeMap<String, Vec<String>>) -> Result<()> {
        self.write_json(self.year_root.join("facultyDepartments.json"), data)
            .await
    }

    async fn module(&self, module: &Module) -> Result<()> {
        let path = self
            .year_root
            .join("modules")
            .join(format!("{}.json", module.info.module_code));
        self.write_json(path, module).await
    }

    async fn timetable(
        &self,
        semester: Semester,
        module_code: &str,
        timetable: &[RawLesson],
    ) -> Result<()> {
        let path = self
            .semester_dir(semester)
            .join(module_code)
            .join("timetable.json");
        self.write_json(path, timetable).await
    }

    async fn semester_data(
        &self,
        semester: Semester,
        module_code: &str,
        data: &SemesterData,
    ) -> Result<()> {
        let path = self
            .semester_dir(semester)
            .join(module_code)
            .join("semesterData.json");
        self.write_json(path, data).await
    }

    async fn venues(&self, semester: Semester, venues: &[String]) -> Result<()> {
        let path = self.semester_dir(semester).join("venues.json");
        self.write_json(path, venues).await
    }

    async fn venue_information(
        &self,
        semester: Semester,
        availability: &VenueAvailability,
    ) -> Result<()> {
        let path = self.semester_dir(semester).join("venueInformation.json");
        self.write_json(path, availability).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    use crate::models::SemesterModule;

    #[tokio::test]
    async fn test_module_written_under_year_root() {
        let tmp = TempDir::new().unwrap();
        let writer = FsWriter::new(tmp.path(), "2018/2019");

        let module = Module {
            info: SemesterModule {
                module_code: "CS1010".to_string(),
                ..SemesterModule::default()
            },
            history: Vec::new(),
        };
        writer.module(&module).await.unwrap();

        let path = tmp.path().join("2018-2019/modules/CS1010.json");
        let written: serde_json::Value =
            serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
        assert_eq!(written["ModuleCode"], "CS1010");
    }

    #[tokio::test]
    async fn test_timetable_written_under_semester_dir() {
        let tmp = TempDir::new().unwrap();
        let writer = FsWriter::new(tmp.path(), "2018/2019");

        writer.timetable(2, "CS1010", &[]).await.unwrap();

        assert!(
            tmp.path()
                .join("2018-2019/semesters/2/CS1010/timetable.json")
                .exists()
        );
    }

    #[tokio::test]
    async fn test_venues_written_per_semester() {
        let tmp = TempDir::new().unwrap();
        let writer = FsWriter::new(tmp.path(), "2018/2019");

        writer
            .venues(1, &["COM1-VCRM".to_string(), "LT19".to_string()])
            .await
            .unwrap();

        let path = tmp.path().join("2018-2019/semesters/1/venues.json");
        let venues: Vec<String> = serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
        assert_eq!(venues, vec!["COM1-VCRM", "LT19"]);
    }
}
