// src/main.rs

//! modscraper: University module data scraper CLI
//!
//! Thin driver around the library: wires up the API client, cache and
//! output writer, and runs one scrape operation per invocation. A
//! failure in one module is recorded and the run continues; a wiring
//! failure (bad configuration) is fatal at startup.

use std::collections::HashMap;
use std::time::Duration;

use clap::{Parser, Subcommand};

use modscraper::config::load_checked;
use modscraper::error::{AppError, Result};
use modscraper::mapper::{
    build_department_code_map, build_faculty_code_map, combine_modules,
    extract_venue_availability, map_exam_info, map_faculty_departments, map_module_info,
    map_timetable_lessons, merge_venue_availability, module_condensed, module_information,
    resolve_org_names,
};
use modscraper::models::{
    AcademicGrp, AcademicOrg, AppConfig, ExamInfo, Semester, SemesterData, SemesterModuleData,
    TimetableLesson,
};
use modscraper::services::{ApiClient, validate_exam, validate_lesson};
use modscraper::storage::{FsWriter, Persist, TtlCache};
use modscraper::utils::{cache_download, from_term_code, retry, term_code};

/// Bounded attempts for retryable network calls.
const RETRY_ATTEMPTS: u32 = 3;

#[derive(Parser, Debug)]
#[command(
    name = "modscraper",
    version,
    about = "Scrapes university module and timetable data"
)]
struct Cli {
    #[arg(short, long, default_value = "data/config.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the configuration file
    Validate,
    /// Fetch faculty and department codes for an academic year
    Orgs {
        /// Academic year, eg. 2018/2019
        #[arg(long)]
        year: String,
    },
    /// Scrape one module's info, timetable and exam for a term
    Module {
        /// Term code, eg. 1810
        #[arg(long)]
        term: String,
        module_code: String,
    },
    /// Scrape a whole semester's timetable and exams (streaming)
    Semester {
        /// Term code, eg. 1810
        #[arg(long)]
        term: String,
    },
    /// Scrape both regular semesters of an academic year and collate
    /// the merged module list
    Year {
        /// Academic year, eg. 2018/2019
        #[arg(long)]
        year: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = load_checked(&cli.config)?;

    match cli.command {
        Command::Validate => {
            log::info!(
                "Configuration OK: {} at concurrency {}",
                config.api.base_url,
                config.api.concurrency
            );
            Ok(())
        }
        Command::Orgs { year } => {
            let client = ApiClient::new(&config.api)?;
            run_orgs(&config, &client, &year).await
        }
        Command::Module { term, module_code } => {
            let client = ApiClient::new(&config.api)?;
            run_module(&config, &client, &term, &module_code).await
        }
        Command::Semester { term } => {
            let client = ApiClient::new(&config.api)?;
            run_semester(&config, &client, &term).await
        }
        Command::Year { year } => {
            let client = ApiClient::new(&config.api)?;
            run_year(&config, &client, &year).await
        }
    }
}

/// Fetch faculty and department codes, preferring fresh data but
/// falling back to the cache when the upstream is down.
async fn fetch_orgs(
    config: &AppConfig,
    client: &ApiClient,
    year: &str,
) -> Result<(Vec<AcademicGrp>, Vec<AcademicOrg>)> {
    let cache = TtlCache::for_year(&config.storage.data_path, year);
    let max_age = Duration::from_secs(config.storage.cache_expiry_hours * 60 * 60);

    let faculties = cache_download(
        "faculty codes",
        || retry(|| client.get_faculties(), RETRY_ATTEMPTS, AppError::is_retryable),
        &cache,
        "faculty",
        max_age,
    )
    .await?;

    let departments = cache_download(
        "department codes",
        || retry(|| client.get_departments(), RETRY_ATTEMPTS, AppError::is_retryable),
        &cache,
        "departments",
        max_age,
    )
    .await?;

    Ok((faculties, departments))
}

async fn run_orgs(config: &AppConfig, client: &ApiClient, year: &str) -> Result<()> {
    let (faculties, departments) = fetch_orgs(config, client, year).await?;

    let writer = FsWriter::new(&config.storage.data_path, year);
    let mappings = map_faculty_departments(&faculties, &departments);
    writer.faculty_departments(&mappings).await?;

    log::info!(
        "Wrote {} faculties and {} departments",
        mappings.len(),
        departments.len()
    );
    Ok(())
}

async fn run_module(
    config: &AppConfig,
    client: &ApiClient,
    term: &str,
    module_code: &str,
) -> Result<()> {
    let (acad_year, semester) = from_term_code(term)?;
    let (faculties, departments) = fetch_orgs(config, client, &acad_year).await?;
    let faculty_map = build_faculty_code_map(&faculties);
    let department_map = build_department_code_map(&departments);

    let info = retry(
        || client.get_module_info(term, module_code),
        RETRY_ATTEMPTS,
        AppError::is_retryable,
    )
    .await?;
    let module = map_module_info(&resolve_org_names(info, &faculty_map, &department_map)?)?;

    let events = client.get_module_timetable(term, module_code).await?;
    let valid_events = drop_invalid_lessons(events);
    let timetable = map_timetable_lessons(&valid_events);

    // "No exam" is an expected outcome, not an error
    let exam = match client.get_module_exam(term, module_code).await {
        Ok(exam) if validate_exam(&exam).is_valid() => Some(map_exam_info(&exam)?),
        Ok(_) => {
            log::warn!("Dropping invalid exam record for {module_code}");
            None
        }
        Err(e) if e.is_not_found() => None,
        Err(e) => return Err(e),
    };

    let writer = FsWriter::new(&config.storage.data_path, &acad_year);
    let semester_data = SemesterData::new(semester, timetable.clone(), exam);
    writer
        .timetable(semester, &module.module_code, &timetable)
        .await?;
    writer
        .semester_data(semester, &module.module_code, &semester_data)
        .await?;

    let merged = combine_modules(vec![vec![SemesterModuleData {
        module_code: module.module_code.clone(),
        module,
        semester_data,
    }]]);
    for module in &merged {
        writer.module(module).await?;
    }

    log::info!("Scraped {module_code} for term {term}");
    Ok(())
}

/// Stream a whole semester's lessons, bucketing valid records per
/// module so only the grouped records stay in memory.
async fn collect_semester_lessons(
    client: &ApiClient,
    term: &str,
) -> Result<HashMap<String, Vec<TimetableLesson>>> {
    let mut stream = client.get_semester_timetables(term).await?;
    let mut by_module: HashMap<String, Vec<TimetableLesson>> = HashMap::new();
    let mut dropped = 0usize;

    while let Some(item) = stream.next().await {
        let lesson = item?;

        if !validate_lesson(&lesson).is_valid() {
            dropped += 1;
            continue;
        }
        let Some(module_code) = lesson.module.clone().filter(|code| !code.is_empty()) else {
            dropped += 1;
            continue;
        };
        by_module.entry(module_code).or_default().push(lesson);
    }

    log::info!(
        "Streamed lessons for {} modules ({dropped} invalid records dropped)",
        by_module.len()
    );
    Ok(by_module)
}

async fn run_semester(config: &AppConfig, client: &ApiClient, term: &str) -> Result<()> {
    let (acad_year, semester) = from_term_code(term)?;
    let writer = FsWriter::new(&config.storage.data_path, &acad_year);

    let by_module = collect_semester_lessons(client, term).await?;
    let exams = fetch_term_exams(client, term).await?;

    let mut venue_maps = Vec::new();
    let mut failures = 0usize;
    for (module_code, events) in &by_module {
        let timetable = map_timetable_lessons(events);
        let semester_data =
            SemesterData::new(semester, timetable.clone(), exams.get(module_code).cloned());

        let written = writer
            .timetable(semester, module_code, &timetable)
            .await
            .and(
                writer
                    .semester_data(semester, module_code, &semester_data)
                    .await,
            );
        if let Err(error) = written {
            // One module's failure must not abort the whole run
            log::error!("Failed to persist {module_code}: {error}");
            failures += 1;
            continue;
        }

        venue_maps.push(extract_venue_availability(module_code, &timetable));
    }

    let availability = merge_venue_availability(venue_maps);
    let venues: Vec<String> = availability.keys().cloned().collect();
    writer.venues(semester, &venues).await?;
    writer.venue_information(semester, &availability).await?;

    log::info!(
        "Semester {semester}: {} modules, {} venues, {failures} failures",
        by_module.len(),
        venues.len()
    );
    Ok(())
}

/// Scrape one semester's module records, timetables, exams and venues,
/// returning the per-module data for year-level collation.
async fn scrape_semester(
    client: &ApiClient,
    writer: &FsWriter,
    faculties: &[AcademicGrp],
    departments: &[AcademicOrg],
    year: &str,
    semester: Semester,
) -> Result<Vec<SemesterModuleData>> {
    let term = term_code(semester, year)?;
    let faculty_map = build_faculty_code_map(faculties);
    let department_map = build_department_code_map(departments);

    // Module info comes faculty by faculty; one faculty failing is
    // recorded and the rest of the semester still goes through
    let mut modules = Vec::new();
    for faculty in faculties {
        match retry(
            || client.get_faculty_modules(&term, &faculty.academic_group),
            RETRY_ATTEMPTS,
            AppError::is_retryable,
        )
        .await
        {
            Ok(batch) => modules.extend(batch),
            Err(error) => log::error!(
                "Failed to fetch modules for faculty {}: {error}",
                faculty.academic_group
            ),
        }
    }

    let mut by_module = collect_semester_lessons(client, &term).await?;
    let exams = fetch_term_exams(client, &term).await?;

    let mut semester_modules = Vec::new();
    let mut venue_maps = Vec::new();
    for info in modules {
        let module_code = info.module_code();

        let module = match resolve_org_names(info, &faculty_map, &department_map)
            .and_then(|mapped| map_module_info(&mapped))
        {
            Ok(module) => module,
            Err(error) => {
                log::error!("Skipping {module_code}: {error}");
                continue;
            }
        };

        let events = by_module.remove(&module_code).unwrap_or_default();
        let timetable = map_timetable_lessons(&events);
        let semester_data =
            SemesterData::new(semester, timetable.clone(), exams.get(&module_code).cloned());

        let written = writer
            .timetable(semester, &module_code, &timetable)
            .await
            .and(
                writer
                    .semester_data(semester, &module_code, &semester_data)
                    .await,
            );
        if let Err(error) = written {
            log::error!("Failed to persist {module_code}: {error}");
            continue;
        }

        venue_maps.push(extract_venue_availability(&module_code, &timetable));
        semester_modules.push(SemesterModuleData {
            module_code,
            module,
            semester_data,
        });
    }

    let availability = merge_venue_availability(venue_maps);
    let venues: Vec<String> = availability.keys().cloned().collect();
    writer.venues(semester, &venues).await?;
    writer.venue_information(semester, &availability).await?;

    log::info!(
        "Semester {semester}: {} modules, {} venues",
        semester_modules.len(),
        venues.len()
    );
    Ok(semester_modules)
}

async fn run_year(config: &AppConfig, client: &ApiClient, year: &str) -> Result<()> {
    let (faculties, departments) = fetch_orgs(config, client, year).await?;
    let writer = FsWriter::new(&config.storage.data_path, year);

    writer
        .faculty_departments(&map_faculty_departments(&faculties, &departments))
        .await?;

    let mut semesters = Vec::new();
    for semester in [1, 2] {
        semesters.push(
            scrape_semester(client, &writer, &faculties, &departments, year, semester).await?,
        );
    }

    // Collate both semesters into one record per module
    let merged = combine_modules(semesters);
    for module in &merged {
        if let Err(error) = writer.module(module).await {
            log::error!(
                "Failed to persist module {}: {error}",
                module.info.module_code
            );
        }
    }

    let condensed: Vec<_> = merged.iter().map(module_condensed).collect();
    let information: Vec<_> = merged.iter().map(module_information).collect();
    writer.module_list(&condensed).await?;
    writer.module_info(&information).await?;

    log::info!("Collated {} modules for {year}", merged.len());
    Ok(())
}

/// Exam info per module code for a term. Missing exam data for the
/// whole term is treated as "no exams published yet".
async fn fetch_term_exams(client: &ApiClient, term: &str) -> Result<HashMap<String, ExamInfo>> {
    let exams = match retry(
        || client.get_term_exams(term),
        RETRY_ATTEMPTS,
        AppError::is_retryable,
    )
    .await
    {
        Ok(exams) => exams,
        Err(e) if e.is_not_found() => Vec::new(),
        Err(e) => return Err(e),
    };

    let mut exam_map = HashMap::new();
    for exam in exams {
        if !validate_exam(&exam).is_valid() {
            log::warn!("Dropping invalid exam record for {:?}", exam.module);
            continue;
        }
        match (exam.module.clone(), map_exam_info(&exam)) {
            (Some(module_code), Ok(info)) => {
                exam_map.insert(module_code, info);
            }
            (_, Err(error)) => log::warn!("Unmappable exam record: {error}"),
            (None, _) => {}
        }
    }
    Ok(exam_map)
}

/// Filter out lessons failing schema validation, logging each drop.
fn drop_invalid_lessons(events: Vec<TimetableLesson>) -> Vec<TimetableLesson> {
    events
        .into_iter()
        .filter(|lesson| {
            let report = validate_lesson(lesson);
            if !report.is_valid() {
                log::warn!(
                    "Dropping invalid lesson for {:?}: {:?}",
                    lesson.module,
                    report.violations()
                );
            }
            report.is_valid()
        })
        .collect()
}
