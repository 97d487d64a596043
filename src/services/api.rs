// src/services/api.rs

//! Upstream registry API client.
//!
//! All requests pass through a shared admission queue that caps the
//! number of concurrently in-flight calls; excess calls wait in FIFO
//! order and there is no bound on queue depth. The client never retries
//! and never caches: both are composed externally by callers.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use futures::stream::{self, StreamExt, TryStreamExt};
use regex::Regex;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::{Semaphore, SemaphorePermit};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{
    AcademicGrp, AcademicOrg, ApiConfig, BulkPage, Credentials, Envelope, ModuleExam, ModuleInfo,
    TimetableLesson,
};
use crate::services::stream::{LessonStream, spawn_array_stream};

/// Application status code for success.
pub const OKAY: &str = "00000";
/// Application status code for an authentication failure.
pub const AUTH_ERROR: &str = "10000";
/// Application status code for a missing record. Some endpoints also
/// use this for an empty result set.
pub const RECORD_NOT_FOUND: &str = "10001";

/// Length of the faculty prefix shared by faculty and department codes.
const FACULTY_CODE_LEN: usize = 3;

/// Endpoint families, each authenticated with its own key pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointFamily {
    /// `classtt/*`
    Timetable,
    /// `module` and `examtt`
    Course,
    /// `config/get-acadgroup` and `config/get-acadorg`
    AcademicOrg,
}

/// Translate an upstream application status code into the matching
/// error kind.
pub(crate) fn map_error_code(code: &str, msg: String) -> AppError {
    match code {
        AUTH_ERROR => AppError::Auth(msg),
        RECORD_NOT_FOUND => AppError::NotFound(msg),
        _ => AppError::UnknownApi {
            code: code.to_string(),
            message: msg,
        },
    }
}

/// Split a module code into its subject prefix and catalog number,
/// eg. "cs1010" into ("cs", "1010").
pub fn parse_module_code(module_code: &str) -> Result<(&str, &str)> {
    static MODULE_CODE: OnceLock<Regex> = OnceLock::new();
    let pattern = MODULE_CODE
        .get_or_init(|| Regex::new(r"^([A-Za-z]+)(\d.*)$").expect("module code pattern"));

    let captures = pattern
        .captures(module_code)
        .ok_or_else(|| AppError::ModuleCode(module_code.to_string()))?;
    match (captures.get(1), captures.get(2)) {
        (Some(subject), Some(catalog)) => Ok((subject.as_str(), catalog.as_str())),
        _ => Err(AppError::ModuleCode(module_code.to_string())),
    }
}

/// Concurrency-limited client for the registry API.
///
/// Construct one per process and pass it by reference so every caller
/// shares the same concurrency budget.
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    page_size: usize,
    concurrency: usize,
    queue: Arc<Semaphore>,
}

impl ApiClient {
    /// Build a client from API configuration.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let base_url = Url::parse(&config.base_url)?;
        let concurrency = config.concurrency.max(1);

        Ok(Self {
            client,
            base_url,
            credentials: config.credentials.clone(),
            page_size: config.page_size.max(1),
            concurrency,
            queue: Arc::new(Semaphore::new(concurrency)),
        })
    }

    fn url(&self, endpoint: &str) -> Result<Url> {
        Ok(self.base_url.join(endpoint)?)
    }

    fn auth_headers(&self, family: EndpointFamily) -> Result<HeaderMap> {
        let keys = match family {
            EndpointFamily::Timetable => &self.credentials.timetable,
            EndpointFamily::Course => &self.credentials.course,
            EndpointFamily::AcademicOrg => &self.credentials.academic_org,
        };

        let header = |value: &str| {
            HeaderValue::from_str(value)
                .map_err(|_| AppError::config("API key is not a valid header value"))
        };

        let mut headers = HeaderMap::new();
        headers.insert("X-APP-API", header(&keys.app_key)?);
        headers.insert("X-STUDENT-API", header(&keys.student_key)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    async fn admit(&self) -> Result<SemaphorePermit<'_>> {
        self.queue
            .acquire()
            .await
            .map_err(|_| AppError::config("admission queue closed"))
    }

    /// Send a request while holding an admission slot, check the HTTP
    /// status, and decode the body as JSON.
    async fn request_json(
        &self,
        request: reqwest::RequestBuilder,
        endpoint: &str,
    ) -> Result<Value> {
        let _permit = self.admit().await?;

        let response = request.send().await.map_err(|e| {
            AppError::transport(endpoint, e.status().map(|s| s.as_u16()), e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::transport(
                endpoint,
                Some(status.as_u16()),
                format!("server returned status {status}"),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::transport(endpoint, None, e.to_string()))
    }

    /// Single-record call: POST with params encoded as a JSON body,
    /// returning the raw response body.
    pub async fn call(
        &self,
        endpoint: &str,
        params: Value,
        family: EndpointFamily,
    ) -> Result<Value> {
        let url = self.url(endpoint)?;
        let request = self
            .client
            .post(url)
            .headers(self.auth_headers(family)?)
            .json(&params);
        self.request_json(request, endpoint).await
    }

    /// Enveloped call: expects the legacy `{ msg, data, code }` wrapper
    /// and translates non-success codes into the error taxonomy.
    pub async fn call_enveloped<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: Value,
        family: EndpointFamily,
    ) -> Result<T> {
        let body = self.call(endpoint, params, family).await?;
        let envelope: Envelope<Value> = serde_json::from_value(body)?;

        if envelope.code != OKAY {
            return Err(map_error_code(&envelope.code, envelope.msg));
        }

        Ok(serde_json::from_value(envelope.data.unwrap_or(Value::Null))?)
    }

    /// Fetch one page of a paginated bulk endpoint.
    async fn fetch_page<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        family: EndpointFamily,
        params: &[(&str, &str)],
        offset: usize,
    ) -> Result<BulkPage<T>> {
        let url = self.url(endpoint)?;
        let request = self
            .client
            .get(url)
            .headers(self.auth_headers(family)?)
            .query(params)
            .query(&[
                ("offset", offset.to_string().as_str()),
                ("limit", self.page_size.to_string().as_str()),
                ("latestVersionOnly", "true"),
                ("publishedOnly", "true"),
            ]);
        let body = self.request_json(request, endpoint).await?;

        // Bulk endpoints report failures through the same code field as
        // the legacy envelope
        if let Some(code) = body.get("code").and_then(Value::as_str) {
            if code != OKAY {
                let msg = body
                    .get("msg")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                return Err(map_error_code(code, msg));
            }
        }

        Ok(serde_json::from_value(body)?)
    }

    /// Paginated bulk call: reads the declared item count from the
    /// first page, fetches the remaining pages concurrently, and
    /// reassembles them in offset order regardless of completion order.
    pub async fn call_paginated<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        family: EndpointFamily,
        params: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let first = self.fetch_page::<T>(endpoint, family, params, 0).await?;
        let total = first.item_count;
        let mut items = first.data;

        let offsets: Vec<usize> = (self.page_size..total).step_by(self.page_size).collect();
        if !offsets.is_empty() {
            let mut pages: Vec<(usize, Vec<T>)> = stream::iter(offsets)
                .map(|offset| async move {
                    let page = self.fetch_page::<T>(endpoint, family, params, offset).await?;
                    Ok::<_, AppError>((offset, page.data))
                })
                .buffer_unordered(self.concurrency)
                .try_collect()
                .await?;

            pages.sort_by_key(|(offset, _)| *offset);
            for (_, page) in pages {
                items.extend(page);
            }
        }

        Ok(items)
    }

    /// Call the module endpoint, treating the upstream's not-found
    /// overload as an empty result set.
    async fn call_modules_endpoint(
        &self,
        term: &str,
        extra: (&str, &str),
    ) -> Result<Vec<ModuleInfo>> {
        let params = [("term", term), extra];
        match self
            .call_paginated("module", EndpointFamily::Course, &params)
            .await
        {
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            other => other,
        }
    }

    /// Obtain every faculty (academic group) in the school.
    pub async fn get_faculties(&self) -> Result<Vec<AcademicGrp>> {
        self.call_enveloped(
            "config/get-acadgroup",
            // % is a wildcard so this returns everything
            json!({ "eff_status": "A", "acad_group": "%" }),
            EndpointFamily::AcademicOrg,
        )
        .await
    }

    /// Obtain every department (academic organisation) in the school.
    pub async fn get_departments(&self) -> Result<Vec<AcademicOrg>> {
        self.call_enveloped(
            "config/get-acadorg",
            json!({ "eff_status": "A", "acad_org": "%" }),
            EndpointFamily::AcademicOrg,
        )
        .await
    }

    /// Get info for a specific module in a specific term.
    ///
    /// Fails with [`AppError::NotFound`] if the module does not exist.
    pub async fn get_module_info(&self, term: &str, module_code: &str) -> Result<ModuleInfo> {
        // The module endpoint takes subject and catalog number
        // separately, so the code prefix has to be split out
        let (subject, catalog_number) = parse_module_code(module_code)?;

        let params = [
            ("term", term),
            ("subject", subject),
            ("catalognbr", catalog_number),
        ];
        let modules: Vec<ModuleInfo> = self
            .call_paginated("module", EndpointFamily::Course, &params)
            .await?;

        modules
            .into_iter()
            .next()
            .ok_or_else(|| AppError::not_found(format!("Module {module_code} cannot be found")))
    }

    /// Get all modules offered by a faculty during a term.
    pub async fn get_faculty_modules(
        &self,
        term: &str,
        faculty_code: &str,
    ) -> Result<Vec<ModuleInfo>> {
        let prefix = faculty_prefix(faculty_code);
        self.call_modules_endpoint(term, ("acadgroup", &prefix))
            .await
    }

    /// Get all modules offered by a department during a term.
    ///
    /// The upstream only filters by faculty, so the faculty-scoped
    /// result set is filtered down to the exact department here.
    pub async fn get_department_modules(
        &self,
        term: &str,
        department_code: &str,
    ) -> Result<Vec<ModuleInfo>> {
        let prefix = faculty_prefix(department_code);
        let modules = self
            .call_modules_endpoint(term, ("acadgroup", &prefix))
            .await?;

        Ok(modules
            .into_iter()
            .filter(|module| module.academic_organisation.code == department_code)
            .collect())
    }

    /// Every lesson of one module in one term.
    pub async fn get_module_timetable(
        &self,
        term: &str,
        module_code: &str,
    ) -> Result<Vec<TimetableLesson>> {
        self.call_enveloped(
            "classtt/withdate",
            json!({ "term": term, "module": module_code }),
            EndpointFamily::Timetable,
        )
        .await
    }

    /// Every lesson of one department's modules in one term.
    pub async fn get_department_timetable(
        &self,
        term: &str,
        department_code: &str,
    ) -> Result<Vec<TimetableLesson>> {
        self.call_enveloped(
            "classtt/withdate",
            json!({ "term": term, "deptfac": department_code }),
            EndpointFamily::Timetable,
        )
        .await
    }

    /// Stream every lesson of an entire semester.
    ///
    /// The response is too large to buffer, so lessons are yielded one
    /// at a time as they are parsed and immediately discarded; peak
    /// memory stays constant in the array length. The stream is lazy,
    /// finite and non-restartable; dropping it terminates early.
    pub async fn get_semester_timetables(&self, term: &str) -> Result<LessonStream> {
        let endpoint = "classtt/withdate";
        let url = self.url(endpoint)?;

        let permit = self
            .queue
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| AppError::config("admission queue closed"))?;

        let response = self
            .client
            .get(url)
            .headers(self.auth_headers(EndpointFamily::Timetable)?)
            .query(&[("term", term)])
            .send()
            .await
            .map_err(|e| {
                AppError::transport(endpoint, e.status().map(|s| s.as_u16()), e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::transport(
                endpoint,
                Some(status.as_u16()),
                format!("server returned status {status}"),
            ));
        }

        Ok(spawn_array_stream(response, endpoint, permit))
    }

    /// Get exam info for a specific module.
    ///
    /// Fails with [`AppError::NotFound`] if the module has no exam, or
    /// the information is not available yet: the upstream makes no
    /// distinction.
    pub async fn get_module_exam(&self, term: &str, module_code: &str) -> Result<ModuleExam> {
        let exams: Vec<ModuleExam> = self
            .call_enveloped(
                "examtt",
                json!({ "term": term, "module": module_code }),
                EndpointFamily::Course,
            )
            .await?;

        exams.into_iter().next().ok_or_else(|| {
            AppError::not_found(format!(
                "Exams for {module_code} cannot be found, or the module has no exams"
            ))
        })
    }

    /// Get exam info for every module in a term.
    pub async fn get_term_exams(&self, term: &str) -> Result<Vec<ModuleExam>> {
        self.call_enveloped("examtt", json!({ "term": term }), EndpointFamily::Course)
            .await
    }
}

/// Faculty and department codes share a fixed-length faculty prefix.
fn faculty_prefix(code: &str) -> String {
    code.chars().take(FACULTY_CODE_LEN).collect()
}
