// src/utils/mod.rs

//! Utility functions and helpers.

pub mod acad;
pub mod time;

use std::future::Future;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::Semester;
use crate::storage::TtlCache;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Build a term code from a semester and academic year.
///
/// `(1, "2018/2019")` becomes `"1810"`.
pub fn term_code(semester: Semester, acad_year: &str) -> Result<String> {
    let year = acad_year
        .get(2..4)
        .filter(|digits| digits.chars().all(|c| c.is_ascii_digit()))
        .ok_or_else(|| {
            AppError::validation(format!("'{acad_year}' is not an academic year"))
        })?;
    Ok(format!("{year}{semester}0"))
}

/// Decode a term code into its academic year and semester.
///
/// `"1810"` becomes `("2018/2019", 1)`.
pub fn from_term_code(term: &str) -> Result<(String, Semester)> {
    let bad_term = || AppError::validation(format!("'{term}' is not a term code"));

    if term.len() != 4 {
        return Err(bad_term());
    }
    let year: u32 = term.get(0..2).and_then(|s| s.parse().ok()).ok_or_else(bad_term)?;
    let semester: Semester = term
        .get(2..3)
        .and_then(|s| s.parse().ok())
        .ok_or_else(bad_term)?;

    let start = 2000 + year;
    Ok((format!("{}/{}", start, start + 1), semester))
}

/// Retry an async operation a bounded number of times with doubling
/// backoff, consulting `retryable` before each re-attempt.
///
/// Each attempt is an independent call; nothing is held across attempts,
/// so a retried API request re-enters the client's admission queue like
/// any other call.
pub async fn retry<T, F, Fut>(
    mut op: F,
    attempts: u32,
    retryable: impl Fn(&AppError) -> bool,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut delay = Duration::from_millis(500);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                if attempt >= attempts.max(1) || !retryable(&error) {
                    return Err(error);
                }
                log::warn!("Attempt {attempt} failed ({error}), retrying in {delay:?}");
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
        }
    }
}

/// Download data and cache it, falling back to a fresh-enough cache
/// entry if the download fails.
///
/// Cache write failures are logged and ignored; if both the download and
/// the cache read fail, the download error is the one reported.
pub async fn cache_download<T, F, Fut>(
    name: &str,
    download: F,
    cache: &TtlCache,
    key: &str,
    max_age: Duration,
) -> Result<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match download().await {
        Ok(data) => {
            if let Err(error) = cache.write(key, &data).await {
                log::warn!("Failed to cache {name}: {error}");
            }
            Ok(data)
        }
        Err(download_error) => {
            log::warn!("Failed to download {name} ({download_error}), falling back to cache");
            match cache.read(key, max_age).await {
                Ok(data) => Ok(data),
                Err(cache_error) => {
                    log::warn!("Cache fallback for {name} also failed: {cache_error}");
                    Err(download_error)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_term_code() {
        assert_eq!(term_code(1, "2018/2019").unwrap(), "1810");
        assert_eq!(term_code(2, "2018/2019").unwrap(), "1820");
        assert_eq!(term_code(2, "2018/19").unwrap(), "1820");
        assert!(term_code(1, "x").is_err());
    }

    #[test]
    fn test_from_term_code() {
        assert_eq!(
            from_term_code("1810").unwrap(),
            ("2018/2019".to_string(), 1)
        );
        assert_eq!(
            from_term_code("1830").unwrap(),
            ("2018/2019".to_string(), 3)
        );
        assert_eq!(
            from_term_code("2020").unwrap(),
            ("2020/2021".to_string(), 2)
        );
        assert!(from_term_code("18").is_err());
        assert!(from_term_code("abcd").is_err());
    }

    #[tokio::test]
    async fn test_retry_returns_first_success() {
        let calls = AtomicU32::new(0);
        let result = retry(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, AppError>("hello") }
            },
            3,
            AppError::is_retryable,
        )
        .await;

        assert_eq!(result.unwrap(), "hello");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_until_success() {
        let calls = AtomicU32::new(0);
        let result = retry(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(AppError::transport("module", Some(502), "bad gateway"))
                    } else {
                        Ok("recovered")
                    }
                }
            },
            3,
            AppError::is_retryable,
        )
        .await;

        assert_eq!(result.unwrap(), "recovered");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_exhausts_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(AppError::transport("module", Some(500), "boom")) }
            },
            3,
            AppError::is_retryable,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_respects_condition() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(AppError::not_found("no such module")) }
            },
            3,
            AppError::is_retryable,
        )
        .await;

        assert!(result.unwrap_err().is_not_found());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_download_success_writes_cache() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cache = TtlCache::new(tmp.path());

        let result = cache_download(
            "faculties",
            || async { Ok::<_, AppError>(vec!["science".to_string()]) },
            &cache,
            "faculties",
            Duration::from_secs(60),
        )
        .await
        .unwrap();

        assert_eq!(result, vec!["science".to_string()]);
        let cached: Vec<String> = cache
            .read("faculties", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cached, vec!["science".to_string()]);
    }

    #[tokio::test]
    async fn test_cache_download_falls_back_to_cache() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cache = TtlCache::new(tmp.path());
        cache.write("faculties", &vec!["arts".to_string()]).await.unwrap();

        let result: Vec<String> = cache_download(
            "faculties",
            || async { Err(AppError::transport("config/get-acadgroup", None, "offline")) },
            &cache,
            "faculties",
            Duration::from_secs(60),
        )
        .await
        .unwrap();

        assert_eq!(result, vec!["arts".to_string()]);
    }

    #[tokio::test]
    async fn test_cache_download_reports_download_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cache = TtlCache::new(tmp.path());

        let result: Result<Vec<String>> = cache_download(
            "faculties",
            || async { Err(AppError::transport("config/get-acadgroup", None, "offline")) },
            &cache,
            "faculties",
            Duration::from_secs(60),
        )
        .await;

        match result.unwrap_err() {
            AppError::Transport { endpoint, .. } => {
                assert_eq!(endpoint, "config/get-acadgroup");
            }
            other => panic!("expected the download error, got {other:?}"),
        }
    }
}
