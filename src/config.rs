// src/config.rs

//! Configuration loading utilities.

use std::path::Path;

use crate::error::Result;
use crate::models::AppConfig;

/// Load configuration from a TOML file and validate it.
///
/// Unlike [`AppConfig::load_or_default`], a broken or insane config is
/// an error here: client wiring problems must be fatal at startup, not
/// surface halfway through a scrape.
pub fn load_checked(path: impl AsRef<Path>) -> Result<AppConfig> {
    let config = AppConfig::load(path)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    use tempfile::NamedTempFile;

    #[test]
    fn test_load_checked_accepts_valid_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [api]
            base_url = "https://registry.test/"
            concurrency = 3
            "#
        )
        .unwrap();

        let config = load_checked(file.path()).unwrap();
        assert_eq!(config.api.concurrency, 3);
    }

    #[test]
    fn test_load_checked_rejects_insane_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [api]
            concurrency = 0
            "#
        )
        .unwrap();

        assert!(load_checked(file.path()).is_err());
    }

    #[test]
    fn test_load_checked_rejects_missing_file() {
        assert!(load_checked("no/such/config.toml").is_err());
    }
}
