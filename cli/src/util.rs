use std::path::PathBuf;
use std::time::Duration;

use beholder_core::config::DEFAULT_TIMEOUT_SECS;
use beholder_core::error::{ErrorBody, codes};
use beholder_core::{BackendConfig, ConfigError};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Exit codes: 0=resolved, 1=no match, 2=diagnosis error, 3=connection error,
///             4=usage/config error, 5=ambiguous (no candidate picked)
pub const EXIT_OK: i32 = 0;
pub const EXIT_NO_MATCH: i32 = 1;
pub const EXIT_DIAGNOSIS: i32 = 2;
pub const EXIT_CONNECTION: i32 = 3;
pub const EXIT_USAGE: i32 = 4;
pub const EXIT_AMBIGUOUS: i32 = 5;

/// Connection settings given on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct ConnectionOverrides {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Connection settings stored in `<config_dir>/beholder/config.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
}

pub fn init_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "beholder=warn,beholder_core=warn",
        1 => "beholder=info,beholder_core=info",
        _ => "beholder=debug,beholder_core=debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub fn print_error(body: &ErrorBody) {
    let rendered = serde_json::to_string_pretty(body).unwrap_or_else(|_| body.message.clone());
    eprintln!("{rendered}");
}

pub fn exit_error(error: &str, message: &str, docs_hint: Option<&str>, exit_code: i32) -> ! {
    let mut body = ErrorBody::new(error, message);
    if let Some(hint) = docs_hint {
        body = body.with_docs_hint(hint);
    }
    print_error(&body);
    std::process::exit(exit_code);
}

pub fn usage_error(message: &str, docs_hint: Option<&str>) -> ! {
    exit_error(codes::USAGE_ERROR, message, docs_hint, EXIT_USAGE)
}

pub fn print_json(value: &impl Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(rendered) => println!("{rendered}"),
        Err(e) => usage_error(&format!("Failed to render JSON output: {e}"), None),
    }
}

pub fn config_path() -> PathBuf {
    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("beholder");
    config_dir.join("config.json")
}

/// Missing file is not an error; a malformed one is.
pub fn load_file_config(path: &std::path::Path) -> Result<Option<FileConfig>, ConfigError> {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ConfigError::File {
                path: path.display().to_string(),
                reason: e.to_string(),
            });
        }
    };
    serde_json::from_str(&data)
        .map(Some)
        .map_err(|e| ConfigError::File {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
}

/// Resolve connection settings (priority order):
/// 1. --api-url / --api-key / --timeout-secs (or BEHOLDER_* env vars)
/// 2. config file
/// 3. defaults (timeout only)
pub fn resolve_config(
    overrides: &ConnectionOverrides,
    file: Option<&FileConfig>,
) -> Result<BackendConfig, ConfigError> {
    let api_url = overrides
        .api_url
        .clone()
        .or_else(|| file.and_then(|f| f.api_url.clone()))
        .ok_or(ConfigError::MissingBaseUrl)?;
    let api_key = overrides
        .api_key
        .clone()
        .or_else(|| file.and_then(|f| f.api_key.clone()))
        .ok_or(ConfigError::MissingApiKey)?;
    let timeout_secs = overrides
        .timeout_secs
        .or_else(|| file.and_then(|f| f.timeout_secs))
        .unwrap_or(DEFAULT_TIMEOUT_SECS);

    Ok(BackendConfig::new(&api_url, &api_key)?.with_timeout(Duration::from_secs(timeout_secs)))
}

/// Load the backend configuration or exit with a config error.
pub fn backend_config_or_exit(overrides: &ConnectionOverrides) -> BackendConfig {
    let path = config_path();
    let resolved = load_file_config(&path)
        .and_then(|file| resolve_config(overrides, file.as_ref()));
    match resolved {
        Ok(config) => config,
        Err(e) => exit_error(
            codes::CONFIG_ERROR,
            &e.to_string(),
            Some(&format!(
                "Set --api-url/--api-key, BEHOLDER_API_URL/BEHOLDER_API_KEY, or {}",
                path.display()
            )),
            EXIT_USAGE,
        ),
    }
}

/// Show only a short prefix of a secret.
pub fn mask_key(key: &str) -> String {
    let prefix: String = key.chars().take(4).collect();
    format!("{prefix}...")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use beholder_core::ConfigError;

    use super::{ConnectionOverrides, FileConfig, load_file_config, mask_key, resolve_config};

    fn file() -> FileConfig {
        FileConfig {
            api_url: Some("http://file.example:8000".to_string()),
            api_key: Some("file-key".to_string()),
            timeout_secs: Some(30),
        }
    }

    #[test]
    fn overrides_take_precedence_over_file() {
        let overrides = ConnectionOverrides {
            api_url: Some("http://flag.example:9000".to_string()),
            api_key: None,
            timeout_secs: None,
        };
        let config = resolve_config(&overrides, Some(&file())).expect("config should resolve");
        assert_eq!(config.base_url().as_str(), "http://flag.example:9000/");
        assert_eq!(config.api_key(), "file-key");
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn missing_key_everywhere_is_reported() {
        let overrides = ConnectionOverrides {
            api_url: Some("http://flag.example:9000".to_string()),
            ..ConnectionOverrides::default()
        };
        assert_eq!(
            resolve_config(&overrides, None).unwrap_err(),
            ConfigError::MissingApiKey
        );
    }

    #[test]
    fn missing_config_file_is_not_an_error() {
        let path = std::env::temp_dir().join("beholder-test-does-not-exist.json");
        assert!(load_file_config(&path).expect("missing file is fine").is_none());
    }

    #[test]
    fn malformed_config_file_is_an_error() {
        let path = std::env::temp_dir().join(format!(
            "beholder-test-malformed-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, "{ not json").expect("temp file should be writable");
        let result = load_file_config(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(ConfigError::File { .. })));
    }

    #[test]
    fn mask_key_keeps_short_prefix() {
        assert_eq!(mask_key("abcdef123456"), "abcd...");
        assert_eq!(mask_key("ab"), "ab...");
    }
}
