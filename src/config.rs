//! Configuration loader and validator for the template migrator.
//!
//! Everything comes from the process environment (optionally seeded from a
//! `.env` file). The result is a plain struct handed to every component; there
//! is no global state.
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_GRAPH_API_URL: &str = "https://graph.facebook.com/v20.0";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_LOG_FILE: &str = "template_copy_log.csv";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("environment error: {0}")]
    Env(#[from] envy::Error),
    #[error("failed to load env file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Raw view of the environment. Every field is optional here so that a
/// missing variable is reported by name instead of as a serde error.
#[derive(Debug, Default, Deserialize)]
struct RawEnv {
    access_token: Option<String>,
    source_waba_id: Option<String>,
    target_waba_id: Option<String>,
    template_names: Option<String>,
    graph_api_url: Option<String>,
    http_timeout_secs: Option<u64>,
    skip_existing: Option<bool>,
    log_file: Option<String>,
}

/// Connection settings for the Graph API.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiSettings {
    pub base_url: String,
    pub access_token: String,
    pub timeout: Duration,
}

impl fmt::Debug for ApiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiSettings")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api: ApiSettings,
    pub source_account: String,
    pub target_account: String,
    /// Exact template names to migrate, in configured order.
    pub template_names: Vec<String>,
    /// Skip templates whose name already exists at the destination.
    pub skip_existing: bool,
    pub log_file: PathBuf,
}

impl Config {
    /// Load from the process environment after applying `env_file` (or `.env`
    /// in the working directory when present).
    pub fn load(env_file: Option<&Path>) -> Result<Self, ConfigError> {
        load_env_file(env_file)?;
        Self::from_env_iter(std::env::vars())
    }

    /// Build from explicit `(KEY, value)` pairs.
    pub fn from_env_iter<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let raw: RawEnv = envy::from_iter(vars)?;
        let api = api_settings(&raw)?;
        let source_account = required(raw.source_waba_id, "SOURCE_WABA_ID")?;
        let target_account = required(raw.target_waba_id, "TARGET_WABA_ID")?;
        let template_names = raw
            .template_names
            .map(|list| parse_name_list(&list))
            .ok_or(ConfigError::Missing("TEMPLATE_NAMES"))?;
        if source_account == target_account {
            return Err(ConfigError::Invalid(
                "SOURCE_WABA_ID and TARGET_WABA_ID must differ",
            ));
        }
        let log_file = raw
            .log_file
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());

        Ok(Config {
            api,
            source_account,
            target_account,
            template_names,
            skip_existing: raw.skip_existing.unwrap_or(true),
            log_file: PathBuf::from(log_file),
        })
    }
}

impl ApiSettings {
    /// Only the API settings; used by tools that inspect a single account.
    pub fn load(env_file: Option<&Path>) -> Result<Self, ConfigError> {
        load_env_file(env_file)?;
        Self::from_env_iter(std::env::vars())
    }

    pub fn from_env_iter<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let raw: RawEnv = envy::from_iter(vars)?;
        api_settings(&raw)
    }
}

fn load_env_file(env_file: Option<&Path>) -> Result<(), ConfigError> {
    match env_file {
        Some(path) => dotenvy::from_path(path).map_err(|source| ConfigError::EnvFile {
                path: path.to_path_buf(),
                source,
            }),
        None => {
            dotenvy::dotenv().ok();
            Ok(())
        }
    }
}

fn api_settings(raw: &RawEnv) -> Result<ApiSettings, ConfigError> {
    let access_token = required(raw.access_token.clone(), "ACCESS_TOKEN")?;
    let base_url = raw
        .graph_api_url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .unwrap_or(DEFAULT_GRAPH_API_URL)
        .trim_end_matches('/')
        .to_string();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::Invalid("GRAPH_API_URL must be an http(s) URL"));
    }
    let timeout_secs = raw.http_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(ConfigError::Invalid("HTTP_TIMEOUT_SECS must be > 0"));
    }
    Ok(ApiSettings {
        base_url,
        access_token,
        timeout: Duration::from_secs(timeout_secs),
    })
}

fn required(value: Option<String>, name: &'static str) -> Result<String, ConfigError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

/// Split a comma-separated allow-list, trimming entries and dropping blanks.
pub fn parse_name_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Example `.env` content.
pub fn example() -> &'static str {
    r#"ACCESS_TOKEN=YOUR_ACCESS_TOKEN
SOURCE_WABA_ID=SOURCE_WHATSAPP_BUSINESS_ACCOUNT_ID
TARGET_WABA_ID=TARGET_WHATSAPP_BUSINESS_ACCOUNT_ID
TEMPLATE_NAMES=welcome,order_update
# GRAPH_API_URL=https://graph.facebook.com/v20.0
# HTTP_TIMEOUT_SECS=60
# SKIP_EXISTING=true
# LOG_FILE=template_copy_log.csv
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn base() -> Vec<(String, String)> {
        vars(&[
            ("ACCESS_TOKEN", "token"),
            ("SOURCE_WABA_ID", "111"),
            ("TARGET_WABA_ID", "222"),
            ("TEMPLATE_NAMES", "welcome, order_update,,"),
        ])
    }

    fn without(key: &str) -> Vec<(String, String)> {
        base().into_iter().filter(|(k, _)| k != key).collect()
    }

    #[test]
    fn parse_minimal_env_ok() {
        let cfg = Config::from_env_iter(base()).unwrap();
        assert_eq!(cfg.source_account, "111");
        assert_eq!(cfg.target_account, "222");
        assert_eq!(cfg.template_names, vec!["welcome", "order_update"]);
        assert!(cfg.skip_existing);
        assert_eq!(cfg.api.base_url, DEFAULT_GRAPH_API_URL);
        assert_eq!(cfg.api.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(cfg.log_file, PathBuf::from(DEFAULT_LOG_FILE));
    }

    #[test]
    fn each_required_variable_is_reported_by_name() {
        for key in ["ACCESS_TOKEN", "SOURCE_WABA_ID", "TARGET_WABA_ID", "TEMPLATE_NAMES"] {
            let err = Config::from_env_iter(without(key)).unwrap_err();
            match err {
                ConfigError::Missing(name) => assert_eq!(name, key),
                other => panic!("wrong error for {}: {:?}", key, other),
            }
        }
    }

    #[test]
    fn blank_token_counts_as_missing() {
        let mut env = without("ACCESS_TOKEN");
        env.push(("ACCESS_TOKEN".into(), "   ".into()));
        assert!(matches!(
            Config::from_env_iter(env),
            Err(ConfigError::Missing("ACCESS_TOKEN"))
        ));
    }

    #[test]
    fn blank_allow_list_is_empty_not_missing() {
        let mut env = without("TEMPLATE_NAMES");
        env.push(("TEMPLATE_NAMES".into(), " , ".into()));
        let cfg = Config::from_env_iter(env).unwrap();
        assert!(cfg.template_names.is_empty());
    }

    #[test]
    fn optional_overrides_apply() {
        let mut env = base();
        env.extend(vars(&[
            ("GRAPH_API_URL", "http://localhost:9000/v19.0/"),
            ("HTTP_TIMEOUT_SECS", "5"),
            ("SKIP_EXISTING", "false"),
            ("LOG_FILE", "out.csv"),
        ]));
        let cfg = Config::from_env_iter(env).unwrap();
        assert_eq!(cfg.api.base_url, "http://localhost:9000/v19.0");
        assert_eq!(cfg.api.timeout, Duration::from_secs(5));
        assert!(!cfg.skip_existing);
        assert_eq!(cfg.log_file, PathBuf::from("out.csv"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut env = base();
        env.push(("HTTP_TIMEOUT_SECS".into(), "0".into()));
        assert!(matches!(
            Config::from_env_iter(env),
            Err(ConfigError::Invalid(_))
        ));

        let mut env = base();
        env.push(("GRAPH_API_URL".into(), "graph.facebook.com".into()));
        assert!(matches!(
            Config::from_env_iter(env),
            Err(ConfigError::Invalid(_))
        ));

        let mut env = without("TARGET_WABA_ID");
        env.push(("TARGET_WABA_ID".into(), "111".into()));
        assert!(matches!(
            Config::from_env_iter(env),
            Err(ConfigError::Invalid(_))
        ));

        let mut env = base();
        env.push(("HTTP_TIMEOUT_SECS".into(), "soon".into()));
        assert!(matches!(Config::from_env_iter(env), Err(ConfigError::Env(_))));
    }

    #[test]
    fn api_settings_only_need_token() {
        let api = ApiSettings::from_env_iter(vars(&[("ACCESS_TOKEN", "t")])).unwrap();
        assert_eq!(api.access_token, "t");
        assert!(matches!(
            ApiSettings::from_env_iter(Vec::new()),
            Err(ConfigError::Missing("ACCESS_TOKEN"))
        ));
    }

    #[test]
    fn debug_output_hides_token() {
        let cfg = Config::from_env_iter(base()).unwrap();
        let printed = format!("{:?}", cfg);
        assert!(!printed.contains("\"token\""));
        assert!(printed.contains("base_url"));
    }

    #[test]
    fn parse_name_list_trims_and_skips_blanks() {
        assert_eq!(parse_name_list(" a ,b,, ,c"), vec!["a", "b", "c"]);
        assert!(parse_name_list("").is_empty());
    }

    #[test]
    fn missing_env_file_is_an_error() {
        let td = tempdir().unwrap();
        let err = Config::load(Some(&td.path().join("absent.env"))).unwrap_err();
        assert!(matches!(err, ConfigError::EnvFile { .. }));
    }

    #[test]
    fn example_env_file_parses() {
        let td = tempdir().unwrap();
        let p = td.path().join("example.env");
        let mut f = std::fs::File::create(&p).unwrap();
        f.write_all(example().as_bytes()).unwrap();
        let pairs: Vec<(String, String)> = dotenvy::from_path_iter(&p)
            .unwrap()
            .map(|item| item.unwrap())
            .collect();
        let cfg = Config::from_env_iter(pairs).unwrap();
        assert_eq!(cfg.template_names, vec!["welcome", "order_update"]);
    }
}
