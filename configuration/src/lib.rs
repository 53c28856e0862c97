use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub location: LocationConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub transcription: TranscriptionConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    #[serde(default = "default_recorder_tick_ms")]
    pub recorder_tick_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_items: default_max_items(),
            recorder_tick_ms: default_recorder_tick_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    #[serde(default = "default_fresh_fix_timeout_ms")]
    pub fresh_fix_timeout_ms: u64,
    #[serde(default)]
    pub fixed_latitude: Option<f64>,
    #[serde(default)]
    pub fixed_longitude: Option<f64>,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            fresh_fix_timeout_ms: default_fresh_fix_timeout_ms(),
            fixed_latitude: None,
            fixed_longitude: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_upload_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            base_url: default_upload_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    #[serde(default = "default_transcription_base_url")]
    pub base_url: String,
    #[serde(default = "default_transcription_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            base_url: default_transcription_base_url(),
            request_timeout_ms: default_transcription_timeout_ms(),
            language: default_language(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    #[serde(default = "default_library_dir")]
    pub library_dir: String,
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            library_dir: default_library_dir(),
            scratch_dir: default_scratch_dir(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub bearer_token: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub user_first_name: Option<String>,
    #[serde(default)]
    pub user_last_name: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            capture: CaptureConfig::default(),
            location: LocationConfig::default(),
            upload: UploadConfig::default(),
            transcription: TranscriptionConfig::default(),
            media: MediaConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_items() -> usize {
    20
}

fn default_recorder_tick_ms() -> u64 {
    1_000
}

fn default_fresh_fix_timeout_ms() -> u64 {
    5_000
}

fn default_upload_base_url() -> String {
    "http://127.0.0.1:8081/api".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_probe_timeout_ms() -> u64 {
    2_000
}

fn default_transcription_base_url() -> String {
    "http://127.0.0.1:8082/speech".to_string()
}

fn default_transcription_timeout_ms() -> u64 {
    60_000
}

fn default_language() -> String {
    "en".to_string()
}

fn default_library_dir() -> String {
    "./media".to_string()
}

fn default_scratch_dir() -> String {
    std::env::temp_dir()
        .join("capture-scratch")
        .to_string_lossy()
        .into_owned()
}

/// `config/{RUN_ENV}.toml` when present, then `CAPTURE_SERVICE_*` environment
/// overrides (nested keys joined with `__`), then the compiled defaults.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let run_env = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".to_string());
    Config::builder()
        .add_source(File::with_name(&format!("config/{run_env}")).required(false))
        .add_source(Environment::with_prefix("CAPTURE_SERVICE").separator("__"))
        .build()?
        .try_deserialize()
}

pub fn setup_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_deterministic() {
        let config = AppConfig::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.capture.max_items, 20);
        assert_eq!(config.capture.recorder_tick_ms, 1_000);
        assert_eq!(config.location.fresh_fix_timeout_ms, 5_000);
        assert_eq!(config.upload.probe_timeout_ms, 2_000);
        assert_eq!(config.transcription.language, "en");
        assert_eq!(config.auth.bearer_token, None);
    }

    #[test]
    fn an_empty_source_deserializes_to_the_defaults() {
        let config: AppConfig = Config::builder()
            .build()
            .expect("an empty build cannot fail")
            .try_deserialize()
            .expect("defaults must fill every field");
        assert_eq!(config.capture.max_items, AppConfig::default().capture.max_items);
        assert_eq!(config.upload.base_url, AppConfig::default().upload.base_url);
    }

    #[test]
    fn toml_fragments_override_single_fields() {
        let config: AppConfig = Config::builder()
            .add_source(config::File::from_str(
                "[capture]\nmax_items = 5\n",
                config::FileFormat::Toml,
            ))
            .build()
            .expect("inline source must parse")
            .try_deserialize()
            .expect("partial config must deserialize");
        assert_eq!(config.capture.max_items, 5);
        assert_eq!(config.capture.recorder_tick_ms, 1_000);
    }
}
