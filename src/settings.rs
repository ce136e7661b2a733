use argon2::PasswordHash;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use dotenv::dotenv;
use jsonwebtoken::{DecodingKey, EncodingKey};
use std::{env, fmt, path::PathBuf, str::FromStr, time::Duration};
use zeroize::Zeroizing;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    #[serde(default)]
    pub database_url: String,

    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default)]
    pub session_secret: String,

    #[serde(default = "default_session_ttl")]
    pub session_ttl_minutes: i64,

    /// Argon2 PHC string of the shared diary password.
    #[serde(default)]
    pub access_password_hash: String,

    #[serde(default = "default_storage_root")]
    pub storage_root: PathBuf,

    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    #[serde(default)]
    pub ai_api_key: String,

    #[serde(default = "default_ai_base_url")]
    pub ai_base_url: String,

    #[serde(default = "default_ai_text_model")]
    pub ai_text_model: String,

    #[serde(default = "default_ai_speech_model")]
    pub ai_speech_model: String,

    #[serde(default = "default_ai_video_model")]
    pub ai_video_model: String,

    #[serde(default = "default_video_poll_interval")]
    pub video_poll_interval_secs: u64,

    #[serde(default = "default_video_max_wait")]
    pub video_max_wait_secs: u64,

    #[serde(default = "default_view_cache_ttl")]
    pub view_cache_ttl_secs: u64,

    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,

    /// Key rate limits on `X-Forwarded-For` when running behind a proxy.
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "Memory-Diary".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_worker_count() -> usize {
    num_cpus::get()
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_session_ttl() -> i64 {
    12 * 60
}
fn default_storage_root() -> PathBuf {
    PathBuf::from("./data/objects")
}
fn default_public_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}
fn default_max_upload_bytes() -> usize {
    15 * 1024 * 1024
}
fn default_ai_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}
fn default_ai_text_model() -> String {
    "gemini-2.0-flash".to_string()
}
fn default_ai_speech_model() -> String {
    "gemini-2.5-flash-preview-tts".to_string()
}
fn default_ai_video_model() -> String {
    "veo-3.0-generate-preview".to_string()
}
fn default_video_poll_interval() -> u64 {
    5
}
fn default_video_max_wait() -> u64 {
    10 * 60
}
fn default_view_cache_ttl() -> u64 {
    60
}
fn default_rate_limit() -> u32 {
    30
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))?;

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name)).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors_allowed_origins")
                    .ignore_empty(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;

        config.database_url = fill_or_env(config.database_url, "APP_DATABASE_URL")?;
        config.session_secret = fill_or_env(config.session_secret, "APP_SESSION_SECRET")?;
        config.access_password_hash = fill_or_env(config.access_password_hash, "APP_ACCESS_PASSWORD_HASH")?;

        if config.ai_api_key.is_empty() {
            config.ai_api_key = env::var("GEMINI_API_KEY").unwrap_or_default();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.database_url.trim().is_empty() {
            errors.push("DATABASE_URL cannot be empty");
        }
        if self.session_secret.len() < 32 {
            errors.push("SESSION_SECRET must be at least 32 characters");
        }
        if PasswordHash::new(&self.access_password_hash).is_err() {
            errors.push("ACCESS_PASSWORD_HASH must be an argon2 PHC string");
        }
        if url::Url::parse(&self.public_base_url).is_err() {
            errors.push("PUBLIC_BASE_URL must be an absolute URL");
        }
        if self.video_poll_interval_secs == 0 {
            errors.push("VIDEO_POLL_INTERVAL_SECS must be greater than zero");
        }
        if self.session_ttl_minutes <= 0 {
            errors.push("SESSION_TTL_MINUTES must be positive");
        }
        if self.is_production() && self.cors_origins().iter().any(|o| o == "*") {
            errors.push("Wildcard CORS (*) is not allowed in production");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .iter()
            .flat_map(|origin| origin.split(','))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn video_poll_interval(&self) -> Duration {
        Duration::from_secs(self.video_poll_interval_secs)
    }

    pub fn video_max_wait(&self) -> Duration {
        Duration::from_secs(self.video_max_wait_secs)
    }

    pub fn view_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.view_cache_ttl_secs)
    }
}

fn fill_or_env(current: String, env_key: &str) -> Result<String, ConfigError> {
    if current.trim().is_empty() {
        env::var(env_key).map_err(|_| ConfigError::Message(format!("{env_key} must be set")))
    } else {
        Ok(current)
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

trait Redact {
    fn redact(&self) -> &str;
}

impl Redact for str {
    fn redact(&self) -> &str {
        if self.is_empty() {
            "[MISSING]"
        } else {
            "[REDACTED]"
        }
    }
}

impl Redact for String {
    fn redact(&self) -> &str {
        self.as_str().redact()
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("port", &self.port)
            .field("host", &self.host)
            .field("worker_count", &self.worker_count)
            .field("database_url", &self.database_url.redact())
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("session_secret", &self.session_secret.redact())
            .field("session_ttl_minutes", &self.session_ttl_minutes)
            .field("access_password_hash", &self.access_password_hash.redact())
            .field("storage_root", &self.storage_root)
            .field("public_base_url", &self.public_base_url)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("ai_api_key", &self.ai_api_key.redact())
            .field("ai_base_url", &self.ai_base_url)
            .field("ai_text_model", &self.ai_text_model)
            .field("ai_speech_model", &self.ai_speech_model)
            .field("ai_video_model", &self.ai_video_model)
            .field("video_poll_interval_secs", &self.video_poll_interval_secs)
            .field("video_max_wait_secs", &self.video_max_wait_secs)
            .field("view_cache_ttl_secs", &self.view_cache_ttl_secs)
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("trust_forwarded_for", &self.trust_forwarded_for)
            .finish()
    }
}

#[derive(Clone)]
pub struct SessionKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
}

impl From<&AppConfig> for SessionKeys {
    fn from(config: &AppConfig) -> Self {
        let secret = Zeroizing::new(config.session_secret.clone());

        SessionKeys {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

impl fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKeys")
            .field("encoding", &"[REDACTED]")
            .field("decoding", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig {
            env: AppEnvironment::Testing,
            name: "Memory-Diary Test".into(),
            port: 0,
            host: "127.0.0.1".into(),
            worker_count: 1,
            database_url: "postgres://localhost/diary_test".into(),
            cors_allowed_origins: vec!["*".into()],
            session_secret: "a-session-secret-that-is-long-enough-0123456789".into(),
            session_ttl_minutes: 60,
            access_password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$2xyaPb2bVfb7MbMdZjpcSgzq8yw1Xv5jBOUNp0XVxyY".into(),
            storage_root: PathBuf::from("/tmp/objects"),
            public_base_url: "http://localhost:8080".into(),
            max_upload_bytes: 1024,
            ai_api_key: String::new(),
            ai_base_url: default_ai_base_url(),
            ai_text_model: default_ai_text_model(),
            ai_speech_model: default_ai_speech_model(),
            ai_video_model: default_ai_video_model(),
            video_poll_interval_secs: 5,
            video_max_wait_secs: 600,
            view_cache_ttl_secs: 60,
            rate_limit_per_minute: 30,
            trust_forwarded_for: false,
        }
    }

    #[test]
    fn accepts_complete_config() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn rejects_wildcard_cors_in_production() {
        let mut config = base_config();
        config.env = AppEnvironment::Production;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("Wildcard CORS"));
    }

    #[test]
    fn rejects_zero_poll_interval_and_bad_hash() {
        let mut config = base_config();
        config.video_poll_interval_secs = 0;
        config.access_password_hash = "plaintext".into();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("VIDEO_POLL_INTERVAL_SECS"));
        assert!(err.contains("ACCESS_PASSWORD_HASH"));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let rendered = format!("{:?}", base_config());
        assert!(!rendered.contains("a-session-secret"));
        assert!(rendered.contains("[REDACTED]"));
        assert!(rendered.contains("[MISSING]"));
    }

    #[test]
    fn splits_comma_separated_origins() {
        let mut config = base_config();
        config.cors_allowed_origins = vec!["https://a.example, https://b.example".into()];
        assert_eq!(config.cors_origins(), vec!["https://a.example", "https://b.example"]);
    }
}
