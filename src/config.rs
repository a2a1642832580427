//! Configuration types for script-voice-relay
//!
//! Every component receives its section of [`Config`] at construction time.
//! [`Config::from_env`] is the only place that reads the process environment.

use crate::error::{Error, Result};
use crate::transcript::TranscriptStrategy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{net::SocketAddr, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Environment variable names read by [`Config::from_env`]
pub mod env {
    /// Agent service API key (required)
    pub const AGENT_API_KEY: &str = "BROWSER_USE_API_KEY";
    /// Agent service base URL
    pub const AGENT_BASE_URL: &str = "AGENT_BASE_URL";
    /// Text-to-speech account email (required)
    pub const SPEECH_EMAIL: &str = "ELEVENLABS_EMAIL";
    /// Text-to-speech account password (required)
    pub const SPEECH_PASSWORD: &str = "ELEVENLABS_PASSWORD";
    /// Text-to-speech API key for history and audio download
    pub const SPEECH_API_KEY: &str = "ELEVENLABS_API_KEY";
    /// Text-to-speech API base URL
    pub const SPEECH_BASE_URL: &str = "ELEVENLABS_BASE_URL";
    /// Text-to-speech web application page the agent opens
    pub const SPEECH_APP_URL: &str = "ELEVENLABS_APP_URL";
    /// Default voice used when a request does not name one
    pub const VOICE_ID: &str = "VOICE_ID";
    /// Local directory for downloaded audio
    pub const DOWNLOAD_DIR: &str = "DOWNLOAD_DIR";
    /// Destination bucket
    pub const BUCKET: &str = "S3_BUCKET_NAME";
    /// Object key prefix
    pub const KEY_PREFIX: &str = "S3_AUDIO_FOLDER";
    /// Storage region
    pub const REGION: &str = "AWS_DEFAULT_REGION";
    /// Storage access key id
    pub const ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
    /// Storage secret access key
    pub const SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
    /// Custom endpoint for S3-compatible stores
    pub const STORAGE_ENDPOINT: &str = "S3_ENDPOINT";
    /// Presigned URL lifetime in seconds
    pub const URL_TTL_SECS: &str = "S3_URL_TTL_SECS";
    /// Job completion deadline in seconds
    pub const JOB_DEADLINE_SECS: &str = "JOB_DEADLINE_SECS";
    /// Address the HTTP API binds to
    pub const BIND_ADDRESS: &str = "BIND_ADDRESS";
    /// Optional key clients must send in `X-Api-Key`
    pub const SERVICE_API_KEY: &str = "SERVICE_API_KEY";
    /// Fallback log filter when `RUST_LOG` is unset
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
    /// `json` switches log output to JSON lines
    pub const LOG_FORMAT: &str = "LOG_FORMAT";
}

/// A credential that never shows up in `Debug` output or serialized config
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    /// Wrap a secret value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw secret, for building requests
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString([redacted])")
    }
}

impl Serialize for SecretString {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str("[redacted]")
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(SecretString)
    }
}

/// Agent (browser automation) service settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Bearer token for the agent service (required)
    #[serde(default)]
    pub api_key: Option<SecretString>,

    /// Base URL of the agent service (default: "https://api.browser-use.com")
    #[serde(default = "default_agent_base_url")]
    pub base_url: String,

    /// Timeout for a single HTTP request to the agent service (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_agent_base_url(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Text-to-speech service settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Account email the agent logs in with (required)
    #[serde(default)]
    pub email: Option<String>,

    /// Account password the agent logs in with (required)
    #[serde(default)]
    pub password: Option<SecretString>,

    /// API key for history listing and audio download
    ///
    /// Without it the history is always empty and downloads fail, so the
    /// response degrades instead of the request failing.
    #[serde(default)]
    pub api_key: Option<SecretString>,

    /// Base URL of the speech API (default: "https://api.elevenlabs.io")
    #[serde(default = "default_speech_base_url")]
    pub base_url: String,

    /// Page the agent opens to generate speech
    #[serde(default = "default_speech_app_url")]
    pub app_url: String,

    /// Voice selected when the request does not name one
    #[serde(default)]
    pub default_voice_id: Option<String>,

    /// Directory downloaded audio is written to (default: "uploads")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// File extension of downloaded audio (default: "mp3")
    #[serde(default = "default_audio_extension")]
    pub audio_extension: String,

    /// Timeout for a single HTTP request to the speech API (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            email: None,
            password: None,
            api_key: None,
            base_url: default_speech_base_url(),
            app_url: default_speech_app_url(),
            default_voice_id: None,
            download_dir: default_download_dir(),
            audio_extension: default_audio_extension(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Object storage settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Destination bucket; publishing is skipped when unset
    #[serde(default)]
    pub bucket: Option<String>,

    /// Prepended verbatim to the file name to form the object key
    #[serde(default)]
    pub key_prefix: Option<String>,

    /// Bucket region (default: "us-east-1")
    #[serde(default = "default_region")]
    pub region: String,

    /// Static access key id (falls back to the ambient credential chain when unset)
    #[serde(default)]
    pub access_key_id: Option<String>,

    /// Static secret access key
    #[serde(default)]
    pub secret_access_key: Option<SecretString>,

    /// Custom endpoint for S3-compatible stores
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Lifetime of presigned URLs (default: 3600 seconds)
    #[serde(default = "default_url_ttl", with = "duration_serde")]
    pub url_ttl: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            key_prefix: None,
            region: default_region(),
            access_key_id: None,
            secret_access_key: None,
            endpoint: None,
            url_ttl: default_url_ttl(),
        }
    }
}

/// Intervals and ceilings of the two polling loops
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Sleep between job status polls (default: 3 seconds)
    #[serde(default = "default_job_interval", with = "duration_serde")]
    pub job_interval: Duration,

    /// Give up waiting for the job after this long (default: 20 minutes)
    #[serde(default = "default_job_deadline", with = "duration_serde")]
    pub job_deadline: Duration,

    /// Sleep between history listings while resolving the artifact (default: 2 seconds)
    #[serde(default = "default_history_interval", with = "duration_serde")]
    pub history_interval: Duration,

    /// Stop looking for a new history item after this long (default: 30 seconds)
    #[serde(default = "default_history_ceiling", with = "duration_serde")]
    pub history_ceiling: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            job_interval: default_job_interval(),
            job_deadline: default_job_deadline(),
            history_interval: default_history_interval(),
            history_ceiling: default_history_ceiling(),
        }
    }
}

/// Enhanced transcript selection
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TranscriptConfig {
    /// Strategies tried in order; the first match wins
    #[serde(default = "default_transcript_strategies")]
    pub strategies: Vec<TranscriptStrategy>,
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            strategies: default_transcript_strategies(),
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 0.0.0.0:8000)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Optional API key required in the `X-Api-Key` header
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub api_key: Option<SecretString>,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            api_key: None,
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

/// Main configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Agent service
    #[serde(default)]
    pub agent: AgentConfig,

    /// Text-to-speech service
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Object storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Polling intervals and ceilings
    #[serde(default)]
    pub polling: PollingConfig,

    /// Enhanced transcript selection
    #[serde(default)]
    pub transcript: TranscriptConfig,

    /// HTTP API
    #[serde(default)]
    pub api: ApiConfig,

    /// Log filter used when `RUST_LOG` is unset (default: "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON log lines
    #[serde(default)]
    pub log_json: bool,
}

impl Config {
    /// Load configuration from the process environment, reading `.env` first if present
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Empty values count as unset. Values that fail to parse are
    /// configuration errors naming the variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let secret = |key: &str| get(key).map(SecretString::new);

        let mut config = Config::default();

        config.agent.api_key = secret(env::AGENT_API_KEY);
        if let Some(url) = get(env::AGENT_BASE_URL) {
            config.agent.base_url = url;
        }

        config.speech.email = get(env::SPEECH_EMAIL);
        config.speech.password = secret(env::SPEECH_PASSWORD);
        config.speech.api_key = secret(env::SPEECH_API_KEY);
        config.speech.default_voice_id = get(env::VOICE_ID);
        if let Some(url) = get(env::SPEECH_BASE_URL) {
            config.speech.base_url = url;
        }
        if let Some(url) = get(env::SPEECH_APP_URL) {
            config.speech.app_url = url;
        }
        if let Some(dir) = get(env::DOWNLOAD_DIR) {
            config.speech.download_dir = PathBuf::from(dir);
        }

        config.storage.bucket = get(env::BUCKET);
        config.storage.key_prefix = get(env::KEY_PREFIX);
        config.storage.access_key_id = get(env::ACCESS_KEY_ID);
        config.storage.secret_access_key = secret(env::SECRET_ACCESS_KEY);
        config.storage.endpoint = get(env::STORAGE_ENDPOINT);
        if let Some(region) = get(env::REGION) {
            config.storage.region = region;
        }
        if let Some(raw) = get(env::URL_TTL_SECS) {
            config.storage.url_ttl = parse_secs(env::URL_TTL_SECS, &raw)?;
        }
        if let Some(raw) = get(env::JOB_DEADLINE_SECS) {
            config.polling.job_deadline = parse_secs(env::JOB_DEADLINE_SECS, &raw)?;
        }

        if let Some(raw) = get(env::BIND_ADDRESS) {
            config.api.bind_address = raw.parse().map_err(|e| {
                Error::config(env::BIND_ADDRESS, format!("{} is not a socket address: {e}", env::BIND_ADDRESS))
            })?;
        }
        config.api.api_key = secret(env::SERVICE_API_KEY);

        if let Some(level) = get(env::LOG_LEVEL) {
            config.log_level = level;
        }
        config.log_json = get(env::LOG_FORMAT).is_some_and(|f| f.eq_ignore_ascii_case("json"));

        Ok(config)
    }

    /// Check the settings every request depends on
    ///
    /// Runs once when the [`Orchestrator`](crate::Orchestrator) is built.
    pub fn validate(&self) -> Result<()> {
        if self.agent.api_key.is_none() {
            return Err(Error::config(
                env::AGENT_API_KEY,
                format!("{} is not set in the environment", env::AGENT_API_KEY),
            ));
        }
        if self.speech.email.is_none() || self.speech.password.is_none() {
            let key = if self.speech.email.is_none() {
                env::SPEECH_EMAIL
            } else {
                env::SPEECH_PASSWORD
            };
            return Err(Error::config(
                key,
                format!(
                    "{} and {} must be set in the environment",
                    env::SPEECH_EMAIL,
                    env::SPEECH_PASSWORD
                ),
            ));
        }
        check_http_url(env::AGENT_BASE_URL, &self.agent.base_url)?;
        check_http_url(env::SPEECH_BASE_URL, &self.speech.base_url)?;
        check_http_url(env::SPEECH_APP_URL, &self.speech.app_url)?;
        if let Some(endpoint) = &self.storage.endpoint {
            check_http_url(env::STORAGE_ENDPOINT, endpoint)?;
        }
        if self.polling.job_interval.is_zero() || self.polling.history_interval.is_zero() {
            return Err(Error::config(
                "polling",
                "polling intervals must be greater than zero",
            ));
        }
        if self.storage.url_ttl.is_zero() || self.storage.url_ttl > MAX_PRESIGNED_TTL {
            return Err(Error::config(
                env::URL_TTL_SECS,
                format!(
                    "presigned URL lifetime must be between 1 and {} seconds",
                    MAX_PRESIGNED_TTL.as_secs()
                ),
            ));
        }
        if self.speech.audio_extension.is_empty() || self.speech.audio_extension.contains(['/', '\\', '.']) {
            return Err(Error::config(
                "speech.audio_extension",
                "audio extension must be a bare extension such as \"mp3\"",
            ));
        }
        Ok(())
    }
}

/// Longest lifetime S3 accepts for a presigned URL (7 days)
const MAX_PRESIGNED_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

fn check_http_url(key: &str, raw: &str) -> Result<()> {
    match url::Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        Ok(url) => Err(Error::config(key, format!("{key} must be an http(s) URL, got scheme {:?}", url.scheme()))),
        Err(e) => Err(Error::config(key, format!("{key} is not a valid URL: {e}"))),
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<Duration> {
    raw.parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| Error::config(key, format!("{key} must be a whole number of seconds, got {raw:?}")))
}

fn default_agent_base_url() -> String {
    "https://api.browser-use.com".into()
}

fn default_speech_base_url() -> String {
    "https://api.elevenlabs.io".into()
}

fn default_speech_app_url() -> String {
    "https://elevenlabs.io/app/speech-synthesis/text-to-speech".into()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_audio_extension() -> String {
    "mp3".into()
}

fn default_region() -> String {
    "us-east-1".into()
}

fn default_url_ttl() -> Duration {
    Duration::from_secs(3600)
}

fn default_job_interval() -> Duration {
    Duration::from_secs(3)
}

fn default_job_deadline() -> Duration {
    Duration::from_secs(20 * 60)
}

fn default_history_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_history_ceiling() -> Duration {
    Duration::from_secs(30)
}

fn default_transcript_strategies() -> Vec<TranscriptStrategy> {
    vec![
        TranscriptStrategy::LongerThanInput,
        TranscriptStrategy::default_keywords(),
    ]
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

fn default_log_level() -> String {
    "info".into()
}

fn default_true() -> bool {
    true
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
