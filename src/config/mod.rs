use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub translation: TranslationConfig,
    #[serde(default)]
    pub tts: TtsConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MediaConfig {
    /// Directory audio files are written under.
    pub root: String,
    /// URL prefix the media directory is served from.
    pub url_prefix: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: "media".to_string(),
            url_prefix: "/media".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    /// Bearer token granting admin privilege. Admin routes reject everything when unset.
    pub admin_token: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TranslationConfig {
    pub gemini_api_key: Option<String>,
    pub model: String,
    pub api_url: String,
    pub timeout_secs: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            model: "gemini-pro".to_string(),
            api_url: "https://generativelanguage.googleapis.com".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TtsConfig {
    /// Base URL of a Coqui TTS server (`tts-server`), primary engine.
    pub coqui_url: Option<String>,
    /// Language codes the Coqui server has a model for.
    pub coqui_languages: Vec<String>,
    /// eSpeak NG binary, fallback engine.
    pub espeak_binary: Option<String>,
    pub timeout_secs: u64,
    /// Languages synthesized in parallel per announcement.
    pub concurrency: usize,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            coqui_url: None,
            coqui_languages: ["en", "hi", "ta", "te", "bn", "kn"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            espeak_binary: None,
            timeout_secs: 60,
            concurrency: 2,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct QueueConfig {
    pub workers: usize,
    pub capacity: usize,
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
    /// Delay used by "mark fixed, auto-remove" when the request names none.
    pub resolve_delete_delay_secs: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            capacity: 256,
            max_attempts: 3,
            retry_delay_secs: 60,
            resolve_delete_delay_secs: 300,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    pub snapshot_limit: usize,
    pub subscriber_buffer: usize,
    pub list_limit: i64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            snapshot_limit: 10,
            subscriber_buffer: 32,
            list_limit: 50,
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // A missing .env is the normal case in production
        let _ = dotenvy::dotenv();

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.base_url", "http://localhost:8080")?
            .set_default("database.url", "sqlite://railannounce.db?mode=rwc")?
            .set_default("database.max_connections", 10)?

            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))

            // Add environment variables (with RAILANNOUNCE__ prefix, double underscore separates levels)
            .add_source(
                Environment::with_prefix("RAILANNOUNCE")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("tts.coqui_languages")
                    .try_parsing(true),
            )

            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                base_url: "http://localhost:8080".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite://railannounce.db?mode=rwc".to_string(),
                max_connections: 10,
            },
            media: MediaConfig::default(),
            auth: AuthConfig::default(),
            translation: TranslationConfig::default(),
            tts: TtsConfig::default(),
            queue: QueueConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}
