use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub speech: SpeechConfig,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    /// WebSocket endpoint of the streaming recognition gateway
    pub url: String,

    /// BCP-47 language code for recognition sessions
    pub language_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Directory of static dashboard assets
    pub assets_path: String,
}

impl Config {
    /// Load configuration from the named file (if present) with
    /// `CALLSCRIBE_*` environment overrides, e.g.
    /// `CALLSCRIBE_SPEECH__LANGUAGE_CODE=en-US`.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", "callscribe")?
            .set_default("service.http.bind", "0.0.0.0")?
            .set_default("service.http.port", 3000)?
            .set_default("speech.url", "ws://localhost:8085/v1/recognize")?
            .set_default("speech.language_code", "ar-SA")?
            .set_default("dashboard.assets_path", "public")?
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("CALLSCRIBE").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: "callscribe".to_string(),
                http: HttpConfig {
                    bind: "0.0.0.0".to_string(),
                    port: 3000,
                },
            },
            speech: SpeechConfig {
                url: "ws://localhost:8085/v1/recognize".to_string(),
                language_code: "ar-SA".to_string(),
            },
            dashboard: DashboardConfig {
                assets_path: "public".to_string(),
            },
        }
    }
}
