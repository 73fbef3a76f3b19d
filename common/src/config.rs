use serde::Deserialize;

use crate::error::AppError;

/// Ambient application configuration — LM connection details the core's
/// collaborators need but whose file format/lifecycle spec.md explicitly
/// excludes from the core's contract (§1 Non-goals). Shaped after the
/// template's `AppConfig`/`get_config`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub openai_api_key: String,
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_model")]
    pub chat_model: String,
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

/// Loads configuration from an optional `config` file plus environment
/// variables, following the template's `get_config`.
pub fn get_config() -> Result<AppConfig, AppError> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name("config").required(false))
        .add_source(config::Environment::default())
        .build()
        .map_err(|e| AppError::Validation(format!("failed to load configuration: {e}")))?;

    builder
        .try_deserialize::<AppConfig>()
        .map_err(|e| AppError::Validation(format!("failed to load configuration: {e}")))
}
