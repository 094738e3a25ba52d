//! Lightweight configuration loader, typed pipeline settings and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars.
//! The `chatbot` section deserializes into [`Settings`]; every field has a
//! default so an absent config file still yields a runnable setup.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Typed pipeline settings from the `chatbot` section, validated.
    pub fn settings(&self) -> Result<Settings> {
        let settings = if self.figment.contains("chatbot") {
            self.figment
                .extract_inner::<Settings>("chatbot")
                .map_err(|e| Error::InvalidConfig(e.to_string()))?
        } else {
            Settings::default()
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        match env {
            "prod" | "production" => {
                let fake = env::var("APP_USE_FAKE_SCORER").map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false);
                if fake {
                    anyhow::bail!("APP_USE_FAKE_SCORER is not allowed in production");
                }
            }
            "dev" | "development" | "test" | "testing" => {}
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub artifacts: ArtifactPaths,
    /// Fixed length of every vectorized input.
    pub max_len: usize,
    /// Inputs whose out-of-vocabulary ratio exceeds this are refused.
    pub oov_threshold: f64,
    /// Intents whose answers get the first knowledge-base example appended.
    pub technical_intents: Vec<String>,
    pub lemmatizer: LemmatizerSettings,
    pub messages: Messages,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            artifacts: ArtifactPaths::default(),
            max_len: 600,
            oov_threshold: 0.4,
            technical_intents: vec!["programacion".to_string(), "ciberseguridad".to_string()],
            lemmatizer: LemmatizerSettings::default(),
            messages: Messages::default(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.max_len == 0 {
            return Err(Error::InvalidConfig("max_len must be greater than zero".to_string()));
        }
        if !(0.0..=1.0).contains(&self.oov_threshold) {
            return Err(Error::InvalidConfig(format!(
                "oov_threshold must be within [0, 1], got {}",
                self.oov_threshold
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ArtifactPaths {
    /// Base directory; the other entries are resolved against it unless absolute.
    pub dir: String,
    pub vocabulary: String,
    pub response_map: String,
    pub knowledge_base: String,
    pub model: String,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            dir: "artifacts".to_string(),
            vocabulary: "vocabulary.json".to_string(),
            response_map: "response_map.json".to_string(),
            knowledge_base: "data.json".to_string(),
            model: "model.safetensors".to_string(),
        }
    }
}

impl ArtifactPaths {
    pub fn base(&self) -> PathBuf {
        expand_path(&self.dir)
    }

    pub fn vocabulary_path(&self) -> PathBuf {
        resolve_with_base(&self.base(), &self.vocabulary)
    }

    pub fn response_map_path(&self) -> PathBuf {
        resolve_with_base(&self.base(), &self.response_map)
    }

    pub fn knowledge_base_path(&self) -> PathBuf {
        resolve_with_base(&self.base(), &self.knowledge_base)
    }

    pub fn model_path(&self) -> PathBuf {
        resolve_with_base(&self.base(), &self.model)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LemmatizerSettings {
    /// Snowball language name understood by the text crate (e.g. `spanish`).
    pub language: String,
}

impl Default for LemmatizerSettings {
    fn default() -> Self {
        Self { language: "spanish".to_string() }
    }
}

/// User-facing texts for the pipeline's fixed outcomes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Messages {
    pub math_failure: String,
    pub empty_input: String,
    pub low_confidence: String,
    pub missing_message: String,
    pub service_failure: String,
    pub farewell: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            math_failure: "No pude calcular esa expresión matemática. ¿Podrías formularla de otra manera?".to_string(),
            empty_input: "Lo siento, no te entendí.".to_string(),
            low_confidence: "Como asistente virtual, solo puedo ayudarte con informacion relacionada a saferide y transporte seguro. ¿Puedes formular tu pregunta de otra manera?".to_string(),
            missing_message: "Por favor, envía un mensaje.".to_string(),
            service_failure: "Lo siento, ocurrió un error interno. Intenta de nuevo más tarde.".to_string(),
            farewell: "Pura vida, hasta luego.".to_string(),
        }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
