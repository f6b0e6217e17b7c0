//! Layered configuration, typed settings and credential resolution.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`__` separates nested keys, e.g. `APP_HTTP__TIMEOUT_SECS`). Credentials are
//! read from the merged config first and fall back to a TOML secrets file.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{Error, Result};

pub const DEFAULT_EMBEDDING_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/intfloat/multilingual-e5-large";
pub const DEFAULT_INDEX_NAME: &str = "movies-embeddings";
pub const DEFAULT_CLOUD: &str = "aws";
pub const DEFAULT_REGION: &str = "us-east-1";

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        Ok(Self::from_figment(figment))
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{}': {}", key, e)))
    }

    /// Typed settings with `PINECONE_CLOUD` / `PINECONE_REGION` applied.
    pub fn settings(&self) -> Result<Settings> {
        let mut settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        if let Some(cloud) = non_empty_env("PINECONE_CLOUD") {
            settings.vector_store.cloud = cloud;
        }
        if let Some(region) = non_empty_env("PINECONE_REGION") {
            settings.vector_store.region = region;
        }
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub embedding: EmbeddingSettings,
    pub vector_store: VectorStoreSettings,
    pub http: HttpSettings,
    pub display: DisplaySettings,
    pub secrets: SecretsSettings,
}

impl Settings {
    fn validate(&self) -> Result<()> {
        if self.embedding.endpoint.trim().is_empty() {
            return Err(Error::InvalidConfig("embedding.endpoint is empty".into()));
        }
        if self.embedding.dimension == Some(0) {
            return Err(Error::InvalidConfig("embedding.dimension must be positive".into()));
        }
        if self.vector_store.host.is_none() && self.vector_store.index_name.trim().is_empty() {
            return Err(Error::InvalidConfig("vector_store needs an index_name or a host".into()));
        }
        if self.http.timeout_secs == 0 {
            return Err(Error::InvalidConfig("http.timeout_secs must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub endpoint: String,
    /// Ask the service to block until a cold model is loaded.
    pub wait_for_model: bool,
    pub dimension: Option<usize>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_EMBEDDING_ENDPOINT.to_string(),
            wait_for_model: true,
            dimension: Some(1024),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    pub index_name: String,
    pub control_plane_url: String,
    /// Data-plane host; when unset it is resolved from the control plane.
    pub host: Option<String>,
    pub cloud: String,
    pub region: String,
    pub api_version: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            index_name: DEFAULT_INDEX_NAME.to_string(),
            control_plane_url: "https://api.pinecone.io".to_string(),
            host: None,
            cloud: DEFAULT_CLOUD.to_string(),
            region: DEFAULT_REGION.to_string(),
            api_version: "2024-07".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_ms: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self { timeout_secs: 60, max_retries: 2, backoff_ms: 250 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub link_prefix: String,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self { link_prefix: "https://www.imdb.com/".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretsSettings {
    pub file: String,
}

impl Default for SecretsSettings {
    fn default() -> Self {
        Self { file: "~/.config/cinesearch/secrets.toml".to_string() }
    }
}

/// A hosted service that needs an API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Embedding,
    VectorStore,
}

impl Service {
    /// Key name in the merged configuration.
    pub fn config_key(self) -> &'static str {
        match self {
            Service::Embedding => "api_hugging",
            Service::VectorStore => "api_pinecone",
        }
    }

    /// Key name in the secrets file.
    pub fn secrets_key(self) -> &'static str {
        match self {
            Service::Embedding => "API_HUGGING",
            Service::VectorStore => "API_PINECONE",
        }
    }
}

/// API keys for the hosted services; only the requested ones are filled in.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    embedding_key: Option<String>,
    vector_store_key: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |k: &Option<String>| if k.is_some() { "<redacted>" } else { "<unset>" };
        f.debug_struct("Credentials")
            .field("embedding_key", &redact(&self.embedding_key))
            .field("vector_store_key", &redact(&self.vector_store_key))
            .finish()
    }
}

impl Credentials {
    pub fn new(embedding_key: impl Into<String>, vector_store_key: impl Into<String>) -> Self {
        Self { embedding_key: Some(embedding_key.into()), vector_store_key: Some(vector_store_key.into()) }
    }

    /// Both keys, each from the merged config or else the secrets file.
    pub fn resolve(config: &Config, settings: &Settings) -> Result<Self> {
        Self::resolve_for(config, settings, &[Service::Embedding, Service::VectorStore])
    }

    /// Only the keys of `services`. A key set in the merged config wins over
    /// the secrets file; each key falls back on its own.
    pub fn resolve_for(config: &Config, settings: &Settings, services: &[Service]) -> Result<Self> {
        let secrets = expand_path(&settings.secrets.file);
        let mut creds = Self::default();
        for &service in services {
            let key = match config.get::<String>(service.config_key()) {
                Ok(value) if !value.is_empty() => {
                    info!(key = service.config_key(), "credential loaded from primary configuration");
                    value
                }
                Ok(_) => {
                    warn!(key = service.config_key(), "empty credential in primary configuration, trying secrets file");
                    read_secret(&secrets, service)?
                }
                Err(e) => {
                    warn!(key = service.config_key(), error = %e, "credential not in primary configuration, trying secrets file");
                    read_secret(&secrets, service)?
                }
            };
            *creds.slot(service) = Some(key);
        }
        Ok(creds)
    }

    /// Read both `API_HUGGING` and `API_PINECONE` from a TOML secrets file.
    pub fn from_secrets_file(path: &Path) -> Result<Self> {
        let creds = Self {
            embedding_key: Some(read_secret(path, Service::Embedding)?),
            vector_store_key: Some(read_secret(path, Service::VectorStore)?),
        };
        info!(path = %path.display(), "credentials loaded from secrets file");
        Ok(creds)
    }

    /// The key for `service`, or `MissingCredential` when it was not resolved.
    pub fn key(&self, service: Service) -> Result<&str> {
        let key = match service {
            Service::Embedding => &self.embedding_key,
            Service::VectorStore => &self.vector_store_key,
        };
        key.as_deref()
            .ok_or_else(|| Error::MissingCredential(format!("{} is required", service.config_key())))
    }

    fn slot(&mut self, service: Service) -> &mut Option<String> {
        match service {
            Service::Embedding => &mut self.embedding_key,
            Service::VectorStore => &mut self.vector_store_key,
        }
    }
}

fn read_secret(path: &Path, service: Service) -> Result<String> {
    if !path.is_file() {
        return Err(Error::MissingCredential(format!(
            "{} not in configuration and no secrets file at {}",
            service.config_key(),
            path.display()
        )));
    }
    let key = service.secrets_key();
    let value: String = Figment::new()
        .merge(Toml::file(path))
        .extract_inner(key)
        .map_err(|_| Error::MissingCredential(format!("{key} not found in {}", path.display())))?;
    if value.is_empty() {
        return Err(Error::MissingCredential(format!("{key} is empty in {}", path.display())));
    }
    Ok(value)
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(toml: &str) -> Config {
        Config::from_figment(Figment::new().merge(Toml::string(toml)))
    }

    #[test]
    fn defaults_when_empty() {
        let s = config("").settings().expect("settings");
        assert_eq!(s.vector_store.index_name, "movies-embeddings");
        assert_eq!(s.embedding.dimension, Some(1024));
        assert!(s.embedding.wait_for_model);
        assert_eq!(s.http.max_retries, 2);
        assert_eq!(s.display.link_prefix, "https://www.imdb.com/");
    }

    #[test]
    fn nested_sections_override_defaults() {
        let s = config(
            r#"
            [vector_store]
            index_name = "films"
            host = "films-abc.svc.pinecone.io"

            [http]
            timeout_secs = 5
            "#,
        )
        .settings()
        .expect("settings");
        assert_eq!(s.vector_store.index_name, "films");
        assert_eq!(s.vector_store.host.as_deref(), Some("films-abc.svc.pinecone.io"));
        assert_eq!(s.http.timeout_secs, 5);
        assert_eq!(s.http.backoff_ms, 250);
    }

    #[test]
    fn invalid_settings_rejected() {
        assert!(config("[http]\ntimeout_secs = 0").settings().is_err());
        assert!(config("[embedding]\ndimension = 0").settings().is_err());
    }

    #[test]
    fn debug_redacts_keys() {
        let c = Credentials::new("hf_secret", "pc_secret");
        let printed = format!("{c:?}");
        assert!(!printed.contains("secret"));
    }

    #[test]
    fn unresolved_key_is_missing() {
        let c = Credentials::default();
        assert!(matches!(c.key(Service::Embedding), Err(Error::MissingCredential(_))));
        assert_eq!(Credentials::new("hf", "pc").key(Service::VectorStore).expect("set"), "pc");
    }
}
