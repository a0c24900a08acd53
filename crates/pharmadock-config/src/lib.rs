//! Configuration loading for PharmaDock.
//! Reads pharmadock.toml from the current directory or the path in the
//! PHARMADOCK_CONFIG env var. Every section is optional; missing keys take
//! the defaults below.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_ENV: &str = "PHARMADOCK_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "pharmadock.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),
    #[error("Could not read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub docking: DockingConfig,
    #[serde(default)]
    pub ligand: LigandConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub landing: LandingConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

// ── Server ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Root that docking file/log paths are resolved against.
    #[serde(default = "default_file_root")]
    pub file_root: PathBuf,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    #[serde(default = "default_template_dir")]
    pub template_dir: PathBuf,
}

fn default_bind()         -> String  { "127.0.0.1:8000".to_string() }
fn default_file_root()    -> PathBuf { PathBuf::from(".") }
fn default_static_dir()   -> PathBuf { PathBuf::from("static") }
fn default_template_dir() -> PathBuf { PathBuf::from("templates") }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            file_root: default_file_root(),
            static_dir: default_static_dir(),
            template_dir: default_template_dir(),
        }
    }
}

// ── Chat ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// How long the HTTP handler waits for a turn's reply.
    #[serde(default = "default_reply_timeout")]
    pub reply_timeout_secs: u64,
    /// Idle time after which a conversation is dropped.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_extraction_timeout")]
    pub extraction_timeout_secs: u64,
}

fn default_reply_timeout()      -> u64 { 300 }
fn default_idle_timeout()       -> u64 { 300 }
fn default_extraction_timeout() -> u64 { 60 }

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            reply_timeout_secs: default_reply_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            extraction_timeout_secs: default_extraction_timeout(),
        }
    }
}

// ── LLM ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_backend")]
    pub default_backend: String,
    #[serde(default)]
    pub fallback_backend: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    pub ollama: Option<LlmProviderConfig>,
    pub openai: Option<LlmProviderConfig>,
    pub anthropic: Option<LlmProviderConfig>,
    pub openai_compatible: Option<LlmProviderConfig>,
}

fn default_llm_backend() -> String { "openai".to_string() }
fn default_temperature() -> f32    { 0.2 }

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            default_backend: default_llm_backend(),
            fallback_backend: None,
            temperature: default_temperature(),
            ollama: None,
            openai: None,
            anthropic: None,
            openai_compatible: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmProviderConfig {
    pub model: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub base_url: Option<String>,
}

// ── Docking ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DockingConfig {
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_docker_binary")]
    pub docker_binary: String,
    #[serde(default = "default_vina_image")]
    pub vina_image: String,
    #[serde(default = "default_rcsb_base_url")]
    pub rcsb_base_url: String,
}

fn default_input_dir()     -> PathBuf { PathBuf::from("data/input") }
fn default_output_dir()    -> PathBuf { PathBuf::from("out/docking_result") }
fn default_docker_binary() -> String  { "docker".to_string() }
fn default_vina_image()    -> String  { "cafernandezlo/dock-tools:v1.0".to_string() }
fn default_rcsb_base_url() -> String  { "https://files.rcsb.org/download".to_string() }

impl Default for DockingConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
            docker_binary: default_docker_binary(),
            vina_image: default_vina_image(),
            rcsb_base_url: default_rcsb_base_url(),
        }
    }
}

// ── Ligand preparation ────────────────────────────────────────────────────────

/// External SMILES → SDF converter. `{smiles}` and `{output}` in `args` are
/// substituted per molecule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LigandConfig {
    #[serde(default = "default_converter")]
    pub program: String,
    #[serde(default = "default_converter_args")]
    pub args: Vec<String>,
}

fn default_converter() -> String { "obabel".to_string() }
fn default_converter_args() -> Vec<String> {
    ["-:{smiles}", "-osdf", "--gen3d", "-h", "-O", "{output}"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for LigandConfig {
    fn default() -> Self {
        Self { program: default_converter(), args: default_converter_args() }
    }
}

// ── Catalogs ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_drug_db")]
    pub drug_db: PathBuf,
    #[serde(default = "default_genes_db")]
    pub genes_db: PathBuf,
}

fn default_drug_db()  -> PathBuf { PathBuf::from("data/databases/docking/drug_db.csv") }
fn default_genes_db() -> PathBuf { PathBuf::from("data/databases/docking/genes_db.csv") }

impl Default for CatalogConfig {
    fn default() -> Self {
        Self { drug_db: default_drug_db(), genes_db: default_genes_db() }
    }
}

// ── Landing page ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LandingConfig {
    /// The four strings typed out on the landing page.
    #[serde(default)]
    pub messages: Option<Vec<String>>,
}

// ── Terminal client ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
}

fn default_server_url()   -> String  { "http://127.0.0.1:8000".to_string() }
fn default_download_dir() -> PathBuf { PathBuf::from("downloads") }

impl Default for ClientConfig {
    fn default() -> Self {
        Self { server_url: default_server_url(), download_dir: default_download_dir() }
    }
}

#[cfg(test)]
mod tests;

impl Config {
    /// Load configuration from pharmadock.toml.
    /// Checks PHARMADOCK_CONFIG env var first, then the current directory.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_ENV)
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&path)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        match Self::load() {
            Err(ConfigError::NotFound(path)) => {
                tracing::warn!(%path, "config file not found, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(messages) = &self.landing.messages {
            if messages.len() != 4 {
                return Err(ConfigError::Invalid(format!(
                    "landing.messages must hold exactly 4 strings, got {}",
                    messages.len()
                )));
            }
        }
        if self.chat.reply_timeout_secs == 0 || self.chat.extraction_timeout_secs == 0 {
            return Err(ConfigError::Invalid("chat timeouts must be positive".to_string()));
        }
        Ok(())
    }
}
