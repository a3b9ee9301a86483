// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Runtime Configuration Types
//
// Defines the configuration schema for a collaboration runtime, including:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Collaboration container and blob backend
// - Reactor state persistence
// - Output naming for agent responses
// - Chat completion provider
// - Router readiness policy

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::journal::OutputNameTemplate;
use crate::domain::llm::ChatOptions;

pub const API_VERSION: &str = "collabpage/v1";
pub const KIND: &str = "RuntimeConfig";

/// Top-level Kubernetes-style runtime configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfigManifest {
    /// API version (must be "collabpage/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "RuntimeConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: RuntimeConfigSpec,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfigSpec {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub state: StateConfig,

    #[serde(default)]
    pub agents: AgentsConfig,

    /// Chat completion provider; agents and the oracle are unavailable without it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm: Option<LlmConfig>,

    #[serde(default)]
    pub router: RouterConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Base directory for the local backend
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,

    /// Collaboration container name
    #[serde(default = "default_container")]
    pub container: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateBackend {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    #[serde(default)]
    pub backend: StateBackend,

    #[serde(default = "default_state_dir")]
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentsConfig {
    /// Output file name template
    #[serde(default)]
    pub response_format: OutputNameTemplate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LlmProviderType {
    #[serde(rename = "openai")]
    OpenAI,
    #[serde(rename = "azure-openai")]
    AzureOpenAI,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "type")]
    pub provider_type: LlmProviderType,

    pub endpoint: String,

    /// API key or `env:VAR_NAME`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model name (OpenAI) or deployment name (Azure)
    pub model: String,

    #[serde(default)]
    pub options: ChatOptions,
}

impl LlmConfig {
    /// Resolve the API key, reading `env:VAR` references from the environment.
    pub fn resolve_api_key(&self) -> anyhow::Result<Option<String>> {
        match self.api_key.as_deref() {
            None => Ok(None),
            Some(key) => match key.strip_prefix("env:") {
                Some(var) => std::env::var(var)
                    .map(Some)
                    .map_err(|_| anyhow::anyhow!("API key environment variable {} is not set", var)),
                None => Ok(Some(key.to_string())),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(default = "default_readiness_attempts")]
    pub readiness_attempts: u32,

    #[serde(default = "default_readiness_interval_ms")]
    pub readiness_interval_ms: u64,

    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,
}

/// Bounded readiness wait applied by the router before its first dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            attempts: default_readiness_attempts(),
            interval: Duration::from_millis(default_readiness_interval_ms()),
        }
    }
}

impl RouterConfig {
    pub fn readiness_policy(&self) -> ReadinessPolicy {
        ReadinessPolicy {
            attempts: self.readiness_attempts,
            interval: Duration::from_millis(self.readiness_interval_ms),
        }
    }
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./collab-data/blobs")
}

fn default_container() -> String {
    "collabpage".to_string()
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("./collab-data/state")
}

fn default_readiness_attempts() -> u32 {
    10
}

fn default_readiness_interval_ms() -> u64 {
    1000
}

fn default_bus_capacity() -> usize {
    1024
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_storage_path(),
            container: default_container(),
        }
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            backend: StateBackend::default(),
            dir: default_state_dir(),
        }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            readiness_attempts: default_readiness_attempts(),
            readiness_interval_ms: default_readiness_interval_ms(),
            bus_capacity: default_bus_capacity(),
        }
    }
}

impl Default for RuntimeConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: hostname::get()
                    .ok()
                    .and_then(|h| h.into_string().ok())
                    .unwrap_or_else(|| "collab-runtime".to_string()),
                labels: None,
            },
            spec: RuntimeConfigSpec::default(),
        }
    }
}

impl RuntimeConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. COLLAB_CONFIG_PATH environment variable
    /// 2. ./collab-config.yaml (working directory)
    /// 3. ~/.collab/config.yaml (user home)
    /// 4. /etc/collab/config.yaml (system, Unix)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("COLLAB_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./collab-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".collab").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        let system_config = PathBuf::from("/etc/collab/config.yaml");
        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::info!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("OA_STORAGE_COLLABPAGECONTAINER") {
            tracing::info!("Environment override: OA_STORAGE_COLLABPAGECONTAINER={}", val);
            self.spec.storage.container = val;
        }

        if let Some(val) = lookup("OA_AGENT_RESPONSEFORMAT") {
            tracing::info!("Environment override: OA_AGENT_RESPONSEFORMAT={}", val);
            self.spec.agents.response_format = OutputNameTemplate::new(val);
        }

        let endpoint = lookup("OA_AOAI_ENDPOINT");
        let api_key = lookup("OA_AOAI_APIKEY");
        let deployment = lookup("OA_CHATCOMPLETION_DEPLOYMENTNAME");
        if endpoint.is_none() && api_key.is_none() && deployment.is_none() {
            return;
        }

        let llm = self.spec.llm.get_or_insert_with(|| LlmConfig {
            provider_type: LlmProviderType::AzureOpenAI,
            endpoint: String::new(),
            api_key: None,
            model: String::new(),
            options: ChatOptions::default(),
        });
        if let Some(val) = endpoint {
            tracing::info!("Environment override: OA_AOAI_ENDPOINT={}", val);
            llm.endpoint = val;
        }
        if let Some(val) = api_key {
            // Never log the key itself
            tracing::info!("Environment override: OA_AOAI_APIKEY=<redacted>");
            llm.api_key = Some(val);
        }
        if let Some(val) = deployment {
            tracing::info!("Environment override: OA_CHATCOMPLETION_DEPLOYMENTNAME={}", val);
            llm.model = val;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let container = &self.spec.storage.container;
        if container.is_empty() {
            anyhow::bail!("spec.storage.container cannot be empty");
        }
        if container.contains('/') {
            anyhow::bail!("spec.storage.container must not contain '/': {}", container);
        }

        let template = &self.spec.agents.response_format;
        if !template.has_unique_component() {
            anyhow::bail!(
                "spec.agents.response_format '{}' must contain {{@InputFileName}} or {{@GUID}}",
                template
            );
        }
        if template.as_str().contains('/') {
            anyhow::bail!("spec.agents.response_format must not contain '/'");
        }

        if self.spec.router.readiness_attempts == 0 {
            anyhow::bail!("spec.router.readiness_attempts must be at least 1");
        }

        if self.spec.router.bus_capacity == 0 {
            anyhow::bail!("spec.router.bus_capacity must be at least 1");
        }

        if let Some(llm) = &self.spec.llm {
            if llm.endpoint.is_empty() {
                anyhow::bail!("spec.llm.endpoint cannot be empty");
            }
            if llm.model.is_empty() {
                anyhow::bail!("spec.llm.model cannot be empty");
            }
        }

        Ok(())
    }
}

pub type RuntimeConfig = RuntimeConfigManifest;
