use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

// ── Storage backend ───────────────────────────────────────────────────────────

/// Where vendor records live.
///
/// | Backend  | Behaviour                                                   |
/// |----------|-------------------------------------------------------------|
/// | `remote` | JSON-over-HTTP vendor API at `api.base_url`.                |
/// | `local`  | In-process registry persisted to `storage.data_path`.       |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Remote,
    Local,
}

impl StorageBackend {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "remote" | "api" | "http" => Ok(Self::Remote),
            "local" | "file" => Ok(Self::Local),
            other => bail!("unknown storage backend: {other} (expected remote or local)"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the vendor API, without the `/api` suffix.
    /// Overridden at runtime by `VENDOR_API_URL` when set.
    pub base_url: String,
    /// Per-request timeout.  A timed out request surfaces as a transport
    /// error; the wizard never retries on its own.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Snapshot file used by the local backend.
    pub data_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Remote,
            data_path: ".vendors/vendors.jsonl".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OnboardingConfig {
    /// Pre-filled into the country field of a fresh draft.  Empty leaves it blank.
    pub default_country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub telemetry: TelemetryConfig,
    pub onboarding: OnboardingConfig,
}

impl AppConfig {
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = fs::read_to_string(path) {
            config = toml::from_str(&raw)?;
        }

        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    /// Apply `VENDOR_API_URL` and `VENDOR_DATA_PATH` from `lookup`.
    /// An API URL forces the remote backend.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup("VENDOR_API_URL").filter(|v| !v.is_empty()) {
            self.api.base_url = value;
            self.storage.backend = StorageBackend::Remote;
        }

        if let Some(value) = lookup("VENDOR_DATA_PATH").filter(|v| !v.is_empty()) {
            self.storage.data_path = value;
        }
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let rendered = toml::to_string_pretty(self)?;
        fs::write(path, rendered)?;
        Ok(())
    }

    pub fn uses_local_storage(&self) -> bool {
        self.storage.backend == StorageBackend::Local
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
