use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::TheaError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u32(profile: &str, key: &str, default: u32) -> u32 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key) {
        Some(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub model: ModelConfig,
    pub embedding: EmbeddingConfig,
}

/// Well-known env keys that identify a profile when prefixed.
const PROFILE_MARKER_KEYS: &[&str] = &[
    "EMBEDDING_PROVIDER",
    "OLLAMA_URL",
    "OPENAI_API_KEY",
    "THEA_CACHE_DIR",
];

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `THEA_PROFILE` env var. When set (e.g. `DEMO`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("THEA_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            model: ModelConfig::from_env_profiled(p),
            embedding: EmbeddingConfig::from_env_profiled(p),
        }
    }

    /// Discover available profiles by scanning env vars for `{PREFIX}_{MARKER_KEY}` patterns.
    /// Always includes "default" (the unprefixed config).
    pub fn available_profiles() -> Vec<String> {
        let mut profiles = std::collections::BTreeSet::new();
        profiles.insert("default".to_string());

        for (key, _) in env::vars() {
            for marker in PROFILE_MARKER_KEYS {
                if let Some(prefix) = key.strip_suffix(&format!("_{}", marker)) {
                    if !prefix.is_empty()
                        && prefix.chars().all(|c| c.is_ascii_uppercase() || c == '_')
                    {
                        profiles.insert(prefix.to_string());
                    }
                }
            }
        }

        profiles.into_iter().collect()
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Reject settings no model can be loaded with.
    pub fn validate(&self) -> Result<(), TheaError> {
        if self.model.version.trim().is_empty() {
            return Err(TheaError::Config("THEA_MODEL_VERSION must not be empty".into()));
        }
        if self.embedding.dimensions == 0 {
            return Err(TheaError::Config("EMBEDDING_DIMENSIONS must be greater than 0".into()));
        }
        match self.embedding.provider.as_str() {
            "hashing" | "ollama" | "openai" => Ok(()),
            other => Err(TheaError::Config(format!(
                "unknown EMBEDDING_PROVIDER '{other}' (expected hashing, ollama or openai)"
            ))),
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  model:       version={}, cache_dir={}, debug={}",
            self.model.version,
            self.model.cache_dir.display(),
            self.model.debug
        );
        tracing::info!(
            "  embedding:   provider={}, model={}, dims={}",
            self.embedding.provider,
            self.embedding.model,
            self.embedding.dimensions
        );
    }

    /// Return a redacted view safe for display (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "model": {
                "version": self.model.version,
                "cache_dir": self.model.cache_dir,
                "touch_interval_secs": self.model.touch_interval_secs,
                "debug": self.model.debug,
            },
            "embedding": {
                "provider": self.embedding.provider,
                "model": self.embedding.model,
                "dimensions": self.embedding.dimensions,
                "ollama_url": self.embedding.ollama_url,
                "configured": self.embedding.is_configured(),
            },
        })
    }
}

// ── Model lifecycle ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Expected model version; cached models with another version are ignored.
    pub version: String,
    /// Directory holding the model manifest and cache metadata.
    pub cache_dir: PathBuf,
    /// Minimum seconds between `last_used` metadata refreshes.
    pub touch_interval_secs: u64,
    /// Wrap the embedder with per-batch debug instrumentation.
    pub debug: bool,
}

impl ModelConfig {
    fn from_env_profiled(p: &str) -> Self {
        let default_cache = dirs::cache_dir()
            .map(|d| d.join("thea"))
            .unwrap_or_else(|| PathBuf::from(".thea-cache"));
        Self {
            version: profiled_env_or(p, "THEA_MODEL_VERSION", "1"),
            cache_dir: profiled_env_opt(p, "THEA_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(default_cache),
            touch_interval_secs: profiled_env_u64(p, "THEA_METADATA_TOUCH_SECS", 300),
            debug: profiled_env_bool(p, "THEA_DEBUG", false),
        }
    }
}

// ── Embedding ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "hashing", "ollama", "openai"
    pub provider: String,
    pub dimensions: u32,
    pub model: String,
    pub ollama_url: String,
    #[serde(default, skip_serializing)]
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
}

impl EmbeddingConfig {
    fn from_env_profiled(p: &str) -> Self {
        let provider = profiled_env_or(p, "EMBEDDING_PROVIDER", "hashing");
        let default_model = match provider.as_str() {
            "ollama" => "all-minilm",
            "openai" => "text-embedding-3-small",
            _ => "fnv-tf",
        };
        Self {
            dimensions: profiled_env_u32(p, "EMBEDDING_DIMENSIONS", 384),
            model: profiled_env_or(p, "EMBEDDING_MODEL", default_model),
            ollama_url: profiled_env_or(p, "OLLAMA_URL", "http://localhost:11434"),
            openai_api_key: profiled_env_opt(p, "OPENAI_API_KEY"),
            openai_base_url: profiled_env_opt(p, "OPENAI_BASE_URL"),
            provider,
        }
    }

    pub fn is_configured(&self) -> bool {
        match self.provider.as_str() {
            "openai" => self.openai_api_key.is_some(),
            "ollama" | "hashing" => true,
            _ => false,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "hashing".to_string(),
            dimensions: 384,
            model: "fnv-tf".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            openai_api_key: None,
            openai_base_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_profile_falls_back_to_defaults() {
        let config = Config::for_profile("zz_thea_unit_test_missing");
        assert_eq!(config.profile, "ZZ_THEA_UNIT_TEST_MISSING");
        assert!(config.model.touch_interval_secs > 0);
        assert!(!config.embedding.provider.is_empty());
    }

    #[test]
    fn profile_label_defaults() {
        let mut config = Config::for_profile("");
        config.profile.clear();
        assert_eq!(config.profile_label(), "default");
    }

    #[test]
    fn redacted_summary_omits_api_key() {
        let mut config = Config::for_profile("");
        config.embedding.provider = "openai".to_string();
        config.embedding.openai_api_key = Some("sk-secret".to_string());
        let summary = config.redacted_summary().to_string();
        assert!(!summary.contains("sk-secret"));
        assert!(summary.contains("\"configured\":true"));
    }

    #[test]
    fn embedding_configured_per_provider() {
        let mut cfg = EmbeddingConfig::default();
        assert!(cfg.is_configured());
        cfg.provider = "openai".to_string();
        assert!(!cfg.is_configured());
        cfg.provider = "mystery".to_string();
        assert!(!cfg.is_configured());
    }

    #[test]
    fn validate_accepts_defaults() {
        let config = Config::for_profile("zz_thea_unit_test_missing");
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_unusable_settings() {
        let mut config = Config::for_profile("zz_thea_unit_test_missing");
        config.embedding.provider = "mystery".to_string();
        assert!(matches!(config.validate(), Err(TheaError::Config(msg)) if msg.contains("mystery")));

        let mut config = Config::for_profile("zz_thea_unit_test_missing");
        config.embedding.dimensions = 0;
        assert!(matches!(config.validate(), Err(TheaError::Config(_))));

        let mut config = Config::for_profile("zz_thea_unit_test_missing");
        config.model.version = "  ".to_string();
        assert!(matches!(config.validate(), Err(TheaError::Config(_))));
    }

    #[test]
    fn available_profiles_always_has_default() {
        assert!(Config::available_profiles().contains(&"default".to_string()));
    }
}
