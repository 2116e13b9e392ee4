use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub project_root: PathBuf,
    pub user_data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub documents_db_path: PathBuf,
    pub history_db_path: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        let project_root = discover_project_root();
        let user_data_dir = discover_user_data_dir(&project_root);
        let log_dir = user_data_dir.join("logs");
        let documents_db_path = user_data_dir.join("documents.db");
        let history_db_path = user_data_dir.join("qa_history.db");

        for dir in [&user_data_dir, &log_dir] {
            let _ = fs::create_dir_all(dir);
        }

        AppPaths {
            project_root,
            user_data_dir,
            log_dir,
            documents_db_path,
            history_db_path,
        }
    }

    pub fn config_path(&self) -> PathBuf {
        if let Ok(path) = env::var("DOCQA_CONFIG_PATH") {
            return PathBuf::from(path);
        }

        let user_config = self.user_data_dir.join("config.yml");
        if user_config.exists() {
            return user_config;
        }

        self.project_root.join("config.yml")
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn discover_project_root() -> PathBuf {
    if let Ok(root) = env::var("DOCQA_ROOT") {
        return PathBuf::from(root);
    }

    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    if manifest_dir.join("config.yml").exists() {
        return manifest_dir;
    }

    env::current_dir().unwrap_or(manifest_dir)
}

fn discover_user_data_dir(project_root: &Path) -> PathBuf {
    if let Ok(dir) = env::var("DOCQA_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if cfg!(debug_assertions) {
        return project_root.to_path_buf();
    }

    if cfg!(target_os = "windows") {
        let base = env::var("LOCALAPPDATA")
            .unwrap_or_else(|_| env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string()));
        return PathBuf::from(base).join("DocQa");
    }

    if cfg!(target_os = "macos") {
        return home_dir()
            .join("Library")
            .join("Application Support")
            .join("DocQa");
    }

    let xdg = env::var("XDG_DATA_HOME").unwrap_or_else(|_| {
        home_dir()
            .join(".local/share")
            .to_string_lossy()
            .to_string()
    });
    PathBuf::from(xdg).join("docqa")
}

fn home_dir() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Tunables for the retrieval pipeline. The similarity threshold and top-k
/// are decision-policy values, not implementation details, so they live here
/// rather than as literals in the gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub similarity_threshold: f32,
    pub top_k: usize,
    pub chunk_size: usize,
    pub max_embed_chars: usize,
    pub max_context_chars: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.3,
            top_k: 3,
            chunk_size: 500,
            max_embed_chars: 8000,
            max_context_chars: 4000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Base URL of an OpenAI-compatible endpoint, without the /v1 suffix.
    pub base_url: String,
    /// Name of the environment variable holding the API key, if the
    /// endpoint requires one.
    pub api_key_env: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub request_timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai".to_string(),
            api_key_env: "DOCQA_API_KEY".to_string(),
            chat_model: "llama-3.1-8b-instant".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            temperature: 0.2,
            max_tokens: 500,
            request_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub retrieval: RetrievalSettings,
    pub model: ModelSettings,
}

impl Settings {
    /// Load settings from the YAML config file, falling back to defaults
    /// when the file is missing or unparsable.
    pub fn load(paths: &AppPaths) -> Self {
        let path = paths.config_path();
        if !path.exists() {
            return Settings::default();
        }

        match fs::read_to_string(&path) {
            Ok(contents) => match serde_yaml::from_str::<Settings>(&contents) {
                Ok(settings) => settings,
                Err(err) => {
                    tracing::warn!("Failed to parse {}: {}; using defaults", path.display(), err);
                    Settings::default()
                }
            },
            Err(err) => {
                tracing::warn!("Failed to read {}: {}; using defaults", path.display(), err);
                Settings::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retrieval_defaults_match_documented_policy() {
        let settings = RetrievalSettings::default();
        assert_eq!(settings.similarity_threshold, 0.3);
        assert_eq!(settings.top_k, 3);
    }

    #[test]
    fn yaml_overrides_are_applied_over_defaults() {
        let yaml = "retrieval:\n  similarity_threshold: 0.5\n  top_k: 5\n";
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.retrieval.similarity_threshold, 0.5);
        assert_eq!(settings.retrieval.top_k, 5);
        // untouched sections keep their defaults
        assert_eq!(settings.retrieval.chunk_size, 500);
        assert_eq!(settings.model.temperature, 0.2);
    }
}
