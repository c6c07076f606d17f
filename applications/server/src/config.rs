/// Server configuration
use crate::error::{Result, ServerError};
use mirror_core::SyncConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MirrorConfig {
    #[serde(default = "default_server")]
    pub server: ServerSettings,

    pub remote: RemoteSettings,

    pub sync: SyncSettings,

    pub auth: AuthSettings,

    #[serde(default = "default_state")]
    pub state: StateSettings,

    pub publish: PublishSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteSettings {
    /// Share URL (or bare id) of the folder to mirror.
    pub folder_url: String,

    /// Bearer token for the remote store API.
    pub access_token: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncSettings {
    #[serde(default = "default_target")]
    pub target: String,

    pub project_id: String,

    #[serde(default = "default_memory_limit")]
    pub memory_limit: String,

    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthSettings {
    /// Shared secret required to trigger a sync over HTTP.
    pub sync_secret: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StateSettings {
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PublishSettings {
    /// Deploy argv; `{project}`, `{target}` and `{dir}` are substituted per
    /// run.
    pub command: Vec<String>,
}

impl MirrorConfig {
    /// Load configuration from file and environment
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut settings = config::Config::builder();

        // Load from config file if it exists
        let config_path = PathBuf::from(path.unwrap_or("config.toml"));
        if config_path.exists() {
            settings = settings.add_source(config::File::from(config_path));
        }

        // Override with environment variables (prefixed with MIRROR_)
        settings = settings.add_source(
            config::Environment::with_prefix("MIRROR")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.auth.sync_secret.is_empty() {
            return Err(ServerError::Config(
                "sync secret is required (set MIRROR_AUTH__SYNC_SECRET)".to_string(),
            ));
        }

        if self.remote.access_token.is_empty() {
            return Err(ServerError::Config(
                "remote access token is required (set MIRROR_REMOTE__ACCESS_TOKEN)".to_string(),
            ));
        }

        if self.publish.command.is_empty() {
            return Err(ServerError::Config(
                "publish command must not be empty".to_string(),
            ));
        }

        if mirror_core::parse_folder_id_from_url(&self.remote.folder_url).is_none() {
            return Err(ServerError::Config(format!(
                "cannot extract a folder id from {:?}",
                self.remote.folder_url
            )));
        }

        if mirror_core::parse_memory_to_bytes(&self.sync.memory_limit).is_none() {
            return Err(ServerError::Config(format!(
                "invalid memory limit {:?}",
                self.sync.memory_limit
            )));
        }

        Ok(())
    }

    /// The per-run configuration handed to the sync engine.
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            target: self.sync.target.clone(),
            project_id: self.sync.project_id.clone(),
            folder_url: self.remote.folder_url.clone(),
            memory_limit: self.sync.memory_limit.clone(),
            max_in_flight: self.sync.max_in_flight,
        }
    }
}

// Default values
fn default_server() -> ServerSettings {
    ServerSettings {
        host: default_host(),
        port: default_port(),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_base_url() -> String {
    mirror_remote::DEFAULT_BASE_URL.to_string()
}

fn default_target() -> String {
    "prod".to_string()
}

fn default_memory_limit() -> String {
    "1GiB".to_string()
}

fn default_max_in_flight() -> usize {
    16
}

fn default_state() -> StateSettings {
    StateSettings {
        database_url: default_database_url(),
    }
}

fn default_database_url() -> String {
    "sqlite://./data/mirror.db?mode=rwc".to_string()
}
