use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::UserFitnessProfile;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// General application settings
    pub settings: AppSettings,

    /// Recommendation engine tuning
    pub engine: EngineSettings,

    /// Users known to this installation
    pub users: HashMap<String, UserConfig>,

    /// Default user ID (currently active)
    pub default_user_id: Option<String>,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Data directory path
    pub data_dir: PathBuf,
}

/// Recommendation engine tuning knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Weight of the problem-alignment scoring factor
    pub problem_weight: f64,

    /// Weight of the favorite-exercise bonus
    pub preference_weight: f64,

    /// Session length used when a profile has no schedule, in minutes
    pub default_session_minutes: u32,
}

/// Per-user configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    /// Unique user identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Goals, problems, and constraints
    pub profile: UserFitnessProfile,

    /// Creation date
    pub created_at: DateTime<Utc>,

    /// Last updated date
    pub last_updated: DateTime<Utc>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            settings: AppSettings::default(),
            engine: EngineSettings::default(),
            users: HashMap::new(),
            default_user_id: None,
        }
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            data_dir: PathBuf::from("./data"),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            problem_weight: crate::scoring::DEFAULT_PROBLEM_WEIGHT,
            preference_weight: crate::scoring::DEFAULT_PREFERENCE_WEIGHT,
            default_session_minutes: crate::engine::DEFAULT_SESSION_MINUTES,
        }
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".coachrs")
            .join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(_) => {
                eprintln!(
                    "Config file not found, using defaults: {}",
                    config_path.display()
                );
                Self::default()
            }
        }
    }

    /// Save configuration to default location
    pub fn save_default(&mut self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to_file(config_path)
    }

    /// Add a new user to the configuration
    pub fn add_user(&mut self, user: UserConfig) -> Result<()> {
        let user_id = user.id.clone();

        // First user becomes the default
        if self.users.is_empty() {
            self.default_user_id = Some(user_id.clone());
        }

        self.users.insert(user_id, user);
        self.metadata.updated_at = Utc::now();

        Ok(())
    }

    /// Remove a user from the configuration
    pub fn remove_user(&mut self, user_id: &str) -> Result<()> {
        if !self.users.contains_key(user_id) {
            return Err(anyhow::anyhow!("User not found: {}", user_id));
        }

        self.users.remove(user_id);

        if self.default_user_id.as_deref() == Some(user_id) {
            self.default_user_id = self.users.keys().next().cloned();
        }

        self.metadata.updated_at = Utc::now();
        Ok(())
    }

    /// Get user configuration by ID
    pub fn get_user(&self, user_id: &str) -> Option<&UserConfig> {
        self.users.get(user_id)
    }

    /// Get mutable user configuration by ID
    pub fn get_user_mut(&mut self, user_id: &str) -> Option<&mut UserConfig> {
        self.users.get_mut(user_id)
    }

    /// Get the default (currently active) user
    pub fn get_default_user(&self) -> Option<&UserConfig> {
        self.default_user_id
            .as_ref()
            .and_then(|id| self.users.get(id))
    }

    /// Set the default user
    pub fn set_default_user(&mut self, user_id: &str) -> Result<()> {
        if !self.users.contains_key(user_id) {
            return Err(anyhow::anyhow!("User not found: {}", user_id));
        }

        self.default_user_id = Some(user_id.to_string());
        self.metadata.updated_at = Utc::now();
        Ok(())
    }

    /// List all users
    pub fn list_users(&self) -> Vec<&UserConfig> {
        self.users.values().collect()
    }
}

impl UserConfig {
    /// Create a new user configuration
    pub fn new(name: String, user_id: Option<String>) -> Self {
        let id = user_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let now = Utc::now();

        UserConfig {
            id,
            name,
            profile: UserFitnessProfile::default(),
            created_at: now,
            last_updated: now,
        }
    }

    /// Replace the fitness profile
    pub fn set_profile(&mut self, profile: UserFitnessProfile) {
        self.profile = profile;
        self.last_updated = Utc::now();
    }
}
