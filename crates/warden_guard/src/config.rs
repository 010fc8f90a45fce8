//! Guard configuration and the shared, hot-reloadable handle.

use config::{Config, Environment, File, FileFormat};
use derive_getters::Getters;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};
use warden_error::ConfigError;
use warden_interface::{LogCategory, PunishmentType, Snowflake};

/// Bundled defaults, layered under every user config.
const DEFAULT_CONFIG: &str = include_str!("../../../warden.toml");

/// Configuration shared by every guard process.
#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
#[builder(setter(into), default)]
pub struct GuardConfig {
    /// The protected guild
    guild_id: Snowflake,

    /// Informational guild name
    #[serde(default)]
    guild_name: Option<String>,

    /// Framework accounts that are always authorized
    #[serde(default)]
    system_accounts: Vec<Snowflake>,

    /// Sanction settings
    #[serde(default)]
    punishment: PunishmentSettings,

    /// Notification channel names
    #[serde(default)]
    log_channels: LogChannels,

    /// Audit-trail correlation tuning
    #[serde(default)]
    correlation: CorrelationSettings,
}

impl GuardConfig {
    /// Load configuration: bundled defaults, then `path` (if given), then
    /// `WARDEN_*` environment overrides (`WARDEN_PUNISHMENT__TYPE=ban`).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a value has the wrong type.
    #[instrument(skip(path), fields(path = ?path.map(|p| p.display().to_string())))]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        debug!("Loading guard configuration");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }
        builder = builder.add_source(
            Environment::with_prefix("WARDEN")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("system_accounts"),
        );

        let located = |e: ConfigError| match path {
            Some(path) => e.with_path(path),
            None => e,
        };
        builder
            .build()
            .map_err(|e| located(ConfigError::new(format!("Failed to build configuration: {}", e))))?
            .try_deserialize()
            .map_err(|e| located(ConfigError::new(format!("Failed to parse configuration: {}", e))))
    }

    /// Parse a TOML document on its own, without defaults or environment.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))
    }

    /// Whether `subject` is one of the static system accounts.
    pub fn is_system_account(&self, subject: Snowflake) -> bool {
        self.system_accounts.contains(&subject)
    }
}

/// `[punishment]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct PunishmentSettings {
    /// Sanction applied to unauthorized executors
    #[serde(rename = "type", default)]
    kind: PunishmentType,
    /// Name of the quarantine role, created on first use
    #[serde(default = "default_quarantine_role_name")]
    quarantine_role_name: String,
    /// Length of a timeout sanction
    #[serde(default = "default_timeout_minutes")]
    timeout_minutes: u32,
}

fn default_quarantine_role_name() -> String {
    "Quarantine".to_string()
}

fn default_timeout_minutes() -> u32 {
    60
}

impl Default for PunishmentSettings {
    fn default() -> Self {
        Self {
            kind: PunishmentType::default(),
            quarantine_role_name: default_quarantine_role_name(),
            timeout_minutes: default_timeout_minutes(),
        }
    }
}

/// `[log_channels]` table: notification channel names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(default)]
pub struct LogChannels {
    /// Category holding every log channel
    category: String,
    /// Bans and anything uncategorised
    guard: String,
    /// Channel changes
    channel: String,
    /// Role changes
    role: String,
    /// Security, spam and bot additions
    security: String,
    /// Allow-list, punishment mode and quarantine administration
    moderation: String,
}

impl Default for LogChannels {
    fn default() -> Self {
        Self {
            category: "Warden Logs".to_string(),
            guard: "guard-logs".to_string(),
            channel: "channel-logs".to_string(),
            role: "role-logs".to_string(),
            security: "security-logs".to_string(),
            moderation: "mod-logs".to_string(),
        }
    }
}

impl LogChannels {
    /// Every log channel name, in creation order.
    pub fn names(&self) -> [&str; 5] {
        [
            &self.guard,
            &self.moderation,
            &self.security,
            &self.role,
            &self.channel,
        ]
    }

    /// Channel a record of `category` is sent to.
    pub fn channel_for(&self, category: LogCategory) -> &str {
        match category {
            LogCategory::Ban => &self.guard,
            LogCategory::Channel => &self.channel,
            LogCategory::Role => &self.role,
            LogCategory::Security | LogCategory::Spam | LogCategory::BotAdd => &self.security,
            LogCategory::Permission => &self.moderation,
            LogCategory::Backup => &self.guard,
        }
    }
}

/// `[correlation]` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(default)]
pub struct CorrelationSettings {
    /// Wait before reading the audit log
    settle_delay_ms: u64,
    /// Entries requested per audit-log query
    audit_limit: u8,
    /// How often the config file is re-read
    reload_interval_secs: u64,
}

impl Default for CorrelationSettings {
    fn default() -> Self {
        Self {
            settle_delay_ms: 1000,
            audit_limit: 1,
            reload_interval_secs: 30,
        }
    }
}

impl CorrelationSettings {
    /// Settling delay as a duration.
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Reload interval as a duration.
    pub fn reload_interval(&self) -> Duration {
        Duration::from_secs(self.reload_interval_secs.max(1))
    }
}

/// Shared handle to the live configuration.
///
/// Guards read the punishment type through the handle on every sanction, so
/// [`ConfigHandle::reload`] changes the mode without a restart.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    inner: Arc<RwLock<GuardConfig>>,
    path: Option<PathBuf>,
}

impl ConfigHandle {
    /// Wrap a loaded config. `path` is where reloads and writes go.
    pub fn new(config: GuardConfig, path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
            path,
        }
    }

    /// Load from `path` and wrap.
    pub fn load(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config = GuardConfig::load(path.as_deref())?;
        Ok(Self::new(config, path))
    }

    /// Copy of the current configuration.
    pub fn snapshot(&self) -> GuardConfig {
        self.inner.read().clone()
    }

    /// Read through the lock without cloning.
    pub fn read<R>(&self, f: impl FnOnce(&GuardConfig) -> R) -> R {
        f(&self.inner.read())
    }

    /// Current punishment type.
    pub fn punishment_type(&self) -> PunishmentType {
        self.inner.read().punishment.kind
    }

    /// Re-read the backing file. Returns whether anything changed.
    ///
    /// A handle without a path keeps its in-memory config.
    #[instrument(skip(self))]
    pub fn reload(&self) -> Result<bool, ConfigError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(false);
        };
        let fresh = GuardConfig::load(Some(path))?;
        let mut current = self.inner.write();
        if *current == fresh {
            return Ok(false);
        }
        if current.punishment.kind != fresh.punishment.kind {
            info!(
                from = %current.punishment.kind,
                to = %fresh.punishment.kind,
                "Punishment type changed on reload"
            );
        }
        *current = fresh;
        Ok(true)
    }

    /// Set the punishment type and write it back to the config file.
    ///
    /// Only `[punishment] type` is rewritten; the rest of the file is kept.
    #[instrument(skip(self), fields(kind = %kind))]
    pub fn persist_punishment_type(&self, kind: PunishmentType) -> Result<(), ConfigError> {
        self.inner.write().punishment.kind = kind;

        let Some(path) = self.path.as_deref() else {
            debug!("No config file, punishment type kept in memory only");
            return Ok(());
        };

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::new(format!("Failed to read: {}", e)).with_path(path))?;
        let mut document: toml::Table = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse: {}", e)).with_path(path))?;

        let section = document
            .entry("punishment")
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
        let toml::Value::Table(section) = section else {
            return Err(ConfigError::new("[punishment] is not a table").with_path(path));
        };
        section.insert("type".to_string(), toml::Value::String(kind.to_string()));

        let rendered = toml::to_string_pretty(&document)
            .map_err(|e| ConfigError::new(format!("Failed to render configuration: {}", e)))?;
        std::fs::write(path, rendered)
            .map_err(|e| ConfigError::new(format!("Failed to write: {}", e)).with_path(path))?;

        info!(path = %path.display(), "Punishment type persisted");
        Ok(())
    }
}
