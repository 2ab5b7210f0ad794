//! Agenda configuration system.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{AgendaError, Result};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgendaConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub service_account: ServiceAccount,
}

impl AgendaConfig {
    /// Load config from the default path (~/.agenda/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse config from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| AgendaError::Config(format!("Failed to parse config: {e}")))
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the Agenda home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".agenda")
    }

    /// Let the environment override secrets and upstream locations.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let targets: [(&str, &mut String); 5] = [
            ("AGENDA_SERVICE_EMAIL", &mut self.service_account.email),
            ("AGENDA_SERVICE_PASSWORD", &mut self.service_account.password),
            ("AGENDA_USERS_URL", &mut self.upstream.users_url),
            ("AGENDA_TASKS_URL", &mut self.upstream.tasks_url),
            ("AGENDA_NOTIFICATIONS_URL", &mut self.upstream.notifications_url),
        ];
        for (key, slot) in targets {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                tracing::debug!(key, "config value overridden from environment");
                *slot = value;
            }
        }
    }

    /// Check the settings the gateway and scheduler cannot run without.
    pub fn validate(&self) -> Result<()> {
        let urls = [
            ("upstream.users_url", &self.upstream.users_url),
            ("upstream.tasks_url", &self.upstream.tasks_url),
            ("upstream.notifications_url", &self.upstream.notifications_url),
        ];
        for (name, url) in urls {
            if url.trim().is_empty() {
                return Err(AgendaError::Config(format!("{name} must be set")));
            }
        }

        if self.scheduler.enabled {
            if self.service_account.email.trim().is_empty() || self.service_account.password.is_empty() {
                return Err(AgendaError::Config(
                    "service_account.email and service_account.password are required when the scheduler is enabled"
                        .into(),
                ));
            }
            if self.scheduler.lookahead_minutes <= 0 {
                return Err(AgendaError::Config("scheduler.lookahead_minutes must be positive".into()));
            }
            if self.scheduler.cron.trim().is_empty() {
                return Err(AgendaError::Config("scheduler.cron must be set".into()));
            }
        }
        Ok(())
    }

    /// Copy with secrets masked, for printing.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.service_account.password.is_empty() {
            copy.service_account.password = "***".into();
        }
        copy
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String { "0.0.0.0".into() }
fn default_port() -> u16 { 8083 }

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Base URLs of the upstream services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_users_url")]
    pub users_url: String,
    #[serde(default = "default_tasks_url")]
    pub tasks_url: String,
    #[serde(default = "default_notifications_url")]
    pub notifications_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_users_url() -> String { "http://localhost:8080".into() }
fn default_tasks_url() -> String { "http://localhost:8081/tarefas".into() }
fn default_notifications_url() -> String { "http://localhost:8082/email".into() }
fn default_request_timeout() -> u64 { 30 }

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            users_url: default_users_url(),
            tasks_url: default_tasks_url(),
            notifications_url: default_notifications_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Whether a task is marked notified when its email could not be dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkPolicy {
    /// Mark only after the notification service accepted the email.
    #[default]
    OnSuccess,
    /// Mark after every dispatch attempt, successful or not.
    Always,
}

/// Notification cycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    /// Cron expression, 5 fields or 6 with leading seconds.
    #[serde(default = "default_cron")]
    pub cron: String,
    #[serde(default = "default_lookahead")]
    pub lookahead_minutes: i64,
    #[serde(default)]
    pub mark_policy: MarkPolicy,
}

fn bool_true() -> bool { true }
fn default_cron() -> String { "0 */2 * * * *".into() }
fn default_lookahead() -> i64 { 60 }

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: bool_true(),
            cron: default_cron(),
            lookahead_minutes: default_lookahead(),
            mark_policy: MarkPolicy::default(),
        }
    }
}

/// Identity the scheduler logs in with.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ServiceAccount {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_from_empty_file() {
        let config = AgendaConfig::from_toml("").unwrap();
        assert_eq!(config.gateway.port, 8083);
        assert_eq!(config.scheduler.cron, "0 */2 * * * *");
        assert_eq!(config.scheduler.lookahead_minutes, 60);
        assert_eq!(config.scheduler.mark_policy, MarkPolicy::OnSuccess);
        assert!(config.scheduler.enabled);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[upstream]
tasks_url = "http://tasks.internal/tarefas"

[scheduler]
cron = "0 */5 * * * *"
mark_policy = "always"

[service_account]
email = "robot@example.com"
password = "s3cret"
"#,
        )
        .unwrap();

        let config = AgendaConfig::load_from(&path).unwrap();
        assert_eq!(config.upstream.tasks_url, "http://tasks.internal/tarefas");
        assert_eq!(config.upstream.users_url, "http://localhost:8080");
        assert_eq!(config.scheduler.mark_policy, MarkPolicy::Always);
        assert_eq!(config.service_account.email, "robot@example.com");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = AgendaConfig::load_from(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, AgendaError::Io(ref e) if e.kind() == std::io::ErrorKind::NotFound));
    }

    #[test]
    fn test_validate_requires_service_account_when_scheduler_enabled() {
        let mut config = AgendaConfig::default();
        assert!(matches!(config.validate(), Err(AgendaError::Config(_))));

        config.scheduler.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("AGENDA_SERVICE_EMAIL", "env@example.com"),
            ("AGENDA_SERVICE_PASSWORD", "from-env"),
            ("AGENDA_TASKS_URL", "  "),
        ]
        .into_iter()
        .collect();

        let mut config = AgendaConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.service_account.email, "env@example.com");
        assert_eq!(config.service_account.password, "from-env");
        // blank values are ignored
        assert_eq!(config.upstream.tasks_url, "http://localhost:8081/tarefas");
    }

    #[test]
    fn test_redacted_hides_password() {
        let mut config = AgendaConfig::default();
        config.service_account.password = "s3cret".into();
        let text = toml::to_string_pretty(&config.redacted()).unwrap();
        assert!(!text.contains("s3cret"));
        assert!(!format!("{:?}", config.service_account).contains("s3cret"));
    }
}
