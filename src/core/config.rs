use crate::errors::{HarnessError, Result};
use crate::poller::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub browser: BrowserConfig,
    pub driver: DriverConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    pub headless: bool,
    pub viewport: Viewport,
    pub user_agent: Option<String>,
    pub disable_images: bool,
    pub args: Vec<String>,
    /// Attach to an already running Chrome on this DevTools port instead of launching one.
    pub connect_port: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    pub base_url: String,
    /// Reset the remote mock endpoint on init.
    pub mocked: bool,
    pub wait_timeout_ms: u64,
}

/// How to launch the backend under test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub command: String,
    pub args: Vec<String>,
    /// Working directory of the child; the service checkout.
    pub service_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub db_type: String,
    pub auth_type: String,
    pub auto_migrate: bool,
    pub remote_statics_path: String,
    pub local_statics_path: PathBuf,
    pub health_path: String,
    pub extra_env: HashMap<String, String>,
    pub retry: RetryPolicy,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport: Viewport::default(),
            user_agent: None,
            disable_images: false,
            args: vec![],
            connect_port: None,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            mocked: true,
            wait_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            command: "node".to_string(),
            args: vec![".".to_string()],
            service_dir: PathBuf::from("../service"),
            host: "localhost".to_string(),
            port: 3300,
            db_type: "sqlite".to_string(),
            auth_type: "fake".to_string(),
            auto_migrate: true,
            remote_statics_path: "http://localhost:3200/".to_string(),
            local_statics_path: PathBuf::from("src"),
            health_path: "/health/is_alive".to_string(),
            extra_env: HashMap::new(),
            retry: RetryPolicy::default(),
        }
    }
}

impl DriverConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn unmocked(mut self) -> Self {
        self.mocked = false;
        self
    }

    /// Base URL without a trailing slash, rejected if it does not parse.
    pub fn normalized_base_url(&self) -> Result<String> {
        normalize_base_url(&self.base_url)
    }
}

impl ServerConfig {
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn health_url(&self) -> String {
        format!("{}{}", self.base_url(), self.health_path)
    }

    /// Client source directory as the child should see it. Relative paths
    /// are taken from the harness's working directory, not `service_dir`.
    pub fn local_statics_dir(&self) -> PathBuf {
        if self.local_statics_path.is_absolute() {
            return self.local_statics_path.clone();
        }
        std::env::current_dir()
            .map(|cwd| cwd.join(&self.local_statics_path))
            .unwrap_or_else(|_| self.local_statics_path.clone())
    }

    /// Variables layered over the inherited environment of the child.
    pub fn env(&self) -> Vec<(String, String)> {
        let mut env = vec![
            ("DB_TYPE".to_string(), self.db_type.clone()),
            ("AUTH_TYPE".to_string(), self.auth_type.clone()),
            ("DB_AUTO_MIGRATE".to_string(), self.auto_migrate.to_string()),
            (
                "REMOTE_STATICS_PATH".to_string(),
                self.remote_statics_path.clone(),
            ),
            (
                "LOCAL_STATICS_PATH".to_string(),
                self.local_statics_dir().to_string_lossy().into_owned(),
            ),
            ("HTTP_PORT".to_string(), self.port.to_string()),
        ];
        let mut extra: Vec<_> = self
            .extra_env
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        extra.sort();
        env.extend(extra);
        env
    }
}

impl Config {
    /// Defaults overlaid with `E2E_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(base_url) = lookup("E2E_BASE_URL") {
            config.driver.base_url = normalize_base_url(&base_url)?;
        }
        if let Some(mocked) = lookup("E2E_MOCKED") {
            config.driver.mocked = parse_flag("E2E_MOCKED", &mocked)?;
        }
        if let Some(headless) = lookup("E2E_HEADLESS") {
            config.browser.headless = parse_flag("E2E_HEADLESS", &headless)?;
        }
        if let Some(port) = lookup("E2E_SERVER_PORT") {
            config.server.port = port.parse().map_err(|_| {
                HarnessError::Usage(format!("E2E_SERVER_PORT is not a port: {}", port))
            })?;
        }
        if let Some(dir) = lookup("E2E_SERVICE_DIR") {
            config.server.service_dir = PathBuf::from(dir);
        }

        Ok(config)
    }
}

pub(crate) fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim_end_matches('/');
    url::Url::parse(trimmed)
        .map_err(|e| HarnessError::Usage(format!("invalid base URL {:?}: {}", raw, e)))?;
    Ok(trimmed.to_string())
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(HarnessError::Usage(format!(
            "{} must be a boolean, got {:?}",
            name, value
        ))),
    }
}
