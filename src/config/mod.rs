use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::api::client::ClientConfig;
use crate::api::http_client::DEFAULT_TIMEOUT_SECS;
use crate::api::ApiType;
use crate::error::{Result, TourError};

const CONFIG_DIR_NAME: &str = ".tourlens";
const CONFIG_FILE_NAME: &str = "config.yaml";
const DEFAULT_TREND_DIR: &str = "naver_trend";

/// Overrides the directory holding `config.yaml`
pub const HOME_ENV: &str = "TOURLENS_HOME";

/// Every key accepted by `config set` / `config get`
pub const KEYS: &[&str] = &[
    "tour.key",
    "seoul.key",
    "serp.key",
    "naver.blog.client_id",
    "naver.blog.client_secret",
    "naver.trend.client_id",
    "naver.trend.client_secret",
    "output.export_dir",
    "output.trend_dir",
    "http.timeout",
];

/// Environment variables that take precedence over the file
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("TOUR_API_KEY", "tour.key"),
    ("SEOUL_TOUR_API_KEY", "seoul.key"),
    ("SERPAPI_API_KEY", "serp.key"),
    ("NAVER_CLIENT_ID", "naver.blog.client_id"),
    ("NAVER_CLIENT_SECRET", "naver.blog.client_secret"),
    ("NAVER_TREND_CLIENT_ID", "naver.trend.client_id"),
    ("NAVER_TREND_CLIENT_SECRET", "naver.trend.client_secret"),
];

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub tour: ApiConfig,
    #[serde(default)]
    pub seoul: ApiConfig,
    #[serde(default)]
    pub serp: ApiConfig,
    #[serde(default)]
    pub naver: NaverConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ApiConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// Blog search and datalab are registered as separate Naver applications
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct NaverConfig {
    #[serde(default)]
    pub blog: NaverApp,
    #[serde(default)]
    pub trend: NaverApp,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct NaverApp {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct OutputConfig {
    /// Export CSV directory; the system temp directory when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<PathBuf>,
    /// Trend analysis directory; `./naver_trend` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl Config {
    /// Get the configuration directory
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(dir) = std::env::var(HOME_ENV) {
            if !dir.trim().is_empty() {
                return Ok(PathBuf::from(dir));
            }
        }

        let home_dir = dirs::home_dir()
            .ok_or_else(|| TourError::Config("Could not determine home directory".to_string()))?;

        Ok(home_dir.join(CONFIG_DIR_NAME))
    }

    /// Get the configuration file full path
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_path()?.join(CONFIG_FILE_NAME))
    }

    /// Initialize configuration directory and file
    pub fn initialize() -> Result<()> {
        let config_dir = Self::config_path()?;

        // Create config directory with restricted permissions
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .map_err(|e| TourError::Config(format!("Failed to create config directory: {}", e)))?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let permissions = fs::Permissions::from_mode(0o700);
                fs::set_permissions(&config_dir, permissions)
                    .map_err(|e| TourError::Config(format!("Failed to set directory permissions: {}", e)))?;
            }
        }

        let config_file = Self::config_file_path()?;
        if !config_file.exists() {
            Self::default().write_file()?;
        }

        Ok(())
    }

    /// Load the file configuration, then apply `.env` and environment
    /// overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;

        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }
        config.apply_env(|name| std::env::var(name).ok());

        Ok(config)
    }

    /// Load the file configuration only
    pub fn load_file() -> Result<Self> {
        Self::initialize()?;

        let config_file = Self::config_file_path()?;
        let contents = fs::read_to_string(&config_file)
            .map_err(|e| TourError::Config(format!("Failed to read config file: {}", e)))?;

        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&contents)
            .map_err(|e| TourError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Apply environment overrides; blank values are ignored
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for (var, key) in ENV_OVERRIDES {
            if let Some(value) = lookup(var).filter(|v| !v.trim().is_empty()) {
                debug!("{} overridden by {}", key, var);
                // Every override target is a string key, so this cannot fail
                let _ = self.assign(key, &value);
            }
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        Self::initialize()?;
        self.write_file()
    }

    fn write_file(&self) -> Result<()> {
        let config_file = Self::config_file_path()?;
        let yaml = serde_yaml::to_string(self)
            .map_err(|e| TourError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_file, yaml)
            .map_err(|e| TourError::Config(format!("Failed to write config file: {}", e)))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&config_file, permissions)
                .map_err(|e| TourError::Config(format!("Failed to set file permissions: {}", e)))?;
        }

        Ok(())
    }

    /// Set a configuration value by key path and save
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.assign(key, value)?;
        self.save()
    }

    fn assign(&mut self, key: &str, value: &str) -> Result<()> {
        let text = Some(value.to_string());
        match key {
            "tour.key" => self.tour.key = text,
            "seoul.key" => self.seoul.key = text,
            "serp.key" => self.serp.key = text,
            "naver.blog.client_id" => self.naver.blog.client_id = text,
            "naver.blog.client_secret" => self.naver.blog.client_secret = text,
            "naver.trend.client_id" => self.naver.trend.client_id = text,
            "naver.trend.client_secret" => self.naver.trend.client_secret = text,
            "output.export_dir" => self.output.export_dir = Some(PathBuf::from(value)),
            "output.trend_dir" => self.output.trend_dir = Some(PathBuf::from(value)),
            "http.timeout" => {
                let secs = value
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| TourError::Config(format!("http.timeout must be a number of seconds, got '{}'", value)))?;
                self.http.timeout = Some(secs);
            }
            _ => {
                return Err(TourError::Config(format!("Unknown configuration key: {}", key)));
            }
        }
        Ok(())
    }

    /// Get a configuration value by key path
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "tour.key" => self.tour.key.clone(),
            "seoul.key" => self.seoul.key.clone(),
            "serp.key" => self.serp.key.clone(),
            "naver.blog.client_id" => self.naver.blog.client_id.clone(),
            "naver.blog.client_secret" => self.naver.blog.client_secret.clone(),
            "naver.trend.client_id" => self.naver.trend.client_id.clone(),
            "naver.trend.client_secret" => self.naver.trend.client_secret.clone(),
            "output.export_dir" => self.output.export_dir.as_ref().map(|p| p.display().to_string()),
            "output.trend_dir" => self.output.trend_dir.as_ref().map(|p| p.display().to_string()),
            "http.timeout" => self.http.timeout.map(|t| t.to_string()),
            _ => None,
        }
    }

    /// Whether a key holds a credential and should be masked when shown
    pub fn is_secret(key: &str) -> bool {
        key.ends_with(".key") || key.ends_with("client_id") || key.ends_with("client_secret")
    }

    /// Client configuration for one upstream API
    pub fn client_config(&self, api: ApiType) -> ClientConfig {
        let (key, secret) = match api {
            ApiType::Tour => (self.tour.key.clone(), None),
            ApiType::Seoul => (self.seoul.key.clone(), None),
            ApiType::Serp => (self.serp.key.clone(), None),
            ApiType::NaverBlog => (self.naver.blog.client_id.clone(), self.naver.blog.client_secret.clone()),
            ApiType::NaverTrend => (self.naver.trend.client_id.clone(), self.naver.trend.client_secret.clone()),
        };

        ClientConfig {
            api_key: key.unwrap_or_default(),
            api_secret: secret,
            timeout: self.timeout(),
            ..Default::default()
        }
    }

    pub fn timeout(&self) -> u64 {
        self.http.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    pub fn export_dir(&self) -> PathBuf {
        self.output.export_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    pub fn trend_dir(&self) -> PathBuf {
        self.output
            .trend_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TREND_DIR))
    }
}

/// Mask sensitive values for display
pub fn mask_value(value: &str) -> String {
    let count = value.chars().count();
    if count > 10 {
        let prefix: String = value.chars().take(10).collect();
        format!("{}...({} characters)", prefix, count)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;
    use std::collections::HashMap;

    #[test]
    fn test_set_and_get_every_key() {
        let mut config = Config::default();
        for key in KEYS {
            let value = if *key == "http.timeout" { "15" } else { "value" };
            config.assign(key, value).unwrap();
            assert_eq!(config.get(key).as_deref(), Some(value), "{}", key);
        }
        assert!(config.assign("weather.key", "x").is_err());
        assert!(config.assign("http.timeout", "soon").is_err());
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = Config::default();
        config.tour.key = Some("from-file".into());
        config.serp.key = Some("serp-file".into());

        let env: HashMap<&str, &str> = [
            ("TOUR_API_KEY", "from-env"),
            ("SERPAPI_API_KEY", "  "),
            ("NAVER_TREND_CLIENT_SECRET", "trend-secret"),
        ]
        .into_iter()
        .collect();
        config.apply_env(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.tour.key.as_deref(), Some("from-env"));
        assert_eq!(config.serp.key.as_deref(), Some("serp-file"));
        assert_eq!(config.naver.trend.client_secret.as_deref(), Some("trend-secret"));
    }

    #[test]
    fn test_client_config_for_naver_carries_secret() {
        let mut config = Config::default();
        config.naver.blog.client_id = Some("id".into());
        config.naver.blog.client_secret = Some("secret".into());
        config.http.timeout = Some(5);

        let client = config.client_config(ApiType::NaverBlog);
        assert_eq!(client.api_key, "id");
        assert_eq!(client.api_secret.as_deref(), Some("secret"));
        assert_eq!(client.timeout, 5);
        assert!(!config.client_config(ApiType::Tour).is_configured());
    }

    #[test]
    fn test_default_directories() {
        let config = Config::default();
        assert_eq!(config.export_dir(), std::env::temp_dir());
        assert_eq!(config.trend_dir(), PathBuf::from("naver_trend"));
    }

    #[test]
    fn test_mask_value() {
        assert_eq!(mask_value("short"), "short");
        assert_eq!(mask_value("abcdefghijklmnop"), "abcdefghij...(16 characters)");
        assert_eq!(mask_value("가나다라마바사아자차카"), "가나다라마바사아자차...(11 characters)");
    }

    #[test]
    #[serial]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var(HOME_ENV, dir.path());

        let mut config = Config::load_file().unwrap();
        assert_eq!(config, Config::default());
        config.set("tour.key", "abc").unwrap();
        config.set("output.trend_dir", "/tmp/trend").unwrap();

        let loaded = Config::load_file().unwrap();
        assert_eq!(loaded.tour.key.as_deref(), Some("abc"));
        assert_eq!(loaded.trend_dir(), PathBuf::from("/tmp/trend"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(Config::config_file_path().unwrap()).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        std::env::remove_var(HOME_ENV);
    }
}
