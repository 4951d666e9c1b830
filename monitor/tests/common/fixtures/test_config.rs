//! Test configuration builder for creating test configs programmatically

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Builder for creating test configurations
pub struct TestConfigBuilder {
    temp_dir: TempDir,
    main_config: MainConfigBuilder,
    token: Option<String>,
}

impl TestConfigBuilder {
    /// Create a new test config builder
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Self {
            temp_dir,
            main_config: MainConfigBuilder::default(),
            token: None,
        }
    }

    /// Configure main settings
    pub fn with_main_config<F>(mut self, f: F) -> Self
    where
        F: FnOnce(MainConfigBuilder) -> MainConfigBuilder,
    {
        self.main_config = f(self.main_config);
        self
    }

    /// Write a token file next to the config and point `token_file` at it
    pub fn with_token_file(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// Build and write config files to temp directory
    pub fn build(mut self) -> TestConfig {
        let config_dir = self.temp_dir.path().join("config");
        fs::create_dir_all(&config_dir).expect("Failed to create config dir");

        let token_file = self.temp_dir.path().join("token");
        if let Some(token) = &self.token {
            fs::write(&token_file, token).expect("Failed to write token file");
            self.main_config.token_file = Some(token_file.display().to_string());
        }

        // Write main.toml
        let main_toml = self.main_config.to_toml();
        fs::write(config_dir.join("main.toml"), main_toml).expect("Failed to write main.toml");

        TestConfig {
            _temp_dir: self.temp_dir,
            config_dir,
            token_file,
        }
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Main configuration builder
#[derive(Clone)]
pub struct MainConfigBuilder {
    base_url: String,
    api_token: Option<String>,
    token_file: Option<String>,
    service_check_interval_seconds: u64,
    network_targets: Vec<String>,
    auto_reconnect: bool,
    max_attempts: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
    alert_webhook_url: Option<String>,
    port: u16,
}

impl MainConfigBuilder {
    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    pub fn api_token(mut self, token: &str) -> Self {
        self.api_token = Some(token.to_string());
        self
    }

    pub fn service_check_interval(mut self, seconds: u64) -> Self {
        self.service_check_interval_seconds = seconds;
        self
    }

    pub fn network_target(mut self, url: &str) -> Self {
        self.network_targets.push(url.to_string());
        self
    }

    pub fn auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    pub fn reconnection(
        mut self,
        max_attempts: u32,
        base_delay_ms: u64,
        max_delay_ms: u64,
    ) -> Self {
        self.max_attempts = max_attempts;
        self.base_delay_ms = base_delay_ms;
        self.max_delay_ms = max_delay_ms;
        self
    }

    pub fn alert_webhook(mut self, url: &str) -> Self {
        self.alert_webhook_url = Some(url.to_string());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    fn to_toml(&self) -> String {
        let webhook = self.alert_webhook_url.as_deref().unwrap_or("");
        let mut service = format!("base_url = \"{}\"\n", self.base_url);
        if let Some(token) = &self.api_token {
            service.push_str(&format!("api_token = \"{}\"\n", token));
        }
        if let Some(path) = &self.token_file {
            service.push_str(&format!("token_file = '{}'\n", path));
        }
        let targets = self
            .network_targets
            .iter()
            .map(|t| format!("\"{}\"", t))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            r#"
alarm_webhook_url = "{}"

[service]
{}
[monitoring]
auto_reconnect = {}
service_check_interval_seconds = {}
network_targets = [{}]

[reconnection]
max_attempts = {}
base_delay_ms = {}
max_delay_ms = {}
jitter = false

[web]
host = "127.0.0.1"
port = {}
"#,
            webhook,
            service,
            self.auto_reconnect,
            self.service_check_interval_seconds,
            targets,
            self.max_attempts,
            self.base_delay_ms,
            self.max_delay_ms,
            self.port
        )
    }
}

impl Default for MainConfigBuilder {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:9/rest/1.0".to_string(),
            api_token: None,
            token_file: None,
            service_check_interval_seconds: 30,
            network_targets: Vec::new(),
            auto_reconnect: true,
            max_attempts: 3,
            base_delay_ms: 1,
            max_delay_ms: 5,
            alert_webhook_url: None,
            port: 8095,
        }
    }
}

/// Built test configuration with temp directory
pub struct TestConfig {
    _temp_dir: TempDir,
    pub config_dir: PathBuf,
    pub token_file: PathBuf,
}

impl TestConfig {
    /// Get the config directory path
    pub fn config_dir(&self) -> &PathBuf {
        &self.config_dir
    }

    pub fn config_dir_string(&self) -> String {
        self.config_dir.display().to_string()
    }
}
