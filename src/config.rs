//! Application configuration module
//! Handles environment variable loading, configuration validation, and application settings

use std::env;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub payment: PaymentGatewayConfig,
    pub control_plane: ControlPlaneConfig,
    pub notifier: NotifierConfig,
    pub watcher: WatcherConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log format options
#[derive(Debug, Clone)]
pub enum LogFormat {
    Json,
    Plain,
}

/// Payment gateway (QRIS deposit/status API) configuration
#[derive(Debug, Clone)]
pub struct PaymentGatewayConfig {
    pub base_url: String,
    pub api_key: String,
    pub request_timeout: u64, // seconds
}

/// Control plane (Pterodactyl application API) configuration
#[derive(Debug, Clone)]
pub struct ControlPlaneConfig {
    pub base_url: String,
    pub application_key: String,
    pub client_key: String,
    pub email_domain: String,
    pub request_timeout: u64, // seconds
}

/// Telegram operations-channel configuration
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    pub bot_token: Option<String>,
    pub chat_id: String,
    pub queue_capacity: usize,
    pub request_timeout: u64, // seconds
}

/// Payment status watcher configuration
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    pub poll_interval: u64, // seconds
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        let _ = dotenv::dotenv().ok();

        Ok(AppConfig {
            server: ServerConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
            payment: PaymentGatewayConfig::from_env()?,
            control_plane: ControlPlaneConfig::from_env()?,
            notifier: NotifierConfig::from_env()?,
            watcher: WatcherConfig::from_env()?,
        })
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.logging.validate()?;
        self.payment.validate()?;
        self.control_plane.validate()?;
        self.notifier.validate()?;
        self.watcher.validate()?;

        Ok(())
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(ServerConfig {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".to_string()))?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue(
                "SERVER_PORT cannot be 0".to_string(),
            ));
        }

        if self.host.is_empty() {
            return Err(ConfigError::InvalidValue(
                "SERVER_HOST cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl LoggingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "INFO".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "plain".to_string())
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Plain,
            },
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["TRACE", "DEBUG", "INFO", "WARN", "ERROR"];
        if !valid_levels.contains(&self.level.to_uppercase().as_str()) {
            return Err(ConfigError::InvalidValue("LOG_LEVEL".to_string()));
        }

        Ok(())
    }
}

impl PaymentGatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(PaymentGatewayConfig {
            base_url: env::var("PAYMENT_API_URL")
                .unwrap_or_else(|_| "https://api.example.com".to_string()),
            api_key: env::var("PAYMENT_API_KEY")
                .map_err(|_| ConfigError::MissingVariable("PAYMENT_API_KEY".to_string()))?,
            request_timeout: env::var("PAYMENT_REQUEST_TIMEOUT")
                .unwrap_or_else(|_| "15".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PAYMENT_REQUEST_TIMEOUT".to_string()))?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.is_empty() {
            return Err(ConfigError::InvalidValue("PAYMENT_API_KEY".to_string()));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "PAYMENT_API_URL must be a valid URL".to_string(),
            ));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::InvalidValue(
                "PAYMENT_REQUEST_TIMEOUT".to_string(),
            ));
        }

        Ok(())
    }
}

impl ControlPlaneConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(ControlPlaneConfig {
            base_url: env::var("PTERODACTYL_DOMAIN")
                .unwrap_or_else(|_| "https://depstore11-private.shanydev.web.id".to_string()),
            application_key: env::var("PTERODACTYL_PTLA")
                .map_err(|_| ConfigError::MissingVariable("PTERODACTYL_PTLA".to_string()))?,
            client_key: env::var("PTERODACTYL_PLTC")
                .map_err(|_| ConfigError::MissingVariable("PTERODACTYL_PLTC".to_string()))?,
            email_domain: env::var("PANEL_EMAIL_DOMAIN")
                .unwrap_or_else(|_| "depstore11.local".to_string()),
            request_timeout: env::var("PTERODACTYL_REQUEST_TIMEOUT")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| {
                    ConfigError::InvalidValue("PTERODACTYL_REQUEST_TIMEOUT".to_string())
                })?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.application_key.is_empty() {
            return Err(ConfigError::InvalidValue("PTERODACTYL_PTLA".to_string()));
        }

        if self.client_key.is_empty() {
            return Err(ConfigError::InvalidValue("PTERODACTYL_PLTC".to_string()));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "PTERODACTYL_DOMAIN must be a valid URL".to_string(),
            ));
        }

        if self.email_domain.is_empty() || self.email_domain.contains('@') {
            return Err(ConfigError::InvalidValue("PANEL_EMAIL_DOMAIN".to_string()));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::InvalidValue(
                "PTERODACTYL_REQUEST_TIMEOUT".to_string(),
            ));
        }

        Ok(())
    }
}

impl NotifierConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(NotifierConfig {
            bot_token: env::var("TELEGRAM_BOT_TOKEN")
                .ok()
                .filter(|token| !token.is_empty()),
            chat_id: env::var("TELEGRAM_CHAT_ID").unwrap_or_else(|_| "8412273544".to_string()),
            queue_capacity: env::var("NOTIFIER_QUEUE_CAPACITY")
                .unwrap_or_else(|_| "64".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("NOTIFIER_QUEUE_CAPACITY".to_string()))?,
            request_timeout: env::var("NOTIFIER_REQUEST_TIMEOUT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("NOTIFIER_REQUEST_TIMEOUT".to_string()))?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chat_id.is_empty() {
            return Err(ConfigError::InvalidValue("TELEGRAM_CHAT_ID".to_string()));
        }

        if self.queue_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "NOTIFIER_QUEUE_CAPACITY cannot be 0".to_string(),
            ));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::InvalidValue(
                "NOTIFIER_REQUEST_TIMEOUT".to_string(),
            ));
        }

        Ok(())
    }
}

impl WatcherConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(WatcherConfig {
            poll_interval: env::var("PAYMENT_POLL_INTERVAL")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PAYMENT_POLL_INTERVAL".to_string()))?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval == 0 {
            return Err(ConfigError::InvalidValue(
                "PAYMENT_POLL_INTERVAL cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),

    #[error("Invalid value for configuration: {0}")]
    InvalidValue(String),
}

impl From<std::num::ParseIntError> for ConfigError {
    fn from(_: std::num::ParseIntError) -> Self {
        ConfigError::InvalidValue("Failed to parse integer value".to_string())
    }
}
