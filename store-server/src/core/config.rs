use std::path::PathBuf;

/// Server configuration
///
/// All values can be overridden through environment variables:
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | /var/lib/lapak/store | Working directory (database, files, logs) |
/// | HTTP_PORT | 3000 | HTTP API port |
/// | ENVIRONMENT | development | development \| staging \| production |
/// | GATEWAY_BASE_URL | https://api.gateway.test | Payment gateway API base |
/// | GATEWAY_SERVER_KEY | (empty) | Gateway API key |
/// | GATEWAY_CALLBACK_SECRET | (empty) | Shared secret for callback HMAC |
/// | PENDING_TIMEOUT_MINUTES | 60 | Stuck PENDING gateway orders fail after this |
/// | DOWNLOAD_TTL_HOURS | 72 | Download token lifetime |
/// | DOWNLOAD_MAX_USES | 5 | Downloads allowed per token |
/// | MAIL_FROM | (empty) | Sender address; empty disables real dispatch |
/// | MAIL_FROM_NAME | Lapak Store | Sender display name |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | Graceful shutdown grace period |
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for database, delivered files and logs
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// Runtime environment: development | staging | production
    pub environment: String,

    // === Payment gateway ===
    pub gateway_base_url: String,
    pub gateway_server_key: String,
    pub gateway_callback_secret: String,
    /// Timeout policy for stuck PENDING gateway orders (minutes)
    pub pending_timeout_minutes: i64,

    // === Download tokens ===
    pub download_ttl_hours: i64,
    pub download_max_uses: i64,

    // === Mail ===
    pub mail_from: String,
    pub mail_from_name: String,

    /// Graceful shutdown grace period (milliseconds)
    pub shutdown_timeout_ms: u64,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/lapak/store".into()),
            http_port: env_parse("HTTP_PORT", 3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),

            gateway_base_url: std::env::var("GATEWAY_BASE_URL")
                .unwrap_or_else(|_| "https://api.gateway.test".into()),
            gateway_server_key: std::env::var("GATEWAY_SERVER_KEY").unwrap_or_default(),
            gateway_callback_secret: std::env::var("GATEWAY_CALLBACK_SECRET").unwrap_or_default(),
            pending_timeout_minutes: env_parse("PENDING_TIMEOUT_MINUTES", 60),

            download_ttl_hours: env_parse("DOWNLOAD_TTL_HOURS", 72),
            download_max_uses: env_parse("DOWNLOAD_MAX_USES", 5),

            mail_from: std::env::var("MAIL_FROM").unwrap_or_default(),
            mail_from_name: std::env::var("MAIL_FROM_NAME")
                .unwrap_or_else(|_| "Lapak Store".into()),

            shutdown_timeout_ms: env_parse("SHUTDOWN_TIMEOUT_MS", 10_000),
        }
    }

    /// Override work dir and port — used by tests
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// Directory holding deliverable source files
    pub fn files_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("files")
    }

    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        std::fs::create_dir_all(self.files_dir())?;
        std::fs::create_dir_all(self.log_dir())?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Download token TTL in milliseconds
    pub fn download_ttl_ms(&self) -> i64 {
        self.download_ttl_hours * 3600 * 1000
    }

    /// Pending-order timeout in milliseconds
    pub fn pending_timeout_ms(&self) -> i64 {
        self.pending_timeout_minutes * 60 * 1000
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
