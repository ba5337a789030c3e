use std::env;
use std::path::PathBuf;

/// Runtime configuration for the share server
#[derive(Debug, Clone)]
pub struct ShareConfig {
    /// Directory holding every shared file (default: "./public")
    pub storage_dir: PathBuf,

    /// Bind host used when LAN detection is off or finds nothing (default: "127.0.0.1")
    pub host: String,

    /// Bind port (default: 8080)
    pub port: u16,

    /// Pick the first LAN address matching `auto_ip_prefix` (default: true)
    pub auto_ip: bool,

    /// Dotted prefix an interface address must start with (default: "192")
    pub auto_ip_prefix: String,

    /// Largest declared total size accepted for one upload (default: 16 GB)
    pub max_file_size: u64,

    /// Copy buffer size for one transfer chunk in bytes (default: 64 KB)
    pub buffer_size: usize,

    /// Percent step between two progress log lines (default: 10)
    pub progress_log_step: u8,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("./public"),
            host: "127.0.0.1".to_string(),
            port: 8080,
            auto_ip: true,
            auto_ip_prefix: "192".to_string(),
            max_file_size: 16 * 1024 * 1024 * 1024, // 16 GB
            buffer_size: 64 * 1024,                 // 64 KB
            progress_log_step: 10,
        }
    }
}

impl ShareConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            storage_dir: env::var("STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.storage_dir),

            host: env::var("HOST").unwrap_or(default.host),

            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),

            auto_ip: env::var("AUTO_IP")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(default.auto_ip),

            auto_ip_prefix: env::var("AUTO_IP_PREFIX").unwrap_or(default.auto_ip_prefix),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            buffer_size: env::var("TRANSFER_BUFFER_SIZE")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .map(|v| v.max(1))
                .unwrap_or(default.buffer_size),

            progress_log_step: env::var("PROGRESS_LOG_STEP")
                .ok()
                .and_then(|v| v.parse::<u8>().ok())
                .map(|v| v.clamp(1, 100))
                .unwrap_or(default.progress_log_step),
        }
    }

    /// Create config for local development and tests (loopback only, small buffers)
    pub fn development(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            host: "127.0.0.1".to_string(),
            port: 8080,
            auto_ip: false,
            auto_ip_prefix: "192".to_string(),
            max_file_size: 64 * 1024 * 1024, // 64 MB
            buffer_size: 4 * 1024,           // 4 KB
            progress_log_step: 25,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ShareConfig::default();
        assert_eq!(config.storage_dir, PathBuf::from("./public"));
        assert_eq!(config.port, 8080);
        assert!(config.auto_ip);
        assert_eq!(config.auto_ip_prefix, "192");
        assert_eq!(config.buffer_size, 64 * 1024);
    }

    #[test]
    fn test_development_config() {
        let config = ShareConfig::development("/tmp/share");
        assert!(!config.auto_ip);
        assert_eq!(config.storage_dir, PathBuf::from("/tmp/share"));
        assert_eq!(config.buffer_size, 4 * 1024);
    }

    #[test]
    fn test_from_env_clamps_buffer_size() {
        unsafe { env::set_var("TRANSFER_BUFFER_SIZE", "0") };
        let config = ShareConfig::from_env();
        unsafe { env::remove_var("TRANSFER_BUFFER_SIZE") };
        assert_eq!(config.buffer_size, 1);
    }
}
