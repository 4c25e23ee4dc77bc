use std::path::PathBuf;
use std::time::Duration;

use config::{ConfigError, Environment, File};
use serde_derive::Deserialize;
use simplelog::LevelFilter;


const ENV_PREFIX: &str = "RAWHTTPD";
const ENV_SEPARATOR: &str = "__";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: i64 = 4221;
pub const DEFAULT_WORKERS: i64 = 8;


#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    /// Per-connection read deadline, 0 disables it.
    pub read_timeout_ms: u64,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        match self.read_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub level: String,
    pub file: String,
}

impl LogConfig {
    pub fn level_filter(&self) -> LevelFilter {
        self.level.parse().unwrap_or(LevelFilter::Info)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    pub log: LogConfig,
}

impl Config {
    /// Defaults, then the optional file, then `RAWHTTPD__SECTION__KEY`
    /// environment variables.
    pub fn load(path: Option<&str>) -> Result<Config, ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("server.host", DEFAULT_HOST)?
            .set_default("server.port", DEFAULT_PORT)?
            .set_default("server.workers", DEFAULT_WORKERS)?
            .set_default("server.read_timeout_ms", 0_i64)?
            .set_default("log.type", "console")?
            .set_default("log.level", "info")?
            .set_default("log.file", "rawhttpd.log")?;

        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path));
        }

        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Command line value wins over whatever the layers produced.
    pub fn with_directory(mut self, directory: Option<PathBuf>) -> Config {
        if directory.is_some() {
            self.storage.directory = directory;
        }
        self
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::generate_hex_id;

    #[test]
    fn defaults_are_complete() {
        let cfg = Config::load(None).unwrap();
        assert_eq!(cfg.server.workers, DEFAULT_WORKERS as usize);
        assert_eq!(cfg.log.kind, "console");
        assert_eq!(cfg.log.level_filter(), LevelFilter::Info);
    }

    #[test]
    fn file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!("rawhttpd-{}.toml", generate_hex_id(8)));
        std::fs::write(
            &path,
            "[server]\nport = 8080\nread_timeout_ms = 250\n\n[storage]\ndirectory = \"/srv/files\"\n\n[log]\nlevel = \"debug\"\n",
        ).unwrap();

        let cfg = Config::load(path.to_str()).unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.host, DEFAULT_HOST);
        assert_eq!(cfg.server.read_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(cfg.storage.directory, Some(PathBuf::from("/srv/files")));
        assert_eq!(cfg.log.level_filter(), LevelFilter::Debug);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Config::load(Some("/nonexistent/rawhttpd-config.toml")).is_err());
    }

    #[test]
    fn command_line_directory_wins() {
        let cfg = Config::load(None).unwrap().with_directory(Some(PathBuf::from("/tmp/x")));
        assert_eq!(cfg.storage.directory, Some(PathBuf::from("/tmp/x")));

        let cfg = cfg.with_directory(None);
        assert_eq!(cfg.storage.directory, Some(PathBuf::from("/tmp/x")));
    }

    #[test]
    fn zero_timeout_disables_deadline() {
        let cfg = Config::load(None).unwrap();
        assert_eq!(cfg.server.read_timeout(), None);
        assert_eq!(cfg.server.address(), format!("{}:{}", DEFAULT_HOST, DEFAULT_PORT));
    }
}
