//! Process configuration read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_TICK_HZ: u32 = 90;

/// Server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Story manifest to play.
    pub story_path: PathBuf,
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Stage ticks per second.
    pub tick_hz: u32,
}

impl ServerConfig {
    /// Reads `STORY_PATH`, `HOST`, `PORT` and `TICK_HZ` from the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when `STORY_PATH` is missing or a value
    /// does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the settings through `lookup`.
    ///
    /// # Errors
    ///
    /// Same as [`ServerConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let story_path = lookup("STORY_PATH")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| {
                AppError::Config("STORY_PATH environment variable must be set".to_owned())
            })?;
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned());
        let port = match lookup("PORT") {
            Some(port) => port
                .parse()
                .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?,
            None => DEFAULT_PORT,
        };
        let tick_hz = match lookup("TICK_HZ") {
            Some(hz) => hz
                .parse()
                .map_err(|e| AppError::Config(format!("TICK_HZ must be a valid u32: {e}")))?,
            None => DEFAULT_TICK_HZ,
        };
        if tick_hz == 0 {
            return Err(AppError::Config("TICK_HZ must be at least 1".to_owned()));
        }

        Ok(Self {
            story_path,
            host,
            port,
            tick_hz,
        })
    }

    /// Address to listen on.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for an unparseable host.
    pub fn addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }

    /// Time between stage ticks.
    #[must_use]
    pub fn tick(&self) -> Duration {
        Duration::from_secs(1) / self.tick_hz
    }
}
