//! CLI error types.

use thiserror::Error;

use crate::config::ConfigError;

/// CLI errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration is invalid or missing required fields.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// No server was configured or selected.
    #[error("no MCP servers configured; add a [servers.NAME] table to {config}")]
    NoServers { config: String },

    /// Every selected server failed to start.
    #[error("could not connect to any MCP server")]
    NoConnections,

    /// An error occurred in the runtime layer.
    #[error(transparent)]
    Runtime(#[from] runtime::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_and_runtime_errors_convert() {
        let config: Error = ConfigError::UnknownServer("postgres".into()).into();
        assert_eq!(
            config.to_string(),
            "config error: no server named 'postgres' in config"
        );

        let runtime: Error = runtime::Error::NoToolsAvailable.into();
        assert_eq!(runtime.to_string(), "no tools available from any server");
    }

    #[test]
    fn no_servers_points_at_the_config_file() {
        let err = Error::NoServers {
            config: "switchboard.toml".into(),
        };
        assert!(err.to_string().ends_with("to switchboard.toml"));
    }
}
