//! Process configuration

use clap::Parser;

use crate::{Error, Result};

/// NetworkFilesystem endpoint controller
#[derive(Parser, Debug, Clone)]
#[command(name = "networkfs-endpoint-controller", version, about)]
pub struct Config {
    /// Namespace holding NetworkFilesystem resources
    #[arg(long, env = "NAMESPACE", default_value = "harvester-system")]
    pub namespace: String,

    /// Name of the node this controller runs on
    #[arg(long, env = "NODE_NAME")]
    pub node_name: Option<String>,

    /// Port for the metrics and health endpoints
    #[arg(long, env = "METRICS_PORT", default_value = "8080")]
    pub metrics_port: u16,

    /// Emit logs as JSON
    #[arg(long, env = "LOG_JSON", default_value_t = false)]
    pub log_json: bool,
}

impl Config {
    /// Reject values clap cannot catch on its own
    pub fn validate(&self) -> Result<()> {
        if self.namespace.trim().is_empty() {
            return Err(Error::Config("namespace cannot be empty".to_string()));
        }
        if self.metrics_port == 0 {
            return Err(Error::Config("metrics port must be > 0".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::parse_from(["networkfs-endpoint-controller"]);
        assert_eq!(config.metrics_port, 8080);
        assert!(!config.log_json);
    }

    #[test]
    fn flags_override() {
        let config = Config::parse_from([
            "networkfs-endpoint-controller",
            "--namespace",
            "storage",
            "--node-name",
            "node-1",
            "--metrics-port",
            "9100",
        ]);
        assert_eq!(config.namespace, "storage");
        assert_eq!(config.node_name.as_deref(), Some("node-1"));
        assert_eq!(config.metrics_port, 9100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_namespace_is_rejected() {
        let config = Config::parse_from(["networkfs-endpoint-controller", "--namespace", " "]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("namespace"));
    }
}
