use clap::Parser;
use std::path::PathBuf;

use hostbridge_core::config::Config;
use hostbridge_core::error::ConfigError;

#[derive(Parser, Debug)]
#[command(name = "hostbridge")]
#[command(author = "Hostbridge Team")]
#[command(version)]
#[command(about = "Standalone runner for the hostbridge status endpoint", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "/etc/hostbridge.toml")]
    pub config: PathBuf,

    /// HTTP port for the status endpoint
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory scanned for installed packages
    #[arg(long)]
    pub packages_dir: Option<PathBuf>,

    /// Version string the stand-in host reports
    #[arg(long)]
    pub platform_version: Option<String>,

    /// Verbose logging
    #[arg(short, long, action)]
    pub verbose: bool,
}

impl Args {
    pub fn load_config(&self) -> Result<Config, ConfigError> {
        Config::load(&self.config)
    }

    /// Command line flags win over the file and the environment.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.http.port = port;
        }
        if let Some(ref dir) = self.packages_dir {
            config.inventory.packages_dir = dir.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostbridge_core::config::{PACKAGES_DIR_ENV, PORT_ENV};

    fn layered_config() -> Config {
        let mut config = Config::from_toml(
            r#"
            [http]
            port = 9000

            [inventory]
            packages_dir = "/from/file"
            "#,
        )
        .unwrap();
        config.apply_overrides_from(|key| match key {
            PORT_ENV => Some("9100".to_string()),
            PACKAGES_DIR_ENV => Some("/from/env".to_string()),
            _ => None,
        });
        config
    }

    #[test]
    fn flags_win_over_env_and_file() {
        let args = Args::parse_from([
            "hostbridge",
            "--port",
            "9200",
            "--packages-dir",
            "/from/cli",
        ]);
        let mut config = layered_config();
        args.apply_overrides(&mut config);
        assert_eq!(config.http.port, 9200);
        assert_eq!(config.inventory.packages_dir, PathBuf::from("/from/cli"));
    }

    #[test]
    fn absent_flags_leave_config_untouched() {
        let args = Args::parse_from(["hostbridge"]);
        let mut config = layered_config();
        args.apply_overrides(&mut config);
        assert_eq!(config.http.port, 9100);
        assert_eq!(config.inventory.packages_dir, PathBuf::from("/from/env"));
        assert_eq!(args.config, PathBuf::from("/etc/hostbridge.toml"));
    }

    #[test]
    fn only_the_given_flag_is_applied() {
        let args = Args::parse_from(["hostbridge", "-p", "0"]);
        let mut config = layered_config();
        args.apply_overrides(&mut config);
        assert_eq!(config.http.port, 0);
        assert_eq!(config.inventory.packages_dir, PathBuf::from("/from/env"));
    }

    #[test]
    fn out_of_range_port_is_rejected() {
        assert!(Args::try_parse_from(["hostbridge", "--port", "70000"]).is_err());
        assert!(Args::try_parse_from(["hostbridge", "--port", ""]).is_err());
    }
}
