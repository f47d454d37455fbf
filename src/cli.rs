//! Shared command-line plumbing for the tools.

use std::path::PathBuf;

use clap::Args;

use crate::config::{default_config_path, ApiConfig, ConfigError, ConfigOverrides};

/// API connection flags common to every network tool.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// User for the Zabbix api
    #[arg(short = 'u', long)]
    pub username: Option<String>,

    /// Password for the Zabbix api user
    #[arg(short = 'p', long)]
    pub password: Option<String>,

    /// Zabbix API URL
    #[arg(short = 'a', long)]
    pub api: Option<String>,

    /// Disables certificate validation when using a secure connection
    #[arg(long)]
    pub no_verify: bool,

    /// Config file location (defaults to $HOME/.zabbix-api.conf)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,
}

impl ConnectionArgs {
    /// Resolve the effective configuration (flags beat the config file).
    pub fn resolve(&self) -> Result<ApiConfig, ConfigError> {
        let path = self.config.clone().or_else(default_config_path);
        let overrides = ConfigOverrides {
            username: self.username.clone(),
            password: self.password.clone(),
            api_url: self.api.clone(),
            no_verify: self.no_verify,
        };
        ApiConfig::resolve(path.as_deref(), &overrides)
    }
}

/// Help epilog describing the shared config file format.
pub const CONFIG_EPILOG: &str = "\
This program can use .ini style configuration files to retrieve the needed \
API connection information. To use this type of storage, create a conf file \
(the default is $HOME/.zabbix-api.conf) that contains at least the \
[Zabbix API] section and any of the other parameters:

 [Zabbix API]
 username=johndoe
 password=verysecretpassword
 api=https://zabbix.mycompany.com/path/to/zabbix/frontend/
 no_verify=true
";

/// Initialize logging to stderr, keeping stdout clean for tool output.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}
