use clap::{Parser, ValueEnum};
use std::error::Error;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use vfb_core::client::{DEFAULT_SOLR_URL, DEFAULT_TERM_SERVICE_URL};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 30;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_SESSION_TTL_SECS: u64 = 3600;

/// Transport the process serves on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ServeMode {
    Stdio,
    Http,
}

impl fmt::Display for ServeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "vfb-mcpd", version, about = "Virtual Fly Brain MCP server.")]
struct CliArgs {
    #[arg(long, env = "MCP_MODE", value_enum, default_value_t = ServeMode::Stdio)]
    mode: ServeMode,

    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    #[arg(long, env = "VFB_BIND_ADDR", default_value = DEFAULT_BIND_ADDR)]
    bind_addr: IpAddr,

    /// Comma-separated Host header allowlist; empty allows any host.
    #[arg(long, env = "VFB_ALLOWED_HOSTS", value_delimiter = ',')]
    allowed_hosts: Vec<String>,

    #[arg(long, env = "VFB_TERM_SERVICE_URL", default_value = DEFAULT_TERM_SERVICE_URL)]
    term_service_url: String,

    #[arg(long, env = "VFB_SOLR_URL", default_value = DEFAULT_SOLR_URL)]
    solr_url: String,

    #[arg(
        long,
        env = "VFB_BACKEND_TIMEOUT_SECS",
        default_value_t = DEFAULT_BACKEND_TIMEOUT_SECS
    )]
    backend_timeout_secs: u64,

    #[arg(
        long,
        env = "VFB_REQUEST_TIMEOUT_SECS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS
    )]
    request_timeout_secs: u64,

    #[arg(
        long,
        env = "VFB_SESSION_TTL_SECS",
        default_value_t = DEFAULT_SESSION_TTL_SECS
    )]
    session_ttl_secs: u64,

    #[arg(long, env = "VFB_SESSION_SWEEP_SECS")]
    session_sweep_secs: Option<u64>,

    #[arg(long, env = "VFB_TELEMETRY_URL")]
    telemetry_url: Option<String>,
}

/// Runtime configuration loaded from CLI arguments and environment variables.
#[derive(Clone, Debug)]
pub struct VfbConfig {
    pub mode: ServeMode,
    pub http_addr: SocketAddr,
    pub allowed_hosts: Vec<String>,
    pub term_service_url: String,
    pub solr_url: String,
    pub backend_timeout: Duration,
    pub request_timeout: Duration,
    pub session_ttl: Option<Duration>,
    pub sweep_interval: Duration,
    pub telemetry_url: Option<String>,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingSetting(&'static str),
    InvalidSetting { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSetting(name) => write!(f, "missing required setting: {name}"),
            Self::InvalidSetting { name, value } => {
                write!(f, "invalid {name} value: {value}")
            }
        }
    }
}

impl Error for ConfigError {}

impl VfbConfig {
    pub fn from_args() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();
        Self::try_from(args)
    }
}

impl TryFrom<CliArgs> for VfbConfig {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let term_service_url = args.term_service_url.trim().to_string();
        if term_service_url.is_empty() {
            return Err(ConfigError::MissingSetting("VFB_TERM_SERVICE_URL"));
        }
        let solr_url = args.solr_url.trim().to_string();
        if solr_url.is_empty() {
            return Err(ConfigError::MissingSetting("VFB_SOLR_URL"));
        }
        if args.backend_timeout_secs == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "VFB_BACKEND_TIMEOUT_SECS",
                value: args.backend_timeout_secs.to_string(),
            });
        }
        if args.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "VFB_REQUEST_TIMEOUT_SECS",
                value: args.request_timeout_secs.to_string(),
            });
        }

        let session_ttl = if args.session_ttl_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(args.session_ttl_secs))
        };
        let sweep_secs = args.session_sweep_secs.unwrap_or(60);
        let sweep_interval = Duration::from_secs(sweep_secs.max(1));

        let allowed_hosts: Vec<String> = args
            .allowed_hosts
            .into_iter()
            .map(|host| host.trim().to_string())
            .filter(|host| !host.is_empty())
            .collect();

        let telemetry_url = args
            .telemetry_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        Ok(Self {
            mode: args.mode,
            http_addr: SocketAddr::new(args.bind_addr, args.port),
            allowed_hosts,
            term_service_url,
            solr_url,
            backend_timeout: Duration::from_secs(args.backend_timeout_secs),
            request_timeout: Duration::from_secs(args.request_timeout_secs),
            session_ttl,
            sweep_interval,
            telemetry_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> CliArgs {
        CliArgs {
            mode: ServeMode::Stdio,
            port: DEFAULT_PORT,
            bind_addr: DEFAULT_BIND_ADDR.parse().expect("valid bind addr"),
            allowed_hosts: Vec::new(),
            term_service_url: DEFAULT_TERM_SERVICE_URL.to_string(),
            solr_url: DEFAULT_SOLR_URL.to_string(),
            backend_timeout_secs: DEFAULT_BACKEND_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            session_sweep_secs: None,
            telemetry_url: None,
        }
    }

    #[test]
    fn defaults_parse_into_a_stdio_config() {
        let config = VfbConfig::try_from(base_args()).expect("config should parse");

        assert_eq!(config.mode, ServeMode::Stdio);
        assert_eq!(config.http_addr.port(), DEFAULT_PORT);
        assert_eq!(config.session_ttl, Some(Duration::from_secs(3600)));
        assert!(config.allowed_hosts.is_empty());
        assert!(config.telemetry_url.is_none());
    }

    #[test]
    fn zero_ttl_disables_session_eviction() {
        let mut args = base_args();
        args.session_ttl_secs = 0;

        let config = VfbConfig::try_from(args).expect("config should parse");

        assert!(config.session_ttl.is_none());
    }

    #[test]
    fn blank_allowed_hosts_are_dropped() {
        let mut args = base_args();
        args.allowed_hosts = vec![
            " vfb3-mcp.virtualflybrain.org ".to_string(),
            String::new(),
        ];

        let config = VfbConfig::try_from(args).expect("config should parse");

        assert_eq!(
            config.allowed_hosts,
            vec!["vfb3-mcp.virtualflybrain.org".to_string()]
        );
    }

    #[test]
    fn blank_telemetry_url_counts_as_disabled() {
        let mut args = base_args();
        args.telemetry_url = Some("   ".to_string());

        let config = VfbConfig::try_from(args).expect("config should parse");

        assert!(config.telemetry_url.is_none());
    }

    #[test]
    fn empty_backend_url_is_rejected() {
        let mut args = base_args();
        args.term_service_url = "  ".to_string();

        let err = VfbConfig::try_from(args).expect_err("blank URL must fail");

        assert!(matches!(err, ConfigError::MissingSetting("VFB_TERM_SERVICE_URL")));
    }

    #[test]
    fn zero_backend_timeout_is_rejected() {
        let mut args = base_args();
        args.backend_timeout_secs = 0;

        let err = VfbConfig::try_from(args).expect_err("zero timeout must fail");

        assert!(matches!(
            err,
            ConfigError::InvalidSetting {
                name: "VFB_BACKEND_TIMEOUT_SECS",
                ..
            }
        ));
    }
}
