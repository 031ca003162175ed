use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
///
/// Loaded once at startup and passed into constructors; nothing in the
/// workflow reads the process environment after this point.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub storage: StorageConfig,
    pub workflow: WorkflowConfig,
    pub mail: MailConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let db_path = env::var("DB_PATH").unwrap_or_else(|_| "gatepass.redb".to_string());
        let roster_path = env::var("STUDENTS_CSV_PATH")
            .unwrap_or_else(|_| "students_master_data.csv".to_string());

        let token_ttl_hours = env::var("TOKEN_TTL_HOURS")
            .unwrap_or_else(|_| "24".to_string())
            .parse::<i64>()
            .map_err(|_| ConfigError::InvalidTokenTtl)?;
        if token_ttl_hours <= 0 {
            return Err(ConfigError::InvalidTokenTtl);
        }

        let max_leave_days = env::var("MAX_LEAVE_DAYS")
            .unwrap_or_else(|_| "14".to_string())
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidMaxLeaveDays)?;

        let admin_email =
            env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@campus.example.edu".to_string());
        let security_email = env::var("SECURITY_EMAIL")
            .unwrap_or_else(|_| "security@campus.example.edu".to_string());
        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        let smtp = match env::var("SMTP_HOST") {
            Ok(smtp_host) if !smtp_host.trim().is_empty() => {
                let smtp_host = smtp_host.trim().to_string();
                if smtp_host.contains("://") {
                    return Err(ConfigError::SmtpHostIsUrl { value: smtp_host });
                }
                let smtp_port = env::var("SMTP_PORT")
                    .unwrap_or_else(|_| "465".to_string())
                    .parse::<u16>()
                    .map_err(|_| ConfigError::InvalidSmtpPort)?;
                let security = SmtpSecurity::from_str(
                    &env::var("SMTP_SECURITY").unwrap_or_else(|_| "auto".to_string()),
                );
                Some(SmtpConfig {
                    host: smtp_host,
                    port: smtp_port,
                    username: env::var("SMTP_USER").ok().filter(|v| !v.is_empty()),
                    password: env::var("SMTP_PASS").ok().filter(|v| !v.is_empty()),
                    security,
                })
            }
            _ => None,
        };

        let from_address = env::var("SMTP_FROM").unwrap_or_else(|_| admin_email.clone());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            storage: StorageConfig {
                db_path: PathBuf::from(db_path),
                roster_path: PathBuf::from(roster_path),
            },
            workflow: WorkflowConfig {
                admin_email,
                security_email,
                public_base_url,
                token_ttl_hours,
                max_leave_days,
            },
            mail: MailConfig {
                from_address,
                smtp,
            },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Paths for the embedded database and the student master list.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub db_path: PathBuf,
    pub roster_path: PathBuf,
}

/// Immutable workflow dials: recipient addresses, action-link base URL,
/// token lifetime, intake caps.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub admin_email: String,
    pub security_email: String,
    pub public_base_url: String,
    pub token_ttl_hours: i64,
    pub max_leave_days: u32,
}

/// Outbound mail settings. `smtp: None` means sends are logged and skipped.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub from_address: String,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub security: SmtpSecurity,
}

/// Transport security selection, mirroring common provider setups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpSecurity {
    /// STARTTLS on 587, implicit TLS otherwise.
    Auto,
    Starttls,
    Implicit,
}

impl SmtpSecurity {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "starttls" => Self::Starttls,
            "implicit" | "ssl" | "tls" => Self::Implicit,
            _ => Self::Auto,
        }
    }

    pub fn use_starttls(self, port: u16) -> bool {
        match self {
            Self::Starttls => true,
            Self::Implicit => false,
            Self::Auto => port == 587,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidTokenTtl,
    InvalidMaxLeaveDays,
    InvalidSmtpPort,
    SmtpHostIsUrl { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidTokenTtl => {
                write!(f, "TOKEN_TTL_HOURS must be a positive integer")
            }
            ConfigError::InvalidMaxLeaveDays => {
                write!(f, "MAX_LEAVE_DAYS must be a non-negative integer")
            }
            ConfigError::InvalidSmtpPort => write!(f, "SMTP_PORT must be a valid u16"),
            ConfigError::SmtpHostIsUrl { value } => {
                write!(f, "SMTP_HOST must be a hostname, not a URL: {value:?}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
