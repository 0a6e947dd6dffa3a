/*
 * Responsibility
 * - 環境変数や設定の読み込み (DB_CONNECTION_STRING, CORS 許可、Auth 設定など)
 * - 設定値のバリデーション (不足なら起動失敗)
 * - process 起動時に一度だけ読み、以降は読み取り専用
 */
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Which backing store family `DB_CONNECTION_STRING` points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbClient {
    Postgresql,
    Mysql,
}

impl FromStr for DbClient {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgresql" | "postgres" | "pg" => Ok(Self::Postgresql),
            "mysql" | "mariadb" => Ok(Self::Mysql),
            _ => Err(ConfigError::Invalid("DB_CLIENT")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Tables {
    pub document_register: String,
    pub read_receipt: String,
    pub patient_preferences: String,
    pub patient_preferences_type: String,
    pub patient_preferences_value: String,
    pub bearer_token: String,
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub client: DbClient,
    pub connection_string: String,
    pub max_connections: u32,
    pub tables: Tables,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // connection string carries credentials
        f.debug_struct("DatabaseConfig")
            .field("client", &self.client)
            .field("max_connections", &self.max_connections)
            .field("tables", &self.tables)
            .finish()
    }
}

#[derive(Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigin {
    Any,
    List(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// `None` disables CORS headers entirely.
    pub origin: Option<CorsOrigin>,
    pub allowed_headers: Vec<String>,
    pub exposed_headers: Vec<String>,
    pub allow_credentials: bool,
    pub max_age: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_per_minute: u32,
    pub excluded: Vec<IpAddr>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub log_level: String,

    pub database: DatabaseConfig,

    pub bearer_token_auth_enabled: bool,
    pub admin: Option<AdminCredentials>,

    pub cors: CorsConfig,
    pub rate_limit: RateLimitConfig,

    pub request_timeout: Duration,
    pub request_body_limit: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let host = std::env::var("SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = std::env::var("SERVICE_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("{}:{}", host, port))
            .map_err(|_| ConfigError::Invalid("SERVICE_HOST"))?;

        let app_env = AppEnv::from_env();
        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let client = match std::env::var("DB_CLIENT") {
            Ok(v) => v.parse::<DbClient>()?,
            Err(_) => DbClient::Postgresql,
        };

        let connection_string = std::env::var("DB_CONNECTION_STRING")
            .map_err(|_| ConfigError::Missing("DB_CONNECTION_STRING"))?;

        let max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);

        let tables = Tables {
            document_register: table_from_env("DB_DOCUMENT_REGISTER_TABLE", "document_register")?,
            read_receipt: table_from_env("DB_READ_RECEIPT_DOCS_TABLE", "read_receipt")?,
            patient_preferences: table_from_env(
                "DB_PATIENT_PREFERENCES_TABLE",
                "patient_preferences",
            )?,
            patient_preferences_type: table_from_env(
                "DB_PATIENT_PREFERENCES_TYPE_TABLE",
                "patient_preferences_type",
            )?,
            patient_preferences_value: table_from_env(
                "DB_PATIENT_PREFERENCES_VALUE_TABLE",
                "patient_preferences_value",
            )?,
            bearer_token: table_from_env("DB_BEARER_TOKEN_TABLE", "access_tokens")?,
        };

        let bearer_token_auth_enabled = match std::env::var("BEARER_TOKEN_AUTH_ENABLED") {
            Ok(v) => parse_bool(&v).ok_or(ConfigError::Invalid("BEARER_TOKEN_AUTH_ENABLED"))?,
            Err(_) => false,
        };

        let admin = match (
            std::env::var("ADMIN_USERNAME").ok().filter(|s| !s.is_empty()),
            std::env::var("ADMIN_PASSWORD").ok().filter(|s| !s.is_empty()),
        ) {
            (Some(username), Some(password)) => Some(AdminCredentials { username, password }),
            _ => None,
        };

        let cors = CorsConfig {
            origin: std::env::var("CORS_ORIGIN")
                .ok()
                .and_then(|v| parse_cors_origin(&v)),
            allowed_headers: split_list(&std::env::var("CORS_ALLOWED_HEADERS").unwrap_or_default()),
            exposed_headers: split_list(&std::env::var("CORS_EXPOSED_HEADERS").unwrap_or_default()),
            allow_credentials: match std::env::var("CORS_ALLOW_CREDENTIALS") {
                Ok(v) => parse_bool(&v).ok_or(ConfigError::Invalid("CORS_ALLOW_CREDENTIALS"))?,
                Err(_) => false,
            },
            max_age: std::env::var("CORS_MAX_AGE")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs),
        };

        let rate_limit = RateLimitConfig {
            max_per_minute: std::env::var("RATE_LIMIT_MAX_CONNECTIONS_PER_MIN")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(1000),
            excluded: split_list(&std::env::var("RATE_LIMIT_EXCLUDED_ARRAY").unwrap_or_default())
                .iter()
                .map(|s| s.parse::<IpAddr>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| ConfigError::Invalid("RATE_LIMIT_EXCLUDED_ARRAY"))?,
        };

        let request_timeout = std::env::var("REQUEST_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));

        let request_body_limit = std::env::var("REQUEST_BODY_LIMIT_BYTES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(1024 * 1024);

        Ok(Self {
            addr,
            app_env,
            log_level,
            database: DatabaseConfig {
                client,
                connection_string,
                max_connections,
                tables,
            },
            bearer_token_auth_enabled,
            admin,
            cors,
            rate_limit,
            request_timeout,
            request_body_limit,
        })
    }
}

fn table_from_env(key: &'static str, default: &str) -> Result<String, ConfigError> {
    let name = std::env::var(key).unwrap_or_else(|_| default.to_string());
    if is_valid_table_name(&name) {
        Ok(name)
    } else {
        Err(ConfigError::Invalid(key))
    }
}

/// Table names are formatted into SQL, so only plain (optionally schema-qualified)
/// identifiers are accepted.
pub fn is_valid_table_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.ends_with('.')
        && !name.contains("..")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

fn parse_cors_origin(value: &str) -> Option<CorsOrigin> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if value == "*" {
        return Some(CorsOrigin::Any);
    }
    Some(CorsOrigin::List(split_list(value)))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
impl Config {
    /// Baseline config for router tests; no environment access.
    pub fn for_tests() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            app_env: AppEnv::Development,
            log_level: "debug".to_string(),
            database: DatabaseConfig {
                client: DbClient::Postgresql,
                connection_string: "postgres://localhost:1/unused".to_string(),
                max_connections: 1,
                tables: Tables {
                    document_register: "document_register".to_string(),
                    read_receipt: "read_receipt".to_string(),
                    patient_preferences: "patient_preferences".to_string(),
                    patient_preferences_type: "patient_preferences_type".to_string(),
                    patient_preferences_value: "patient_preferences_value".to_string(),
                    bearer_token: "access_tokens".to_string(),
                },
            },
            bearer_token_auth_enabled: false,
            admin: None,
            cors: CorsConfig {
                origin: None,
                allowed_headers: Vec::new(),
                exposed_headers: Vec::new(),
                allow_credentials: false,
                max_age: None,
            },
            rate_limit: RateLimitConfig {
                max_per_minute: 1000,
                excluded: Vec::new(),
            },
            request_timeout: Duration::from_secs(30),
            request_body_limit: 1024 * 1024,
        }
    }
}
