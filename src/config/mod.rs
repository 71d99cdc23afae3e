use crate::report::LanguageOrder;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub api_server: ServerConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Sqlite,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Applied when the request omits `limit`
    pub default_limit: i64,
    /// Hard cap on requested limits
    pub max_limit: i64,
    /// Ordering of the folded language buckets
    pub language_order: LanguageOrder,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
            language_order: LanguageOrder::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let backend_str =
            std::env::var("DATABASE_BACKEND").unwrap_or_else(|_| "sqlite".to_string());

        let backend = match backend_str.to_lowercase().as_str() {
            "postgres" | "postgresql" => DatabaseBackend::Postgres,
            _ => DatabaseBackend::Sqlite,
        };

        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://./vantage.db".to_string());

        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()?;

        let api_host = std::env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let api_port = std::env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let default_limit = std::env::var("REPORT_DEFAULT_LIMIT")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<i64>()?;
        let max_limit = std::env::var("REPORT_MAX_LIMIT")
            .unwrap_or_else(|_| "100".to_string())
            .parse::<i64>()?;

        let language_order = match std::env::var("REPORT_LANGUAGE_ORDER")
            .unwrap_or_else(|_| "first-seen".to_string())
            .to_lowercase()
            .as_str()
        {
            "merged-count" => LanguageOrder::MergedCount,
            "first-seen" => LanguageOrder::FirstSeen,
            other => {
                tracing::warn!(
                    "Unknown REPORT_LANGUAGE_ORDER '{other}', falling back to 'first-seen'. Supported values: first-seen, merged-count"
                );
                LanguageOrder::FirstSeen
            }
        };

        Ok(Config {
            database: DatabaseConfig {
                backend,
                url: database_url,
                max_connections,
            },
            api_server: ServerConfig {
                host: api_host,
                port: api_port,
            },
            report: ReportConfig {
                default_limit,
                max_limit,
                language_order,
            },
        })
    }
}
