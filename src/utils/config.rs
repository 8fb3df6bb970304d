use crate::types::StartupFailure;
use std::{env, str::FromStr, time::Duration};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectMode {
    #[default]
    Eager,
    /// Defer connecting until the first query. Startup only validates the url.
    Lazy,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub service_name: String,
    pub log_format: LogFormat,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub connect: ConnectMode,
    pub migrate: bool,
}

#[derive(Clone, Debug)]
pub struct OutboundPoolConfig {
    pub name: String,
    pub url: String,
    pub max_connections: usize,
    pub timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub outbound: Vec<OutboundPoolConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self, StartupFailure> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StartupFailure>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let host = vars.get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = vars.parse("PORT", 8000u16)?;
        let service_name = vars
            .get("SERVICE_NAME")
            .unwrap_or_else(|| "backend".to_string());
        let log_format = match vars.get("LOG_FORMAT").as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => return Err(invalid("LOG_FORMAT", other)),
        };

        let database_url = vars
            .get("DATABASE_URL")
            .ok_or(StartupFailure::MissingConfig("DATABASE_URL"))?;
        let max_connections = vars.parse("DATABASE_MAX_CONNECTIONS", 4u32)?;
        let acquire_timeout = vars.parse("DATABASE_ACQUIRE_TIMEOUT_SECS", 5u64)?;
        let connect = match vars.get("DATABASE_CONNECT").as_deref() {
            None | Some("eager") => ConnectMode::Eager,
            Some("lazy") => ConnectMode::Lazy,
            Some(other) => return Err(invalid("DATABASE_CONNECT", other)),
        };
        // Migrations need a live connection, which lazy mode does not open.
        let migrate = vars.parse("DATABASE_MIGRATE", connect == ConnectMode::Eager)?;
        if migrate && connect == ConnectMode::Lazy {
            return Err(StartupFailure::InvalidConfig {
                key: "DATABASE_MIGRATE",
                reason: String::from("migrations cannot run with DATABASE_CONNECT=lazy"),
            });
        }

        let outbound_max_connections = vars.parse("OUTBOUND_MAX_CONNECTIONS", 8usize)?;
        let outbound_timeout = vars.parse("OUTBOUND_TIMEOUT_SECS", 5u64)?;
        let outbound = match vars.get("OUTBOUND_POOLS") {
            Some(raw) => parse_pools(&raw)?
                .into_iter()
                .map(|(name, url)| OutboundPoolConfig {
                    name,
                    url,
                    max_connections: outbound_max_connections,
                    timeout: Duration::from_secs(outbound_timeout),
                })
                .collect(),
            None => vec![],
        };

        Ok(Self {
            app: AppConfig {
                host,
                port,
                service_name,
                log_format,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
                acquire_timeout: Duration::from_secs(acquire_timeout),
                connect,
                migrate,
            },
            outbound,
        })
    }
}

struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    fn parse<T: FromStr>(&self, key: &'static str, default: T) -> Result<T, StartupFailure> {
        match self.get(key) {
            Some(raw) => raw.trim().parse::<T>().map_err(|_| invalid(key, &raw)),
            None => Ok(default),
        }
    }
}

fn invalid(key: &'static str, value: &str) -> StartupFailure {
    StartupFailure::InvalidConfig {
        key,
        reason: format!("unsupported value `{}`", value),
    }
}

/// Parses `name=url,name=url`.
fn parse_pools(raw: &str) -> Result<Vec<(String, String)>, StartupFailure> {
    let mut pools: Vec<(String, String)> = vec![];

    for entry in raw.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
        let (name, url) = entry
            .split_once('=')
            .map(|(name, url)| (name.trim(), url.trim()))
            .filter(|(name, url)| !name.is_empty() && !url.is_empty())
            .ok_or_else(|| invalid("OUTBOUND_POOLS", entry))?;

        if pools.iter().any(|(existing, _)| existing == name) {
            return Err(StartupFailure::InvalidConfig {
                key: "OUTBOUND_POOLS",
                reason: format!("pool `{}` is declared twice", name),
            });
        }

        pools.push((name.to_string(), url.to_string()));
    }

    Ok(pools)
}
