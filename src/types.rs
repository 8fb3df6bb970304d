pub use crate::utils::config::Config;
use crate::utils::{
    config::{AppConfig, ConnectMode},
    database::{self, DatabaseConnection},
    logging::Logger,
    outbound::OutboundPool,
};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// A resource the service cannot start without failed to come up.
#[derive(Debug, thiserror::Error)]
pub enum StartupFailure {
    #[error("{0} not set")]
    MissingConfig(&'static str),
    #[error("invalid {key}: {reason}")]
    InvalidConfig { key: &'static str, reason: String },
    #[error("failed to connect to the database: {0}")]
    Database(String),
    #[error("failed to run database migrations: {0}")]
    Migration(String),
    #[error("failed to initialize outbound pool `{name}`: {reason}")]
    OutboundPool { name: String, reason: String },
    #[error("failed to bind {address}: {reason}")]
    Listener { address: String, reason: String },
}

/// Process-wide shared resources.
///
/// Built once before any controller exists and only read afterwards, so it is
/// shared behind an `Arc` without locking.
pub struct Context {
    pub app: AppConfig,
    logger: Logger,
    db_conn: DatabaseConnection,
    outbound: BTreeMap<String, OutboundPool>,
}

impl Context {
    pub fn new(
        app: AppConfig,
        logger: Logger,
        db_conn: DatabaseConnection,
        outbound: Vec<OutboundPool>,
    ) -> Self {
        Self {
            app,
            logger,
            db_conn,
            outbound: outbound
                .into_iter()
                .map(|pool| (pool.name().to_string(), pool))
                .collect(),
        }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn database(&self) -> &DatabaseConnection {
        &self.db_conn
    }

    pub fn outbound_pool(&self, name: &str) -> Option<&OutboundPool> {
        self.outbound.get(name)
    }

    pub fn outbound_pools(&self) -> impl Iterator<Item = &OutboundPool> {
        self.outbound.values()
    }

    /// Releases the database and outbound pools. Called once, after the
    /// server has stopped accepting requests.
    pub async fn shutdown(&self) {
        tracing::info!(parent: self.logger.span(), "Shutting down shared resources");

        for pool in self.outbound.values() {
            pool.close();
        }
        self.db_conn.close().await;
    }
}

#[async_trait]
pub trait ToContext {
    async fn to_context(self) -> Result<Context, StartupFailure>;
}

#[async_trait]
impl ToContext for Config {
    async fn to_context(self) -> Result<Context, StartupFailure> {
        let logger = Logger::new(&self.app.service_name);

        let outbound = self
            .outbound
            .iter()
            .map(OutboundPool::new)
            .collect::<Result<Vec<_>, _>>()?;

        let db_conn = database::connect(&self.database).await?;
        match (self.database.migrate, self.database.connect) {
            (true, ConnectMode::Eager) => database::migrate(&db_conn).await?,
            (true, ConnectMode::Lazy) => tracing::warn!(
                parent: logger.span(),
                "Skipping migrations, the database is connected lazily"
            ),
            (false, _) => {}
        }

        tracing::info!(
            parent: logger.span(),
            "Initialized database pool and {} outbound pool(s)",
            outbound.len()
        );

        Ok(Context::new(self.app, logger, db_conn, outbound))
    }
}
