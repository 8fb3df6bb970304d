use crate::{
    repository,
    types::StartupFailure,
    utils::config::{ConnectMode, DatabaseConfig},
};
use sqlx::{postgres::PgPoolOptions, PgPool};

#[derive(Clone, Debug)]
pub struct DatabaseConnection {
    pub pool: PgPool,
}

impl DatabaseConnection {
    pub async fn ping(&self) -> Result<(), repository::Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|err| {
                tracing::warn!("Database ping failed: {}", err);
                repository::Error::from(err)
            })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, StartupFailure> {
    let options = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout);

    let pool = match config.connect {
        ConnectMode::Eager => options.connect(&config.url).await,
        ConnectMode::Lazy => options.connect_lazy(&config.url),
    };

    pool.map(|pool| DatabaseConnection { pool }).map_err(|err| {
        tracing::error!("{:}", err);
        StartupFailure::Database(err.to_string())
    })
}

pub async fn migrate(db_conn: &DatabaseConnection) -> Result<(), StartupFailure> {
    sqlx::migrate!().run(&db_conn.pool).await.map_err(|err| {
        tracing::error!("{}", err);
        StartupFailure::Migration(err.to_string())
    })
}
