use crate::{
    repository,
    router::{Endpoint, Method},
    types::Context,
    utils::{database::DatabaseConnection, logging::Logger, outbound::OutboundPool},
};
use async_trait::async_trait;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::on,
    Json,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::Instrument;

/// Storage the health check can ping.
#[async_trait]
pub trait Ping: Send + Sync {
    async fn ping(&self) -> Result<(), repository::Error>;
}

#[async_trait]
impl Ping for DatabaseConnection {
    async fn ping(&self) -> Result<(), repository::Error> {
        DatabaseConnection::ping(self).await
    }
}

/// Reports whether the shared resources behind the service are reachable.
pub struct HealthController {
    database: Box<dyn Ping>,
    pools: Vec<OutboundPool>,
    logger: Logger,
}

impl HealthController {
    pub fn new(ctx: &Context) -> Self {
        Self::with_database(
            ctx.database().clone(),
            ctx.outbound_pools().cloned().collect(),
            ctx.logger().scoped("health"),
        )
    }

    pub fn with_database<D: Ping + 'static>(
        database: D,
        pools: Vec<OutboundPool>,
        logger: Logger,
    ) -> Self {
        Self {
            database: Box::new(database),
            pools,
            logger,
        }
    }

    pub async fn check(&self) -> Response {
        let database = self
            .database
            .ping()
            .instrument(self.logger.span().clone())
            .await
            .is_ok();

        let mut outbound = Map::new();
        let mut degraded = false;

        for pool in &self.pools {
            let up = pool.probe().instrument(self.logger.span().clone()).await;
            degraded |= !up;

            outbound.insert(
                pool.name().to_string(),
                json!({
                    "status": if up { "up" } else { "down" },
                    "available": pool.available(),
                    "capacity": pool.capacity(),
                }),
            );
        }

        let (status_code, status) = match (database, degraded) {
            (false, _) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
            (true, true) => (StatusCode::OK, "degraded"),
            (true, false) => (StatusCode::OK, "ok"),
        };

        if status != "ok" {
            tracing::warn!(parent: self.logger.span(), "Health check reported {}", status);
        }

        (
            status_code,
            Json(json!({
                "status": status,
                "database": if database { "up" } else { "down" },
                "outbound": Value::Object(outbound),
            })),
        )
            .into_response()
    }
}

pub fn endpoint_conf(ctx: &Context) -> Vec<Endpoint> {
    let controller = Arc::new(HealthController::new(ctx));

    vec![Endpoint {
        name: "Health",
        method: Method::Get,
        pattern: "/health",
        handler: on(Method::Get.into(), move || async move {
            controller.check().await
        }),
    }]
}
