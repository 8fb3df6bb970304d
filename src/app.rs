use crate::{
    modules,
    router::{self, Endpoint},
    types::{Config, Context, StartupFailure, ToContext},
};
use axum::{
    http::{header, Method},
    Router,
};
use std::{future::Future, sync::Arc};
use tokio::net::TcpListener;
use tower_http::{cors, trace};

pub struct App {
    ctx: Arc<Context>,
    router: Router,
}

impl App {
    /// Initializes every shared resource, then wires the endpoints. Nothing is
    /// registered when a resource fails to come up.
    pub async fn new(config: Config) -> Result<Self, StartupFailure> {
        let ctx: Arc<Context> = Arc::new(config.to_context().await?);
        let endpoints = modules::endpoint_conf(&ctx);

        Ok(Self::with_endpoints(ctx, endpoints))
    }

    pub fn with_endpoints(ctx: Arc<Context>, endpoints: Vec<Endpoint>) -> Self {
        let router = router::mount(endpoints)
            .layer(trace::TraceLayer::new_for_http())
            .layer(
                cors::CorsLayer::new()
                    .allow_methods([
                        Method::OPTIONS,
                        Method::GET,
                        Method::POST,
                        Method::PUT,
                        Method::PATCH,
                        Method::DELETE,
                    ])
                    .allow_headers([header::CONTENT_TYPE])
                    .expose_headers([crate::controller::CONTINUATION_TOKEN_HEADER])
                    .allow_origin(cors::Any),
            );

        Self { ctx, router }
    }

    pub fn context(&self) -> &Arc<Context> {
        &self.ctx
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub async fn serve(self) -> Result<(), StartupFailure> {
        let address = format!("{}:{}", self.ctx.app.host, self.ctx.app.port);
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|err| StartupFailure::Listener {
                address: address.clone(),
                reason: err.to_string(),
            })?;

        self.serve_with(listener, shutdown_signal()).await;
        Ok(())
    }

    /// Serves on `listener` until `shutdown` resolves, then tears the shared
    /// resources down.
    pub async fn serve_with<F>(self, listener: TcpListener, shutdown: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let span = self.ctx.logger().span().clone();

        if let Ok(addr) = listener.local_addr() {
            tracing::info!(parent: &span, "App is running on {}", addr);
        }

        if let Err(err) = axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
        {
            tracing::error!(parent: &span, "Server error: {}", err);
        }

        self.ctx.shutdown().await;
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
