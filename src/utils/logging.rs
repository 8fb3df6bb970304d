use crate::utils::config::LogFormat;
use tracing::Span;
use tracing_subscriber::prelude::*;

pub fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// The service logger handed out by the container. Cloning is cheap and every
/// clone records under the same service span.
#[derive(Clone, Debug)]
pub struct Logger {
    span: Span,
}

impl Logger {
    pub fn new(service: &str) -> Self {
        Self {
            span: tracing::info_span!("service", name = %service),
        }
    }

    /// A child logger for one component of the service.
    pub fn scoped(&self, component: &'static str) -> Self {
        Self {
            span: tracing::info_span!(parent: &self.span, "component", name = component),
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}
