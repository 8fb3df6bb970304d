use axum::routing::{MethodFilter, MethodRouter};
use axum::Router;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl From<Method> for MethodFilter {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => MethodFilter::GET,
            Method::Post => MethodFilter::POST,
            Method::Put => MethodFilter::PUT,
            Method::Patch => MethodFilter::PATCH,
            Method::Delete => MethodFilter::DELETE,
        }
    }
}

/// One mountable route. The handler is already bound to its controller.
pub struct Endpoint {
    pub name: &'static str,
    pub method: Method,
    pub pattern: &'static str,
    pub handler: MethodRouter,
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

/// Mounts endpoints onto a router. Endpoints sharing a pattern are merged by
/// method.
pub fn mount(endpoints: Vec<Endpoint>) -> Router {
    endpoints.into_iter().fold(Router::new(), |router, endpoint| {
        tracing::debug!(
            "Mounting {} as {:?} {}",
            endpoint.name,
            endpoint.method,
            endpoint.pattern
        );
        router.route(endpoint.pattern, endpoint.handler)
    })
}
