//! Binds a repository to the HTTP surface.
//!
//! A [`Controller`] owns one repository and serves its listing operation.
//! Routes are declared as a small [`Route`] table and turned into
//! [`Endpoint`]s by [`endpoints`].

use crate::{
    repository::{self, Entity, Repository},
    router::{Endpoint, Method},
    utils::{
        logging::Logger,
        pagination::{Page, PageRequest, Pagination},
    },
};
use axum::{
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::on,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::Instrument;

pub const CONTINUATION_TOKEN_HEADER: HeaderName = HeaderName::from_static("x-continuation-token");

/// How a listing is written back to the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseShape {
    /// `{"items": [...], "meta": {...}}` with the token inside `meta`.
    Paginated,
    /// A bare array of records; the token travels in
    /// [`CONTINUATION_TOKEN_HEADER`].
    Records,
}

impl ResponseShape {
    fn render<T: Entity>(self, request: &PageRequest, page: Page<T>) -> Response {
        match self {
            ResponseShape::Paginated => {
                let count = page.records.len();

                (
                    StatusCode::OK,
                    Json(json!({
                        "items": page.records,
                        "meta": {
                            "limit": request.limit(),
                            "offset": request.offset(),
                            "orderby": request.orderby(),
                            "sort": request.sort(),
                            "count": count,
                            "continuation_token": page.continuation_token,
                        }
                    })),
                )
                    .into_response()
            }
            ResponseShape::Records => {
                let mut response = (StatusCode::OK, Json(&page.records)).into_response();

                if !page.is_last() {
                    if let Ok(value) = HeaderValue::from_str(&page.continuation_token) {
                        response
                            .headers_mut()
                            .insert(CONTINUATION_TOKEN_HEADER, value);
                    }
                }

                response
            }
        }
    }
}

/// Repository errors as seen by an HTTP client.
#[derive(Debug)]
pub struct ApiError(pub repository::Error);

impl From<repository::Error> for ApiError {
    fn from(err: repository::Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            repository::Error::InvalidArgument(message) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "invalid_argument", "message": message })),
            )
                .into_response(),
            repository::Error::Unavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                [(header::RETRY_AFTER, "1")],
                Json(json!({
                    "error": "unavailable",
                    "message": "Storage is temporarily unavailable, retry later"
                })),
            )
                .into_response(),
        }
    }
}

pub struct Controller<R> {
    repo: R,
    logger: Logger,
}

impl<R: Repository> Controller<R> {
    pub fn new(repo: R, logger: Logger) -> Self {
        Self { repo, logger }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub async fn list(
        &self,
        pagination: Pagination,
        shape: ResponseShape,
    ) -> Result<Response, ApiError> {
        let request = pagination
            .into_request(R::Record::SORTABLE_FIELDS, R::Record::DEFAULT_ORDER_BY)
            .map_err(|err| {
                tracing::debug!(parent: self.logger.span(), "Rejected listing: {}", err);
                err
            })?;

        let page = self
            .repo
            .fetch_page(&request)
            .instrument(self.logger.span().clone())
            .await
            .map_err(|err| {
                tracing::error!(parent: self.logger.span(), "Failed to list records: {}", err);
                err
            })?;

        Ok(shape.render(&request, page))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    List(ResponseShape),
}

/// A declarative route table entry.
#[derive(Clone, Copy, Debug)]
pub struct Route {
    pub name: &'static str,
    pub method: Method,
    pub pattern: &'static str,
    pub operation: Operation,
}

/// Binds every route in `routes` to `controller`.
pub fn endpoints<R: Repository>(
    controller: Arc<Controller<R>>,
    routes: &[Route],
) -> Vec<Endpoint> {
    routes
        .iter()
        .map(|route| {
            let handler = match route.operation {
                Operation::List(shape) => {
                    let controller = controller.clone();
                    on(route.method.into(), move |pagination: Pagination| async move {
                        controller.list(pagination, shape).await
                    })
                }
            };

            Endpoint {
                name: route.name,
                method: route.method,
                pattern: route.pattern,
                handler,
            }
        })
        .collect()
}
