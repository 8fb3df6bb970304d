//! Storage-independent listing capability.
//!
//! Every resource kind exposes the same paginated `list` operation through
//! [`Repository`]. Backends only implement [`Repository::fetch_page`], which
//! receives an already validated [`PageRequest`], so bad pagination input is
//! rejected before any storage is touched.

mod memory;
mod postgres;

pub use memory::MemoryRepository;
pub use postgres::{PgEntity, PgRepository};

use crate::utils::pagination::{Page, PageRequest};
use async_trait::async_trait;
use serde::Serialize;
use std::cmp::Ordering;

/// The only error kinds allowed across the repository boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Bad pagination parameters. The caller's fault; retrying won't help.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Storage could not be reached or timed out. Safe to retry.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Unavailable(err.to_string())
    }
}

/// A record type that can be listed.
pub trait Entity: Serialize + Clone + Send + Sync + 'static {
    /// Fields a listing may be ordered by. Only indexed fields belong here.
    const SORTABLE_FIELDS: &'static [&'static str];
    const DEFAULT_ORDER_BY: &'static str;

    fn id(&self) -> &str;

    /// Compares two records on one of [`Entity::SORTABLE_FIELDS`].
    fn compare_by(&self, other: &Self, field: &str) -> Ordering;
}

#[async_trait]
pub trait Repository: Send + Sync + 'static {
    type Record: Entity;

    /// Fetches one page. Implementations return at most `request.limit()`
    /// records and wrap backend failures into [`Error::Unavailable`].
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<Self::Record>, Error>;

    async fn list(
        &self,
        limit: i64,
        offset: i64,
        orderby: &str,
        sort: &str,
    ) -> Result<Page<Self::Record>, Error> {
        let request = PageRequest::new(
            limit,
            offset,
            orderby,
            sort,
            Self::Record::SORTABLE_FIELDS,
        )?;

        self.fetch_page(&request).await
    }
}
