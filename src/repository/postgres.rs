use super::{Entity, Error, Repository};
use crate::utils::{
    database::DatabaseConnection,
    logging::Logger,
    pagination::{Page, PageRequest},
};
use async_trait::async_trait;
use sqlx::{postgres::PgRow, FromRow};
use std::marker::PhantomData;

/// An entity stored in its own PostgreSQL table whose sortable fields are
/// column names.
pub trait PgEntity: Entity + for<'r> FromRow<'r, PgRow> + Unpin {
    const TABLE: &'static str;
    const COLUMNS: &'static str;
}

pub struct PgRepository<T> {
    db_conn: DatabaseConnection,
    logger: Logger,
    _entity: PhantomData<fn() -> T>,
}

impl<T: PgEntity> PgRepository<T> {
    pub fn new(db_conn: DatabaseConnection, logger: Logger) -> Self {
        Self {
            db_conn,
            logger,
            _entity: PhantomData,
        }
    }

    fn select_page_sql(request: &PageRequest) -> String {
        // orderby comes from T::SORTABLE_FIELDS, never from the caller
        format!(
            "SELECT {} FROM {} ORDER BY {} {}, id ASC LIMIT $1 OFFSET $2",
            T::COLUMNS,
            T::TABLE,
            request.orderby(),
            request.sort().as_sql(),
        )
    }
}

#[async_trait]
impl<T: PgEntity> Repository for PgRepository<T> {
    type Record = T;

    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<T>, Error> {
        let sql = Self::select_page_sql(request);

        sqlx::query_as::<_, T>(&sql)
            .bind(request.fetch_limit() as i64)
            .bind(request.offset())
            .fetch_all(&self.db_conn.pool)
            .await
            .map(|rows| Page::from_overfetch(rows, request))
            .map_err(|err| {
                tracing::error!(
                    parent: self.logger.span(),
                    "Error occurred while listing {}: {}",
                    T::TABLE,
                    err
                );
                Error::from(err)
            })
    }
}
