use super::{Entity, Error, Repository};
use crate::utils::pagination::{Page, PageRequest, SortOrder};
use async_trait::async_trait;
use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

/// In-memory listing backend. Used as a fixture: it counts the storage calls
/// it receives and can be told to stall or fail.
pub struct MemoryRepository<T> {
    records: Vec<T>,
    latency: Option<Duration>,
    failure: Option<Error>,
    calls: AtomicUsize,
    completed: AtomicUsize,
}

impl<T: Entity> MemoryRepository<T> {
    pub fn new(records: Vec<T>) -> Self {
        Self {
            records,
            latency: None,
            failure: None,
            calls: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        }
    }

    /// Delays every fetch, long enough for a caller to cancel it.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fails every fetch with `Unavailable`, as a lost database would.
    pub fn unavailable(mut self, reason: &str) -> Self {
        self.failure = Some(Error::Unavailable(reason.to_string()));
        self
    }

    /// Fetches that reached storage.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Fetches that ran to completion. `calls() - completed()` were abandoned
    /// midway by a cancelled caller.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    fn sorted(&self, request: &PageRequest) -> Vec<T> {
        let mut records = self.records.clone();

        records.sort_by(|a, b| {
            let ordering = a.compare_by(b, request.orderby());
            let ordering = match request.sort() {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            };
            ordering.then_with(|| a.id().cmp(b.id()))
        });

        records
    }
}

#[async_trait]
impl<T: Entity> Repository for MemoryRepository<T> {
    type Record = T;

    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<T>, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let result = match &self.failure {
            Some(err) => Err(err.clone()),
            None => {
                let rows = self
                    .sorted(request)
                    .into_iter()
                    .skip(usize::try_from(request.offset()).unwrap_or(usize::MAX))
                    .take(request.fetch_limit() as usize)
                    .collect();

                Ok(Page::from_overfetch(rows, request))
            }
        };

        self.completed.fetch_add(1, Ordering::SeqCst);
        result
    }
}
