use crate::{repository, types::StartupFailure, utils::config::OutboundPoolConfig};
use reqwest::{Client, Url};
use std::sync::Arc;
use tokio::sync::{Semaphore, TryAcquireError};

/// Name under which the point service pool is registered.
pub const POINT_SERVICE_POOL: &str = "point-service";

/// A bounded set of connections to one downstream service.
///
/// At most `capacity` requests are in flight at once. A caller that finds
/// every permit taken fails with `Unavailable` instead of queueing, and so
/// does every caller after the pool is closed.
#[derive(Clone, Debug)]
pub struct OutboundPool {
    name: Arc<str>,
    base_url: Url,
    client: Client,
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl OutboundPool {
    pub fn new(config: &OutboundPoolConfig) -> Result<Self, StartupFailure> {
        let failure = |reason: String| StartupFailure::OutboundPool {
            name: config.name.clone(),
            reason,
        };

        if config.max_connections == 0 {
            return Err(failure(String::from("max_connections must be positive")));
        }

        let mut base_url = Url::parse(&config.url).map_err(|err| failure(err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(failure(format!("`{}` cannot be used as a base url", config.url)));
        }

        // Url::join replaces the last segment unless the path ends with a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(config.max_connections)
            .build()
            .map_err(|err| failure(err.to_string()))?;

        Ok(Self {
            name: Arc::from(config.name.as_str()),
            base_url,
            client,
            permits: Arc::new(Semaphore::new(config.max_connections)),
            capacity: config.max_connections,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Issues `GET {base_url}/{path}` while holding one permit.
    pub async fn get(&self, path: &str) -> Result<reqwest::Response, repository::Error> {
        let _permit = self.permits.try_acquire().map_err(|err| match err {
            TryAcquireError::NoPermits => {
                tracing::warn!("Outbound pool `{}` is saturated", self.name);
                repository::Error::Unavailable(format!("outbound pool `{}` is saturated", self.name))
            }
            TryAcquireError::Closed => {
                repository::Error::Unavailable(format!("outbound pool `{}` is closed", self.name))
            }
        })?;

        let url = self.base_url.join(path).map_err(|err| {
            repository::Error::InvalidArgument(format!("invalid path `{}`: {}", path, err))
        })?;

        self.client.get(url).send().await.map_err(|err| {
            tracing::warn!("Request to `{}` failed: {}", self.name, err);
            repository::Error::Unavailable(err.to_string())
        })
    }

    /// True when the downstream service answers its health route with a
    /// success status.
    pub async fn probe(&self) -> bool {
        match self.get("health").await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    pub fn close(&self) {
        self.permits.close();
    }
}
