use crate::cache::TtlCache;
use crate::models::LoadOutcome;
use crate::source::ContactSource;
use crate::storage::load_contact_messages;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn ContactSource>,
    pub table: Arc<str>,
    pub cache: Arc<TtlCache<LoadOutcome>>,
}

impl AppState {
    pub fn new(source: Arc<dyn ContactSource>, table: impl Into<Arc<str>>, cache_ttl: Duration) -> Self {
        Self {
            source,
            table: table.into(),
            cache: Arc::new(TtlCache::new(cache_ttl)),
        }
    }

    /// Contact messages from the cache, fetched from the source on expiry.
    pub async fn contact_messages(&self) -> Arc<LoadOutcome> {
        self.cache
            .get_or_refresh(Instant::now(), || {
                load_contact_messages(self.source.as_ref(), &self.table)
            })
            .await
    }

    pub fn refresh_every(&self) -> Duration {
        self.cache.ttl()
    }
}
