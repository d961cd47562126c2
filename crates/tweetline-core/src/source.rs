//! Search source abstraction consumed by workers

use std::future::Future;

use chrono::NaiveDate;

use crate::record::RawItem;

/// One paginated search request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchQuery {
    pub term: String,
    /// Only items created before this date
    pub until: NaiveDate,
    pub batch_size: u32,
    /// Inclusive upper bound on item identity; `None` asks for the newest page
    pub max_id: Option<u64>,
}

/// A paginated search service.
///
/// Batches are expected in descending identity order. An empty batch means the
/// query window is exhausted.
pub trait SearchSource: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    fn search(
        &self,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<Vec<RawItem>, Self::Error>> + Send;
}
