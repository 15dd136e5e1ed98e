pub mod fitbit;
use async_trait::async_trait;

use crate::error::CollectError;
use crate::metric::Metric;

#[async_trait]
pub trait Collector {
    /// Returns one metric per day for the `days_back` days before yesterday, plus
    /// yesterday itself. Today is never included since it is still in progress.
    async fn collect(&self, metric_name: &str, days_back: u32) -> Result<Vec<Metric>, CollectError>;
}
