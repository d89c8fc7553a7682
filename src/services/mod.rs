use std::time::Duration;

pub mod enrichment;
pub mod filter;
pub mod geo;
pub mod providers;
pub mod recommendations;
pub mod sampler;
pub mod search;
pub mod travel;

pub use recommendations::{Recommender, RunSettings};

/// Sleeps between external calls to stay under provider rate limits
pub(crate) async fn pace(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
