//! Data access port.
//!
//! Implementations hand the domain a complete, already-materialized series.
//! Network or disk access, retries and caching all live behind this trait.

use crate::domain::error::VotecastError;
use crate::domain::series::PriceSeries;

pub trait DataPort: Send + Sync {
    /// Full daily history for `symbol`, ascending by date.
    fn fetch_series(&self, symbol: &str) -> Result<PriceSeries, VotecastError>;

    /// Symbols this source can serve, sorted.
    fn list_symbols(&self) -> Result<Vec<String>, VotecastError>;
}
