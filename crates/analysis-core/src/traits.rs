use crate::{AnalysisError, PriceBar, QuoteSnapshot};
use async_trait::async_trait;

/// External market-data source returning current quotes and price history.
///
/// Fetching happens strictly before the valuation core runs; the core itself
/// never performs I/O.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn quote(&self, ticker: &str) -> Result<QuoteSnapshot, AnalysisError>;
    async fn history(&self, ticker: &str, days: u32) -> Result<Vec<PriceBar>, AnalysisError>;
}
