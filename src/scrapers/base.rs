use crate::errors::Result;
use crate::models::price::DailyBar;
use crate::models::symbol::SymbolRecord;
use async_trait::async_trait;

/// Base trait for symbol catalog sources
#[async_trait]
pub trait CatalogSource {
    /// Get the name of this catalog source
    fn source_name(&self) -> &'static str;

    /// Fetch the full symbol catalog, preserving source order
    async fn fetch_catalog(&self) -> Result<Vec<SymbolRecord>>;
}

/// Base trait for historical price sources
#[async_trait]
pub trait PriceSource {
    /// Get the name of this price source
    fn source_name(&self) -> &'static str;

    /// Fetch historical daily bars for a symbol over the given period
    /// Returns an empty vector when the source has no data for the symbol
    async fn fetch_history(&self, symbol: &str, period: &str) -> Result<Vec<DailyBar>>;
}
