use async_trait::async_trait;

use crate::{CoreError, MarketSnapshot};

/// Source of current price data for one asset class.
///
/// `Ok(None)` means the provider answered but does not know the symbol.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch_quote(&self, symbol: &str) -> Result<Option<MarketSnapshot>, CoreError>;

    fn name(&self) -> &str;
}
