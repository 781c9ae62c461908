pub mod yahoo;

use crate::domain::stock::MarketSnapshot;
use crate::domain::ticker::TickerSymbol;
use crate::error::DataFetchError;

#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Company summary, analyst recommendations and up to three recent headlines for `ticker`.
    async fn fetch(&self, ticker: &TickerSymbol) -> Result<MarketSnapshot, DataFetchError>;
}
