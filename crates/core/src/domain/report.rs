use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ticker::TickerSymbol;

/// Generated analysis. `text` is opaque markdown and is never validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub ticker: TickerSymbol,
    pub model: String,
    pub generated_at: DateTime<Utc>,
    pub text: String,
}
