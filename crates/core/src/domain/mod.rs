pub mod credential;
pub mod recommendation;
pub mod report;
pub mod search;
pub mod stock;
pub mod ticker;
