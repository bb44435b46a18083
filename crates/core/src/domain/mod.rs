pub mod financials;
pub mod news;
pub mod notification;
pub mod recommendation;
pub mod symbol;
