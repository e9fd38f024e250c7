pub mod aggregation;
pub mod filter;
pub mod lifecycle;
pub mod session;
pub mod store;
