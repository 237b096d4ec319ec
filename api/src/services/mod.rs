pub mod cache;
pub mod converter;
pub mod error;
pub mod gateway;
pub mod generation;
pub mod rate_limit;
