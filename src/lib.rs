pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod erc20;
pub mod eth;
pub mod mempool;
pub mod models;
pub mod price;
pub mod refresh;
pub mod units;
