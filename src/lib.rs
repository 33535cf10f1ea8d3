pub mod config;
pub mod http_cache;
pub mod http_client;
pub mod logging;
pub mod medal;
pub mod medals_fetch;
pub mod provider;
pub mod query_store;
pub mod ranking;
pub mod sort_state;
pub mod state;
