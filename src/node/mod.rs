//! Node access: API info parsing and the market-deals query.

mod api_info;
mod client;

pub use api_info::ApiInfo;
pub use client::NodeClient;
