//! JSON-RPC client for the node's market API.

use std::collections::BTreeMap;
use std::time::Duration;

use log::debug;
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::NODE_API_VERSION;
use crate::error_handling::{InitializationError, RpcError};
use crate::initialization::init_client;
use crate::models::MarketDeal;

use super::api_info::ApiInfo;

const STATE_MARKET_DEALS: &str = "Filecoin.StateMarketDeals";

/// Longest response body quoted back in a [`RpcError::Fetch`].
const MAX_ERROR_BODY: usize = 512;

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// Talks to a single node over HTTP JSON-RPC.
#[derive(Debug, Clone)]
pub struct NodeClient {
    http: reqwest::Client,
    endpoint: String,
    auth: Option<String>,
}

impl NodeClient {
    pub fn new(api_info: &ApiInfo, timeout: Duration) -> Result<Self, InitializationError> {
        Ok(NodeClient {
            http: init_client(timeout)?,
            endpoint: api_info.dial_url(NODE_API_VERSION),
            auth: api_info.auth_header(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Every deal the market actor tracks at the chain head, keyed by deal id.
    pub async fn state_market_deals(&self) -> Result<BTreeMap<String, MarketDeal>, RpcError> {
        // params: [tipset key]; empty selects the heaviest tipset
        self.call(STATE_MARKET_DEALS, json!([[]])).await
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1,
        });
        debug!("Calling {method} on {}", self.endpoint);

        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(auth) = &self.auth {
            request = request.header(AUTHORIZATION, auth);
        }

        let response = request.send().await.map_err(|source| RpcError::Connect {
            url: self.endpoint.clone(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            truncate_at_char_boundary(&mut body, MAX_ERROR_BODY);
            return Err(RpcError::Fetch {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|source| RpcError::Connect {
            url: self.endpoint.clone(),
            source,
        })?;
        debug!("{method} returned {} bytes", bytes.len());

        let decoded: RpcResponse<T> =
            serde_json::from_slice(&bytes).map_err(|e| RpcError::Decode(e.to_string()))?;

        match decoded {
            RpcResponse {
                error: Some(err), ..
            } => Err(RpcError::Rpc {
                code: err.code,
                message: err.message,
            }),
            RpcResponse {
                result: Some(result),
                ..
            } => Ok(result),
            RpcResponse { .. } => Err(RpcError::Decode(format!(
                "{method} response carries neither result nor error"
            ))),
        }
    }
}

fn truncate_at_char_boundary(s: &mut String, max: usize) {
    if s.len() <= max {
        return;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.truncate(end);
}
