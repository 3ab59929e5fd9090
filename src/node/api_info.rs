//! Node API info parsing.
//!
//! Lotus advertises its endpoint as `<token>:<multiaddr>`, for example
//! `eyJhbGci...:/ip4/127.0.0.1/tcp/1234/http`. A plain URL is accepted in
//! place of the multiaddr, and the token is optional.

use url::Url;

use crate::error_handling::RpcError;

/// Where the node lives and how to authenticate to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiInfo {
    base: Url,
    token: Option<String>,
}

impl ApiInfo {
    pub fn parse(info: &str) -> Result<Self, RpcError> {
        let info = info.trim();
        let invalid = || RpcError::InvalidApiInfo(redact(info));

        let (token, addr) = if is_address(info) {
            (None, info)
        } else {
            match info.split_once(':') {
                Some((token, addr)) if !token.is_empty() && is_address(addr) => {
                    (Some(token.to_string()), addr)
                }
                _ => return Err(invalid()),
            }
        };

        let base = if addr.starts_with('/') {
            multiaddr_to_url(addr).ok_or_else(invalid)?
        } else {
            http_url(addr).ok_or_else(invalid)?
        };

        Ok(ApiInfo { base, token })
    }

    /// JSON-RPC endpoint for API `version`, e.g. `http://host:1234/rpc/v1`.
    pub fn dial_url(&self, version: &str) -> String {
        format!(
            "{}/rpc/{version}",
            self.base.as_str().trim_end_matches('/')
        )
    }

    /// Value for the `Authorization` header, if a token was given.
    pub fn auth_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {t}"))
    }
}

fn is_address(s: &str) -> bool {
    s.starts_with('/')
        || ["http://", "https://", "ws://", "wss://"]
            .iter()
            .any(|scheme| s.starts_with(scheme))
}

/// `ws`/`wss` endpoints serve the same RPC over plain HTTP POST.
fn http_url(addr: &str) -> Option<Url> {
    let mut url = Url::parse(addr).ok()?;
    let scheme = match url.scheme() {
        "http" | "ws" => "http",
        "https" | "wss" => "https",
        _ => return None,
    };
    url.set_scheme(scheme).ok()?;
    url.host_str()?;
    Some(url)
}

/// Converts `/<ip4|ip6|dns|dns4|dns6>/<host>/tcp/<port>[/<http|https|ws|wss>]`.
fn multiaddr_to_url(addr: &str) -> Option<Url> {
    let parts: Vec<&str> = addr.trim_start_matches('/').split('/').collect();
    let (proto, host, transport, port, rest) = match parts.as_slice() {
        [proto, host, transport, port, rest @ ..] => (*proto, *host, *transport, *port, rest),
        _ => return None,
    };
    if transport != "tcp" {
        return None;
    }
    let port: u16 = port.parse().ok()?;

    let host = match proto {
        "ip4" | "dns" | "dns4" | "dns6" => host.to_string(),
        "ip6" => format!("[{host}]"),
        _ => return None,
    };

    let scheme = match rest {
        [] | ["http"] | ["ws"] => "http",
        ["https"] | ["wss"] | ["tls", "http"] | ["tls", "ws"] => "https",
        _ => return None,
    };

    Url::parse(&format!("{scheme}://{host}:{port}")).ok()
}

/// Keeps tokens out of error messages and logs.
fn redact(info: &str) -> String {
    match info.split_once(':') {
        Some((token, addr)) if !is_address(info) && !token.is_empty() => format!("<token>:{addr}"),
        _ => info.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_and_multiaddr() {
        let info = ApiInfo::parse("abc.def.ghi:/ip4/127.0.0.1/tcp/1234/http").unwrap();
        assert_eq!(info.dial_url("v1"), "http://127.0.0.1:1234/rpc/v1");
        assert_eq!(info.auth_header().as_deref(), Some("Bearer abc.def.ghi"));
    }

    #[test]
    fn test_multiaddr_without_token() {
        let info = ApiInfo::parse("/dns/lotus.example.com/tcp/443/https").unwrap();
        assert_eq!(info.dial_url("v1"), "https://lotus.example.com/rpc/v1");
        assert_eq!(info.auth_header(), None);

        let info = ApiInfo::parse("/ip4/10.0.0.5/tcp/1234").unwrap();
        assert_eq!(info.dial_url("v0"), "http://10.0.0.5:1234/rpc/v0");
    }

    #[test]
    fn test_ip6_multiaddr() {
        let info = ApiInfo::parse("/ip6/::1/tcp/1234/ws").unwrap();
        assert_eq!(info.dial_url("v1"), "http://[::1]:1234/rpc/v1");
    }

    #[test]
    fn test_url_forms() {
        let info = ApiInfo::parse("tok:ws://127.0.0.1:1234").unwrap();
        assert_eq!(info.dial_url("v1"), "http://127.0.0.1:1234/rpc/v1");
        assert_eq!(info.auth_header().as_deref(), Some("Bearer tok"));

        let info = ApiInfo::parse("https://api.node.glif.io").unwrap();
        assert_eq!(info.dial_url("v1"), "https://api.node.glif.io/rpc/v1");
    }

    #[test]
    fn test_invalid_info() {
        for bad in ["", "token-only", "tok:", "/ip4/127.0.0.1/udp/1234", "/ip4/1.2.3.4/tcp/notaport", "ftp://x"] {
            assert!(
                matches!(ApiInfo::parse(bad), Err(RpcError::InvalidApiInfo(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_errors_do_not_leak_token() {
        let err = ApiInfo::parse("secret-token:/ip4/1.2.3.4/udp/1").unwrap_err();
        assert!(!err.to_string().contains("secret-token"));
    }
}
