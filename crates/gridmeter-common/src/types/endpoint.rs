//! Endpoint identity exchanged during topology bootstrap

use serde::{Deserialize, Serialize};
use std::fmt;

/// Network identity of a Server, Sensor, or Authority.
///
/// Exchanged during topology bootstrap; the wire shape matches the observed
/// bootstrap payloads (`schema`/`ipv4`/`port`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    /// URL schema, e.g. `http`
    pub schema: String,
    /// Host address
    #[serde(rename = "ipv4")]
    pub address: String,
    /// TCP port
    pub port: u16,
}

impl Endpoint {
    pub fn new(schema: impl Into<String>, address: impl Into<String>, port: u16) -> Self {
        Self {
            schema: schema.into(),
            address: address.into(),
            port,
        }
    }

    /// Base URL for this endpoint
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.schema, self.address, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url() {
        let ep = Endpoint::new("http", "127.0.0.1", 8081);
        assert_eq!(ep.base_url(), "http://127.0.0.1:8081");
    }

    #[test]
    fn test_wire_field_names() {
        let ep = Endpoint::new("http", "192.168.100.6", 8080);
        let json = serde_json::to_value(&ep).unwrap();
        assert_eq!(json["ipv4"], "192.168.100.6");
        assert_eq!(json["schema"], "http");
    }
}
