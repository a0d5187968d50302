//! Dotted-quad public IP value
//!
//! Detection services are trusted for shape only: an address is accepted when
//! it is four groups of one to three ASCII digits separated by dots. Octets
//! above 255 are not rejected.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::sync::LazyLock;

static DOTTED_QUAD_EXACT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}$").unwrap()
});

static DOTTED_QUAD_SEARCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\b").unwrap()
});

/// A public IPv4 address in dotted-quad text form
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PublicIp(String);

impl PublicIp {
    /// Parse an exact dotted-quad (surrounding whitespace is ignored)
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        DOTTED_QUAD_EXACT
            .is_match(text)
            .then(|| Self(text.to_string()))
    }

    /// Find the first dotted-quad substring in free text
    pub fn find_in(text: &str) -> Option<Self> {
        DOTTED_QUAD_SEARCH
            .find(text)
            .map(|m| Self(m.as_str().to_string()))
    }

    /// The address text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Strict conversion, `None` when an octet is out of range
    pub fn to_ipv4(&self) -> Option<Ipv4Addr> {
        self.0.parse().ok()
    }
}

impl fmt::Display for PublicIp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Ipv4Addr> for PublicIp {
    fn from(ip: Ipv4Addr) -> Self {
        Self(ip.to_string())
    }
}

impl From<PublicIp> for String {
    fn from(ip: PublicIp) -> Self {
        ip.0
    }
}

impl TryFrom<String> for PublicIp {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("not a dotted-quad address: {}", value))
    }
}

impl std::str::FromStr for PublicIp {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
            .ok_or_else(|| crate::Error::invalid_input(format!("not a dotted-quad address: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exact() {
        assert_eq!(
            PublicIp::parse("203.0.113.5").map(|ip| ip.to_string()),
            Some("203.0.113.5".to_string())
        );
        assert_eq!(
            PublicIp::parse(" 198.51.100.7\n").map(|ip| ip.to_string()),
            Some("198.51.100.7".to_string())
        );
        assert!(PublicIp::parse("203.0.113").is_none());
        assert!(PublicIp::parse("ip 203.0.113.5").is_none());
        assert!(PublicIp::parse("2001:db8::1").is_none());
        assert!(PublicIp::parse("1234.0.0.1").is_none());
    }

    #[test]
    fn test_out_of_range_octets_are_accepted() {
        let ip = PublicIp::parse("999.1.2.3").unwrap();
        assert_eq!(ip.as_str(), "999.1.2.3");
        assert!(ip.to_ipv4().is_none());
    }

    #[test]
    fn test_find_in_plain_text() {
        let ip = PublicIp::find_in("your ip is 198.51.100.7\n").unwrap();
        assert_eq!(ip.as_str(), "198.51.100.7");
    }

    #[test]
    fn test_find_takes_first_match() {
        let ip = PublicIp::find_in("client=10.0.0.1 server=192.0.2.1").unwrap();
        assert_eq!(ip.as_str(), "10.0.0.1");
    }

    #[test]
    fn test_find_respects_word_boundaries() {
        assert!(PublicIp::find_in("1234.5.6.7").is_none());
        assert!(PublicIp::find_in("no address here").is_none());
    }

    #[test]
    fn test_serde_round_trip_rejects_garbage() {
        let ip: PublicIp = serde_json::from_str("\"203.0.113.5\"").unwrap();
        assert_eq!(ip.as_str(), "203.0.113.5");
        assert!(serde_json::from_str::<PublicIp>("\"not-an-ip\"").is_err());
    }
}
