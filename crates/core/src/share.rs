//! Share URL generation and parsing
//!
//! Share format: quizroom://<host>:<port>/<ROOMCODE>
//!
//! Room codes are normalized to uppercase wherever they are read.

use std::str::FromStr;

use crate::error::{Error, Result};
use crate::registry::{ROOM_CODE_ALPHABET, ROOM_CODE_LEN};

const SCHEME: &str = "quizroom://";

/// Trim and uppercase a room code as typed or pasted by a player
pub fn normalize_room_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Whether `code` has the shape of a room code (after normalization)
pub fn is_valid_room_code(code: &str) -> bool {
    code.len() == ROOM_CODE_LEN && code.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b))
}

/// Parsed share link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareUrl {
    pub host: String,
    pub port: u16,
    pub room_code: String,
}

impl ShareUrl {
    /// Create a new share URL
    pub fn new(host: impl Into<String>, port: u16, room_code: &str) -> Self {
        Self {
            host: host.into(),
            port,
            room_code: normalize_room_code(room_code),
        }
    }

    /// Address to connect to, as `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Format as URL string
    pub fn to_url(&self) -> String {
        format!("{}{}:{}/{}", SCHEME, self.host, self.port, self.room_code)
    }

    /// Parse from URL string
    pub fn parse(s: &str) -> Result<Self> {
        let rest = s
            .trim()
            .strip_prefix(SCHEME)
            .ok_or_else(|| Error::Validation("Share URL must start with quizroom://".into()))?;

        let (host_port, code) = rest
            .split_once('/')
            .ok_or_else(|| Error::Validation("Share URL is missing the room code".into()))?;

        let (host, port) = host_port
            .rsplit_once(':')
            .ok_or_else(|| Error::Validation(format!("Bad address '{}'", host_port)))?;
        let port: u16 = port
            .parse()
            .map_err(|_| Error::Validation(format!("Bad port '{}'", port)))?;
        if host.is_empty() {
            return Err(Error::Validation("Share URL has no host".into()));
        }

        let room_code = normalize_room_code(code.trim_end_matches('/'));
        if !is_valid_room_code(&room_code) {
            return Err(Error::Validation(format!("Bad room code '{}'", code)));
        }

        Ok(Self {
            host: host.to_string(),
            port,
            room_code,
        })
    }
}

impl std::fmt::Display for ShareUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_url())
    }
}

impl FromStr for ShareUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Extract a room code from either a share URL or a bare code
pub fn room_code_from_input(input: &str) -> Result<String> {
    if input.trim().starts_with(SCHEME) {
        return Ok(ShareUrl::parse(input)?.room_code);
    }
    let code = normalize_room_code(input);
    if code.is_empty() {
        return Err(Error::Validation("Room code is required.".into()));
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_roundtrip() {
        let share = ShareUrl::new("192.168.1.100", 4000, "ab12c");
        assert_eq!(share.to_url(), "quizroom://192.168.1.100:4000/AB12C");
        assert_eq!(ShareUrl::parse(&share.to_url()).unwrap(), share);
    }

    #[test]
    fn test_parse_lowercase_code() {
        let share: ShareUrl = "quizroom://example.org:4000/xy7qz".parse().unwrap();
        assert_eq!(share.room_code, "XY7QZ");
        assert_eq!(share.address(), "example.org:4000");
    }

    #[test]
    fn test_parse_ipv6() {
        let share = ShareUrl::parse("quizroom://[::1]:4000/AB12C").unwrap();
        assert_eq!(share.host, "[::1]");
        assert_eq!(share.port, 4000);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(ShareUrl::parse("http://localhost:4000/AB12C").is_err());
        assert!(ShareUrl::parse("quizroom://localhost:4000").is_err());
        assert!(ShareUrl::parse("quizroom://localhost/AB12C").is_err());
        assert!(ShareUrl::parse("quizroom://localhost:4000/TOOLONG").is_err());
        assert!(ShareUrl::parse("quizroom://localhost:4000/AB-2C").is_err());
    }

    #[test]
    fn test_room_code_from_input() {
        assert_eq!(room_code_from_input("  ab12c ").unwrap(), "AB12C");
        assert_eq!(
            room_code_from_input("quizroom://h:1/ab12c").unwrap(),
            "AB12C"
        );
        assert!(room_code_from_input("   ").is_err());
    }
}
