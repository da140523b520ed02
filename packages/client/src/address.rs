//! Server addresses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_SCHEME: &str = "http";
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 10101;

/// Location of a Pilosa server.
///
/// All three parts are optional in the textual form; omitted parts fall back
/// to `http`, `localhost` and `10101`. The following are equivalent:
///
/// - `http://localhost:10101`
/// - `http://localhost`
/// - `http://:10101`
/// - `localhost:10101`
/// - `localhost`
/// - `:10101`
///
/// Equality compares the raw scheme, so `http+tls://a:1` and `http://a:1`
/// are different addresses even though both normalize to `http://a:1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address {
    scheme: String,
    host: String,
    port: u16,
}

impl Address {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            port,
        }
    }

    /// Parse the compact `[[scheme://]host][:port]` form.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pilosa_client::Address;
    ///
    /// let address = Address::parse("http+tls://10.0.0.1:9999").unwrap();
    /// assert_eq!(address.port(), 9999);
    /// assert_eq!(address.normalize(), "http://10.0.0.1:9999");
    ///
    /// assert_eq!(Address::parse(":10101").unwrap(), Address::default());
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let mut address = Address::default();

        let rest = match text.find("://") {
            Some(index) => {
                let scheme = &text[..index];
                if scheme.is_empty() || !scheme.chars().all(is_scheme_char) {
                    return Err(parse_error(text, "scheme must be lowercase letters or '+'"));
                }
                address.scheme = scheme.to_string();
                &text[index + 3..]
            }
            None => text,
        };

        let (host, port) = match rest.find(':') {
            Some(index) => (&rest[..index], Some(&rest[index + 1..])),
            None => (rest, None),
        };

        if !host.chars().all(is_host_char) {
            return Err(parse_error(text, "invalid character in host"));
        }
        if !host.is_empty() {
            address.host = host.to_string();
        }

        if let Some(port) = port {
            if port.is_empty() || !port.chars().all(|c| c.is_ascii_digit()) {
                return Err(parse_error(text, "port must be numeric"));
            }
            address.port = port
                .parse()
                .map_err(|_| parse_error(text, "port out of range"))?;
        }

        Ok(address)
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Render as a URL base, dropping any `+suffix` from the scheme.
    pub fn normalize(&self) -> String {
        let scheme = match self.scheme.find('+') {
            Some(index) => &self.scheme[..index],
            None => &self.scheme,
        };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }
}

fn is_scheme_char(c: char) -> bool {
    c.is_ascii_lowercase() || c == '+'
}

fn is_host_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-'
}

fn parse_error(text: &str, message: &str) -> Error {
    Error::AddressParse {
        address: text.to_string(),
        message: message.to_string(),
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEME, DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Address::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Address::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}
