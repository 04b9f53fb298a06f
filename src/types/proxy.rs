use std::{fmt::Display, str::FromStr};

/// A proxy URL to route the extractor requests through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proxy(String);

impl Proxy {
    /// Parse a comma-separated list of proxies, skipping blank entries
    pub fn parse_list(list: &str) -> Result<Vec<Proxy>, <Proxy as FromStr>::Err> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Proxy::from_str)
            .collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Proxy {
    type Err = Box<dyn std::error::Error + Sync + Send>;

    /// Accept either a bare `host:port` or a full URL.
    /// A bare address is given the `http://` scheme.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Box::from("Proxy address is empty"));
        }
        if s.chars().any(char::is_whitespace) {
            return Err(Box::from(format!("Proxy address '{s}' contains whitespaces")));
        }

        if s.contains("://") {
            Ok(Self(s.to_owned()))
        } else {
            Ok(Self(format!("http://{s}")))
        }
    }
}

impl Display for Proxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
