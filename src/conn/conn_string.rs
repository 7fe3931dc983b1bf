use crate::error::Error;

pub const DEFAULT_PORT: &str = "8000";

/// What an empty input parses as.
pub const DEFAULT_URI: &str = "http://localhost:8000";

/// Parsed multi-host connection URI:
/// `scheme://host[:port][,host[:port]]*[/...]`.
///
/// The authority may carry a comma-separated host list, which general-purpose
/// URL parsers reject, so the split is done by hand. Hosts keep their
/// declared order; entries without a port get [`DEFAULT_PORT`]. Immutable
/// once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnString {
    uri: String,
    scheme: String,
    hosts: Vec<String>,
}

impl ConnString {
    pub fn parse(uri: &str) -> Result<Self, Error> {
        let uri = if uri.is_empty() { DEFAULT_URI } else { uri };

        let (scheme, rest) = uri
            .split_once("://")
            .ok_or_else(|| Error::InvalidUri(format!("missing scheme in {:?}", uri)))?;
        if scheme != "http" && scheme != "https" {
            return Err(Error::InvalidScheme(scheme.to_string()));
        }

        // Authority ends at the first path / query / fragment delimiter.
        let authority = rest.split(['/', '?', '#']).next().unwrap_or("");

        let hosts: Vec<String> = authority
            .split(',')
            .filter(|host| !host.is_empty())
            .map(|host| {
                if host.contains(':') {
                    host.to_string()
                } else {
                    format!("{}:{}", host, DEFAULT_PORT)
                }
            })
            .collect();

        if hosts.is_empty() {
            return Err(Error::EmptyHosts);
        }

        Ok(Self {
            uri: uri.to_string(),
            scheme: scheme.to_string(),
            hosts,
        })
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Hosts in declared order, each as `host:port`.
    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    pub fn base_url(&self, host: &str) -> String {
        format!("{}://{}", self.scheme, host)
    }
}
