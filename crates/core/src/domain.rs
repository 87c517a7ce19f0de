//! Domain extraction for override lookups and cache keys.
//!
//! A rule's `domain` and a cache entry's key both come from
//! [`TargetUrl::parse`], so two URLs name the same site exactly when their
//! hostnames match. Scheme, port, path and query never take part in that
//! identity. The robots.txt location is built from scheme and hostname only,
//! so every port of a host is answered by the same file.

use url::{Host, Url};

use crate::Error;

/// A crawl target parsed from caller input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetUrl {
    url: Url,
    domain: String,
}

impl TargetUrl {
    /// Parse a URL that must carry an `http`/`https` scheme and a hostname.
    ///
    /// Normalization steps:
    /// 1. Trim leading/trailing whitespace
    /// 2. Lowercase the host
    /// 3. Remove fragment (#...)
    ///
    /// No scheme is assumed when one is missing; `example.com/page` is rejected.
    pub fn parse(input: &str) -> Result<Self, Error> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::Validation("empty URL".into()));
        }

        let mut url = Url::parse(trimmed)
            .map_err(|e| Error::Validation(format!("invalid URL '{trimmed}': {e}. Url should contain scheme and hostname")))?;

        match url.scheme() {
            "http" | "https" => {}
            scheme => return Err(Error::Validation(format!("unsupported scheme: {scheme}"))),
        }

        let domain = match url.host() {
            Some(Host::Domain(d)) => d.to_lowercase(),
            Some(Host::Ipv4(ip)) => ip.to_string(),
            Some(Host::Ipv6(ip)) => ip.to_string(),
            None => {
                return Err(Error::Validation(format!(
                    "invalid URL '{trimmed}'. Url should contain scheme and hostname"
                )));
            }
        };
        if domain.is_empty() {
            return Err(Error::Validation(format!("invalid URL '{trimmed}'. Url should contain scheme and hostname")));
        }

        url.set_fragment(None);

        Ok(Self { url, domain })
    }

    /// Lowercase hostname, the natural key of override rules.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// `scheme://host`, with port, path and query discarded.
    pub fn origin(&self) -> String {
        match self.url.host() {
            Some(Host::Ipv6(ip)) => format!("{}://[{ip}]", self.url.scheme()),
            _ => format!("{}://{}", self.url.scheme(), self.domain),
        }
    }

    /// Location of the site's robots.txt.
    pub fn robots_url(&self) -> String {
        format!("{}/robots.txt", self.origin())
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// Extract the lowercase hostname of `input`.
pub fn domain_of(input: &str) -> Result<String, Error> {
    TargetUrl::parse(input).map(|t| t.domain)
}
