//! Content-addressed URIs

use reqwest::Url;
use std::fmt;
use std::str::FromStr;

use crate::error::MetadataError;
use crate::IPFS_SCHEME;

/// An `ipfs://<cid>[/path]` pointer
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContentUri {
    cid: String,
    path: Option<String>,
}

impl ContentUri {
    /// Parse a URI, rejecting anything that is not an IPFS content address
    pub fn parse(uri: &str) -> Result<Self, MetadataError> {
        let rest = uri
            .trim()
            .strip_prefix(IPFS_SCHEME)
            .ok_or_else(|| MetadataError::InvalidUri(uri.to_string()))?;

        let (cid, path) = match rest.split_once('/') {
            Some((cid, path)) if !path.is_empty() => (cid, Some(path.to_string())),
            Some((cid, _)) => (cid, None),
            None => (rest, None),
        };

        if cid.is_empty() || !cid.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(MetadataError::InvalidUri(uri.to_string()));
        }
        // Paths must stay below the CID
        if path
            .as_deref()
            .map_or(false, |p| p.split(['/', '\\']).any(is_dot_segment))
        {
            return Err(MetadataError::InvalidUri(uri.to_string()));
        }

        Ok(Self {
            cid: cid.to_string(),
            path,
        })
    }

    /// Content identifier
    pub fn cid(&self) -> &str {
        &self.cid
    }

    /// Path below the root CID, if any
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// URI for a freshly pinned CID
    pub fn from_cid(cid: impl Into<String>) -> Self {
        Self {
            cid: cid.into(),
            path: None,
        }
    }

    /// Resolve against a gateway base such as `https://host/ipfs/`
    pub fn gateway_url(&self, gateway: &Url) -> Result<Url, MetadataError> {
        let relative = match &self.path {
            Some(path) => format!("{}/{}", self.cid, path),
            None => self.cid.clone(),
        };
        gateway
            .join(&relative)
            .map_err(|e| MetadataError::InvalidUri(format!("{}: {}", self, e)))
    }
}

/// `.` or `..`, including their percent-encoded spellings
fn is_dot_segment(segment: &str) -> bool {
    let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}

impl fmt::Display for ContentUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", IPFS_SCHEME, self.cid)?;
        if let Some(path) = &self.path {
            write!(f, "/{}", path)?;
        }
        Ok(())
    }
}

impl FromStr for ContentUri {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Normalize a gateway base so that `join` appends instead of replacing
pub fn normalize_gateway(raw: &str) -> Result<Url, MetadataError> {
    let mut url = Url::parse(raw)
        .map_err(|e| MetadataError::Configuration(format!("invalid gateway url {}: {}", raw, e)))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
