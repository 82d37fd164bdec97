//! Collateral freshness preference.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which TCB recovery stream the caller wants collateral from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UpdateType {
    #[default]
    Standard,
    Early,
}

impl UpdateType {
    /// Resolve the optional `update` request parameter.
    ///
    /// A missing or empty parameter means [`UpdateType::Standard`]. Matching is
    /// case-insensitive.
    pub fn resolve(raw: Option<&str>) -> Result<Self> {
        match raw {
            None | Some("") => Ok(Self::Standard),
            Some(value) => value.parse(),
        }
    }

    /// Canonical upper-case name, as stored in the cache.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "STANDARD",
            Self::Early => "EARLY",
        }
    }

    /// Value of the `update` query parameter sent to the PCS.
    pub fn as_query_value(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Early => "early",
        }
    }
}

impl FromStr for UpdateType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "STANDARD" => Ok(Self::Standard),
            "EARLY" => Ok(Self::Early),
            _ => Err(Error::InvalidUpdateType(s.to_string())),
        }
    }
}

impl fmt::Display for UpdateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
