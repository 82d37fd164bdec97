//! Upstream URL allow-list.
//!
//! The gateway only ever fetches CRLs from the certification authority it
//! fronts. Candidate URLs are matched against a closed, build-time set of
//! grammar rules; anything that matches none of them is rejected. The rule
//! set is data so it can be inspected and tested exhaustively, and there is
//! deliberately no way to extend it from configuration.

use crate::error::{Error, Result};
use crate::MAX_URI_LENGTH;
use url::Url;

/// Category of an accepted upstream URL.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UrlCategory {
    /// The root CA certificate / CRL published on the certificates host.
    RootCa,
    /// A PCK CRL served by the certification API.
    IntermediateCrl,
}

/// Result of classifying a candidate URL.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UriClass {
    RootCa,
    IntermediateCrl,
    Rejected,
}

impl From<UrlCategory> for UriClass {
    fn from(category: UrlCategory) -> Self {
        match category {
            UrlCategory::RootCa => Self::RootCa,
            UrlCategory::IntermediateCrl => Self::IntermediateCrl,
        }
    }
}

/// Host grammar for a single allow-list entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostPattern {
    /// Host equals the literal.
    Exact(&'static str),
    /// Zero or more `[A-Za-z0-9-]` characters glued directly onto the suffix
    /// (`certificates.…`, `sbx-certificates.…`).
    Glued(&'static str),
    /// Either the bare suffix, or one `[A-Za-z0-9-]+` label glued onto it with
    /// an optional dot (`api.…`, `sbx.api.…`).
    OptionalLabel(&'static str),
    /// Exactly one non-empty `[A-Za-z0-9-]+` label, a dot, then the suffix.
    Label(&'static str),
}

impl HostPattern {
    /// Check whether `host` satisfies this pattern.
    pub fn matches(&self, host: &str) -> bool {
        match *self {
            Self::Exact(literal) => host == literal,
            Self::Glued(suffix) => host.strip_suffix(suffix).is_some_and(is_label_fragment),
            Self::OptionalLabel(suffix) => host.strip_suffix(suffix).is_some_and(|prefix| {
                match prefix.strip_suffix('.') {
                    Some(label) => !label.is_empty() && is_label_fragment(label),
                    None => is_label_fragment(prefix),
                }
            }),
            Self::Label(suffix) => host
                .strip_suffix(suffix)
                .and_then(|prefix| prefix.strip_suffix('.'))
                .is_some_and(|label| !label.is_empty() && is_label_fragment(label)),
        }
    }
}

fn is_label_fragment(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

/// Path grammar for a single allow-list entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathPattern {
    /// Path starts with the literal.
    Prefix(&'static str),
    /// `{prefix}v<N>/{resource}` exactly, where `N` is a positive integer
    /// without leading zeros.
    Versioned {
        prefix: &'static str,
        resource: &'static str,
    },
}

impl PathPattern {
    /// Check whether `path` satisfies this pattern.
    pub fn matches(&self, path: &str) -> bool {
        match *self {
            Self::Prefix(prefix) => path.starts_with(prefix),
            Self::Versioned { prefix, resource } => path
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix('v'))
                .and_then(|rest| rest.split_once('/'))
                .is_some_and(|(digits, tail)| is_positive_integer(digits) && tail == resource),
        }
    }
}

fn is_positive_integer(s: &str) -> bool {
    !s.is_empty() && !s.starts_with('0') && s.bytes().all(|b| b.is_ascii_digit())
}

/// One entry of the allow-list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllowlistRule {
    pub category: UrlCategory,
    pub scheme: &'static str,
    pub hosts: &'static [HostPattern],
    pub path: PathPattern,
    /// Whether a non-empty query string is required.
    pub requires_query: bool,
}

impl AllowlistRule {
    /// Check a parsed URL against this rule.
    pub fn matches(&self, url: &Url) -> bool {
        if url.scheme() != self.scheme
            || !url.username().is_empty()
            || url.password().is_some()
            || url.port().is_some()
        {
            return false;
        }
        let Some(host) = url.host_str() else {
            return false;
        };
        if !self.hosts.iter().any(|pattern| pattern.matches(host)) {
            return false;
        }
        if !self.path.matches(url.path()) {
            return false;
        }
        !self.requires_query || url.query().is_some_and(|q| !q.is_empty())
    }
}

const ROOT_CA_HOSTS: &[HostPattern] = &[
    HostPattern::Glued("certificates.trustedservices.intel.com"),
    HostPattern::Exact("certprx.adsdcsp.com"),
];

const PCK_CRL_HOSTS: &[HostPattern] = &[
    HostPattern::OptionalLabel("api.trustedservices.intel.com"),
    HostPattern::Label("az.sgxprod.adsdcsp.com"),
    HostPattern::Label("az.sgxnp.adsdcsp.com"),
];

/// The fixed rule set, evaluated in order.
pub const DEFAULT_RULES: &[AllowlistRule] = &[
    AllowlistRule {
        category: UrlCategory::RootCa,
        scheme: "https",
        hosts: ROOT_CA_HOSTS,
        path: PathPattern::Prefix("/IntelSGXRootCA."),
        requires_query: false,
    },
    AllowlistRule {
        category: UrlCategory::IntermediateCrl,
        scheme: "https",
        hosts: PCK_CRL_HOSTS,
        path: PathPattern::Versioned {
            prefix: "/sgx/certification/",
            resource: "pckcrl",
        },
        requires_query: true,
    },
];

/// Default-deny matcher over [`DEFAULT_RULES`].
#[derive(Clone, Copy, Debug)]
pub struct UrlAllowlist {
    rules: &'static [AllowlistRule],
}

impl Default for UrlAllowlist {
    fn default() -> Self {
        Self {
            rules: DEFAULT_RULES,
        }
    }
}

impl UrlAllowlist {
    /// The rules this matcher evaluates.
    pub fn rules(&self) -> &'static [AllowlistRule] {
        self.rules
    }

    /// Classify a candidate URL. Pure; never fails.
    pub fn classify(&self, uri: &str) -> UriClass {
        let Ok(url) = Url::parse(uri) else {
            return UriClass::Rejected;
        };
        self.rules
            .iter()
            .find(|rule| rule.matches(&url))
            .map(|rule| rule.category.into())
            .unwrap_or(UriClass::Rejected)
    }

    /// Validate the raw `uri` request parameter.
    ///
    /// Presence and length are checked before the URL is classified.
    pub fn validate(&self, uri: Option<&str>) -> Result<UrlCategory> {
        let uri = uri.filter(|u| !u.is_empty()).ok_or(Error::MissingUri)?;
        if uri.len() > MAX_URI_LENGTH {
            return Err(Error::UriTooLong {
                len: uri.len(),
                max: MAX_URI_LENGTH,
            });
        }
        match self.classify(uri) {
            UriClass::RootCa => Ok(UrlCategory::RootCa),
            UriClass::IntermediateCrl => Ok(UrlCategory::IntermediateCrl),
            UriClass::Rejected => Err(Error::UriRejected(uri.to_string())),
        }
    }
}
