use std::fmt;

/// Logical identity a bearer key resolves to
///
/// Only used to bucket usage. Requests without a usable key carry one of
/// the sentinel aliases.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Alias(String);

impl Alias {
    /// No bearer credential was presented
    pub const UNKNOWN: &'static str = "unknown";
    /// A credential was presented but matched no configured key
    pub const DEFAULT: &'static str = "default";

    pub fn new(alias: impl Into<String>) -> Self {
        Self(alias.into())
    }

    pub fn unknown() -> Self {
        Self(Self::UNKNOWN.to_owned())
    }

    pub fn unresolved() -> Self {
        Self(Self::DEFAULT.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Request-scoped data inserted by the server middleware
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Value of `X-Request-ID`, generated when the client sent none
    pub request_id: String,
    pub alias: Alias,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>, alias: Alias) -> Self {
        Self {
            request_id: request_id.into(),
            alias,
        }
    }
}
