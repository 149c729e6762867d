use thiserror::Error;

/// Failure kinds a resolving engine may report.
///
/// The set is closed: engines with richer error spaces fold everything
/// they cannot classify into [`DomainError::Other`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("No result for query (NXDOMAIN)")]
    NoResult,

    #[error("Name exists but holds no data of the requested type")]
    NoData,

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("DNSSEC validation failed: {0}")]
    DnssecValidationFailed(String),

    #[error("Resolution failed: {0}")]
    Other(String),
}

impl DomainError {
    /// Short status label used in logs and events.
    pub fn status(&self) -> &'static str {
        match self {
            Self::NoResult | Self::NoData => "NXDOMAIN",
            Self::InvalidQuery(_) => "FORMERR",
            Self::DnssecValidationFailed(_) => "SERVFAIL_DNSSEC",
            Self::Other(_) => "SERVFAIL",
        }
    }
}
