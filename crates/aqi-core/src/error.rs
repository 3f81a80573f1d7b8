//! Failure taxonomy for a single AQI lookup

/// Why no record could be selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NotFoundReason {
    /// Upstream returned zero records
    #[error("No records found for the specified location.")]
    NoRecords,
    /// Records came back, none with a usable reading and timestamp
    #[error("Data was found, but all recent records had 'NA' values.")]
    AllInvalid,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AqiError {
    #[error("{0}")]
    NotFound(NotFoundReason),

    #[error("Error from external API: {body}")]
    UpstreamStatus { status: u16, body: String },

    /// `detail` is for logs only; the message never carries it
    #[error("Error connecting to the external AQI data provider.")]
    UpstreamUnreachable { detail: String },
}

impl AqiError {
    /// Short label used for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            AqiError::NotFound(NotFoundReason::NoRecords) => "no_records",
            AqiError::NotFound(NotFoundReason::AllInvalid) => "all_invalid",
            AqiError::UpstreamStatus { .. } => "upstream_status",
            AqiError::UpstreamUnreachable { .. } => "upstream_unreachable",
        }
    }

    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            AqiError::UpstreamStatus { .. } | AqiError::UpstreamUnreachable { .. }
        )
    }
}
