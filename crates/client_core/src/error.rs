use shared::{
    domain::{MatchId, MatchStatus},
    error::ApiError,
};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchActionKind {
    Respond,
    Compare,
}

impl MatchActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchActionKind::Respond => "respond",
            MatchActionKind::Compare => "compare",
        }
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("match {id} went from {cached} back to {received}")]
    StatusRegressed {
        id: MatchId,
        cached: MatchStatus,
        received: MatchStatus,
    },
}

#[derive(Debug, Error)]
pub enum MatchActionError {
    #[error("no file selected")]
    NoFileSelected,
    #[error("photo cannot be attached: {0}")]
    InvalidPhoto(String),
    #[error("{} is not available while the match is {status}", .action.as_str())]
    NotPermitted {
        action: MatchActionKind,
        status: MatchStatus,
    },
    #[error("a {} request is already in flight", .0.as_str())]
    Busy(MatchActionKind),
    #[error("{}", .0.display_message())]
    Rejected(ApiError),
    #[error("network request failed: {0}")]
    Network(#[source] reqwest::Error),
    #[error("unexpected response from server: {0}")]
    Decode(String),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl MatchActionError {
    /// True for failures raised before any request was sent.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            MatchActionError::NoFileSelected
                | MatchActionError::InvalidPhoto(_)
                | MatchActionError::NotPermitted { .. }
                | MatchActionError::Busy(_)
        )
    }
}
