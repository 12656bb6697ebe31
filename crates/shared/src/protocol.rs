use serde::{Deserialize, Serialize};

use crate::domain::{MatchId, MatchStatus, UserId};

/// Snapshot of a match as served by `GET /api/matches/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: MatchId,
    pub creator_id: UserId,
    pub invited_id: UserId,
    pub status: MatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invited_score: Option<f64>,
}

/// Body of a successful `POST /api/matches/{id}/compare`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareResponse {
    pub creator_score: f64,
    pub invited_score: f64,
}

/// Photo attached to an acceptance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    pub filename: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Fields of the multipart `POST /api/matches/{id}/respond` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RespondRequest {
    pub accept: bool,
    pub photo: Option<PhotoUpload>,
}

impl RespondRequest {
    pub fn accept(photo: PhotoUpload) -> Self {
        Self {
            accept: true,
            photo: Some(photo),
        }
    }

    pub fn decline() -> Self {
        Self {
            accept: false,
            photo: None,
        }
    }

    /// Wire value of the `accept` form field.
    pub fn accept_field(&self) -> &'static str {
        if self.accept {
            "true"
        } else {
            "false"
        }
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
