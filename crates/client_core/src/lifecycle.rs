//! Role and phase derivation for a match snapshot.
//!
//! A snapshot plus the viewer collapse into one [`MatchPhase`], so states like
//! "ready and pending at once" cannot be represented.

use shared::{
    domain::{MatchStatus, UserId},
    protocol::Match,
};

/// Placeholder shown for a score the backend has not supplied.
pub const MISSING_SCORE: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Creator,
    Invited,
}

impl Role {
    /// Anyone who is not the creator is treated as the invited side.
    pub fn of(viewer: UserId, snapshot: &Match) -> Self {
        if viewer == snapshot.creator_id {
            Role::Creator
        } else {
            Role::Invited
        }
    }

    pub fn is_creator(self) -> bool {
        matches!(self, Role::Creator)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scores {
    pub creator: Option<f64>,
    pub invited: Option<f64>,
}

impl Scores {
    pub fn new(creator: Option<f64>, invited: Option<f64>) -> Self {
        Self { creator, invited }
    }

    pub fn mine(&self, role: Role) -> Option<f64> {
        match role {
            Role::Creator => self.creator,
            Role::Invited => self.invited,
        }
    }

    pub fn theirs(&self, role: Role) -> Option<f64> {
        match role {
            Role::Creator => self.invited,
            Role::Invited => self.creator,
        }
    }

    /// `None` when either score is absent.
    pub fn outcome(&self, role: Role) -> Option<Outcome> {
        Some(classify_outcome(self.creator?, self.invited?, role))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Tie,
    Win,
    Loss,
}

/// Classifies a finished match from the viewer's side. Compares raw scores,
/// so 7.82 and 7.84 are not a tie even though both display as "7.8".
pub fn classify_outcome(creator_score: f64, invited_score: f64, role: Role) -> Outcome {
    if creator_score == invited_score {
        return Outcome::Tie;
    }
    let (mine, theirs) = match role {
        Role::Creator => (creator_score, invited_score),
        Role::Invited => (invited_score, creator_score),
    };
    if mine > theirs {
        Outcome::Win
    } else {
        Outcome::Loss
    }
}

pub fn format_score(score: Option<f64>) -> String {
    match score {
        Some(value) => format!("{value:.1}"),
        None => MISSING_SCORE.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchPhase {
    Pending { role: Role },
    Ready { role: Role },
    Completed { role: Role, scores: Scores },
}

impl MatchPhase {
    pub fn from_snapshot(snapshot: &Match, viewer: UserId) -> Self {
        let role = Role::of(viewer, snapshot);
        match snapshot.status {
            MatchStatus::Pending => MatchPhase::Pending { role },
            MatchStatus::Ready => MatchPhase::Ready { role },
            MatchStatus::Completed => MatchPhase::Completed {
                role,
                scores: Scores::new(snapshot.creator_score, snapshot.invited_score),
            },
        }
    }

    pub fn role(&self) -> Role {
        match *self {
            MatchPhase::Pending { role }
            | MatchPhase::Ready { role }
            | MatchPhase::Completed { role, .. } => role,
        }
    }

    pub fn status(&self) -> MatchStatus {
        match self {
            MatchPhase::Pending { .. } => MatchStatus::Pending,
            MatchPhase::Ready { .. } => MatchStatus::Ready,
            MatchPhase::Completed { .. } => MatchStatus::Completed,
        }
    }

    pub fn is_creator(&self) -> bool {
        self.role().is_creator()
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, MatchPhase::Pending { .. })
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, MatchPhase::Ready { .. })
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, MatchPhase::Completed { .. })
    }

    /// Accept/decline belongs to the invited side while the match is pending.
    pub fn respond_allowed(&self) -> bool {
        matches!(
            self,
            MatchPhase::Pending {
                role: Role::Invited
            }
        )
    }

    pub fn compare_allowed(&self) -> bool {
        matches!(
            self,
            MatchPhase::Ready {
                role: Role::Creator
            }
        )
    }
}

#[cfg(test)]
#[path = "tests/lifecycle_tests.rs"]
mod tests;
