use std::fmt;

use crate::lifecycle::{format_score, MatchPhase, Outcome, Role, Scores};

pub const TIE_MESSAGE: &str = "It's a tie!";
pub const WIN_MESSAGE: &str = "You won!";
pub const LOSS_MESSAGE: &str = "Your friend won!";
pub const UNAVAILABLE_MESSAGE: &str = "Result unavailable";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Neutral,
    Positive,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultView {
    /// `None` when the backend completed the match without both scores.
    pub outcome: Option<Outcome>,
    pub tone: Tone,
    pub message: &'static str,
    pub my_score: String,
    pub their_score: String,
}

impl ResultView {
    fn new(role: Role, scores: &Scores) -> Self {
        let outcome = scores.outcome(role);
        let (tone, message) = match outcome {
            Some(Outcome::Tie) => (Tone::Neutral, TIE_MESSAGE),
            Some(Outcome::Win) => (Tone::Positive, WIN_MESSAGE),
            Some(Outcome::Loss) => (Tone::Negative, LOSS_MESSAGE),
            None => (Tone::Neutral, UNAVAILABLE_MESSAGE),
        };
        Self {
            outcome,
            tone,
            message,
            my_score: format_score(scores.mine(role)),
            their_score: format_score(scores.theirs(role)),
        }
    }
}

/// The one screen shown for a `(status, role)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchView {
    /// Pending, invited: pick a photo, then accept or decline.
    AwaitingResponse,
    /// Pending, creator.
    WaitingForResponse,
    /// Ready, creator.
    ReadyToCompare,
    /// Ready, invited.
    WaitingForCreator,
    Result(ResultView),
}

impl MatchView {
    pub fn for_phase(phase: &MatchPhase) -> Self {
        match phase {
            MatchPhase::Pending {
                role: Role::Invited,
            } => MatchView::AwaitingResponse,
            MatchPhase::Pending {
                role: Role::Creator,
            } => MatchView::WaitingForResponse,
            MatchPhase::Ready {
                role: Role::Creator,
            } => MatchView::ReadyToCompare,
            MatchPhase::Ready {
                role: Role::Invited,
            } => MatchView::WaitingForCreator,
            MatchPhase::Completed { role, scores } => {
                MatchView::Result(ResultView::new(*role, scores))
            }
        }
    }
}

impl fmt::Display for MatchView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchView::AwaitingResponse => write!(
                f,
                "Your friend challenged you. Upload a photo to accept, or decline."
            ),
            MatchView::WaitingForResponse => {
                write!(f, "Waiting for your friend to respond...")
            }
            MatchView::ReadyToCompare => {
                write!(f, "Both photos are in. Run the comparison when ready.")
            }
            MatchView::WaitingForCreator => write!(
                f,
                "Processing... waiting for your friend to run the comparison."
            ),
            MatchView::Result(result) => write!(
                f,
                "{}\nYour score: {}\nTheir score: {}",
                result.message, result.my_score, result.their_score
            ),
        }
    }
}

/// Which controls are live. Computed from the phase plus local state the
/// backend never sees (selected photo, in-flight requests).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Affordances {
    pub photo_picker: bool,
    pub accept: bool,
    pub decline: bool,
    pub compare: bool,
}

impl Affordances {
    pub fn compute(
        phase: &MatchPhase,
        photo_selected: bool,
        respond_in_flight: bool,
        compare_in_flight: bool,
    ) -> Self {
        let can_respond = phase.respond_allowed() && !respond_in_flight;
        Self {
            photo_picker: can_respond,
            accept: can_respond && photo_selected,
            decline: can_respond,
            compare: phase.compare_allowed() && !compare_in_flight,
        }
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
