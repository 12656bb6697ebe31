//! Client-side controller for pairwise "beauty score" matches.
//!
//! The backend owns every match and every status transition. This crate reads
//! snapshots, decides which screen and controls a viewer gets, and forwards
//! the viewer's accept, decline and compare requests.

pub mod api;
pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod view;

pub use api::{HttpMatchApi, MatchApi};
pub use cache::MatchCache;
pub use config::{load_settings_from, ClientSettings};
pub use controller::{MatchAction, MatchController};
pub use error::{CacheError, MatchActionError, MatchActionKind};
pub use events::{ClientEvent, Notification, NotificationLevel};
pub use lifecycle::{classify_outcome, format_score, MatchPhase, Outcome, Role, Scores};
pub use view::{Affordances, MatchView, ResultView, Tone};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
