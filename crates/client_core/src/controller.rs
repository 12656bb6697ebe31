use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use shared::{
    domain::{MatchId, MatchStatus, Viewer},
    protocol::{CompareResponse, Match, PhotoUpload, RespondRequest},
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::{debug, info, warn};

use crate::{
    api::{ApiResult, MatchApi},
    cache::MatchCache,
    error::{MatchActionError, MatchActionKind},
    events::{ClientEvent, Notification},
    lifecycle::{format_score, MatchPhase},
    view::{Affordances, MatchView},
};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Everything a front end can ask of one match screen.
#[derive(Debug, Clone)]
pub enum MatchAction {
    Refresh,
    SelectPhoto(PhotoUpload),
    ClearPhoto,
    Accept,
    Decline,
    Compare,
}

/// Clears its flag on drop, so an error path cannot leave a control disabled.
struct InFlight<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool, kind: MatchActionKind) -> ApiResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self { flag })
            .map_err(|_| MatchActionError::Busy(kind))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Drives the screen for one match as seen by one viewer. Reads snapshots
/// through the shared cache and forwards transition requests to the backend;
/// it never changes the match status itself.
pub struct MatchController {
    api: Arc<dyn MatchApi>,
    cache: Arc<MatchCache>,
    match_id: MatchId,
    viewer: Viewer,
    selected_photo: Mutex<Option<PhotoUpload>>,
    respond_in_flight: AtomicBool,
    compare_in_flight: AtomicBool,
    events: broadcast::Sender<ClientEvent>,
}

impl MatchController {
    pub fn new(
        api: Arc<dyn MatchApi>,
        cache: Arc<MatchCache>,
        match_id: MatchId,
        viewer: Viewer,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            api,
            cache,
            match_id,
            viewer,
            selected_photo: Mutex::new(None),
            respond_in_flight: AtomicBool::new(false),
            compare_in_flight: AtomicBool::new(false),
            events,
        })
    }

    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    pub fn viewer(&self) -> Viewer {
        self.viewer
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub fn is_respond_in_flight(&self) -> bool {
        self.respond_in_flight.load(Ordering::Acquire)
    }

    pub fn is_compare_in_flight(&self) -> bool {
        self.compare_in_flight.load(Ordering::Acquire)
    }

    fn emit(&self, event: ClientEvent) {
        let _ = self.events.send(event);
    }

    /// Cached snapshot, fetched on a miss.
    pub async fn snapshot(&self) -> ApiResult<Match> {
        self.cache
            .get_or_fetch(self.api.as_ref(), self.match_id)
            .await
    }

    /// Refetches unconditionally. A regressed snapshot is refused and the
    /// cached one stays.
    pub async fn refresh(&self) -> ApiResult<Match> {
        let previous = self.cache.get(self.match_id).await;
        let snapshot = self.api.fetch_match(self.match_id).await?;
        self.cache.store(snapshot.clone()).await?;
        if previous.as_ref() != Some(&snapshot) {
            debug!(match_id = self.match_id.0, status = %snapshot.status, "match snapshot changed");
            self.emit(ClientEvent::SnapshotUpdated(snapshot.clone()));
        }
        Ok(snapshot)
    }

    async fn invalidate(&self) {
        self.cache.invalidate(self.match_id).await;
        self.emit(ClientEvent::SnapshotInvalidated(self.match_id));
    }

    pub async fn phase(&self) -> ApiResult<MatchPhase> {
        let snapshot = self.snapshot().await?;
        Ok(MatchPhase::from_snapshot(&snapshot, self.viewer.id))
    }

    pub async fn view(&self) -> ApiResult<MatchView> {
        Ok(MatchView::for_phase(&self.phase().await?))
    }

    pub async fn affordances(&self) -> ApiResult<Affordances> {
        let phase = self.phase().await?;
        Ok(Affordances::compute(
            &phase,
            self.has_photo().await,
            self.is_respond_in_flight(),
            self.is_compare_in_flight(),
        ))
    }

    pub async fn select_photo(&self, photo: PhotoUpload) {
        *self.selected_photo.lock().await = Some(photo);
    }

    pub async fn clear_photo(&self) {
        *self.selected_photo.lock().await = None;
    }

    pub async fn has_photo(&self) -> bool {
        self.selected_photo.lock().await.is_some()
    }

    /// Accepting needs a selected photo and fails locally without one.
    /// Declining never sends the photo.
    pub async fn respond(&self, accept: bool) -> ApiResult<()> {
        let _in_flight = InFlight::acquire(&self.respond_in_flight, MatchActionKind::Respond)?;

        let request = if accept {
            let photo = self
                .selected_photo
                .lock()
                .await
                .clone()
                .ok_or(MatchActionError::NoFileSelected)?;
            RespondRequest::accept(photo)
        } else {
            RespondRequest::decline()
        };

        let phase = self.phase().await?;
        if !phase.respond_allowed() {
            return Err(MatchActionError::NotPermitted {
                action: MatchActionKind::Respond,
                status: phase.status(),
            });
        }

        info!(match_id = self.match_id.0, accept, "sending match response");
        self.api.respond(self.match_id, request).await?;
        self.clear_photo().await;
        self.invalidate().await;
        Ok(())
    }

    pub async fn compare(&self) -> ApiResult<CompareResponse> {
        let _in_flight = InFlight::acquire(&self.compare_in_flight, MatchActionKind::Compare)?;

        let phase = self.phase().await?;
        if !phase.compare_allowed() {
            return Err(MatchActionError::NotPermitted {
                action: MatchActionKind::Compare,
                status: phase.status(),
            });
        }

        info!(match_id = self.match_id.0, "requesting comparison");
        let scores = self.api.compare(self.match_id).await?;
        self.invalidate().await;
        Ok(scores)
    }

    /// Runs an action and reports the result as a notification. Nothing
    /// escapes: failures leave the cached snapshot as it was.
    pub async fn handle(&self, action: MatchAction) {
        let notification = match action {
            MatchAction::Refresh => match self.refresh().await {
                Ok(_) => None,
                Err(err) => Some(self.failure("Could not load match", err)),
            },
            MatchAction::SelectPhoto(photo) => {
                self.select_photo(photo).await;
                None
            }
            MatchAction::ClearPhoto => {
                self.clear_photo().await;
                None
            }
            MatchAction::Accept => Some(self.respond_notification(true).await),
            MatchAction::Decline => Some(self.respond_notification(false).await),
            MatchAction::Compare => match self.compare().await {
                Ok(scores) => Some(Notification::success(
                    "Comparison complete",
                    format!(
                        "Creator: {} | Invited: {}",
                        format_score(Some(scores.creator_score)),
                        format_score(Some(scores.invited_score))
                    ),
                )),
                Err(err) => Some(self.failure("Comparison failed", err)),
            },
        };

        let succeeded = notification.as_ref().is_some_and(|n| !n.is_error());
        if let Some(notification) = notification {
            self.emit(ClientEvent::Notification(notification));
        }
        if succeeded {
            if let Err(err) = self.refresh().await {
                let notification = self.failure("Could not load match", err);
                self.emit(ClientEvent::Notification(notification));
            }
        }
    }

    async fn respond_notification(&self, accept: bool) -> Notification {
        match self.respond(accept).await {
            Ok(()) if accept => Notification::success("Response sent", "You accepted the challenge."),
            Ok(()) => Notification::success("Response sent", "You declined the challenge."),
            Err(err) => self.failure("Could not send response", err),
        }
    }

    fn failure(&self, title: &str, err: MatchActionError) -> Notification {
        warn!(match_id = self.match_id.0, local = err.is_local(), "{title}: {err}");
        Notification::error(title, err.to_string())
    }

    /// Refetches on a fixed cadence until the match completes or the
    /// controller is dropped. Poll failures are logged and retried on the
    /// next tick.
    pub fn spawn_poller(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(controller) = weak.upgrade() else {
                    break;
                };
                match controller.refresh().await {
                    Ok(snapshot) if snapshot.status == MatchStatus::Completed => {
                        info!(match_id = snapshot.id.0, "match completed, polling stopped");
                        break;
                    }
                    Ok(_) => {}
                    Err(err) => {
                        warn!(match_id = controller.match_id.0, "match poll failed: {err}");
                    }
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
