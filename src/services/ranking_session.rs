//! Live ranking session.
//!
//! Wraps a [`RankingReconciler`] with the I/O it needs: the initial
//! concurrent fetch, a background task that fires the auto-save timer, and
//! spawned save requests. Closing the session cancels the timer; a save
//! already in flight is allowed to finish.

use crate::config::ClientConfig;
use crate::error::AppError;
use crate::models::{Application, ApplicationId, Rating};
use crate::services::api_client::ApiClient;
use crate::services::debounce::{Clock, TokioClock};
use crate::services::ranking_reconciler::{
    RankingList, RankingReconciler, RankingView, SaveRequest,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, Notify};
use tokio::time;
use tokio_util::sync::{CancellationToken, DropGuard};

/// The endpoints a ranking session talks to.
pub trait RankingApi: Send + Sync + 'static {
    fn fetch_ranking(&self) -> impl Future<Output = Result<Vec<Application>, AppError>> + Send;

    fn fetch_ratings(&self) -> impl Future<Output = Result<Vec<Rating>, AppError>> + Send;

    fn fetch_applications(
        &self,
    ) -> impl Future<Output = Result<Vec<Application>, AppError>> + Send;

    /// Persist the ranking; resolves to the list the server stored.
    fn save_ranking(
        &self,
        application_ids: Vec<ApplicationId>,
    ) -> impl Future<Output = Result<Vec<Application>, AppError>> + Send;
}

impl RankingApi for ApiClient {
    async fn fetch_ranking(&self) -> Result<Vec<Application>, AppError> {
        Ok(self.get_ranking().await?.applications)
    }

    async fn fetch_ratings(&self) -> Result<Vec<Rating>, AppError> {
        self.rated_applications().await
    }

    async fn fetch_applications(&self) -> Result<Vec<Application>, AppError> {
        self.list_applications().await
    }

    async fn save_ranking(
        &self,
        application_ids: Vec<ApplicationId>,
    ) -> Result<Vec<Application>, AppError> {
        Ok(self.update_ranking(application_ids).await?.applications)
    }
}

fn now() -> Instant {
    TokioClock.now()
}

/// Handle to an open ranking page. Cheap to clone.
///
/// Dropping the last handle stops the auto-save driver, like [`close`](Self::close).
pub struct RankingSession<A: RankingApi> {
    api: Arc<A>,
    state: Arc<Mutex<RankingReconciler>>,
    wake: Arc<Notify>,
    cancel: CancellationToken,
    _stop_on_drop: Arc<DropGuard>,
}

impl<A: RankingApi> Clone for RankingSession<A> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            state: self.state.clone(),
            wake: self.wake.clone(),
            cancel: self.cancel.clone(),
            _stop_on_drop: self._stop_on_drop.clone(),
        }
    }
}

/// What the background task needs. It holds no handle, so it never keeps
/// the session alive.
struct Driver<A: RankingApi> {
    api: Arc<A>,
    state: Arc<Mutex<RankingReconciler>>,
    wake: Arc<Notify>,
    cancel: CancellationToken,
}

impl<A: RankingApi> Driver<A> {
    async fn run(self) {
        log::debug!("[ranking] Auto-save driver started");
        loop {
            let deadline = self.state.lock().await.next_deadline();
            let timer = async {
                match deadline {
                    Some(at) => time::sleep_until(time::Instant::from_std(at)).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = self.wake.notified() => {}
                _ = timer => {}
            }

            let request = self.state.lock().await.poll(now());
            if let Some(request) = request {
                spawn_save(&self.api, &self.state, &self.wake, request);
            }
        }
        self.state.lock().await.teardown();
        log::debug!("[ranking] Auto-save driver stopped");
    }
}

/// Run a save in its own task so closing the session never aborts it.
fn spawn_save<A: RankingApi>(
    api: &Arc<A>,
    state: &Arc<Mutex<RankingReconciler>>,
    wake: &Arc<Notify>,
    request: SaveRequest,
) {
    let api = api.clone();
    let state = state.clone();
    let wake = wake.clone();
    tokio::spawn(async move {
        let result = api.save_ranking(request.application_ids).await;
        state.lock().await.complete_save(request.seq, result, now());
        wake.notify_one();
    });
}

impl<A: RankingApi> RankingSession<A> {
    /// Fetch ranking, ratings and applications concurrently, reconcile, and
    /// start the auto-save driver.
    ///
    /// Fails as a whole if any of the three fetches fails.
    pub async fn open(api: Arc<A>, config: &ClientConfig) -> Result<Self, AppError> {
        let (ranking, ratings, applications) = futures::try_join!(
            api.fetch_ranking(),
            api.fetch_ratings(),
            api.fetch_applications()
        )?;

        let mut reconciler =
            RankingReconciler::new(config.ranking_autosave_delay(), config.notice_duration());
        reconciler.load(ranking, ratings, applications, now());

        let state = Arc::new(Mutex::new(reconciler));
        let wake = Arc::new(Notify::new());
        let cancel = CancellationToken::new();

        let driver = Driver {
            api: api.clone(),
            state: state.clone(),
            wake: wake.clone(),
            cancel: cancel.clone(),
        };
        tokio::spawn(driver.run());

        Ok(Self {
            api,
            state,
            wake,
            _stop_on_drop: Arc::new(cancel.clone().drop_guard()),
            cancel,
        })
    }

    async fn edit<F>(&self, op: F) -> bool
    where
        F: FnOnce(&mut RankingReconciler, Instant) -> bool,
    {
        let changed = op(&mut *self.state.lock().await, now());
        if changed {
            self.wake.notify_one();
        }
        changed
    }

    pub async fn view(&self) -> RankingView {
        self.state.lock().await.view(now())
    }

    pub async fn has_unsaved_changes(&self) -> bool {
        self.state.lock().await.has_unsaved_changes()
    }

    pub async fn reorder(&self, from: usize, to: usize) -> bool {
        self.edit(|r, now| r.reorder_within_ranked(from, to, now))
            .await
    }

    pub async fn add_to_ranking(&self, id: ApplicationId, dest: usize) -> bool {
        self.edit(|r, now| r.move_from_available_to_ranked(id, dest, now))
            .await
    }

    pub async fn remove_from_ranking(&self, id: ApplicationId) -> bool {
        self.edit(|r, now| r.remove_from_ranked(id, now)).await
    }

    pub async fn move_between_lists(
        &self,
        source: RankingList,
        dest: RankingList,
        id: ApplicationId,
        dest_index: usize,
    ) -> bool {
        self.edit(|r, now| r.move_between_lists(source, dest, id, dest_index, now))
            .await
    }

    /// Manual save. Returns false when there is nothing to save or a save is
    /// already in flight.
    pub async fn save_now(&self) -> bool {
        let request = self.state.lock().await.begin_manual_save(now());
        match request {
            Some(request) => {
                spawn_save(&self.api, &self.state, &self.wake, request);
                true
            }
            None => false,
        }
    }

    /// Refetch the patron's ratings and drop newly excluded applications.
    pub async fn refresh_ratings(&self) -> Result<Vec<ApplicationId>, AppError> {
        let ratings = self.api.fetch_ratings().await?;
        let removed = self.state.lock().await.update_ratings(ratings, now());
        self.wake.notify_one();
        Ok(removed)
    }

    /// Feed a rating the patron just saved elsewhere.
    pub async fn apply_rating(&self, rating: Rating) -> Vec<ApplicationId> {
        let removed = self.state.lock().await.apply_rating(rating, now());
        self.wake.notify_one();
        removed
    }

    /// Stop the auto-save driver and drop any pending timer.
    ///
    /// Returns true when a save is still in flight; it completes on its own.
    pub async fn close(&self) -> bool {
        self.cancel.cancel();
        self.state.lock().await.teardown()
    }
}
