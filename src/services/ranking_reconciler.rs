//! Ranking reconciliation state machine.
//!
//! Holds the patron's locally edited ranking, the last list the server
//! confirmed, and the rating state used to derive the available pool.
//! Every transition takes `now` explicitly; the reconciler never sleeps
//! and never performs I/O. Saves are handed out as [`SaveRequest`]s and
//! their outcome is fed back through [`RankingReconciler::complete_save`].

use crate::error::AppError;
use crate::models::ranking::is_scholarship_position;
use crate::models::{Application, ApplicationId, Rating, Sentiment};
use crate::services::debounce::Debouncer;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// Observable state of the ranking view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingStatus {
    /// Initial fetch has not completed.
    Loading,
    /// Local ranking equals the last saved ranking.
    Ready,
    /// Local ranking has unsaved changes.
    Dirty,
    /// An update request is in flight.
    Saving,
}

/// The two drag-and-drop lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingList {
    Ranked,
    Available,
}

/// A save the caller must send to `PUT /patron/ranking`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub seq: u64,
    pub application_ids: Vec<ApplicationId>,
}

/// One row of the ranked column.
#[derive(Debug, Clone, Serialize)]
pub struct RankedEntry {
    pub position: usize,
    pub scholarship: bool,
    pub application: Application,
}

/// One row of the available column.
#[derive(Debug, Clone, Serialize)]
pub struct AvailableEntry {
    pub sentiment: Sentiment,
    pub application: Application,
}

/// Everything a UI needs to draw the ranking page.
#[derive(Debug, Clone, Serialize)]
pub struct RankingView {
    pub status: RankingStatus,
    pub ranked: Vec<RankedEntry>,
    pub available: Vec<AvailableEntry>,
    pub has_unsaved_changes: bool,
    pub can_save: bool,
    pub notice_visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Order-sensitive comparison of two ID lists.
pub fn same_order(a: &[ApplicationId], b: &[ApplicationId]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x == y)
}

#[derive(Debug, Clone)]
struct InFlight {
    seq: u64,
}

#[derive(Debug, Clone)]
pub struct RankingReconciler {
    loaded: bool,
    ranked: Vec<Application>,
    last_saved: Vec<ApplicationId>,
    applications: HashMap<ApplicationId, Application>,
    ratings: Vec<Rating>,
    sentiments: HashMap<ApplicationId, Sentiment>,
    debounce: Debouncer,
    notice_duration: Duration,
    notice_until: Option<Instant>,
    in_flight: Option<InFlight>,
    next_seq: u64,
    edited_during_save: bool,
    save_queued: bool,
    last_error: Option<String>,
    last_saved_at: Option<Instant>,
}

impl RankingReconciler {
    pub fn new(autosave_delay: Duration, notice_duration: Duration) -> Self {
        Self {
            loaded: false,
            ranked: Vec::new(),
            last_saved: Vec::new(),
            applications: HashMap::new(),
            ratings: Vec::new(),
            sentiments: HashMap::new(),
            debounce: Debouncer::new(autosave_delay),
            notice_duration,
            notice_until: None,
            in_flight: None,
            next_seq: 0,
            edited_during_save: false,
            save_queued: false,
            last_error: None,
            last_saved_at: None,
        }
    }

    // ---- loading ----

    /// Install the initial server state and reconcile it.
    ///
    /// Returns the applications dropped from the ranking because of their rating.
    pub fn load(
        &mut self,
        ranking: Vec<Application>,
        ratings: Vec<Rating>,
        applications: Vec<Application>,
        now: Instant,
    ) -> Vec<ApplicationId> {
        self.applications = applications.into_iter().map(|a| (a.id, a)).collect();
        for app in &ranking {
            self.applications
                .entry(app.id)
                .or_insert_with(|| app.clone());
        }
        self.last_saved = ranking.iter().map(|a| a.id).collect();
        self.ranked = ranking;
        self.loaded = true;
        self.set_ratings(ratings);
        log::info!(
            "[ranking] Loaded {} ranked, {} rated applications",
            self.ranked.len(),
            self.ratings.len()
        );
        self.reconcile(now)
    }

    /// Replace the rating state (e.g. after a refetch) and reconcile.
    pub fn update_ratings(&mut self, ratings: Vec<Rating>, now: Instant) -> Vec<ApplicationId> {
        self.set_ratings(ratings);
        self.reconcile(now)
    }

    /// Apply one changed rating and reconcile.
    pub fn apply_rating(&mut self, rating: Rating, now: Instant) -> Vec<ApplicationId> {
        match self
            .ratings
            .iter_mut()
            .find(|r| r.application_id == rating.application_id)
        {
            Some(existing) => *existing = rating.clone(),
            None => self.ratings.push(rating.clone()),
        }
        self.sentiments.insert(rating.application_id, rating.rate);
        self.reconcile(now)
    }

    /// Add or refresh known applications without touching the ranking.
    pub fn update_applications(&mut self, applications: Vec<Application>) {
        for app in applications {
            self.applications.insert(app.id, app);
        }
    }

    fn set_ratings(&mut self, ratings: Vec<Rating>) {
        self.sentiments = ratings.iter().map(|r| (r.application_id, r.rate)).collect();
        self.ratings = ratings;
    }

    // ---- reconciliation ----

    /// Drop ranked applications whose rating is negative or unrated.
    ///
    /// Shows the notice and arms the auto-save so the cleaned list is persisted.
    pub fn reconcile(&mut self, now: Instant) -> Vec<ApplicationId> {
        if !self.loaded {
            return Vec::new();
        }

        let removed: Vec<ApplicationId> = self
            .ranked
            .iter()
            .filter(|a| self.is_excluded(a.id))
            .map(|a| a.id)
            .collect();

        if !removed.is_empty() {
            let excluded: HashSet<ApplicationId> = removed.iter().copied().collect();
            self.ranked.retain(|a| !excluded.contains(&a.id));
            self.notice_until = Some(now + self.notice_duration);
            self.mark_edited(now);
            log::info!(
                "[ranking] Removed {} application(s) rated negative or unrated: {:?}",
                removed.len(),
                removed
            );
        }

        removed
    }

    fn is_excluded(&self, id: ApplicationId) -> bool {
        self.sentiments
            .get(&id)
            .is_some_and(|s| s.excludes_from_ranking())
    }

    // ---- drag and drop ----

    /// Move one ranked entry; all other entries keep their relative order.
    pub fn reorder_within_ranked(&mut self, from: usize, to: usize, now: Instant) -> bool {
        let len = self.ranked.len();
        if !self.loaded || from == to || from >= len || to >= len {
            return false;
        }
        let moved = self.ranked.remove(from);
        self.ranked.insert(to, moved);
        self.mark_edited(now);
        true
    }

    /// Insert an available application into the ranking at `dest`.
    ///
    /// No-op when the application is not in the available pool. `dest` past
    /// the end appends.
    pub fn move_from_available_to_ranked(
        &mut self,
        id: ApplicationId,
        dest: usize,
        now: Instant,
    ) -> bool {
        if !self.loaded || !self.is_available(id) {
            return false;
        }
        let Some(app) = self.applications.get(&id).cloned() else {
            return false;
        };
        let dest = dest.min(self.ranked.len());
        self.ranked.insert(dest, app);
        self.mark_edited(now);
        true
    }

    /// Take an application out of the ranking; it returns to the available pool.
    pub fn remove_from_ranked(&mut self, id: ApplicationId, now: Instant) -> bool {
        let Some(index) = self.ranked.iter().position(|a| a.id == id) else {
            return false;
        };
        self.ranked.remove(index);
        self.mark_edited(now);
        true
    }

    /// Generic drop handler for drag-and-drop adapters.
    pub fn move_between_lists(
        &mut self,
        source: RankingList,
        dest: RankingList,
        id: ApplicationId,
        dest_index: usize,
        now: Instant,
    ) -> bool {
        match (source, dest) {
            (RankingList::Ranked, RankingList::Ranked) => {
                match self.ranked.iter().position(|a| a.id == id) {
                    Some(from) => {
                        let to = dest_index.min(self.ranked.len().saturating_sub(1));
                        self.reorder_within_ranked(from, to, now)
                    }
                    None => false,
                }
            }
            (RankingList::Available, RankingList::Ranked) => {
                self.move_from_available_to_ranked(id, dest_index, now)
            }
            (RankingList::Ranked, RankingList::Available) => self.remove_from_ranked(id, now),
            (RankingList::Available, RankingList::Available) => false,
        }
    }

    fn mark_edited(&mut self, now: Instant) {
        self.debounce.arm(now);
        if self.in_flight.is_some() {
            self.edited_during_save = true;
        }
    }

    // ---- saving ----

    /// Check the auto-save timer. Returns a save to perform, if any.
    ///
    /// A timer firing while a save is in flight is queued and re-issued as
    /// soon as that save completes.
    pub fn poll(&mut self, now: Instant) -> Option<SaveRequest> {
        if !self.debounce.fire(now) {
            return None;
        }
        if self.in_flight.is_some() {
            self.save_queued = true;
            return None;
        }
        if !self.has_unsaved_changes() {
            return None;
        }
        Some(self.start_save())
    }

    /// Save immediately, bypassing the debounce.
    ///
    /// `None` when there is nothing to save or a save is already in flight.
    pub fn begin_manual_save(&mut self, _now: Instant) -> Option<SaveRequest> {
        if !self.can_save_manually() {
            return None;
        }
        self.debounce.cancel();
        Some(self.start_save())
    }

    fn start_save(&mut self) -> SaveRequest {
        self.next_seq += 1;
        let seq = self.next_seq;
        let application_ids = self.ranked_ids();
        self.in_flight = Some(InFlight { seq });
        self.edited_during_save = false;
        self.save_queued = false;
        self.last_error = None;
        log::debug!("[ranking] Saving #{}: {:?}", seq, application_ids);
        SaveRequest {
            seq,
            application_ids,
        }
    }

    /// Feed back the outcome of a save. Returns false for unknown requests.
    pub fn complete_save(
        &mut self,
        seq: u64,
        result: Result<Vec<Application>, AppError>,
        now: Instant,
    ) -> bool {
        match &self.in_flight {
            Some(in_flight) if in_flight.seq == seq => {}
            _ => {
                log::warn!("[ranking] Ignoring completion of unknown save #{}", seq);
                return false;
            }
        }
        self.in_flight = None;
        let queued = std::mem::take(&mut self.save_queued);
        let edited = std::mem::take(&mut self.edited_during_save);

        match result {
            Ok(saved) => {
                self.last_saved = saved.iter().map(|a| a.id).collect();
                self.last_saved_at = Some(now);
                if edited {
                    self.update_applications(saved);
                } else {
                    self.update_applications(saved.clone());
                    self.ranked = saved;
                }
                log::info!("[ranking] Saved #{} ({} entries)", seq, self.last_saved.len());
                self.reconcile(now);
                if queued && self.has_unsaved_changes() {
                    self.debounce.arm_now(now);
                }
            }
            Err(e) => {
                log::error!("[ranking] Save #{} failed: {}", seq, e);
                self.last_error = Some(e.to_string());
                if edited {
                    // a newer edit still deserves its own auto-save
                    self.debounce.arm(now);
                } else {
                    self.debounce.cancel();
                }
            }
        }
        true
    }

    /// Cancel the pending auto-save. An in-flight save is left running.
    ///
    /// Returns true when a save is still in flight.
    pub fn teardown(&mut self) -> bool {
        self.debounce.cancel();
        self.save_queued = false;
        self.in_flight.is_some()
    }

    // ---- queries ----

    pub fn status(&self) -> RankingStatus {
        if !self.loaded {
            RankingStatus::Loading
        } else if self.in_flight.is_some() {
            RankingStatus::Saving
        } else if self.has_unsaved_changes() {
            RankingStatus::Dirty
        } else {
            RankingStatus::Ready
        }
    }

    pub fn ranked(&self) -> &[Application] {
        &self.ranked
    }

    pub fn ranked_ids(&self) -> Vec<ApplicationId> {
        self.ranked.iter().map(|a| a.id).collect()
    }

    pub fn last_saved_ids(&self) -> &[ApplicationId] {
        &self.last_saved
    }

    pub fn has_unsaved_changes(&self) -> bool {
        !same_order(&self.ranked_ids(), &self.last_saved)
    }

    pub fn can_save_manually(&self) -> bool {
        self.loaded && self.in_flight.is_none() && self.has_unsaved_changes()
    }

    pub fn is_saving(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_saved_at(&self) -> Option<Instant> {
        self.last_saved_at
    }

    pub fn notice_visible(&self, now: Instant) -> bool {
        self.notice_until.is_some_and(|until| now < until)
    }

    /// When the driver should next call [`poll`](Self::poll).
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }

    pub fn sentiment(&self, id: ApplicationId) -> Option<Sentiment> {
        self.sentiments.get(&id).copied()
    }

    fn is_available(&self, id: ApplicationId) -> bool {
        self.sentiments.get(&id).is_some_and(|s| s.is_rankable())
            && self.applications.contains_key(&id)
            && !self.ranked.iter().any(|a| a.id == id)
    }

    /// Positive and neutral applications not yet ranked; positive first,
    /// otherwise in rating order.
    pub fn available_pool(&self) -> Vec<AvailableEntry> {
        let ranked: HashSet<ApplicationId> = self.ranked.iter().map(|a| a.id).collect();
        let mut seen = HashSet::new();
        let mut pool: Vec<AvailableEntry> = self
            .ratings
            .iter()
            .filter(|r| r.rate.is_rankable() && !ranked.contains(&r.application_id))
            .filter(|r| seen.insert(r.application_id))
            .filter_map(|r| {
                self.applications.get(&r.application_id).map(|app| AvailableEntry {
                    sentiment: r.rate,
                    application: app.clone(),
                })
            })
            .collect();
        pool.sort_by_key(|entry| entry.sentiment != Sentiment::Positive);
        pool
    }

    pub fn available_ids(&self) -> Vec<ApplicationId> {
        self.available_pool()
            .iter()
            .map(|e| e.application.id)
            .collect()
    }

    pub fn view(&self, now: Instant) -> RankingView {
        RankingView {
            status: self.status(),
            ranked: self
                .ranked
                .iter()
                .enumerate()
                .map(|(position, app)| RankedEntry {
                    position,
                    scholarship: is_scholarship_position(position),
                    application: app.clone(),
                })
                .collect(),
            available: self.available_pool(),
            has_unsaved_changes: self.has_unsaved_changes(),
            can_save: self.can_save_manually(),
            notice_visible: self.notice_visible(now),
            last_error: self.last_error.clone(),
        }
    }
}
