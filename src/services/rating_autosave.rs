//! Debounced auto-save for the rating page.
//!
//! Comment and per-document edits are coalesced; a sentiment change is
//! saved right away. Like the ranking reconciler, the draft is driven by
//! an explicit `now` and hands out [`RateRequest`]s for the caller to send.

use crate::error::AppError;
use crate::models::{ApplicationId, DocumentKind, Docs, Rating, Sentiment};
use crate::services::debounce::Debouncer;
use serde::Serialize;
use std::time::{Duration, Instant};

/// Payload for `POST /patron/rate-application/{id}`.
#[derive(Debug, Clone, PartialEq)]
pub struct RateRequest {
    pub seq: u64,
    pub application_id: ApplicationId,
    pub rate: Sentiment,
    pub comment: String,
    pub docs: Docs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    Saved,
    Pending,
    Saving,
    Failed,
}

#[derive(Debug, Clone)]
pub struct RatingDraft {
    rating: Rating,
    saved: Rating,
    debounce: Debouncer,
    in_flight: Option<u64>,
    next_seq: u64,
    save_queued: bool,
    last_error: Option<String>,
    closed: bool,
}

impl RatingDraft {
    /// Start editing `rating`, which is assumed to match the server.
    pub fn new(rating: Rating, delay: Duration) -> Self {
        Self {
            saved: rating.clone(),
            rating,
            debounce: Debouncer::new(delay),
            in_flight: None,
            next_seq: 0,
            save_queued: false,
            last_error: None,
            closed: false,
        }
    }

    pub fn rating(&self) -> &Rating {
        &self.rating
    }

    /// Only the fields the patron edits count; ids come from the server.
    pub fn is_dirty(&self) -> bool {
        self.rating.rate != self.saved.rate
            || self.rating.comment != self.saved.comment
            || self.rating.docs != self.saved.docs
    }

    pub fn status(&self) -> DraftStatus {
        if self.in_flight.is_some() {
            DraftStatus::Saving
        } else if self.last_error.is_some() {
            DraftStatus::Failed
        } else if self.is_dirty() {
            DraftStatus::Pending
        } else {
            DraftStatus::Saved
        }
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }

    pub fn set_comment(&mut self, comment: impl Into<String>, now: Instant) {
        let comment = comment.into();
        if self.closed || self.rating.comment == comment {
            return;
        }
        self.rating.comment = comment;
        self.debounce.arm(now);
    }

    pub fn set_doc_seen(&mut self, kind: DocumentKind, seen: bool, now: Instant) {
        if !self.closed && self.rating.docs.set_seen(kind, seen) {
            self.debounce.arm(now);
        }
    }

    pub fn set_doc_comment(&mut self, kind: DocumentKind, comment: impl Into<String>, now: Instant) {
        if !self.closed && self.rating.docs.set_comment(kind, comment) {
            self.debounce.arm(now);
        }
    }

    /// Sentiment changes skip the debounce.
    pub fn set_sentiment(&mut self, rate: Sentiment, now: Instant) {
        if self.closed || self.rating.rate == rate {
            return;
        }
        self.rating.rate = rate;
        self.debounce.arm_now(now);
    }

    /// Returns the save to send once the timer has expired.
    pub fn poll(&mut self, now: Instant) -> Option<RateRequest> {
        if !self.debounce.fire(now) {
            return None;
        }
        if self.in_flight.is_some() {
            self.save_queued = true;
            return None;
        }
        if !self.is_dirty() {
            return None;
        }

        self.next_seq += 1;
        self.in_flight = Some(self.next_seq);
        self.last_error = None;
        log::debug!(
            "[rating] Saving application {} as {}",
            self.rating.application_id,
            self.rating.rate
        );
        Some(RateRequest {
            seq: self.next_seq,
            application_id: self.rating.application_id,
            rate: self.rating.rate,
            comment: self.rating.comment.clone(),
            docs: self.rating.docs.clone(),
        })
    }

    /// Record the server's answer. Returns false for unknown requests.
    pub fn complete(&mut self, seq: u64, result: Result<Rating, AppError>, now: Instant) -> bool {
        if self.in_flight != Some(seq) {
            return false;
        }
        self.in_flight = None;
        let queued = std::mem::take(&mut self.save_queued);

        match result {
            Ok(stored) => {
                self.rating.patron_id = stored.patron_id;
                self.saved = stored;
                if queued && self.is_dirty() && !self.closed {
                    self.debounce.arm_now(now);
                }
            }
            Err(e) => {
                log::error!(
                    "[rating] Failed to save application {}: {}",
                    self.rating.application_id,
                    e
                );
                self.last_error = Some(e.to_string());
            }
        }
        true
    }

    /// Cancel pending timers; later edits are ignored.
    pub fn close(&mut self) {
        self.closed = true;
        self.save_queued = false;
        self.debounce.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::debounce::{Clock, ManualClock};

    const DELAY: Duration = Duration::from_millis(1000);

    fn draft() -> RatingDraft {
        RatingDraft::new(Rating::unrated(7, 42), DELAY)
    }

    fn stored(request: &RateRequest) -> Rating {
        Rating {
            patron_id: 7,
            application_id: request.application_id,
            comment: request.comment.clone(),
            docs: request.docs.clone(),
            rate: request.rate,
        }
    }

    #[test]
    fn test_typing_is_debounced() {
        let clock = ManualClock::new();
        let mut d = draft();
        for text in ["S", "St", "Str", "Strong"] {
            d.set_comment(text, clock.now());
            clock.advance(Duration::from_millis(300));
            assert!(d.poll(clock.now()).is_none());
        }
        assert_eq!(d.status(), DraftStatus::Pending);

        clock.advance(DELAY);
        let request = d.poll(clock.now()).unwrap();
        assert_eq!(request.comment, "Strong");
        assert_eq!(d.status(), DraftStatus::Saving);

        assert!(d.complete(request.seq, Ok(stored(&request)), clock.now()));
        assert_eq!(d.status(), DraftStatus::Saved);
    }

    #[test]
    fn test_sentiment_saves_immediately() {
        let clock = ManualClock::new();
        let mut d = draft();
        d.set_sentiment(Sentiment::Positive, clock.now());
        let request = d.poll(clock.now()).unwrap();
        assert_eq!(request.rate, Sentiment::Positive);
        assert_eq!(request.application_id, 42);
    }

    #[test]
    fn test_doc_edits_are_sent_with_flat_keys() {
        let clock = ManualClock::new();
        let mut d = draft();
        d.set_doc_seen(DocumentKind::Cv, true, clock.now());
        d.set_doc_comment(DocumentKind::Transcript, "all A", clock.now());
        clock.advance(DELAY);
        let request = d.poll(clock.now()).unwrap();

        let body = serde_json::to_value(&request.docs).unwrap();
        assert_eq!(body["cv_seen"], serde_json::json!(true));
        assert_eq!(body["transcript_comments"], serde_json::json!("all A"));
    }

    #[test]
    fn test_unchanged_values_do_not_arm() {
        let clock = ManualClock::new();
        let mut d = draft();
        d.set_comment("", clock.now());
        d.set_sentiment(Sentiment::Unrated, clock.now());
        d.set_doc_seen(DocumentKind::Cv, false, clock.now());
        assert!(d.next_deadline().is_none());
        assert_eq!(d.status(), DraftStatus::Saved);
    }

    #[test]
    fn test_edit_during_save_is_sent_after() {
        let clock = ManualClock::new();
        let mut d = draft();
        d.set_sentiment(Sentiment::Neutral, clock.now());
        let first = d.poll(clock.now()).unwrap();

        d.set_sentiment(Sentiment::Positive, clock.now());
        assert!(d.poll(clock.now()).is_none(), "one request at a time");

        d.complete(first.seq, Ok(stored(&first)), clock.now());
        let second = d.poll(clock.now()).unwrap();
        assert_eq!(second.rate, Sentiment::Positive);
    }

    #[test]
    fn test_fresh_rating_settles_after_first_save() {
        let clock = ManualClock::new();
        let mut d = RatingDraft::new(Rating::unrated(0, 42), DELAY);
        d.set_sentiment(Sentiment::Positive, clock.now());
        let first = d.poll(clock.now()).unwrap();

        d.set_comment("keen", clock.now());
        d.set_comment("", clock.now());
        d.complete(first.seq, Ok(stored(&first)), clock.now());

        assert_eq!(d.status(), DraftStatus::Saved);
        assert!(!d.is_dirty());
        assert_eq!(d.rating().patron_id, 7);
        clock.advance(DELAY * 2);
        assert!(d.poll(clock.now()).is_none(), "nothing left to send");
        assert!(d.next_deadline().is_none());
    }

    #[test]
    fn test_failure_is_reported() {
        let clock = ManualClock::new();
        let mut d = draft();
        d.set_comment("note", clock.now());
        clock.advance(DELAY);
        let request = d.poll(clock.now()).unwrap();
        d.complete(request.seq, Err(AppError::network("offline")), clock.now());
        assert_eq!(d.status(), DraftStatus::Failed);
        assert!(d.is_dirty());
        assert!(!d.complete(request.seq, Err(AppError::network("again")), clock.now()));
    }

    #[test]
    fn test_close_cancels_timer() {
        let clock = ManualClock::new();
        let mut d = draft();
        d.set_comment("draft", clock.now());
        d.close();
        clock.advance(DELAY * 3);
        assert!(d.poll(clock.now()).is_none());
        d.set_sentiment(Sentiment::Positive, clock.now());
        assert_eq!(d.rating().rate, Sentiment::Unrated);
    }
}
