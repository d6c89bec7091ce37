//! Chapter fetch pipeline with supersession.
//!
//! Every request takes the next token from a per-orchestrator counter. A
//! completion only touches the published state if its token is still the
//! latest one; the comparison happens inside the state channel's write lock,
//! so a late completion can never overwrite the result of a newer request.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use shared::domain::{Book, Translation};
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    source::ChapterSource,
    state::{FetchOutcome, ReaderEvent, ReaderSnapshot},
};

pub struct FetchOrchestrator {
    source: Arc<dyn ChapterSource>,
    state: Arc<watch::Sender<ReaderSnapshot>>,
    events: broadcast::Sender<ReaderEvent>,
    latest: Arc<AtomicU64>,
}

impl FetchOrchestrator {
    pub fn new(
        source: Arc<dyn ChapterSource>,
        state: Arc<watch::Sender<ReaderSnapshot>>,
        events: broadcast::Sender<ReaderEvent>,
    ) -> Self {
        Self {
            source,
            state,
            events,
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Token of the most recently issued request.
    pub fn latest_token(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Starts a request; the loading flag is raised before this returns.
    pub fn fetch(
        &self,
        book: Book,
        chapter: u16,
        translation: Translation,
    ) -> JoinHandle<FetchOutcome> {
        let token = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|state| state.is_loading = true);
        info!(
            book = %book.abbreviation,
            chapter,
            %translation,
            token,
            "fetching chapter"
        );

        let source = Arc::clone(&self.source);
        let state = Arc::clone(&self.state);
        let latest = Arc::clone(&self.latest);
        let events = self.events.clone();

        tokio::spawn(async move {
            let result = source
                .fetch_chapter(&book, chapter, translation.code())
                .await;

            let mut outcome = FetchOutcome::Superseded;
            state.send_if_modified(|snapshot| {
                if latest.load(Ordering::SeqCst) != token {
                    return false;
                }
                snapshot.is_loading = false;
                outcome = match &result {
                    Ok(content) => {
                        snapshot.verses = content.verses.clone();
                        snapshot.error = None;
                        FetchOutcome::Committed {
                            verse_count: content.verses.len(),
                        }
                    }
                    Err(err) => {
                        snapshot.verses.clear();
                        snapshot.error = Some(err.clone());
                        FetchOutcome::Failed(err.clone())
                    }
                };
                true
            });

            match &outcome {
                FetchOutcome::Committed { verse_count } => {
                    info!(token, verses = verse_count, "chapter loaded");
                    let _ = events.send(ReaderEvent::ChapterLoaded {
                        book,
                        chapter,
                        translation,
                        verse_count: *verse_count,
                    });
                }
                FetchOutcome::Failed(err) => {
                    warn!(token, error = ?err, "chapter fetch failed");
                    let _ = events.send(ReaderEvent::ChapterFailed(err.clone()));
                }
                FetchOutcome::Superseded => {
                    debug!(token, "discarding superseded chapter result");
                    let _ = events.send(ReaderEvent::FetchSuperseded { token });
                }
            }
            outcome
        })
    }

    /// Invalidates in-flight requests without issuing a new one.
    pub fn supersede_pending(&self) {
        let token = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_if_modified(|state| {
            let was_loading = state.is_loading;
            state.is_loading = false;
            was_loading
        });
        debug!(token, "superseded pending chapter requests");
    }
}

#[cfg(test)]
#[path = "tests/fetch_tests.rs"]
mod tests;
