//! Debounced persistence of the title list.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use storage::SettingsStore;
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, warn};

use crate::state::ReaderEvent;

struct PendingWrite {
    generation: u64,
    titles: Vec<String>,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct DebounceState {
    next_generation: u64,
    pending: Option<PendingWrite>,
}

/// Collapses bursts of title edits into one settings write issued after a quiet period.
pub struct TitlesDebouncer {
    delay: Duration,
    settings: Arc<dyn SettingsStore>,
    events: broadcast::Sender<ReaderEvent>,
    inner: Arc<Mutex<DebounceState>>,
    /// Held for the whole of a settings write; one write at a time.
    writing: Arc<tokio::sync::Mutex<()>>,
}

fn lock(state: &Mutex<DebounceState>) -> MutexGuard<'_, DebounceState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TitlesDebouncer {
    pub fn new(
        delay: Duration,
        settings: Arc<dyn SettingsStore>,
        events: broadcast::Sender<ReaderEvent>,
    ) -> Self {
        Self {
            delay,
            settings,
            events,
            inner: Arc::new(Mutex::new(DebounceState::default())),
            writing: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Replaces any pending write with `titles` and restarts the quiet period.
    pub fn schedule(&self, titles: Vec<String>) {
        let mut guard = lock(&self.inner);
        guard.next_generation += 1;
        let generation = guard.next_generation;

        if let Some(previous) = guard.pending.take() {
            previous.task.abort();
            debug!(generation, "title write rescheduled");
        }

        let delay = self.delay;
        let settings = Arc::clone(&self.settings);
        let events = self.events.clone();
        let inner = Arc::clone(&self.inner);
        let writing = Arc::clone(&self.writing);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _writing = writing.lock().await;

            // Once taken, neither `schedule` nor `flush` can abort this write.
            let titles = {
                let mut guard = lock(&inner);
                match guard.pending.take() {
                    Some(pending) if pending.generation == generation => pending.titles,
                    other => {
                        guard.pending = other;
                        return;
                    }
                }
            };
            persist(settings.as_ref(), &events, titles).await;
        });

        guard.pending = Some(PendingWrite {
            generation,
            titles,
            task,
        });
    }

    pub fn has_pending(&self) -> bool {
        lock(&self.inner).pending.is_some()
    }

    /// Writes a pending title list immediately instead of waiting out the delay.
    /// Waits for a write already in progress rather than repeating it.
    pub async fn flush(&self) {
        let _writing = self.writing.lock().await;
        let pending = lock(&self.inner).pending.take();
        if let Some(pending) = pending {
            pending.task.abort();
            persist(self.settings.as_ref(), &self.events, pending.titles).await;
        }
    }
}

async fn persist(
    settings: &dyn SettingsStore,
    events: &broadcast::Sender<ReaderEvent>,
    titles: Vec<String>,
) {
    match settings.set_titles(&titles).await {
        Ok(()) => {
            debug!(count = titles.len(), "titles persisted");
            let _ = events.send(ReaderEvent::TitlesPersisted(titles));
        }
        Err(err) => warn!("failed to persist titles: {err:#}"),
    }
}

#[cfg(test)]
#[path = "tests/debounce_tests.rs"]
mod tests;
