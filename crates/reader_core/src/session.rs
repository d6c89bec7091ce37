//! The reader session: the single stateful hub between the presentation layer
//! and the reconciler, the fetch pipeline and the persistence collaborators.
//!
//! Every mutation goes through an explicit setter. A setter persists its field
//! first, updates the published snapshot, and then runs the dependent reaction
//! (remap, fetch, debounced write) itself. Selection setters hold the
//! session's command lock from their first snapshot read to their commit, so
//! concurrent callers apply one after the other.

use std::{sync::Arc, time::Duration};

use shared::{
    catalog::Catalog,
    domain::{Book, Canon, Translation, Verse},
};
use storage::{MarkingFiles, SettingsStore};
use thiserror::Error;
use tokio::{
    sync::{broadcast, watch, Mutex},
    task::JoinHandle,
};
use tracing::{info, warn};

use crate::{
    debounce::TitlesDebouncer,
    fetch::FetchOrchestrator,
    markings::MarkingStore,
    reconcile::reconcile,
    source::ChapterSource,
    state::{FetchOutcome, ReaderEvent, ReaderSnapshot},
};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("chapter {chapter} is outside {book} (1..={chapters})")]
    ChapterOutOfRange {
        book: String,
        chapter: u16,
        chapters: u16,
    },
    #[error("{book} is not part of the {canon:?} canon")]
    BookNotInCanon { book: String, canon: Canon },
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub catalog: Arc<Catalog>,
    pub title_debounce: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            catalog: Arc::new(Catalog::standard().clone()),
            title_debounce: Duration::from_millis(500),
        }
    }
}

pub struct ReaderSession {
    catalog: Arc<Catalog>,
    settings: Arc<dyn SettingsStore>,
    state: Arc<watch::Sender<ReaderSnapshot>>,
    events: broadcast::Sender<ReaderEvent>,
    orchestrator: FetchOrchestrator,
    commands: Mutex<()>,
    markings: Mutex<MarkingStore>,
    titles: TitlesDebouncer,
}

impl ReaderSession {
    /// Loads markings and (when enabled) the last position, then issues the
    /// initial chapter fetch. The returned handle resolves when it settles.
    pub async fn start(
        settings: Arc<dyn SettingsStore>,
        marking_files: Arc<dyn MarkingFiles>,
        source: Arc<dyn ChapterSource>,
        options: SessionOptions,
    ) -> Result<(Self, JoinHandle<FetchOutcome>), SessionError> {
        let SessionOptions {
            catalog,
            title_debounce,
        } = options;

        let mut markings = MarkingStore::new(marking_files);
        markings.load_all().await?;

        let save_last_position = settings.save_last_position().await.unwrap_or_else(|err| {
            warn!("failed to read save_last_position: {err:#}");
            false
        });
        let titles = settings.titles().await.unwrap_or_else(|err| {
            warn!("failed to read titles: {err:#}");
            Vec::new()
        });

        let (book, chapter, translation) = if save_last_position {
            restore_position(&catalog, settings.as_ref()).await
        } else {
            let translation = Translation::default();
            (catalog.first_book(translation.canon()).clone(), 1, translation)
        };
        info!(
            book = %book.abbreviation,
            chapter,
            %translation,
            restored = save_last_position,
            "reader session starting"
        );

        let mut snapshot = ReaderSnapshot::new(book.clone(), chapter, translation);
        snapshot.markings = markings.index().clone();
        snapshot.save_last_position = save_last_position;
        snapshot.titles = titles;

        let (state, _) = watch::channel(snapshot);
        let state = Arc::new(state);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let orchestrator = FetchOrchestrator::new(source, Arc::clone(&state), events.clone());
        let titles = TitlesDebouncer::new(title_debounce, Arc::clone(&settings), events.clone());

        let initial = orchestrator.fetch(book, chapter, translation);
        let session = Self {
            catalog,
            settings,
            state,
            events,
            orchestrator,
            commands: Mutex::new(()),
            markings: Mutex::new(markings),
            titles,
        };
        Ok((session, initial))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn snapshot(&self) -> ReaderSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ReaderSnapshot> {
        self.state.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ReaderEvent> {
        self.events.subscribe()
    }

    /// Opens `chapter` of the current book and fetches it.
    pub async fn set_chapter(
        &self,
        chapter: u16,
    ) -> Result<JoinHandle<FetchOutcome>, SessionError> {
        let _command = self.commands.lock().await;
        self.apply_chapter(chapter).await
    }

    async fn apply_chapter(
        &self,
        chapter: u16,
    ) -> Result<JoinHandle<FetchOutcome>, SessionError> {
        let book = self.state.borrow().book.clone();
        check_chapter(&book, chapter)?;

        log_write_failure("chapter", self.settings.set_chapter(chapter).await);

        let mut translation = Translation::default();
        self.state.send_modify(|state| {
            state.chapter = chapter;
            translation = state.translation;
        });
        Ok(self.orchestrator.fetch(book, chapter, translation))
    }

    /// Switches translation, remapping the book when the canon changes.
    ///
    /// Returns `None` when the new translation does not cover the current book;
    /// the error is published on the snapshot and nothing is fetched. The
    /// translation itself stays switched in that case.
    pub async fn set_translation(
        &self,
        translation: Translation,
    ) -> Option<JoinHandle<FetchOutcome>> {
        let _command = self.commands.lock().await;
        let (previous, current_book, current_chapter) = {
            let state = self.state.borrow();
            (state.translation, state.book.clone(), state.chapter)
        };

        log_write_failure(
            "translation",
            self.settings.set_translation(translation).await,
        );

        match reconcile(&self.catalog, previous, translation, &current_book) {
            Ok(book) => {
                if book != current_book {
                    info!(
                        from = %current_book.abbreviation,
                        to = %book.abbreviation,
                        "book remapped across canons"
                    );
                    log_write_failure("book", self.settings.set_book(&book).await);
                }
                let chapter = current_chapter.clamp(1, book.chapters);
                if chapter != current_chapter {
                    log_write_failure("chapter", self.settings.set_chapter(chapter).await);
                }

                self.state.send_modify(|state| {
                    state.translation = translation;
                    state.book = book.clone();
                    state.chapter = chapter;
                });
                Some(self.orchestrator.fetch(book, chapter, translation))
            }
            Err(err) => {
                warn!(
                    from = %previous,
                    to = %translation,
                    book = %current_book.name,
                    "translation rejected: {err}"
                );
                self.orchestrator.supersede_pending();
                self.state.send_modify(|state| {
                    state.translation = translation;
                    state.verses.clear();
                    state.error = Some(err);
                });
                let _ = self.events.send(ReaderEvent::TranslationRejected {
                    book: current_book.name,
                });
                None
            }
        }
    }

    /// Changes the book without fetching; the next `set_chapter` loads it.
    /// The current chapter is clamped into the new book's range.
    pub async fn set_book(&self, book: Book) -> Result<(), SessionError> {
        let _command = self.commands.lock().await;
        self.apply_book(book).await
    }

    async fn apply_book(&self, book: Book) -> Result<(), SessionError> {
        let (canon, chapter) = {
            let state = self.state.borrow();
            (state.translation.canon(), state.chapter)
        };
        if !self.catalog.contains(canon, &book) {
            return Err(SessionError::BookNotInCanon {
                book: book.name,
                canon,
            });
        }

        log_write_failure("book", self.settings.set_book(&book).await);
        let clamped = chapter.clamp(1, book.chapters);
        if clamped != chapter {
            log_write_failure("chapter", self.settings.set_chapter(clamped).await);
        }

        self.state.send_modify(|state| {
            state.book = book;
            state.chapter = clamped;
        });
        Ok(())
    }

    /// Book then chapter, the way a passage picker applies a selection.
    pub async fn select_passage(
        &self,
        book: Book,
        chapter: u16,
    ) -> Result<JoinHandle<FetchOutcome>, SessionError> {
        check_chapter(&book, chapter)?;
        let _command = self.commands.lock().await;
        self.apply_book(book).await?;
        self.apply_chapter(chapter).await
    }

    pub async fn set_save_last_position(&self, enabled: bool) {
        let _command = self.commands.lock().await;
        log_write_failure(
            "save_last_position",
            self.settings.set_save_last_position(enabled).await,
        );
        self.state.send_if_modified(|state| {
            let changed = state.save_last_position != enabled;
            state.save_last_position = enabled;
            changed
        });
    }

    /// Publishes the title list now and persists it after the quiet period.
    pub fn set_titles(&self, titles: Vec<String>) {
        self.state.send_modify(|state| state.titles = titles.clone());
        self.titles.schedule(titles);
    }

    /// Marks by color name; an unknown name leaves the verse unmarked.
    pub async fn mark_verse(&self, verse: Verse, color: &str) -> Result<(), SessionError> {
        let mut markings = self.markings.lock().await;
        let result = markings.mark(verse, color).await;
        self.publish_markings(&markings);
        result.map_err(SessionError::from)
    }

    pub async fn unmark_verse(&self, verse: &Verse) -> Result<(), SessionError> {
        let mut markings = self.markings.lock().await;
        let result = markings.unmark(verse).await;
        self.publish_markings(&markings);
        result.map_err(SessionError::from)
    }

    /// Writes any pending title edit before the session goes away.
    pub async fn shutdown(&self) {
        self.titles.flush().await;
        info!("reader session closed");
    }

    fn publish_markings(&self, markings: &MarkingStore) {
        self.state
            .send_modify(|state| state.markings = markings.index().clone());
        let _ = self.events.send(ReaderEvent::MarkingsChanged);
    }
}

async fn restore_position(
    catalog: &Catalog,
    settings: &dyn SettingsStore,
) -> (Book, u16, Translation) {
    let translation = settings
        .translation()
        .await
        .unwrap_or_else(|err| {
            warn!("failed to read translation: {err:#}");
            None
        })
        .unwrap_or_default();
    let canon = translation.canon();

    let book = match settings.book().await {
        Ok(Some(saved)) => match catalog.book_by_abbreviation(canon, &saved.abbreviation) {
            Some(book) => book.clone(),
            None => {
                warn!(
                    book = %saved.abbreviation,
                    %translation,
                    "restored book is not in the translation's canon, using the first book"
                );
                catalog.first_book(canon).clone()
            }
        },
        Ok(None) => catalog.first_book(canon).clone(),
        Err(err) => {
            warn!("failed to read book: {err:#}");
            catalog.first_book(canon).clone()
        }
    };

    let chapter = match settings.chapter().await {
        Ok(chapter) => chapter.unwrap_or(1),
        Err(err) => {
            warn!("failed to read chapter: {err:#}");
            1
        }
    };

    let clamped = chapter.clamp(1, book.chapters);
    (book, clamped, translation)
}

fn check_chapter(book: &Book, chapter: u16) -> Result<(), SessionError> {
    if book.contains_chapter(chapter) {
        Ok(())
    } else {
        Err(SessionError::ChapterOutOfRange {
            book: book.name.clone(),
            chapter,
            chapters: book.chapters,
        })
    }
}

fn log_write_failure(field: &'static str, result: anyhow::Result<()>) {
    if let Err(err) = result {
        warn!(field, "failed to persist setting: {err:#}");
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
