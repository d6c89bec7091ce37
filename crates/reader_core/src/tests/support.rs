//! Collaborator doubles shared by the reader_core test modules.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::{Book, Translation, Verse, VerseLocation},
    error::BibleError,
};
use storage::{MarkingFiles, MarkingLists, SettingsStore};
use tokio::sync::{oneshot, Mutex};

use crate::source::{ChapterContent, ChapterSource};

pub type Reply = std::result::Result<ChapterContent, BibleError>;

/// Holds each request for a gated chapter open until the test releases its reply.
/// Chapters without a gate answer immediately with generated verses.
#[derive(Default)]
pub struct GatedSource {
    gates: Mutex<HashMap<u16, oneshot::Receiver<Reply>>>,
    pub calls: Mutex<Vec<(String, u16, String)>>,
}

impl GatedSource {
    pub async fn gate(&self, chapter: u16) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().await.insert(chapter, rx);
        tx
    }

    pub async fn calls(&self) -> Vec<(String, u16, String)> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl ChapterSource for GatedSource {
    async fn fetch_chapter(&self, book: &Book, chapter: u16, translation_code: &str) -> Reply {
        self.calls.lock().await.push((
            book.abbreviation.clone(),
            chapter,
            translation_code.to_string(),
        ));
        let gate = self.gates.lock().await.remove(&chapter);
        match gate {
            Some(rx) => rx.await.unwrap_or(Err(BibleError::Unknown)),
            None => Ok(chapter_content(&book.abbreviation, chapter, 3)),
        }
    }
}

pub fn verse(global_index: u64, reference: &str) -> Verse {
    Verse {
        location: VerseLocation {
            global_index,
            reference: reference.to_string(),
        },
        text: format!("{reference} szövege"),
    }
}

pub fn chapter_content(abbreviation: &str, chapter: u16, count: u64) -> ChapterContent {
    ChapterContent {
        verses: (1..=count)
            .map(|n| {
                verse(
                    u64::from(chapter) * 1000 + n,
                    &format!("{abbreviation} {chapter},{n}"),
                )
            })
            .collect(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct StoredSettings {
    pub book: Option<Book>,
    pub chapter: Option<u16>,
    pub translation: Option<Translation>,
    pub save_last_position: bool,
    pub titles: Vec<String>,
}

#[derive(Default)]
pub struct MemorySettings {
    pub stored: Mutex<StoredSettings>,
    /// Every attempted title write, including failed ones.
    pub title_writes: Mutex<Vec<Vec<String>>>,
    pub book_writes: AtomicUsize,
    pub fail_writes: bool,
    /// Every write suspends this long before it completes.
    pub write_latency: Option<Duration>,
}

impl MemorySettings {
    pub fn with(stored: StoredSettings) -> Self {
        Self {
            stored: Mutex::new(stored),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn slow(stored: StoredSettings, latency: Duration) -> Self {
        Self {
            stored: Mutex::new(stored),
            write_latency: Some(latency),
            ..Self::default()
        }
    }

    async fn check_writable(&self) -> Result<()> {
        if let Some(latency) = self.write_latency {
            tokio::time::sleep(latency).await;
        }
        if self.fail_writes {
            return Err(anyhow!("settings are read-only"));
        }
        Ok(())
    }

    pub async fn snapshot(&self) -> StoredSettings {
        self.stored.lock().await.clone()
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn book(&self) -> Result<Option<Book>> {
        Ok(self.stored.lock().await.book.clone())
    }

    async fn set_book(&self, book: &Book) -> Result<()> {
        self.check_writable().await?;
        self.book_writes.fetch_add(1, Ordering::SeqCst);
        self.stored.lock().await.book = Some(book.clone());
        Ok(())
    }

    async fn chapter(&self) -> Result<Option<u16>> {
        Ok(self.stored.lock().await.chapter)
    }

    async fn set_chapter(&self, chapter: u16) -> Result<()> {
        self.check_writable().await?;
        self.stored.lock().await.chapter = Some(chapter);
        Ok(())
    }

    async fn translation(&self) -> Result<Option<Translation>> {
        Ok(self.stored.lock().await.translation)
    }

    async fn set_translation(&self, translation: Translation) -> Result<()> {
        self.check_writable().await?;
        self.stored.lock().await.translation = Some(translation);
        Ok(())
    }

    async fn save_last_position(&self) -> Result<bool> {
        Ok(self.stored.lock().await.save_last_position)
    }

    async fn set_save_last_position(&self, enabled: bool) -> Result<()> {
        self.check_writable().await?;
        self.stored.lock().await.save_last_position = enabled;
        Ok(())
    }

    async fn titles(&self) -> Result<Vec<String>> {
        Ok(self.stored.lock().await.titles.clone())
    }

    async fn set_titles(&self, titles: &[String]) -> Result<()> {
        self.title_writes.lock().await.push(titles.to_vec());
        self.check_writable().await?;
        self.stored.lock().await.titles = titles.to_vec();
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryMarkingFiles {
    pub stored: Mutex<MarkingLists>,
    pub saves: AtomicUsize,
    pub fail_loads: bool,
}

impl MemoryMarkingFiles {
    pub fn with(lists: MarkingLists) -> Self {
        Self {
            stored: Mutex::new(lists),
            ..Self::default()
        }
    }

    pub fn unreadable() -> Self {
        Self {
            fail_loads: true,
            ..Self::default()
        }
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarkingFiles for MemoryMarkingFiles {
    async fn load_files(&self) -> Result<MarkingLists> {
        if self.fail_loads {
            return Err(anyhow!("marking file is corrupt"));
        }
        Ok(self.stored.lock().await.clone())
    }

    async fn save_files(&self, lists: &MarkingLists) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.stored.lock().await = lists.clone();
        Ok(())
    }
}
