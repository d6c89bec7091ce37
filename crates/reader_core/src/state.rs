//! Published reader state and the discrete events emitted alongside it.

use shared::{
    domain::{Book, Translation, Verse},
    error::BibleError,
};

use crate::markings::MarkingIndex;

/// Everything a presentation layer observes about the session.
#[derive(Debug, Clone, PartialEq)]
pub struct ReaderSnapshot {
    pub book: Book,
    pub chapter: u16,
    pub translation: Translation,
    pub verses: Vec<Verse>,
    pub is_loading: bool,
    pub error: Option<BibleError>,
    pub markings: MarkingIndex,
    pub save_last_position: bool,
    pub titles: Vec<String>,
}

impl ReaderSnapshot {
    pub fn new(book: Book, chapter: u16, translation: Translation) -> Self {
        Self {
            book,
            chapter,
            translation,
            verses: Vec::new(),
            is_loading: false,
            error: None,
            markings: MarkingIndex::default(),
            save_last_position: false,
            titles: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReaderEvent {
    ChapterLoaded {
        book: Book,
        chapter: u16,
        translation: Translation,
        verse_count: usize,
    },
    ChapterFailed(BibleError),
    FetchSuperseded {
        token: u64,
    },
    TranslationRejected {
        book: String,
    },
    MarkingsChanged,
    TitlesPersisted(Vec<String>),
}

/// How a single chapter request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Committed { verse_count: usize },
    Failed(BibleError),
    /// A later request was issued before this one settled; its result was dropped.
    Superseded,
}
