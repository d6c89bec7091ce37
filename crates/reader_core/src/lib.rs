pub mod config;
pub mod debounce;
pub mod fetch;
pub mod markings;
pub mod reconcile;
pub mod session;
pub mod source;
pub mod state;

pub use fetch::FetchOrchestrator;
pub use markings::{MarkingIndex, MarkingStore};
pub use reconcile::reconcile;
pub use session::{ReaderSession, SessionError, SessionOptions};
pub use source::{ChapterContent, ChapterSource, SzentirasClient};
pub use state::{FetchOutcome, ReaderEvent, ReaderSnapshot};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
