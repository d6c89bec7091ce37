use std::{collections::HashSet, str::FromStr, sync::Arc};

use anyhow::{Context, Result};
use shared::domain::{MarkColor, Verse};
use storage::{MarkingFiles, MarkingLists};
use tracing::{debug, warn};

/// Five color lists; a verse (by global index) sits in at most one of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkingIndex {
    lists: MarkingLists,
}

impl MarkingIndex {
    /// Builds an index from persisted lists, keeping only the first occurrence
    /// of a verse when the lists disagree.
    pub fn from_lists(lists: MarkingLists) -> Self {
        let mut seen = HashSet::new();
        let mut index = Self::default();
        for (color, verses) in MarkColor::ALL.iter().zip(lists) {
            for verse in verses {
                if seen.insert(verse.global_index()) {
                    index.lists[color.position()].push(verse);
                } else {
                    warn!(
                        global_index = verse.global_index(),
                        color = %color,
                        "dropping duplicate verse marking"
                    );
                }
            }
        }
        index
    }

    pub fn lists(&self) -> &MarkingLists {
        &self.lists
    }

    pub fn list(&self, color: MarkColor) -> &[Verse] {
        &self.lists[color.position()]
    }

    pub fn color_of(&self, global_index: u64) -> Option<MarkColor> {
        MarkColor::ALL.into_iter().find(|color| {
            self.list(*color)
                .iter()
                .any(|verse| verse.global_index() == global_index)
        })
    }

    pub fn len(&self) -> usize {
        self.lists.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes the verse from every list, then appends it to `color` if given.
    pub fn assign(&mut self, verse: Verse, color: Option<MarkColor>) {
        self.remove_everywhere(&verse);
        if let Some(color) = color {
            self.lists[color.position()].push(verse);
        }
    }

    fn remove_everywhere(&mut self, verse: &Verse) {
        for list in &mut self.lists {
            list.retain(|marked| !marked.is_same_verse(verse));
        }
    }
}

/// In-memory marking index flushed to its persistence collaborator after every change.
pub struct MarkingStore {
    index: MarkingIndex,
    files: Arc<dyn MarkingFiles>,
}

impl MarkingStore {
    pub fn new(files: Arc<dyn MarkingFiles>) -> Self {
        Self {
            index: MarkingIndex::default(),
            files,
        }
    }

    pub fn index(&self) -> &MarkingIndex {
        &self.index
    }

    pub async fn load_all(&mut self) -> Result<()> {
        let lists = self
            .files
            .load_files()
            .await
            .context("failed to load verse markings")?;
        self.index = MarkingIndex::from_lists(lists);
        debug!(count = self.index.len(), "loaded verse markings");
        Ok(())
    }

    pub async fn save_all(&self) -> Result<()> {
        self.files
            .save_files(self.index.lists())
            .await
            .context("failed to save verse markings")
    }

    /// Marks by color name; an unrecognised name leaves the verse unmarked.
    pub async fn mark(&mut self, verse: Verse, color: &str) -> Result<()> {
        let color = match MarkColor::from_str(color) {
            Ok(color) => Some(color),
            Err(err) => {
                debug!(global_index = verse.global_index(), "{err}; clearing marking");
                None
            }
        };
        self.index.assign(verse, color);
        self.save_all().await
    }

    pub async fn mark_color(&mut self, verse: Verse, color: MarkColor) -> Result<()> {
        self.index.assign(verse, Some(color));
        self.save_all().await
    }

    pub async fn unmark(&mut self, verse: &Verse) -> Result<()> {
        self.index.remove_everywhere(verse);
        self.save_all().await
    }
}

#[cfg(test)]
#[path = "tests/markings_tests.rs"]
mod tests;
