use super::*;
use anyhow::anyhow;
use async_trait::async_trait;
use shared::domain::VerseLocation;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

#[derive(Default)]
struct RecordingFiles {
    stored: Mutex<MarkingLists>,
    saves: AtomicUsize,
    fail_saves: bool,
}

impl RecordingFiles {
    fn with_lists(lists: MarkingLists) -> Self {
        Self {
            stored: Mutex::new(lists),
            ..Self::default()
        }
    }

    fn failing() -> Self {
        Self {
            fail_saves: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl MarkingFiles for RecordingFiles {
    async fn load_files(&self) -> Result<MarkingLists> {
        Ok(self.stored.lock().await.clone())
    }

    async fn save_files(&self, lists: &MarkingLists) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves {
            return Err(anyhow!("disk full"));
        }
        *self.stored.lock().await = lists.clone();
        Ok(())
    }
}

fn verse(global_index: u64) -> Verse {
    Verse {
        location: VerseLocation {
            global_index,
            reference: format!("Jn 3,{global_index}"),
        },
        text: "szöveg".to_string(),
    }
}

fn assert_exclusive(index: &MarkingIndex) {
    let mut seen = HashSet::new();
    for list in index.lists() {
        for verse in list {
            assert!(
                seen.insert(verse.global_index()),
                "verse {} marked twice",
                verse.global_index()
            );
        }
    }
}

#[tokio::test]
async fn remarking_moves_verse_to_new_color() {
    let files = Arc::new(RecordingFiles::default());
    let mut store = MarkingStore::new(files.clone());

    store.mark(verse(16), "Yellow").await.expect("yellow");
    store.mark(verse(16), "Red").await.expect("red");

    assert!(store.index().list(MarkColor::Yellow).is_empty());
    assert_eq!(store.index().list(MarkColor::Red), &[verse(16)]);
    assert_eq!(store.index().color_of(16), Some(MarkColor::Red));
    assert_exclusive(store.index());
}

#[tokio::test]
async fn mark_then_unmark_flushes_once_per_call() {
    let files = Arc::new(RecordingFiles::default());
    let mut store = MarkingStore::new(files.clone());

    store.mark(verse(500), "Blue").await.expect("blue");
    store.unmark(&verse(500)).await.expect("unmark");

    assert_eq!(store.index().color_of(500), None);
    assert!(store.index().is_empty());
    assert_eq!(files.saves.load(Ordering::SeqCst), 2);
    assert!(files.stored.lock().await.iter().all(Vec::is_empty));
}

#[tokio::test]
async fn unknown_color_clears_existing_marking() {
    let files = Arc::new(RecordingFiles::default());
    let mut store = MarkingStore::new(files.clone());

    store.mark(verse(3), "Green").await.expect("green");
    store.mark(verse(3), "Purple").await.expect("purple");

    assert_eq!(store.index().color_of(3), None);
    assert_eq!(files.saves.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn identity_is_by_global_index_not_text() {
    let files = Arc::new(RecordingFiles::default());
    let mut store = MarkingStore::new(files);

    let mut other_translation = verse(7);
    other_translation.text = "másik fordítás".to_string();

    store.mark_color(verse(7), MarkColor::Gray).await.expect("gray");
    store
        .mark_color(other_translation.clone(), MarkColor::Blue)
        .await
        .expect("blue");

    assert!(store.index().list(MarkColor::Gray).is_empty());
    assert_eq!(store.index().list(MarkColor::Blue), &[other_translation]);
}

#[tokio::test]
async fn exclusivity_holds_across_mixed_sequences() {
    let files = Arc::new(RecordingFiles::default());
    let mut store = MarkingStore::new(files);

    let colors = ["Yellow", "Red", "Blue", "Green", "Gray", "None"];
    for step in 0..40u64 {
        let target = verse(step % 7);
        if step % 5 == 4 {
            store.unmark(&target).await.expect("unmark");
        } else {
            let color = colors[(step as usize * 3) % colors.len()];
            store.mark(target, color).await.expect("mark");
        }
        assert_exclusive(store.index());
    }
}

#[tokio::test]
async fn load_all_reads_lists_in_fixed_order_and_drops_duplicates() {
    let mut lists = MarkingLists::default();
    lists[MarkColor::Yellow.position()] = vec![verse(1), verse(2)];
    lists[MarkColor::Gray.position()] = vec![verse(2), verse(9)];
    let files = Arc::new(RecordingFiles::with_lists(lists));
    let mut store = MarkingStore::new(files.clone());

    store.load_all().await.expect("load");

    assert_eq!(store.index().list(MarkColor::Yellow), &[verse(1), verse(2)]);
    assert_eq!(store.index().list(MarkColor::Gray), &[verse(9)]);
    assert_exclusive(store.index());
    assert_eq!(files.saves.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn save_failure_is_reported_to_caller() {
    let mut store = MarkingStore::new(Arc::new(RecordingFiles::failing()));

    let err = store
        .mark(verse(1), "Red")
        .await
        .expect_err("save must fail");
    assert!(err.to_string().contains("failed to save verse markings"));
    assert_eq!(store.index().color_of(1), Some(MarkColor::Red));
}
