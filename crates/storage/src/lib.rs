use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::domain::{Book, MarkColor, Translation, Verse};

/// The five marking lists in `MarkColor::ALL` order.
pub type MarkingLists = [Vec<Verse>; 5];

const KEY_BOOK: &str = "book";
const KEY_CHAPTER: &str = "chapter";
const KEY_TRANSLATION: &str = "translation";
const KEY_SAVE_LAST_POSITION: &str = "save_last_position";
const KEY_TITLES: &str = "titles";

/// Durable key-value settings read at startup and written by each setter.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn book(&self) -> Result<Option<Book>>;
    async fn set_book(&self, book: &Book) -> Result<()>;
    async fn chapter(&self) -> Result<Option<u16>>;
    async fn set_chapter(&self, chapter: u16) -> Result<()>;
    async fn translation(&self) -> Result<Option<Translation>>;
    async fn set_translation(&self, translation: Translation) -> Result<()>;
    async fn save_last_position(&self) -> Result<bool>;
    async fn set_save_last_position(&self, enabled: bool) -> Result<()>;
    async fn titles(&self) -> Result<Vec<String>>;
    async fn set_titles(&self, titles: &[String]) -> Result<()>;
}

/// Persistence of the verse marking lists, always in `MarkColor::ALL` order.
#[async_trait]
pub trait MarkingFiles: Send + Sync {
    async fn load_files(&self) -> Result<MarkingLists>;
    async fn save_files(&self, lists: &MarkingLists) -> Result<()>;
}

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // Every connection to `sqlite::memory:` opens its own database.
        let pool_options = if database_url.starts_with("sqlite::memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(connect_options).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    async fn read_value<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let row = sqlx::query("SELECT value_json FROM reader_settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let raw: String = row.get(0);
        let value = serde_json::from_str(&raw)
            .with_context(|| format!("failed to decode setting '{key}'"))?;
        Ok(Some(value))
    }

    async fn write_value<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)
            .with_context(|| format!("failed to encode setting '{key}'"))?;
        sqlx::query(
            "INSERT INTO reader_settings (key, value_json, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
             ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json, updated_at = CURRENT_TIMESTAMP",
        )
        .bind(key)
        .bind(raw)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for Storage {
    async fn book(&self) -> Result<Option<Book>> {
        self.read_value(KEY_BOOK).await
    }

    async fn set_book(&self, book: &Book) -> Result<()> {
        self.write_value(KEY_BOOK, book).await
    }

    async fn chapter(&self) -> Result<Option<u16>> {
        self.read_value(KEY_CHAPTER).await
    }

    async fn set_chapter(&self, chapter: u16) -> Result<()> {
        self.write_value(KEY_CHAPTER, &chapter).await
    }

    async fn translation(&self) -> Result<Option<Translation>> {
        self.read_value(KEY_TRANSLATION).await
    }

    async fn set_translation(&self, translation: Translation) -> Result<()> {
        self.write_value(KEY_TRANSLATION, &translation).await
    }

    async fn save_last_position(&self) -> Result<bool> {
        Ok(self
            .read_value(KEY_SAVE_LAST_POSITION)
            .await?
            .unwrap_or(false))
    }

    async fn set_save_last_position(&self, enabled: bool) -> Result<()> {
        self.write_value(KEY_SAVE_LAST_POSITION, &enabled).await
    }

    async fn titles(&self) -> Result<Vec<String>> {
        Ok(self.read_value(KEY_TITLES).await?.unwrap_or_default())
    }

    async fn set_titles(&self, titles: &[String]) -> Result<()> {
        self.write_value(KEY_TITLES, titles).await
    }
}

#[async_trait]
impl MarkingFiles for Storage {
    async fn load_files(&self) -> Result<MarkingLists> {
        let rows = sqlx::query(
            "SELECT color, verse_json FROM verse_markings ORDER BY color ASC, position ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut lists = MarkingLists::default();
        for row in rows {
            let color: String = row.get(0);
            let raw: String = row.get(1);
            let color = MarkColor::from_str(&color)
                .map_err(|err| anyhow!("corrupt marking row: {err}"))?;
            let verse: Verse = serde_json::from_str(&raw)
                .with_context(|| format!("failed to decode {color} marking"))?;
            lists[color.position()].push(verse);
        }
        Ok(lists)
    }

    async fn save_files(&self, lists: &MarkingLists) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM verse_markings")
            .execute(&mut *tx)
            .await?;

        for (color, verses) in MarkColor::ALL.iter().zip(lists.iter()) {
            for (position, verse) in verses.iter().enumerate() {
                let raw = serde_json::to_string(verse)
                    .with_context(|| format!("failed to encode {color} marking"))?;
                sqlx::query(
                    "INSERT INTO verse_markings (color, position, global_index, verse_json) VALUES (?, ?, ?, ?)",
                )
                .bind(color.name())
                .bind(position as i64)
                .bind(verse.global_index() as i64)
                .bind(raw)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }
}

/// Creates the directory holding a file-backed SQLite database.
pub fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
