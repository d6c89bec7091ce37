//! Chapter fetch collaborator and its HTTP implementation.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::{Book, Verse},
    error::BibleError,
    protocol::ChapterResponse,
};
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterContent {
    pub verses: Vec<Verse>,
}

/// Turns a book/chapter/translation triple into chapter text.
///
/// Implementations own wire details, timeouts and any retry policy.
#[async_trait]
pub trait ChapterSource: Send + Sync {
    async fn fetch_chapter(
        &self,
        book: &Book,
        chapter: u16,
        translation_code: &str,
    ) -> std::result::Result<ChapterContent, BibleError>;
}

pub struct SzentirasClient {
    http: Client,
    base_url: Url,
}

impl SzentirasClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut base_url =
            Url::parse(base_url).with_context(|| format!("invalid api base url '{base_url}'"))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self { http, base_url })
    }

    pub fn chapter_url(
        &self,
        book: &Book,
        chapter: u16,
        translation_code: &str,
    ) -> std::result::Result<Url, url::ParseError> {
        self.base_url.join(&format!(
            "idezet/{}{chapter}/{translation_code}",
            book.abbreviation
        ))
    }
}

fn classify_transport_error(err: &reqwest::Error) -> BibleError {
    if err.is_decode() {
        BibleError::Parsing
    } else {
        BibleError::Network
    }
}

#[async_trait]
impl ChapterSource for SzentirasClient {
    async fn fetch_chapter(
        &self,
        book: &Book,
        chapter: u16,
        translation_code: &str,
    ) -> std::result::Result<ChapterContent, BibleError> {
        let url = self
            .chapter_url(book, chapter, translation_code)
            .map_err(|err| {
                warn!(book = %book.abbreviation, chapter, "cannot build chapter url: {err}");
                BibleError::Unknown
            })?;

        let body = async {
            self.http
                .get(url.clone())
                .send()
                .await?
                .error_for_status()?
                .bytes()
                .await
        }
        .await
        .map_err(|err| {
            warn!(%url, timeout = err.is_timeout(), "chapter request failed: {err}");
            classify_transport_error(&err)
        })?;

        let response: ChapterResponse = serde_json::from_slice(&body).map_err(|err| {
            warn!(%url, "chapter response could not be decoded: {err}");
            BibleError::Parsing
        })?;

        let verses = response.into_verses();
        debug!(%url, verses = verses.len(), "chapter decoded");
        Ok(ChapterContent { verses })
    }
}

#[cfg(test)]
#[path = "tests/source_tests.rs"]
mod tests;
