use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Result};
use clap::Parser;
use reader_core::{
    config::{load_settings, load_settings_from, prepare_database_url},
    ReaderSession, SessionOptions, SzentirasClient,
};
use shared::{catalog::Catalog, domain::Translation};
use storage::Storage;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Opens a passage, optionally marks one verse, and prints the chapter.
#[derive(Parser, Debug)]
struct Args {
    /// Settings file; defaults to ./reader.toml.
    #[arg(long)]
    config: Option<PathBuf>,
    /// KG, RUF, KNB or SZIT.
    #[arg(long)]
    translation: Option<Translation>,
    /// Book abbreviation in the translation's canon, e.g. "Jn".
    #[arg(long)]
    book: Option<String>,
    #[arg(long)]
    chapter: Option<u16>,
    /// Verse number in the opened chapter to mark.
    #[arg(long, requires = "color")]
    mark: Option<u16>,
    #[arg(long)]
    color: Option<String>,
    /// Remember the opened passage for the next start.
    #[arg(long)]
    remember: Option<bool>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => load_settings_from(path, |key| std::env::var(key).ok()),
        None => load_settings(),
    };
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Arc::new(Storage::new(&database_url).await?);
    storage.health_check().await?;
    let source = Arc::new(SzentirasClient::new(
        &settings.api_base_url,
        settings.request_timeout(),
    )?);
    info!(api = %settings.api_base_url, database = %database_url, "reader starting");

    let (session, initial) = ReaderSession::start(
        storage.clone(),
        storage,
        source,
        SessionOptions {
            catalog: Arc::new(Catalog::standard().clone()),
            title_debounce: settings.title_debounce(),
        },
    )
    .await?;
    initial.await?;

    if let Some(enabled) = args.remember {
        session.set_save_last_position(enabled).await;
    }

    if let Some(translation) = args.translation {
        if let Some(fetch) = session.set_translation(translation).await {
            fetch.await?;
        }
    }

    match (&args.book, args.chapter) {
        (Some(abbreviation), chapter) => {
            let canon = session.snapshot().translation.canon();
            let book = session
                .catalog()
                .book_by_abbreviation(canon, abbreviation)
                .cloned()
                .ok_or_else(|| anyhow!("no book '{abbreviation}' in the {canon:?} canon"))?;
            session
                .select_passage(book, chapter.unwrap_or(1))
                .await?
                .await?;
        }
        (None, Some(chapter)) => {
            session.set_chapter(chapter).await?.await?;
        }
        (None, None) => {}
    }

    if let (Some(number), Some(color)) = (args.mark, &args.color) {
        let verse = session
            .snapshot()
            .verses
            .into_iter()
            .find(|verse| verse.location.verse_number() == Some(number))
            .ok_or_else(|| anyhow!("verse {number} is not in the opened chapter"))?;
        session.mark_verse(verse, color).await?;
    }

    print_chapter(&session);
    session.shutdown().await;
    Ok(())
}

fn print_chapter(session: &ReaderSession) {
    let snapshot = session.snapshot();
    println!(
        "{} {} ({})",
        snapshot.book.name,
        snapshot.chapter,
        snapshot.translation.display_name()
    );

    if let Some(err) = &snapshot.error {
        eprintln!("{err}");
        return;
    }

    for verse in &snapshot.verses {
        let number = verse
            .location
            .verse_number()
            .map(|n| n.to_string())
            .unwrap_or_else(|| verse.location.reference.clone());
        match snapshot.markings.color_of(verse.global_index()) {
            Some(color) => println!("{number} [{color}] {}", verse.text),
            None => println!("{number} {}", verse.text),
        }
    }
}
