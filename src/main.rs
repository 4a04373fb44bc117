//! # Opinion Trends
//!
//! A scraping and analysis pipeline that collects the first five opinion
//! pieces from El País, extracts title/body/image for each via structured
//! data with a markup fallback, downloads the article images, translates the
//! headlines to English through a remote API, and reports which words repeat
//! across the translated headlines.
//!
//! ## Usage
//!
//! ```sh
//! RAPIDAPI_KEY=... opinion_trends -i ./images
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Indexing**: Collect the first five unique headline links from the
//!    opinion listing page
//! 2. **Fetching**: Download each article page and extract an [`models::Article`]
//!    (JSON-LD first, markup fallback second), saving its image when present
//! 3. **Analysis**: Translate each headline and count repeated words
//! 4. **Output**: Print the articles, the translation pairs, and the
//!    word-frequency report to the console

use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod analysis;
mod api;
mod cli;
mod images;
mod models;
mod scrapers;
mod utils;

use api::{RapidTranslateClient, RetryTranslate, TranslatorConfig};
use cli::Cli;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("opinion_trends starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.section_url, ?args.images_dir, args.max_articles, "Parsed CLI arguments");

    // Early check: ensure the images dir is writable
    if let Err(e) = ensure_writable_dir(&args.images_dir).await {
        error!(
            path = %args.images_dir,
            error = %e,
            "Image output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let client = reqwest::Client::new();

    // ---- Index and fetch articles ----
    // An unreachable listing page is the one fatal failure of the run.
    let article_urls =
        scrapers::elpais::index_articles(&client, &args.section_url, args.max_articles).await?;

    let articles = scrapers::elpais::fetch_articles(&client, article_urls, &args.images_dir).await;
    info!(count = articles.len(), "Total articles collected");

    for article in &articles {
        println!("Title: {}", article.title);
        println!("Content: {}", article.content);
        println!(
            "Image URL: {}",
            article.image_url.as_deref().unwrap_or("(none)")
        );
        println!();
    }

    // ---- Translate headlines and count repeated words ----
    let translator_config = TranslatorConfig {
        api_key: args.rapidapi_key.clone(),
        source_lang: args.source_lang.clone(),
        target_lang: args.target_lang.clone(),
    };
    let translator = RetryTranslate::new(
        RapidTranslateClient {
            client: &client,
            config: &translator_config,
        },
        3,
        Duration::from_secs(1),
    );

    let report = analysis::analyze_titles(&translator, &articles).await;
    if let Ok(json) = serde_json::to_string(&report) {
        debug!(report = %json, "Analysis report");
    }
    print!("{}", analysis::render_report(&report));

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
