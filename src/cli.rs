//! Command-line interface definitions for Opinion Trends.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! All arguments can be provided via command-line flags or environment variables.

use clap::Parser;

/// Command-line arguments for the Opinion Trends application.
///
/// This struct defines all configuration options that can be passed to the
/// application at runtime: the section to scrape, where images land, how
/// many articles to collect, and the translation credentials/languages.
///
/// # Examples
///
/// ```sh
/// # Basic usage, key taken from the environment
/// RAPIDAPI_KEY=... opinion_trends
///
/// # Custom image directory and article cap
/// opinion_trends -i ./images -n 5 --rapidapi-key YOUR_KEY
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// URL of the opinion section listing page
    #[arg(short, long, default_value = "https://elpais.com/opinion/")]
    pub section_url: String,

    /// Output directory for downloaded article images
    #[arg(short, long, default_value = "images")]
    pub images_dir: String,

    /// Maximum number of articles to collect from the listing page
    #[arg(short = 'n', long, default_value_t = 5)]
    pub max_articles: usize,

    /// RapidAPI key for the translation service
    #[arg(long, env = "RAPIDAPI_KEY")]
    pub rapidapi_key: String,

    /// Language the scraped headlines are written in
    #[arg(long, default_value = "es")]
    pub source_lang: String,

    /// Language to translate headlines into
    #[arg(long, default_value = "en")]
    pub target_lang: String,
}
