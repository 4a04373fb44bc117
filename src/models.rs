//! Data models for scraped articles and translated headlines.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Article`]: One opinion piece as extracted from an article page
//! - [`TitleTranslation`]: A headline paired with its English translation
//! - [`AnalysisReport`]: The output of one headline-analysis run

use serde::Serialize;

/// A single opinion article extracted from an article page.
///
/// An `Article` is a transient, per-run value: it is built once by the
/// extractor and never mutated afterwards. Construction goes through
/// [`Article::new`], which enforces that both title and content are present;
/// the image URL is optional because not every opinion piece carries a
/// qualifying image.
#[derive(Debug, Clone, Serialize)]
pub struct Article {
    /// The article headline.
    pub title: String,
    /// The article body, paragraphs joined with newlines.
    pub content: String,
    /// URL of the article's lead image, when one was found.
    pub image_url: Option<String>,
}

impl Article {
    /// Build an `Article`, refusing empty titles or bodies.
    ///
    /// Inputs are trimmed first; `None` is returned when either the title or
    /// the content trims down to nothing, so an extraction strategy that only
    /// partially succeeded can never produce a half-filled article.
    pub fn new(title: &str, content: &str, image_url: Option<String>) -> Option<Self> {
        let title = title.trim();
        let content = content.trim();
        if title.is_empty() || content.is_empty() {
            return None;
        }
        Some(Self {
            title: title.to_string(),
            content: content.to_string(),
            image_url,
        })
    }
}

/// An original headline paired with its translation.
#[derive(Debug, Clone, Serialize)]
pub struct TitleTranslation {
    /// The headline as published (Spanish).
    pub original: String,
    /// The translated headline (English); identical to `original` when the
    /// translation call failed.
    pub translated: String,
}

/// The result of analyzing one batch of translated headlines.
///
/// `frequent_words` holds every normalized word that appeared more than
/// twice across all translated titles, with its total count. The order of
/// the pairs is not significant.
#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    /// One entry per article, in article order.
    pub translations: Vec<TitleTranslation>,
    /// Words occurring more than twice across all translated titles.
    pub frequent_words: Vec<(String, usize)>,
}
