//! Translated-headline analysis: translation, normalization, word counting.
//!
//! One analysis run translates every collected headline in order, normalizes
//! the translated text down to lowercase letters and spaces, and counts how
//! often each word of three or more letters appears across all headlines.
//! Words occurring more than twice make the report. The count map lives only
//! for the duration of the run.

use crate::api::TranslateAsync;
use crate::models::{AnalysisReport, Article, TitleTranslation};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::{info, instrument, warn};

/// Words shorter than this are discarded as noise.
const MIN_WORD_LEN: usize = 3;
/// A word must occur more than this many times to be reported.
const REPEAT_THRESHOLD: usize = 2;

/// Everything that is not an ASCII letter or a space gets stripped before
/// counting.
static NON_LETTERS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z ]").unwrap());

/// Normalize a headline for counting: lowercase, then strip every character
/// that is not a letter or a space.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(normalize_title("Gaza: A Deep Crisis"), "gaza a deep crisis");
/// ```
pub fn normalize_title(title: &str) -> String {
    NON_LETTERS
        .replace_all(&title.to_lowercase(), "")
        .into_owned()
}

/// Count normalized words of length ≥ 3 across a set of titles.
///
/// Counts accumulate across all titles; the map is rebuilt from scratch on
/// every call, so re-running the same input yields the same counts.
pub fn count_words<'a, I>(titles: I) -> HashMap<String, usize>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts = HashMap::new();

    for title in titles {
        for word in normalize_title(title).split_whitespace() {
            if word.len() < MIN_WORD_LEN {
                continue;
            }
            *counts.entry(word.to_string()).or_insert(0) += 1;
        }
    }

    counts
}

/// Filter a count map down to the words occurring more than twice.
///
/// Pair order follows map iteration and is not significant.
pub fn frequent_words(counts: &HashMap<String, usize>) -> Vec<(String, usize)> {
    counts
        .iter()
        .filter(|&(_, &count)| count > REPEAT_THRESHOLD)
        .map(|(word, &count)| (word.clone(), count))
        .collect()
}

/// Translate every article title and build the word-frequency report.
///
/// Titles are translated one at a time, in article order. A failed
/// translation degrades to the original headline, which still contributes
/// its words to the count.
#[instrument(level = "info", skip_all, fields(count = articles.len()))]
pub async fn analyze_titles<T>(translator: &T, articles: &[Article]) -> AnalysisReport
where
    T: TranslateAsync<Response = String>,
{
    let mut translations = Vec::with_capacity(articles.len());

    for article in articles {
        let translated = match translator.translate(&article.title).await {
            Ok(translated) => translated,
            Err(e) => {
                warn!(
                    error = %e,
                    title = %article.title,
                    "Translation failed; keeping original headline"
                );
                article.title.clone()
            }
        };
        translations.push(TitleTranslation {
            original: article.title.clone(),
            translated,
        });
    }

    let counts = count_words(translations.iter().map(|t| t.translated.as_str()));
    let frequent_words = frequent_words(&counts);

    info!(
        titles = translations.len(),
        repeated_words = frequent_words.len(),
        "Headline analysis complete"
    );

    AnalysisReport {
        translations,
        frequent_words,
    }
}

/// Render the analysis report for the console.
pub fn render_report(report: &AnalysisReport) -> String {
    let mut out = String::new();

    for translation in &report.translations {
        out.push_str(&format!("Original title: {}\n", translation.original));
        out.push_str(&format!("Translated title: {}\n", translation.translated));
    }

    out.push_str("\nWords repeated more than twice:\n");
    for (word, count) in &report.frequent_words {
        out.push_str(&format!("{word} → {count}\n"));
    }

    out
}
