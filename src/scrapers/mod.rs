//! Site scrapers for collecting and extracting opinion articles.
//!
//! Each scraper follows a consistent two-phase pattern:
//!
//! 1. **Indexing**: Discover article URLs from the section listing page
//! 2. **Fetching**: Download and extract article content from each URL
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | El País Opinión | [`elpais`] | JSON-LD with markup fallback | First five listing entries |
//!
//! # Common Patterns
//!
//! Scrapers use:
//! - Sequential fetching with `futures::stream` (one page at a time)
//! - Graceful error handling (failed fetches are logged and skipped)
//! - Pure extraction functions over parsed documents so each strategy can be
//!   exercised against synthetic fixtures

pub mod elpais;
