//! El País opinion section scraper.
//!
//! This module scrapes opinion pieces from [El País](https://elpais.com/opinion/).
//! Article pages carry schema.org JSON-LD blocks with already-cleaned headline
//! and body text, so extraction prefers those and only falls back to walking
//! the rendered markup when no usable block is present.
//!
//! # Extraction strategies
//!
//! 1. **JSON-LD**: scan every `script[type='application/ld+json']` block for
//!    one holding both `headline` and `articleBody`.
//! 2. **Markup fallback**: the page's `h1` for the title, every `main p` for
//!    the body, and the first `main img` served from the El País image host.
//!
//! The two strategies are never mixed for one article.

use crate::images;
use crate::models::Article;
use crate::utils::truncate_for_log;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use scraper::{Html, Selector};
use serde::Deserialize;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Host that serves El País article imagery; used to qualify fallback images.
pub const IMAGE_HOST: &str = "imagenes.elpais.com";

/// Index the opinion listing page to extract article URLs.
///
/// Fetches the listing page, checks that it looks like the expected section
/// (title mentions the section, at least one `<article>` container present),
/// and collects up to `limit` unique headline links in first-seen order.
///
/// # Returns
///
/// A vector of at most `limit` absolute article URLs, or an error if the
/// listing page fetch fails. An unreachable listing page is the one fatal
/// condition of the whole run.
#[instrument(level = "info", skip(client))]
pub async fn index_articles(
    client: &reqwest::Client,
    section_url: &str,
    limit: usize,
) -> Result<Vec<String>, Box<dyn Error>> {
    let base_url = Url::parse(section_url)?;

    let html = client
        .get(section_url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    let document = Html::parse_document(&html);

    if !listing_looks_ready(&document) {
        warn!(
            url = section_url,
            "Listing page is missing its expected markers; continuing anyway"
        );
    }

    let article_urls = collect_links(&document, &base_url, limit);

    info!(
        count = article_urls.len(),
        source = section_url,
        "Indexed opinion article URLs"
    );
    debug!(urls = ?article_urls, "Opinion URLs");

    Ok(article_urls)
}

/// Check the markers the listing page is expected to carry: a `<title>`
/// mentioning the opinion section and at least one `<article>` container.
fn listing_looks_ready(document: &Html) -> bool {
    let title_selector = Selector::parse("title").unwrap();
    let article_selector = Selector::parse("article").unwrap();

    let title_ok = document
        .select(&title_selector)
        .next()
        .map(|t| t.text().collect::<String>().contains("Opini"))
        .unwrap_or(false);
    let has_articles = document.select(&article_selector).next().is_some();

    title_ok && has_articles
}

/// Collect up to `limit` unique headline links from a parsed listing page.
///
/// Iterates `<article>` containers in document order, takes each one's
/// `h2 a[href]` headline link, resolves it against `base_url`, and keeps
/// first-seen order while dropping duplicates. Containers without a headline
/// link are skipped.
pub fn collect_links(document: &Html, base_url: &Url, limit: usize) -> Vec<String> {
    let container_selector = Selector::parse("article").unwrap();
    let headline_selector = Selector::parse("h2 a[href]").unwrap();

    document
        .select(&container_selector)
        .filter_map(|container| {
            let link = container
                .select(&headline_selector)
                .next()
                .and_then(|a| a.value().attr("href"));
            match link {
                Some(href) => match base_url.join(href) {
                    Ok(resolved) => Some(resolved.to_string()),
                    Err(e) => {
                        debug!(href, error = %e, "Skipping unresolvable headline link");
                        None
                    }
                },
                None => {
                    debug!("Skipping article container without a headline link");
                    None
                }
            }
        })
        .unique()
        .take(limit)
        .collect()
}

/// The subset of a schema.org JSON-LD block the extractor cares about.
///
/// `image` is kept as a raw value because El País emits it either as a plain
/// URL string or as an `ImageObject` carrying a `url` field.
#[derive(Debug, Deserialize)]
struct JsonLdArticle {
    headline: Option<String>,
    #[serde(rename = "articleBody")]
    article_body: Option<String>,
    image: Option<serde_json::Value>,
}

impl JsonLdArticle {
    /// Resolve the image URL, trying the `ImageObject` form first and
    /// falling back to a direct string.
    fn image_url(&self) -> Option<String> {
        let image = self.image.as_ref()?;
        if let Some(url) = image.get("url").and_then(|u| u.as_str()) {
            return Some(url.to_string());
        }
        image.as_str().map(str::to_string)
    }
}

/// Extract an article from the page's JSON-LD blocks (preferred strategy).
///
/// Scans every `script[type='application/ld+json']` block in document order.
/// Blocks whose raw text does not mention `articleBody` are skipped before
/// any JSON parsing; blocks that fail to parse, or that parse but lack a
/// headline or body, are skipped as well. The first block yielding both a
/// non-empty title and body wins.
pub fn extract_from_json_ld(document: &Html) -> Option<Article> {
    let script_selector = Selector::parse("script[type='application/ld+json']").unwrap();

    for script in document.select(&script_selector) {
        let raw = script.text().collect::<String>();

        // Cheap check before handing the block to the JSON parser
        if !raw.contains("articleBody") {
            continue;
        }

        let block: JsonLdArticle = match serde_json::from_str(raw.trim()) {
            Ok(block) => block,
            Err(e) => {
                debug!(
                    error = %e,
                    block = %truncate_for_log(raw.trim(), 120),
                    "Skipping unparseable JSON-LD block"
                );
                continue;
            }
        };

        let (Some(title), Some(content)) = (block.headline.as_deref(), block.article_body.as_deref())
        else {
            continue;
        };

        if let Some(article) = Article::new(title, content, block.image_url()) {
            return Some(article);
        }
    }

    None
}

/// Extract an article from the rendered markup (fallback strategy).
///
/// Title comes from the page's `h1`, the body from every paragraph under
/// `main` joined with newlines, and the image from the first `main img`
/// whose src is served by [`IMAGE_HOST`]. Returns `None` when the title or
/// body resolve empty.
pub fn extract_from_html(document: &Html) -> Option<Article> {
    let heading_selector = Selector::parse("h1").unwrap();
    let paragraph_selector = Selector::parse("main p").unwrap();
    let image_selector = Selector::parse("main img[src]").unwrap();

    let title = document
        .select(&heading_selector)
        .next()?
        .text()
        .collect::<String>();

    let content = document
        .select(&paragraph_selector)
        .map(|p| p.text().collect::<String>().trim().to_string())
        .join("\n");

    let image_url = document
        .select(&image_selector)
        .filter_map(|img| img.value().attr("src"))
        .find(|src| src.contains(IMAGE_HOST))
        .map(str::to_string);

    Article::new(&title, &content, image_url)
}

/// Run the extraction policy for one article page: JSON-LD first, markup
/// fallback second. Fields from the two strategies are never mixed.
pub fn extract_article(document: &Html) -> Option<Article> {
    if let Some(article) = extract_from_json_ld(document) {
        debug!("Extracted article from JSON-LD");
        return Some(article);
    }

    let article = extract_from_html(document);
    if article.is_some() {
        debug!("Extracted article from markup fallback");
    }
    article
}

/// Fetch all collected article pages sequentially.
///
/// Pages are processed one at a time in link order. A page whose extraction
/// fails, or whose fetch errors out, is logged and skipped without failing
/// the batch. When an extracted article carries an image URL, the image is
/// downloaded once, named after the link's 1-based position.
#[instrument(level = "info", skip_all)]
pub async fn fetch_articles(
    client: &reqwest::Client,
    urls: Vec<String>,
    images_dir: &str,
) -> Vec<Article> {
    let articles: Vec<Article> = stream::iter(urls.into_iter().enumerate())
        .then(|(i, url)| async move {
            match fetch_article(client, &url).await {
                Ok(Some(article)) => {
                    debug!(%url, "Fetched opinion article");
                    if let Some(image_url) = article.image_url.as_deref() {
                        let file_name = images::image_file_name(i + 1);
                        if let Err(e) =
                            images::download_image(client, image_url, images_dir, &file_name).await
                        {
                            warn!(error = %e, image_url, file_name = %file_name, "Image download failed");
                        }
                    }
                    Some(article)
                }
                Ok(None) => {
                    warn!(%url, "Neither extraction strategy produced an article");
                    None
                }
                Err(e) => {
                    error!(error = %e, %url, "Failed to process article page");
                    None
                }
            }
        })
        .filter_map(std::future::ready)
        .collect()
        .await;

    info!(count = articles.len(), "Fetched opinion articles");
    articles
}

/// Fetch and extract a single opinion article.
#[instrument(level = "info", skip_all, fields(%url))]
async fn fetch_article(
    client: &reqwest::Client,
    url: &str,
) -> Result<Option<Article>, Box<dyn Error>> {
    let body = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    let document = Html::parse_document(&body);

    let article = extract_article(&document);
    if let Some(ref article) = article {
        info!(
            title = %article.title,
            content_preview = %truncate_for_log(&article.content, 120),
            has_image = article.image_url.is_some(),
            "Parsed opinion article"
        );
    }
    Ok(article)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://elpais.com/opinion/").unwrap()
    }

    fn listing_html(hrefs: &[&str]) -> String {
        let items = hrefs
            .iter()
            .map(|href| {
                format!(
                    r#"<article><h2><a href="{}">Headline</a></h2><p>standfirst</p></article>"#,
                    href
                )
            })
            .collect::<String>();
        format!(
            "<html><head><title>Opinión en EL PAÍS</title></head><body>{}</body></html>",
            items
        )
    }

    #[test]
    fn test_collect_links_caps_at_limit() {
        let html = listing_html(&["/a", "/b", "/c", "/d", "/e", "/f", "/g"]);
        let document = Html::parse_document(&html);

        let links = collect_links(&document, &base(), 5);
        assert_eq!(links.len(), 5);
        assert_eq!(links[0], "https://elpais.com/a");
        assert_eq!(links[4], "https://elpais.com/e");
    }

    #[test]
    fn test_collect_links_dedupes_preserving_order() {
        let html = listing_html(&["/a", "/b", "/a", "/c", "/b", "/d"]);
        let document = Html::parse_document(&html);

        let links = collect_links(&document, &base(), 5);
        assert_eq!(
            links,
            vec![
                "https://elpais.com/a",
                "https://elpais.com/b",
                "https://elpais.com/c",
                "https://elpais.com/d",
            ]
        );
    }

    #[test]
    fn test_collect_links_skips_containers_without_headline() {
        let html = r#"<html><body>
            <article><p>No link in here</p></article>
            <article><h2><a href="/only">Headline</a></h2></article>
        </body></html>"#;
        let document = Html::parse_document(html);

        let links = collect_links(&document, &base(), 5);
        assert_eq!(links, vec!["https://elpais.com/only"]);
    }

    #[test]
    fn test_collect_links_empty_listing() {
        let document = Html::parse_document("<html><body></body></html>");
        assert!(collect_links(&document, &base(), 5).is_empty());
    }

    #[test]
    fn test_listing_looks_ready() {
        let ready = Html::parse_document(&listing_html(&["/a"]));
        assert!(listing_looks_ready(&ready));

        let wrong_title = Html::parse_document(
            "<html><head><title>Portada</title></head><body><article></article></body></html>",
        );
        assert!(!listing_looks_ready(&wrong_title));

        let no_articles = Html::parse_document(
            "<html><head><title>Opinión</title></head><body></body></html>",
        );
        assert!(!listing_looks_ready(&no_articles));
    }

    fn page_with_json_ld(block: &str) -> Html {
        Html::parse_document(&format!(
            r#"<html><head><script type="application/ld+json">{}</script></head>
            <body><h1>Markup title</h1><main><p>Markup body.</p></main></body></html>"#,
            block
        ))
    }

    #[test]
    fn test_json_ld_extraction_prefers_structured_data() {
        let document = page_with_json_ld(
            r#"{"@type":"NewsArticle","headline":"La crisis que viene","articleBody":"Cuerpo del artículo.","image":{"@type":"ImageObject","url":"https://imagenes.elpais.com/foto.jpg"}}"#,
        );

        let article = extract_article(&document).unwrap();
        assert_eq!(article.title, "La crisis que viene");
        assert_eq!(article.content, "Cuerpo del artículo.");
        assert_eq!(
            article.image_url.as_deref(),
            Some("https://imagenes.elpais.com/foto.jpg")
        );
    }

    #[test]
    fn test_json_ld_image_as_direct_string() {
        let document = page_with_json_ld(
            r#"{"headline":"Titular","articleBody":"Cuerpo.","image":"https://imagenes.elpais.com/directa.jpg"}"#,
        );

        let article = extract_from_json_ld(&document).unwrap();
        assert_eq!(
            article.image_url.as_deref(),
            Some("https://imagenes.elpais.com/directa.jpg")
        );
    }

    #[test]
    fn test_json_ld_without_image() {
        let document =
            page_with_json_ld(r#"{"headline":"Titular","articleBody":"Cuerpo."}"#);

        let article = extract_from_json_ld(&document).unwrap();
        assert!(article.image_url.is_none());
    }

    #[test]
    fn test_json_ld_skips_blocks_without_article_body() {
        let html = r#"<html><head>
            <script type="application/ld+json">{"@type":"BreadcrumbList","itemListElement":[]}</script>
            <script type="application/ld+json">{"headline":"Segundo bloque","articleBody":"Cuerpo."}</script>
        </head><body></body></html>"#;
        let document = Html::parse_document(html);

        let article = extract_from_json_ld(&document).unwrap();
        assert_eq!(article.title, "Segundo bloque");
    }

    #[test]
    fn test_json_ld_skips_malformed_blocks() {
        let html = r#"<html><head>
            <script type="application/ld+json">{"articleBody": broken</script>
            <script type="application/ld+json">{"headline":"Bueno","articleBody":"Cuerpo."}</script>
        </head><body></body></html>"#;
        let document = Html::parse_document(html);

        let article = extract_from_json_ld(&document).unwrap();
        assert_eq!(article.title, "Bueno");
    }

    #[test]
    fn test_json_ld_requires_both_headline_and_body() {
        let document = page_with_json_ld(r#"{"articleBody":"Cuerpo sin titular."}"#);
        assert!(extract_from_json_ld(&document).is_none());
    }

    #[test]
    fn test_markup_fallback_joins_paragraphs() {
        let html = r#"<html><body>
            <h1> El titular </h1>
            <main>
                <p>Primer párrafo.</p>
                <p>Segundo párrafo.</p>
            </main>
        </body></html>"#;
        let document = Html::parse_document(html);

        let article = extract_from_html(&document).unwrap();
        assert_eq!(article.title, "El titular");
        assert_eq!(article.content, "Primer párrafo.\nSegundo párrafo.");
        assert!(article.image_url.is_none());
    }

    #[test]
    fn test_markup_fallback_picks_first_qualifying_image() {
        let html = r#"<html><body>
            <h1>Titular</h1>
            <main>
                <p>Cuerpo.</p>
                <img src="https://cdn.example.com/ad.gif">
                <img src="https://imagenes.elpais.com/primera.jpg">
                <img src="https://imagenes.elpais.com/segunda.jpg">
            </main>
        </body></html>"#;
        let document = Html::parse_document(html);

        let article = extract_from_html(&document).unwrap();
        assert_eq!(
            article.image_url.as_deref(),
            Some("https://imagenes.elpais.com/primera.jpg")
        );
    }

    #[test]
    fn test_markup_fallback_without_heading_yields_none() {
        let html = "<html><body><main><p>Cuerpo.</p></main></body></html>";
        let document = Html::parse_document(html);
        assert!(extract_from_html(&document).is_none());
    }

    #[test]
    fn test_fallback_used_when_no_usable_json_ld() {
        let html = r#"<html><head>
            <script type="application/ld+json">{"@type":"WebPage","name":"Opinión"}</script>
        </head><body>
            <h1>Desde el markup</h1>
            <main><p>Cuerpo del artículo.</p></main>
        </body></html>"#;
        let document = Html::parse_document(html);

        let article = extract_article(&document).unwrap();
        assert_eq!(article.title, "Desde el markup");
        assert_eq!(article.content, "Cuerpo del artículo.");
    }

    #[test]
    fn test_extract_article_none_when_both_strategies_fail() {
        let html = "<html><body><p>Nothing useful here.</p></body></html>";
        let document = Html::parse_document(html);
        assert!(extract_article(&document).is_none());
    }

    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    type Routes = HashMap<String, (u16, String)>;
    type Hits = Arc<Mutex<HashMap<String, usize>>>;

    /// Minimal one-request-per-connection HTTP server for driving the fetch
    /// loop without leaving the test. Routes are built against the bound
    /// address so fixture pages can link back to the server.
    async fn spawn_site<F>(build_routes: F) -> (String, Hits)
    where
        F: FnOnce(&str) -> Routes,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let routes = Arc::new(build_routes(&base));
        let hits: Hits = Arc::new(Mutex::new(HashMap::new()));

        let hits_accept = Arc::clone(&hits);
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let routes = Arc::clone(&routes);
                let hits = Arc::clone(&hits_accept);
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let n = stream.read(&mut buf).await.unwrap_or(0);
                    let request = String::from_utf8_lossy(&buf[..n]).to_string();
                    let path = request
                        .split_whitespace()
                        .nth(1)
                        .unwrap_or("/")
                        .to_string();
                    *hits.lock().unwrap().entry(path.clone()).or_insert(0) += 1;

                    let (status, body) = routes
                        .get(&path)
                        .cloned()
                        .unwrap_or((404, String::new()));
                    let reason = if status == 200 { "OK" } else { "Error" };
                    let response = format!(
                        "HTTP/1.1 {status} {reason}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        (base, hits)
    }

    fn json_ld_page(block: String) -> (u16, String) {
        (
            200,
            format!(
                r#"<html><head><script type="application/ld+json">{}</script></head><body></body></html>"#,
                block
            ),
        )
    }

    #[tokio::test]
    async fn test_fetch_articles_isolates_failures_and_downloads_once() {
        let (base, hits) = spawn_site(|base| {
            HashMap::from([
                (
                    "/articles/1".to_string(),
                    json_ld_page(format!(
                        r#"{{"headline":"Primero","articleBody":"Cuerpo.","image":"{base}/img/primera.jpg"}}"#
                    )),
                ),
                (
                    "/articles/2".to_string(),
                    (200, "<html><body><p>nada utilizable</p></body></html>".to_string()),
                ),
                ("/articles/3".to_string(), (500, String::new())),
                (
                    "/articles/4".to_string(),
                    json_ld_page(r#"{"headline":"Cuarto","articleBody":"Cuerpo."}"#.to_string()),
                ),
                ("/img/primera.jpg".to_string(), (200, "jpegdata".to_string())),
            ])
        })
        .await;

        let images_dir = std::env::temp_dir().join("opinion_trends_fetch_test");
        let _ = std::fs::remove_dir_all(&images_dir);
        std::fs::create_dir_all(&images_dir).unwrap();

        let client = reqwest::Client::new();
        let urls = (1..=4).map(|i| format!("{base}/articles/{i}")).collect();
        let articles = fetch_articles(&client, urls, images_dir.to_str().unwrap()).await;

        // Unusable and erroring pages are skipped without aborting the batch
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "Primero");
        assert_eq!(articles[1].title, "Cuarto");

        // One download for the image-bearing article, named by link position
        assert_eq!(hits.lock().unwrap().get("/img/primera.jpg"), Some(&1));
        assert!(images_dir.join("article_1.jpg").is_file());
        assert_eq!(
            std::fs::read(images_dir.join("article_1.jpg")).unwrap(),
            b"jpegdata"
        );
        // The imageless article triggers no download
        assert!(!images_dir.join("article_4.jpg").exists());

        let _ = std::fs::remove_dir_all(&images_dir);
    }
}
