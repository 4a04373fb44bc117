//! Best-effort download of article images.
//!
//! Images are saved under a fixed output directory with deterministic names
//! derived from the article's position on the listing page. A failed download
//! is logged by the caller and never aborts the run; the article keeps its
//! image URL either way.

use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// El País serves bare requests a 403, so pretend to be a browser arriving
/// from the site itself.
const USER_AGENT: &str = "Mozilla/5.0";
const REFERER: &str = "https://elpais.com/";

/// Deterministic image file name for the article at a 1-based listing position.
pub fn image_file_name(index: usize) -> String {
    format!("article_{index}.jpg")
}

/// Download one image and save it under `images_dir`.
///
/// # Arguments
///
/// * `client` - Shared HTTP client
/// * `image_url` - Absolute URL of the image
/// * `images_dir` - Existing output directory
/// * `file_name` - Target file name, from [`image_file_name`]
///
/// # Returns
///
/// `Ok(())` once the file is written, or the first error hit while fetching
/// or saving. Callers treat any error as non-fatal.
#[instrument(level = "info", skip_all, fields(%image_url, file_name))]
pub async fn download_image(
    client: &reqwest::Client,
    image_url: &str,
    images_dir: &str,
    file_name: &str,
) -> Result<(), Box<dyn Error>> {
    let response = client
        .get(image_url)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .header(reqwest::header::REFERER, REFERER)
        .send()
        .await?
        .error_for_status()?;

    let bytes = response.bytes().await?;
    let path = Path::new(images_dir).join(file_name);
    fs::write(&path, &bytes).await?;

    info!(bytes = bytes.len(), path = %path.display(), "Saved article image");
    Ok(())
}
