use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::parser;

/// HTTP client shared by every request of a run.
pub fn client(cfg: &Config) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.http_timeout_secs))
        .user_agent(cfg.user_agent.as_str())
        .build()?;
    Ok(client)
}

/// GET a page and return its body. Any non-success status is a fetch error.
pub async fn fetch_page(client: &reqwest::Client, url: &str) -> Result<String> {
    let resp = client.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(AppError::Fetch(format!("GET {url} returned {status}")));
    }
    let body = resp.text().await?;
    debug!("Fetched {url} ({} bytes)", body.len());
    Ok(body)
}

/// Follow the item page to its screenshot and store the image in `dir`
/// under the image's own file name. Returns the written path.
pub async fn download_screenshot(
    client: &reqwest::Client,
    base_url: &str,
    item_url: &str,
    dir: &Path,
) -> Result<PathBuf> {
    let page = fetch_page(client, item_url).await?;
    let image_url = parser::parse_screenshot_url(&page, base_url)?;
    let file_name = image_file_name(&image_url)
        .ok_or_else(|| AppError::Fetch(format!("screenshot URL {image_url} has no file name")))?;

    let resp = client.get(&image_url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(AppError::Fetch(format!("GET {image_url} returned {status}")));
    }
    let bytes = resp.bytes().await?;

    let path = dir.join(file_name);
    tokio::fs::write(&path, &bytes).await?;
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(path)
}

/// Last path segment of a URL, without query or fragment.
fn image_file_name(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next()?;
    path.rsplit('/').next().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_is_last_segment() {
        assert_eq!(
            image_file_name("https://distrowatch.com/images/ufiles/mx.png"),
            Some("mx.png")
        );
        assert_eq!(image_file_name("https://x.org/a/b.jpg?size=big#top"), Some("b.jpg"));
        assert_eq!(image_file_name("https://x.org/a/"), None);
    }
}
