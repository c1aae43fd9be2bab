// src/bbref/client.rs
use reqwest::header;
use reqwest::{StatusCode, Url};

use crate::bbref::models::CrawlSettings;
use crate::utils::error::FetchError;

/// Creates a reqwest client configured for basketball-reference.
pub fn build_client(settings: &CrawlSettings) -> Result<reqwest::Client, FetchError> {
    let client = reqwest::Client::builder()
        .user_agent(settings.user_agent.as_str())
        .build()?;
    Ok(client)
}

/// Downloads one page, waiting the configured delay first.
pub async fn fetch_page(client: &reqwest::Client, url: &Url, settings: &CrawlSettings) -> Result<String, FetchError> {
    // --- Politeness delay ---
    tokio::time::sleep(settings.request_delay).await;

    tracing::debug!("Fetching {}", url);
    let response = client
        .get(url.clone())
        .header(header::ACCEPT, "text/html,application/xhtml+xml,*/*")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        tracing::error!("HTTP error status: {} for URL: {}", status, url);
        return Err(status_error(status, url));
    }

    let body = response.text().await?;
    tracing::debug!("Successfully downloaded {} bytes from {}", body.len(), url);

    Ok(body)
}

fn status_error(status: StatusCode, url: &Url) -> FetchError {
    match status {
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
            tracing::warn!("Received {} - slow down the crawl (--delay-ms / --parallelism).", status);
            FetchError::RateLimited
        }
        StatusCode::NOT_FOUND => FetchError::PageNotFound(url.to_string()),
        _ => FetchError::Http(status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let url = Url::parse("https://www.basketball-reference.com/players/x/nobody01/gamelog/2022").unwrap();

        assert!(matches!(status_error(StatusCode::TOO_MANY_REQUESTS, &url), FetchError::RateLimited));
        assert!(matches!(status_error(StatusCode::FORBIDDEN, &url), FetchError::RateLimited));
        assert!(matches!(status_error(StatusCode::NOT_FOUND, &url), FetchError::PageNotFound(u) if u.contains("nobody01")));
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, &url),
            FetchError::Http(s) if s == StatusCode::BAD_GATEWAY
        ));
    }

    #[test]
    fn test_build_client() {
        let settings = CrawlSettings::new("2022", "https://www.basketball-reference.com").unwrap();
        assert!(build_client(&settings).is_ok());
    }
}
