// src/bbref/links.rs
//! Link discovery over listing pages.
//!
//! The crawl goes teams index -> team season pages -> player gamelog pages.
//! These helpers only read markup; fetching lives in `client`.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use reqwest::Url;
use scraper::{Html, Selector};

static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("a[href]").expect("Failed to compile ANCHOR_SELECTOR")
});

const PLAYERS_PREFIX: &str = "/players/";
const PAGE_SUFFIX: &str = ".html";

fn hrefs(body: &str) -> Vec<String> {
    let document = Html::parse_document(body);
    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|a| a.value().attr("href"))
        .map(str::to_owned)
        .collect()
}

// Resolves against the page URL, dropping duplicates but keeping first-seen order.
fn resolve_unique<I>(page_url: &Url, candidates: I) -> Vec<Url>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for candidate in candidates {
        match page_url.join(&candidate) {
            Ok(url) => {
                if seen.insert(url.clone()) {
                    urls.push(url);
                }
            }
            Err(e) => tracing::debug!("Skipping unresolvable link '{}': {}", candidate, e),
        }
    }

    urls
}

/// Team season pages linked from the teams index, e.g. `/teams/ATL/2022.html`.
pub fn season_links(body: &str, page_url: &Url, season: &str) -> Vec<Url> {
    let suffix = format!("{}{}", season, PAGE_SUFFIX);
    let candidates = hrefs(body).into_iter().filter(|href| href.ends_with(&suffix));
    resolve_unique(page_url, candidates)
}

/// Gamelog pages of every player linked from a team season page.
///
/// `/players/y/youngtr01.html` becomes `/players/y/youngtr01/gamelog/2022`.
/// Pages whose URL is not for `season` yield nothing.
pub fn player_gamelog_links(body: &str, page_url: &Url, season: &str) -> Vec<Url> {
    if !page_url.as_str().contains(season) {
        return Vec::new();
    }

    let candidates = hrefs(body)
        .into_iter()
        .filter(|href| href.starts_with(PLAYERS_PREFIX) && href.ends_with(PAGE_SUFFIX))
        .map(|href| gamelog_path(&href, season));
    resolve_unique(page_url, candidates)
}

/// `/players/y/youngtr01.html` -> `/players/y/youngtr01/gamelog/2022`
pub fn gamelog_path(player_href: &str, season: &str) -> String {
    let player_path = player_href.replacen(PAGE_SUFFIX, "", 1);
    format!("{}/gamelog/{}", player_path, season)
}

pub fn is_gamelog_url(url: &Url, season: &str) -> bool {
    let url = url.as_str();
    url.contains("gamelog") && url.contains(season)
}
