// src/extractors/name.rs
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;

use crate::extractors::search::{attribute, child_elements, describe, first_text, has_tag, search};
use crate::utils::Diagnostics;

const HEADING_TAG: &str = "h1";
const ITEM_KIND_ATTR: &str = "itemprop";
const ITEM_KIND_NAME: &str = "name";
const NAME_TEXT_TAG: &str = "span";

// Season suffix in the page heading, e.g. "Trae Young 2021-22 Game Log"
static SEASON_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r" [0-9]{4}-[0-9]{2}").expect("Failed to compile SEASON_SUFFIX_RE")
});

/// Extracts the player name from `<h1 itemprop="name"><span>...</span></h1>`.
///
/// The span text is cut right before the first season suffix (" 2021-22").
/// Returns `None` when the heading or its span is missing, the span has no
/// text, or the text carries no season suffix.
pub fn extract_player_name(root: ElementRef<'_>, diagnostics: &dyn Diagnostics) -> Option<String> {
    let heading = search(root, |el| {
        has_tag(el, HEADING_TAG) && attribute(el, ITEM_KIND_ATTR) == Some(ITEM_KIND_NAME)
    })?;

    let Some(span) = child_elements(heading, NAME_TEXT_TAG).next() else {
        diagnostics.warn(format_args!("name heading has no {} child: {}", NAME_TEXT_TAG, describe(&heading)));
        return None;
    };

    let text = first_text(&span).filter(|text| !text.is_empty())?;
    strip_season_suffix(&text, diagnostics)
}

fn strip_season_suffix(text: &str, diagnostics: &dyn Diagnostics) -> Option<String> {
    match SEASON_SUFFIX_RE.find(text) {
        Some(suffix) => Some(text[..suffix.start()].to_string()),
        None => {
            diagnostics.warn(format_args!("no season suffix in name heading text {:?}", text));
            None
        }
    }
}
