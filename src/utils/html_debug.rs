// src/utils/html_debug.rs
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::utils::error::AppError;

/// Markup the gamelog extractor keys on, tagged with the highlight class to use.
pub const GAMELOG_DEBUG_PATTERNS: &[(&str, &str)] = &[
    (r#"(?i)<div[^>]*id=['"]?all_pgl_basic['"]?[^>]*>"#, "container"),
    (r"(?i)<table\b[^>]*>", "table"),
    (r#"(?i)<tr[^>]*class=['"]?[^'">]*\bthead\b[^'">]*['"]?[^>]*>"#, "divider"),
    (r#"(?i)<h1[^>]*itemprop=['"]?name['"]?[^>]*>"#, "name"),
];

/// Saves a HTML snippet to a file with debug highlights
pub fn save_debug_html(html: &str, filename: &Path, highlights: &[(usize, usize, &str)]) -> Result<(), AppError> {
    let mut file = File::create(filename)?;

    let mut debug_html = String::from("<!DOCTYPE html>\n<html>\n<head>\n<style>\n");
    debug_html.push_str(".highlight-container { background-color: #FFFF00; }\n");
    debug_html.push_str(".highlight-table { background-color: #90EE90; }\n");
    debug_html.push_str(".highlight-divider { background-color: #FFA500; }\n");
    debug_html.push_str(".highlight-name { background-color: #ADD8E6; }\n");
    debug_html.push_str(".highlight-custom { background-color: #FFC0CB; }\n");
    debug_html.push_str("</style>\n</head>\n<body>\n<pre>\n");

    let mut last_pos = 0;
    let mut sorted_highlights = highlights.to_vec();
    sorted_highlights.sort_by_key(|h| h.0); // Sort by position

    for (start, end, highlight_type) in sorted_highlights {
        // Overlapping matches keep the earlier one
        if start < last_pos || end > html.len() {
            continue;
        }

        push_escaped(&mut debug_html, &html[last_pos..start]);

        let css_class = match highlight_type {
            "container" => "highlight-container",
            "table" => "highlight-table",
            "divider" => "highlight-divider",
            "name" => "highlight-name",
            _ => "highlight-custom",
        };

        debug_html.push_str(&format!("<span class=\"{}\" title=\"Position: {}-{}, Type: {}\">",
            css_class, start, end, highlight_type));
        push_escaped(&mut debug_html, &html[start..end]);
        debug_html.push_str("</span>");

        last_pos = end;
    }

    if last_pos < html.len() {
        push_escaped(&mut debug_html, &html[last_pos..]);
    }

    debug_html.push_str("\n</pre>\n</body>\n</html>");

    file.write_all(debug_html.as_bytes())?;

    tracing::info!("Saved debug HTML to {}", filename.display());
    Ok(())
}

/// Creates a debug version of an HTML document with locations of specified regex patterns highlighted
pub fn create_debug_html(html: &str, filename: &Path, patterns: &[(&str, &str)]) -> Result<(), AppError> {
    let mut highlights = Vec::new();

    for (pattern, highlight_type) in patterns {
        let re = Regex::new(pattern).map_err(|e| {
            AppError::Config(format!("Invalid regex pattern '{}': {}", pattern, e))
        })?;

        for mat in re.find_iter(html) {
            highlights.push((mat.start(), mat.end(), *highlight_type));
        }
    }

    save_debug_html(html, filename, &highlights)
}

/// Dumps a page that failed extraction into `{debug_dir}/{page_key}.html`.
pub fn dump_failed_page(html: &str, debug_dir: &Path, page_key: &str) -> Result<PathBuf, AppError> {
    fs::create_dir_all(debug_dir)?;

    let file_stem: String = page_key
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    let path = debug_dir.join(format!("{}.html", file_stem.trim_matches('_')));

    create_debug_html(html, &path, GAMELOG_DEBUG_PATTERNS)?;
    Ok(path)
}

// Page source is shown as text, so markup has to be escaped.
fn push_escaped(out: &mut String, raw: &str) {
    for c in raw.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_page_dump_highlights_markers() {
        let dir = tempfile::tempdir().unwrap();
        let html = r#"<h1 itemprop="name"><span>X</span></h1><div id="all_pgl_basic"><table></table></div>"#;

        let path = dump_failed_page(html, dir.path(), "https://example.com/players/y/youngtr01/gamelog/2022").unwrap();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("html"));

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("highlight-container\" title"));
        assert!(written.contains("highlight-table\" title"));
        assert!(written.contains("highlight-name\" title"));
        assert!(written.contains("&lt;span&gt;X&lt;/span&gt;"));
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = create_debug_html("<p></p>", &dir.path().join("x.html"), &[("(", "custom")]);
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
