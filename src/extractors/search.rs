// src/extractors/search.rs
//! Traversal primitive and lookup helpers shared by the extractors.
//!
//! All location logic in this crate is a predicate handed to [`search`]; the
//! tree is only ever read.

use scraper::ElementRef;

/// Pre-order depth-first search rooted at `root` (inclusive).
///
/// Returns the first element, in document order, for which `predicate` holds.
/// Text, comment and other non-element nodes are stepped over. The walk is
/// iterative, so deeply nested markup cannot exhaust the stack.
pub fn search<'a, P>(root: ElementRef<'a>, predicate: P) -> Option<ElementRef<'a>>
where
    P: Fn(&ElementRef<'a>) -> bool,
{
    root.descendants()
        .filter_map(ElementRef::wrap)
        .find(|element| predicate(element))
}

/// Element children of `element` with the given tag name, in order.
pub fn child_elements<'a>(element: ElementRef<'a>, tag: &'a str) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| child.value().name() == tag)
}

pub fn has_tag(element: &ElementRef<'_>, tag: &str) -> bool {
    element.value().name() == tag
}

pub fn attribute<'a>(element: &ElementRef<'a>, name: &str) -> Option<&'a str> {
    element.value().attr(name)
}

/// First text run inside `element`.
///
/// Nested markup is flattened and only the first contiguous text node is
/// kept: `<td><a>LeBron</a> James</td>` yields `"LeBron"`. Whitespace-only
/// runs count as text. Entities are already decoded by the parser.
pub fn first_text(element: &ElementRef<'_>) -> Option<String> {
    element.text().next().map(str::to_owned)
}

/// Short description of an element for diagnostics, e.g. `<th data-stat="pts">`.
pub fn describe(element: &ElementRef<'_>) -> String {
    let value = element.value();
    let mut out = format!("<{}", value.name());
    for (name, val) in value.attrs() {
        out.push_str(&format!(" {}=\"{}\"", name, val));
    }
    out.push('>');
    out
}
