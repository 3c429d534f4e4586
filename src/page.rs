//! One parser per page shape. They see only response bodies, never the
//! session, so markup drift on one page stays inside one file.

pub mod content;
pub mod feed;
pub mod portal;

use scraper::{ElementRef, Node};

/// The first child node's text, like the anchor labels WebClass renders
/// before any nested markup. Falls back to the whole text.
pub(crate) fn leading_text(element: ElementRef) -> String {
    match element.first_child().map(|n| n.value()) {
        Some(Node::Text(text)) => (**text).to_owned(),
        _ => element.text().collect(),
    }
}
