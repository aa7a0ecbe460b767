//! Product lookup response parsing.
//!
//! The service answers with a small XML document. A known code carries a
//! `<configCode>` element holding the product name (empty while the name is
//! not yet published); an unknown code carries an `<error>` element or no
//! `<configCode>` at all. Both are looked up among the root's direct children.
//!
//! Anything that is not well-formed XML is a parse error, so truncated or
//! substituted bodies are recorded as failed lookups and retried later.

use macmodels_core::Lookup;
use roxmltree::{Document, Node};

use super::LookupError;

/// Interpret a lookup response body.
pub fn parse_product(body: &str) -> Result<Lookup, LookupError> {
    if body.trim().is_empty() {
        return Err(LookupError::Parse("empty response".to_string()));
    }

    let document = Document::parse(body).map_err(|e| LookupError::Parse(e.to_string()))?;
    let root = document.root_element();

    if child(root, "error").is_some() {
        return Ok(Lookup::NotFound);
    }

    let Some(config_code) = child(root, "configCode") else {
        return Ok(Lookup::NotFound);
    };

    match config_code.text().map(str::trim) {
        Some(name) if !name.is_empty() => Ok(Lookup::Found(name.to_string())),
        _ => Ok(Lookup::Pending),
    }
}

fn child<'a, 'input>(parent: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    parent.children().find(|node| node.has_tag_name(name))
}
