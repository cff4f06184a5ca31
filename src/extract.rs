//! Typed catalog extraction.
//!
//! Catalog files keep their items inside generic `Data` containers, which
//! may nest. [`extract_all`] visits every container in the document, maps
//! each direct child with the entity's element tag to a record and validates
//! it. A failing item is logged and dropped; it never stops its siblings.
//!
//! [`recover_duplicate_roots`] is a second pass below the tree for files
//! where the producing application repeated a top-level element, or wrote
//! bare items with no container at all. It works
//! on raw text and merges by name, so running it over items the tree pass
//! already found is harmless.

use crate::document::{Document, NodeId};
use crate::record::{self, to_record};
use crate::schema::{Entity, ValidationError};

/// Tag of the generic item-holder element.
pub const CONTAINER: &str = "Data";

/// Map and validate one element, then hydrate its owned sub-entities.
pub fn parse_entity<E: Entity>(doc: &Document, id: NodeId) -> Result<E, ValidationError> {
    let record = to_record(doc, id);
    let mut entity = E::from_record(&record)?;
    entity.hydrate(doc, id);
    Ok(entity)
}

/// Every valid `E` directly inside any container of the document.
pub fn extract_all<E: Entity>(doc: &Document) -> Vec<E> {
    let schema = E::SCHEMA;
    let mut items = Vec::new();
    for container in doc.descendants_named(CONTAINER) {
        for item in doc.find_children(container, schema.element) {
            let record = to_record(doc, item);
            match E::from_record(&record) {
                Ok(mut entity) => {
                    entity.hydrate(doc, item);
                    items.push(entity);
                }
                Err(e) => {
                    let name = record::label(&record, &schema.name_tag().to_lowercase());
                    tracing::warn!(
                        kind = schema.kind,
                        name = %name,
                        error = %e,
                        "failed to parse {} '{}'",
                        schema.element,
                        name
                    );
                }
            }
        }
    }
    items
}

/// Spans of `<Tag>...</Tag>` after the first closing tag in the text.
///
/// The text is cut at every `</Tag>`; each piece after the first that opens
/// the tag yields the span from that opening to the closing tag that ended
/// the piece. A trailing piece with no closing tag is closed synthetically.
pub fn extra_root_spans(text: &str, tag: &str) -> Vec<String> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let pieces: Vec<&str> = text.split(close.as_str()).collect();
    let mut spans = Vec::new();
    for piece in pieces.iter().skip(1) {
        if let Some(start) = piece.find(open.as_str()) {
            let mut span = piece[start..].to_string();
            span.push_str(&close);
            spans.push(span);
        }
    }
    spans
}

/// Span from the first `<Tag>` to the first `</Tag>` after it.
///
/// In a container file this is the outer root cut short, which carries no
/// item name. In a file of bare item fragments it is the first item.
pub fn first_root_span(text: &str, tag: &str) -> Option<String> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = text.find(open.as_str())?;
    let end = start + text[start..].find(close.as_str())? + close.len();
    Some(text[start..end].to_string())
}

/// Parse top-level occurrences of `E`'s element from raw text and add those
/// whose name is not already present (case-insensitive). Spans without a
/// name field, such as a container root, are skipped.
pub fn recover_duplicate_roots<E: Entity>(text: &str, items: &mut Vec<E>) {
    let schema = E::SCHEMA;
    let name_key = schema.name_tag().to_lowercase();
    let spans = first_root_span(text, schema.element)
        .into_iter()
        .chain(extra_root_spans(text, schema.element));
    for span in spans {
        let Some(doc) = Document::parse(&span) else {
            continue;
        };
        let Some(root) = doc.root() else {
            continue;
        };
        let record = to_record(&doc, root);
        if !record.contains_key(&name_key) {
            continue;
        }
        match E::from_record(&record) {
            Ok(mut entity) => {
                let duplicate = items
                    .iter()
                    .any(|existing| existing.name().eq_ignore_ascii_case(entity.name()));
                if duplicate {
                    continue;
                }
                entity.hydrate(&doc, root);
                tracing::debug!(kind = schema.kind, name = entity.name(), "recovered extra root element");
                items.push(entity);
            }
            Err(e) => {
                tracing::debug!(kind = schema.kind, error = %e, "skipping malformed extra root element");
            }
        }
    }
}
