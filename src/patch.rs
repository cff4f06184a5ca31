//! Surgical text patching.
//!
//! Library files are never re-serialized. Writes splice new text into the
//! original file text and leave every other byte alone, so fields this crate
//! does not model survive a round trip through the host application.
//!
//! Two operations:
//!
//! - [`append_to_folder`]: insert a fragment into a named folder, creating
//!   the folder wrapper when it does not exist yet
//! - [`update_fields`]: replace the values of selected fields inside one
//!   located entity span
//!
//! When a new folder is needed its position is found with the configured
//! anchor patterns. If none matches the operation fails instead of guessing.

use regex::Regex;
use std::ops::Range;

use crate::entities::{decode_html, escape_text};
use crate::error::{Result, WriteError};
use crate::fragment::render_value;
use crate::schema::{EntitySchema, FieldValue};

const FOLDER_OPEN: &str = "<Table>";
const FOLDER_CLOSE: &str = "</Table>";
const DATA_OPEN: &str = "<Data>";
const DATA_CLOSE: &str = "</Data>";

/// Folder wrapper with the companion fields the host application expects
/// on every folder.
pub fn folder_wrapper(name: &str, modified: &str, fragment: &str) -> String {
    format!(
        "<Table><_PERMID_>0</_PERMID_>\n\
         <_MOD_>{modified}</_MOD_>\n\
         <Name>{name}</Name>\n\
         <Type>7372</Type>\n\
         <Dirty>1</Dirty>\n\
         <Owndata>1</Owndata>\n\
         <TID>7372</TID>\n\
         <Size>1</Size>\n\
         <_XName>Table</_XName>\n\
         <Allocinc>16</Allocinc>\n\
         <Data>{fragment}\n\
         </Data></Table>",
        modified = modified,
        name = escape_text(name),
        fragment = fragment,
    )
}

/// Splice `fragment` into the folder called `folder`.
///
/// An existing folder receives the fragment just before the close of its
/// data container. Otherwise a new folder wrapper is inserted at the start
/// of the first anchor match.
pub fn append_to_folder(
    text: &str,
    folder: &str,
    fragment: &str,
    anchors: &[Regex],
    modified: &str,
) -> Result<String> {
    if let Some(at) = find_folder_data_end(text, folder) {
        tracing::debug!(folder, offset = at, "appending to existing folder");
        return Ok(splice(text, at, &format!("{}\n", fragment)));
    }

    let at = anchors
        .iter()
        .find_map(|anchor| anchor.find(text).map(|m| m.start()))
        .ok_or_else(|| WriteError::AnchorNotFound {
            folder: folder.to_string(),
        })?;
    tracing::debug!(folder, offset = at, "creating folder wrapper");
    Ok(splice(text, at, &folder_wrapper(folder, modified, fragment)))
}

/// Offset of the `</Data>` closing the data container of the folder with
/// the given name, if that folder exists.
fn find_folder_data_end(text: &str, folder: &str) -> Option<usize> {
    let mut search_from = 0;
    while let Some(rel) = text[search_from..].find(FOLDER_OPEN) {
        let start = search_from + rel;
        search_from = start + FOLDER_OPEN.len();

        let body = &text[search_from..];
        let Some(data_rel) = body.find(DATA_OPEN) else {
            continue;
        };
        // The name must sit in the folder header, before its data container.
        let header = &body[..data_rel];
        if header.contains(FOLDER_OPEN) || header.contains(FOLDER_CLOSE) {
            continue;
        }
        let Some(name) = between(header, "<Name>", "</Name>") else {
            continue;
        };
        if decode_html(name).trim() != folder {
            continue;
        }

        let data_start = search_from + data_rel + DATA_OPEN.len();
        return matching_close(text, data_start, DATA_OPEN, DATA_CLOSE);
    }
    None
}

/// Offset of the close tag balancing an open tag that ended at `from`.
fn matching_close(text: &str, from: usize, open: &str, close: &str) -> Option<usize> {
    let mut depth = 1usize;
    let mut pos = from;
    loop {
        let rest = &text[pos..];
        let next_close = rest.find(close)?;
        match rest.find(open) {
            Some(next_open) if next_open < next_close => {
                depth += 1;
                pos += next_open + open.len();
            }
            _ => {
                depth -= 1;
                if depth == 0 {
                    return Some(pos + next_close);
                }
                pos += next_close + close.len();
            }
        }
    }
}

fn between<'a>(text: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let start = text.find(open)? + open.len();
    let end = text[start..].find(close)? + start;
    Some(&text[start..end])
}

fn splice(text: &str, at: usize, insert: &str) -> String {
    let mut out = String::with_capacity(text.len() + insert.len());
    out.push_str(&text[..at]);
    out.push_str(insert);
    out.push_str(&text[at..]);
    out
}

/// Byte range of the first element of `schema`'s kind whose name equals
/// `name` (case-insensitive, entities decoded).
pub fn locate_entity(text: &str, schema: &EntitySchema, name: &str) -> Option<Range<usize>> {
    let name_open = format!("<{}>", schema.name_tag());
    let name_close = format!("</{}>", schema.name_tag());
    let open = format!("<{}>", schema.element);
    let close = format!("</{}>", schema.element);
    let wanted = name.trim().to_lowercase();

    let mut search_from = 0;
    while let Some(rel) = text[search_from..].find(&name_open) {
        let name_at = search_from + rel;
        let value_start = name_at + name_open.len();
        search_from = value_start;

        let Some(value_len) = text[value_start..].find(&name_close) else {
            break;
        };
        let value = decode_html(&text[value_start..value_start + value_len]);
        if value.trim().to_lowercase() != wanted {
            continue;
        }

        let Some(start) = text[..name_at].rfind(&open) else {
            continue;
        };
        // A close between the element start and the name means the name
        // belongs to some other element.
        if text[start..name_at].contains(&close) {
            continue;
        }
        let Some(end_rel) = text[value_start..].find(&close) else {
            continue;
        };
        return Some(start..value_start + end_rel + close.len());
    }
    None
}

/// Replace the values of `changes` inside one entity span.
///
/// Each field's tag comes from the schema; the first `<TAG>...</TAG>` (or
/// `<TAG/>`) in the span is rewritten and all other bytes are kept.
pub fn update_fields(
    span: &str,
    schema: &EntitySchema,
    entity_name: &str,
    changes: &[(String, FieldValue)],
) -> Result<String> {
    let mut out = span.to_string();
    for (field, value) in changes {
        let tag = schema.tag_for(field);
        let rendered = render_value(value);
        out = replace_tag(&out, &tag, &rendered).ok_or_else(|| WriteError::FieldNotFound {
            kind: schema.kind,
            name: entity_name.to_string(),
            tag: tag.clone(),
        })?;
    }
    Ok(out)
}

fn replace_tag(span: &str, tag: &str, value: &str) -> Option<String> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let empty = format!("<{}/>", tag);

    let full = span.find(&open).and_then(|start| {
        let value_start = start + open.len();
        span[value_start..]
            .find(&close)
            .map(|len| (start, value_start + len + close.len()))
    });
    let short = span.find(&empty).map(|start| (start, start + empty.len()));

    let (start, end) = match (full, short) {
        (Some(f), Some(s)) => {
            if f.0 < s.0 {
                f
            } else {
                s
            }
        }
        (Some(f), None) => f,
        (None, Some(s)) => s,
        (None, None) => return None,
    };

    let mut out = String::with_capacity(span.len() + value.len());
    out.push_str(&span[..start]);
    out.push_str(&format!("{}{}{}", open, value, close));
    out.push_str(&span[end..]);
    Some(out)
}
