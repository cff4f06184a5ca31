//! Character entity handling for the `.bsmx` dialect.
//!
//! BeerSmith writes HTML named entities (`&ldquo;`, `&auml;`, ...) into what
//! is otherwise XML, which no conforming XML parser accepts. The read side
//! repairs those before parsing ([`repair`]) and decodes whatever is left in
//! leaf text afterwards ([`decode_html`]). The write side ([`escape_text`])
//! produces text that survives any declared file encoding: markup characters
//! are escaped and every non-ASCII character becomes a numeric reference.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;

/// Named entities substituted before parsing, applied in this order.
pub const HTML_ENTITIES: &[(&str, &str)] = &[
    ("&ldquo;", "\""),
    ("&rdquo;", "\""),
    ("&lsquo;", "'"),
    ("&rsquo;", "'"),
    ("&ndash;", "-"),
    ("&mdash;", "--"),
    ("&nbsp;", " "),
    ("&auml;", "ä"),
    ("&ouml;", "ö"),
    ("&uuml;", "ü"),
    ("&Auml;", "Ä"),
    ("&Ouml;", "Ö"),
    ("&Uuml;", "Ü"),
    ("&szlig;", "ß"),
    ("&eacute;", "é"),
    ("&egrave;", "è"),
    ("&aacute;", "á"),
    ("&iacute;", "í"),
    ("&oacute;", "ó"),
    ("&uacute;", "ú"),
    ("&ntilde;", "ñ"),
    ("&copy;", "©"),
    ("&reg;", "®"),
    ("&trade;", "™"),
    ("&deg;", "°"),
    ("&plusmn;", "±"),
    ("&frac12;", "½"),
    ("&frac14;", "¼"),
    ("&frac34;", "¾"),
    ("&times;", "×"),
    ("&divide;", "÷"),
    ("&aring;", "å"),
    ("&Aring;", "Å"),
    ("&ordm;", "º"),
    ("&shy;", ""),
    ("&hellip;", "..."),
    ("&bull;", "•"),
    ("&middot;", "·"),
    ("&cedil;", "¸"),
    ("&ccedil;", "ç"),
    ("&Ccedil;", "Ç"),
];

static DECIMAL_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"&#(\d+);").unwrap());
static HEX_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"&#[xX]([0-9a-fA-F]+);").unwrap());

/// Pre-parse repair: substitute the named entity table, then resolve numeric
/// character references to literal characters.
pub fn repair(text: &str) -> String {
    let mut out = text.to_string();
    if out.contains('&') {
        for (entity, replacement) in HTML_ENTITIES {
            if out.contains(entity) {
                out = out.replace(entity, replacement);
            }
        }
    }
    resolve_numeric(&out).into_owned()
}

/// Resolve `&#NNN;` and `&#xHH;` references. References to invalid code
/// points are left as written.
pub fn resolve_numeric(text: &str) -> Cow<'_, str> {
    if !text.contains("&#") {
        return Cow::Borrowed(text);
    }
    let decimal = DECIMAL_REF.replace_all(text, |caps: &Captures| {
        caps[1]
            .parse::<u32>()
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });
    let hex = HEX_REF.replace_all(&decimal, |caps: &Captures| {
        u32::from_str_radix(&caps[1], 16)
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });
    Cow::Owned(hex.into_owned())
}

/// Longest entity name worth looking up (`&CounterClockwiseContourIntegral;`).
const MAX_ENTITY_LEN: usize = 32;

/// Decode HTML entities in leaf text. Unknown or unterminated references,
/// including bare `&`, are kept literally.
pub fn decode_html(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail[1..]
            .find(';')
            .filter(|&end| end > 0 && end <= MAX_ENTITY_LEN)
            .and_then(|end| resolve_reference(&tail[1..=end]).map(|s| (s, end + 2)));
        match decoded {
            Some((replacement, consumed)) => {
                out.push_str(&replacement);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn resolve_reference(name: &str) -> Option<String> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }
    quick_xml::escape::resolve_html5_entity(name).map(str::to_string)
}

/// Escape text for a generated fragment. Markup characters become entities;
/// every non-ASCII character becomes a decimal numeric reference.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c if c.is_ascii() => out.push(c),
            c => out.push_str(&format!("&#{};", c as u32)),
        }
    }
    out
}
