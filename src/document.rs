//! Arena document tree and the error-recovering parser that builds it.
//!
//! The tree is a flat `Vec` of [`Element`]s addressed by [`NodeId`]. Parent
//! links live in a separate index built during the parse, so nodes never own
//! each other cyclically. A document may hold several top-level elements:
//! BeerSmith occasionally repeats a root element, and those extra roots are
//! kept as additional [`Document::roots`] rather than rejected.
//!
//! # Recovery
//!
//! Events come from `quick-xml` with end-name checking disabled. On top of
//! that the builder applies these rules:
//!
//! - an end tag closes the nearest open element with the same name, implicitly
//!   closing anything opened after it
//! - an end tag matching no open element is ignored
//! - elements still open at end of input are closed
//! - a `<` that cannot start markup (`alpha < 6`) is read as text
//! - on a syntax error the reader is restarted at the next `<` after the
//!   failing markup and the tree keeps growing from the current open element
//!
//! Parsing only fails when no element at all could be recovered.

use std::borrow::Cow;

use quick_xml::events::Event;
use quick_xml::Reader;

/// Index of an element inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// A single element: tag name, text content and ordered children.
#[derive(Debug, Clone)]
pub struct Element {
    pub tag: String,
    pub text: Option<String>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct Document {
    nodes: Vec<Element>,
    parents: Vec<Option<NodeId>>,
    roots: Vec<NodeId>,
}

impl Document {
    /// Parse text with error recovery. Returns `None` only if nothing could
    /// be recovered.
    pub fn parse(text: &str) -> Option<Document> {
        let repaired = escape_stray_lt(text);
        let text: &str = &repaired;
        let mut builder = Builder::default();
        let mut offset = 0usize;

        while offset < text.len() {
            let input = &text[offset..];
            let mut reader = Reader::from_str(input);
            {
                let config = reader.config_mut();
                config.check_end_names = false;
                config.allow_unmatched_ends = true;
                config.check_comments = false;
            }

            let mut markup_start = 0usize;
            match builder.consume(&mut reader, &mut markup_start) {
                Ok(()) => break,
                Err(err) => {
                    let failed = offset + markup_start;
                    tracing::debug!(offset = failed, error = %err, "recovering from malformed markup");
                    let mut from = (failed + 1).min(text.len());
                    while !text.is_char_boundary(from) {
                        from += 1;
                    }
                    offset = text[from..].find('<').map_or(text.len(), |i| from + i);
                }
            }
        }

        if builder.doc.roots.is_empty() {
            return None;
        }
        Some(builder.doc)
    }

    /// Top-level elements in document order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// First top-level element.
    pub fn root(&self) -> Option<NodeId> {
        self.roots.first().copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn element(&self, id: NodeId) -> &Element {
        &self.nodes[id.0]
    }

    pub fn tag(&self, id: NodeId) -> &str {
        &self.nodes[id.0].tag
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.0].text.as_deref()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents[id.0]
    }

    /// First direct child with the given tag.
    pub fn find_child(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&c| self.tag(c) == tag)
    }

    /// All direct children with the given tag.
    pub fn find_children<'a>(
        &'a self,
        id: NodeId,
        tag: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.children(id)
            .iter()
            .copied()
            .filter(move |&c| self.tag(c) == tag)
    }

    /// Text of the first direct child with the given tag.
    pub fn child_text(&self, id: NodeId, tag: &str) -> Option<&str> {
        self.find_child(id, tag).and_then(|c| self.text(c))
    }

    /// Every element with the given tag, roots included, in document order.
    pub fn descendants_named(&self, tag: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if self.tag(id) == tag {
                out.push(id);
            }
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// True if `id` is one of the top-level elements.
    pub fn is_root(&self, id: NodeId) -> bool {
        self.parent(id).is_none()
    }
}

#[derive(Default)]
struct Builder {
    doc: Document,
    open: Vec<NodeId>,
}

impl Builder {
    /// Feed events into the tree until end of input. `markup_start` tracks
    /// where the event being read began, so a failure can be skipped.
    fn consume(
        &mut self,
        reader: &mut Reader<&[u8]>,
        markup_start: &mut usize,
    ) -> quick_xml::Result<()> {
        loop {
            *markup_start = reader.buffer_position() as usize;
            match reader.read_event()? {
                Event::Start(e) => {
                    let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    let id = self.push_element(tag);
                    self.open.push(id);
                }
                Event::Empty(e) => {
                    let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    self.push_element(tag);
                }
                Event::End(e) => {
                    let name = e.name();
                    let name = String::from_utf8_lossy(name.as_ref());
                    self.close(&name);
                }
                Event::Text(e) => {
                    let raw = String::from_utf8_lossy(&e);
                    let text = match quick_xml::escape::unescape(&raw) {
                        Ok(unescaped) => unescaped.into_owned(),
                        Err(_) => raw.replace("&lt;", "<"),
                    };
                    self.push_text(&text);
                }
                Event::CData(e) => {
                    let text = String::from_utf8_lossy(&e).into_owned();
                    self.push_text(&text);
                }
                Event::Eof => return Ok(()),
                _ => {}
            }
        }
    }

    fn push_element(&mut self, tag: String) -> NodeId {
        let id = NodeId(self.doc.nodes.len());
        let parent = self.open.last().copied();
        self.doc.nodes.push(Element {
            tag,
            text: None,
            children: Vec::new(),
        });
        self.doc.parents.push(parent);
        match parent {
            Some(p) => self.doc.nodes[p.0].children.push(id),
            None => self.doc.roots.push(id),
        }
        id
    }

    fn close(&mut self, name: &str) {
        if let Some(pos) = self
            .open
            .iter()
            .rposition(|&id| self.doc.nodes[id.0].tag == name)
        {
            self.open.truncate(pos);
        }
    }

    fn push_text(&mut self, text: &str) {
        let Some(&top) = self.open.last() else {
            return;
        };
        let node = &mut self.doc.nodes[top.0];
        match node.text.as_mut() {
            Some(existing) => existing.push_str(text),
            None => node.text = Some(text.to_string()),
        }
    }
}

/// Replace every `<` that cannot open a tag, end tag, comment or
/// declaration with `&lt;`.
fn escape_stray_lt(text: &str) -> Cow<'_, str> {
    let opens_markup = |next: Option<char>| match next {
        Some(c) => c.is_alphabetic() || matches!(c, '_' | ':' | '/' | '!' | '?'),
        None => false,
    };

    let mut chars = text.char_indices().peekable();
    let mut out: Option<String> = None;
    let mut copied = 0usize;
    while let Some((i, c)) = chars.next() {
        if c != '<' || opens_markup(chars.peek().map(|&(_, n)| n)) {
            continue;
        }
        let buf = out.get_or_insert_with(|| String::with_capacity(text.len() + 16));
        buf.push_str(&text[copied..i]);
        buf.push_str("&lt;");
        copied = i + 1;
    }
    match out {
        Some(mut buf) => {
            buf.push_str(&text[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(text),
    }
}
