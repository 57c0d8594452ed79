// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Lossless streaming tokenizer for XHTML, OPF and NCX documents, built on
// quick-xml.
//
// Produces a lazy, forward-only stream of text, tag and special events. Each
// event keeps a borrow of the exact source bytes it came from, so a pass that
// leaves an event untouched re-emits it byte for byte. Tags whose attributes
// were changed are rebuilt from name, kind and attributes instead.
//
// Attribute values are kept exactly as written (still entity-encoded); see
// `escape` for conversion to and from plain text.

use accessaide_core::error::{AccessAideError, Result};
use quick_xml::events::{BytesStart, Event as XmlEvent};
use quick_xml::reader::Reader;

/// Kind of an element tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// `<name ...>`
    Begin,
    /// `</name>`
    End,
    /// `<name .../>`
    Single,
    /// `<?xml ...?>`
    XmlHeader,
}

impl TagKind {
    /// Begin or self-closing: the tags that carry attributes of an element.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Begin | Self::Single)
    }
}

/// Markup that is passed through verbatim and never modified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialKind {
    Comment,
    CData,
    Doctype,
    Instruction,
}

/// Ordered attribute list with change tracking.
///
/// Only a real change marks the list modified; setting an attribute to the
/// value it already has leaves the tag's original bytes in use.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
    modified: bool,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value of the first attribute called `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Set `name` to `value`, replacing in place or appending.
    ///
    /// Returns `true` when the list actually changed.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> bool {
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) if *existing == value => false,
            Some((_, existing)) => {
                *existing = value;
                self.modified = true;
                true
            }
            None => {
                self.entries.push((name.to_owned(), value));
                self.modified = true;
                true
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any `set` call changed the list since it was parsed.
    pub fn is_modified(&self) -> bool {
        self.modified
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            modified: false,
        }
    }
}

/// Character data between tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text<'a> {
    /// Raw text, entities untouched.
    pub content: &'a str,
    /// Dotted, lower-cased chain of enclosing elements (`html.head.title`).
    pub path: String,
}

impl Text<'_> {
    /// Whitespace only.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// An element tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag<'a> {
    /// Qualified name as written (`navPoint`, `dc:language`).
    pub name: String,
    pub kind: TagKind,
    pub attrs: Attributes,
    /// Dotted, lower-cased chain of ancestors, excluding the tag itself.
    pub path: String,
    raw: &'a str,
}

impl<'a> Tag<'a> {
    /// Name without namespace prefix.
    pub fn local_name(&self) -> &str {
        self.name
            .rsplit_once(':')
            .map_or(self.name.as_str(), |(_, local)| local)
    }

    pub fn is_open(&self) -> bool {
        self.kind.is_open()
    }

    /// The exact source text of this tag.
    pub fn raw(&self) -> &'a str {
        self.raw
    }

    /// Append this tag's markup: the source bytes if unchanged, otherwise a
    /// rebuilt tag.
    pub fn write_markup(&self, out: &mut String) {
        if self.attrs.is_modified() {
            out.push_str(&serialize_tag(&self.name, self.kind, &self.attrs));
        } else {
            out.push_str(self.raw);
        }
    }

    pub fn to_markup(&self) -> String {
        let mut out = String::with_capacity(self.raw.len());
        self.write_markup(&mut out);
        out
    }
}

/// Comment, CDATA section, doctype or processing instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Special<'a> {
    pub kind: SpecialKind,
    pub raw: &'a str,
    pub path: String,
}

/// One event of the token stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<'a> {
    Text(Text<'a>),
    Tag(Tag<'a>),
    Special(Special<'a>),
}

impl Event<'_> {
    pub fn path(&self) -> &str {
        match self {
            Event::Text(text) => &text.path,
            Event::Tag(tag) => &tag.path,
            Event::Special(special) => &special.path,
        }
    }

    /// Append this event's markup to `out`.
    pub fn write_markup(&self, out: &mut String) {
        match self {
            Event::Text(text) => out.push_str(text.content),
            Event::Tag(tag) => tag.write_markup(out),
            Event::Special(special) => out.push_str(special.raw),
        }
    }
}

/// Build the markup for a tag from its parts.
///
/// Values are written as stored (already encoded); a value containing a double
/// quote is wrapped in single quotes.
pub fn serialize_tag(name: &str, kind: TagKind, attrs: &Attributes) -> String {
    let mut out = String::with_capacity(name.len() + 4 + attrs.len() * 16);
    match kind {
        TagKind::End => {
            out.push_str("</");
            out.push_str(name);
            out.push('>');
            return out;
        }
        TagKind::XmlHeader => out.push_str("<?"),
        TagKind::Begin | TagKind::Single => out.push('<'),
    }
    out.push_str(name);
    for (attr, value) in attrs.iter() {
        let quote = if value.contains('"') { '\'' } else { '"' };
        out.push(' ');
        out.push_str(attr);
        out.push('=');
        out.push(quote);
        out.push_str(value);
        out.push(quote);
    }
    match kind {
        TagKind::Single => out.push_str("/>"),
        TagKind::XmlHeader => out.push_str("?>"),
        _ => out.push('>'),
    }
    out
}

/// Streaming tokenizer over a markup string.
///
/// A thin layer over `quick_xml::reader::Reader`: each event is sliced from
/// the source between the previous and the current buffer position, so the
/// concatenated slices always reproduce the input. Runs of text and entity
/// references are joined into a single text event.
///
/// ```ignore
/// let mut out = String::new();
/// for event in Tokenizer::new(xhtml) {
///     event?.write_markup(&mut out);
/// }
/// assert_eq!(out, xhtml);
/// ```
pub struct Tokenizer<'a> {
    src: &'a str,
    reader: Reader<&'a [u8]>,
    pos: usize,
    /// Event read ahead while joining text, with its end offset.
    pending: Option<(XmlEvent<'a>, usize)>,
    /// Open elements, lower-cased.
    stack: Vec<String>,
    done: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(src: &'a str) -> Self {
        let mut reader = Reader::from_str(src);
        let config = reader.config_mut();
        config.trim_text(false);
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
        config.allow_dangling_amp = true;
        Self {
            src,
            reader,
            pos: 0,
            pending: None,
            stack: Vec::new(),
            done: false,
        }
    }

    /// Byte offset just past the last event returned.
    pub fn offset(&self) -> usize {
        self.pos
    }

    fn path(&self) -> String {
        self.stack.join(".")
    }

    /// Next raw event starting at `start`, with the offset just past it.
    fn read_raw(&mut self, start: usize) -> Result<(XmlEvent<'a>, usize)> {
        let event = self
            .reader
            .read_event()
            .map_err(|err| markup_error(start, err.to_string()))?;
        let end = usize::try_from(self.reader.buffer_position())
            .unwrap_or(usize::MAX)
            .min(self.src.len());
        Ok((event, end))
    }

    fn next_event(&mut self) -> Result<Option<Event<'a>>> {
        let start = self.pos;
        let (event, end) = match self.pending.take() {
            Some(pending) => pending,
            None => self.read_raw(start)?,
        };

        let event = match event {
            XmlEvent::Eof => return Ok(None),
            XmlEvent::Text(_) | XmlEvent::GeneralRef(_) => {
                let mut end = end;
                loop {
                    let (next, next_end) = self.read_raw(end)?;
                    if matches!(next, XmlEvent::Text(_) | XmlEvent::GeneralRef(_)) {
                        end = next_end;
                    } else {
                        self.pending = Some((next, next_end));
                        break;
                    }
                }
                self.pos = end;
                return Ok(Some(Event::Text(Text {
                    content: &self.src[start..end],
                    path: self.path(),
                })));
            }
            XmlEvent::Start(e) => {
                let name = utf8(e.name().as_ref(), start)?.to_owned();
                let attrs = element_attributes(&e, start)?;
                let path = self.path();
                self.stack.push(name.to_ascii_lowercase());
                tag(name, TagKind::Begin, attrs, path, &self.src[start..end])
            }
            XmlEvent::Empty(e) => {
                let name = utf8(e.name().as_ref(), start)?.to_owned();
                let attrs = element_attributes(&e, start)?;
                tag(name, TagKind::Single, attrs, self.path(), &self.src[start..end])
            }
            XmlEvent::End(e) => {
                let name = utf8(e.name().as_ref(), start)?.to_owned();
                self.close_element(&name);
                tag(name, TagKind::End, Attributes::new(), self.path(), &self.src[start..end])
            }
            XmlEvent::Decl(_) => {
                let raw = &self.src[start..end];
                let (name, attrs) = declaration(raw, start)?;
                tag(name, TagKind::XmlHeader, attrs, self.path(), raw)
            }
            XmlEvent::PI(_) => self.special(SpecialKind::Instruction, start, end),
            XmlEvent::DocType(_) => self.special(SpecialKind::Doctype, start, end),
            XmlEvent::Comment(_) => self.special(SpecialKind::Comment, start, end),
            XmlEvent::CData(_) => self.special(SpecialKind::CData, start, end),
        };
        self.pos = end;
        Ok(Some(event))
    }

    fn special(&self, kind: SpecialKind, start: usize, end: usize) -> Event<'a> {
        Event::Special(Special {
            kind,
            raw: &self.src[start..end],
            path: self.path(),
        })
    }

    /// Pop the element stack back to and including `name`. A stray end tag
    /// with no matching open element leaves the stack alone.
    fn close_element(&mut self, name: &str) {
        let lower = name.to_ascii_lowercase();
        if let Some(idx) = self.stack.iter().rposition(|open| *open == lower) {
            self.stack.truncate(idx);
        }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Result<Event<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let event = self.next_event();
        if !matches!(event, Ok(Some(_))) {
            self.done = true;
        }
        event.transpose()
    }
}

fn tag<'a>(name: String, kind: TagKind, attrs: Attributes, path: String, raw: &'a str) -> Event<'a> {
    Event::Tag(Tag {
        name,
        kind,
        attrs,
        path,
        raw,
    })
}

/// Attributes of an element. Names are trimmed; values are kept raw.
/// Valueless and unquoted attributes are accepted.
fn element_attributes(element: &BytesStart<'_>, offset: usize) -> Result<Attributes> {
    let mut attributes = element.html_attributes();
    attributes.with_checks(false);
    attributes
        .map(|attr| -> Result<(String, String)> {
            let attr = attr.map_err(|err| markup_error(offset, err.to_string()))?;
            let name = utf8(attr.key.as_ref(), offset)?.trim().to_owned();
            let value = utf8(&attr.value, offset)?.to_owned();
            Ok((name, value))
        })
        .collect()
}

/// Target name and pseudo-attributes of an `<?xml ...?>` declaration.
fn declaration(raw: &str, offset: usize) -> Result<(String, Attributes)> {
    let inner = raw
        .strip_prefix("<?")
        .and_then(|rest| rest.strip_suffix("?>"))
        .ok_or_else(|| markup_error(offset, "malformed XML declaration"))?;
    let name_len = inner.find(char::is_whitespace).unwrap_or(inner.len());
    let element = BytesStart::from_content(inner, name_len);
    let attrs = element_attributes(&element, offset)?;
    Ok((inner[..name_len].to_owned(), attrs))
}

fn utf8(bytes: &[u8], offset: usize) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|err| markup_error(offset, err.to_string()))
}

fn markup_error(offset: usize, detail: impl Into<String>) -> AccessAideError {
    AccessAideError::Markup {
        offset,
        detail: detail.into(),
    }
}

/// Tokenize `src` completely and re-serialize it. Used by tests and as a
/// quick well-formedness probe.
pub fn round_trip(src: &str) -> Result<String> {
    let mut out = String::with_capacity(src.len());
    for event in Tokenizer::new(src) {
        event?.write_markup(&mut out);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
        <!DOCTYPE html [ <!ENTITY nbsp \"&#160;\"> ]>\n\
        <html xmlns=\"http://www.w3.org/1999/xhtml\">\n\
        <head><title>A &amp; B</title><!-- note --></head>\n\
        <body class='x'  id = \"b\">\n\
        <p>one<br/>two</p><![CDATA[ <raw> ]]><?page 12?>\n\
        </body>\n</html>\n";

    fn collect(src: &str) -> Vec<Event<'_>> {
        Tokenizer::new(src).collect::<Result<Vec<_>>>().unwrap()
    }

    #[test]
    fn round_trip_is_lossless() {
        assert_eq!(round_trip(SAMPLE).unwrap(), SAMPLE);
    }

    #[test]
    fn paths_track_ancestors() {
        let events = collect(SAMPLE);
        let title_text = events
            .iter()
            .find_map(|e| match e {
                Event::Text(t) if t.content == "A &amp; B" => Some(t),
                _ => None,
            })
            .unwrap();
        assert_eq!(title_text.path, "html.head.title");

        let br = events
            .iter()
            .find_map(|e| match e {
                Event::Tag(t) if t.name == "br" => Some(t),
                _ => None,
            })
            .unwrap();
        assert_eq!(br.kind, TagKind::Single);
        assert_eq!(br.path, "html.body.p");
    }

    #[test]
    fn end_tag_path_excludes_itself() {
        let events = collect("<a><b></b></a>");
        let ends: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                Event::Tag(t) if t.kind == TagKind::End => Some(t.path.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(ends, vec!["a", ""]);
    }

    #[test]
    fn attributes_are_parsed_and_trimmed() {
        let events = collect("<body class='x'  id = \"b\" hidden>");
        let Event::Tag(tag) = &events[0] else { panic!("expected tag") };
        assert_eq!(tag.attrs.get("class"), Some("x"));
        assert_eq!(tag.attrs.get("id"), Some("b"));
        assert_eq!(tag.attrs.get("hidden"), Some(""));
        assert_eq!(tag.attrs.len(), 3);
    }

    #[test]
    fn xml_header_is_a_tag() {
        let events = collect("<?xml version=\"1.0\"?><r/>");
        let Event::Tag(tag) = &events[0] else { panic!("expected tag") };
        assert_eq!(tag.kind, TagKind::XmlHeader);
        assert_eq!(tag.attrs.get("version"), Some("1.0"));
    }

    #[test]
    fn unchanged_set_keeps_raw_bytes() {
        let mut events = collect("<img  src=\"a.png\" alt=\"\" />");
        let Event::Tag(tag) = &mut events[0] else { panic!("expected tag") };
        assert!(!tag.attrs.set("alt", ""));
        assert_eq!(tag.to_markup(), "<img  src=\"a.png\" alt=\"\" />");
    }

    #[test]
    fn modified_tag_is_rebuilt() {
        let mut events = collect("<img src=\"a.png\"/>");
        let Event::Tag(tag) = &mut events[0] else { panic!("expected tag") };
        assert!(tag.attrs.set("alt", "say \"hi\""));
        assert_eq!(tag.to_markup(), "<img src=\"a.png\" alt='say \"hi\"'/>");
    }

    #[test]
    fn quoted_gt_does_not_end_tag() {
        let src = "<a title=\"1 > 0\">x</a>";
        let events = collect(src);
        assert_eq!(events.len(), 3);
        assert_eq!(round_trip(src).unwrap(), src);
    }

    #[test]
    fn local_name_strips_prefix() {
        let events = collect("<opf:metadata/>");
        let Event::Tag(tag) = &events[0] else { panic!("expected tag") };
        assert_eq!(tag.local_name(), "metadata");
    }

    #[test]
    fn unterminated_comment_is_an_error() {
        let mut tokenizer = Tokenizer::new("<p>x</p><!-- open");
        let results: Vec<_> = tokenizer.by_ref().collect();
        let err = results.last().unwrap().as_ref().unwrap_err();
        assert!(matches!(err, AccessAideError::Markup { offset: 8, .. }));
        assert!(tokenizer.next().is_none());
    }

    #[test]
    fn unterminated_tag_is_an_error() {
        assert!(round_trip("<p class=\"a\"").is_err());
        assert!(round_trip("<p>x</p><img src=\"a.png\"").is_err());
    }

    #[test]
    fn doctype_subset_with_quote_in_comment() {
        let src = "<!DOCTYPE html [ <!-- don't --> <!ENTITY x \"y\"> ]>\n\
            <html><p>z</p></html>";
        assert_eq!(round_trip(src).unwrap(), src);
        let events = collect(src);
        let Event::Special(doctype) = &events[0] else { panic!("expected doctype") };
        assert_eq!(doctype.kind, SpecialKind::Doctype);
        assert!(doctype.raw.ends_with("]>"));
    }

    #[test]
    fn entity_references_stay_in_one_text_event() {
        let events = collect("<p>Tom &amp; Jerry &#160;x</p>");
        assert_eq!(events.len(), 3);
        let Event::Text(text) = &events[1] else { panic!("expected text") };
        assert_eq!(text.content, "Tom &amp; Jerry &#160;x");
        assert_eq!(text.path, "p");
    }

    #[test]
    fn offset_follows_returned_events() {
        let mut tokenizer = Tokenizer::new("<a>text</a><b/>");
        tokenizer.next();
        assert_eq!(tokenizer.offset(), 3);
        tokenizer.next();
        assert_eq!(tokenizer.offset(), 7);
        tokenizer.next();
        assert_eq!(tokenizer.offset(), 11);
    }

    #[test]
    fn stray_end_tag_is_tolerated() {
        let src = "<a></b>text</a>";
        let events = collect(src);
        let Event::Text(text) = &events[2] else { panic!("expected text") };
        assert_eq!(text.path, "a");
    }
}
