//! Streaming sitemap XML reader
//!
//! Walks quick-xml events and emits one item per completed `<url>` or
//! `<sitemap>` element. Only the fields of the element being read are held,
//! so memory stays flat however large the document is.
//!
//! Structure is matched by depth: the root (`urlset` or `sitemapindex`) at
//! depth 1, entries at depth 2, their fields at depth 3. Namespace prefixes
//! are ignored, and anything deeper (image, video, news extensions) is
//! skipped.

use crate::SitemapError;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;
use std::io::BufRead;

/// Root element kind of a sitemap document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SitemapKind {
    /// `<urlset>`: a leaf sitemap listing pages
    UrlSet,
    /// `<sitemapindex>`: a list of other sitemaps
    Index,
}

/// A `<url>` entry; everything except `loc` is advisory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: Option<String>,
    pub changefreq: Option<String>,
    pub priority: Option<String>,
}

/// A `<sitemap>` child of a sitemap index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SitemapRef {
    pub loc: String,
    pub lastmod: Option<String>,
}

/// One completed element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapItem {
    Url(SitemapEntry),
    Sitemap(SitemapRef),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Loc,
    Lastmod,
    Changefreq,
    Priority,
}

impl Field {
    fn from_name(name: &[u8], kind: SitemapKind) -> Option<Self> {
        match (name, kind) {
            (b"loc", _) => Some(Self::Loc),
            (b"lastmod", _) => Some(Self::Lastmod),
            (b"changefreq", SitemapKind::UrlSet) => Some(Self::Changefreq),
            (b"priority", SitemapKind::UrlSet) => Some(Self::Priority),
            _ => None,
        }
    }
}

/// Owned copy of a reader event
enum Token {
    Open(Vec<u8>),
    SelfClosing(Vec<u8>),
    Close,
    Text(String),
    /// Text outside any captured field
    Ignored,
    Eof,
    Other,
    Error(String),
}

/// Fields collected for the element currently open at depth 2
#[derive(Debug, Default)]
struct Pending {
    loc: Option<String>,
    lastmod: Option<String>,
    changefreq: Option<String>,
    priority: Option<String>,
}

impl Pending {
    fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::Loc => &mut self.loc,
            Field::Lastmod => &mut self.lastmod,
            Field::Changefreq => &mut self.changefreq,
            Field::Priority => &mut self.priority,
        };
        *slot = Some(value);
    }

    fn finish(self, kind: SitemapKind) -> Option<SitemapItem> {
        let loc = self.loc.filter(|l| !l.is_empty())?;
        Some(match kind {
            SitemapKind::UrlSet => SitemapItem::Url(SitemapEntry {
                loc,
                lastmod: self.lastmod,
                changefreq: self.changefreq,
                priority: self.priority,
            }),
            SitemapKind::Index => SitemapItem::Sitemap(SitemapRef {
                loc,
                lastmod: self.lastmod,
            }),
        })
    }
}

/// Forward-only iterator over the entries of a sitemap document
///
/// Yields `Err` at most once; the iterator is fused after an error or the
/// end of the document.
pub struct SitemapStream<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    kind: Option<SitemapKind>,
    root_name: String,
    depth: usize,
    pending: Option<Pending>,
    field: Option<Field>,
    text: String,
    done: bool,
}

impl<R: BufRead> SitemapStream<R> {
    pub fn new(reader: R) -> Self {
        let mut reader = Reader::from_reader(reader);
        reader.trim_text(true);
        Self {
            reader,
            buf: Vec::new(),
            kind: None,
            root_name: String::new(),
            depth: 0,
            pending: None,
            field: None,
            text: String::new(),
            done: false,
        }
    }

    /// Root kind, known once the root start tag has been read
    pub fn kind(&self) -> Option<SitemapKind> {
        self.kind
    }

    fn syntax_error(&self, message: impl Into<String>) -> SitemapError {
        SitemapError::Syntax {
            position: self.reader.buffer_position() as u64,
            message: message.into(),
        }
    }

    fn open_root(&mut self, name: &[u8]) -> Result<(), SitemapError> {
        let name_str = String::from_utf8_lossy(name).into_owned();
        self.kind = match name {
            b"urlset" => Some(SitemapKind::UrlSet),
            b"sitemapindex" => Some(SitemapKind::Index),
            _ => return Err(SitemapError::UnexpectedRoot(name_str)),
        };
        self.root_name = name_str;
        Ok(())
    }

    /// Handles an opening tag at `self.depth` (already incremented)
    fn open(&mut self, name: &[u8]) -> Result<(), SitemapError> {
        let Some(kind) = self.kind else {
            return self.open_root(name);
        };

        match self.depth {
            1 => return Err(self.syntax_error("more than one root element")),
            2 => {
                let entry_name: &[u8] = match kind {
                    SitemapKind::UrlSet => b"url",
                    SitemapKind::Index => b"sitemap",
                };
                if name == entry_name {
                    self.pending = Some(Pending::default());
                }
            }
            3 if self.pending.is_some() => {
                self.field = Field::from_name(name, kind);
                self.text.clear();
            }
            _ => {}
        }
        Ok(())
    }

    /// Handles a closing tag at `self.depth` (before decrementing)
    fn close(&mut self) -> Option<SitemapItem> {
        let mut item = None;
        match self.depth {
            3 => {
                if let (Some(field), Some(pending)) = (self.field.take(), self.pending.as_mut()) {
                    let value = self.text.trim().to_string();
                    if !value.is_empty() {
                        pending.set(field, value);
                    }
                }
                self.text.clear();
            }
            2 => {
                if let (Some(pending), Some(kind)) = (self.pending.take(), self.kind) {
                    item = pending.finish(kind);
                }
            }
            _ => {}
        }
        self.depth = self.depth.saturating_sub(1);
        item
    }

    /// Reads the next event and copies out what the state machine needs
    fn read_token(&mut self) -> Token {
        self.buf.clear();
        let capture = self.field.is_some();
        match self.reader.read_event_into(&mut self.buf) {
            Ok(Event::Start(e)) => Token::Open(e.local_name().as_ref().to_vec()),
            Ok(Event::Empty(e)) => Token::SelfClosing(e.local_name().as_ref().to_vec()),
            Ok(Event::End(_)) => Token::Close,
            Ok(Event::Text(t)) if capture => match t.unescape() {
                Ok(text) => Token::Text(text.into_owned()),
                Err(e) => Token::Error(e.to_string()),
            },
            Ok(Event::Text(_)) => Token::Ignored,
            Ok(Event::CData(c)) if capture => {
                Token::Text(String::from_utf8_lossy(&c.into_inner()).into_owned())
            }
            Ok(Event::Eof) => Token::Eof,
            // Declarations, comments, processing instructions, doctype
            Ok(_) => Token::Other,
            Err(e) => Token::Error(e.to_string()),
        }
    }

    fn step(&mut self) -> Result<Option<SitemapItem>, SitemapError> {
        loop {
            match self.read_token() {
                Token::Open(_) | Token::SelfClosing(_) if self.depth == 0 && self.kind.is_some() => {
                    return Err(self.syntax_error("content after the root element"));
                }
                Token::Open(name) => {
                    self.depth += 1;
                    self.open(&name)?;
                }
                Token::SelfClosing(name) => {
                    self.depth += 1;
                    self.open(&name)?;
                    if let Some(item) = self.close() {
                        return Ok(Some(item));
                    }
                }
                Token::Close => {
                    if let Some(item) = self.close() {
                        return Ok(Some(item));
                    }
                }
                Token::Text(text) => self.text.push_str(&text),
                Token::Ignored => {
                    if self.depth == 0 {
                        return Err(self.syntax_error("text outside the root element"));
                    }
                }
                Token::Eof => {
                    if self.depth > 0 {
                        return Err(SitemapError::Truncated(self.root_name.clone()));
                    }
                    if self.kind.is_none() {
                        return Err(SitemapError::Empty);
                    }
                    return Ok(None);
                }
                Token::Other => {}
                Token::Error(message) => return Err(self.syntax_error(message)),
            }
        }
    }
}

impl<R: BufRead> Iterator for SitemapStream<R> {
    type Item = Result<SitemapItem, SitemapError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.step() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Every entry of a fully parsed document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSitemap {
    pub kind: SitemapKind,
    pub entries: Vec<SitemapEntry>,
    pub sitemaps: Vec<SitemapRef>,
}

/// Parses a whole document, all or nothing
///
/// A syntax error anywhere yields the error and no entries, even if some
/// elements were read before it.
pub fn parse_document<R: BufRead>(reader: R) -> Result<ParsedSitemap, SitemapError> {
    let mut stream = SitemapStream::new(reader);
    let mut entries = Vec::new();
    let mut sitemaps = Vec::new();

    for item in stream.by_ref() {
        match item? {
            SitemapItem::Url(entry) => entries.push(entry),
            SitemapItem::Sitemap(sitemap) => sitemaps.push(sitemap),
        }
    }

    let kind = stream.kind().ok_or(SitemapError::Empty)?;
    Ok(ParsedSitemap {
        kind,
        entries,
        sitemaps,
    })
}

/// Determines the root kind from the first bytes of a document
///
/// The sample may be cut anywhere; only the root start tag has to fit.
pub fn sniff_kind(sample: &[u8]) -> Option<SitemapKind> {
    let mut stream = SitemapStream::new(sample);
    while stream.kind().is_none() {
        if stream.next().is_none() {
            break;
        }
    }
    stream.kind().or_else(|| {
        let text = String::from_utf8_lossy(sample).to_ascii_lowercase();
        if text.contains("<sitemapindex") {
            Some(SitemapKind::Index)
        } else if text.contains("<urlset") {
            Some(SitemapKind::UrlSet)
        } else {
            None
        }
    })
}

/// Recovers `<loc>` values from text that is not well-formed XML
///
/// Scans for `<loc>...</loc>` spans (with or without a namespace prefix),
/// decodes the standard entities and skips empty values.
pub fn extract_loc_spans(text: &str) -> Vec<String> {
    let mut locs = Vec::new();
    let mut rest = text;

    while let Some(start) = find_loc_open(rest) {
        let after_open = &rest[start..];
        let Some(close) = after_open.find("</") else {
            break;
        };
        let raw = after_open[..close].trim();
        if !raw.is_empty() {
            let value = quick_xml::escape::unescape(raw)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| raw.to_string());
            locs.push(value);
        }
        rest = &after_open[close + 2..];
    }

    locs
}

/// Returns the byte offset just past the next `<loc>` or `<prefix:loc>` tag
fn find_loc_open(text: &str) -> Option<usize> {
    let mut offset = 0;
    while let Some(pos) = text[offset..].find("loc>") {
        let at = offset + pos;
        let before = &text[..at];
        let tag_start = before.rfind('<');
        if let Some(lt) = tag_start {
            let between = &before[lt + 1..];
            let is_loc_tag = between.is_empty()
                || (between.ends_with(':')
                    && !between.starts_with('/')
                    && between[..between.len() - 1]
                        .chars()
                        .all(|c| c.is_alphanumeric() || c == '-' || c == '_'));
            if is_loc_tag {
                return Some(at + 4);
            }
        }
        offset = at + 4;
    }
    None
}
