//! RSS 2.0 / RSS 1.0 / Atom parsing into [`FeedEnvelope`].
//!
//! The document is first read into a small element tree with `quick-xml`,
//! then each item container is read into a format-specific [`RawEntry`] and
//! normalized into a single [`FeedItem`] shape.

use std::collections::BTreeMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

use crate::feed::types::{
    BodyField, FeedEnvelope, FeedItem, MediaHint, MediaKind, RawFeedDocument, PLACEHOLDER_LINK,
};

/// SEC-003: Maximum element nesting accepted before the document is rejected.
const MAX_DEPTH: usize = 64;

/// The feed bytes could not be read as an XML document.
///
/// Callers only need to know that parsing failed; the message is for logs.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("XML syntax error: {0}")]
    Xml(String),
    #[error("Document has no root element")]
    NoRoot,
    #[error("Document ended inside <{0}>")]
    Unclosed(String),
    #[error("Nesting depth exceeds maximum of {0} levels")]
    TooDeep(usize),
}

/// Parses a fetched document into a normalized envelope.
///
/// Item containers are looked up in order, first match wins:
/// `channel/item`, then top-level `item` (RSS 1.0), then `entry` (Atom).
/// A well-formed document with none of them is an envelope with zero items,
/// not an error.
///
/// # Errors
///
/// Returns [`ParseError`] when the bytes are not a well-formed XML document
/// (syntax error, mismatched or unclosed tags, no root element).
pub fn parse_feed(doc: &RawFeedDocument) -> Result<FeedEnvelope, ParseError> {
    if let Some(encoding) = doc.encoding.as_deref() {
        if !encoding.eq_ignore_ascii_case("utf-8") && !encoding.eq_ignore_ascii_case("utf8") {
            tracing::debug!(url = %doc.url, encoding = %encoding, "Non UTF-8 charset declared, decoding lossily");
        }
    }

    let bytes = doc.bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&doc.bytes);
    let text = String::from_utf8_lossy(bytes);

    let root = read_tree(&text).inspect_err(|e| {
        tracing::debug!(url = %doc.url, error = %e, "Feed XML rejected");
    })?;

    let channel = root.child("channel");
    let title = channel
        .and_then(|c| c.child_text("title"))
        .or_else(|| root.child_text("title"))
        .unwrap_or_default();
    let description = channel
        .and_then(|c| c.child_text("description"))
        .or_else(|| root.child_text("subtitle"))
        .or_else(|| root.child_text("description"))
        .unwrap_or_default();

    let items: Vec<FeedItem> = raw_entries(&root).into_iter().map(FeedItem::from).collect();

    tracing::debug!(url = %doc.url, items = items.len(), root = %root.name, "Parsed feed");

    Ok(FeedEnvelope {
        title,
        description,
        source_url: doc.url.clone(),
        items,
    })
}

fn raw_entries(root: &Node) -> Vec<RawEntry> {
    if let Some(channel) = root.child("channel") {
        let items: Vec<_> = channel.children_named("item").collect();
        if !items.is_empty() {
            return items.into_iter().map(|n| RawEntry::Rss(RssItem::from_node(n))).collect();
        }
    }

    let bare: Vec<_> = root.children_named("item").collect();
    if !bare.is_empty() {
        return bare.into_iter().map(|n| RawEntry::Rss(RssItem::from_node(n))).collect();
    }

    root.children_named("entry")
        .map(|n| RawEntry::Atom(AtomEntry::from_node(n)))
        .collect()
}

// ============================================================================
// Format-specific entries
// ============================================================================

/// An item container as it appeared in the source document.
///
/// The variants differ only in how the article link is found. Body, date and
/// media fields are read under every name either format uses, since feeds
/// mix them freely (an RSS `<item>` with `<summary>`, an Atom `<entry>` with
/// `<pubDate>`).
#[derive(Debug)]
enum RawEntry {
    Rss(RssItem),
    Atom(AtomEntry),
}

#[derive(Debug, Default)]
struct EntryFields {
    title: Option<String>,
    description: Option<String>,
    summary: Option<String>,
    /// `content:encoded`, else `content`
    content: Option<String>,
    pub_date: Option<String>,
    published: Option<String>,
    updated: Option<String>,
    dc_date: Option<String>,
    media: Vec<MediaHint>,
}

impl EntryFields {
    fn from_node(node: &Node) -> Self {
        Self {
            title: node.child_text("title"),
            description: node.child("description").and_then(Node::body),
            summary: node.child("summary").and_then(Node::body),
            content: node
                .child("content:encoded")
                .or_else(|| node.child("content"))
                .and_then(Node::body),
            pub_date: node.child_text("pubDate"),
            published: node.child_text("published"),
            updated: node.child_text("updated"),
            dc_date: node.child_text("dc:date"),
            media: collect_media(node),
        }
    }

    /// Builds the item; `link` has already been chosen by the variant.
    fn into_item(self, link: Option<String>) -> FeedItem {
        let body_fields: BTreeMap<BodyField, String> = [
            (BodyField::Description, self.description),
            (BodyField::Summary, self.summary),
            (BodyField::Content, self.content),
        ]
        .into_iter()
        .filter_map(|(field, text)| Some((field, text?)))
        .collect();

        FeedItem {
            title: self.title.unwrap_or_default(),
            link: link.unwrap_or_else(|| PLACEHOLDER_LINK.to_owned()),
            body_fields,
            published_raw: self
                .pub_date
                .or(self.published)
                .or(self.updated)
                .or(self.dc_date)
                .unwrap_or_default(),
            media_hints: self.media,
        }
    }
}

#[derive(Debug)]
struct RssItem {
    fields: EntryFields,
    link: Option<String>,
    link_href: Option<String>,
}

impl RssItem {
    fn from_node(node: &Node) -> Self {
        Self {
            fields: EntryFields::from_node(node),
            link: node.child_text("link"),
            link_href: node
                .children_named("link")
                .find_map(|l| l.attr_nonempty("href")),
        }
    }
}

#[derive(Debug)]
struct AtomLink {
    href: String,
    rel: Option<String>,
}

#[derive(Debug)]
struct AtomEntry {
    fields: EntryFields,
    link_text: Option<String>,
    links: Vec<AtomLink>,
}

impl AtomEntry {
    fn from_node(node: &Node) -> Self {
        let links = node
            .children_named("link")
            .filter_map(|l| {
                Some(AtomLink {
                    href: l.attr_nonempty("href")?,
                    rel: l.attr("rel").map(str::to_owned),
                })
            })
            .collect();

        Self {
            fields: EntryFields::from_node(node),
            link_text: node.child_text("link"),
            links,
        }
    }

    /// `rel="alternate"` or rel-less links point at the article itself.
    fn article_href(&self) -> Option<String> {
        self.links
            .iter()
            .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
            .or_else(|| self.links.iter().find(|l| l.rel.as_deref() != Some("enclosure")))
            .map(|l| l.href.clone())
    }
}

impl From<RawEntry> for FeedItem {
    fn from(entry: RawEntry) -> Self {
        match entry {
            RawEntry::Rss(item) => {
                let link = item.link.or(item.link_href);
                item.fields.into_item(link)
            }
            RawEntry::Atom(entry) => {
                let link = entry.link_text.clone().or_else(|| entry.article_href());
                entry.fields.into_item(link)
            }
        }
    }
}

/// Media descriptors attached to an item, sorted by lookup priority.
fn collect_media(item: &Node) -> Vec<MediaHint> {
    let mut hints = Vec::new();
    let mut push = |kind, url: Option<String>| {
        if let Some(url) = url {
            hints.push(MediaHint { kind, url });
        }
    };

    for enclosure in item.children_named("enclosure") {
        push(MediaKind::Enclosure, enclosure.attr_nonempty("url"));
    }
    for link in item.children_named("link") {
        if link.attr("rel") == Some("enclosure") {
            push(MediaKind::Enclosure, link.attr_nonempty("href"));
        }
    }

    for image in item.children_named("image") {
        let url = image
            .child_text("url")
            .or_else(|| non_empty(image.text()));
        push(MediaKind::ItemImage, url);
    }

    let groups: Vec<&Node> = std::iter::once(item)
        .chain(item.children_named("media:group"))
        .collect();
    for parent in &groups {
        for content in parent.children_named("media:content") {
            push(MediaKind::MediaContent, content.attr_nonempty("url"));
        }
    }
    for parent in &groups {
        for thumbnail in parent.children_named("media:thumbnail") {
            push(MediaKind::MediaThumbnail, thumbnail.attr_nonempty("url"));
        }
    }

    // Stable: keeps document order within a kind
    hints.sort_by_key(|h| h.kind);
    hints
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

// ============================================================================
// Element tree
// ============================================================================

#[derive(Debug)]
enum Content {
    Element(Node),
    Text(String),
}

#[derive(Debug, Default)]
struct Node {
    /// Qualified name as written, e.g. `item` or `media:content`
    name: String,
    attrs: Vec<(String, String)>,
    content: Vec<Content>,
}

impl Node {
    fn children(&self) -> impl Iterator<Item = &Node> {
        self.content.iter().filter_map(|c| match c {
            Content::Element(node) => Some(node),
            Content::Text(_) => None,
        })
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children().filter(move |c| c.name == name)
    }

    fn child(&self, name: &str) -> Option<&Node> {
        self.children().find(|c| c.name == name)
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn attr_nonempty(&self, name: &str) -> Option<String> {
        self.attr(name).and_then(|v| non_empty(v.to_owned()))
    }

    /// Direct text and CDATA content, concatenated.
    fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| match c {
                Content::Text(t) => Some(t.as_str()),
                Content::Element(_) => None,
            })
            .collect()
    }

    fn child_text(&self, name: &str) -> Option<String> {
        self.child(name).and_then(|c| non_empty(c.text()))
    }

    /// Body value of an HTML-carrying field.
    ///
    /// Escaped or CDATA HTML arrives as text. Inline markup (Atom
    /// `type="xhtml"`, or unescaped HTML in sloppy RSS) arrives as child
    /// elements and is serialized back to markup.
    fn body(&self) -> Option<String> {
        if self.children().next().is_some() {
            let mut out = String::new();
            self.write_inner_markup(&mut out);
            non_empty(out)
        } else {
            non_empty(self.text())
        }
    }

    fn write_inner_markup(&self, out: &mut String) {
        for content in &self.content {
            match content {
                Content::Text(t) => out.push_str(&html_escape::encode_text(t)),
                Content::Element(node) => {
                    out.push('<');
                    out.push_str(&node.name);
                    for (key, value) in &node.attrs {
                        out.push(' ');
                        out.push_str(key);
                        out.push_str("=\"");
                        out.push_str(&html_escape::encode_double_quoted_attribute(value));
                        out.push('"');
                    }
                    out.push('>');
                    node.write_inner_markup(out);
                    out.push_str("</");
                    out.push_str(&node.name);
                    out.push('>');
                }
            }
        }
    }
}

fn open_node(start: &BytesStart<'_>) -> Node {
    let mut attrs = Vec::new();
    for attr_result in start.attributes() {
        let attr = match attr_result {
            Ok(attr) => attr,
            Err(e) => {
                tracing::debug!(error = %e, "Skipping malformed attribute");
                continue;
            }
        };
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        attrs.push((key, unescape_lenient(&attr.value)));
    }

    Node {
        name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
        attrs,
        content: Vec::new(),
    }
}

/// Unescapes text or an attribute value.
///
/// Feeds routinely use HTML entities (`&nbsp;`, `&mdash;`) that XML does not
/// define. When strict XML unescaping rejects one, the value is decoded as
/// HTML instead, so the rest of the node is still unescaped and entities
/// unknown to HTML too stay as written.
fn unescape_lenient(raw: &[u8]) -> String {
    let raw = String::from_utf8_lossy(raw);
    match quick_xml::escape::unescape(&raw) {
        Ok(text) => text.into_owned(),
        Err(_) => html_escape::decode_html_entities(&raw).into_owned(),
    }
}

/// Reads the document into an element tree rooted at its single root element.
fn read_tree(text: &str) -> Result<Node, ParseError> {
    // SEC-002: quick-xml never expands <!ENTITY> declarations from a DOCTYPE;
    // only XML builtins, character references and fixed HTML names resolve.
    let mut reader = Reader::from_str(text);

    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<Node> = None;

    let mut attach = |stack: &mut Vec<Node>, node: Node| -> Result<(), ParseError> {
        match stack.last_mut() {
            Some(parent) => parent.content.push(Content::Element(node)),
            None if root.is_none() => root = Some(node),
            None => return Err(ParseError::Xml("multiple root elements".to_owned())),
        }
        Ok(())
    };

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if stack.len() >= MAX_DEPTH {
                    return Err(ParseError::TooDeep(MAX_DEPTH));
                }
                stack.push(open_node(&e));
            }
            Ok(Event::Empty(e)) => {
                let node = open_node(&e);
                attach(&mut stack, node)?;
            }
            Ok(Event::End(e)) => {
                let node = stack.pop().ok_or_else(|| {
                    ParseError::Xml(format!(
                        "unexpected closing tag </{}>",
                        String::from_utf8_lossy(e.name().as_ref())
                    ))
                })?;
                attach(&mut stack, node)?;
            }
            Ok(Event::Text(t)) => {
                if let Some(node) = stack.last_mut() {
                    node.content.push(Content::Text(unescape_lenient(&t)));
                }
            }
            Ok(Event::CData(c)) => {
                if let Some(node) = stack.last_mut() {
                    node.content
                        .push(Content::Text(String::from_utf8_lossy(&c).into_owned()));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ParseError::Xml(format!(
                    "{e} (at byte {})",
                    reader.buffer_position()
                )))
            }
            Ok(_) => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ParseError::Unclosed(open.name.clone()));
    }
    root.ok_or(ParseError::NoRoot)
}
