//! Blogspot Atom export parsing.
//!
//! A single buffered event pass over the XML builds the in-memory [`Feed`].
//! Elements are matched by local name along the `feed/...` path, so entry
//! metadata never bleeds into feed metadata and foreign-namespace elements
//! (`openSearch:*`, `gd:*`) fall through unrecognized. Entity and character
//! references arrive as separate reference events and are resolved back
//! into the surrounding text, which matters for `<content type="html">`
//! where the entire post body is entity-escaped markup.

use chrono::{DateTime, FixedOffset};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{Error, Result};

/// Feed-level author block.
#[derive(Debug, Clone, PartialEq)]
pub struct Author {
    pub name: String,
    /// `uri` and `email` may be empty when the export omits them.
    pub uri: String,
    pub email: String,
}

/// One blog post: title, publication timestamp and the raw HTML body.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub title: String,
    pub published: DateTime<FixedOffset>,
    /// Decoded HTML exactly as carried by `<content>`, internal whitespace
    /// preserved.
    pub content: String,
}

/// A parsed Atom export. Entries keep document order; Blogspot lists the
/// newest post first.
#[derive(Debug, Clone, PartialEq)]
pub struct Feed {
    pub title: String,
    pub subtitle: String,
    pub id: String,
    /// `href` of the feed-level `<link rel="alternate" type="text/html">`.
    pub link: String,
    pub updated: DateTime<FixedOffset>,
    pub author: Author,
    pub entries: Vec<Entry>,
}

impl Feed {
    /// Parse an Atom export from raw XML bytes.
    pub fn parse(xml: &[u8]) -> Result<Feed> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(false);

        let mut buf = Vec::with_capacity(256);
        let mut entity_buf = String::with_capacity(16);
        let mut path: Vec<String> = Vec::with_capacity(8);
        let mut draft = FeedDraft::default();
        let mut entry: Option<EntryDraft> = None;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let tag = local_name(&reader, e.name().as_ref())?;
                    if path_is(&path, &["feed"]) {
                        match tag.as_str() {
                            "link" => capture_alternate_link(&reader, &e, &mut draft.link),
                            "entry" => entry = Some(EntryDraft::default()),
                            _ => {}
                        }
                    }
                    path.push(tag);
                }
                Event::Empty(e) => {
                    let tag = local_name(&reader, e.name().as_ref())?;
                    if tag == "link" && path_is(&path, &["feed"]) {
                        capture_alternate_link(&reader, &e, &mut draft.link);
                    }
                }
                Event::End(_) => {
                    if path_is(&path, &["feed", "entry"])
                        && let Some(finished) = entry.take()
                    {
                        draft.entries.push(finished.finish()?);
                    }
                    path.pop();
                }
                Event::Text(e) => {
                    let text = e.decode().map_err(quick_xml::Error::from)?;
                    append_text(&mut draft, &mut entry, &path, &text);
                }
                Event::CData(e) => {
                    let text = reader.decoder().decode(&e).map_err(quick_xml::Error::from)?;
                    append_text(&mut draft, &mut entry, &path, &text);
                }
                Event::GeneralRef(e) => {
                    let name = e.decode().map_err(quick_xml::Error::from)?;
                    entity_buf.clear();
                    entity_buf.push('&');
                    entity_buf.push_str(&name);
                    entity_buf.push(';');
                    let resolved = quick_xml::escape::unescape(&entity_buf)
                        .map_err(quick_xml::Error::from)?;
                    append_text(&mut draft, &mut entry, &path, &resolved);
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        let feed = draft.finish()?;
        log::debug!(
            "Parsed feed '{}' with {} entries",
            feed.title,
            feed.entries.len()
        );
        Ok(feed)
    }
}

#[derive(Default)]
struct FeedDraft {
    title: String,
    subtitle: String,
    id: String,
    updated: String,
    author_name: String,
    author_uri: String,
    author_email: String,
    link: Option<String>,
    entries: Vec<Entry>,
}

impl FeedDraft {
    fn finish(self) -> Result<Feed> {
        let updated = required(self.updated, "feed/updated")?;
        Ok(Feed {
            title: required(self.title, "feed/title")?,
            subtitle: self.subtitle.trim().to_string(),
            id: required(self.id, "feed/id")?,
            link: self
                .link
                .ok_or(Error::MissingField("feed/link[rel=alternate]"))?,
            updated: parse_timestamp(&updated)?,
            author: Author {
                name: required(self.author_name, "feed/author/name")?,
                uri: self.author_uri.trim().to_string(),
                email: self.author_email.trim().to_string(),
            },
            entries: self.entries,
        })
    }
}

#[derive(Default)]
struct EntryDraft {
    title: String,
    published: String,
    content: String,
}

impl EntryDraft {
    fn finish(self) -> Result<Entry> {
        let published = required(self.published, "entry/published")?;
        Ok(Entry {
            title: required(self.title, "entry/title")?,
            published: parse_timestamp(&published)?,
            content: self.content,
        })
    }
}

/// Route one decoded text run into the field addressed by the element path.
/// Text anywhere else (indentation, unrecognized elements) is dropped.
fn append_text(
    draft: &mut FeedDraft,
    entry: &mut Option<EntryDraft>,
    path: &[String],
    text: &str,
) {
    let parts: Vec<&str> = path.iter().map(String::as_str).collect();
    match parts.as_slice() {
        ["feed", "title"] => draft.title.push_str(text),
        ["feed", "subtitle"] => draft.subtitle.push_str(text),
        ["feed", "id"] => draft.id.push_str(text),
        ["feed", "updated"] => draft.updated.push_str(text),
        ["feed", "author", "name"] => draft.author_name.push_str(text),
        ["feed", "author", "uri"] => draft.author_uri.push_str(text),
        ["feed", "author", "email"] => draft.author_email.push_str(text),
        ["feed", "entry", "title"] => {
            if let Some(entry) = entry {
                entry.title.push_str(text);
            }
        }
        ["feed", "entry", "published"] => {
            if let Some(entry) = entry {
                entry.published.push_str(text);
            }
        }
        ["feed", "entry", "content"] => {
            if let Some(entry) = entry {
                entry.content.push_str(text);
            }
        }
        _ => {}
    }
}

/// First feed-level `<link rel="alternate" type="text/html" href=...>` wins.
/// Attributes that fail to decode are skipped, like any other link that does
/// not qualify.
fn capture_alternate_link(reader: &Reader<&[u8]>, e: &BytesStart<'_>, slot: &mut Option<String>) {
    if slot.is_some() {
        return;
    }
    let mut rel = None;
    let mut media_type = None;
    let mut href = None;
    for attr in e.attributes().flatten() {
        let key = match reader.decoder().decode(attr.key.as_ref()) {
            Ok(v) => v.to_ascii_lowercase(),
            Err(_) => continue,
        };
        let value = match reader.decoder().decode(&attr.value) {
            Ok(v) => match quick_xml::escape::unescape(&v) {
                Ok(resolved) => resolved.into_owned(),
                Err(_) => v.into_owned(),
            },
            Err(_) => continue,
        };
        match key.as_str() {
            "rel" => rel = Some(value),
            "type" => media_type = Some(value),
            "href" => href = Some(value),
            _ => {}
        }
    }
    if rel.as_deref() == Some("alternate")
        && media_type.as_deref() == Some("text/html")
        && let Some(href) = href
    {
        *slot = Some(href);
    }
}

/// Decode a qualified tag name to its lowercased local part.
fn local_name(reader: &Reader<&[u8]>, raw: &[u8]) -> Result<String> {
    let decoded = reader
        .decoder()
        .decode(raw)
        .map_err(quick_xml::Error::from)?;
    let local = decoded.rsplit(':').next().unwrap_or(decoded.as_ref());
    Ok(local.to_ascii_lowercase())
}

fn path_is(path: &[String], want: &[&str]) -> bool {
    path.len() == want.len() && path.iter().zip(want).all(|(a, b)| a == b)
}

fn required(value: String, field: &'static str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::MissingField(field));
    }
    Ok(trimmed.to_string())
}

fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).map_err(|source| Error::Date {
        value: value.to_string(),
        source,
    })
}
