//! FictionBook 2.0 assembly.
//!
//! Takes a parsed [`Feed`] and streams a complete FB2 document to a writer:
//! `description` (title-info and document-info built from feed metadata),
//! then a `body` whose sections are the blog posts in chronological order,
//! each section carrying the post's converted fragment forest. The writer
//! escapes text and attribute values; output is compact, with no inter-tag
//! whitespace that a reader would render inside mixed content.

use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::writer::Writer;

use crate::convert::convert_html;
use crate::error::Result;
use crate::feed::Feed;

const FB2_NAMESPACE: &str = "http://www.gribuser.ru/xml/fictionbook/2.0";

/// Book-level settings supplied by the caller.
#[derive(Debug, Clone)]
pub struct BookOptions {
    /// FB2 genre codes for `title-info`.
    pub genres: Vec<String>,
    /// Book language, used for both `lang` and `src-lang`.
    pub lang: String,
}

impl Default for BookOptions {
    fn default() -> Self {
        Self {
            genres: vec!["ref_ref".to_string()],
            lang: "en".to_string(),
        }
    }
}

/// Serialize the whole book to `out`.
pub fn write_book<W: Write>(feed: &Feed, options: &BookOptions, out: W) -> Result<()> {
    let mut writer = Writer::new(out);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let mut root = BytesStart::new("FictionBook");
    root.push_attribute(("xmlns", FB2_NAMESPACE));
    writer.write_event(Event::Start(root))?;

    write_description(&mut writer, feed, options)?;
    write_body(&mut writer, feed)?;

    writer.write_event(Event::End(BytesEnd::new("FictionBook")))?;
    log::debug!("Wrote book '{}'", feed.title);
    Ok(())
}

fn write_description<W: Write>(
    writer: &mut Writer<W>,
    feed: &Feed,
    options: &BookOptions,
) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("description")))?;

    writer.write_event(Event::Start(BytesStart::new("title-info")))?;
    for genre in &options.genres {
        text_element(writer, "genre", genre)?;
    }
    let (first_name, last_name) = split_author_name(&feed.author.name);
    writer.write_event(Event::Start(BytesStart::new("author")))?;
    text_element(writer, "first-name", first_name)?;
    text_element(writer, "last-name", last_name)?;
    text_element(writer, "home-page", &feed.author.uri)?;
    text_element(writer, "email", &feed.author.email)?;
    writer.write_event(Event::End(BytesEnd::new("author")))?;
    text_element(writer, "book-title", &feed.title)?;
    writer.write_event(Event::Start(BytesStart::new("annotation")))?;
    text_element(writer, "p", &feed.subtitle)?;
    writer.write_event(Event::End(BytesEnd::new("annotation")))?;
    date_element(
        writer,
        &feed.updated.format("%Y-%m-%d").to_string(),
        &feed.updated.format("%Y").to_string(),
    )?;
    text_element(writer, "lang", &options.lang)?;
    text_element(writer, "src-lang", &options.lang)?;
    writer.write_event(Event::End(BytesEnd::new("title-info")))?;

    writer.write_event(Event::Start(BytesStart::new("document-info")))?;
    writer.write_event(Event::Start(BytesStart::new("author")))?;
    text_element(writer, "nickname", &login_name())?;
    writer.write_event(Event::End(BytesEnd::new("author")))?;
    text_element(
        writer,
        "program-used",
        concat!(env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION")),
    )?;
    let today = chrono::Local::now();
    date_element(
        writer,
        &today.format("%Y-%m-%d").to_string(),
        &today.format("%d %B, %Y").to_string(),
    )?;
    text_element(writer, "src-url", &feed.link)?;
    text_element(writer, "id", &feed.id)?;
    text_element(writer, "version", &feed.updated.timestamp().to_string())?;
    writer.write_event(Event::End(BytesEnd::new("document-info")))?;

    writer.write_event(Event::End(BytesEnd::new("description")))?;
    Ok(())
}

/// Sections run oldest first, reversing the newest-first feed order.
fn write_body<W: Write>(writer: &mut Writer<W>, feed: &Feed) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("body")))?;

    writer.write_event(Event::Start(BytesStart::new("title")))?;
    text_element(writer, "p", &feed.author.name)?;
    text_element(writer, "p", &feed.title)?;
    writer.write_event(Event::End(BytesEnd::new("title")))?;

    for entry in feed.entries.iter().rev() {
        writer.write_event(Event::Start(BytesStart::new("section")))?;
        writer.write_event(Event::Start(BytesStart::new("title")))?;
        text_element(writer, "p", &entry.title)?;
        writer.write_event(Event::End(BytesEnd::new("title")))?;
        text_element(
            writer,
            "subtitle",
            &entry.published.format("%d %B, %Y").to_string(),
        )?;

        let fragment = convert_html(&entry.content)?;
        for &root in fragment.roots() {
            fragment.write_node(writer, root)?;
        }
        log::debug!("Converted entry '{}'", entry.title);

        writer.write_event(Event::End(BytesEnd::new("section")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("body")))?;
    Ok(())
}

fn text_element<W: Write>(writer: &mut Writer<W>, tag: &str, text: &str) -> std::io::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    if !text.is_empty() {
        writer.write_event(Event::Text(BytesText::new(text)))?;
    }
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

fn date_element<W: Write>(writer: &mut Writer<W>, value: &str, text: &str) -> std::io::Result<()> {
    let mut date = BytesStart::new("date");
    date.push_attribute(("value", value));
    writer.write_event(Event::Start(date))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new("date")))?;
    Ok(())
}

/// Split on the first whitespace run. A single-word name keeps the whole
/// name as the first name and leaves the last name empty.
fn split_author_name(name: &str) -> (&str, &str) {
    match name.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, rest.trim_start()),
        None => (name, ""),
    }
}

fn login_name() -> String {
    std::env::var("LOGNAME")
        .or_else(|_| std::env::var("USER"))
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}
