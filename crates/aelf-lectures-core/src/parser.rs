//! Feed body parsing.
//!
//! The network layer hands the full response body to a [`FeedParser`] and
//! only cares about the outcome: a list of lectures, or a [`ParseError`].
//!
//! # Feed format
//!
//! ```text
//! <rss version="2.0">
//!   <channel>
//!     <item>
//!       <key>psaume1</key>
//!       <title>Psaume 62</title>
//!       <short_title>Psaume</short_title>
//!       <reference>Ps 62</reference>
//!       <description><![CDATA[<p>Dieu, tu es mon Dieu...</p>]]></description>
//!     </item>
//!   </channel>
//! </rss>
//! ```
//!
//! Items are only collected directly under `<rss><channel>`. `<guid>` is
//! accepted in place of `<key>`. Unknown children are ignored.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{ParseError, Result};
use crate::lecture::LectureItem;

/// Turns a raw feed body into lecture items.
///
/// Implementations must be pure: the same bytes always produce the same
/// result, and parsing has no side effects.
pub trait FeedParser: Send + Sync {
    /// Parse a complete feed body.
    fn parse(&self, body: &[u8]) -> Result<Vec<LectureItem>>;
}

impl<F> FeedParser for F
where
    F: Fn(&[u8]) -> Result<Vec<LectureItem>> + Send + Sync,
{
    fn parse(&self, body: &[u8]) -> Result<Vec<LectureItem>> {
        self(body)
    }
}

/// RSS feed parser built on quick-xml.
#[derive(Clone, Copy, Debug, Default)]
pub struct RssFeedParser;

impl RssFeedParser {
    /// Create a new parser.
    pub fn new() -> Self {
        Self
    }
}

impl FeedParser for RssFeedParser {
    fn parse(&self, body: &[u8]) -> Result<Vec<LectureItem>> {
        let mut reader = Reader::from_reader(body);
        let mut buf = Vec::new();

        // Open elements, outermost first.
        let mut stack: Vec<String> = Vec::new();
        let mut items = Vec::new();
        let mut current: Option<ItemFields> = None;
        let mut text = String::new();
        let mut saw_root = false;

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| ParseError::xml(reader.buffer_position() as u64, e.to_string()))?;

            match event {
                Event::Eof => break,
                Event::Start(start) => {
                    let name = String::from_utf8_lossy(start.name().as_ref()).to_string();
                    check_root(&stack, &name, &mut saw_root)?;
                    if is_item(&stack, &name) {
                        current = Some(ItemFields::default());
                    } else if parent_is(&stack, "item") {
                        text.clear();
                    }
                    stack.push(name);
                }
                Event::Empty(empty) => {
                    let name = String::from_utf8_lossy(empty.name().as_ref()).to_string();
                    check_root(&stack, &name, &mut saw_root)?;
                    if is_item(&stack, &name) {
                        items.push(ItemFields::default().finish());
                    }
                }
                Event::Text(chunk) => {
                    if current.is_some() {
                        let unescaped = chunk.unescape().map_err(|e| {
                            ParseError::xml(reader.buffer_position() as u64, e.to_string())
                        })?;
                        text.push_str(&unescaped);
                    }
                }
                Event::CData(cdata) => {
                    if current.is_some() {
                        text.push_str(&String::from_utf8_lossy(&cdata));
                    }
                }
                Event::End(_) => {
                    // quick-xml rejects mismatched end tags, so the top of the
                    // stack is the element being closed.
                    let Some(name) = stack.pop() else {
                        return Err(ParseError::xml(
                            reader.buffer_position() as u64,
                            "unexpected closing tag",
                        ));
                    };
                    if is_item(&stack, &name) {
                        if let Some(fields) = current.take() {
                            items.push(fields.finish());
                        }
                    } else if parent_is(&stack, "item") {
                        if let Some(fields) = current.as_mut() {
                            fields.set(&name, std::mem::take(&mut text));
                        }
                    }
                }
                _ => {}
            }
            buf.clear();
        }

        if let Some(open) = stack.pop() {
            return Err(ParseError::Truncated(open));
        }
        if !saw_root {
            return Err(ParseError::MissingRoot);
        }

        tracing::trace!(target: "aelf_lectures_core::parser", "Parsed {} lecture items", items.len());
        Ok(items)
    }
}

fn check_root(stack: &[String], name: &str, saw_root: &mut bool) -> Result<()> {
    if stack.is_empty() {
        if name != "rss" || *saw_root {
            return Err(ParseError::UnexpectedRoot(name.to_string()));
        }
        *saw_root = true;
    }
    Ok(())
}

fn parent_is(stack: &[String], name: &str) -> bool {
    stack.last().is_some_and(|parent| parent == name)
}

fn is_item(stack: &[String], name: &str) -> bool {
    name == "item" && stack.len() == 2 && stack[0] == "rss" && stack[1] == "channel"
}

#[derive(Default)]
struct ItemFields {
    key: Option<String>,
    guid: Option<String>,
    title: String,
    short_title: Option<String>,
    reference: String,
    description: String,
}

impl ItemFields {
    fn set(&mut self, field: &str, value: String) {
        let value = value.trim().to_string();
        match field {
            "key" => self.key = Some(value),
            "guid" => self.guid = Some(value),
            "title" => self.title = value,
            "short_title" => self.short_title = Some(value),
            "reference" => self.reference = value,
            "description" => self.description = value,
            _ => {}
        }
    }

    fn finish(self) -> LectureItem {
        let short_title = match self.short_title {
            Some(short) if !short.is_empty() => short,
            _ => self.title.clone(),
        };
        LectureItem {
            key: self.key.or(self.guid).unwrap_or_default(),
            title: self.title,
            short_title,
            reference: self.reference,
            description: self.description,
        }
    }
}
