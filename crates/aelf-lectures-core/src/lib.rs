//! Core types for AELF Lectures.
//!
//! This crate holds everything the network layer consumes but does not own:
//!
//! - **Offices**: the closed set of liturgical feeds ([`Office`]) and the
//!   calendar date they are requested for ([`OfficeDate`])
//! - **Lecture items**: the parsed entries of a feed ([`LectureItem`])
//! - **Feed parsing**: a pure bytes-in, items-out contract ([`FeedParser`])
//!   with an RSS implementation built on quick-xml ([`RssFeedParser`])
//! - **Preferences**: a read-only view over named options ([`Preferences`])
//!   and a thread-safe store implementing it ([`Settings`])
//!
//! # Example
//!
//! ```ignore
//! use aelf_lectures_core::{FeedParser, Office, OfficeDate, RssFeedParser};
//!
//! let date: OfficeDate = "2024-03-01".parse()?;
//! println!("{} for {}", Office::Lauds, date);
//!
//! let lectures = RssFeedParser::new().parse(body)?;
//! for lecture in &lectures {
//!     println!("{}: {}", lecture.short_title, lecture.reference);
//! }
//! ```

mod error;
mod lecture;
mod office;
pub mod parser;
pub mod preferences;

pub use error::{ConfigError, ParseError, Result};
pub use lecture::LectureItem;
pub use office::{Office, OfficeDate, UnknownOffice};
pub use parser::{FeedParser, RssFeedParser};
pub use preferences::{PreferenceValue, Preferences, Settings};
