//! Defines the [`FrontMatter`] type and the [`parse`] function, which splits
//! a post source file into its YAML header and its Markdown body.
//!
//! A post source file is structured as follows:
//!
//! ```md
//! ---
//! title: Hello, world!
//! date: 2024-04-16
//! tags: [greet]
//! ---
//! # Hello
//!
//! World
//! ```
//!
//! The opening delimiter must be the very first bytes of the file.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::fmt;

/// The line which opens and closes the front matter block.
const DELIMITER: &str = "---\n";

/// The metadata header of a post. There is deliberately no [`Default`]
/// implementation: a [`FrontMatter`] only exists as the result of a
/// successful [`parse`].
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct FrontMatter {
    /// The title of the post.
    #[serde(default)]
    pub title: String,

    /// The publish date of the post. Posts are ordered by this field.
    #[serde(deserialize_with = "deserialize_date")]
    pub date: DateTime<FixedOffset>,

    /// The tags associated with the post, in source order. Duplicates are
    /// kept.
    #[serde(default)]
    pub tags: Vec<String>,

    /// The layout named by the post. Not used for rendering.
    #[serde(default)]
    pub layout: String,
}

/// Splits `input` on the first two [`DELIMITER`] lines and deserializes the
/// header. Returns the [`FrontMatter`] and the body, which is returned
/// verbatim (it is not trimmed, and it may be empty).
pub fn parse(input: &str) -> Result<(FrontMatter, &str)> {
    let mut segments = input.splitn(3, DELIMITER);
    let (leading, header, body) =
        match (segments.next(), segments.next(), segments.next()) {
            (Some(leading), Some(header), Some(body)) => (leading, header, body),
            _ => return Err(Error::MissingDelimiters),
        };

    if !leading.is_empty() {
        return Err(Error::LeadingContent);
    }

    let front_matter: FrontMatter = serde_yaml::from_str(header)?;
    Ok((front_matter, body))
}

/// Parses the date spellings a YAML timestamp can take. Dates without an
/// offset are interpreted as UTC, and bare dates as midnight UTC.
pub fn parse_date(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(s) {
        return Some(date);
    }

    for format in &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive).into());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive).into())
}

fn deserialize_date<'de, D>(deserializer: D) -> std::result::Result<DateTime<FixedOffset>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_date(&s).ok_or_else(|| D::Error::custom(format!("Invalid date `{}`", s)))
}

/// Represents the result of a front matter parse.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error splitting or deserializing front matter.
#[derive(Debug)]
pub enum Error {
    /// Returned when fewer than two `---` lines were found.
    MissingDelimiters,

    /// Returned when anything (including whitespace or a byte order mark)
    /// precedes the opening `---` line.
    LeadingContent,

    /// Returned when the header isn't valid YAML or doesn't fit the
    /// [`FrontMatter`] shape.
    HeaderFormat(serde_yaml::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MissingDelimiters => {
                write!(f, "Could not find both front matter delimiters")
            }
            Error::LeadingContent => {
                write!(f, "Data before front matter start delimiter")
            }
            Error::HeaderFormat(err) => {
                write!(f, "Bad front matter format: {}", err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::MissingDelimiters => None,
            Error::LeadingContent => None,
            Error::HeaderFormat(err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::HeaderFormat(err)
    }
}
