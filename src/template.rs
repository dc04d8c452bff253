//! The render service. Pages are rendered through the [`Render`] trait, which
//! takes a [`Value`] and produces the page text. [`Layout`] implements it on
//! top of [`gtmpl`] (Go's `text/template`), and [`Theme`] bundles one
//! renderer per kind of page.
//!
//! This module also defines the shapes of the values handed to templates:
//!
//! * post pages get `{FrontMatter, Content, Flash}`
//! * the index and archive pages get `{Posts, Flash}`
//! * tag pages get `{Posts, Flash, Tag}`
//!
//! `Flash` is always empty; it is reserved for transient messages.

use crate::corpus::PostRecord;
use crate::frontmatter::FrontMatter;
use chrono::{DateTime, FixedOffset};
use gtmpl::{Context, Template, Value};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// The name of the template definition every page is rendered through.
pub const BASE_TEMPLATE: &str = "base";

/// The shared layout, which defines [`BASE_TEMPLATE`].
pub const BASE_TEMPLATE_FILE: &str = "base_template.html";

/// Renders template data into page text. Errors are reported as text, the
/// way [`gtmpl`] reports them.
pub trait Render {
    fn render(&self, data: Value) -> std::result::Result<String, String>;
}

impl<F> Render for F
where
    F: Fn(Value) -> std::result::Result<String, String>,
{
    fn render(&self, data: Value) -> std::result::Result<String, String> {
        self(data)
    }
}

/// A parsed template set whose entry point is the [`BASE_TEMPLATE`]
/// definition.
pub struct Layout {
    template: Template,
}

impl Layout {
    /// Parses `source`, which must define [`BASE_TEMPLATE`] (and whatever
    /// the base template itself invokes).
    pub fn parse(source: &str) -> std::result::Result<Layout, String> {
        let mut template = Template::default();
        template.parse(format!(
            "{}{{{{template \"{}\" .}}}}",
            source, BASE_TEMPLATE
        ))?;
        Ok(Layout { template })
    }

    /// Loads the template file contents, concatenates them, and parses the
    /// result.
    pub fn load<P: AsRef<Path>>(files: impl Iterator<Item = P>) -> Result<Layout> {
        let mut contents = String::new();
        let mut paths = Vec::new();
        for file in files {
            let file = file.as_ref();
            File::open(file)
                .map_err(|err| Error::OpenTemplateFile {
                    path: file.to_owned(),
                    err,
                })?
                .read_to_string(&mut contents)?;
            contents.push(' ');
            paths.push(file.to_owned());
        }

        Layout::parse(&contents).map_err(|err| Error::ParseTemplate { paths, err })
    }
}

impl Render for Layout {
    fn render(&self, data: Value) -> std::result::Result<String, String> {
        let context = Context::from(data)?;
        let mut out: Vec<u8> = Vec::new();
        self.template.execute(&mut out, &context)?;
        String::from_utf8(out).map_err(|err| err.to_string())
    }
}

/// One renderer per kind of page. When loaded from disk, each one is a
/// [`Layout`] made of the base template file followed by the page's own
/// template file.
pub struct Theme {
    pub post: Box<dyn Render>,
    pub index: Box<dyn Render>,
    pub archive: Box<dyn Render>,
    pub tag: Box<dyn Render>,
}

impl Theme {
    /// Loads the theme from `templates_directory`, which must contain
    /// [`BASE_TEMPLATE_FILE`], `post_template.html`, `index_template.html`,
    /// `archive_template.html` and `tag_template.html`.
    pub fn load(templates_directory: &Path) -> Result<Theme> {
        let layout = |page: &str| -> Result<Box<dyn Render>> {
            let layout = Layout::load(
                [BASE_TEMPLATE_FILE, page]
                    .iter()
                    .map(|name| templates_directory.join(name)),
            )?;
            Ok(Box::new(layout))
        };

        Ok(Theme {
            post: layout("post_template.html")?,
            index: layout("index_template.html")?,
            archive: layout("archive_template.html")?,
            tag: layout("tag_template.html")?,
        })
    }
}

fn date_value(date: &DateTime<FixedOffset>) -> Value {
    Value::String(date.format("%Y-%m-%d").to_string())
}

fn tags_value(tags: &[String]) -> Value {
    Value::Array(tags.iter().map(|tag| Value::String(tag.clone())).collect())
}

impl From<&FrontMatter> for Value {
    /// Converts a [`FrontMatter`] into `{Title, Date, Tags, Layout}`.
    fn from(front_matter: &FrontMatter) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("Title".to_owned(), Value::String(front_matter.title.clone()));
        m.insert("Date".to_owned(), date_value(&front_matter.date));
        m.insert("Tags".to_owned(), tags_value(&front_matter.tags));
        m.insert("Layout".to_owned(), Value::String(front_matter.layout.clone()));
        Value::Object(m)
    }
}

impl From<&PostRecord> for Value {
    /// Converts a [`PostRecord`] into `{Path, Title, Tags, Date}`.
    fn from(post: &PostRecord) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("Path".to_owned(), Value::String(post.output_path.clone()));
        m.insert("Title".to_owned(), Value::String(post.title.clone()));
        m.insert("Tags".to_owned(), tags_value(&post.tags));
        m.insert("Date".to_owned(), date_value(&post.date));
        Value::Object(m)
    }
}

/// The data for a post page.
pub fn post_data(front_matter: &FrontMatter, content: String) -> Value {
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("FrontMatter".to_owned(), front_matter.into());
    m.insert("Content".to_owned(), Value::String(content));
    m.insert("Flash".to_owned(), Value::String(String::new()));
    Value::Object(m)
}

/// The data for the index and archive pages.
pub fn listing_data<'a>(posts: impl Iterator<Item = &'a PostRecord>) -> Value {
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("Posts".to_owned(), Value::Array(posts.map(Value::from).collect()));
    m.insert("Flash".to_owned(), Value::String(String::new()));
    Value::Object(m)
}

/// The data for a tag page.
pub fn tag_data<'a>(tag: &str, posts: impl Iterator<Item = &'a PostRecord>) -> Value {
    let mut value = listing_data(posts);
    if let Value::Object(m) = &mut value {
        m.insert("Tag".to_owned(), Value::String(tag.to_owned()));
    }
    value
}

/// The result of loading templates.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading templates.
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O problems while opening template files.
    OpenTemplateFile { path: PathBuf, err: io::Error },

    /// Returned for errors parsing template files.
    ParseTemplate { paths: Vec<PathBuf>, err: String },

    /// Returned for other I/O errors.
    Io(io::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::ParseTemplate { paths, err } => {
                write!(f, "Parsing templates {:?}: {}", paths, err)
            }
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::ParseTemplate { .. } => None,
            Error::Io(err) => Some(err),
        }
    }
}

impl From<io::Error> for Error {
    /// Converts [`io::Error`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}
