//! Writes the listing pages of a site: the index page (the most recent
//! posts), the archive page (every post), and one page per tag. See
//! [`Writer`].

use crate::corpus::{Corpus, TagIndex, HTML_EXTENSION};
use crate::template::{listing_data, tag_data, Render};
use gtmpl::Value;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The number of posts on the index page.
pub const INDEX_PAGE_SIZE: usize = 5;

/// The index page's path relative to the output directory.
pub const INDEX_PAGE: &str = "index.html";

/// The archive page's path relative to the output directory.
pub const ARCHIVE_PAGE: &str = "archive.html";

/// The directory, relative to the output directory, holding the tag pages.
pub const TAG_DIRECTORY: &str = "tag";

/// Responsible for templating the listing pages of a [`Corpus`] and writing
/// them to disk.
pub struct Writer<'a> {
    /// The root of the output site.
    pub output_directory: &'a Path,

    /// The template for the index page.
    pub index_template: &'a dyn Render,

    /// The template for the archive page.
    pub archive_template: &'a dyn Render,

    /// The template for tag pages.
    pub tag_template: &'a dyn Render,
}

impl Writer<'_> {
    /// Writes the index page, the archive page and the tag pages, in that
    /// order.
    pub fn write_pages(&self, corpus: &Corpus, tags: &TagIndex) -> Result<()> {
        self.write_index_page(corpus)?;
        self.write_archive_page(corpus)?;
        self.write_tag_pages(corpus, tags)
    }

    /// Writes the [`INDEX_PAGE_SIZE`] most recent posts to [`INDEX_PAGE`].
    pub fn write_index_page(&self, corpus: &Corpus) -> Result<()> {
        self.write_page(
            self.index_template,
            listing_data(corpus.most_recent(INDEX_PAGE_SIZE).iter()),
            &self.output_directory.join(INDEX_PAGE),
        )
    }

    /// Writes every post to [`ARCHIVE_PAGE`].
    pub fn write_archive_page(&self, corpus: &Corpus) -> Result<()> {
        self.write_page(
            self.archive_template,
            listing_data(corpus.posts().iter()),
            &self.output_directory.join(ARCHIVE_PAGE),
        )
    }

    /// Writes one page per tag to `{TAG_DIRECTORY}/{tag}.html`, creating the
    /// tag directory if necessary.
    pub fn write_tag_pages(&self, corpus: &Corpus, tags: &TagIndex) -> Result<()> {
        let tag_directory = self.output_directory.join(TAG_DIRECTORY);
        fs::create_dir_all(&tag_directory).map_err(|err| Error::OutputWrite {
            path: tag_directory.clone(),
            err,
        })?;

        for tag in tags.tags() {
            self.write_page(
                self.tag_template,
                tag_data(tag, tags.posts(tag, corpus)),
                &tag_directory.join(tag_file_name(tag)?),
            )?;
        }
        Ok(())
    }

    /// Renders `data` with `template` and writes the result to `file_path`.
    fn write_page(&self, template: &dyn Render, data: Value, file_path: &Path) -> Result<()> {
        let page = template.render(data).map_err(|err| Error::Render {
            path: file_path.to_owned(),
            err,
        })?;
        fs::write(file_path, page).map_err(|err| Error::OutputWrite {
            path: file_path.to_owned(),
            err,
        })?;
        debug!(page = %file_path.display(), "wrote page");
        Ok(())
    }
}

/// Returns the file name of a tag's page. The tag is used verbatim, so a tag
/// which can't be a single path component is rejected rather than rewritten.
pub fn tag_file_name(tag: &str) -> Result<String> {
    if tag.is_empty() || tag.contains(|c: char| c == '/' || c == '\\' || c == '\0') {
        return Err(Error::InvalidTagPath(tag.to_owned()));
    }
    Ok(format!("{}.{}", tag, HTML_EXTENSION))
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// An error during templating.
    Render { path: PathBuf, err: String },

    /// An error creating or writing an output file.
    OutputWrite { path: PathBuf, err: io::Error },

    /// Returned for tags which can't be used as a file name.
    InvalidTagPath(String),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Render { path, err } => {
                write!(f, "Executing template for `{}`: {}", path.display(), err)
            }
            Error::OutputWrite { path, err } => {
                write!(f, "Writing `{}`: {}", path.display(), err)
            }
            Error::InvalidTagPath(tag) => {
                write!(f, "Tag {:?} can't be used as a file name", tag)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Render { .. } => None,
            Error::OutputWrite { path: _, err } => Some(err),
            Error::InvalidTagPath(_) => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::corpus::PostRecord;
    use crate::frontmatter::parse_date;

    /// Renders a listing page as `{Tag}|{Path},{Path},...`.
    fn listing_page(data: Value) -> std::result::Result<String, String> {
        let m = match data {
            Value::Object(m) => m,
            _ => return Err(String::from("not an object")),
        };
        if !matches!(m.get("Flash"), Some(Value::String(s)) if s.is_empty()) {
            return Err(String::from("no Flash"));
        }
        let tag = match m.get("Tag") {
            Some(Value::String(tag)) => tag.clone(),
            _ => String::new(),
        };
        let posts = match m.get("Posts") {
            Some(Value::Array(posts)) => posts
                .iter()
                .map(|post| match post {
                    Value::Object(p) => match p.get("Path") {
                        Some(Value::String(path)) => Ok(path.clone()),
                        _ => Err(String::from("no Path")),
                    },
                    _ => Err(String::from("post is not an object")),
                })
                .collect::<std::result::Result<Vec<String>, String>>()?,
            _ => return Err(String::from("no Posts")),
        };
        Ok(format!("{}|{}", tag, posts.join(",")))
    }

    fn failing(_: Value) -> std::result::Result<String, String> {
        Err(String::from("can't evaluate field Nope"))
    }

    fn corpus(n: usize) -> Corpus {
        Corpus::new(
            (1..=n)
                .map(|day| PostRecord {
                    output_path: format!("{}.html", day),
                    title: format!("Day {}", day),
                    tags: match day % 2 {
                        0 => vec![String::from("even")],
                        _ => vec![String::from("odd")],
                    },
                    date: parse_date(&format!("2024-01-{:02}", day)).unwrap(),
                })
                .collect(),
        )
    }

    fn writer(output_directory: &Path) -> Writer {
        Writer {
            output_directory,
            index_template: &listing_page,
            archive_template: &listing_page,
            tag_template: &listing_page,
        }
    }

    fn read(path: PathBuf) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_index_page_holds_five_most_recent() -> Result<()> {
        let output = tempfile::tempdir().unwrap();
        writer(output.path()).write_index_page(&corpus(7))?;
        assert_eq!(
            "|7.html,6.html,5.html,4.html,3.html",
            read(output.path().join(INDEX_PAGE))
        );
        Ok(())
    }

    #[test]
    fn test_index_page_with_few_posts() -> Result<()> {
        let output = tempfile::tempdir().unwrap();
        writer(output.path()).write_index_page(&corpus(3))?;
        assert_eq!("|3.html,2.html,1.html", read(output.path().join(INDEX_PAGE)));
        Ok(())
    }

    #[test]
    fn test_archive_page_holds_every_post() -> Result<()> {
        let output = tempfile::tempdir().unwrap();
        writer(output.path()).write_archive_page(&corpus(7))?;
        assert_eq!(
            "|7.html,6.html,5.html,4.html,3.html,2.html,1.html",
            read(output.path().join(ARCHIVE_PAGE))
        );
        Ok(())
    }

    #[test]
    fn test_tag_pages() -> Result<()> {
        let output = tempfile::tempdir().unwrap();
        let corpus = corpus(4);
        let tags = TagIndex::new(&corpus);
        writer(output.path()).write_pages(&corpus, &tags)?;

        let tag_directory = output.path().join(TAG_DIRECTORY);
        assert_eq!("even|4.html,2.html", read(tag_directory.join("even.html")));
        assert_eq!("odd|3.html,1.html", read(tag_directory.join("odd.html")));
        assert_eq!(2, fs::read_dir(&tag_directory).unwrap().count());
        Ok(())
    }

    #[test]
    fn test_tag_file_name() {
        assert_eq!("rust.html", tag_file_name("rust").unwrap());
        assert_eq!("Rust Lang.html", tag_file_name("Rust Lang").unwrap());
        for tag in &["", "a/b", "../escape", "a\\b"] {
            match tag_file_name(tag) {
                Err(Error::InvalidTagPath(t)) => assert_eq!(*tag, t),
                other => panic!("{:?}: wanted InvalidTagPath, got {:?}", tag, other),
            }
        }
    }

    #[test]
    fn test_render_failure() {
        let output = tempfile::tempdir().unwrap();
        let writer = Writer {
            output_directory: output.path(),
            index_template: &listing_page,
            archive_template: &failing,
            tag_template: &listing_page,
        };
        match writer.write_archive_page(&corpus(2)) {
            Err(Error::Render { path, err }) => {
                assert_eq!(output.path().join(ARCHIVE_PAGE), path);
                assert_eq!("can't evaluate field Nope", err);
            }
            other => panic!("wanted Render, got {:?}", other),
        }
        assert!(!output.path().join(ARCHIVE_PAGE).exists());
    }

    #[test]
    fn test_missing_output_directory() {
        let output = tempfile::tempdir().unwrap();
        let missing = output.path().join("missing");
        match writer(&missing).write_index_page(&corpus(1)) {
            Err(Error::OutputWrite { path, .. }) => assert_eq!(missing.join(INDEX_PAGE), path),
            other => panic!("wanted OutputWrite, got {:?}", other),
        }
    }
}
