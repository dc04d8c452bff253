//! Builds the in-memory index of a site. [`CorpusBuilder`] renders every post
//! source file to its page and collects a [`PostRecord`] for each one. The
//! records are ordered into a [`Corpus`] (most recent first, see
//! [`sort_posts`]) and grouped by tag into a [`TagIndex`].
//!
//! The [`TagIndex`] stores positions into the [`Corpus`], so it is only ever
//! built from a [`Corpus`], which is sorted on construction and can't be
//! mutated afterwards. Since the corpus is walked in order, each tag's
//! positions are in descending date order as well.

use crate::post;
use crate::template::Render;
use crate::write::{ARCHIVE_PAGE, INDEX_PAGE};
use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// The extension of post source files.
pub const MARKDOWN_EXTENSION: &str = "md";

/// The extension of rendered pages.
pub const HTML_EXTENSION: &str = "html";

/// A post's projection into the site index.
#[derive(Clone, Debug, PartialEq)]
pub struct PostRecord {
    /// The path of the post page relative to the output directory, e.g.
    /// `hello.html`.
    pub output_path: String,

    /// The title of the post.
    pub title: String,

    /// The post's tags, as written in its front matter.
    pub tags: Vec<String>,

    /// The publish date of the post.
    pub date: DateTime<FixedOffset>,
}

/// Orders `posts` by date, most recent first. The sort is stable, so posts
/// sharing a date keep their relative order.
pub fn sort_posts(posts: &mut [PostRecord]) {
    posts.sort_by(|a, b| b.date.cmp(&a.date));
}

/// All of the posts of one build, most recent first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Corpus {
    posts: Vec<PostRecord>,
}

impl Corpus {
    /// Sorts `posts` (see [`sort_posts`]) into a [`Corpus`].
    pub fn new(mut posts: Vec<PostRecord>) -> Corpus {
        sort_posts(&mut posts);
        Corpus { posts }
    }

    pub fn posts(&self) -> &[PostRecord] {
        &self.posts
    }

    /// Returns the `n` most recent posts, or all of them if there are fewer
    /// than `n`.
    pub fn most_recent(&self, n: usize) -> &[PostRecord] {
        &self.posts[..n.min(self.posts.len())]
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

/// Maps each tag to the positions in a [`Corpus`] of the posts carrying it.
/// Tags iterate in the order they were first seen. Tags are compared
/// exactly; `Rust` and `rust` are different tags.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TagIndex {
    tags: IndexMap<String, Vec<usize>>,
}

impl TagIndex {
    /// Indexes `corpus` by walking it in order. A post listing the same tag
    /// twice appears twice under that tag.
    pub fn new(corpus: &Corpus) -> TagIndex {
        let mut tags: IndexMap<String, Vec<usize>> = IndexMap::new();
        for (i, post) in corpus.posts().iter().enumerate() {
            for tag in &post.tags {
                tags.entry(tag.clone()).or_insert_with(Vec::new).push(i);
            }
        }
        TagIndex { tags }
    }

    /// Iterates over the tag labels.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(String::as_str)
    }

    /// Returns the corpus positions for `tag`, if any post carries it.
    pub fn positions(&self, tag: &str) -> Option<&[usize]> {
        self.tags.get(tag).map(Vec::as_slice)
    }

    /// Resolves the positions for `tag` back into the posts of `corpus`,
    /// which must be the corpus this index was built from.
    pub fn posts<'a>(
        &'a self,
        tag: &str,
        corpus: &'a Corpus,
    ) -> impl Iterator<Item = &'a PostRecord> + 'a {
        self.positions(tag)
            .unwrap_or(&[])
            .iter()
            .map(move |&i| &corpus.posts[i])
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Renders post source files to pages and indexes them.
pub struct CorpusBuilder<'a> {
    /// The directory searched for `*.md` post source files. Subdirectories
    /// are not searched.
    source_directory: &'a Path,

    /// The directory in which post pages are written.
    output_directory: &'a Path,

    /// The renderer for post pages.
    renderer: &'a dyn Render,
}

impl<'a> CorpusBuilder<'a> {
    /// Constructs a new builder. See fields on [`CorpusBuilder`] for argument
    /// descriptions.
    pub fn new(
        source_directory: &'a Path,
        output_directory: &'a Path,
        renderer: &'a dyn Render,
    ) -> CorpusBuilder<'a> {
        CorpusBuilder {
            source_directory,
            output_directory,
            renderer,
        }
    }

    /// Renders and writes every post, then returns the sorted [`Corpus`] and
    /// its [`TagIndex`]. The first failing post aborts the build; pages
    /// written before it are left on disk.
    pub fn build(&self) -> Result<(Corpus, TagIndex)> {
        let mut posts = Vec::new();
        for source in self.sources()? {
            posts.push(self.build_post(&source)?);
        }

        let corpus = Corpus::new(posts);
        let tags = TagIndex::new(&corpus);
        info!(posts = corpus.len(), tags = tags.len(), "indexed posts");
        Ok((corpus, tags))
    }

    /// Lists the post source files. The list is sorted by file name so that
    /// posts sharing a date always end up in the same order.
    fn sources(&self) -> Result<Vec<PathBuf>> {
        let mut sources = Vec::new();
        for result in WalkDir::new(self.source_directory)
            .min_depth(1)
            .max_depth(1)
        {
            let entry = result.map_err(|err| Error::SourceRead {
                path: self.source_directory.to_owned(),
                err: err.into(),
            })?;
            if entry.file_type().is_file()
                && entry.path().extension().map_or(false, |ext| ext == MARKDOWN_EXTENSION)
            {
                sources.push(entry.into_path());
            }
        }
        sources.sort();
        Ok(sources)
    }

    fn build_post(&self, source: &Path) -> Result<PostRecord> {
        let output_path = post_file_name(source)?;
        let input = fs::read_to_string(source).map_err(|err| Error::SourceRead {
            path: source.to_owned(),
            err,
        })?;

        let (page, front_matter) =
            post::render(&input, self.renderer).map_err(|err| Error::Post {
                path: source.to_owned(),
                err,
            })?;

        let file_path = self.output_directory.join(&output_path);
        fs::write(&file_path, page).map_err(|err| Error::OutputWrite {
            path: file_path.clone(),
            err,
        })?;
        debug!(source = %source.display(), page = %file_path.display(), "wrote post");

        Ok(PostRecord {
            output_path,
            title: front_matter.title,
            tags: front_matter.tags,
            date: front_matter.date,
        })
    }
}

/// Returns the page name for the post at `source`: its file stem with an
/// `.html` extension. Stems which aren't valid UTF-8, and stems which would
/// collide with the index or archive page, are rejected.
pub fn post_file_name(source: &Path) -> Result<String> {
    let invalid = || Error::InvalidPostName(source.to_owned());
    let stem = source.file_stem().ok_or_else(invalid)?.to_str().ok_or_else(invalid)?;
    let output_path = format!("{}.{}", stem, HTML_EXTENSION);
    if output_path == INDEX_PAGE || output_path == ARCHIVE_PAGE {
        return Err(invalid());
    }
    Ok(output_path)
}

/// Represents the result of building a [`Corpus`].
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error building a [`Corpus`].
#[derive(Debug)]
pub enum Error {
    /// Returned when the source directory or a source file can't be read.
    SourceRead { path: PathBuf, err: io::Error },

    /// Returned when a post fails to render.
    Post { path: PathBuf, err: post::Error },

    /// Returned when a post page can't be written.
    OutputWrite { path: PathBuf, err: io::Error },

    /// Returned when a source file's name can't be used for its page.
    InvalidPostName(PathBuf),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::SourceRead { path, err } => {
                write!(f, "Reading `{}`: {}", path.display(), err)
            }
            Error::Post { path, err } => {
                write!(f, "Rendering post `{}`: {}", path.display(), err)
            }
            Error::OutputWrite { path, err } => {
                write!(f, "Writing `{}`: {}", path.display(), err)
            }
            Error::InvalidPostName(path) => {
                write!(f, "Post {:?} can't be used as a page name", path)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::SourceRead { path: _, err } => Some(err),
            Error::Post { path: _, err } => Some(err),
            Error::OutputWrite { path: _, err } => Some(err),
            Error::InvalidPostName(_) => None,
        }
    }
}
