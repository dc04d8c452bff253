//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: rendering and indexing the posts
//! ([`crate::corpus`]), writing the index, archive and tag pages
//! ([`crate::write`]), and linking the stylesheets from the static directory
//! into the output directory.

use crate::config::Config;
use crate::corpus::{self, CorpusBuilder};
use crate::frontmatter;
use crate::post;
use crate::template::{self, Theme};
use crate::write::{self, Writer, TAG_DIRECTORY};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// The extension of the static files linked into the output directory.
const CSS_EXTENSION: &str = "css";

/// Counts of what a build produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub posts: usize,
    pub tags: usize,
    pub static_files: usize,
}

/// Loads the [`Theme`] from the configured templates directory and builds
/// the site with it. See [`build_site`].
pub fn build(config: &Config) -> Result<BuildSummary> {
    let theme = Theme::load(&config.templates_directory)?;
    build_site(config, &theme)
}

/// Builds the site described by `config` with the templates of `theme`. The
/// build stops at the first error; pages written before it stay on disk.
pub fn build_site(config: &Config, theme: &Theme) -> Result<BuildSummary> {
    prepare_output_directory(&config.output_directory)?;

    // render, write and index the posts
    let (corpus, tags) = CorpusBuilder::new(
        &config.source_directory,
        &config.output_directory,
        &*theme.post,
    )
    .build()?;

    // write the listing pages
    let writer = Writer {
        output_directory: &config.output_directory,
        index_template: &*theme.index,
        archive_template: &*theme.archive,
        tag_template: &*theme.tag,
    };
    writer.write_pages(&corpus, &tags)?;

    let static_files = link_static_files(&config.static_directory, &config.output_directory)?;

    let summary = BuildSummary {
        posts: corpus.len(),
        tags: tags.len(),
        static_files,
    };
    info!(
        posts = summary.posts,
        tags = summary.tags,
        static_files = summary.static_files,
        output = %config.output_directory.display(),
        "built site"
    );
    Ok(summary)
}

/// Creates the output directory. The tag directory is removed so that pages
/// for tags which no longer exist don't linger. The rest of the output
/// directory is overwritten in place; we don't naively delete it in case the
/// wrong directory was passed.
fn prepare_output_directory(output_directory: &Path) -> Result<()> {
    let tag_directory = output_directory.join(TAG_DIRECTORY);
    match fs::remove_dir_all(&tag_directory) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(Error::Prepare {
                path: tag_directory,
                err,
            })
        }
    }

    fs::create_dir_all(output_directory).map_err(|err| Error::Prepare {
        path: output_directory.to_owned(),
        err,
    })
}

/// Hard links each `*.css` file directly inside `static_directory` into
/// `output_directory`, replacing any existing file. Falls back to copying
/// when the link can't be made (e.g., across file systems). Returns the
/// number of files linked or copied.
fn link_static_files(static_directory: &Path, output_directory: &Path) -> Result<usize> {
    let mut count = 0;
    for result in WalkDir::new(static_directory).min_depth(1).max_depth(1) {
        let entry = result.map_err(|err| Error::StaticFiles {
            path: static_directory.to_owned(),
            err: err.into(),
        })?;
        if !entry.file_type().is_file()
            || entry.path().extension().map_or(true, |ext| ext != CSS_EXTENSION)
        {
            continue;
        }

        let destination = output_directory.join(entry.file_name());
        link_or_copy(entry.path(), &destination).map_err(|err| Error::StaticFiles {
            path: entry.path().to_owned(),
            err,
        })?;
        count += 1;
    }
    Ok(count)
}

fn link_or_copy(source: &Path, destination: &Path) -> io::Result<()> {
    match fs::remove_file(destination) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }

    if let Err(err) = fs::hard_link(source, destination) {
        warn!(
            source = %source.display(),
            error = %err,
            "couldn't hard link static file; copying instead"
        );
        fs::copy(source, destination)?;
    }
    Ok(())
}

/// The kind of a build [`Error`], independent of the stage it was wrapped
/// in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    MissingDelimiters,
    LeadingContent,
    HeaderFormat,
    Render,
    OutputWrite,
    SourceRead,
    InvalidTagPath,
    InvalidPostName,
    Template,
    StaticFiles,
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Each variant names the stage which
/// failed; [`Error::kind`] recovers the underlying kind.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors loading the theme.
    Template(template::Error),

    /// Returned for I/O problems while preparing the output directory.
    Prepare { path: PathBuf, err: io::Error },

    /// Returned for errors rendering, writing or reading posts.
    Corpus(corpus::Error),

    /// Returned for errors writing the index, archive or tag pages.
    Write(write::Error),

    /// Returned for I/O problems while linking static files.
    StaticFiles { path: PathBuf, err: io::Error },
}

impl Error {
    /// Returns the [`ErrorKind`] of the innermost error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Template(_) => ErrorKind::Template,
            Error::Prepare { .. } => ErrorKind::OutputWrite,
            Error::Corpus(corpus::Error::SourceRead { .. }) => ErrorKind::SourceRead,
            Error::Corpus(corpus::Error::OutputWrite { .. }) => ErrorKind::OutputWrite,
            Error::Corpus(corpus::Error::InvalidPostName(_)) => ErrorKind::InvalidPostName,
            Error::Corpus(corpus::Error::Post { err, .. }) => match err {
                post::Error::FrontMatter(frontmatter::Error::MissingDelimiters) => {
                    ErrorKind::MissingDelimiters
                }
                post::Error::FrontMatter(frontmatter::Error::LeadingContent) => {
                    ErrorKind::LeadingContent
                }
                post::Error::FrontMatter(frontmatter::Error::HeaderFormat(_)) => {
                    ErrorKind::HeaderFormat
                }
                post::Error::Render(_) => ErrorKind::Render,
            },
            Error::Write(write::Error::Render { .. }) => ErrorKind::Render,
            Error::Write(write::Error::OutputWrite { .. }) => ErrorKind::OutputWrite,
            Error::Write(write::Error::InvalidTagPath(_)) => ErrorKind::InvalidTagPath,
            Error::StaticFiles { .. } => ErrorKind::StaticFiles,
        }
    }
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => write!(f, "Loading templates: {}", err),
            Error::Prepare { path, err } => {
                write!(f, "Preparing output directory '{}': {}", path.display(), err)
            }
            Error::Corpus(err) => write!(f, "Building posts: {}", err),
            Error::Write(err) => write!(f, "Building listing pages: {}", err),
            Error::StaticFiles { path, err } => {
                write!(f, "Linking static files '{}': {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(err) => Some(err),
            Error::Prepare { path: _, err } => Some(err),
            Error::Corpus(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::StaticFiles { path: _, err } => Some(err),
        }
    }
}

impl From<template::Error> for Error {
    /// Converts [`template::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: template::Error) -> Error {
        Error::Template(err)
    }
}

impl From<corpus::Error> for Error {
    /// Converts [`corpus::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: corpus::Error) -> Error {
        Error::Corpus(err)
    }
}

impl From<write::Error> for Error {
    /// Converts [`write::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: write::Error) -> Error {
        Error::Write(err)
    }
}
