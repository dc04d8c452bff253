//! The library code for the `weaver` static site generator. A build is one
//! linear pass over a directory of Markdown posts:
//!
//! 1. Each post source file is split into its YAML front matter and its
//!    Markdown body ([`crate::frontmatter`]), the body is converted to HTML
//!    and the post page is rendered ([`crate::post`]) and written to disk.
//! 2. The posts are collected into a [`corpus::Corpus`] ordered by date, most
//!    recent first, and grouped by tag into a [`corpus::TagIndex`]
//!    ([`crate::corpus`]).
//! 3. The listing pages are rendered from the corpus: an index page with the
//!    five most recent posts, an archive page with every post, and one page
//!    per tag ([`crate::write`]).
//! 4. The stylesheets are linked into the output directory
//!    ([`crate::build`]).
//!
//! The order of steps 2 and 3 matters: the tag index stores positions into
//! the sorted corpus, which is what keeps each tag page in date order.
//!
//! Pages are rendered with templates through the [`template::Render`] trait.
//! The first error of any kind aborts the whole build.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod corpus;
pub mod frontmatter;
pub mod markdown;
pub mod post;
pub mod serve;
pub mod template;
pub mod write;
