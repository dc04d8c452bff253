//! Renders a single post source file into its HTML page. See [`render`].

use crate::frontmatter::{self, FrontMatter};
use crate::markdown;
use crate::template::{post_data, Render};
use std::fmt;

/// Splits `input` into front matter and Markdown body, converts the body to
/// HTML, and renders the result with `renderer`. Returns the page text along
/// with the parsed [`FrontMatter`].
pub fn render<R: Render + ?Sized>(input: &str, renderer: &R) -> Result<(String, FrontMatter)> {
    let (front_matter, body) = frontmatter::parse(input)?;

    let mut content = String::new();
    markdown::to_html(&mut content, body);

    let page = renderer
        .render(post_data(&front_matter, content))
        .map_err(Error::Render)?;
    Ok((page, front_matter))
}

/// Represents the result of rendering a post.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error rendering a post.
#[derive(Debug)]
pub enum Error {
    /// Returned when the front matter couldn't be split or parsed. The
    /// original [`frontmatter::Error`] is kept intact.
    FrontMatter(frontmatter::Error),

    /// Returned when the template fails to render.
    Render(String),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontMatter(err) => write!(f, "Extracting front matter: {}", err),
            Error::Render(err) => write!(f, "Executing template: {}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FrontMatter(err) => Some(err),
            Error::Render(_) => None,
        }
    }
}

impl From<frontmatter::Error> for Error {
    /// Converts a [`frontmatter::Error`] into an [`Error`]. This allows us to
    /// use the `?` operator.
    fn from(err: frontmatter::Error) -> Error {
        Error::FrontMatter(err)
    }
}
