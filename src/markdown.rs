use pulldown_cmark::{html, Options, Parser};

/// Converts `markdown` to HTML, appending the result onto `w`. This never
/// fails: malformed markup degrades to best-effort HTML.
pub fn to_html(w: &mut String, markdown: &str) {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    html::push_html(w, Parser::new_ext(markdown, options));
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_to_html() {
        let mut html = String::new();
        to_html(&mut html, "# Hello\n\nSome *emphasis* and ~~strike~~.\n");
        assert_eq!(
            "<h1>Hello</h1>\n<p>Some <em>emphasis</em> and <del>strike</del>.</p>\n",
            html
        );
    }

    #[test]
    fn test_to_html_unclosed_markup() {
        let mut html = String::new();
        to_html(&mut html, "**never closed\n\n```\ncode");
        assert!(html.contains("never closed"));
        assert!(html.contains("<code>code"));
    }
}
