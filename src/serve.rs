//! A development server for the generated site, built on `tiny_http`. It
//! only serves files: it is started after a build has finished and never
//! rebuilds.

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tiny_http::{Header, Request, Response, Server};
use tracing::{debug, info, warn};

/// Serves the files under `root` on `address:port` until the process is
/// killed.
pub fn serve(root: &Path, address: &str, port: u16) -> Result<()> {
    let addr = format!("{}:{}", address, port);
    let server = Server::http(&addr).map_err(|e| anyhow!("Binding `{}`: {}", addr, e))?;
    info!(root = %root.display(), "serving http://{}", addr);

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, root) {
            warn!(error = %e, "request failed");
        }
    }
    Ok(())
}

fn handle_request(request: Request, root: &Path) -> Result<()> {
    debug!(method = %request.method(), url = request.url(), "request");
    match resolve(root, request.url()) {
        Some(path) => {
            let content =
                fs::read(&path).with_context(|| format!("Reading `{}`", path.display()))?;
            let content_type = Header::from_bytes("Content-Type", content_type(&path))
                .map_err(|_| anyhow!("Invalid Content-Type header"))?;
            request.respond(Response::from_data(content).with_header(content_type))?;
        }
        None => {
            request.respond(Response::from_string("404 Not Found").with_status_code(404))?;
        }
    }
    Ok(())
}

/// Maps a request URL onto a file under `root`. Directories resolve to their
/// `index.html`. The URL is percent-decoded first, the query string is
/// ignored, and URLs which would climb out of `root` (encoded or not)
/// resolve to nothing.
pub fn resolve(root: &Path, url: &str) -> Option<PathBuf> {
    let url = urlencoding::decode(url).ok()?;
    let path = url.split(|c: char| c == '?' || c == '#').next().unwrap_or_default();
    let mut local = root.to_path_buf();
    for component in Path::new(path.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => local.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }

    if local.is_dir() {
        local.push("index.html");
    }
    if local.is_file() {
        Some(local)
    } else {
        None
    }
}

/// Guesses the MIME type of a file from its extension.
fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_resolve() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("tag")).unwrap();
        fs::write(root.path().join("index.html"), "index").unwrap();
        fs::write(root.path().join("hello.html"), "hello").unwrap();
        fs::write(root.path().join("tag").join("rust.html"), "rust").unwrap();

        let root = root.path();
        assert_eq!(Some(root.join("index.html")), resolve(root, "/"));
        assert_eq!(Some(root.join("hello.html")), resolve(root, "/hello.html?t=1"));
        assert_eq!(Some(root.join("tag/rust.html")), resolve(root, "/tag/./rust.html"));
        assert_eq!(None, resolve(root, "/tag/"));
        assert_eq!(None, resolve(root, "/missing.html"));
        assert_eq!(None, resolve(root, "/../index.html"));
    }

    #[test]
    fn test_resolve_percent_encoded() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("tag")).unwrap();
        fs::write(root.path().join("tag").join("Rust Lang.html"), "rust").unwrap();
        fs::write(root.path().join("tag").join("café.html"), "café").unwrap();

        let root = root.path();
        assert_eq!(
            Some(root.join("tag/Rust Lang.html")),
            resolve(root, "/tag/Rust%20Lang.html")
        );
        assert_eq!(
            Some(root.join("tag/café.html")),
            resolve(root, "/tag/caf%C3%A9.html")
        );
        assert_eq!(None, resolve(root, "/tag/%2e%2e/%2e%2e/etc/passwd"));
        assert_eq!(None, resolve(root, "/%2E%2E/tag/Rust%20Lang.html"));
        assert_eq!(None, resolve(root, "/tag/%FF.html"));
    }

    #[test]
    fn test_content_type() {
        assert_eq!("text/html; charset=utf-8", content_type(Path::new("a.html")));
        assert_eq!("text/css; charset=utf-8", content_type(Path::new("style.css")));
        assert_eq!("application/octet-stream", content_type(Path::new("README")));
    }
}
