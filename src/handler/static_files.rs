//! Static file serving module
//!
//! Resolves request paths inside the public directory, loads the root
//! document, and builds file responses with ETag and Range support.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::Path;
use tokio::fs;

use crate::config::SiteConfig;
use crate::handler::router::RequestContext;
use crate::http::{self, cache, mime, range::RangeParseResult};
use crate::logger;

/// Serve the fixed root document for `GET /`.
///
/// A missing root document is an operator misconfiguration, not a
/// client error: it is logged and surfaced as 500, unlike the 404 a
/// missing asset gets.
pub async fn serve_root_document(
    ctx: &RequestContext<'_>,
    site: &SiteConfig,
) -> Response<Full<Bytes>> {
    match load_file(&site.root_document).await {
        Some((content, content_type)) => build_file_response(&content, content_type, ctx),
        None => {
            logger::log_error(&format!(
                "Root document '{}' is missing or unreadable",
                site.root_document
            ));
            http::build_500_response()
        }
    }
}

/// Serve a file from the public directory, 404 when nothing matches
pub async fn serve_asset(ctx: &RequestContext<'_>, site: &SiteConfig) -> Response<Full<Bytes>> {
    match load_from_directory(&site.public_dir, ctx.path, &site.index_files).await {
        Some((content, content_type)) => build_file_response(&content, content_type, ctx),
        None => http::build_404_response(),
    }
}

/// Resolve a request path inside the public directory and read the file.
///
/// Directory requests fall back to the configured index files. The
/// resolved path is canonicalized and must stay inside the public
/// directory; traversal attempts are logged and rejected.
pub async fn load_from_directory(
    public_dir: &str,
    path: &str,
    index_files: &[String],
) -> Option<(Vec<u8>, &'static str)> {
    // Strip the leading slash and neutralize parent-directory segments
    let clean_path = path.trim_start_matches('/').replace("..", "");

    let mut file_path = Path::new(public_dir).join(&clean_path);

    let public_root = match Path::new(public_dir).canonicalize() {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Public directory not found or inaccessible '{public_dir}': {e}"
            ));
            return None;
        }
    };

    // Directory request: try index files
    if file_path.is_dir() || clean_path.is_empty() || clean_path.ends_with('/') {
        for index_file in index_files {
            let candidate = file_path.join(index_file);
            if candidate.is_file() {
                file_path = candidate;
                break;
            }
        }
    }

    // A missing file is an ordinary 404, not worth a warning
    let Ok(canonical) = file_path.canonicalize() else {
        return None;
    };
    if !canonical.starts_with(&public_root) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            path,
            canonical.display()
        ));
        return None;
    }

    let content = match fs::read(&canonical).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!("Failed to read file '{}': {e}", canonical.display()));
            return None;
        }
    };

    let content_type = mime::content_type_for(canonical.extension().and_then(|e| e.to_str()));

    Some((content, content_type))
}

/// Load a single file by path with an inferred content type
pub async fn load_file(file_path: &str) -> Option<(Vec<u8>, &'static str)> {
    let path = Path::new(file_path);
    let content = fs::read(path).await.ok()?;
    let content_type = mime::content_type_for(path.extension().and_then(|e| e.to_str()));
    Some((content, content_type))
}

/// Build the response for a loaded file: conditional requests first,
/// then byte ranges, then the plain cached 200.
fn build_file_response(
    data: &[u8],
    content_type: &str,
    ctx: &RequestContext<'_>,
) -> Response<Full<Bytes>> {
    let etag = cache::generate_etag(data);
    let total_size = data.len();

    if cache::etag_matches(ctx.if_none_match, &etag) {
        return http::build_304_response(&etag);
    }

    match http::parse_range_header(ctx.range_header, total_size) {
        RangeParseResult::Valid(range) => {
            let start = range.start;
            let end = range.end_position(total_size);

            let body = if ctx.is_head {
                Bytes::new()
            } else {
                Bytes::from(data[start..=end].to_vec())
            };

            http::response::build_partial_response(
                body,
                content_type,
                &etag,
                start,
                end,
                total_size,
                ctx.is_head,
            )
        }
        RangeParseResult::NotSatisfiable => http::build_416_response(total_size),
        RangeParseResult::None => http::response::build_cached_response(
            Bytes::from(data.to_owned()),
            content_type,
            &etag,
            ctx.is_head,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;
    use std::path::PathBuf;

    fn fixture_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("staticd-{}-{}", name, std::process::id()));
        let _ = std_fs::remove_dir_all(&dir);
        std_fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn ctx(path: &str) -> RequestContext<'_> {
        RequestContext {
            path,
            is_head: false,
            if_none_match: None,
            range_header: None,
        }
    }

    #[tokio::test]
    async fn resolves_exact_bytes_and_content_type() {
        let root = fixture_dir("exact");
        let public = root.join("public");
        std_fs::create_dir_all(&public).unwrap();
        std_fs::write(public.join("style.css"), b"body { color: red; }").unwrap();

        let (content, content_type) =
            load_from_directory(public.to_str().unwrap(), "/style.css", &[])
                .await
                .unwrap();
        assert_eq!(content, b"body { color: red; }");
        assert_eq!(content_type, "text/css");
    }

    #[tokio::test]
    async fn resolves_nested_paths() {
        let root = fixture_dir("nested");
        let public = root.join("public");
        std_fs::create_dir_all(public.join("js")).unwrap();
        std_fs::write(public.join("js/app.js"), b"console.log(1)").unwrap();

        let (content, content_type) =
            load_from_directory(public.to_str().unwrap(), "/js/app.js", &[])
                .await
                .unwrap();
        assert_eq!(content, b"console.log(1)");
        assert_eq!(content_type, "application/javascript");
    }

    #[tokio::test]
    async fn falls_back_to_index_file_for_directories() {
        let root = fixture_dir("index");
        let public = root.join("public");
        std_fs::create_dir_all(public.join("docs")).unwrap();
        std_fs::write(public.join("docs/index.html"), b"<h1>docs</h1>").unwrap();

        let index_files = vec!["index.html".to_string(), "index.htm".to_string()];
        let (content, content_type) =
            load_from_directory(public.to_str().unwrap(), "/docs/", &index_files)
                .await
                .unwrap();
        assert_eq!(content, b"<h1>docs</h1>");
        assert_eq!(content_type, "text/html; charset=utf-8");
    }

    #[tokio::test]
    async fn missing_file_yields_none() {
        let root = fixture_dir("missing");
        let public = root.join("public");
        std_fs::create_dir_all(&public).unwrap();

        assert!(load_from_directory(public.to_str().unwrap(), "/nope.txt", &[])
            .await
            .is_none());
    }

    #[tokio::test]
    async fn traversal_attempts_are_blocked() {
        let root = fixture_dir("traversal");
        let public = root.join("public");
        std_fs::create_dir_all(&public).unwrap();
        std_fs::write(root.join("secret.txt"), b"secret").unwrap();

        for path in ["/../secret.txt", "/..%2Fsecret.txt", "/./../secret.txt"] {
            assert!(
                load_from_directory(public.to_str().unwrap(), path, &[])
                    .await
                    .is_none(),
                "expected {path} to be rejected"
            );
        }
    }

    #[tokio::test]
    async fn load_file_reads_root_document() {
        let root = fixture_dir("rootdoc");
        let doc = root.join("index.html");
        std_fs::write(&doc, b"<html>home</html>").unwrap();

        let (content, content_type) = load_file(doc.to_str().unwrap()).await.unwrap();
        assert_eq!(content, b"<html>home</html>");
        assert_eq!(content_type, "text/html; charset=utf-8");

        assert!(load_file(root.join("absent.html").to_str().unwrap())
            .await
            .is_none());
    }

    #[test]
    fn conditional_request_yields_304() {
        let data = b"cached body";
        let etag = cache::generate_etag(data);
        let request = RequestContext {
            path: "/cached.txt",
            is_head: false,
            if_none_match: Some(&etag),
            range_header: None,
        };

        let resp = build_file_response(data, "text/plain; charset=utf-8", &request);
        assert_eq!(resp.status(), 304);
    }

    #[test]
    fn range_request_yields_206() {
        let request = RequestContext {
            path: "/video.mp4",
            is_head: false,
            if_none_match: None,
            range_header: Some("bytes=0-3"),
        };

        let resp = build_file_response(b"0123456789", "video/mp4", &request);
        assert_eq!(resp.status(), 206);
        assert_eq!(resp.headers()["Content-Range"], "bytes 0-3/10");
        assert_eq!(resp.headers()["Content-Length"], "4");
    }

    #[test]
    fn unsatisfiable_range_yields_416() {
        let request = RequestContext {
            path: "/video.mp4",
            is_head: false,
            if_none_match: None,
            range_header: Some("bytes=100-"),
        };

        let resp = build_file_response(b"0123456789", "video/mp4", &request);
        assert_eq!(resp.status(), 416);
        assert_eq!(resp.headers()["Content-Range"], "bytes */10");
    }

    #[test]
    fn plain_request_yields_cached_200() {
        let resp = build_file_response(b"0123456789", "text/plain; charset=utf-8", &ctx("/f.txt"));
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["Content-Length"], "10");
        assert!(resp.headers().contains_key("ETag"));
    }
}
