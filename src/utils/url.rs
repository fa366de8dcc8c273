// src/utils/url.rs

//! URL canonicalization and domain predicates.

use url::Url;

/// Canonicalize a URL for deduplication.
///
/// Strips the fragment and trims trailing slashes from any non-root path.
/// Default ports and empty paths are already normalized away by the `url`
/// parser, so two URLs that differ only in fragment, default port, or a
/// trailing slash canonicalize to the same value. Idempotent.
///
/// # Examples
/// ```
/// use url::Url;
/// use sitecrawl::utils::url::canonicalize;
///
/// let url = Url::parse("http://example.com:80/docs/#intro").unwrap();
/// assert_eq!(canonicalize(&url).as_str(), "http://example.com/docs");
/// ```
pub fn canonicalize(url: &Url) -> Url {
    let mut out = url.clone();
    out.set_fragment(None);

    let trimmed = {
        let path = out.path();
        if path.len() > 1 && path.ends_with('/') {
            let stem = path.trim_end_matches('/');
            // a path of only slashes collapses back to the root
            Some(if stem.is_empty() {
                "/".to_string()
            } else {
                stem.to_string()
            })
        } else {
            None
        }
    };
    if let Some(path) = trimmed {
        out.set_path(&path);
    }
    out
}

/// True iff the URL's host equals the target host, case-insensitively.
/// URLs without a host never match.
pub fn is_in_domain(url: &Url, target_host: &str) -> bool {
    url.host_str()
        .is_some_and(|host| host.eq_ignore_ascii_case(target_host))
}

/// True only for schemes the crawler will fetch.
pub fn is_fetchable_scheme(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}
