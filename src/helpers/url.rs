//! URL helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left as-is in a path segment
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Detail page route for a post uid
///
/// # Examples
/// ```ignore
/// post_url("/post", "como-utilizar-hooks") // -> "/post/como-utilizar-hooks"
/// ```
pub fn post_url(route: &str, uid: &str) -> String {
    let route = route.trim_end_matches('/');
    format!("{}/{}", route, encode_segment(uid))
}

/// Percent-encode a single path segment
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}
