use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything but the RFC 3986 unreserved characters.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Encodes `path` as a single URL path segment.
///
/// GitLab addresses repository files by their whole path in one segment, so
/// `/` is encoded along with every reserved character (`#`, `?`, `%`, space,
/// ...). A segment that would read as `.` or `..` gets its dots encoded so URL
/// normalization cannot remove it.
pub fn encode_path_segment(path: &str) -> String {
    let encoded = utf8_percent_encode(path, PATH_SEGMENT).to_string();
    if encoded == "." || encoded == ".." {
        return encoded.replace('.', "%2E");
    }
    encoded
}
