use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Maps a free-text church display name to a URL-safe identifier.
///
/// Lowercases, decomposes to NFD and drops combining marks, collapses every
/// run of characters outside `[a-z0-9]` into a single hyphen, and trims
/// hyphens from both ends. Total: degenerate input maps to an empty string,
/// which callers must reject as an invalid slug themselves.
pub fn normalize(display_name: &str) -> String {
    let mut slug = String::with_capacity(display_name.len());
    let mut pending_separator = false;

    for ch in display_name.to_lowercase().nfd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(ch);
        } else {
            pending_separator = true;
        }
    }

    slug
}
