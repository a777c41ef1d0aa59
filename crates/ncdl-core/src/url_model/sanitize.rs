//! Linux-safe filename sanitization.

/// Linux NAME_MAX in bytes.
pub const NAME_MAX: usize = 255;

fn is_unsafe(c: char) -> bool {
    c == '\0' || c == '/' || c == '\\' || c.is_control() || c.is_whitespace()
}

/// Sanitizes a candidate filename for safe use on Linux.
///
/// Unsafe characters (NUL, separators, control chars, whitespace) become a
/// single `_` per run; leading/trailing dots and underscores are trimmed and
/// the result is cut to NAME_MAX bytes on a char boundary.
pub fn sanitize_filename_for_linux(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let c = if is_unsafe(c) { '_' } else { c };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }

    let trimmed = out.trim_matches(|c| c == '.' || c == '_');
    let mut end = trimmed.len().min(NAME_MAX);
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    trimmed[..end].to_string()
}
