use crate::error::SanitizationError;
use unicode_normalization::UnicodeNormalization;

pub use crate::config::DEFAULT_MAX_FILENAME_LENGTH;

/// Characters Windows refuses in file names, each paired with its full-width
/// lookalike.
pub const CHAR_REPLACEMENTS: [(char, char); 9] = [
    ('<', '＜'),
    ('>', '＞'),
    (':', '：'),
    ('"', '＂'),
    ('/', '／'),
    ('\\', '＼'),
    ('|', '｜'),
    ('?', '？'),
    ('*', '＊'),
];

/// Turn a catalog title into a folder name that is legal on NTFS and friends.
///
/// The result is NFC-normalized, contains none of the forbidden characters,
/// is at most `max_length` characters long and never ends with a dot or
/// whitespace.
pub fn sanitize(title: &str, max_length: usize) -> Result<String, SanitizationError> {
    let replaced: String = title.chars().map(replace_forbidden).collect();
    let normalized: String = replaced.nfc().collect();

    let mut sanitized = strip_trailing(normalized.trim()).to_string();

    if sanitized.chars().count() > max_length {
        let truncated: String = sanitized.chars().take(max_length).collect();
        sanitized = strip_trailing(&truncated).to_string();
    }

    if sanitized.is_empty() {
        return Err(SanitizationError {
            title: title.to_string(),
        });
    }

    Ok(sanitized)
}

fn replace_forbidden(c: char) -> char {
    CHAR_REPLACEMENTS
        .iter()
        .find(|(from, _)| *from == c)
        .map(|(_, to)| *to)
        .unwrap_or(c)
}

// NTFS silently drops trailing dots and spaces, so names must not end in them.
fn strip_trailing(name: &str) -> &str {
    name.trim_end_matches(|c: char| c == '.' || c.is_whitespace())
}
