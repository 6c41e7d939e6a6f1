use std::path::Path;

/// Longest single path component accepted by common filesystems (NAME_MAX), in bytes.
pub const MAX_NAME_BYTES: usize = 255;

/// Cuts `s` to at most `max` bytes without splitting a character.
fn truncate_to_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Makes media titles safe to use as a single path component, locally or on
/// a remote library.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_control()
                || c == '/'
                || c == '\\'
                || c == ':'
                || c == '*'
                || c == '?'
                || c == '"'
                || c == '<'
                || c == '>'
                || c == '|'
                || c == ';'
            {
                '_'
            } else {
                c
            }
        })
        .collect();

    // Leading dots would produce hidden files or `..`
    let trimmed = sanitized.trim().trim_start_matches('.').trim();

    truncate_to_bytes(trimmed, MAX_NAME_BYTES).trim_end().to_string()
}

/// Name under which a transcoded file is uploaded: the sanitized title with
/// `extension` substituted, falling back to the media id.
pub fn audio_file_name(title: Option<&str>, media_id: Option<&str>, extension: &str) -> String {
    let stem = [title, media_id]
        .into_iter()
        .flatten()
        .map(sanitize_filename)
        .find(|s| !s.is_empty())
        .unwrap_or_else(|| "audio".to_string());

    let stem = Path::new(&stem)
        .file_stem()
        .filter(|_| has_media_extension(&stem))
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .unwrap_or(stem);

    let budget = MAX_NAME_BYTES.saturating_sub(extension.len() + 1);
    format!("{}.{}", truncate_to_bytes(&stem, budget).trim_end(), extension)
}

fn has_media_extension(name: &str) -> bool {
    const KNOWN: &[&str] = &["mp3", "m4a", "webm", "opus", "ogg", "wav", "mp4", "flac", "aac"];
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| KNOWN.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}
