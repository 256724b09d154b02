//! Leading `---` metadata block removal.

const DELIMITER: &str = "---";

/// Strip a front-matter block from the start of `text`.
///
/// The block opens with a first line that is exactly `---` and closes at the
/// next line that is exactly `---`; both delimiters and the closing line break
/// are removed. Without a closing delimiter the text is returned unchanged.
pub fn strip_front_matter(text: &str) -> &str {
    let Some(first_end) = line_end(text, 0) else {
        return text;
    };
    if trim_line(&text[..first_end]) != DELIMITER {
        return text;
    }

    let mut start = next_line(text, first_end);
    while start < text.len() {
        let end = line_end(text, start).unwrap_or(text.len());
        if trim_line(&text[start..end]) == DELIMITER {
            return &text[next_line(text, end)..];
        }
        start = next_line(text, end);
    }
    text
}

/// Byte index of the `\n` ending the line at `start`, or the end of text for a
/// non-empty last line.
fn line_end(text: &str, start: usize) -> Option<usize> {
    match text[start..].find('\n') {
        Some(offset) => Some(start + offset),
        None if start < text.len() => Some(text.len()),
        None => None,
    }
}

fn next_line(text: &str, line_end: usize) -> usize {
    (line_end + 1).min(text.len())
}

fn trim_line(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}
