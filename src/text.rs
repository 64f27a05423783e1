//! Dialogue text helpers shared by the edit operations.

/// Maximum visible characters per wrapped dialogue line.
pub const MAX_LINE_CHARS: usize = 60;

/// Counts the characters that matter for line width.
///
/// Completed parenthetical stage directions `(...)` are excluded from the
/// count, delimiters included; an unclosed `(` counts literally.
pub fn visible_len(text: &str) -> usize {
    let mut rest = text;
    let mut count = 0usize;
    while let Some(open) = rest.find('(') {
        match rest[open..].find(')') {
            Some(close) => {
                count += rest[..open].chars().count();
                rest = &rest[open + close + 1..];
            }
            None => break,
        }
    }
    count + rest.chars().count()
}

/// Rewraps dialogue greedily at [`MAX_LINE_CHARS`] visible characters.
///
/// Whitespace runs, including existing newlines, collapse to single spaces
/// before wrapping; output lines join with `\n`.
pub fn reflow_dialogue(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        let candidate = if line.is_empty() {
            word.to_string()
        } else {
            format!("{line} {word}")
        };
        if visible_len(&candidate) > MAX_LINE_CHARS && !line.is_empty() {
            lines.push(line);
            line = word.to_string();
        } else {
            line = candidate;
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }

    lines.join("\n")
}
