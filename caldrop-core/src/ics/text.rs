//! TEXT value escaping (RFC 5545 §3.3.11).

/// Escape a TEXT value.
///
/// Backslashes go first so the backslashes introduced for `;`, `,` and newlines
/// are not escaped a second time.
pub fn escape_text(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace("\r\n", "\\n")
        .replace(['\n', '\r'], "\\n")
}

/// Reverse of [`escape_text`]. Unknown escapes keep the escaped character.
pub fn unescape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_backslash_first() {
        assert_eq!(escape_text(r"a\b"), r"a\\b");
        assert_eq!(escape_text("a;b,c"), r"a\;b\,c");
        assert_eq!(escape_text(r"\;"), r"\\\;");
        assert_eq!(escape_text("line1\nline2\r\nline3"), r"line1\nline2\nline3");
    }

    #[test]
    fn leaves_other_punctuation_alone() {
        assert_eq!(escape_text("Trivia Night!"), "Trivia Night!");
        assert_eq!(escape_text("It's 5:00 - \"go\""), "It's 5:00 - \"go\"");
    }

    #[test]
    fn unescape_reverses_escape() {
        let original = "Win, lose; or draw\\\nnext line";
        assert_eq!(unescape_text(&escape_text(original)), original);
    }

    #[test]
    fn unescape_accepts_uppercase_newline() {
        assert_eq!(unescape_text(r"one\Ntwo"), "one\ntwo");
        assert_eq!(unescape_text("trailing\\"), "trailing\\");
    }
}
