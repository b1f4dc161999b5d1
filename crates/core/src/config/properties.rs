//! `.properties` reader and writer
//!
//! Follows the Java `Properties` text rules closely enough that files edited
//! by hand or by other Java tooling load unchanged.

use std::fmt::Write as _;

/// Ordered key/value pairs read from or destined for a `.properties` file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: Vec<(String, String)>,
}

impl Properties {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse properties text. Later duplicates override earlier ones.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut props = Self::new();
        let mut lines = text.lines();

        while let Some(raw) = lines.next() {
            let line = trim_leading(raw);
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }

            let mut logical = line.to_string();
            while ends_with_continuation(&logical) {
                logical.pop();
                match lines.next() {
                    Some(next) => logical.push_str(trim_leading(next)),
                    None => break,
                }
            }

            let (key, value) = split_key_value(&logical);
            props.set(unescape(key), unescape(value));
        }

        props
    }

    /// Look up a value
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Insert or replace a value, keeping the original position on replace
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render as file text, each header line written as a `#` comment
    #[must_use]
    pub fn render(&self, header: &[&str]) -> String {
        let mut out = String::new();
        for line in header {
            let _ = writeln!(out, "# {line}");
        }
        for (key, value) in &self.entries {
            let _ = writeln!(out, "{}={}", escape(key, true), escape(value, false));
        }
        out
    }
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0c')
}

fn trim_leading(s: &str) -> &str {
    s.trim_start_matches(is_blank)
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();

    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
        } else if c == '=' || c == ':' || is_blank(c) {
            key_end = i;
            break;
        }
    }

    let key = &line[..key_end];
    let mut rest = trim_leading(&line[key_end..]);
    if let Some(stripped) = rest.strip_prefix(['=', ':']) {
        rest = trim_leading(stripped);
    }
    (key, rest)
}

/// Decode backslash escapes
#[must_use]
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => match read_hex4(&mut chars) {
                Some(high @ 0xD800..=0xDBFF) => {
                    // UTF-16 pair: only combine when `\uDC00..=\uDFFF` follows
                    let mut ahead = chars.clone();
                    let low = match (ahead.next(), ahead.next()) {
                        (Some('\\'), Some('u')) => {
                            read_hex4(&mut ahead).filter(|u| (0xDC00..=0xDFFF).contains(u))
                        }
                        _ => None,
                    };
                    match low {
                        Some(low) => {
                            chars = ahead;
                            let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                            out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
                        }
                        None => out.push(char::REPLACEMENT_CHARACTER),
                    }
                }
                Some(unit) => out.push(char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER)),
                None => out.push('u'),
            },
            Some(other) => out.push(other),
            None => {}
        }
    }

    out
}

/// Consume four hex digits, leaving `chars` untouched when they are not there
fn read_hex4(chars: &mut std::str::Chars<'_>) -> Option<u32> {
    let hex: String = chars.clone().take(4).collect();
    if hex.len() != 4 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    chars.nth(3);
    u32::from_str_radix(&hex, 16).ok()
}

/// Encode a key or value so [`unescape`] restores it exactly
#[must_use]
pub fn escape(s: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(s.len() + 8);

    for (i, c) in s.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x0c' => out.push_str("\\f"),
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            '=' | ':' | '#' | '!' if is_key => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let props = Properties::parse("# header\n! bang\n\n  alias=androiddebugkey\n");
        assert_eq!(props.len(), 1);
        assert_eq!(props.get("alias"), Some("androiddebugkey"));
    }

    #[test]
    fn test_parse_separators() {
        let props = Properties::parse("a=1\nb : 2\nc 3\nd=\n");
        assert_eq!(props.get("a"), Some("1"));
        assert_eq!(props.get("b"), Some("2"));
        assert_eq!(props.get("c"), Some("3"));
        assert_eq!(props.get("d"), Some(""));
    }

    #[test]
    fn test_parse_windows_path_written_by_desktop_tool() {
        let props = Properties::parse("zipalignPath=C:\\\\tools\\\\config\\\\zipalign.exe\r\n");
        assert_eq!(props.get("zipalignPath"), Some("C:\\tools\\config\\zipalign.exe"));
    }

    #[test]
    fn test_parse_line_continuation() {
        let props = Properties::parse("signedDir=/very/long/\\\n    path/signed\n");
        assert_eq!(props.get("signedDir"), Some("/very/long/path/signed"));
    }

    #[test]
    fn test_parse_unicode_escape() {
        let props = Properties::parse("alias=\\u00e9t\\u00e9\n");
        assert_eq!(props.get("alias"), Some("été"));
    }

    #[test]
    fn test_unescape_combines_surrogate_pair() {
        assert_eq!(unescape("key\\uD83D\\uDE00pass"), "key\u{1F600}pass");
    }

    #[test]
    fn test_unescape_lone_surrogate_is_replaced() {
        assert_eq!(unescape("\\uD83Dx"), "\u{FFFD}x");
        assert_eq!(unescape("\\uDE00"), "\u{FFFD}");
    }

    #[test]
    fn test_unescape_short_hex_keeps_text() {
        assert_eq!(unescape("\\u12"), "u12");
    }

    #[test]
    fn test_later_duplicate_wins() {
        let props = Properties::parse("alias=first\nalias=second\n");
        assert_eq!(props.get("alias"), Some("second"));
        assert_eq!(props.len(), 1);
    }

    #[test]
    fn test_render_header_and_escapes() {
        let mut props = Properties::new();
        props.set("keystorePath", "C:\\sign\\signature.keystore");
        let text = props.render(&["Signing configuration"]);
        assert_eq!(
            text,
            "# Signing configuration\nkeystorePath=C:\\\\sign\\\\signature.keystore\n"
        );
    }

    proptest! {
        #[test]
        fn escaped_values_survive_parse(value in any::<String>()) {
            let mut props = Properties::new();
            props.set("storePassword", value.clone());
            let parsed = Properties::parse(&props.render(&[]));
            prop_assert_eq!(parsed.get("storePassword"), Some(value.as_str()));
        }
    }
}
