//! Line-oriented `.properties` parser.
//!
//! Supports `#`/`!` comments, `=`, `:` or whitespace separators, backslash
//! line continuations and the usual escapes including `\uXXXX`. Values are
//! returned raw: `${...}` placeholders are left for the store to expand.

use std::fmt;

/// A parse failure with the 1-based line where the logical line started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub reason: String,
}

impl ParseError {
    fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.reason)
    }
}

impl std::error::Error for ParseError {}

/// Parse properties text into `(key, raw value)` pairs in file order.
///
/// Duplicate keys are returned as-is; the store decides which one wins.
pub fn parse(source: &str) -> Result<Vec<(String, String)>, ParseError> {
    let mut entries = Vec::new();
    let mut lines = source.lines().enumerate().peekable();

    while let Some((idx, physical)) = lines.next() {
        let start_line = idx + 1;
        let trimmed = physical.trim_start_matches(is_blank);

        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }

        // Join continuation lines into one logical line
        let mut logical = String::from(trimmed);
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some((_, next)) => logical.push_str(next.trim_start_matches(is_blank)),
                None => break,
            }
        }

        let (key, value) = split_entry(&logical, start_line)?;
        if key.is_empty() {
            return Err(ParseError::new(start_line, "empty key"));
        }
        entries.push((key, value));
    }

    Ok(entries)
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\x0c'
}

/// An odd number of trailing backslashes means the line continues.
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn split_entry(line: &str, line_no: usize) -> Result<(String, String), ParseError> {
    let mut split_at = line.len();
    let mut chars = line.char_indices();
    while let Some((i, c)) = chars.next() {
        if c == '\\' {
            chars.next();
            continue;
        }
        if c == '=' || c == ':' || is_blank(c) {
            split_at = i;
            break;
        }
    }

    let key_raw = &line[..split_at];
    let mut rest = line[split_at..].trim_start_matches(is_blank);
    if let Some(stripped) = rest.strip_prefix(['=', ':']) {
        rest = stripped.trim_start_matches(is_blank);
    }

    Ok((unescape(key_raw, line_no)?, unescape(rest, line_no)?))
}

fn unescape(raw: &str, line_no: usize) -> Result<String, ParseError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

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
            Some('u') => {
                let code = read_hex4(&mut chars, line_no)?;
                let scalar = match code {
                    0xD800..=0xDBFF => {
                        // High surrogate: must be followed by an escaped low surrogate
                        let mut ahead = chars.clone();
                        let low = match (ahead.next(), ahead.next()) {
                            (Some('\\'), Some('u')) => read_hex4(&mut ahead, line_no)?,
                            _ => return Err(unpaired_surrogate(code, line_no)),
                        };
                        if !(0xDC00..=0xDFFF).contains(&low) {
                            return Err(unpaired_surrogate(code, line_no));
                        }
                        chars = ahead;
                        0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00)
                    }
                    0xDC00..=0xDFFF => return Err(unpaired_surrogate(code, line_no)),
                    _ => code,
                };
                let decoded = char::from_u32(scalar).ok_or_else(|| {
                    ParseError::new(line_no, format!("unicode escape \\u{:04X} is not a scalar value", code))
                })?;
                out.push(decoded);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    Ok(out)
}

fn read_hex4(chars: &mut std::str::Chars<'_>, line_no: usize) -> Result<u32, ParseError> {
    let hex: String = chars.by_ref().take(4).collect();
    if hex.len() != 4 {
        return Err(ParseError::new(line_no, format!("invalid unicode escape \\u{}", hex)));
    }
    u32::from_str_radix(&hex, 16)
        .map_err(|_| ParseError::new(line_no, format!("invalid unicode escape \\u{}", hex)))
}

fn unpaired_surrogate(code: u32, line_no: usize) -> ParseError {
    ParseError::new(line_no, format!("unpaired surrogate in unicode escape \\u{:04X}", code))
}

/// Escape a key or value so that [`parse`] reads it back unchanged.
pub fn escape(text: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, c) in text.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x0c' => out.push_str("\\f"),
            '=' | ':' if is_key => {
                out.push('\\');
                out.push(c);
            }
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            '#' | '!' if is_key && i == 0 => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}
