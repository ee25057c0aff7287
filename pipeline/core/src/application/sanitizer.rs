// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Response Sanitizer
//!
//! Repairs the lexical defects LLMs routinely wrap around JSON before it is
//! decoded. Steps run in a fixed order:
//!
//! 1. strip a surrounding markdown code fence
//! 2. drop `//` line comments and `/* */` block comments
//! 3. quote bare object keys (`{name: ...}` → `{"name": ...}`)
//! 4. collapse thousands separators in numeric values (`: 1,234,567`)
//! 5. drop trailing commas before `}` or `]`
//! 6. remove control characters outside string literals and escape the
//!    legal-but-raw ones (newline, tab, carriage return) inside them
//!
//! Steps 2-6 track string literals, so text inside quotes is never rewritten
//! except for raw control characters that would make the document invalid.
//! Already-valid JSON comes out byte-identical.

use regex::Regex;
use std::sync::LazyLock;

static FENCE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*```[A-Za-z0-9_+-]*[ \t]*\r?\n?").expect("fence pattern"));
static FENCE_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n?[ \t]*```\s*$").expect("fence pattern"));

pub fn sanitize(raw: &str) -> String {
    let unfenced = strip_code_fence(raw);
    let uncommented = strip_comments(&unfenced);
    let keyed = quote_bare_keys(&uncommented);
    let numbers = collapse_grouped_numbers(&keyed);
    let commas = remove_trailing_commas(&numbers);
    strip_control_chars(&commas)
}

/// Remove a leading ```` ```json ```` (any info string) and a trailing ```` ``` ````.
pub fn strip_code_fence(text: &str) -> String {
    let opened = FENCE_OPEN.replace(text, "");
    FENCE_CLOSE.replace(&opened, "").into_owned()
}

/// Tracks whether the scanner is inside a JSON string literal.
#[derive(Default)]
struct Lexer {
    in_string: bool,
    escaped: bool,
}

impl Lexer {
    /// Advance over one byte while inside a string literal.
    fn step_in_string(&mut self, byte: u8) {
        if self.escaped {
            self.escaped = false;
        } else if byte == b'\\' {
            self.escaped = true;
        } else if byte == b'"' {
            self.in_string = false;
        }
    }
}

fn into_string(bytes: Vec<u8>, fallback: &str) -> String {
    // Only ASCII bytes are ever removed or inserted, so this cannot fail in practice.
    String::from_utf8(bytes).unwrap_or_else(|_| fallback.to_string())
}

/// Remove `// ...` up to the end of the line and `/* ... */` outside string
/// literals. An unterminated block comment runs to the end of the text.
pub fn strip_comments(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut lexer = Lexer::default();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if lexer.in_string {
            lexer.step_in_string(b);
            out.push(b);
            i += 1;
            continue;
        }
        match (b, bytes.get(i + 1)) {
            (b'/', Some(b'/')) => {
                i += 2;
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            (b'/', Some(b'*')) => {
                i += 2;
                while i < bytes.len() && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                    i += 1;
                }
                i = (i + 2).min(bytes.len());
                out.push(b' ');
            }
            _ => {
                if b == b'"' {
                    lexer.in_string = true;
                }
                out.push(b);
                i += 1;
            }
        }
    }
    into_string(out, text)
}

/// `{name: "x", area_sq_km: 5}` → `{"name": "x", "area_sq_km": 5}`. An
/// identifier counts as a key only after `{` or `,` and before `:`.
pub fn quote_bare_keys(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len() + 16);
    let mut lexer = Lexer::default();
    let mut key_position = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if lexer.in_string {
            lexer.step_in_string(b);
            out.push(b);
            i += 1;
            continue;
        }
        match b {
            b'{' | b',' => key_position = true,
            b' ' | b'\t' | b'\n' | b'\r' => {}
            b'A'..=b'Z' | b'a'..=b'z' | b'_' | b'$' if key_position => {
                key_position = false;
                let len = bytes[i..]
                    .iter()
                    .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, b'_' | b'$'))
                    .count();
                let after = bytes[i + len..].iter().find(|c| !c.is_ascii_whitespace());
                if after == Some(&b':') {
                    out.push(b'"');
                    out.extend_from_slice(&bytes[i..i + len]);
                    out.push(b'"');
                    i += len;
                    continue;
                }
            }
            b'"' => {
                lexer.in_string = true;
                key_position = false;
            }
            _ => key_position = false,
        }
        out.push(b);
        i += 1;
    }
    into_string(out, text)
}

/// `"population": 1,234,567` → `"population": 1234567`. Only values that
/// directly follow a `:` are touched; inside arrays `[1,234]` is already
/// valid JSON and is left alone.
pub fn collapse_grouped_numbers(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut lexer = Lexer::default();
    let mut after_colon = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if lexer.in_string {
            lexer.step_in_string(b);
            out.push(b);
            i += 1;
            continue;
        }
        match b {
            b'"' => {
                lexer.in_string = true;
                after_colon = false;
            }
            b':' => after_colon = true,
            b' ' | b'\t' | b'\n' | b'\r' => {}
            b'-' | b'0'..=b'9' if after_colon => {
                after_colon = false;
                if let Some(len) = grouped_number_len(&bytes[i..]) {
                    out.extend(bytes[i..i + len].iter().filter(|c| **c != b','));
                    i += len;
                    continue;
                }
            }
            _ => after_colon = false,
        }
        out.push(b);
        i += 1;
    }
    into_string(out, text)
}

/// Length of `-?\d{1,3}(,\d{3})+(\.\d+)?` at the start of `rest`, provided it
/// is followed by a value delimiter.
fn grouped_number_len(rest: &[u8]) -> Option<usize> {
    let digit = |i: usize| rest.get(i).is_some_and(u8::is_ascii_digit);
    let mut i = usize::from(rest.first() == Some(&b'-'));

    let lead_start = i;
    while digit(i) {
        i += 1;
    }
    let lead = i - lead_start;
    if lead == 0 || lead > 3 {
        return None;
    }

    let mut groups = 0;
    while rest.get(i) == Some(&b',')
        && digit(i + 1)
        && digit(i + 2)
        && digit(i + 3)
        && !digit(i + 4)
    {
        i += 4;
        groups += 1;
    }
    if groups == 0 {
        return None;
    }

    if rest.get(i) == Some(&b'.') && digit(i + 1) {
        i += 1;
        while digit(i) {
            i += 1;
        }
    }

    match rest.get(i) {
        None | Some(b',' | b'}' | b']' | b' ' | b'\t' | b'\n' | b'\r') => Some(i),
        _ => None,
    }
}

/// `{"a": 1,}` → `{"a": 1}` and `[1, 2, ]` → `[1, 2 ]`.
pub fn remove_trailing_commas(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut lexer = Lexer::default();

    for (i, &b) in bytes.iter().enumerate() {
        if lexer.in_string {
            lexer.step_in_string(b);
        } else if b == b'"' {
            lexer.in_string = true;
        } else if b == b',' {
            let next = bytes[i + 1..].iter().find(|c| !c.is_ascii_whitespace());
            if matches!(next, Some(b'}' | b']')) {
                continue;
            }
        }
        out.push(b);
    }
    into_string(out, text)
}

/// Drop `[\x00-\x08\x0b\x0c\x0e-\x1f]` between tokens; inside strings escape
/// raw `\n`, `\r` and `\t` and drop the rest.
pub fn strip_control_chars(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut lexer = Lexer::default();

    for &b in bytes {
        if lexer.in_string {
            if b < 0x20 {
                let escape = match b {
                    b'\n' => Some(b'n'),
                    b'\r' => Some(b'r'),
                    b'\t' => Some(b't'),
                    _ => None,
                };
                if let Some(letter) = escape {
                    if !lexer.escaped {
                        out.push(b'\\');
                    }
                    out.push(letter);
                }
                lexer.escaped = false;
                continue;
            }
            lexer.step_in_string(b);
            out.push(b);
            continue;
        }
        if b == b'"' {
            lexer.in_string = true;
        } else if b < 0x20 && !matches!(b, b'\n' | b'\r' | b'\t') {
            continue;
        }
        out.push(b);
    }
    into_string(out, text)
}

/// Slice from the first `{`/`[` to the matching last `}`/`]`, for replies
/// that bury the document in prose.
pub fn extract_json_slice(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let closer = if text.as_bytes()[start] == b'{' { '}' } else { ']' };
    let end = text.rfind(closer)?;
    (end > start).then(|| &text[start..=end])
}
