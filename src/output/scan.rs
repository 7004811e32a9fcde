//! Markdown scanners for the rewriter
//!
//! Forward-only, no backtracking. The link-span scanner understands nested
//! brackets, escapes, code spans, `<dest>` and optional titles. HTML is never
//! scanned here; the rewriter hands that to lol_html.

use std::ops::Range;

/// Collapses runs of whitespace into single spaces and trims the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A Markdown inline link or image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSpan {
    /// Byte range of the whole construct, including a leading `!`
    pub span: Range<usize>,

    /// `![...](...)`
    pub is_image: bool,

    /// Range of the text between the outer brackets
    pub label: Range<usize>,

    /// Range of the destination, without angle brackets
    pub dest: Range<usize>,

    /// Range of the title including its delimiters, if present
    pub title: Option<Range<usize>>,
}

/// Finds the top-level inline links and images in `markdown`
///
/// Nested constructs (an image inside a link label) are not reported here;
/// scan the label again to reach them. Backslash escapes and code spans are
/// honored.
pub fn find_link_spans(markdown: &str) -> Vec<LinkSpan> {
    let bytes = markdown.as_bytes();
    let len = bytes.len();
    let mut spans = Vec::new();
    let mut i = 0;

    while i < len {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => i = skip_code_span(bytes, i),
            b'[' => match parse_link_at(bytes, i) {
                Some((label, dest, title, end)) => {
                    let is_image = i > 0
                        && bytes[i - 1] == b'!'
                        && !(i > 1 && bytes[i - 2] == b'\\');
                    let start = if is_image { i - 1 } else { i };
                    spans.push(LinkSpan {
                        span: start..end,
                        is_image,
                        label,
                        dest,
                        title,
                    });
                    i = end;
                }
                None => i += 1,
            },
            _ => i += 1,
        }
    }

    spans
}

/// Splits `markdown` into alternating prose and code-span ranges
///
/// Returns `(range, is_code)` pairs covering the whole input in order.
pub fn split_code_spans(markdown: &str) -> Vec<(Range<usize>, bool)> {
    let bytes = markdown.as_bytes();
    let mut parts = Vec::new();
    let mut prose_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => {
                let end = skip_code_span(bytes, i);
                let run = count_run(bytes, i, b'`');
                if end > i + run {
                    if i > prose_start {
                        parts.push((prose_start..i, false));
                    }
                    parts.push((i..end, true));
                    prose_start = end;
                }
                i = end;
            }
            _ => i += 1,
        }
    }

    if bytes.len() > prose_start {
        parts.push((prose_start..bytes.len(), false));
    }
    parts
}

/// Returns the offset after the code span opening at `start`, or just past
/// the backtick run if it is never closed
fn skip_code_span(bytes: &[u8], start: usize) -> usize {
    let run = count_run(bytes, start, b'`');
    let mut i = start + run;
    while i < bytes.len() {
        if bytes[i] == b'`' {
            let closing = count_run(bytes, i, b'`');
            if closing == run {
                return i + closing;
            }
            i += closing;
        } else {
            i += 1;
        }
    }
    start + run
}

fn count_run(bytes: &[u8], start: usize, byte: u8) -> usize {
    bytes[start..].iter().take_while(|b| **b == byte).count()
}

type ParsedLink = (Range<usize>, Range<usize>, Option<Range<usize>>, usize);

/// Parses `[label](dest "title")` with the `[` at `open`
fn parse_link_at(bytes: &[u8], open: usize) -> Option<ParsedLink> {
    let len = bytes.len();

    // Label with balanced brackets
    let mut depth = 0usize;
    let mut i = open;
    let close = loop {
        if i >= len {
            return None;
        }
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    break i;
                }
            }
            _ => {}
        }
        i += 1;
    };

    if bytes.get(close + 1) != Some(&b'(') {
        return None;
    }
    let mut j = close + 2;
    skip_inline_space(bytes, &mut j);

    let dest = if bytes.get(j) == Some(&b'<') {
        let start = j + 1;
        let mut k = start;
        while k < len && bytes[k] != b'>' && bytes[k] != b'\n' {
            if bytes[k] == b'\\' {
                k += 1;
            }
            k += 1;
        }
        if bytes.get(k) != Some(&b'>') {
            return None;
        }
        j = k + 1;
        start..k
    } else {
        let start = j;
        let mut parens = 0usize;
        while j < len {
            match bytes[j] {
                b'\\' => {
                    j += 2;
                    continue;
                }
                b if b.is_ascii_whitespace() => break,
                b'(' => parens += 1,
                b')' => {
                    if parens == 0 {
                        break;
                    }
                    parens -= 1;
                }
                _ => {}
            }
            j += 1;
        }
        j = j.min(len);
        if j == start {
            return None;
        }
        start..j
    };

    skip_inline_space(bytes, &mut j);

    let title = match bytes.get(j) {
        Some(&q) if q == b'"' || q == b'\'' || q == b'(' => {
            let closer = if q == b'(' { b')' } else { q };
            let start = j;
            let mut k = j + 1;
            while k < len && bytes[k] != closer {
                if bytes[k] == b'\\' {
                    k += 1;
                }
                k += 1;
            }
            if k >= len {
                return None;
            }
            j = k + 1;
            skip_inline_space(bytes, &mut j);
            Some(start..k + 1)
        }
        _ => None,
    };

    if bytes.get(j) != Some(&b')') {
        return None;
    }

    Some((open + 1..close, dest, title, j + 1))
}

fn skip_inline_space(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && matches!(bytes[*i], b' ' | b'\t' | b'\n') {
        *i += 1;
    }
}

/// Backslash-escapes brackets and backslashes in link or alt text
///
/// A trailing `\` left unescaped would swallow the closing bracket.
pub fn escape_link_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Formats a Markdown link destination, using `<...>` when the raw form
/// would not parse back
pub fn format_destination(dest: &str) -> String {
    let mut depth = 0i32;
    let mut balanced = true;
    for c in dest.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    balanced = false;
                }
            }
            _ => {}
        }
    }
    let needs_brackets = !balanced
        || depth != 0
        || dest.is_empty()
        || dest.chars().any(|c| c.is_whitespace() || c == '<' || c == '>');
    if needs_brackets {
        format!("<{}>", dest.replace('<', "%3C").replace('>', "%3E"))
    } else {
        dest.to_string()
    }
}
