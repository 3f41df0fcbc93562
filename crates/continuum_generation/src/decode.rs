//! Lenient decoding of backend replies.
//!
//! Backend output is untrusted free text that usually, but not always, holds
//! the requested JSON document. The first balanced top-level object is parsed
//! as-is when it is valid JSON. Otherwise cleanup is a fixed pipeline: strip
//! code fences, normalize typographic quotes, strip comments, extract the
//! first balanced top-level object, then parse. Anything that still fails to
//! parse is [`GenerationErrorKind::MalformedOutput`] and is retried, not
//! repaired.

use continuum_core::BatchReply;
use continuum_error::{ContinuumResult, GenerationError, GenerationErrorKind};
use tracing::debug;

/// Decodes a raw reply into a [`BatchReply`].
///
/// Typographic quotes inside ASCII-quoted string values are content and are
/// kept.
///
/// # Examples
///
/// ```
/// use continuum_generation::decode_reply;
///
/// let raw = "Sure! Here it is:\n```json\n{\u{201C}segments\u{201D}: [\n  // first\n  {\"segment_id\": \"s1\", \"shot\": \"wide\"}\n]}\n```";
/// let reply = decode_reply(raw).unwrap();
/// assert_eq!(reply.segments[0].segment_id, "s1");
/// ```
pub fn decode_reply(raw: &str) -> ContinuumResult<BatchReply> {
    let unfenced = strip_code_fences(raw);

    let uncommented = strip_comments(&unfenced);
    if let Some(object) = extract_first_object(&uncommented) {
        if let Ok(reply) = serde_json::from_str::<BatchReply>(object) {
            debug!(segments = reply.segments.len(), "Decoded backend reply");
            return Ok(reply);
        }
    }

    let quoted = normalize_quotes(&unfenced);
    let uncommented = strip_comments(&quoted);
    let object = extract_first_object(&uncommented).ok_or_else(|| {
        GenerationError::new(GenerationErrorKind::MalformedOutput(format!(
            "no JSON object in reply (length: {})",
            raw.len()
        )))
    })?;

    let reply: BatchReply = serde_json::from_str(object).map_err(|e| {
        GenerationError::new(GenerationErrorKind::MalformedOutput(e.to_string()))
    })?;
    debug!(
        segments = reply.segments.len(),
        "Decoded backend reply after quote normalization"
    );
    Ok(reply)
}

/// Returns the content of the first fenced code block, or the whole text
/// when there is none. An unclosed fence runs to the end of the text.
pub fn strip_code_fences(text: &str) -> String {
    let Some(start) = text.find("```") else {
        return text.to_string();
    };
    let after_fence = start + 3;
    // Skip the language tag, if any.
    let content_start = text[after_fence..]
        .find('\n')
        .map(|n| after_fence + n + 1)
        .unwrap_or(after_fence);

    match text[content_start..].find("```") {
        Some(end) => text[content_start..content_start + end].trim().to_string(),
        None => text[content_start..].trim().to_string(),
    }
}

/// Replaces typographic quotes used as JSON delimiters with ASCII quotes.
///
/// A string opened by an ASCII quote keeps every typographic quote inside it.
/// A string opened by a typographic double quote ends at the next typographic
/// double quote; ASCII quotes inside it are escaped.
pub fn normalize_quotes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    // Delimiter of the open string: `Some(true)` for ASCII, `Some(false)` for typographic.
    let mut open: Option<bool> = None;
    let mut escape_next = false;

    for c in text.chars() {
        let curly_double = matches!(
            c,
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' | '\u{00AB}' | '\u{00BB}'
        );
        let curly_single = matches!(c, '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}');

        match open {
            Some(_) if escape_next => {
                escape_next = false;
                out.push(c);
            }
            Some(_) if c == '\\' => {
                escape_next = true;
                out.push(c);
            }
            Some(true) => {
                if c == '"' {
                    open = None;
                }
                out.push(c);
            }
            Some(false) => {
                if curly_double {
                    open = None;
                    out.push('"');
                } else if c == '"' {
                    out.push_str("\\\"");
                } else {
                    out.push(c);
                }
            }
            None if c == '"' => {
                open = Some(true);
                out.push(c);
            }
            None if curly_double => {
                open = Some(false);
                out.push('"');
            }
            None if curly_single => out.push('\''),
            None => out.push(c),
        }
    }
    out
}

/// Removes `//` line comments and `/* */` block comments outside strings.
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;
    let mut escape_next = false;

    while let Some(ch) = chars.next() {
        if in_string {
            out.push(ch);
            if escape_next {
                escape_next = false;
            } else if ch == '\\' {
                escape_next = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match (ch, chars.peek()) {
            ('"', _) => {
                in_string = true;
                out.push(ch);
            }
            ('/', Some('/')) => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut previous = '\0';
                for c in chars.by_ref() {
                    if previous == '*' && c == '/' {
                        break;
                    }
                    previous = c;
                }
                out.push(' ');
            }
            _ => out.push(ch),
        }
    }
    out
}

/// The first balanced `{ ... }` in `text`, ignoring braces inside strings.
pub fn extract_first_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
