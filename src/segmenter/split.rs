// Splitting model replies into display messages
//
// A message never ends mid-sentence: messages are built from whole
// sentences, and list expansion only splits at line boundaries.

use once_cell::sync::Lazy;
use regex::Regex;

/// Buffer length (characters) after which a new message is started
pub const MAX_MESSAGE_CHARS: usize = 200;

static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("Failed to compile paragraph regex"));

/// A line that starts a list item: "- text" or "3. text"
static LIST_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:-|\d+\.)\s+").expect("Failed to compile list item regex"));

/// A sentence borrowed from the reply it was split out of
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Sentence<'a> {
    /// Byte offset of `text` in the source
    pub start: usize,
    pub text: &'a str,
    /// The whitespace before this sentence contained a line break
    pub starts_line: bool,
}

/// Split a model reply into ordered display messages.
///
/// Blank-line paragraphs win outright. Otherwise whole sentences are packed
/// into messages of roughly [`MAX_MESSAGE_CHARS`]; a sentence carrying an
/// embedded line break starts a new message. Any message holding a
/// list is expanded into its intro plus one "- item" message per entry.
/// Never returns an empty vector.
pub fn segment(reply: &str) -> Vec<String> {
    let reply = reply.trim();

    if PARAGRAPH_BREAK.is_match(reply) {
        return PARAGRAPH_BREAK
            .split(reply)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from)
            .collect();
    }

    let mut packed = Vec::new();
    let mut buffer = String::new();
    for sentence in split_sentences(reply) {
        let embedded_break = sentence.text.contains('\n');
        if !buffer.is_empty() && (buffer.chars().count() > MAX_MESSAGE_CHARS || embedded_break) {
            packed.push(std::mem::take(&mut buffer));
        }
        if !buffer.is_empty() {
            // Keep numbered items on their own line so list expansion still sees them
            let list_line = sentence.starts_line && LIST_ITEM.is_match(sentence.text);
            buffer.push(if list_line { '\n' } else { ' ' });
        }
        buffer.push_str(sentence.text);
    }
    if !buffer.is_empty() {
        packed.push(buffer);
    }

    let messages: Vec<String> = packed.into_iter().flat_map(expand_list).collect();
    if messages.is_empty() {
        return vec![reply.to_string()];
    }
    messages
}

/// Split on `.`, `!` or `?` followed by whitespace.
///
/// A period closing a bare number ("1. ") marks a list item, not a sentence end.
pub(crate) fn split_sentences(text: &str) -> Vec<Sentence<'_>> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut starts_line = false;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        match chars.peek() {
            Some((_, next)) if next.is_whitespace() => {}
            _ => continue,
        }
        if c == '.' && is_list_number(&text[start..i]) {
            continue;
        }

        let end = i + c.len_utf8();
        push_sentence(&mut sentences, text, start, end, starts_line);

        let mut saw_newline = false;
        start = end;
        while let Some((j, ws)) = chars.peek().copied() {
            if !ws.is_whitespace() {
                break;
            }
            saw_newline |= ws == '\n';
            start = j + ws.len_utf8();
            chars.next();
        }
        starts_line = saw_newline;
    }
    push_sentence(&mut sentences, text, start, text.len(), starts_line);

    sentences
}

fn push_sentence<'a>(
    out: &mut Vec<Sentence<'a>>,
    text: &'a str,
    start: usize,
    end: usize,
    starts_line: bool,
) {
    let raw = &text[start..end];
    let trimmed = raw.trim_start();
    let start = start + (raw.len() - trimmed.len());
    let trimmed = trimmed.trim_end();
    if !trimmed.is_empty() {
        out.push(Sentence {
            start,
            text: trimmed,
            starts_line,
        });
    }
}

/// Whether the text before a period is just a list number on its own line
fn is_list_number(before: &str) -> bool {
    let token = before
        .rsplit(|c: char| c.is_whitespace())
        .next()
        .unwrap_or_default();
    if token.is_empty() || !token.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let line_prefix = before[..before.len() - token.len()]
        .rsplit('\n')
        .next()
        .unwrap_or_default();
    line_prefix.trim().is_empty()
}

/// Break a message holding list items into intro + one "- item" per entry
fn expand_list(message: String) -> Vec<String> {
    let Some(first_item) = message.lines().position(|line| LIST_ITEM.is_match(line)) else {
        return vec![message];
    };
    let lines: Vec<&str> = message.lines().collect();

    let mut out = Vec::new();
    let intro = lines[..first_item].join("\n");
    let intro = intro.trim();
    if !intro.is_empty() {
        out.push(intro.to_string());
    }

    let mut current: Option<String> = None;
    for line in &lines[first_item..] {
        if let Some(marker) = LIST_ITEM.find(line) {
            out.extend(current.take());
            let item = line[marker.end()..].trim();
            if !item.is_empty() {
                current = Some(format!("- {}", item));
            }
        } else if line.trim().is_empty() {
            continue;
        } else if line.starts_with(char::is_whitespace) && current.is_some() {
            // Indented lines continue the current item
            if let Some(item) = current.as_mut() {
                item.push(' ');
                item.push_str(line.trim());
            }
        } else {
            out.extend(current.take());
            out.push(line.trim().to_string());
        }
    }
    out.extend(current);

    out
}
