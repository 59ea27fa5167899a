//! Pure message composition.

use crate::mail::OutgoingMail;

use super::QueuedMessage;

/// Marker stored in campaign bodies, replaced per recipient at send time.
pub const UNSUBSCRIBE_PLACEHOLDER: &str = "{{unsubscribe_link}}";

/// Tags that end a line of text when stripped.
const LINE_BREAK_TAGS: &[&str] = &[
    "br", "p", "div", "hr", "li", "tr", "h1", "h2", "h3", "h4", "h5", "h6",
];

/// Replaces every unsubscribe placeholder in `html` with `unsubscribe_link`.
pub fn personalize(html: &str, unsubscribe_link: &str) -> String {
    html.replace(UNSUBSCRIBE_PLACEHOLDER, unsubscribe_link)
}

/// Removes every `<...>` tag, producing the plain-text alternative of a body.
///
/// Block-level tags become line breaks, character references are decoded,
/// runs of blank lines collapse to one, and the result is trimmed. An
/// unterminated `<` is kept as text.
pub fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut chars = html.chars();

    while let Some(c) = chars.next() {
        if c != '<' {
            text.push(c);
            continue;
        }

        let mut tag = String::new();
        let mut closed = false;
        for c in chars.by_ref() {
            if c == '>' {
                closed = true;
                break;
            }
            tag.push(c);
        }

        if !closed {
            text.push('<');
            text.push_str(&tag);
        } else if breaks_line(&tag) {
            text.push('\n');
        }
    }

    collapse_blank_lines(&decode_entities(&text))
}

/// Longest reference decoded, `&#x10FFFF;` included.
const MAX_ENTITY_LENGTH: usize = 10;

/// Decodes the named references templates and feeds commonly emit plus every
/// numeric one. Unknown or malformed references are kept as written.
fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        rest = &rest[start..];

        let decoded = rest[1..]
            .char_indices()
            .take(MAX_ENTITY_LENGTH)
            .find(|(_, c)| *c == ';')
            .and_then(|(end, _)| entity_char(&rest[1..=end]).map(|c| (c, end + 2)));

        match decoded {
            Some((c, consumed)) => {
                out.push(c);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn entity_char(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

fn breaks_line(tag: &str) -> bool {
    let name: String = tag
        .trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    LINE_BREAK_TAGS.contains(&name.as_str())
}

fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_blank = false;

    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            if previous_blank {
                continue;
            }
            previous_blank = true;
        } else {
            previous_blank = false;
        }
        out.push_str(line);
        out.push('\n');
    }

    out.trim().to_string()
}

/// Builds the email for one queued message.
///
/// The HTML part carries the personalized body; the text part is its
/// stripped form followed by the bare unsubscribe link.
pub fn compose(message: &QueuedMessage, unsubscribe_link: &str) -> OutgoingMail {
    let html = personalize(&message.html, unsubscribe_link);
    let text = format!("{}\n\nUnsubscribe: {unsubscribe_link}", strip_html(&html));

    OutgoingMail {
        to: message.email.clone(),
        subject: message.subject.clone(),
        text,
        html: Some(html),
    }
}
