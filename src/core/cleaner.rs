//! Text cleanup — repairs spacing, dangling connectors, and punctuation
//! left behind by omitted fields.

use regex::Regex;
use std::sync::LazyLock;

/// Connector words that only make sense between two fragments. Multi-word
/// connectors come first so they win over their last word.
pub const CONNECTORS: &[&str] = &["paired with", "and", "with", "wearing", "in", "of"];

/// Punctuation the cleaner treats as fragment boundaries.
pub const PUNCTUATION: &[char] = &[',', '.', ';', ':', '!', '?'];

fn connector_alternation() -> String {
    CONNECTORS
        .iter()
        .map(|c| c.replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|")
}

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

static CONNECTOR_BEFORE_PUNCT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b(?:{})\s*([,.;:!?])", connector_alternation()))
        .expect("Invalid connector/punctuation regex")
});

static DOUBLE_CONNECTOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alt = connector_alternation();
    Regex::new(&format!(r"(?i)\b(?:{alt})\s+((?:{alt}))\b"))
        .expect("Invalid double connector regex")
});

static TRAILING_CONNECTOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)(?:^|\s+)(?:{})$", connector_alternation()))
        .expect("Invalid trailing connector regex")
});

static SPACE_BEFORE_PUNCT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([,.;:!?])").expect("Invalid space/punctuation regex"));

static EMPTY_PARENS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\s*\)").expect("Invalid empty parens regex"));

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").into_owned()
}

fn drop_connector_before_punctuation(text: &str) -> String {
    CONNECTOR_BEFORE_PUNCT_RE.replace_all(text, "$1").into_owned()
}

fn collapse_double_connectors(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = DOUBLE_CONNECTOR_RE.replace_all(&current, "$1").into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

fn strip_trailing_connector(text: &str) -> String {
    TRAILING_CONNECTOR_RE
        .replace(text.trim_end(), "")
        .into_owned()
}

fn drop_space_before_punctuation(text: &str) -> String {
    SPACE_BEFORE_PUNCT_RE.replace_all(text, "$1").into_owned()
}

fn collapse_repeated_punctuation(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev: Option<char> = None;
    for c in text.chars() {
        if PUNCTUATION.contains(&c) && prev == Some(c) {
            continue;
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

/// Nested pairs such as `(( ))` only empty out from the inside, so this
/// repeats until none remain.
fn drop_empty_parentheses(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = EMPTY_PARENS_RE.replace_all(&current, "").into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

fn trim_edges(text: &str) -> String {
    text.trim_matches(|c: char| c.is_whitespace() || PUNCTUATION.contains(&c))
        .to_string()
}

/// One ordered pass of every cleanup step. Later steps rely on earlier ones.
fn clean_once(text: &str) -> String {
    let text = collapse_whitespace(text);
    let text = drop_connector_before_punctuation(&text);
    let text = collapse_double_connectors(&text);
    let text = strip_trailing_connector(&text);
    let text = drop_space_before_punctuation(&text);
    let text = collapse_repeated_punctuation(&text);
    let text = drop_empty_parentheses(&text);
    trim_edges(&text)
}

/// Normalize assembled prompt text.
///
/// Repeats the ordered pass until the text stops changing, so the result
/// is stable under a second `clean`. After the first pass every step only
/// deletes, so the loop ends. Never fails; the worst case is an empty
/// string.
pub fn clean(text: &str) -> String {
    let mut current = clean_once(text);
    loop {
        let next = clean_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}
