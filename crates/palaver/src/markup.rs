//! Inline emphasis in assistant replies.
//!
//! The assistant marks emphasis as `**like this**`. A delimiter without a
//! partner is shown as typed, and so is an empty pair.

use std::fmt::Write as _;

use owo_colors::OwoColorize;

const DELIMITER: &str = "**";

/// A run of text with uniform styling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Span<'a> {
    /// Text shown as is.
    Plain(&'a str),
    /// Emphasized text, without its delimiters.
    Strong(&'a str),
}

/// Splits `text` into styled spans.
pub fn parse(text: &str) -> Vec<Span<'_>> {
    let mut spans = Vec::new();
    let mut plain = 0;
    let mut cursor = 0;

    while let Some(open) = text[cursor..].find(DELIMITER).map(|i| cursor + i) {
        let inner = open + DELIMITER.len();
        let Some(close) = text[inner..].find(DELIMITER).map(|i| inner + i)
        else {
            break;
        };
        cursor = close + DELIMITER.len();
        if close == inner {
            continue;
        }

        if plain < open {
            spans.push(Span::Plain(&text[plain..open]));
        }
        spans.push(Span::Strong(&text[inner..close]));
        plain = cursor;
    }

    if plain < text.len() {
        spans.push(Span::Plain(&text[plain..]));
    }
    spans
}

/// Renders `text` for a terminal, with emphasis in bold.
pub fn render(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for span in parse(text) {
        match span {
            Span::Plain(s) => out.push_str(s),
            Span::Strong(s) => {
                write!(out, "{}", s.bold()).ok();
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        assert_eq!(parse("hi there"), [Span::Plain("hi there")]);
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_emphasis() {
        assert_eq!(
            parse("Use **cargo** or **rustc**."),
            [
                Span::Plain("Use "),
                Span::Strong("cargo"),
                Span::Plain(" or "),
                Span::Strong("rustc"),
                Span::Plain("."),
            ]
        );
        assert_eq!(parse("**all**"), [Span::Strong("all")]);
    }

    #[test]
    fn test_unmatched_delimiters_stay_literal() {
        assert_eq!(parse("2 ** 3"), [Span::Plain("2 ** 3")]);
        assert_eq!(
            parse("**a** and **b"),
            [Span::Strong("a"), Span::Plain(" and **b")]
        );
        assert_eq!(parse("****"), [Span::Plain("****")]);
    }

    #[test]
    fn test_render() {
        assert_eq!(render("no styling"), "no styling");
        assert_eq!(render("a **b** c"), "a \u{1b}[1mb\u{1b}[0m c");
    }
}
