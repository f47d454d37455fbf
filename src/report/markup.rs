//! Restricted inline markup for section bodies.
//!
//! Supported: `<b>`, `<i>`, `<br>` (and the self-closing spellings).
//! Anything else passes through as literal text. Newlines in the source
//! are line breaks.

/// Style flags carried by a text span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpanStyle {
    pub bold: bool,
    pub italic: bool,
}

/// A parsed inline element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String, SpanStyle),
    LineBreak,
}

/// Parse body text into styled spans and line breaks.
pub fn parse_inline(text: &str) -> Vec<Inline> {
    let mut out = Vec::new();
    let mut style = SpanStyle::default();
    let mut buf = String::new();

    let flush = |buf: &mut String, style: SpanStyle, out: &mut Vec<Inline>| {
        if !buf.is_empty() {
            out.push(Inline::Text(std::mem::take(buf), style));
        }
    };

    let mut rest = text;
    while let Some(ch) = rest.chars().next() {
        if ch == '\r' {
            rest = &rest[1..];
            continue;
        }
        if ch == '\n' {
            flush(&mut buf, style, &mut out);
            out.push(Inline::LineBreak);
            rest = &rest[1..];
            continue;
        }
        if ch == '<' {
            let tag = [
                ("<b>", 0), ("</b>", 1), ("<i>", 2), ("</i>", 3),
                ("<br>", 4), ("<br/>", 4), ("<br />", 4),
            ]
            .iter()
            .find(|(t, _)| rest.starts_with(t));
            if let Some((t, action)) = tag {
                flush(&mut buf, style, &mut out);
                match action {
                    0 => style.bold = true,
                    1 => style.bold = false,
                    2 => style.italic = true,
                    3 => style.italic = false,
                    _ => out.push(Inline::LineBreak),
                }
                rest = &rest[t.len()..];
                continue;
            }
        }
        buf.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    flush(&mut buf, style, &mut out);
    out
}

/// One wrapped output line: spans with their styles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    pub spans: Vec<(String, SpanStyle)>,
}

impl Line {
    pub fn char_count(&self) -> usize {
        self.spans.iter().map(|(text, _)| text.chars().count()).sum()
    }

    fn push_word(&mut self, word: &str, style: SpanStyle) {
        if self.spans.is_empty() {
            self.spans.push((word.to_string(), style));
            return;
        }
        let same_style = self.spans.last().is_some_and(|(_, s)| *s == style);
        // the inter-word space lives in the preceding span
        let last = self.spans.last_mut().unwrap();
        last.0.push(' ');
        if same_style {
            last.0.push_str(word);
        } else {
            self.spans.push((word.to_string(), style));
        }
    }
}

/// Greedy word wrap at an estimated line width in characters.
///
/// Deterministic: the same input and width always produce the same lines.
/// Words longer than the width get a line of their own.
pub fn wrap_spans(inlines: &[Inline], max_chars: usize) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut current = Line::default();

    for inline in inlines {
        match inline {
            Inline::LineBreak => {
                lines.push(std::mem::take(&mut current));
            }
            Inline::Text(text, style) => {
                for word in text.split_whitespace() {
                    let needed = word.chars().count()
                        + if current.spans.is_empty() { 0 } else { 1 };
                    if current.char_count() + needed > max_chars && !current.spans.is_empty() {
                        lines.push(std::mem::take(&mut current));
                    }
                    current.push_word(word, *style);
                }
            }
        }
    }
    if !current.spans.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN: SpanStyle = SpanStyle {
        bold: false,
        italic: false,
    };
    const BOLD: SpanStyle = SpanStyle {
        bold: true,
        italic: false,
    };

    #[test]
    fn test_bold_and_italic_spans() {
        let parsed = parse_inline("uptime <b>99.9%</b> last <i>week</i>");
        assert_eq!(
            parsed,
            vec![
                Inline::Text("uptime ".into(), PLAIN),
                Inline::Text("99.9%".into(), BOLD),
                Inline::Text(" last ".into(), PLAIN),
                Inline::Text(
                    "week".into(),
                    SpanStyle {
                        bold: false,
                        italic: true
                    }
                ),
            ]
        );
    }

    #[test]
    fn test_br_and_newlines_break_lines() {
        let parsed = parse_inline("one<br>two\nthree");
        assert_eq!(
            parsed,
            vec![
                Inline::Text("one".into(), PLAIN),
                Inline::LineBreak,
                Inline::Text("two".into(), PLAIN),
                Inline::LineBreak,
                Inline::Text("three".into(), PLAIN),
            ]
        );
    }

    #[test]
    fn test_unknown_tags_stay_literal() {
        let parsed = parse_inline("a <u>b</u>");
        assert_eq!(parsed, vec![Inline::Text("a <u>b</u>".into(), PLAIN)]);
    }

    #[test]
    fn test_wrap_is_greedy_and_deterministic() {
        let parsed = parse_inline("alpha beta gamma delta");
        let lines = wrap_spans(&parsed, 11);
        let texts: Vec<String> = lines
            .iter()
            .map(|l| {
                l.spans
                    .iter()
                    .map(|(t, _)| t.as_str())
                    .collect::<String>()
            })
            .collect();
        assert_eq!(texts, vec!["alpha beta", "gamma delta"]);
        assert_eq!(lines, wrap_spans(&parsed, 11));
    }

    #[test]
    fn test_wrap_preserves_styles_across_lines() {
        let parsed = parse_inline("plain <b>loud words here</b>");
        let lines = wrap_spans(&parsed, 12);
        assert!(lines.len() >= 2);
        // every span after the first word of line 1 is bold
        let bold_spans: Vec<bool> = lines
            .iter()
            .flat_map(|l| l.spans.iter().map(|(_, s)| s.bold))
            .collect();
        assert!(bold_spans.iter().skip(1).all(|&b| b));
    }

    #[test]
    fn test_oversized_word_gets_its_own_line() {
        let parsed = parse_inline("ok supercalifragilistic ok");
        let lines = wrap_spans(&parsed, 8);
        assert_eq!(lines.len(), 3);
    }
}
