use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::expr::Func;
use crate::query::strip_details;

pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec!["".to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();
    let mut current_width = 0;

    for word in text.split_whitespace() {
        let word_width = word.width();

        if word_width > width {
            let mut remaining = word;
            while !remaining.is_empty() {
                let mut chunk = String::new();
                let mut chunk_width = 0;
                let mut chunk_byte_len = 0;

                for c in remaining.chars() {
                    let char_width = UnicodeWidthChar::width_cjk(c).unwrap_or(1);
                    if chunk_width + char_width > width {
                        break;
                    }
                    chunk.push(c);
                    chunk_width += char_width;
                    chunk_byte_len += c.len_utf8();
                }

                if !current_line.is_empty() {
                    lines.push(current_line.trim().to_string());
                    current_line.clear();
                    current_width = 0;
                }

                lines.push(chunk);
                remaining = &remaining[chunk_byte_len..];
            }
            continue;
        }

        if current_width + word_width + 1 > width && !current_line.is_empty() {
            lines.push(current_line.trim().to_string());
            current_line.clear();
            current_width = 0;
        }

        if !current_line.is_empty() {
            current_line.push(' ');
            current_width += 1;
        }

        current_line.push_str(word);
        current_width += word_width;
    }

    if !current_line.is_empty() {
        lines.push(current_line.trim().to_string());
    }

    lines
}

#[derive(Clone, Copy, PartialEq)]
enum Prev {
    Start,
    Operand,
    Operator,
    Open,
    Separator,
}

/// Re-spaces a query for display: binary operators get spaces around them,
/// signs after `;`, `(`, `,` or another operator stay attached to their
/// operand, and a `details` keyword keeps its own word.
pub fn format_with_spaces(input: &str) -> String {
    let (detailed, body) = strip_details(input.trim());
    let formatted = format_body(body);
    if detailed {
        format!("details {}", formatted).trim_end().to_string()
    } else {
        formatted
    }
}

fn format_body(expr: &str) -> String {
    let chars: Vec<char> = expr.chars().filter(|c| !c.is_whitespace()).collect();
    let mut result = String::new();
    let mut prev = Prev::Start;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '*' if chars.get(i + 1) == Some(&'*') => {
                result.push_str(" ** ");
                prev = Prev::Operator;
                i += 1;
            }
            '+' | '-' if prev != Prev::Operand => {
                if prev == Prev::Operator {
                    result.push(' ');
                }
                result.push(c);
            }
            '+' | '-' | '*' | '/' | '^' | '%' => {
                result.push(' ');
                result.push(c);
                result.push(' ');
                prev = Prev::Operator;
            }
            '(' => {
                result.push(c);
                prev = Prev::Open;
            }
            ')' => {
                result.push(c);
                prev = Prev::Operand;
            }
            ',' | ';' => {
                result.push(c);
                result.push(' ');
                prev = Prev::Separator;
            }
            _ if c.is_ascii_digit() || c == '.' => {
                let len = number_len(&chars[i..]);
                result.extend(&chars[i..i + len]);
                prev = Prev::Operand;
                i += len;
                continue;
            }
            _ => {
                result.push(c);
                prev = Prev::Operand;
            }
        }
        i += 1;
    }

    result.split_whitespace().collect::<Vec<_>>().join(" ")
}

// Length of the number literal at the start of `chars`, exponent included.
fn number_len(chars: &[char]) -> usize {
    let mut len = chars
        .iter()
        .take_while(|c| c.is_ascii_digit() || **c == '.')
        .count();
    if matches!(chars.get(len), Some('e' | 'E')) {
        let sign = usize::from(matches!(chars.get(len + 1), Some('+' | '-')));
        let digits = chars[len + 1 + sign..]
            .iter()
            .take_while(|c| c.is_ascii_digit())
            .count();
        if digits > 0 {
            len += 1 + sign + digits;
        }
    }
    len
}

pub fn is_math_function(word: &str) -> bool {
    matches!(word.to_lowercase().as_str(), "pi" | "e") || Func::from_name(word).is_some()
}

fn word_style(word: &str, base_style: Style) -> Style {
    if word.eq_ignore_ascii_case("x") {
        Style::default()
            .fg(Color::LightMagenta)
            .add_modifier(Modifier::BOLD)
    } else if is_math_function(word) {
        Style::default()
            .fg(Color::LightBlue)
            .add_modifier(Modifier::BOLD)
    } else if word.eq_ignore_ascii_case("details") {
        Style::default().fg(Color::DarkGray)
    } else {
        base_style
    }
}

pub fn highlight_functions(expr: &str, base_style: Style) -> Vec<Span<'static>> {
    let operator_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let number_style = Style::default()
        .fg(Color::LightGreen);

    let mut spans = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut in_number = false;

    let flush = |spans: &mut Vec<Span<'static>>, current: &mut String, in_word: bool| {
        if current.is_empty() {
            return;
        }
        let style = if in_word {
            word_style(current, base_style)
        } else {
            number_style
        };
        spans.push(Span::styled(std::mem::take(current), style));
    };

    for c in expr.chars() {
        if c.is_alphabetic() || (in_word && (c.is_ascii_digit() || c == '_')) {
            if in_number {
                flush(&mut spans, &mut current, false);
                in_number = false;
            }
            current.push(c);
            in_word = true;
        } else if c.is_ascii_digit() || c == '.' {
            if in_word {
                flush(&mut spans, &mut current, true);
                in_word = false;
            }
            current.push(c);
            in_number = true;
        } else {
            flush(&mut spans, &mut current, in_word);
            in_word = false;
            in_number = false;

            match c {
                '+' | '-' | '*' | '/' | '^' | '%' => {
                    spans.push(Span::styled(c.to_string(), operator_style));
                }
                ' ' => {
                    spans.push(Span::raw(" "));
                }
                _ => {
                    spans.push(Span::styled(c.to_string(), base_style));
                }
            }
        }
    }
    flush(&mut spans, &mut current, in_word);

    spans
}
