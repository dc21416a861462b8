use std::io::{stdin, stdout, Write};

use anyhow::{Context, Result};
use termion::{
    clear::CurrentLine as ClearLine,
    cursor::{DetectCursorPos, Goto},
    event::Key,
    input::TermRead,
    raw::IntoRawMode,
};
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::query::respond;

const PROMPT: &str = "Query: ";

// Функция для преобразования позиции символа в байтовую позицию
fn char_index_to_byte_index(s: &str, char_index: usize) -> usize {
    s.char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or_else(|| s.len())
}

// Колонка терминала (с 1) для курсора после `cursor_pos` символов ввода
fn cursor_column(query: &str, cursor_pos: usize) -> u16 {
    let byte_pos = char_index_to_byte_index(query, cursor_pos);
    let width = PROMPT.width() + query[..byte_pos].width();
    u16::try_from(width + 1).unwrap_or(u16::MAX)
}

fn remove_char_at(s: &mut String, char_index: usize) {
    let byte_idx = char_index_to_byte_index(s, char_index);
    if let Some(c) = s[byte_idx..].chars().next() {
        s.drain(byte_idx..byte_idx + c.len_utf8());
    }
}

pub fn run_line(config: &Config) -> Result<()> {
    println!("IVT Calculator");
    println!("Query: <f(x)>; <a>; <b>[; <N>]   e.g. x**3 - 6*x**2 + 11*x - 6; 0; 1.5; 0");
    println!("Functions: sin, cos, tan, exp, ln, log, sqrt, abs, ...  Constants: pi, e");
    println!("Navigation: ←/→, Backspace/Delete, Home/End, ↑/↓ for history");
    println!("Special commands: 'quit' to exit, 'clear' to reset history");
    println!("\rAdd 'details' before a query to list every bisection step\n");

    let mut stdout = stdout()
        .into_raw_mode()
        .context("could not switch the terminal to raw mode")?;
    let mut history: Vec<String> = Vec::new();
    let mut history_index = 0;

    loop {
        write!(stdout, "{}{}", ClearLine, PROMPT)?;
        stdout.flush()?;

        let mut query = String::new();
        let mut cursor_pos = 0; // позиция курсора в символах
        let (_, initial_y) = stdout.cursor_pos()?;

        let stdin = stdin();
        let mut keys = stdin.keys();

        loop {
            write!(
                stdout,
                "{}{}{}{}",
                Goto(1, initial_y),
                ClearLine,
                PROMPT,
                query
            )?;

            write!(stdout, "{}", Goto(cursor_column(&query, cursor_pos), initial_y))?;
            stdout.flush()?;

            let Some(key) = keys.next() else {
                write!(stdout, "\r\n")?;
                return Ok(());
            };
            match key? {
                Key::Char('\n') => break,
                Key::Ctrl('c') | Key::Ctrl('d') => {
                    write!(stdout, "\r\nGoodbye!\r\n")?;
                    return Ok(());
                }
                Key::Ctrl('u') => {
                    query.clear();
                    cursor_pos = 0;
                }
                Key::Char(c) => {
                    let byte_idx = char_index_to_byte_index(&query, cursor_pos);
                    query.insert(byte_idx, c);
                    cursor_pos += 1;
                }
                Key::Backspace if cursor_pos > 0 => {
                    cursor_pos -= 1;
                    remove_char_at(&mut query, cursor_pos);
                }
                Key::Delete if cursor_pos < query.chars().count() => {
                    remove_char_at(&mut query, cursor_pos);
                }
                Key::Left if cursor_pos > 0 => cursor_pos -= 1,
                Key::Right if cursor_pos < query.chars().count() => cursor_pos += 1,
                Key::Home => cursor_pos = 0,
                Key::End => cursor_pos = query.chars().count(),
                Key::Up => {
                    if history_index > 0 {
                        history_index -= 1;
                        query = history[history_index].clone();
                        cursor_pos = query.chars().count();
                    }
                }
                Key::Down => {
                    if history_index < history.len().saturating_sub(1) {
                        history_index += 1;
                        query = history[history_index].clone();
                        cursor_pos = query.chars().count();
                    } else {
                        history_index = history.len();
                        query.clear();
                        cursor_pos = 0;
                    }
                }
                _ => {}
            }
        }

        let input = query.trim();
        if input.is_empty() {
            write!(stdout, "\r\n")?;
            continue;
        }

        match input.to_lowercase().as_str() {
            "quit" | "exit" | "q" => {
                write!(stdout, "\r\nGoodbye!\r\n")?;
                return Ok(());
            }
            "clear" | "reset" => {
                history.clear();
                history_index = 0;
                write!(stdout, "\r\nHistory cleared\r\n\r\n")?;
                continue;
            }
            _ => {}
        }

        history.push(input.to_string());
        history_index = history.len();

        write!(stdout, "\r\n")?;
        for line in respond(input, config) {
            write!(stdout, "  {}\r\n", line)?;
        }
        write!(stdout, "\r\n")?;
        stdout.flush()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_column_counts_display_width() {
        let start = PROMPT.len() as u16 + 1;
        assert_eq!(cursor_column("", 0), start);
        assert_eq!(cursor_column("x; 0; 1", 3), start + 3);
        // `π` is two bytes but one column wide.
        assert_eq!(cursor_column("π/2; 1", 2), start + 2);
        assert_eq!(cursor_column("π/2; 1", 6), start + 6);
    }

    #[test]
    fn removes_multibyte_characters() {
        let mut query = String::from("sin(π)");
        remove_char_at(&mut query, 4);
        assert_eq!(query, "sin()");
        remove_char_at(&mut query, 10);
        assert_eq!(query, "sin()");
    }
}
