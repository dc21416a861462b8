use std::time::{Duration, Instant};

use unicode_segmentation::UnicodeSegmentation;

use crate::config::Config;
use crate::ivt::{Report, Step, Trace};
use crate::plot::Samples;
use crate::query::Query;

pub struct HistoryEntry {
    pub input: String,
    pub result: Result<Report, String>,
    pub detailed_steps: Vec<Step>,
    pub detailed_mode: bool,
    pub duration: Duration,
    pub samples: Option<Samples>,
}

impl HistoryEntry {
    fn error(input: &str, message: String) -> Self {
        HistoryEntry {
            input: input.to_string(),
            result: Err(message),
            detailed_steps: Vec::new(),
            detailed_mode: false,
            duration: Duration::ZERO,
            samples: None,
        }
    }
}

pub struct App {
    pub config: Config,
    pub input: String,
    pub cursor_position: usize,
    pub input_scroll: usize,
    pub history: Vec<HistoryEntry>,
    pub cursor_history: usize,
    pub should_quit: bool,
    pub show_help: bool,
    pub help_scroll: usize,
    pub list_height: usize,
    pub item_start_indices: Vec<usize>,
    pub history_scroll: usize,
    pub scroll_to_bottom: bool,
    pub terminal_too_small: bool,
}

impl App {
    pub fn new(config: Config) -> Self {
        App {
            config,
            input: String::new(),
            cursor_position: 0,
            input_scroll: 0,
            history: Vec::new(),
            cursor_history: 0,
            should_quit: false,
            show_help: false,
            help_scroll: 0,
            list_height: 5,
            item_start_indices: Vec::new(),
            history_scroll: 0,
            scroll_to_bottom: false,
            terminal_too_small: false,
        }
    }

    pub fn adjust_input_scroll(&mut self, visible_width: usize) {
        let total_chars = self.input.chars().count();
        let cursor_pos = self.cursor_position;

        if cursor_pos < self.input_scroll {
            self.input_scroll = cursor_pos;
        } else if cursor_pos >= self.input_scroll + visible_width {
            self.input_scroll = cursor_pos - visible_width + 1;
        }

        if self.input_scroll > total_chars.saturating_sub(visible_width) {
            self.input_scroll = total_chars.saturating_sub(visible_width);
        }
    }

    /// The entry whose plot is shown beside the history.
    pub fn selected_entry(&self) -> Option<&HistoryEntry> {
        self.history.get(self.cursor_history)
    }

    pub fn submit(&mut self) {
        let input = self.input.trim().to_string();
        if input.is_empty() {
            return;
        }

        match input.to_lowercase().as_str() {
            "quit" | "exit" | "q" => {
                self.should_quit = true;
                return;
            }
            "clear" | "reset" => {
                self.history.clear();
                self.cursor_history = 0;
                self.clear_input();
                self.history_scroll = 0;
                return;
            }
            "help" => {
                self.show_help = true;
                self.clear_input();
                return;
            }
            _ => {}
        }

        let entry = match Query::parse(&input, self.config.solver.default_target) {
            Ok(query) => self.evaluate(&input, &query),
            Err(e) => HistoryEntry::error(&input, e.to_string()),
        };
        self.history.push(entry);

        self.cursor_history = self.history.len().saturating_sub(1);
        self.clear_input();
        self.scroll_to_bottom = true;
    }

    fn evaluate(&self, input: &str, query: &Query) -> HistoryEntry {
        let start_time = Instant::now();
        let mut trace = Trace::new(query.detailed);
        let result = query
            .run(&self.config.evaluator(), &mut trace)
            .map_err(|e| e.to_string());
        let duration = start_time.elapsed();

        let samples = self.config.plot.enabled.then(|| {
            Samples::collect(
                |x| query.function.call(x),
                query.a,
                query.b,
                &self.config.plot,
            )
        });

        HistoryEntry {
            input: input.to_string(),
            result,
            detailed_steps: trace.steps,
            detailed_mode: query.detailed,
            duration,
            samples,
        }
    }

    pub fn move_cursor(&mut self, direction: i32) {
        match direction {
            -1 => self.cursor_position = self.cursor_position.saturating_sub(1),
            1 => self.cursor_position = (self.cursor_position + 1).min(self.input.chars().count()),
            _ => {}
        }
    }

    /// Jumps to the previous or next word start.
    pub fn move_cursor_by_words(&mut self, direction: i32) {
        let cursor = Self::char_index_to_byte_index(&self.input, self.cursor_position);
        let starts: Vec<usize> = self.input.unicode_word_indices().map(|(i, _)| i).collect();

        let target = if direction < 0 {
            starts.iter().rev().copied().find(|&i| i < cursor).unwrap_or(0)
        } else {
            starts
                .iter()
                .copied()
                .find(|&i| i > cursor)
                .unwrap_or(self.input.len())
        };
        self.cursor_position = self.input[..target].chars().count();
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_idx = Self::char_index_to_byte_index(&self.input, self.cursor_position);
        self.input.insert(byte_idx, c);
        self.cursor_position += 1;
    }

    pub fn delete_char(&mut self) {
        let byte_idx = Self::char_index_to_byte_index(&self.input, self.cursor_position);
        if let Some(c) = self.input[byte_idx..].chars().next() {
            self.input.drain(byte_idx..byte_idx + c.len_utf8());
        }
    }

    pub fn backspace(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
            self.delete_char();
        }
    }

    pub fn navigate_history(&mut self, direction: i32) {
        if direction < 0 && self.cursor_history > 0 {
            self.cursor_history -= 1;
        } else if direction > 0 && self.cursor_history < self.history.len().saturating_sub(1) {
            self.cursor_history += 1;
        }

        if self.cursor_history < self.history.len() {
            self.input = self.history[self.cursor_history].input.clone();
        } else {
            self.input.clear();
        }
        self.cursor_position = self.input.chars().count();
        self.input_scroll = 0;
        self.scroll_to_bottom = false;
    }

    pub fn scroll_history(&mut self, direction: i32) {
        let step = self.list_height.saturating_sub(1);
        if direction < 0 {
            self.cursor_history = self.cursor_history.saturating_sub(step);
        } else {
            self.cursor_history = self
                .cursor_history
                .saturating_add(step)
                .min(self.history.len().saturating_sub(1));
        }

        if self.cursor_history < self.history.len() {
            self.input = self.history[self.cursor_history].input.clone();
        }
        self.cursor_position = self.input.chars().count();
        self.input_scroll = 0;
        self.scroll_to_bottom = false;
    }

    pub fn clear_input(&mut self) {
        self.input.clear();
        self.cursor_position = 0;
        self.input_scroll = 0;
    }

    pub fn char_index_to_byte_index(s: &str, char_index: usize) -> usize {
        s.char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or_else(|| s.len())
    }
}
