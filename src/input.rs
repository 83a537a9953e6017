// src/input.rs

use std::io::{BufRead, Write};

use crate::error::Result;

/// Where queries come from.
pub trait QuerySource {
    /// The next query, or `None` when the source is exhausted.
    fn next_query(&mut self) -> Result<Option<String>>;
}

/// A single query supplied up front.
#[derive(Debug, Clone)]
pub struct FixedQuery {
    query: Option<String>,
}

impl FixedQuery {
    pub fn new(query: impl Into<String>) -> Self {
        FixedQuery {
            query: Some(query.into()),
        }
    }
}

impl QuerySource for FixedQuery {
    fn next_query(&mut self) -> Result<Option<String>> {
        Ok(self.query.take())
    }
}

/// Line-oriented prompt: writes `prompt`, reads one line per query, skips
/// blank lines and ends at EOF.
pub struct InteractivePrompt<R, W> {
    reader: R,
    writer: W,
    prompt: String,
}

impl<R: BufRead, W: Write> InteractivePrompt<R, W> {
    pub fn new(reader: R, writer: W, prompt: impl Into<String>) -> Self {
        InteractivePrompt {
            reader,
            writer,
            prompt: prompt.into(),
        }
    }
}

impl<R: BufRead, W: Write> QuerySource for InteractivePrompt<R, W> {
    fn next_query(&mut self) -> Result<Option<String>> {
        loop {
            self.writer.write_all(self.prompt.as_bytes())?;
            self.writer.flush()?;

            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            let query = line.trim();
            if !query.is_empty() {
                return Ok(Some(query.to_string()));
            }
        }
    }
}
