//! Minimal comma-separated input reader for bulk import.
//!
//! Supports double-quoted fields with embedded commas, `""` escapes and line
//! breaks. Blank lines between records are skipped but still count towards
//! line numbers, so errors point at the physical line in the file. A record
//! reports the line it starts on.

use std::io::BufRead;

use shelfmark_contracts::error::{LedgerError, LedgerResult};

/// One record and the 1-based line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub line: usize,
    pub fields: Vec<String>,
}

/// Pulls records off a buffered reader one at a time.
pub struct Reader<R> {
    input: R,
    line: usize,
    buf: String,
}

impl<R: BufRead> Reader<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            line: 0,
            buf: String::new(),
        }
    }

    /// The first record. An input with no header row is `Input`.
    pub fn header(&mut self) -> LedgerResult<Vec<String>> {
        match self.next_record()? {
            Some(record) => Ok(record.fields),
            None => Err(LedgerError::Input {
                reason: "input is empty; expected a header row".to_string(),
            }),
        }
    }

    /// Every record left in the input.
    pub fn rest(&mut self) -> LedgerResult<Vec<Record>> {
        let mut rows = Vec::new();
        while let Some(record) = self.next_record()? {
            rows.push(record);
        }
        Ok(rows)
    }

    /// The next non-blank record, or `None` at end of input.
    pub fn next_record(&mut self) -> LedgerResult<Option<Record>> {
        let mut fields = Fields::default();
        let mut start = None;

        while self.read_line()? {
            let line = self.buf.trim_end_matches(['\n', '\r']);
            if start.is_none() && line.trim().is_empty() {
                continue;
            }
            let first = *start.get_or_insert(self.line);
            if start != Some(self.line) {
                fields.field.push('\n');
            }

            fields.feed(line);
            if !fields.in_quotes {
                return Ok(Some(Record {
                    line: first,
                    fields: fields.finish(),
                }));
            }
        }

        match start {
            None => Ok(None),
            Some(first) => Err(unterminated().at_line(first)),
        }
    }

    fn read_line(&mut self) -> LedgerResult<bool> {
        self.buf.clear();
        let read = self.input.read_line(&mut self.buf).map_err(|e| LedgerError::Input {
            reason: format!("failed to read line {}: {e}", self.line + 1),
        })?;
        if read == 0 {
            return Ok(false);
        }
        self.line += 1;
        Ok(true)
    }
}

/// Split one self-contained line into fields.
pub fn split_record(line: &str) -> LedgerResult<Vec<String>> {
    let mut fields = Fields::default();
    fields.feed(line);
    if fields.in_quotes {
        return Err(unterminated());
    }
    Ok(fields.finish())
}

/// Tokenizer state carried across the lines of one record.
#[derive(Default)]
struct Fields {
    done: Vec<String>,
    field: String,
    in_quotes: bool,
}

impl Fields {
    fn feed(&mut self, line: &str) {
        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            if self.in_quotes {
                match c {
                    '"' if chars.peek() == Some(&'"') => {
                        chars.next();
                        self.field.push('"');
                    }
                    '"' => self.in_quotes = false,
                    _ => self.field.push(c),
                }
            } else {
                match c {
                    ',' => self.done.push(std::mem::take(&mut self.field)),
                    '"' if self.field.is_empty() => self.in_quotes = true,
                    _ => self.field.push(c),
                }
            }
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.done.push(self.field);
        self.done
    }
}

fn unterminated() -> LedgerError {
    LedgerError::Input {
        reason: "unterminated quoted field".to_string(),
    }
}
