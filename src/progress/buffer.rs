//! Reassembly of complete lines from arbitrarily chunked process output.
//!
//! Bytes are buffered raw and decoded one complete line at a time, so a
//! chunk boundary that falls inside a multibyte character is harmless.

use tracing::debug;

/// Persistent buffer of not-yet-terminated output.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
    /// Treat a lone `\r` as a line terminator (tqdm redraws its bar with it)
    split_carriage_returns: bool,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_carriage_returns(split: bool) -> Self {
        Self {
            pending: Vec::new(),
            split_carriage_returns: split,
        }
    }

    /// Append a chunk and iterate over every line it completes.
    ///
    /// Lines not consumed from the iterator stay buffered and are yielded by
    /// the next call, so dropping the iterator early never loses output.
    pub fn push(&mut self, chunk: &[u8]) -> Lines<'_> {
        self.pending.extend_from_slice(chunk);
        Lines { buffer: self }
    }

    /// Bytes received but not yet newline-terminated.
    pub fn remainder(&self) -> &[u8] {
        &self.pending
    }

    /// Take the unterminated remainder as a final line, if it decodes.
    pub fn flush(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let bytes = std::mem::take(&mut self.pending);
        decode_line(bytes)
    }

    fn terminator_position(&self) -> Option<usize> {
        if self.split_carriage_returns {
            self.pending.iter().position(|b| *b == b'\n' || *b == b'\r')
        } else {
            self.pending.iter().position(|b| *b == b'\n')
        }
    }

    fn next_line(&mut self) -> Option<String> {
        loop {
            let pos = self.terminator_position()?;
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            line.pop();
            if let Some(decoded) = decode_line(line) {
                return Some(decoded);
            }
        }
    }
}

/// Lazy iterator over the complete lines currently held by a [`LineBuffer`].
pub struct Lines<'a> {
    buffer: &'a mut LineBuffer,
}

impl Iterator for Lines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        self.buffer.next_line()
    }
}

fn decode_line(mut bytes: Vec<u8>) -> Option<String> {
    if bytes.last() == Some(&b'\r') {
        bytes.pop();
    }
    match String::from_utf8(bytes) {
        Ok(line) => Some(line),
        Err(e) => {
            debug!(
                len = e.as_bytes().len(),
                "dropping output line that is not valid UTF-8"
            );
            None
        }
    }
}
