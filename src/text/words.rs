//! Word iteration over byte buffers and over whole files.
//!
//! A word is a maximal run of bytes that are neither US-ASCII whitespace
//! nor control bytes. Multi-byte UTF-8 sequences fall on the word side of
//! that split, so German words come through intact.

use std::fs::File;
use std::io::Read;

use crate::Result;

fn is_word_byte(b: u8) -> bool {
    b > 0x20 && b != 0x7f
}

/// Iterator over the words of an in-memory buffer, yielding
/// `(byte_offset, word)` pairs.
pub fn words(buf: &[u8]) -> Words<'_> {
    Words { buf, at: 0 }
}

pub struct Words<'a> {
    buf: &'a [u8],
    at: usize,
}

impl<'a> Iterator for Words<'a> {
    type Item = (usize, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        while self.at < self.buf.len() && !is_word_byte(self.buf[self.at]) {
            self.at += 1;
        }
        if self.at >= self.buf.len() {
            return None;
        }
        let start = self.at;
        while self.at < self.buf.len() && is_word_byte(self.buf[self.at]) {
            self.at += 1;
        }
        Some((start, &self.buf[start..self.at]))
    }
}

/// A word delivered by [`FileWords`].
pub struct Word<'a> {
    pub bytes: &'a [u8],
    /// Offset of the first byte of the line the word sits on, i.e. the
    /// offset immediately following the most recent newline.
    pub ref_offset: u64,
    /// Fraction of the file consumed so far, in `0.0..=1.0`.
    pub progress: f32,
}

/// Pull-style streaming word reader over a file.
///
/// Reads the file in fixed-size blocks and hands out one word at a time;
/// words straddling a block boundary are re-buffered and delivered whole.
/// The driver decides between words whether to keep going, which is where
/// cancellation polling lives.
pub struct FileWords {
    file: File,
    file_size: u64,
    block: Vec<u8>,
    filled: usize,
    at: usize,
    block_start: u64,
    line_start: u64,
    word: Vec<u8>,
    word_ref: u64,
    eof: bool,
}

impl FileWords {
    pub fn new(file: File, block_size: usize) -> Result<Self> {
        let file_size = file.metadata()?.len();
        Ok(Self {
            file,
            file_size,
            block: vec![0u8; block_size.max(1)],
            filled: 0,
            at: 0,
            block_start: 0,
            line_start: 0,
            word: Vec::new(),
            word_ref: 0,
            eof: false,
        })
    }

    /// Next word of the file, or `None` at end of input.
    pub fn next_word(&mut self) -> Result<Option<Word<'_>>> {
        self.word.clear();
        loop {
            if self.at == self.filled {
                if self.eof {
                    break;
                }
                self.refill()?;
                if self.filled == 0 {
                    self.eof = true;
                    break;
                }
            }
            while self.at < self.filled {
                let b = self.block[self.at];
                if is_word_byte(b) {
                    if self.word.is_empty() {
                        self.word_ref = self.line_start;
                    }
                    self.word.push(b);
                    self.at += 1;
                } else {
                    self.at += 1;
                    if b == b'\n' {
                        self.line_start = self.block_start + self.at as u64;
                    }
                    if !self.word.is_empty() {
                        return Ok(Some(self.current_word()));
                    }
                }
            }
            // block exhausted mid-word; refill and keep accumulating
        }
        if self.word.is_empty() {
            Ok(None)
        } else {
            Ok(Some(self.current_word()))
        }
    }

    fn refill(&mut self) -> Result<()> {
        self.block_start += self.filled as u64;
        self.at = 0;
        self.filled = self.file.read(&mut self.block)?;
        Ok(())
    }

    fn current_word(&self) -> Word<'_> {
        let consumed = self.block_start + self.at as u64;
        let progress = if self.file_size == 0 {
            1.0
        } else {
            consumed as f32 / self.file_size as f32
        };
        Word {
            bytes: &self.word,
            ref_offset: self.word_ref,
            progress,
        }
    }
}
