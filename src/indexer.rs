//! Streaming index build.
//!
//! Drives the file word reader once over the data file, accumulating the
//! prefixes of the current line in a sorted bag and flushing the bag into
//! the writer's batch whenever the reader crosses onto a new line. The
//! batch commits once, after the final flush; a cancelled run returns
//! without committing and the batch is abandoned. Progress is reported on
//! whole-percent advances; cancellation is polled on every word.

use tracing::trace;

use crate::config::EngineConfig;
use crate::install::InstallState;
use crate::store::PrefixWriter;
use crate::text::words::FileWords;
use crate::text::{case, common, utf8};
use crate::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexOutcome {
    Completed,
    Cancelled,
}

pub struct Indexer<'a> {
    writer: PrefixWriter<'a>,
    config: &'a EngineConfig,
    current_ref: u64,
    prefix_bag: Vec<Vec<u8>>,
    upper: Vec<u8>,
    last_percent: i32,
}

impl<'a> Indexer<'a> {
    pub fn new(writer: PrefixWriter<'a>, config: &'a EngineConfig) -> Self {
        Self {
            writer,
            config,
            current_ref: 0,
            prefix_bag: Vec::new(),
            upper: Vec::new(),
            last_percent: -1,
        }
    }

    pub fn run(
        mut self,
        words: &mut FileWords,
        progress: &mut dyn FnMut(InstallState, f32),
        cancel: &dyn Fn() -> bool,
    ) -> Result<IndexOutcome> {
        while let Some(word) = words.next_word()? {
            if cancel() {
                return Ok(IndexOutcome::Cancelled);
            }

            if word.ref_offset != self.current_ref {
                let ref_offset = word.ref_offset;
                let word_progress = word.progress;
                self.flush()?;
                self.current_ref = ref_offset;

                let percent = (word_progress * 100.0) as i32;
                if percent != self.last_percent {
                    progress(InstallState::Indexing, word_progress);
                    self.last_percent = percent;
                }
            }

            self.index_word(word.bytes)?;
        }
        self.flush()?;
        self.writer.commit()?;
        Ok(IndexOutcome::Completed)
    }

    fn index_word(&mut self, bytes: &[u8]) -> Result<()> {
        // byte length is a lower bound on the character count, so this
        // rejects most short tokens before any work happens
        if bytes.len() < self.config.indexing_min {
            return Ok(());
        }

        self.upper.clear();
        self.upper.extend_from_slice(bytes);
        case::to_upper(&mut self.upper);

        if common::is_common_upper_word(&self.upper) {
            return Ok(());
        }

        let chars = utf8::crop_to_unicode_len(&mut self.upper, self.config.indexing_depth)?;
        if chars < self.config.indexing_min {
            return Ok(());
        }

        if let Err(at) = self
            .prefix_bag
            .binary_search_by(|p| p.as_slice().cmp(&self.upper))
        {
            self.prefix_bag.insert(at, self.upper.clone());
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if self.prefix_bag.is_empty() {
            return Ok(());
        }
        if self.config.log_flushed_prefixes {
            let bag: Vec<String> = self
                .prefix_bag
                .iter()
                .map(|p| String::from_utf8_lossy(p).into_owned())
                .collect();
            trace!(ref_offset = self.current_ref, prefixes = ?bag, "flushing prefix bag");
        }
        self.writer.add(self.current_ref, &self.prefix_bag)?;
        self.prefix_bag.clear();
        Ok(())
    }
}
