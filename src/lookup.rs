//! Query resolution: keywords -> prefix intersection -> candidate lines ->
//! scored, ranked entries.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use tracing::debug;

use crate::config::EngineConfig;
use crate::entry::{Entry, NO_MATCH};
use crate::error::DingdexError;
use crate::install::{data_path, index_path, is_installed};
use crate::keyword::KeywordSet;
use crate::store::{PrefixStore, INDEX_FORMAT_VERSION};
use crate::Result;

/// One ranked lookup hit.
#[derive(Clone, Debug)]
pub struct LookupResult {
    /// Byte offset of the matched line in the installed data file.
    pub ref_offset: u64,
    /// Relevance distance; smaller is better.
    pub distance: u32,
    pub entry: Entry,
}

/// A read-only handle on an installed dictionary.
pub struct Lookup {
    config: EngineConfig,
    store: PrefixStore,
    data: File,
    data_len: u64,
}

impl std::fmt::Debug for Lookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lookup").finish_non_exhaustive()
    }
}

impl Lookup {
    /// Open the data file and the index store and cross-check them against
    /// each other and against the engine configuration.
    pub fn open(root: &Path, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        if !is_installed(root) {
            return Err(DingdexError::NotInstalled(root.to_path_buf()));
        }

        let store = PrefixStore::open(&index_path(root))?;
        let meta = store.read_meta()?;
        if meta.format_version != INDEX_FORMAT_VERSION {
            return Err(DingdexError::CorruptIndex(format!(
                "unsupported index format version {}",
                meta.format_version
            )));
        }
        if meta.indexing_depth != config.indexing_depth
            || meta.indexing_min != config.indexing_min
        {
            return Err(DingdexError::CorruptIndex(format!(
                "index was built with depth {} and minimum {}",
                meta.indexing_depth, meta.indexing_min
            )));
        }

        let data = File::open(data_path(root))?;
        let data_len = data.metadata()?.len();
        if data_len != meta.data_len {
            return Err(DingdexError::CorruptIndex(format!(
                "data file is {} bytes but the index was built over {}",
                data_len, meta.data_len
            )));
        }

        Ok(Self {
            config,
            store,
            data,
            data_len,
        })
    }

    /// Resolve a free-text query to at most `max_results` ranked entries.
    ///
    /// When the first pass comes back with fewer results than the
    /// configured retry minimum and the umlaut recovery rewrote anything,
    /// one more pass runs with the adjusted keywords; its results are used
    /// when it finds any.
    pub fn search(&mut self, query: &str, max_results: usize) -> Result<Vec<LookupResult>> {
        let mut keywords = KeywordSet::from_query(query, self.config.indexing_min);
        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        let first = self.search_keywords(&keywords, max_results)?;
        if first.len() >= self.config.adjust_retry_minimum || !keywords.adjust() {
            return Ok(first);
        }

        debug!("retrying lookup with umlaut-recovered keywords");
        let second = self.search_keywords(&keywords, max_results)?;
        if second.is_empty() {
            Ok(first)
        } else {
            Ok(second)
        }
    }

    fn search_keywords(
        &mut self,
        keywords: &KeywordSet,
        max_results: usize,
    ) -> Result<Vec<LookupResult>> {
        let prefixes = keywords.search_prefixes(self.config.indexing_depth)?;
        let refs = self.store.refs_for_prefixes(&prefixes)?;

        let mut results = Vec::new();
        let mut use_map = Vec::new();
        let mut line = Vec::new();
        for ref_offset in refs.iter() {
            self.read_line_at(ref_offset, &mut line)?;
            // the prefix index is a candidate filter, not an exact one
            if !keywords.all_present(&line) {
                continue;
            }
            let Some(entry) = Entry::from_line(&line) else {
                continue;
            };
            let distance = entry.distance_from_keywords(keywords, &mut use_map);
            if distance == NO_MATCH {
                continue;
            }
            results.push(LookupResult {
                ref_offset,
                distance,
                entry,
            });
        }

        results.sort_by(|a, b| {
            a.distance
                .cmp(&b.distance)
                .then(a.ref_offset.cmp(&b.ref_offset))
        });
        results.truncate(max_results);
        Ok(results)
    }

    /// Read the line starting at `ref_offset`, up to but excluding the
    /// next newline or end of file.
    fn read_line_at(&mut self, ref_offset: u64, line: &mut Vec<u8>) -> Result<()> {
        line.clear();
        if ref_offset >= self.data_len {
            return Err(DingdexError::CorruptIndex(format!(
                "ref {} points beyond the data file",
                ref_offset
            )));
        }
        self.data.seek(SeekFrom::Start(ref_offset))?;
        let mut block = [0u8; 4096];
        loop {
            let n = self.data.read(&mut block)?;
            if n == 0 {
                break;
            }
            if let Some(newline) = block[..n].iter().position(|&b| b == b'\n') {
                line.extend_from_slice(&block[..newline]);
                break;
            }
            line.extend_from_slice(&block[..n]);
        }
        Ok(())
    }
}
