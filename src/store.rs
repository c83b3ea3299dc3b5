//! Fjall-backed prefix store.
//!
//! Two keyspaces model the prefix–ref relation:
//!
//! - `prefixes`: prefix bytes -> prefix id (u64, big endian)
//! - `refs`: prefix id (8 bytes BE) ++ ref (8 bytes BE) -> ()
//!
//! Keying the refs keyspace this way keeps the refs of one prefix
//! contiguous and ordered, so a prefix scan streams them ascending. A
//! third `meta` keyspace holds one record describing the build.
//!
//! All writes of one build go through a [`PrefixWriter`], which buffers
//! them in a single atomic batch. Nothing becomes visible until
//! [`PrefixWriter::commit`]; dropping the writer abandons the batch.

use std::collections::HashMap;
use std::path::Path;

use fjall::{Database, Keyspace, KeyspaceCreateOptions, OwnedWriteBatch as Batch};
use roaring::RoaringTreemap;
use serde::{Deserialize, Serialize};

use crate::error::DingdexError;
use crate::Result;

/// Bumped whenever the keyspace layout changes.
pub const INDEX_FORMAT_VERSION: u32 = 1;

const PREFIXES_CF: &str = "prefixes";
const REFS_CF: &str = "refs";
const META_CF: &str = "meta";
const META_KEY: &[u8] = b"index_meta";
const NEXT_ID_KEY: &[u8] = b"next_prefix_id";

const EMPTY: &[u8] = &[];

/// Description of an installed index, written after a successful build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMeta {
    pub format_version: u32,
    pub indexing_depth: usize,
    pub indexing_min: usize,
    /// Byte length of the installed data file the refs point into.
    pub data_len: u64,
    /// Checksum of the data file, computed during the install copy.
    pub data_crc32: u32,
}

pub struct PrefixStore {
    db: Database,
    prefixes: Keyspace,
    refs: Keyspace,
    meta: Keyspace,
}

impl std::fmt::Debug for PrefixStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrefixStore").finish_non_exhaustive()
    }
}

impl PrefixStore {
    /// Create a fresh store, wiping whatever sits at `path`.
    pub fn create(path: &Path) -> Result<Self> {
        if path.exists() {
            std::fs::remove_dir_all(path)?;
        }
        Self::open_at(path)
    }

    /// Open an existing store.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DingdexError::CorruptIndex(format!(
                "index store missing at {}",
                path.display()
            )));
        }
        Self::open_at(path)
    }

    fn open_at(path: &Path) -> Result<Self> {
        let db = Database::builder(path)
            .open()
            .map_err(|e| DingdexError::Store(format!("failed to open index store: {}", e)))?;
        let prefixes = db
            .keyspace(PREFIXES_CF, || KeyspaceCreateOptions::default())
            .map_err(|e| DingdexError::Store(format!("failed to open prefixes keyspace: {}", e)))?;
        let refs = db
            .keyspace(REFS_CF, || KeyspaceCreateOptions::default())
            .map_err(|e| DingdexError::Store(format!("failed to open refs keyspace: {}", e)))?;
        let meta = db
            .keyspace(META_CF, || KeyspaceCreateOptions::default())
            .map_err(|e| DingdexError::Store(format!("failed to open meta keyspace: {}", e)))?;

        Ok(Self {
            db,
            prefixes,
            refs,
            meta,
        })
    }

    /// Start a build. The writer opens the batch the whole build commits
    /// through and caches prefix ids so repeated prefixes skip the
    /// keyspace probe.
    pub fn writer(&self) -> Result<PrefixWriter<'_>> {
        Ok(PrefixWriter {
            store: self,
            batch: self.db.batch(),
            ids: HashMap::new(),
            next_id: self.stored_next_id()?,
        })
    }

    fn stored_next_id(&self) -> Result<u64> {
        let Some(value) = self.meta.get(NEXT_ID_KEY).map_err(store_err)? else {
            return Ok(1);
        };
        let value = value.as_ref();
        if value.len() != 8 {
            return Err(DingdexError::CorruptIndex(
                "malformed prefix id counter".to_string(),
            ));
        }
        let mut buf = [0u8; 8];
        buf.copy_from_slice(value);
        Ok(u64::from_be_bytes(buf))
    }

    pub fn write_meta(&self, meta: &IndexMeta) -> Result<()> {
        let value = bincode::serialize(meta)?;
        self.meta
            .insert(META_KEY, value)
            .map_err(store_err)?;
        Ok(())
    }

    pub fn read_meta(&self) -> Result<IndexMeta> {
        let Some(value) = self.meta.get(META_KEY).map_err(store_err)? else {
            return Err(DingdexError::CorruptIndex(
                "missing index metadata".to_string(),
            ));
        };
        Ok(bincode::deserialize(value.as_ref())?)
    }

    /// Refs that carry **every** given prefix (set intersection). An
    /// unknown prefix short-circuits to the empty set.
    pub fn refs_for_prefixes(&self, prefixes: &[Vec<u8>]) -> Result<RoaringTreemap> {
        let mut result: Option<RoaringTreemap> = None;
        for prefix in prefixes {
            let refs = self.refs_for_prefix(prefix)?;
            match result {
                Some(ref mut acc) => *acc &= refs,
                None => result = Some(refs),
            }
            if result.as_ref().is_some_and(|acc| acc.is_empty()) {
                break;
            }
        }
        Ok(result.unwrap_or_default())
    }

    fn refs_for_prefix(&self, prefix: &[u8]) -> Result<RoaringTreemap> {
        let mut refs = RoaringTreemap::new();
        let Some(id) = self.prefix_id(prefix)? else {
            return Ok(refs);
        };
        for kv in self.refs.prefix(id.to_be_bytes()) {
            let key = kv.key().map_err(store_err)?;
            let key = key.as_ref();
            if key.len() != 16 {
                return Err(DingdexError::CorruptIndex(format!(
                    "malformed refs key of {} bytes",
                    key.len()
                )));
            }
            let mut buf = [0u8; 8];
            buf.copy_from_slice(&key[8..16]);
            refs.insert(u64::from_be_bytes(buf));
        }
        Ok(refs)
    }

    fn prefix_id(&self, prefix: &[u8]) -> Result<Option<u64>> {
        let Some(value) = self.prefixes.get(prefix).map_err(store_err)? else {
            return Ok(None);
        };
        let value = value.as_ref();
        if value.len() != 8 {
            return Err(DingdexError::CorruptIndex(
                "malformed prefix id".to_string(),
            ));
        }
        let mut buf = [0u8; 8];
        buf.copy_from_slice(value);
        Ok(Some(u64::from_be_bytes(buf)))
    }
}

/// Write handle for one index build, wrapping a single atomic batch.
///
/// The batch is begun when the writer is created and committed exactly
/// once by [`PrefixWriter::commit`]. A writer dropped without committing
/// leaves the store untouched, which is how a cancelled build abandons
/// its writes.
pub struct PrefixWriter<'a> {
    store: &'a PrefixStore,
    batch: Batch,
    ids: HashMap<Vec<u8>, u64>,
    next_id: u64,
}

impl PrefixWriter<'_> {
    /// Record that the line at `ref_offset` carries the given prefixes.
    /// The caller has already deduplicated the slice.
    pub fn add(&mut self, ref_offset: u64, prefixes: &[Vec<u8>]) -> Result<()> {
        for prefix in prefixes {
            let id = self.ensure_prefix(prefix)?;
            let mut key = [0u8; 16];
            key[..8].copy_from_slice(&id.to_be_bytes());
            key[8..].copy_from_slice(&ref_offset.to_be_bytes());
            self.batch.insert(&self.store.refs, key, EMPTY);
        }
        Ok(())
    }

    fn ensure_prefix(&mut self, prefix: &[u8]) -> Result<u64> {
        if let Some(&id) = self.ids.get(prefix) {
            return Ok(id);
        }
        // the batch is invisible to reads, so the keyspace probe only ever
        // returns prefixes committed by a previous build
        let id = match self.store.prefix_id(prefix)? {
            Some(id) => id,
            None => {
                let id = self.next_id;
                self.next_id += 1;
                self.batch
                    .insert(&self.store.prefixes, prefix, id.to_be_bytes());
                id
            }
        };
        self.ids.insert(prefix.to_vec(), id);
        Ok(id)
    }

    /// Commit every buffered write at once.
    pub fn commit(mut self) -> Result<()> {
        self.batch
            .insert(&self.store.meta, NEXT_ID_KEY, self.next_id.to_be_bytes());
        self.batch.commit().map_err(store_err)
    }
}

fn store_err(err: fjall::Error) -> DingdexError {
    DingdexError::Store(err.to_string())
}
