//! German–English dictionary engine over the line-oriented DING text
//! format.
//!
//! The pipeline has two halves. At install time the dictionary file is
//! copied into a root directory and streamed once through the indexer,
//! which records for every line the upper-cased prefixes of its tokens in
//! an embedded store. At query time a free-text query becomes a normalized
//! keyword set, the store intersects the refs of the keyword prefixes, and
//! the surviving lines are fetched, verified and ranked by distance. A
//! failed lookup may be retried once with ASCII umlaut digraphs
//! (`AE OE UE IE EE SS`) rewritten to the German letters.

pub mod config;
pub mod entry;
pub mod error;
pub mod indexer;
pub mod install;
pub mod keyword;
pub mod lookup;
pub mod render;
pub mod store;
pub mod text;

pub use config::EngineConfig;
pub use entry::Entry;
pub use error::{DingdexError, Result};
pub use install::{
    check_for_ding_format, install_from_path, is_installed, remove_install,
    DingFormatCheck, InstallOutcome, InstallState,
};
pub use keyword::KeywordSet;
pub use lookup::{Lookup, LookupResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
