//! Byte-level text primitives shared by the indexer, the keyword builder
//! and the scorer.
//!
//! Everything here operates on UTF-8 byte buffers rather than `str` because
//! the dictionary data is consumed as raw bytes and the case-insensitive
//! search is defined byte-wise.

pub mod case;
pub mod common;
pub mod utf8;
pub mod words;
