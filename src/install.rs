//! Install orchestration: format check, data-file copy, index build,
//! cleanup.
//!
//! An install is all-or-nothing. Any error or cancellation deletes the
//! copied data file and the index store before returning, so queries only
//! ever see a complete install.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crc32fast::Hasher;
use tracing::{error, info};

use crate::config::EngineConfig;
use crate::indexer::{IndexOutcome, Indexer};
use crate::store::{IndexMeta, PrefixStore, INDEX_FORMAT_VERSION};
use crate::text::words::FileWords;
use crate::Result;

/// Leaf name of the installed data file; refs index into this copy.
pub const DATA_FILE: &str = "dict.txt";
/// Leaf name of the index store directory.
pub const INDEX_DIR: &str = "index.fjall";

/// A candidate file must carry a recognizable data line within this many
/// leading bytes, and must be at least this large.
const FORMAT_CHECK_BUFFER: usize = 4 * 1024;

/// States delivered through the install progress callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstallState {
    Idle,
    Starting,
    Indexing,
    Completed,
    Error,
}

impl InstallState {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstallState::Idle => "idle",
            InstallState::Starting => "starting",
            InstallState::Indexing => "indexing",
            InstallState::Completed => "completed",
            InstallState::Error => "error",
        }
    }
}

/// Verdict of the DING format sniff.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DingFormatCheck {
    Ok,
    IsCompressed,
    IoProblem,
    TooSmall,
    BadFormat,
}

impl DingFormatCheck {
    pub fn describe(&self) -> &'static str {
        match self {
            DingFormatCheck::Ok => "looks like DING data",
            DingFormatCheck::IsCompressed => "file is compressed; decompress it first",
            DingFormatCheck::IoProblem => "file could not be read",
            DingFormatCheck::TooSmall => "file is too small to be a dictionary",
            DingFormatCheck::BadFormat => "no DING data line found",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed,
    Cancelled,
}

pub fn data_path(root: &Path) -> PathBuf {
    root.join(DATA_FILE)
}

pub fn index_path(root: &Path) -> PathBuf {
    root.join(INDEX_DIR)
}

/// An install is detected by the presence of the data file.
pub fn is_installed(root: &Path) -> bool {
    data_path(root).is_file()
}

/// Sniff whether `path` plausibly holds DING data.
///
/// The first 4 KiB must contain at least one complete non-comment line
/// with the `::` separator. Smaller files are rejected outright.
pub fn check_for_ding_format(path: &Path) -> DingFormatCheck {
    if path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
    {
        return DingFormatCheck::IsCompressed;
    }

    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(_) => return DingFormatCheck::IoProblem,
    };

    let mut buffer = vec![0u8; FORMAT_CHECK_BUFFER];
    let mut filled = 0;
    while filled < buffer.len() {
        match file.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(_) => return DingFormatCheck::IoProblem,
        }
    }
    if filled < buffer.len() {
        return DingFormatCheck::TooSmall;
    }

    // some complete non-comment line must carry the separator
    let mut rest: &[u8] = &buffer;
    while let Some(newline) = rest.iter().position(|&b| b == b'\n') {
        let line = &rest[..newline];
        rest = &rest[newline + 1..];
        if line.is_empty() || line[0] == b'#' {
            continue;
        }
        if line.windows(2).any(|w| w == b"::") {
            return DingFormatCheck::Ok;
        }
    }
    DingFormatCheck::BadFormat
}

/// Copy the DING file into the root, build the index, write the metadata.
///
/// Progress states arrive as
/// `Starting -> Indexing (repeated) -> Completed`, or `Error` on failure,
/// or `Idle` when the cancel callback stopped the install. On failure or
/// cancellation no files are left under the root.
pub fn install_from_path(
    root: &Path,
    ding_path: &Path,
    config: &EngineConfig,
    progress: &mut dyn FnMut(InstallState, f32),
    cancel: &dyn Fn() -> bool,
) -> Result<InstallOutcome> {
    config.validate()?;
    progress(InstallState::Starting, 0.0);

    match install_steps(root, ding_path, config, progress, cancel) {
        Ok(InstallOutcome::Installed) => {
            progress(InstallState::Completed, 1.0);
            Ok(InstallOutcome::Installed)
        }
        Ok(InstallOutcome::Cancelled) => {
            info!("install cancelled; removing partial files");
            cleanup(root);
            progress(InstallState::Idle, 0.0);
            Ok(InstallOutcome::Cancelled)
        }
        Err(err) => {
            error!("install failed: {}", err);
            cleanup(root);
            progress(InstallState::Error, 0.0);
            Err(err)
        }
    }
}

fn install_steps(
    root: &Path,
    ding_path: &Path,
    config: &EngineConfig,
    progress: &mut dyn FnMut(InstallState, f32),
    cancel: &dyn Fn() -> bool,
) -> Result<InstallOutcome> {
    init_root(root)?;
    if cancel() {
        return Ok(InstallOutcome::Cancelled);
    }

    let (data_len, data_crc32) =
        copy_data_file(ding_path, &data_path(root), config.copy_buffer_size)?;
    info!(bytes = data_len, "copied dictionary data to install location");
    if cancel() {
        return Ok(InstallOutcome::Cancelled);
    }

    let store = PrefixStore::create(&index_path(root))?;
    let data = File::open(data_path(root))?;
    let mut words = FileWords::new(data, config.read_block_size)?;

    let started = Instant::now();
    let indexer = Indexer::new(store.writer()?, config);
    if let IndexOutcome::Cancelled = indexer.run(&mut words, progress, cancel)? {
        // the writer was dropped without committing, so the store never
        // saw any of the build's writes
        return Ok(InstallOutcome::Cancelled);
    }

    store.write_meta(&IndexMeta {
        format_version: INDEX_FORMAT_VERSION,
        indexing_depth: config.indexing_depth,
        indexing_min: config.indexing_min,
        data_len,
        data_crc32,
    })?;
    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        "indexing finished"
    );
    Ok(InstallOutcome::Installed)
}

fn init_root(root: &Path) -> Result<()> {
    if !root.exists() {
        fs::create_dir_all(root)?;
        info!(root = %root.display(), "created install root");
    }
    if data_path(root).exists() {
        fs::remove_file(data_path(root))?;
        info!("removed previous data file");
    }
    if index_path(root).exists() {
        fs::remove_dir_all(index_path(root))?;
        info!("removed previous index store");
    }
    Ok(())
}

fn copy_data_file(src: &Path, dest: &Path, buffer_size: usize) -> Result<(u64, u32)> {
    let mut src = File::open(src)?;
    let mut dest = File::create(dest)?;
    let mut buffer = vec![0u8; buffer_size];
    let mut hasher = Hasher::new();
    let mut total: u64 = 0;
    loop {
        let n = src.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
        dest.write_all(&buffer[..n])?;
        total += n as u64;
    }
    dest.flush()?;
    Ok((total, hasher.finalize()))
}

fn cleanup(root: &Path) {
    let _ = fs::remove_file(data_path(root));
    let _ = fs::remove_dir_all(index_path(root));
}

/// Remove an installed dictionary (data file and index store).
pub fn remove_install(root: &Path) -> Result<()> {
    if data_path(root).exists() {
        fs::remove_file(data_path(root))?;
    }
    if index_path(root).exists() {
        fs::remove_dir_all(index_path(root))?;
    }
    Ok(())
}
