//! Terminal output helpers.
//!
//! Non-UTF-8 terminals get a US-ASCII downgrade: umlauts become their
//! digraph spellings, other accented letters lose their accent, and
//! anything without an ASCII form prints as `?`. The core engine never
//! calls these; they exist for the binary.

use std::env;
use std::io::{self, Write};

use tracing::warn;

use crate::text::utf8;

/// Whether the user's locale advertises UTF-8 output, per the `LANG`
/// environment variable.
pub fn is_utf8_locale() -> bool {
    env::var("LANG")
        .map(|value| value.ends_with(".UTF-8"))
        .unwrap_or(false)
}

/// Write dictionary text, downgrading to US-ASCII unless `utf8_terminal`.
pub fn write_text(w: &mut dyn Write, bytes: &[u8], utf8_terminal: bool) -> io::Result<()> {
    if utf8_terminal || utf8::is_usascii_clean(bytes) {
        return w.write_all(bytes);
    }

    let mut at = 0;
    while at < bytes.len() {
        match utf8::sequence_len(bytes, at) {
            Ok(1) => {
                w.write_all(&bytes[at..at + 1])?;
                at += 1;
            }
            Ok(len) => {
                match utf8::usascii_equivalent(&bytes[at..]) {
                    Some(equivalent) => w.write_all(equivalent.as_bytes())?,
                    None => w.write_all(b"?")?,
                }
                at += len;
            }
            Err(err) => {
                warn!("stopping render of malformed text: {}", err);
                return Ok(());
            }
        }
    }
    Ok(())
}
