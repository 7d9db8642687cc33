//! Reading the new bytes of a tailed file.
//!
//! [`read_delta`] reads the bytes a cursor reported, decodes them
//! permissively and tells the caller how many bytes it consumed so the
//! cursor can advance by that amount and no more. A line still being
//! written is left on disk until its terminator arrives.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

use camino::Utf8Path;

use crate::error::WatchError;

/// Decoded text read from a file and the number of raw bytes it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chunk {
    /// Text decoded with invalid sequences replaced by U+FFFD.
    pub text: String,
    /// Raw bytes consumed from the file.
    pub consumed: u64,
}

impl Chunk {
    /// Returns the non-blank lines of the chunk in order.
    ///
    /// Both `\n` and `\r\n` terminators are stripped. A trailing line without
    /// a terminator only appears when the read cap split a single long line.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines().filter(|line| !line.trim().is_empty())
    }

    /// Returns `true` if nothing was consumed.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.consumed == 0
    }
}

/// Reads up to `available` bytes starting at `offset`, capped at `cap`.
///
/// The chunk ends just after the last line break in the buffer, so an
/// unterminated tail is read again once the writer finishes it. A buffer cut
/// short by the cap that holds no line break at all is consumed anyway, minus
/// any UTF-8 sequence the cap split. If the file shrank since it was stat'ed,
/// fewer bytes are returned and `consumed` reflects what was actually read.
///
/// # Errors
///
/// Returns [`WatchError::Read`] if the file cannot be opened, seeked or read.
///
/// # Examples
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use camino::Utf8PathBuf;
/// use th_watcher::read_delta;
///
/// let dir = tempfile::tempdir()?;
/// let path = Utf8PathBuf::try_from(dir.path().join("chat.txt"))?;
/// std::fs::write(&path, "old\nnew line\n")?;
///
/// let chunk = read_delta(&path, 4, 9, 1024)?;
/// assert_eq!(chunk.text, "new line\n");
/// assert_eq!(chunk.consumed, 9);
/// # Ok(())
/// # }
/// ```
pub fn read_delta(
    path: &Utf8Path,
    offset: u64,
    available: u64,
    cap: u64,
) -> Result<Chunk, WatchError> {
    let wanted = available.min(cap.max(1));
    if wanted == 0 {
        return Ok(Chunk::default());
    }

    let mut file = File::open(path).map_err(|err| WatchError::read(path, err))?;
    file.seek(SeekFrom::Start(offset))
        .map_err(|err| WatchError::read(path, err))?;

    let mut buf = Vec::with_capacity(usize::try_from(wanted).unwrap_or(0));
    file.take(wanted)
        .read_to_end(&mut buf)
        .map_err(|err| WatchError::read(path, err))?;

    let capped = wanted < available && buf.len() as u64 == wanted;
    buf.truncate(consumable_len(&buf, capped));

    let consumed = buf.len() as u64;
    tracing::trace!(%path, offset, consumed, available, "read delta");
    Ok(Chunk {
        text: String::from_utf8_lossy(&buf).into_owned(),
        consumed,
    })
}

/// Length of the prefix of `buf` that may be consumed.
fn consumable_len(buf: &[u8], capped: bool) -> usize {
    if let Some(last_newline) = buf.iter().rposition(|&b| b == b'\n') {
        return last_newline + 1;
    }
    if !capped {
        return 0;
    }
    match split_char_start(buf) {
        Some(start) if start > 0 => start,
        _ => buf.len(),
    }
}

/// Returns the index of a UTF-8 sequence left incomplete at the end of `buf`.
fn split_char_start(buf: &[u8]) -> Option<usize> {
    let tail = buf.len().saturating_sub(4);
    let start = (tail..buf.len()).rev().find(|&i| buf[i] & 0xC0 != 0x80)?;
    let width = match buf[start] {
        b if b & 0x80 == 0 => 1,
        b if b & 0xE0 == 0xC0 => 2,
        b if b & 0xF0 == 0xE0 => 3,
        b if b & 0xF8 == 0xF0 => 4,
        _ => return None,
    };
    (start + width > buf.len()).then_some(start)
}
