//! Fixed-size record copying.
//!
//! Records are addressed by ordinal only. A copy always covers whole records and
//! never silently delivers fewer bytes than requested.

use super::types::SynthesisError;

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Copies `count` records starting at record `start_record` of `source` into `writer`.
///
/// Returns the number of bytes copied, always `count * record_size`.
/// A source too short to hold the requested range is a `ShortSource` error and
/// nothing is written.
pub fn copy_records<W: Write>(
    source: &Path,
    start_record: u64,
    count: u64,
    record_size: u64,
    writer: &mut W,
) -> Result<u64, SynthesisError> {
    if count == 0 {
        return Ok(0);
    }

    let offset = start_record * record_size;
    let len = count * record_size;

    let mut file = File::open(source).map_err(|e| SynthesisError::io(source, e))?;
    let available_bytes = file
        .metadata()
        .map_err(|e| SynthesisError::io(source, e))?
        .len();

    if available_bytes < offset + len {
        return Err(SynthesisError::ShortSource {
            path: source.to_path_buf(),
            required_records: start_record + count,
            record_size,
            available_bytes,
        });
    }

    file.seek(SeekFrom::Start(offset))
        .map_err(|e| SynthesisError::io(source, e))?;

    let copied =
        io::copy(&mut file.take(len), writer).map_err(|e| SynthesisError::io(source, e))?;

    // The file may have shrunk between the size check and the read.
    if copied != len {
        return Err(SynthesisError::ShortSource {
            path: source.to_path_buf(),
            required_records: start_record + count,
            record_size,
            available_bytes: offset + copied,
        });
    }

    Ok(copied)
}
