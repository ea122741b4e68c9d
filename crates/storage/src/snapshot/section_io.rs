//! Section file framing and I/O
//!
//! Each snapshot section is one file under the snapshot directory:
//!
//! ```text
//! [magic: "TSEC"][format_version: u32][payload_len: u64][payload][crc32: u32]
//! ```
//!
//! - **magic / version**: reject files that are not sections or are newer
//!   than this reader understands
//! - **payload**: bincode-serialized section value
//! - **crc32**: checksum over the payload, detects bit flips and truncation
//!
//! The [`SectionIo`] trait is the seam between the snapshot engine (which
//! only names sections and supplies payloads) and the backing store for
//! section bytes. [`DirSectionIo`] is the file-per-section implementation.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use crc32fast::Hasher;
use serde::de::DeserializeOwned;
use serde::Serialize;

use terrane_core::{Error, Result};

/// Magic bytes identifying a section file
pub const SECTION_MAGIC: [u8; 4] = *b"TSEC";

/// Section format version for forward compatibility
pub const SECTION_FORMAT_VERSION: u32 = 1;

/// Fixed bytes before the payload: magic + version + payload length
const SECTION_HEADER_SIZE: usize = 4 + 4 + 8;

/// Writer/reader of named snapshot sections
///
/// Implementations own the byte framing; callers only choose names and
/// payload types. Reading a section that was written with a different
/// payload type is a deserialization error, not undefined behavior.
pub trait SectionIo {
    /// Serialize `payload` and write it as section `name` under `dir`.
    fn write_section<T: Serialize>(&self, dir: &Path, name: &str, payload: &T) -> Result<()>;

    /// Read and deserialize section `name` from `dir`.
    fn read_section<T: DeserializeOwned>(&self, dir: &Path, name: &str) -> Result<T>;
}

/// File-per-section I/O with CRC-framed bincode payloads
#[derive(Clone, Copy, Debug, Default)]
pub struct DirSectionIo;

impl DirSectionIo {
    /// Create the section backend.
    pub fn new() -> Self {
        DirSectionIo
    }
}

impl SectionIo for DirSectionIo {
    fn write_section<T: Serialize>(&self, dir: &Path, name: &str, payload: &T) -> Result<()> {
        fs::create_dir_all(dir)?;
        let payload = bincode::serialize(payload)?;

        let mut hasher = Hasher::new();
        hasher.update(&payload);
        let crc = hasher.finalize();

        let mut buf = Vec::with_capacity(SECTION_HEADER_SIZE + payload.len() + 4);
        buf.extend_from_slice(&SECTION_MAGIC);
        buf.extend_from_slice(&SECTION_FORMAT_VERSION.to_le_bytes());
        buf.extend_from_slice(&(payload.len() as u64).to_le_bytes());
        buf.extend_from_slice(&payload);
        buf.extend_from_slice(&crc.to_le_bytes());

        let mut file = File::create(dir.join(name))?;
        file.write_all(&buf)?;
        file.sync_all()?;
        Ok(())
    }

    fn read_section<T: DeserializeOwned>(&self, dir: &Path, name: &str) -> Result<T> {
        let mut bytes = Vec::new();
        File::open(dir.join(name))?.read_to_end(&mut bytes)?;

        if bytes.len() < SECTION_HEADER_SIZE + 4 {
            return Err(Error::Corruption(format!(
                "section '{name}' too short: {} bytes",
                bytes.len()
            )));
        }
        if bytes[0..4] != SECTION_MAGIC {
            return Err(Error::Corruption(format!(
                "section '{name}' has invalid magic"
            )));
        }
        let version = u32::from_le_bytes(bytes[4..8].try_into().expect("sized slice"));
        if version > SECTION_FORMAT_VERSION {
            return Err(Error::Corruption(format!(
                "section '{name}' has unsupported version {version}"
            )));
        }
        let payload_len = u64::from_le_bytes(bytes[8..16].try_into().expect("sized slice")) as usize;
        if bytes.len() != SECTION_HEADER_SIZE + payload_len + 4 {
            return Err(Error::Corruption(format!(
                "section '{name}' length mismatch: header says {payload_len} payload bytes"
            )));
        }

        let payload = &bytes[SECTION_HEADER_SIZE..SECTION_HEADER_SIZE + payload_len];
        let stored_crc = u32::from_le_bytes(
            bytes[SECTION_HEADER_SIZE + payload_len..]
                .try_into()
                .expect("sized slice"),
        );
        let mut hasher = Hasher::new();
        hasher.update(payload);
        if hasher.finalize() != stored_crc {
            return Err(Error::Corruption(format!(
                "section '{name}' failed checksum validation"
            )));
        }

        Ok(bincode::deserialize(payload)?)
    }
}
