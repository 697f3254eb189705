#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Binary persistence for world and player records.
//!
//! Every file starts with a four byte magic tag naming the record type and a
//! single format version byte. The `bincode` encoded record follows.

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tilefall_core::{PlayerRecord, WorldRecord};

/// Magic tag opening every saved world.
pub const WORLD_MAGIC: [u8; 4] = *b"TFWD";
/// Magic tag opening every saved player.
pub const PLAYER_MAGIC: [u8; 4] = *b"TFPL";
/// Version byte written after the magic tag.
pub const FORMAT_VERSION: u8 = 1;

/// Errors raised while saving or loading records.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The underlying reader or writer failed.
    #[error("i/o failure: {0}")]
    Io(#[from] io::Error),
    /// A file that must not be overwritten is already present.
    #[error("{} already exists", path.display())]
    AlreadyExists {
        /// Path that was left untouched.
        path: PathBuf,
    },
    /// The record could not be encoded.
    #[error("failed to encode record: {0}")]
    Encode(#[source] bincode::Error),
    /// The payload was malformed or violated a record invariant.
    #[error("failed to decode record: {0}")]
    Decode(#[source] bincode::Error),
    /// The header does not name the expected record type.
    #[error("expected magic {expected:?} but found {found:?}")]
    InvalidMagic {
        /// Tag the loader looked for.
        expected: [u8; 4],
        /// Tag found at the start of the input.
        found: [u8; 4],
    },
    /// The header names a format this build cannot read.
    #[error("unsupported format version {found} (supported: {supported})")]
    UnsupportedVersion {
        /// Version byte found in the header.
        found: u8,
        /// Version this build reads and writes.
        supported: u8,
    },
}

/// Writes `record` to `writer`.
pub fn save_world<W: Write>(record: &WorldRecord, writer: W) -> Result<(), StorageError> {
    write_framed(WORLD_MAGIC, record, writer)
}

/// Reads a world record from `reader`.
pub fn load_world<R: Read>(reader: R) -> Result<WorldRecord, StorageError> {
    read_framed(WORLD_MAGIC, reader)
}

/// Writes `record` to `writer`.
pub fn save_player<W: Write>(record: &PlayerRecord, writer: W) -> Result<(), StorageError> {
    write_framed(PLAYER_MAGIC, record, writer)
}

/// Reads a player record from `reader`.
pub fn load_player<R: Read>(reader: R) -> Result<PlayerRecord, StorageError> {
    read_framed(PLAYER_MAGIC, reader)
}

/// Creates or truncates the file at `path` and saves the world into it.
pub fn write_world_file(path: impl AsRef<Path>, record: &WorldRecord) -> Result<(), StorageError> {
    let path = path.as_ref();
    write_file(path, File::create(path)?, |writer| save_world(record, writer))?;
    tracing::info!(path = %path.display(), name = record.name(), "saved world");
    Ok(())
}

/// Saves the world into a new file at `path`, failing if the file exists.
pub fn create_world_file(path: impl AsRef<Path>, record: &WorldRecord) -> Result<(), StorageError> {
    let path = path.as_ref();
    write_file(path, create_new(path)?, |writer| save_world(record, writer))?;
    tracing::info!(path = %path.display(), name = record.name(), "created world file");
    Ok(())
}

/// Loads the world stored at `path`.
pub fn read_world_file(path: impl AsRef<Path>) -> Result<WorldRecord, StorageError> {
    let path = path.as_ref();
    let record = load_world(BufReader::new(File::open(path)?))?;
    tracing::info!(
        path = %path.display(),
        name = record.name(),
        width = record.width(),
        height = record.height(),
        "loaded world"
    );
    Ok(record)
}

/// Creates or truncates the file at `path` and saves the player into it.
pub fn write_player_file(
    path: impl AsRef<Path>,
    record: &PlayerRecord,
) -> Result<(), StorageError> {
    let path = path.as_ref();
    write_file(path, File::create(path)?, |writer| save_player(record, writer))?;
    tracing::info!(path = %path.display(), name = record.name(), "saved player");
    Ok(())
}

/// Saves the player into a new file at `path`, failing if the file exists.
pub fn create_player_file(
    path: impl AsRef<Path>,
    record: &PlayerRecord,
) -> Result<(), StorageError> {
    let path = path.as_ref();
    write_file(path, create_new(path)?, |writer| save_player(record, writer))?;
    tracing::info!(path = %path.display(), name = record.name(), "created player file");
    Ok(())
}

/// Loads the player stored at `path`.
pub fn read_player_file(path: impl AsRef<Path>) -> Result<PlayerRecord, StorageError> {
    let path = path.as_ref();
    let record = load_player(BufReader::new(File::open(path)?))?;
    tracing::info!(path = %path.display(), name = record.name(), "loaded player");
    Ok(record)
}

fn create_new(path: &Path) -> Result<File, StorageError> {
    File::options()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|error| match error.kind() {
            io::ErrorKind::AlreadyExists => StorageError::AlreadyExists {
                path: path.to_path_buf(),
            },
            _ => StorageError::Io(error),
        })
}

fn write_file<F>(path: &Path, file: File, save: F) -> Result<(), StorageError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), StorageError>,
{
    let mut writer = BufWriter::new(file);
    save(&mut writer)?;
    writer.flush()?;
    tracing::trace!(path = %path.display(), "flushed record file");
    Ok(())
}

fn write_framed<T, W>(magic: [u8; 4], value: &T, mut writer: W) -> Result<(), StorageError>
where
    T: Serialize,
    W: Write,
{
    writer.write_all(&magic)?;
    writer.write_all(&[FORMAT_VERSION])?;
    bincode::serialize_into(&mut writer, value).map_err(StorageError::Encode)
}

fn read_framed<T, R>(magic: [u8; 4], mut reader: R) -> Result<T, StorageError>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut header = [0_u8; 5];
    reader.read_exact(&mut header)?;

    let found = [header[0], header[1], header[2], header[3]];
    if found != magic {
        tracing::warn!(?found, expected = ?magic, "rejecting record with foreign magic");
        return Err(StorageError::InvalidMagic {
            expected: magic,
            found,
        });
    }
    if header[4] != FORMAT_VERSION {
        return Err(StorageError::UnsupportedVersion {
            found: header[4],
            supported: FORMAT_VERSION,
        });
    }

    bincode::deserialize_from(reader).map_err(StorageError::Decode)
}
