/// Streaming SHA-256 content hashing.
///
/// Files are read through a [`ChunkReader`] in fixed-size chunks so peak
/// memory per hash is one chunk, whatever the file size. The file handle
/// lives inside the reader and is released when it drops, on success,
/// error, or cancellation alike.
use crate::error::EngineError;
use crate::model::fingerprint::{Fingerprint, FINGERPRINT_LEN};
use crate::scanner::cancel::StopSignal;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Default read size per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Smallest chunk size accepted; smaller configured values are raised to it.
pub const MIN_CHUNK_SIZE: usize = 4 * 1024;

/// Reads a file in bounded chunks, reusing one buffer.
///
/// This is a lending iterator in spirit: each chunk borrows the internal
/// buffer, so the next call invalidates the previous slice.
pub struct ChunkReader {
    file: File,
    buf: Box<[u8]>,
    bytes_read: u64,
}

impl ChunkReader {
    pub fn open(path: &Path, chunk_size: usize) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            file,
            buf: vec![0u8; chunk_size.max(MIN_CHUNK_SIZE)].into_boxed_slice(),
            bytes_read: 0,
        })
    }

    /// Next chunk, or `None` at end of file.
    pub fn next_chunk(&mut self) -> io::Result<Option<&[u8]>> {
        loop {
            match self.file.read(&mut self.buf) {
                Ok(0) => return Ok(None),
                Ok(n) => {
                    self.bytes_read += n as u64;
                    return Ok(Some(&self.buf[..n]));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Total bytes handed out so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

/// Why a hash could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("expected {expected} bytes, read {actual}")]
    Changed { expected: u64, actual: u64 },

    #[error("hashing cancelled")]
    Cancelled,
}

/// Hash `path`, checking `stop` between chunks.
///
/// When `expected_size` is given, a different number of bytes read means the
/// file changed since it was stat'd and the hash is rejected.
pub fn hash_streaming(
    path: &Path,
    expected_size: Option<u64>,
    chunk_size: usize,
    stop: &StopSignal,
) -> Result<Fingerprint, HashError> {
    let mut reader = ChunkReader::open(path, chunk_size)?;
    let mut hasher = Sha256::new();

    while let Some(chunk) = reader.next_chunk()? {
        hasher.update(chunk);
        if stop.should_stop() {
            return Err(HashError::Cancelled);
        }
    }

    let actual = reader.bytes_read();
    if let Some(expected) = expected_size {
        if expected != actual {
            return Err(HashError::Changed { expected, actual });
        }
    }

    let mut digest = [0u8; FINGERPRINT_LEN];
    digest.copy_from_slice(&hasher.finalize());
    Ok(Fingerprint::from_bytes(digest))
}

/// Fingerprint a single file with default settings.
///
/// Any read failure surfaces as [`EngineError::UnreadableFile`].
pub fn fingerprint_file(path: &Path) -> Result<Fingerprint, EngineError> {
    hash_streaming(path, None, DEFAULT_CHUNK_SIZE, &StopSignal::never()).map_err(|err| {
        let source = match err {
            HashError::Io(e) => e,
            other => io::Error::other(other.to_string()),
        };
        EngineError::UnreadableFile {
            path: PathBuf::from(path),
            source,
        }
    })
}
