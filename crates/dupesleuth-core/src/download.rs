/// Read-only access to a file's current content, for front ends that serve
/// files back to the user.
///
/// Nothing is cached: every call opens the file afresh and streams whatever
/// is on disk at that moment.
use crate::analysis::file_types::{media_type_for_name, OCTET_STREAM};
use crate::error::{EngineError, Result};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// An open file ready to be streamed out.
#[derive(Debug)]
pub struct Download {
    pub path: PathBuf,
    /// Guessed from the extension, `application/octet-stream` otherwise.
    pub media_type: &'static str,
    /// Length at open time.
    pub len: u64,
    reader: BufReader<File>,
}

impl Download {
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

impl Read for Download {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

/// Open `path` for streaming.
///
/// A missing path is [`EngineError::NotFound`]; a directory or other
/// non-regular file is [`EngineError::NotAFile`].
pub fn open_for_download(path: &Path) -> Result<Download> {
    let meta = std::fs::metadata(path).map_err(|err| EngineError::from_io(path, err))?;
    if !meta.is_file() {
        return Err(EngineError::NotAFile(path.to_path_buf()));
    }

    let file = File::open(path).map_err(|err| EngineError::from_io(path, err))?;
    let media_type = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(media_type_for_name)
        .unwrap_or(OCTET_STREAM);

    debug!("Serving {} as {}", path.display(), media_type);
    Ok(Download {
        path: path.to_path_buf(),
        media_type,
        len: meta.len(),
        reader: BufReader::new(file),
    })
}
