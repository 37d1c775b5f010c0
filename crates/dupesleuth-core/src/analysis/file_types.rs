/// File type categorisation.
///
/// Every file lands in exactly one of six categories. The extension table
/// is consulted first; an unknown or missing extension falls back to a media
/// type (usually from [`probe_media_type`]), and anything still unclassified
/// is [`FileCategory::Others`].
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Broad file type categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum FileCategory {
    Documents,
    Images,
    Videos,
    Audio,
    Archives,
    Others,
}

impl FileCategory {
    pub const ALL: [FileCategory; 6] = [
        Self::Documents,
        Self::Images,
        Self::Videos,
        Self::Audio,
        Self::Archives,
        Self::Others,
    ];

    /// Human-readable label for display.
    pub fn label(self) -> &'static str {
        match self {
            Self::Documents => "Documents",
            Self::Images => "Images",
            Self::Videos => "Videos",
            Self::Audio => "Audio",
            Self::Archives => "Archives",
            Self::Others => "Others",
        }
    }
}

/// Size and count totals for a single file category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryStats {
    pub category: FileCategory,
    pub file_count: u64,
    pub total_size: u64,
}

/// Media type reported when nothing better is known.
pub const UNKNOWN_MEDIA_TYPE: &str = "Unknown";

/// Media type used when serving content of unknown type.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Look up an extension (without the dot) in the static table.
///
/// Returns the guessed media type and the category. Matching is
/// case-insensitive. Extensions are lowercased into a stack buffer, so
/// lookups never allocate; anything longer than 16 bytes is unknown.
pub fn lookup_extension(ext: &str) -> Option<(&'static str, FileCategory)> {
    use FileCategory::*;

    let bytes = ext.as_bytes();
    if bytes.is_empty() || bytes.len() > 16 {
        return None;
    }

    let mut lower = [0u8; 16];
    for (dest, &src) in lower.iter_mut().zip(bytes) {
        *dest = src.to_ascii_lowercase();
    }
    let lower = std::str::from_utf8(&lower[..bytes.len()]).ok()?;

    let hit = match lower {
        // Documents
        "pdf" => ("application/pdf", Documents),
        "doc" => ("application/msword", Documents),
        "docx" => (
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            Documents,
        ),
        "xls" => ("application/vnd.ms-excel", Documents),
        "xlsx" => (
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Documents,
        ),
        "ppt" => ("application/vnd.ms-powerpoint", Documents),
        "pptx" => (
            "application/vnd.openxmlformats-officedocument.presentationml.presentation",
            Documents,
        ),
        "odt" => ("application/vnd.oasis.opendocument.text", Documents),
        "rtf" => ("application/rtf", Documents),
        "epub" => ("application/epub+zip", Documents),
        "txt" | "log" => ("text/plain", Documents),
        "md" => ("text/markdown", Documents),
        "csv" => ("text/csv", Documents),
        "html" | "htm" => ("text/html", Documents),
        // Images
        "jpg" | "jpeg" => ("image/jpeg", Images),
        "png" => ("image/png", Images),
        "gif" => ("image/gif", Images),
        "bmp" => ("image/bmp", Images),
        "svg" => ("image/svg+xml", Images),
        "webp" => ("image/webp", Images),
        "ico" => ("image/vnd.microsoft.icon", Images),
        "tif" | "tiff" => ("image/tiff", Images),
        "heic" => ("image/heic", Images),
        "heif" => ("image/heif", Images),
        "psd" => ("image/vnd.adobe.photoshop", Images),
        "raw" | "cr2" | "nef" => ("image/x-raw", Images),
        // Videos
        "mp4" | "m4v" => ("video/mp4", Videos),
        "mkv" => ("video/x-matroska", Videos),
        "avi" => ("video/x-msvideo", Videos),
        "mov" => ("video/quicktime", Videos),
        "wmv" => ("video/x-ms-wmv", Videos),
        "flv" => ("video/x-flv", Videos),
        "webm" => ("video/webm", Videos),
        "mpg" | "mpeg" => ("video/mpeg", Videos),
        "3gp" => ("video/3gpp", Videos),
        // Audio
        "mp3" => ("audio/mpeg", Audio),
        "wav" => ("audio/wav", Audio),
        "flac" => ("audio/flac", Audio),
        "aac" => ("audio/aac", Audio),
        "ogg" | "oga" => ("audio/ogg", Audio),
        "opus" => ("audio/opus", Audio),
        "wma" => ("audio/x-ms-wma", Audio),
        "m4a" => ("audio/mp4", Audio),
        // Archives
        "zip" => ("application/zip", Archives),
        "rar" => ("application/vnd.rar", Archives),
        "7z" => ("application/x-7z-compressed", Archives),
        "tar" => ("application/x-tar", Archives),
        "gz" | "tgz" => ("application/gzip", Archives),
        "bz2" => ("application/x-bzip2", Archives),
        "xz" => ("application/x-xz", Archives),
        "zst" => ("application/zstd", Archives),
        "iso" => ("application/x-iso9660-image", Archives),
        "dmg" => ("application/x-apple-diskimage", Archives),
        _ => return None,
    };
    Some(hit)
}

/// Extension of a file name, without the dot. Dotfiles such as `.bashrc`
/// have no extension.
pub fn extension_of(name: &str) -> Option<&str> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        None
    } else {
        Some(ext)
    }
}

/// Map a media type onto a category by keyword, the broad way browsers
/// and file managers do.
pub fn category_for_media_type(media_type: &str) -> FileCategory {
    let mt = media_type.to_ascii_lowercase();
    let has = |keys: &[&str]| keys.iter().any(|k| mt.contains(k));

    if has(&["text", "document", "pdf", "word", "excel", "powerpoint", "rtf"]) {
        FileCategory::Documents
    } else if has(&["image"]) {
        FileCategory::Images
    } else if has(&["video"]) {
        FileCategory::Videos
    } else if has(&["audio"]) {
        FileCategory::Audio
    } else if has(&["zip", "rar", "7z", "tar", "compressed", "bzip", "x-xz", "zstd"]) {
        FileCategory::Archives
    } else {
        FileCategory::Others
    }
}

/// Categorise a file by name, falling back to a detected media type.
///
/// Never fails: [`FileCategory::Others`] is the total fallback.
pub fn categorise(name: &str, media_type: Option<&str>) -> FileCategory {
    if let Some((_, category)) = extension_of(name).and_then(lookup_extension) {
        return category;
    }
    media_type.map_or(FileCategory::Others, category_for_media_type)
}

/// Media type implied by a file name's extension.
pub fn media_type_for_name(name: &str) -> Option<&'static str> {
    extension_of(name)
        .and_then(lookup_extension)
        .map(|(media_type, _)| media_type)
}

/// Category and media type for a file on disk.
///
/// The media type comes from the extension table when the name is known,
/// otherwise from the content probe (if enabled), otherwise it is
/// [`UNKNOWN_MEDIA_TYPE`].
pub fn classify_path(path: &Path, probe: bool) -> (FileCategory, &'static str) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    let media_type = media_type_for_name(&name).or_else(|| {
        if probe {
            probe_media_type(path)
        } else {
            None
        }
    });
    (
        categorise(&name, media_type),
        media_type.unwrap_or(UNKNOWN_MEDIA_TYPE),
    )
}

/// Number of leading bytes inspected by [`probe_media_type`].
const PROBE_LEN: usize = 16;

/// Detect a media type from the first bytes of a file's content.
///
/// Only signatures that are unambiguous in a handful of bytes are
/// recognised. Returns `None` for unknown content, empty files, or files
/// that cannot be opened.
pub fn probe_media_type(path: &Path) -> Option<&'static str> {
    let mut header = [0u8; PROBE_LEN];
    let mut file = File::open(path).ok()?;
    let mut filled = 0;
    while filled < PROBE_LEN {
        match file.read(&mut header[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(_) => return None,
        }
    }
    sniff(&header[..filled])
}

/// Match a content header against known signatures.
pub fn sniff(header: &[u8]) -> Option<&'static str> {
    let starts = |sig: &[u8]| header.starts_with(sig);
    let at = |offset: usize, sig: &[u8]| header.get(offset..offset + sig.len()) == Some(sig);

    if starts(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if starts(&[0xff, 0xd8, 0xff]) {
        Some("image/jpeg")
    } else if starts(b"GIF87a") || starts(b"GIF89a") {
        Some("image/gif")
    } else if starts(b"BM") && header.len() >= 14 {
        Some("image/bmp")
    } else if starts(b"RIFF") && at(8, b"WEBP") {
        Some("image/webp")
    } else if starts(b"RIFF") && at(8, b"WAVE") {
        Some("audio/wav")
    } else if starts(b"RIFF") && at(8, b"AVI ") {
        Some("video/x-msvideo")
    } else if starts(b"%PDF-") {
        Some("application/pdf")
    } else if starts(b"PK\x03\x04") {
        Some("application/zip")
    } else if starts(&[0x1f, 0x8b]) {
        Some("application/gzip")
    } else if starts(b"7z\xbc\xaf\x27\x1c") {
        Some("application/x-7z-compressed")
    } else if starts(b"Rar!\x1a\x07") {
        Some("application/vnd.rar")
    } else if starts(b"BZh") {
        Some("application/x-bzip2")
    } else if starts(&[0xfd, b'7', b'z', b'X', b'Z', 0x00]) {
        Some("application/x-xz")
    } else if starts(b"ID3") {
        Some("audio/mpeg")
    } else if starts(b"fLaC") {
        Some("audio/flac")
    } else if starts(b"OggS") {
        Some("audio/ogg")
    } else if at(4, b"ftyp") {
        Some("video/mp4")
    } else if starts(&[0x1a, 0x45, 0xdf, 0xa3]) {
        Some("video/x-matroska")
    } else {
        None
    }
}
