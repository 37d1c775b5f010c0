/// Deterministic directory walker built on `jwalk`.
///
/// Entries come out depth-first with siblings in lexicographic name order,
/// so two walks of an unchanged tree yield the same sequence. `jwalk` runs
/// in serial mode here: the walk is cheap next to hashing, and a single
/// reader keeps discovery order stable without re-sorting.
///
/// Symlinks are never followed into directories. A symlink whose target is
/// a regular file is yielded like any other file and later hashed through
/// the link; a symlink to a directory is skipped.
use crate::model::{IssueKind, ScanIssue};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

type JwalkEntry = Result<jwalk::DirEntry<((), ())>, jwalk::Error>;

/// One step of a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkItem {
    /// A candidate regular file (or symlink to one).
    File(PathBuf),
    /// A directory or entry that could not be read. The walk carries on
    /// with its siblings.
    Issue(ScanIssue),
}

/// Lazy iterator over the files under a root directory.
pub struct Walker {
    root: PathBuf,
    inner: Box<dyn Iterator<Item = JwalkEntry>>,
}

impl Walker {
    /// Start walking `root`. The root is assumed to be an existing directory;
    /// [`crate::scanner::validate_root`] checks that before a scan begins.
    pub fn new(root: &Path) -> Self {
        let walker = jwalk::WalkDir::new(root)
            .skip_hidden(false)
            .follow_links(false)
            .sort(true)
            .parallelism(jwalk::Parallelism::Serial);

        Self {
            root: root.to_path_buf(),
            inner: Box::new(walker.into_iter()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn classify_entry(&self, entry: jwalk::DirEntry<((), ())>) -> Option<WalkItem> {
        let path = entry.path();
        let file_type = entry.file_type();

        if file_type.is_dir() {
            // jwalk hands back the directory itself with the failure to list
            // it attached, rather than an `Err` item.
            return entry
                .read_children_error
                .as_ref()
                .map(|err| WalkItem::Issue(issue_from_jwalk(err, &path)));
        }

        if file_type.is_symlink() {
            // Resolve the link once to decide whether it stands for a file.
            return match fs::metadata(&path) {
                Ok(meta) if meta.is_dir() => {
                    debug!("Not following directory symlink {}", path.display());
                    None
                }
                Ok(meta) if meta.is_file() => Some(WalkItem::File(path)),
                Ok(_) => None,
                Err(err) => Some(WalkItem::Issue(ScanIssue::from_io(path, &err))),
            };
        }

        // Sockets, FIFOs and device nodes are not content we can dedupe.
        file_type.is_file().then_some(WalkItem::File(path))
    }
}

impl Iterator for Walker {
    type Item = WalkItem;

    fn next(&mut self) -> Option<WalkItem> {
        loop {
            match self.inner.next()? {
                Ok(entry) => {
                    if entry.depth == 0 && entry.read_children_error.is_none() {
                        continue;
                    }
                    if let Some(item) = self.classify_entry(entry) {
                        if let WalkItem::Issue(issue) = &item {
                            warn!("Skipping {}", issue);
                        }
                        return Some(item);
                    }
                }
                Err(err) => {
                    let issue = issue_from_jwalk(&err, &self.root);
                    warn!("Skipping {}", issue);
                    return Some(WalkItem::Issue(issue));
                }
            }
        }
    }
}

/// Turn a jwalk error into an issue, attributing it to `fallback` when the
/// error carries no path of its own.
fn issue_from_jwalk(err: &jwalk::Error, fallback: &Path) -> ScanIssue {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| fallback.to_path_buf());
    match err.io_error() {
        Some(io_err) => ScanIssue::from_io(path, io_err),
        None => ScanIssue::new(path, IssueKind::Unreadable, err.to_string()),
    }
}
