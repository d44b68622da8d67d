//! Cover uploads written to a local directory through a capability handle.
//!
//! Files are created with `create_new`, so two concurrent uploads of the
//! same name cannot overwrite each other; the loser takes the next suffix.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use cap_std::ambient_authority;
use cap_std::fs::{Dir, OpenOptions};
use tracing::{info, warn};

use crate::domain::ports::{CoverStore, CoverStoreError};

/// URL prefix under which stored covers are served.
pub const PUBLIC_UPLOADS_PREFIX: &str = "/static/uploads";

const MAX_SUFFIX: u32 = 10_000;

/// [`CoverStore`] writing into one directory.
#[derive(Clone)]
pub struct LocalCoverStore {
    dir: Arc<Dir>,
}

impl LocalCoverStore {
    /// Open (creating when needed) the uploads directory at `path`.
    ///
    /// # Errors
    /// Returns the underlying I/O error when the directory cannot be created
    /// or opened.
    pub fn open(path: &Path) -> io::Result<Self> {
        Dir::create_ambient_dir_all(path, ambient_authority())?;
        let dir = Dir::open_ambient_dir(path, ambient_authority())?;
        Ok(Self { dir: Arc::new(dir) })
    }
}

/// Reduce an uploaded file name to `[A-Za-z0-9._-]`.
///
/// Path components are dropped, other characters become `_`, and leading
/// dots are stripped so the result can never be hidden or relative.
fn sanitise_file_name(raw: &str) -> Option<String> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() || trimmed.chars().all(|ch| ch == '_' || ch == '.') {
        return None;
    }
    Some(trimmed.to_owned())
}

/// Name for collision number `n`: `cover.png` becomes `cover_n.png`.
fn with_suffix(name: &str, n: u32) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}_{n}.{ext}"),
        _ => format!("{name}_{n}"),
    }
}

/// Fill a freshly created `name`, removing it again if the write fails so a
/// truncated cover never stays reachable.
fn fill_or_discard<W: Write>(
    dir: &Dir,
    name: &str,
    mut file: W,
    bytes: &[u8],
) -> Result<(), CoverStoreError> {
    let written = file.write_all(bytes).and_then(|()| file.flush());
    drop(file);
    written.map_err(|err| {
        if let Err(remove_err) = dir.remove_file(name) {
            warn!(file = %name, error = %remove_err, "failed to remove partial cover");
        }
        CoverStoreError::io(err.to_string())
    })
}

fn write_unique(dir: &Dir, name: &str, bytes: &[u8]) -> Result<String, CoverStoreError> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    for attempt in 0..=MAX_SUFFIX {
        let candidate = if attempt == 0 {
            name.to_owned()
        } else {
            with_suffix(name, attempt)
        };
        match dir.open_with(&candidate, &options) {
            Ok(file) => {
                fill_or_discard(dir, &candidate, file, bytes)?;
                return Ok(candidate);
            }
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {}
            Err(err) => return Err(CoverStoreError::io(err.to_string())),
        }
    }
    Err(CoverStoreError::io(format!("no free file name for {name:?}")))
}

#[async_trait]
impl CoverStore for LocalCoverStore {
    async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<String, CoverStoreError> {
        let name =
            sanitise_file_name(file_name).ok_or_else(|| CoverStoreError::invalid_name(file_name))?;
        let dir = Arc::clone(&self.dir);
        let bytes = bytes.to_vec();
        let stored = tokio::task::spawn_blocking(move || write_unique(&dir, &name, &bytes))
            .await
            .map_err(|err| CoverStoreError::io(err.to_string()))??;
        info!(file = %stored, "cover stored");
        Ok(format!("{PUBLIC_UPLOADS_PREFIX}/{stored}"))
    }
}
