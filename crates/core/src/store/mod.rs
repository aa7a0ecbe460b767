//! File-backed persistence for the product database.
//!
//! Databases are saved as zlib-compressed JSON with sorted keys, so the same
//! content always produces the same bytes. Loading also accepts the legacy
//! uncompressed JSON and YAML encodings; saving always writes the canonical
//! encoding, rewriting legacy extensions to `.zjson`.
//!
//! Saves write a complete replacement file next to the target and rename it
//! into place, so an interrupted save leaves the previous file intact.

pub mod format;

use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile};

use crate::{Database, Error};

pub use format::{CANONICAL_EXTENSION, SourceFormat, canonical_path};

/// Load a database from `path`.
///
/// A missing file yields an empty database. Any other read or decode failure
/// is an [`Error::DatabaseParse`] naming the file.
pub fn load(path: impl AsRef<Path>) -> Result<Database, Error> {
    let path = path.as_ref();

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "no database found, starting empty");
            return Ok(Database::new());
        }
        Err(e) => return Err(Error::parse(path, e)),
    };

    let format = SourceFormat::detect(path);
    let db = format.parse(&bytes).map_err(|reason| Error::parse(path, reason))?;

    tracing::debug!(path = %path.display(), ?format, count = db.len(), "loaded database");
    Ok(db)
}

/// Save `db` in the canonical encoding.
///
/// Returns the path actually written, which differs from `path` when `path`
/// carries a legacy extension.
pub fn save(db: &Database, path: impl AsRef<Path>) -> Result<PathBuf, Error> {
    let target = canonical_path(path.as_ref());
    let bytes = format::to_bytes(db).map_err(|reason| Error::write(&target, reason))?;

    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = replacement_file(dir).map_err(|e| Error::write(&target, e))?;
    file.write_all(&bytes).map_err(|e| Error::write(&target, e))?;
    file.as_file().sync_all().map_err(|e| Error::write(&target, e))?;
    if let Ok(existing) = std::fs::metadata(&target) {
        file.as_file().set_permissions(existing.permissions()).map_err(|e| Error::write(&target, e))?;
    }
    file.persist(&target).map_err(|e| Error::write(&target, e.error))?;

    tracing::debug!(path = %target.display(), count = db.len(), bytes = bytes.len(), "saved database");
    Ok(target)
}

/// Temp file in `dir` created with the mode a plain `File::create` would get.
fn replacement_file(dir: &Path) -> io::Result<NamedTempFile> {
    #[cfg_attr(not(unix), allow(unused_mut))]
    let mut builder = Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}
