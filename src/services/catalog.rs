use chrono::{DateTime, Utc};
use polib::po_file;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};
use crate::model::catalog::Catalog;
use crate::parsers::po;
use crate::services::encoding;

/// Loads a catalog; an absent file is an empty catalog.
pub fn load(path: &Path) -> Result<Catalog> {
    if !path.exists() {
        return Ok(Catalog::new());
    }

    let decoded = encoding::read_text(path)?;
    if decoded.encoding != "utf-8" {
        tracing::debug!(path = %path.display(), encoding = %decoded.encoding, "decoded catalog");
    }

    let parsed = po_file::parse_from_reader(decoded.text.as_bytes())
        .map_err(|e| SyncError::Catalog(format!("{}: {e}", path.display())))?;
    Ok(po::from_polib(&parsed))
}

/// Writes the catalog, header included, as UTF-8.
pub fn save(path: &Path, catalog: &Catalog) -> Result<()> {
    let tmp = tmp_path(path);
    if let Some(parent) = tmp.parent() {
        fs::create_dir_all(parent)?;
    }

    po_file::write(&po::to_polib(catalog), &tmp)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn modified_at(path: &Path) -> Result<Option<DateTime<Utc>>> {
    if !path.exists() {
        return Ok(None);
    }
    let modified = fs::metadata(path)?.modified()?;
    Ok(Some(DateTime::<Utc>::from(modified)))
}

pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = tmp_path(path);

    if let Some(parent) = tmp.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;

    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut p = path.to_path_buf();
    let file_name = match path.file_name().and_then(|s| s.to_str()) {
        Some(n) => n.to_string(),
        None => "catalog".to_string(),
    };
    p.set_file_name(format!("{file_name}.tmp"));
    p
}
