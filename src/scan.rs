//! Header inspection for single files and directory trees.
//!
//! Backs the `inspect` command. Reads only the 18-byte header of each file
//! (see [`tga::identify`]), so scanning a large tree is cheap.
//!
//! ## Rules
//!
//! - A file path is inspected whatever its extension.
//! - A directory is walked recursively; only `*.tga` files (any case) are
//!   inspected, in file-name order.
//! - A file that fails to parse becomes an [`Inspection::Invalid`] entry.
//!   Only filesystem errors abort the scan.

use crate::tga::{self, HeaderInfo};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Path not found: {0}")]
    NotFound(PathBuf),
}

/// One inspected file.
#[derive(Debug, Clone, Serialize)]
pub struct ScanEntry {
    /// Relative to the scanned directory, or the path as given for a file.
    pub path: PathBuf,
    pub file_len: u64,
    pub inspection: Inspection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum Inspection {
    Valid {
        info: HeaderInfo,
        /// Whether the file is long enough to hold the pixels its header
        /// promises.
        complete: bool,
    },
    Invalid {
        reason: String,
    },
}

impl ScanEntry {
    pub fn is_valid(&self) -> bool {
        matches!(self.inspection, Inspection::Valid { complete: true, .. })
    }
}

/// Inspect `path`, a TGA file or a directory containing TGA files.
pub fn scan(path: &Path) -> Result<Vec<ScanEntry>, ScanError> {
    if !path.exists() {
        return Err(ScanError::NotFound(path.to_path_buf()));
    }
    if path.is_file() {
        return Ok(vec![inspect(path, path.to_path_buf())?]);
    }

    let mut entries = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && is_tga(entry.path()) {
            let rel = entry
                .path()
                .strip_prefix(path)
                .unwrap_or(entry.path())
                .to_path_buf();
            entries.push(inspect(entry.path(), rel)?);
        }
    }
    Ok(entries)
}

fn is_tga(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("tga"))
        .unwrap_or(false)
}

fn inspect(path: &Path, display: PathBuf) -> Result<ScanEntry, ScanError> {
    let file_len = fs::metadata(path)?.len();
    let inspection = match tga::identify(path) {
        Ok(info) => Inspection::Valid {
            info,
            complete: file_len >= info.expected_file_len() as u64,
        },
        Err(tga::CodecError::Io(e)) => return Err(ScanError::Io(e)),
        Err(e) => Inspection::Invalid {
            reason: e.to_string(),
        },
    };
    Ok(ScanEntry {
        path: display,
        file_len,
        inspection,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixels::{Dimensions, PixelBuffer};
    use crate::tga::{HEADER_LEN, Origin};
    use crate::test_helpers::*;
    use tempfile::TempDir;

    #[test]
    fn scan_single_file() {
        let tmp = TempDir::new().unwrap();
        let path = write_tga(tmp.path(), "a.tga", &gradient(5, 4));

        let entries = scan(&path).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, path);
        assert_eq!(entries[0].file_len, (HEADER_LEN + 5 * 4 * 3) as u64);
        assert!(entries[0].is_valid());
        match &entries[0].inspection {
            Inspection::Valid { info, .. } => {
                assert_eq!(info.dimensions, Dimensions::new(5, 4));
                assert_eq!(info.origin, Origin::BottomLeft);
            }
            other => panic!("expected valid header, got {other:?}"),
        }
    }

    #[test]
    fn scan_directory_recurses_and_sorts() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("nested");
        fs::create_dir_all(&nested).unwrap();
        write_tga(tmp.path(), "b.tga", &gradient(1, 1));
        write_tga(tmp.path(), "a.TGA", &gradient(1, 1));
        write_tga(&nested, "c.tga", &gradient(1, 1));
        fs::write(tmp.path().join("notes.txt"), "not an image").unwrap();

        let entries = scan(tmp.path()).unwrap();
        let paths: Vec<PathBuf> = entries.iter().map(|e| e.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("a.TGA"),
                PathBuf::from("b.tga"),
                PathBuf::from("nested").join("c.tga"),
            ]
        );
    }

    #[test]
    fn invalid_files_are_reported_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let mut bytes = tga_bytes(&gradient(2, 2), Origin::BottomLeft, b"");
        bytes[16] = 32;
        fs::write(tmp.path().join("deep.tga"), bytes).unwrap();
        fs::write(tmp.path().join("short.tga"), [0u8; 4]).unwrap();
        write_tga(tmp.path(), "ok.tga", &gradient(2, 2));

        let entries = scan(tmp.path()).unwrap();
        assert_eq!(entries.len(), 3);
        assert!(matches!(
            &entries[0].inspection,
            Inspection::Invalid { reason } if reason.contains("32")
        ));
        assert!(matches!(entries[1].inspection, Inspection::Valid { .. }));
        assert!(matches!(entries[2].inspection, Inspection::Invalid { .. }));
    }

    #[test]
    fn truncated_payload_flagged_incomplete() {
        let tmp = TempDir::new().unwrap();
        let mut bytes = tga_bytes(&PixelBuffer::filled(4, 4, [1, 2, 3]), Origin::TopLeft, b"id");
        bytes.truncate(bytes.len() - 5);
        let path = tmp.path().join("cut.tga");
        fs::write(&path, bytes).unwrap();

        let entries = scan(&path).unwrap();
        assert!(!entries[0].is_valid());
        assert!(matches!(
            entries[0].inspection,
            Inspection::Valid { complete: false, info } if info.id_length == 2
                && info.origin == Origin::TopLeft
        ));
    }

    #[test]
    fn missing_path_is_error() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            scan(&tmp.path().join("nope")),
            Err(ScanError::NotFound(_))
        ));
    }

    #[test]
    fn empty_directory_yields_no_entries() {
        let tmp = TempDir::new().unwrap();
        assert!(scan(tmp.path()).unwrap().is_empty());
    }
}
