//! Archive metadata kept next to unpacked files.
//!
//! Unpacking writes a `.ipf_data` JSON file into the archive directory so
//! that packing the directory again reproduces the archive name and
//! versions without extra flags.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name of the sidecar inside an unpacked archive directory
pub const METADATA_FILE: &str = ".ipf_data";

/// Footer values and archive name of an unpacked archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveMetadata {
    /// Archive name recorded on the elements
    pub name: String,
    /// Patch subversion
    pub subversion: u32,
    /// Patch version
    pub version: u32,
}

impl ArchiveMetadata {
    /// Read the sidecar from `directory`, if there is one.
    pub fn load(directory: &Path) -> anyhow::Result<Option<Self>> {
        let path = directory.join(METADATA_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    /// Write the sidecar into `directory`.
    pub fn save(&self, directory: &Path) -> anyhow::Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(directory.join(METADATA_FILE), text)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(ArchiveMetadata::load(dir.path()).unwrap(), None);

        let metadata = ArchiveMetadata {
            name: "xml.ipf".to_string(),
            subversion: 4,
            version: 11035,
        };
        metadata.save(dir.path()).unwrap();
        assert_eq!(ArchiveMetadata::load(dir.path()).unwrap(), Some(metadata));
    }

    #[test]
    fn test_malformed_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(METADATA_FILE), "{not json").unwrap();
        assert!(ArchiveMetadata::load(dir.path()).is_err());
    }
}
