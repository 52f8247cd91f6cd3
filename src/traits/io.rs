//! I/O
use crate::{error::Result, io::PartitionInfo};
#[cfg(feature = "serde")]
use std::fs;
use std::path::{Path, PathBuf};

pub trait PartitionExport {
    //! Export of the processor partitioning for post-processing tools

    /// Partition description
    fn partition_info(&self, characteristic_length: f64) -> PartitionInfo;

    /// Is this the process that writes the file?
    fn is_writer(&self) -> bool;

    /// Write the partitioning into `directory`
    ///
    /// Only the root process writes. The path of the written file is returned there.
    fn export_partitioning(
        &self,
        directory: &Path,
        characteristic_length: f64,
    ) -> Result<Option<PathBuf>> {
        let info = self.partition_info(characteristic_length);
        if !self.is_writer() {
            return Ok(None);
        }
        let path = directory.join(info.file_name());
        std::fs::write(&path, info.to_bytes())?;
        log::info!("Saved processor partitioning to {}", path.display());
        Ok(Some(path))
    }
}

#[cfg(feature = "serde")]
pub trait RONImport: Sized + serde::de::DeserializeOwned {
    //! Configuration import from RON

    /// Parse from a RON string
    fn from_ron_string(s: &str) -> Result<Self> {
        Ok(ron::from_str(s)?)
    }

    /// Read from a RON file
    fn import_from_ron(filename: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(filename)?;
        Self::from_ron_string(&content)
    }
}
