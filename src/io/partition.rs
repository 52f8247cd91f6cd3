//! Processor partitioning file
use crate::error::{FdstagError, Result};
use crate::grid::StaggeredGrid;
use crate::traits::{GridComm, PartitionExport};
use crate::types::Axis;

/// Description of the processor partitioning of a grid
///
/// The binary form is big endian: process counts, global node counts and partition
/// starts as 32-bit integers, then the characteristic length and the node coordinates of
/// each axis as 64-bit floats.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionInfo {
    /// Number of processes along each axis
    pub procs: [usize; 3],
    /// Global number of nodes along each axis
    pub nodes: [usize; 3],
    /// First node index of every process along each axis, closed by the last node index
    pub starts: [Vec<usize>; 3],
    /// Characteristic length
    pub characteristic_length: f64,
    /// Node coordinates along each axis
    pub coordinates: [Vec<f64>; 3],
}

impl PartitionInfo {
    /// Name of the partitioning file
    pub fn file_name(&self) -> String {
        let [px, py, pz] = self.procs;
        format!(
            "ProcessorPartitioning_{}cpu_{px}.{py}.{pz}.bin",
            px * py * pz
        )
    }

    /// Binary representation
    pub fn to_bytes(&self) -> Vec<u8> {
        fn push_int(bytes: &mut Vec<u8>, value: usize) {
            bytes.extend_from_slice(&(value as i32).to_be_bytes());
        }

        let mut bytes = vec![];
        for &p in &self.procs {
            push_int(&mut bytes, p);
        }
        for &n in &self.nodes {
            push_int(&mut bytes, n);
        }
        for starts in &self.starts {
            for &s in starts {
                push_int(&mut bytes, s);
            }
        }
        bytes.extend_from_slice(&self.characteristic_length.to_be_bytes());
        for x in self.coordinates.iter().flatten() {
            bytes.extend_from_slice(&x.to_be_bytes());
        }
        bytes
    }

    /// Parse the binary representation
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader { bytes, position: 0 };
        let procs = [reader.int()?, reader.int()?, reader.int()?];
        let nodes = [reader.int()?, reader.int()?, reader.int()?];
        let mut starts: [Vec<usize>; 3] = Default::default();
        for (s, p) in starts.iter_mut().zip(procs) {
            *s = (0..=p).map(|_| reader.int()).collect::<Result<_>>()?;
        }
        let characteristic_length = reader.float()?;
        let mut coordinates: [Vec<f64>; 3] = Default::default();
        for (x, n) in coordinates.iter_mut().zip(nodes) {
            *x = (0..n).map(|_| reader.float()).collect::<Result<_>>()?;
        }
        if reader.position != bytes.len() {
            return Err(FdstagError::config(
                "partitioning",
                format!("{} trailing bytes", bytes.len() - reader.position),
            ));
        }
        Ok(Self {
            procs,
            nodes,
            starts,
            characteristic_length,
            coordinates,
        })
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl Reader<'_> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let chunk = self
            .bytes
            .get(self.position..self.position + N)
            .and_then(|c| <[u8; N]>::try_from(c).ok())
            .ok_or_else(|| FdstagError::config("partitioning", "unexpected end of data"))?;
        self.position += N;
        Ok(chunk)
    }

    fn int(&mut self) -> Result<usize> {
        let value = i32::from_be_bytes(self.take()?);
        usize::try_from(value)
            .map_err(|_| FdstagError::config("partitioning", format!("negative count {value}")))
    }

    fn float(&mut self) -> Result<f64> {
        Ok(f64::from_be_bytes(self.take()?))
    }
}

impl<C: GridComm> PartitionExport for StaggeredGrid<'_, C> {
    fn partition_info(&self, characteristic_length: f64) -> PartitionInfo {
        let [x, y, z] = Axis::ALL.map(|a| self.axis(a));
        PartitionInfo {
            procs: self.process_grid(),
            nodes: [x.tnods(), y.tnods(), z.tnods()],
            starts: [x, y, z].map(|a| a.starts().to_vec()),
            characteristic_length,
            coordinates: Axis::ALL.map(|a| self.axis(a).global_coordinates(self.segments(a))),
        }
    }

    fn is_writer(&self) -> bool {
        self.comm().is_root()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::comm::SerialComm;
    use crate::config::GridConfig;

    fn grid(comm: &SerialComm) -> StaggeredGrid<'_, SerialComm> {
        StaggeredGrid::new(comm, &GridConfig::uniform([0.0; 3], [1.0, 2.0, 4.0], [2, 2, 4]))
            .unwrap()
    }

    #[test]
    fn test_file_name() {
        let comm = SerialComm;
        let info = grid(&comm).partition_info(1.0);
        assert_eq!(info.file_name(), "ProcessorPartitioning_1cpu_1.1.1.bin");
    }

    #[test]
    fn test_binary_layout() {
        let comm = SerialComm;
        let info = grid(&comm).partition_info(1000.0);
        let bytes = info.to_bytes();
        // 6 counts, 2 starts per axis, the length scale and 3 + 3 + 5 coordinates
        assert_eq!(bytes.len(), 4 * 12 + 8 * 12);
        assert_eq!(&bytes[..4], &[0, 0, 0, 1]);
        assert_eq!(&bytes[12..16], &[0, 0, 0, 3]);
        assert_eq!(PartitionInfo::from_bytes(&bytes).unwrap(), info);
    }

    #[test]
    fn test_truncated() {
        let comm = SerialComm;
        let bytes = grid(&comm).partition_info(1.0).to_bytes();
        assert!(PartitionInfo::from_bytes(&bytes[..bytes.len() - 1]).is_err());
        assert!(PartitionInfo::from_bytes(&[bytes.clone(), vec![0]].concat()).is_err());
    }

    #[test]
    fn test_export() {
        let comm = SerialComm;
        let grid = grid(&comm);
        let directory = std::env::temp_dir().join("fdstag_test_export");
        std::fs::create_dir_all(&directory).unwrap();
        let path = grid.export_partitioning(&directory, 1.0).unwrap().unwrap();
        let info = PartitionInfo::from_bytes(&std::fs::read(path).unwrap()).unwrap();
        assert_eq!(info.coordinates[2], vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }
}
