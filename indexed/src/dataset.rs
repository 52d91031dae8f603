use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::IndexedError;

/// Index file magic and version.
const INDEX_MAGIC: [u8; 4] = [b'V', b'X', b'I', b'X'];
const INDEX_VERSION: u32 = 1;

/// Path of the record payload file for a container prefix.
pub fn data_path(prefix: &Path) -> PathBuf {
    with_suffix(prefix, "data")
}

/// Path of the offset index file for a container prefix.
pub fn index_path(prefix: &Path) -> PathBuf {
    with_suffix(prefix, "idx")
}

fn with_suffix(prefix: &Path, ext: &str) -> PathBuf {
    let mut s = prefix.as_os_str().to_owned();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

/// Writes records to `<prefix>.data` and, on [`finalize`](Self::finalize),
/// their byte offsets to `<prefix>.idx`.
///
/// Records are MessagePack maps (field names are kept), so records of one
/// container may carry different sets of fields. The index layout is:
///
/// ```text
/// [4B magic "VXIX"] [4B version=1] [8B count]
/// [(count + 1) x 8B offset]
/// ```
///
/// All multi-byte values are little-endian. Offset `i` is the start of
/// record `i`; the final offset is the payload length.
pub struct IndexedDatasetBuilder {
    prefix: PathBuf,
    data: BufWriter<File>,
    offsets: Vec<u64>,
}

impl IndexedDatasetBuilder {
    /// Creates (truncating) `<prefix>.data` and removes any stale index.
    pub fn create(prefix: impl AsRef<Path>) -> Result<Self, IndexedError> {
        let prefix = prefix.as_ref().to_path_buf();
        let data = BufWriter::new(File::create(data_path(&prefix))?);
        match std::fs::remove_file(index_path(&prefix)) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(Self {
            prefix,
            data,
            offsets: vec![0],
        })
    }

    /// Appends one record.
    pub fn add_item<T: Serialize + ?Sized>(&mut self, item: &T) -> Result<(), IndexedError> {
        let bytes = rmp_serde::to_vec_named(item)?;
        self.data.write_all(&bytes)?;
        let end = self.offsets.last().copied().unwrap_or(0) + bytes.len() as u64;
        self.offsets.push(end);
        Ok(())
    }

    /// Number of records appended so far.
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flushes the payload and writes the index, sealing the container.
    pub fn finalize(mut self) -> Result<usize, IndexedError> {
        self.data.flush()?;
        self.data.get_ref().sync_all()?;

        let count = self.len();
        let mut idx = BufWriter::new(File::create(index_path(&self.prefix))?);
        idx.write_all(&INDEX_MAGIC)?;
        idx.write_all(&INDEX_VERSION.to_le_bytes())?;
        idx.write_all(&(count as u64).to_le_bytes())?;
        for off in &self.offsets {
            idx.write_all(&off.to_le_bytes())?;
        }
        idx.flush()?;
        Ok(count)
    }
}

/// Read-only view of a sealed container.
pub struct IndexedDataset {
    data: BufReader<File>,
    offsets: Vec<u64>,
}

impl IndexedDataset {
    /// Opens a container. Fails when the index is missing (not finalized).
    pub fn open(prefix: impl AsRef<Path>) -> Result<Self, IndexedError> {
        let prefix = prefix.as_ref();
        let offsets = read_index(&index_path(prefix))?;
        let data = File::open(data_path(prefix))?;
        let payload = data.metadata()?.len();
        if offsets.last().copied() != Some(payload) {
            return Err(IndexedError::InvalidFormat(format!(
                "payload is {payload} bytes, index ends at {:?}",
                offsets.last()
            )));
        }
        Ok(Self {
            data: BufReader::new(data),
            offsets,
        })
    }

    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decodes record `index`.
    pub fn get<T: DeserializeOwned>(&mut self, index: usize) -> Result<T, IndexedError> {
        if index >= self.len() {
            return Err(IndexedError::OutOfRange {
                index,
                len: self.len(),
            });
        }
        let (start, end) = (self.offsets[index], self.offsets[index + 1]);
        self.data.seek(SeekFrom::Start(start))?;
        let mut buf = vec![0u8; (end - start) as usize];
        self.data.read_exact(&mut buf)?;
        Ok(rmp_serde::from_slice(&buf)?)
    }
}

fn read_index(path: &Path) -> Result<Vec<u64>, IndexedError> {
    let mut r = BufReader::new(File::open(path)?);
    let mut buf4 = [0u8; 4];
    let mut buf8 = [0u8; 8];

    r.read_exact(&mut buf4)?;
    if buf4 != INDEX_MAGIC {
        return Err(IndexedError::InvalidFormat(format!("invalid magic {buf4:?}")));
    }
    r.read_exact(&mut buf4)?;
    let version = u32::from_le_bytes(buf4);
    if version != INDEX_VERSION {
        return Err(IndexedError::InvalidFormat(format!(
            "unsupported version {version}"
        )));
    }
    r.read_exact(&mut buf8)?;
    let count = u64::from_le_bytes(buf8) as usize;

    let mut offsets = Vec::with_capacity(count + 1);
    for _ in 0..=count {
        r.read_exact(&mut buf8)?;
        offsets.push(u64::from_le_bytes(buf8));
    }
    if offsets.windows(2).any(|w| w[0] > w[1]) {
        return Err(IndexedError::InvalidFormat("offsets are not monotonic".into()));
    }
    Ok(offsets)
}
