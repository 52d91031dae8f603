//! One-dimensional `.npy` (NumPy format v1.0) arrays.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::IndexedError;

const NPY_MAGIC_STRING: &[u8] = b"\x93NUMPY";

/// Element types that can be stored in a `.npy` file.
pub trait NpyElement: Copy {
    /// NumPy type string without the byte-order prefix.
    const DESCR: &'static str;
    const SIZE: usize;

    fn write_le<W: Write>(self, w: &mut W) -> std::io::Result<()>;
    fn from_le(bytes: &[u8]) -> Self;
}

macro_rules! npy_element {
    ($t:ty, $descr:literal) => {
        impl NpyElement for $t {
            const DESCR: &'static str = $descr;
            const SIZE: usize = std::mem::size_of::<$t>();

            fn write_le<W: Write>(self, w: &mut W) -> std::io::Result<()> {
                w.write_all(&self.to_le_bytes())
            }

            fn from_le(bytes: &[u8]) -> Self {
                let mut buf = [0u8; std::mem::size_of::<$t>()];
                buf.copy_from_slice(bytes);
                <$t>::from_le_bytes(buf)
            }
        }
    };
}

npy_element!(i64, "i8");
npy_element!(f64, "f8");
npy_element!(f32, "f4");

fn header<T: NpyElement>(len: usize) -> String {
    let mut header =
        format!("{{'descr': '<{}', 'fortran_order': False, 'shape': ({len},), }}", T::DESCR);
    // Pad so that magic + version + length + header is a multiple of 16.
    let pad = 16 - (NPY_MAGIC_STRING.len() + 4 + header.len() + 1) % 16;
    for _ in 0..pad % 16 {
        header.push(' ');
    }
    header.push('\n');
    header
}

/// Writes `values` as a 1-D little-endian array.
pub fn write_npy<T: NpyElement>(path: impl AsRef<Path>, values: &[T]) -> Result<(), IndexedError> {
    let mut f = BufWriter::new(File::create(path.as_ref())?);
    f.write_all(NPY_MAGIC_STRING)?;
    f.write_all(&[1u8, 0u8])?;
    let header = header::<T>(values.len());
    f.write_all(&(header.len() as u16).to_le_bytes())?;
    f.write_all(header.as_bytes())?;
    for &v in values {
        v.write_le(&mut f)?;
    }
    f.flush()?;
    Ok(())
}

/// Reads a 1-D array written by [`write_npy`].
pub fn read_npy<T: NpyElement>(path: impl AsRef<Path>) -> Result<Vec<T>, IndexedError> {
    let mut r = BufReader::new(File::open(path.as_ref())?);

    let mut magic = [0u8; 6];
    r.read_exact(&mut magic)?;
    if magic != NPY_MAGIC_STRING {
        return Err(IndexedError::InvalidFormat("npy magic string mismatch".into()));
    }
    let mut version = [0u8; 2];
    r.read_exact(&mut version)?;
    if version[0] != 1 {
        return Err(IndexedError::InvalidFormat(format!(
            "unsupported npy version {}",
            version[0]
        )));
    }
    let mut len = [0u8; 2];
    r.read_exact(&mut len)?;
    let mut header = vec![0u8; u16::from_le_bytes(len) as usize];
    r.read_exact(&mut header)?;
    let header = String::from_utf8_lossy(&header);

    let descr = format!("'descr': '<{}'", T::DESCR);
    if !header.contains(&descr) {
        return Err(IndexedError::InvalidFormat(format!(
            "expected {descr} in npy header {header:?}"
        )));
    }
    let count = header
        .split("'shape': (")
        .nth(1)
        .and_then(|rest| rest.split(|c| c == ',' || c == ')').next())
        .and_then(|n| n.trim().parse::<usize>().ok())
        .ok_or_else(|| IndexedError::InvalidFormat(format!("no 1-D shape in {header:?}")))?;

    let mut bytes = vec![0u8; count * T::SIZE];
    r.read_exact(&mut bytes)?;
    Ok(bytes.chunks_exact(T::SIZE).map(T::from_le).collect())
}
