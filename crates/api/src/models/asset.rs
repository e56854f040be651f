use serde::{Deserialize, Serialize};
use std::io;
use std::sync::Arc;
use std::time::SystemTime;

/// Read access to the bytes of a resolved asset.
pub trait Asset: Send + Sync {
    /// Size of the asset in bytes.
    fn size(&self) -> u64;

    /// Read up to `buf.len()` bytes starting at `offset`. Returns the number
    /// of bytes read, `0` at end of asset.
    fn read(&self, buf: &mut [u8], offset: u64) -> io::Result<usize>;

    /// Full contents of the asset.
    fn buffer(&self) -> io::Result<Arc<[u8]>> {
        let size = usize::try_from(self.size())
            .map_err(|_| io::Error::new(io::ErrorKind::OutOfMemory, "asset too large"))?;
        let mut data = vec![0u8; size];
        let mut filled = 0;
        while filled < size {
            let n = self.read(&mut data[filled..], filled as u64)?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        data.truncate(filled);
        Ok(data.into())
    }
}

/// Write access to an asset opened through `open_asset_for_write`.
pub trait WritableAsset: Send + Sync {
    /// Write `data` at `offset`, returning the number of bytes written.
    fn write(&self, data: &[u8], offset: u64) -> io::Result<usize>;

    /// Flush and close the asset. Further writes fail.
    fn close(&self) -> io::Result<()>;
}

/// How an existing asset is treated when opened for write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WriteMode {
    /// Keep the existing contents and overwrite in place.
    Update,
    /// Discard the existing contents.
    Replace,
}

/// An asset held entirely in memory.
#[derive(Debug, Clone)]
pub struct MemoryAsset {
    data: Arc<[u8]>,
}

impl MemoryAsset {
    pub fn new(data: impl Into<Arc<[u8]>>) -> Self {
        Self { data: data.into() }
    }
}

impl Asset for MemoryAsset {
    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn read(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        let start = usize::try_from(offset).unwrap_or(usize::MAX);
        if start >= self.data.len() {
            return Ok(0);
        }
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        Ok(n)
    }

    fn buffer(&self) -> io::Result<Arc<[u8]>> {
        Ok(self.data.clone())
    }
}

/// Descriptive information a resolver reports about an asset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_name: Option<String>,
    /// Repository path of the asset. For package-relative assets this is
    /// itself package-relative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_path: Option<String>,
    /// Resolver-specific payload.
    #[serde(default)]
    pub resolver_info: serde_json::Value,
}

/// Modification time of an asset; `None` when unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub Option<SystemTime>);

impl Timestamp {
    pub fn invalid() -> Self {
        Self(None)
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_some()
    }

    pub fn time(&self) -> Option<SystemTime> {
        self.0
    }
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Self {
        Self(Some(time))
    }
}
