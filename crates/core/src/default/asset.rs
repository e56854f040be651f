use assetres_api::{Asset, WritableAsset, WriteMode};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Mutex;

/// A file on the local filesystem opened for reading.
#[derive(Debug)]
pub struct FilesystemAsset {
    file: Mutex<File>,
    size: u64,
}

impl FilesystemAsset {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        Ok(Self {
            file: Mutex::new(file),
            size,
        })
    }
}

impl Asset for FilesystemAsset {
    fn size(&self) -> u64 {
        self.size
    }

    fn read(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        if offset >= self.size {
            return Ok(0);
        }
        let mut file = self
            .file
            .lock()
            .map_err(|_| io::Error::other("asset lock poisoned"))?;
        file.seek(SeekFrom::Start(offset))?;
        file.read(buf)
    }
}

/// A file on the local filesystem opened for writing.
#[derive(Debug)]
pub struct FilesystemWritableAsset {
    file: Mutex<Option<File>>,
}

impl FilesystemWritableAsset {
    /// Open `path` for writing, creating it and its parent directories.
    pub fn create(path: impl AsRef<Path>, mode: WriteMode) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut options = OpenOptions::new();
        options.write(true).create(true);
        match mode {
            WriteMode::Update => options.read(true),
            WriteMode::Replace => options.truncate(true),
        };

        Ok(Self {
            file: Mutex::new(Some(options.open(path)?)),
        })
    }
}

impl WritableAsset for FilesystemWritableAsset {
    fn write(&self, data: &[u8], offset: u64) -> io::Result<usize> {
        let mut guard = self
            .file
            .lock()
            .map_err(|_| io::Error::other("asset lock poisoned"))?;
        let file = guard
            .as_mut()
            .ok_or_else(|| io::Error::other("asset is closed"))?;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(data)?;
        Ok(data.len())
    }

    fn close(&self) -> io::Result<()> {
        let mut guard = self
            .file
            .lock()
            .map_err(|_| io::Error::other("asset lock poisoned"))?;
        match guard.take() {
            Some(mut file) => {
                file.flush()?;
                file.sync_all()
            }
            None => Ok(()),
        }
    }
}
