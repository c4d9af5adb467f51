//! Storage medium backed by a directory.
//!
//! On hardware the SD card's FAT volume is mounted into the VFS (see
//! `main.rs`) and this adapter works under the mount point with plain
//! `std::fs`.  On host runs the root is any directory; tests use a
//! `tempfile` directory.
//!
//! A missing root directory reads as a pulled card.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use log::warn;

use crate::app::ports::{OpenMode, StoragePort};
use crate::error::MediumError;

/// VFS mount point of the SD card.
pub const SD_MOUNT_POINT: &str = "/sdcard";

pub struct FsMedium {
    root: PathBuf,
}

impl FsMedium {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

fn io_error(op: &str, e: &std::io::Error) -> MediumError {
    if e.kind() == ErrorKind::NotFound {
        MediumError::Absent
    } else {
        warn!("Medium: {} failed: {}", op, e);
        MediumError::Io
    }
}

impl StoragePort for FsMedium {
    type File = File;

    fn begin(&mut self) -> Result<(), MediumError> {
        if self.root.is_dir() {
            Ok(())
        } else {
            Err(MediumError::Absent)
        }
    }

    fn exists(&mut self, name: &str) -> bool {
        self.path(name).is_file()
    }

    fn open(&mut self, name: &str, mode: OpenMode) -> Result<File, MediumError> {
        let mut options = OpenOptions::new();
        options.append(true);
        if mode == OpenMode::Create {
            options.create(true);
        }
        options.open(self.path(name)).map_err(|e| io_error("open", &e))
    }

    fn append_line(&mut self, file: &mut File, line: &str) -> Result<(), MediumError> {
        file.write_all(line.as_bytes())
            .and_then(|()| file.write_all(b"\r\n"))
            .map_err(|e| io_error("write", &e))
    }

    fn close(&mut self, file: File) -> Result<(), MediumError> {
        file.sync_data().map_err(|e| io_error("sync", &e))
    }

    fn read_to_string(&mut self, name: &str) -> Result<String, MediumError> {
        fs::read_to_string(self.path(name)).map_err(|e| io_error("read", &e))
    }
}
