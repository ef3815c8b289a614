//! Slot files on disk.
//!
//! One human-readable JSON file per slot, named `save_slot_<N>.<ext>` inside the save
//! directory. Writes go to a unique temp file in the same directory and are renamed over
//! the destination while an exclusive lock is held, so a reader never sees a half-written
//! slot.

use fs2::FileExt;
use log::debug;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct SlotFiles {
    dir: PathBuf,
    extension: String,
}

impl SlotFiles {
    pub fn new(dir: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir)
    }

    pub fn path(&self, slot: u32) -> PathBuf {
        self.dir
            .join(format!("save_slot_{}.{}", slot, self.extension))
    }

    pub fn exists(&self, slot: u32) -> bool {
        self.path(slot).is_file()
    }

    pub fn read(&self, slot: u32) -> io::Result<String> {
        fs::read_to_string(self.path(slot))
    }

    pub fn write(&self, slot: u32, content: &str) -> io::Result<()> {
        self.ensure_dir()?;
        write_file_locked(&self.path(slot), content)
    }

    /// Remove the slot file and its lock sidecar.
    pub fn remove(&self, slot: u32) -> io::Result<()> {
        let path = self.path(slot);
        fs::remove_file(&path)?;
        match fs::remove_file(lock_path_for(&path)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => debug!("could not remove lock for {}: {}", path.display(), e),
        }
        Ok(())
    }
}

fn lock_path_for(path: &Path) -> PathBuf {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let base = path.file_name().and_then(|s| s.to_str()).unwrap_or("save");
    dir.join(format!(".{}.lock", base))
}

/// Replace `path` with `content` atomically under an exclusive lock.
pub(crate) fn write_file_locked(path: &Path, content: &str) -> io::Result<()> {
    // Lock a sidecar file so a failed write never leaves an empty destination behind.
    let lock_file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .open(lock_path_for(path))?;
    lock_file.lock_exclusive()?;

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let base = path.file_name().and_then(|s| s.to_str()).unwrap_or("save.json");
    let mut counter = 0u32;
    let tmp_path = loop {
        let candidate = dir.join(format!(".{}.tmp-{}-{}", base, std::process::id(), counter));
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(mut tmp) => {
                let written = tmp
                    .write_all(content.as_bytes())
                    .and_then(|_| tmp.flush());
                if let Err(e) = written {
                    let _ = fs::remove_file(&candidate);
                    return Err(e);
                }
                let _ = tmp.sync_all();
                break candidate;
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                counter = counter.saturating_add(1);
                continue;
            }
            Err(e) => return Err(e),
        }
    };

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    // Persist the rename (best-effort)
    if let Ok(dir_file) = File::open(dir) {
        let _ = dir_file.sync_all();
    }
    debug!("wrote {} bytes to {}", content.len(), path.display());

    drop(lock_file);
    Ok(())
}
