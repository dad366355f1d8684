use anyhow::{Context, Result};
use fs2::FileExt;
use log::{debug, info};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::backup::{self, ImportPolicy};
use crate::state::BusinessState;

/// Keeps the working state between CLI invocations in a session file.
///
/// The session file uses the backup document format, so a session file is
/// always a valid backup and vice versa. Reads take a shared lock and writes
/// an exclusive lock on a sibling `.lock` file.
pub struct Storage {
    file_path: PathBuf,
    lock_file_path: PathBuf,
    seed_demo_data: bool,
}

impl Storage {
    /// Creates a new Storage instance
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        let file_path = file_path.as_ref().to_path_buf();
        let lock_file_path = file_path.with_extension("json.lock");
        Self {
            file_path,
            lock_file_path,
            seed_demo_data: false,
        }
    }

    /// Seed new session files with the demo group instead of empty forests
    pub fn with_demo_seed(mut self, seed_demo_data: bool) -> Self {
        self.seed_demo_data = seed_demo_data;
        self
    }

    /// Returns the path to the session file
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn seed(&self) -> BusinessState {
        if self.seed_demo_data {
            BusinessState::demo()
        } else {
            BusinessState::new()
        }
    }

    fn wait_for_lock<F>(&self, lock_file: &File, try_lock: F) -> Result<()>
    where
        F: Fn(&File) -> std::io::Result<()>,
    {
        let start = std::time::Instant::now();
        let timeout = Duration::from_secs(5);

        loop {
            match try_lock(lock_file) {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if start.elapsed() > timeout {
                        anyhow::bail!(
                            "Timeout waiting for file lock - another process is using {:?}",
                            self.file_path
                        );
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to acquire lock on {:?}", self.lock_file_path)
                    })
                }
            }
        }
    }

    /// Acquire an exclusive lock for writing.
    /// Returns the lock file handle which must be held during the operation
    fn acquire_write_lock(&self) -> Result<File> {
        if let Some(parent) = self.lock_file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.lock_file_path)
            .with_context(|| format!("Failed to create lock file: {:?}", self.lock_file_path))?;

        self.wait_for_lock(&lock_file, |f| FileExt::try_lock_exclusive(f))?;

        let _ = writeln!(
            lock_file,
            "Locked by PID {} at {}",
            std::process::id(),
            chrono::Utc::now().to_rfc3339()
        );
        Ok(lock_file)
    }

    /// Acquire a shared lock for reading
    fn acquire_read_lock(&self) -> Result<Option<File>> {
        if !self.lock_file_path.exists() {
            return Ok(None);
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .open(&self.lock_file_path)
            .with_context(|| format!("Failed to open lock file: {:?}", self.lock_file_path))?;

        self.wait_for_lock(&lock_file, |f| FileExt::try_lock_shared(f))?;
        Ok(Some(lock_file))
    }

    /// Reads the session file on top of a seeded state; caller holds the lock
    fn read_unlocked(&self) -> Result<BusinessState> {
        let bytes = fs::read(&self.file_path)
            .with_context(|| format!("Failed to open file: {:?}", self.file_path))?;
        let mut state = self.seed();
        let summary = backup::import_snapshot(&mut state, &bytes, ImportPolicy::Permissive)
            .with_context(|| format!("Failed to parse session file {:?}", self.file_path))?;
        debug!(
            "Loaded session {:?} ({} slices, {} integrity issues)",
            self.file_path,
            summary.replaced.len(),
            summary.issues.len()
        );
        Ok(state)
    }

    /// Writes the state; caller holds the exclusive lock
    fn write_unlocked(&self, state: &BusinessState) -> Result<()> {
        let bytes = backup::export_snapshot(state)?;
        fs::write(&self.file_path, bytes)
            .with_context(|| format!("Failed to write session file {:?}", self.file_path))?;
        Ok(())
    }

    /// Loads the session, creating it from the seed when the file is missing
    pub fn load(&self) -> Result<BusinessState> {
        if !self.file_path.exists() {
            let state = self.seed();
            self.save(&state)?;
            info!("Created new session file {:?}", self.file_path);
            return Ok(state);
        }

        let _lock = self.acquire_read_lock()?;
        self.read_unlocked()
    }

    /// Saves the whole state to the session file
    pub fn save(&self, state: &BusinessState) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let _lock = self.acquire_write_lock()?;
        self.write_unlocked(state)
    }

    /// Reloads, applies `update_fn` and saves, all under one exclusive lock.
    ///
    /// Nothing is written when `update_fn` fails.
    pub fn update_atomically<F, T>(&self, update_fn: F) -> Result<T>
    where
        F: FnOnce(&mut BusinessState) -> Result<T>,
    {
        let _lock = self.acquire_write_lock()?;

        let mut state = if self.file_path.exists() {
            self.read_unlocked()?
        } else {
            self.seed()
        };

        let result = update_fn(&mut state)?;
        self.write_unlocked(&state)?;
        Ok(result)
    }
}
