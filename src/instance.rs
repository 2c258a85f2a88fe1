//! Single-instance guard and per-mode log files
//!
//! One bot per pid file. The file is created exclusively and holds the
//! running process id; it is removed again when the guard drops. A pid file
//! whose process is gone is stale and gets replaced.
//!
//! Created: 2026-10-18

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Another instance is running (pid {pid}, pid file {})", .path.display())]
pub struct AlreadyRunning {
    pub pid: u32,
    pub path: PathBuf,
}

/// What a pid file says about a previous run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceStatus {
    NotRunning,
    Running(u32),
    /// File present but its process is gone, or its contents are unreadable
    Stale,
}

impl InstanceStatus {
    pub fn check(path: &Path) -> Result<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(InstanceStatus::NotRunning),
            Err(e) => return Err(e).with_context(|| format!("Failed to read pid file {:?}", path)),
        };
        Ok(match contents.trim().parse::<u32>() {
            Ok(pid) if process_alive(pid) => InstanceStatus::Running(pid),
            _ => InstanceStatus::Stale,
        })
    }
}

#[cfg(target_os = "linux")]
fn process_alive(pid: u32) -> bool {
    Path::new("/proc").join(pid.to_string()).exists()
}

// without procfs every recorded pid counts as live
#[cfg(not(target_os = "linux"))]
fn process_alive(_pid: u32) -> bool {
    true
}

/// Remove `path`, treating an already missing file as success.
pub fn remove_pid_file(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => {
            Err(e).with_context(|| format!("Failed to remove pid file {:?}", path))
        }
        _ => Ok(()),
    }
}

/// Held for the lifetime of the bot process
#[derive(Debug)]
pub struct InstanceLock {
    path: PathBuf,
    pid: u32,
}

impl InstanceLock {
    /// Claim `path` for this process. Fails with [`AlreadyRunning`] while the
    /// recorded process is alive.
    pub fn acquire<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let pid = std::process::id();

        // second pass only after clearing a stale file
        for _ in 0..2 {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    writeln!(file, "{}", pid).with_context(|| format!("Failed to write pid file {:?}", path))?;
                    debug!("Pid file {:?} claimed by {}", path, pid);
                    return Ok(Self { path, pid });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => match InstanceStatus::check(&path)? {
                    InstanceStatus::Running(other) => return Err(AlreadyRunning { pid: other, path }.into()),
                    InstanceStatus::Stale => {
                        warn!("Removing stale pid file {:?}", path);
                        remove_pid_file(&path)?;
                    }
                    InstanceStatus::NotRunning => {}
                },
                Err(e) => return Err(e).with_context(|| format!("Failed to create pid file {:?}", path)),
            }
        }

        anyhow::bail!("Pid file {:?} reappeared while replacing a stale one", path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        // leave the file alone if another process has since claimed it
        let ours = fs::read_to_string(&self.path)
            .ok()
            .and_then(|c| c.trim().parse::<u32>().ok())
            == Some(self.pid);
        if ours {
            if let Err(e) = remove_pid_file(&self.path) {
                warn!("{:#}", e);
            }
        }
    }
}

/// `<dir>/<mode>.out.log`
pub fn mode_log_path(dir: &Path, mode: &str) -> PathBuf {
    dir.join(format!("{}.out.log", mode))
}

/// Open the per-mode log for appending, creating `dir` if needed.
pub fn open_mode_log(dir: &Path, mode: &str) -> Result<File> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create log directory {:?}", dir))?;
    let path = mode_log_path(dir, mode);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {:?}", path))
}
