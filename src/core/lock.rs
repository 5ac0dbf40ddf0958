use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, SnapperError};

/// PID file held for the whole run. Removed on drop.
///
/// On Unix the file carries an exclusive `flock` for as long as the lock
/// lives, so a file left behind by a crashed run is simply taken over.
#[derive(Debug)]
pub struct PidLock {
    path: PathBuf,
    _file: File,
}

impl PidLock {
    /// Take the lock at `path`, failing with `LockHeld` while another holder owns it.
    #[cfg(unix)]
    pub fn acquire(path: &Path) -> Result<Self> {
        loop {
            let mut file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(path)?;

            if let Err(e) = try_lock_exclusive(&file) {
                if e.kind() == ErrorKind::WouldBlock {
                    return Err(SnapperError::LockHeld(read_holder(&mut file).unwrap_or(0)));
                }
                return Err(e.into());
            }

            // The previous holder unlinks the file before unlocking it
            if !is_linked_at(&file, path)? {
                log::debug!("Lock file {} was replaced, retrying", path.display());
                continue;
            }

            file.set_len(0)?;
            writeln!(file, "{}", std::process::id())?;

            return Ok(Self {
                path: path.to_path_buf(),
                _file: file,
            });
        }
    }

    #[cfg(not(unix))]
    pub fn acquire(path: &Path) -> Result<Self> {
        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(mut file) => {
                writeln!(file, "{}", std::process::id())?;
                Ok(Self {
                    path: path.to_path_buf(),
                    _file: file,
                })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let holder = File::open(path).ok().and_then(|mut file| read_holder(&mut file));
                Err(SnapperError::LockHeld(holder.unwrap_or(0)))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidLock {
    fn drop(&mut self) {
        // Unlinked while still locked; the flock goes away when `_file` closes
        let _ = fs::remove_file(&self.path);
    }
}

fn read_holder(file: &mut File) -> Option<u32> {
    let mut text = String::new();
    file.read_to_string(&mut text).ok()?;
    text.trim().parse().ok()
}

#[cfg(unix)]
fn try_lock_exclusive(file: &File) -> std::io::Result<()> {
    use std::os::unix::io::AsRawFd;

    // SAFETY: the descriptor is owned by `file` and stays open for the call
    let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };

    if result != 0 {
        return Err(std::io::Error::last_os_error());
    }

    Ok(())
}

/// Whether `path` still names the inode `file` has open
#[cfg(unix)]
fn is_linked_at(file: &File, path: &Path) -> std::io::Result<bool> {
    use std::os::unix::fs::MetadataExt;

    let held = file.metadata()?;

    match fs::metadata(path) {
        Ok(on_disk) => Ok(on_disk.dev() == held.dev() && on_disk.ino() == held.ino()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
