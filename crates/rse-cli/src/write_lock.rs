use std::ffi::OsString;
use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const LOCK_WAIT_TIMEOUT: Duration = Duration::from_secs(300);
const LOCK_RETRY_DELAY: Duration = Duration::from_millis(250);

/// Held for the duration of a catalog-writing run; removes the lock file on drop.
#[derive(Debug)]
pub struct WriteLockGuard {
    path: PathBuf,
}

impl Drop for WriteLockGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// `<catalog>.write.lock`, beside the catalog file.
#[must_use]
pub fn lock_path_for(catalog: &Path) -> PathBuf {
    let mut name = OsString::from(catalog.as_os_str());
    name.push(".write.lock");
    PathBuf::from(name)
}

/// Wait for exclusive write access to the catalog at `catalog`.
pub async fn acquire_for_catalog(catalog: &Path) -> anyhow::Result<WriteLockGuard> {
    let lock_path = lock_path_for(catalog);
    let started = Instant::now();

    loop {
        match try_acquire(&lock_path) {
            Ok(guard) => {
                tracing::debug!(path = %lock_path.display(), "catalog write lock acquired");
                return Ok(guard);
            }
            Err(LockState::Stale(pid)) => {
                tracing::warn!(pid, path = %lock_path.display(), "reclaiming stale catalog lock");
                let _ = std::fs::remove_file(&lock_path);
            }
            Err(state) => {
                if started.elapsed() >= LOCK_WAIT_TIMEOUT {
                    match state {
                        LockState::HeldBy(pid) => anyhow::bail!(
                            "another sync is writing the catalog (pid {pid}); try again after it finishes"
                        ),
                        _ => anyhow::bail!(
                            "could not acquire write lock at {}; remove it if no rse process is running",
                            lock_path.display()
                        ),
                    }
                }
                tokio::time::sleep(LOCK_RETRY_DELAY).await;
            }
        }
    }
}

#[derive(Debug)]
enum LockState {
    HeldBy(i32),
    Stale(i32),
    Unknown,
}

fn try_acquire(lock_path: &Path) -> Result<WriteLockGuard, LockState> {
    match OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(lock_path)
    {
        Ok(mut file) => {
            let _ = writeln!(file, "{}", std::process::id());
            Ok(WriteLockGuard {
                path: lock_path.to_path_buf(),
            })
        }
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
            let mut pid_buf = String::new();
            if OpenOptions::new()
                .read(true)
                .open(lock_path)
                .and_then(|mut file| file.read_to_string(&mut pid_buf))
                .is_err()
            {
                return Err(LockState::Unknown);
            }

            match pid_buf.trim().parse::<i32>() {
                Ok(pid) if is_process_running(pid) => Err(LockState::HeldBy(pid)),
                Ok(pid) => Err(LockState::Stale(pid)),
                Err(_) => Err(LockState::Unknown),
            }
        }
        Err(_) => Err(LockState::Unknown),
    }
}

fn is_process_running(pid: i32) -> bool {
    std::process::Command::new("kill")
        .arg("-0")
        .arg(pid.to_string())
        .stderr(std::process::Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
}
