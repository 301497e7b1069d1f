// Copyright 2025 OpenObserve Inc.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Single-instance enforcement. A live peer holding the lock file is a fatal
//! startup error; a stale file from a dead process is silently reclaimed.

use std::{fs, path::Path};

use crate::errors::{Error, Result};

pub struct PidFile {
    path: String,
}

impl PidFile {
    /// Acquire the process lock file, replacing it if its owner is dead.
    pub fn acquire(path: &str) -> Result<PidFile> {
        if let Ok(content) = fs::read_to_string(path)
            && let Ok(pid) = content.trim().parse::<u32>()
            && pid_alive(pid)
        {
            return Err(Error::ProcessLockHeld(pid));
        }
        if let Some(parent) = Path::new(path).parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, std::process::id().to_string())?;
        Ok(PidFile {
            path: path.to_string(),
        })
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            log::warn!("[PIDFILE] failed to remove {}: {}", self.path, e);
        }
    }
}

fn pid_alive(pid: u32) -> bool {
    if pid == std::process::id() {
        return false;
    }
    Path::new(&format!("/proc/{pid}")).exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_lock_is_reclaimed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerta.pid");
        let path = path.to_str().unwrap();

        // no such pid on any sane system
        fs::write(path, "4294967294").unwrap();
        let lock = PidFile::acquire(path).unwrap();
        assert_eq!(
            fs::read_to_string(path).unwrap(),
            std::process::id().to_string()
        );
        drop(lock);
        assert!(!Path::new(path).exists());
    }

    #[test]
    fn test_live_lock_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerta.pid");
        let path = path.to_str().unwrap();

        // pid 1 is always alive
        fs::write(path, "1").unwrap();
        match PidFile::acquire(path) {
            Err(Error::ProcessLockHeld(pid)) => assert_eq!(pid, 1),
            other => panic!("expected ProcessLockHeld, got {other:?}"),
        }
    }
}
