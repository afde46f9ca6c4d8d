//! Filesystem fixtures shared by unit tests

use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Write an executable `/bin/sh` script
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod script");
    }
    path
}

/// Create a sparse file of exactly `size` bytes
pub fn write_sized_file(dir: &Path, name: &str, size: u64) -> PathBuf {
    let path = dir.join(name);
    let file = File::create(&path).expect("create file");
    file.set_len(size).expect("resize file");
    path
}

/// Read a pid written by a stub script
pub fn read_pid(path: &Path) -> u32 {
    fs::read_to_string(path)
        .expect("read pid file")
        .trim()
        .parse()
        .expect("parse pid")
}

/// Whether `pid` is a live (non-zombie) process
#[cfg(target_os = "linux")]
pub fn is_alive(pid: u32) -> bool {
    let Ok(stat) = fs::read_to_string(format!("/proc/{pid}/stat")) else {
        return false;
    };
    // State follows the parenthesised command name.
    let state = stat
        .rsplit_once(')')
        .and_then(|(_, rest)| rest.trim_start().chars().next());
    !matches!(state, Some('Z') | Some('X') | None)
}

/// Poll for up to two seconds until `pid` has exited
#[cfg(target_os = "linux")]
pub async fn wait_until_dead(pid: u32) -> bool {
    for _ in 0..40 {
        if !is_alive(pid) {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    !is_alive(pid)
}
