//! Thin, deliberately minimal external collaborators named in §6: the
//! interactive delete prompt and the post-scan hardlink/symlink/summarize
//! actions. Their UX polish is explicitly out of scope; only enough is
//! implemented here to make the binary runnable end to end.

use crate::scanner::ScanResult;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub fn summarize(result: &ScanResult) {
    let total_groups = result.groups.len();
    let total_dupes: usize = result.groups.iter().map(|g| g.members.len() - 1).sum();
    let wasted: u64 = result
        .groups
        .iter()
        .map(|g| {
            let size = result.arena[g.members[0].0 as usize].size;
            size * (g.members.len() as u64 - 1)
        })
        .sum();
    println!("{total_dupes} duplicate file(s) in {total_groups} set(s), {wasted} byte(s) reclaimable");
}

/// Delete all but the head of each group. Non-interactive under `noprompt`;
/// otherwise asks once per group.
pub fn delete(result: &ScanResult, noprompt: bool) -> io::Result<()> {
    for group in &result.groups {
        if group.members.len() < 2 {
            continue;
        }
        let head = &result.arena[group.members[0].0 as usize];
        let count = group.members.len() - 1;

        if !noprompt {
            print!("Delete {count} duplicate(s) of {}? [y/N] ", head.path.display());
            io::stdout().flush()?;
            let mut line = String::new();
            io::stdin().read_line(&mut line)?;
            if !line.trim().eq_ignore_ascii_case("y") {
                continue;
            }
        }

        for id in &group.members[1..] {
            let path = &result.arena[id.0 as usize].path;
            match fs::remove_file(path) {
                Ok(()) => println!("Deleted {}", path.display()),
                Err(err) => eprintln!("warning: can't delete {}: {}", path.display(), err),
            }
        }
    }
    Ok(())
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".jdupes-tmp");
    path.with_file_name(name)
}

/// Replace each duplicate with a hard link to its group's head.
pub fn hardlink(result: &ScanResult) -> io::Result<()> {
    for group in &result.groups {
        if group.members.len() < 2 {
            continue;
        }
        let head_path = result.arena[group.members[0].0 as usize].path.clone();
        for id in &group.members[1..] {
            let path = result.arena[id.0 as usize].path.clone();
            let tmp = tmp_sibling(&path);
            fs::rename(&path, &tmp)?;
            match fs::hard_link(&head_path, &path) {
                Ok(()) => {
                    let _ = fs::remove_file(&tmp);
                    println!("Hardlinked {} => {}", path.display(), head_path.display());
                }
                Err(err) => {
                    fs::rename(&tmp, &path)?;
                    eprintln!("warning: can't hardlink {}: {}", path.display(), err);
                }
            }
        }
    }
    Ok(())
}

/// Replace each duplicate with a symlink to its group's head.
pub fn symlink(result: &ScanResult) -> io::Result<()> {
    for group in &result.groups {
        if group.members.len() < 2 {
            continue;
        }
        let head_path = result.arena[group.members[0].0 as usize].path.clone();
        for id in &group.members[1..] {
            let path = result.arena[id.0 as usize].path.clone();
            let tmp = tmp_sibling(&path);
            fs::rename(&path, &tmp)?;
            match make_symlink(&head_path, &path) {
                Ok(()) => {
                    let _ = fs::remove_file(&tmp);
                    println!("Symlinked {} => {}", path.display(), head_path.display());
                }
                Err(err) => {
                    fs::rename(&tmp, &path)?;
                    eprintln!("warning: can't symlink {}: {}", path.display(), err);
                }
            }
        }
    }
    Ok(())
}

#[cfg(unix)]
fn make_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn make_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}
