//! Directory traversal with cycle prevention (§4.2). Produces a flat list
//! of candidates in emission order; the scanner decides insertion order
//! into the search tree.

use crate::candidate::{self, Candidate};
use crate::config::{Config, PATHBUF_SIZE};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A command-line root: its path and whether it is scanned recursively.
#[derive(Debug, Clone)]
pub struct Root {
    pub path: PathBuf,
    pub recurse: bool,
}

/// Windows hard-link count cap (NTFS historically allows at most 1024 links
/// to a single file); only enforced when hard-linking is the planned action.
const WINDOWS_HARDLINK_CAP: u64 = 1024;

/// Traversal state shared across one call to `walk`, threaded through the
/// recursive descent instead of as a pile of loose parameters.
struct WalkCtx<'a> {
    cfg: &'a Config,
    for_hardlinking: bool,
    travdone: &'a mut HashSet<(u64, u64)>,
    out: &'a mut Vec<Candidate>,
}

pub fn walk(cfg: &Config, roots: &[Root], for_hardlinking: bool) -> io::Result<Vec<Candidate>> {
    let mut out = Vec::new();
    let mut travdone: HashSet<(u64, u64)> = HashSet::new();
    let mut ctx = WalkCtx { cfg, for_hardlinking, travdone: &mut travdone, out: &mut out };

    for (i, root) in roots.iter().enumerate() {
        let user_order = (i + 1) as u32;
        let meta = match fs::symlink_metadata(&root.path) {
            Ok(m) => m,
            Err(err) => {
                eprintln!("warning: can't stat {}: {}", root.path.display(), err);
                continue;
            }
        };

        if meta.is_dir() {
            let (dev, _ino, ..) = candidate::platform_fields(&meta);
            visit_dir(&mut ctx, &root.path, dev, root.recurse, user_order)?;
        } else {
            visit_leaf(&mut ctx, &root.path, &meta, &meta, user_order)?;
        }
    }

    Ok(out)
}

fn check_path_len(path: &Path) -> io::Result<()> {
    if path.as_os_str().len() > PATHBUF_SIZE {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, format!("path buffer overflow: {}", path.display())));
    }
    Ok(())
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.') && n != "." && n != "..")
        .unwrap_or(false)
}

fn visit_leaf(
    ctx: &mut WalkCtx,
    path: &Path,
    meta: &fs::Metadata,
    symlink_meta: &fs::Metadata,
    user_order: u32,
) -> io::Result<()> {
    check_path_len(path)?;

    let is_symlink = symlink_meta.file_type().is_symlink();
    if is_symlink && !ctx.cfg.follow_symlinks {
        return Ok(());
    }

    let size = meta.len();
    if size == 0 && !ctx.cfg.zero_match {
        return Ok(());
    }
    if ctx.cfg.size_filter.excludes(size) {
        return Ok(());
    }
    if ctx.for_hardlinking {
        let (_, _, _, _, _, nlink) = candidate::platform_fields(meta);
        if cfg!(windows) && nlink >= WINDOWS_HARDLINK_CAP {
            eprintln!("warning: {} at hard-link cap, skipping", path.display());
            return Ok(());
        }
    }

    let cand = Candidate::build_from_metadata(path.to_path_buf(), meta, symlink_meta, user_order)?;
    ctx.out.push(cand);
    Ok(())
}

fn visit_dir(
    ctx: &mut WalkCtx,
    dir_path: &Path,
    parent_device: u64,
    recurse: bool,
    user_order: u32,
) -> io::Result<()> {
    check_path_len(dir_path)?;

    let meta = match fs::symlink_metadata(dir_path) {
        Ok(m) => m,
        Err(err) => {
            eprintln!("warning: can't stat {}: {}", dir_path.display(), err);
            return Ok(());
        }
    };
    let (dev, ino, ..) = candidate::platform_fields(&meta);
    if !ctx.travdone.insert((ino, dev)) {
        return Ok(());
    }

    let entries = match fs::read_dir(dir_path) {
        Ok(rd) => rd,
        Err(err) => {
            eprintln!("warning: can't read directory {}: {}", dir_path.display(), err);
            return Ok(());
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        let path = entry.path();

        if ctx.cfg.exclude_hidden && is_hidden(&path) {
            continue;
        }

        let symlink_meta = match fs::symlink_metadata(&path) {
            Ok(m) => m,
            Err(_) => continue,
        };
        let is_symlink = symlink_meta.file_type().is_symlink();

        let meta = if is_symlink && ctx.cfg.follow_symlinks {
            match fs::metadata(&path) {
                Ok(m) => m,
                Err(_) => continue,
            }
        } else {
            symlink_meta.clone()
        };

        if meta.is_dir() {
            if recurse
                && (!ctx.cfg.one_file_system || candidate::platform_fields(&meta).0 == dev)
                && (ctx.cfg.follow_symlinks || !is_symlink)
            {
                visit_dir(ctx, &path, dev, recurse, user_order)?;
            }
            let _ = parent_device;
            continue;
        }

        visit_leaf(ctx, &path, &meta, &symlink_meta, user_order)?;
    }

    Ok(())
}
