//! Per-file record: metadata captured at walk time, plus the hash caches and
//! group-chain links the match engine fills in as the scan proceeds.

use std::fs;
use std::io;
#[cfg(unix)]
use std::os::unix::fs::MetadataExt;
use std::path::PathBuf;
use std::time::UNIX_EPOCH;

/// Index into the `Scanner`'s candidate arena. Never freed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CandidateId(pub u32);

#[derive(Debug, Clone)]
pub struct Candidate {
    pub path: PathBuf,
    pub size: u64,
    pub device: u64,
    pub inode: u64,
    pub mtime: i64,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub is_symlink: bool,
    pub nlink: u64,
    pub user_order: u32,

    pub hash_partial: Option<u64>,
    pub hash_full: Option<u64>,

    /// Set iff this candidate is the head of a duplicate group.
    pub has_dupes: bool,
    /// Next member in this candidate's duplicate chain (head -> 2nd -> 3rd ...).
    pub duplicates: Option<CandidateId>,
}

impl Candidate {
    /// Build a candidate from a path already `stat`ed by the walker.
    ///
    /// `symlink_meta` is the `lstat`-style metadata (used for `is_symlink`);
    /// `meta` is the metadata the walker decided to use for size/mode/etc
    /// (i.e. `stat` when following symlinks was requested, `lstat` otherwise).
    pub fn build_from_metadata(
        path: PathBuf,
        meta: &fs::Metadata,
        symlink_meta: &fs::Metadata,
        user_order: u32,
    ) -> io::Result<Self> {
        let is_symlink = symlink_meta.file_type().is_symlink();
        let (device, inode, mode, uid, gid, nlink) = platform_fields(meta);
        let mtime = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        Ok(Candidate {
            path,
            size: meta.len(),
            device,
            inode,
            mtime,
            mode,
            uid,
            gid,
            is_symlink,
            nlink,
            user_order,
            hash_partial: None,
            hash_full: None,
            has_dupes: false,
            duplicates: None,
        })
    }
}

/// `(device, inode, mode, uid, gid, nlink)`, exposed for the walker's
/// travdone bookkeeping and one-file-system device comparisons.
#[cfg(unix)]
pub(crate) fn platform_fields(m: &fs::Metadata) -> (u64, u64, u32, u32, u32, u64) {
    (m.dev(), m.ino(), m.mode(), m.uid(), m.gid(), m.nlink())
}

#[cfg(windows)]
pub(crate) fn platform_fields(m: &fs::Metadata) -> (u64, u64, u32, u32, u32, u64) {
    use std::os::windows::fs::MetadataExt;
    // Windows has no inode; synthesize one from file index when available,
    // otherwise fall back to a hash of size+mtime (good enough to avoid
    // false hardlink-equality, which is the only thing inode is used for).
    let device = m.volume_serial_number().unwrap_or(0) as u64;
    let inode = m.file_index().unwrap_or(0);
    let mode = if m.file_attributes() & 1 != 0 { 0o444 } else { 0o644 };
    (device, inode, mode, 0, 0, u64::from(m.number_of_links().unwrap_or(1)))
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs as stdfs;

    #[test]
    fn builds_from_metadata() {
        let tmp = tempdir::TempDir::new("candtest").expect("tmp");
        let path = tmp.path().join("a");
        stdfs::write(&path, "hello").expect("write");
        let meta = stdfs::symlink_metadata(&path).expect("meta");
        let c = Candidate::build_from_metadata(path.clone(), &meta, &meta, 1).expect("build");
        assert_eq!(c.size, 5);
        assert_eq!(c.user_order, 1);
        assert!(!c.has_dupes);
        assert!(c.duplicates.is_none());
    }
}
