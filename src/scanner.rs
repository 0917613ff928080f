//! Match engine: drives the pipeline described in §4.5, tying the walker,
//! search tree and group registry together.

use crate::candidate::{Candidate, CandidateId};
use crate::config::{AbortFlag, Config};
use crate::hasher;
use crate::progress::Progress;
use crate::registry;
use crate::tree::{InsertOutcome, SearchTree};
use crate::walker::{self, Root};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Read};

#[derive(Debug, Default, Clone, Copy)]
pub struct Stats {
    pub scanned: u64,
    pub pairs_confirmed: u64,
    pub read_failures: u64,
    pub aborted: bool,
}

/// One duplicate group: the candidate ids in intra-group order, head first.
/// Most groups are small (a handful of members), so the chain is built into
/// a `SmallVec` to avoid a heap allocation per group in the common case.
#[derive(Debug, Clone)]
pub struct Group {
    pub members: SmallVec<[CandidateId; 4]>,
}

pub struct ScanResult {
    pub arena: Vec<Candidate>,
    pub groups: Vec<Group>,
    pub stats: Stats,
}

pub struct Scanner {
    cfg: Config,
}

impl Scanner {
    pub fn new(cfg: Config) -> Self {
        Scanner { cfg }
    }

    pub fn scan(&self, roots: &[Root], abort: &AbortFlag) -> io::Result<ScanResult> {
        let mut arena = walker::walk(&self.cfg, roots, self.cfg.for_hardlinking)?;
        let total = arena.len() as u64;
        let mut progress = Progress::new(self.cfg.quiet, total);
        let mut tree = SearchTree::new();
        // Maps a tree node's original candidate id to whichever candidate is
        // currently that group's head (promotion can change this, see
        // registry::register_pair).
        let mut chain_head: HashMap<CandidateId, CandidateId> = HashMap::new();
        let mut stats = Stats::default();

        // Candidates are inserted in reverse of walker emission order (LIFO),
        // per §5's ordering rule.
        for (i, rev_idx) in (0..arena.len()).rev().enumerate() {
            if hard_abort(&self.cfg, abort) {
                stats.aborted = true;
                break;
            }

            let cand_id = CandidateId(rev_idx as u32);
            progress.tick((i + 1) as u64, stats.pairs_confirmed, "scanning", 0);

            let outcome = tree.insert(&self.cfg, &mut arena, cand_id, abort)?;
            stats.scanned += 1;

            match outcome {
                InsertOutcome::Inserted | InsertOutcome::Rejected => {}
                InsertOutcome::ReadFailed => stats.read_failures += 1,
                InsertOutcome::Match { existing, needs_confirm } => {
                    let head = *chain_head.get(&existing).unwrap_or(&existing);

                    let confirmed = if !needs_confirm || self.cfg.quick {
                        true
                    } else {
                        progress.tick((i + 1) as u64, stats.pairs_confirmed, "confirming", 0);
                        confirm_match(&arena[cand_id.0 as usize], &arena[head.0 as usize], abort)
                            .unwrap_or(false)
                    };

                    if confirmed {
                        stats.pairs_confirmed += 1;
                        let new_head = registry::register_pair(&self.cfg, &mut arena, head, cand_id);
                        chain_head.insert(existing, new_head);
                    }
                }
            }
        }

        progress.finish();

        let groups = collect_groups(&arena);
        Ok(ScanResult { arena, groups, stats })
    }
}

fn hard_abort(cfg: &Config, abort: &AbortFlag) -> bool {
    let level = abort.level();
    level >= 2 || (level >= 1 && !cfg.soft_abort)
}

/// Stream both files in lockstep, comparing fixed-size chunks. Any read
/// error or length mismatch is treated as "no match" (§7: hash/read
/// failures must never produce a false positive).
fn confirm_match(a: &Candidate, b: &Candidate, abort: &AbortFlag) -> io::Result<bool> {
    if a.size != b.size {
        return Ok(false);
    }
    let mut fa = fs::File::open(&a.path)?;
    let mut fb = fs::File::open(&b.path)?;

    let chunk_size = hasher::auto_chunk_size();
    let mut buf_a = vec![0u8; chunk_size];
    let mut buf_b = vec![0u8; chunk_size];
    let mut remaining = a.size;
    let mut check = 0u32;

    while remaining > 0 {
        if check == 0 && abort.level() > 0 {
            return Err(io::Error::new(io::ErrorKind::Interrupted, "scan aborted"));
        }
        let to_read = remaining.min(chunk_size as u64) as usize;
        fa.read_exact(&mut buf_a[..to_read])?;
        fb.read_exact(&mut buf_b[..to_read])?;
        if buf_a[..to_read] != buf_b[..to_read] {
            return Ok(false);
        }
        remaining -= to_read as u64;

        check += 1;
        if check >= hasher::CHECK_MINIMUM {
            check = 0;
        }
    }
    Ok(true)
}

/// Collect every candidate currently flagged as a group head, walking its
/// `duplicates` chain.
fn collect_groups(arena: &[Candidate]) -> Vec<Group> {
    let mut groups = Vec::new();
    for (idx, c) in arena.iter().enumerate() {
        if !c.has_dupes {
            continue;
        }
        let mut members: SmallVec<[CandidateId; 4]> = SmallVec::new();
        members.push(CandidateId(idx as u32));
        let mut next = c.duplicates;
        while let Some(n) = next {
            members.push(n);
            next = arena[n.0 as usize].duplicates;
        }
        groups.push(Group { members });
    }
    groups
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::walker::Root;
    use std::fs;

    fn scan_dir(cfg: Config, dir: &std::path::Path, recurse: bool) -> ScanResult {
        let roots = vec![Root { path: dir.to_path_buf(), recurse }];
        let abort = AbortFlag::new();
        Scanner::new(cfg).scan(&roots, &abort).expect("scan")
    }

    #[test]
    fn two_identical_files_form_one_group() {
        let tmp = tempdir::TempDir::new("scan1").expect("tmp");
        fs::write(tmp.path().join("a"), "0123456789").unwrap();
        fs::write(tmp.path().join("b"), "0123456789").unwrap();

        let result = scan_dir(Config::default(), tmp.path(), false);
        assert_eq!(result.groups.len(), 1);
        assert_eq!(result.groups[0].members.len(), 2);
    }

    #[test]
    fn distinct_third_file_is_excluded() {
        let tmp = tempdir::TempDir::new("scan2").expect("tmp");
        fs::write(tmp.path().join("a"), "0123456789").unwrap();
        fs::write(tmp.path().join("b"), "0123456789").unwrap();
        fs::write(tmp.path().join("c"), "9876543210").unwrap();

        let result = scan_dir(Config::default(), tmp.path(), false);
        assert_eq!(result.groups.len(), 1);
        assert_eq!(result.groups[0].members.len(), 2);
    }

    #[test]
    fn hardlinked_files_need_flag_to_group() {
        let tmp = tempdir::TempDir::new("scan3").expect("tmp");
        let a = tmp.path().join("a");
        let b = tmp.path().join("b");
        fs::write(&a, "0123456789").unwrap();
        fs::hard_link(&a, &b).unwrap();

        let result = scan_dir(Config::default(), tmp.path(), false);
        assert_eq!(result.groups.len(), 0);

        let mut cfg = Config::default();
        cfg.hardlinks_as_dupes = true;
        let result = scan_dir(cfg, tmp.path(), false);
        assert_eq!(result.groups.len(), 1);
        assert_eq!(result.stats.pairs_confirmed, 1);
    }

    #[test]
    fn isolate_prevents_matches_within_one_root() {
        let tmp = tempdir::TempDir::new("scan4").expect("tmp");
        fs::write(tmp.path().join("dup.bin"), "identical").unwrap();
        let sub = tmp.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("dup.bin"), "identical").unwrap();

        let result = scan_dir(Config::default(), tmp.path(), true);
        assert_eq!(result.groups.len(), 1);

        let mut cfg = Config::default();
        cfg.isolate = true;
        let result = scan_dir(cfg, tmp.path(), true);
        assert_eq!(result.groups.len(), 0);
    }

    #[test]
    fn zero_length_files_group_only_with_zeromatch() {
        let tmp = tempdir::TempDir::new("scan5").expect("tmp");
        fs::write(tmp.path().join("e1"), "").unwrap();
        fs::write(tmp.path().join("e2"), "").unwrap();
        fs::write(tmp.path().join("f1"), "hello").unwrap();
        fs::write(tmp.path().join("f2"), "hello").unwrap();

        let result = scan_dir(Config::default(), tmp.path(), false);
        assert_eq!(result.groups.len(), 1);

        let mut cfg = Config::default();
        cfg.zero_match = true;
        let result = scan_dir(cfg, tmp.path(), false);
        assert_eq!(result.groups.len(), 2);
    }

    #[test]
    fn three_identical_files_form_one_group_of_three() {
        let tmp = tempdir::TempDir::new("scan6").expect("tmp");
        let body = "x".repeat(65536);
        fs::write(tmp.path().join("a"), &body).unwrap();
        fs::write(tmp.path().join("b"), &body).unwrap();
        fs::write(tmp.path().join("c"), &body).unwrap();

        let result = scan_dir(Config::default(), tmp.path(), false);
        assert_eq!(result.groups.len(), 1);
        assert_eq!(result.groups[0].members.len(), 3);
        assert_eq!(result.stats.pairs_confirmed, 2);
    }
}
