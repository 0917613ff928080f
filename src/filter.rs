//! Pairwise admissibility check between two candidates: the tree-navigation
//! verdict used by `tree::insert` to decide direction, rejection, or match.

use crate::candidate::Candidate;
use crate::config::Config;
use std::cmp::Ordering;

/// Result of comparing candidate `a` against the tree node `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// `a` and `b` are a confirmed size/filter tie; proceed to hash compare.
    Tie,
    /// `a` sorts before `b`; recurse toward `b`'s left child.
    Less,
    /// `a` sorts after `b`; recurse toward `b`'s right child.
    Greater,
    /// `a` and `b` are linked (same inode/device) and hardlinks-as-dupes is
    /// enabled: treat as an immediate match, no further reads needed.
    Match,
    /// `a` and `b` are linked but the user does not want linked files
    /// treated as duplicates: suppress both from any group.
    Reject,
}

/// Pure pairwise function per the filter's admissibility rules. `a` is the
/// candidate being inserted, `b` is the tree node it is being compared
/// against.
pub fn check(cfg: &Config, a: &Candidate, b: &Candidate) -> Verdict {
    if cfg.isolate && a.user_order == b.user_order {
        return Verdict::Less;
    }
    if cfg.one_file_system && a.device != b.device {
        return Verdict::Less;
    }
    if cfg.permissions && (a.mode, a.uid, a.gid) != (b.mode, b.uid, b.gid) {
        return Verdict::Less;
    }
    if a.device == b.device && a.inode == b.inode {
        return if cfg.hardlinks_as_dupes {
            Verdict::Match
        } else {
            Verdict::Reject
        };
    }
    match a.size.cmp(&b.size) {
        Ordering::Less => Verdict::Less,
        Ordering::Greater => Verdict::Greater,
        Ordering::Equal => Verdict::Tie,
    }
}
