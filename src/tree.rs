//! Ordered binary search tree keyed by the filter verdict, then partial
//! hash, then full hash (§4.4). Nodes are arena-indexed and never freed;
//! rebalancing is a handful of index swaps rather than a pointer dance.

use crate::candidate::{Candidate, CandidateId};
use crate::config::{AbortFlag, Config};
use crate::filter::{self, Verdict};
use crate::hasher;
use std::cmp::Ordering;
use std::fs;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeNodeId(u32);

#[derive(Debug, Clone)]
struct TreeNode {
    candidate: CandidateId,
    parent: Option<TreeNodeId>,
    left: Option<TreeNodeId>,
    right: Option<TreeNodeId>,
    weight: u32,
}

/// Outcome of inserting one candidate into the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// No existing candidate matched; `c` became a new leaf.
    Inserted,
    /// `c` is linked to an existing candidate and the user doesn't want
    /// linked files treated as duplicates; neither side is grouped.
    Rejected,
    /// `c` matched an existing candidate. `needs_confirm` is `false` for a
    /// linked-as-dupe short-circuit (no hashing or reading occurred, the
    /// files are the same inode) and `true` for a full-hash tie, which the
    /// caller must still byte-confirm unless running in quick mode.
    Match { existing: CandidateId, needs_confirm: bool },
    /// A read failed while hashing; the candidate is dropped, warned about
    /// by the caller.
    ReadFailed,
}

const REBALANCE_START: u32 = 16;
const REBALANCE_CAP: u32 = 512;
const REBALANCE_STEP: u32 = 64;

pub struct SearchTree {
    nodes: Vec<TreeNode>,
    root: Option<TreeNodeId>,
    depth_threshold: u32,
}

impl Default for SearchTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchTree {
    pub fn new() -> Self {
        SearchTree {
            nodes: Vec::new(),
            root: None,
            depth_threshold: REBALANCE_START,
        }
    }

    fn push_node(&mut self, candidate: CandidateId, parent: Option<TreeNodeId>) -> TreeNodeId {
        let id = TreeNodeId(self.nodes.len() as u32);
        self.nodes.push(TreeNode {
            candidate,
            parent,
            left: None,
            right: None,
            weight: 1,
        });
        id
    }

    fn node(&self, id: TreeNodeId) -> &TreeNode {
        &self.nodes[id.0 as usize]
    }

    fn node_mut(&mut self, id: TreeNodeId) -> &mut TreeNode {
        &mut self.nodes[id.0 as usize]
    }

    fn weight_of(&self, id: Option<TreeNodeId>) -> u32 {
        id.map_or(0, |id| self.node(id).weight)
    }

    fn recompute_weight(&mut self, id: TreeNodeId) {
        let w = 1 + self.weight_of(self.node(id).left) + self.weight_of(self.node(id).right);
        self.node_mut(id).weight = w;
    }

    /// Insert `cand` into the tree, computing hashes on demand.
    pub fn insert(
        &mut self,
        cfg: &Config,
        arena: &mut [Candidate],
        cand: CandidateId,
        abort: &AbortFlag,
    ) -> io::Result<InsertOutcome> {
        let Some(root) = self.root else {
            let node = self.push_node(cand, None);
            self.root = Some(node);
            return Ok(InsertOutcome::Inserted);
        };

        let mut current = root;
        let mut depth: u32 = 1;
        loop {
            let node_cand = self.node(current).candidate;
            let verdict = filter::check(cfg, &arena[cand.0 as usize], &arena[node_cand.0 as usize]);

            let go_right = match verdict {
                Verdict::Reject => return Ok(InsertOutcome::Rejected),
                Verdict::Match => {
                    return Ok(InsertOutcome::Match { existing: node_cand, needs_confirm: false })
                }
                Verdict::Less => true,
                Verdict::Greater => false,
                Verdict::Tie => match tie_break(arena, cand, node_cand, abort)? {
                    TieOutcome::Match => {
                        return Ok(InsertOutcome::Match { existing: node_cand, needs_confirm: true })
                    }
                    TieOutcome::Failed => return Ok(InsertOutcome::ReadFailed),
                    TieOutcome::Less => true,
                    TieOutcome::Greater => false,
                },
            };

            let next = if go_right { self.node(current).right } else { self.node(current).left };
            match next {
                Some(child) => {
                    current = child;
                    depth += 1;
                }
                None => {
                    let new_node = self.push_node(cand, Some(current));
                    if go_right {
                        self.node_mut(current).right = Some(new_node);
                    } else {
                        self.node_mut(current).left = Some(new_node);
                    }
                    let mut walk = Some(current);
                    while let Some(n) = walk {
                        self.recompute_weight(n);
                        walk = self.node(n).parent;
                    }
                    if depth > self.depth_threshold {
                        self.rebalance_root();
                        self.depth_threshold = if self.depth_threshold < REBALANCE_CAP {
                            (self.depth_threshold * 2).min(REBALANCE_CAP)
                        } else {
                            self.depth_threshold + REBALANCE_STEP
                        };
                    }
                    return Ok(InsertOutcome::Inserted);
                }
            }
        }
    }

    /// Single rotation lifting the root's heavier child, if that would
    /// actually reduce the left/right weight imbalance. A left-heavy root
    /// whose left child is itself right-heavy (and vice versa) can come out
    /// just as unbalanced, or worse, after a single rotation; skip it then.
    fn rebalance_root(&mut self) {
        let Some(root) = self.root else { return };
        let left_w = self.weight_of(self.node(root).left);
        let right_w = self.weight_of(self.node(root).right);
        let delta = left_w.abs_diff(right_w);

        if left_w > right_w {
            if let Some(pivot) = self.node(root).left {
                if self.delta_after_right_rotation(root, pivot) < delta {
                    self.rotate_right(root, pivot);
                }
            }
        } else if right_w > left_w {
            if let Some(pivot) = self.node(root).right {
                if self.delta_after_left_rotation(root, pivot) < delta {
                    self.rotate_left(root, pivot);
                }
            }
        }
    }

    /// Weight delta the tree would have at `pivot` (the new root) after
    /// `rotate_right(root, pivot)`, without mutating anything.
    fn delta_after_right_rotation(&self, root: TreeNodeId, pivot: TreeNodeId) -> u32 {
        let pivot_left_w = self.weight_of(self.node(pivot).left);
        let pivot_right_w = self.weight_of(self.node(pivot).right);
        let root_right_w = self.weight_of(self.node(root).right);
        let root_after_w = 1 + pivot_right_w + root_right_w;
        pivot_left_w.abs_diff(root_after_w)
    }

    /// Weight delta the tree would have at `pivot` (the new root) after
    /// `rotate_left(root, pivot)`, without mutating anything.
    fn delta_after_left_rotation(&self, root: TreeNodeId, pivot: TreeNodeId) -> u32 {
        let pivot_left_w = self.weight_of(self.node(pivot).left);
        let pivot_right_w = self.weight_of(self.node(pivot).right);
        let root_left_w = self.weight_of(self.node(root).left);
        let root_after_w = 1 + root_left_w + pivot_left_w;
        root_after_w.abs_diff(pivot_right_w)
    }

    fn rotate_right(&mut self, node: TreeNodeId, pivot: TreeNodeId) {
        let pivot_right = self.node(pivot).right;
        self.node_mut(node).left = pivot_right;
        if let Some(pr) = pivot_right {
            self.node_mut(pr).parent = Some(node);
        }
        self.node_mut(pivot).right = Some(node);
        self.node_mut(pivot).parent = self.node(node).parent;
        self.node_mut(node).parent = Some(pivot);
        if self.root == Some(node) {
            self.root = Some(pivot);
        }
        self.recompute_weight(node);
        self.recompute_weight(pivot);
    }

    fn rotate_left(&mut self, node: TreeNodeId, pivot: TreeNodeId) {
        let pivot_left = self.node(pivot).left;
        self.node_mut(node).right = pivot_left;
        if let Some(pl) = pivot_left {
            self.node_mut(pl).parent = Some(node);
        }
        self.node_mut(pivot).left = Some(node);
        self.node_mut(pivot).parent = self.node(node).parent;
        self.node_mut(node).parent = Some(pivot);
        if self.root == Some(node) {
            self.root = Some(pivot);
        }
        self.recompute_weight(node);
        self.recompute_weight(pivot);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

enum TieOutcome {
    Match,
    Less,
    Greater,
    Failed,
}

fn tie_break(
    arena: &mut [Candidate],
    a: CandidateId,
    b: CandidateId,
    abort: &AbortFlag,
) -> io::Result<TieOutcome> {
    let Some(pa) = ensure_partial_hash(arena, a, abort)? else { return Ok(TieOutcome::Failed) };
    let Some(pb) = ensure_partial_hash(arena, b, abort)? else { return Ok(TieOutcome::Failed) };

    match pa.cmp(&pb) {
        Ordering::Less => return Ok(TieOutcome::Less),
        Ordering::Greater => return Ok(TieOutcome::Greater),
        Ordering::Equal => {}
    }

    let Some(fa) = ensure_full_hash(arena, a, abort)? else { return Ok(TieOutcome::Failed) };
    let Some(fb) = ensure_full_hash(arena, b, abort)? else { return Ok(TieOutcome::Failed) };

    Ok(match fa.cmp(&fb) {
        Ordering::Equal => TieOutcome::Match,
        Ordering::Less => TieOutcome::Less,
        Ordering::Greater => TieOutcome::Greater,
    })
}

fn ensure_partial_hash(arena: &mut [Candidate], id: CandidateId, abort: &AbortFlag) -> io::Result<Option<u64>> {
    let idx = id.0 as usize;
    if let Some(h) = arena[idx].hash_partial {
        return Ok(Some(h));
    }
    let size = arena[idx].size;
    let len = size.min(hasher::PARTIAL_HASH_SIZE);
    let chunk = hasher::auto_chunk_size();
    let result = fs::File::open(&arena[idx].path)
        .and_then(|mut f| hasher::read_and_mix(&mut f, 0, len, 0, chunk, abort));
    match result {
        Ok(h) => {
            arena[idx].hash_partial = Some(h);
            if size <= hasher::PARTIAL_HASH_SIZE {
                arena[idx].hash_full = Some(h);
            }
            Ok(Some(h))
        }
        Err(err) => {
            eprintln!("warning: can't hash {}: {}", arena[idx].path.display(), err);
            Ok(None)
        }
    }
}

fn ensure_full_hash(arena: &mut [Candidate], id: CandidateId, abort: &AbortFlag) -> io::Result<Option<u64>> {
    let idx = id.0 as usize;
    if let Some(h) = arena[idx].hash_full {
        return Ok(Some(h));
    }
    let seed = arena[idx].hash_partial.expect("partial hash must precede full hash");
    let size = arena[idx].size;
    let remaining = size - hasher::PARTIAL_HASH_SIZE;
    let chunk = hasher::auto_chunk_size();
    let result = fs::File::open(&arena[idx].path)
        .and_then(|mut f| hasher::read_and_mix(&mut f, hasher::PARTIAL_HASH_SIZE, remaining, seed, chunk, abort));
    match result {
        Ok(h) => {
            arena[idx].hash_full = Some(h);
            Ok(Some(h))
        }
        Err(err) => {
            eprintln!("warning: can't hash {}: {}", arena[idx].path.display(), err);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::candidate::Candidate;
    use std::fs;

    fn write_and_build(dir: &std::path::Path, name: &str, content: &[u8], order: u32) -> Candidate {
        let path = dir.join(name);
        fs::write(&path, content).expect("write");
        let meta = fs::symlink_metadata(&path).expect("meta");
        Candidate::build_from_metadata(path, &meta, &meta, order).expect("build")
    }

    #[test]
    fn identical_files_hash_match() {
        let tmp = tempdir::TempDir::new("treetest").expect("tmp");
        let mut arena = vec![
            write_and_build(tmp.path(), "a", b"hello world", 1),
            write_and_build(tmp.path(), "b", b"hello world", 2),
        ];
        let cfg = Config::default();
        let abort = AbortFlag::new();
        let mut tree = SearchTree::new();
        let r1 = tree.insert(&cfg, &mut arena, CandidateId(0), &abort).expect("insert1");
        assert_eq!(r1, InsertOutcome::Inserted);
        let r2 = tree.insert(&cfg, &mut arena, CandidateId(1), &abort).expect("insert2");
        assert_eq!(r2, InsertOutcome::Match { existing: CandidateId(0), needs_confirm: true });
    }

    #[test]
    fn rebalance_skips_left_right_heavy_configuration() {
        // root.left (`pivot`) is heavy, but all of its weight sits in its own
        // right child: a single right rotation would just hand that same
        // weight to the new root's right side, leaving the same imbalance.
        let mut tree = SearchTree::new();
        let root = tree.push_node(CandidateId(0), None);
        tree.root = Some(root);

        let pivot = tree.push_node(CandidateId(1), Some(root));
        tree.node_mut(root).left = Some(pivot);

        let c1 = tree.push_node(CandidateId(2), Some(pivot));
        tree.node_mut(pivot).right = Some(c1);
        let c2 = tree.push_node(CandidateId(3), Some(c1));
        tree.node_mut(c1).right = Some(c2);
        let c3 = tree.push_node(CandidateId(4), Some(c2));
        tree.node_mut(c2).right = Some(c3);
        let c4 = tree.push_node(CandidateId(5), Some(c3));
        tree.node_mut(c3).right = Some(c4);
        let c5 = tree.push_node(CandidateId(6), Some(c4));
        tree.node_mut(c4).right = Some(c5);

        for id in [c5, c4, c3, c2, c1, pivot, root] {
            tree.recompute_weight(id);
        }

        assert_eq!(tree.weight_of(Some(root)), 7);
        let root_before = tree.root;
        tree.rebalance_root();
        assert_eq!(tree.root, root_before, "rotation should have been skipped");
    }

    #[test]
    fn different_content_same_size_no_match() {
        let tmp = tempdir::TempDir::new("treetest2").expect("tmp");
        let mut arena = vec![
            write_and_build(tmp.path(), "a", b"aaaaaaaaaa", 1),
            write_and_build(tmp.path(), "b", b"bbbbbbbbbb", 2),
        ];
        let cfg = Config::default();
        let abort = AbortFlag::new();
        let mut tree = SearchTree::new();
        tree.insert(&cfg, &mut arena, CandidateId(0), &abort).expect("insert1");
        let r2 = tree.insert(&cfg, &mut arena, CandidateId(1), &abort).expect("insert2");
        assert_eq!(r2, InsertOutcome::Inserted);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn different_sizes_both_inserted() {
        let tmp = tempdir::TempDir::new("treetest3").expect("tmp");
        let mut arena = vec![
            write_and_build(tmp.path(), "a", b"short", 1),
            write_and_build(tmp.path(), "b", b"a much longer file body", 2),
        ];
        let cfg = Config::default();
        let abort = AbortFlag::new();
        let mut tree = SearchTree::new();
        tree.insert(&cfg, &mut arena, CandidateId(0), &abort).expect("insert1");
        let r2 = tree.insert(&cfg, &mut arena, CandidateId(1), &abort).expect("insert2");
        assert_eq!(r2, InsertOutcome::Inserted);
    }
}
