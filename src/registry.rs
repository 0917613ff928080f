//! Group registry: maintains the `has_dupes` head flag and each group's
//! intra-chain ordering as pairs are confirmed (§4.6).

use crate::candidate::{Candidate, CandidateId};
use crate::config::{Config, OrderBy};
use std::cmp::Ordering;
use std::path::Path;

fn apply_dir(cfg: &Config, ord: Ordering) -> Ordering {
    if cfg.reverse_sort {
        ord.reverse()
    } else {
        ord
    }
}

/// Natural (numeric-aware) lexicographic compare, matching jdupes.c's
/// `numeric_sort()`: runs of digits compare by value, not byte-by-byte, so
/// `"file2"` sorts before `"file10"`. Everything else is a plain byte
/// compare. Non-UTF8 paths fall back to a byte-wise `Path::cmp`.
fn numeric_sort(a: &Path, b: &Path) -> Ordering {
    let (Some(a), Some(b)) = (a.to_str(), b.to_str()) else {
        return a.cmp(b);
    };
    let mut ai = a.chars().peekable();
    let mut bi = b.chars().peekable();
    loop {
        match (ai.peek(), bi.peek()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ac), Some(bc)) => {
                if ac.is_ascii_digit() && bc.is_ascii_digit() {
                    let mut a_digits = String::new();
                    while let Some(c) = ai.peek() {
                        if c.is_ascii_digit() {
                            a_digits.push(*c);
                            ai.next();
                        } else {
                            break;
                        }
                    }
                    let mut b_digits = String::new();
                    while let Some(c) = bi.peek() {
                        if c.is_ascii_digit() {
                            b_digits.push(*c);
                            bi.next();
                        } else {
                            break;
                        }
                    }
                    let a_trimmed = a_digits.trim_start_matches('0');
                    let b_trimmed = b_digits.trim_start_matches('0');
                    let ord = a_trimmed
                        .len()
                        .cmp(&b_trimmed.len())
                        .then_with(|| a_trimmed.cmp(b_trimmed))
                        .then_with(|| a_digits.len().cmp(&b_digits.len()));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                } else {
                    let ord = ac.cmp(bc);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                    ai.next();
                    bi.next();
                }
            }
        }
    }
}

fn compare(cfg: &Config, arena: &[Candidate], a: CandidateId, b: CandidateId) -> Ordering {
    if cfg.param_order {
        let ord = arena[a.0 as usize].user_order.cmp(&arena[b.0 as usize].user_order);
        let ord = apply_dir(cfg, ord);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    let ord = match cfg.order_by {
        OrderBy::Name => numeric_sort(&arena[a.0 as usize].path, &arena[b.0 as usize].path),
        OrderBy::Time => arena[a.0 as usize].mtime.cmp(&arena[b.0 as usize].mtime),
    };
    let ord = apply_dir(cfg, ord);
    if ord != Ordering::Equal {
        return ord;
    }
    // Final stabilizer so equal-key members still sort deterministically.
    arena[a.0 as usize].user_order.cmp(&arena[b.0 as usize].user_order)
}

/// Insert `newcomer` into the duplicate chain currently headed by `head`.
/// Returns the id of the group's head after insertion (either `head`
/// unchanged, or `newcomer` if it was promoted to the front).
///
/// Known limitation, preserved from the reference behavior: comparison runs
/// as each pair is added, so a later insertion can disturb intended order
/// within a large group. A post-scan resort would be the cleaner design;
/// see DESIGN.md.
pub fn register_pair(
    cfg: &Config,
    arena: &mut [Candidate],
    head: CandidateId,
    newcomer: CandidateId,
) -> CandidateId {
    if compare(cfg, arena, newcomer, head) != Ordering::Greater {
        arena[newcomer.0 as usize].duplicates = Some(head);
        arena[newcomer.0 as usize].has_dupes = true;
        arena[head.0 as usize].has_dupes = false;
        return newcomer;
    }

    arena[head.0 as usize].has_dupes = true;
    let mut current = head;
    loop {
        match arena[current.0 as usize].duplicates {
            None => {
                arena[current.0 as usize].duplicates = Some(newcomer);
                break;
            }
            Some(next) => {
                if compare(cfg, arena, newcomer, next) != Ordering::Greater {
                    arena[newcomer.0 as usize].duplicates = Some(next);
                    arena[current.0 as usize].duplicates = Some(newcomer);
                    break;
                }
                current = next;
            }
        }
    }
    head
}
