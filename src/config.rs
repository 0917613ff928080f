//! Process-global flag state, assembled once by the CLI front-end and then
//! threaded read-only through the walker, filter and match engine.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Sort key used both for printed group order and for the group registry's
/// intra-chain comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    Name,
    Time,
}

/// `--xsize` threshold: files smaller than (or, with a leading `+`, larger
/// than) the given size are excluded from consideration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeFilter {
    None,
    SmallerThan(u64),
    LargerThan(u64),
}

impl SizeFilter {
    pub fn excludes(&self, size: u64) -> bool {
        match *self {
            SizeFilter::None => false,
            SizeFilter::SmallerThan(n) => size < n,
            SizeFilter::LargerThan(n) => size > n,
        }
    }
}

/// Parse a `--xsize` argument of the form `[+]N[K|M|G]`.
pub fn parse_xsize(arg: &str) -> Result<SizeFilter, String> {
    let (larger, digits) = match arg.strip_prefix('+') {
        Some(rest) => (true, rest),
        None => (false, arg),
    };
    let (num_part, mult) = match digits.chars().last() {
        Some('k') | Some('K') => (&digits[..digits.len() - 1], 1024),
        Some('m') | Some('M') => (&digits[..digits.len() - 1], 1024 * 1024),
        Some('g') | Some('G') => (&digits[..digits.len() - 1], 1024 * 1024 * 1024),
        _ => (digits, 1),
    };
    let n: u64 = num_part.parse().map_err(|_| format!("invalid value for --xsize: '{arg}'"))?;
    let size = n * mult;
    Ok(if larger { SizeFilter::LargerThan(size) } else { SizeFilter::SmallerThan(size) })
}

/// Maximum length this implementation tolerates for a single path before
/// treating construction as a fatal overflow (the spec's "path buffer
/// overflow is fatal" translated to a `PathBuf`-based world, which has no
/// fixed buffer to overflow).
pub const PATHBUF_SIZE: usize = 4096 * 2;

#[derive(Debug, Clone)]
pub struct Config {
    pub one_file_system: bool,
    pub exclude_hidden: bool,
    pub omit_first: bool,
    pub hardlinks_as_dupes: bool,
    pub reverse_sort: bool,
    pub isolate: bool,
    pub permissions: bool,
    pub quick: bool,
    pub quiet: bool,
    pub show_size: bool,
    pub follow_symlinks: bool,
    pub zero_match: bool,
    pub soft_abort: bool,
    pub param_order: bool,
    pub order_by: OrderBy,
    pub size_filter: SizeFilter,
    pub for_hardlinking: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            one_file_system: false,
            exclude_hidden: false,
            omit_first: false,
            hardlinks_as_dupes: false,
            reverse_sort: false,
            isolate: false,
            permissions: false,
            quick: false,
            quiet: false,
            show_size: false,
            follow_symlinks: false,
            zero_match: false,
            soft_abort: false,
            param_order: false,
            order_by: OrderBy::Name,
            size_filter: SizeFilter::None,
            for_hardlinking: false,
        }
    }
}

/// Soft-abort level, shared between the `ctrlc` signal handler and the scan
/// loop. `0` = no interrupt seen; `1` = one SIGINT under `--softabort`
/// (finish up with partial results); `>=2` = a second SIGINT, or any SIGINT
/// without `--softabort` = stop immediately with failure.
#[derive(Debug, Clone)]
pub struct AbortFlag(Arc<AtomicU32>);

impl Default for AbortFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl AbortFlag {
    pub fn new() -> Self {
        AbortFlag(Arc::new(AtomicU32::new(0)))
    }

    pub fn level(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }

    pub fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.0.store(0, Ordering::SeqCst);
    }
}
