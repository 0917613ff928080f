#[cfg(feature = "json")]
extern crate serde_derive;
#[cfg(feature = "json")]
extern crate serde_json;

pub mod actions;
pub mod candidate;
pub mod config;
pub mod filter;
pub mod hasher;
#[cfg(feature = "json")]
pub mod json;
pub mod progress;
pub mod registry;
pub mod scanner;
pub mod tree;
pub mod ui;
pub mod walker;

pub use crate::candidate::{Candidate, CandidateId};
pub use crate::config::{AbortFlag, Config, OrderBy, SizeFilter};
pub use crate::scanner::{Group, ScanResult, Scanner, Stats};
pub use crate::walker::Root;
