//! JSON group printer (§6 "JSON" output format), gated behind the `json`
//! Cargo feature exactly as the reference crate gates its own.

use crate::config::Config;
use crate::scanner::ScanResult;
use serde_derive::Serialize;

/// An outer array of groups, each an inner array of path strings (§6). The
/// wrapper exists only so the output goes through a derived `Serialize` impl
/// rather than serializing a bare collection directly, matching the
/// reference crate's own `JsonSerializable` convention; `transparent` keeps
/// the wire format identical to the plain nested-array shape the spec calls
/// for.
#[derive(Serialize)]
#[serde(transparent)]
struct DuplicateGroups(Vec<Vec<String>>);

pub fn print_json(result: &ScanResult, cfg: &Config) {
    let groups = DuplicateGroups(
        result
            .groups
            .iter()
            .map(|g| {
                g.members
                    .iter()
                    .skip(if cfg.omit_first { 1 } else { 0 })
                    .map(|id| result.arena[id.0 as usize].path.display().to_string())
                    .collect()
            })
            .collect(),
    );

    match serde_json::to_string_pretty(&groups) {
        Ok(s) => println!("{s}"),
        Err(err) => eprintln!("error: can't serialize result: {err}"),
    }
}
