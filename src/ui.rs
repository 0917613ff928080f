//! Plain-text group printer (§6 "Plain" output format).

use crate::config::Config;
use crate::scanner::ScanResult;

pub fn print_text(result: &ScanResult, cfg: &Config) {
    let mut printed_any = false;
    let last = result.groups.len().saturating_sub(1);

    for (i, group) in result.groups.iter().enumerate() {
        printed_any = true;
        let head = &result.arena[group.members[0].0 as usize];

        if !cfg.omit_first {
            if cfg.show_size {
                let n = head.size;
                println!("{} byte{} each:", n, if n != 1 { "s" } else { "" });
            }
            println!("{}", head.path.display());
        }

        for id in &group.members[1..] {
            println!("{}", result.arena[id.0 as usize].path.display());
        }

        if i != last {
            println!();
        }
    }

    if !printed_any {
        eprintln!("No duplicates found.");
    }
}
