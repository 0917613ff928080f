use dupe_krill::config::{self, Config, OrderBy};
use dupe_krill::walker::Root;
use dupe_krill::{actions, ui, AbortFlag, Scanner};
use getopts::Options;
use std::env;
use std::path::PathBuf;
use std::process::exit;

/// Options which consume a following value, so the `-R`/positional-arg
/// pre-pass below doesn't mistake a value for a root path.
const VALUE_TAKING: [&str; 4] = ["-x", "--xsize", "-o", "--order"];

fn build_options() -> Options {
    let mut opts = Options::new();
    opts.optflag("1", "one-file-system", "Do not cross device boundaries during recursion or matching");
    opts.optflag("A", "nohidden", "Exclude dotfiles");
    opts.optflag("d", "delete", "Hand groups to the interactive deleter");
    opts.optflag("f", "omitfirst", "Omit the first entry of each group when printing");
    opts.optflag("H", "hardlinks", "Treat files with the same inode as duplicates");
    opts.optflag("i", "reverse", "Reverse intra-group sort direction");
    opts.optflag("I", "isolate", "Forbid matches within the same command-line root");
    opts.optflag("j", "json", "Display results as JSON");
    opts.optflag("L", "linkhard", "Replace duplicates with hard links to the first file in each set");
    opts.optflag("l", "linksoft", "Replace duplicates with symlinks to the first file in each set");
    opts.optflag("m", "summarize", "Print a short summary instead of the duplicate sets");
    opts.optflag("N", "noprompt", "Delete without prompting (with -d)");
    opts.optflag("O", "paramorder", "Sort by command-line root order first");
    opts.optopt("o", "order", "Group sort key: name or time", "name|time");
    opts.optflag("p", "permissions", "Only consider files with matching permissions/ownership");
    opts.optflag("Q", "quick", "Skip byte-by-byte confirmation (unsafe)");
    opts.optflag("q", "quiet", "Suppress progress output");
    opts.optflag("r", "recurse", "Recurse into all roots");
    opts.optflag("S", "size", "Include file size in the printed group header");
    opts.optflag("s", "symlinks", "Follow symlinks");
    opts.optopt("x", "xsize", "Exclude files smaller (or, with +, larger) than SIZE", "[+]N[K|M|G]");
    opts.optflag("z", "zeromatch", "Consider zero-length files");
    opts.optflag("Z", "softabort", "First interrupt stops the scan and acts on partial results");
    opts.optflag("v", "version", "Print version and build info");
    opts.optflag("h", "help", "Print this help text");
    opts
}

/// Split `-R`/`--recurse:` out of the raw argument list before handing the
/// rest to `getopts`: per §9.1/jdupes.c's `main()`, roots named after this
/// marker on the command line are scanned recursively, roots named before
/// it are not, regardless of `-r`.
fn split_recurse_marker(raw: &[String]) -> (Vec<String>, Vec<(String, bool)>) {
    let mut option_tokens = Vec::new();
    let mut positional = Vec::new();
    let mut after_marker = false;

    let mut i = 0;
    while i < raw.len() {
        let arg = &raw[i];
        if arg == "-R" || arg == "--recurse:" {
            after_marker = true;
            i += 1;
            continue;
        }
        if arg.starts_with('-') {
            option_tokens.push(arg.clone());
            if VALUE_TAKING.contains(&arg.as_str()) && i + 1 < raw.len() {
                option_tokens.push(raw[i + 1].clone());
                i += 2;
                continue;
            }
            i += 1;
            continue;
        }
        positional.push((arg.clone(), after_marker));
        i += 1;
    }
    (option_tokens, positional)
}

fn version_banner(cfg: &Config) {
    println!("dupe-krill {}", env!("CARGO_PKG_VERSION"));
    println!(
        "compiled-in behaviors active: hardlinks-as-dupes={}, permissions={}, one-file-system={}",
        cfg.hardlinks_as_dupes, cfg.permissions, cfg.one_file_system
    );
}

fn print_usage(opts: &Options, program: &str) {
    print!("{}", opts.usage(&format!("Usage: {program} [OPTIONS] FILE-OR-DIRECTORY...")));
}

fn main() {
    let raw: Vec<String> = env::args().collect();
    let program = raw.first().cloned().unwrap_or_else(|| "dupe-krill".to_string());
    let (option_tokens, positional) = split_recurse_marker(&raw[1..]);

    let opts = build_options();
    let matches = match opts.parse(&option_tokens) {
        Ok(m) => m,
        Err(err) => {
            eprintln!("error: {err}");
            exit(1);
        }
    };

    if matches.opt_present("h") {
        print_usage(&opts, &program);
        return;
    }

    let mut cfg = Config::default();
    cfg.one_file_system = matches.opt_present("1");
    cfg.exclude_hidden = matches.opt_present("A");
    cfg.omit_first = matches.opt_present("f");
    cfg.hardlinks_as_dupes = matches.opt_present("H");
    cfg.reverse_sort = matches.opt_present("i");
    cfg.isolate = matches.opt_present("I");
    cfg.permissions = matches.opt_present("p");
    cfg.quick = matches.opt_present("Q");
    cfg.quiet = matches.opt_present("q");
    cfg.show_size = matches.opt_present("S");
    cfg.follow_symlinks = matches.opt_present("s");
    cfg.zero_match = matches.opt_present("z");
    cfg.soft_abort = matches.opt_present("Z");
    cfg.param_order = matches.opt_present("O");
    cfg.order_by = match matches.opt_str("o").as_deref() {
        Some("time") => OrderBy::Time,
        _ => OrderBy::Name,
    };

    if matches.opt_present("v") {
        version_banner(&cfg);
        return;
    }

    let delete = matches.opt_present("d");
    let noprompt = matches.opt_present("N");
    let json_out = matches.opt_present("j");
    let linkhard = matches.opt_present("L");
    let linksoft = matches.opt_present("l");
    let summarize = matches.opt_present("m");
    cfg.for_hardlinking = linkhard;

    let action_count = [delete, json_out, linkhard, linksoft, summarize].iter().filter(|&&b| b).count();
    if action_count > 1 {
        eprintln!("error: -d/-j/-L/-l/-m are mutually exclusive");
        exit(1);
    }

    if let Some(x) = matches.opt_str("x") {
        match config::parse_xsize(&x) {
            Ok(f) => cfg.size_filter = f,
            Err(err) => {
                eprintln!("error: {err}");
                exit(1);
            }
        }
    }

    if positional.is_empty() {
        print_usage(&opts, &program);
        exit(1);
    }

    let recurse_all = matches.opt_present("r");
    let roots: Vec<Root> = positional
        .into_iter()
        .map(|(p, after_marker)| Root { path: PathBuf::from(p), recurse: recurse_all || after_marker })
        .collect();

    let abort = AbortFlag::new();
    let abort_handler = abort.clone();
    ctrlc::set_handler(move || abort_handler.bump()).ok();

    let scanner = Scanner::new(cfg.clone());
    let result = match scanner.scan(&roots, &abort) {
        Ok(r) => r,
        Err(err) => {
            eprintln!("error: {err}");
            exit(1);
        }
    };

    if result.stats.aborted && !cfg.soft_abort {
        eprintln!("aborted");
        exit(1);
    }

    let outcome = if delete {
        actions::delete(&result, noprompt)
    } else if linkhard {
        actions::hardlink(&result)
    } else if linksoft {
        actions::symlink(&result)
    } else if summarize {
        actions::summarize(&result);
        Ok(())
    } else if json_out {
        print_json_or_warn(&result, &cfg);
        Ok(())
    } else {
        ui::print_text(&result, &cfg);
        Ok(())
    };

    if let Err(err) = outcome {
        eprintln!("error: {err}");
        exit(1);
    }
}

#[cfg(feature = "json")]
fn print_json_or_warn(result: &dupe_krill::ScanResult, cfg: &Config) {
    dupe_krill::json::print_json(result, cfg);
}

#[cfg(not(feature = "json"))]
fn print_json_or_warn(_result: &dupe_krill::ScanResult, _cfg: &Config) {
    eprintln!("error: this binary was compiled without JSON support");
    exit(2);
}
