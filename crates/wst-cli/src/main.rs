use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use wst_core::config::WOW_PATH_KEY;
use wst_core::{CharacterStore, Config, ImportOptions};

const DATA_FILE: &str = "wowstat_data.json";
const CONFIG_FILE: &str = "wowstat_config.json";

#[derive(Parser, Debug)]
#[command(
    name = "wst-cli",
    about = "Import WoW Stat Tracker addon data and track weekly progress",
    version
)]
struct Cli {
    /// Directory holding the character and config JSON files
    #[arg(long, global = true, default_value = ".")]
    data_dir: PathBuf,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Dump the raw table tree of a SavedVariables file as JSON
    Dump(DumpArgs),
    /// Print the characters a SavedVariables file would import, as JSON
    Parse(FileArgs),
    /// Merge addon data into the character store
    Import(ImportArgs),
    /// List stored characters
    List,
    /// Validate stored characters; exits 1 if any is invalid
    Validate,
    /// Clear weekly progress for every character
    ResetWeekly,
    /// Clear weekly progress if the reset week changed since the last check
    CheckReset,
    /// Print the current week id
    Week,
}

#[derive(ClapArgs, Debug)]
struct DumpArgs {
    /// SavedVariables .lua file
    path: PathBuf,
    /// Max array elements to include per array
    #[arg(long, default_value_t = 128)]
    max_array: usize,
    /// Max recursion depth
    #[arg(long, default_value_t = 16)]
    max_depth: usize,
}

#[derive(ClapArgs, Debug)]
struct FileArgs {
    /// SavedVariables .lua file
    path: PathBuf,
}

#[derive(ClapArgs, Debug)]
struct ImportArgs {
    /// SavedVariables file; discovered under the WoW folder when omitted
    path: Option<PathBuf>,
    /// WoW installation folder (the one containing `_retail_`); remembered in config
    #[arg(long)]
    wow_path: Option<PathBuf>,
    /// Also apply weekly fields from snapshots not stamped with the current week
    #[arg(long, default_value_t = false)]
    include_stale: bool,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wst_core=info,wst_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let dir = cli.data_dir.as_path();
    match cli.cmd {
        Cmd::Dump(a) => cmd_dump(a),
        Cmd::Parse(a) => cmd_parse(a),
        Cmd::Import(a) => cmd_import(dir, a),
        Cmd::List => cmd_list(dir),
        Cmd::Validate => cmd_validate(dir),
        Cmd::ResetWeekly => cmd_reset_weekly(dir),
        Cmd::CheckReset => cmd_check_reset(dir),
        Cmd::Week => println!("{}", wst_core::current_week_id()),
    }
}

fn fail(code: i32, msg: impl std::fmt::Display) -> ! {
    eprintln!("error: {}", msg);
    std::process::exit(code);
}

fn open_store(dir: &Path) -> CharacterStore {
    CharacterStore::open(dir.join(DATA_FILE)).unwrap_or_else(|e| fail(2, e))
}

fn open_config(dir: &Path) -> Config {
    Config::open(dir.join(CONFIG_FILE)).unwrap_or_else(|e| fail(2, e))
}

fn print_json<T: serde::Serialize>(v: &T) {
    match serde_json::to_string_pretty(v) {
        Ok(s) => println!("{}", s),
        Err(e) => fail(5, e),
    }
}

fn cmd_dump(args: DumpArgs) {
    let data = std::fs::read(&args.path)
        .unwrap_or_else(|e| fail(2, format!("{}: {}", args.path.display(), e)));
    let value = wst_core::parse_value(&data).unwrap_or_else(|e| fail(3, e));
    let opts = wst_core::json::JsonOpts {
        max_array_elems: args.max_array,
        max_depth: args.max_depth,
    };
    print_json(&wst_core::json::tree_to_json(&value, opts));
}

fn cmd_parse(args: FileArgs) {
    print_json(&wst_core::parse_addon_file(&args.path));
}

fn resolve_addon_file(cfg: &mut Config, args: &ImportArgs) -> PathBuf {
    if let Some(p) = &args.path {
        return p.clone();
    }
    let wow = args
        .wow_path
        .clone()
        .or_else(|| cfg.get_str(WOW_PATH_KEY).map(PathBuf::from))
        .unwrap_or_else(|| fail(2, "no SavedVariables file given and no --wow-path configured"));
    if !wst_core::is_wow_root(&wow) {
        fail(2, format!("{} does not contain _retail_", wow.display()));
    }
    if args.wow_path.is_some() {
        cfg.set(WOW_PATH_KEY, wow.to_string_lossy().into_owned());
    }
    wst_core::find_addon_file(&wow).unwrap_or_else(|| {
        fail(
            3,
            "WoW Stat Tracker addon data not found; log in with the addon enabled first",
        )
    })
}

fn cmd_import(dir: &Path, args: ImportArgs) {
    let mut cfg = open_config(dir);
    let mut store = open_store(dir);
    let file = resolve_addon_file(&mut cfg, &args);
    tracing::debug!(file = %file.display(), "importing addon data");

    let data = wst_core::parse_addon_file(&file);
    if data.is_empty() {
        fail(3, "no character data found");
    }
    let app_version = env!("CARGO_PKG_VERSION");
    if data.version_mismatch(app_version) {
        tracing::warn!(
            addon = data.addon_version.as_deref().unwrap_or_default(),
            app = app_version,
            "addon version differs from this build"
        );
    }

    let current_week = wst_core::current_week_id();
    if wst_core::check_weekly_reset(&mut cfg, &mut store, &current_week) {
        println!("Weekly reset applied.");
    }
    let opts = ImportOptions {
        current_week: (!args.include_stale).then_some(current_week),
    };
    let summary = store.import(&data.characters, &opts);
    store.save().unwrap_or_else(|e| fail(4, e));
    cfg.save().unwrap_or_else(|e| fail(4, e));

    let mut msg = format!("Updated {}, added {}.", summary.updated, summary.added);
    if summary.stale > 0 {
        msg.push_str(&format!(" ({} stale)", summary.stale));
    }
    println!("{}", msg);
}

fn cmd_list(dir: &Path) {
    let store = open_store(dir);
    for (i, c) in store.characters().iter().enumerate() {
        println!(
            "{}\t{}-{}\tilvl={:.1}\tvault={}\tdelves={}\tstash={}\ttimewalk={}\tquests={}{}",
            i,
            c.name,
            c.realm,
            c.item_level,
            c.vault_visited,
            c.delves,
            c.gilded_stash,
            c.timewalk,
            c.quests,
            if c.notes.is_empty() { String::new() } else { format!("\t# {}", c.notes) }
        );
    }
}

fn cmd_validate(dir: &Path) {
    let store = open_store(dir);
    let mut invalid = 0;
    for c in store.characters() {
        let errors = c.validate();
        if errors.is_empty() {
            continue;
        }
        invalid += 1;
        println!("{}-{}:", c.name, c.realm);
        for e in errors {
            println!("  {}", e);
        }
    }
    if invalid > 0 {
        std::process::exit(1);
    }
}

fn cmd_reset_weekly(dir: &Path) {
    let mut store = open_store(dir);
    store.reset_weekly_all();
    store.save().unwrap_or_else(|e| fail(4, e));
    println!("Reset weekly data for {} characters.", store.len());
}

fn cmd_check_reset(dir: &Path) {
    let mut cfg = open_config(dir);
    let mut store = open_store(dir);
    let week = wst_core::current_week_id();
    if wst_core::check_weekly_reset(&mut cfg, &mut store, &week) {
        store.save().unwrap_or_else(|e| fail(4, e));
        println!("Weekly reset applied for week {}.", week);
    } else {
        println!("Week {} already current.", week);
    }
    cfg.save().unwrap_or_else(|e| fail(4, e));
}
