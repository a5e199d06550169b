//! mapscript CLI entry point.

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use mapscript_engine::{EmptyWorld, MemorySource, Scheduler};
use mapscript_foundation::ScriptType;
use mapscript_language::{Image, disassemble};
use mapscript_runtime::{save, snapshot};
use mapscript_storage::ScriptCatalog;

/// What to do.
#[derive(Debug, PartialEq)]
enum Command {
    /// Print a compiled script.
    Disasm(PathBuf),
    /// Summarize a binary map save.
    Inspect(PathBuf),
    /// Print a scheduler snapshot.
    State(PathBuf),
}

/// CLI configuration parsed from arguments.
#[derive(Default)]
struct CliConfig {
    command: Option<Command>,
    catalog: Option<PathBuf>,
    show_help: bool,
    show_version: bool,
    verbose: u8,
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError: {e}\x1b[0m");
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<CliConfig, Box<dyn std::error::Error>> {
    let mut config = CliConfig::default();
    let mut positional = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => config.show_help = true,
            "-V" | "--version" => config.show_version = true,
            "-v" | "--verbose" => config.verbose = config.verbose.saturating_add(1),
            "--catalog" => {
                i += 1;
                if i >= args.len() {
                    return Err("--catalog requires a path".into());
                }
                config.catalog = Some(PathBuf::from(&args[i]));
            }
            arg if arg.starts_with('-') => {
                return Err(format!("unknown option: {arg}").into());
            }
            arg => positional.push(arg.to_string()),
        }
        i += 1;
    }

    let mut rest = positional.into_iter();
    if let Some(verb) = rest.next() {
        let path = rest
            .next()
            .map(PathBuf::from)
            .ok_or_else(|| format!("{verb} requires a file"))?;
        if let Some(extra) = rest.next() {
            return Err(format!("unexpected argument: {extra}").into());
        }
        config.command = Some(match verb.as_str() {
            "disasm" => Command::Disasm(path),
            "inspect" => Command::Inspect(path),
            "state" => Command::State(path),
            other => return Err(format!("unknown command: {other}").into()),
        });
    }

    Ok(config)
}

fn run(args: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = parse_args(args)?;

    let level = match config.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if config.show_version {
        println!("mapscript {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let Some(command) = config.command.as_ref().filter(|_| !config.show_help) else {
        print_help();
        return Ok(());
    };

    match command {
        Command::Disasm(path) => {
            let image = Image::load(path)?;
            print!("{}", disassemble(&image));
        }
        Command::Inspect(path) => {
            let catalog = config.catalog.as_ref().map(ScriptCatalog::load).transpose()?;
            inspect(path, catalog.as_ref())?;
        }
        Command::State(path) => {
            let state = snapshot::load_from_file(path)?;
            println!("{state:#?}");
        }
    }
    Ok(())
}

fn inspect(path: &Path, catalog: Option<&ScriptCatalog>) -> mapscript_foundation::Result<()> {
    let mut scheduler = Scheduler::new(MemorySource::new());
    save::load_map_file(path, &mut scheduler, &EmptyWorld)?;
    let registry = scheduler.registry();

    println!("\x1b[1;36m=== {} ===\x1b[0m", path.display());
    for script_type in ScriptType::ALL {
        let count = registry.count(script_type);
        if count == 0 {
            continue;
        }
        println!("\x1b[1m{script_type}\x1b[0m: {count}");
        for script in registry.iter(script_type) {
            let name = catalog
                .and_then(|c| c.file_name(script.script_index))
                .unwrap_or_else(|| format!("#{}", script.script_index));
            print!(
                "  {} {name} flags={:?} owner={}",
                script.sid(),
                script.flags,
                script.owner_id
            );
            if let (Some(tile), Some(radius)) = (script.built_tile(), script.radius()) {
                print!(" tile={}@{} radius={radius}", tile.tile(), tile.elevation());
            }
            if script.local_vars_count > 0 {
                print!(
                    " locals={}+{}",
                    script.local_vars_offset, script.local_vars_count
                );
            }
            println!();
        }
    }

    println!("Local variables: {}", registry.local_vars().len());
    println!("Events: {}", scheduler.events().len());
    for event in scheduler.events().iter() {
        println!("  {} {:?} owner={}", event.time.0, event.kind, event.owner_id);
    }
    Ok(())
}

fn print_help() {
    println!(
        "\x1b[1mmapscript\x1b[0m - Map scripting runtime tools

\x1b[1mUSAGE:\x1b[0m
    mapscript [OPTIONS] <COMMAND> <FILE>

\x1b[1mCOMMANDS:\x1b[0m
    disasm <file.int>        Disassemble a compiled script
    inspect <map.sav>        List the scripts and events in a map save
    state <file.msgpack>     Print a scheduler snapshot

\x1b[1mOPTIONS:\x1b[0m
    -h, --help               Print help information
    -V, --version            Print version information
    -v, --verbose            More logging (repeat for trace output)
    --catalog <scripts.lst>  Show script names when inspecting

\x1b[1mENVIRONMENT:\x1b[0m
    RUST_LOG                 Overrides the log filter

\x1b[1mEXAMPLES:\x1b[0m
    mapscript disasm door.int
    mapscript --catalog scripts.lst inspect arroyo.sav
    mapscript -v state scheduler.msgpack"
    );
}
