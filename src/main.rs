use std::path::Path;
use std::process::ExitCode;

use serde::Serialize;
use tracing_subscriber::EnvFilter;

use fia_bind::config;
use fia_bind::ffi::fia_sys;
use fia_bind::{LibraryLoader, Operation, SymbolSource};

#[derive(Serialize)]
struct SymbolReport {
    library: String,
    path: String,
    initialised: bool,
    forwarding_messages: bool,
    symbols: Vec<SymbolStatus>,
}

#[derive(Serialize)]
struct SymbolStatus {
    operation: String,
    symbol: String,
    resolved: bool,
}

fn usage() {
    eprintln!("Usage: fia_bind [--json] [settings.yaml]");
    eprintln!("  Load the FreeImageAlgorithms library and check every bound symbol.");
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        usage();
        return ExitCode::SUCCESS;
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        eprintln!("fia_bind {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let json = args.iter().any(|a| a == "--json");
    let positional: Vec<&String> = args.iter().filter(|a| !a.starts_with('-')).collect();

    if let Some(unknown) = args
        .iter()
        .find(|a| a.starts_with('-') && a.as_str() != "--json")
    {
        eprintln!("ERROR: Unknown option {unknown}");
        usage();
        return ExitCode::FAILURE;
    }
    if positional.len() > 1 {
        eprintln!("ERROR: At most one settings file may be given");
        usage();
        return ExitCode::FAILURE;
    }

    let settings = match positional.first() {
        Some(path) => config::load_settings_file(Path::new(path.as_str())),
        None => config::load_settings(Path::new(".")),
    };
    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            eprintln!("ERROR: Failed to load settings: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut loader = LibraryLoader::new(&settings);
    let library = match loader.load(None) {
        Ok(lib) => lib,
        Err(e) => {
            eprintln!("ERROR: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut symbols: Vec<SymbolStatus> = Operation::ALL
        .iter()
        .map(|op| SymbolStatus {
            operation: op.name().to_string(),
            symbol: op.descriptor().symbol.to_string(),
            resolved: library.resolve(op.descriptor().symbol).is_ok(),
        })
        .collect();
    for (operation, symbol) in [
        ("histogram", fia_sys::FIA_HISTOGRAM),
        ("histogram", fia_sys::FIA_RGB_HISTOGRAM),
    ] {
        symbols.push(SymbolStatus {
            operation: operation.to_string(),
            symbol: symbol.to_string(),
            resolved: library.resolve(symbol).is_ok(),
        });
    }

    let report = SymbolReport {
        library: library.name().to_string(),
        path: library.path().display().to_string(),
        initialised: library.is_initialised(),
        forwarding_messages: library.is_forwarding_messages(),
        symbols,
    };

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("ERROR: Failed to serialise report: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("{} ({})", report.library, report.path);
        println!("initialised: {}", report.initialised);
        println!("forwarding messages: {}", report.forwarding_messages);
        for s in &report.symbols {
            let status = if s.resolved { "OK" } else { "MISSING" };
            println!("{status:<8}{} ({})", s.operation, s.symbol);
        }
    }

    if report.symbols.iter().all(|s| s.resolved) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
