use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use omnikit::core::log::{self, Format, Level};

use commands::GlobalArgs;

mod commands;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "omnikit")]
#[command(version = VERSION)]
#[command(about = "Toolkit for compiling omnifest descriptions into image build manifests")]
struct Cli {
    /// Raise log verbosity, may be given more than once
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Write machine readable JSON log records instead of text
    #[arg(short = 'j', long = "json", global = true)]
    json: bool,

    /// Identifier attached to every JSON log record
    #[arg(short = 'i', long = "identifier", global = true)]
    identifier: Option<String>,

    /// Enable a warning category, may be given more than once
    #[arg(short = 'w', long = "warn", value_enum, global = true)]
    warn: Vec<WarnFlag>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum WarnFlag {
    /// Warn when a variable is defined more than once
    DuplicateDefinition,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile an omnifest into a manifest
    Compile(commands::compile::CompileArgs),
    /// Check an omnifest without producing a manifest
    Validate(commands::validate::ValidateArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let format = if cli.json { Format::JsonSeq } else { Format::Text };
    log::init(Level::from_verbosity(cli.verbose), format, cli.identifier.clone());

    // Checked after the sink is up so the complaint itself is formatted.
    if cli.identifier.is_some() && !cli.json {
        omnikit::log_error!("cannot use `-i` without also using `-j`");
        return ExitCode::from(1);
    }

    let global = GlobalArgs {
        warn_duplicate_definitions: cli.warn.contains(&WarnFlag::DuplicateDefinition),
    };

    let result = match &cli.command {
        Commands::Compile(args) => commands::compile::run(args, &global),
        Commands::Validate(args) => commands::validate::run(args, &global),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::emit_error(&err);
            ExitCode::from(exit_code_to_u8(commands::exit_code_for_error(err.code)))
        }
    }
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
