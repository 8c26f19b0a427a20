use std::path::PathBuf;

use clap::Args;

use omnikit::{CompileOptions, Error, Result};

use crate::commands::GlobalArgs;

#[derive(Args)]
pub struct CompileArgs {
    /// Omnifest to compile
    pub input: PathBuf,

    /// Manifest destination, stdout when omitted
    pub output: Option<PathBuf>,

    /// Target to compile when the omnifest defines more than one
    #[arg(short = 't', long = "target")]
    pub target: Option<String>,

    /// Run external directives (the default)
    #[arg(long = "external", overrides_with = "no_external")]
    pub external: bool,

    /// Leave external directives unresolved
    #[arg(long = "no-external", overrides_with = "external")]
    pub no_external: bool,
}

pub fn run(args: &CompileArgs, global: &GlobalArgs) -> Result<()> {
    if !args.input.exists() {
        return Err(Error::validation_invalid_argument(
            "input",
            format!("path '{}' does not exist", args.input.display()),
        ));
    }

    let destination = match &args.output {
        Some(path) => path.display().to_string(),
        None => String::from("STDOUT"),
    };
    omnikit::log_info!("compiling '{}' to '{}'", args.input.display(), destination);

    let options = CompileOptions {
        input: args.input.clone(),
        target: args.target.clone(),
        externals: !args.no_external,
        warn_duplicate_definitions: global.warn_duplicate_definitions,
    };
    let compiled = omnikit::compile(&options)?;

    match &args.output {
        Some(path) => omnikit::io::write_file(path, &compiled.manifest, "write manifest")?,
        None => print!("{}", compiled.manifest),
    }

    Ok(())
}
