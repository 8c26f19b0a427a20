use std::path::PathBuf;

use clap::Args;

use omnikit::{Error, Result};

use crate::commands::GlobalArgs;

#[derive(Args)]
pub struct ValidateArgs {
    /// Omnifest to validate
    pub input: PathBuf,
}

pub fn run(args: &ValidateArgs, global: &GlobalArgs) -> Result<()> {
    if !args.input.exists() {
        return Err(Error::validation_invalid_argument(
            "input",
            format!("path '{}' does not exist", args.input.display()),
        ));
    }

    let report = omnikit::validate(&args.input, global.warn_duplicate_definitions)?;
    let rendered = serde_json::to_string_pretty(&report)
        .map_err(|e| Error::internal_json(e.to_string(), Some("render validation report".into())))?;
    println!("{rendered}");

    Ok(())
}
