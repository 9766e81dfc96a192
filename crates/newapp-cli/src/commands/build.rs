//! `newapp build` - like `generate`, but only build artifacts.

use crate::{
    cli::{GenerateArgs, GlobalArgs},
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

pub fn execute(
    args: GenerateArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    super::generate::run(args, false, &global, &config, &output)
}
