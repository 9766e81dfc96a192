//! `newapp search` - list what the catalog offers for some terms.

use tracing::instrument;

use crate::{
    cli::{GlobalArgs, OutputFormat, SearchArgs},
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

#[instrument(skip_all, fields(terms = ?args.terms))]
pub fn execute(
    args: SearchArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let service = super::build_service(&global, &config, config.defaults.insecure_registry)?;
    let mut matches = service.search(&args.terms)?;
    if let Some(limit) = args.limit {
        matches.truncate(limit);
    }

    match output.format() {
        OutputFormat::Json => output.data(&serde_json::to_string_pretty(&matches)?)?,
        OutputFormat::Compact => output.data(&serde_json::to_string(&matches)?)?,
        OutputFormat::Human | OutputFormat::Plain | OutputFormat::Auto => {
            if matches.is_empty() {
                output.warning(&format!("No matches for {}", args.terms.join(", ")))?;
                return Ok(());
            }
            output.header(&format!("{} matches:", matches.len()))?;
            for m in &matches {
                output.data(&format!(
                    "  {:<40} {:<14} {:.2}  {}",
                    m.name,
                    m.kind().to_string(),
                    m.score,
                    m.argument
                ))?;
            }
        }
    }
    Ok(())
}
