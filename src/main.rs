use anyhow::Result;
use clap::Parser;
use tracing::error;

use gapsight::analysis::{print_evidence, run_analysis, write_insight};
use gapsight::utils::{setup_logging, validate_args};
use gapsight::Args;

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);

    validate_args(&args)?;

    match run_analysis(&args) {
        Ok(result) => {
            if args.evidence {
                print_evidence(&result);
            }
            write_insight(&result.insight, args.output.as_deref())
        }
        Err(e) => {
            error!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
