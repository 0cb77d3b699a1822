use time::macros::format_description;
use tracing_subscriber::{fmt::time::LocalTime, EnvFilter};

use crate::args::{Args, Mode};
use crate::chat::{parse_api_base, RETRY_LIMIT};

/// Logs go to stderr so the JSON report on stdout stays clean. `RUST_LOG`
/// overrides the level picked from `--verbose`.
pub fn setup_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let timer = LocalTime::new(format_description!(
        "[hour]:[minute]:[second].[subsecond digits:3]"
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(timer)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn format_number(num: u64) -> String {
    let digits = num.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn validate_args(args: &Args) -> anyhow::Result<()> {
    if args.top == 0 {
        anyhow::bail!("--top must be greater than 0");
    }

    if args.gap_threshold == 0 {
        anyhow::bail!("--gap-threshold must be at least 1");
    }

    if args.timeout == 0 {
        anyhow::bail!("--timeout must be greater than 0");
    }

    if args.retries > RETRY_LIMIT {
        anyhow::bail!("--retries must be at most {}", RETRY_LIMIT);
    }

    if let Err(e) = parse_api_base(&args.api_base) {
        anyhow::bail!("--api-base is not usable: {}", e);
    }

    if args.mode == Mode::Llm && args.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
        anyhow::bail!("--mode llm needs an API key: pass --api-key or set OPENAI_API_KEY");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["gapsight", "export.csv"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn formats_thousands() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn rejects_zero_limits() {
        assert!(validate_args(&parse(&["--top", "0"])).is_err());
        assert!(validate_args(&parse(&["--gap-threshold", "0"])).is_err());
        assert!(validate_args(&parse(&["--timeout", "0"])).is_err());
        assert!(validate_args(&parse(&["--retries", "30"])).is_err());
        assert!(validate_args(&parse(&["--retries", "5"])).is_ok());
        assert!(validate_args(&parse(&[])).is_ok());
    }

    #[test]
    fn rejects_bad_api_base() {
        assert!(validate_args(&parse(&["--api-base", "file:///tmp/x"])).is_err());
    }

    #[test]
    fn llm_mode_needs_a_key() {
        let mut args = parse(&["--mode", "llm"]);
        args.api_key = None;
        assert!(validate_args(&args).is_err());

        args.api_key = Some("sk-test".into());
        assert!(validate_args(&args).is_ok());
    }
}
