//! Logging configuration.

use eyre::{Result, eyre};
use tracing_subscriber::EnvFilter;

use crate::args::LogArgs;

/// Initialize logging based on command line arguments.
///
/// The filter is built with the following precedence:
/// 1. If `--quiet` is set, only errors are shown
/// 2. Otherwise, start with `RUST_LOG` env var if set, or default to info level
/// 3. Apply verbosity flags (-v, -vv, etc.) to raise the global level
/// 4. Apply any custom filter from `--log.filter`
pub(crate) fn init_logging(args: &LogArgs) -> Result<()> {
    let filter = build_filter(args, EnvFilter::try_from_default_env().ok());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = if args.json {
        builder.json().try_init()
    } else {
        builder.without_time().try_init()
    };
    result.map_err(|e| eyre!("failed to install tracing subscriber: {e}"))
}

fn build_filter(args: &LogArgs, env: Option<EnvFilter>) -> EnvFilter {
    if args.quiet {
        return EnvFilter::new("error");
    }

    let base_level = match args.verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let mut filter = match env {
        // -v on top of RUST_LOG raises the global level only
        Some(filter) if args.verbosity > 0 => add_directives(filter, base_level),
        Some(filter) => filter,
        None => EnvFilter::new(base_level),
    };

    // Add any custom filter directives
    if let Some(custom_filter) = &args.filter {
        filter = add_directives(filter, custom_filter);
    }

    filter
}

/// Add comma separated directives, skipping the ones that do not parse.
fn add_directives(mut filter: EnvFilter, directives: &str) -> EnvFilter {
    for directive in directives.split(',') {
        if let Ok(d) = directive.parse() {
            filter = filter.add_directive(d);
        }
    }
    filter
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_quiet_filter() {
        let args = LogArgs {
            quiet: true,
            ..Default::default()
        };
        assert_eq!(build_filter(&args, None).to_string(), "error");
    }

    #[test]
    fn test_custom_directives() {
        let args = LogArgs {
            filter: Some("vertex_swarm_kademlia=trace,not a directive".to_string()),
            ..Default::default()
        };
        let filter = build_filter(&args, None).to_string();
        assert!(filter.contains("vertex_swarm_kademlia=trace"));
    }

    #[test]
    fn test_verbosity_applies_over_env() {
        let env = || Some(EnvFilter::new("vertex_swarm_kademlia=debug"));

        let filter = build_filter(&LogArgs::default(), env());
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));

        let args = LogArgs {
            verbosity: 2,
            ..Default::default()
        };
        let filter = build_filter(&args, env());
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));
        assert!(filter.to_string().contains("vertex_swarm_kademlia=debug"));
    }
}
