use crate::config::{LogFormat, TelemetryConfig};
use tracing::Subscriber;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter, Layer};

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid log filter '{directives}': {source}")]
    Filter {
        directives: String,
        source: ParseError,
    },
    #[error("could not install log subscriber: {0}")]
    Install(#[from] TryInitError),
}

/// Installs the global subscriber. `RUST_LOG` wins over the configured level
/// when it parses. Output goes to stderr so the run summary on stdout stays
/// machine-readable.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| parse_filter(&config.log_level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(output_layer(config))
        .try_init()?;
    Ok(())
}

fn output_layer<S>(config: &TelemetryConfig) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    match config.format {
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .with_ansi(config.ansi)
            .with_writer(std::io::stderr)
            .boxed(),
        // One object per event, fields at the top level, for log shippers.
        LogFormat::Json => fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .with_span_list(false)
            .with_writer(std::io::stderr)
            .boxed(),
    }
}

fn parse_filter(directives: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(directives).map_err(|source| TelemetryError::Filter {
        directives: directives.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::Registry;

    fn config(format: LogFormat) -> TelemetryConfig {
        TelemetryConfig {
            log_level: "info".to_string(),
            ansi: false,
            format,
        }
    }

    #[test]
    fn accepts_levels_and_directives() {
        assert!(parse_filter("info").is_ok());
        assert!(parse_filter("energy_providers=debug,warn").is_ok());
    }

    #[test]
    fn malformed_filter_names_the_directives() {
        let error = parse_filter("energy_providers=loud").expect_err("invalid level");
        assert!(matches!(&error, TelemetryError::Filter { directives, .. } if directives == "energy_providers=loud"));
        assert!(error.to_string().contains("energy_providers=loud"));
    }

    #[test]
    fn both_formats_build_a_layer() {
        for format in [LogFormat::Compact, LogFormat::Json] {
            let subscriber = Registry::default().with(output_layer(&config(format)));
            tracing::subscriber::with_default(subscriber, || {
                tracing::info!(format = format.label(), "layer installed");
            });
        }
    }
}
