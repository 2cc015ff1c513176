#![allow(dead_code)]

// ============================================================
// Layer 1 - Entry Point
// ============================================================
// No command-line flags: everything a run needs comes from the
// pipeline config ($SMS_SPAM_CONFIG, default pipeline.json,
// defaults when absent).
//
//   1. install the tracing subscriber (RUST_LOG aware, writes
//      to stderr so stdout carries only the report)
//   2. load the config
//   3. prepare the corpus   (PrepareUseCase)
//   4. compare the models   (CompareUseCase)

mod application;
mod domain;
mod data;
mod ml;
mod infra;

use anyhow::Result;
use tracing_subscriber::{fmt::MakeWriter, util::SubscriberInitExt, EnvFilter};

use application::{compare_use_case::CompareUseCase, prepare_use_case::PrepareUseCase};
use data::loader::CsvLoader;
use infra::config_store::ConfigStore;

/// Formatting subscriber that sends every event to `writer`
fn log_subscriber<W>(filter: EnvFilter, writer: W) -> impl tracing::Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .finish()
}

fn main() -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("sms_spam_compare=info".parse()?);
    log_subscriber(filter, std::io::stderr).init();

    let config = ConfigStore::from_env().load()?;
    config.validate()?;
    tracing::info!("Reading messages from '{}'", config.data_path);

    let loader = CsvLoader::new(&config.data_path);
    let corpus = PrepareUseCase::new(config.clone()).execute(&loader)?;
    let outcome = CompareUseCase::new(config).execute(&corpus)?;

    tracing::info!(
        "Done: best model {} (precision {:.4})",
        outcome.best.algorithm,
        outcome.best.precision
    );
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_log_events_go_to_the_given_writer() {
        let captured = Captured::default();
        let writer   = captured.clone();
        let filter   = EnvFilter::new("info");

        tracing::subscriber::with_default(log_subscriber(filter, move || writer.clone()), || {
            tracing::info!("Split: 8 train, 2 test");
            tracing::debug!("hidden below info");
        });

        let text = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(text.contains("Split: 8 train, 2 test"));
        assert!(!text.contains("hidden below info"));
    }
}
