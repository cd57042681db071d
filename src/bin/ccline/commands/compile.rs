//! `ccline compile` command

use std::error::Error;
use std::sync::Arc;

use anyhow::{bail, Result};

use super::Session;
use crate::cli::{CompileArgs, MessageFormat};
use ccline::builder::events::{BuildEvent, JsonEventListener};
use ccline::builder::executor::CompileExecutor;
use ccline::builder::lease::WorkerLeases;
use ccline::builder::operation::{BuildOperationListener, TracingListener};
use ccline::core::{load_spec, CompileSpec};
use ccline::util::fs::glob_files;

pub fn execute(args: CompileArgs, session: &Session) -> Result<()> {
    let units = glob_files(&session.root, &args.units)?;
    if units.is_empty() {
        bail!("no compile units matched {}", args.units.join(", "));
    }

    let naming = session.settings.object_naming(&session.root);
    let specs = units
        .iter()
        .map(|unit| load_spec(unit, &naming))
        .collect::<Result<Vec<CompileSpec>>>()?;

    let json = args.message_format == MessageFormat::Json;
    let listener: Arc<dyn BuildOperationListener> = if json {
        Arc::new(JsonEventListener)
    } else {
        Arc::new(TracingListener)
    };

    // Jobs: CLI > config > one per CPU
    let jobs = args.jobs.or(session.settings.jobs);
    let leases = match jobs {
        Some(jobs) => WorkerLeases::new(jobs),
        None => WorkerLeases::per_cpu(),
    };

    let compiler = session.native_compiler(listener, leases);
    let report = CompileExecutor::new(&compiler)
        .jobs(jobs)
        .progress_bar(!json && !session.verbose)
        .execute(&specs)?;

    let total = report.results.len();

    if json {
        for outcome in report.results.iter().flatten() {
            let output = outcome.invocation.combined();
            if !output.is_empty() {
                BuildEvent::CompilerOutput {
                    source: outcome.source.clone(),
                    output,
                }
                .emit();
            }
        }
        BuildEvent::finished(
            report.compiled() as u64,
            report.failures().count() as u64,
            report.elapsed.as_millis() as u64,
        )
        .emit();
    } else {
        for outcome in report.results.iter().flatten() {
            // Warnings from units that still compiled
            let output = outcome.invocation.combined();
            if !output.is_empty() {
                eprintln!("{}", output);
            }
        }
        // The first failure is reported by the returned error
        for error in report.failures().skip(1) {
            eprintln!("error: {}", with_causes(error));
        }
        tracing::info!(
            "Finished {} of {} unit(s) in {:.2}s",
            report.compiled(),
            total,
            report.elapsed.as_secs_f64()
        );
    }

    report.into_result()?;
    Ok(())
}

/// `error` followed by each of its sources, `: `-separated.
fn with_causes(error: &dyn Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
