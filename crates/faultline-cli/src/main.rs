use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use faultline_core::{DynFailure, Effect, EncodeFailure, Exit, FailureSet, RunReport, settle};

mod cli;
mod demo;
mod output;

use cli::{Cli, Commands};
use demo::{DemoFailures, Faults};
use output::Rendered;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // -v の数でログレベルを決める（ログは stderr、結果は stdout）
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.run_config();

    match cli.command {
        Commands::Divide { a, b, recover } => {
            if recover {
                let effect = Effect::from_result(demo::recovered_divide(a, b));
                let (exit, report) = effect.run_with_report(&config);
                emit(exit, Some(report))
            } else {
                let effect = Effect::from_result(demo::divide(a, b));
                let (exit, report) = effect.run_with_report(&config);
                emit(exit, Some(report))
            }
        }

        Commands::Pipeline {
            a,
            b,
            fail_foo,
            fail_bar,
            panic,
            recover_all,
            run_async,
        } => {
            let faults = Faults {
                fail_foo,
                fail_bar,
                panic,
            };
            let effect = demo::pipeline(a, b, faults).log_defects();

            match (recover_all, run_async) {
                (true, true) => {
                    let exit = effect.catch_all(recovered).run_async(&config).await;
                    emit(exit, None)
                }
                (true, false) => {
                    let (exit, report) = effect.catch_all(recovered).run_with_report(&config);
                    emit(exit, Some(report))
                }
                (false, true) => emit(effect.run_async(&config).await, None),
                (false, false) => {
                    let (exit, report) = effect.run_with_report(&config);
                    emit(exit, Some(report))
                }
            }
        }

        Commands::Decode { json } => {
            let failure = DynFailure::from_json(&json)?;
            info!(tag = %failure.tag, "decoding failure");
            let effect = Effect::<String, DemoFailures>::from_dyn(Err(failure))
                .catch_all_defect(|defect| {
                    warn!(kind = defect.kind(), "failure could not be lifted into the declared union");
                });
            let (exit, report) = effect.run_with_report(&config);
            emit(exit, Some(report))
        }
    }
}

fn recovered(failure: DemoFailures) -> String {
    format!("recovered from {}", failure.tag())
}

/// Prints the run as JSON, then turns anything but a success into an error.
fn emit<V, F>(exit: Exit<V, F>, report: Option<RunReport>) -> anyhow::Result<()>
where
    V: Serialize,
    F: EncodeFailure,
{
    let rendered = Rendered::new(&exit, report.as_ref())?;
    println!("{}", rendered.to_json()?);
    settle(exit)?;
    Ok(())
}
