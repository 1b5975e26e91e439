//! `plotnet` binary.

use std::process::ExitCode;

use clap::Parser;
use log::{debug, error, info};
use miette::GraphicalReportHandler;

use plotnet::PlotnetError;
use plotnet_cli::{Args, error_adapter::to_reportables};

/// Environment variable holding `env_logger` filter directives, applied on
/// top of `--log-level`.
const LOG_ENV: &str = "PLOTNET_LOG";

fn main() -> ExitCode {
    miette::set_panic_hook();
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.log_level)
        .parse_env(LOG_ENV)
        .init();
    debug!(args:?; "Parsed arguments");

    match plotnet_cli::run(&args) {
        Ok(()) => {
            info!(input = args.input.as_str(); "Done");
            ExitCode::SUCCESS
        }
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

/// Logs each diagnostic of `err`, rendered against its source when it has one.
fn report(err: &PlotnetError) {
    let handler = GraphicalReportHandler::new();
    for reportable in to_reportables(err) {
        let mut rendered = String::new();
        match handler.render_report(&mut rendered, &reportable) {
            Ok(()) => error!("{rendered}"),
            Err(_) => error!("{reportable}"),
        }
    }
}
