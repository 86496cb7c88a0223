//! `mcp-server-atlassian`: serves the tool catalogue as JSONL over stdio.

use std::fmt;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use atlassian_config::Config;
use atlassian_mcpd::{
    InitMode, OfflineBackend, ShutdownListener, StaticConfigLoader, StructuredHealthReporter,
    bootstrap_with, transport,
};

const MAIN_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::main");

fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(error) => error.exit(),
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => return fail(format_args!("failed to start the async runtime: {error}")),
    };

    let server = match bootstrap_with(
        &StaticConfigLoader::new(config),
        Arc::new(StructuredHealthReporter::new()),
        Arc::new(OfflineBackend),
        InitMode::InstallGlobal,
    ) {
        Ok(server) => server,
        Err(error) => return fail(format_args!("{error}")),
    };

    let mut listener = match ShutdownListener::install() {
        Ok(listener) => listener,
        Err(error) => return fail(format_args!("{error}")),
    };
    let Some(shutdown) = listener.receiver() else {
        return fail(format_args!("signal channel already taken"));
    };

    let end = runtime.block_on(transport::serve(
        server.dispatcher(),
        tokio::io::stdin(),
        tokio::io::stdout(),
        shutdown,
    ));
    tracing::info!(
        target: MAIN_TARGET,
        ending = ?end,
        exit_code = end.exit_code(),
        "server stopped"
    );

    drop(listener);
    // Standard input is read on a blocking thread that cannot be interrupted.
    runtime.shutdown_background();
    ExitCode::from(end.exit_code())
}

fn fail(message: fmt::Arguments<'_>) -> ExitCode {
    drop(writeln!(io::stderr(), "mcp-server-atlassian: {message}"));
    ExitCode::FAILURE
}
