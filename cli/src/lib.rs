#![deny(clippy::print_stdout, clippy::print_stderr)]

mod line_host;

use std::io::IsTerminal;
use std::process::ExitCode;

use anyhow::Context;
use exvi_arg0::Invocation;
use exvi_core::Config;
use exvi_core::Console;
use exvi_core::Session;
use exvi_core::SessionFlags;
use exvi_core::run_editor;
use exvi_process_hardening::ProcessSandbox;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub use line_host::LineHost;

/// Runs the editor named by `invocation` against the process's standard
/// streams.
pub fn run_main(invocation: Invocation) -> anyhow::Result<ExitCode> {
    // Honor `RUST_LOG`; the editor's own output shares stderr, so stay quiet
    // unless asked.
    let default_level = "error";
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .try_init();

    let Invocation { program, args } = invocation;
    let config = Config::load().context("failed to load configuration")?;
    info!("starting {program} with {} argument(s)", args.len());

    let mut session = Session::new(program, config);
    if !std::io::stdin().is_terminal() {
        session.flags.insert(SessionFlags::SCRIPTED);
    }

    let mut host = LineHost::new(
        Box::new(std::io::stdin().lock()),
        Box::new(std::io::stdout()),
        Box::new(std::io::stderr()),
    );
    let mut sandbox = ProcessSandbox::new();
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let status = run_editor(
        &mut session,
        &mut host,
        &mut sandbox,
        args,
        Console {
            stdout: &mut stdout,
            stderr: &mut stderr,
        },
    );

    Ok(if status.code() == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
