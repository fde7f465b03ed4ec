use std::process::ExitCode;

use exvi_arg0::arg0_dispatch_or_else;
use exvi_cli::run_main;

fn main() -> anyhow::Result<ExitCode> {
    arg0_dispatch_or_else(run_main)
}
