//! Chart mirror CLI entrypoint.
//!
//! This binary mirrors a remote chart repository into a local directory and
//! reports what it wrote. All orchestration lives in the library; the binary
//! parses arguments, installs the logger, and maps the outcome to an exit
//! code.

use chartmirror::cli::Cli;
use chartmirror::error::Result;
use chartmirror::job::{self, PlannedArtifact};
use chartmirror::output::{success_message, write_stderr_line};
use clap::Parser;
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .format_timestamp(None)
        .init();

    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    let settings = cli.settings()?;
    let quiet = settings.quiet;

    if cli.dry_run {
        let planned = job::plan(settings, stderr)?;
        print_plan(&planned, stderr);
        return Ok(());
    }

    let report = job::mirror(settings, stderr)?;
    if !quiet {
        write_stderr_line(stderr, success_message(&report));
    }
    Ok(())
}

/// Lists the archives a dry run would write.
fn print_plan(planned: &[PlannedArtifact], stderr: &mut dyn Write) {
    write_stderr_line(stderr, format!("Dry run: {} archive(s) planned", planned.len()));
    for artifact in planned {
        write_stderr_line(
            stderr,
            format!("  {} <- {}", artifact.path, artifact.location),
        );
    }
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            let mut message = format!("error: {err}");
            let mut source = std::error::Error::source(&err);
            while let Some(cause) = source {
                message.push_str(&format!("\n  caused by: {cause}"));
                source = cause.source();
            }
            write_stderr_line(stderr, message);
            1
        }
    }
}
