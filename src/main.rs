use clap::Parser;
use defect_report::cli::commands;
use defect_report::cli::{Cli, Commands};
use defect_report::format::OutputContext;
use defect_report::logging::init_logging;
use defect_report::{ReportError, Result};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(cli.verbose, cli.quiet, cli.log_file.as_deref()) {
        eprintln!("Failed to initialize logging: {err}");
    }

    let ctx = OutputContext::from_flags(cli.json, cli.quiet);
    match run(&cli, &ctx) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err, &ctx);
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(cli: &Cli, ctx: &OutputContext) -> Result<()> {
    match &cli.command {
        Commands::Generate(args) => commands::generate::execute(args, ctx),
        Commands::Validate(args) => commands::validate::execute(args, ctx),
        Commands::Queries(args) => commands::queries::execute(args, ctx),
        Commands::Schema => commands::schema::execute(ctx),
        Commands::Completions { shell } => {
            commands::completions::execute(*shell);
            Ok(())
        }
    }
}

fn report_error(err: &ReportError, ctx: &OutputContext) {
    if ctx.is_json() {
        let envelope = err.to_structured().to_json();
        match serde_json::to_string_pretty(&envelope) {
            Ok(json) => eprintln!("{json}"),
            Err(_) => eprintln!("Error: {err}"),
        }
        return;
    }

    eprintln!("Error: {err}");
    if let Some(hint) = err.hint() {
        eprintln!("Hint: {hint}");
    }
}
