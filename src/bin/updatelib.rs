use clap::Parser;
use rampl_tools::{OutputFormatter, OutputMode, RamplTools, SyncCli, ToolsError};
use std::process;

#[tokio::main]
async fn main() {
    let exit_code = run().await;
    process::exit(exit_code);
}

async fn run() -> i32 {
    let cli = SyncCli::parse();
    rampl_tools::init_logging(cli.verbosity_level(), cli.quiet);

    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let tools = match RamplTools::from_sync_cli(&cli) {
        Ok(tools) => tools,
        Err(e) => {
            print_startup_error(&e, cli.output_format.into());
            return e.exit_code();
        }
    };

    if cli.dry_run {
        return handle_dry_run(&cli, &tools);
    }

    match tools.update_library(cli.archive.as_deref()).await {
        Ok(report) => {
            tools.output_formatter().print_sync_report(&report);
            0
        }
        Err(e) => {
            tools.handle_error(&e);
            e.exit_code()
        }
    }
}

fn handle_generate_config(cli: &SyncCli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "rampl-tools.toml".to_string());

    let formatter =
        OutputFormatter::new(cli.output_format.into(), cli.verbosity_level(), cli.quiet);

    match RamplTools::generate_sample_config(&config_path) {
        Ok(()) => {
            formatter.success(&format!(
                "Generated sample configuration file: {}",
                config_path
            ));
            formatter.info(&format!("To use it: updatelib --config {}", config_path));
            0
        }
        Err(e) => {
            formatter.print_user_friendly_error(&e);
            1
        }
    }
}

fn handle_dry_run(cli: &SyncCli, tools: &RamplTools) -> i32 {
    let formatter = tools.output_formatter();

    let plan = match tools.plan_update(cli.archive.as_deref()) {
        Ok(plan) => plan,
        Err(e) => {
            tools.handle_error(&e);
            return e.exit_code();
        }
    };

    formatter.info("DRY RUN MODE - nothing will be downloaded or copied");
    formatter.print_sync_plan(&plan);
    formatter.success("Dry run complete; run without --dry-run to perform the update");

    0
}

fn print_startup_error(error: &ToolsError, mode: OutputMode) {
    let formatter = OutputFormatter::new(mode, 0, false);
    formatter.print_user_friendly_error(error);
}
