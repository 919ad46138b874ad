use clap::Parser;
use rampl_tools::{DocsCli, OutputFormatter, OutputMode, RamplTools, ToolsError};
use std::process;

#[tokio::main]
async fn main() {
    let exit_code = run().await;
    process::exit(exit_code);
}

async fn run() -> i32 {
    let cli = DocsCli::parse();
    rampl_tools::init_logging(cli.verbosity_level(), cli.quiet);

    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let tools = match RamplTools::from_docs_cli(&cli) {
        Ok(tools) => tools,
        Err(e) => {
            print_startup_error(&e, cli.output_format.into());
            return e.exit_code();
        }
    };

    match tools.extract_doc_blocks().await {
        Ok(report) => {
            tools.output_formatter().print_extraction_report(&report);
            0
        }
        Err(e) => {
            tools.handle_error(&e);
            e.exit_code()
        }
    }
}

fn handle_generate_config(cli: &DocsCli) -> i32 {
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
            formatter.info("Edit the [docs] section to change where sources are read and fragments written.");
            0
        }
        Err(e) => {
            formatter.print_user_friendly_error(&e);
            1
        }
    }
}

fn print_startup_error(error: &ToolsError, mode: OutputMode) {
    let formatter = OutputFormatter::new(mode, 0, false);
    formatter.print_user_friendly_error(error);
}
