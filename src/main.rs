use anyhow::Context;
use clap::Parser;
use statement_ocr::utils::error::ErrorSeverity;
use statement_ocr::utils::logger;
use statement_ocr::{build_service, CliConfig, StatementError, StructuredResult};

fn exit_code(error: &StatementError) -> i32 {
    match error.severity() {
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn report(error: &StatementError) -> ! {
    tracing::error!(
        "Run failed: {} (Category: {:?}, Severity: {:?})",
        error,
        error.category(),
        error.severity()
    );
    tracing::error!("Recovery suggestion: {}", error.recovery_suggestion());

    eprintln!("error: {}", error.user_friendly_message());
    eprintln!("hint: {}", error.recovery_suggestion());
    std::process::exit(exit_code(error));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI config: {:?}", cli);

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => report(&e),
    };
    let mode = config.extract.mode.clone();
    if config.monitoring.enabled {
        tracing::info!("System monitoring enabled");
    }

    let service = match build_service(config) {
        Ok(service) => service,
        Err(e) => report(&e),
    };

    let result = match service.submit_file(&cli.input, &mode).await {
        Ok(result) => result,
        Err(e) => report(&e),
    };

    if cli.print_text {
        println!("{}", result.ocr_text);
    }

    let summary = match &result.structured {
        StructuredResult::Entities(bundle) => format!(
            "{} date(s), {} other entit(ies)",
            bundle.dates.len(),
            bundle.other.len()
        ),
        StructuredResult::Transactions(records) => format!("{} transaction(s)", records.len()),
    };
    tracing::info!("Run {} finished: {}", result.run_id, summary);

    let json = serde_json::to_string_pretty(&result.structured)
        .context("failed to serialize structured result")?;
    println!("{}", json);
    eprintln!("Export saved to: {}", result.export_path.display());

    Ok(())
}
