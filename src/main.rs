use clap::Parser;
use sales_reporter::config::LogFormat;
use sales_reporter::core::report::render_text;
use sales_reporter::domain::model::{InvalidRowPolicy, ReportFormat};
use sales_reporter::domain::ports::ConfigProvider;
use sales_reporter::utils::{logger, validation::Validate};
use sales_reporter::{CliConfig, LocalStorage, ReportEngine, ReportError, SalesPipeline, TomlConfig};

fn main() {
    let args = CliConfig::parse();

    match args.log_format {
        LogFormat::Compact => logger::init_cli_logger(args.verbose),
        LogFormat::Json => logger::init_json_logger(args.verbose),
    }

    tracing::info!("Starting sales-report");
    if args.verbose {
        tracing::debug!("CLI config: {:?}", args);
    }

    let exit_code = match &args.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            match TomlConfig::from_file(path) {
                Ok(mut config) => {
                    apply_cli_overrides(&mut config, &args);
                    run(config, &args)
                }
                Err(e) => report_failure(&e),
            }
        }
        None => run(args.clone(), &args),
    };

    std::process::exit(exit_code);
}

/// Flags given on the command line win over the configuration file.
fn apply_cli_overrides(config: &mut TomlConfig, args: &CliConfig) {
    if let Some(input) = &args.input {
        config.input.path = Some(input.clone());
    }
    if let Some(output_path) = &args.output_path {
        config.output.path = Some(output_path.clone());
    }
    if let Some(delimiter) = args.delimiter {
        config.input.delimiter = Some(delimiter);
    }
    if !args.date_formats.is_empty() {
        config.input.date_formats = Some(args.date_formats.clone());
    }
    if args.skip_invalid {
        config.input.on_invalid_row = Some(InvalidRowPolicy::Skip);
    }
    if args.no_report || args.json {
        let mut formats = config.report_formats();
        if args.no_report {
            formats.retain(|f| *f != ReportFormat::Txt);
        }
        if args.json && !formats.contains(&ReportFormat::Json) {
            formats.push(ReportFormat::Json);
        }
        config.output.report_formats = Some(formats);
    }
}

fn run<C: ConfigProvider + Validate>(config: C, args: &CliConfig) -> i32 {
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        return report_failure(&e);
    }

    let pipeline = SalesPipeline::new(LocalStorage::default(), config);
    let engine = ReportEngine::new(pipeline);

    match engine.run() {
        Ok(report) => {
            if !args.quiet {
                println!("{}", render_text(&report.summary, &[]));
                for output in &report.outputs {
                    println!("📁 Output saved to: {}", output);
                }
            }
            tracing::info!("✅ Sales report completed successfully!");
            0
        }
        Err(e) => report_failure(&e),
    }
}

fn report_failure(e: &ReportError) -> i32 {
    tracing::error!(
        "❌ Sales report failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    e.exit_code()
}
