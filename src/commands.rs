//! Command implementations for tabrecon CLI

use crate::cli::{Commands, ComparisonArgs, OutputFormat};
use crate::config::{split_list, ComparisonConfig};
use crate::data::{parse_delimiter, DataProcessor, FileEncoding, LoadOptions};
use crate::engine::{ComparisonEngine, ComparisonMode};
use crate::error::{Result, TabreconError};
use crate::export::{export_dataset, export_differences};
use crate::keyed_diff::KeyedReport;
use crate::output::{JsonFormatter, PrettyPrinter};
use crate::progress::ProgressReporter;
use crate::reports::ReportsLayout;
use crate::result::ComparisonResult;
use crate::sql::{load_internal, parse_param};
use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Execute a command
pub fn execute_command(command: Commands, verbose: bool) -> Result<()> {
    match command {
        Commands::Compare {
            file_a,
            file_b,
            encoding_a,
            encoding_b,
            delimiter_a,
            delimiter_b,
            options,
        } => {
            let load_a = load_options(encoding_a.as_deref(), delimiter_a.as_deref())?;
            let load_b = load_options(encoding_b.as_deref(), delimiter_b.as_deref())?;
            compare_command(&file_a, &file_b, &load_a, &load_b, &options, verbose)
        }
        Commands::CompareWithInternal {
            fund_file,
            query,
            params,
            export_internal,
            encoding,
            delimiter,
            options,
        } => {
            let load_fund = load_options(encoding.as_deref(), delimiter.as_deref())?;
            compare_with_internal_command(
                &fund_file,
                &query,
                &params,
                export_internal,
                &load_fund,
                &options,
                verbose,
            )
        }
        Commands::CreateConfig { path } => create_config_command(&path),
        Commands::Info {
            file,
            encoding,
            delimiter,
            format,
        } => info_command(&file, encoding.as_deref(), delimiter.as_deref(), &format),
        Commands::Reports {
            reports_dir,
            format,
        } => reports_command(&reports_dir, &format),
    }
}

/// Validated settings for one comparison run
struct RunSettings {
    mode: ComparisonMode,
    format: OutputFormat,
    config: ComparisonConfig,
}

impl RunSettings {
    /// Everything here is checked before any data is loaded
    fn from_args(args: &ComparisonArgs) -> Result<Self> {
        let mode = ComparisonMode::parse(&args.mode)?;
        let format = OutputFormat::parse(&args.format).map_err(TabreconError::invalid_input)?;

        let mut config = match &args.config {
            Some(path) => ComparisonConfig::from_file(path)?,
            None => ComparisonConfig::default(),
        };
        if let Some(keys) = &args.key_columns {
            config.key_columns = split_list(keys);
        }
        if let Some(columns) = &args.ignore_columns {
            config.ignore_columns = split_list(columns).into_iter().collect();
        }
        if args.ignore_case {
            config.ignore_case = true;
        }
        if args.keep_whitespace {
            config.ignore_whitespace = false;
        }
        if let Some(tolerance) = args.tolerance {
            config.float_tolerance = tolerance;
        }
        config.validate()?;

        if mode == ComparisonMode::Full && config.key_columns.is_empty() {
            log::warn!("No key columns configured; keyed comparison will report no result");
        }

        Ok(Self {
            mode,
            format,
            config,
        })
    }

    fn progress(&self) -> ProgressReporter {
        match self.format {
            OutputFormat::Pretty => ProgressReporter::new_for_comparison(),
            OutputFormat::Json => ProgressReporter::new_minimal(),
        }
    }
}

fn load_options(encoding: Option<&str>, delimiter: Option<&str>) -> Result<LoadOptions> {
    Ok(LoadOptions {
        encoding: encoding
            .map(FileEncoding::parse)
            .transpose()
            .map_err(TabreconError::invalid_input)?,
        delimiter: delimiter.map(parse_delimiter).transpose()?,
    })
}

/// Compare two data files
fn compare_command(
    file_a: &Path,
    file_b: &Path,
    load_a: &LoadOptions,
    load_b: &LoadOptions,
    args: &ComparisonArgs,
    verbose: bool,
) -> Result<()> {
    let settings = RunSettings::from_args(args)?;
    let mut progress = settings.progress();
    let mut processor = DataProcessor::new()?;

    progress.begin(&format!("Loading {}...", file_a.display()));
    let (dataset_a, metadata_a) = processor.load_file(file_a, load_a)?;
    progress.begin(&format!("Loading {}...", file_b.display()));
    let (dataset_b, metadata_b) = processor.load_file(file_b, load_b)?;

    progress.begin(&format!("Running {} comparison...", settings.mode));
    let engine = ComparisonEngine::new(settings.config.clone());
    let result = engine.compare_with_metadata(
        &dataset_a,
        &dataset_b,
        settings.mode,
        metadata_a,
        metadata_b,
    );
    progress.finish(&format!("Comparison finished in {:.2?}", progress.elapsed()));
    drop(progress);

    emit_report(&result, &settings, args, file_a, file_b, verbose)
}

/// Extract the internal dataset with SQL and compare it to a fund file
fn compare_with_internal_command(
    fund_file: &Path,
    query_file: &Path,
    raw_params: &[String],
    export_internal: Option<Option<PathBuf>>,
    load_fund: &LoadOptions,
    args: &ComparisonArgs,
    verbose: bool,
) -> Result<()> {
    let settings = RunSettings::from_args(args)?;
    let params: IndexMap<String, String> = raw_params
        .iter()
        .map(|raw| parse_param(raw))
        .collect::<Result<_>>()?;
    let layout = ReportsLayout::from_root(&args.reports_dir);

    let mut progress = settings.progress();
    let mut processor = DataProcessor::new()?;

    progress.begin(&format!("Running internal query {}...", query_file.display()));
    let (internal, metadata_internal) = load_internal(&processor, query_file, &params)?;

    if let Some(target) = export_internal {
        let path = match target {
            Some(path) => path,
            None => {
                layout.ensure()?;
                layout.export_path("internal_data")
            }
        };
        export_dataset(&internal, &path)?;
    }

    progress.begin(&format!("Loading {}...", fund_file.display()));
    let (fund, metadata_fund) = processor.load_file(fund_file, load_fund)?;

    progress.begin(&format!("Running {} comparison...", settings.mode));
    let engine = ComparisonEngine::new(settings.config.clone());
    let result = engine.compare_with_metadata(
        &internal,
        &fund,
        settings.mode,
        metadata_internal,
        metadata_fund,
    );
    progress.finish(&format!("Comparison finished in {:.2?}", progress.elapsed()));
    drop(progress);

    emit_report(&result, &settings, args, query_file, fund_file, verbose)
}

/// Render the result, then write the report and difference files requested
fn emit_report(
    result: &ComparisonResult,
    settings: &RunSettings,
    args: &ComparisonArgs,
    source_a: &Path,
    source_b: &Path,
    verbose: bool,
) -> Result<()> {
    let layout = ReportsLayout::from_root(&args.reports_dir);

    match settings.format {
        OutputFormat::Pretty => PrettyPrinter::print_comparison(result, verbose),
        OutputFormat::Json => {
            println!("{}", JsonFormatter::format_report(result, args.full_differences)?)
        }
    }

    let mut report_paths = Vec::new();
    if let Some(path) = &args.output {
        report_paths.push(path.clone());
    }
    if args.save_report {
        layout.ensure()?;
        report_paths.push(layout.comparison_path(settings.mode, source_a, source_b, "json"));
    }
    if !report_paths.is_empty() {
        let report = JsonFormatter::format_report(result, args.full_differences)?;
        for path in &report_paths {
            write_file(path, &report)?;
            log::info!("Report written to {}", path.display());
            if settings.format == OutputFormat::Pretty {
                println!("📝 Report saved to {}", path.display());
            }
        }
    }

    if let Some(target) = &args.export_differences {
        match result.keyed() {
            Some(KeyedReport::Compared(diff)) => {
                let path = match target {
                    Some(path) => path.clone(),
                    None => {
                        layout.ensure()?;
                        layout.differences_path(source_a, source_b)
                    }
                };
                let written = export_differences(diff, &path)?;
                if settings.format == OutputFormat::Pretty {
                    println!("📤 Exported {} differences to {}", written, path.display());
                }
            }
            _ => log::warn!("Difference export needs a completed keyed comparison; skipped"),
        }
    }

    Ok(())
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, content)?;
    Ok(())
}

/// Write a sample configuration file
fn create_config_command(path: &Path) -> Result<()> {
    ComparisonConfig::write_sample(path)?;
    println!("✅ Created sample configuration at: {}", path.display());
    Ok(())
}

/// Show structure information for one file
fn info_command(
    file: &Path,
    encoding: Option<&str>,
    delimiter: Option<&str>,
    format: &str,
) -> Result<()> {
    let format = OutputFormat::parse(format).map_err(TabreconError::invalid_input)?;
    let options = load_options(encoding, delimiter)?;

    let mut processor = DataProcessor::new()?;
    let (dataset, metadata) = processor.load_file(file, &options)?;
    let issues = dataset.validate_structure();

    match format {
        OutputFormat::Pretty => PrettyPrinter::print_dataset_info(&metadata, &issues),
        OutputFormat::Json => println!("{}", JsonFormatter::format_dataset_info(&metadata, &issues)?),
    }
    Ok(())
}

/// List generated reports
fn reports_command(reports_dir: &Path, format: &str) -> Result<()> {
    let format = OutputFormat::parse(format).map_err(TabreconError::invalid_input)?;
    let layout = ReportsLayout::from_root(reports_dir);
    let files = layout.list()?;
    let stats = layout.stats()?;

    match format {
        OutputFormat::Pretty => PrettyPrinter::print_reports(&files, &stats),
        OutputFormat::Json => println!("{}", JsonFormatter::format_reports(&files, &stats)?),
    }
    Ok(())
}
