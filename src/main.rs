use clap::Parser;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tracing::debug;

use dataconv::cli::files::find_source_files;
use dataconv::cli::path_mapping::map_input_to_output;
use dataconv::cli::{format_file_size, Args, CliConfig, Commands};
use dataconv::codec::{supported_pairs, Format};
use dataconv::conversion::{ConversionEngine, ConvertedData};

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Some(Commands::Formats) = &args.command {
        print_formats();
        return Ok(());
    }

    let config = CliConfig::from_args(args).map_err(|e| anyhow!(e))?;
    let engine = ConversionEngine::new(config.conversion_config.clone());

    handle_conversion(&config, &engine)
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("dataconv={level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn handle_conversion(config: &CliConfig, engine: &ConversionEngine) -> Result<()> {
    let target = config.target().map_err(|e| anyhow!(e))?;

    if config.args.stdin {
        convert_stdin(config, engine, target)
    } else if let Some(input) = &config.args.input {
        if input.is_file() {
            convert_file(input, config, engine, target)
        } else if input.is_dir() {
            convert_directory(input, config, engine, target)
        } else {
            Err(anyhow!("Input path does not exist: {}", input.display()))
        }
    } else {
        Err(anyhow!(
            "No input provided. Use --stdin or provide an input path"
        ))
    }
}

fn convert_stdin(config: &CliConfig, engine: &ConversionEngine, target: Format) -> Result<()> {
    let source = config.source_for(None).map_err(|e| anyhow!(e))?;
    let mut input = Vec::new();
    std::io::stdin().read_to_end(&mut input)?;

    let converted = engine
        .convert(source, target, &input)
        .map_err(|e| anyhow!(e.user_message()))?;
    emit(&converted, config)
}

fn convert_file(
    input_path: &Path,
    config: &CliConfig,
    engine: &ConversionEngine,
    target: Format,
) -> Result<()> {
    let source = config.source_for(Some(input_path)).map_err(|e| anyhow!(e))?;
    check_file_size(input_path, config.conversion_config.max_input_bytes)?;

    let input = std::fs::read(input_path)
        .with_context(|| format!("Failed to read {}", input_path.display()))?;
    let converted = engine
        .convert(source, target, &input)
        .map_err(|e| anyhow!(e.user_message()))?;
    emit(&converted, config)
}

/// Write to `--output` when given, otherwise to stdout
fn emit(converted: &ConvertedData, config: &CliConfig) -> Result<()> {
    if let Some(output_path) = &config.args.output {
        write_output(output_path, converted)?;
        if !config.is_quiet() {
            eprintln!("✓ Converted to: {}", output_path.display());
        }
    } else {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&converted.content)?;
        if converted.as_text().is_some_and(|text| !text.ends_with('\n')) {
            stdout.write_all(b"\n")?;
        }
        stdout.flush()?;
    }

    if config.want_stats() && !config.is_quiet() {
        output_statistics(converted);
    }

    Ok(())
}

fn write_output(output_path: &Path, converted: &ConvertedData) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output_path, &converted.content)
        .with_context(|| format!("Failed to write {}", output_path.display()))
}

fn check_file_size(input_path: &Path, limit: usize) -> Result<()> {
    let metadata = std::fs::metadata(input_path)?;
    if metadata.len() > limit as u64 {
        return Err(anyhow!(
            "Input file too large: {} (limit: {})",
            format_file_size(metadata.len()),
            format_file_size(limit as u64)
        ));
    }
    Ok(())
}

fn convert_directory(
    input_dir: &Path,
    config: &CliConfig,
    engine: &ConversionEngine,
    target: Format,
) -> Result<()> {
    let output_dir = config
        .args
        .output
        .as_ref()
        .ok_or_else(|| anyhow!("Output directory required for directory conversion"))?;
    std::fs::create_dir_all(output_dir)?;

    let files = find_source_files(input_dir, config.args.recursive, config.args.from, target)
        .map_err(|e| anyhow!("Failed listing {}: {}", input_dir.display(), e))?;

    if files.is_empty() {
        if !config.is_quiet() {
            println!("No files convertible to {} found in {}", target, input_dir.display());
        }
        return Ok(());
    }
    debug!(count = files.len(), dir = %input_dir.display(), "found source files");

    let mut failures = 0usize;
    for file in &files {
        let relative_path = file.strip_prefix(input_dir).unwrap_or(file);
        let output_file = map_input_to_output(input_dir, file, output_dir, target);

        match convert_single_file(file, &output_file, config, engine, target) {
            Ok(converted) => {
                if !config.is_quiet() {
                    println!("✓ {} -> {}", relative_path.display(), output_file.display());
                }
                if config.want_stats() && !config.is_quiet() {
                    output_statistics(&converted);
                }
            }
            Err(e) => {
                failures += 1;
                eprintln!("✗ Error converting {}: {:#}", relative_path.display(), e);
                if !config.continue_on_error() {
                    return Err(anyhow!("Aborting due to conversion error: {:#}", e));
                }
            }
        }
    }

    if failures > 0 {
        return Err(anyhow!("{} of {} files failed to convert", failures, files.len()));
    }
    Ok(())
}

fn convert_single_file(
    input_path: &Path,
    output_path: &Path,
    config: &CliConfig,
    engine: &ConversionEngine,
    target: Format,
) -> Result<ConvertedData> {
    let source = config.source_for(Some(input_path)).map_err(|e| anyhow!(e))?;
    check_file_size(input_path, config.conversion_config.max_input_bytes)?;

    let input = std::fs::read(input_path)?;
    let converted = engine
        .convert(source, target, &input)
        .map_err(|e| anyhow!(e.user_message()))?;
    write_output(output_path, &converted)?;

    Ok(converted)
}

fn output_statistics(converted: &ConvertedData) {
    let metadata = &converted.metadata;
    eprintln!("\nConversion Statistics ({}):", metadata.kind);
    eprintln!("Input size: {}", format_file_size(metadata.input_size));
    eprintln!("Output size: {}", format_file_size(metadata.output_size));
    if let Some(records) = metadata.record_count {
        eprintln!("Records: {}", records);
    }
    eprintln!("Processing time: {}ms", metadata.processing_time_ms);
}

fn print_formats() {
    println!("{:<6} {:<40} {}", "FORMAT", "MIME TYPE", "CONVERTS TO");
    for format in Format::ALL {
        let targets = format
            .supported_targets()
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>();
        let targets = if targets.is_empty() {
            "(output only)".to_string()
        } else {
            targets.join(", ")
        };
        println!("{:<6} {:<40} {}", format.as_str(), format.mime_type(), targets);
    }
    println!("\n{} supported conversions", supported_pairs().len());
}
