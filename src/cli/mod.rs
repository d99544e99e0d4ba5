//! Command-line interface module

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::codec::Format;
use crate::conversion::{parse_size, ConversionConfig};

pub mod files;
pub mod path_mapping;

/// Main CLI arguments
#[derive(Parser, Debug, Clone)]
#[command(name = "dataconv")]
#[command(about = "Convert data between CSV, JSON, XML, YAML, SQL and XLSX")]
#[command(version)]
#[command(long_about = None)]
pub struct Args {
    /// Input file or directory
    #[arg()]
    pub input: Option<PathBuf>,

    /// Source format (default: inferred from the file extension)
    #[arg(short, long)]
    pub from: Option<Format>,

    /// Target format
    #[arg(short, long)]
    pub to: Option<Format>,

    /// Output file or directory path (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Read input from standard input (requires --from)
    #[arg(long)]
    pub stdin: bool,

    /// Recursively process directories
    #[arg(long)]
    pub recursive: bool,

    /// Root element name for XML output (default: data)
    #[arg(long)]
    pub root: Option<String>,

    /// Element name for XML list entries and rows (default: item)
    #[arg(long)]
    pub item_tag: Option<String>,

    /// Table name for SQL INSERT statements (default: data)
    #[arg(long)]
    pub table: Option<String>,

    /// Treat the first CSV line as data instead of a header
    #[arg(long)]
    pub no_header: bool,

    /// Compact JSON output
    #[arg(long)]
    pub compact: bool,

    /// Spaces per indentation level for XML output (0-8, default: 0)
    #[arg(long)]
    pub xml_indent: Option<usize>,

    /// Largest accepted input (e.g., 100MB, default: 100MB)
    #[arg(long)]
    pub max_input_size: Option<String>,

    /// Output conversion statistics
    #[arg(long)]
    pub stats: bool,

    /// Enable verbose logging
    #[arg(long)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(long)]
    pub quiet: bool,

    /// Continue converting other files when one file fails
    #[arg(long)]
    pub continue_on_error: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List supported formats and conversion pairs
    Formats,
}

/// CLI configuration
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub args: Args,
    pub conversion_config: ConversionConfig,
}

impl CliConfig {
    /// Create CLI configuration from arguments
    pub fn from_args(args: Args) -> Result<Self, String> {
        let conversion_config = Self::create_conversion_config(&args)?;

        Ok(Self {
            args,
            conversion_config,
        })
    }

    fn create_conversion_config(args: &Args) -> Result<ConversionConfig, String> {
        let mut config = ConversionConfig::default()
            .with_pretty_json(!args.compact)
            .with_csv_header(!args.no_header);

        if let Some(root) = &args.root {
            config = config.with_xml_root(root.as_str());
        }
        if let Some(tag) = &args.item_tag {
            config = config.with_xml_item_tag(tag.as_str());
        }
        if let Some(table) = &args.table {
            config = config.with_sql_table(table.as_str());
        }
        if let Some(width) = args.xml_indent {
            config = config.with_xml_indent(width)?;
        }
        if let Some(limit) = &args.max_input_size {
            config = config.with_max_input_bytes(parse_size(limit)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Target format; required for every conversion
    pub fn target(&self) -> Result<Format, String> {
        self.args
            .to
            .ok_or_else(|| "No target format given. Use --to <FORMAT>".to_string())
    }

    /// Source format for `path`: `--from` if given, otherwise the file extension
    pub fn source_for(&self, path: Option<&Path>) -> Result<Format, String> {
        if let Some(from) = self.args.from {
            return Ok(from);
        }
        let path = path.ok_or_else(|| "Reading stdin requires --from <FORMAT>".to_string())?;
        format_of(path).ok_or_else(|| {
            format!(
                "Cannot infer the format of '{}'. Use --from <FORMAT>",
                path.display()
            )
        })
    }

    pub fn continue_on_error(&self) -> bool {
        self.args.continue_on_error
    }

    pub fn is_quiet(&self) -> bool {
        self.args.quiet
    }

    pub fn is_verbose(&self) -> bool {
        self.args.verbose
    }

    pub fn want_stats(&self) -> bool {
        self.args.stats
    }
}

/// Format implied by a path's extension
pub fn format_of(path: &Path) -> Option<Format> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(Format::from_extension)
}

/// Format a byte count in human-readable form
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}
