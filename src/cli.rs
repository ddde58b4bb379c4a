// Command-line definitions for chartroom

use anyhow::{Context, Result};
use chartroom::command::{self, ChartRequest, InputSource};
use chartroom::loader::SqlQuery;
use chartroom::output::OutputFormat;
use chartroom::sniff::Format;
use chartroom::theme::Theme;
use chartroom::{ChartError, ChartKind, RenderOptions};
use clap::{ArgGroup, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "chartroom", version, about = "CLI tool for creating charts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a bar chart from columnar data
    ///
    /// Examples:
    ///   chartroom bar --csv data.csv -x region -y revenue -o sales.png
    ///   cat data.csv | chartroom bar -x name -y q1 -y q2 -f markdown
    Bar(ChartArgs),
    /// Create a line chart from columnar data
    Line(ChartArgs),
    /// Create a scatter plot from columnar data
    Scatter(ChartArgs),
    /// Create a pie chart from columnar data
    ///
    /// The -x column provides slice labels and the first -y column the slice sizes.
    Pie(ChartArgs),
    /// Create a histogram showing the distribution of a numeric column
    Histogram {
        #[command(flatten)]
        chart: ChartArgs,
        /// Number of bins
        #[arg(long, default_value_t = 10)]
        bins: usize,
    },
    /// Create a radar (spider) chart from columnar data
    ///
    /// Each row is one axis of the radar. The -x column provides axis labels,
    /// and each -y column is a series plotted on the radar.
    Radar {
        #[command(flatten)]
        chart: ChartArgs,
        /// Fill the radar polygons (default)
        #[arg(long, overrides_with = "no_fill")]
        fill: bool,
        /// Draw outlines only
        #[arg(long, overrides_with = "fill")]
        no_fill: bool,
    },
    /// List available styles
    Styles,
}

/// Options shared by every chart subcommand
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("input_format").args(["csv", "tsv", "json", "jsonl"])))]
pub struct ChartArgs {
    /// Input file; stdin is read when omitted
    pub file: Option<PathBuf>,

    /// Output file path [default: chart.png, chart-2.png, ...]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Column for x-axis / categories
    #[arg(short = 'x')]
    pub x: Option<String>,

    /// Column(s) for y-axis / values (repeatable)
    #[arg(short = 'y')]
    pub y: Vec<String>,

    /// Parse input as CSV
    #[arg(long)]
    pub csv: bool,

    /// Parse input as TSV
    #[arg(long)]
    pub tsv: bool,

    /// Parse input as JSON
    #[arg(long)]
    pub json: bool,

    /// Parse input as newline-delimited JSON
    #[arg(long)]
    pub jsonl: bool,

    /// Query a SQLite database (opened read-only), e.g. --sql mydb.sqlite 'SELECT name, count FROM items'
    #[arg(
        long,
        num_args = 2,
        value_names = ["DATABASE", "QUERY"],
        conflicts_with_all = ["file", "input_format"]
    )]
    pub sql: Option<Vec<String>>,

    /// Chart title, also prepended to generated alt text
    #[arg(long)]
    pub title: Option<String>,

    /// X-axis label
    #[arg(long)]
    pub xlabel: Option<String>,

    /// Y-axis label
    #[arg(long)]
    pub ylabel: Option<String>,

    /// Figure width in inches
    #[arg(long, default_value_t = 10.0)]
    pub width: f64,

    /// Figure height in inches
    #[arg(long, default_value_t = 6.0)]
    pub height: f64,

    /// Output DPI
    #[arg(long, default_value_t = 100)]
    pub dpi: u32,

    /// Style preset (see `chartroom styles`)
    #[arg(long, env = "CHARTROOM_STYLE")]
    pub style: Option<String>,

    /// How to format stdout
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Path)]
    pub output_format: OutputFormat,

    /// Override the generated alt text (ignored with -f path)
    #[arg(long)]
    pub alt: Option<String>,
}

impl ChartArgs {
    fn into_request(self, kind: ChartKind) -> Result<ChartRequest, ChartError> {
        let theme = match self.style.as_deref() {
            Some(name) if !name.is_empty() => Theme::by_name(name)?,
            _ => Theme::default(),
        };

        let format = if self.csv {
            Some(Format::Csv)
        } else if self.tsv {
            Some(Format::Tsv)
        } else if self.json {
            Some(Format::Json)
        } else if self.jsonl {
            Some(Format::Jsonl)
        } else {
            None
        };

        let input = match (self.sql, self.file) {
            (Some(_), Some(_)) => {
                return Err(ChartError::Config(
                    "--sql cannot be combined with a FILE argument".to_string(),
                ))
            }
            (Some(sql), None) => {
                let [database, query] = <[String; 2]>::try_from(sql).map_err(|_| {
                    ChartError::Config(
                        "--sql requires exactly two arguments: DATABASE QUERY".to_string(),
                    )
                })?;
                InputSource::Sql(SqlQuery::new(database, query))
            }
            (None, Some(path)) => InputSource::File(path),
            (None, None) => InputSource::Stdin,
        };

        Ok(ChartRequest {
            kind,
            input,
            format,
            category: self.x,
            values: self.y,
            output: self.output,
            output_format: self.output_format,
            alt: self.alt,
            options: RenderOptions {
                width: self.width,
                height: self.height,
                dpi: self.dpi,
                title: self.title,
                x_label: self.xlabel,
                y_label: self.ylabel,
                theme,
                ..RenderOptions::default()
            },
        })
    }
}

/// Execute the parsed command, returning what to print on stdout
pub fn run(cli: Cli) -> Result<String> {
    let (kind, args, bins, fill) = match cli.command {
        Command::Styles => return Ok(Theme::available().join("\n")),
        Command::Bar(args) => (ChartKind::Bar, args, None, None),
        Command::Line(args) => (ChartKind::Line, args, None, None),
        Command::Scatter(args) => (ChartKind::Scatter, args, None, None),
        Command::Pie(args) => (ChartKind::Pie, args, None, None),
        Command::Histogram { chart, bins } => (ChartKind::Histogram, chart, Some(bins), None),
        Command::Radar {
            chart,
            fill,
            no_fill,
        } => (ChartKind::Radar, chart, None, Some(fill || !no_fill)),
    };

    let mut request = args.into_request(kind)?;
    if let Some(bins) = bins {
        request.options.bins = bins;
    }
    if let Some(fill) = fill {
        request.options.fill = fill;
    }

    command::run_chart(&request).with_context(|| format!("Failed to create {} chart", kind))
}
