//! The chart pipeline behind every chart subcommand:
//! load, resolve, render, save, then format the response.

use crate::caption;
use crate::data::Dataset;
use crate::error::{ChartError, Result};
use crate::loader::{self, SqlQuery};
use crate::output::{self, OutputFormat};
use crate::resolve::resolve_columns;
use crate::runtime::{self, RenderSpec};
use crate::sniff::Format;
use crate::{ChartKind, RenderOptions};
use std::fs::File;
use std::io::{self, BufReader, IsTerminal};
use std::path::PathBuf;

/// Where rows come from
#[derive(Debug, Clone, PartialEq)]
pub enum InputSource {
    File(PathBuf),
    Stdin,
    Sql(SqlQuery),
}

/// One fully parsed chart invocation
#[derive(Debug, Clone)]
pub struct ChartRequest {
    pub kind: ChartKind,
    pub input: InputSource,
    /// Declared input format; sniffed when absent
    pub format: Option<Format>,
    pub category: Option<String>,
    pub values: Vec<String>,
    pub output: Option<PathBuf>,
    pub output_format: OutputFormat,
    /// Replaces the generated alt text
    pub alt: Option<String>,
    pub options: RenderOptions,
}

impl ChartRequest {
    pub fn new(kind: ChartKind, input: InputSource) -> Self {
        Self {
            kind,
            input,
            format: None,
            category: None,
            values: Vec::new(),
            output: None,
            output_format: OutputFormat::default(),
            alt: None,
            options: RenderOptions::default(),
        }
    }
}

/// Run one chart request and return the text to print
pub fn run_chart(request: &ChartRequest) -> Result<String> {
    request.options.validate()?;

    let dataset = load_input(request)?;
    let roles = resolve_columns(
        &dataset,
        request.kind,
        request.category.as_deref(),
        &request.values,
    )?;
    let output_path = output::resolve_output_path(request.output.as_deref())?;

    let png = runtime::render_chart(&RenderSpec {
        kind: request.kind,
        dataset: &dataset,
        roles: &roles,
        options: &request.options,
    })?;
    runtime::save_chart(&png, &output_path)?;

    if request.output_format == OutputFormat::Path {
        return Ok(output_path.to_string_lossy().into_owned());
    }

    let alt = caption::alt_text(
        request.kind,
        &dataset,
        &roles,
        request.options.title.as_deref(),
        request.alt.as_deref().filter(|alt| !alt.is_empty()),
    );
    output::format_output(&output_path, request.output_format, &alt)
}

fn load_input(request: &ChartRequest) -> Result<Dataset> {
    match &request.input {
        InputSource::Sql(query) => loader::load_rows(None::<io::Empty>, request.format, Some(query)),
        InputSource::File(path) => {
            let file = File::open(path).map_err(|source| ChartError::Input {
                path: path.clone(),
                source,
            })?;
            loader::load_rows(Some(BufReader::new(file)), request.format, None)
        }
        InputSource::Stdin => {
            let stdin = io::stdin();
            if stdin.is_terminal() {
                return Err(ChartError::Config(
                    "Provide a FILE argument, pipe data to stdin, or use --sql".to_string(),
                ));
            }
            loader::load_rows(Some(stdin.lock()), request.format, None)
        }
    }
}
