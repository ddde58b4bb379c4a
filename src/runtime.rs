// Runtime executor: resolved rows in, PNG bytes out

use crate::data::Dataset;
use crate::error::{ChartError, Result};
use crate::graph::{Canvas, Series};
use crate::resolve::ColumnRoles;
use crate::{ChartKind, RenderOptions};
use log::{debug, info};
use std::io::Write;
use std::path::Path;

/// Everything needed to draw one chart
#[derive(Debug, Clone, Copy)]
pub struct RenderSpec<'a> {
    pub kind: ChartKind,
    pub dataset: &'a Dataset,
    pub roles: &'a ColumnRoles,
    pub options: &'a RenderOptions,
}

/// Render a chart to PNG bytes.
///
/// Value columns are converted strictly: any cell that is not a number fails
/// the render with the offending value and column.
pub fn render_chart(spec: &RenderSpec<'_>) -> Result<Vec<u8>> {
    spec.options.validate()?;

    let RenderSpec {
        kind,
        dataset,
        roles,
        options,
    } = *spec;
    let mut canvas = Canvas::new(options, kind.has_axes()).map_err(render_error)?;

    let drawn = match kind {
        ChartKind::Bar => {
            let categories = dataset.labels(category(kind, roles)?);
            canvas.draw_bars(&categories, &value_series(dataset, roles)?)
        }
        ChartKind::Line => {
            let categories = dataset.labels(category(kind, roles)?);
            canvas.draw_lines(&categories, &value_series(dataset, roles)?)
        }
        ChartKind::Scatter => {
            let x_data = dataset.numeric_column(category(kind, roles)?)?;
            canvas.draw_scatter(&x_data, &value_series(dataset, roles)?)
        }
        ChartKind::Pie => {
            let labels = dataset.labels(category(kind, roles)?);
            let values = dataset.numeric_column(roles.primary_value())?;
            canvas.draw_pie(&labels, &values)
        }
        ChartKind::Histogram => {
            let values = dataset.numeric_column(roles.primary_value())?;
            canvas.draw_histogram(&values, options.bins)
        }
        ChartKind::Radar => {
            let labels = dataset.labels(category(kind, roles)?);
            canvas.draw_radar(&labels, &value_series(dataset, roles)?, options.fill)
        }
    };
    drawn.map_err(render_error)?;

    let png = canvas.render().map_err(render_error)?;
    debug!("rendered {} chart, {} bytes", kind, png.len());
    Ok(png)
}

/// Write PNG bytes to `path`, replacing any existing file atomically
pub fn save_chart(png: &[u8], path: &Path) -> Result<()> {
    write_atomic(png, path).map_err(|e| {
        ChartError::Render(format!("Failed to save '{}': {}", path.display(), e))
    })?;
    info!("saved {} ({} bytes)", path.display(), png.len());
    Ok(())
}

fn write_atomic(bytes: &[u8], path: &Path) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.flush()?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))?;
    }
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn category(kind: ChartKind, roles: &ColumnRoles) -> Result<&str> {
    roles.category.as_deref().ok_or_else(|| {
        ChartError::Config(format!("A {} chart needs a category column", kind))
    })
}

fn value_series(dataset: &Dataset, roles: &ColumnRoles) -> Result<Vec<Series>> {
    roles
        .values
        .iter()
        .map(|name| {
            Ok(Series {
                name: name.clone(),
                values: dataset.numeric_column(name)?,
            })
        })
        .collect()
}

fn render_error(err: anyhow::Error) -> ChartError {
    ChartError::Render(format!("{:#}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::row;
    use crate::error::ErrorKind;

    fn roles(category: Option<&str>, values: &[&str]) -> ColumnRoles {
        ColumnRoles {
            category: category.map(str::to_string),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    #[test]
    fn test_non_numeric_value_fails_before_drawing() {
        let data = Dataset::new(vec![
            row([("name", "a"), ("value", "1")]),
            row([("name", "b"), ("value", "lots")]),
        ]);
        let roles = roles(Some("name"), &["value"]);
        let options = RenderOptions::default();
        let spec = RenderSpec {
            kind: ChartKind::Bar,
            dataset: &data,
            roles: &roles,
            options: &options,
        };

        let err = render_chart(&spec).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot convert value 'lots' in column 'value' to a number"
        );
    }

    #[test]
    fn test_invalid_options_are_configuration_errors() {
        let data = Dataset::new(vec![row([("name", "a"), ("value", "1")])]);
        let roles = roles(Some("name"), &["value"]);
        let options = RenderOptions {
            dpi: 0,
            ..Default::default()
        };
        let spec = RenderSpec {
            kind: ChartKind::Bar,
            dataset: &data,
            roles: &roles,
            options: &options,
        };

        assert_eq!(render_chart(&spec).unwrap_err().kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_negative_pie_is_render_error() {
        let data = Dataset::new(vec![
            row([("name", "a"), ("value", "3")]),
            row([("name", "b"), ("value", "-1")]),
        ]);
        let roles = roles(Some("name"), &["value"]);
        let options = RenderOptions::default();
        let spec = RenderSpec {
            kind: ChartKind::Pie,
            dataset: &data,
            roles: &roles,
            options: &options,
        };

        let err = render_chart(&spec).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Render);
        assert!(err.to_string().contains("must not be negative"));
    }

    #[test]
    fn test_save_chart_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.png");
        std::fs::write(&path, b"old").unwrap();

        save_chart(b"new bytes", &path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"new bytes");
        // no temporary files left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_save_chart_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("chart.png");
        let err = save_chart(b"png", &path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Render);
        assert!(err.to_string().contains("Failed to save"));
    }
}
