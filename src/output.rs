//! Formatting the response printed after a chart is saved

use crate::error::Result;
use clap::ValueEnum;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};

/// What gets printed on stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Absolute path of the image
    #[default]
    Path,
    /// ![alt](path)
    Markdown,
    /// <img src="path" alt="...">
    Html,
    /// {"path": ..., "alt": ...}
    Json,
    /// Just the alt text
    Alt,
}

#[derive(Serialize)]
struct ImageRef<'a> {
    path: &'a str,
    alt: &'a str,
}

/// Build the response for a saved chart
pub fn format_output(path: &Path, format: OutputFormat, alt: &str) -> Result<String> {
    let path = path.to_string_lossy();
    let response = match format {
        OutputFormat::Path => path.into_owned(),
        OutputFormat::Markdown => format!("![{}]({})", alt, path),
        OutputFormat::Html => format!("<img src=\"{}\" alt=\"{}\">", path, escape_html(alt)),
        OutputFormat::Json => serde_json::to_string(&ImageRef { path: &path, alt })?,
        OutputFormat::Alt => alt.to_string(),
    };
    Ok(response)
}

/// Escape text for use inside a double-quoted HTML attribute
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Absolute output path, relative to the current directory.
///
/// Without an explicit path the first free name of `chart.png`,
/// `chart-2.png`, `chart-3.png`, ... is used.
pub fn resolve_output_path(explicit: Option<&Path>) -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(resolve_output_path_in(&cwd, explicit))
}

pub fn resolve_output_path_in(dir: &Path, explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return normalize(&dir.join(path));
    }

    let mut candidate = dir.join("chart.png");
    let mut counter = 2;
    while candidate.exists() {
        candidate = dir.join(format!("chart-{}.png", counter));
        counter += 1;
    }
    normalize(&candidate)
}

/// Lexically drop `.` and fold `..` components
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(OutputFormat::Path, "/tmp/chart.png")]
    #[case(OutputFormat::Markdown, "![Bar chart of value](/tmp/chart.png)")]
    #[case(OutputFormat::Html, "<img src=\"/tmp/chart.png\" alt=\"Bar chart of value\">")]
    #[case(OutputFormat::Json, r#"{"path":"/tmp/chart.png","alt":"Bar chart of value"}"#)]
    #[case(OutputFormat::Alt, "Bar chart of value")]
    fn test_format_output(#[case] format: OutputFormat, #[case] expected: &str) {
        let out = format_output(Path::new("/tmp/chart.png"), format, "Bar chart of value").unwrap();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_html_escapes_alt() {
        let out = format_output(Path::new("c.png"), OutputFormat::Html, r#"a < b & "c" 'd' > e"#).unwrap();
        assert_eq!(
            out,
            "<img src=\"c.png\" alt=\"a &lt; b &amp; &quot;c&quot; &#x27;d&#x27; &gt; e\">"
        );
    }

    #[test]
    fn test_json_escapes_quotes() {
        let out = format_output(Path::new("c.png"), OutputFormat::Json, "say \"hi\"").unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["alt"], "say \"hi\"");
        assert_eq!(parsed["path"], "c.png");
    }

    #[test]
    fn test_auto_increment() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve_output_path_in(dir.path(), None), dir.path().join("chart.png"));

        std::fs::write(dir.path().join("chart.png"), b"").unwrap();
        assert_eq!(resolve_output_path_in(dir.path(), None), dir.path().join("chart-2.png"));

        std::fs::write(dir.path().join("chart-2.png"), b"").unwrap();
        assert_eq!(resolve_output_path_in(dir.path(), None), dir.path().join("chart-3.png"));
    }

    #[test]
    fn test_explicit_path_is_absolute() {
        let base = Path::new("/work/data");
        assert_eq!(
            resolve_output_path_in(base, Some(Path::new("./out/sales.png"))),
            PathBuf::from("/work/data/out/sales.png")
        );
        assert_eq!(
            resolve_output_path_in(base, Some(Path::new("../sales.png"))),
            PathBuf::from("/work/sales.png")
        );
        assert_eq!(
            resolve_output_path_in(base, Some(Path::new("/elsewhere/x.png"))),
            PathBuf::from("/elsewhere/x.png")
        );
    }
}
