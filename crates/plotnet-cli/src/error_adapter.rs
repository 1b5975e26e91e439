//! Error adapter for converting PlotnetError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI. Architecture parse
//! errors are rendered against their source with a labelled span; every other
//! error gets a diagnostic code naming the stage that failed.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, SourceSpan};

use plotnet::{ComposeError, PlotnetError};

/// Lines of compiler output repeated in the help text of a tool failure.
const TOOL_OUTPUT_TAIL: usize = 20;

/// Adapter for an architecture parse error.
///
/// This adapter wraps a [`toml::de::Error`] and the source it was raised for,
/// and implements [`MietteDiagnostic`] to point at the offending span.
pub struct ParseAdapter<'a> {
    /// The wrapped TOML error
    err: &'a toml::de::Error,
    /// Source code for displaying snippets
    src: &'a str,
}

impl<'a> ParseAdapter<'a> {
    /// Create a new parse error adapter.
    pub fn new(err: &'a toml::de::Error, src: &'a str) -> Self {
        Self { err, src }
    }
}

impl fmt::Debug for ParseAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseAdapter")
            .field("err", &self.err)
            .finish()
    }
}

impl fmt::Display for ParseAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.err.message())
    }
}

impl std::error::Error for ParseAdapter<'_> {}

impl MietteDiagnostic for ParseAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("plotnet::parse"))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(
            "every [[layer]] needs a `kind` and the fields of that kind",
        ))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.err.span()?;
        let span = SourceSpan::new(span.start.into(), span.len());
        Some(Box::new(std::iter::once(
            LabeledSpan::new_primary_with_span(Some("here".to_string()), span),
        )))
    }
}

/// Adapter for non-parse [`PlotnetError`] variants.
///
/// This adapter handles errors that don't carry source spans, such as I/O
/// errors, composition errors, configuration errors and compiler failures.
pub struct ErrorAdapter<'a>(pub &'a PlotnetError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            PlotnetError::Io(_) => "plotnet::io",
            PlotnetError::Compose(_) => "plotnet::compose",
            PlotnetError::Parse { .. } => "plotnet::parse",
            PlotnetError::Config(_) => "plotnet::config",
            PlotnetError::Tool { .. } => "plotnet::tool",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match &self.0 {
            PlotnetError::Compose(ComposeError::NameInference { .. }) => Some(Box::new(
                "give the layer an explicit `prev`, or `origin` to start a new chain",
            )),
            PlotnetError::Tool { output, .. } if !output.trim().is_empty() => Some(Box::new(
                format!("compiler output:\n{}", tail(output, TOOL_OUTPUT_TAIL)),
            )),
            _ => None,
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        None
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}

/// A reportable error that can be rendered by miette.
///
/// This enum wraps either a parse diagnostic or a non-diagnostic error,
/// providing a uniform interface for error rendering.
#[derive(Debug)]
pub enum Reportable<'a> {
    Parse(ParseAdapter<'a>),
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Parse(d) => fmt::Display::fmt(d, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Parse(d) => d.source(),
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Parse(d) => d.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Parse(d) => d.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Parse(d) => d.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Parse(d) => d.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

/// Returns the last `count` lines of `output`.
fn tail(output: &str, count: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}

/// Convert a [`PlotnetError`] into a list of reportable errors.
///
/// Every error currently maps to exactly one [`Reportable`].
pub fn to_reportables(err: &PlotnetError) -> Vec<Reportable<'_>> {
    match err {
        PlotnetError::Parse { err: parse_err, src } => {
            vec![Reportable::Parse(ParseAdapter::new(parse_err, src))]
        }
        _ => vec![Reportable::Error(ErrorAdapter(err))],
    }
}

#[cfg(test)]
mod tests {
    use plotnet::arch::Architecture;

    use super::*;

    fn parse_error(src: &str) -> PlotnetError {
        let err = toml::from_str::<Architecture>(src).unwrap_err();
        PlotnetError::new_parse_error(err, src)
    }

    #[test]
    fn test_parse_error_has_span() {
        let err = parse_error("[[layer]]\nkind = \"lstm\"\nname = \"lstm_1\"\n");

        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 1);

        match &reportables[0] {
            Reportable::Parse(d) => {
                assert!(d.to_string().contains("lstm"));
                assert_eq!(d.code().unwrap().to_string(), "plotnet::parse");
                assert!(d.source_code().is_some());
            }
            Reportable::Error(_) => panic!("Expected Parse"),
        }
    }

    #[test]
    fn test_syntax_error_is_labelled() {
        let err = parse_error("[[layer]\nkind = \"conv\"\n");
        let reportables = to_reportables(&err);
        let labels: Vec<_> = reportables[0].labels().unwrap().collect();
        assert_eq!(labels.len(), 1);
        assert!(labels[0].primary());
        assert!(labels[0].offset() < 10);
    }

    #[test]
    fn test_non_parse_error() {
        let err = PlotnetError::Config("bad palette".to_string());

        let reportables = to_reportables(&err);

        assert_eq!(reportables.len(), 1);
        match &reportables[0] {
            Reportable::Error(e) => {
                assert_eq!(e.to_string(), "Configuration error: bad palette");
                assert_eq!(e.code().unwrap().to_string(), "plotnet::config");
                assert!(e.labels().is_none());
            }
            Reportable::Parse(_) => panic!("Expected Error"),
        }
    }

    #[test]
    fn test_compose_error_code() {
        let err = PlotnetError::Compose(ComposeError::EmptyGroup {
            prefix: "enc".to_string(),
        });
        let reportables = to_reportables(&err);
        assert_eq!(
            reportables[0].code().unwrap().to_string(),
            "plotnet::compose"
        );
        assert!(reportables[0].to_string().contains("enc"));
    }

    #[cfg(unix)]
    #[test]
    fn test_tool_error_help_shows_output_tail() {
        use std::os::unix::process::ExitStatusExt;

        let output: String = (1..=30).map(|n| format!("line {n}\n")).collect();
        let err = PlotnetError::Tool {
            program: "pdflatex".to_string(),
            status: std::process::ExitStatus::from_raw(256),
            output,
        };

        let reportables = to_reportables(&err);
        let help = reportables[0].help().unwrap().to_string();
        assert!(help.contains("line 30"));
        assert!(help.contains("line 11"));
        assert!(!help.contains("line 10\n"));
        assert_eq!(reportables[0].code().unwrap().to_string(), "plotnet::tool");
    }

    #[test]
    fn test_name_inference_help() {
        let err = PlotnetError::Compose(ComposeError::NameInference {
            name: "stem".to_string(),
            reason: "missing `_<index>` suffix".to_string(),
        });
        let reportables = to_reportables(&err);
        assert!(reportables[0].help().unwrap().to_string().contains("prev"));
    }

    #[test]
    fn test_tail() {
        assert_eq!(tail("a\nb\nc", 2), "b\nc");
        assert_eq!(tail("a", 5), "a");
        assert_eq!(tail("", 5), "");
    }
}
