//! Diagnostic and error reporting utilities

use crate::Result;
use console::style;
use miette::{Diagnostic, NamedSource, SourceSpan};
use stratc_core::diagnostics::Diagnostic as Finding;
use thiserror::Error;

/// Set up enhanced error reporting with miette
pub fn setup_error_reporting() -> Result<()> {
    // Install miette as the global error handler
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .map_err(|e| crate::CliError::Config(format!("Failed to setup error reporting: {}", e)))?;

    Ok(())
}

/// A validation finding attached to its Python source, rendered through
/// miette so the offending line is shown in context.
#[derive(Error, Debug, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(stratc::validation))]
pub struct SourceFinding {
    message: String,

    #[source_code]
    src: NamedSource<String>,

    #[label("here")]
    span: Option<SourceSpan>,

    #[help]
    hint: Option<String>,
}

impl SourceFinding {
    /// Attaches a compiler finding to the source it came from.
    pub fn new(finding: &Finding, file_name: &str, source: &str) -> Self {
        Self {
            message: finding.message.clone(),
            src: NamedSource::new(file_name, source.to_string()),
            span: finding.line.map(|line| line_span(source, line)),
            hint: finding.hint.clone(),
        }
    }
}

/// Byte span of a 1-based line, for labeling findings in source snippets.
fn line_span(source: &str, line: u32) -> SourceSpan {
    let mut offset = 0usize;
    for (index, text) in source.lines().enumerate() {
        if index as u32 + 1 == line {
            return SourceSpan::new(offset.into(), text.len());
        }
        offset += text.len() + 1;
    }
    SourceSpan::new(0.into(), 0)
}

/// Pretty print a finding with full source context
pub fn print_finding(finding: &Finding, file_name: &str, source: &str) {
    let report = miette::Report::new(SourceFinding::new(finding, file_name, source));
    eprintln!("{:?}", report);
}

/// One-line console summary for a finding, used in batch output where the
/// full source context would be noise.
pub fn print_finding_summary(file_name: &str, finding: &Finding) {
    let marker = if finding.is_error() {
        style("✗").red()
    } else {
        style("⚠").yellow()
    };
    let location = match finding.line {
        Some(line) => format!("{}:{}", file_name, line),
        None => file_name.to_string(),
    };
    eprintln!("{} {}: {}", marker, style(location).bold(), finding.message);
    if let Some(hint) = &finding.hint {
        eprintln!("    {} {}", style("hint:").cyan(), hint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_line_span_covers_the_requested_line() {
        let source = "first\nsecond line\nthird\n";
        let span = line_span(source, 2);
        assert_eq!(span.offset(), 6);
        assert_eq!(span.len(), "second line".len());
    }

    #[test]
    fn test_line_span_out_of_range_is_empty() {
        let span = line_span("only\n", 9);
        assert_eq!(span.offset(), 0);
        assert_eq!(span.len(), 0);
    }

    #[test]
    fn test_source_finding_carries_hint() {
        let finding = Finding::error("Built-in function 'len()' is not supported")
            .with_line(1)
            .with_hint("Track a count explicitly");
        let rendered = SourceFinding::new(&finding, "s.py", "x = len(y)\n");
        assert_eq!(
            rendered.to_string(),
            "Built-in function 'len()' is not supported"
        );
        assert!(rendered.span.is_some());
        assert_eq!(rendered.hint.as_deref(), Some("Track a count explicitly"));
    }
}
