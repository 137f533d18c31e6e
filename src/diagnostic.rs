use std::fmt;

use crate::span::Span;

/// Category of a construction or evaluation failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    /// An operand failed its taint/kind contract.
    Type,
    /// Operands whose textual adjacency the environment would misread.
    Syntax,
    /// Lookup of a value that was never registered.
    CacheMiss,
    /// An operator outside the modeled subset.
    Unimplemented,
    /// The evaluator rejected or failed to run a fragment's text.
    Evaluation,
    /// Configuration could not be read or understood.
    Config,
}

impl ViolationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ViolationKind::Type => "type violation",
            ViolationKind::Syntax => "syntactic incompatibility",
            ViolationKind::CacheMiss => "cache miss",
            ViolationKind::Unimplemented => "unimplemented operator",
            ViolationKind::Evaluation => "evaluation failure",
            ViolationKind::Config => "configuration error",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed construction, lookup, or evaluation.
///
/// Shaped like a compiler diagnostic: the message is always present, and
/// when the failure can be pinned to a place in some fragment text the
/// violation carries that text and a span into it.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct Violation {
    pub kind: ViolationKind,
    pub message: String,
    pub span: Option<Span>,
    pub source_text: Option<String>,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

impl Violation {
    pub fn new(kind: ViolationKind, message: String) -> Self {
        Self {
            kind,
            message,
            span: None,
            source_text: None,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn type_error(message: String) -> Self {
        Self::new(ViolationKind::Type, message)
    }

    pub fn syntax(message: String) -> Self {
        Self::new(ViolationKind::Syntax, message)
    }

    pub fn cache_miss(key: impl fmt::Display) -> Self {
        Self::new(ViolationKind::CacheMiss, format!("{} not found", key))
    }

    pub fn unimplemented(operator: &str) -> Self {
        Self::new(
            ViolationKind::Unimplemented,
            format!("operator '{}' is not implemented", operator),
        )
    }

    pub fn evaluation(message: String) -> Self {
        Self::new(ViolationKind::Evaluation, message)
    }

    pub fn config(message: String) -> Self {
        Self::new(ViolationKind::Config, message)
    }

    /// Attach the text the violation refers to and a span inside it.
    pub fn at(mut self, text: impl Into<String>, span: Span) -> Self {
        self.source_text = Some(text.into());
        self.span = Some(span);
        self
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }

    pub fn with_help(mut self, help: String) -> Self {
        self.help = Some(help);
        self
    }

    pub fn is(&self, kind: ViolationKind) -> bool {
        self.kind == kind
    }

    /// Render the violation to stderr using ariadne.
    pub fn render(&self, filename: &str) {
        let Some(report) = self.build_report(filename, true) else {
            eprintln!("error: {}", self);
            return;
        };
        let source = self.source_text.as_deref().unwrap_or("");
        let _ = report.eprint((filename, ariadne::Source::from(source)));
    }

    /// Render the violation to a colourless string.
    pub fn report(&self, filename: &str) -> String {
        let Some(report) = self.build_report(filename, false) else {
            let mut out = format!("error: {}\n", self);
            for note in &self.notes {
                out.push_str(&format!("note: {}\n", note));
            }
            if let Some(help) = &self.help {
                out.push_str(&format!("help: {}\n", help));
            }
            return out;
        };
        let source = self.source_text.as_deref().unwrap_or("");
        let mut buf = Vec::new();
        if report
            .write((filename, ariadne::Source::from(source)), &mut buf)
            .is_err()
        {
            return format!("error: {}\n", self);
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn build_report<'a>(
        &self,
        filename: &'a str,
        color: bool,
    ) -> Option<ariadne::Report<'a, (&'a str, std::ops::Range<usize>)>> {
        use ariadne::{Color, Config, Label, Report, ReportKind};

        let span = self.span?;
        self.source_text.as_ref()?;

        let mut report = Report::build(ReportKind::Error, filename, span.start as usize)
            .with_config(Config::default().with_color(color))
            .with_message(format!("{}: {}", self.kind, self.message))
            .with_label(
                Label::new((filename, span.range()))
                    .with_message(&self.message)
                    .with_color(Color::Red),
            );

        for note in &self.notes {
            report = report.with_note(note);
        }

        if let Some(help) = &self.help {
            report = report.with_help(help);
        }

        Some(report.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind() {
        let v = Violation::cache_miss("<String/'q'>");
        assert_eq!(v.to_string(), "cache miss: <String/'q'> not found");
        assert!(v.is(ViolationKind::CacheMiss));
    }

    #[test]
    fn test_report_without_span_lists_notes() {
        let v = Violation::unimplemented("+=")
            .with_note("compound assignment needs type tracking".to_string());
        let out = v.report("fragment");
        assert!(out.contains("operator '+=' is not implemented"));
        assert!(out.contains("note: compound assignment"));
    }

    #[test]
    fn test_report_with_span_points_into_text() {
        let v = Violation::syntax("'+' directly after the join point".to_string())
            .at("[]++[]", Span::new(2, 4));
        let out = v.report("join");
        assert!(out.contains("join"), "report: {out}");
        assert!(out.contains("[]++[]"), "report: {out}");
    }
}
