//! Validation findings and the report that collects them
//!
//! Every rule check writes [`Finding`]s into a [`Report`]. A finding carries a
//! severity, a short code, a message and optionally a category `key` used for
//! "N occurrences of X" summaries. Its position in the source, if any, is
//! captured when the finding is built and does not change afterwards.

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Code recorded in place of a finding that was added without its required fields
pub const MALFORMED_FINDING_CODE: &str = "APP000";

/// How serious a finding is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// A rule check was used incorrectly; the document may be fine
    ApplicationError,
    /// A violation of a DVB-I rule
    Error,
    /// Discouraged, deprecated or advisory
    Warning,
    /// Descriptive, non-blocking
    Information,
}

impl Severity {
    /// All severities, most serious first
    pub const ALL: [Severity; 4] = [
        Severity::ApplicationError,
        Severity::Error,
        Severity::Warning,
        Severity::Information,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::ApplicationError => "application error",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Information => "information",
        };
        f.write_str(label)
    }
}

/// A position in the validated source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceRef {
    /// 1-based line number
    pub line: u32,
    /// Start tag of the element concerned
    pub fragment: String,
}

impl SourceRef {
    /// Create a source reference
    pub fn new(line: u32, fragment: impl Into<String>) -> Self {
        Self {
            line,
            fragment: fragment.into(),
        }
    }
}

/// Where in the document a finding applies
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "shape", content = "at", rename_all = "lowercase")]
pub enum FindingLocation {
    /// The document as a whole
    Document,
    /// One element
    Single(SourceRef),
    /// Several elements reported under one message
    Multiple(Vec<SourceRef>),
}

/// A single result of a rule check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// Severity
    pub severity: Severity,
    /// Short code identifying the check
    pub code: String,
    /// Human readable message
    pub message: String,
    /// Category used for aggregate counts
    pub key: Option<String>,
    /// Position(s) in the source
    pub location: FindingLocation,
}

impl Finding {
    /// Create a document-level finding
    pub fn new(severity: Severity, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: code.into(),
            message: message.into(),
            key: None,
            location: FindingLocation::Document,
        }
    }

    /// Create an error
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    /// Create a warning
    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    /// Create an informational finding
    pub fn information(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Information, code, message)
    }

    /// Create an application error
    pub fn application(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::ApplicationError, code, message)
    }

    /// Set the category key
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Attach the finding to one element
    pub fn at(mut self, source: SourceRef) -> Self {
        self.location = FindingLocation::Single(source);
        self
    }

    /// Attach the finding to several elements
    pub fn at_all(mut self, sources: Vec<SourceRef>) -> Self {
        self.location = match sources.len() {
            0 => FindingLocation::Document,
            _ => FindingLocation::Multiple(sources),
        };
        self
    }

    /// Lines this finding refers to
    pub fn lines(&self) -> Vec<u32> {
        match &self.location {
            FindingLocation::Document => Vec::new(),
            FindingLocation::Single(s) => vec![s.line],
            FindingLocation::Multiple(all) => all.iter().map(|s| s.line).collect(),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.severity, self.code, self.message)?;
        let lines = self.lines();
        if !lines.is_empty() {
            let lines: Vec<String> = lines.iter().map(u32::to_string).collect();
            write!(f, " (line {})", lines.join(", "))?;
        }
        Ok(())
    }
}

/// Totals for one severity
#[derive(Debug, Clone, Default, Serialize)]
pub struct SeverityCounts {
    /// Number of findings
    pub total: usize,
    /// Findings per category key, in order of first appearance
    pub by_key: IndexMap<String, usize>,
}

/// A note attached to one line of the annotated source
#[derive(Debug, Clone, Serialize)]
pub struct LineNote {
    /// Severity of the finding
    pub severity: Severity,
    /// Code of the finding
    pub code: String,
    /// Message of the finding
    pub message: String,
}

/// One line of the source with the findings that point at it
#[derive(Debug, Clone, Serialize)]
pub struct MarkedLine {
    /// 1-based line number
    pub number: u32,
    /// Source text of the line
    pub text: String,
    /// Findings on this line
    pub notes: Vec<LineNote>,
}

impl MarkedLine {
    /// Render the line as an HTML fragment
    pub fn to_html(&self) -> String {
        let mut html = format!(
            "<span class=\"line\" id=\"L{}\">{}</span>",
            self.number,
            quick_xml::escape::escape(self.text.as_str())
        );
        for note in &self.notes {
            html.push_str(&format!(
                "<span class=\"{}\">{}: {}</span>",
                match note.severity {
                    Severity::ApplicationError | Severity::Error => "error",
                    Severity::Warning => "warning",
                    Severity::Information => "info",
                },
                quick_xml::escape::escape(note.code.as_str()),
                quick_xml::escape::escape(note.message.as_str())
            ));
        }
        html
    }
}

/// Accumulated findings of one validation run
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    findings: Vec<Finding>,
    counts: [SeverityCounts; 4],
    descriptions: IndexMap<String, String>,
}

impl Report {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finding
    ///
    /// A finding with an empty code or message is replaced by an application
    /// error that describes the faulty call.
    pub fn add(&mut self, finding: Finding) {
        if finding.code.trim().is_empty() || finding.message.trim().is_empty() {
            let meta = Finding::application(
                MALFORMED_FINDING_CODE,
                format!(
                    "finding added without {}: {:?}",
                    if finding.code.trim().is_empty() { "a code" } else { "a message" },
                    finding
                ),
            )
            .with_key("malformed finding");
            self.push(meta);
            return;
        }
        self.push(finding);
    }

    fn push(&mut self, finding: Finding) {
        let counts = &mut self.counts[finding.severity.index()];
        counts.total += 1;
        if let Some(ref key) = finding.key {
            *counts.by_key.entry(key.clone()).or_insert(0) += 1;
        }
        self.findings.push(finding);
    }

    /// Attach long-form text to a code, merging with any existing description
    pub fn describe_code(&mut self, code: impl Into<String>, description: impl Into<String>) {
        let description = description.into();
        let entry = self.descriptions.entry(code.into()).or_default();
        if entry.is_empty() {
            *entry = description;
        } else if !entry.contains(&description) {
            entry.push('\n');
            entry.push_str(&description);
        }
    }

    /// The description attached to a code
    pub fn description(&self, code: &str) -> Option<&str> {
        self.descriptions.get(code).map(String::as_str)
    }

    /// All findings in the order they were added
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Findings of one severity
    pub fn of_severity(&self, severity: Severity) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.severity == severity)
    }

    /// Errors
    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.of_severity(Severity::Error)
    }

    /// Warnings
    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.of_severity(Severity::Warning)
    }

    /// Informational findings
    pub fn informationals(&self) -> impl Iterator<Item = &Finding> {
        self.of_severity(Severity::Information)
    }

    /// Totals for one severity
    pub fn counts(&self, severity: Severity) -> &SeverityCounts {
        &self.counts[severity.index()]
    }

    /// Number of findings of `severity` recorded under `key`
    pub fn key_count(&self, severity: Severity, key: &str) -> usize {
        self.counts(severity).by_key.get(key).copied().unwrap_or(0)
    }

    /// Number of errors
    pub fn error_count(&self) -> usize {
        self.counts(Severity::Error).total
    }

    /// Number of warnings
    pub fn warning_count(&self) -> usize {
        self.counts(Severity::Warning).total
    }

    /// Number of informational findings
    pub fn information_count(&self) -> usize {
        self.counts(Severity::Information).total
    }

    /// Number of application errors
    pub fn application_error_count(&self) -> usize {
        self.counts(Severity::ApplicationError).total
    }

    /// Number of findings with the given code
    pub fn code_count(&self, code: &str) -> usize {
        self.findings.iter().filter(|f| f.code == code).count()
    }

    /// Whether any finding has the given code
    pub fn has_code(&self, code: &str) -> bool {
        self.findings.iter().any(|f| f.code == code)
    }

    /// True when there are no errors of any kind
    pub fn is_valid(&self) -> bool {
        self.error_count() == 0 && self.application_error_count() == 0
    }

    /// Move every finding of `other` into this report
    pub fn merge(&mut self, other: Report) {
        for finding in other.findings {
            self.push(finding);
        }
        for (code, description) in other.descriptions {
            self.describe_code(code, description);
        }
    }

    /// The source split into lines, each with the findings that point at it
    pub fn markup(&self, source: &str) -> Vec<MarkedLine> {
        let mut lines: Vec<MarkedLine> = source
            .lines()
            .enumerate()
            .map(|(i, text)| MarkedLine {
                number: i as u32 + 1,
                text: text.to_string(),
                notes: Vec::new(),
            })
            .collect();

        for finding in &self.findings {
            for line in finding.lines() {
                if let Some(marked) = line
                    .checked_sub(1)
                    .and_then(|i| lines.get_mut(i as usize))
                {
                    marked.notes.push(LineNote {
                        severity: finding.severity,
                        code: finding.code.clone(),
                        message: finding.message.clone(),
                    });
                }
            }
        }
        lines
    }
}
