//! Terminal diagnostics.
//!
//! A [`Diagnostic`] names what went wrong, lists the rules or values involved
//! as context lines, and ends with numbered suggestions:
//!
//! ```text
//! error: `kokkos` cannot be built as specified
//!   --> demos/specs/kokkos-cuda-std20.toml
//!   - conflict `+cuda std=20`: kokkos: conflicts with '+cuda std=20'
//!
//! help: consider:
//!   1. Change the variants named above, ...
//! ```

use std::fmt::{self, Write};
use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// A spec trips a conflict.
    pub const CHANGE_VARIANTS: &str =
        "Change the variants named above, or run `spackle variants --recipe <file>` to see the options";

    /// A conditional dependency is missing.
    pub const ADD_DEPENDENCY: &str = "Add the dependency to the spec's [dependencies] table";

    /// A variant name or value is rejected.
    pub const LIST_VARIANTS: &str = "Run `spackle variants --recipe <file>` to list variants and legal values";

    pub const UNSUPPORTED_ACCELERATOR: &str = "Pick one of the supported accelerator targets listed above";

    pub const MISSING_TOOL: &str = "Record the dependency's `prefix` or `tools` entry in the spec";

    pub const RECIPE_NOT_FOUND: &str =
        "Pass `--recipe <file>` or add its directory to [recipes] paths in .spackle/config.toml";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    fn label(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }

    /// Bold ANSI color for the label.
    fn ansi(self) -> &'static str {
        match self {
            Severity::Error => "1;31",
            Severity::Warning => "1;33",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A message for the terminal with context lines and suggested fixes.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// Stable error code (`spackle::variant::unknown`), if any
    pub code: Option<String>,
    pub location: Option<PathBuf>,
    pub context: Vec<String>,
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            severity,
            message: message.into(),
            code: None,
            location: None,
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// An error diagnostic carrying a typed error's message, code and help.
    pub fn from_error(err: &dyn MietteDiagnostic) -> Self {
        let mut diag = Self::error(err.to_string());
        diag.code = err.code().map(|c| c.to_string());
        if let Some(help) = err.help() {
            diag.context.push(help.to_string());
        }
        diag
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// The file the diagnostic is about.
    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Render for the terminal, with ANSI colors when `color` is set.
    pub fn format(&self, color: bool) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.render(&mut out, color);
        out
    }

    fn render(&self, out: &mut String, color: bool) -> fmt::Result {
        let paint = |text: &str, ansi: &str| {
            if color {
                format!("\x1b[{}m{}\x1b[0m", ansi, text)
            } else {
                text.to_string()
            }
        };

        let head = match &self.code {
            Some(code) => format!("{}[{}]", self.severity.label(), code),
            None => self.severity.label().to_string(),
        };
        writeln!(out, "{}: {}", paint(&head, self.severity.ansi()), self.message)?;

        if let Some(path) = &self.location {
            writeln!(out, "  --> {}", path.display())?;
        }
        for line in &self.context {
            writeln!(out, "  - {}", line)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(out)?;
            writeln!(out, "{}: consider:", paint("help", "1;32"))?;
            for (n, suggestion) in self.suggestions.iter().enumerate() {
                writeln!(out, "  {}. {}", n + 1, suggestion)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}
