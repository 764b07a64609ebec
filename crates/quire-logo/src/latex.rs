//! LaTeX compiler invocations and log scanning.

use std::sync::OnceLock;

use quire_proc::Cmd;
use regex::Regex;

/// Maximum number of error lines carried out of a `.log` file.
const MAX_ERRORS: usize = 5;

/// A LaTeX engine run in non-interactive mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    /// `pdflatex`, produces `<basename>.pdf`
    PdfLatex,

    /// `latex`, produces `<basename>.dvi`
    Latex,
}

impl Engine {
    /// Executable name.
    pub fn program(self) -> &'static str {
        match self {
            Self::PdfLatex => "pdflatex",
            Self::Latex => "latex",
        }
    }

    /// Extension of the document this engine writes.
    pub fn output_extension(self) -> &'static str {
        match self {
            Self::PdfLatex => "pdf",
            Self::Latex => "dvi",
        }
    }

    /// Command compiling `source` without stopping on errors.
    pub fn command(self, source: &str) -> Cmd {
        Cmd::new(self.program())
            .arg("-interaction=nonstopmode")
            .arg(source)
            .capture(true)
    }
}

/// Pull the `! ...` error lines out of a LaTeX log.
pub fn extract_errors(log: &str) -> Vec<String> {
    static ERROR_LINE: OnceLock<Regex> = OnceLock::new();
    let re = ERROR_LINE.get_or_init(|| Regex::new(r"(?m)^! (.+?)\s*$").unwrap());

    re.captures_iter(log)
        .map(|cap| cap[1].to_string())
        .take(MAX_ERRORS)
        .collect()
}
