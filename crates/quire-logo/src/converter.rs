//! SVG converters and the ordered fallback chain.

use std::fs;
use std::path::Path;

use quire_proc::{Cmd, Runner};

/// Document format a converter reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Dvi,
    Pdf,
}

impl InputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Dvi => "dvi",
            Self::Pdf => "pdf",
        }
    }
}

/// A tool that renders a compiled LaTeX document to SVG.
pub trait SvgConverter: Send + Sync {
    /// Executable name, also used in reports.
    fn name(&self) -> &'static str;

    /// Format this converter consumes.
    fn input(&self) -> InputFormat;

    /// Whether to skip this converter when it is not on `PATH`.
    ///
    /// Converters that return `false` are always attempted; a missing binary
    /// then counts as a failed attempt.
    fn requires_presence(&self) -> bool {
        true
    }

    /// Command converting `input` to `output`, both relative to the assets dir.
    fn command(&self, input: &str, output: &str) -> Cmd;
}

/// `dvisvgm`, the primary DVI converter.
#[derive(Debug, Default)]
pub struct Dvisvgm;

impl SvgConverter for Dvisvgm {
    fn name(&self) -> &'static str {
        "dvisvgm"
    }

    fn input(&self) -> InputFormat {
        InputFormat::Dvi
    }

    fn requires_presence(&self) -> bool {
        false
    }

    fn command(&self, input: &str, output: &str) -> Cmd {
        Cmd::new(self.name()).args(["--no-fonts", "-o", output, input])
    }
}

/// `pdf2svg` fallback.
#[derive(Debug, Default)]
pub struct Pdf2svg;

impl SvgConverter for Pdf2svg {
    fn name(&self) -> &'static str {
        "pdf2svg"
    }

    fn input(&self) -> InputFormat {
        InputFormat::Pdf
    }

    fn command(&self, input: &str, output: &str) -> Cmd {
        Cmd::new(self.name()).args([input, output])
    }
}

/// Inkscape 1.x command-line export.
#[derive(Debug, Default)]
pub struct Inkscape;

impl SvgConverter for Inkscape {
    fn name(&self) -> &'static str {
        "inkscape"
    }

    fn input(&self) -> InputFormat {
        InputFormat::Pdf
    }

    fn command(&self, input: &str, output: &str) -> Cmd {
        Cmd::new(self.name())
            .arg(input)
            .arg("--export-type=svg")
            .arg(format!("--export-filename={output}"))
    }
}

/// Converters tried in order until one produces the SVG.
pub struct ConverterChain {
    converters: Vec<Box<dyn SvgConverter>>,
}

impl Default for ConverterChain {
    fn default() -> Self {
        Self::new(vec![
            Box::new(Dvisvgm),
            Box::new(Pdf2svg),
            Box::new(Inkscape),
        ])
    }
}

impl ConverterChain {
    /// Create a chain from converters in priority order.
    pub fn new(converters: Vec<Box<dyn SvgConverter>>) -> Self {
        Self { converters }
    }

    /// Converter names in priority order.
    pub fn names(&self) -> Vec<&'static str> {
        self.converters.iter().map(|c| c.name()).collect()
    }

    /// Render `<basename>.svg` in `dir`.
    ///
    /// Returns the name of the converter that succeeded, or `None` once the
    /// chain is exhausted. Failures never propagate.
    pub fn convert(&self, runner: &dyn Runner, dir: &Path, basename: &str) -> Option<&'static str> {
        let output = format!("{basename}.svg");
        let output_path = dir.join(&output);

        for converter in &self.converters {
            let name = converter.name();
            if converter.requires_presence() && !runner.is_available(name) {
                tracing::debug!("{} not installed, skipping", name);
                continue;
            }

            let input = format!("{}.{}", basename, converter.input().extension());
            if !dir.join(&input).exists() {
                tracing::debug!("{} skipped: {} missing", name, input);
                continue;
            }

            let cmd = converter.command(&input, &output).cwd(dir).capture(true);
            match runner.run(&cmd) {
                Ok(outcome) if outcome.success() && output_path.exists() => {
                    tracing::debug!("{} wrote {}", name, output_path.display());
                    return Some(name);
                }
                Ok(outcome) => {
                    tracing::info!("{} failed (exit {:?}), trying next converter", name, outcome.code);
                }
                Err(e) => {
                    tracing::info!("{}, trying next converter", e);
                }
            }

            // Partial output must not pass for a later converter's result.
            let _ = fs::remove_file(&output_path);
        }

        None
    }
}
