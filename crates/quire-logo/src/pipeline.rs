//! The logo build: LaTeX → PDF, LaTeX → DVI → SVG, then cleanup.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use quire_proc::Runner;

use crate::cleanup::{remove_intermediates, remove_outputs};
use crate::converter::ConverterChain;
use crate::latex::{extract_errors, Engine};

/// A logo to build from a LaTeX source in the assets directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoJob {
    /// Name used on the command line and in reports
    pub name: String,

    /// LaTeX source file name, relative to the assets directory
    pub source: String,

    /// Basename of the produced `.pdf` / `.svg`
    pub basename: String,
}

impl LogoJob {
    /// Create a job whose outputs are named after the source file stem.
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        let basename = Path::new(&source)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("logo")
            .to_string();

        Self {
            name: name.into(),
            source,
            basename,
        }
    }

    /// Override the output basename.
    pub fn with_basename(mut self, basename: impl Into<String>) -> Self {
        self.basename = basename.into();
        self
    }
}

/// Why no SVG was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfOnlyReason {
    /// `latex` did not produce a DVI file, conversion was skipped
    NoDvi,

    /// Every converter failed or was unavailable
    ConvertersExhausted,
}

impl fmt::Display for PdfOnlyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDvi => write!(f, "no DVI file was produced"),
            Self::ConvertersExhausted => write!(f, "no SVG converter succeeded"),
        }
    }
}

/// What happened to the SVG rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SvgOutcome {
    Converted {
        path: PathBuf,
        converter: &'static str,
    },
    PdfOnly {
        reason: PdfOnlyReason,
    },
}

/// Result of building one logo.
#[derive(Debug)]
pub struct LogoReport {
    /// Job name
    pub job: String,

    /// Path of the produced PDF
    pub pdf: PathBuf,

    /// SVG outcome
    pub svg: SvgOutcome,

    /// Intermediates removed after the build
    pub removed: Vec<PathBuf>,
}

/// Errors that stop a logo build.
#[derive(Debug, thiserror::Error)]
pub enum LogoError {
    #[error("Assets directory not found: {0}")]
    AssetsDirMissing(PathBuf),

    #[error("LaTeX source not found: {0}")]
    SourceMissing(PathBuf),

    #[error("pdflatex produced no PDF for {file}{detail}")]
    PdfMissing { file: String, detail: String },
}

/// Builds logo jobs inside an assets directory.
pub struct LogoPipeline<'a> {
    runner: &'a dyn Runner,
    assets_dir: PathBuf,
    converters: ConverterChain,
}

impl<'a> LogoPipeline<'a> {
    /// Create a pipeline with the default converter chain.
    pub fn new(runner: &'a dyn Runner, assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            assets_dir: assets_dir.into(),
            converters: ConverterChain::default(),
        }
    }

    /// Replace the converter chain.
    pub fn with_converters(mut self, converters: ConverterChain) -> Self {
        self.converters = converters;
        self
    }

    /// Build one logo.
    ///
    /// Outputs of an earlier run are deleted first, so success means this run
    /// produced the PDF. A missing SVG is reported through
    /// [`SvgOutcome::PdfOnly`] and a warning. Intermediates are removed on
    /// every path past the input checks.
    pub fn build(&self, job: &LogoJob) -> Result<LogoReport, LogoError> {
        let dir = &self.assets_dir;
        if !dir.is_dir() {
            return Err(LogoError::AssetsDirMissing(dir.clone()));
        }

        let source = dir.join(&job.source);
        if !source.is_file() {
            return Err(LogoError::SourceMissing(source));
        }

        tracing::info!("Building {} from {}", job.name, source.display());

        for stale in remove_outputs(dir, &job.basename) {
            tracing::debug!("Removed previous {}", stale.display());
        }

        self.compile(Engine::PdfLatex, job);
        self.compile(Engine::Latex, job);

        let pdf = dir.join(format!("{}.pdf", job.basename));
        let dvi = dir.join(format!("{}.dvi", job.basename));

        let svg = if dvi.exists() {
            match self.converters.convert(self.runner, dir, &job.basename) {
                Some(converter) => SvgOutcome::Converted {
                    path: dir.join(format!("{}.svg", job.basename)),
                    converter,
                },
                None => SvgOutcome::PdfOnly {
                    reason: PdfOnlyReason::ConvertersExhausted,
                },
            }
        } else {
            SvgOutcome::PdfOnly {
                reason: PdfOnlyReason::NoDvi,
            }
        };

        // The log goes away with the other intermediates.
        let errors = if pdf.exists() {
            Vec::new()
        } else {
            self.log_errors(&job.basename)
        };

        let removed = remove_intermediates(dir, &job.basename);
        tracing::debug!("Removed {} intermediate files", removed.len());

        if !pdf.exists() {
            let detail = if errors.is_empty() {
                String::new()
            } else {
                format!(": {}", errors.join("; "))
            };
            return Err(LogoError::PdfMissing {
                file: job.source.clone(),
                detail,
            });
        }

        match &svg {
            SvgOutcome::Converted { path, converter } => {
                tracing::info!("Wrote {} and {} ({})", pdf.display(), path.display(), converter);
            }
            SvgOutcome::PdfOnly { reason } => {
                tracing::warn!(
                    "{}: {}, only {} is available",
                    job.name,
                    reason,
                    pdf.display()
                );
            }
        }

        Ok(LogoReport {
            job: job.name.clone(),
            pdf,
            svg,
            removed,
        })
    }

    /// Run one LaTeX engine. Failures are logged, never returned.
    fn compile(&self, engine: Engine, job: &LogoJob) {
        let cmd = engine.command(&job.source).cwd(&self.assets_dir);

        match self.runner.run(&cmd) {
            Ok(outcome) => {
                if !outcome.stdout.is_empty() {
                    tracing::debug!("{} output:\n{}", engine.program(), outcome.stdout.trim_end());
                }
                if !outcome.success() {
                    tracing::warn!(
                        "{} exited with {:?} on {}",
                        engine.program(),
                        outcome.code,
                        job.source
                    );
                }
            }
            Err(e) => tracing::warn!("{}", e),
        }

        let output = self
            .assets_dir
            .join(format!("{}.{}", job.basename, engine.output_extension()));
        if !output.exists() {
            tracing::debug!("{} did not produce {}", engine.program(), output.display());
        }
    }

    fn log_errors(&self, basename: &str) -> Vec<String> {
        let log = self.assets_dir.join(format!("{basename}.log"));
        fs::read_to_string(log)
            .map(|content| extract_errors(&content))
            .unwrap_or_default()
    }
}
