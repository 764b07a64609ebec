//! LaTeX logo asset pipeline.
//!
//! Compiles a LaTeX source to PDF and DVI, renders an SVG through an ordered
//! chain of converters, and removes compiler intermediates afterwards.

pub mod cleanup;
pub mod converter;
pub mod latex;
pub mod pipeline;

pub use cleanup::{
    remove_intermediates, remove_outputs, sweep_intermediates, INTERMEDIATE_EXTENSIONS,
    OUTPUT_EXTENSIONS,
};
pub use converter::{ConverterChain, Dvisvgm, Inkscape, InputFormat, Pdf2svg, SvgConverter};
pub use latex::{extract_errors, Engine};
pub use pipeline::{LogoError, LogoJob, LogoPipeline, LogoReport, PdfOnlyReason, SvgOutcome};
