//! Render markdown explanations from a leaf disease classifier, and the
//! client that fetches them.

mod block;
mod client;
mod config;
mod error;
mod parser;
mod prediction;
mod text;
mod typst;

pub use block::{Block, Document, List, Span, Visitor};
pub use client::{ImageUpload, InferenceClient};
pub use config::{Config, EndpointConfig, ReportConfig, UploadConfig};
pub use error::{Error, Result};
pub use parser::{format_inline, render};
pub use prediction::{ERROR_LABEL, FAILURE_EXPLANATION, Prediction, Verdict};
pub use text::document_to_text;
pub use typst::{document_to_typst, report_to_typst};

use typst_as_lib::TypstEngine;
use typst_as_lib::typst_kit_options::TypstKitFontOptions;
use typst_library::layout::PagedDocument;
use typst_pdf::PdfOptions;

/// Convert markdown to Typst markup using default config.
pub fn markdown_to_typst(markdown: &str) -> String {
    markdown_to_typst_with_config(markdown, &Config::compiled_default())
}

/// Convert markdown to Typst markup with custom config.
pub fn markdown_to_typst_with_config(markdown: &str, config: &Config) -> String {
    document_to_typst(&render(markdown), &config.report)
}

/// Convert markdown to PDF bytes using default config.
pub fn markdown_to_pdf(markdown: &str) -> Result<Vec<u8>> {
    markdown_to_pdf_with_config(markdown, &Config::compiled_default())
}

/// Convert markdown to PDF bytes with custom config.
pub fn markdown_to_pdf_with_config(markdown: &str, config: &Config) -> Result<Vec<u8>> {
    typst_to_pdf(markdown_to_typst_with_config(markdown, config))
}

/// Compile a full analysis report to PDF bytes.
pub fn report_to_pdf(prediction: &Prediction, config: &Config) -> Result<Vec<u8>> {
    typst_to_pdf(report_to_typst(prediction, &config.report))
}

fn typst_to_pdf(typst_content: String) -> Result<Vec<u8>> {
    let font_options = TypstKitFontOptions::new()
        .include_embedded_fonts(true)
        .include_system_fonts(false);

    let engine = TypstEngine::builder()
        .main_file(typst_content)
        .search_fonts_with(font_options)
        .build();

    let doc: PagedDocument = engine
        .compile()
        .output
        .map_err(|e| Error::Typst(format!("{e:?}")))?;
    tracing::debug!(pages = doc.pages.len(), "compiled report");

    typst_pdf::pdf(&doc, &PdfOptions::default())
        .map_err(|e| Error::Typst(format!("PDF generation failed: {e:?}")))
}
