//! Error rendering using ariadne
//!
//! Syntax errors are rendered with a source snippet and a label under the
//! offending text. Every other error is rendered as its message.

use crate::Error;
use ariadne::{ColorGenerator, IndexType, Label, Report, ReportKind, Source};
use calcjit_core::SyntaxError;
use std::io::Write;

/// Character set for rendering error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharSet {
    /// Use Unicode characters for rich visual output.
    #[default]
    Unicode,
    /// Use ASCII-only characters for compatibility.
    Ascii,
}

/// Configuration for error rendering.
#[derive(Debug, Clone)]
pub struct RenderConfig<'a> {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
    /// The name shown for the formula in the report header.
    /// Defaults to "<formula>" if not provided.
    pub filename: Option<&'a str>,
    pub charset: CharSet,
}

impl Default for RenderConfig<'_> {
    fn default() -> Self {
        RenderConfig::default()
    }
}

impl RenderConfig<'_> {
    const fn default() -> Self {
        Self {
            color: true,
            filename: None,
            charset: CharSet::Unicode,
        }
    }
}

/// Render an error to stderr using the default config.
///
/// # Example
/// ```no_run
/// use calcjit::{CalcContext, render_error};
///
/// let context = CalcContext::new();
/// if let Err(e) = context.validate("2 + ") {
///     render_error(&e);
/// }
/// ```
pub fn render_error(error: &Error) {
    render_error_to(error, &mut std::io::stderr(), &RenderConfig::default()).ok();
}

/// Render an error to a writer with the given configuration.
///
/// # Example
/// ```
/// use calcjit::{CalcContext, RenderConfig, render_error_to};
///
/// let context = CalcContext::new();
/// let error = context.validate("2 + ").unwrap_err();
///
/// let mut buf = Vec::new();
/// let config = RenderConfig { color: false, ..Default::default() };
/// render_error_to(&error, &mut buf, &config).unwrap();
/// assert!(String::from_utf8_lossy(&buf).contains("operand expected after '+'"));
/// ```
pub fn render_error_to(
    error: &Error,
    writer: &mut dyn Write,
    config: &RenderConfig,
) -> std::io::Result<()> {
    let filename = config.filename.unwrap_or("<formula>");

    match error {
        Error::Syntax(syntax) => render_syntax(syntax, writer, config, filename),
        other => writeln!(writer, "Error: {other}"),
    }
}

fn render_syntax(
    error: &SyntaxError,
    writer: &mut dyn Write,
    config: &RenderConfig,
    filename: &str,
) -> std::io::Result<()> {
    let mut colors = ColorGenerator::new();
    colors.next(); // Skip the first color.

    let ariadne_charset = match config.charset {
        CharSet::Unicode => ariadne::CharSet::Unicode,
        CharSet::Ascii => ariadne::CharSet::Ascii,
    };
    let ariadne_config = ariadne::Config::default()
        .with_color(config.color)
        .with_char_set(ariadne_charset)
        .with_index_type(IndexType::Byte);

    let message = error.message();
    let span = error.span.0.clone();
    Report::build(ReportKind::Error, (filename, span.clone()))
        .with_message(&message)
        .with_config(ariadne_config)
        .with_label(
            Label::new((filename, span))
                .with_message(&message)
                .with_color(colors.next()),
        )
        .finish()
        .write((filename, Source::from(error.input.as_str())), &mut *writer)
}
