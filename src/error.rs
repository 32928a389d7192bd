use thiserror::Error;

/// Failures raised while turning report text into results.
///
/// Only input that cannot be read as the expected document ends up here;
/// missing targets and odd attribute values are handled in-band.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("document has no root element")]
    Empty,
    #[error("element <{0}> is never closed")]
    Unclosed(String),
    #[error("expected <{expected}> as root element, found <{found}>")]
    UnexpectedRoot {
        expected: &'static str,
        found: String,
    },
}
