//! Source metadata threaded through the core.
//!
//! The core neither parses nor formats source. The elaborator attaches an
//! opaque span to every term it hands over, and the core's only obligation
//! is to return that span on the diagnostics it raises. Terms the core
//! mints itself, during read-back or superposition merging, carry no span.

pub mod core;

/// An opaque handle into elaborator-tracked source.
#[derive(Debug, Copy, Clone)]
pub enum Span {
    /// Produced by the core itself; there is nothing to point at.
    Synthetic,
    /// A byte range in a file tracked by the elaborator.
    Bytes {
        file: usize,
        start: usize,
        end: usize,
    },
}

impl Span {
    pub fn bytes(file: usize, range: std::ops::Range<usize>) -> Span {
        Span::Bytes {
            file,
            start: range.start,
            end: range.end,
        }
    }

    /// The file and byte range to label in a diagnostic, if this span has
    /// source behind it.
    pub fn label_parts(self) -> Option<(usize, std::ops::Range<usize>)> {
        match self {
            Span::Synthetic => None,
            Span::Bytes { file, start, end } => Some((file, start..end)),
        }
    }
}

/// A piece of syntax together with its span.
#[derive(Debug, Clone)]
pub struct Spanned<Data> {
    pub span: Span,
    pub data: Data,
}

impl<Data> Spanned<Data> {
    pub fn new(span: Span, data: Data) -> Spanned<Data> {
        Spanned { span, data }
    }

    /// Wrap data the core minted itself.
    pub fn synthetic(data: Data) -> Spanned<Data> {
        Spanned {
            span: Span::Synthetic,
            data,
        }
    }
}
