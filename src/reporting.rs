//! Diagnostic messages raised by the core.
//!
//! Every message carries an opaque [`Span`] handle supplied by the
//! elaborator ([`Span::Synthetic`] when there is none), and can be
//! converted to a [`Diagnostic`] in order to present it to the user. The
//! core itself never parses or formats source spans.

use codespan_reporting::diagnostic::{Diagnostic, Label};
use pretty::DocAllocator;

use crate::lang::core::Term;
use crate::lang::Span;

/// Errors raised while evaluating, inferring, or unifying core terms.
///
/// These abort the current operation and propagate to the caller; the core
/// performs no local recovery.
#[derive(Debug, Clone)]
pub enum Message {
    /// A variable or definition name could not be resolved in the
    /// environment.
    UnboundVariable { span: Span, name: String },
    /// Two types failed to unify where equality is required.
    TypeMismatch {
        span: Span,
        expected: Term,
        found: Term,
    },
    /// A function elimination was applied to something that is not a
    /// function.
    NotAFunction { span: Span, found: Term },
    /// A record elimination was applied to something that is not a record.
    NotARecord { span: Span, found: Term },
    /// A constructor introduction's head did not reduce to an inductive
    /// type.
    NotAnInductive { span: Span, found: Term },
    /// A record projection named an absent field.
    MissingField { span: Span, label: String },
    /// No overload candidate (or superposition state) accepts the
    /// arguments.
    OverloadNoMatch { span: Span, name: Option<String> },
    /// Several overload candidates (or superposition states) remain after
    /// refinement.
    OverloadAmbiguous { span: Span, name: Option<String> },
    /// Overloaded states sharing a parameter type could not be merged.
    AmbiguousOverloadedDefinition { span: Span },
    /// All scrutinees were final and no clause matched.
    NonExhaustiveMatch { span: Span },
    /// Match clause bodies inferred types that do not unify.
    ClauseTypeMismatch {
        span: Span,
        expected: Term,
        found: Term,
    },
}

impl Message {
    /// The span handle attached to this message.
    pub fn span(&self) -> Span {
        match self {
            Message::UnboundVariable { span, .. }
            | Message::TypeMismatch { span, .. }
            | Message::NotAFunction { span, .. }
            | Message::NotARecord { span, .. }
            | Message::NotAnInductive { span, .. }
            | Message::MissingField { span, .. }
            | Message::OverloadNoMatch { span, .. }
            | Message::OverloadAmbiguous { span, .. }
            | Message::AmbiguousOverloadedDefinition { span }
            | Message::NonExhaustiveMatch { span }
            | Message::ClauseTypeMismatch { span, .. } => *span,
        }
    }

    pub fn to_diagnostic<'a, D>(&'a self, pretty_alloc: &'a D) -> Diagnostic<usize>
    where
        D: DocAllocator<'a>,
        D::Doc: Clone,
    {
        let to_doc = |term| crate::lang::core::pretty::from_term(pretty_alloc, term).1;

        match self {
            Message::UnboundVariable { span, name } => Diagnostic::error()
                .with_message(format!("cannot find `{}` in scope", name))
                .with_labels(primary(*span, "not found in this scope")),
            Message::TypeMismatch {
                span,
                expected,
                found,
            } => {
                let expected = to_doc(expected);
                let found = to_doc(found);

                Diagnostic::error()
                    .with_message("type mismatch")
                    .with_labels(primary(
                        *span,
                        format!(
                            "expected `{}`, found `{}`",
                            expected.pretty(usize::MAX),
                            found.pretty(usize::MAX),
                        ),
                    ))
                    .with_notes(vec![[
                        format!("expected `{}`", expected.pretty(usize::MAX)),
                        format!("   found `{}`", found.pretty(usize::MAX)),
                    ]
                    .join("\n")])
            }
            Message::NotAFunction { span, found } => Diagnostic::error()
                .with_message(format!(
                    "applied an argument to `{}`, which is not a function",
                    to_doc(found).pretty(usize::MAX),
                ))
                .with_labels(primary(*span, "not a function")),
            Message::NotARecord { span, found } => Diagnostic::error()
                .with_message(format!(
                    "projected a field from `{}`, which is not a record",
                    to_doc(found).pretty(usize::MAX),
                ))
                .with_labels(primary(*span, "not a record")),
            Message::NotAnInductive { span, found } => Diagnostic::error()
                .with_message(format!(
                    "`{}` is not an inductive type",
                    to_doc(found).pretty(usize::MAX),
                ))
                .with_labels(primary(*span, "not an inductive type")),
            Message::MissingField { span, label } => Diagnostic::error()
                .with_message(format!("missing field: {}", label))
                .with_labels(primary(*span, format!("no field named `{}`", label))),
            Message::OverloadNoMatch { span, name } => Diagnostic::error()
                .with_message(match name {
                    Some(name) => format!("no overload of `{}` matches these arguments", name),
                    None => "no state of the overloaded function matches this argument".to_owned(),
                })
                .with_labels(primary(*span, "no match")),
            Message::OverloadAmbiguous { span, name } => Diagnostic::error()
                .with_message(match name {
                    Some(name) => format!("ambiguous overload of `{}`", name),
                    None => "multiple valid states".to_owned(),
                })
                .with_labels(primary(*span, "ambiguous overload")),
            Message::AmbiguousOverloadedDefinition { span } => Diagnostic::error()
                .with_message("overloaded definitions with unifiable parameter types cannot be merged")
                .with_labels(primary(*span, "ambiguous overloaded definition")),
            Message::NonExhaustiveMatch { span } => Diagnostic::error()
                .with_message("no pattern matched the scrutinees")
                .with_labels(primary(*span, "no match")),
            Message::ClauseTypeMismatch {
                span,
                expected,
                found,
            } => {
                let expected = to_doc(expected);
                let found = to_doc(found);

                Diagnostic::error()
                    .with_message("match clauses have mismatched types")
                    .with_labels(primary(
                        *span,
                        format!(
                            "expected `{}`, found `{}`",
                            expected.pretty(usize::MAX),
                            found.pretty(usize::MAX),
                        ),
                    ))
            }
        }
    }
}

fn primary(span: Span, message: impl Into<String>) -> Vec<Label<usize>> {
    match span.label_parts() {
        None => Vec::new(),
        Some((file, range)) => vec![Label::primary(file, range).with_message(message)],
    }
}
