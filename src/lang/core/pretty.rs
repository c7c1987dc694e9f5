//! Pretty printing for core terms.
//!
//! Used by diagnostics to render offending terms and types; the output is
//! for human eyes only and is not expected to round-trip.

use pretty::{DocAllocator, DocBuilder};

use crate::lang::core::{Literal, Pattern, Term, TermData};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Prec {
    Term = 0,
    Arrow,
    App,
    Atomic,
}

pub fn from_term<'a, D>(alloc: &'a D, term: &'a Term) -> DocBuilder<'a, D>
where
    D: DocAllocator<'a>,
    D::Doc: Clone,
{
    from_term_prec(alloc, term, Prec::Term)
}

pub fn from_term_prec<'a, D>(alloc: &'a D, term: &'a Term, prec: Prec) -> DocBuilder<'a, D>
where
    D: DocAllocator<'a>,
    D::Doc: Clone,
{
    match &term.data {
        TermData::Universe => alloc.text("Type"),
        TermData::Primitive(literal) => from_literal(alloc, literal),
        TermData::PrimitiveType(literal_type) => alloc.text(literal_type.name()),
        TermData::Var(var) => alloc.as_string(var),

        TermData::Invoke(name, arguments) | TermData::InvokeOverloaded(name, arguments) => {
            from_application(alloc, alloc.as_string(name), arguments, prec)
        }
        TermData::InductiveType(name, arguments) => {
            from_application(alloc, alloc.as_string(name), arguments, prec)
        }
        TermData::InductiveIntro(inductive, constructor, arguments) => {
            let head = (alloc.nil())
                .append(from_term_prec(alloc, inductive, Prec::Atomic))
                .append("::")
                .append(alloc.as_string(constructor));
            from_application(alloc, head, arguments, prec)
        }

        TermData::FunctionType(param, body) => paren(
            alloc,
            prec > Prec::Arrow,
            (alloc.nil())
                .append("(")
                .append(alloc.as_string(&param.name))
                .append(alloc.space())
                .append(":")
                .append(alloc.space())
                .append(from_term_prec(alloc, &param.r#type, Prec::Term))
                .append(")")
                .append(alloc.space())
                .append("->")
                .append(alloc.space())
                .append(from_term_prec(alloc, body, Prec::Arrow)),
        ),
        TermData::PairType(param, body) => paren(
            alloc,
            prec > Prec::Arrow,
            (alloc.nil())
                .append("(")
                .append(alloc.as_string(&param.name))
                .append(alloc.space())
                .append(":")
                .append(alloc.space())
                .append(from_term_prec(alloc, &param.r#type, Prec::Term))
                .append(")")
                .append(alloc.space())
                .append("*")
                .append(alloc.space())
                .append(from_term_prec(alloc, body, Prec::Arrow)),
        ),
        TermData::FunctionIntro(param, body) => paren(
            alloc,
            prec > Prec::Term,
            (alloc.nil())
                .append("fun")
                .append(alloc.space())
                .append("(")
                .append(alloc.as_string(&param.name))
                .append(alloc.space())
                .append(":")
                .append(alloc.space())
                .append(from_term_prec(alloc, &param.r#type, Prec::Term))
                .append(")")
                .append(alloc.space())
                .append("=>")
                .group()
                .append(
                    (alloc.space())
                        .append(from_term_prec(alloc, body, Prec::Term))
                        .group()
                        .nest(4),
                ),
        ),
        TermData::FunctionElim(head, argument) => paren(
            alloc,
            prec > Prec::App,
            (alloc.nil())
                .append(from_term_prec(alloc, head, Prec::Atomic))
                .append(
                    (alloc.space())
                        .append(from_term_prec(alloc, argument, Prec::Atomic))
                        .group()
                        .nest(4),
                ),
        ),

        TermData::OverloadedFunctionType(states) => (alloc.nil())
            .append("overloaded")
            .append(alloc.space())
            .append("{")
            .append(alloc.intersperse(
                states.iter().map(|(param, body)| {
                    (alloc.nil())
                        .append(alloc.space())
                        .append("(")
                        .append(alloc.as_string(&param.name))
                        .append(alloc.space())
                        .append(":")
                        .append(alloc.space())
                        .append(from_term_prec(alloc, &param.r#type, Prec::Term))
                        .append(")")
                        .append(alloc.space())
                        .append("->")
                        .append(alloc.space())
                        .append(from_term_prec(alloc, body, Prec::Term))
                }),
                alloc.text(","),
            ))
            .append(alloc.space())
            .append("}"),
        TermData::OverloadedFunctionIntro(states) => (alloc.nil())
            .append("overloaded")
            .append(alloc.space())
            .append("{")
            .append(alloc.intersperse(
                states.iter().map(|(param, body)| {
                    (alloc.nil())
                        .append(alloc.space())
                        .append("fun")
                        .append(alloc.space())
                        .append("(")
                        .append(alloc.as_string(&param.name))
                        .append(alloc.space())
                        .append(":")
                        .append(alloc.space())
                        .append(from_term_prec(alloc, &param.r#type, Prec::Term))
                        .append(")")
                        .append(alloc.space())
                        .append("=>")
                        .append(alloc.space())
                        .append(from_term_prec(alloc, body, Prec::Term))
                }),
                alloc.text(","),
            ))
            .append(alloc.space())
            .append("}"),

        TermData::Match(scrutinees, clauses) => (alloc.nil())
            .append("match")
            .append(alloc.space())
            .append(alloc.intersperse(
                scrutinees
                    .iter()
                    .map(|scrutinee| from_term_prec(alloc, scrutinee, Prec::App)),
                alloc.text(",").append(alloc.space()),
            ))
            .append(alloc.space())
            .append("{")
            .append(alloc.concat(clauses.iter().map(|clause| {
                (alloc.nil())
                    .append(alloc.space())
                    .append(alloc.intersperse(
                        clause
                            .patterns
                            .iter()
                            .map(|pattern| from_pattern(alloc, pattern)),
                        alloc.text(",").append(alloc.space()),
                    ))
                    .append(alloc.space())
                    .append("=>")
                    .append(alloc.space())
                    .append(from_term_prec(alloc, &clause.body, Prec::Term))
                    .append(",")
            })))
            .append(alloc.space())
            .append("}"),

        TermData::RecordIntro(fields) => (alloc.nil())
            .append("{")
            .append(alloc.intersperse(
                fields.iter().map(|(label, term)| {
                    (alloc.nil())
                        .append(alloc.space())
                        .append(alloc.as_string(label))
                        .append(alloc.space())
                        .append("=")
                        .append(alloc.space())
                        .append(from_term_prec(alloc, term, Prec::Term))
                }),
                alloc.text(","),
            ))
            .append(alloc.space())
            .append("}"),
        TermData::RecordType(fields) => (alloc.nil())
            .append("{")
            .append(alloc.intersperse(
                fields.iter().map(|(label, term)| {
                    (alloc.nil())
                        .append(alloc.space())
                        .append(alloc.as_string(label))
                        .append(alloc.space())
                        .append(":")
                        .append(alloc.space())
                        .append(from_term_prec(alloc, term, Prec::Term))
                }),
                alloc.text(","),
            ))
            .append(alloc.space())
            .append("}"),
        TermData::RecordElim(head, label) => (alloc.nil())
            .append(from_term_prec(alloc, head, Prec::Atomic))
            .append(".")
            .append(alloc.as_string(label)),
    }
}

pub fn from_pattern<'a, D>(alloc: &'a D, pattern: &'a Pattern) -> DocBuilder<'a, D>
where
    D: DocAllocator<'a>,
    D::Doc: Clone,
{
    match pattern {
        Pattern::Primitive(literal) => from_literal(alloc, literal),
        Pattern::Binder(var) => alloc.as_string(var),
        Pattern::Variant(name, sub_patterns) => {
            let head = alloc.as_string(name);
            if sub_patterns.is_empty() {
                head
            } else {
                head.append("(")
                    .append(alloc.intersperse(
                        sub_patterns
                            .iter()
                            .map(|sub_pattern| from_pattern(alloc, sub_pattern)),
                        alloc.text(",").append(alloc.space()),
                    ))
                    .append(")")
            }
        }
        Pattern::Record(fields) => (alloc.nil())
            .append("{")
            .append(alloc.intersperse(
                fields.iter().map(|(label, sub_pattern)| {
                    (alloc.nil())
                        .append(alloc.space())
                        .append(alloc.as_string(label))
                        .append(alloc.space())
                        .append("=")
                        .append(alloc.space())
                        .append(from_pattern(alloc, sub_pattern))
                }),
                alloc.text(","),
            ))
            .append(alloc.space())
            .append("}"),
    }
}

pub fn from_literal<'a, D>(alloc: &'a D, literal: &'a Literal) -> DocBuilder<'a, D>
where
    D: DocAllocator<'a>,
    D::Doc: Clone,
{
    match literal {
        Literal::Unit => alloc.text("()"),
        Literal::Bool(true) => alloc.text("true"),
        Literal::Bool(false) => alloc.text("false"),
        Literal::Int(value) => alloc.as_string(value),
        // Literals compare bitwise, so negative zero must keep its sign
        // when printed.
        Literal::Float(value) if value.to_bits() == (-0.0_f64).to_bits() => alloc.text("-0"),
        Literal::Float(value) => alloc.as_string(value),
        Literal::Char(value) => alloc.text(format!("{:?}", value)),
        Literal::String(value) => alloc.text(format!("{:?}", value)),
    }
}

fn from_application<'a, D>(
    alloc: &'a D,
    head: DocBuilder<'a, D>,
    arguments: &'a [std::sync::Arc<Term>],
    prec: Prec,
) -> DocBuilder<'a, D>
where
    D: DocAllocator<'a>,
    D::Doc: Clone,
{
    if arguments.is_empty() {
        return head;
    }
    paren(
        alloc,
        prec > Prec::App,
        head.append(
            (alloc.nil())
                .append(alloc.concat(arguments.iter().map(|argument| {
                    (alloc.space()).append(from_term_prec(alloc, argument, Prec::Atomic))
                })))
                .group()
                .nest(4),
        ),
    )
}

fn paren<'a, D>(alloc: &'a D, b: bool, doc: DocBuilder<'a, D>) -> DocBuilder<'a, D>
where
    D: DocAllocator<'a>,
    D::Doc: Clone,
{
    if b {
        alloc.text("(").append(doc).append(")")
    } else {
        doc
    }
}
