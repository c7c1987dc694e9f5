//! Shared term builders for the integration tests.

#![allow(dead_code)]

use num_bigint::BigInt;
use std::collections::BTreeMap;
use std::sync::Arc;

use prism::lang::core::{
    Clause, Constructor, Definition, FunctionBody, FunctionDefinition, InductiveDefinition,
    Literal, LiteralType, LocalVar, OverloadedDefinition, Parameter, Pattern, Term, TermData,
};
use prism::lang::Spanned;

pub fn term(data: TermData) -> Arc<Term> {
    Arc::new(Spanned::synthetic(data))
}

pub fn universe() -> Arc<Term> {
    term(TermData::Universe)
}

pub fn int(value: i64) -> Arc<Term> {
    term(TermData::Primitive(Literal::Int(BigInt::from(value))))
}

pub fn boolean(value: bool) -> Arc<Term> {
    term(TermData::Primitive(Literal::Bool(value)))
}

pub fn string(value: &str) -> Arc<Term> {
    term(TermData::Primitive(Literal::String(value.to_owned())))
}

pub fn int_type() -> Arc<Term> {
    term(TermData::PrimitiveType(LiteralType::Int))
}

pub fn bool_type() -> Arc<Term> {
    term(TermData::PrimitiveType(LiteralType::Bool))
}

pub fn string_type() -> Arc<Term> {
    term(TermData::PrimitiveType(LiteralType::String))
}

pub fn var(v: &LocalVar) -> Arc<Term> {
    term(TermData::Var(v.clone()))
}

pub fn lam(param: &LocalVar, param_type: Arc<Term>, body: Arc<Term>) -> Arc<Term> {
    term(TermData::FunctionIntro(
        Parameter::new(param.clone(), param_type),
        body,
    ))
}

pub fn pi(param: &LocalVar, param_type: Arc<Term>, body: Arc<Term>) -> Arc<Term> {
    term(TermData::FunctionType(
        Parameter::new(param.clone(), param_type),
        body,
    ))
}

pub fn app(head: Arc<Term>, argument: Arc<Term>) -> Arc<Term> {
    term(TermData::FunctionElim(head, argument))
}

pub fn overloaded_lam(states: Vec<(LocalVar, Arc<Term>, Arc<Term>)>) -> Arc<Term> {
    term(TermData::OverloadedFunctionIntro(
        states
            .into_iter()
            .map(|(param, param_type, body)| (Parameter::new(param, param_type), body))
            .collect(),
    ))
}

pub fn invoke(name: &str, arguments: Vec<Arc<Term>>) -> Arc<Term> {
    term(TermData::Invoke(name.to_owned(), arguments))
}

pub fn invoke_overloaded(name: &str, arguments: Vec<Arc<Term>>) -> Arc<Term> {
    term(TermData::InvokeOverloaded(name.to_owned(), arguments))
}

pub fn record(fields: Vec<(&str, Arc<Term>)>) -> Arc<Term> {
    term(TermData::RecordIntro(
        fields
            .into_iter()
            .map(|(label, term)| (label.to_owned(), term))
            .collect::<BTreeMap<_, _>>(),
    ))
}

pub fn record_type(fields: Vec<(&str, Arc<Term>)>) -> Arc<Term> {
    term(TermData::RecordType(
        fields
            .into_iter()
            .map(|(label, term)| (label.to_owned(), term))
            .collect::<BTreeMap<_, _>>(),
    ))
}

pub fn proj(head: Arc<Term>, label: &str) -> Arc<Term> {
    term(TermData::RecordElim(head, label.to_owned()))
}

pub fn match_term(scrutinees: Vec<Arc<Term>>, clauses: Vec<Clause>) -> Arc<Term> {
    term(TermData::Match(scrutinees, clauses))
}

pub fn clause(patterns: Vec<Pattern>, body: Arc<Term>) -> Clause {
    Clause::new(patterns, body)
}

pub fn ind_type(name: &str, arguments: Vec<Arc<Term>>) -> Arc<Term> {
    term(TermData::InductiveType(name.to_owned(), arguments))
}

pub fn ind_intro(inductive: Arc<Term>, constructor: &str, arguments: Vec<Arc<Term>>) -> Arc<Term> {
    term(TermData::InductiveIntro(
        inductive,
        constructor.to_owned(),
        arguments,
    ))
}

/// `Nat` as an inductive type: `zero` and `succ (n : Nat)`.
pub fn nat_definition() -> Definition {
    Definition::Inductive(InductiveDefinition {
        name: "Nat".to_owned(),
        params: Vec::new(),
        constructors: vec![
            Constructor {
                name: "zero".to_owned(),
                params: Vec::new(),
            },
            Constructor {
                name: "succ".to_owned(),
                params: vec![Parameter::new(
                    LocalVar::fresh("n"),
                    ind_type("Nat", Vec::new()),
                )],
            },
        ],
    })
}

/// An ordinary function definition with a term body.
pub fn function_definition(
    name: &str,
    params: Vec<(LocalVar, Arc<Term>)>,
    result_type: Arc<Term>,
    is_recursive: bool,
    body: Arc<Term>,
) -> FunctionDefinition {
    FunctionDefinition {
        name: name.to_owned(),
        params: params
            .into_iter()
            .map(|(param, param_type)| Parameter::new(param, param_type))
            .collect(),
        result_type,
        is_recursive,
        body: FunctionBody::Term(body),
    }
}

/// `show` overloaded over `Int` and `String`, in either candidate order.
pub fn show_definition(reversed: bool) -> Definition {
    let int_candidate = function_definition(
        "show",
        vec![(LocalVar::fresh("value"), int_type())],
        string_type(),
        false,
        string("int"),
    );
    let string_candidate = function_definition(
        "show",
        vec![(LocalVar::fresh("value"), string_type())],
        string_type(),
        false,
        string("string"),
    );

    let overloads = if reversed {
        vec![string_candidate, int_candidate]
    } else {
        vec![int_candidate, string_candidate]
    };

    Definition::Overloaded(OverloadedDefinition {
        name: "show".to_owned(),
        overloads,
    })
}
