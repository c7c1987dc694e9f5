//! Type inference for the core language.
//!
//! Inference and evaluation are intertwined: types are [values][Value], so
//! inferring a dependent elimination evaluates terms, and evaluating an
//! application consults inference for the argument type.

use std::sync::Arc;

use crate::lang::core::env::{Environment, Typed};
use crate::lang::core::semantics::{self, Closure, Value};
use crate::lang::core::{overload, Definition, Term, TermData};
use crate::reporting::Message;

/// Synthesize the type of a term.
pub fn infer(env: &Environment, term: &Term) -> Result<Arc<Value>, Message> {
    match &term.data {
        TermData::Universe
        | TermData::PrimitiveType(_)
        | TermData::FunctionType(_, _)
        | TermData::PairType(_, _)
        | TermData::OverloadedFunctionType(_)
        | TermData::RecordType(_) => Ok(Arc::new(Value::Universe)),

        TermData::Primitive(literal) => Ok(Arc::new(Value::PrimitiveType(literal.r#type()))),

        TermData::Var(var) => match env.lookup_local(var) {
            Some(typed) => Ok(typed.r#type.clone()),
            // The variable may be bound through another entry whose value is
            // this neutral variable, as happens for pattern binders.
            None => match env.lookup_neutral_type(var) {
                Some(typed) => Ok(typed.r#type.clone()),
                None => Err(Message::UnboundVariable {
                    span: term.span,
                    name: var.name().to_owned(),
                }),
            },
        },

        TermData::Invoke(name, arguments) => match env.definition(name).map(Arc::as_ref) {
            Some(Definition::Function(function)) => {
                let function = function.clone();
                // The declared result type may depend on the parameters, so
                // they are bound to the evaluated arguments first.
                let mut body_env = env.clone();
                for (param, argument) in Iterator::zip(function.params.iter(), arguments.iter()) {
                    let param_type = semantics::eval(&body_env, &param.r#type)?;
                    let argument_value = semantics::eval(env, argument)?;
                    body_env = body_env
                        .with_local(param.name.clone(), Typed::new(argument_value, param_type));
                }
                semantics::eval(&body_env, &function.result_type)
            }
            Some(_) | None => Err(Message::UnboundVariable {
                span: term.span,
                name: name.clone(),
            }),
        },
        TermData::InvokeOverloaded(name, arguments) => {
            let function = overload::resolve(env, name, arguments, term.span)?;
            overload::candidate_result_type(env, &function)
        }

        TermData::InductiveType(_, _) => Ok(Arc::new(Value::Universe)),
        TermData::InductiveIntro(inductive, _, _) => semantics::eval(env, inductive),

        TermData::Match(scrutinees, clauses) => {
            let scrutinee_types = scrutinees
                .iter()
                .map(|scrutinee| infer(env, scrutinee))
                .collect::<Result<Vec<_>, _>>()?;

            let mut first_type: Option<Arc<Value>> = None;
            for clause in clauses {
                let mut clause_env = env.clone();
                for (pattern, scrutinee_type) in
                    Iterator::zip(clause.patterns.iter(), scrutinee_types.iter())
                {
                    clause_env = semantics::bind_pattern(&clause_env, pattern, scrutinee_type)?;
                }
                let body_type = infer(&clause_env, &clause.body)?;
                match &first_type {
                    None => first_type = Some(body_type),
                    Some(expected) => {
                        if !semantics::is_equal(expected, &body_type)? {
                            return Err(Message::ClauseTypeMismatch {
                                span: clause.body.span,
                                expected: semantics::read_back(expected)?,
                                found: semantics::read_back(&body_type)?,
                            });
                        }
                    }
                }
            }
            first_type.ok_or(Message::NonExhaustiveMatch {
                span: term.span,
            })
        }

        TermData::FunctionIntro(param, body) => {
            let param_type = semantics::eval(env, &param.r#type)?;
            let body_env = env.with_local(
                param.name.clone(),
                Typed::new(
                    Arc::new(Value::neutral_var(param.name.clone())),
                    param_type.clone(),
                ),
            );
            let body_type = infer(&body_env, body)?;
            let codomain = semantics::read_back(&body_type)?;
            Ok(Arc::new(Value::FunctionType(
                param_type,
                Closure::new(env.clone(), param.name.clone(), Arc::new(codomain)),
            )))
        }
        TermData::OverloadedFunctionIntro(states) => {
            let mut state_types = Vec::with_capacity(states.len());
            for (param, body) in states {
                let param_type = semantics::eval(env, &param.r#type)?;
                let body_env = env.with_local(
                    param.name.clone(),
                    Typed::new(
                        Arc::new(Value::neutral_var(param.name.clone())),
                        param_type.clone(),
                    ),
                );
                let body_type = infer(&body_env, body)?;
                let codomain = semantics::read_back(&body_type)?;
                let closure = Closure::new(env.clone(), param.name.clone(), Arc::new(codomain));
                overload::insert_state(env, &mut state_types, param_type, closure, term.span)?;
            }
            Ok(Arc::new(Value::OverloadedFunctionType(state_types)))
        }

        TermData::FunctionElim(head, argument) => {
            let head_type = infer(env, head)?;
            match head_type.as_ref() {
                Value::FunctionType(param_type, codomain) => {
                    let argument_type = infer(env, argument)?;
                    if !semantics::is_equal(&argument_type, param_type)? {
                        return Err(Message::TypeMismatch {
                            span: argument.span,
                            expected: semantics::read_back(param_type)?,
                            found: semantics::read_back(&argument_type)?,
                        });
                    }
                    codomain.apply(semantics::eval(env, argument)?, param_type.clone())
                }
                Value::OverloadedFunctionType(states) => {
                    let argument_type = infer(env, argument)?;
                    let mut selected = Vec::new();
                    for (param_type, codomain) in states {
                        if semantics::is_subtype(param_type, &argument_type)? {
                            selected.push((param_type, codomain));
                        }
                    }
                    if selected.is_empty() {
                        return Err(Message::OverloadNoMatch {
                            span: term.span,
                            name: None,
                        });
                    }
                    // Keep the minimal states: those that no other selected
                    // state is more specific than.
                    let mut minimal = Vec::new();
                    'select: for (index, (param_type, codomain)) in selected.iter().enumerate() {
                        for (other_index, (other_type, _)) in selected.iter().enumerate() {
                            if other_index == index {
                                continue;
                            }
                            if semantics::is_subtype(other_type, param_type)? {
                                continue 'select;
                            }
                        }
                        minimal.push((*param_type, *codomain));
                    }
                    match minimal.as_slice() {
                        [(param_type, codomain)] => codomain
                            .apply(semantics::eval(env, argument)?, (*param_type).clone()),
                        _ => Err(Message::OverloadAmbiguous {
                            span: term.span,
                            name: None,
                        }),
                    }
                }
                _ => Err(Message::NotAFunction {
                    span: head.span,
                    found: semantics::read_back(&head_type)?,
                }),
            }
        }

        TermData::RecordIntro(fields) => {
            let fields = fields
                .iter()
                .map(|(label, term)| Ok((label.clone(), infer(env, term)?)))
                .collect::<Result<_, Message>>()?;
            Ok(Arc::new(Value::RecordType(fields)))
        }
        TermData::RecordElim(head, label) => {
            let head_type = infer(env, head)?;
            match head_type.as_ref() {
                Value::RecordType(fields) => {
                    fields
                        .get(label)
                        .cloned()
                        .ok_or_else(|| Message::MissingField {
                            span: term.span,
                            label: label.clone(),
                        })
                }
                _ => Err(Message::NotARecord {
                    span: head.span,
                    found: semantics::read_back(&head_type)?,
                }),
            }
        }
    }
}
