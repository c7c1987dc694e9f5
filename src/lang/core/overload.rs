//! Overload resolution.
//!
//! Overloaded definitions carry a bag of candidate functions sharing one
//! name; resolution picks the most specific candidate for a call site.
//! Overloaded *values* are superpositions of states keyed by parameter
//! type; evaluation merges states whose keys unify and application
//! collapses the superposition.

use std::sync::Arc;

use crate::lang::core::env::{Environment, Typed};
use crate::lang::core::semantics::{self, Closure, Value};
use crate::lang::core::{typing, Definition, FunctionDefinition, Parameter, Term};
use crate::lang::Span;
use crate::reporting::Message;

/// Evaluate the states of an overloaded term, merging states whose
/// parameter types unify after normalization.
pub fn eval_states(
    env: &Environment,
    states: &[(Parameter, Arc<Term>)],
    span: Span,
) -> Result<Vec<(Arc<Value>, Closure)>, Message> {
    let mut merged = Vec::with_capacity(states.len());
    for (param, body) in states {
        let param_type = semantics::eval(env, &param.r#type)?;
        let closure = Closure::new(env.clone(), param.name.clone(), body.clone());
        insert_state(env, &mut merged, param_type, closure, span)?;
    }
    Ok(merged)
}

/// Insert a state into a state map, merging with an existing state if the
/// parameter types unify.
pub fn insert_state(
    env: &Environment,
    states: &mut Vec<(Arc<Value>, Closure)>,
    param_type: Arc<Value>,
    closure: Closure,
    span: Span,
) -> Result<(), Message> {
    for (existing_type, existing_closure) in states.iter_mut() {
        if semantics::is_equal(existing_type, &param_type)? {
            let merged = merge_closures(env, existing_type, existing_closure, &closure, span)?;
            *existing_closure = merged;
            return Ok(());
        }
    }
    states.push((param_type, closure));
    Ok(())
}

/// Union two state maps, merging states with unifiable keys.
pub fn union_states(
    env: &Environment,
    mut states: Vec<(Arc<Value>, Closure)>,
    other: &[(Arc<Value>, Closure)],
    span: Span,
) -> Result<Vec<(Arc<Value>, Closure)>, Message> {
    for (param_type, closure) in other {
        insert_state(env, &mut states, param_type.clone(), closure.clone(), span)?;
    }
    Ok(states)
}

/// Merge two closures that share a parameter type key.
///
/// Both bodies must be overloadable: either a single function, which is
/// treated as a one-state superposition, or already a superposition. Their
/// state maps are unioned under a common fresh parameter.
fn merge_closures(
    env: &Environment,
    param_type: &Arc<Value>,
    closure0: &Closure,
    closure1: &Closure,
    span: Span,
) -> Result<Closure, Message> {
    let var = closure0.param().renamed();
    let var_value = Arc::new(Value::neutral_var(var.clone()));
    let result0 = closure0.apply(var_value.clone(), param_type.clone())?;
    let result1 = closure1.apply(var_value, param_type.clone())?;

    let merged = match (overloadable_states(&result0), overloadable_states(&result1)) {
        (Some((intro0, states0)), Some((intro1, states1))) if intro0 == intro1 => {
            let states = union_states(env, states0, &states1, span)?;
            match intro0 {
                true => Value::OverloadedFunctionIntro(states),
                false => Value::OverloadedFunctionType(states),
            }
        }
        (_, _) => return Err(Message::AmbiguousOverloadedDefinition { span }),
    };

    let body = semantics::read_back(&merged)?;
    Ok(Closure::new(env.clone(), var, Arc::new(body)))
}

/// View a value as overloadable states. Returns whether the states are
/// introductions (as opposed to types), and the state map.
fn overloadable_states(value: &Value) -> Option<(bool, Vec<(Arc<Value>, Closure)>)> {
    match value {
        Value::FunctionIntro(param_type, closure) => {
            Some((true, vec![(param_type.clone(), closure.clone())]))
        }
        Value::OverloadedFunctionIntro(states) => Some((true, states.clone())),
        Value::FunctionType(param_type, closure) => {
            Some((false, vec![(param_type.clone(), closure.clone())]))
        }
        Value::OverloadedFunctionType(states) => Some((false, states.clone())),
        _ => None,
    }
}

/// Apply an overloaded function value to an argument, collapsing the
/// superposition.
///
/// Every state whose parameter type accepts the argument type is applied.
/// A single selected state applies directly; several selected states must
/// each produce a further superposition, and the results are unioned.
pub fn apply_superposition(
    env: &Environment,
    states: &[(Arc<Value>, Closure)],
    argument: Arc<Value>,
    argument_type: &Arc<Value>,
    span: Span,
) -> Result<Arc<Value>, Message> {
    let mut selected = Vec::new();
    for (param_type, closure) in states {
        if semantics::is_subtype(param_type, argument_type)? {
            selected.push((param_type, closure));
        }
    }

    if selected.is_empty() {
        return Err(Message::OverloadNoMatch {
            span,
            name: None,
        });
    }
    if let [(param_type, closure)] = selected.as_slice() {
        return closure.apply(argument, (*param_type).clone());
    }

    let mut merged = Vec::new();
    for (param_type, closure) in selected {
        let result = closure.apply(argument.clone(), param_type.clone())?;
        match result.as_ref() {
            Value::OverloadedFunctionIntro(states) => {
                merged = union_states(env, merged, states, span)?;
            }
            _ => return Err(Message::AmbiguousOverloadedDefinition { span }),
        }
    }
    Ok(Arc::new(Value::OverloadedFunctionIntro(merged)))
}

/// Resolve an overloaded call to its most specific candidate.
///
/// Candidates are first filtered by arity and per-position compatibility
/// with the argument types, then iteratively refined position by position,
/// dropping any candidate that some other candidate is strictly more
/// specific than. Resolution is independent of candidate order.
pub fn resolve(
    env: &Environment,
    name: &str,
    arguments: &[Arc<Term>],
    span: Span,
) -> Result<FunctionDefinition, Message> {
    let overloaded = match env.definition(name).map(Arc::as_ref) {
        Some(Definition::Overloaded(overloaded)) => overloaded.clone(),
        Some(_) | None => {
            return Err(Message::UnboundVariable {
                span,
                name: name.to_owned(),
            })
        }
    };

    let argument_types = arguments
        .iter()
        .map(|argument| typing::infer(env, argument))
        .collect::<Result<Vec<_>, _>>()?;
    let argument_values = arguments
        .iter()
        .map(|argument| semantics::eval(env, argument))
        .collect::<Result<Vec<_>, _>>()?;

    // Candidates that accept the arguments, along with their evaluated
    // parameter types.
    let mut candidates = Vec::new();
    'candidates: for function in &overloaded.overloads {
        if function.params.len() != arguments.len() {
            continue;
        }
        let mut param_types = Vec::with_capacity(function.params.len());
        let mut param_env = env.clone();
        for (index, param) in function.params.iter().enumerate() {
            let param_type = semantics::eval(&param_env, &param.r#type)?;
            if !semantics::is_subtype(&param_type, &argument_types[index])? {
                continue 'candidates;
            }
            param_env = param_env.with_local(
                param.name.clone(),
                Typed::new(argument_values[index].clone(), param_type.clone()),
            );
            param_types.push(param_type);
        }
        candidates.push((function, param_types));
    }

    if candidates.is_empty() {
        return Err(Message::OverloadNoMatch {
            span,
            name: Some(name.to_owned()),
        });
    }

    let mut remaining: Vec<usize> = (0..candidates.len()).collect();
    for position in 0..arguments.len() {
        if remaining.len() <= 1 {
            break;
        }
        let mut retained = Vec::with_capacity(remaining.len());
        'retain: for &candidate in &remaining {
            for &other in &remaining {
                if other == candidate {
                    continue;
                }
                let candidate_type = &candidates[candidate].1[position];
                let other_type = &candidates[other].1[position];
                let candidate_below = semantics::is_subtype(candidate_type, other_type)?;
                let other_below = semantics::is_subtype(other_type, candidate_type)?;
                // `other` is strictly more specific at this position.
                if !candidate_below && other_below {
                    continue 'retain;
                }
            }
            retained.push(candidate);
        }
        remaining = retained;
    }

    match remaining.as_slice() {
        [index] => Ok(candidates[*index].0.clone()),
        _ => Err(Message::OverloadAmbiguous {
            span,
            name: Some(name.to_owned()),
        }),
    }
}

/// The type of an overloaded definition's candidate at a call site: each
/// parameter is bound to a fresh neutral of its declared type while the
/// declared result type is evaluated.
pub fn candidate_result_type(
    env: &Environment,
    function: &FunctionDefinition,
) -> Result<Arc<Value>, Message> {
    let mut body_env = env.clone();
    for param in &function.params {
        let param_type = semantics::eval(&body_env, &param.r#type)?;
        body_env = body_env.with_local(
            param.name.clone(),
            Typed::new(Arc::new(Value::neutral_var(param.name.clone())), param_type),
        );
    }
    semantics::eval(&body_env, &function.result_type)
}
