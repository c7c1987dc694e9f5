//! The operational semantics of the core language, implemented using
//! [normalisation by evaluation](https://en.wikipedia.org/wiki/Normalisation_by_evaluation).
//!
//! Terms are [evaluated][eval] into [values][Value] with bindings converted
//! to [closures][Closure], and values are [read back][read_back] into terms
//! in canonical form. Computations that get stuck on a variable, an
//! undecidable match, or a frozen function call are retained as
//! [neutrals][Neutral].

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::lang::core::env::{Environment, Typed};
use crate::lang::core::{
    overload, typing, Clause, Definition, FunctionBody, FunctionDefinition, Literal, LiteralType,
    LocalVar, Parameter, Pattern, Term, TermData,
};
use crate::lang::{Span, Spanned};
use crate::reporting::Message;

/// Values in canonical form, with bindings converted to closures.
#[derive(Debug, Clone)]
pub enum Value {
    /// The type universe.
    Universe,
    /// Literals.
    Primitive(Literal),
    /// Types of literals.
    PrimitiveType(LiteralType),

    /// Dependent function types.
    FunctionType(Arc<Value>, Closure),
    /// Dependent pair types.
    PairType(Arc<Value>, Closure),
    /// Function introductions.
    FunctionIntro(Arc<Value>, Closure),

    /// Superpositions of function types, keyed by parameter type. Keys are
    /// compared up to unification, so states are kept as a linear-search
    /// vector rather than a hashed map.
    OverloadedFunctionType(Vec<(Arc<Value>, Closure)>),
    /// Superpositions of function introductions, keyed by parameter type.
    OverloadedFunctionIntro(Vec<(Arc<Value>, Closure)>),

    /// Fully applied inductive types.
    InductiveType(String, Vec<Arc<Value>>),
    /// Constructor introductions.
    InductiveIntro(Arc<Value>, String, Vec<Arc<Value>>),

    /// Record introductions.
    RecordIntro(BTreeMap<String, Arc<Value>>),
    /// Record types.
    RecordType(BTreeMap<String, Arc<Value>>),

    /// A computation that is stuck on something that cannot be reduced
    /// further.
    Neutral(Neutral),
}

impl Value {
    /// Create a neutral variable.
    pub fn neutral_var(var: LocalVar) -> Value {
        Value::Neutral(Neutral::Var(var))
    }
}

/// A suspended elimination.
///
/// This is more commonly known as a 'neutral value': an elimination that
/// cannot be reduced further as a result of being stuck on a variable, a
/// frozen function call, or a match over undecided scrutinees.
#[derive(Debug, Clone)]
pub enum Neutral {
    /// Variables bound as parameters or pattern binders.
    Var(LocalVar),
    /// Function eliminations stuck on their head.
    FunctionElim(Arc<Neutral>, Arc<Value>),
    /// Record eliminations stuck on their head.
    RecordElim(Arc<Neutral>, String),
    /// Matches whose scrutinees are not yet decided. Clause bodies are
    /// evaluated ahead of time under neutral bindings for their pattern
    /// binders.
    Match(Vec<Arc<Value>>, Vec<NeutralClause>),
    /// Function calls frozen before unfolding.
    Invoke(String, Vec<Arc<Value>>),
}

/// A match clause whose body has been evaluated ahead of time.
#[derive(Debug, Clone)]
pub struct NeutralClause {
    pub patterns: Vec<Pattern>,
    pub body: Arc<Value>,
}

/// A closure: a term that can later be instantiated with a value for its
/// parameter.
///
/// The environment in force at the closure's creation is captured as a
/// persistent snapshot, so later extensions of the caller's environment
/// cannot leak in.
#[derive(Debug, Clone)]
pub struct Closure {
    env: Environment,
    param: LocalVar,
    body: Arc<Term>,
}

impl Closure {
    /// Construct a closure.
    pub fn new(env: Environment, param: LocalVar, body: Arc<Term>) -> Closure {
        Closure { env, param, body }
    }

    pub fn param(&self) -> &LocalVar {
        &self.param
    }

    /// Instantiate the closure, binding the parameter to a typed value.
    pub fn apply(&self, value: Arc<Value>, r#type: Arc<Value>) -> Result<Arc<Value>, Message> {
        let env = self
            .env
            .with_local(self.param.clone(), Typed::new(value, r#type));
        eval(&env, &self.body)
    }
}

/// Evaluate a [`Term`] into a [`Value`] under the given environment.
pub fn eval(env: &Environment, term: &Term) -> Result<Arc<Value>, Message> {
    match &term.data {
        TermData::Universe => Ok(Arc::new(Value::Universe)),
        TermData::Primitive(literal) => Ok(Arc::new(Value::Primitive(literal.clone()))),
        TermData::PrimitiveType(literal_type) => {
            Ok(Arc::new(Value::PrimitiveType(*literal_type)))
        }

        TermData::Var(var) => match env.lookup_local(var) {
            Some(typed) => Ok(typed.value.clone()),
            None => Err(Message::UnboundVariable {
                span: term.span,
                name: var.name().to_owned(),
            }),
        },

        TermData::FunctionType(param, body) => Ok(Arc::new(Value::FunctionType(
            eval(env, &param.r#type)?,
            Closure::new(env.clone(), param.name.clone(), body.clone()),
        ))),
        TermData::PairType(param, body) => Ok(Arc::new(Value::PairType(
            eval(env, &param.r#type)?,
            Closure::new(env.clone(), param.name.clone(), body.clone()),
        ))),
        TermData::FunctionIntro(param, body) => Ok(Arc::new(Value::FunctionIntro(
            eval(env, &param.r#type)?,
            Closure::new(env.clone(), param.name.clone(), body.clone()),
        ))),

        TermData::OverloadedFunctionType(states) => Ok(Arc::new(Value::OverloadedFunctionType(
            overload::eval_states(env, states, term.span)?,
        ))),
        TermData::OverloadedFunctionIntro(states) => Ok(Arc::new(
            Value::OverloadedFunctionIntro(overload::eval_states(env, states, term.span)?),
        )),

        TermData::FunctionElim(head, argument) => {
            let head_value = eval(env, head)?;
            match head_value.as_ref() {
                Value::FunctionIntro(param_type, closure) => {
                    let argument_type = typing::infer(env, argument)?;
                    if !is_subtype(param_type, &argument_type)? {
                        return Err(Message::TypeMismatch {
                            span: argument.span,
                            expected: read_back(param_type)?,
                            found: read_back(&argument_type)?,
                        });
                    }
                    closure.apply(eval(env, argument)?, param_type.clone())
                }
                Value::OverloadedFunctionIntro(states) => {
                    let argument_type = typing::infer(env, argument)?;
                    let argument_value = eval(env, argument)?;
                    overload::apply_superposition(
                        env,
                        states,
                        argument_value,
                        &argument_type,
                        term.span,
                    )
                }
                Value::Neutral(neutral) => Ok(Arc::new(Value::Neutral(Neutral::FunctionElim(
                    Arc::new(neutral.clone()),
                    eval(env, argument)?,
                )))),
                _ => Err(Message::NotAFunction {
                    span: head.span,
                    found: read_back(&head_value)?,
                }),
            }
        }

        TermData::Invoke(name, arguments) => {
            // Self-calls freeze while the definition's own body is under
            // evaluation.
            if env.current_definition() == Some(name.as_str()) {
                let arguments = arguments
                    .iter()
                    .map(|argument| eval(env, argument))
                    .collect::<Result<_, _>>()?;
                return Ok(Arc::new(Value::Neutral(Neutral::Invoke(
                    name.clone(),
                    arguments,
                ))));
            }
            match env.definition(name).map(Arc::as_ref) {
                Some(Definition::Function(function)) => {
                    let function = function.clone();
                    invoke_function(env, &function, arguments, term.span)
                }
                Some(_) | None => Err(Message::UnboundVariable {
                    span: term.span,
                    name: name.clone(),
                }),
            }
        }
        TermData::InvokeOverloaded(name, arguments) => {
            if env.current_definition() == Some(name.as_str()) {
                let arguments = arguments
                    .iter()
                    .map(|argument| eval(env, argument))
                    .collect::<Result<_, _>>()?;
                return Ok(Arc::new(Value::Neutral(Neutral::Invoke(
                    name.clone(),
                    arguments,
                ))));
            }
            let function = overload::resolve(env, name, arguments, term.span)?;
            invoke_function(env, &function, arguments, term.span)
        }

        TermData::InductiveType(name, arguments) => {
            let arguments = arguments
                .iter()
                .map(|argument| eval(env, argument))
                .collect::<Result<_, _>>()?;
            Ok(Arc::new(Value::InductiveType(name.clone(), arguments)))
        }
        TermData::InductiveIntro(inductive, constructor, arguments) => {
            let inductive_value = eval(env, inductive)?;
            match inductive_value.as_ref() {
                Value::InductiveType(inductive_name, inductive_arguments) => {
                    let scope = inductive_scope(
                        env,
                        inductive_name,
                        inductive_arguments,
                        term.span,
                    )?;
                    let arguments = arguments
                        .iter()
                        .map(|argument| eval(&scope, argument))
                        .collect::<Result<_, _>>()?;
                    Ok(Arc::new(Value::InductiveIntro(
                        inductive_value.clone(),
                        constructor.clone(),
                        arguments,
                    )))
                }
                _ => Err(Message::NotAnInductive {
                    span: inductive.span,
                    found: read_back(&inductive_value)?,
                }),
            }
        }

        TermData::Match(scrutinees, clauses) => eval_match(env, scrutinees, clauses, term.span),

        TermData::RecordIntro(fields) => {
            let fields = fields
                .iter()
                .map(|(label, term)| Ok((label.clone(), eval(env, term)?)))
                .collect::<Result<_, Message>>()?;
            Ok(Arc::new(Value::RecordIntro(fields)))
        }
        TermData::RecordType(fields) => {
            let fields = fields
                .iter()
                .map(|(label, term)| Ok((label.clone(), eval(env, term)?)))
                .collect::<Result<_, Message>>()?;
            Ok(Arc::new(Value::RecordType(fields)))
        }
        TermData::RecordElim(head, label) => {
            let head_value = eval(env, head)?;
            match head_value.as_ref() {
                Value::RecordIntro(fields) => {
                    fields
                        .get(label)
                        .cloned()
                        .ok_or_else(|| Message::MissingField {
                            span: term.span,
                            label: label.clone(),
                        })
                }
                Value::Neutral(neutral) => Ok(Arc::new(Value::Neutral(Neutral::RecordElim(
                    Arc::new(neutral.clone()),
                    label.clone(),
                )))),
                _ => Err(Message::NotARecord {
                    span: head.span,
                    found: read_back(&head_value)?,
                }),
            }
        }
    }
}

/// Invoke a named function on argument terms.
///
/// Recursive functions only unfold on final arguments, and native functions
/// only run on final arguments; both are otherwise left as stuck calls.
fn invoke_function(
    env: &Environment,
    function: &FunctionDefinition,
    arguments: &[Arc<Term>],
    span: Span,
) -> Result<Arc<Value>, Message> {
    if function.params.len() != arguments.len() {
        return Err(Message::NotAFunction {
            span,
            found: Spanned::synthetic(TermData::Invoke(
                function.name.clone(),
                arguments.to_vec(),
            )),
        });
    }

    let argument_values = arguments
        .iter()
        .map(|argument| eval(env, argument))
        .collect::<Result<Vec<_>, _>>()?;
    let mut all_final = true;
    for argument_value in &argument_values {
        if !is_final(&read_back(argument_value)?) {
            all_final = false;
            break;
        }
    }

    match &function.body {
        FunctionBody::Term(body) => {
            if function.is_recursive && !all_final {
                return Ok(Arc::new(Value::Neutral(Neutral::Invoke(
                    function.name.clone(),
                    argument_values,
                ))));
            }
            let mut body_env = env.clone();
            for (param, argument_value) in Iterator::zip(function.params.iter(), &argument_values)
            {
                let param_type = eval(&body_env, &param.r#type)?;
                body_env = body_env.with_local(
                    param.name.clone(),
                    Typed::new(argument_value.clone(), param_type),
                );
            }
            eval(&body_env, body)
        }
        FunctionBody::Native(native) => {
            if all_final {
                (native.interpretation)(&argument_values)
            } else {
                Ok(Arc::new(Value::Neutral(Neutral::Invoke(
                    function.name.clone(),
                    argument_values,
                ))))
            }
        }
    }
}

fn eval_match(
    env: &Environment,
    scrutinees: &[Arc<Term>],
    clauses: &[Clause],
    span: Span,
) -> Result<Arc<Value>, Message> {
    let mut scrutinee_values = Vec::with_capacity(scrutinees.len());
    for scrutinee in scrutinees {
        let r#type = typing::infer(env, scrutinee)?;
        let value = eval(env, scrutinee)?;
        scrutinee_values.push(Typed::new(value, r#type));
    }

    for clause in clauses {
        if clause.patterns.len() != scrutinee_values.len() {
            continue;
        }
        if let Some(bindings) = match_clause(env, &clause.patterns, &scrutinee_values)? {
            let mut body_env = env.clone();
            for (var, typed) in bindings {
                body_env = body_env.with_local(var, typed);
            }
            return eval(&body_env, &clause.body);
        }
    }

    // No clause matched: over final scrutinees the match is genuinely
    // non-exhaustive, otherwise it is stuck and residualizes.
    let mut all_final = true;
    for typed in &scrutinee_values {
        if !is_final(&read_back(&typed.value)?) {
            all_final = false;
            break;
        }
    }
    if all_final {
        return Err(Message::NonExhaustiveMatch { span });
    }

    let mut neutral_clauses = Vec::with_capacity(clauses.len());
    for clause in clauses {
        let mut clause_env = env.clone();
        for (pattern, typed) in Iterator::zip(clause.patterns.iter(), &scrutinee_values) {
            clause_env = bind_pattern(&clause_env, pattern, &typed.r#type)?;
        }
        let body = eval(&clause_env, &clause.body)?;
        neutral_clauses.push(NeutralClause {
            patterns: clause.patterns.clone(),
            body,
        });
    }
    Ok(Arc::new(Value::Neutral(Neutral::Match(
        scrutinee_values.into_iter().map(|typed| typed.value).collect(),
        neutral_clauses,
    ))))
}

/// Attempt to match a clause's patterns against typed scrutinee values.
///
/// Returns the typed bindings produced by the match, or `None` if the clause
/// does not match. A neutral scrutinee makes a clause undecidable, which is
/// also reported as `None`: the caller decides whether to residualize.
pub fn match_clause(
    env: &Environment,
    patterns: &[Pattern],
    scrutinees: &[Typed],
) -> Result<Option<Vec<(LocalVar, Typed)>>, Message> {
    let mut bindings = Vec::new();
    for (pattern, typed) in Iterator::zip(patterns.iter(), scrutinees.iter()) {
        if !match_pattern(env, pattern, &typed.value, &typed.r#type, &mut bindings)? {
            return Ok(None);
        }
    }
    Ok(Some(bindings))
}

fn match_pattern(
    env: &Environment,
    pattern: &Pattern,
    value: &Arc<Value>,
    r#type: &Arc<Value>,
    bindings: &mut Vec<(LocalVar, Typed)>,
) -> Result<bool, Message> {
    match (pattern, value.as_ref()) {
        (Pattern::Binder(var), _) => {
            bindings.push((var.clone(), Typed::new(value.clone(), r#type.clone())));
            Ok(true)
        }
        (Pattern::Primitive(literal), Value::Primitive(found)) => Ok(literal == found),
        (Pattern::Variant(name, sub_patterns), Value::InductiveIntro(inductive, constructor, arguments)) => {
            if name != constructor || sub_patterns.len() != arguments.len() {
                return Ok(false);
            }
            let param_types =
                constructor_param_types(env, inductive, name, Some(arguments))?;
            for ((sub_pattern, argument), param_type) in Iterator::zip(
                Iterator::zip(sub_patterns.iter(), arguments.iter()),
                param_types.iter(),
            ) {
                if !match_pattern(env, sub_pattern, argument, param_type, bindings)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (Pattern::Record(field_patterns), Value::RecordIntro(fields)) => {
            let field_types = match r#type.as_ref() {
                Value::RecordType(field_types) => field_types,
                _ => return Ok(false),
            };
            for (label, sub_pattern) in field_patterns {
                let field_value = match fields.get(label) {
                    Some(field_value) => field_value,
                    None => return Ok(false),
                };
                let field_type = match field_types.get(label) {
                    Some(field_type) => field_type,
                    None => return Ok(false),
                };
                if !match_pattern(env, sub_pattern, field_value, field_type, bindings)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        // Undecidable or mismatched shapes.
        (_, _) => Ok(false),
    }
}

/// Bring a pattern's binders into scope as neutral variables, typed from the
/// scrutinee type. This is how clause bodies are evaluated while a match is
/// residualized, and how they are inferred.
pub fn bind_pattern(
    env: &Environment,
    pattern: &Pattern,
    r#type: &Arc<Value>,
) -> Result<Environment, Message> {
    match pattern {
        Pattern::Primitive(_) => Ok(env.clone()),
        Pattern::Binder(var) => Ok(env.with_local(
            var.clone(),
            Typed::new(Arc::new(Value::neutral_var(var.clone())), r#type.clone()),
        )),
        Pattern::Variant(name, sub_patterns) => match r#type.as_ref() {
            Value::InductiveType(_, _) => {
                let param_types = constructor_param_types(env, r#type, name, None)?;
                let mut env = env.clone();
                for (sub_pattern, param_type) in
                    Iterator::zip(sub_patterns.iter(), param_types.iter())
                {
                    env = bind_pattern(&env, sub_pattern, param_type)?;
                }
                Ok(env)
            }
            // The scrutinee type is itself undecided; the binders still need
            // to be in scope for the body to evaluate.
            _ => {
                let mut env = env.clone();
                for sub_pattern in sub_patterns {
                    env = bind_pattern(&env, sub_pattern, r#type)?;
                }
                Ok(env)
            }
        },
        Pattern::Record(field_patterns) => match r#type.as_ref() {
            Value::RecordType(field_types) => {
                let mut env = env.clone();
                for (label, sub_pattern) in field_patterns {
                    let field_type =
                        field_types
                            .get(label)
                            .ok_or_else(|| Message::MissingField {
                                span: Span::Synthetic,
                                label: label.clone(),
                            })?;
                    env = bind_pattern(&env, sub_pattern, field_type)?;
                }
                Ok(env)
            }
            _ => {
                let mut env = env.clone();
                for (_, sub_pattern) in field_patterns {
                    env = bind_pattern(&env, sub_pattern, r#type)?;
                }
                Ok(env)
            }
        },
    }
}

/// The types of a constructor's parameters, evaluated under the inductive's
/// argument bindings.
///
/// When the constructor's argument values are known they are bound while
/// later parameter types are evaluated; otherwise the parameters themselves
/// are bound as neutrals.
fn constructor_param_types(
    env: &Environment,
    inductive: &Arc<Value>,
    constructor_name: &str,
    arguments: Option<&[Arc<Value>]>,
) -> Result<Vec<Arc<Value>>, Message> {
    let (inductive_name, inductive_arguments) = match inductive.as_ref() {
        Value::InductiveType(name, arguments) => (name, arguments),
        _ => {
            return Err(Message::NotAnInductive {
                span: Span::Synthetic,
                found: read_back(inductive)?,
            })
        }
    };
    let scope = inductive_scope(env, inductive_name, inductive_arguments, Span::Synthetic)?;

    let definition = match scope.definition(inductive_name).map(Arc::as_ref) {
        Some(Definition::Inductive(inductive)) => inductive.clone(),
        _ => {
            return Err(Message::UnboundVariable {
                span: Span::Synthetic,
                name: inductive_name.clone(),
            })
        }
    };
    let constructor =
        definition
            .constructor(constructor_name)
            .ok_or_else(|| Message::UnboundVariable {
                span: Span::Synthetic,
                name: constructor_name.to_owned(),
            })?;

    let mut param_types = Vec::with_capacity(constructor.params.len());
    let mut scope = scope;
    for (index, param) in constructor.params.iter().enumerate() {
        let param_type = eval(&scope, &param.r#type)?;
        let param_value = match arguments.and_then(|arguments| arguments.get(index)) {
            Some(argument) => argument.clone(),
            None => Arc::new(Value::neutral_var(param.name.clone())),
        };
        scope = scope.with_local(param.name.clone(), Typed::new(param_value, param_type.clone()));
        param_types.push(param_type);
    }
    Ok(param_types)
}

/// Bind an inductive definition's parameters to type arguments.
fn inductive_scope(
    env: &Environment,
    inductive_name: &str,
    inductive_arguments: &[Arc<Value>],
    span: Span,
) -> Result<Environment, Message> {
    let definition = match env.definition(inductive_name).map(Arc::as_ref) {
        Some(Definition::Inductive(inductive)) => inductive.clone(),
        _ => {
            return Err(Message::UnboundVariable {
                span,
                name: inductive_name.to_owned(),
            })
        }
    };
    let mut scope = env.clone();
    for (param, argument) in Iterator::zip(definition.params.iter(), inductive_arguments.iter()) {
        let param_type = eval(&scope, &param.r#type)?;
        scope = scope.with_local(param.name.clone(), Typed::new(argument.clone(), param_type));
    }
    Ok(scope)
}

/// Fully normalise a term by first [evaluating][eval] it into a
/// [value][Value], then [reading it back][read_back] into a [term][Term].
pub fn normalize(env: &Environment, term: &Term) -> Result<Term, Message> {
    read_back(&*eval(env, term)?)
}

/// Read a value back into the term syntax, in canonical form.
///
/// Closures are instantiated with fresh variables, so read-back is the
/// inverse of evaluation only up to alpha-renaming.
pub fn read_back(value: &Value) -> Result<Term, Message> {
    match value {
        Value::Universe => Ok(Spanned::synthetic(TermData::Universe)),
        Value::Primitive(literal) => Ok(Spanned::synthetic(TermData::Primitive(literal.clone()))),
        Value::PrimitiveType(literal_type) => {
            Ok(Spanned::synthetic(TermData::PrimitiveType(*literal_type)))
        }

        Value::FunctionType(param_type, closure) => {
            let (param, body) = read_back_closure(param_type, closure)?;
            Ok(Spanned::synthetic(TermData::FunctionType(
                param,
                Arc::new(body),
            )))
        }
        Value::PairType(param_type, closure) => {
            let (param, body) = read_back_closure(param_type, closure)?;
            Ok(Spanned::synthetic(TermData::PairType(param, Arc::new(body))))
        }
        Value::FunctionIntro(param_type, closure) => {
            let (param, body) = read_back_closure(param_type, closure)?;
            Ok(Spanned::synthetic(TermData::FunctionIntro(
                param,
                Arc::new(body),
            )))
        }

        Value::OverloadedFunctionType(states) => {
            let states = read_back_states(states)?;
            Ok(Spanned::synthetic(TermData::OverloadedFunctionType(states)))
        }
        Value::OverloadedFunctionIntro(states) => {
            let states = read_back_states(states)?;
            Ok(Spanned::synthetic(TermData::OverloadedFunctionIntro(states)))
        }

        Value::InductiveType(name, arguments) => {
            let arguments = arguments
                .iter()
                .map(|argument| Ok(Arc::new(read_back(argument)?)))
                .collect::<Result<_, Message>>()?;
            Ok(Spanned::synthetic(TermData::InductiveType(
                name.clone(),
                arguments,
            )))
        }
        Value::InductiveIntro(inductive, constructor, arguments) => {
            let arguments = arguments
                .iter()
                .map(|argument| Ok(Arc::new(read_back(argument)?)))
                .collect::<Result<_, Message>>()?;
            Ok(Spanned::synthetic(TermData::InductiveIntro(
                Arc::new(read_back(inductive)?),
                constructor.clone(),
                arguments,
            )))
        }

        Value::RecordIntro(fields) => {
            let fields = fields
                .iter()
                .map(|(label, value)| Ok((label.clone(), Arc::new(read_back(value)?))))
                .collect::<Result<_, Message>>()?;
            Ok(Spanned::synthetic(TermData::RecordIntro(fields)))
        }
        Value::RecordType(fields) => {
            let fields = fields
                .iter()
                .map(|(label, value)| Ok((label.clone(), Arc::new(read_back(value)?))))
                .collect::<Result<_, Message>>()?;
            Ok(Spanned::synthetic(TermData::RecordType(fields)))
        }

        Value::Neutral(neutral) => read_back_neutral(neutral),
    }
}

/// Read a closure back into a parameter and a body term, instantiating it
/// with a fresh variable named after the original parameter.
fn read_back_closure(
    param_type: &Arc<Value>,
    closure: &Closure,
) -> Result<(Parameter, Term), Message> {
    let var = closure.param().renamed();
    let body = closure.apply(
        Arc::new(Value::neutral_var(var.clone())),
        param_type.clone(),
    )?;
    Ok((
        Parameter::new(var, Arc::new(read_back(param_type)?)),
        read_back(&body)?,
    ))
}

fn read_back_states(
    states: &[(Arc<Value>, Closure)],
) -> Result<Vec<(Parameter, Arc<Term>)>, Message> {
    states
        .iter()
        .map(|(param_type, closure)| {
            let (param, body) = read_back_closure(param_type, closure)?;
            Ok((param, Arc::new(body)))
        })
        .collect()
}

/// Read a neutral value back into the term syntax.
fn read_back_neutral(neutral: &Neutral) -> Result<Term, Message> {
    match neutral {
        Neutral::Var(var) => Ok(Spanned::synthetic(TermData::Var(var.clone()))),
        Neutral::FunctionElim(head, argument) => Ok(Spanned::synthetic(TermData::FunctionElim(
            Arc::new(read_back_neutral(head)?),
            Arc::new(read_back(argument)?),
        ))),
        Neutral::RecordElim(head, label) => Ok(Spanned::synthetic(TermData::RecordElim(
            Arc::new(read_back_neutral(head)?),
            label.clone(),
        ))),
        Neutral::Match(scrutinees, clauses) => {
            let scrutinees = scrutinees
                .iter()
                .map(|scrutinee| Ok(Arc::new(read_back(scrutinee)?)))
                .collect::<Result<_, Message>>()?;
            let clauses = clauses
                .iter()
                .map(|clause| {
                    Ok(Clause::new(
                        clause.patterns.clone(),
                        Arc::new(read_back(&clause.body)?),
                    ))
                })
                .collect::<Result<_, Message>>()?;
            Ok(Spanned::synthetic(TermData::Match(scrutinees, clauses)))
        }
        Neutral::Invoke(name, arguments) => {
            let arguments = arguments
                .iter()
                .map(|argument| Ok(Arc::new(read_back(argument)?)))
                .collect::<Result<_, Message>>()?;
            Ok(Spanned::synthetic(TermData::Invoke(
                name.clone(),
                arguments,
            )))
        }
    }
}

/// Check that one value is computationally equal to another value.
///
/// Values are compared through their read-back terms, with alpha-renaming of
/// binders and eta-conversion of functions.
pub fn is_equal(value0: &Arc<Value>, value1: &Arc<Value>) -> Result<bool, Message> {
    Ok(is_equal_term(&read_back(value0)?, &read_back(value1)?))
}

/// Check that one value is a subtype of another.
///
/// This is currently the reflexive closure of [`is_equal`], which makes the
/// two relations coincide. It is kept as a distinct entry point because the
/// overload machinery uses it directionally.
pub fn is_subtype(value0: &Arc<Value>, value1: &Arc<Value>) -> Result<bool, Message> {
    is_equal(value0, value1)
}

/// Structural equivalence of terms up to alpha-renaming and eta-conversion.
pub fn is_equal_term(term0: &Term, term1: &Term) -> bool {
    equal_term(term0, term1, &mut Vec::new())
}

fn equal_var(var0: &LocalVar, var1: &LocalVar, renaming: &[(u64, u64)]) -> bool {
    // The innermost renaming that mentions either side decides.
    for (id0, id1) in renaming.iter().rev() {
        if *id0 == var0.id() || *id1 == var1.id() {
            return *id0 == var0.id() && *id1 == var1.id();
        }
    }
    var0 == var1
}

fn equal_term(term0: &Term, term1: &Term, renaming: &mut Vec<(u64, u64)>) -> bool {
    match (&term0.data, &term1.data) {
        (TermData::Universe, TermData::Universe) => true,
        (TermData::Primitive(literal0), TermData::Primitive(literal1)) => literal0 == literal1,
        (TermData::PrimitiveType(type0), TermData::PrimitiveType(type1)) => type0 == type1,
        (TermData::Var(var0), TermData::Var(var1)) => equal_var(var0, var1, renaming),

        (TermData::FunctionType(param0, body0), TermData::FunctionType(param1, body1))
        | (TermData::PairType(param0, body0), TermData::PairType(param1, body1))
        | (TermData::FunctionIntro(param0, body0), TermData::FunctionIntro(param1, body1)) => {
            equal_term(&param0.r#type, &param1.r#type, renaming) && {
                renaming.push((param0.name.id(), param1.name.id()));
                let result = equal_term(body0, body1, renaming);
                renaming.pop();
                result
            }
        }

        // Eta-conversion: a function introduction matches any term that
        // behaves the same when applied to the introduction's parameter.
        (TermData::FunctionIntro(param, body), _) => {
            equal_term(body, &eta_expand(term1, param), renaming)
        }
        (_, TermData::FunctionIntro(param, body)) => {
            equal_term(&eta_expand(term0, param), body, renaming)
        }

        (
            TermData::OverloadedFunctionType(states0),
            TermData::OverloadedFunctionType(states1),
        )
        | (
            TermData::OverloadedFunctionIntro(states0),
            TermData::OverloadedFunctionIntro(states1),
        ) => equal_states(states0, states1, renaming),

        (TermData::Invoke(name0, args0), TermData::Invoke(name1, args1))
        | (TermData::InvokeOverloaded(name0, args0), TermData::InvokeOverloaded(name1, args1))
        | (TermData::InductiveType(name0, args0), TermData::InductiveType(name1, args1)) => {
            name0 == name1 && equal_spine(args0, args1, renaming)
        }
        (
            TermData::InductiveIntro(inductive0, constructor0, args0),
            TermData::InductiveIntro(inductive1, constructor1, args1),
        ) => {
            constructor0 == constructor1
                && equal_term(inductive0, inductive1, renaming)
                && equal_spine(args0, args1, renaming)
        }

        (TermData::FunctionElim(head0, arg0), TermData::FunctionElim(head1, arg1)) => {
            equal_term(head0, head1, renaming) && equal_term(arg0, arg1, renaming)
        }

        (TermData::RecordIntro(fields0), TermData::RecordIntro(fields1))
        | (TermData::RecordType(fields0), TermData::RecordType(fields1)) => {
            fields0.len() == fields1.len()
                && Iterator::zip(fields0.iter(), fields1.iter()).all(
                    |((label0, term0), (label1, term1))| {
                        label0 == label1 && equal_term(term0, term1, renaming)
                    },
                )
        }
        (TermData::RecordElim(head0, label0), TermData::RecordElim(head1, label1)) => {
            label0 == label1 && equal_term(head0, head1, renaming)
        }

        (TermData::Match(scrutinees0, clauses0), TermData::Match(scrutinees1, clauses1)) => {
            equal_spine(scrutinees0, scrutinees1, renaming)
                && clauses0.len() == clauses1.len()
                && Iterator::zip(clauses0.iter(), clauses1.iter())
                    .all(|(clause0, clause1)| equal_clause(clause0, clause1, renaming))
        }

        (_, _) => false,
    }
}

fn eta_expand(term: &Term, param: &Parameter) -> Term {
    Spanned::synthetic(TermData::FunctionElim(
        Arc::new(term.clone()),
        Arc::new(Spanned::synthetic(TermData::Var(param.name.clone()))),
    ))
}

fn equal_spine(args0: &[Arc<Term>], args1: &[Arc<Term>], renaming: &mut Vec<(u64, u64)>) -> bool {
    args0.len() == args1.len()
        && Iterator::zip(args0.iter(), args1.iter())
            .all(|(arg0, arg1)| equal_term(arg0, arg1, renaming))
}

fn equal_clause(clause0: &Clause, clause1: &Clause, renaming: &mut Vec<(u64, u64)>) -> bool {
    if clause0.patterns.len() != clause1.patterns.len() {
        return false;
    }
    let initial_len = renaming.len();
    let patterns_equal =
        Iterator::zip(clause0.patterns.iter(), clause1.patterns.iter())
            .all(|(pattern0, pattern1)| equal_pattern(pattern0, pattern1, renaming));
    let result = patterns_equal && equal_term(&clause0.body, &clause1.body, renaming);
    renaming.truncate(initial_len);
    result
}

fn equal_pattern(pattern0: &Pattern, pattern1: &Pattern, renaming: &mut Vec<(u64, u64)>) -> bool {
    match (pattern0, pattern1) {
        (Pattern::Primitive(literal0), Pattern::Primitive(literal1)) => literal0 == literal1,
        (Pattern::Binder(var0), Pattern::Binder(var1)) => {
            renaming.push((var0.id(), var1.id()));
            true
        }
        (Pattern::Variant(name0, subs0), Pattern::Variant(name1, subs1)) => {
            name0 == name1
                && subs0.len() == subs1.len()
                && Iterator::zip(subs0.iter(), subs1.iter())
                    .all(|(sub0, sub1)| equal_pattern(sub0, sub1, renaming))
        }
        (Pattern::Record(fields0), Pattern::Record(fields1)) => {
            fields0.len() == fields1.len()
                && Iterator::zip(fields0.iter(), fields1.iter()).all(
                    |((label0, sub0), (label1, sub1))| {
                        label0 == label1 && equal_pattern(sub0, sub1, renaming)
                    },
                )
        }
        (_, _) => false,
    }
}

/// Overloaded states compare as maps whose keys are parameter types up to
/// unification: both sides must have the same quotient, with unifiable
/// codomains for corresponding keys.
fn equal_states(
    states0: &[(Parameter, Arc<Term>)],
    states1: &[(Parameter, Arc<Term>)],
    renaming: &mut Vec<(u64, u64)>,
) -> bool {
    if states0.len() != states1.len() {
        return false;
    }
    let mut used = vec![false; states1.len()];
    'states: for (param0, body0) in states0 {
        for (index, (param1, body1)) in states1.iter().enumerate() {
            if used[index] {
                continue;
            }
            if equal_term(&param0.r#type, &param1.r#type, renaming) {
                renaming.push((param0.name.id(), param1.name.id()));
                let bodies_equal = equal_term(body0, body1, renaming);
                renaming.pop();
                if bodies_equal {
                    used[index] = true;
                    continue 'states;
                }
            }
        }
        return false;
    }
    true
}

/// Whether a term is ground enough for strict elimination: all of its free
/// variables are bound within the term itself.
///
/// Native functions are only invoked on final arguments, and a match over
/// final scrutinees may be judged exhaustive.
pub fn is_final(term: &Term) -> bool {
    final_term(term, &mut Vec::new())
}

fn final_term(term: &Term, bound: &mut Vec<u64>) -> bool {
    match &term.data {
        TermData::Universe | TermData::Primitive(_) | TermData::PrimitiveType(_) => true,
        TermData::Var(var) => bound.contains(&var.id()),

        TermData::Invoke(_, args)
        | TermData::InvokeOverloaded(_, args)
        | TermData::InductiveType(_, args) => args.iter().all(|arg| final_term(arg, bound)),
        TermData::InductiveIntro(inductive, _, args) => {
            final_term(inductive, bound) && args.iter().all(|arg| final_term(arg, bound))
        }

        TermData::FunctionType(param, body)
        | TermData::PairType(param, body)
        | TermData::FunctionIntro(param, body) => {
            final_term(&param.r#type, bound) && {
                bound.push(param.name.id());
                let result = final_term(body, bound);
                bound.pop();
                result
            }
        }
        TermData::OverloadedFunctionType(states) | TermData::OverloadedFunctionIntro(states) => {
            states.iter().all(|(param, body)| {
                final_term(&param.r#type, bound) && {
                    bound.push(param.name.id());
                    let result = final_term(body, bound);
                    bound.pop();
                    result
                }
            })
        }
        TermData::FunctionElim(head, arg) => final_term(head, bound) && final_term(arg, bound),

        TermData::Match(scrutinees, clauses) => {
            scrutinees.iter().all(|scrutinee| final_term(scrutinee, bound))
                && clauses.iter().all(|clause| {
                    let initial_len = bound.len();
                    let mut binders = Vec::new();
                    for pattern in &clause.patterns {
                        pattern.binders(&mut binders);
                    }
                    bound.extend(binders.iter().map(LocalVar::id));
                    let result = final_term(&clause.body, bound);
                    bound.truncate(initial_len);
                    result
                })
        }

        TermData::RecordIntro(fields) | TermData::RecordType(fields) => {
            fields.iter().all(|(_, term)| final_term(term, bound))
        }
        TermData::RecordElim(head, _) => final_term(head, bound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    fn term(data: TermData) -> Term {
        Spanned::synthetic(data)
    }

    fn int_type() -> Arc<Term> {
        Arc::new(term(TermData::PrimitiveType(LiteralType::Int)))
    }

    #[test]
    fn finality() {
        let x = LocalVar::fresh("x");

        assert!(is_final(&term(TermData::Primitive(Literal::Int(
            BigInt::from(1)
        )))));
        assert!(!is_final(&term(TermData::Var(x.clone()))));

        // Bound within the term itself.
        assert!(is_final(&term(TermData::FunctionIntro(
            Parameter::new(x.clone(), int_type()),
            Arc::new(term(TermData::Var(x))),
        ))));
    }

    #[test]
    fn match_binders_are_locally_bound() {
        let x = LocalVar::fresh("x");
        let scrutinee = Arc::new(term(TermData::Primitive(Literal::Bool(true))));
        let clause = Clause::new(
            vec![Pattern::Binder(x.clone())],
            Arc::new(term(TermData::Var(x))),
        );

        assert!(is_final(&term(TermData::Match(vec![scrutinee], vec![clause]))));
    }

    #[test]
    fn alpha_renamed_binders_are_equal() {
        let x = LocalVar::fresh("x");
        let y = LocalVar::fresh("y");

        let term0 = term(TermData::FunctionIntro(
            Parameter::new(x.clone(), int_type()),
            Arc::new(term(TermData::Var(x))),
        ));
        let term1 = term(TermData::FunctionIntro(
            Parameter::new(y.clone(), int_type()),
            Arc::new(term(TermData::Var(y))),
        ));

        assert!(is_equal_term(&term0, &term1));
    }

    #[test]
    fn shadowed_binders_rename_positionally() {
        let x = LocalVar::fresh("x");
        let y = LocalVar::fresh("y");

        // fun (x : Int) => fun (y : Int) => y  vs  fun (x : Int) => fun (x : Int) => x
        let term0 = term(TermData::FunctionIntro(
            Parameter::new(x.clone(), int_type()),
            Arc::new(term(TermData::FunctionIntro(
                Parameter::new(y.clone(), int_type()),
                Arc::new(term(TermData::Var(y.clone()))),
            ))),
        ));
        let term1 = term(TermData::FunctionIntro(
            Parameter::new(x.clone(), int_type()),
            Arc::new(term(TermData::FunctionIntro(
                Parameter::new(x.clone(), int_type()),
                Arc::new(term(TermData::Var(x.clone()))),
            ))),
        ));
        assert!(is_equal_term(&term0, &term1));

        // fun (x : Int) => fun (y : Int) => x  is not the same function.
        let term2 = term(TermData::FunctionIntro(
            Parameter::new(x.clone(), int_type()),
            Arc::new(term(TermData::FunctionIntro(
                Parameter::new(y, int_type()),
                Arc::new(term(TermData::Var(x))),
            ))),
        ));
        assert!(!is_equal_term(&term0, &term2));
    }

    #[test]
    fn eta_expanded_variables_are_equal() {
        let f = LocalVar::fresh("f");
        let x = LocalVar::fresh("x");

        let expanded = term(TermData::FunctionIntro(
            Parameter::new(x.clone(), int_type()),
            Arc::new(term(TermData::FunctionElim(
                Arc::new(term(TermData::Var(f.clone()))),
                Arc::new(term(TermData::Var(x))),
            ))),
        ));

        assert!(is_equal_term(&expanded, &term(TermData::Var(f.clone()))));
        assert!(is_equal_term(&term(TermData::Var(f.clone())), &expanded));

        let g = LocalVar::fresh("g");
        assert!(!is_equal_term(&expanded, &term(TermData::Var(g))));
    }
}
