//! Integration tests for type inference, unification, and overloads.

mod support;

use std::sync::Arc;

use prism::lang::core::semantics::Value;
use prism::lang::core::{Literal, LiteralType, LocalVar, Pattern};
use prism::{eval, infer, is_equal, is_subtype, normalize, Environment, Message, Typed};

use support::*;

fn bind_neutral(
    env: &Environment,
    var: &LocalVar,
    r#type: &Arc<prism::lang::core::Term>,
) -> Environment {
    let r#type = eval(env, r#type).unwrap();
    env.with_local(
        var.clone(),
        Typed::new(Arc::new(Value::neutral_var(var.clone())), r#type),
    )
}

fn assert_primitive_type(value: &Value, expected: LiteralType) {
    match value {
        Value::PrimitiveType(found) => assert_eq!(*found, expected),
        value => panic!("expected `{}`, found {:?}", expected.name(), value),
    }
}

mod infer_term {
    use super::*;

    #[test]
    fn literals() {
        let env = Environment::new();

        assert_primitive_type(&infer(&env, &int(3)).unwrap(), LiteralType::Int);
        assert_primitive_type(&infer(&env, &boolean(true)).unwrap(), LiteralType::Bool);
        assert_primitive_type(&infer(&env, &string("hi")).unwrap(), LiteralType::String);
    }

    #[test]
    fn types_inhabit_the_universe() {
        let env = Environment::new();
        let x = LocalVar::fresh("x");

        for r#type in [
            universe(),
            int_type(),
            pi(&x, int_type(), int_type()),
            record_type(vec![("a", int_type())]),
        ] {
            match infer(&env, &r#type).unwrap().as_ref() {
                Value::Universe => {}
                value => panic!("expected `Type`, found {:?}", value),
            }
        }
    }

    #[test]
    fn identity_application() {
        let env = Environment::new();
        let x = LocalVar::fresh("x");
        let id = lam(&x, int_type(), var(&x));

        assert_primitive_type(&infer(&env, &app(id, int(3))).unwrap(), LiteralType::Int);
    }

    #[test]
    fn lambda_infers_function_type() {
        let env = Environment::new();
        let x = LocalVar::fresh("x");
        let y = LocalVar::fresh("y");

        let inferred = infer(&env, &lam(&x, int_type(), var(&x))).unwrap();
        let expected = eval(&env, &pi(&y, int_type(), int_type())).unwrap();
        assert!(is_equal(&inferred, &expected).unwrap());
    }

    #[test]
    fn dependent_application() {
        // f : (n : Int) -> Vec n
        let f = LocalVar::fresh("f");
        let n = LocalVar::fresh("n");
        let f_type = pi(&n, int_type(), ind_type("Vec", vec![var(&n)]));
        let env = bind_neutral(&Environment::new(), &f, &f_type);

        let inferred = infer(&env, &app(var(&f), int(2))).unwrap();
        let expected = eval(&env, &ind_type("Vec", vec![int(2)])).unwrap();
        assert!(is_equal(&inferred, &expected).unwrap());
    }

    #[test]
    fn application_argument_mismatch() {
        let env = Environment::new();
        let x = LocalVar::fresh("x");
        let id = lam(&x, int_type(), var(&x));

        match infer(&env, &app(id, string("hi"))) {
            Err(Message::TypeMismatch { .. }) => {}
            result => panic!("expected a type mismatch, found {:?}", result),
        }
    }

    #[test]
    fn record_types() {
        let env = Environment::new();
        let term = record(vec![("a", int(1)), ("b", string("two"))]);

        match infer(&env, &term).unwrap().as_ref() {
            Value::RecordType(fields) => {
                assert_primitive_type(&fields["a"], LiteralType::Int);
                assert_primitive_type(&fields["b"], LiteralType::String);
            }
            value => panic!("expected a record type, found {:?}", value),
        }

        assert_primitive_type(
            &infer(&env, &proj(term.clone(), "a")).unwrap(),
            LiteralType::Int,
        );
        match infer(&env, &proj(term, "c")) {
            Err(Message::MissingField { label, .. }) => assert_eq!(label, "c"),
            result => panic!("expected a missing field error, found {:?}", result),
        }
    }

    #[test]
    fn match_clauses_agree() {
        let env = Environment::new();
        let x = LocalVar::fresh("x");
        let env = bind_neutral(&env, &x, &bool_type());

        let term = match_term(
            vec![var(&x)],
            vec![
                clause(vec![Pattern::Primitive(Literal::Bool(true))], int(1)),
                clause(vec![Pattern::Primitive(Literal::Bool(false))], int(0)),
            ],
        );
        assert_primitive_type(&infer(&env, &term).unwrap(), LiteralType::Int);
    }

    #[test]
    fn match_clauses_disagree() {
        let env = Environment::new();
        let x = LocalVar::fresh("x");
        let env = bind_neutral(&env, &x, &bool_type());

        let term = match_term(
            vec![var(&x)],
            vec![
                clause(vec![Pattern::Primitive(Literal::Bool(true))], int(1)),
                clause(vec![Pattern::Primitive(Literal::Bool(false))], string("no")),
            ],
        );
        match infer(&env, &term) {
            Err(Message::ClauseTypeMismatch { .. }) => {}
            result => panic!("expected a clause type mismatch, found {:?}", result),
        }
    }

    #[test]
    fn soundness_of_normalization() {
        let env = Environment::new();
        let x = LocalVar::fresh("x");
        let term = app(lam(&x, int_type(), var(&x)), int(3));

        let normalized = normalize(&env, &term).unwrap();
        let type0 = infer(&env, &term).unwrap();
        let type1 = infer(&env, &normalized).unwrap();
        assert!(is_equal(&type0, &type1).unwrap());
    }
}

mod overloads {
    use super::*;

    #[test]
    fn resolves_by_argument_type() {
        let env = Environment::new().define(show_definition(false));

        match eval(&env, &invoke_overloaded("show", vec![int(42)]))
            .unwrap()
            .as_ref()
        {
            Value::Primitive(Literal::String(result)) => assert_eq!(result, "int"),
            value => panic!("expected `\"int\"`, found {:?}", value),
        }

        match eval(&env, &invoke_overloaded("show", vec![string("hi")]))
            .unwrap()
            .as_ref()
        {
            Value::Primitive(Literal::String(result)) => assert_eq!(result, "string"),
            value => panic!("expected `\"string\"`, found {:?}", value),
        }
    }

    #[test]
    fn resolution_is_order_independent() {
        for reversed in [false, true] {
            let env = Environment::new().define(show_definition(reversed));

            match eval(&env, &invoke_overloaded("show", vec![int(42)]))
                .unwrap()
                .as_ref()
            {
                Value::Primitive(Literal::String(result)) => assert_eq!(result, "int"),
                value => panic!("expected `\"int\"`, found {:?}", value),
            }
        }
    }

    #[test]
    fn no_candidate_matches() {
        let env = Environment::new().define(show_definition(false));

        match eval(&env, &invoke_overloaded("show", vec![boolean(true)])) {
            Err(Message::OverloadNoMatch { name, .. }) => {
                assert_eq!(name.as_deref(), Some("show"));
            }
            result => panic!("expected an overload error, found {:?}", result),
        }
    }

    #[test]
    fn infers_resolved_result_type() {
        let env = Environment::new().define(show_definition(false));

        assert_primitive_type(
            &infer(&env, &invoke_overloaded("show", vec![int(42)])).unwrap(),
            LiteralType::String,
        );
    }

    #[test]
    fn overloaded_lambda_infers_superposed_type() {
        let env = Environment::new();
        let s0 = LocalVar::fresh("s");
        let s1 = LocalVar::fresh("s");
        let term = overloaded_lam(vec![
            (s0, int_type(), string("int")),
            (s1, string_type(), string("string")),
        ]);

        match infer(&env, &term).unwrap().as_ref() {
            Value::OverloadedFunctionType(states) => assert_eq!(states.len(), 2),
            value => panic!("expected a superposed function type, found {:?}", value),
        }

        // Application against the superposed type picks the matching state.
        assert_primitive_type(
            &infer(&env, &app(term, int(42))).unwrap(),
            LiteralType::String,
        );
    }
}

mod unification {
    use super::*;

    #[test]
    fn subtyping_is_reflexive() {
        let env = Environment::new();
        let int_value = eval(&env, &int_type()).unwrap();
        let string_value = eval(&env, &string_type()).unwrap();

        assert!(is_subtype(&int_value, &int_value).unwrap());
        assert!(!is_subtype(&int_value, &string_value).unwrap());
    }

    #[test]
    fn pi_types_unify_up_to_alpha() {
        let env = Environment::new();
        let x = LocalVar::fresh("x");
        let y = LocalVar::fresh("y");

        let type0 = eval(&env, &pi(&x, int_type(), int_type())).unwrap();
        let type1 = eval(&env, &pi(&y, int_type(), int_type())).unwrap();
        assert!(is_equal(&type0, &type1).unwrap());
    }

    #[test]
    fn dependent_pi_types_unify() {
        let env = Environment::new();
        let x = LocalVar::fresh("x");
        let y = LocalVar::fresh("y");

        let type0 = eval(&env, &pi(&x, int_type(), ind_type("Vec", vec![var(&x)]))).unwrap();
        let type1 = eval(&env, &pi(&y, int_type(), ind_type("Vec", vec![var(&y)]))).unwrap();
        assert!(is_equal(&type0, &type1).unwrap());

        let type2 = eval(&env, &pi(&y, int_type(), ind_type("Vec", vec![int(0)]))).unwrap();
        assert!(!is_equal(&type0, &type2).unwrap());
    }

    #[test]
    fn records_unify_pointwise() {
        let env = Environment::new();

        let type0 = eval(&env, &record_type(vec![("a", int_type()), ("b", bool_type())])).unwrap();
        let type1 = eval(&env, &record_type(vec![("b", bool_type()), ("a", int_type())])).unwrap();
        let type2 = eval(&env, &record_type(vec![("a", int_type())])).unwrap();

        assert!(is_equal(&type0, &type1).unwrap());
        assert!(!is_equal(&type0, &type2).unwrap());
    }
}
