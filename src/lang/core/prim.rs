//! The native prelude.
//!
//! A small set of host-implemented functions over the ground literal types.
//! Native implementations only ever run on final arguments (stuck calls
//! stay neutral), so marshalling failures indicate ill-typed input.

use num_bigint::BigInt;
use num_traits::ToPrimitive;
use std::sync::Arc;

use crate::lang::core::semantics::{self, Value};
use crate::lang::core::{
    Definition, FunctionBody, FunctionDefinition, Literal, LiteralType, LocalVar, NativeFunction,
    Parameter, TermData,
};
use crate::lang::{Span, Spanned};
use crate::reporting::Message;

// Helper traits for marshalling between Rust values and Prism values.

trait PrimType {
    const TYPE: LiteralType;
}

trait IntoValue {
    fn into_value(self) -> Arc<Value>;
}

trait TryFromValueRef: Sized {
    fn try_from_value_ref(src: &Value) -> Result<&Self, Message>;
}

macro_rules! impl_prim_value {
    ($T:ty, $Variant:ident) => {
        impl PrimType for $T {
            const TYPE: LiteralType = LiteralType::$Variant;
        }

        impl IntoValue for $T {
            fn into_value(self) -> Arc<Value> {
                Arc::new(Value::Primitive(Literal::$Variant(self)))
            }
        }

        impl TryFromValueRef for $T {
            fn try_from_value_ref(src: &Value) -> Result<&Self, Message> {
                match src {
                    Value::Primitive(Literal::$Variant(x)) => Ok(x),
                    _ => Err(Message::TypeMismatch {
                        span: Span::Synthetic,
                        expected: Spanned::synthetic(TermData::PrimitiveType(
                            LiteralType::$Variant,
                        )),
                        found: semantics::read_back(src)?,
                    }),
                }
            }
        }
    };
}

impl_prim_value!(bool, Bool);
impl_prim_value!(BigInt, Int);
impl_prim_value!(f64, Float);
impl_prim_value!(char, Char);
impl_prim_value!(String, String);

/// The default definitions registered by [`Environment::default`].
///
/// [`Environment::default`]: crate::lang::core::env::Environment::default
pub fn default_definitions() -> Vec<Definition> {
    /// Boilerplate macro for counting the number of supplied token trees.
    macro_rules! count {
        () => (0_usize);
        ( $x:tt $($xs:tt)* ) => (1_usize + count!($($xs)*));
    }

    /// Define a native function.
    macro_rules! prim {
        ($name:literal, fn($($param_name:ident : $PType:ty),*) -> $RType:ty $body:block) => {{
            fn interpretation(inputs: &[Arc<Value>]) -> Result<Arc<Value>, Message> {
                debug_assert_eq!(inputs.len(), count!($($param_name)*));
                let mut input_index = 0;
                $(
                    input_index += 1;
                    let $param_name = <$PType>::try_from_value_ref(&inputs[input_index - 1])?;
                )*
                Ok(<$RType>::into_value($body))
            }

            Definition::Function(FunctionDefinition {
                name: String::from($name),
                params: vec![$(Parameter::new(
                    LocalVar::fresh(stringify!($param_name)),
                    Arc::new(Spanned::synthetic(TermData::PrimitiveType(
                        <$PType as PrimType>::TYPE,
                    ))),
                )),*],
                result_type: Arc::new(Spanned::synthetic(TermData::PrimitiveType(
                    <$RType as PrimType>::TYPE,
                ))),
                is_recursive: false,
                body: FunctionBody::Native(NativeFunction { interpretation }),
            })
        }};
    }

    vec![
        prim!("int-add", fn(x: BigInt, y: BigInt) -> BigInt { x + y }),
        prim!("int-sub", fn(x: BigInt, y: BigInt) -> BigInt { x - y }),
        prim!("int-mul", fn(x: BigInt, y: BigInt) -> BigInt { x * y }),
        prim!("int-eq", fn(x: BigInt, y: BigInt) -> bool { x == y }),
        prim!("int-lt", fn(x: BigInt, y: BigInt) -> bool { x < y }),
        prim!("int-to-float", fn(x: BigInt) -> f64 { x.to_f64().unwrap_or(f64::NAN) }),
        prim!("int-to-string", fn(x: BigInt) -> String { x.to_string() }),

        prim!("float-add", fn(x: f64, y: f64) -> f64 { x + y }),
        prim!("float-mul", fn(x: f64, y: f64) -> f64 { x * y }),

        prim!("bool-not", fn(x: bool) -> bool { !*x }),
        prim!("bool-and", fn(x: bool, y: bool) -> bool { *x && *y }),
        prim!("bool-or", fn(x: bool, y: bool) -> bool { *x || *y }),

        prim!("char-to-string", fn(x: char) -> String { x.to_string() }),

        prim!("string-append", fn(x: String, y: String) -> String { x.clone() + y }),
        prim!("string-length", fn(x: String) -> BigInt { BigInt::from(x.chars().count()) }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::core::env::Environment;
    use crate::lang::core::semantics::eval;

    fn int(value: i32) -> Arc<crate::lang::core::Term> {
        Arc::new(Spanned::synthetic(TermData::Primitive(Literal::Int(
            BigInt::from(value),
        ))))
    }

    #[test]
    fn int_add() {
        let env = Environment::default();
        let term = Spanned::synthetic(TermData::Invoke("int-add".to_owned(), vec![int(1), int(2)]));

        match eval(&env, &term).unwrap().as_ref() {
            Value::Primitive(Literal::Int(result)) => assert_eq!(*result, BigInt::from(3)),
            value => panic!("expected an integer, found {:?}", value),
        }
    }

    #[test]
    fn string_append() {
        let env = Environment::default();
        let string = |s: &str| {
            Arc::new(Spanned::synthetic(TermData::Primitive(Literal::String(
                s.to_owned(),
            ))))
        };
        let term = Spanned::synthetic(TermData::Invoke(
            "string-append".to_owned(),
            vec![string("foo"), string("bar")],
        ));

        match eval(&env, &term).unwrap().as_ref() {
            Value::Primitive(Literal::String(result)) => assert_eq!(result, "foobar"),
            value => panic!("expected a string, found {:?}", value),
        }
    }
}
