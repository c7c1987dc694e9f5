//! The semantic core of the Prism language.
//!
//! Prism is a dependently-typed functional language with type-directed
//! overloading. This crate implements the core the elaborator targets:
//!
//! - evaluation of core terms into values, using normalisation by
//!   evaluation ([`lang::core::semantics::eval`])
//! - type inference over dependent function types
//!   ([`lang::core::typing::infer`])
//! - read-back of values into canonical terms and full normalization
//!   ([`lang::core::semantics::read_back`],
//!   [`lang::core::semantics::normalize`])
//! - unification with alpha-renaming and eta-conversion, and the subtyping
//!   relation layered over it ([`lang::core::semantics::is_equal`],
//!   [`lang::core::semantics::is_subtype`])
//! - pattern matching with residualization over neutral scrutinees
//! - resolution of overloaded definitions and collapse of overloaded
//!   function superpositions ([`lang::core::overload`])
//!
//! The surface syntax, parser, and elaborator live elsewhere: this crate
//! receives fully elaborated terms together with a definition environment,
//! and reports failures as [`reporting::Message`]s carrying opaque source
//! spans.

pub mod lang;
pub mod reporting;

pub use lang::core::env::{Environment, Typed};
pub use lang::core::semantics::{
    eval, is_equal, is_subtype, normalize, read_back, Value,
};
pub use lang::core::typing::infer;
pub use reporting::Message;
