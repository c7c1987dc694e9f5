//! The core language of Prism.
//!
//! Terms are produced by the elaborator and are immutable from then on. The
//! operational semantics of the core language can be found in the
//! [`semantics`] module, and type inference in the [`typing`] module.

use num_bigint::BigInt;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::lang::Spanned;
use crate::reporting::Message;

pub mod env;
pub mod overload;
pub mod pretty;
pub mod prim;
pub mod semantics;
pub mod typing;

/// A local variable, identified by a globally unique id.
///
/// The display name is only ever used for printing: two variables are the
/// same variable exactly when their ids are equal. Fresh ids are drawn from
/// a monotonically increasing counter, so alpha-renaming a binder is just a
/// matter of minting a new variable with the same display name.
#[derive(Debug, Clone)]
pub struct LocalVar {
    name: String,
    id: u64,
}

static NEXT_LOCAL_ID: AtomicU64 = AtomicU64::new(0);

impl LocalVar {
    /// Create a variable with a fresh identity.
    pub fn fresh(name: impl Into<String>) -> LocalVar {
        LocalVar {
            name: name.into(),
            id: NEXT_LOCAL_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Create a fresh unnamed variable, `_`.
    pub fn fresh_unnamed() -> LocalVar {
        LocalVar::fresh("_")
    }

    /// A fresh variable that prints like this one.
    pub fn renamed(&self) -> LocalVar {
        LocalVar::fresh(self.name.clone())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl PartialEq for LocalVar {
    fn eq(&self, other: &LocalVar) -> bool {
        self.id == other.id
    }
}

impl Eq for LocalVar {}

impl std::hash::Hash for LocalVar {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for LocalVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Ground literals.
#[derive(Debug, Clone)]
pub enum Literal {
    Unit,
    Bool(bool),
    Int(BigInt),
    Float(f64),
    Char(char),
    String(String),
}

impl Literal {
    pub fn r#type(&self) -> LiteralType {
        match self {
            Literal::Unit => LiteralType::Unit,
            Literal::Bool(_) => LiteralType::Bool,
            Literal::Int(_) => LiteralType::Int,
            Literal::Float(_) => LiteralType::Float,
            Literal::Char(_) => LiteralType::Char,
            Literal::String(_) => LiteralType::String,
        }
    }
}

impl PartialEq for Literal {
    fn eq(&self, other: &Literal) -> bool {
        match (self, other) {
            (Literal::Unit, Literal::Unit) => true,
            (Literal::Bool(val0), Literal::Bool(val1)) => val0 == val1,
            (Literal::Int(val0), Literal::Int(val1)) => val0 == val1,
            // Logical equality: distinguishes zero signs, equates NaNs.
            (Literal::Float(val0), Literal::Float(val1)) => val0.to_bits() == val1.to_bits(),
            (Literal::Char(val0), Literal::Char(val1)) => val0 == val1,
            (Literal::String(val0), Literal::String(val1)) => val0 == val1,
            (_, _) => false,
        }
    }
}

/// The types of ground literals.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LiteralType {
    Unit,
    Bool,
    Int,
    Float,
    Char,
    String,
}

impl LiteralType {
    pub const fn name(&self) -> &'static str {
        match self {
            LiteralType::Unit => "Unit",
            LiteralType::Bool => "Bool",
            LiteralType::Int => "Int",
            LiteralType::Float => "Float",
            LiteralType::Char => "Char",
            LiteralType::String => "String",
        }
    }
}

/// A parameter: a variable annotated with its type.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: LocalVar,
    pub r#type: Arc<Term>,
}

impl Parameter {
    pub fn new(name: LocalVar, r#type: Arc<Term>) -> Parameter {
        Parameter { name, r#type }
    }
}

/// Terms in the core language.
pub type Term = Spanned<TermData>;

/// Terms.
#[derive(Debug, Clone)]
pub enum TermData {
    /// The type universe.
    Universe,
    /// Literals.
    Primitive(Literal),
    /// Types of literals.
    PrimitiveType(LiteralType),
    /// Local variable occurrences.
    Var(LocalVar),

    /// Calls to named ordinary functions.
    Invoke(String, Vec<Arc<Term>>),
    /// Calls to named overloaded functions; resolution is deferred to
    /// evaluation.
    InvokeOverloaded(String, Vec<Arc<Term>>),

    /// Fully applied inductive types.
    InductiveType(String, Vec<Arc<Term>>),
    /// Constructor introductions: the inductive type, the constructor name,
    /// and the constructor arguments.
    InductiveIntro(Arc<Term>, String, Vec<Arc<Term>>),
    /// Pattern matches over one or more scrutinees.
    Match(Vec<Arc<Term>>, Vec<Clause>),

    /// Dependent function types.
    FunctionType(Parameter, Arc<Term>),
    /// Dependent pair types.
    PairType(Parameter, Arc<Term>),
    /// Function introductions.
    FunctionIntro(Parameter, Arc<Term>),
    /// Function eliminations (function application).
    FunctionElim(Arc<Term>, Arc<Term>),

    /// Superpositions of function types that share a head, keyed by
    /// parameter.
    OverloadedFunctionType(Vec<(Parameter, Arc<Term>)>),
    /// Superpositions of function introductions that share a head.
    OverloadedFunctionIntro(Vec<(Parameter, Arc<Term>)>),

    /// Record introductions.
    RecordIntro(BTreeMap<String, Arc<Term>>),
    /// Record types.
    RecordType(BTreeMap<String, Arc<Term>>),
    /// Record eliminations (field projection).
    RecordElim(Arc<Term>, String),
}

/// A pattern-match clause: patterns for each scrutinee, and a body.
#[derive(Debug, Clone)]
pub struct Clause {
    pub patterns: Vec<Pattern>,
    pub body: Arc<Term>,
}

impl Clause {
    pub fn new(patterns: Vec<Pattern>, body: Arc<Term>) -> Clause {
        Clause { patterns, body }
    }
}

/// Patterns.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Matches a literal exactly.
    Primitive(Literal),
    /// Matches anything, binding it.
    Binder(LocalVar),
    /// Matches a constructor introduction by name.
    Variant(String, Vec<Pattern>),
    /// Matches named fields of a record.
    Record(Vec<(String, Pattern)>),
}

impl Pattern {
    /// Collect the variables bound by this pattern, in binding order.
    pub fn binders(&self, binders: &mut Vec<LocalVar>) {
        match self {
            Pattern::Primitive(_) => {}
            Pattern::Binder(var) => binders.push(var.clone()),
            Pattern::Variant(_, patterns) => {
                for pattern in patterns {
                    pattern.binders(binders);
                }
            }
            Pattern::Record(fields) => {
                for (_, pattern) in fields {
                    pattern.binders(binders);
                }
            }
        }
    }
}

/// A definition registered in the environment.
#[derive(Debug, Clone)]
pub enum Definition {
    /// An ordinary named function.
    Function(FunctionDefinition),
    /// A set of overloads sharing one name.
    Overloaded(OverloadedDefinition),
    /// An inductive data type and its constructors.
    Inductive(InductiveDefinition),
}

impl Definition {
    pub fn name(&self) -> &str {
        match self {
            Definition::Function(function) => &function.name,
            Definition::Overloaded(overloaded) => &overloaded.name,
            Definition::Inductive(inductive) => &inductive.name,
        }
    }
}

/// A named function definition.
#[derive(Debug, Clone)]
pub struct FunctionDefinition {
    pub name: String,
    pub params: Vec<Parameter>,
    pub result_type: Arc<Term>,
    /// Recursive functions are only unfolded once their arguments are final,
    /// and freeze to neutral invocations otherwise.
    pub is_recursive: bool,
    pub body: FunctionBody,
}

/// The body of a function definition.
#[derive(Debug, Clone)]
pub enum FunctionBody {
    /// A function defined by a core term.
    Term(Arc<Term>),
    /// A function implemented by the host.
    Native(NativeFunction),
}

/// A native function, implemented by the host.
///
/// Native implementations are only ever invoked on final arguments, so they
/// may destructure their inputs freely.
#[derive(Copy, Clone)]
pub struct NativeFunction {
    pub interpretation: fn(&[Arc<semantics::Value>]) -> Result<Arc<semantics::Value>, Message>,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("interpretation", &"|inputs| { .. }")
            .finish()
    }
}

/// An overloaded definition: a bag of candidate functions sharing a name.
#[derive(Debug, Clone)]
pub struct OverloadedDefinition {
    pub name: String,
    pub overloads: Vec<FunctionDefinition>,
}

/// An inductive data type definition.
#[derive(Debug, Clone)]
pub struct InductiveDefinition {
    pub name: String,
    pub params: Vec<Parameter>,
    pub constructors: Vec<Constructor>,
}

impl InductiveDefinition {
    pub fn constructor(&self, name: &str) -> Option<&Constructor> {
        self.constructors
            .iter()
            .find(|constructor| constructor.name == name)
    }
}

/// A constructor of an inductive data type.
///
/// Constructor parameter types may refer to the parameters of the parent
/// inductive definition.
#[derive(Debug, Clone)]
pub struct Constructor {
    pub name: String,
    pub params: Vec<Parameter>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_var_identity() {
        let x0 = LocalVar::fresh("x");
        let x1 = LocalVar::fresh("x");

        assert_ne!(x0, x1);
        assert_eq!(x0, x0.clone());
        assert_eq!(x0.name(), x1.name());
    }

    #[test]
    fn literal_logical_float_eq() {
        assert_eq!(Literal::Float(f64::NAN), Literal::Float(f64::NAN));
        assert_ne!(Literal::Float(0.0), Literal::Float(-0.0));
        assert_ne!(Literal::Float(1.0), Literal::Int(BigInt::from(1)));
    }
}
