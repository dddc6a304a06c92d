//! Shared data model for the signature runtime.
//!
//! This crate owns the host object model (contexts, method records, the
//! definition and incorporation seams), dynamic values, declaration records
//! and the error/diagnostic plumbing used by `sigrt-runtime`.

#[macro_use]
pub mod macros;

pub mod collections;
pub mod config;
pub mod declaration;
pub mod diagnostics;
pub mod error;
pub mod expect;
pub mod object;
pub mod value;

// Re-export commonly used items for convenience
pub use tracing;

pub use declaration::{CheckedLevel, DeclFlags, Declaration, DeclarationBuilder, Param, ReturnExpectation};
pub use expect::{Expectation, ValueType};
pub use object::{
    Arity, ContextId, ContextKind, DefinitionHook, Incorporation, IncorporationMode, Method,
    MethodBody, MethodDef, MethodKind, MethodTable, ObjectSpace, Visibility,
};
pub use value::Value;

// Alias for error types
pub type Error = crate::error::Error;
pub type Result<T> = crate::error::Result<T>;
