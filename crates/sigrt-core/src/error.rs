use crate::object::{Arity, ContextId, IncorporationMode, MethodKind, Visibility};
use crate::value::Value;
use std::fmt::{Display, Formatter};
use std::result;
use thiserror::Error;

/// Where in a call a declared expectation was not met.
#[derive(Debug, Clone, PartialEq)]
pub enum ViolationSite {
    Argument { index: usize, name: String },
    Return,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignatureViolation {
    pub context: String,
    pub method: String,
    pub kind: MethodKind,
    pub site: ViolationSite,
    pub expected: String,
    pub got: Value,
}

impl Display for SignatureViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.site {
            ViolationSite::Argument { name, .. } => write!(f, "Parameter `{}`", name)?,
            ViolationSite::Return => write!(f, "Return value")?,
        }
        write!(
            f,
            ": expected {}, got {} ({}) in call to {}{}{}",
            self.expected,
            self.got,
            self.got.type_name(),
            self.context,
            self.kind.separator(),
            self.method
        )
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("You called sig twice without declaring a method in between on {context}")]
    DoubleDeclaration { context: String },
    #[error("The method `{method}` on {context} was declared as final and cannot be redefined")]
    FinalRedefinition {
        context: String,
        method: String,
        kind: MethodKind,
    },
    #[error(
        "The method `{method}` on {ancestor} was declared as final and cannot be overridden in {target}{}",
        via_suffix(.via)
    )]
    FinalOverride {
        ancestor: String,
        target: String,
        /// Incorporated context that brought the overriding definition in.
        via: Option<String>,
        method: String,
        kind: MethodKind,
    },
    #[error("{0}")]
    SignatureViolation(SignatureViolation),
    #[error("The declaration for `{method}` on {context} has {declared} parameter(s) but the method accepts {accepted}")]
    SignatureMismatch {
        context: String,
        method: String,
        declared: usize,
        accepted: Arity,
    },
    #[error("The method `{method}` on {context} is declared as abstract and cannot be called")]
    AbstractMethodCalled { context: String, method: String },
    #[error("{context} was declared as final but its method `{method}` was not declared as final")]
    FinalContextMethod { context: String, method: String },
    #[error("{context} was declared as final and cannot be {mode} by {target}")]
    FinalContextIncorporated {
        context: String,
        target: String,
        mode: IncorporationMode,
    },
    #[error("undefined method `{method}` for {context}")]
    NoMethod {
        context: String,
        method: String,
        kind: MethodKind,
    },
    #[error("{visibility} method `{method}` called for {context}")]
    NonPublicMethodCalled {
        context: String,
        method: String,
        visibility: Visibility,
    },
    #[error("wrong number of arguments calling `{method}` on {context} (given {given}, expected {expected})")]
    ArgumentCount {
        context: String,
        method: String,
        given: usize,
        expected: Arity,
    },
    #[error("cannot incorporate {parent} into {child}: {reason}")]
    InvalidIncorporation {
        parent: String,
        child: String,
        reason: String,
    },
    #[error("unknown context {0}")]
    UnknownContext(ContextId),
    #[error("Generic error: {0}")]
    Generic(String),
}

fn via_suffix(via: &Option<String>) -> String {
    match via {
        Some(via) => format!(" (via {})", via),
        None => String::new(),
    }
}

impl Error {
    /// Stable short code used when the error is recorded as a diagnostic.
    pub fn code(&self) -> &'static str {
        match self {
            Error::DoubleDeclaration { .. } => "double-declaration",
            Error::FinalRedefinition { .. } => "final-redefinition",
            Error::FinalOverride { .. } => "final-override",
            Error::SignatureViolation(_) => "signature-violation",
            Error::SignatureMismatch { .. } => "signature-mismatch",
            Error::AbstractMethodCalled { .. } => "abstract-call",
            Error::FinalContextMethod { .. } | Error::FinalContextIncorporated { .. } => {
                "final-context"
            }
            Error::NoMethod { .. } => "no-method",
            Error::NonPublicMethodCalled { .. } => "non-public-call",
            Error::ArgumentCount { .. } => "argument-count",
            Error::InvalidIncorporation { .. } => "invalid-incorporation",
            Error::UnknownContext(_) => "unknown-context",
            Error::Generic(_) => "generic",
        }
    }

    /// Name of the context the error is about, if it names one.
    pub fn context(&self) -> Option<&str> {
        match self {
            Error::DoubleDeclaration { context }
            | Error::FinalRedefinition { context, .. }
            | Error::SignatureMismatch { context, .. }
            | Error::AbstractMethodCalled { context, .. }
            | Error::FinalContextMethod { context, .. }
            | Error::FinalContextIncorporated { context, .. }
            | Error::NoMethod { context, .. }
            | Error::NonPublicMethodCalled { context, .. }
            | Error::ArgumentCount { context, .. } => Some(context),
            Error::FinalOverride { target, .. } => Some(target),
            Error::SignatureViolation(violation) => Some(&violation.context),
            Error::InvalidIncorporation { child, .. } => Some(child),
            Error::UnknownContext(_) | Error::Generic(_) => None,
        }
    }
}

pub type Result<T> = result::Result<T, Error>;

// Convert from eyre::Report to our Error type
impl From<eyre::Report> for Error {
    fn from(err: eyre::Report) -> Self {
        Error::Generic(err.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Generic(s)
    }
}
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Generic(e.to_string())
    }
}
