//! Declaration records: what a `sig` says about the method defined after it.

use crate::expect::Expectation;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// When call-time validation runs for a declared method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckedLevel {
    Always,
    /// Only while the runtime runs in test mode.
    Tests,
    Never,
}

impl CheckedLevel {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Some(CheckedLevel::Always),
            "tests" => Some(CheckedLevel::Tests),
            "never" => Some(CheckedLevel::Never),
            _ => None,
        }
    }

    pub fn enforces(self, test_mode: bool) -> bool {
        match self {
            CheckedLevel::Always => true,
            CheckedLevel::Tests => test_mode,
            CheckedLevel::Never => false,
        }
    }
}

impl Display for CheckedLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckedLevel::Always => write!(f, "always"),
            CheckedLevel::Tests => write!(f, "tests"),
            CheckedLevel::Never => write!(f, "never"),
        }
    }
}

/// Method-lifecycle flags. They are orthogonal; any combination is representable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclFlags {
    pub is_final: bool,
    pub is_abstract: bool,
    pub is_override: bool,
    pub is_overridable: bool,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub expectation: Arc<dyn Expectation>,
}

#[derive(Debug, Clone)]
pub enum ReturnExpectation {
    /// The caller never sees the body's value; the guard hands back `nil`.
    Void,
    Untyped,
    Type(Arc<dyn Expectation>),
}

/// A finished declaration, immutable once built.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub params: Vec<Param>,
    pub returns: ReturnExpectation,
    pub flags: DeclFlags,
    /// `None` defers to the runtime's default level.
    pub checked: Option<CheckedLevel>,
    runtime: bool,
}

impl Declaration {
    pub fn builder() -> DeclarationBuilder {
        DeclarationBuilder::new()
    }

    /// `sig { void }`
    pub fn void() -> Self {
        DeclarationBuilder::new().void().build()
    }

    /// Detach the record from the runtime: it still describes the method but
    /// is never attached or enforced.
    pub fn without_runtime(mut self) -> Self {
        self.runtime = false;
        self
    }

    pub fn is_runtime(&self) -> bool {
        self.runtime
    }

    pub fn is_final(&self) -> bool {
        self.flags.is_final
    }

    /// Parameter governing the argument at `index`. With a rest parameter the
    /// last declared param covers every surplus argument.
    pub fn param_for(&self, index: usize, rest: bool) -> Option<&Param> {
        match self.params.get(index) {
            Some(param) => Some(param),
            None if rest => self.params.last(),
            None => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeclarationBuilder {
    decl: Declaration,
}

impl Default for DeclarationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DeclarationBuilder {
    pub fn new() -> Self {
        Self {
            decl: Declaration {
                params: Vec::new(),
                returns: ReturnExpectation::Untyped,
                flags: DeclFlags::default(),
                checked: None,
                runtime: true,
            },
        }
    }

    pub fn param(mut self, name: impl Into<String>, expectation: impl Expectation + 'static) -> Self {
        self.decl.params.push(Param {
            name: name.into(),
            expectation: Arc::new(expectation),
        });
        self
    }

    pub fn returns(mut self, expectation: impl Expectation + 'static) -> Self {
        self.decl.returns = ReturnExpectation::Type(Arc::new(expectation));
        self
    }

    pub fn void(mut self) -> Self {
        self.decl.returns = ReturnExpectation::Void;
        self
    }

    pub fn untyped(mut self) -> Self {
        self.decl.returns = ReturnExpectation::Untyped;
        self
    }

    pub fn final_(mut self) -> Self {
        self.decl.flags.is_final = true;
        self
    }

    pub fn abstract_(mut self) -> Self {
        self.decl.flags.is_abstract = true;
        self
    }

    pub fn override_(mut self) -> Self {
        self.decl.flags.is_override = true;
        self
    }

    pub fn overridable(mut self) -> Self {
        self.decl.flags.is_overridable = true;
        self
    }

    pub fn checked(mut self, level: CheckedLevel) -> Self {
        self.decl.checked = Some(level);
        self
    }

    pub fn build(self) -> Declaration {
        self.decl
    }
}

impl From<DeclarationBuilder> for Declaration {
    fn from(builder: DeclarationBuilder) -> Self {
        builder.build()
    }
}
