//! Host object model: contexts (classes and modules), their method tables,
//! and the hook seam through which every definition and incorporation passes.

mod lineage;
mod space;

pub use lineage::MethodTable;
pub use space::ObjectSpace;

use crate::declaration::Declaration;
use crate::error::Result;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Unique identity of a class or module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContextId(pub u64);

static CONTEXT_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

impl ContextId {
    pub fn next() -> Self {
        ContextId(CONTEXT_ID_COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

impl Display for ContextId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextKind {
    Class,
    Module,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MethodKind {
    Instance,
    /// Defined on the context itself (`def self.foo`).
    Singleton,
}

impl MethodKind {
    /// Separator between context and method name: `K#foo`, `K.foo`.
    pub fn separator(self) -> &'static str {
        match self {
            MethodKind::Instance => "#",
            MethodKind::Singleton => ".",
        }
    }
}

impl Display for MethodKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MethodKind::Instance => write!(f, "instance"),
            MethodKind::Singleton => write!(f, "singleton"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl Display for Visibility {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Protected => write!(f, "protected"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Arity {
    pub required: usize,
    pub optional: usize,
    pub rest: bool,
}

impl Arity {
    pub fn exact(required: usize) -> Self {
        Self {
            required,
            optional: 0,
            rest: false,
        }
    }

    pub fn with_optional(mut self, optional: usize) -> Self {
        self.optional = optional;
        self
    }

    pub fn with_rest(mut self) -> Self {
        self.rest = true;
        self
    }

    /// Number of named parameters, counting the rest parameter as one.
    pub fn parameter_count(&self) -> usize {
        self.required + self.optional + usize::from(self.rest)
    }

    pub fn accepts(&self, given: usize) -> bool {
        given >= self.required && (self.rest || given <= self.required + self.optional)
    }
}

impl Display for Arity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.rest {
            write!(f, "{}+", self.required)
        } else if self.optional > 0 {
            write!(f, "{}..{}", self.required, self.required + self.optional)
        } else {
            write!(f, "{}", self.required)
        }
    }
}

pub type MethodBody = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// A method as handed to `ObjectSpace::define_method`.
#[derive(Clone)]
pub struct MethodDef {
    pub name: String,
    pub kind: MethodKind,
    pub visibility: Visibility,
    pub arity: Arity,
    pub body: MethodBody,
}

impl MethodDef {
    pub fn new(
        name: impl Into<String>,
        kind: MethodKind,
        arity: Arity,
        body: impl Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            visibility: Visibility::Public,
            arity,
            body: Arc::new(body),
        }
    }

    pub fn instance(
        name: impl Into<String>,
        arity: Arity,
        body: impl Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, MethodKind::Instance, arity, body)
    }

    pub fn singleton(
        name: impl Into<String>,
        arity: Arity,
        body: impl Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, MethodKind::Singleton, arity, body)
    }

    /// `def foo; end` with no parameters and a `nil` result.
    pub fn empty(name: impl Into<String>, kind: MethodKind) -> Self {
        Self::new(name, kind, Arity::default(), |_| Ok(Value::Nil))
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }
}

/// One definition of a named method on a context.
#[derive(Clone)]
pub struct Method {
    pub owner: ContextId,
    pub name: String,
    pub kind: MethodKind,
    pub visibility: Visibility,
    pub arity: Arity,
    pub body: MethodBody,
    pub declaration: Option<Arc<Declaration>>,
    /// Whether `body` is a validating guard around the original body.
    pub guarded: bool,
}

impl Method {
    pub fn from_def(owner: ContextId, def: MethodDef) -> Self {
        Self {
            owner,
            name: def.name,
            kind: def.kind,
            visibility: def.visibility,
            arity: def.arity,
            body: def.body,
            declaration: None,
            guarded: false,
        }
    }

    pub fn table(&self) -> MethodTable {
        MethodTable::new(self.owner, self.kind)
    }

    pub fn invoke(&self, args: &[Value]) -> Result<Value> {
        (self.body)(args)
    }
}

impl Debug for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Method")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("visibility", &self.visibility)
            .field("arity", &self.arity)
            .field("declaration", &self.declaration)
            .field("guarded", &self.guarded)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncorporationMode {
    Inherit,
    Include,
    Extend,
}

impl IncorporationMode {
    /// Kind of the child's method table that receives the parent's methods.
    pub fn target_kind(self) -> MethodKind {
        match self {
            IncorporationMode::Extend => MethodKind::Singleton,
            IncorporationMode::Inherit | IncorporationMode::Include => MethodKind::Instance,
        }
    }
}

impl Display for IncorporationMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            IncorporationMode::Inherit => write!(f, "inherited"),
            IncorporationMode::Include => write!(f, "included"),
            IncorporationMode::Extend => write!(f, "extended"),
        }
    }
}

/// `child` pulled `parent` in: a subclass, an `include` or an `extend`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Incorporation {
    pub child: ContextId,
    pub parent: ContextId,
    pub mode: IncorporationMode,
}

/// Observer installed on a context. The object space calls it for every
/// method defined on that context and every incorporation involving it.
pub trait DefinitionHook: Send + Sync {
    /// Runs before the method is stored; the returned record replaces it.
    /// An error aborts the definition.
    fn on_method_defined(&self, space: &ObjectSpace, method: Method) -> Result<Method>;

    /// Runs after `event` is linked; an error rolls the link back.
    fn on_incorporated(&self, space: &ObjectSpace, event: &Incorporation) -> Result<()>;

    /// `ctx` was removed again because its creation was rolled back.
    fn on_context_discarded(&self, _space: &ObjectSpace, _ctx: ContextId) {}
}

/// A class or module.
#[derive(Clone)]
pub struct Context {
    pub id: ContextId,
    pub name: String,
    pub kind: ContextKind,
    pub superclass: Option<ContextId>,
    /// In incorporation order, oldest first.
    pub includes: Vec<ContextId>,
    pub extends: Vec<ContextId>,
    instance_methods: HashMap<String, Method>,
    singleton_methods: HashMap<String, Method>,
    hooks: Vec<Arc<dyn DefinitionHook>>,
}

impl Context {
    fn new(name: String, kind: ContextKind, superclass: Option<ContextId>) -> Self {
        Self {
            id: ContextId::next(),
            name,
            kind,
            superclass,
            includes: Vec::new(),
            extends: Vec::new(),
            instance_methods: Default::default(),
            singleton_methods: Default::default(),
            hooks: Vec::new(),
        }
    }

    pub fn methods(&self, kind: MethodKind) -> &HashMap<String, Method> {
        match kind {
            MethodKind::Instance => &self.instance_methods,
            MethodKind::Singleton => &self.singleton_methods,
        }
    }

    fn methods_mut(&mut self, kind: MethodKind) -> &mut HashMap<String, Method> {
        match kind {
            MethodKind::Instance => &mut self.instance_methods,
            MethodKind::Singleton => &mut self.singleton_methods,
        }
    }

    pub fn has_hooks(&self) -> bool {
        !self.hooks.is_empty()
    }
}

impl Debug for Context {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("superclass", &self.superclass)
            .field("includes", &self.includes)
            .field("extends", &self.extends)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}
