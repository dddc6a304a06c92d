//! Runtime signature enforcement.
//!
//! A declaration made with [`SigRuntime::sig`] is paired with the next method
//! defined on the same context. The method is replaced by a guard that checks
//! arguments and the return value on every call, and final declarations are
//! enforced on every later definition and incorporation.
//!
//! ```ignore
//! let space = ObjectSpace::new();
//! let runtime = SigRuntime::new(RuntimeOptions::default());
//! let k = space.define_class("K", None)?;
//! runtime.sig(&space, k, Declaration::builder().param("x", ValueType::Int).returns(ValueType::Int))?;
//! space.define_method(k, MethodDef::instance("double", Arity::exact(1), double))?;
//! ```

#[macro_use]
extern crate sigrt_core;

pub mod decl_state;
mod engine;
pub mod finality;
pub mod hooks;
pub mod interceptor;
pub mod options;

pub use options::{RuntimeOptions, ViolationHandler};

use engine::Enforcer;
use once_cell::sync::Lazy;
use sigrt_core::diagnostics::{diagnostic_manager, DiagnosticManager};
use sigrt_core::error::Result;
use sigrt_core::{ContextId, Declaration, MethodKind, MethodTable, ObjectSpace};
use std::sync::Arc;

#[derive(Clone)]
pub struct SigRuntime {
    engine: Arc<Enforcer>,
}

static GLOBAL_RUNTIME: Lazy<SigRuntime> =
    Lazy::new(|| SigRuntime::with_diagnostics(RuntimeOptions::default(), diagnostic_manager()));

impl SigRuntime {
    pub fn new(options: RuntimeOptions) -> Self {
        Self::with_diagnostics(options, DiagnosticManager::new())
    }

    pub fn with_diagnostics(options: RuntimeOptions, diagnostics: DiagnosticManager) -> Self {
        Self {
            engine: Enforcer::new(options, diagnostics),
        }
    }

    /// Process-wide runtime, reporting to the global diagnostic manager.
    pub fn global() -> &'static SigRuntime {
        &GLOBAL_RUNTIME
    }

    pub fn options(&self) -> &RuntimeOptions {
        &self.engine.options
    }

    pub fn diagnostics(&self) -> &DiagnosticManager {
        &self.engine.diagnostics
    }

    /// Declare the next method defined on `ctx`. Installs the runtime's hooks
    /// on `ctx` first if this is its first declaration.
    pub fn sig(&self, space: &ObjectSpace, ctx: ContextId, decl: impl Into<Declaration>) -> Result<()> {
        let decl = decl.into();
        if !decl.is_runtime() {
            trace!("skipping declaration without runtime on {}", space.display_name(ctx));
            return Ok(());
        }
        self.install_hooks(space, ctx)?;
        self.engine
            .state
            .begin_declaration(space, ctx, Arc::new(decl))
            .map_err(|err| self.diagnostics().report(err))
    }

    /// Declare the next method named `name` on `ctx`, even if other methods
    /// are defined before it.
    pub fn sig_for(
        &self,
        space: &ObjectSpace,
        ctx: ContextId,
        name: &str,
        decl: impl Into<Declaration>,
    ) -> Result<()> {
        let decl = decl.into();
        if !decl.is_runtime() {
            return Ok(());
        }
        self.install_hooks(space, ctx)?;
        self.engine
            .state
            .begin_named(space, ctx, name, Arc::new(decl))
            .map_err(|err| self.diagnostics().report(err))
    }

    /// Idempotent. Returns `true` if this call installed the hooks.
    pub fn install_hooks(&self, space: &ObjectSpace, ctx: ContextId) -> Result<bool> {
        self.engine.install(space, ctx)
    }

    pub fn hooks_installed(&self, ctx: ContextId) -> bool {
        self.engine.installer.is_installed(ctx)
    }

    /// Every method later defined on `ctx` must be declared final, and `ctx`
    /// can no longer be inherited, included or extended.
    pub fn mark_context_final(&self, space: &ObjectSpace, ctx: ContextId) -> Result<()> {
        self.install_hooks(space, ctx)?;
        self.engine.finality.mark_context_final(ctx);
        info!("{} declared final", space.display_name(ctx));
        Ok(())
    }

    pub fn is_context_final(&self, ctx: ContextId) -> bool {
        self.engine.finality.is_context_final(ctx)
    }

    pub fn is_final(&self, ctx: ContextId, name: &str, kind: MethodKind) -> bool {
        self.engine.finality.is_final(ctx, name, kind)
    }

    /// Declaration attached to the method `name` defined directly on `ctx`.
    pub fn declaration_of(
        &self,
        space: &ObjectSpace,
        ctx: ContextId,
        name: &str,
        kind: MethodKind,
    ) -> Option<Arc<Declaration>> {
        space
            .method_in(MethodTable::new(ctx, kind), name)
            .and_then(|method| method.declaration)
    }

    /// Whether a positional declaration on `ctx` is waiting for its method.
    pub fn pending_on(&self, ctx: ContextId) -> bool {
        self.engine.state.is_pending(ctx)
    }

    /// Clear pending declarations. Meant for test harnesses recovering from a
    /// failed definition; finality and installed hooks are kept.
    pub fn reset(&self) {
        self.engine.state.reset();
    }
}
