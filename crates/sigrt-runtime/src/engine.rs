use crate::decl_state::DeclarationState;
use crate::finality::FinalityTracker;
use crate::hooks::HookInstaller;
use crate::interceptor::MethodInterceptor;
use crate::options::RuntimeOptions;
use sigrt_core::diagnostics::DiagnosticManager;
use sigrt_core::error::{Error, Result};
use sigrt_core::{ContextId, DefinitionHook, Incorporation, Method, ObjectSpace};
use std::sync::{Arc, Weak};

/// The hook object installed on every context that uses the runtime.
pub(crate) struct Enforcer {
    me: Weak<Enforcer>,
    pub(crate) options: Arc<RuntimeOptions>,
    pub(crate) state: DeclarationState,
    pub(crate) installer: HookInstaller,
    pub(crate) finality: FinalityTracker,
    pub(crate) interceptor: MethodInterceptor,
    pub(crate) diagnostics: DiagnosticManager,
}

impl Enforcer {
    pub(crate) fn new(options: RuntimeOptions, diagnostics: DiagnosticManager) -> Arc<Self> {
        let options = Arc::new(options);
        Arc::new_cyclic(|me| Enforcer {
            me: me.clone(),
            options: options.clone(),
            state: DeclarationState::new(),
            installer: HookInstaller::new(),
            finality: FinalityTracker::new(),
            interceptor: MethodInterceptor::new(options, diagnostics.clone()),
            diagnostics,
        })
    }

    pub(crate) fn hook(&self) -> Result<Arc<dyn DefinitionHook>> {
        let me = self
            .me
            .upgrade()
            .ok_or_else(|| Error::Generic("signature runtime was dropped".to_string()))?;
        Ok(me)
    }

    pub(crate) fn install(&self, space: &ObjectSpace, ctx: ContextId) -> Result<bool> {
        self.installer.install(space, ctx, self.hook()?)
    }

    fn define(&self, space: &ObjectSpace, method: Method) -> Result<Method> {
        // Taken up front so a rejected definition doesn't leave it pending.
        let pending = self.state.consume_pending(method.owner, &method.name);

        self.finality.check_redefinition(space, &method)?;
        self.finality.check_override(space, &method)?;

        if self.finality.is_context_final(method.owner)
            && !pending.as_ref().is_some_and(|decl| decl.is_final())
        {
            return Err(Error::FinalContextMethod {
                context: space.display_name(method.owner),
                method: method.name.clone(),
            });
        }

        let Some(decl) = pending else {
            return Ok(method);
        };
        let is_final = decl.is_final();
        let method = self.interceptor.attach(space, method, decl)?;
        if is_final {
            self.finality.mark_final(method.owner, &method.name, method.kind);
        }
        Ok(method)
    }

    fn incorporated(&self, space: &ObjectSpace, event: &Incorporation) -> Result<()> {
        self.finality.check_incorporation(space, event)?;
        self.installer.propagate(space, event, self.hook()?)
    }
}

impl DefinitionHook for Enforcer {
    fn on_method_defined(&self, space: &ObjectSpace, method: Method) -> Result<Method> {
        self.define(space, method)
            .map_err(|err| self.diagnostics.report(err))
    }

    fn on_incorporated(&self, space: &ObjectSpace, event: &Incorporation) -> Result<()> {
        self.incorporated(space, event)
            .map_err(|err| self.diagnostics.report(err))
    }

    fn on_context_discarded(&self, _space: &ObjectSpace, ctx: ContextId) {
        self.installer.forget(ctx);
    }
}
