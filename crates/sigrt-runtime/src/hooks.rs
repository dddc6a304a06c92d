use sigrt_core::collections::ConcurrentMap;
use sigrt_core::error::Result;
use sigrt_core::{ContextId, DefinitionHook, Incorporation, ObjectSpace};
use std::sync::Arc;

/// Tracks which contexts carry the runtime's definition hook.
///
/// Installation is idempotent and viral: once a context has the hook, every
/// context that later incorporates it gets the hook too, however many
/// mixins sit in between.
#[derive(Default)]
pub struct HookInstaller {
    installed: ConcurrentMap<ContextId, ()>,
}

impl HookInstaller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when this call did the installing. Contexts that
    /// already incorporate `ctx` are hooked as well.
    pub fn install(
        &self,
        space: &ObjectSpace,
        ctx: ContextId,
        hook: Arc<dyn DefinitionHook>,
    ) -> Result<bool> {
        if !self.install_one(space, ctx, hook.clone())? {
            return Ok(false);
        }
        for descendant in space.descendants(ctx) {
            self.install_one(space, descendant, hook.clone())?;
        }
        Ok(true)
    }

    fn install_one(
        &self,
        space: &ObjectSpace,
        ctx: ContextId,
        hook: Arc<dyn DefinitionHook>,
    ) -> Result<bool> {
        if !self.installed.insert_if_absent(ctx, ()) {
            return Ok(false);
        }
        if let Err(err) = space.install_hook(ctx, hook) {
            self.installed.remove(&ctx);
            return Err(err);
        }
        debug!("installed definition hooks on {}", space.display_name(ctx));
        Ok(true)
    }

    /// `ctx` no longer exists in the space.
    pub fn forget(&self, ctx: ContextId) {
        if self.installed.remove(&ctx).is_some() {
            trace!("forgot hooks on discarded context {}", ctx);
        }
    }

    pub fn is_installed(&self, ctx: ContextId) -> bool {
        self.installed.contains_key(&ctx)
    }

    /// Hand the hook from a hooked parent to the child of `event`.
    pub fn propagate(
        &self,
        space: &ObjectSpace,
        event: &Incorporation,
        hook: Arc<dyn DefinitionHook>,
    ) -> Result<()> {
        if self.is_installed(event.parent) && self.install(space, event.child, hook)? {
            debug!(
                "propagated hooks from {} to {} ({})",
                space.display_name(event.parent),
                space.display_name(event.child),
                event.mode
            );
        }
        Ok(())
    }
}
