//! Declarations that have been made but not yet paired with a method.
//!
//! A positional declaration pairs with the very next method defined on its
//! context. A named one waits for a definition with a matching name. Pairing
//! assumes declare-then-define happens sequentially per context; interleaving
//! the two from several threads on one context is unsupported.

use sigrt_core::collections::ConcurrentMap;
use sigrt_core::error::{Error, Result};
use sigrt_core::{ContextId, Declaration, ObjectSpace};
use std::sync::Arc;

#[derive(Default)]
pub struct DeclarationState {
    positional: ConcurrentMap<ContextId, Arc<Declaration>>,
    named: ConcurrentMap<(ContextId, String), Arc<Declaration>>,
}

impl DeclarationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails if `ctx` already has a positional declaration waiting.
    pub fn begin_declaration(
        &self,
        space: &ObjectSpace,
        ctx: ContextId,
        decl: Arc<Declaration>,
    ) -> Result<()> {
        if !self.positional.insert_if_absent(ctx, decl) {
            return Err(Error::DoubleDeclaration {
                context: space.display_name(ctx),
            });
        }
        Ok(())
    }

    pub fn begin_named(
        &self,
        space: &ObjectSpace,
        ctx: ContextId,
        name: &str,
        decl: Arc<Declaration>,
    ) -> Result<()> {
        if !self.named.insert_if_absent((ctx, name.to_string()), decl) {
            return Err(Error::DoubleDeclaration {
                context: space.display_name(ctx),
            });
        }
        Ok(())
    }

    /// Take the declaration for a method `name` being defined on `ctx`.
    /// A positional declaration wins over a named one.
    pub fn consume_pending(&self, ctx: ContextId, name: &str) -> Option<Arc<Declaration>> {
        self.positional
            .remove(&ctx)
            .or_else(|| self.named.remove(&(ctx, name.to_string())))
    }

    pub fn is_pending(&self, ctx: ContextId) -> bool {
        self.positional.contains_key(&ctx)
    }

    pub fn is_pending_for(&self, ctx: ContextId, name: &str) -> bool {
        self.named.contains_key(&(ctx, name.to_string()))
    }

    /// Drop every pending declaration. Only for recovering a test harness.
    pub fn reset(&self) {
        self.positional.clear();
        self.named.clear();
    }
}
