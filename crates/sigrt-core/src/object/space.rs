use super::lineage::{self, MethodTable};
use super::{
    Context, ContextId, ContextKind, DefinitionHook, Incorporation, IncorporationMode, Method,
    MethodDef, MethodKind, Visibility,
};
use crate::error::{Error, Result};
use crate::value::Value;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Registry of every class and module.
///
/// All method definitions go through [`ObjectSpace::define_method`] and all
/// incorporations through [`ObjectSpace::include`], [`ObjectSpace::extend`] or
/// [`ObjectSpace::define_class`]; these are the only places hooks fire. The
/// context table is never locked while a hook or a method body runs.
#[derive(Default)]
pub struct ObjectSpace {
    contexts: RwLock<HashMap<ContextId, Context>>,
}

impl ObjectSpace {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<ContextId, Context>> {
        self.contexts.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ContextId, Context>> {
        self.contexts.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_context<R>(&self, ctx: ContextId, f: impl FnOnce(&Context) -> R) -> Result<R> {
        let contexts = self.read();
        let context = contexts.get(&ctx).ok_or(Error::UnknownContext(ctx))?;
        Ok(f(context))
    }

    pub fn define_module(&self, name: impl Into<String>) -> ContextId {
        let context = Context::new(name.into(), ContextKind::Module, None);
        let id = context.id;
        self.write().insert(id, context);
        id
    }

    /// Create a class. A superclass makes this an inherit event; if a hook
    /// rejects it the class is discarded.
    pub fn define_class(
        &self,
        name: impl Into<String>,
        superclass: Option<ContextId>,
    ) -> Result<ContextId> {
        let name = name.into();
        if let Some(parent) = superclass {
            if self.kind_of(parent)? != ContextKind::Class {
                return Err(Error::InvalidIncorporation {
                    parent: self.display_name(parent),
                    child: name,
                    reason: "superclass must be a class".to_string(),
                });
            }
        }
        let context = Context::new(name, ContextKind::Class, superclass);
        let id = context.id;
        self.write().insert(id, context);

        if let Some(parent) = superclass {
            let event = Incorporation {
                child: id,
                parent,
                mode: IncorporationMode::Inherit,
            };
            if let Err(err) = self.fire_incorporated(&event) {
                let removed = self.write().remove(&id);
                for hook in removed.map(|context| context.hooks).unwrap_or_default() {
                    hook.on_context_discarded(self, id);
                }
                return Err(err);
            }
        }
        Ok(id)
    }

    pub fn include(&self, child: ContextId, module: ContextId) -> Result<()> {
        self.incorporate(child, module, IncorporationMode::Include)
    }

    pub fn extend(&self, child: ContextId, module: ContextId) -> Result<()> {
        self.incorporate(child, module, IncorporationMode::Extend)
    }

    fn incorporate(&self, child: ContextId, parent: ContextId, mode: IncorporationMode) -> Result<()> {
        {
            let mut contexts = self.write();
            let invalid = |reason: &str| Error::InvalidIncorporation {
                parent: display_name(&contexts, parent),
                child: display_name(&contexts, child),
                reason: reason.to_string(),
            };
            let parent_kind = contexts.get(&parent).ok_or(Error::UnknownContext(parent))?.kind;
            if !contexts.contains_key(&child) {
                return Err(Error::UnknownContext(child));
            }
            if parent_kind != ContextKind::Module {
                return Err(invalid("only modules can be included or extended"));
            }
            let cyclic = mode == IncorporationMode::Include
                && lineage::lineage(&contexts, parent, MethodKind::Instance)
                    .iter()
                    .any(|table| table.context == child);
            if cyclic {
                return Err(invalid("cyclic include detected"));
            }
            let context = contexts.get_mut(&child).ok_or(Error::UnknownContext(child))?;
            let mixins = match mode {
                IncorporationMode::Extend => &mut context.extends,
                _ => &mut context.includes,
            };
            if mixins.contains(&parent) {
                return Ok(());
            }
            mixins.push(parent);
        }

        let event = Incorporation {
            child,
            parent,
            mode,
        };
        if let Err(err) = self.fire_incorporated(&event) {
            if let Some(context) = self.write().get_mut(&child) {
                let mixins = match mode {
                    IncorporationMode::Extend => &mut context.extends,
                    _ => &mut context.includes,
                };
                mixins.retain(|m| *m != parent);
            }
            return Err(err);
        }
        trace!("{} {} into {}", self.display_name(parent), mode, self.display_name(child));
        Ok(())
    }

    /// Hooks of both sides of the event, each hook once.
    fn fire_incorporated(&self, event: &Incorporation) -> Result<()> {
        let hooks = {
            let contexts = self.read();
            let mut hooks: Vec<Arc<dyn DefinitionHook>> = Vec::new();
            for ctx in [event.parent, event.child] {
                for hook in contexts.get(&ctx).map(|c| c.hooks.as_slice()).unwrap_or_default() {
                    if !hooks.iter().any(|h| Arc::ptr_eq(h, hook)) {
                        hooks.push(hook.clone());
                    }
                }
            }
            hooks
        };
        for hook in hooks {
            hook.on_incorporated(self, event)?;
        }
        Ok(())
    }

    /// The single point through which methods are added to a context.
    pub fn define_method(&self, ctx: ContextId, def: MethodDef) -> Result<()> {
        let hooks = self.with_context(ctx, |context| context.hooks.clone())?;
        let mut method = Method::from_def(ctx, def);
        for hook in hooks {
            method = hook.on_method_defined(self, method)?;
        }
        let mut contexts = self.write();
        let context = contexts.get_mut(&ctx).ok_or(Error::UnknownContext(ctx))?;
        trace!(
            "defined {}{}{} (guarded: {})",
            context.name,
            method.kind.separator(),
            method.name,
            method.guarded
        );
        context
            .methods_mut(method.kind)
            .insert(method.name.clone(), method);
        Ok(())
    }

    pub fn define_instance_method(&self, ctx: ContextId, def: MethodDef) -> Result<()> {
        self.define_method(
            ctx,
            MethodDef {
                kind: MethodKind::Instance,
                ..def
            },
        )
    }

    pub fn define_singleton_method(&self, ctx: ContextId, def: MethodDef) -> Result<()> {
        self.define_method(
            ctx,
            MethodDef {
                kind: MethodKind::Singleton,
                ..def
            },
        )
    }

    /// Copy the method currently resolved as `existing` to `alias` on `ctx`.
    pub fn alias_method(
        &self,
        ctx: ContextId,
        kind: MethodKind,
        alias: impl Into<String>,
        existing: &str,
    ) -> Result<()> {
        let method = self
            .resolve_method(ctx, kind, existing)?
            .ok_or_else(|| Error::NoMethod {
                context: self.display_name(ctx),
                method: existing.to_string(),
                kind,
            })?;
        self.define_method(
            ctx,
            MethodDef {
                name: alias.into(),
                kind,
                visibility: method.visibility,
                arity: method.arity,
                body: method.body,
            },
        )
    }

    pub fn install_hook(&self, ctx: ContextId, hook: Arc<dyn DefinitionHook>) -> Result<()> {
        let mut contexts = self.write();
        let context = contexts.get_mut(&ctx).ok_or(Error::UnknownContext(ctx))?;
        if !context.hooks.iter().any(|h| Arc::ptr_eq(h, &hook)) {
            context.hooks.push(hook);
        }
        Ok(())
    }

    pub fn has_hooks(&self, ctx: ContextId) -> bool {
        self.with_context(ctx, Context::has_hooks).unwrap_or(false)
    }

    pub fn lineage(&self, ctx: ContextId, kind: MethodKind) -> Result<Vec<MethodTable>> {
        let contexts = self.read();
        if !contexts.contains_key(&ctx) {
            return Err(Error::UnknownContext(ctx));
        }
        Ok(lineage::lineage(&contexts, ctx, kind))
    }

    /// Contexts in instance method resolution order, `ctx` first.
    pub fn ancestors(&self, ctx: ContextId) -> Result<Vec<ContextId>> {
        Ok(self
            .lineage(ctx, MethodKind::Instance)?
            .into_iter()
            .map(|table| table.context)
            .collect())
    }

    /// Every other context whose instance or singleton lineage reaches `ctx`.
    pub fn descendants(&self, ctx: ContextId) -> Vec<ContextId> {
        let contexts = self.read();
        let mut found: Vec<ContextId> = contexts
            .keys()
            .copied()
            .filter(|&other| other != ctx)
            .filter(|&other| {
                [MethodKind::Instance, MethodKind::Singleton]
                    .into_iter()
                    .any(|kind| {
                        lineage::lineage(&contexts, other, kind)
                            .iter()
                            .any(|table| table.context == ctx)
                    })
            })
            .collect();
        found.sort();
        found
    }

    /// Lookup in a single table, without walking ancestors.
    pub fn method_in(&self, table: MethodTable, name: &str) -> Option<Method> {
        self.with_context(table.context, |context| {
            context.methods(table.kind).get(name).cloned()
        })
        .ok()
        .flatten()
    }

    pub fn defines_method(&self, ctx: ContextId, kind: MethodKind, name: &str) -> bool {
        self.method_in(MethodTable::new(ctx, kind), name).is_some()
    }

    pub fn own_method_names(&self, ctx: ContextId, kind: MethodKind) -> Result<Vec<String>> {
        self.with_context(ctx, |context| {
            let mut names: Vec<String> = context.methods(kind).keys().cloned().collect();
            names.sort();
            names
        })
    }

    pub fn resolve_method(
        &self,
        ctx: ContextId,
        kind: MethodKind,
        name: &str,
    ) -> Result<Option<Method>> {
        let contexts = self.read();
        if !contexts.contains_key(&ctx) {
            return Err(Error::UnknownContext(ctx));
        }
        Ok(lineage::lineage(&contexts, ctx, kind)
            .into_iter()
            .find_map(|table| {
                contexts
                    .get(&table.context)
                    .and_then(|context| context.methods(table.kind).get(name).cloned())
            }))
    }

    /// Public dispatch: non-public methods are rejected.
    pub fn call(&self, ctx: ContextId, kind: MethodKind, name: &str, args: &[Value]) -> Result<Value> {
        self.dispatch(ctx, kind, name, args, false)
    }

    /// Dispatch ignoring visibility.
    pub fn send(&self, ctx: ContextId, kind: MethodKind, name: &str, args: &[Value]) -> Result<Value> {
        self.dispatch(ctx, kind, name, args, true)
    }

    fn dispatch(
        &self,
        ctx: ContextId,
        kind: MethodKind,
        name: &str,
        args: &[Value],
        ignore_visibility: bool,
    ) -> Result<Value> {
        let method = self
            .resolve_method(ctx, kind, name)?
            .ok_or_else(|| Error::NoMethod {
                context: self.display_name(ctx),
                method: name.to_string(),
                kind,
            })?;
        if !ignore_visibility && method.visibility != Visibility::Public {
            return Err(Error::NonPublicMethodCalled {
                context: self.display_name(ctx),
                method: name.to_string(),
                visibility: method.visibility,
            });
        }
        if !method.arity.accepts(args.len()) {
            return Err(Error::ArgumentCount {
                context: self.display_name(ctx),
                method: name.to_string(),
                given: args.len(),
                expected: method.arity,
            });
        }
        method.invoke(args)
    }

    pub fn kind_of(&self, ctx: ContextId) -> Result<ContextKind> {
        self.with_context(ctx, |context| context.kind)
    }

    pub fn superclass(&self, ctx: ContextId) -> Result<Option<ContextId>> {
        self.with_context(ctx, |context| context.superclass)
    }

    pub fn included_modules(&self, ctx: ContextId) -> Result<Vec<ContextId>> {
        self.with_context(ctx, |context| context.includes.clone())
    }

    pub fn extended_modules(&self, ctx: ContextId) -> Result<Vec<ContextId>> {
        self.with_context(ctx, |context| context.extends.clone())
    }

    /// Name for messages; unknown contexts render as their id.
    pub fn display_name(&self, ctx: ContextId) -> String {
        display_name(&self.read(), ctx)
    }
}

fn display_name(contexts: &HashMap<ContextId, Context>, ctx: ContextId) -> String {
    contexts
        .get(&ctx)
        .map(|context| context.name.clone())
        .unwrap_or_else(|| format!("#<Context {}>", ctx))
}
