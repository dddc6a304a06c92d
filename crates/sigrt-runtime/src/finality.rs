//! Which methods are final, and the checks that keep them that way.
//!
//! Finality is one-way: a (context, name, kind) triple that has been marked
//! final stays final. It is checked when a method is defined (same context:
//! redefinition, ancestor: override) and when one context incorporates
//! another.

use sigrt_core::collections::ConcurrentMap;
use sigrt_core::error::{Error, Result};
use sigrt_core::{ContextId, Incorporation, IncorporationMode, Method, MethodKind, MethodTable, ObjectSpace};
use std::collections::BTreeSet;

#[derive(Default)]
pub struct FinalityTracker {
    methods: ConcurrentMap<MethodTable, BTreeSet<String>>,
    contexts: ConcurrentMap<ContextId, ()>,
}

impl FinalityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_final(&self, ctx: ContextId, name: &str, kind: MethodKind) {
        let added = self
            .methods
            .update_or_default(MethodTable::new(ctx, kind), |names| names.insert(name.to_string()));
        if added {
            debug!("marked {}{}{} final", ctx, kind.separator(), name);
        }
    }

    pub fn is_final(&self, ctx: ContextId, name: &str, kind: MethodKind) -> bool {
        self.is_final_in(MethodTable::new(ctx, kind), name)
    }

    fn is_final_in(&self, table: MethodTable, name: &str) -> bool {
        self.methods
            .with_value(&table, |names| names.contains(name))
            .unwrap_or(false)
    }

    pub fn final_names(&self, table: MethodTable) -> Vec<String> {
        self.methods
            .with_value(&table, |names| names.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// A final context accepts only final methods and cannot be incorporated.
    pub fn mark_context_final(&self, ctx: ContextId) {
        self.contexts.insert(ctx, ());
    }

    pub fn is_context_final(&self, ctx: ContextId) -> bool {
        self.contexts.contains_key(&ctx)
    }

    /// `method` is about to replace a definition on its own context.
    pub fn check_redefinition(&self, space: &ObjectSpace, method: &Method) -> Result<()> {
        if self.is_final_in(method.table(), &method.name) {
            return Err(Error::FinalRedefinition {
                context: space.display_name(method.owner),
                method: method.name.clone(),
                kind: method.kind,
            });
        }
        Ok(())
    }

    /// `method` would shadow a final method somewhere in its owner's lineage.
    pub fn check_override(&self, space: &ObjectSpace, method: &Method) -> Result<()> {
        let own = method.table();
        // farthest ancestors first
        for table in space.lineage(method.owner, method.kind)?.into_iter().rev() {
            if table != own && self.is_final_in(table, &method.name) {
                return Err(Error::FinalOverride {
                    ancestor: space.display_name(table.context),
                    target: space.display_name(method.owner),
                    via: None,
                    method: method.name.clone(),
                    kind: method.kind,
                });
            }
        }
        Ok(())
    }

    /// Runs after `event` is linked. Every context whose lineage now reaches
    /// the parent is a receiver: the child itself and everything that
    /// already incorporates the child. For each receiver two directions are
    /// checked:
    ///
    /// - finals already in its lineage against every method the parent
    ///   brings in, whether or not that method is final itself;
    /// - finals the parent brings in against methods it defines itself.
    ///
    /// Tables reachable from the parent are the same definitions on both
    /// sides and are skipped.
    pub fn check_incorporation(&self, space: &ObjectSpace, event: &Incorporation) -> Result<()> {
        if self.is_context_final(event.parent) {
            return Err(Error::FinalContextIncorporated {
                context: space.display_name(event.parent),
                target: space.display_name(event.child),
                mode: event.mode,
            });
        }

        let parent_kinds: &[MethodKind] = match event.mode {
            IncorporationMode::Include | IncorporationMode::Extend => &[MethodKind::Instance],
            IncorporationMode::Inherit => &[MethodKind::Instance, MethodKind::Singleton],
        };
        let receivers: Vec<ContextId> = std::iter::once(event.child)
            .chain(space.descendants(event.child))
            .collect();

        for &parent_kind in parent_kinds {
            let entry = MethodTable::new(event.parent, parent_kind);
            let source = space.lineage(event.parent, parent_kind)?;
            for &receiver in &receivers {
                for kind in [MethodKind::Instance, MethodKind::Singleton] {
                    let lineage = space.lineage(receiver, kind)?;
                    if lineage.contains(&entry) {
                        self.check_receiver(space, event, MethodTable::new(receiver, kind), &lineage, &source)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn check_receiver(
        &self,
        space: &ObjectSpace,
        event: &Incorporation,
        own: MethodTable,
        lineage: &[MethodTable],
        source: &[MethodTable],
    ) -> Result<()> {
        for table in lineage.iter().rev().filter(|table| !source.contains(table)) {
            for name in self.final_names(*table) {
                if source.iter().any(|s| space.method_in(*s, &name).is_some()) {
                    return Err(Error::FinalOverride {
                        ancestor: space.display_name(table.context),
                        target: space.display_name(own.context),
                        via: Some(space.display_name(event.parent)),
                        method: name,
                        kind: own.kind,
                    });
                }
            }
        }

        for table in source.iter().rev() {
            for name in self.final_names(*table) {
                if space.method_in(own, &name).is_some() {
                    return Err(Error::FinalOverride {
                        ancestor: space.display_name(table.context),
                        target: space.display_name(own.context),
                        via: None,
                        method: name,
                        kind: own.kind,
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigrt_core::MethodDef;

    #[test]
    fn marking_is_idempotent_and_kind_specific() {
        let tracker = FinalityTracker::new();
        let ctx = ContextId(7);
        tracker.mark_final(ctx, "foo", MethodKind::Instance);
        tracker.mark_final(ctx, "foo", MethodKind::Instance);

        assert!(tracker.is_final(ctx, "foo", MethodKind::Instance));
        assert!(!tracker.is_final(ctx, "foo", MethodKind::Singleton));
        assert_eq!(
            tracker.final_names(MethodTable::new(ctx, MethodKind::Instance)),
            vec!["foo".to_string()]
        );
    }

    #[test]
    fn redefinition_is_checked_against_the_same_table() -> Result<()> {
        let space = ObjectSpace::new();
        let k = space.define_class("K", None)?;
        let tracker = FinalityTracker::new();
        tracker.mark_final(k, "foo", MethodKind::Instance);

        let redefined = Method::from_def(k, MethodDef::empty("foo", MethodKind::Instance));
        let err = tracker.check_redefinition(&space, &redefined).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The method `foo` on K was declared as final and cannot be redefined"
        );

        let singleton = Method::from_def(k, MethodDef::empty("foo", MethodKind::Singleton));
        tracker.check_redefinition(&space, &singleton)?;
        Ok(())
    }
}
