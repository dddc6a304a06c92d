use super::{Context, ContextId, MethodKind};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// One method table in a resolution order: the instance or singleton
/// methods of a single context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodTable {
    pub context: ContextId,
    pub kind: MethodKind,
}

impl MethodTable {
    pub fn new(context: ContextId, kind: MethodKind) -> Self {
        Self { context, kind }
    }
}

impl Display for MethodTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.context, self.kind)
    }
}

/// Method resolution order for `kind` methods of `ctx`, nearest table first.
///
/// Instance lookup walks the context, its included modules (latest first,
/// each expanded) and then the superclass. Singleton lookup walks the
/// context's own singleton table, the instance lineage of every extended
/// module (latest first) and then the superclass's singleton lineage.
/// A table reached twice keeps its first position.
pub(super) fn lineage(
    contexts: &HashMap<ContextId, Context>,
    ctx: ContextId,
    kind: MethodKind,
) -> Vec<MethodTable> {
    let mut tables = Vec::new();
    collect(contexts, ctx, kind, &mut tables);
    tables.into_iter().unique().collect()
}

fn collect(
    contexts: &HashMap<ContextId, Context>,
    ctx: ContextId,
    kind: MethodKind,
    tables: &mut Vec<MethodTable>,
) {
    let Some(context) = contexts.get(&ctx) else {
        return;
    };
    tables.push(MethodTable::new(ctx, kind));
    let mixins = match kind {
        MethodKind::Instance => &context.includes,
        MethodKind::Singleton => &context.extends,
    };
    for module in mixins.iter().rev() {
        collect(contexts, *module, MethodKind::Instance, tables);
    }
    if let Some(superclass) = context.superclass {
        collect(contexts, superclass, kind, tables);
    }
}
