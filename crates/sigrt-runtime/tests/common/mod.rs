#![allow(dead_code)]

use sigrt_core::{CheckedLevel, ContextId, MethodDef, MethodKind, ObjectSpace, Result};
use sigrt_runtime::{RuntimeOptions, SigRuntime};

/// Runtime with fixed options, independent of the environment.
pub fn runtime() -> SigRuntime {
    SigRuntime::new(options())
}

pub fn options() -> RuntimeOptions {
    RuntimeOptions {
        default_checked: CheckedLevel::Always,
        test_mode: false,
        violation_handler: None,
    }
}

/// `def foo; end`
pub fn def_empty(space: &ObjectSpace, ctx: ContextId, name: &str) -> Result<()> {
    space.define_method(ctx, MethodDef::empty(name, MethodKind::Instance))
}

/// `def self.foo; end`
pub fn def_self_empty(space: &ObjectSpace, ctx: ContextId, name: &str) -> Result<()> {
    space.define_method(ctx, MethodDef::empty(name, MethodKind::Singleton))
}
