mod common;

use common::{def_empty, runtime};
use sigrt_core::{Arity, Declaration, Error, MethodDef, MethodKind, ObjectSpace, Result, Value, ValueType};

fn int_identity() -> MethodDef {
    MethodDef::instance("id", Arity::exact(1), |args| Ok(args[0].clone()))
}

fn int_sig() -> Declaration {
    Declaration::builder()
        .param("x", ValueType::Int)
        .returns(ValueType::Int)
        .build()
}

#[test]
fn gives_the_hooks_to_a_class_which_includes_a_module_with_hooks() -> Result<()> {
    let space = ObjectSpace::new();
    let rt = runtime();
    let m = space.define_module("M");
    rt.sig(&space, m, Declaration::void())?;
    def_empty(&space, m, "foo")?;
    assert!(rt.hooks_installed(m));

    let c = space.define_class("C", None)?;
    assert!(!rt.hooks_installed(c));
    space.include(c, m)?;
    assert!(rt.hooks_installed(c));
    assert!(space.has_hooks(c));
    Ok(())
}

#[test]
fn gives_the_hooks_to_a_class_which_extends_a_module_with_hooks() -> Result<()> {
    let space = ObjectSpace::new();
    let rt = runtime();
    let m = space.define_module("M");
    rt.sig(&space, m, Declaration::void())?;
    def_empty(&space, m, "foo")?;

    let c = space.define_class("C", None)?;
    space.extend(c, m)?;
    assert!(rt.hooks_installed(c));
    Ok(())
}

#[test]
fn gives_the_hooks_to_subclasses() -> Result<()> {
    let space = ObjectSpace::new();
    let rt = runtime();
    let k = space.define_class("K", None)?;
    rt.install_hooks(&space, k)?;
    let sub = space.define_class("Sub", Some(k))?;
    let subsub = space.define_class("SubSub", Some(sub))?;
    assert!(rt.hooks_installed(sub));
    assert!(rt.hooks_installed(subsub));
    Ok(())
}

#[test]
fn propagated_hooks_intercept_the_next_sig_and_def() -> Result<()> {
    let space = ObjectSpace::new();
    let rt = runtime();
    let m = space.define_module("M");
    rt.install_hooks(&space, m)?;
    let c = space.define_class("C", None)?;
    space.include(c, m)?;

    rt.sig(&space, c, int_sig())?;
    space.define_method(c, int_identity())?;

    assert_eq!(space.call(c, MethodKind::Instance, "id", &[Value::int(4)])?, Value::int(4));
    let err = space
        .call(c, MethodKind::Instance, "id", &[Value::string("four")])
        .unwrap_err();
    assert!(matches!(err, Error::SignatureViolation(_)));
    Ok(())
}

#[test]
fn propagation_is_transitive_through_intermediate_mixins() -> Result<()> {
    let space = ObjectSpace::new();
    let rt = runtime();
    let m1 = space.define_module("M1");
    rt.install_hooks(&space, m1)?;
    let m2 = space.define_module("M2");
    space.include(m2, m1)?;
    let m3 = space.define_module("M3");
    space.include(m3, m2)?;

    let c = space.define_class("C", None)?;
    space.include(c, m3)?;
    assert!(rt.hooks_installed(m2));
    assert!(rt.hooks_installed(m3));
    assert!(rt.hooks_installed(c));
    Ok(())
}

#[test]
fn installing_late_reaches_existing_descendants() -> Result<()> {
    let space = ObjectSpace::new();
    let rt = runtime();
    let m = space.define_module("M");
    let c = space.define_class("C", None)?;
    space.include(c, m)?;
    let sub = space.define_class("Sub", Some(c))?;

    assert!(rt.install_hooks(&space, m)?);
    assert!(!rt.install_hooks(&space, m)?);
    assert!(rt.hooks_installed(c));
    assert!(rt.hooks_installed(sub));
    Ok(())
}

#[test]
fn methods_without_a_declaration_stay_unguarded() -> Result<()> {
    let space = ObjectSpace::new();
    let rt = runtime();
    let c = space.define_class("C", None)?;
    rt.install_hooks(&space, c)?;
    space.define_method(c, int_identity())?;

    let method = space
        .resolve_method(c, MethodKind::Instance, "id")?
        .expect("method defined");
    assert!(!method.guarded);
    assert!(method.declaration.is_none());
    assert_eq!(
        space.call(c, MethodKind::Instance, "id", &[Value::string("anything")])?,
        Value::string("anything")
    );
    Ok(())
}

#[test]
fn contexts_without_hooks_are_untouched() -> Result<()> {
    let space = ObjectSpace::new();
    let rt = runtime();
    let c = space.define_class("C", None)?;
    def_empty(&space, c, "foo")?;
    def_empty(&space, c, "foo")?;
    assert!(!rt.hooks_installed(c));
    assert!(!space.has_hooks(c));
    Ok(())
}

/// Rejects every incorporation and remembers the child it saw.
#[derive(Default)]
struct RejectInheritance {
    child: std::sync::Mutex<Option<sigrt_core::ContextId>>,
}

impl sigrt_core::DefinitionHook for RejectInheritance {
    fn on_method_defined(
        &self,
        _space: &ObjectSpace,
        method: sigrt_core::Method,
    ) -> Result<sigrt_core::Method> {
        Ok(method)
    }

    fn on_incorporated(&self, _space: &ObjectSpace, event: &sigrt_core::Incorporation) -> Result<()> {
        *self.child.lock().unwrap() = Some(event.child);
        Err(Error::Generic("sealed".to_string()))
    }
}

#[test]
fn rolled_back_subclass_does_not_stay_hooked() -> Result<()> {
    let space = ObjectSpace::new();
    let rt = runtime();
    let k = space.define_class("K", None)?;
    rt.install_hooks(&space, k)?;
    let reject = std::sync::Arc::new(RejectInheritance::default());
    space.install_hook(k, reject.clone())?;

    assert!(space.define_class("Sub", Some(k)).is_err());
    let child = (*reject.child.lock().unwrap()).expect("inherit event fired");
    assert!(!rt.hooks_installed(child));
    assert!(space.descendants(k).is_empty());
    Ok(())
}
