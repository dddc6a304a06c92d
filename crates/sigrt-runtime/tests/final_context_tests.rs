mod common;

use common::{def_empty, runtime};
use sigrt_core::{Declaration, Error, IncorporationMode, ObjectSpace, Result};

#[test]
fn final_context_requires_final_methods() -> Result<()> {
    let space = ObjectSpace::new();
    let rt = runtime();
    let k = space.define_class("Sealed", None)?;
    rt.mark_context_final(&space, k)?;
    assert!(rt.is_context_final(k));

    rt.sig(&space, k, Declaration::builder().void().final_())?;
    def_empty(&space, k, "ok")?;

    let err = def_empty(&space, k, "plain").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Sealed was declared as final but its method `plain` was not declared as final"
    );

    rt.sig(&space, k, Declaration::void())?;
    assert!(matches!(
        def_empty(&space, k, "regular"),
        Err(Error::FinalContextMethod { .. })
    ));
    Ok(())
}

#[test]
fn final_class_cannot_be_inherited() -> Result<()> {
    let space = ObjectSpace::new();
    let rt = runtime();
    let k = space.define_class("Sealed", None)?;
    rt.mark_context_final(&space, k)?;

    let err = space.define_class("Sub", Some(k)).unwrap_err();
    assert_eq!(err.to_string(), "Sealed was declared as final and cannot be inherited by Sub");
    assert!(space.descendants(k).is_empty());
    Ok(())
}

#[test]
fn final_module_cannot_be_included_or_extended() -> Result<()> {
    let space = ObjectSpace::new();
    let rt = runtime();
    let m = space.define_module("Sealed");
    rt.mark_context_final(&space, m)?;
    let c = space.define_class("C", None)?;

    assert!(matches!(
        space.include(c, m),
        Err(Error::FinalContextIncorporated {
            mode: IncorporationMode::Include,
            ..
        })
    ));
    assert!(matches!(
        space.extend(c, m),
        Err(Error::FinalContextIncorporated {
            mode: IncorporationMode::Extend,
            ..
        })
    ));
    assert!(space.included_modules(c)?.is_empty());
    assert!(space.extended_modules(c)?.is_empty());
    Ok(())
}

#[test]
fn a_final_context_may_still_incorporate_others() -> Result<()> {
    let space = ObjectSpace::new();
    let rt = runtime();
    let m = space.define_module("Helpers");
    let k = space.define_class("Sealed", None)?;
    rt.mark_context_final(&space, k)?;
    space.include(k, m)?;
    assert_eq!(space.included_modules(k)?, vec![m]);
    Ok(())
}
