use crate::options::RuntimeOptions;
use sigrt_core::diagnostics::{Diagnostic, DiagnosticManager};
use sigrt_core::error::{Error, Result, SignatureViolation, ViolationSite};
use sigrt_core::{Declaration, Method, MethodBody, MethodKind, ObjectSpace, ReturnExpectation, Value};
use std::sync::Arc;

/// Attaches declarations to freshly defined methods and swaps in the
/// validating guard.
pub struct MethodInterceptor {
    options: Arc<RuntimeOptions>,
    diagnostics: DiagnosticManager,
}

impl MethodInterceptor {
    pub fn new(options: Arc<RuntimeOptions>, diagnostics: DiagnosticManager) -> Self {
        Self {
            options,
            diagnostics,
        }
    }

    /// Name, arity and visibility of `method` are kept; only the body changes,
    /// and only when there is something to check at call time.
    pub fn attach(&self, space: &ObjectSpace, mut method: Method, decl: Arc<Declaration>) -> Result<Method> {
        let context = space.display_name(method.owner);
        if decl.params.len() != method.arity.parameter_count() {
            return Err(Error::SignatureMismatch {
                context,
                method: method.name.clone(),
                declared: decl.params.len(),
                accepted: method.arity,
            });
        }

        let enforce = self.options.enforces(&decl);
        method.declaration = Some(decl.clone());
        if !enforce && !decl.flags.is_abstract {
            trace!("attached unchecked declaration to {}{}{}", context, method.kind.separator(), method.name);
            return Ok(method);
        }

        let guard = Guard {
            context,
            method: method.name.clone(),
            kind: method.kind,
            rest: method.arity.rest,
            declaration: decl,
            original: method.body.clone(),
            enforce,
            options: self.options.clone(),
            diagnostics: self.diagnostics.clone(),
        };
        debug!("guarding {}{}{}", guard.context, guard.kind.separator(), guard.method);
        method.body = Arc::new(move |args: &[Value]| guard.invoke(args));
        method.guarded = true;
        Ok(method)
    }
}

struct Guard {
    context: String,
    method: String,
    kind: MethodKind,
    rest: bool,
    declaration: Arc<Declaration>,
    original: MethodBody,
    enforce: bool,
    options: Arc<RuntimeOptions>,
    diagnostics: DiagnosticManager,
}

impl Guard {
    fn invoke(&self, args: &[Value]) -> Result<Value> {
        if self.declaration.flags.is_abstract {
            return Err(self.diagnostics.report_at(
                Error::AbstractMethodCalled {
                    context: self.context.clone(),
                    method: self.method.clone(),
                },
                self.site_key(None),
            ));
        }

        if self.enforce {
            for (index, arg) in args.iter().enumerate() {
                let Some(param) = self.declaration.param_for(index, self.rest) else {
                    continue;
                };
                if !param.expectation.matches(arg) {
                    let site = ViolationSite::Argument {
                        index,
                        name: param.name.clone(),
                    };
                    self.violation(site, param.expectation.describe(), arg)?;
                }
            }
        }

        let value = (self.original)(args)?;

        match &self.declaration.returns {
            ReturnExpectation::Void => Ok(Value::Nil),
            ReturnExpectation::Untyped => Ok(value),
            ReturnExpectation::Type(expectation) => {
                if self.enforce && !expectation.matches(&value) {
                    self.violation(ViolationSite::Return, expectation.describe(), &value)?;
                }
                Ok(value)
            }
        }
    }

    /// Call-time diagnostics are merged per call site so repeated failures
    /// of a long-lived method don't pile up.
    fn site_key(&self, site: Option<&ViolationSite>) -> String {
        let place = match site {
            Some(ViolationSite::Argument { index, .. }) => format!("argument {}", index),
            Some(ViolationSite::Return) => "return".to_string(),
            None => "call".to_string(),
        };
        format!("{}{}{} {}", self.context, self.kind.separator(), self.method, place)
    }

    fn violation(&self, site: ViolationSite, expected: String, got: &Value) -> Result<()> {
        let key = self.site_key(Some(&site));
        let violation = SignatureViolation {
            context: self.context.clone(),
            method: self.method.clone(),
            kind: self.kind,
            site,
            expected,
            got: got.clone(),
        };
        let message = violation.to_string();
        match self.options.handle_violation(violation) {
            Ok(()) => {
                warn!("signature violation let through: {}", message);
                self.diagnostics.add_diagnostic(
                    Diagnostic::warning(message)
                        .with_source_context(self.context.clone())
                        .with_code("signature-violation")
                        .with_site(key),
                );
                Ok(())
            }
            Err(err) => Err(self.diagnostics.report_at(err, key)),
        }
    }
}
