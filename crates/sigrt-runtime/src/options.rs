use sigrt_core::config;
use sigrt_core::error::{Error, Result, SignatureViolation};
use sigrt_core::{CheckedLevel, Declaration};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Decides what happens to a call-time violation. Returning `Ok` lets the
/// call proceed.
pub type ViolationHandler = Arc<dyn Fn(&SignatureViolation) -> Result<()> + Send + Sync>;

#[derive(Clone)]
pub struct RuntimeOptions {
    pub default_checked: CheckedLevel,
    pub test_mode: bool,
    pub violation_handler: Option<ViolationHandler>,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            default_checked: config::default_checked_level(),
            test_mode: config::test_mode(),
            violation_handler: None,
        }
    }
}

impl Debug for RuntimeOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeOptions")
            .field("default_checked", &self.default_checked)
            .field("test_mode", &self.test_mode)
            .field("violation_handler", &self.violation_handler.is_some())
            .finish()
    }
}

impl RuntimeOptions {
    pub fn with_violation_handler(
        mut self,
        handler: impl Fn(&SignatureViolation) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.violation_handler = Some(Arc::new(handler));
        self
    }

    /// Whether calls to a method carrying `decl` get argument/return checks.
    pub fn enforces(&self, decl: &Declaration) -> bool {
        decl.checked
            .unwrap_or(self.default_checked)
            .enforces(self.test_mode)
    }

    pub(crate) fn handle_violation(&self, violation: SignatureViolation) -> Result<()> {
        match &self.violation_handler {
            Some(handler) => handler(&violation),
            None => Err(Error::SignatureViolation(violation)),
        }
    }
}
