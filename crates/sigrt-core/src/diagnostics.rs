use crate::error::Error;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    pub source_context: Option<String>,
    pub code: Option<String>,
    /// Repeated diagnostics with the same site collapse into one entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    pub occurrences: usize,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            message: message.into(),
            source_context: None,
            code: None,
            site: None,
            occurrences: 1,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warning,
            message: message.into(),
            source_context: None,
            code: None,
            site: None,
            occurrences: 1,
        }
    }

    pub fn with_source_context(mut self, context: impl Into<String>) -> Self {
        self.source_context = Some(context.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = Some(site.into());
        self
    }

    pub fn from_error(error: &Error) -> Self {
        let diagnostic = Diagnostic::error(error.to_string()).with_code(error.code());
        match error.context() {
            Some(context) => diagnostic.with_source_context(context),
            None => diagnostic,
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(context) = &self.source_context {
            write!(f, "[{}] ", context)?;
        }
        write!(f, "{}", self.message)?;

        if let Some(code) = &self.code {
            write!(f, " [{}]", code)?;
        }

        Ok(())
    }
}

/// Collects every failure the runtime raised, so harnesses can inspect them
/// after the fact.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticManager {
    diagnostics: Arc<Mutex<Vec<Diagnostic>>>,
}

impl DiagnosticManager {
    pub fn new() -> Self {
        Self {
            diagnostics: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Entries carrying a site are merged with an earlier entry of the same
    /// level and site: the count goes up and the latest message is kept.
    pub fn add_diagnostic(&self, diagnostic: Diagnostic) {
        let mut diagnostics = match self.diagnostics.lock() {
            Ok(diagnostics) => diagnostics,
            Err(poison) => poison.into_inner(),
        };
        if diagnostic.site.is_some() {
            if let Some(existing) = diagnostics
                .iter_mut()
                .find(|d| d.level == diagnostic.level && d.site == diagnostic.site)
            {
                existing.occurrences += diagnostic.occurrences;
                existing.message = diagnostic.message;
                return;
            }
        }
        diagnostics.push(diagnostic);
    }

    /// Record `error` and hand it back, for use in `map_err`.
    pub fn report(&self, error: Error) -> Error {
        self.add_diagnostic(Diagnostic::from_error(&error));
        error
    }

    /// Like [`DiagnosticManager::report`], merging repeats from `site`.
    pub fn report_at(&self, error: Error, site: impl Into<String>) -> Error {
        self.add_diagnostic(Diagnostic::from_error(&error).with_site(site));
        error
    }

    pub fn get_diagnostics(&self) -> Vec<Diagnostic> {
        match self.diagnostics.lock() {
            Ok(diagnostics) => diagnostics.clone(),
            Err(poison) => poison.into_inner().clone(),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.get_diagnostics()
            .iter()
            .any(|diag| diag.level == DiagnosticLevel::Error)
    }

    pub fn clear(&self) {
        match self.diagnostics.lock() {
            Ok(mut diagnostics) => diagnostics.clear(),
            Err(poison) => poison.into_inner().clear(),
        }
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(&self.get_diagnostics())?)
    }
}

static GLOBAL_DIAGNOSTIC_MANAGER: Lazy<DiagnosticManager> = Lazy::new(DiagnosticManager::new);

pub fn diagnostic_manager() -> DiagnosticManager {
    GLOBAL_DIAGNOSTIC_MANAGER.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_records_code_and_context() {
        let manager = DiagnosticManager::new();
        let err = manager.report(Error::DoubleDeclaration {
            context: "Widget".to_string(),
        });
        assert!(matches!(err, Error::DoubleDeclaration { .. }));

        let diagnostics = manager.get_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code.as_deref(), Some("double-declaration"));
        assert_eq!(diagnostics[0].source_context.as_deref(), Some("Widget"));
        assert!(manager.has_errors());
        assert!(manager.to_json().unwrap().contains("double-declaration"));

        manager.clear();
        assert!(!manager.has_errors());
    }

    #[test]
    fn repeats_from_one_site_are_counted_not_stored() {
        let manager = DiagnosticManager::new();
        for i in 0..1000 {
            manager.add_diagnostic(
                Diagnostic::warning(format!("got {}", i)).with_site("K#id argument 0"),
            );
        }
        manager.add_diagnostic(Diagnostic::warning("other").with_site("K#id return"));

        let diagnostics = manager.get_diagnostics();
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].occurrences, 1000);
        assert_eq!(diagnostics[0].message, "got 999");
        assert_eq!(diagnostics[1].occurrences, 1);
    }
}
