//! Recoverable problems encountered while processing declarations.
//!
//! A diagnostic means the affected declaration was skipped or restricted;
//! generation continues with the remaining declarations. Fatal conditions
//! (parse failures, output inconsistencies) are reported as errors instead.

use crate::cpp_data::CppOriginLocation;
use serde_derive::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// A type in the declaration has no representation in the FFI type set.
    UnmappableType,
    /// Overloaded declarations can't be distinguished by runtime
    /// argument inspection, so no dispatcher can be generated.
    AmbiguousOverload,
    /// A default argument expression can't be converted to a Lua literal.
    UnresolvableDefault,
}

impl DiagnosticKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::UnmappableType => "unmappable type",
            DiagnosticKind::AmbiguousOverload => "ambiguous overload",
            DiagnosticKind::UnresolvableDefault => "unresolvable default",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Text of the declaration the problem applies to.
    pub item: String,
    pub message: String,
    pub origin_location: Option<CppOriginLocation>,
}

impl Diagnostic {
    pub fn new(
        kind: DiagnosticKind,
        item: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Diagnostic {
            kind,
            item: item.into(),
            message: message.into(),
            origin_location: None,
        }
    }

    pub fn with_location(mut self, location: CppOriginLocation) -> Self {
        self.origin_location = Some(location);
        self
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.kind.as_str(), self.item, self.message)?;
        if let Some(location) = &self.origin_location {
            write!(
                f,
                " ({}:{}:{})",
                location.include_file_path, location.line, location.column
            )?;
        }
        Ok(())
    }
}

/// Summary of all diagnostics, suitable for saving as JSON
/// next to the generated artifacts.
#[derive(Debug, Serialize)]
pub struct DiagnosticsReport {
    pub library_name: String,
    pub total: usize,
    pub unmappable_types: usize,
    pub ambiguous_overloads: usize,
    pub unresolvable_defaults: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticsReport {
    pub fn new(library_name: &str, diagnostics: &[Diagnostic]) -> Self {
        let count = |kind| {
            diagnostics
                .iter()
                .filter(|diagnostic| diagnostic.kind == kind)
                .count()
        };
        DiagnosticsReport {
            library_name: library_name.to_string(),
            total: diagnostics.len(),
            unmappable_types: count(DiagnosticKind::UnmappableType),
            ambiguous_overloads: count(DiagnosticKind::AmbiguousOverload),
            unresolvable_defaults: count(DiagnosticKind::UnresolvableDefault),
            diagnostics: diagnostics.to_vec(),
        }
    }
}
