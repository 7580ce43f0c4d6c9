//! Field-level validation helpers and the flattening of `validator` errors
//! into the `"El campo <field> <message>"` lines returned to clients.

use serde::Serialize;
use std::fmt;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

/// Rejects empty and whitespace-only strings.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("not_blank"));
    }
    Ok(())
}

/// One violated rule, addressed by dotted path (`categoria.id`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "El campo {} {}", self.field, self.message)
    }
}

/// Flattens nested `validator` errors, sorted by field path.
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut collected = Vec::new();
    collect(None, errors, &mut collected);
    collected.sort_by(|a, b| a.field.cmp(&b.field));
    collected
}

fn collect(prefix: Option<&str>, errors: &ValidationErrors, out: &mut Vec<FieldError>) {
    for (field, kind) in errors.errors() {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{field}"),
            None => field.to_string(),
        };

        match kind {
            ValidationErrorsKind::Field(violations) => {
                out.extend(violations.iter().map(|violation| FieldError {
                    field: path.clone(),
                    message: violation
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| violation.code.to_string()),
                }));
            }
            ValidationErrorsKind::Struct(nested) => collect(Some(&path), nested, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect(Some(&format!("{path}[{index}]")), nested, out);
                }
            }
        }
    }
}
