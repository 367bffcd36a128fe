//! Request payload validation

use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::utils::AppError;

/// Run the payload's `validator` rules, turning failures into a 400
pub fn validate_payload<T: Validate>(payload: &T) -> Result<(), AppError> {
    payload.validate().map_err(|errors| {
        let fields = fields_with_messages("", &errors);
        let names: Vec<&str> = fields.iter().map(|(field, _)| field.as_str()).collect();
        let err = AppError::validation(format!("Invalid fields: {}", names.join(", ")));
        fields
            .into_iter()
            .fold(err, |err, (field, message)| err.with_detail(field, message))
    })
}

/// Flatten nested and list errors into `path -> message` pairs
fn fields_with_messages(prefix: &str, errors: &ValidationErrors) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                let message = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect::<Vec<_>>()
                    .join("; ");
                out.push((path, message));
            }
            ValidationErrorsKind::Struct(nested) => {
                out.extend(fields_with_messages(&path, nested));
            }
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    out.extend(fields_with_messages(&format!("{path}[{index}]"), nested));
                }
            }
        }
    }
    out.sort();
    out
}
