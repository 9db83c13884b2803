// 📐 Shape Layer - Schema Validation
// Validates import batches before any marker is created

use serde_json::Value;

// ============================================================================
// VALIDATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Index of the offending element in the batch
    pub item: usize,
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[item {}] {}: {}", self.item, self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), Vec<ValidationError>>;

// ============================================================================
// FIELD RULES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldType {
    String,
    Boolean,
    Position,
}

struct FieldRule {
    name: &'static str,
    field_type: FieldType,
    required: bool,
}

/// Shape of one import element:
/// `{type: string, title?: string, position?: {lat: number, lng: number},
///   visible?: boolean, address?: string, avatarUrl?: string}`
const IMPORT_ITEM_RULES: &[FieldRule] = &[
    FieldRule { name: "type", field_type: FieldType::String, required: true },
    FieldRule { name: "title", field_type: FieldType::String, required: false },
    FieldRule { name: "position", field_type: FieldType::Position, required: false },
    FieldRule { name: "visible", field_type: FieldType::Boolean, required: false },
    FieldRule { name: "address", field_type: FieldType::String, required: false },
    FieldRule { name: "avatarUrl", field_type: FieldType::String, required: false },
];

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// SCHEMA VALIDATOR
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct SchemaValidator;

impl SchemaValidator {
    pub fn new() -> Self {
        SchemaValidator
    }

    /// Validate every element of an import batch. Collects all violations.
    pub fn validate_batch(&self, items: &[Value]) -> ValidationResult {
        let errors: Vec<ValidationError> = items
            .iter()
            .enumerate()
            .flat_map(|(index, item)| self.check_item(index, item))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate a single element.
    pub fn validate_item(&self, index: usize, item: &Value) -> ValidationResult {
        let errors = self.check_item(index, item);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn check_item(&self, index: usize, item: &Value) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        let Some(object) = item.as_object() else {
            errors.push(ValidationError {
                item: index,
                field: "(item)".to_string(),
                message: format!("Expected object, received {}", type_name(item)),
            });
            return errors;
        };

        for rule in IMPORT_ITEM_RULES {
            match object.get(rule.name) {
                None if rule.required => errors.push(ValidationError {
                    item: index,
                    field: rule.name.to_string(),
                    message: "Required".to_string(),
                }),
                None => {}
                Some(value) => self.check_field(index, rule, value, &mut errors),
            }
        }

        errors
    }

    fn check_field(&self, index: usize, rule: &FieldRule, value: &Value, errors: &mut Vec<ValidationError>) {
        let mismatch = |expected: &str, field: String, got: &Value| ValidationError {
            item: index,
            field,
            message: format!("Expected {}, received {}", expected, type_name(got)),
        };

        match rule.field_type {
            FieldType::String if !value.is_string() => {
                errors.push(mismatch("string", rule.name.to_string(), value));
            }
            FieldType::Boolean if !value.is_boolean() => {
                errors.push(mismatch("boolean", rule.name.to_string(), value));
            }
            FieldType::Position => {
                let Some(position) = value.as_object() else {
                    errors.push(mismatch("object", rule.name.to_string(), value));
                    return;
                };
                for axis in ["lat", "lng"] {
                    let field = format!("{}.{}", rule.name, axis);
                    match position.get(axis) {
                        None => errors.push(ValidationError {
                            item: index,
                            field,
                            message: "Required".to_string(),
                        }),
                        Some(v) if !v.is_number() => errors.push(mismatch("number", field, v)),
                        Some(_) => {}
                    }
                }
            }
            _ => {}
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
