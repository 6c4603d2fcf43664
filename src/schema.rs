//! Vault v3 payment-token payload schema and validator.
//!
//! The schema is a set of static tables; validation walks them in declared
//! order and stops at the first violation so diagnostics are deterministic.
use crate::error::VaultError;
use serde::Serialize;
use serde_json::{Map, Value};

/// Root key every payload must carry.
pub const ROOT_KEY: &str = "payment_source";

#[derive(Debug, Clone, Copy)]
enum FieldType {
    String,
    Object(&'static ObjectSchema),
}

#[derive(Debug)]
struct Property {
    name: &'static str,
    ty: FieldType,
}

#[derive(Debug)]
pub struct ObjectSchema {
    properties: &'static [Property],
    required: &'static [&'static str],
}

/// A recognized payment method under `payment_source`.
#[derive(Debug)]
pub struct PaymentMethod {
    pub key: &'static str,
    schema: &'static ObjectSchema,
}

const fn string(name: &'static str) -> Property {
    Property {
        name,
        ty: FieldType::String,
    }
}

static BILLING_ADDRESS: ObjectSchema = ObjectSchema {
    properties: &[
        string("address_line_1"),
        string("address_line_2"),
        string("admin_area_2"),
        string("admin_area_1"),
        string("postal_code"),
        string("country_code"),
    ],
    required: &["address_line_1", "admin_area_2", "postal_code", "country_code"],
};

static CARD: ObjectSchema = ObjectSchema {
    properties: &[
        string("number"),
        string("expiry"),
        string("security_code"),
        string("name"),
        Property {
            name: "billing_address",
            ty: FieldType::Object(&BILLING_ADDRESS),
        },
    ],
    required: &["number", "expiry", "security_code"],
};

static PAYPAL: ObjectSchema = ObjectSchema {
    properties: &[string("email"), string("country_code")],
    required: &["email"],
};

static VENMO: ObjectSchema = ObjectSchema {
    properties: &[string("user_id")],
    required: &["user_id"],
};

static APPLEPAY: ObjectSchema = ObjectSchema {
    properties: &[string("payment_token")],
    required: &["payment_token"],
};

/// Payment methods in traversal order.
pub static PAYMENT_METHODS: [PaymentMethod; 4] = [
    PaymentMethod {
        key: "card",
        schema: &CARD,
    },
    PaymentMethod {
        key: "paypal",
        schema: &PAYPAL,
    },
    PaymentMethod {
        key: "venmo",
        schema: &VENMO,
    },
    PaymentMethod {
        key: "applepay",
        schema: &APPLEPAY,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    MissingField,
    WrongType,
    NoPaymentMethod,
    MultiplePaymentMethods,
}

/// The first schema violation found in a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Dotted path of the offending location (e.g. `payment_source.card.number`).
    pub path: String,
    pub kind: ViolationKind,
    pub message: String,
}

impl Violation {
    fn missing(parent: &str, field: &str) -> Self {
        let path = if parent == "payload" {
            field.to_string()
        } else {
            format!("{parent}.{field}")
        };
        Self {
            path,
            kind: ViolationKind::MissingField,
            message: format!("required field {field} missing from {parent}"),
        }
    }

    fn wrong_type(path: &str, expected: &str) -> Self {
        let message = if path == "payload" {
            format!("payload must be a JSON {expected}")
        } else {
            format!("field {path} must be a{} {expected}", article_suffix(expected))
        };
        Self {
            path: path.to_string(),
            kind: ViolationKind::WrongType,
            message,
        }
    }
}

fn article_suffix(word: &str) -> &'static str {
    if word.starts_with(['a', 'e', 'i', 'o', 'u']) {
        "n"
    } else {
        ""
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation: Option<Violation>,
}

impl ValidationResult {
    fn pass() -> Self {
        Self {
            valid: true,
            violation: None,
        }
    }

    fn fail(violation: Violation) -> Self {
        Self {
            valid: false,
            violation: Some(violation),
        }
    }

    /// Diagnostic for the first violation; empty when valid.
    pub fn message(&self) -> &str {
        self.violation
            .as_ref()
            .map(|violation| violation.message.as_str())
            .unwrap_or("")
    }

    pub fn to_error(&self) -> Option<VaultError> {
        self.violation.as_ref().map(|violation| VaultError::Validation {
            path: violation.path.clone(),
            message: violation.message.clone(),
        })
    }
}

/// Validate a candidate payload against the vault schema.
pub fn validate(payload: &Value) -> ValidationResult {
    match check_payload(payload) {
        Ok(()) => ValidationResult::pass(),
        Err(violation) => ValidationResult::fail(violation),
    }
}

/// Payment methods present under `payment_source`, in traversal order.
pub fn present_methods(source: &Map<String, Value>) -> Vec<&'static PaymentMethod> {
    PAYMENT_METHODS
        .iter()
        .filter(|method| source.contains_key(method.key))
        .collect()
}

fn check_payload(payload: &Value) -> Result<(), Violation> {
    let root = payload
        .as_object()
        .ok_or_else(|| Violation::wrong_type("payload", "object"))?;
    let source = root
        .get(ROOT_KEY)
        .ok_or_else(|| Violation::missing("payload", ROOT_KEY))?
        .as_object()
        .ok_or_else(|| Violation::wrong_type(ROOT_KEY, "object"))?;

    let present = present_methods(source);
    let method = match present.as_slice() {
        [] => {
            let keys = PAYMENT_METHODS
                .iter()
                .map(|method| method.key)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(Violation {
                path: ROOT_KEY.to_string(),
                kind: ViolationKind::NoPaymentMethod,
                message: format!("{ROOT_KEY} must contain one of {keys}"),
            });
        }
        [method] => *method,
        many => {
            let found = many
                .iter()
                .map(|method| method.key)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(Violation {
                path: ROOT_KEY.to_string(),
                kind: ViolationKind::MultiplePaymentMethods,
                message: format!(
                    "{ROOT_KEY} must contain exactly one payment method (found {found})"
                ),
            });
        }
    };

    let path = format!("{ROOT_KEY}.{}", method.key);
    check_object(&source[method.key], method.schema, &path)
}

fn check_object(value: &Value, schema: &ObjectSchema, path: &str) -> Result<(), Violation> {
    let object = value
        .as_object()
        .ok_or_else(|| Violation::wrong_type(path, "object"))?;

    for field in schema.required {
        if !object.contains_key(*field) {
            return Err(Violation::missing(path, field));
        }
    }

    for property in schema.properties {
        let Some(child) = object.get(property.name) else {
            continue;
        };
        let child_path = format!("{path}.{}", property.name);
        match property.ty {
            FieldType::String => {
                if !child.is_string() {
                    return Err(Violation::wrong_type(&child_path, "string"));
                }
            }
            FieldType::Object(nested) => check_object(child, nested, &child_path)?,
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
