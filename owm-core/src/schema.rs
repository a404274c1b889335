//! Declarative response contracts.
//!
//! Each endpoint that has a contract declares it as a static [`ObjectSchema`].
//! Validation walks a decoded `serde_json::Value` and reports every problem it
//! finds as a separate [`SchemaViolation`]; an empty list means the value
//! satisfies the contract.

use std::fmt;

use serde_json::Value;

/// JSON value kinds a property can be declared as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonType {
    String,
    Number,
    Object,
    Array,
}

impl JsonType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JsonType::String => "string",
            JsonType::Number => "number",
            JsonType::Object => "object",
            JsonType::Array => "array",
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            JsonType::String => value.is_string(),
            JsonType::Number => value.is_number(),
            JsonType::Object => value.is_object(),
            JsonType::Array => value.is_array(),
        }
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed property of an object schema.
#[derive(Debug, Clone, Copy)]
pub struct Property {
    pub name: &'static str,
    pub ty: JsonType,
    /// Schema every element must satisfy, for `Array` properties.
    pub items: Option<&'static ObjectSchema>,
}

impl Property {
    pub const fn new(name: &'static str, ty: JsonType) -> Self {
        Self { name, ty, items: None }
    }

    pub const fn array_of(name: &'static str, items: &'static ObjectSchema) -> Self {
        Self { name, ty: JsonType::Array, items: Some(items) }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ObjectSchema {
    pub properties: &'static [Property],
    pub required: &'static [&'static str],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    Missing,
    WrongType { expected: JsonType, found: &'static str },
    /// Shape checks passed but the body still could not be decoded.
    Malformed(String),
}

/// One discrete contract failure, located by a dotted path such as `list[3].dt_txt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub path: String,
    pub kind: ViolationKind,
}

impl SchemaViolation {
    pub fn missing(path: impl Into<String>) -> Self {
        Self { path: path.into(), kind: ViolationKind::Missing }
    }

    pub fn wrong_type(path: impl Into<String>, expected: JsonType, found: &'static str) -> Self {
        Self { path: path.into(), kind: ViolationKind::WrongType { expected, found } }
    }

    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { path: path.into(), kind: ViolationKind::Malformed(reason.into()) }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "<root>" } else { self.path.as_str() };
        match &self.kind {
            ViolationKind::Missing => write!(f, "{path}: missing required property"),
            ViolationKind::WrongType { expected, found } => {
                write!(f, "{path}: expected {expected}, found {found}")
            }
            ViolationKind::Malformed(reason) => write!(f, "{path}: {reason}"),
        }
    }
}

impl ObjectSchema {
    /// Validate `value` against this schema, collecting every violation.
    pub fn validate(&self, value: &Value) -> Vec<SchemaViolation> {
        let mut violations = Vec::new();
        self.validate_at(value, "", &mut violations);
        violations
    }

    fn validate_at(&self, value: &Value, path: &str, out: &mut Vec<SchemaViolation>) {
        let Some(object) = value.as_object() else {
            out.push(SchemaViolation::wrong_type(path, JsonType::Object, type_name(value)));
            return;
        };

        for key in self.required {
            if !object.contains_key(*key) {
                out.push(SchemaViolation::missing(child_path(path, key)));
            }
        }

        for prop in self.properties {
            let Some(field) = object.get(prop.name) else {
                continue;
            };
            let field_path = child_path(path, prop.name);

            if !prop.ty.matches(field) {
                out.push(SchemaViolation::wrong_type(field_path, prop.ty, type_name(field)));
                continue;
            }

            if let (Some(items), Some(elements)) = (prop.items, field.as_array()) {
                for (idx, element) in elements.iter().enumerate() {
                    items.validate_at(element, &format!("{field_path}[{idx}]"), out);
                }
            }
        }
    }
}

fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() { key.to_string() } else { format!("{parent}.{key}") }
}

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

pub static FORECAST_ENTRY_SCHEMA: ObjectSchema = ObjectSchema {
    properties: &[
        Property::new("dt", JsonType::Number),
        Property::new("main", JsonType::Object),
        Property::new("weather", JsonType::Array),
        Property::new("clouds", JsonType::Object),
        Property::new("wind", JsonType::Object),
        Property::new("visibility", JsonType::Number),
        Property::new("pop", JsonType::Number),
        Property::new("sys", JsonType::Object),
        Property::new("dt_txt", JsonType::String),
    ],
    required: &["dt", "main", "weather", "clouds", "wind", "visibility", "pop", "sys", "dt_txt"],
};

/// Contract for `GET /forecast`.
pub static FORECAST_SCHEMA: ObjectSchema = ObjectSchema {
    properties: &[
        Property::new("cod", JsonType::String),
        Property::new("message", JsonType::Number),
        Property::new("cnt", JsonType::Number),
        Property::array_of("list", &FORECAST_ENTRY_SCHEMA),
        Property::new("city", JsonType::Object),
    ],
    required: &["cod", "message", "cnt", "list", "city"],
};

pub static AIR_POLLUTION_ENTRY_SCHEMA: ObjectSchema = ObjectSchema {
    properties: &[
        Property::new("main", JsonType::Object),
        Property::new("components", JsonType::Object),
        Property::new("dt", JsonType::Number),
    ],
    required: &["main", "components", "dt"],
};

/// Contract for `GET /air_pollution`.
pub static AIR_POLLUTION_SCHEMA: ObjectSchema = ObjectSchema {
    properties: &[
        Property::new("coord", JsonType::Object),
        Property::array_of("list", &AIR_POLLUTION_ENTRY_SCHEMA),
    ],
    required: &["coord", "list"],
};
