//! Parameter schemas for tools.
//!
//! A tool declares its parameters as a list of [`ParamSpec`]s. The list is
//! rendered once into a JSON Schema object, which is both advertised to
//! clients through `tools/list` and compiled into a validator. Arguments
//! are validated and completed with defaults before a handler ever sees
//! them.

use jsonschema::JSONSchema;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use crate::core::error::{RegistryError, ToolError};

/// Value shape accepted for one parameter.
#[derive(Debug, Clone, Copy)]
pub enum ParamKind {
    String,
    Integer,
    /// Integer in `0..=u32::MAX`, such as a page number or page size.
    Index,
    Boolean,
    /// One of a fixed vocabulary.
    Enum(&'static [&'static str]),
    StringArray,
    /// Array whose members come from a fixed vocabulary.
    EnumArray(&'static [&'static str]),
}

impl ParamKind {
    fn to_schema(self) -> Value {
        match self {
            ParamKind::String => json!({ "type": "string" }),
            ParamKind::Integer => json!({ "type": "integer" }),
            ParamKind::Index => json!({ "type": "integer", "minimum": 0, "maximum": u32::MAX }),
            ParamKind::Boolean => json!({ "type": "boolean" }),
            ParamKind::Enum(values) => json!({ "type": "string", "enum": values }),
            ParamKind::StringArray => json!({ "type": "array", "items": { "type": "string" } }),
            ParamKind::EnumArray(values) => json!({
                "type": "array",
                "items": { "type": "string", "enum": values }
            }),
        }
    }
}

/// Declaration of a single tool parameter.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub default: Option<Value>,
    pub description: &'static str,
}

impl ParamSpec {
    pub fn required(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: true,
            default: None,
            description,
        }
    }

    pub fn optional(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: false,
            default: None,
            description,
        }
    }

    /// Value filled in when the caller omits this (optional) parameter.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// Compiled parameter schema of one tool.
pub struct ParameterSchema {
    params: Vec<ParamSpec>,
    json: Value,
    validator: JSONSchema,
}

impl ParameterSchema {
    pub fn new(tool: &str, params: Vec<ParamSpec>) -> Result<Self, RegistryError> {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &params {
            if properties.contains_key(param.name) {
                return Err(RegistryError::InvalidSchema {
                    tool: tool.to_string(),
                    message: format!("parameter {} declared twice", param.name),
                });
            }
            let mut property = param.kind.to_schema();
            if let Value::Object(ref mut property) = property {
                property.insert("description".into(), param.description.into());
                if let Some(default) = &param.default {
                    property.insert("default".into(), default.clone());
                }
            }
            properties.insert(param.name.to_string(), property);
            if param.required {
                required.push(param.name);
            }
        }

        let json = json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false
        });

        let validator = JSONSchema::compile(&json).map_err(|e| RegistryError::InvalidSchema {
            tool: tool.to_string(),
            message: e.to_string(),
        })?;

        // A default that fails its own schema would only surface at call time.
        for param in &params {
            if let Some(default) = &param.default {
                let probe = json!({ param.name: default });
                let fragment = JSONSchema::compile(&json!({
                    "type": "object",
                    "properties": { param.name: param.kind.to_schema() }
                }))
                .map_err(|e| RegistryError::InvalidSchema {
                    tool: tool.to_string(),
                    message: e.to_string(),
                })?;
                if !fragment.is_valid(&probe) {
                    return Err(RegistryError::InvalidSchema {
                        tool: tool.to_string(),
                        message: format!("default for {} does not match its type", param.name),
                    });
                }
            }
        }

        Ok(Self {
            params,
            json,
            validator,
        })
    }

    /// JSON Schema advertised as the tool's `inputSchema`.
    pub fn to_json(&self) -> &Value {
        &self.json
    }

    /// Validate raw arguments and apply defaults.
    ///
    /// Missing arguments are treated as an empty object. On failure every
    /// violation is returned, formatted as `<pointer>: <message>`.
    pub fn prepare(&self, arguments: Option<Value>) -> Result<ToolArgs, Vec<String>> {
        let arguments = arguments.unwrap_or_else(|| Value::Object(Map::new()));

        if let Err(errors) = self.validator.validate(&arguments) {
            return Err(errors
                .map(|error| {
                    let pointer = error.instance_path.to_string();
                    let pointer = if pointer.is_empty() { "/".to_string() } else { pointer };
                    format!("{pointer}: {error}")
                })
                .collect());
        }

        // Validation guarantees an object here.
        let mut map = match arguments {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for param in &self.params {
            if let Some(default) = &param.default {
                map.entry(param.name).or_insert_with(|| default.clone());
            }
        }
        Ok(ToolArgs(map))
    }
}

/// Validated, defaulted tool arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArgs(Map<String, Value>);

impl ToolArgs {
    /// Deserialize the arguments into a typed record.
    ///
    /// Records only pick the keys they know, so one argument map can feed
    /// both a subject record and an options record.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, ToolError> {
        serde_json::from_value(Value::Object(self.0.clone()))
            .map_err(|e| ToolError::Arguments(e.to_string()))
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }
}
