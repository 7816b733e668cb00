//! Data types of the pixie language.
//!
//! This module only represents and renders types. Resolving a custom
//! type name against the object definitions of a program is the
//! compiler's job; see `Compiler::resolve_type`.

use std::fmt;

use crate::keywords;

/// A named, typed field of an object definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Field {
            name: name.into(),
            data_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    Number,
    String,
    Boolean,
    List(Box<DataType>),
    Map {
        key: Box<DataType>,
        value: Box<DataType>,
    },
    /// Structural object type; fields keep their declaration order.
    Object(Vec<Field>),
    /// Reference to an object definition by name.
    ///
    /// `resolved` stays `None` until the compiler looks the name up.
    Custom {
        name: String,
        resolved: Option<Box<DataType>>,
    },
}

impl DataType {
    pub fn list(element: DataType) -> Self {
        DataType::List(Box::new(element))
    }

    pub fn map(key: DataType, value: DataType) -> Self {
        DataType::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    /// An unresolved reference to the object definition `name`.
    pub fn custom(name: impl Into<String>) -> Self {
        DataType::Custom {
            name: name.into(),
            resolved: None,
        }
    }

    /// Condensed form used when rendering a map's key type.
    pub fn root_type(&self) -> String {
        match self {
            DataType::Number | DataType::String | DataType::Boolean => self.to_string(),
            DataType::List(element) => format!("{}[{}]", keywords::LIST, element.root_type()),
            DataType::Map { key, value } => format!(
                "{}[{}][{}]",
                keywords::MAP,
                key.root_type(),
                value.root_type()
            ),
            DataType::Object(fields) => render_object(fields, DataType::root_type),
            DataType::Custom { name, resolved } => match resolved {
                Some(inner) => inner.root_type(),
                None => name.clone(),
            },
        }
    }

    /// Target-language literal for the type's default value.
    ///
    /// Returns `None` when the type contains a custom reference that
    /// has not been resolved yet.
    pub fn zero_value(&self) -> Option<String> {
        match self {
            DataType::Number => Some("0".to_string()),
            DataType::String => Some("\"\"".to_string()),
            DataType::Boolean => Some(keywords::FALSE.to_string()),
            DataType::List(_) => Some("[]".to_string()),
            DataType::Map { .. } => Some("{}".to_string()),
            DataType::Object(fields) => {
                let mut entries = Vec::with_capacity(fields.len());
                for field in fields {
                    entries.push(format!("\"{}\":{}", field.name, field.data_type.zero_value()?));
                }
                Some(format!("{{{}}}", entries.join(",")))
            }
            DataType::Custom { resolved, .. } => resolved.as_ref()?.zero_value(),
        }
    }

    /// Name of the object definition this type refers to, if any.
    pub fn custom_name(&self) -> Option<&str> {
        match self {
            DataType::Custom { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, DataType::List(_))
    }
}

/// `{name type,name type,}` with fields in name order.
fn render_object(fields: &[Field], render: fn(&DataType) -> String) -> String {
    let mut sorted: Vec<&Field> = fields.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    let mut out = String::from("{");
    for field in sorted {
        out.push_str(&field.name);
        out.push(' ');
        out.push_str(&render(&field.data_type));
        out.push(',');
    }
    out.push('}');
    out
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Number => f.write_str(keywords::NUMBER),
            DataType::String => f.write_str(keywords::STRING),
            DataType::Boolean => f.write_str(keywords::BOOLEAN),
            DataType::List(element) => write!(f, "{}[{}]", keywords::LIST, element),
            DataType::Map { key, value } => {
                write!(f, "{}[{}][{}]", keywords::MAP, key.root_type(), value)
            }
            DataType::Object(fields) => f.write_str(&render_object(fields, |t| t.to_string())),
            DataType::Custom { name, .. } => f.write_str(name),
        }
    }
}
