//! Runtime form fields derived from catalogue category property definitions.

use crate::domain::{CatalogueCategoryProperty, PropertyType, PropertyValue};
use crate::validation::{FieldError, FieldResult, TriState};

#[derive(Debug, Clone, PartialEq)]
pub enum FieldDescriptor {
    Text {
        name: String,
        mandatory: bool,
        allowed: Option<Vec<String>>,
    },
    Number {
        name: String,
        mandatory: bool,
        unit: Option<String>,
        allowed: Option<Vec<f64>>,
    },
    Boolean {
        name: String,
        mandatory: bool,
    },
}

impl From<&CatalogueCategoryProperty> for FieldDescriptor {
    fn from(definition: &CatalogueCategoryProperty) -> Self {
        let allowed = definition.allowed_values.as_ref().map(|a| a.values());
        match definition.property_type {
            PropertyType::String => FieldDescriptor::Text {
                name: definition.name.clone(),
                mandatory: definition.mandatory,
                allowed: allowed.map(|values| {
                    values
                        .iter()
                        .filter_map(|v| match v {
                            PropertyValue::String(s) => Some(s.clone()),
                            _ => None,
                        })
                        .collect()
                }),
            },
            PropertyType::Number => FieldDescriptor::Number {
                name: definition.name.clone(),
                mandatory: definition.mandatory,
                unit: definition.unit.clone(),
                allowed: allowed.map(|values| {
                    values
                        .iter()
                        .filter_map(|v| match v {
                            PropertyValue::Number(n) => Some(*n),
                            _ => None,
                        })
                        .collect()
                }),
            },
            PropertyType::Boolean => FieldDescriptor::Boolean {
                name: definition.name.clone(),
                mandatory: definition.mandatory,
            },
        }
    }
}

/// Raw input for one dynamic field.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyInput {
    Text(String),
    Choice(TriState),
}

impl PropertyInput {
    /// Free text as typed; booleans are parsed later from the same text.
    pub fn from_raw(raw: &str) -> Self {
        PropertyInput::Text(raw.to_string())
    }

    fn text(&self) -> Option<&str> {
        match self {
            PropertyInput::Text(s) => Some(s.trim()),
            PropertyInput::Choice(_) => None,
        }
    }
}

impl FieldDescriptor {
    pub fn name(&self) -> &str {
        match self {
            FieldDescriptor::Text { name, .. }
            | FieldDescriptor::Number { name, .. }
            | FieldDescriptor::Boolean { name, .. } => name,
        }
    }

    pub fn is_mandatory(&self) -> bool {
        match self {
            FieldDescriptor::Text { mandatory, .. }
            | FieldDescriptor::Number { mandatory, .. }
            | FieldDescriptor::Boolean { mandatory, .. } => *mandatory,
        }
    }

    /// Label shown next to the field, with the unit in brackets.
    pub fn label(&self) -> String {
        match self {
            FieldDescriptor::Number {
                name,
                unit: Some(unit),
                ..
            } => format!("{name} ({unit})"),
            other => other.name().to_string(),
        }
    }

    pub fn validate(&self, input: &PropertyInput) -> FieldResult<PropertyValue> {
        match self {
            FieldDescriptor::Text {
                mandatory, allowed, ..
            } => {
                let text = input.text().unwrap_or_default();
                if text.is_empty() {
                    return missing(*mandatory, "Please enter a valid value as this field is mandatory.");
                }
                if let Some(allowed) = allowed {
                    if !allowed.iter().any(|a| a == text) {
                        return Err(FieldError::new("Please select a valid value."));
                    }
                }
                Ok(PropertyValue::String(text.to_string()))
            }
            FieldDescriptor::Number {
                mandatory, allowed, ..
            } => {
                let text = input.text().unwrap_or_default();
                if text.is_empty() {
                    return missing(*mandatory, "Please enter a valid value as this field is mandatory.");
                }
                let number = text
                    .parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .ok_or_else(|| FieldError::new("Please enter a valid number."))?;
                if let Some(allowed) = allowed {
                    if !allowed.iter().any(|a| *a == number) {
                        return Err(FieldError::new("Please select a valid value."));
                    }
                }
                Ok(PropertyValue::Number(number))
            }
            FieldDescriptor::Boolean { mandatory, .. } => {
                let choice = match input {
                    PropertyInput::Choice(choice) => *choice,
                    PropertyInput::Text(raw) => TriState::parse(raw)?,
                };
                match choice {
                    TriState::True => Ok(PropertyValue::Boolean(true)),
                    TriState::False => Ok(PropertyValue::Boolean(false)),
                    TriState::Unset => missing(*mandatory, "Please select either True or False."),
                }
            }
        }
    }
}

fn missing(mandatory: bool, message: &str) -> FieldResult<PropertyValue> {
    if mandatory {
        Err(FieldError::new(message))
    } else {
        Ok(PropertyValue::Null)
    }
}
