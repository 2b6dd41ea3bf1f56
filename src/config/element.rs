//! Declarative configuration tree
//!
//! An [`Element`] is a named node with string attributes and child elements,
//! the shape of an XML configuration section. It derives serde so hosts can
//! load it from JSON or any other serde format:
//!
//! ```
//! use rust_log_intake::config::Element;
//!
//! let root: Element = serde_json::from_str(r#"{
//!     "tag": "logging",
//!     "attributes": { "enabled": "true" },
//!     "children": [
//!         { "tag": "logger", "attributes": { "name": "a.b", "level": "INFO" } }
//!     ]
//! }"#).unwrap();
//!
//! assert_eq!(root.children().len(), 1);
//! assert_eq!(root.children()[0].attribute("level"), Some("INFO"));
//! ```

use super::model::Pattern;
use crate::core::{IntakeError, Level, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    tag: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<Element>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Check attributes against a contract
    ///
    /// Fails on the first attribute not named in `accepted`, then on the first
    /// required attribute that is absent.
    pub fn validate_attributes(&self, accepted: &[AttributeSpec]) -> Result<()> {
        if let Some(unknown) = self
            .attributes
            .keys()
            .find(|name| !accepted.iter().any(|spec| spec.name == name.as_str()))
        {
            return Err(IntakeError::unknown_attribute(&self.tag, unknown));
        }

        if let Some(missing) = accepted
            .iter()
            .find(|spec| spec.required && !self.attributes.contains_key(spec.name))
        {
            return Err(IntakeError::missing_attribute(&self.tag, missing.name));
        }

        Ok(())
    }

    pub fn required(&self, name: &str) -> Result<&str> {
        self.attribute(name)
            .ok_or_else(|| IntakeError::missing_attribute(&self.tag, name))
    }

    pub fn optional_level(&self, name: &str) -> Result<Option<Level>> {
        self.attribute(name)
            .map(|value| {
                Level::parse_token(value)
                    .ok_or_else(|| IntakeError::invalid_level(&self.tag, name, value))
            })
            .transpose()
    }

    pub fn optional_pattern(&self, name: &str) -> Result<Option<Pattern>> {
        self.attribute(name)
            .map(|value| {
                Pattern::new(value)
                    .map_err(|source| IntakeError::invalid_regex(&self.tag, name, value, source))
            })
            .transpose()
    }

    pub fn optional_bool(&self, name: &str) -> Result<Option<bool>> {
        self.attribute(name)
            .map(|value| match value.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(IntakeError::invalid_value(&self.tag, name, value, "true or false")),
            })
            .transpose()
    }

    pub fn optional_u32(&self, name: &str) -> Result<Option<u32>> {
        self.attribute(name)
            .map(|value| {
                value.trim().parse::<u32>().map_err(|_| {
                    IntakeError::invalid_value(&self.tag, name, value, "a non-negative integer")
                })
            })
            .transpose()
    }
}

/// One entry of an element's attribute contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSpec {
    pub name: &'static str,
    pub required: bool,
}

impl AttributeSpec {
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            required: true,
        }
    }

    pub const fn optional(name: &'static str) -> Self {
        Self {
            name,
            required: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTRACT: [AttributeSpec; 2] =
        [AttributeSpec::required("name"), AttributeSpec::optional("level")];

    #[test]
    fn test_validate_attributes() {
        let ok = Element::new("thing").with_attribute("name", "x");
        assert!(ok.validate_attributes(&CONTRACT).is_ok());

        let missing = Element::new("thing").with_attribute("level", "INFO");
        let err = missing.validate_attributes(&CONTRACT).unwrap_err();
        assert!(matches!(
            err,
            IntakeError::MissingAttribute { ref element, ref attribute }
                if element == "thing" && attribute == "name"
        ));

        let unknown = Element::new("thing")
            .with_attribute("name", "x")
            .with_attribute("colour", "red");
        let err = unknown.validate_attributes(&CONTRACT).unwrap_err();
        assert!(matches!(err, IntakeError::UnknownAttribute { ref attribute, .. } if attribute == "colour"));
    }

    #[test]
    fn test_typed_accessors() {
        let element = Element::new("logger")
            .with_attribute("level", "3000")
            .with_attribute("enabled", "False")
            .with_attribute("bufferSize", "20")
            .with_attribute("userAgentRegex", "MSIE 7|MSIE 8");

        assert_eq!(element.optional_level("level").unwrap(), Some(Level::Info));
        assert_eq!(element.optional_bool("enabled").unwrap(), Some(false));
        assert_eq!(element.optional_u32("bufferSize").unwrap(), Some(20));
        assert!(element.optional_pattern("userAgentRegex").unwrap().is_some());
        assert_eq!(element.optional_level("missing").unwrap(), None);
    }

    #[test]
    fn test_typed_accessor_errors() {
        let element = Element::new("logger")
            .with_attribute("level", "LOUD")
            .with_attribute("enabled", "yes")
            .with_attribute("bufferSize", "-1")
            .with_attribute("userAgentRegex", "(unclosed");

        assert!(matches!(
            element.optional_level("level"),
            Err(IntakeError::InvalidLevel { .. })
        ));
        assert!(matches!(
            element.optional_bool("enabled"),
            Err(IntakeError::InvalidValue { .. })
        ));
        assert!(matches!(
            element.optional_u32("bufferSize"),
            Err(IntakeError::InvalidValue { .. })
        ));
        assert!(matches!(
            element.optional_pattern("userAgentRegex"),
            Err(IntakeError::InvalidRegex { .. })
        ));
    }

    #[test]
    fn test_serde_round_trip_shape() {
        let element = Element::new("logging")
            .with_child(Element::new("logger").with_attribute("name", "a"));
        let json = serde_json::to_value(&element).unwrap();
        assert_eq!(json["children"][0]["attributes"]["name"], "a");
        assert!(json.get("attributes").is_none());
    }
}
