//! Parameter declarations for raster functions.
//!
//! A function declares its parameters once. Hosts read the declarations to
//! build a UI, and the run preparation uses them to fill defaults and reject
//! values outside a parameter's type or domain.

use crate::core::types::{ParamType, Value};
use serde::{Deserialize, Serialize};

/// Declaration of one function parameter.
///
/// Immutable once built. Raster parameters name the inputs whose pixel
/// blocks the host delivers per tile; numeric and string parameters are
/// scalars fixed for the whole run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParameterSpec {
    /// Unique name within the function (used in code and run files)
    pub name: String,
    /// Human-readable name (used in UI)
    pub display_name: String,
    /// Semantic type of the parameter
    pub param_type: ParamType,
    /// Default value, `Value::None` when there is none
    pub default_value: Value,
    /// Whether the host must supply this parameter
    pub required: bool,
    /// Allowed values, for string parameters chosen from a fixed list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<Vec<String>>,
    /// Description for documentation and tooltips
    pub description: String,
}

impl ParameterSpec {
    /// Create a new optional parameter with a default value.
    pub fn new(name: impl Into<String>, param_type: ParamType, default_value: Value) -> Self {
        let name = name.into();
        Self {
            display_name: Self::name_to_display(&name),
            name,
            param_type,
            default_value,
            required: false,
            domain: None,
            description: String::new(),
        }
    }

    /// Create a raster parameter.
    pub fn raster(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Raster, Value::None)
    }

    /// Set the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Restrict the parameter to a fixed set of values.
    pub fn with_domain(mut self, options: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.domain = Some(options.into_iter().map(Into::into).collect());
        self
    }

    /// Mark this parameter as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Convert snake_case name to Title Case display name.
    fn name_to_display(name: &str) -> String {
        name.split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    None => String::new(),
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Validate a scalar value against this parameter's type and domain.
    ///
    /// Domain membership is compared case-insensitively, matching how hosts
    /// treat enumerated string choices.
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        if self.param_type == ParamType::Raster {
            return Err(format!(
                "Parameter '{}' is a raster and cannot take a scalar value",
                self.name
            ));
        }

        if !self.param_type.matches(value) {
            return Err(format!(
                "Type mismatch for parameter '{}': expected {}, got {}",
                self.name, self.param_type, value
            ));
        }

        if let (Some(domain), Value::String(s)) = (&self.domain, value) {
            if !domain.iter().any(|option| option.eq_ignore_ascii_case(s.trim())) {
                return Err(format!(
                    "Value '{}' is not one of {:?}",
                    s, domain
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_spec_builder() {
        let spec = ParameterSpec::new("red", ParamType::Numeric, Value::Integer(1))
            .with_display_name("Red Band Index")
            .with_description("The index of the red band")
            .required();

        assert_eq!(spec.name, "red");
        assert_eq!(spec.display_name, "Red Band Index");
        assert_eq!(spec.param_type, ParamType::Numeric);
        assert_eq!(spec.default_value, Value::Integer(1));
        assert!(spec.required);
        assert!(spec.domain.is_none());
    }

    #[test]
    fn test_domain_validation() {
        let spec = ParameterSpec::new("method", ParamType::String, Value::from("Colormap"))
            .with_domain(["Raw", "Grayscale", "Colormap"]);

        assert!(spec.validate(&Value::from("Raw")).is_ok());
        assert!(spec.validate(&Value::from("grayscale")).is_ok());
        assert!(spec.validate(&Value::from("Sepia")).is_err());
        assert!(spec.validate(&Value::Integer(1)).is_err());
    }

    #[test]
    fn test_raster_parameters_reject_scalars() {
        let spec = ParameterSpec::raster("raster").required();
        assert!(spec.validate(&Value::from("band.tif")).is_err());
        assert_eq!(spec.display_name, "Raster");
    }

    #[test]
    fn test_name_to_display() {
        assert_eq!(ParameterSpec::name_to_display("zone_raster"), "Zone Raster");
        assert_eq!(ParameterSpec::name_to_display("background"), "Background");
    }
}
