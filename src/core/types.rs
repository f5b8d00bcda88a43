//! Core value types shared by raster functions and their hosts.
//!
//! Scalar parameters, key metadata entries and pixel types are closed sets,
//! so they are modelled as enums:
//! - Exhaustive matching catches missing cases at compile time
//! - serde handles the tagged representation natively
//! - Hosts can exchange them as JSON or TOML without extra glue

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scalar value passed as a parameter or stored in key metadata.
///
/// Raster parameters are not carried as values; their pixels arrive per tile
/// and their properties arrive as [`RasterInfo`](crate::core::raster::RasterInfo).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit floating point number
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Boolean value
    Boolean(bool),
    /// Represents absence of value (clears a key metadata entry)
    None,
}

/// Semantic type of a declared parameter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    /// A raster input delivered as pixel blocks
    Raster,
    /// Integer or floating point scalar
    Numeric,
    /// Free text or a value from a domain
    String,
}

/// Pixel type of a raster band.
///
/// Band data is held as `f64`, which represents every value of every
/// variant exactly. [`PixelType::narrow`] maps an arbitrary `f64` into the
/// value domain of the type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum PixelType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    #[default]
    F32,
    F64,
}

/// Axis-aligned extent in the raster's spatial reference.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Extent {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

/// Spatial reference of a raster, by well-known ID and/or WKT.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct SpatialReference {
    /// Well-known ID (e.g. 4326)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wkid: Option<u32>,
    /// Well-known text definition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wkt: Option<String>,
}

// ============================================================================
// Value Implementation
// ============================================================================

impl Value {
    /// Get the parameter type this value can satisfy.
    ///
    /// Returns `None` for [`Value::None`], which satisfies any optional
    /// parameter.
    pub fn param_type(&self) -> Option<ParamType> {
        match self {
            Value::Integer(_) | Value::Float(_) => Some(ParamType::Numeric),
            Value::String(_) => Some(ParamType::String),
            Value::Boolean(_) => Some(ParamType::Numeric),
            Value::None => None,
        }
    }

    /// Try to get this value as an integer.
    ///
    /// Integral floats and numeric strings are accepted, since hosts often
    /// pass every scalar as text.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(*f as i64),
            Value::Float(_) => None,
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>().ok().or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite() && f.fract() == 0.0)
                        .map(|f| f as i64)
                })
            }
            Value::Boolean(b) => Some(*b as i64),
            Value::None => None,
        }
    }

    /// Try to get this value as a float.
    /// Integers and numeric strings are converted.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::None => None,
        }
    }

    /// Try to get this value as a string reference.
    pub fn as_string(&self) -> Option<&str> {
        if let Value::String(s) = self {
            Some(s)
        } else {
            None
        }
    }

    /// Try to get this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        if let Value::Boolean(b) = self {
            Some(*b)
        } else {
            None
        }
    }

    /// Check if this value is None.
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::None => write!(f, "None"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

// ============================================================================
// ParamType Implementation
// ============================================================================

impl ParamType {
    /// Check if a scalar value matches this parameter type.
    ///
    /// Numeric parameters also accept strings that parse as numbers.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::None) => true,
            (ParamType::Raster, _) => false,
            (ParamType::Numeric, v) => v.as_float().is_some(),
            (ParamType::String, Value::String(_)) => true,
            _ => false,
        }
    }

    /// Get a human-readable name for this type.
    pub fn display_name(&self) -> &'static str {
        match self {
            ParamType::Raster => "Raster",
            ParamType::Numeric => "Numeric",
            ParamType::String => "String",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// PixelType Implementation
// ============================================================================

impl PixelType {
    /// Narrow a value into this pixel type's domain using Rust `as` casts.
    ///
    /// Float-to-integer casts truncate toward zero and saturate at the
    /// type's bounds; NaN becomes 0. Casting to `F32` rounds to the nearest
    /// `f32` and keeps infinities and NaN.
    pub fn narrow(&self, value: f64) -> f64 {
        match self {
            PixelType::U8 => value as u8 as f64,
            PixelType::I8 => value as i8 as f64,
            PixelType::U16 => value as u16 as f64,
            PixelType::I16 => value as i16 as f64,
            PixelType::U32 => value as u32 as f64,
            PixelType::I32 => value as i32 as f64,
            PixelType::F32 => value as f32 as f64,
            PixelType::F64 => value,
        }
    }

    /// Size of one pixel in bytes.
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelType::U8 | PixelType::I8 => 1,
            PixelType::U16 | PixelType::I16 => 2,
            PixelType::U32 | PixelType::I32 | PixelType::F32 => 4,
            PixelType::F64 => 8,
        }
    }

    /// Whether this is a floating point type.
    pub fn is_float(&self) -> bool {
        matches!(self, PixelType::F32 | PixelType::F64)
    }

    /// Short type code (`u1`, `f4`, ...) as used by tiled-raster hosts.
    pub fn code(&self) -> &'static str {
        match self {
            PixelType::U8 => "u1",
            PixelType::I8 => "i1",
            PixelType::U16 => "u2",
            PixelType::I16 => "i2",
            PixelType::U32 => "u4",
            PixelType::I32 => "i4",
            PixelType::F32 => "f4",
            PixelType::F64 => "f8",
        }
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Extent Implementation
// ============================================================================

impl Extent {
    /// Create a new extent.
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self { xmin, ymin, xmax, ymax }
    }

    /// Whether the extent covers no area.
    pub fn is_empty(&self) -> bool {
        !(self.xmax > self.xmin && self.ymax > self.ymin)
    }
}

impl SpatialReference {
    /// Spatial reference from a well-known ID.
    pub fn from_wkid(wkid: u32) -> Self {
        Self { wkid: Some(wkid), wkt: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_numeric_conversions() {
        assert_eq!(Value::Integer(3).as_float(), Some(3.0));
        assert_eq!(Value::Float(2.0).as_integer(), Some(2));
        assert_eq!(Value::Float(2.5).as_integer(), None);
        assert_eq!(Value::Float(f64::NAN).as_integer(), None);
        assert_eq!(Value::Float(f64::INFINITY).as_integer(), None);
        assert_eq!(Value::String(" 4 ".to_string()).as_integer(), Some(4));
        assert_eq!(Value::String("4.0".to_string()).as_integer(), Some(4));
        assert_eq!(Value::String("abc".to_string()).as_float(), None);
        assert!(Value::None.as_float().is_none());
    }

    #[test]
    fn test_param_type_matches() {
        assert!(ParamType::Numeric.matches(&Value::Integer(1)));
        assert!(ParamType::Numeric.matches(&Value::String("1.5".to_string())));
        assert!(!ParamType::Numeric.matches(&Value::String("one".to_string())));
        assert!(ParamType::String.matches(&Value::String("Raw".to_string())));
        assert!(!ParamType::String.matches(&Value::Integer(1)));
        assert!(ParamType::String.matches(&Value::None));
    }

    #[test]
    fn test_narrow_to_u8_saturates() {
        assert_eq!(PixelType::U8.narrow(100.0), 100.0);
        assert_eq!(PixelType::U8.narrow(199.9), 199.0);
        assert_eq!(PixelType::U8.narrow(300.0), 255.0);
        assert_eq!(PixelType::U8.narrow(-4.0), 0.0);
        assert_eq!(PixelType::U8.narrow(f64::NAN), 0.0);
        assert_eq!(PixelType::U8.narrow(f64::INFINITY), 255.0);
    }

    #[test]
    fn test_narrow_to_f32_keeps_non_finite() {
        assert!(PixelType::F32.narrow(f64::NAN).is_nan());
        assert_eq!(PixelType::F32.narrow(f64::NEG_INFINITY), f64::NEG_INFINITY);
        assert_eq!(PixelType::F32.narrow(0.1), 0.1f32 as f64);
    }

    #[test]
    fn test_pixel_type_serde_codes() {
        let t: PixelType = serde_json::from_str("\"u16\"").unwrap();
        assert_eq!(t, PixelType::U16);
        assert_eq!(PixelType::F32.code(), "f4");
        assert_eq!(PixelType::U8.bytes_per_pixel(), 1);
    }

    #[test]
    fn test_extent_empty() {
        assert!(Extent::default().is_empty());
        assert!(!Extent::new(0.0, 0.0, 10.0, 5.0).is_empty());
    }
}
