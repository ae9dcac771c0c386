//! Engine parameters editable from the console.
//!
//! Values live inside the sensing engine and are never cached here. This
//! module only knows names, defaults, console texts and the documented
//! validity rules.

use core::str::FromStr;

/// Lower bound of the presence range in meters.
pub const RANGE_MIN_M: f32 = 0.66;

/// Upper bound of the presence range in meters.
pub const RANGE_MAX_M: f32 = 10.2;

/// A named, string-valued engine parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter {
    /// Maximum presence range in meters
    MaxRange,
    /// Detection sensitivity (low / medium / high)
    Sensitivity,
}

impl Parameter {
    /// Every parameter, in menu order.
    pub const ALL: [Parameter; 2] = [Parameter::MaxRange, Parameter::Sensitivity];

    /// Engine-side name.
    pub fn name(self) -> &'static str {
        match self {
            Self::MaxRange => "radar_presence_range_max",
            Self::Sensitivity => "radar_presence_sensitivity",
        }
    }

    /// Value applied at bring-up.
    pub fn default_value(self) -> &'static str {
        match self {
            Self::MaxRange => "2.0",
            Self::Sensitivity => Sensitivity::Medium.as_str(),
        }
    }

    /// Menu key that starts editing this parameter.
    pub fn key(self) -> u8 {
        match self {
            Self::MaxRange => b'r',
            Self::Sensitivity => b's',
        }
    }

    /// Menu text, printed as `'<key>': <label> (<value>)`.
    pub fn menu_label(self) -> &'static str {
        match self {
            Self::MaxRange => "Set presence max range",
            Self::Sensitivity => "Set sensitivity",
        }
    }

    /// Prompt printed before reading a new value.
    pub fn prompt(self) -> &'static str {
        match self {
            Self::MaxRange => "Enter range [0.66-10.2]m, press enter",
            Self::Sensitivity => "Set Sensitivity: 'high', 'medium' or 'low'",
        }
    }

    pub fn from_key(key: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.key() == key)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

/// Parse a presence range in meters, `None` if not numeric or out of bounds.
pub fn parse_range(value: &str) -> Option<f32> {
    let meters: f32 = value.parse().ok()?;
    (RANGE_MIN_M..=RANGE_MAX_M).contains(&meters).then_some(meters)
}

/// Detection sensitivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensitivity {
    Low,
    Medium,
    High,
}

impl Sensitivity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Text is not one of `low`, `medium`, `high`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseSensitivityError;

impl FromStr for Sensitivity {
    type Err = ParseSensitivityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ParseSensitivityError),
        }
    }
}

impl core::fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_bounds_are_inclusive() {
        assert_eq!(parse_range("0.66"), Some(0.66));
        assert_eq!(parse_range("10.2"), Some(10.2));
        assert_eq!(parse_range("0.65"), None);
        assert_eq!(parse_range("10.21"), None);
    }

    #[test]
    fn test_range_rejects_non_numeric() {
        assert_eq!(parse_range(""), None);
        assert_eq!(parse_range("two"), None);
        assert_eq!(parse_range("NaN"), None);
    }

    #[test]
    fn test_keys_map_to_parameters() {
        assert_eq!(Parameter::from_key(b'r'), Some(Parameter::MaxRange));
        assert_eq!(Parameter::from_key(b's'), Some(Parameter::Sensitivity));
        assert_eq!(Parameter::from_key(b'x'), None);
        assert_eq!(Parameter::from_key(b'?'), None);
    }

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(parse_range(Parameter::MaxRange.default_value()), Some(2.0));
        assert_eq!(
            Parameter::Sensitivity.default_value().parse::<Sensitivity>(),
            Ok(Sensitivity::Medium)
        );
    }

    #[test]
    fn test_sensitivity_is_case_sensitive() {
        assert_eq!("high".parse::<Sensitivity>(), Ok(Sensitivity::High));
        assert!("High".parse::<Sensitivity>().is_err());
        assert!("extreme".parse::<Sensitivity>().is_err());
    }
}
