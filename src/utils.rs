use std::fmt;
use std::str::FromStr;

/// Converts serde_json's 1-based line and column into a byte offset into
/// `source`, clamped to the end of the text.
pub fn offset_for_line_column(source: &str, line: usize, column: usize) -> usize {
    let mut offset = 0;
    for (index, text) in source.split_inclusive('\n').enumerate() {
        if index + 1 == line {
            return (offset + column.saturating_sub(1)).min(source.len());
        }
        offset += text.len();
    }
    source.len()
}

/// Kebab-cases one path segment: `fontSize` becomes `font-size`, and spaces,
/// underscores and dots become dashes.
pub fn kebab_case(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len() + 4);
    let mut previous_lower = false;
    for c in segment.chars() {
        if c.is_ascii_uppercase() {
            if previous_lower {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
            previous_lower = false;
        } else if matches!(c, ' ' | '_' | '.' | '/') {
            if !out.ends_with('-') {
                out.push('-');
            }
            previous_lower = false;
        } else {
            out.push(c);
            previous_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        }
    }
    out
}

/// Builds a dash-joined identifier from a prefix and path segments.
pub fn dashed_name<S: AsRef<str>>(prefix: &str, path: &[S]) -> String {
    let mut name = kebab_case(prefix);
    for segment in path {
        if !name.is_empty() {
            name.push('-');
        }
        name.push_str(&kebab_case(segment.as_ref()));
    }
    name
}

pub const DIMENSION_UNITS: [&str; 15] = [
    "px", "rem", "em", "%", "vh", "vw", "vmin", "vmax", "ch", "ex", "cm", "mm", "in", "pt", "pc",
];

/// A magnitude with a unit suffix, e.g. `1.5rem`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    pub value: f64,
    pub unit: String,
}

impl Dimension {
    /// Converts to pixels. `rem` and `em` scale by `base_font_size`; units
    /// with no pixel equivalent yield `None`.
    pub fn to_px(&self, base_font_size: f64) -> Option<f64> {
        match self.unit.as_str() {
            "px" | "" => Some(self.value),
            "rem" | "em" => Some(self.value * base_font_size),
            "pt" => Some(self.value * 4.0 / 3.0),
            "pc" => Some(self.value * 16.0),
            "in" => Some(self.value * 96.0),
            "cm" => Some(self.value * 96.0 / 2.54),
            "mm" => Some(self.value * 96.0 / 25.4),
            _ => None,
        }
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "0" {
            return Ok(Dimension {
                value: 0.0,
                unit: String::new(),
            });
        }
        let split = s
            .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+')))
            .ok_or_else(|| s.to_string())?;
        let (number, unit) = s.split_at(split);
        if !DIMENSION_UNITS.contains(&unit) {
            return Err(s.to_string());
        }
        let value = number.parse::<f64>().map_err(|_| s.to_string())?;
        Ok(Dimension {
            value,
            unit: unit.to_string(),
        })
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit)
    }
}
