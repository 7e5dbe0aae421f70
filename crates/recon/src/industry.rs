//! Industry segments and the flow diagram palette.

use serde::Serialize;

/// Unified connects node.
pub const UNIFIED_COLOR: &str = "#94a3b8";
/// Drop-off and "Not Progressed" nodes.
pub const NEUTRAL_COLOR: &str = "#78909C";
pub const NEUTRAL_LINK_COLOR: &str = "rgba(120, 144, 156, 0.4)";
pub const APPROVED_COLOR: &str = "#4CAF50";
pub const REJECTED_COLOR: &str = "#F44336";

const LINK_ALPHA: &str = "0.55";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Industry {
    Construction,
    Manufacturing,
    #[serde(rename = "Oilfield Services")]
    OilfieldServices,
    Staffing,
    #[serde(rename = "Transportation/Logistics")]
    TransportationLogistics,
    #[serde(rename = "Wholesale/Distribution")]
    WholesaleDistribution,
}

impl Industry {
    /// Every category, sorted by label.
    pub const ALL: [Industry; 6] = [
        Industry::Construction,
        Industry::Manufacturing,
        Industry::OilfieldServices,
        Industry::Staffing,
        Industry::TransportationLogistics,
        Industry::WholesaleDistribution,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Construction => "Construction",
            Self::Manufacturing => "Manufacturing",
            Self::OilfieldServices => "Oilfield Services",
            Self::Staffing => "Staffing",
            Self::TransportationLogistics => "Transportation/Logistics",
            Self::WholesaleDistribution => "Wholesale/Distribution",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Construction => "#CE93D8",
            Self::Manufacturing => "#81C784",
            Self::OilfieldServices => "#4DD0E1",
            Self::Staffing => "#FFB74D",
            Self::TransportationLogistics => "#64B5F6",
            Self::WholesaleDistribution => "#EF5350",
        }
    }

    pub fn link_color(&self) -> String {
        link_color(self.color())
    }

    /// Match a cell against the category labels. Surrounding whitespace is
    /// ignored; case is not.
    pub fn from_label(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL.into_iter().find(|i| i.label() == value)
    }

    /// Categories in label order, the order nodes are laid out in.
    pub fn sorted() -> Vec<Industry> {
        let mut all = Self::ALL.to_vec();
        all.sort_by_key(|i| i.label());
        all
    }
}

impl std::fmt::Display for Industry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// `#RRGGBB` -> `rgba(r, g, b, 0.55)`. Anything that isn't a six-digit hex
/// color falls back to the neutral link color.
pub fn link_color(hex: &str) -> String {
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range).and_then(|s| u8::from_str_radix(s, 16).ok())
    };
    match (hex.len(), hex.starts_with('#'), channel(1..3), channel(3..5), channel(5..7)) {
        (7, true, Some(r), Some(g), Some(b)) => format!("rgba({r}, {g}, {b}, {LINK_ALPHA})"),
        _ => NEUTRAL_LINK_COLOR.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_matches_declared_order() {
        assert_eq!(Industry::sorted(), Industry::ALL.to_vec());
    }

    #[test]
    fn from_label_exact_after_trim() {
        assert_eq!(Industry::from_label("Staffing"), Some(Industry::Staffing));
        assert_eq!(
            Industry::from_label("  Oilfield Services "),
            Some(Industry::OilfieldServices)
        );
        assert_eq!(Industry::from_label("staffing"), None);
        assert_eq!(Industry::from_label("Retail"), None);
        assert_eq!(Industry::from_label(""), None);
    }

    #[test]
    fn link_color_from_hex() {
        assert_eq!(link_color("#CE93D8"), "rgba(206, 147, 216, 0.55)");
        assert_eq!(link_color(REJECTED_COLOR), "rgba(244, 67, 54, 0.55)");
        assert_eq!(link_color("teal"), NEUTRAL_LINK_COLOR);
    }

    #[test]
    fn serializes_as_label() {
        let json = serde_json::to_string(&Industry::TransportationLogistics).unwrap();
        assert_eq!(json, "\"Transportation/Logistics\"");
    }
}
