//! Mapping of vendor urgency vocabularies onto [`TriageLevel`].

use super::diagnosis::{Triage, TriageLevel};

const HIGH_TAGS: [&str; 6] = ["emergent", "emergency", "immediate", "ed", "er", "red"];
const MODERATE_TAGS: [&str; 4] = ["urgent", "yellow", "soon", "sooner"];

/// Vendor triage hint as received on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VendorTriage<'a> {
    pub category: Option<&'a str>,
    pub urgency: Option<&'a str>,
}

impl<'a> VendorTriage<'a> {
    /// Hint carrying a single tag, used by vendors with one urgency field.
    pub fn tag(tag: Option<&'a str>) -> Self {
        Self {
            category: tag,
            urgency: None,
        }
    }
}

/// Map a vendor triage hint to a canonical [`Triage`].
///
/// The tag is the first non-empty of `category` and `urgency`, lower-cased
/// and trimmed. Unknown or absent tags map to [`TriageLevel::Low`].
///
/// # Examples
/// ```
/// use ddx_gateway::domain::{map_triage, TriageLevel, VendorTriage};
///
/// let triage = map_triage(VendorTriage { category: Some(" Emergent "), urgency: None });
/// assert_eq!(triage.level, TriageLevel::High);
/// assert_eq!(triage.why, "vendor: emergent");
///
/// let missing = map_triage(VendorTriage::default());
/// assert_eq!(missing.level, TriageLevel::Low);
/// assert_eq!(missing.why, "vendor triage not provided");
/// ```
#[must_use]
pub fn map_triage(hint: VendorTriage<'_>) -> Triage {
    let tag = [hint.category, hint.urgency]
        .into_iter()
        .flatten()
        .map(|raw| raw.trim().to_lowercase())
        .find(|tag| !tag.is_empty());

    match tag {
        Some(tag) => Triage::new(level_for(&tag), format!("vendor: {tag}")),
        None => Triage::new(TriageLevel::Low, "vendor triage not provided"),
    }
}

fn level_for(tag: &str) -> TriageLevel {
    if HIGH_TAGS.contains(&tag) {
        TriageLevel::High
    } else if MODERATE_TAGS.contains(&tag) {
        TriageLevel::Moderate
    } else {
        TriageLevel::Low
    }
}
