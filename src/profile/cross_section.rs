use std::collections::BTreeMap;

use super::MeasuredSegment;
use crate::common::round_to;

/// Class recorded for segments without a cross-section value.
pub(crate) const UNKNOWN_CLASS: &str = "Unknown";

/// Miles per cross-section class: sum of the rounded segment lengths,
/// rounded to one decimal. Only classes present on the corridor appear.
pub(crate) fn cross_section_miles<'a>(segments: impl IntoIterator<Item = &'a MeasuredSegment>) -> BTreeMap<String, f64> {
    let mut miles = BTreeMap::<String, f64>::new();
    for measured in segments {
        let class = measured.segment.cross_section_class.as_deref().unwrap_or(UNKNOWN_CLASS);
        *miles.entry(class.to_string()).or_default() += measured.length_miles;
    }
    miles.values_mut().for_each(|v| *v = round_to(*v, 1));
    miles
}

/// Output column for a class: `+` becomes `_plus`, a leading `2` or `4` is
/// spelled out, and `_miles` is appended (`4D+` becomes `four_D_plus_miles`).
pub(crate) fn class_column(class: &str) -> String {
    let sanitized = class.replace('+', "_plus");
    let sanitized = if let Some(rest) = sanitized.strip_prefix('2') {
        format!("two_{rest}")
    } else if let Some(rest) = sanitized.strip_prefix('4') {
        format!("four_{rest}")
    } else {
        sanitized
    };
    format!("{sanitized}_miles")
}
