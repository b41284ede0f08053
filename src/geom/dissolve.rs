use ahash::AHashSet;
use geo::{LineString, MultiLineString};

/// Bit patterns of a part's vertices; `-0.0` is folded into `0.0`.
fn part_key(line: &LineString<f64>) -> Vec<(u64, u64)> {
    let bits = |v: f64| if v == 0.0 { 0u64 } else { v.to_bits() };
    line.coords().map(|c| (bits(c.x), bits(c.y))).collect()
}

/// Merge the parts of several linear geometries into one MultiLineString.
/// Empty and exactly repeated parts are dropped; order of first appearance is kept.
pub(crate) fn dissolve_lines<'a>(geometries: impl IntoIterator<Item = &'a MultiLineString<f64>>) -> MultiLineString<f64> {
    let mut seen = AHashSet::new();
    let parts = geometries.into_iter()
        .flat_map(|lines| lines.iter())
        .filter(|line| !line.0.is_empty() && seen.insert(part_key(line)))
        .cloned()
        .collect();
    MultiLineString::new(parts)
}
