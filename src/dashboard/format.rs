use crate::common::round_to;

const SCALES: [(f64, &str); 3] = [(1e9, "B"), (1e6, "M"), (1e3, "K")];

/// Scale `value` to billions, millions or thousands and round to one place.
fn compact(value: f64) -> (f64, &'static str) {
    SCALES.iter()
        .find(|(scale, _)| value >= *scale)
        .map(|&(scale, suffix)| (round_to(value / scale, 1), suffix))
        .unwrap_or((round_to(value, 1), ""))
}

fn nonzero(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}

/// `$1.5M`, `$2.0K`, `$500.0`; zero and missing values print as `$0`.
pub(crate) fn currency(value: Option<f64>) -> String {
    match nonzero(value) {
        Some(v) => {
            let (scaled, suffix) = compact(v);
            format!("${scaled:.1}{suffix}")
        }
        None => "$0".into(),
    }
}

/// `1.5K`, `2K`, `12.3`; a whole scaled value drops its fraction.
pub(crate) fn compact_number(value: Option<f64>) -> String {
    match nonzero(value) {
        Some(v) => {
            let (scaled, suffix) = compact(v);
            if scaled.fract() == 0.0 {
                format!("{scaled:.0}{suffix}")
            } else {
                format!("{scaled:.1}{suffix}")
            }
        }
        None => "0".into(),
    }
}

/// One decimal for any value, zero included; only a missing value prints as `0%`.
pub(crate) fn percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.1}%"),
        None => "0%".into(),
    }
}

pub(crate) fn miles(value: Option<f64>) -> String {
    match nonzero(value) {
        Some(v) => format!("{v:.1} mi"),
        None => "0.0 mi".into(),
    }
}

/// Whole vehicles per day; only positive volumes are shown.
pub(crate) fn volume(value: Option<f64>) -> String {
    match value.filter(|v| *v > 0.0) {
        Some(v) => thousands(v.trunc() as i64),
        None => "0".into(),
    }
}

pub(crate) fn count(value: Option<f64>) -> String {
    value.map(|v| thousands(v.trunc() as i64)).unwrap_or_else(|| "0".into())
}

/// Integer with comma thousands separators.
pub(crate) fn thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 { out.push('-') }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 { out.push(',') }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_is_compact() {
        assert_eq!(currency(Some(1_500.0)), "$1.5K");
        assert_eq!(currency(Some(2_000_000.0)), "$2.0M");
        assert_eq!(currency(Some(3_300_000_000.0)), "$3.3B");
        assert_eq!(currency(Some(500.0)), "$500.0");
        assert_eq!(currency(Some(0.0)), "$0");
        assert_eq!(currency(None), "$0");
    }

    #[test]
    fn compact_numbers_trim_whole_values() {
        assert_eq!(compact_number(Some(2_000.0)), "2K");
        assert_eq!(compact_number(Some(1_530.0)), "1.5K");
        assert_eq!(compact_number(Some(12.3)), "12.3");
        assert_eq!(compact_number(None), "0");
    }

    #[test]
    fn units_and_counts() {
        assert_eq!(percent(Some(12.345)), "12.3%");
        assert_eq!(percent(Some(0.0)), "0.0%");
        assert_eq!(percent(None), "0%");
        assert_eq!(miles(Some(10.0)), "10.0 mi");
        assert_eq!(miles(Some(0.0)), "0.0 mi");
        assert_eq!(volume(Some(12_345.9)), "12,345");
        assert_eq!(volume(Some(-1.0)), "0");
        assert_eq!(count(Some(1_234_567.0)), "1,234,567");
        assert_eq!(count(Some(0.0)), "0");
    }

    #[test]
    fn thousands_groups_digits() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(-1234567), "-1,234,567");
    }
}
