use super::MeasuredSegment;
use crate::common::round_to;

/// Length-weighted traffic measures and summed safety counts for a corridor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrafficMetrics {
    /// AADT, 0 decimals.
    pub traffic_volume: Option<f64>,
    /// Truck AADT, 0 decimals.
    pub truck_volume: Option<f64>,
    /// Tons, 1 decimal.
    pub truck_tonnage: Option<f64>,
    /// Truck share of AADT in percent, 1 decimal.
    pub truck_percentage: Option<f64>,
    pub crash_count: i64,
    pub fatal_crash_count: i64,
}

impl TrafficMetrics {
    /// Weighted means use the rounded segment lengths as weights. A missing
    /// measure adds nothing to the numerator but its length still counts in
    /// the denominator; a zero total length leaves every mean undefined.
    pub(crate) fn aggregate<'a>(segments: impl IntoIterator<Item = &'a MeasuredSegment>) -> Self {
        let mut total_length = 0.0;
        let (mut aadt, mut trucks, mut tons) = (0.0, 0.0, 0.0);
        let (mut crash_count, mut fatal_crash_count) = (0, 0);

        for measured in segments {
            let segment = &measured.segment;
            let length = measured.length_miles;
            total_length += length;
            aadt += segment.traffic_volume.map_or(0.0, |v| v * length);
            trucks += segment.truck_volume.map_or(0.0, |v| v * length);
            tons += segment.truck_tonnage.map_or(0.0, |v| v * length);
            crash_count += segment.crash_count.unwrap_or(0);
            fatal_crash_count += segment.fatal_crash_count.unwrap_or(0);
        }

        let mean = |weighted: f64| (total_length > 0.0).then(|| weighted / total_length);

        let traffic_volume = mean(aadt).map(|v| round_to(v, 0));
        let truck_mean = mean(trucks);
        let truck_percentage = match (truck_mean, traffic_volume) {
            (Some(truck), Some(traffic)) if traffic > 0.0 => Some(round_to(truck / traffic * 100.0, 1)),
            _ => None,
        };

        Self {
            traffic_volume,
            truck_volume: truck_mean.map(|v| round_to(v, 0)),
            truck_tonnage: mean(tons).map(|v| round_to(v, 1)),
            truck_percentage,
            crash_count,
            fatal_crash_count,
        }
    }
}
