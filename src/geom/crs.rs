use proj4rs::proj::Proj as Proj4;

use crate::error::ProfileError;

/// Metres per US survey foot.
pub const US_SURVEY_FOOT: f64 = 1200.0 / 3937.0;

const METRES_PER_MILE: f64 = 1609.344;

/// Unit of a coordinate system's axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LinearUnit {
    Degree,
    Metre,
    /// International foot.
    Foot,
    UsSurveyFoot,
    /// Any other linear unit, as metres per unit.
    Scaled(f64),
}

impl LinearUnit {
    /// Axis unit of a parsed projection.
    fn of(proj: &Proj4) -> Self {
        if proj.is_latlong() { return LinearUnit::Degree }
        match proj.units() {
            "m" => LinearUnit::Metre,
            "ft" => LinearUnit::Foot,
            "us-ft" => LinearUnit::UsSurveyFoot,
            _ => LinearUnit::Scaled(proj.to_meter()),
        }
    }

    /// Metres per axis unit; `None` for angular units.
    pub fn to_metre(&self) -> Option<f64> {
        match self {
            LinearUnit::Degree => None,
            LinearUnit::Metre => Some(1.0),
            LinearUnit::Foot => Some(0.3048),
            LinearUnit::UsSurveyFoot => Some(US_SURVEY_FOOT),
            LinearUnit::Scaled(m) => Some(*m),
        }
    }

    /// Miles per axis unit: 5280 ft for foot-based systems, 1609.344 m otherwise.
    pub fn miles_per_unit(&self) -> Option<f64> {
        match self {
            LinearUnit::Foot | LinearUnit::UsSurveyFoot => Some(1.0 / 5280.0),
            other => other.to_metre().map(|m| m / METRES_PER_MILE),
        }
    }
}

/// Display names for the systems this pipeline usually sees.
const KNOWN_NAMES: &[(u32, &str)] = &[
    (4326, "WGS 84"),
    (4269, "NAD83"),
    (3857, "WGS 84 / Pseudo-Mercator"),
    (2276, "NAD83 / Texas North Central (ftUS)"),
    (2277, "NAD83 / Texas Central (ftUS)"),
    (3081, "NAD83 / Texas State Mapping System"),
    (26914, "NAD83 / UTM zone 14N"),
    (32614, "WGS 84 / UTM zone 14N"),
];

/// An EPSG coordinate reference system with a PROJ.4 definition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crs {
    pub epsg: u32,
    pub unit: LinearUnit,
    /// PROJ.4 definition; axes are in `unit`.
    pub(crate) proj4: &'static str,
}

impl Crs {
    /// Look up an EPSG code. Codes without a definition, or whose projection
    /// cannot be built, are unsupported.
    pub fn from_epsg(epsg: u32) -> Result<Self, ProfileError> {
        let def = u16::try_from(epsg).ok()
            .and_then(crs_definitions::from_code)
            .ok_or(ProfileError::UnsupportedCrs(epsg))?;
        let proj = Proj4::from_proj_string(def.proj4)
            .map_err(|_| ProfileError::UnsupportedCrs(epsg))?;

        Ok(Self { epsg, unit: LinearUnit::of(&proj), proj4: def.proj4 })
    }

    /// Human-readable name; `EPSG:<code>` when none is known.
    pub fn name(&self) -> String {
        KNOWN_NAMES.iter()
            .find(|(code, _)| *code == self.epsg)
            .map_or_else(|| format!("EPSG:{}", self.epsg), |(_, name)| name.to_string())
    }

    #[inline] pub fn is_geographic(&self) -> bool { self.unit == LinearUnit::Degree }

    #[inline] pub fn is_projected(&self) -> bool { !self.is_geographic() }
}

/// Identify the EPSG code of a WKT definition (e.g. a shapefile `.prj`).
/// An explicit authority code wins; otherwise well-known ESRI names are matched.
pub(crate) fn epsg_from_wkt(wkt: &str) -> Option<u32> {
    /// Digits following the last occurrence of `marker`, skipping quotes.
    fn code_after(wkt: &str, marker: &str) -> Option<u32> {
        let start = wkt.rfind(marker)? + marker.len();
        let digits = wkt[start..].trim_start_matches(|c: char| c == '"' || c == ' ')
            .chars()
            .take_while(char::is_ascii_digit)
            .collect::<String>();
        digits.parse().ok()
    }

    if let Some(code) = code_after(wkt, "AUTHORITY[\"EPSG\",").or_else(|| code_after(wkt, "ID[\"EPSG\",")) {
        return Some(code);
    }

    let name = wkt.to_ascii_lowercase().replace([' ', '-'], "_");
    let projected = name.contains("projcs[") || name.contains("projcrs[");
    if name.contains("texas_north_central") && (name.contains("feet") || name.contains("ftus") || name.contains("foot_us")) {
        Some(2276)
    } else if name.contains("texas_centric_mapping_system") || name.contains("texas_state_mapping_system") {
        Some(3081)
    } else if name.contains("utm_zone_14n") && name.contains("1983") {
        Some(26914)
    } else if name.contains("web_mercator") || name.contains("pseudo_mercator") {
        Some(3857)
    } else if !projected && name.contains("north_american_1983") {
        Some(4269)
    } else if !projected && (name.contains("wgs_1984") || name.contains("wgs_84")) {
        Some(4326)
    } else {
        None
    }
}
