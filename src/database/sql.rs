//! Raw SQL fragments shared by the handlers that bypass the query builder.

/// Mean earth radius in meters, same constant MySQL uses for `ST_Distance_Sphere`.
pub const EARTH_RADIUS_M: f64 = 6_370_986.0;

/// Haversine great-circle distance in meters between two aliased rows that both
/// carry `latitude`/`longitude` columns in degrees.
///
/// The haversine term is capped at 1: for antipodal points rounding can push it
/// past 1 and Postgres `ASIN` rejects the input.
pub fn sphere_distance(from: &str, to: &str) -> String {
    format!(
        "(2 * {EARTH_RADIUS_M:.1} * ASIN(SQRT(LEAST(1.0, \
         POWER(SIN(RADIANS({to}.latitude - {from}.latitude) / 2), 2) + \
         COS(RADIANS({from}.latitude)) * COS(RADIANS({to}.latitude)) * \
         POWER(SIN(RADIANS({to}.longitude - {from}.longitude) / 2), 2)))))"
    )
}

/// Document searched by the city full-text query.
pub const CITY_DOCUMENT: &str =
    "to_tsvector('simple', c.city_name || ' ' || n.country_name || ' ' || n.alpha3)";

/// Turns free text into a prefix `tsquery` (`sing & rep` -> `sing:* & rep:*`).
/// Returns `None` when nothing searchable is left.
pub fn prefix_tsquery(input: &str) -> Option<String> {
    let terms: Vec<String> = input
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| format!("{}:*", t.to_lowercase()))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" & "))
    }
}

/// `ILIKE` pattern matching `needle` anywhere, with LIKE wildcards escaped.
pub fn contains_pattern(needle: &str) -> String {
    let escaped = needle
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
