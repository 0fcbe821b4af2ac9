use crate::models::PropertyType;

/// Points awarded when the listing type equals the requested type
pub const EXACT_TYPE_POINTS: f64 = 20.0;

/// Points awarded when no property type was requested
pub const NEUTRAL_TYPE_POINTS: f64 = 15.0;

/// Points for a pair missing from the table
pub const UNDEFINED_PAIR_POINTS: f64 = 2.0;

/// Similarity between the requested type (row) and the listed type (column).
///
/// Row/column order follows `PropertyType::ALL`:
/// Single Room, Shared Room, Studio, Apartment, House.
const TYPE_COMPATIBILITY: [[u8; 5]; 5] = [
    // Single Room
    [20, 8, 6, 4, 3],
    // Shared Room
    [8, 20, 4, 3, 3],
    // Studio
    [6, 3, 20, 8, 4],
    // Apartment
    [4, 3, 8, 20, 7],
    // House
    [3, 2, 4, 7, 20],
];

/// Look up the type compatibility points for a requested/listed pair.
///
/// A listing without a recognised type has no table entry and earns
/// `UNDEFINED_PAIR_POINTS`.
#[inline]
pub fn type_compatibility(requested: PropertyType, listed: Option<PropertyType>) -> f64 {
    match listed {
        Some(listed) => TYPE_COMPATIBILITY[requested.index()][listed.index()] as f64,
        None => UNDEFINED_PAIR_POINTS,
    }
}
