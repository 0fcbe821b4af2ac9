use crate::models::{Listing, SearchCriteria};

/// Check if a listing satisfies the hard search constraints
///
/// This is the plain filtering path used when no soft criteria are set.
/// Each predicate with an unset criterion passes.
#[inline]
pub fn matches_criteria(listing: &Listing, criteria: &SearchCriteria) -> bool {
    matches_location(listing, criteria)
        && matches_property_type(listing, criteria)
        && matches_price(listing, criteria)
        && matches_tenant_preferences(listing, criteria)
}

/// Case-insensitive substring match on the listing location
#[inline]
pub fn matches_location(listing: &Listing, criteria: &SearchCriteria) -> bool {
    let Some(wanted) = criteria.location_query() else {
        return true;
    };

    listing
        .location
        .as_deref()
        .map(|loc| loc.to_lowercase().contains(&wanted.to_lowercase()))
        .unwrap_or(false)
}

#[inline]
pub fn matches_property_type(listing: &Listing, criteria: &SearchCriteria) -> bool {
    match criteria.property_type {
        Some(wanted) => listing.property_type == Some(wanted),
        None => true,
    }
}

/// Inclusive price bounds
#[inline]
pub fn matches_price(listing: &Listing, criteria: &SearchCriteria) -> bool {
    if let Some(min) = criteria.min_price {
        if listing.price < min {
            return false;
        }
    }
    if let Some(max) = criteria.max_price {
        if listing.price > max {
            return false;
        }
    }
    true
}

/// Gender, religion, smoking and furnishing must equal the criterion or be
/// absent on the listing
#[inline]
pub fn matches_tenant_preferences(listing: &Listing, criteria: &SearchCriteria) -> bool {
    exact_or_absent(listing.preferred_gender, criteria.gender_preference)
        && exact_or_absent(listing.religious_preference, criteria.religious_preference)
        && exact_or_absent(listing.smoking_preference, criteria.smoking_preference)
        && exact_or_absent(listing.furnishing, criteria.furnishing)
}

#[inline]
fn exact_or_absent<T: PartialEq>(listed: Option<T>, wanted: Option<T>) -> bool {
    match (listed, wanted) {
        (Some(listed), Some(wanted)) => listed == wanted,
        _ => true,
    }
}
