use crate::core::compatibility::{type_compatibility, EXACT_TYPE_POINTS, NEUTRAL_TYPE_POINTS};
use crate::models::{
    BudgetDefaults, GenderPreference, Listing, MatchResult, ReligiousPreference, ScoreBreakdown,
    SearchCriteria, SmokingPreference,
};

const MATCH_MARKER: &str = "✓";
const MISMATCH_MARKER: &str = "✗";
const MAX_CLAUSES: usize = 2;
const MAX_SCORE: f64 = 100.0;

/// How a single factor reads in the rationale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Good(&'static str),
    Poor(&'static str),
    Neutral,
}

/// Calculate a compatibility score (0-100) and rationale for a listing
///
/// Scoring formula:
/// score = round(min(
///     property_type (max 20) +
///     gender        (max 25) +
///     religion      (max 20) +
///     budget        (max 20) +
///     smoking       (max 10) +
///     location      (max 10),
/// 100))
///
/// Every factor whose criterion is absent contributes a fixed neutral value.
pub fn calculate_compatibility(
    listing: &Listing,
    criteria: &SearchCriteria,
    budget: &BudgetDefaults,
) -> MatchResult {
    let (property_type, type_verdict) = property_type_points(listing, criteria);
    let (gender, gender_verdict) = gender_points(listing.preferred_gender, criteria.gender_preference);
    let (religion, religion_verdict) =
        religion_points(listing.religious_preference, criteria.religious_preference);
    let (budget_pts, budget_verdict) = budget_points(listing.price, criteria, budget);
    let (smoking, smoking_verdict) =
        smoking_points(listing.smoking_preference, criteria.smoking_preference);
    let (location, location_verdict) =
        location_points(listing.location.as_deref(), criteria.location_query());

    let breakdown = ScoreBreakdown {
        property_type,
        gender,
        religion,
        budget: budget_pts,
        smoking,
        location,
    };

    let score = breakdown.total().clamp(0.0, MAX_SCORE).round() as u8;

    let rationale = build_rationale(&[
        type_verdict,
        gender_verdict,
        religion_verdict,
        budget_verdict,
        smoking_verdict,
        location_verdict,
    ]);

    MatchResult {
        score,
        rationale,
        breakdown,
    }
}

/// Score a listing with the default budget bounds (0 to 10000)
pub fn score(listing: &Listing, criteria: &SearchCriteria) -> MatchResult {
    calculate_compatibility(listing, criteria, &BudgetDefaults::default())
}

#[inline]
fn property_type_points(listing: &Listing, criteria: &SearchCriteria) -> (f64, Verdict) {
    let Some(requested) = criteria.property_type else {
        return (NEUTRAL_TYPE_POINTS, Verdict::Neutral);
    };

    if listing.property_type == Some(requested) {
        return (EXACT_TYPE_POINTS, Verdict::Good("Exact property type"));
    }

    let points = type_compatibility(requested, listing.property_type);
    if points >= 6.0 {
        (points, Verdict::Good("Similar property type"))
    } else {
        (points, Verdict::Poor("Different property type"))
    }
}

#[inline]
fn gender_points(
    listed: Option<GenderPreference>,
    wanted: Option<GenderPreference>,
) -> (f64, Verdict) {
    let Some(wanted) = wanted else {
        return (15.0, Verdict::Neutral);
    };

    match listed {
        Some(listed) if listed == wanted => (25.0, Verdict::Good("Gender preference match")),
        None | Some(GenderPreference::Any) => (15.0, Verdict::Good("Open to all genders")),
        Some(_) => (5.0, Verdict::Poor("Gender restriction")),
    }
}

#[inline]
fn religion_points(
    listed: Option<ReligiousPreference>,
    wanted: Option<ReligiousPreference>,
) -> (f64, Verdict) {
    let Some(wanted) = wanted else {
        return (15.0, Verdict::Neutral);
    };

    match listed {
        Some(listed) if listed == wanted => (20.0, Verdict::Good("Religious preference match")),
        None | Some(ReligiousPreference::Any) => (15.0, Verdict::Good("Open to all religions")),
        Some(_) => (3.0, Verdict::Poor("Religious restriction")),
    }
}

/// Budget points (3-20)
///
/// Overage above the maximum loses points linearly with the overage ratio
/// and never drops below 3. A maximum of zero earns the floor outright.
#[inline]
fn budget_points(price: f64, criteria: &SearchCriteria, defaults: &BudgetDefaults) -> (f64, Verdict) {
    let min_price = criteria.min_price.unwrap_or(defaults.min_price);
    let max_price = criteria.max_price.unwrap_or(defaults.max_price);
    let constrained = criteria.min_price.is_some() || criteria.max_price.is_some();

    let (points, verdict) = if price < min_price {
        (15.0, Verdict::Good("Below budget"))
    } else if price <= max_price {
        (20.0, Verdict::Good("Within budget"))
    } else if max_price <= 0.0 {
        (3.0, Verdict::Poor("Over budget"))
    } else {
        let overage_ratio = (price - max_price) / max_price;
        ((20.0 - 20.0 * overage_ratio).max(3.0), Verdict::Poor("Over budget"))
    };

    if constrained {
        (points, verdict)
    } else {
        (points, Verdict::Neutral)
    }
}

#[inline]
fn smoking_points(
    listed: Option<SmokingPreference>,
    wanted: Option<SmokingPreference>,
) -> (f64, Verdict) {
    let Some(wanted) = wanted else {
        return (8.0, Verdict::Neutral);
    };

    match listed {
        Some(listed) if listed == wanted => (10.0, Verdict::Good("Smoking policy match")),
        None | Some(SmokingPreference::Any) => (8.0, Verdict::Good("Flexible smoking policy")),
        Some(_) => (3.0, Verdict::Poor("Smoking policy conflict")),
    }
}

#[inline]
fn location_points(listed: Option<&str>, wanted: Option<&str>) -> (f64, Verdict) {
    match (listed, wanted) {
        (Some(listed), Some(wanted)) => {
            if listed.to_lowercase().contains(&wanted.to_lowercase()) {
                (10.0, Verdict::Good("Preferred location"))
            } else {
                (5.0, Verdict::Poor("Different area"))
            }
        }
        _ => (8.0, Verdict::Neutral),
    }
}

fn build_rationale(verdicts: &[Verdict]) -> String {
    let matches: Vec<&str> = verdicts
        .iter()
        .filter_map(|v| match v {
            Verdict::Good(clause) => Some(*clause),
            _ => None,
        })
        .take(MAX_CLAUSES)
        .collect();
    let mismatches: Vec<&str> = verdicts
        .iter()
        .filter_map(|v| match v {
            Verdict::Poor(clause) => Some(*clause),
            _ => None,
        })
        .take(MAX_CLAUSES)
        .collect();

    let mut parts = Vec::with_capacity(2);
    if !matches.is_empty() {
        parts.push(format!("{} {}", MATCH_MARKER, matches.join(", ")));
    }
    if !mismatches.is_empty() {
        parts.push(format!("{} {}", MISMATCH_MARKER, mismatches.join(", ")));
    }
    parts.join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PropertyType;

    fn create_test_listing(price: f64) -> Listing {
        Listing {
            id: "listing_1".to_string(),
            title: "Studio near campus".to_string(),
            description: String::new(),
            price,
            location: Some("Seksyen 7, Shah Alam".to_string()),
            property_type: Some(PropertyType::Studio),
            furnishing: None,
            parking: None,
            preferred_gender: Some(GenderPreference::Any),
            religious_preference: None,
            smoking_preference: Some(SmokingPreference::NonSmokerOnly),
            owner_id: None,
            images: vec![],
            created_at: None,
        }
    }

    #[test]
    fn test_budget_points() {
        let criteria = SearchCriteria {
            min_price: Some(500.0),
            max_price: Some(1000.0),
            ..Default::default()
        };
        let defaults = BudgetDefaults::default();

        assert_eq!(budget_points(800.0, &criteria, &defaults).0, 20.0);
        assert_eq!(budget_points(1000.0, &criteria, &defaults).0, 20.0);
        assert_eq!(budget_points(300.0, &criteria, &defaults).0, 15.0);
        assert_eq!(budget_points(1500.0, &criteria, &defaults).0, 10.0);
        assert_eq!(budget_points(5000.0, &criteria, &defaults).0, 3.0);
    }

    #[test]
    fn test_budget_zero_max_price() {
        let criteria = SearchCriteria {
            max_price: Some(0.0),
            ..Default::default()
        };
        let (points, verdict) = budget_points(250.0, &criteria, &BudgetDefaults::default());
        assert_eq!(points, 3.0);
        assert_eq!(verdict, Verdict::Poor("Over budget"));
    }

    #[test]
    fn test_gender_points() {
        use GenderPreference::*;
        assert_eq!(gender_points(Some(FemaleOnly), Some(FemaleOnly)).0, 25.0);
        assert_eq!(gender_points(Some(Any), Some(FemaleOnly)).0, 15.0);
        assert_eq!(gender_points(None, Some(FemaleOnly)).0, 15.0);
        assert_eq!(gender_points(Some(MaleOnly), Some(FemaleOnly)).0, 5.0);
        assert_eq!(gender_points(Some(MaleOnly), None).0, 15.0);
    }

    #[test]
    fn test_religion_and_smoking_points() {
        use ReligiousPreference::*;
        assert_eq!(religion_points(Some(MuslimOnly), Some(MuslimOnly)).0, 20.0);
        assert_eq!(religion_points(Some(NonMuslimOnly), Some(MuslimOnly)).0, 3.0);
        assert_eq!(religion_points(None, None).0, 15.0);

        assert_eq!(smoking_points(Some(SmokingPreference::SmokerFriendly), Some(SmokingPreference::NonSmokerOnly)).0, 3.0);
        assert_eq!(smoking_points(Some(SmokingPreference::Any), Some(SmokingPreference::NonSmokerOnly)).0, 8.0);
        assert_eq!(smoking_points(None, None).0, 8.0);
    }

    #[test]
    fn test_location_points() {
        assert_eq!(location_points(Some("Seksyen 7, Shah Alam"), Some("shah alam")).0, 10.0);
        assert_eq!(location_points(Some("Bangi"), Some("Shah Alam")).0, 5.0);
        assert_eq!(location_points(None, Some("Shah Alam")).0, 8.0);
        assert_eq!(location_points(Some("Bangi"), None).0, 8.0);
    }

    #[test]
    fn test_rationale_format() {
        let criteria = SearchCriteria {
            property_type: Some(PropertyType::Studio),
            gender_preference: Some(GenderPreference::FemaleOnly),
            max_price: Some(500.0),
            smoking_preference: Some(SmokingPreference::SmokerFriendly),
            ..Default::default()
        };
        let result = score(&create_test_listing(800.0), &criteria);

        assert_eq!(
            result.rationale,
            "✓ Exact property type, Open to all genders | ✗ Over budget, Smoking policy conflict"
        );
    }

    #[test]
    fn test_rationale_without_criteria_is_empty() {
        let result = score(&create_test_listing(800.0), &SearchCriteria::default());
        assert_eq!(result.rationale, "");
        assert_eq!(result.score, 81);
    }

    #[test]
    fn test_rationale_only_mismatches() {
        let criteria = SearchCriteria {
            property_type: Some(PropertyType::House),
            ..Default::default()
        };
        let mut listing = create_test_listing(800.0);
        listing.property_type = Some(PropertyType::SharedRoom);

        let result = score(&listing, &criteria);
        assert_eq!(result.rationale, "✗ Different property type");
        assert_eq!(result.breakdown.property_type, 2.0);
    }
}
