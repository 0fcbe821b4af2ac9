use crate::core::{filters::matches_criteria, scoring::calculate_compatibility};
use crate::models::{BudgetDefaults, Listing, ScoredListing, SearchCriteria, SearchMode};

/// Result of a search over a listing set
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub mode: SearchMode,
    pub listings: Vec<ScoredListing>,
    pub total_candidates: usize,
}

/// Search orchestrator
///
/// # Paths
/// - Scored: any of type/gender/religion/smoking is set. Every listing is
///   scored and the full set is ranked by descending score.
/// - Filtered: none of them is set. Listings are kept or dropped by the
///   filter predicate and keep their input order.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    budget: BudgetDefaults,
}

impl Matcher {
    pub fn new(budget: BudgetDefaults) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> &BudgetDefaults {
        &self.budget
    }

    /// Run a search over `listings` with the given criteria
    pub fn search(&self, criteria: &SearchCriteria, listings: &[Listing]) -> SearchOutcome {
        if criteria.has_soft_criteria() {
            self.rank(criteria, listings)
        } else {
            self.filter(criteria, listings)
        }
    }

    /// Score every listing and sort by descending score.
    ///
    /// Ties keep their relative input order.
    pub fn rank(&self, criteria: &SearchCriteria, listings: &[Listing]) -> SearchOutcome {
        let mut scored: Vec<ScoredListing> = listings
            .iter()
            .map(|listing| ScoredListing {
                match_result: Some(calculate_compatibility(listing, criteria, &self.budget)),
                listing: listing.clone(),
            })
            .collect();

        // `sort_by` is stable
        scored.sort_by(|a, b| score_of(b).cmp(&score_of(a)));

        tracing::debug!("Ranked {} listings by compatibility", scored.len());

        SearchOutcome {
            mode: SearchMode::Scored,
            listings: scored,
            total_candidates: listings.len(),
        }
    }

    /// Keep listings satisfying every set constraint, in input order
    pub fn filter(&self, criteria: &SearchCriteria, listings: &[Listing]) -> SearchOutcome {
        let filtered: Vec<ScoredListing> = listings
            .iter()
            .filter(|listing| matches_criteria(listing, criteria))
            .map(|listing| ScoredListing {
                listing: listing.clone(),
                match_result: None,
            })
            .collect();

        tracing::debug!(
            "Filtered {} of {} listings",
            filtered.len(),
            listings.len()
        );

        SearchOutcome {
            mode: SearchMode::Filtered,
            listings: filtered,
            total_candidates: listings.len(),
        }
    }
}

fn score_of(listing: &ScoredListing) -> u8 {
    listing.match_result.as_ref().map(|m| m.score).unwrap_or(0)
}
