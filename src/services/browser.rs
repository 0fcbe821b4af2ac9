use crate::core::Matcher;
use crate::models::{Listing, ScoredListing, SearchCriteria, SearchMode, SessionContext};
use crate::services::analytics::AnalyticsClient;
use crate::services::listings::{ListingSource, ListingsError};
use crate::services::preferences::PreferenceStore;
use crate::services::store::StoreError;
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Stateful listing browser for one session
///
/// Holds the locally loaded listing set and the results of the last
/// search. Results are recomputed on every search and dropped on reset;
/// they are never persisted.
pub struct ListingBrowser {
    source: Arc<dyn ListingSource>,
    analytics: AnalyticsClient,
    preferences: PreferenceStore,
    matcher: Matcher,
    context: SessionContext,
    listings: Vec<Listing>,
    results: Vec<ScoredListing>,
    mode: SearchMode,
    criteria: SearchCriteria,
    notice: Option<String>,
}

impl ListingBrowser {
    pub fn new(
        source: Arc<dyn ListingSource>,
        analytics: AnalyticsClient,
        preferences: PreferenceStore,
        matcher: Matcher,
        context: SessionContext,
    ) -> Self {
        Self {
            source,
            analytics,
            preferences,
            matcher,
            context,
            listings: Vec::new(),
            results: Vec::new(),
            mode: SearchMode::Filtered,
            criteria: SearchCriteria::default(),
            notice: None,
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    pub fn results(&self) -> &[ScoredListing] {
        &self.results
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub fn criteria(&self) -> &SearchCriteria {
        &self.criteria
    }

    /// Last user-visible error message, if any
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Reload listings from the source.
    ///
    /// On failure the local set is emptied and the error message is kept as
    /// the current notice.
    pub async fn refresh(&mut self) -> Result<usize, ListingsError> {
        match self.source.fetch_listings().await {
            Ok(listings) => {
                self.listings = listings;
                self.notice = None;
                self.apply_current_criteria();
                tracing::info!("Loaded {} listings", self.listings.len());
                Ok(self.listings.len())
            }
            Err(e) => {
                tracing::warn!("Failed to load listings, showing none: {}", e);
                self.listings.clear();
                self.results.clear();
                self.notice = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Run a search over the loaded listings
    pub fn search(&mut self, criteria: SearchCriteria) -> &[ScoredListing] {
        self.criteria = criteria;
        self.apply_current_criteria();

        let mut attributes = Map::new();
        attributes.insert("mode".to_string(), json!(self.mode));
        attributes.insert("resultCount".to_string(), json!(self.results.len()));
        attributes.insert("criteria".to_string(), json!(self.criteria));
        self.analytics.track(&self.context, "search", attributes);

        &self.results
    }

    /// Clear every criterion and show all loaded listings unscored
    pub fn reset_filters(&mut self) -> &[ScoredListing] {
        self.criteria = SearchCriteria::default();
        self.apply_current_criteria();
        &self.results
    }

    /// Look up a loaded listing and record the view
    pub fn view_listing(&self, listing_id: &str) -> Option<&Listing> {
        let listing = self.listings.iter().find(|l| l.id == listing_id)?;
        self.analytics.track(
            &self.context,
            "listing_viewed",
            single_attribute("listingId", listing_id),
        );
        Some(listing)
    }

    /// Delete a listing as the signed-in user and drop it from the local set
    pub async fn delete_listing(&mut self, listing_id: &str) -> Result<(), ListingsError> {
        let Some(user_id) = self.context.user_id.clone() else {
            self.notice = Some(ListingsError::Unauthenticated.to_string());
            return Err(ListingsError::Unauthenticated);
        };

        if let Err(e) = self.source.delete_listing(listing_id, &user_id).await {
            self.notice = Some(e.to_string());
            return Err(e);
        }

        self.listings.retain(|l| l.id != listing_id);
        self.results.retain(|l| l.listing.id != listing_id);
        self.analytics.track(
            &self.context,
            "listing_deleted",
            single_attribute("listingId", listing_id),
        );

        Ok(())
    }

    pub async fn favorites(&self) -> Result<Vec<String>, StoreError> {
        let user_id = self.context.user_id.as_deref().unwrap_or_default();
        self.preferences.favorites(user_id).await
    }

    /// Toggle a listing in the user's Dream Homes
    pub async fn toggle_favorite(&self, listing_id: &str) -> Result<bool, StoreError> {
        let user_id = self.context.user_id.as_deref().unwrap_or_default();
        let added = self.preferences.toggle_favorite(user_id, listing_id).await?;

        let event = if added { "favorite_added" } else { "favorite_removed" };
        self.analytics
            .track(&self.context, event, single_attribute("listingId", listing_id));

        Ok(added)
    }

    /// Loaded listings that are in the user's Dream Homes, in load order
    pub async fn favorite_listings(&self) -> Result<Vec<&Listing>, StoreError> {
        let favorites = self.favorites().await?;
        Ok(self
            .listings
            .iter()
            .filter(|l| favorites.iter().any(|id| *id == l.id))
            .collect())
    }

    fn apply_current_criteria(&mut self) {
        let outcome = self.matcher.search(&self.criteria, &self.listings);
        self.mode = outcome.mode;
        self.results = outcome.listings;
    }
}

fn single_attribute(key: &str, value: &str) -> Map<String, Value> {
    let mut attributes = Map::new();
    attributes.insert(key.to_string(), Value::from(value));
    attributes
}
