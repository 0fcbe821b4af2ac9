use crate::services::store::{KeyValueStore, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Key builder for user-scoped preferences
pub struct PreferenceKey;

impl PreferenceKey {
    /// Global favorites key written before favorites were scoped per user
    pub const LEGACY_FAVORITES: &'static str = "dreamHomes";

    pub fn favorites(user_id: &str) -> String {
        format!("dreamHomes_{}", user_id)
    }

    pub fn filters_collapsed(user_id: &str) -> String {
        format!("filtersCollapsed_{}", user_id)
    }

    pub fn ai_match_collapsed(user_id: &str) -> String {
        format!("aiMatchCollapsed_{}", user_id)
    }
}

/// Collapse state of the filter panel and the smart-matching panel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiFlags {
    pub filters_collapsed: bool,
    pub ai_match_collapsed: bool,
}

/// User-scoped favorites ("Dream Homes") and UI flags over a key-value store
///
/// Favorites are stored as one JSON list per user, so every read-modify-write
/// runs under that user's lock.
#[derive(Clone)]
pub struct PreferenceStore {
    store: Arc<dyn KeyValueStore>,
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl PreferenceStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Favorited listing ids for a user, in the order they were added.
    ///
    /// On the first read for a user without a scoped entry, the legacy
    /// global entry is moved to the user's key and deleted.
    pub async fn favorites(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        let user_id = signed_in(user_id)?;
        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;
        self.load_favorites(user_id).await
    }

    pub async fn is_favorite(&self, user_id: &str, listing_id: &str) -> Result<bool, StoreError> {
        Ok(self.favorites(user_id).await?.iter().any(|id| id == listing_id))
    }

    /// Add a listing to the user's favorites. Adding twice is a no-op.
    pub async fn add_favorite(&self, user_id: &str, listing_id: &str) -> Result<Vec<String>, StoreError> {
        let user_id = signed_in(user_id)?;
        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;

        let mut favorites = self.load_favorites(user_id).await?;
        if !favorites.iter().any(|id| id == listing_id) {
            favorites.push(listing_id.to_string());
            self.write_favorites(&PreferenceKey::favorites(user_id), &favorites)
                .await?;
        }
        Ok(favorites)
    }

    pub async fn remove_favorite(&self, user_id: &str, listing_id: &str) -> Result<Vec<String>, StoreError> {
        let user_id = signed_in(user_id)?;
        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;

        let mut favorites = self.load_favorites(user_id).await?;
        let before = favorites.len();
        favorites.retain(|id| id != listing_id);
        if favorites.len() != before {
            self.write_favorites(&PreferenceKey::favorites(user_id), &favorites)
                .await?;
        }
        Ok(favorites)
    }

    /// Flip a listing's favorite state, returning whether it is now favorited
    pub async fn toggle_favorite(&self, user_id: &str, listing_id: &str) -> Result<bool, StoreError> {
        let user_id = signed_in(user_id)?;
        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;

        let mut favorites = self.load_favorites(user_id).await?;
        let now_favorite = if favorites.iter().any(|id| id == listing_id) {
            favorites.retain(|id| id != listing_id);
            false
        } else {
            favorites.push(listing_id.to_string());
            true
        };
        self.write_favorites(&PreferenceKey::favorites(user_id), &favorites)
            .await?;
        Ok(now_favorite)
    }

    pub async fn ui_flags(&self, user_id: &str) -> Result<UiFlags, StoreError> {
        let user_id = signed_in(user_id)?;
        Ok(UiFlags {
            filters_collapsed: self
                .read_flag(&PreferenceKey::filters_collapsed(user_id))
                .await?,
            ai_match_collapsed: self
                .read_flag(&PreferenceKey::ai_match_collapsed(user_id))
                .await?,
        })
    }

    /// Update whichever flags are given and return the resulting state
    pub async fn update_ui_flags(
        &self,
        user_id: &str,
        filters_collapsed: Option<bool>,
        ai_match_collapsed: Option<bool>,
    ) -> Result<UiFlags, StoreError> {
        let user_id = signed_in(user_id)?;
        if let Some(value) = filters_collapsed {
            self.store
                .set(&PreferenceKey::filters_collapsed(user_id), serde_json::to_string(&value)?)
                .await?;
        }
        if let Some(value) = ai_match_collapsed {
            self.store
                .set(&PreferenceKey::ai_match_collapsed(user_id), serde_json::to_string(&value)?)
                .await?;
        }
        self.ui_flags(user_id).await
    }

    async fn read_flag(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self
            .store
            .get(key)
            .await?
            .and_then(|raw| serde_json::from_str::<bool>(&raw).ok())
            .unwrap_or(false))
    }

    async fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .await
            .entry(user_id.to_string())
            .or_default()
            .clone()
    }

    /// Caller must hold the user's lock
    async fn load_favorites(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        let key = PreferenceKey::favorites(user_id);

        if let Some(raw) = self.store.get(&key).await? {
            return Ok(parse_favorites(&key, &raw));
        }

        let Some(legacy) = self.store.get(PreferenceKey::LEGACY_FAVORITES).await? else {
            return Ok(Vec::new());
        };

        let favorites = parse_favorites(PreferenceKey::LEGACY_FAVORITES, &legacy);
        self.write_favorites(&key, &favorites).await?;
        self.store.remove(PreferenceKey::LEGACY_FAVORITES).await?;

        tracing::info!(
            "Migrated {} legacy favorites to user {}",
            favorites.len(),
            user_id
        );

        Ok(favorites)
    }

    async fn write_favorites(&self, key: &str, favorites: &[String]) -> Result<(), StoreError> {
        self.store.set(key, serde_json::to_string(favorites)?).await
    }
}

fn signed_in(user_id: &str) -> Result<&str, StoreError> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        Err(StoreError::NotSignedIn)
    } else {
        Ok(user_id)
    }
}

/// Unreadable entries are treated as an empty favorites list
fn parse_favorites(key: &str, raw: &str) -> Vec<String> {
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(mut ids) => {
            let mut seen = std::collections::HashSet::new();
            ids.retain(|id| seen.insert(id.clone()));
            ids
        }
        Err(e) => {
            tracing::warn!("Ignoring unreadable favorites under {}: {}", key, e);
            Vec::new()
        }
    }
}
