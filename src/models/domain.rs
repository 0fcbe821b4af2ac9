use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Returned when a label does not name a known variant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

fn parse_label<T: Copy>(
    kind: &'static str,
    all: &[T],
    label: fn(&T) -> &'static str,
    raw: &str,
) -> Result<T, UnknownVariant> {
    let raw = raw.trim();
    all.iter()
        .copied()
        .find(|v| label(v).eq_ignore_ascii_case(raw))
        .ok_or_else(|| UnknownVariant {
            kind,
            value: raw.to_string(),
        })
}

/// Deserialize an optional enumerated field, mapping unknown, empty or
/// non-string values to `None`.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s.parse().ok(),
        _ => None,
    })
}

/// Deserialize an optional free-text field, mapping blank strings to `None`.
pub(crate) fn non_blank<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}

/// Deserialize a text field, mapping `null` or non-string values to "".
fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => s,
        _ => String::new(),
    })
}

/// Deserialize a yes/no flag given as a bool or as "Yes"/"No" style text.
fn flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::Bool(b)) => Some(b),
        Some(serde_json::Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" | "available" => Some(true),
            "no" | "false" | "none" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// Deserialize a list of image URLs, keeping only the string entries.
fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Deserialize a timestamp given as RFC 3339 or a bare `YYYY-MM-DD` date.
/// Anything else reads as `None`.
fn timestamp<'de, D>(deserializer: D) -> Result<Option<chrono::DateTime<chrono::Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    let Some(serde_json::Value::String(s)) = raw else {
        return Ok(None);
    };
    let s = s.trim();

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Ok(Some(dt.with_timezone(&chrono::Utc)));
    }
    Ok(chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc()))
}

/// Deserialize a price that may arrive as a number or a numeric string.
fn price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    #[serde(rename = "Single Room")]
    SingleRoom,
    #[serde(rename = "Shared Room")]
    SharedRoom,
    #[serde(rename = "Studio")]
    Studio,
    #[serde(rename = "Apartment")]
    Apartment,
    #[serde(rename = "House")]
    House,
}

impl PropertyType {
    pub const ALL: [PropertyType; 5] = [
        PropertyType::SingleRoom,
        PropertyType::SharedRoom,
        PropertyType::Studio,
        PropertyType::Apartment,
        PropertyType::House,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::SingleRoom => "Single Room",
            PropertyType::SharedRoom => "Shared Room",
            PropertyType::Studio => "Studio",
            PropertyType::Apartment => "Apartment",
            PropertyType::House => "House",
        }
    }

    /// Row/column of this type in the compatibility table
    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl FromStr for PropertyType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_label("property type", &Self::ALL, Self::as_str, s)
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GenderPreference {
    #[serde(rename = "Male Only")]
    MaleOnly,
    #[serde(rename = "Female Only")]
    FemaleOnly,
    #[serde(rename = "Any Gender")]
    Any,
}

impl GenderPreference {
    pub const ALL: [GenderPreference; 3] = [
        GenderPreference::MaleOnly,
        GenderPreference::FemaleOnly,
        GenderPreference::Any,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GenderPreference::MaleOnly => "Male Only",
            GenderPreference::FemaleOnly => "Female Only",
            GenderPreference::Any => "Any Gender",
        }
    }
}

impl FromStr for GenderPreference {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_label("gender preference", &Self::ALL, Self::as_str, s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReligiousPreference {
    #[serde(rename = "Muslim Only")]
    MuslimOnly,
    #[serde(rename = "Non-Muslim Only")]
    NonMuslimOnly,
    #[serde(rename = "Any Religion")]
    Any,
}

impl ReligiousPreference {
    pub const ALL: [ReligiousPreference; 3] = [
        ReligiousPreference::MuslimOnly,
        ReligiousPreference::NonMuslimOnly,
        ReligiousPreference::Any,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReligiousPreference::MuslimOnly => "Muslim Only",
            ReligiousPreference::NonMuslimOnly => "Non-Muslim Only",
            ReligiousPreference::Any => "Any Religion",
        }
    }
}

impl FromStr for ReligiousPreference {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_label("religious preference", &Self::ALL, Self::as_str, s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SmokingPreference {
    #[serde(rename = "Non-Smoker Only")]
    NonSmokerOnly,
    #[serde(rename = "Smoker Friendly")]
    SmokerFriendly,
    #[serde(rename = "Any")]
    Any,
}

impl SmokingPreference {
    pub const ALL: [SmokingPreference; 3] = [
        SmokingPreference::NonSmokerOnly,
        SmokingPreference::SmokerFriendly,
        SmokingPreference::Any,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SmokingPreference::NonSmokerOnly => "Non-Smoker Only",
            SmokingPreference::SmokerFriendly => "Smoker Friendly",
            SmokingPreference::Any => "Any",
        }
    }
}

impl FromStr for SmokingPreference {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_label("smoking preference", &Self::ALL, Self::as_str, s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Furnishing {
    #[serde(rename = "Fully Furnished")]
    FullyFurnished,
    #[serde(rename = "Partially Furnished")]
    PartiallyFurnished,
    #[serde(rename = "Unfurnished")]
    Unfurnished,
}

impl Furnishing {
    pub const ALL: [Furnishing; 3] = [
        Furnishing::FullyFurnished,
        Furnishing::PartiallyFurnished,
        Furnishing::Unfurnished,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Furnishing::FullyFurnished => "Fully Furnished",
            Furnishing::PartiallyFurnished => "Partially Furnished",
            Furnishing::Unfurnished => "Unfurnished",
        }
    }
}

impl FromStr for Furnishing {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_label("furnishing", &Self::ALL, Self::as_str, s)
    }
}

/// A rentable property as returned by the listings API
///
/// Only `id` is required. Every other attribute that is missing or
/// malformed is treated as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "text")]
    pub title: String,
    #[serde(default, deserialize_with = "text")]
    pub description: String,
    #[serde(default, deserialize_with = "price")]
    pub price: f64,
    #[serde(default, deserialize_with = "non_blank")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub property_type: Option<PropertyType>,
    #[serde(default, deserialize_with = "lenient")]
    pub furnishing: Option<Furnishing>,
    #[serde(default, deserialize_with = "flag")]
    pub parking: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub preferred_gender: Option<GenderPreference>,
    #[serde(default, deserialize_with = "lenient")]
    pub religious_preference: Option<ReligiousPreference>,
    #[serde(default, deserialize_with = "lenient")]
    pub smoking_preference: Option<SmokingPreference>,
    #[serde(default, deserialize_with = "non_blank")]
    pub owner_id: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub images: Vec<String>,
    #[serde(default, deserialize_with = "timestamp")]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Listing {
    /// Helper to get parking as a bool, defaulting to false
    pub fn has_parking(&self) -> bool {
        self.parking.unwrap_or(false)
    }
}

/// User-supplied search constraints. Every field is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    #[serde(default, deserialize_with = "lenient")]
    pub property_type: Option<PropertyType>,
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
    #[serde(default, deserialize_with = "non_blank")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub gender_preference: Option<GenderPreference>,
    #[serde(default, deserialize_with = "lenient")]
    pub religious_preference: Option<ReligiousPreference>,
    #[serde(default, deserialize_with = "lenient")]
    pub smoking_preference: Option<SmokingPreference>,
    #[serde(default, deserialize_with = "lenient")]
    pub furnishing: Option<Furnishing>,
}

impl SearchCriteria {
    /// True when any of the soft criteria that trigger compatibility
    /// scoring is set.
    pub fn has_soft_criteria(&self) -> bool {
        self.property_type.is_some()
            || self.gender_preference.is_some()
            || self.religious_preference.is_some()
            || self.smoking_preference.is_some()
    }

    /// Location criterion with surrounding whitespace removed, if non-empty
    pub fn location_query(&self) -> Option<&str> {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Points contributed by each scoring factor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub property_type: f64,
    pub gender: f64,
    pub religion: f64,
    pub budget: f64,
    pub smoking: f64,
    pub location: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.property_type + self.gender + self.religion + self.budget + self.smoking + self.location
    }
}

/// Transient compatibility result attached to a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub score: u8,
    pub rationale: String,
    pub breakdown: ScoreBreakdown,
}

/// A listing together with its compatibility result, if it was scored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredListing {
    #[serde(flatten)]
    pub listing: Listing,
    #[serde(rename = "match", skip_serializing_if = "Option::is_none", default)]
    pub match_result: Option<MatchResult>,
}

/// Budget bounds applied when the criteria leave them unset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetDefaults {
    pub min_price: f64,
    pub max_price: f64,
}

impl Default for BudgetDefaults {
    fn default() -> Self {
        Self {
            min_price: 0.0,
            max_price: 10_000.0,
        }
    }
}

/// Explicit per-session context passed to collaborators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    pub session_id: String,
    pub user_id: Option<String>,
}

impl SessionContext {
    pub fn new(user_id: Option<String>) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.filter(|id| !id.trim().is_empty()),
        }
    }

    pub fn anonymous() -> Self {
        Self::new(None)
    }

    /// Resume an existing session id, generating one if none was given
    pub fn resume(session_id: Option<String>, user_id: Option<String>) -> Self {
        let mut ctx = Self::new(user_id);
        if let Some(id) = session_id.filter(|id| !id.trim().is_empty()) {
            ctx.session_id = id;
        }
        ctx
    }
}

/// Analytics event submitted to the analytics sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    pub event_type: String,
    pub session_id: String,
    pub user_id: Option<String>,
    pub attributes: serde_json::Map<String, serde_json::Value>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl AnalyticsEvent {
    pub fn new(
        context: &SessionContext,
        event_type: impl Into<String>,
        attributes: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            session_id: context.session_id.clone(),
            user_id: context.user_id.clone(),
            attributes,
            timestamp: chrono::Utc::now(),
        }
    }
}
