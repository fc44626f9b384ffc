//! Domain entities for the place/visit/dish journal.
//!
//! All timestamps are integer milliseconds since the Unix epoch. All
//! identifiers are opaque unique strings assigned at creation and never
//! reused. Serde field names double as column names for the relational
//! backend and as JSON keys for the flat backend, so the derives here are
//! the single definition of the persisted shape.
//!
//! Derived fields (`Place::tag_ids`, `Place::overall_rating`,
//! `List::overall_rating`) are `#[serde(skip)]`: they are computed on read
//! by the aggregation engine and never persisted.

use serde::{Deserialize, Serialize};

/// How a place's overall rating is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingMode {
    /// Rating derived from dependent rows. Currently yields no value:
    /// visits carry no rating field, and the store does not roll dish
    /// ratings up on its own.
    #[default]
    Aggregate,
    /// Rating is the manually entered overall value.
    Overall,
}

/// Whether a category classifies places or dishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Place,
    Dish,
}

/// The device owner's profile. At most one instance exists per store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub display_name: String,
    pub avatar_uri: Option<String>,
    pub created_at: i64,
}

/// A physical location entry with coordinates and optional metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub category_id: Option<String>,
    pub notes: Option<String>,
    /// Manually entered rating, used verbatim when `rating_mode` is
    /// [`RatingMode::Overall`].
    pub overall_rating_manual: Option<f64>,
    pub rating_mode: RatingMode,
    pub cover_image_uri: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,

    /// Ids of tags attached to this place. Derived on read.
    #[serde(skip)]
    pub tag_ids: Vec<String>,
    /// Effective rating per the aggregation rules. Derived on read.
    #[serde(skip)]
    pub overall_rating: Option<f64>,
}

/// A named, ordered collection of places curated by the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct List {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub city: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,

    /// Mean of the ratings of attached places. Derived on read.
    #[serde(skip)]
    pub overall_rating: Option<f64>,
}

/// Ordered membership record linking a list to a place.
///
/// `order` values within one list are assigned contiguously on insert, but
/// removals leave gaps; treat `order` as a sort key, not a dense index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListItem {
    pub id: String,
    pub list_id: String,
    pub place_id: String,
    pub order: i64,
    pub created_at: i64,
}

/// A logged occasion of visiting a place. Owns zero or more dishes.
/// Visits carry no rating field; ratings live on places and dishes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visit {
    pub id: String,
    pub place_id: String,
    pub notes: Option<String>,
    pub photo_uri: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// An item ordered and rated during a visit. Rating is mandatory, 1..=5.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dish {
    pub id: String,
    pub visit_id: String,
    pub name: String,
    pub category_id: Option<String>,
    pub rating: i64,
    pub notes: Option<String>,
    pub photo_uri: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A hierarchical classification for places or dishes.
/// `order` is a sparse integer used only for display sorting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CategoryKind,
    pub parent_id: Option<String>,
    pub order: i64,
    pub created_at: i64,
}

/// A free-form label attachable to multiple places.
/// Names are unique, case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub color: Option<String>,
    pub created_at: i64,
}

// --- Creation inputs ---

/// Builder for creating a new place.
#[derive(Debug, Clone)]
pub struct NewPlace {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub category_id: Option<String>,
    pub notes: Option<String>,
    pub overall_rating_manual: Option<f64>,
    pub rating_mode: RatingMode,
    pub cover_image_uri: Option<String>,
}

impl NewPlace {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            address: None,
            category_id: None,
            notes: None,
            overall_rating_manual: None,
            rating_mode: RatingMode::default(),
            cover_image_uri: None,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_manual_rating(mut self, rating: f64) -> Self {
        self.overall_rating_manual = Some(rating);
        self.rating_mode = RatingMode::Overall;
        self
    }

    pub fn with_cover_image(mut self, uri: impl Into<String>) -> Self {
        self.cover_image_uri = Some(uri.into());
        self
    }
}

/// Builder for creating a new list.
#[derive(Debug, Clone)]
pub struct NewList {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub city: Option<String>,
}

impl NewList {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            category: None,
            city: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }
}

/// Builder for logging a new visit.
#[derive(Debug, Clone)]
pub struct NewVisit {
    pub place_id: String,
    pub notes: Option<String>,
    pub photo_uri: Option<String>,
}

impl NewVisit {
    pub fn new(place_id: impl Into<String>) -> Self {
        Self {
            place_id: place_id.into(),
            notes: None,
            photo_uri: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_photo(mut self, uri: impl Into<String>) -> Self {
        self.photo_uri = Some(uri.into());
        self
    }
}

/// Builder for creating a new dish.
#[derive(Debug, Clone)]
pub struct NewDish {
    pub visit_id: String,
    pub name: String,
    pub rating: i64,
    pub category_id: Option<String>,
    pub notes: Option<String>,
    pub photo_uri: Option<String>,
}

impl NewDish {
    pub fn new(visit_id: impl Into<String>, name: impl Into<String>, rating: i64) -> Self {
        Self {
            visit_id: visit_id.into(),
            name: name.into(),
            rating,
            category_id: None,
            notes: None,
            photo_uri: None,
        }
    }

    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_photo(mut self, uri: impl Into<String>) -> Self {
        self.photo_uri = Some(uri.into());
        self
    }
}

/// Builder for creating a new category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub kind: CategoryKind,
    pub parent_id: Option<String>,
    pub order: i64,
}

impl NewCategory {
    pub fn new(name: impl Into<String>, kind: CategoryKind) -> Self {
        Self {
            name: name.into(),
            kind,
            parent_id: None,
            order: 0,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }
}

/// Builder for creating a new tag.
#[derive(Debug, Clone)]
pub struct NewTag {
    pub name: String,
    pub color: Option<String>,
}

impl NewTag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// Profile input for the author upsert.
#[derive(Debug, Clone)]
pub struct NewAuthor {
    pub display_name: String,
    pub avatar_uri: Option<String>,
}

impl NewAuthor {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            avatar_uri: None,
        }
    }

    pub fn with_avatar(mut self, uri: impl Into<String>) -> Self {
        self.avatar_uri = Some(uri.into());
        self
    }
}

// --- Update patches ---
//
// A `Some` field is written; a `None` field is left untouched. Clearing a
// nullable column is not expressible through a patch.

/// Partial update for a place.
#[derive(Debug, Clone, Default)]
pub struct PlacePatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub category_id: Option<String>,
    pub notes: Option<String>,
    pub overall_rating_manual: Option<f64>,
    pub rating_mode: Option<RatingMode>,
    pub cover_image_uri: Option<String>,
}

/// Partial update for a list.
#[derive(Debug, Clone, Default)]
pub struct ListPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub city: Option<String>,
}

/// Partial update for a visit.
#[derive(Debug, Clone, Default)]
pub struct VisitPatch {
    pub notes: Option<String>,
    pub photo_uri: Option<String>,
}

/// Partial update for a dish.
#[derive(Debug, Clone, Default)]
pub struct DishPatch {
    pub name: Option<String>,
    pub category_id: Option<String>,
    pub rating: Option<i64>,
    pub notes: Option<String>,
    pub photo_uri: Option<String>,
}

/// Partial update for a category.
#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub parent_id: Option<String>,
    pub order: Option<i64>,
}

/// Partial update for a tag.
#[derive(Debug, Clone, Default)]
pub struct TagPatch {
    pub name: Option<String>,
    pub color: Option<String>,
}
