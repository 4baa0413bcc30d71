//! Region entity: the geographic scope content is filtered by.

use chrono::{DateTime, Utc};
use localhub_shared::utils::slugify;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::DomainError;
use crate::validation::{validate_slug, FieldErrors, Validated};

string_enum! {
    RegionKind {
        State => "state",
        County => "county",
        City => "city",
        Neighborhood => "neighborhood",
    }
}

impl RegionKind {
    pub fn level(&self) -> u8 {
        match self {
            RegionKind::State => 0,
            RegionKind::County => 1,
            RegionKind::City => 2,
            RegionKind::Neighborhood => 3,
        }
    }

    /// Kind a parent must have; `None` for top-level regions.
    pub fn parent_kind(&self) -> Option<RegionKind> {
        match self {
            RegionKind::State => None,
            RegionKind::County => Some(RegionKind::State),
            RegionKind::City => Some(RegionKind::County),
            RegionKind::Neighborhood => Some(RegionKind::City),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub kind: RegionKind,
    pub name: String,
    pub slug: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewRegion {
    pub parent_id: Option<Uuid>,

    pub kind: RegionKind,

    #[validate(length(min = 2, max = 100, message = "Region name must be between 2 and 100 characters"))]
    pub name: String,

    #[validate(
        length(min = 2, max = 100, message = "Slug must be between 2 and 100 characters"),
        custom(function = "validate_slug")
    )]
    pub slug: Option<String>,

    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub longitude: Option<f64>,
}

impl Validated for NewRegion {
    fn cross_field_rules(&self, errors: &mut FieldErrors) {
        coordinate_pair_rule(self.latitude, self.longitude, errors);
        match (self.kind.parent_kind(), self.parent_id) {
            (None, Some(_)) => errors.add("parent_id", "A state cannot have a parent region"),
            (Some(kind), None) => errors.add(
                "parent_id",
                format!("A {} must have a parent {}", self.kind, kind),
            ),
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RegionUpdate {
    #[validate(length(min = 2, max = 100, message = "Region name must be between 2 and 100 characters"))]
    pub name: Option<String>,

    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub longitude: Option<f64>,
}

impl Validated for RegionUpdate {
    fn cross_field_rules(&self, errors: &mut FieldErrors) {
        coordinate_pair_rule(self.latitude, self.longitude, errors);
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegionFilter {
    pub kind: Option<RegionKind>,
    pub parent_id: Option<Uuid>,
    pub search: Option<String>,
}

fn coordinate_pair_rule(latitude: Option<f64>, longitude: Option<f64>, errors: &mut FieldErrors) {
    match (latitude, longitude) {
        (Some(_), None) => errors.add("longitude", "Longitude is required when latitude is present"),
        (None, Some(_)) => errors.add("latitude", "Latitude is required when longitude is present"),
        _ => {}
    }
}

impl Region {
    pub fn create(input: NewRegion) -> Self {
        let slug = input.slug.unwrap_or_else(|| slugify(&input.name));
        Self {
            id: Uuid::new_v4(),
            parent_id: input.parent_id,
            kind: input.kind,
            name: input.name.trim().to_string(),
            slug,
            latitude: input.latitude,
            longitude: input.longitude,
            created_at: Utc::now(),
            modified_at: None,
        }
    }

    pub fn apply(&mut self, update: RegionUpdate) {
        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if update.latitude.is_some() {
            self.latitude = update.latitude;
            self.longitude = update.longitude;
        }
        self.modified_at = Some(Utc::now());
    }

    /// Checks that `parent` may contain a region of `kind`.
    pub fn ensure_parent_of(parent: &Region, kind: RegionKind) -> Result<(), DomainError> {
        match kind.parent_kind() {
            Some(expected) if parent.kind == expected => Ok(()),
            Some(expected) => Err(DomainError::field(
                "parent_id",
                format!("Parent of a {} must be a {}, not a {}", kind, expected, parent.kind),
            )),
            None => Err(DomainError::field("parent_id", "A state cannot have a parent region")),
        }
    }
}
