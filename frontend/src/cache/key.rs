use std::fmt;

use shared::{DetectionFilter, HorseId};

/// Unit of invalidation: every key belongs to exactly one family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Horses,
    Locations,
    Detections,
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Family::Horses => "horses",
            Family::Locations => "locations",
            Family::Detections => "detections",
        };
        f.write_str(name)
    }
}

/// A family plus its filter parameters. Each key always caches one type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// `Vec<Horse>`
    Horses,
    /// `HorseDetail`
    Horse(HorseId),
    /// `Vec<Location>`
    Locations,
    /// `Vec<Detection>`
    Detections(DetectionFilter),
    /// `Vec<Detection>`
    Timeline(HorseId),
}

impl CacheKey {
    pub fn family(&self) -> Family {
        match self {
            CacheKey::Horses | CacheKey::Horse(_) => Family::Horses,
            CacheKey::Locations => Family::Locations,
            CacheKey::Detections(_) | CacheKey::Timeline(_) => Family::Detections,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Horses => write!(f, "horses"),
            CacheKey::Horse(id) => write!(f, "horses/{}", id),
            CacheKey::Locations => write!(f, "locations"),
            CacheKey::Detections(filter) => write!(f, "detections{}", filter.query_string()),
            CacheKey::Timeline(id) => write!(f, "detections/{}/timeline", id),
        }
    }
}

/// Server-side changes the client can cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    CreateHorse,
    DeleteHorse,
    CreateLocation,
    DeleteLocation,
    Analyze,
}

impl Mutation {
    /// Families whose cached values the mutation makes obsolete.
    pub fn invalidates(self) -> &'static [Family] {
        match self {
            Mutation::CreateHorse | Mutation::DeleteHorse => &[Family::Horses],
            Mutation::CreateLocation | Mutation::DeleteLocation => &[Family::Locations],
            // A match changes the horse's recent detections too.
            Mutation::Analyze => &[Family::Detections, Family::Horses],
        }
    }
}
