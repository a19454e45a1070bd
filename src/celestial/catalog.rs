use crate::coordinates::EquatorialCoordinate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    Constellation,
    DeepSky,
}

/// A fixed direction on the sky (approximate J2000 center).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CatalogObject {
    pub id: &'static str,
    pub name: &'static str,
    pub kind: CatalogKind,
    pub right_ascension_hours: f64,
    pub declination_deg: f64,
}

impl CatalogObject {
    const fn new(
        id: &'static str,
        name: &'static str,
        kind: CatalogKind,
        right_ascension_hours: f64,
        declination_deg: f64,
    ) -> Self {
        Self {
            id,
            name,
            kind,
            right_ascension_hours,
            declination_deg,
        }
    }

    pub fn equatorial(&self) -> EquatorialCoordinate {
        EquatorialCoordinate::new(self.right_ascension_hours, self.declination_deg)
    }
}

use CatalogKind::{Constellation, DeepSky};

pub const CATALOG: [CatalogObject; 16] = [
    CatalogObject::new("orion", "Orion", Constellation, 5.5, 5.0),
    CatalogObject::new("ursa-major", "Ursa Major", Constellation, 11.0, 50.0),
    CatalogObject::new("scorpius", "Scorpius", Constellation, 16.5, -26.0),
    CatalogObject::new("cassiopeia", "Cassiopeia", Constellation, 1.0, 60.0),
    CatalogObject::new("leo", "Leo", Constellation, 10.5, 15.0),
    CatalogObject::new("cygnus", "Cygnus", Constellation, 20.5, 42.0),
    CatalogObject::new("gemini", "Gemini", Constellation, 7.0, 20.0),
    CatalogObject::new("lyra", "Lyra", Constellation, 18.6, 39.0),
    CatalogObject::new("taurus", "Taurus", Constellation, 4.5, 16.0),
    CatalogObject::new("pegasus", "Pegasus", Constellation, 23.0, 20.0),
    CatalogObject::new("andromeda", "Andromeda", Constellation, 1.0, 40.0),
    CatalogObject::new("aquila", "Aquila", Constellation, 19.8, 3.0),
    CatalogObject::new("m45", "Pleiades", DeepSky, 3.8, 24.0),
    CatalogObject::new("m31", "Andromeda Galaxy", DeepSky, 0.7, 41.0),
    CatalogObject::new("m42", "Orion Nebula", DeepSky, 5.6, -5.4),
    CatalogObject::new("m44", "Beehive Cluster", DeepSky, 8.7, 19.0),
];

pub fn find(id: &str) -> Option<&'static CatalogObject> {
    CATALOG.iter().find(|o| o.id.eq_ignore_ascii_case(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        for (i, a) in CATALOG.iter().enumerate() {
            assert!(CATALOG[i + 1..].iter().all(|b| b.id != a.id), "{}", a.id);
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(find("M42").map(|o| o.name), Some("Orion Nebula"));
        assert!(find("m99").is_none());
    }
}
