use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

/// One tier of the administrative hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityLevel {
    City,
    District,
    Neighborhood,
}

impl EntityLevel {
    /// All levels in insertion (dependency) order
    pub const ALL: [EntityLevel; 3] = [
        EntityLevel::City,
        EntityLevel::District,
        EntityLevel::Neighborhood,
    ];

    /// Lowercase plural name.
    ///
    /// Doubles as the top-level JSON collection key and the default table name.
    pub fn plural(self) -> &'static str {
        match self {
            EntityLevel::City => "cities",
            EntityLevel::District => "districts",
            EntityLevel::Neighborhood => "neighborhoods",
        }
    }
}

impl fmt::Display for EntityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.plural())
    }
}

/// Neighborhood surface area as it appears in the source data
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Area {
    Integer(i64),
    Real(f64),
    Text(String),
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Area::Integer(v) => write!(f, "{}", v),
            Area::Real(v) => write!(f, "{}", v),
            Area::Text(v) => f.write_str(v),
        }
    }
}

/// City (il) - root of the hierarchy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct City {
    pub id: i64,
    pub name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// District (ilçe) - belongs to exactly one city
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct District {
    pub id: i64,
    pub city_id: i64,
    pub name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Neighborhood (mahalle) - belongs to exactly one district
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Neighborhood {
    pub id: i64,
    pub district_id: i64,
    pub name: String,
    pub area: Option<Area>,
    pub postal_code: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_names() {
        assert_eq!(EntityLevel::City.to_string(), "cities");
        assert_eq!(EntityLevel::District.plural(), "districts");
        assert_eq!(EntityLevel::Neighborhood.plural(), "neighborhoods");
    }

    #[test]
    fn test_level_order() {
        assert_eq!(
            EntityLevel::ALL,
            [EntityLevel::City, EntityLevel::District, EntityLevel::Neighborhood]
        );
    }

    #[test]
    fn test_area_display() {
        assert_eq!(Area::Integer(12).to_string(), "12");
        assert_eq!(Area::Real(1.5).to_string(), "1.5");
        assert_eq!(Area::Text("merkez".to_string()).to_string(), "merkez");
    }
}
