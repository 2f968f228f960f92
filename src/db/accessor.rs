use rusqlite::{Connection, OptionalExtension, Row};

use super::encode::{decode_area, decode_timestamp};
use super::schema::quote_ident;
use crate::config::TableNames;
use crate::error::Result;
use crate::models::{City, District, EntityLevel, Neighborhood};

/// Typed read access to the seeded hierarchy.
///
/// Covers the parent/child relations only: city → districts,
/// district → neighborhoods, and the reverse lookups.
pub struct GeoReader<'c> {
    conn: &'c Connection,
    tables: &'c TableNames,
}

fn city_from_row(row: &Row<'_>) -> rusqlite::Result<City> {
    Ok(City {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: decode_timestamp(2, &row.get::<_, String>(2)?)?,
        updated_at: decode_timestamp(3, &row.get::<_, String>(3)?)?,
    })
}

fn district_from_row(row: &Row<'_>) -> rusqlite::Result<District> {
    Ok(District {
        id: row.get(0)?,
        city_id: row.get(1)?,
        name: row.get(2)?,
        created_at: decode_timestamp(3, &row.get::<_, String>(3)?)?,
        updated_at: decode_timestamp(4, &row.get::<_, String>(4)?)?,
    })
}

fn neighborhood_from_row(row: &Row<'_>) -> rusqlite::Result<Neighborhood> {
    Ok(Neighborhood {
        id: row.get(0)?,
        district_id: row.get(1)?,
        name: row.get(2)?,
        area: decode_area(3, row.get(3)?)?,
        postal_code: row.get(4)?,
        created_at: decode_timestamp(5, &row.get::<_, String>(5)?)?,
        updated_at: decode_timestamp(6, &row.get::<_, String>(6)?)?,
    })
}

const CITY_COLUMNS: &str = "id, name, created_at, updated_at";
const DISTRICT_COLUMNS: &str = "id, city_id, name, created_at, updated_at";
const NEIGHBORHOOD_COLUMNS: &str =
    "id, district_id, name, area, postal_code, created_at, updated_at";

impl<'c> GeoReader<'c> {
    pub fn new(conn: &'c Connection, tables: &'c TableNames) -> Self {
        Self { conn, tables }
    }

    fn table(&self, level: EntityLevel) -> String {
        quote_ident(self.tables.for_level(level))
    }

    /// All cities ordered by id
    pub fn cities(&self) -> Result<Vec<City>> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY id",
            CITY_COLUMNS,
            self.table(EntityLevel::City)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let cities = stmt
            .query_map([], city_from_row)?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        Ok(cities)
    }

    pub fn city(&self, id: i64) -> Result<Option<City>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?1",
            CITY_COLUMNS,
            self.table(EntityLevel::City)
        );
        Ok(self.conn.query_row(&sql, [id], city_from_row).optional()?)
    }

    pub fn district(&self, id: i64) -> Result<Option<District>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?1",
            DISTRICT_COLUMNS,
            self.table(EntityLevel::District)
        );
        Ok(self.conn.query_row(&sql, [id], district_from_row).optional()?)
    }

    pub fn neighborhood(&self, id: i64) -> Result<Option<Neighborhood>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?1",
            NEIGHBORHOOD_COLUMNS,
            self.table(EntityLevel::Neighborhood)
        );
        Ok(self.conn.query_row(&sql, [id], neighborhood_from_row).optional()?)
    }

    /// Districts belonging to a city
    pub fn districts_of(&self, city_id: i64) -> Result<Vec<District>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE city_id = ?1 ORDER BY id",
            DISTRICT_COLUMNS,
            self.table(EntityLevel::District)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let districts = stmt
            .query_map([city_id], district_from_row)?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        Ok(districts)
    }

    /// Neighborhoods belonging to a district
    pub fn neighborhoods_of(&self, district_id: i64) -> Result<Vec<Neighborhood>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE district_id = ?1 ORDER BY id",
            NEIGHBORHOOD_COLUMNS,
            self.table(EntityLevel::Neighborhood)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let neighborhoods = stmt
            .query_map([district_id], neighborhood_from_row)?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        Ok(neighborhoods)
    }

    /// City owning a district
    pub fn city_of(&self, district: &District) -> Result<Option<City>> {
        self.city(district.city_id)
    }

    /// District owning a neighborhood
    pub fn district_of(&self, neighborhood: &Neighborhood) -> Result<Option<District>> {
        self.district(neighborhood.district_id)
    }

    /// City of a neighborhood, resolved through its district
    pub fn city_of_neighborhood(&self, neighborhood: &Neighborhood) -> Result<Option<City>> {
        let sql = format!(
            "SELECT c.id, c.name, c.created_at, c.updated_at \
             FROM {} c JOIN {} d ON d.city_id = c.id \
             WHERE d.id = ?1",
            self.table(EntityLevel::City),
            self.table(EntityLevel::District)
        );
        Ok(self
            .conn
            .query_row(&sql, [neighborhood.district_id], city_from_row)
            .optional()?)
    }

    /// Row count of a level's table
    pub fn count(&self, level: EntityLevel) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table(level));
        let n: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure, schema};
    use crate::models::Area;

    fn setup() -> (Connection, TableNames) {
        let conn = Connection::open_in_memory().unwrap();
        configure(&conn).unwrap();
        let tables = TableNames::default();
        schema::ensure_schema(&conn, &tables).unwrap();
        conn.execute_batch(
            "INSERT INTO cities (id, name, created_at, updated_at) VALUES
                 (1, 'Adana', '2024-01-01 00:00:00', '2024-01-01 00:00:00'),
                 (34, 'İstanbul', '2024-01-01 00:00:00', '2024-01-01 00:00:00');
             INSERT INTO districts (id, city_id, name, created_at, updated_at) VALUES
                 (100, 1, 'Seyhan', '2024-01-01 00:00:01', '2024-01-01 00:00:01'),
                 (101, 1, 'Çukurova', '2024-01-01 00:00:01', '2024-01-01 00:00:01'),
                 (3400, 34, 'Kadıköy', '2024-01-01 00:00:01', '2024-01-01 00:00:01');
             INSERT INTO neighborhoods
                 (id, district_id, name, area, postal_code, created_at, updated_at) VALUES
                 (5, 3400, 'Moda', 12, '34710', '2024-01-01 00:00:02', '2024-01-01 00:00:02'),
                 (6, 3400, 'Fenerbahçe', 'merkez', NULL, '2024-01-01 00:00:02', '2024-01-01 00:00:02'),
                 (7, 100, 'Kurtuluş', NULL, NULL, '2024-01-01 00:00:02', '2024-01-01 00:00:02');",
        )
        .unwrap();
        (conn, tables)
    }

    #[test]
    fn test_city_lookup() {
        let (conn, tables) = setup();
        let reader = GeoReader::new(&conn, &tables);

        let city = reader.city(34).unwrap().unwrap();
        assert_eq!(city.name, "İstanbul");
        assert_eq!(city.created_at, city.updated_at);
        assert!(reader.city(99).unwrap().is_none());
        assert_eq!(reader.cities().unwrap().len(), 2);
    }

    #[test]
    fn test_districts_of_city() {
        let (conn, tables) = setup();
        let reader = GeoReader::new(&conn, &tables);

        let districts = reader.districts_of(1).unwrap();
        let names: Vec<_> = districts.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Seyhan", "Çukurova"]);
        assert!(reader.districts_of(99).unwrap().is_empty());
    }

    #[test]
    fn test_neighborhoods_of_district() {
        let (conn, tables) = setup();
        let reader = GeoReader::new(&conn, &tables);

        let hoods = reader.neighborhoods_of(3400).unwrap();
        assert_eq!(hoods.len(), 2);
        assert_eq!(hoods[0].area, Some(Area::Integer(12)));
        assert_eq!(hoods[0].postal_code.as_deref(), Some("34710"));
        assert_eq!(hoods[1].area, Some(Area::Text("merkez".to_string())));
        assert_eq!(hoods[1].postal_code, None);
    }

    #[test]
    fn test_reverse_lookups() {
        let (conn, tables) = setup();
        let reader = GeoReader::new(&conn, &tables);

        let hood = reader.neighborhood(5).unwrap().unwrap();
        let district = reader.district_of(&hood).unwrap().unwrap();
        assert_eq!(district.name, "Kadıköy");

        let city = reader.city_of(&district).unwrap().unwrap();
        assert_eq!(city.id, 34);

        let via_join = reader.city_of_neighborhood(&hood).unwrap().unwrap();
        assert_eq!(via_join, city);
    }

    #[test]
    fn test_counts() {
        let (conn, tables) = setup();
        let reader = GeoReader::new(&conn, &tables);
        assert_eq!(reader.count(EntityLevel::City).unwrap(), 2);
        assert_eq!(reader.count(EntityLevel::District).unwrap(), 3);
        assert_eq!(reader.count(EntityLevel::Neighborhood).unwrap(), 3);
    }
}
