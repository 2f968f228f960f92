use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{GeoError, Result};
use crate::models::EntityLevel;

/// Untyped records read from one source file
#[derive(Debug)]
pub struct RawCollection {
    pub level: EntityLevel,
    pub path: PathBuf,
    pub records: Vec<Value>,
}

impl RawCollection {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parse `path` and pull out the level's top-level collection.
///
/// A missing collection key yields an empty collection; anything that isn't
/// an object at the top, or an array under the key, is a parse error.
fn read_collection(level: EntityLevel, path: &Path) -> Result<RawCollection> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => GeoError::SourceNotFound {
            level,
            path: path.to_path_buf(),
        },
        _ => GeoError::Io(e),
    })?;

    let document: Value = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| GeoError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let Value::Object(mut map) = document else {
        return Err(GeoError::Parse {
            path: path.to_path_buf(),
            message: "expected a JSON object at the top level".to_string(),
        });
    };

    let records = match map.remove(level.plural()) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(records)) => records,
        Some(_) => {
            return Err(GeoError::Parse {
                path: path.to_path_buf(),
                message: format!("`{}` must be an array", level.plural()),
            })
        }
    };

    Ok(RawCollection {
        level,
        path: path.to_path_buf(),
        records,
    })
}

/// Read a single-file level (cities or districts).
///
/// Absent file is `SourceNotFound`; an absent or empty collection is `EmptyDataSet`.
pub fn read_required(level: EntityLevel, path: &Path) -> Result<RawCollection> {
    if !path.is_file() {
        return Err(GeoError::SourceNotFound {
            level,
            path: path.to_path_buf(),
        });
    }

    let collection = read_collection(level, path)?;
    if collection.is_empty() {
        return Err(GeoError::EmptyDataSet {
            level,
            path: path.to_path_buf(),
        });
    }

    log::debug!("Read {} {} from {}", collection.len(), level, path.display());
    Ok(collection)
}

/// List the per-region neighborhood files, sorted by file name
pub fn discover_region_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(GeoError::SourceNotFound {
            level: EntityLevel::Neighborhood,
            path: dir.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| GeoError::Io(e.into()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let is_json = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            files.push(path.to_path_buf());
        }
    }

    log::info!("Discovered {} neighborhood files in {}", files.len(), dir.display());
    Ok(files)
}

/// Read one region's neighborhoods. Zero records is not an error here.
pub fn read_region_file(path: &Path) -> Result<RawCollection> {
    read_collection(EntityLevel::Neighborhood, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_read_required_ok() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cities.json");
        fs::write(&path, r#"{"cities": [{"id": 1, "name": "Adana"}, {"id": 2, "name": "Adıyaman"}]}"#)
            .unwrap();

        let collection = read_required(EntityLevel::City, &path).unwrap();
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.records[1]["name"], "Adıyaman");
        assert_eq!(collection.path, path);
    }

    #[test]
    fn test_read_required_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("districts.json");
        let err = read_required(EntityLevel::District, &path).unwrap_err();
        assert!(matches!(
            err,
            GeoError::SourceNotFound { level: EntityLevel::District, .. }
        ));
    }

    #[test]
    fn test_read_required_empty_collection() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cities.json");

        fs::write(&path, r#"{"cities": []}"#).unwrap();
        assert!(matches!(
            read_required(EntityLevel::City, &path).unwrap_err(),
            GeoError::EmptyDataSet { .. }
        ));

        fs::write(&path, r#"{"provinces": [{"id": 1}]}"#).unwrap();
        assert!(matches!(
            read_required(EntityLevel::City, &path).unwrap_err(),
            GeoError::EmptyDataSet { .. }
        ));
    }

    #[test]
    fn test_malformed_json_carries_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cities.json");
        fs::write(&path, r#"{"cities": [{"id": 1,}"#).unwrap();

        match read_required(EntityLevel::City, &path).unwrap_err() {
            GeoError::Parse { path: p, .. } => assert_eq!(p, path),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_array_collection_is_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cities.json");
        fs::write(&path, r#"{"cities": {"id": 1}}"#).unwrap();
        assert!(matches!(
            read_required(EntityLevel::City, &path).unwrap_err(),
            GeoError::Parse { .. }
        ));

        fs::write(&path, r#"[{"id": 1}]"#).unwrap();
        assert!(matches!(
            read_required(EntityLevel::City, &path).unwrap_err(),
            GeoError::Parse { .. }
        ));
    }

    #[test]
    fn test_discover_region_files() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("neighborhoods");
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("02.json"), "{}").unwrap();
        fs::write(dir.join("01.json"), "{}").unwrap();
        fs::write(dir.join("10.JSON"), "{}").unwrap();
        fs::write(dir.join("README.md"), "# data").unwrap();
        fs::write(dir.join("nested/03.json"), "{}").unwrap();

        let files = discover_region_files(&dir).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["01.json", "02.json", "10.JSON"]);
    }

    #[test]
    fn test_discover_region_files_missing_dir() {
        let temp_dir = TempDir::new().unwrap();
        let err = discover_region_files(&temp_dir.path().join("neighborhoods")).unwrap_err();
        assert!(matches!(
            err,
            GeoError::SourceNotFound { level: EntityLevel::Neighborhood, .. }
        ));
    }

    #[test]
    fn test_region_file_without_records_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("07.json");

        fs::write(&path, r#"{"neighborhoods": []}"#).unwrap();
        assert!(read_region_file(&path).unwrap().is_empty());

        fs::write(&path, "{}").unwrap();
        assert!(read_region_file(&path).unwrap().is_empty());
    }
}
