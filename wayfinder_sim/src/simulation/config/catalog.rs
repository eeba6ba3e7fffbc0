// wayfinder_sim/src/simulation/config/catalog.rs

//! This module defines the `MapCatalog` and the on-disk map format.

use geo::{Coord, Geometry, LineString, Point, Polygon};
use serde::Deserialize;
use std::{collections::HashMap, path::Path};
use walkdir::WalkDir;
use wayfinder_core::mapping::{Feature, FeatureCollection, MapSnapshot, Properties, RoadNetworkBuilder, WayType};
use wayfinder_core::types::{FeatureId, LngLatAlt};

use crate::errors::{Result, SimError};

// =========================================================================
// == Map File Format ==
// =========================================================================

/// One parsed map file: named ways plus points of interest.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MapFile {
    pub name: String,
    #[serde(default)]
    pub ways: Vec<WayEntry>,
    #[serde(default)]
    pub pois: Vec<PoiEntry>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WayEntry {
    pub osm_id: u64,
    /// `[longitude, latitude]` pairs.
    pub coordinates: Vec<[f64; 2]>,
    #[serde(default)]
    pub way_type: WayType,
    /// Tags such as `name`, `highway` and `layer`.
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PoiEntry {
    pub id: u64,
    pub name: String,
    /// One of the core POI categories; anything else is announced as a place.
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub generic: bool,
    /// One point, a line, or a closed ring for an area.
    pub coordinates: Vec<[f64; 2]>,
}

fn default_category() -> String {
    "place".to_owned()
}

impl MapFile {
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        toml::from_str(text).map_err(|source| SimError::MapParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text, path)
    }

    /// Builds the road graph and POI index the engine runs against.
    pub fn to_snapshot(&self) -> Result<MapSnapshot> {
        let mut builder = RoadNetworkBuilder::new();
        for way in &self.ways {
            let coordinates: Vec<LngLatAlt> = way
                .coordinates
                .iter()
                .map(|[lon, lat]| LngLatAlt::new(*lon, *lat))
                .collect();
            builder.add_way_with_type(way.osm_id, &coordinates, way.properties.clone(), way.way_type)?;
        }
        let network = builder.build()?;

        let pois = self
            .pois
            .iter()
            .map(|poi| -> Result<Feature> {
                let geometry = poi_geometry(poi)?;
                let mut feature = Feature::new(FeatureId(poi.id), geometry)
                    .with_property("name", &poi.name)
                    .with_property("category", &poi.category);
                if poi.generic {
                    feature = feature.with_property("generic", "yes");
                }
                Ok(feature)
            })
            .collect::<Result<FeatureCollection>>()?;

        Ok(MapSnapshot::new(network, pois))
    }
}

fn poi_geometry(poi: &PoiEntry) -> Result<Geometry<f64>> {
    let coords: Vec<Coord<f64>> = poi.coordinates.iter().map(|[x, y]| Coord { x: *x, y: *y }).collect();
    match coords.as_slice() {
        [] => Err(SimError::EmptyGeometry(poi.id)),
        [single] => Ok(Geometry::Point(Point::from(*single))),
        [first, .., last] if coords.len() >= 4 && first == last => {
            Ok(Geometry::Polygon(Polygon::new(LineString::new(coords), Vec::new())))
        }
        _ => Ok(Geometry::LineString(LineString::new(coords))),
    }
}

// =========================================================================
// == Catalog ==
// =========================================================================

/// Every map found under an assets directory.
/// The key is a namespace string (e.g., "edinburgh.old_town") built from the
/// file's path relative to the catalog root.
#[derive(Debug, Default)]
pub struct MapCatalog(pub HashMap<String, MapFile>);

impl MapCatalog {
    /// Walks `root`, parsing every `.toml` file. Files that fail to load are
    /// logged and skipped.
    pub fn load(root: &Path) -> Self {
        let mut catalog = Self::default();
        if !root.exists() {
            tracing::warn!("Map directory not found at {:?}, no maps will be loaded.", root);
            return catalog;
        }

        tracing::info!("Loading map catalog from: {:?}", root);

        for entry in WalkDir::new(root)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|e| !e.file_type().is_dir() && e.path().extension().map_or(false, |ext| ext == "toml"))
        {
            let path = entry.path();
            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            // Create a key like "edinburgh.old_town" from the path.
            let key = relative
                .with_extension("")
                .to_string_lossy()
                .replace(std::path::MAIN_SEPARATOR, ".");

            match MapFile::from_path(path) {
                Ok(map) => {
                    tracing::info!("Loaded map: '{}' ({})", key, map.name);
                    catalog.0.insert(key, map);
                }
                Err(e) => {
                    tracing::error!("Failed to load map from {:?}: {}", path, e);
                }
            }
        }
        catalog
    }

    pub fn get(&self, key: &str) -> Option<&MapFile> {
        self.0.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const TOWN: &str = r#"
        name = "Test town"

        [[ways]]
        osm_id = 1
        coordinates = [[0.0, 0.0], [0.0, 0.001], [0.0, 0.002]]
        properties = { name = "Elm St", highway = "residential" }

        [[ways]]
        osm_id = 2
        coordinates = [[-0.001, 0.001], [0.0, 0.001], [0.001, 0.001]]
        properties = { name = "Oak St" }

        [[pois]]
        id = 10
        name = "Bench"
        category = "object"
        generic = true
        coordinates = [[0.0001, 0.0005]]

        [[pois]]
        id = 11
        name = "Park"
        coordinates = [[0.001, 0.0], [0.002, 0.0], [0.002, 0.0005], [0.001, 0.0]]
    "#;

    #[test]
    fn test_map_file_builds_snapshot() {
        let file = MapFile::parse(TOWN, Path::new("town.toml")).unwrap();
        assert_eq!(file.ways.len(), 2);
        assert_eq!(file.ways[0].properties.get("name").map(String::as_str), Some("Elm St"));

        let snapshot = file.to_snapshot().unwrap();
        // Both roads are cut at the crossing.
        assert_eq!(snapshot.network().ways().len(), 4);
        assert!(!snapshot.network().intersections().is_empty());
        assert_eq!(snapshot.pois().len(), 2);
        assert!(snapshot.pois()[0].generic);
        assert!(matches!(snapshot.pois()[1].feature.geometry, Geometry::Polygon(_)));
    }

    #[test]
    fn test_open_line_stays_a_line() {
        let poi = PoiEntry {
            id: 1,
            name: "Wall".to_owned(),
            category: default_category(),
            generic: false,
            coordinates: vec![[0.0, 0.0], [0.001, 0.0], [0.001, 0.001]],
        };
        assert!(matches!(poi_geometry(&poi), Ok(Geometry::LineString(_))));

        let empty = PoiEntry {
            coordinates: Vec::new(),
            ..poi
        };
        assert!(matches!(poi_geometry(&empty), Err(SimError::EmptyGeometry(1))));
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let result = MapFile::parse("name = 3", Path::new("broken.toml"));
        match result {
            Err(SimError::MapParse { path, .. }) => assert_eq!(path, Path::new("broken.toml")),
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_catalog_keys_follow_directories() {
        let root = std::env::temp_dir().join(format!("wayfinder_catalog_{}", std::process::id()));
        fs::create_dir_all(root.join("test")).unwrap();
        fs::write(root.join("test").join("town.toml"), TOWN).unwrap();
        fs::write(root.join("test").join("broken.toml"), "ways = 1").unwrap();
        fs::write(root.join("notes.txt"), "not a map").unwrap();

        let catalog = MapCatalog::load(&root);
        fs::remove_dir_all(&root).unwrap();

        assert_eq!(catalog.0.len(), 1);
        assert_eq!(catalog.get("test.town").map(|m| m.name.as_str()), Some("Test town"));
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let catalog = MapCatalog::load(Path::new("no/such/maps"));
        assert!(catalog.0.is_empty());
    }
}
