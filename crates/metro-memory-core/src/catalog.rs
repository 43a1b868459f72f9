// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::aliases::AliasGenerator;
use crate::cluster::{ClusterBuilder, ClusterIndex};
use crate::config::MatchConfig;
use crate::{MetroError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;

pub type StationId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Point(Coord),
    /// Route geometry, only used to frame the camera.
    Line(Vec<Coord>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    pub fn from_coords(coords: &[Coord]) -> Option<Self> {
        let first = coords.first()?;
        let mut bounds = Self::new(first.lat, first.lat, first.lon, first.lon);
        for c in &coords[1..] {
            bounds.min_lat = bounds.min_lat.min(c.lat);
            bounds.max_lat = bounds.max_lat.max(c.lat);
            bounds.min_lon = bounds.min_lon.min(c.lon);
            bounds.max_lon = bounds.max_lon.max(c.lon);
        }
        Some(bounds)
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }

    pub fn center(&self) -> Coord {
        Coord {
            lon: (self.min_lon + self.max_lon) / 2.0,
            lat: (self.min_lat + self.max_lat) / 2.0,
        }
    }
}

/// Where the camera should go after a station is found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FocusTarget {
    Point(Coord),
    Bounds(BoundingBox),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    pub geometry: Option<Geometry>,
    pub line: Option<String>,
    #[serde(default)]
    pub long_name: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub alternate_names: BTreeSet<String>,
    #[serde(default)]
    pub cluster_key: Option<StationId>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub order: Option<i64>,
}

impl Station {
    pub fn point(id: StationId, name: &str, line: Option<&str>, lon: f64, lat: f64) -> Self {
        Self {
            id,
            name: name.to_string(),
            geometry: Some(Geometry::Point(Coord { lon, lat })),
            line: line.map(|l| l.to_string()),
            long_name: None,
            short_name: None,
            alternate_names: BTreeSet::new(),
            cluster_key: None,
            display_name: None,
            order: None,
        }
    }

    pub fn coord(&self) -> Option<Coord> {
        match &self.geometry {
            Some(Geometry::Point(c)) if c.lon.is_finite() && c.lat.is_finite() => Some(*c),
            _ => None,
        }
    }

    pub fn is_point(&self) -> bool {
        matches!(self.geometry, Some(Geometry::Point(_)))
    }

    /// Label to render on the map.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    pub fn focus_target(&self) -> Option<FocusTarget> {
        match self.geometry.as_ref()? {
            Geometry::Point(_) => self.coord().map(FocusTarget::Point),
            Geometry::Line(coords) => BoundingBox::from_coords(coords).map(FocusTarget::Bounds),
        }
    }

    /// Adds alternates, dropping blanks and the canonical name itself.
    pub fn merge_alternates<I, S>(&mut self, alternates: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let before = self.alternate_names.len();
        for alt in alternates {
            let alt = alt.as_ref().trim();
            if alt.is_empty() || alt == self.name.trim() {
                continue;
            }
            self.alternate_names.insert(alt.to_string());
        }
        self.alternate_names.len() - before
    }
}

/// Line metadata from a city's `lines.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineInfo {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub text_color: Option<String>,
    #[serde(default)]
    pub order: Option<i64>,
}

pub type Lines = BTreeMap<String, LineInfo>;

pub fn load_lines<P: AsRef<Path>>(path: P) -> Result<Lines> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "feature_collection_type")]
    pub kind: String,
    #[serde(default)]
    pub features: Vec<Feature>,
}

fn feature_collection_type() -> String {
    "FeatureCollection".to_string()
}

fn feature_type() -> String {
    "Feature".to_string()
}

/// A raw GeoJSON feature. Geometry and properties stay loosely typed so one
/// malformed entry never rejects the whole collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default = "feature_type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default)]
    pub geometry: Option<Value>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl FeatureCollection {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let fc: FeatureCollection = serde_json::from_str(content)?;
        if fc.kind != "FeatureCollection" {
            return Err(MetroError::InvalidCatalog(format!(
                "expected a FeatureCollection, found '{}'",
                fc.kind
            )));
        }
        Ok(fc)
    }
}

fn value_as_id(value: &Value) -> Option<StationId> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|v| StationId::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn string_prop(props: &Map<String, Value>, key: &str) -> Option<String> {
    props
        .get(key)
        .and_then(Value::as_str)
        .map(|s| s.to_string())
}

fn parse_coord(value: &Value) -> Option<Coord> {
    let pair = value.as_array()?;
    let lon = pair.first()?.as_f64()?;
    let lat = pair.get(1)?.as_f64()?;
    if lon.is_finite() && lat.is_finite() {
        Some(Coord { lon, lat })
    } else {
        None
    }
}

fn parse_geometry(value: &Value) -> Option<Geometry> {
    let coords = value.get("coordinates")?;
    match value.get("type")?.as_str()? {
        "Point" => parse_coord(coords).map(Geometry::Point),
        "LineString" => {
            let line: Vec<Coord> = coords.as_array()?.iter().filter_map(parse_coord).collect();
            (!line.is_empty()).then_some(Geometry::Line(line))
        }
        "MultiLineString" => {
            let line: Vec<Coord> = coords
                .as_array()?
                .iter()
                .filter_map(Value::as_array)
                .flatten()
                .filter_map(parse_coord)
                .collect();
            (!line.is_empty()).then_some(Geometry::Line(line))
        }
        _ => None,
    }
}

impl Feature {
    /// Converts the raw feature into a station. Returns `None` when no usable
    /// integer id exists; a broken geometry only leaves `geometry` empty.
    pub fn to_station(&self) -> Option<Station> {
        let id = self
            .id
            .as_ref()
            .and_then(value_as_id)
            .or_else(|| self.properties.get("id").and_then(value_as_id))?;

        let geometry = self.geometry.as_ref().and_then(parse_geometry);
        if geometry.is_none() {
            log::warn!("[Catalog] Feature {} has no usable geometry", id);
        }

        let mut station = Station {
            id,
            name: string_prop(&self.properties, "name").unwrap_or_default(),
            geometry,
            line: string_prop(&self.properties, "line").filter(|l| !l.is_empty()),
            long_name: string_prop(&self.properties, "long_name"),
            short_name: string_prop(&self.properties, "short_name"),
            alternate_names: BTreeSet::new(),
            cluster_key: None,
            display_name: string_prop(&self.properties, "display_name"),
            order: self.properties.get("order").and_then(Value::as_i64),
        };

        if let Some(Value::Array(alts)) = self.properties.get("alternate_names") {
            station.merge_alternates(alts.iter().filter_map(Value::as_str));
        }

        Some(station)
    }
}

/// The enriched, immutable station catalog of one city.
#[derive(Debug, Clone)]
pub struct Catalog {
    stations: Vec<Station>,
    positions: HashMap<StationId, usize>,
    clusters: ClusterIndex,
    lines: Option<Lines>,
}

impl Catalog {
    /// Loads `features.json` and runs alias generation and clustering.
    pub fn load<P: AsRef<Path>>(path: P, lines: Option<Lines>, config: &MatchConfig) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("[Catalog] Loading features from {:?}", path);
        let fc = FeatureCollection::load(path)?;
        Ok(Self::from_feature_collection(&fc, lines, config))
    }

    pub fn from_feature_collection(
        fc: &FeatureCollection,
        lines: Option<Lines>,
        config: &MatchConfig,
    ) -> Self {
        let mut skipped = 0usize;
        let stations: Vec<Station> = fc
            .features
            .iter()
            .filter_map(|f| {
                let station = f.to_station();
                if station.is_none() {
                    skipped += 1;
                }
                station
            })
            .collect();
        if skipped > 0 {
            log::warn!("[Catalog] Skipped {} features without an integer id", skipped);
        }
        Self::from_stations(stations, lines, config)
    }

    pub fn from_stations(stations: Vec<Station>, lines: Option<Lines>, config: &MatchConfig) -> Self {
        let mut kept: Vec<Station> = Vec::with_capacity(stations.len());
        let mut positions = HashMap::with_capacity(stations.len());

        for station in stations {
            if let Some(known) = &lines {
                let on_known_line = station
                    .line
                    .as_ref()
                    .map(|l| known.contains_key(l))
                    .unwrap_or(false);
                if !on_known_line {
                    log::debug!(
                        "[Catalog] Dropping station {} on unconfigured line {:?}",
                        station.id,
                        station.line
                    );
                    continue;
                }
            }
            if positions.contains_key(&station.id) {
                log::warn!("[Catalog] Duplicate station id {}, keeping the first", station.id);
                continue;
            }
            positions.insert(station.id, kept.len());
            kept.push(station);
        }

        let generator = AliasGenerator::new(&config.extra_aliases);
        let mut generated = 0usize;
        for station in kept.iter_mut() {
            let aliases = generator.generate(&station.name);
            generated += station.merge_alternates(&aliases.alternates);
            if station.display_name.is_none() {
                station.display_name = aliases.display_name;
            }
        }

        let clusters = ClusterBuilder::new(config.cluster_distance).build(&mut kept);

        log::debug!(
            "[Catalog] {} stations, {} generated aliases, {} clusters",
            kept.len(),
            generated,
            clusters.len()
        );

        Self {
            stations: kept,
            positions,
            clusters,
            lines,
        }
    }

    pub fn get(&self, id: StationId) -> Option<&Station> {
        self.positions.get(&id).map(|&i| &self.stations[i])
    }

    pub fn contains(&self, id: StationId) -> bool {
        self.positions.contains_key(&id)
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn ids(&self) -> impl Iterator<Item = StationId> + '_ {
        self.stations.iter().map(|s| s.id)
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn clusters(&self) -> &ClusterIndex {
        &self.clusters
    }

    /// Members of the cluster `id` belongs to, or `None` if unclustered.
    pub fn cluster_of(&self, id: StationId) -> Option<&[StationId]> {
        let key = self.get(id)?.cluster_key?;
        self.clusters.get(&key).map(|m| m.as_slice())
    }

    pub fn lines(&self) -> Option<&Lines> {
        self.lines.as_ref()
    }

    pub fn line_order(&self, line: &str) -> Option<i64> {
        self.lines.as_ref()?.get(line)?.order
    }

    pub fn focus_target(&self, id: StationId) -> Option<FocusTarget> {
        self.get(id)?.focus_target()
    }

    /// Exports the enriched catalog back to GeoJSON.
    pub fn to_feature_collection(&self) -> FeatureCollection {
        let features = self
            .stations
            .iter()
            .map(|s| {
                let mut props = Map::new();
                props.insert("id".into(), Value::from(s.id));
                props.insert("name".into(), Value::from(s.name.clone()));
                if let Some(line) = &s.line {
                    props.insert("line".into(), Value::from(line.clone()));
                }
                if let Some(v) = &s.long_name {
                    props.insert("long_name".into(), Value::from(v.clone()));
                }
                if let Some(v) = &s.short_name {
                    props.insert("short_name".into(), Value::from(v.clone()));
                }
                if !s.alternate_names.is_empty() {
                    let alts: Vec<Value> =
                        s.alternate_names.iter().map(|a| Value::from(a.clone())).collect();
                    props.insert("alternate_names".into(), Value::Array(alts));
                }
                if let Some(key) = s.cluster_key {
                    props.insert("cluster_key".into(), Value::from(key));
                }
                if let Some(v) = &s.display_name {
                    props.insert("display_name".into(), Value::from(v.clone()));
                }
                if let Some(order) = s.order {
                    props.insert("order".into(), Value::from(order));
                }

                Feature {
                    kind: feature_type(),
                    id: Some(Value::from(s.id)),
                    geometry: s.geometry.as_ref().map(geometry_to_value),
                    properties: props,
                }
            })
            .collect();

        FeatureCollection {
            kind: feature_collection_type(),
            features,
        }
    }
}

fn geometry_to_value(geometry: &Geometry) -> Value {
    let pair = |c: &Coord| Value::from(vec![c.lon, c.lat]);
    match geometry {
        Geometry::Point(c) => serde_json::json!({ "type": "Point", "coordinates": pair(c) }),
        Geometry::Line(coords) => {
            let coords: Vec<Value> = coords.iter().map(pair).collect();
            serde_json::json!({ "type": "LineString", "coordinates": coords })
        }
    }
}
