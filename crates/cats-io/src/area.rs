//! Service-area boundaries.
//!
//! The boundary is read from GeoJSON in lon/lat order. Every polygon found in
//! the document is gathered into a single [`MultiPolygon`] so that utilities
//! with non-contiguous territory select from all of their pieces.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use cats_core::CatsError;
use geo::{Area, Coord, Intersects, LineString, MultiPolygon, Point, Polygon};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct ServiceArea {
    pub name: String,
    pub shape: MultiPolygon<f64>,
}

impl ServiceArea {
    /// Build an area from polygons, rejecting empty or zero-area shapes.
    pub fn new(name: impl Into<String>, shape: MultiPolygon<f64>) -> Result<Self, CatsError> {
        let name = name.into();
        if shape.0.is_empty() {
            return Err(CatsError::Config(format!(
                "service area '{name}' contains no polygons"
            )));
        }
        let area = shape.unsigned_area();
        if !area.is_finite() || area <= 0.0 {
            return Err(CatsError::Config(format!(
                "service area '{name}' is degenerate (area {area})"
            )));
        }
        Ok(Self { name, shape })
    }

    /// Whether the bus at (`lon`, `lat`) lies inside or on the boundary.
    pub fn contains_point(&self, lon: f64, lat: f64) -> bool {
        self.shape.intersects(&Point::new(lon, lat))
    }

    /// Whether a polyline touches the area anywhere along its length.
    pub fn intersects_path(&self, path: &[[f64; 2]]) -> bool {
        match path {
            [] => false,
            [only] => self.contains_point(only[0], only[1]),
            _ => {
                let line: LineString<f64> = path
                    .iter()
                    .map(|&[x, y]| Coord { x, y })
                    .collect::<Vec<_>>()
                    .into();
                self.shape.intersects(&line)
            }
        }
    }

    pub fn unsigned_area(&self) -> f64 {
        self.shape.unsigned_area()
    }
}

/// Read a GeoJSON `FeatureCollection`, `Feature`, `Polygon` or `MultiPolygon`.
pub fn load_service_area(path: &Path) -> Result<ServiceArea> {
    let text = fs::read_to_string(path).with_context(|| format!("opening {}", path.display()))?;
    let document: Value =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    let mut polygons = Vec::new();
    collect_polygons(&document, &mut polygons)
        .with_context(|| format!("reading geometry from {}", path.display()))?;
    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("service-area")
        .to_string();
    Ok(ServiceArea::new(name, MultiPolygon::new(polygons))?)
}

fn collect_polygons(value: &Value, out: &mut Vec<Polygon<f64>>) -> Result<()> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("GeoJSON object without a 'type'"))?;
    match kind {
        "FeatureCollection" => {
            let features = value
                .get("features")
                .and_then(Value::as_array)
                .ok_or_else(|| anyhow!("FeatureCollection without 'features'"))?;
            for feature in features {
                collect_polygons(feature, out)?;
            }
        }
        "Feature" => match value.get("geometry") {
            Some(Value::Null) | None => {}
            Some(geometry) => collect_polygons(geometry, out)?,
        },
        "GeometryCollection" => {
            if let Some(geometries) = value.get("geometries").and_then(Value::as_array) {
                for geometry in geometries {
                    collect_polygons(geometry, out)?;
                }
            }
        }
        "Polygon" => out.push(parse_polygon(coordinates(value)?)?),
        "MultiPolygon" => {
            let parts = coordinates(value)?
                .as_array()
                .ok_or_else(|| anyhow!("MultiPolygon coordinates must be an array"))?;
            for part in parts {
                out.push(parse_polygon(part)?);
            }
        }
        // points and lines carry no area
        _ => {}
    }
    Ok(())
}

fn coordinates(value: &Value) -> Result<&Value> {
    value
        .get("coordinates")
        .ok_or_else(|| anyhow!("geometry without 'coordinates'"))
}

fn parse_polygon(rings: &Value) -> Result<Polygon<f64>> {
    let rings = rings
        .as_array()
        .ok_or_else(|| anyhow!("polygon coordinates must be an array of rings"))?;
    let mut parsed = rings.iter().map(parse_ring);
    let exterior = parsed
        .next()
        .ok_or_else(|| anyhow!("polygon without an exterior ring"))??;
    let interiors = parsed.collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn parse_ring(ring: &Value) -> Result<LineString<f64>> {
    let positions = ring
        .as_array()
        .ok_or_else(|| anyhow!("ring must be an array of positions"))?;
    let mut coords = Vec::with_capacity(positions.len());
    for position in positions {
        let pair = position.as_array().filter(|pair| pair.len() >= 2);
        let (x, y) = match pair.map(|pair| (pair[0].as_f64(), pair[1].as_f64())) {
            Some((Some(x), Some(y))) => (x, y),
            _ => bail!("invalid position {position}"),
        };
        coords.push(Coord { x, y });
    }
    Ok(LineString::new(coords))
}
