use std::collections::BTreeMap;

use geo::Rect;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry};
use route_record::LatLng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct MarkerHandle(pub u32);
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct LineHandle(pub u32);
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct LabelHandle(pub u32);

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct LineStyle {
    pub color: String,
    pub weight: u32,
    pub opacity: f64,
}

/// Whatever actually puts things on a map. Removing something that's already gone must be
/// harmless.
pub trait DrawingSurface {
    fn create_marker(&mut self, pos: LatLng, label: Option<&str>) -> MarkerHandle;
    fn set_marker_label(&mut self, marker: MarkerHandle, label: &str);
    fn remove_marker(&mut self, marker: MarkerHandle);
    fn create_line(&mut self, points: &[LatLng], style: &LineStyle) -> LineHandle;
    fn remove_line(&mut self, line: LineHandle);
    fn create_text_label(&mut self, pos: LatLng, text: &str) -> LabelHandle;
    fn remove_label(&mut self, label: LabelHandle);
    fn fit_view_to(&mut self, bounds: Rect);
}

#[derive(Clone, Debug)]
pub struct RecordedMarker {
    pub position: LatLng,
    pub label: Option<String>,
}

#[derive(Clone, Debug)]
pub struct RecordedLine {
    pub points: Vec<LatLng>,
    pub style: LineStyle,
}

#[derive(Clone, Debug)]
pub struct RecordedLabel {
    pub position: LatLng,
    pub text: String,
}

/// Keeps everything drawn in memory. Used by the WASM facade (which hands the result to MapLibre
/// as GeoJSON), the debug tool and tests.
#[derive(Default)]
pub struct RecordingSurface {
    next_id: u32,
    markers: BTreeMap<MarkerHandle, RecordedMarker>,
    lines: BTreeMap<LineHandle, RecordedLine>,
    labels: BTreeMap<LabelHandle, RecordedLabel>,
    fitted_bounds: Option<Rect>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn markers(&self) -> impl Iterator<Item = &RecordedMarker> {
        self.markers.values()
    }

    pub fn lines(&self) -> impl Iterator<Item = &RecordedLine> {
        self.lines.values()
    }

    pub fn labels(&self) -> impl Iterator<Item = &RecordedLabel> {
        self.labels.values()
    }

    pub fn marker(&self, marker: MarkerHandle) -> Option<&RecordedMarker> {
        self.markers.get(&marker)
    }

    pub fn line(&self, line: LineHandle) -> Option<&RecordedLine> {
        self.lines.get(&line)
    }

    pub fn label(&self, label: LabelHandle) -> Option<&RecordedLabel> {
        self.labels.get(&label)
    }

    pub fn markers_at(&self, pos: LatLng) -> usize {
        self.markers
            .values()
            .filter(|m| m.position.same_point(&pos))
            .count()
    }

    pub fn fitted_bounds(&self) -> Option<Rect> {
        self.fitted_bounds
    }

    pub fn render_geojson(&self) -> String {
        let mut features = Vec::new();

        for line in self.lines.values() {
            let coords = line.points.iter().map(|pt| vec![pt.lng, pt.lat]).collect();
            let mut f = Feature::from(Geometry::new(geojson::Value::LineString(coords)));
            f.set_property("type", "line");
            f.set_property("color", line.style.color.clone());
            f.set_property("weight", line.style.weight);
            f.set_property("opacity", line.style.opacity);
            features.push(f);
        }
        for marker in self.markers.values() {
            let mut f = Feature::from(point_geometry(marker.position));
            f.set_property("type", "checkpoint");
            f.set_property("label", marker.label.clone());
            features.push(f);
        }
        // Text goes last so it's drawn on top
        for label in self.labels.values() {
            let mut f = Feature::from(point_geometry(label.position));
            f.set_property("type", "label");
            f.set_property("text", label.text.clone());
            features.push(f);
        }

        let gj = GeoJson::from(features.into_iter().collect::<FeatureCollection>());
        gj.to_string()
    }

    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

impl DrawingSurface for RecordingSurface {
    fn create_marker(&mut self, pos: LatLng, label: Option<&str>) -> MarkerHandle {
        let id = MarkerHandle(self.next());
        self.markers.insert(
            id,
            RecordedMarker {
                position: pos,
                label: label.map(|x| x.to_string()),
            },
        );
        id
    }

    fn set_marker_label(&mut self, marker: MarkerHandle, label: &str) {
        if let Some(m) = self.markers.get_mut(&marker) {
            m.label = Some(label.to_string());
        }
    }

    fn remove_marker(&mut self, marker: MarkerHandle) {
        self.markers.remove(&marker);
    }

    fn create_line(&mut self, points: &[LatLng], style: &LineStyle) -> LineHandle {
        let id = LineHandle(self.next());
        self.lines.insert(
            id,
            RecordedLine {
                points: points.to_vec(),
                style: style.clone(),
            },
        );
        id
    }

    fn remove_line(&mut self, line: LineHandle) {
        self.lines.remove(&line);
    }

    fn create_text_label(&mut self, pos: LatLng, text: &str) -> LabelHandle {
        let id = LabelHandle(self.next());
        self.labels.insert(
            id,
            RecordedLabel {
                position: pos,
                text: text.to_string(),
            },
        );
        id
    }

    fn remove_label(&mut self, label: LabelHandle) {
        self.labels.remove(&label);
    }

    fn fit_view_to(&mut self, bounds: Rect) {
        self.fitted_bounds = Some(bounds);
    }
}

fn point_geometry(pt: LatLng) -> Geometry {
    Geometry::new(geojson::Value::Point(vec![pt.lng, pt.lat]))
}
