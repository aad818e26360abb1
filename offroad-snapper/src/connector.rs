use std::collections::BTreeMap;

use route_record::{ConnectorLabel, LatLng};

use crate::{distance, CheckpointId, DrawingSurface, LabelHandle, LineHandle, LineStyle};

/// A straight line from an off-road checkpoint to its on-road anchor, plus a distance label.
#[derive(Clone, Debug)]
pub struct Connector {
    pub from: CheckpointId,
    pub to: CheckpointId,
    pub from_position: LatLng,
    pub to_position: LatLng,
    pub distance_meters: f64,
    pub label: ConnectorLabel,
    line: LineHandle,
    label_handle: LabelHandle,
}

impl Connector {
    pub fn line(&self) -> LineHandle {
        self.line
    }

    pub fn label_handle(&self) -> LabelHandle {
        self.label_handle
    }
}

/// Connector label text, rounded to the meter
pub fn format_distance(meters: f64) -> String {
    if meters >= 1000.0 {
        format!("{:.2} km", meters / 1000.0)
    } else {
        format!("{} m", meters.round())
    }
}

/// Owns every connector, keyed by the checkpoint it starts from. A checkpoint starts at most one.
#[derive(Default)]
pub struct Connectors {
    by_source: BTreeMap<CheckpointId, Connector>,
}

impl Connectors {
    /// Draws a connector. If `from` already has one, that one is returned untouched. A saved label
    /// is used as-is; otherwise the label shows the distance at the midpoint.
    pub fn connect<S: DrawingSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        style: &LineStyle,
        from: (CheckpointId, LatLng),
        to: (CheckpointId, LatLng),
        saved_label: Option<&ConnectorLabel>,
    ) -> &Connector {
        if self.by_source.contains_key(&from.0) {
            return &self.by_source[&from.0];
        }

        let distance_meters = distance(from.1, to.1);
        let label = match saved_label {
            Some(saved) if saved.position.is_valid() => saved.clone(),
            _ => ConnectorLabel {
                position: from.1.midpoint(&to.1),
                text: format_distance(distance_meters),
            },
        };

        let line = surface.create_line(&[from.1, to.1], style);
        let label_handle = surface.create_text_label(label.position, &label.text);
        self.by_source.entry(from.0).or_insert(Connector {
            from: from.0,
            to: to.0,
            from_position: from.1,
            to_position: to.1,
            distance_meters,
            label,
            line,
            label_handle,
        })
    }

    /// Removes the line and its label. Fine to call when there's nothing to remove.
    pub fn disconnect<S: DrawingSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        from: CheckpointId,
    ) -> Option<Connector> {
        let connector = self.by_source.remove(&from)?;
        surface.remove_label(connector.label_handle);
        surface.remove_line(connector.line);
        Some(connector)
    }

    pub fn get(&self, from: CheckpointId) -> Option<&Connector> {
        self.by_source.get(&from)
    }

    pub fn has(&self, from: CheckpointId) -> bool {
        self.by_source.contains_key(&from)
    }

    /// Sources of every connector anchored at `to`
    pub fn targeting(&self, to: CheckpointId) -> Vec<CheckpointId> {
        self.by_source
            .values()
            .filter(|c| c.to == to)
            .map(|c| c.from)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connector> {
        self.by_source.values()
    }

    pub fn len(&self) -> usize {
        self.by_source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_source.is_empty()
    }

    pub fn clear<S: DrawingSurface + ?Sized>(&mut self, surface: &mut S) {
        for (_, connector) in std::mem::take(&mut self.by_source) {
            surface.remove_label(connector.label_handle);
            surface.remove_line(connector.line);
        }
    }
}
