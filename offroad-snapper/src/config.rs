use serde::Deserialize;

use crate::LineStyle;

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct Config {
    /// A click further than this from where the road network snaps it is off-road
    pub off_road_threshold_meters: f64,
    pub connector_style: LineStyle,
    pub route_weight: u32,
    /// Routes are coloured by the order they were drawn in, cycling through this
    pub route_palette: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            off_road_threshold_meters: 10.0,
            connector_style: LineStyle {
                color: "#FF0000".to_string(),
                weight: 3,
                opacity: 0.8,
            },
            route_weight: 6,
            route_palette: [
                "#007bff", "#28a745", "#dc3545", "#ffc107", "#17a2b8", "#6f42c1", "#e83e8c",
                "#fd7e14",
            ]
            .into_iter()
            .map(|x| x.to_string())
            .collect(),
        }
    }
}

impl Config {
    pub fn route_style(&self, ordinal: usize) -> LineStyle {
        let color = if self.route_palette.is_empty() {
            "#007bff".to_string()
        } else {
            self.route_palette[ordinal % self.route_palette.len()].clone()
        };
        LineStyle {
            color,
            weight: self.route_weight,
            opacity: 1.0,
        }
    }
}
