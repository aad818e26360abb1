use std::fmt;

use anyhow::Result;
use geo::{BoundingRect, Coord, MultiPoint, Point};
use route_record::{ConnectorLabel, LatLng, PairDistance, RouteRecord};

use crate::{
    classify_response, encode, find_nearest_on_road, pairwise_distances, CandidateRecord,
    Checkpoint, CheckpointId, Checkpoints, Config, ConnectorTarget, Connectors,
    DrawingSurface, Event, LabelHandle, LineHandle, LogObserver, Observer, Resolution, Route,
    RouteCheckpoint, RouteResponse, RoutingLookup,
};

/// All the state behind one map: live checkpoints, their connectors, the routes drawn, and the
/// collaborators used to draw them.
pub struct Session<S: DrawingSurface> {
    pub(crate) surface: S,
    pub(crate) config: Config,
    pub(crate) checkpoints: Checkpoints,
    pub(crate) connectors: Connectors,
    pub(crate) routes: Vec<DrawnRoute>,
    // Bumped by reset, so results of lookups started before then are dropped
    generation: u64,
    pub(crate) observer: Box<dyn Observer>,
}

pub struct DrawnRoute {
    pub label: String,
    pub path: Vec<LatLng>,
    line: LineHandle,
    labels: Vec<LabelHandle>,
}

/// A click whose snap-to-road lookup is still in flight
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct PendingClick {
    pub checkpoint: CheckpointId,
    pub position: LatLng,
    generation: u64,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum ClickOutcome {
    OnRoad,
    /// `anchor` is None when there was no on-road checkpoint to connect to
    OffRoad { anchor: Option<CheckpointId> },
    /// The session was reset or the checkpoint removed before the lookup finished
    Discarded,
}

#[derive(Debug)]
pub enum CalculateError {
    TooFewCheckpoints,
    NoRouteFound,
    Lookup(anyhow::Error),
}

impl fmt::Display for CalculateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalculateError::TooFewCheckpoints => write!(f, "Please select at least 2 points"),
            CalculateError::NoRouteFound => write!(f, "No route found"),
            CalculateError::Lookup(err) => write!(f, "Failed to calculate route: {}", err),
        }
    }
}

impl std::error::Error for CalculateError {}

pub struct CalculatedRoute {
    pub response: RouteResponse,
    /// What to persist. Only labelled routes are saved.
    pub record: Option<RouteRecord>,
}

impl<S: DrawingSurface> Session<S> {
    pub fn new(surface: S, config: Config) -> Self {
        Self {
            surface,
            config,
            checkpoints: Checkpoints::default(),
            connectors: Connectors::default(),
            routes: Vec::new(),
            generation: 0,
            observer: Box::new(LogObserver),
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Affects connectors and routes drawn from now on. Existing checkpoints keep their
    /// classification.
    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    pub fn checkpoints(&self) -> &Checkpoints {
        &self.checkpoints
    }

    pub fn connectors(&self) -> &Connectors {
        &self.connectors
    }

    pub fn routes(&self) -> &[DrawnRoute] {
        &self.routes
    }

    /// Places a checkpoint right away. It counts as on-road until `complete_click` gets the snap
    /// result; the caller should look up `snap_query(pending.position)`.
    pub fn begin_click(&mut self, pos: LatLng) -> Option<PendingClick> {
        if !pos.is_valid() {
            return None;
        }
        let checkpoint = self.materialize(pos, false, None);
        Some(PendingClick {
            checkpoint,
            position: pos,
            generation: self.generation,
        })
    }

    /// Applies a snap result against the collections as they are now, which may have changed since
    /// the click.
    pub fn complete_click(
        &mut self,
        pending: PendingClick,
        response: Result<RouteResponse>,
    ) -> ClickOutcome {
        if pending.generation != self.generation || self.checkpoints.get(pending.checkpoint).is_none()
        {
            self.observer.emit(&Event::ClickDiscarded {
                position: pending.position,
            });
            return ClickOutcome::Discarded;
        }

        if let Err(err) = &response {
            self.observer.emit(&Event::SnapFailed {
                position: pending.position,
                error: err.to_string(),
            });
        }
        let classification = classify_response(
            pending.position,
            &response,
            self.config.off_road_threshold_meters,
        );
        if !classification.off_road {
            return ClickOutcome::OnRoad;
        }

        self.mark_off_road(pending.checkpoint, classification.snapped_point);
        // Another click may have picked this one as an anchor while it was still provisional
        let dependents = self.connectors.targeting(pending.checkpoint);
        self.reanchor(dependents);

        let anchor = self.connect_nearest(pending.checkpoint, &[]);
        if anchor.is_none() {
            self.observer.emit(&Event::Unresolved {
                checkpoint: pending.checkpoint,
                position: pending.position,
            });
        }
        ClickOutcome::OffRoad { anchor }
    }

    /// `begin_click` and `complete_click` with a lookup that answers immediately
    pub fn click(&mut self, pos: LatLng, lookup: &dyn RoutingLookup) -> Option<ClickOutcome> {
        let pending = self.begin_click(pos)?;
        let response = lookup.route(&crate::snap_query(pos));
        Some(self.complete_click(pending, response))
    }

    pub fn remove_checkpoint(&mut self, id: CheckpointId) -> bool {
        self.connectors.disconnect(&mut self.surface, id);
        let Some(cp) = self.checkpoints.remove(id) else {
            return false;
        };
        self.surface.remove_marker(cp.marker);

        let dependents = self.connectors.targeting(id);
        self.reanchor(dependents);
        self.update_marker_labels();
        true
    }

    pub fn remove_checkpoint_at(&mut self, pos: LatLng) -> bool {
        match self.checkpoints.find(pos) {
            Some(id) => self.remove_checkpoint(id),
            None => false,
        }
    }

    /// Clears everything off the map. Lookups still in flight will be discarded.
    pub fn reset(&mut self) {
        self.connectors.clear(&mut self.surface);
        for cp in self.checkpoints.clear() {
            self.surface.remove_marker(cp.marker);
        }
        for route in self.routes.drain(..) {
            self.surface.remove_line(route.line);
            for label in route.labels {
                self.surface.remove_label(label);
            }
        }
        self.generation += 1;
    }

    /// Numbers markers 1, 2, 3... in checkpoint order
    pub fn update_marker_labels(&mut self) {
        for (idx, (_, cp)) in self.checkpoints.iter().enumerate() {
            self.surface
                .set_marker_label(cp.marker, &(idx + 1).to_string());
        }
    }

    pub fn pairwise_distances(&self) -> Vec<PairDistance> {
        pairwise_distances(&self.checkpoints.positions())
    }

    /// Routes through every checkpoint in order and draws the result. A non-empty label means the
    /// route should be saved, so the record to store comes back too.
    pub fn calculate_route(
        &mut self,
        lookup: &dyn RoutingLookup,
        label: &str,
    ) -> std::result::Result<CalculatedRoute, CalculateError> {
        if self.checkpoints.len() < 2 {
            return Err(CalculateError::TooFewCheckpoints);
        }
        let response = lookup
            .route(&self.checkpoints.positions())
            .map_err(CalculateError::Lookup)?;
        if !response.has_geometry() {
            return Err(CalculateError::NoRouteFound);
        }

        let label = label.trim();
        self.draw_route(&response, label);
        let record = if label.is_empty() {
            None
        } else {
            Some(encode(&self.build_route(label, response.raw.clone())))
        };
        Ok(CalculatedRoute { response, record })
    }

    /// Draws a route's path, with its label at a quarter, half and three quarters of the way
    /// along, then fits the view to every route. Returns false if there's no path to draw.
    pub fn draw_route(&mut self, response: &RouteResponse, label: &str) -> bool {
        let path = response.path();
        if path.is_empty() {
            return false;
        }
        if self
            .routes
            .iter()
            .any(|r| r.label == label && r.path == path)
        {
            return true;
        }

        let style = self.config.route_style(self.routes.len());
        let line = self.surface.create_line(&path, &style);
        let mut labels = Vec::new();
        if !label.is_empty() {
            for fraction in [0.25, 0.5, 0.75] {
                let idx = (path.len() as f64 * fraction).floor() as usize;
                if idx < path.len() {
                    labels.push(self.surface.create_text_label(path[idx], label));
                }
            }
        }
        self.routes.push(DrawnRoute {
            label: label.to_string(),
            path,
            line,
            labels,
        });

        let all_points: MultiPoint = self
            .routes
            .iter()
            .flat_map(|r| r.path.iter())
            .map(|pt| Point::from(Coord::from(*pt)))
            .collect();
        if let Some(bounds) = all_points.bounding_rect() {
            self.surface.fit_view_to(bounds);
        }
        true
    }

    /// Snapshot of the live checkpoints as a route, ready to encode
    pub fn build_route(&self, label: &str, response: serde_json::Value) -> Route {
        let checkpoints = self
            .checkpoints
            .iter()
            .map(|(id, cp)| RouteCheckpoint {
                position: cp.position,
                off_road: !cp.on_road(),
                snapped_point: cp.snapped_point,
                connector: self.connectors.get(id).map(|c| ConnectorTarget {
                    position: c.to_position,
                    label: Some(c.label.clone()),
                }),
            })
            .collect();

        Route {
            label: label.to_string(),
            response,
            distances: self.pairwise_distances(),
            checkpoints,
        }
    }

    pub(crate) fn materialize(
        &mut self,
        position: LatLng,
        off_road: bool,
        snapped_point: Option<LatLng>,
    ) -> CheckpointId {
        let number = (self.checkpoints.len() + 1).to_string();
        let marker = self.surface.create_marker(position, Some(&number));
        let id = self.checkpoints.insert(Checkpoint {
            position,
            off_road,
            snapped_point: if off_road { snapped_point } else { None },
            marker,
        });
        self.observer.emit(&Event::CheckpointMaterialized {
            checkpoint: id,
            position,
            off_road,
        });
        id
    }

    pub(crate) fn mark_off_road(&mut self, id: CheckpointId, snapped_point: Option<LatLng>) {
        if let Some(cp) = self.checkpoints.get_mut(id) {
            cp.off_road = true;
            if cp.snapped_point.is_none() {
                cp.snapped_point = snapped_point;
            }
        }
    }

    /// Draws a connector if `from` is off-road, `to` is on-road, and `from` doesn't have one yet
    pub(crate) fn connect(
        &mut self,
        from: CheckpointId,
        to: CheckpointId,
        saved_label: Option<&ConnectorLabel>,
        resolution: Resolution,
    ) -> bool {
        if from == to || self.connectors.has(from) {
            return false;
        }
        let (Some(from_cp), Some(to_cp)) = (self.checkpoints.get(from), self.checkpoints.get(to))
        else {
            return false;
        };
        if from_cp.on_road() || !to_cp.on_road() {
            return false;
        }
        let (from_pos, to_pos) = (from_cp.position, to_cp.position);

        let distance_meters = self
            .connectors
            .connect(
                &mut self.surface,
                &self.config.connector_style,
                (from, from_pos),
                (to, to_pos),
                saved_label,
            )
            .distance_meters;
        self.observer.emit(&Event::Connected {
            from,
            to,
            distance_meters,
            resolution,
        });
        true
    }

    /// Connects `id` to the nearest on-road checkpoint, also considering `records`
    pub(crate) fn connect_nearest(
        &mut self,
        id: CheckpointId,
        records: &[CandidateRecord],
    ) -> Option<CheckpointId> {
        let from = self.checkpoints.get(id)?.position;
        let anchor = find_nearest_on_road(from, Some(id), &self.checkpoints, records)?;
        let to = anchor.checkpoint?;
        self.connect(id, to, None, Resolution::Nearest).then_some(to)
    }

    // Connectors whose anchor went away or stopped being on-road get pointed somewhere valid
    fn reanchor(&mut self, sources: Vec<CheckpointId>) {
        for source in sources {
            self.connectors.disconnect(&mut self.surface, source);
            if self.connect_nearest(source, &[]).is_none() {
                if let Some(cp) = self.checkpoints.get(source) {
                    self.observer.emit(&Event::Unresolved {
                        checkpoint: source,
                        position: cp.position,
                    });
                }
            }
        }
    }
}
