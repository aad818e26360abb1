use std::collections::HashMap;

use route_record::PointKey;

use crate::{
    CheckpointId, DecodedRoute, DrawingSurface, Event, Resolution, RouteResponse, Session,
};

#[derive(Default, Debug, PartialEq)]
pub struct RestoreReport {
    pub routes: usize,
    /// New checkpoints created
    pub materialized: usize,
    /// Saved checkpoints that were already on the map, from an earlier route or before restoring
    pub reused: usize,
    /// Saved checkpoints without a usable position
    pub skipped: usize,
    /// Connectors on the map once everything's done
    pub connectors: usize,
    /// Off-road checkpoints left with nothing to connect to
    pub unresolved: Vec<CheckpointId>,
}

/// One saved record of an off-road checkpoint that wants a connector
struct Job {
    checkpoint: CheckpointId,
    route: usize,
    index: usize,
}

impl<S: DrawingSurface> Session<S> {
    /// Brings back every saved route, in save order. The passes must run in this order: anchors
    /// may belong to a route later in the list, so nothing is connected until every checkpoint of
    /// every route exists.
    ///
    /// A physical point saved in several routes gets one checkpoint. Restoring the same collection
    /// again adds nothing.
    pub fn restore_all(&mut self, routes: &[DecodedRoute]) -> RestoreReport {
        let mut report = RestoreReport {
            routes: routes.len(),
            ..Default::default()
        };

        let jobs = self.materialize_all(routes, &mut report);
        self.update_marker_labels();

        // Saved anchors from every record get a chance before falling back to the nearest
        // checkpoint, so a shared point's connector saved by a later route isn't lost.
        let mut pending = Vec::new();
        for job in jobs {
            if !self.connect_saved(routes, &job) {
                pending.push(job);
            }
        }
        for job in &pending {
            if !self.connectors.has(job.checkpoint) {
                let candidates = routes[job.route].candidates();
                self.connect_nearest(job.checkpoint, &candidates);
            }
        }

        self.final_sweep(routes, &pending);

        for route in routes {
            let response = RouteResponse::from_geojson(route.response.clone());
            self.draw_route(&response, &route.label);
        }

        report.connectors = self.connectors.len();
        report.unresolved = self
            .checkpoints
            .iter()
            .filter(|(id, cp)| !cp.on_road() && !self.connectors.has(*id))
            .map(|(id, _)| id)
            .collect();
        for id in &report.unresolved {
            if let Some(cp) = self.checkpoints.get(*id) {
                self.observer.emit(&Event::Unresolved {
                    checkpoint: *id,
                    position: cp.position,
                });
            }
        }
        self.observer.emit(&Event::RestoreFinished {
            routes: report.routes,
            checkpoints: self.checkpoints.len(),
            connectors: report.connectors,
            unresolved: report.unresolved.len(),
        });
        report
    }

    fn materialize_all(&mut self, routes: &[DecodedRoute], report: &mut RestoreReport) -> Vec<Job> {
        // Whatever is already on the map counts, so restoring twice doesn't duplicate anything
        let mut known: HashMap<PointKey, CheckpointId> = self
            .checkpoints
            .iter()
            .map(|(id, cp)| (cp.position.key(), id))
            .collect();
        let mut jobs = Vec::new();

        for (route_idx, route) in routes.iter().enumerate() {
            for index in route.malformed() {
                self.observer.emit(&Event::MalformedCheckpoint {
                    route: route_idx,
                    index,
                });
                report.skipped += 1;
            }

            for (index, record) in route.checkpoints() {
                let key = record.position.key();
                // Rounding can split two points within tolerance across neighbouring keys
                let existing = known
                    .get(&key)
                    .copied()
                    .or_else(|| self.checkpoints.find(record.position));
                let id = if let Some(id) = existing {
                    known.insert(key, id);
                    self.observer.emit(&Event::DuplicateCheckpoint {
                        checkpoint: id,
                        route: route_idx,
                        index,
                    });
                    report.reused += 1;
                    if record.off_road() {
                        self.adopt_off_road(id, record.snapped_point);
                    }
                    id
                } else {
                    let id = self.materialize(
                        record.position,
                        record.off_road(),
                        record.snapped_point,
                    );
                    known.insert(key, id);
                    report.materialized += 1;
                    id
                };

                if record.off_road() {
                    jobs.push(Job {
                        checkpoint: id,
                        route: route_idx,
                        index,
                    });
                }
            }
        }
        jobs
    }

    // An existing checkpoint that some saved route knows to be off-road. Anything anchored to it
    // has to find another anchor.
    fn adopt_off_road(&mut self, id: CheckpointId, snapped_point: Option<route_record::LatLng>) {
        let was_on_road = self.checkpoints.get(id).map_or(false, |cp| cp.on_road());
        self.mark_off_road(id, snapped_point);
        if was_on_road {
            for source in self.connectors.targeting(id) {
                self.connectors.disconnect(&mut self.surface, source);
            }
        }
    }

    /// Tries the anchor saved with this record. True if the checkpoint has a connector afterwards.
    fn connect_saved(&mut self, routes: &[DecodedRoute], job: &Job) -> bool {
        if self.connectors.has(job.checkpoint) {
            return true;
        }
        let route = &routes[job.route];
        let Some(record) = route.checkpoint(job.index) else {
            return false;
        };
        let Some(target) = route.saved_anchor(record) else {
            return false;
        };
        let resolution = if record.connector_to_position.is_some() {
            Resolution::SavedPosition
        } else {
            Resolution::SavedIndex
        };

        if let Some(to) = self.checkpoints.find(target) {
            if self.connect(job.checkpoint, to, record.connector_label.as_ref(), resolution) {
                return true;
            }
        }
        self.observer.emit(&Event::SavedAnchorRejected {
            checkpoint: job.checkpoint,
            target,
        });
        false
    }

    // One more attempt at everything still unconnected, including off-road checkpoints that were
    // on the map before restoring and lost their anchor along the way
    fn final_sweep(&mut self, routes: &[DecodedRoute], pending: &[Job]) {
        for job in pending {
            if self.connectors.has(job.checkpoint) {
                continue;
            }
            if !self.connect_saved(routes, job) {
                let candidates = routes[job.route].candidates();
                self.connect_nearest(job.checkpoint, &candidates);
            }
        }

        let unconnected: Vec<CheckpointId> = self
            .checkpoints
            .iter()
            .filter(|(id, cp)| !cp.on_road() && !self.connectors.has(*id))
            .map(|(id, _)| id)
            .collect();
        for id in unconnected {
            self.connect_nearest(id, &[]);
        }
    }
}
