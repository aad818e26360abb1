use std::collections::BTreeMap;

use route_record::LatLng;

use crate::MarkerHandle;

/// Stable identity of a checkpoint for the life of a session. Never reused, even after a reset.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct CheckpointId(pub u32);

#[derive(Clone, Debug)]
pub struct Checkpoint {
    pub position: LatLng,
    pub off_road: bool,
    /// Where the road network snapped this point. Only kept for off-road checkpoints.
    pub snapped_point: Option<LatLng>,
    pub marker: MarkerHandle,
}

impl Checkpoint {
    pub fn on_road(&self) -> bool {
        !self.off_road && self.snapped_point.is_none()
    }
}

/// Every live checkpoint. Iteration follows creation order, which is also the order checkpoints
/// are numbered and routed in.
#[derive(Default)]
pub struct Checkpoints {
    entities: BTreeMap<CheckpointId, Checkpoint>,
    next_id: u32,
}

impl Checkpoints {
    pub fn insert(&mut self, checkpoint: Checkpoint) -> CheckpointId {
        let id = CheckpointId(self.next_id);
        self.next_id += 1;
        self.entities.insert(id, checkpoint);
        id
    }

    pub fn remove(&mut self, id: CheckpointId) -> Option<Checkpoint> {
        self.entities.remove(&id)
    }

    pub fn get(&self, id: CheckpointId) -> Option<&Checkpoint> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: CheckpointId) -> Option<&mut Checkpoint> {
        self.entities.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CheckpointId, &Checkpoint)> {
        self.entities.iter().map(|(id, cp)| (*id, cp))
    }

    pub fn ids(&self) -> Vec<CheckpointId> {
        self.entities.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// The first checkpoint at the same physical point
    pub fn find(&self, pos: LatLng) -> Option<CheckpointId> {
        self.iter()
            .find(|(_, cp)| cp.position.same_point(&pos))
            .map(|(id, _)| id)
    }

    pub fn positions(&self) -> Vec<LatLng> {
        self.entities.values().map(|cp| cp.position).collect()
    }

    /// Removes everything. IDs keep counting up.
    pub fn clear(&mut self) -> Vec<Checkpoint> {
        std::mem::take(&mut self.entities).into_values().collect()
    }
}
