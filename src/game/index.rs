//! Bucket grid answering "which cells have their centre in this box".

use std::collections::HashMap;

use crate::game::entity::EntityId;
use crate::game::physics::{BoundingBox, Position};

type BucketKey = (i64, i64);

#[derive(Debug, Clone)]
pub struct GridIndex {
    cell_size: f64,
    buckets: HashMap<BucketKey, Vec<EntityId>>,
    entries: HashMap<EntityId, (BucketKey, Position)>,
}

impl GridIndex {
    pub fn new(cell_size: f64) -> Self {
        GridIndex {
            cell_size,
            buckets: HashMap::new(),
            entries: HashMap::new(),
        }
    }

    fn key(&self, p: Position) -> BucketKey {
        (
            (p.x / self.cell_size).floor() as i64,
            (p.y / self.cell_size).floor() as i64,
        )
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, id: EntityId, position: Position) {
        self.remove(id);
        let key = self.key(position);
        self.buckets.entry(key).or_default().push(id);
        self.entries.insert(id, (key, position));
    }

    pub fn update(&mut self, id: EntityId, position: Position) {
        self.insert(id, position);
    }

    pub fn remove(&mut self, id: EntityId) {
        let Some((key, _)) = self.entries.remove(&id) else {
            return;
        };
        if let Some(bucket) = self.buckets.get_mut(&key) {
            bucket.retain(|&other| other != id);
            if bucket.is_empty() {
                self.buckets.remove(&key);
            }
        }
    }

    /// Ids whose centre lies inside `region`, in ascending id order.
    pub fn query(&self, region: &BoundingBox) -> Vec<EntityId> {
        let (min_x, min_y) = self.key(Position::new(region.left, region.top));
        let (max_x, max_y) = self.key(Position::new(region.right, region.bottom));

        let mut found = Vec::new();
        for bx in min_x..=max_x {
            for by in min_y..=max_y {
                let Some(bucket) = self.buckets.get(&(bx, by)) else {
                    continue;
                };
                found.extend(bucket.iter().copied().filter(|id| {
                    self.entries
                        .get(id)
                        .is_some_and(|(_, position)| region.contains(*position))
                }));
            }
        }
        found.sort_unstable();
        found
    }
}
