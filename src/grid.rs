// Copyright 2025 the Airstroke Authors
// SPDX-License-Identifier: Apache-2.0

//! Uniform 3D bucket hash for proximity queries over control points.
//!
//! Cells are keyed by floor-dividing each coordinate by the cell size.
//! The grid stores `(id, position)` records only — it never owns the
//! control points it indexes — and keeps one invariant: an id present
//! in the reverse map has exactly one record in exactly one bucket.
//!
//! `nearest_within_radius` is a brute-force bounded scan over the cell
//! range covering the query sphere, not a true k-NN structure. Cell
//! counts in range stay small for realistic snap radii.

use glam::Vec3;
use std::collections::HashMap;
use uuid::Uuid;

/// Integer cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CellKey {
    x: i32,
    y: i32,
    z: i32,
}

/// Spatial bucket hash over point records.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cells: HashMap<CellKey, Vec<(Uuid, Vec3)>>,
    id_to_cell: HashMap<Uuid, CellKey>,
    cell_size: f32,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cells: HashMap::new(),
            id_to_cell: HashMap::new(),
            cell_size,
        }
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.id_to_cell.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_cell.is_empty()
    }

    fn key_for(&self, position: Vec3) -> CellKey {
        CellKey {
            x: (position.x / self.cell_size).floor() as i32,
            y: (position.y / self.cell_size).floor() as i32,
            z: (position.z / self.cell_size).floor() as i32,
        }
    }

    /// Index a point under `id`. Re-inserting an id moves its record,
    /// preserving the one-bucket-entry invariant.
    pub fn insert(&mut self, id: Uuid, position: Vec3) {
        if self.id_to_cell.contains_key(&id) {
            self.remove(id);
        }
        let key = self.key_for(position);
        self.cells.entry(key).or_default().push((id, position));
        self.id_to_cell.insert(id, key);
    }

    /// Index a batch of records.
    pub fn insert_all(&mut self, records: impl IntoIterator<Item = (Uuid, Vec3)>) {
        for (id, position) in records {
            self.insert(id, position);
        }
    }

    /// Drop the record for `id`, if present. Empty buckets are removed.
    pub fn remove(&mut self, id: Uuid) {
        let Some(key) = self.id_to_cell.remove(&id) else {
            return;
        };
        if let Some(bucket) = self.cells.get_mut(&key) {
            bucket.retain(|(entry_id, _)| *entry_id != id);
            if bucket.is_empty() {
                self.cells.remove(&key);
            }
        }
    }

    /// Drop a batch of records.
    pub fn remove_all(&mut self, ids: impl IntoIterator<Item = Uuid>) {
        for id in ids {
            self.remove(id);
        }
    }

    /// Closest indexed point within `radius` of `query`, or `None`.
    ///
    /// Scans every cell in the inclusive range covering the query
    /// sphere, tracking a running minimum seeded at `radius²`.
    pub fn nearest_within_radius(&self, query: Vec3, radius: f32) -> Option<Vec3> {
        let mut min_distance_squared = radius * radius;
        let mut closest = None;

        let min_key = self.key_for(query - Vec3::splat(radius));
        let max_key = self.key_for(query + Vec3::splat(radius));

        for x in min_key.x..=max_key.x {
            for y in min_key.y..=max_key.y {
                for z in min_key.z..=max_key.z {
                    let Some(bucket) = self.cells.get(&CellKey { x, y, z }) else {
                        continue;
                    };
                    for (_, position) in bucket {
                        let distance_squared = query.distance_squared(*position);
                        if distance_squared < min_distance_squared {
                            min_distance_squared = distance_squared;
                            closest = Some(*position);
                        }
                    }
                }
            }
        }

        closest
    }

    /// Number of bucket records matching `id` (invariant: 0 or 1).
    #[cfg(test)]
    fn bucket_entries(&self, id: Uuid) -> usize {
        self.cells
            .values()
            .flat_map(|bucket| bucket.iter())
            .filter(|(entry_id, _)| *entry_id == id)
            .count()
    }
}
