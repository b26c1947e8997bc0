use bytemuck::{Pod, Zeroable};
use derive_more::Constructor;
use serde::{Deserialize, Serialize};

/// Longitude/latitude pair in degrees.
///
/// `#[repr(C)]` so a `&[Position]` can be viewed as interleaved `f32`s.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Constructor, Pod, Zeroable, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

const PHASE_STEP: f32 = 0.1;
const SPEED_BASE: f32 = 0.5;
const SPEED_STEP: f32 = 0.25;
const RADIUS_BASE: f32 = 0.002;
const RADIUS_STEP: f32 = 0.001;

/// Circular motion parameters of one entity, a pure function of its index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationProfile {
    pub phase: f32,
    pub speed: f32,
    pub radius: f32,
}

impl AnimationProfile {
    pub fn for_index(index: u32) -> Self {
        Self {
            phase: index as f32 * PHASE_STEP,
            speed: SPEED_BASE + (index % 7) as f32 * SPEED_STEP,
            radius: RADIUS_BASE + (index % 5) as f32 * RADIUS_STEP,
        }
    }

    /// Offset from the base position after `elapsed_secs`.
    #[inline]
    pub fn offset_at(&self, elapsed_secs: f32) -> (f32, f32) {
        let angle = self.phase + elapsed_secs * self.speed;
        (self.radius * angle.cos(), self.radius * angle.sin())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: u32,
    pub base: Position,
    pub profile: AnimationProfile,
}

/// Rectangle the generator samples positions from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl Default for Bounds {
    /// Roughly a 40 km box, wide enough that points do not pile up at low zoom.
    fn default() -> Self {
        Self { min_x: 13.1, max_x: 13.7, min_y: 52.3, max_y: 52.7 }
    }
}

impl Bounds {
    pub fn is_valid(&self) -> bool {
        self.min_x.is_finite()
            && self.max_x.is_finite()
            && self.min_y.is_finite()
            && self.max_y.is_finite()
            && self.min_x < self.max_x
            && self.min_y < self.max_y
    }
}

/// Immutable point collection generated for a `(count, seed)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workload {
    seed: u64,
    entities: Vec<Entity>,
}

impl Workload {
    pub(crate) fn from_entities(seed: u64, entities: Vec<Entity>) -> Self {
        Self { seed, entities }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn base_positions(&self) -> impl ExactSizeIterator<Item = Position> + '_ {
        self.entities.iter().map(|e| e.base)
    }

    /// Writes animated positions for `elapsed_secs` into `buffer`.
    ///
    /// The buffer only grows when the entity count changes, so repeated
    /// calls during a measurement allocate nothing.
    pub fn animate_into(&self, elapsed_secs: f32, buffer: &mut AnimationBuffer) {
        let positions = buffer.prepare(self.entities.len());
        for (slot, entity) in positions.iter_mut().zip(&self.entities) {
            let (dx, dy) = entity.profile.offset_at(elapsed_secs);
            slot.x = entity.base.x + dx;
            slot.y = entity.base.y + dy;
        }
    }
}

/// Scratch storage for per-frame positions, reused across ticks.
#[derive(Debug, Default)]
pub struct AnimationBuffer {
    positions: Vec<Position>,
    resizes: usize,
}

impl AnimationBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn prepare(&mut self, len: usize) -> &mut [Position] {
        if self.positions.len() != len {
            self.positions.resize(len, Position::default());
            self.resizes += 1;
        }
        &mut self.positions
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// How many times the backing storage had to change length.
    pub fn resize_count(&self) -> usize {
        self.resizes
    }

    /// Drops the backing storage.
    pub fn release(&mut self) {
        self.positions = Vec::new();
        self.resizes = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_follows_index() {
        let p = AnimationProfile::for_index(12);
        assert!((p.phase - 1.2).abs() < 1e-6);
        assert!((p.speed - (0.5 + 5.0 * 0.25)).abs() < 1e-6);
        assert!((p.radius - (0.002 + 2.0 * 0.001)).abs() < 1e-6);
    }

    #[test]
    fn positions_view_as_interleaved_floats() {
        let positions = [Position::new(1.0, 2.0), Position::new(3.0, 4.0)];
        let floats: &[f32] = bytemuck::cast_slice(&positions);
        assert_eq!(floats, &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn buffer_reuses_storage_for_same_count() {
        let workload = Workload::from_entities(
            1,
            (0..3)
                .map(|i| Entity {
                    id: i,
                    base: Position::new(i as f32, 0.0),
                    profile: AnimationProfile::for_index(i),
                })
                .collect(),
        );
        let mut buffer = AnimationBuffer::new();
        workload.animate_into(0.0, &mut buffer);
        workload.animate_into(1.0, &mut buffer);
        workload.animate_into(2.0, &mut buffer);
        assert_eq!(buffer.resize_count(), 1);
        assert_eq!(buffer.positions().len(), 3);
    }
}
