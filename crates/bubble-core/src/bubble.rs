use crate::catalogue::{CatalogueItem, EntityType};
use crate::constants::*;
use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use smallvec::SmallVec;

pub type BubbleId = u64;

/// One live bubble. Shared fields for every type; `roles` is only populated
/// for person bubbles.
///
/// Units: pixels for position/size, pixels per second for velocity,
/// milliseconds for age/lifespan, degrees for rotation.
#[derive(Clone, Debug, PartialEq)]
pub struct BubbleEntity {
    pub id: BubbleId,
    pub entity_type: EntityType,
    pub content_id: String,
    pub name: String,
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: f32,
    pub color: [f32; 3],
    pub base_opacity: f32,
    pub opacity: f32,
    pub age: f64,
    pub lifespan: f64,
    pub related_count: u32,
    pub rotation: f32,
    pub scale: f32,
    pub animated_opacity: f32,
    pub time_offset: f32,
    pub disappearing: bool,
    pub marked_for_deletion: bool,
    pub roles: SmallVec<[EntityType; 3]>,
}

impl Default for BubbleEntity {
    fn default() -> Self {
        Self {
            id: 0,
            entity_type: EntityType::Song,
            content_id: String::new(),
            name: String::new(),
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            size: 0.0,
            color: SONG_COLOR,
            base_opacity: BASE_OPACITY,
            opacity: BASE_OPACITY,
            age: 0.0,
            lifespan: 0.0,
            related_count: 0,
            rotation: 0.0,
            scale: 1.0,
            animated_opacity: 1.0,
            time_offset: 0.0,
            disappearing: false,
            marked_for_deletion: false,
            roles: SmallVec::new(),
        }
    }
}

impl BubbleEntity {
    /// Return to the pristine state while keeping string allocations.
    pub fn reset(&mut self) {
        let mut content_id = std::mem::take(&mut self.content_id);
        let mut name = std::mem::take(&mut self.name);
        content_id.clear();
        name.clear();
        *self = Self {
            content_id,
            name,
            ..Self::default()
        };
    }

    /// Bind catalogue content; keeps existing string buffers.
    pub fn assign_content(&mut self, item: &CatalogueItem) {
        self.entity_type = item.entity_type;
        self.content_id.clear();
        self.content_id.push_str(&item.id);
        self.name.clear();
        self.name.push_str(&item.name);
        self.related_count = item.related_count;
        self.roles.clear();
        self.roles.extend(item.roles.iter().copied());
        self.color = item.entity_type.base_color();
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.size * 0.5
    }

    /// Point-in-circle test against the currently rendered (scaled) radius.
    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        let r = self.radius() * self.scale.max(0.0);
        self.position.distance_squared(point) <= r * r
    }

    /// Whether the bubble's disc lies entirely outside a `width`×`height` canvas.
    pub fn is_outside(&self, width: f32, height: f32) -> bool {
        let r = self.radius();
        !self.position.is_finite()
            || self.position.x + r < 0.0
            || self.position.y + r < 0.0
            || self.position.x - r > width
            || self.position.y - r > height
    }

    pub fn instance(&self) -> BubbleInstance {
        BubbleInstance {
            center: self.position.to_array(),
            radius: self.radius() * self.scale,
            rotation: self.rotation,
            color: [self.color[0], self.color[1], self.color[2], self.opacity],
        }
    }
}

/// Packed per-bubble render data for GPU/JS upload.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct BubbleInstance {
    pub center: [f32; 2],
    pub radius: f32,
    pub rotation: f32,
    pub color: [f32; 4],
}

/// Linear map of related count over [0, 20] onto [min_size, max_size].
#[inline]
pub fn size_for_related_count(related_count: u32, min_size: f32, max_size: f32) -> f32 {
    let t = (related_count as f32 / RELATED_COUNT_FOR_MAX_SIZE).clamp(0.0, 1.0);
    (min_size + (max_size - min_size) * t).clamp(min_size, max_size)
}

/// Stable phase offset (seconds) derived from a bubble id.
#[inline]
pub fn id_time_offset(id: BubbleId) -> f32 {
    let mixed = id.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    ((mixed >> 40) as f32 / (1u64 << 24) as f32) * 100.0
}

/// Per-entity noise seed in [0, 1000), decorrelated from the time offset.
#[inline]
pub fn id_noise_seed(id: BubbleId) -> f32 {
    let mixed = (id ^ 0xD1B5_4A32_D192_ED03).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    ((mixed >> 40) as f32 / (1u64 << 24) as f32) * 1000.0
}

/// Reflect off the canvas walls: the offending velocity component is flipped
/// to point inward and damped, and the position is clamped so the disc sits
/// inside the canvas.
pub fn resolve_boundary_collision(bubble: &mut BubbleEntity, width: f32, height: f32) {
    let r = bubble.radius();
    let max_x = (width - r).max(r);
    let max_y = (height - r).max(r);

    if bubble.position.x < r {
        bubble.position.x = r;
        bubble.velocity.x = (bubble.velocity.x.abs() * BOUNDARY_DAMPING).max(MIN_REBOUND_SPEED);
    } else if bubble.position.x > max_x {
        bubble.position.x = max_x;
        bubble.velocity.x = -(bubble.velocity.x.abs() * BOUNDARY_DAMPING).max(MIN_REBOUND_SPEED);
    }

    if bubble.position.y < r {
        bubble.position.y = r;
        bubble.velocity.y = (bubble.velocity.y.abs() * BOUNDARY_DAMPING).max(MIN_REBOUND_SPEED);
    } else if bubble.position.y > max_y {
        bubble.position.y = max_y;
        bubble.velocity.y = -(bubble.velocity.y.abs() * BOUNDARY_DAMPING).max(MIN_REBOUND_SPEED);
    }
}
