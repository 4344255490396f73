//! # Component System
//!
//! Components are pure data containers with no behavior. The set of kinds is
//! fixed at compile time: each [`ComponentKind`] owns one bit of a
//! [`ComponentMask`] and declares which kinds must already be attached before
//! it can be added. The reverse relation (which kinds block removal) is
//! derived from that table at compile time, so the two can never disagree.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use bytemuck::{Pod, Zeroable};

use super::entity::EntityId;
use super::storage::{ComponentTable, ComponentTables};
use crate::math::{Quaternion, Vec3};

/// Tag for every declared component kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ComponentKind {
    /// World-space position.
    Position = 0,
    /// Linear velocity. Requires Position.
    Velocity = 1,
    /// World-space rotation.
    Orientation = 2,
    /// Angular velocity. Requires Orientation.
    AngularVelocity = 3,
    /// Non-uniform scale with an animation baseline.
    Scale = 4,
    /// Time-driven scale animation. Requires Scale.
    ScalarMultFunc = 5,
    /// Rigid body description. Requires Position and Orientation.
    Physics = 6,
    /// Keyboard-driven movement. Requires Velocity and Orientation.
    WasdControls = 7,
    /// Mouse-look. Requires Orientation.
    MouseControls = 8,
}

impl ComponentKind {
    /// Number of declared kinds.
    pub const COUNT: usize = 9;

    /// Every kind, in bit order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Position,
        Self::Velocity,
        Self::Orientation,
        Self::AngularVelocity,
        Self::Scale,
        Self::ScalarMultFunc,
        Self::Physics,
        Self::WasdControls,
        Self::MouseControls,
    ];

    /// Bit index of this kind.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Position => "Position",
            Self::Velocity => "Velocity",
            Self::Orientation => "Orientation",
            Self::AngularVelocity => "AngularVelocity",
            Self::Scale => "Scale",
            Self::ScalarMultFunc => "ScalarMultFunc",
            Self::Physics => "Physics",
            Self::WasdControls => "WasdControls",
            Self::MouseControls => "MouseControls",
        }
    }

    /// Kinds that must be attached before this kind can be added.
    #[must_use]
    pub const fn required(self) -> ComponentMask {
        use ComponentKind as K;
        match self {
            K::Position | K::Orientation | K::Scale => ComponentMask::EMPTY,
            K::Velocity => ComponentMask::of(K::Position),
            K::AngularVelocity | K::MouseControls => ComponentMask::of(K::Orientation),
            K::ScalarMultFunc => ComponentMask::of(K::Scale),
            K::Physics => ComponentMask::of(K::Position).with(K::Orientation),
            K::WasdControls => ComponentMask::of(K::Velocity).with(K::Orientation),
        }
    }

    /// Kinds that, while attached, block removal of this kind.
    #[inline]
    #[must_use]
    pub const fn dependents(self) -> ComponentMask {
        DEPENDENTS[self.index()]
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inverse of [`ComponentKind::required`], computed once at compile time.
const DEPENDENTS: [ComponentMask; ComponentKind::COUNT] = derive_dependents();

const fn derive_dependents() -> [ComponentMask; ComponentKind::COUNT] {
    let mut out = [ComponentMask::EMPTY; ComponentKind::COUNT];
    let mut dependent = 0;
    while dependent < ComponentKind::COUNT {
        let required = ComponentKind::ALL[dependent].required().bits();
        let mut prerequisite = 0;
        while prerequisite < ComponentKind::COUNT {
            if required & (1 << prerequisite) != 0 {
                out[prerequisite] = ComponentMask(out[prerequisite].0 | (1 << dependent));
            }
            prerequisite += 1;
        }
        dependent += 1;
    }
    out
}

/// Bitset of component kinds.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ComponentMask(u32);

impl ComponentMask {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Every declared kind.
    pub const ALL: Self = Self((1 << ComponentKind::COUNT) - 1);

    /// A mask holding exactly one kind.
    #[inline]
    #[must_use]
    pub const fn of(kind: ComponentKind) -> Self {
        Self(1 << kind as u32)
    }

    /// Builds a mask from a list of kinds.
    #[must_use]
    pub const fn from_kinds(kinds: &[ComponentKind]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < kinds.len() {
            bits |= 1 << kinds[i] as u32;
            i += 1;
        }
        Self(bits)
    }

    /// Raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// This mask plus `kind`.
    #[inline]
    #[must_use]
    pub const fn with(self, kind: ComponentKind) -> Self {
        Self(self.0 | Self::of(kind).0)
    }

    /// This mask minus `kind`.
    #[inline]
    #[must_use]
    pub const fn without(self, kind: ComponentKind) -> Self {
        Self(self.0 & !Self::of(kind).0)
    }

    /// Whether `kind` is in the set.
    #[inline]
    #[must_use]
    pub const fn contains(self, kind: ComponentKind) -> bool {
        self.0 & Self::of(kind).0 != 0
    }

    /// Whether every kind in `other` is also in `self`.
    #[inline]
    #[must_use]
    pub const fn contains_all(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether the sets share any kind.
    #[inline]
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Kinds in `self` but not in `other`.
    #[inline]
    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Whether the set is empty.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of kinds in the set.
    #[inline]
    #[must_use]
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// Iterates the kinds in bit order.
    pub fn kinds(self) -> impl Iterator<Item = ComponentKind> {
        ComponentKind::ALL.into_iter().filter(move |kind| self.contains(*kind))
    }
}

impl From<ComponentKind> for ComponentMask {
    fn from(kind: ComponentKind) -> Self {
        Self::of(kind)
    }
}

impl BitOr for ComponentMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOr<ComponentKind> for ComponentMask {
    type Output = Self;
    fn bitor(self, rhs: ComponentKind) -> Self {
        self.with(rhs)
    }
}

impl BitOr for ComponentKind {
    type Output = ComponentMask;
    fn bitor(self, rhs: Self) -> ComponentMask {
        ComponentMask::of(self).with(rhs)
    }
}

impl BitOrAssign<ComponentKind> for ComponentMask {
    fn bitor_assign(&mut self, rhs: ComponentKind) {
        *self = self.with(rhs);
    }
}

impl BitAnd for ComponentMask {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Display for ComponentMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, kind) in self.kinds().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            f.write_str(kind.name())?;
        }
        f.write_str("}")
    }
}

impl fmt::Debug for ComponentMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentMask{self}")
    }
}

/// Marker trait tying a payload type to its kind and table.
///
/// Implemented for every payload by the table declaration in
/// [`storage`](super::storage); the set of kinds is closed.
pub trait Component: Sized + 'static {
    /// The kind tag for this payload.
    const KIND: ComponentKind;

    /// This payload's table.
    fn table(tables: &ComponentTables) -> &ComponentTable<Self>;

    /// This payload's table, mutably.
    fn table_mut(tables: &mut ComponentTables) -> &mut ComponentTable<Self>;
}

/// Position component for entities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Position {
    /// World-space coordinates.
    pub vec: Vec3,
    /// Padding for alignment (ensures 16-byte rows for uploads).
    pub _padding: f32,
}

impl Position {
    /// Creates a new position.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            vec: Vec3::new(x, y, z),
            _padding: 0.0,
        }
    }
}

/// Velocity component for entities.
///
/// Represents movement speed in world units per second.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Velocity {
    /// Units per second along each axis.
    pub vec: Vec3,
    /// Padding for alignment.
    pub _padding: f32,
}

impl Velocity {
    /// Creates a new velocity.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            vec: Vec3::new(x, y, z),
            _padding: 0.0,
        }
    }
}

/// Orientation component.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Orientation {
    /// Unit rotation from model to world space.
    pub quat: Quaternion,
}

impl Orientation {
    /// Creates an orientation from a rotation.
    #[must_use]
    pub const fn new(quat: Quaternion) -> Self {
        Self { quat }
    }
}

/// Angular velocity as a rotation vector: axis scaled by radians per second.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct AngularVelocity {
    /// Rotation axis times angular speed.
    pub omega: Vec3,
    /// Padding for alignment.
    pub _padding: f32,
}

impl AngularVelocity {
    /// Creates an angular velocity from a rotation vector.
    #[must_use]
    pub const fn new(omega: Vec3) -> Self {
        Self { omega, _padding: 0.0 }
    }
}

/// Scale component.
///
/// `last_vec` is the baseline that animations multiply against; `vec` is the
/// value renderers read.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Scale {
    /// Current scale.
    pub vec: Vec3,
    /// Animation baseline.
    pub last_vec: Vec3,
}

impl Scale {
    /// Creates a scale whose baseline equals its current value.
    #[must_use]
    pub const fn new(vec: Vec3) -> Self {
        Self { vec, last_vec: vec }
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self::new(Vec3::ONE)
    }
}

/// Scale animation: maps the baseline and elapsed milliseconds to a scale.
#[derive(Clone, Copy, Debug)]
pub struct ScalarMultFunc {
    /// The animation curve.
    pub func: fn(Vec3, u32) -> Vec3,
}

impl ScalarMultFunc {
    /// Wraps an animation curve.
    #[must_use]
    pub const fn new(func: fn(Vec3, u32) -> Vec3) -> Self {
        Self { func }
    }

    /// Evaluates the curve.
    #[must_use]
    pub fn mult_by_func_of_time(&self, base: Vec3, time_ms: u32) -> Vec3 {
        (self.func)(base, time_ms)
    }
}

/// Collision shape description for a [`Physics`] component.
#[derive(Clone, Debug, PartialEq)]
pub enum CollisionGeometry {
    /// Sphere of the given radius.
    Sphere {
        /// Radius in world units.
        radius: f32,
    },
    /// Infinite static plane.
    Plane,
    /// Convex hull over a point cloud.
    Mesh {
        /// Hull points in model space.
        points: Vec<Vec3>,
    },
}

/// Opaque handle to a body owned by an external physics engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub u32);

/// Rigid body description.
///
/// The physics engine itself lives outside the state container; the body
/// handle is filled in by whichever system discovers the entity.
#[derive(Clone, Debug, PartialEq)]
pub struct Physics {
    /// Mass in kilograms; 0 means static.
    pub mass: f32,
    /// Collision shape.
    pub geometry: CollisionGeometry,
    /// Engine-side body, once created.
    pub body: Option<BodyHandle>,
}

impl Physics {
    /// Creates a body description with no engine-side body yet.
    #[must_use]
    pub const fn new(mass: f32, geometry: CollisionGeometry) -> Self {
        Self {
            mass,
            geometry,
            body: None,
        }
    }
}

/// How WASD input is turned into movement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ControlStyle {
    /// Movement relative to the target's full orientation.
    #[default]
    Free,
    /// Movement in the horizontal plane, yaw only.
    RotateAboutZ,
}

/// Keyboard-driven movement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WasdControls {
    /// Entity whose orientation defines "forward" (may be the entity itself).
    pub orienter: EntityId,
    /// Movement style.
    pub style: ControlStyle,
    /// Requested acceleration in the orienter's frame, units per second squared.
    pub accel: Vec3,
}

impl WasdControls {
    /// Creates controls with no input applied yet.
    #[must_use]
    pub const fn new(orienter: EntityId, style: ControlStyle) -> Self {
        Self {
            orienter,
            style,
            accel: Vec3::ZERO,
        }
    }
}

/// Mouse-look settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MouseControls {
    /// Invert horizontal look.
    pub invert_x: bool,
    /// Invert vertical look.
    pub invert_y: bool,
}

impl MouseControls {
    /// Creates mouse-look settings.
    #[must_use]
    pub const fn new(invert_x: bool, invert_y: bool) -> Self {
        Self { invert_x, invert_y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependents_invert_required() {
        for kind in ComponentKind::ALL {
            for other in ComponentKind::ALL {
                assert_eq!(
                    kind.required().contains(other),
                    other.dependents().contains(kind),
                    "{kind} / {other}"
                );
            }
        }
        assert_eq!(
            ComponentKind::Position.dependents(),
            ComponentKind::Velocity | ComponentKind::Physics
        );
        assert!(ComponentKind::MouseControls.dependents().is_empty());
    }

    #[test]
    fn test_mask_operations() {
        let mask = ComponentKind::Position | ComponentKind::Velocity;
        assert!(mask.contains(ComponentKind::Position));
        assert!(!mask.contains(ComponentKind::Scale));
        assert!(mask.contains_all(ComponentMask::of(ComponentKind::Velocity)));
        assert!(mask.contains_all(ComponentMask::EMPTY));
        assert_eq!(
            mask.without(ComponentKind::Position),
            ComponentMask::of(ComponentKind::Velocity)
        );
        assert_eq!(mask.len(), 2);
        assert_eq!(
            ComponentMask::from_kinds(&[ComponentKind::Position, ComponentKind::Velocity]),
            mask
        );
        assert_eq!(mask.to_string(), "{Position|Velocity}");
        assert_eq!(ComponentMask::ALL.len() as usize, ComponentKind::COUNT);
    }

    #[test]
    fn test_component_sizes() {
        // Ensure 16-byte rows for the vector components
        assert_eq!(std::mem::size_of::<Position>(), 16);
        assert_eq!(std::mem::size_of::<Velocity>(), 16);
        assert_eq!(std::mem::size_of::<Orientation>(), 16);
        assert_eq!(std::mem::size_of::<Scale>(), 24);
    }

    #[test]
    fn test_scalar_mult_func() {
        fn double(base: Vec3, _time: u32) -> Vec3 {
            base * 2.0
        }
        let func = ScalarMultFunc::new(double);
        assert_eq!(func.mult_by_func_of_time(Vec3::ONE, 0), Vec3::new(2.0, 2.0, 2.0));
    }
}
