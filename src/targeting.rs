//! Target selection module.
//!
//! Targets are found by casting a ray from the unit along its facing, out to
//! the distance of its range class, against the opposing faction's layer.
//! The ray itself is answered by an external [`CollisionQuery`]; this module
//! only decides where to cast it and what to do with an inactive unit.

use crate::config::RangeDistances;
use crate::entity::EntityHandle;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Weapon reach.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RangeClass {
    #[default]
    Short,
    Medium,
    Long,
}

bitflags! {
    /// Collision layers a scan may hit.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct LayerMask: u8 {
        const PLAYER = 1 << 0;
        const ENEMY  = 1 << 1;
    }
}

/// Horizontal facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    /// `-1.0` for left, `1.0` for right.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Left => -1.0,
            Direction::Right => 1.0,
        }
    }
}

/// Side a unit fights for.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Faction {
    Player,
    Enemy,
}

impl Faction {
    /// Players face right, enemies face left.
    pub fn facing(self) -> Direction {
        match self {
            Faction::Player => Direction::Right,
            Faction::Enemy => Direction::Left,
        }
    }

    /// Layer this faction's units occupy.
    pub fn layer(self) -> LayerMask {
        match self {
            Faction::Player => LayerMask::PLAYER,
            Faction::Enemy => LayerMask::ENEMY,
        }
    }

    pub fn opponent(self) -> Faction {
        match self {
            Faction::Player => Faction::Enemy,
            Faction::Enemy => Faction::Player,
        }
    }

    /// Layer this faction attacks.
    pub fn target_layer(self) -> LayerMask {
        self.opponent().layer()
    }
}

/// World position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A horizontal scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Position,
    pub direction: Direction,
    pub distance: f64,
}

impl Ray {
    /// Far end of the ray.
    pub fn end(&self) -> Position {
        Position::new(
            self.origin.x + self.direction.sign() * self.distance,
            self.origin.y,
        )
    }
}

/// Physics collaborator answering ray queries.
///
/// Implementations return the handles hit along `ray` on any layer in
/// `mask`, nearest first.
pub trait CollisionQuery {
    fn query_along_ray(&self, ray: &Ray, mask: LayerMask) -> Vec<EntityHandle>;
}

/// A query that never hits anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCollisions;

impl CollisionQuery for NoCollisions {
    fn query_along_ray(&self, _ray: &Ray, _mask: LayerMask) -> Vec<EntityHandle> {
        Vec::new()
    }
}

/// Who is scanning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scanner {
    pub active: bool,
    pub position: Position,
    pub faction: Faction,
    pub range: RangeClass,
}

/// Builds rays from a unit's range and faction and forwards them.
///
/// # Examples
///
/// ```rust
/// use wavecore::{
///     CollisionQuery, EntityHandle, Faction, LayerMask, Position, RangeClass, Ray,
///     RangeDistances, Scanner, TargetResolver,
/// };
///
/// struct Wall;
/// impl CollisionQuery for Wall {
///     fn query_along_ray(&self, ray: &Ray, mask: LayerMask) -> Vec<EntityHandle> {
///         assert_eq!(mask, LayerMask::ENEMY);
///         assert_eq!(ray.distance, 3.0);
///         vec![EntityHandle(4)]
///     }
/// }
///
/// let resolver = TargetResolver::new(RangeDistances::default(), 0.25);
/// let archer = Scanner {
///     active: true,
///     position: Position::new(0.0, 0.0),
///     faction: Faction::Player,
///     range: RangeClass::Long,
/// };
/// assert_eq!(resolver.resolve(&archer, &Wall), vec![EntityHandle(4)]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetResolver {
    ranges: RangeDistances,
    ray_height: f64,
}

impl TargetResolver {
    pub fn new(ranges: RangeDistances, ray_height: f64) -> Self {
        Self { ranges, ray_height }
    }

    /// The ray `scanner` would cast.
    pub fn ray_for(&self, scanner: &Scanner) -> Ray {
        Ray {
            origin: Position::new(scanner.position.x, scanner.position.y + self.ray_height),
            direction: scanner.faction.facing(),
            distance: self.ranges.distance(scanner.range),
        }
    }

    /// Candidates in collaborator order. Inactive scanners get nothing and
    /// issue no query.
    pub fn resolve(&self, scanner: &Scanner, query: &dyn CollisionQuery) -> Vec<EntityHandle> {
        if !scanner.active {
            return Vec::new();
        }
        let ray = self.ray_for(scanner);
        let targets = query.query_along_ray(&ray, scanner.faction.target_layer());
        tracing::trace!(
            faction = %scanner.faction,
            distance = ray.distance,
            hits = targets.len(),
            "target scan"
        );
        targets
    }
}
