//! What a grid cell can hold.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentKind};

/// Consumable resource families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Food,
    Water,
}

impl ResourceKind {
    /// Units a freshly placed resource holds.
    #[must_use]
    pub const fn initial_units(self) -> u32 {
        match self {
            Self::Food => 30,
            Self::Water => 300,
        }
    }
}

/// A depletable pile of food or water.
#[derive(Debug)]
pub struct Resource {
    kind: ResourceKind,
    units: AtomicU32,
}

impl Resource {
    #[must_use]
    pub fn new(kind: ResourceKind) -> Self {
        Self::with_units(kind, kind.initial_units())
    }

    #[must_use]
    pub fn with_units(kind: ResourceKind, units: u32) -> Self {
        Self {
            kind,
            units: AtomicU32::new(units),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    #[must_use]
    pub fn units(&self) -> u32 {
        self.units.load(Ordering::Acquire)
    }

    /// Take a single unit. Returns `false` once the resource is exhausted.
    pub fn consume(&self) -> bool {
        self.units
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |units| {
                units.checked_sub(1)
            })
            .is_ok()
    }
}

/// Integer code of an occupant as seen by a policy network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum OccupantCode {
    Empty = 0,
    Food = 1,
    Water = 2,
    Survivor = 3,
    Corpse = 4,
    Fighter = 5,
}

impl OccupantCode {
    /// The code as a network input.
    #[must_use]
    pub fn value(self) -> f64 {
        f64::from(self as u8)
    }
}

/// Contents of one grid cell.
#[derive(Debug, Clone, Default)]
pub enum Occupant {
    #[default]
    Empty,
    Resource(Arc<Resource>),
    Agent(Arc<Agent>),
}

impl Occupant {
    #[must_use]
    pub fn food() -> Self {
        Self::Resource(Arc::new(Resource::new(ResourceKind::Food)))
    }

    #[must_use]
    pub fn water() -> Self {
        Self::Resource(Arc::new(Resource::new(ResourceKind::Water)))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    #[must_use]
    pub fn code(&self) -> OccupantCode {
        match self {
            Self::Empty => OccupantCode::Empty,
            Self::Resource(resource) => match resource.kind() {
                ResourceKind::Food => OccupantCode::Food,
                ResourceKind::Water => OccupantCode::Water,
            },
            Self::Agent(agent) if !agent.is_alive() => OccupantCode::Corpse,
            Self::Agent(agent) => match agent.kind() {
                AgentKind::Survivor => OccupantCode::Survivor,
                AgentKind::Fighter { .. } => OccupantCode::Fighter,
            },
        }
    }

    #[must_use]
    pub fn as_agent(&self) -> Option<&Arc<Agent>> {
        match self {
            Self::Agent(agent) => Some(agent),
            _ => None,
        }
    }

    /// The resource held here, if it is of `kind`.
    #[must_use]
    pub fn as_resource(&self, kind: ResourceKind) -> Option<&Arc<Resource>> {
        match self {
            Self::Resource(resource) if resource.kind() == kind => Some(resource),
            _ => None,
        }
    }

    /// The agent held here, if it is still alive.
    #[must_use]
    pub fn living_agent(&self) -> Option<&Arc<Agent>> {
        self.as_agent().filter(|agent| agent.is_alive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_stops_at_zero() {
        let water = Resource::with_units(ResourceKind::Water, 2);
        assert!(water.consume());
        assert!(water.consume());
        assert!(!water.consume());
        assert_eq!(water.units(), 0);
    }

    #[test]
    fn resource_codes() {
        assert_eq!(Occupant::Empty.code().value(), 0.0);
        assert_eq!(Occupant::food().code(), OccupantCode::Food);
        assert_eq!(Occupant::water().code().value(), 2.0);
        assert!(Occupant::food().as_resource(ResourceKind::Water).is_none());
    }
}
