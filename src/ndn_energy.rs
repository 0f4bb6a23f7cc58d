// Node energy: battery source, derived thresholds, and the per-node capability
//
// Capacity is reported in ampere-hours. The Li-ion source keeps its state in
// joules and converts with a 3.6 V nominal cell voltage.

use std::cell::RefCell;
use std::rc::Rc;

/// Joules stored in one ampere-hour at 3.6 V
pub const JOULES_PER_AMP_HOUR: f64 = 3.6 * 3600.0;

/// Nominal capacity every threshold is derived from
pub const DEFAULT_INITIAL_CAPACITY_AH: f64 = 2.45;

/// Below this share of the initial capacity a node only relays a short radius
pub const HIGH_THRESHOLD_FRACTION: f64 = 0.35;

/// Below this share of the initial capacity a node hands everything to offload
pub const CRITICAL_THRESHOLD_FRACTION: f64 = 0.20;

/// Something that reports how much charge a node has left
pub trait EnergySource {
    /// Remaining capacity in Ah, never negative
    fn remaining_capacity(&self) -> f64;
}

/// Li-ion style source with linear depletion
#[derive(Debug, Clone)]
pub struct LiIonBattery {
    initial_energy_j: f64,
    remaining_energy_j: f64,
}

impl LiIonBattery {
    pub fn new(initial_energy_j: f64) -> Self {
        let initial_energy_j = initial_energy_j.max(0.0);
        Self {
            initial_energy_j,
            remaining_energy_j: initial_energy_j,
        }
    }

    pub fn initial_energy(&self) -> f64 {
        self.initial_energy_j
    }

    pub fn remaining_energy(&self) -> f64 {
        self.remaining_energy_j
    }

    pub fn is_depleted(&self) -> bool {
        self.remaining_energy_j <= 0.0
    }

    /// Take `joules` out of the battery, saturating at zero. Returns what was
    /// actually drawn.
    pub fn drain(&mut self, joules: f64) -> f64 {
        let drawn = joules.max(0.0).min(self.remaining_energy_j);
        self.remaining_energy_j -= drawn;
        drawn
    }
}

impl EnergySource for LiIonBattery {
    fn remaining_capacity(&self) -> f64 {
        self.remaining_energy_j / JOULES_PER_AMP_HOUR
    }
}

/// Point-in-time copy of a node's energy figures
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EnergyReading {
    pub remaining: f64,
    pub high_threshold: f64,
    pub critical_threshold: f64,
}

impl EnergyReading {
    pub fn is_critical(&self) -> bool {
        self.remaining > 0.0 && self.remaining <= self.critical_threshold
    }

    pub fn is_degraded(&self) -> bool {
        self.remaining <= self.high_threshold
    }
}

/// Energy tracker for one node
///
/// Thresholds are fixed at construction from the nominal initial capacity;
/// the remaining capacity is read live from the source on every call.
pub struct EnergyState {
    source: Rc<RefCell<dyn EnergySource>>,
    initial_capacity: f64,
    high_threshold: f64,
    critical_threshold: f64,
}

impl EnergyState {
    pub fn new(source: Rc<RefCell<dyn EnergySource>>, initial_capacity: f64) -> Self {
        Self::with_thresholds(
            source,
            initial_capacity,
            HIGH_THRESHOLD_FRACTION,
            CRITICAL_THRESHOLD_FRACTION,
        )
    }

    pub fn with_thresholds(
        source: Rc<RefCell<dyn EnergySource>>,
        initial_capacity: f64,
        high_fraction: f64,
        critical_fraction: f64,
    ) -> Self {
        Self {
            source,
            initial_capacity,
            high_threshold: initial_capacity * high_fraction,
            critical_threshold: initial_capacity * critical_fraction,
        }
    }

    pub fn initial_capacity(&self) -> f64 {
        self.initial_capacity
    }

    pub fn high_threshold(&self) -> f64 {
        self.high_threshold
    }

    pub fn critical_threshold(&self) -> f64 {
        self.critical_threshold
    }

    pub fn remaining_capacity(&self) -> f64 {
        self.source.borrow().remaining_capacity()
    }

    pub fn percent_remaining(&self) -> u8 {
        percent_of(self.remaining_capacity(), self.initial_capacity)
    }

    pub fn reading(&self) -> EnergyReading {
        EnergyReading {
            remaining: self.remaining_capacity(),
            high_threshold: self.high_threshold,
            critical_threshold: self.critical_threshold,
        }
    }
}

/// `round(remaining / initial * 100)`, clamped to 0..=100
pub fn percent_of(remaining: f64, initial: f64) -> u8 {
    if initial <= 0.0 || !remaining.is_finite() {
        return 0;
    }
    (remaining / initial * 100.0).round().clamp(0.0, 100.0) as u8
}

/// What a node knows about its own energy, resolved once when the node is built
pub enum NodeEnergy {
    /// No energy source attached (wired or infrastructure node)
    Unconstrained,
    Battery(EnergyState),
}

impl NodeEnergy {
    pub fn state(&self) -> Option<&EnergyState> {
        match self {
            NodeEnergy::Unconstrained => None,
            NodeEnergy::Battery(state) => Some(state),
        }
    }

    pub fn reading(&self) -> Option<EnergyReading> {
        self.state().map(EnergyState::reading)
    }

    pub fn remaining_capacity(&self) -> Option<f64> {
        self.state().map(EnergyState::remaining_capacity)
    }
}
