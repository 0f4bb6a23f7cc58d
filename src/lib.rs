//! # ndn-offload - energy-aware forwarding across two interfaces
//!
//! Node-local decision engine for forwarding named-data requests over a
//! short-range broadcast interface (cheap, ad-hoc WiFi) and a long-range
//! offload interface (LTE-like), while the node's battery drains.
//!
//! ## Core Components
//!
//! - **EnergyState / NodeEnergy**: remaining capacity and the two thresholds
//!   (35 % and 20 % of the nominal capacity) a node's behaviour switches on
//! - **OffloadStrategy**: per-request priority chain choosing at most one
//!   face, or dropping
//! - **EnergySampler / DelayTracer**: energy samples on 60 s boundaries and
//!   completion delay rows, written as CSV
//! - **TracerRegistry**: owns the installed delay tracers and their sinks
//!
//! ## Usage with a Forwarding Substrate
//!
//! The crate does not move packets. You need to:
//! 1. Implement [`Forwarder`] for your substrate (candidate faces, scope
//!    check, transmission)
//! 2. Build an [`OffloadNode`] per node with its energy capability
//! 3. Call `node.on_request_arrival(...)` for every incoming request
//! 4. Feed completion events to a [`TracerRegistry`]
//!
//! ```no_run
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use ndn_offload::{LiIonBattery, OffloadNode, OffloadStrategy, StrategyConfig};
//!
//! let config = StrategyConfig::default();
//! let battery = Rc::new(RefCell::new(LiIonBattery::new(31752.0)));
//! let node = OffloadNode::new(
//!     0,
//!     OffloadNode::battery(battery.clone(), &config),
//!     OffloadStrategy::new(&config),
//! );
//!
//! // In your event loop:
//! // - node.on_request_arrival(now, in_face, &request, &pending, &mut forwarder)
//! // - battery.borrow_mut().drain(joules) as the radios transmit
//! ```
//!
//! ## Simulation
//!
//! The `scenario_runner` binary in `simulator/` drives a population of
//! nodes from a YAML scenario file and writes the telemetry CSVs.

pub mod ndn_config;
pub mod ndn_energy;
pub mod ndn_interface;
pub mod ndn_node;
pub mod ndn_strategy;
pub mod ndn_telemetry;
pub mod ndn_tracers;

// Re-export commonly used types
pub use ndn_config::{StrategyConfig, TelemetryConfig};
pub use ndn_energy::{EnergySource, EnergyState, LiIonBattery, NodeEnergy};
pub use ndn_interface::{
    AppId, FaceId, FaceRole, Forwarder, NodeId, PendingEntry, Request, RequestMetadata, SeqNo,
    SimTime,
};
pub use ndn_node::OffloadNode;
pub use ndn_strategy::{Decision, DecisionCounters, DropReason, OffloadStrategy, StrategyError};
pub use ndn_telemetry::{
    CsvSink, DelayKind, DelayRecord, EnergySample, EnergySampler, TelemetryError, TelemetrySink,
};
pub use ndn_tracers::TracerRegistry;
