// Tunables for the forwarding strategy and the telemetry recorders
//
// Everything has a default matching the reference two-interface scenario, so
// a YAML section only needs to name what it overrides.

use serde::Deserialize;

use crate::ndn_energy::{
    CRITICAL_THRESHOLD_FRACTION, DEFAULT_INITIAL_CAPACITY_AH, HIGH_THRESHOLD_FRACTION,
};
use crate::ndn_interface::{SimTime, MICROS_PER_SECOND};

/// Strategy configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Nominal battery capacity (Ah) the thresholds are derived from
    pub initial_capacity_ah: f64,

    /// Degraded band starts at this share of the initial capacity
    pub high_threshold_fraction: f64,

    /// Critical band starts at this share of the initial capacity
    pub critical_threshold_fraction: f64,

    /// Largest hop count a degraded node still relays
    pub degraded_hop_limit: u32,

    /// Largest hop count a healthy node still relays
    pub healthy_hop_limit: u32,
}

/// Telemetry configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Energy samples are taken on arrivals landing exactly on a multiple of this
    pub sample_interval_s: u64,

    /// Energy sample CSV destination, `-` for stdout, none to disable
    pub energy_file: Option<String>,

    /// Completion delay CSV destination, `-` for stdout, none to disable
    pub delay_file: Option<String>,

    /// Flush the sink after every row
    pub flush_each_row: bool,
}

impl TelemetryConfig {
    pub fn sample_interval(&self) -> SimTime {
        self.sample_interval_s * MICROS_PER_SECOND
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            initial_capacity_ah: DEFAULT_INITIAL_CAPACITY_AH,
            high_threshold_fraction: HIGH_THRESHOLD_FRACTION,
            critical_threshold_fraction: CRITICAL_THRESHOLD_FRACTION,
            degraded_hop_limit: 3,
            healthy_hop_limit: 5,
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            sample_interval_s: 60,
            energy_file: Some("energy_level.txt".to_string()),
            delay_file: Some("app-delays-trace.txt".to_string()),
            flush_each_row: true,
        }
    }
}
