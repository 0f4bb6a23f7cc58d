// Offload Simulator Configuration

use ndn_offload::{SimTime, StrategyConfig, TelemetryConfig};
use serde::Deserialize;

const MICROS_PER_MILLI: SimTime = 1_000;

/// Configuration for an offload simulation
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OffloadSimConfig {
    /// Simulated duration (seconds)
    pub duration_s: u64,

    /// Random seed (None = generate random)
    #[serde(skip)]
    pub seed: Option<[u8; 32]>,

    /// Battery-powered nodes that both request and relay content
    pub mobile_nodes: usize,

    /// Mains-powered depots, broadcast face only
    pub infrastructure_nodes: usize,

    pub battery: BatteryConfig,
    pub consumer: ConsumerConfig,
    pub radio: RadioConfig,
    pub strategy: StrategyConfig,
    pub telemetry: TelemetryConfig,

    /// Debug-level logging of every forwarding decision
    pub verbose: bool,
}

/// How the batteries start and drain
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatteryConfig {
    /// Full-charge energy (J); 31752 J is 2.45 Ah at 3.6 V
    pub full_energy_j: f64,

    /// Each node starts at a uniformly drawn share of full charge
    pub min_start_percent: u8,
    pub max_start_percent: u8,

    /// Constant draw while the node is up (W)
    pub idle_power_w: f64,

    /// Re-read tracer power levels this often (None = keep the level read
    /// at installation)
    pub refresh_power_level_s: Option<u64>,
}

/// Request generation on every mobile node
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConsumerConfig {
    /// One new request per period, issued on period boundaries
    pub request_period_ms: u64,

    /// Retransmit when no data arrived within this
    pub retx_timeout_ms: u64,

    /// Give up after this many retransmissions
    pub max_retransmissions: u32,

    /// Distinct content names requested
    pub catalog_size: u32,
}

/// Link behaviour of both interfaces
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    /// Energy per transmission (J)
    pub broadcast_tx_j: f64,
    pub offload_tx_j: f64,

    /// Nodes within broadcast range of a transmission
    pub broadcast_neighbors: usize,

    /// Per-receiver loss on the broadcast face
    pub broadcast_loss: f64,

    /// One-hop latency on the broadcast face
    pub broadcast_hop_delay_ms: u64,

    /// Round trip through the offload network to the content origin
    pub offload_delay_ms: u64,

    /// Share of offloaded requests that come back with data
    pub offload_success: f64,

    /// Chance a mobile relay already holds the content
    pub mobile_cache_hit: f64,

    /// Chance a depot already holds the content
    pub depot_cache_hit: f64,
}

impl OffloadSimConfig {
    pub fn duration(&self) -> SimTime {
        self.duration_s * ndn_offload::ndn_interface::MICROS_PER_SECOND
    }
}

impl ConsumerConfig {
    pub fn request_period(&self) -> SimTime {
        self.request_period_ms * MICROS_PER_MILLI
    }

    pub fn retx_timeout(&self) -> SimTime {
        self.retx_timeout_ms * MICROS_PER_MILLI
    }
}

impl RadioConfig {
    pub fn broadcast_hop_delay(&self) -> SimTime {
        self.broadcast_hop_delay_ms * MICROS_PER_MILLI
    }

    pub fn offload_delay(&self) -> SimTime {
        self.offload_delay_ms * MICROS_PER_MILLI
    }
}

impl Default for OffloadSimConfig {
    fn default() -> Self {
        Self {
            duration_s: 2000,
            seed: None,
            mobile_nodes: 50,
            infrastructure_nodes: 4,
            battery: BatteryConfig::default(),
            consumer: ConsumerConfig::default(),
            radio: RadioConfig::default(),
            strategy: StrategyConfig::default(),
            telemetry: TelemetryConfig::default(),
            verbose: false,
        }
    }
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            full_energy_j: 31752.0,
            min_start_percent: 5,
            max_start_percent: 100,
            idle_power_w: 1.0,
            refresh_power_level_s: None,
        }
    }
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            request_period_ms: 1000,
            retx_timeout_ms: 2000,
            max_retransmissions: 3,
            catalog_size: 1000,
        }
    }
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            broadcast_tx_j: 0.05,
            offload_tx_j: 0.5,
            broadcast_neighbors: 3,
            broadcast_loss: 0.1,
            broadcast_hop_delay_ms: 5,
            offload_delay_ms: 120,
            offload_success: 0.98,
            mobile_cache_hit: 0.15,
            depot_cache_hit: 0.6,
        }
    }
}
