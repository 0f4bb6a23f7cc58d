// Offload Simulator Statistics

use ndn_offload::DecisionCounters;

// ============================================================================
// Simulation Result
// ============================================================================

/// Complete simulation result
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// Random seed used
    pub seed_used: [u8; 32],

    pub duration_s: u64,
    pub mobile_nodes: usize,
    pub infrastructure_nodes: usize,

    /// Consumer-side outcome
    pub traffic: TrafficStats,

    /// Strategy decisions summed over every node
    pub decisions: DecisionCounters,

    /// Rows that reached the CSV files
    pub telemetry: TelemetryStats,

    /// Battery state at the end of the run
    pub energy: EnergySummary,
}

/// Request traffic seen by the consumers
#[derive(Debug, Clone, Default)]
pub struct TrafficStats {
    pub requests_issued: u64,
    pub satisfied: u64,
    /// Gave up after the last retransmission timed out
    pub abandoned: u64,
    /// Still pending when the run ended
    pub outstanding: usize,
    pub retransmissions: u64,
    pub cache_hits: u64,
    pub broadcast_transmissions: u64,
    pub offload_transmissions: u64,

    // Sums over satisfied requests (µs / hops)
    pub first_delay_total: u64,
    pub last_delay_total: u64,
    pub hop_count_total: u64,
}

#[derive(Debug, Clone, Default)]
pub struct TelemetryStats {
    pub energy_samples: usize,
    pub delay_rows: usize,
}

#[derive(Debug, Clone, Default)]
pub struct EnergySummary {
    pub battery_nodes: usize,
    pub depleted_nodes: usize,
    /// (min, max, avg) remaining percent
    pub percent_remaining: (u8, u8, f64),
}

impl TrafficStats {
    pub fn satisfaction_ratio(&self) -> f64 {
        if self.requests_issued == 0 {
            return 0.0;
        }
        self.satisfied as f64 / self.requests_issued as f64
    }

    /// Mean first-attempt delay (ms)
    pub fn mean_first_delay_ms(&self) -> f64 {
        self.mean(self.first_delay_total) / 1_000.0
    }

    /// Mean delay from the last retransmission (ms)
    pub fn mean_last_delay_ms(&self) -> f64 {
        self.mean(self.last_delay_total) / 1_000.0
    }

    pub fn mean_hop_count(&self) -> f64 {
        self.mean(self.hop_count_total)
    }

    fn mean(&self, total: u64) -> f64 {
        if self.satisfied == 0 {
            return 0.0;
        }
        total as f64 / self.satisfied as f64
    }
}

impl EnergySummary {
    pub fn from_percentages(percentages: &[u8], depleted_nodes: usize) -> Self {
        let Some(&min) = percentages.iter().min() else {
            return Self {
                depleted_nodes,
                ..Self::default()
            };
        };
        let max = percentages.iter().copied().max().unwrap_or(min);
        let avg = percentages.iter().map(|&p| p as f64).sum::<f64>() / percentages.len() as f64;

        Self {
            battery_nodes: percentages.len(),
            depleted_nodes,
            percent_remaining: (min, max, avg),
        }
    }
}

impl SimulationResult {
    /// Print summary to stdout
    pub fn print_summary(&self) {
        println!("\n╔════════════════════════════════════════════════════════╗");
        println!("║        Offload Simulation Results                      ║");
        println!("╚════════════════════════════════════════════════════════╝\n");

        println!("Configuration:");
        println!("  Seed: {}", seed_hex(&self.seed_used));
        println!("  Duration: {} s", self.duration_s);
        println!(
            "  Nodes: {} mobile, {} depot(s)\n",
            self.mobile_nodes, self.infrastructure_nodes
        );

        let t = &self.traffic;
        println!("Requests:");
        println!("  Issued: {}", t.requests_issued);
        println!(
            "  Satisfied: {} ({:.1}%)",
            t.satisfied,
            t.satisfaction_ratio() * 100.0
        );
        println!("  Abandoned: {}", t.abandoned);
        println!("  Outstanding at end: {}", t.outstanding);
        println!("  Retransmissions: {}", t.retransmissions);
        println!("  Answered from relay caches: {}", t.cache_hits);
        println!(
            "  Delay: first={:.1} ms, last={:.1} ms, hops={:.2}",
            t.mean_first_delay_ms(),
            t.mean_last_delay_ms(),
            t.mean_hop_count()
        );
        println!();

        let d = &self.decisions;
        println!("Forwarding Decisions:");
        println!(
            "  Forwarded: {} (broadcast={}, offload={})",
            d.forwarded(),
            d.forwarded_broadcast,
            d.forwarded_offload
        );
        println!("  Dropped: {}", d.dropped());
        println!("    Beyond flood radius: {}", d.dropped_beyond_radius);
        println!("    Missing offload face: {}", d.dropped_missing_offload);
        println!("    No candidates: {}", d.dropped_no_candidates);
        println!("    Scope: {}", d.dropped_scope);
        println!(
            "  Transmissions: broadcast={}, offload={}",
            t.broadcast_transmissions, t.offload_transmissions
        );
        println!();

        let e = &self.energy;
        println!("Energy:");
        println!("  Battery nodes: {}", e.battery_nodes);
        println!("  Depleted: {}", e.depleted_nodes);
        println!(
            "  Remaining: min={}%, max={}%, avg={:.1}%",
            e.percent_remaining.0, e.percent_remaining.1, e.percent_remaining.2
        );
        println!();

        println!("Telemetry:");
        println!("  Energy samples written: {}", self.telemetry.energy_samples);
        println!("  Delay rows written: {}", self.telemetry.delay_rows);
        println!();
    }
}

fn seed_hex(seed: &[u8; 32]) -> String {
    let hex: String = seed.iter().map(|b| format!("{:02x}", b)).collect();
    format!("0x{}", hex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_summary() {
        let summary = EnergySummary::from_percentages(&[10, 80, 30], 1);
        assert_eq!(summary.battery_nodes, 3);
        assert_eq!(summary.depleted_nodes, 1);
        assert_eq!(summary.percent_remaining.0, 10);
        assert_eq!(summary.percent_remaining.1, 80);
        assert!((summary.percent_remaining.2 - 40.0).abs() < 1e-9);

        let empty = EnergySummary::from_percentages(&[], 0);
        assert_eq!(empty.battery_nodes, 0);
    }

    #[test]
    fn test_traffic_means() {
        let stats = TrafficStats {
            requests_issued: 4,
            satisfied: 2,
            first_delay_total: 300_000,
            last_delay_total: 100_000,
            hop_count_total: 5,
            ..TrafficStats::default()
        };
        assert_eq!(stats.satisfaction_ratio(), 0.5);
        assert_eq!(stats.mean_first_delay_ms(), 150.0);
        assert_eq!(stats.mean_last_delay_ms(), 50.0);
        assert_eq!(stats.mean_hop_count(), 2.5);

        assert_eq!(TrafficStats::default().mean_first_delay_ms(), 0.0);
    }

    #[test]
    fn test_seed_hex() {
        let mut seed = [0u8; 32];
        seed[0] = 0xab;
        seed[31] = 0x01;
        let hex = seed_hex(&seed);
        assert!(hex.starts_with("0xab00"));
        assert!(hex.ends_with("01"));
        assert_eq!(hex.len(), 66);
    }
}
