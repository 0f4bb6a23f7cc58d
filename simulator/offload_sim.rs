// Offload Simulator Example: sweep the healthy flood radius

mod offload;

use offload::{OffloadSimConfig, OffloadSimRunner};

fn main() {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Warn)
        .init()
        .ok();

    println!("╔════════════════════════════════════════════════════════╗");
    println!("║    Offload Simulator - Flood Radius Sweep              ║");
    println!("╚════════════════════════════════════════════════════════╝\n");

    let seed = [42u8; 32];

    println!(
        "{:>6}  {:>10}  {:>10}  {:>10}  {:>10}  {:>9}",
        "radius", "satisfied", "broadcast", "offload", "dropped", "avg batt"
    );
    for radius in 2..=7 {
        let mut config = OffloadSimConfig::default();
        config.duration_s = 600;
        config.mobile_nodes = 30;
        config.seed = Some(seed);
        config.strategy.healthy_hop_limit = radius;
        config.strategy.degraded_hop_limit = radius.min(3);
        // Telemetry files are not needed for the sweep
        config.telemetry.energy_file = None;
        config.telemetry.delay_file = None;

        let result = OffloadSimRunner::new(config).run();
        println!(
            "{:>6}  {:>9.1}%  {:>10}  {:>10}  {:>10}  {:>8.1}%",
            radius,
            result.traffic.satisfaction_ratio() * 100.0,
            result.traffic.broadcast_transmissions,
            result.traffic.offload_transmissions,
            result.decisions.dropped(),
            result.energy.percent_remaining.2
        );
    }

    println!("\n✓ Sweep complete!\n");
}
