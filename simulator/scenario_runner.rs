// Scenario Runner - Load and execute offload scenario YAML files
//
// Usage:
//   cargo run --bin scenario_runner scenarios/manhattan_50.yaml
//   cargo run --bin scenario_runner scenarios/  (runs all .yaml files in directory)
//   cargo run --bin scenario_runner scenarios/manhattan_50.yaml --seed 0x1234...

mod offload;

use log::LevelFilter;
use offload::{OffloadSimConfig, OffloadSimRunner};
use simple_logger::SimpleLogger;
use std::env;
use std::fs;
use std::path::Path;

/// Scenario file format
#[derive(Debug, serde::Deserialize)]
struct ScenarioFile {
    /// Scenario metadata
    #[serde(default)]
    meta: ScenarioMeta,

    /// Overrides of the default configuration
    #[serde(default)]
    config: OffloadSimConfig,
}

#[derive(Debug, Default, serde::Deserialize)]
struct ScenarioMeta {
    name: Option<String>,
    description: Option<String>,
    hypothesis: Option<String>,
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <scenario.yaml | directory/> [--seed SEED_HEX]", args[0]);
        eprintln!("\nExamples:");
        eprintln!("  {} scenarios/manhattan_50.yaml", args[0]);
        eprintln!("  {} scenarios/", args[0]);
        eprintln!("  {} scenarios/manhattan_50.yaml --seed 0x123456...", args[0]);
        std::process::exit(1);
    }

    // Per-scenario verbosity is applied through the global max level
    if let Err(e) = SimpleLogger::new().with_level(LevelFilter::Trace).init() {
        eprintln!("Logger setup failed: {}", e);
    }

    let path = Path::new(&args[1]);

    // Parse optional seed
    let seed: Option<[u8; 32]> = if args.len() >= 4 && args[2] == "--seed" {
        Some(parse_seed_hex(&args[3]))
    } else {
        None
    };

    if path.is_file() {
        run_scenario_file(path, seed);
    } else if path.is_dir() {
        run_scenario_directory(path, seed);
    } else {
        eprintln!("Error: Path does not exist: {}", path.display());
        std::process::exit(1);
    }
}

fn run_scenario_directory(dir: &Path, seed: Option<[u8; 32]>) {
    let mut scenarios = Vec::new();

    // Find all .yaml files
    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            let ext = path.extension().and_then(|s| s.to_str());
            if ext == Some("yaml") || ext == Some("yml") {
                scenarios.push(path);
            }
        }
    }

    scenarios.sort();

    if scenarios.is_empty() {
        eprintln!("No .yaml files found in {}", dir.display());
        std::process::exit(1);
    }

    println!("\n╔════════════════════════════════════════════════════════╗");
    println!("║  SCENARIO RUNNER - Multiple Scenarios                  ║");
    println!("╚════════════════════════════════════════════════════════╝\n");
    println!("Found {} scenario(s) to run\n", scenarios.len());

    for (i, scenario_path) in scenarios.iter().enumerate() {
        println!("\n{}/{} Running: {}\n", i + 1, scenarios.len(), scenario_path.display());
        run_scenario_file(scenario_path, seed);
    }

    println!("\n╔════════════════════════════════════════════════════════╗");
    println!("║  All scenarios complete!                               ║");
    println!("╚════════════════════════════════════════════════════════╝\n");
}

fn run_scenario_file(path: &Path, seed: Option<[u8; 32]>) {
    println!("Loading scenario from: {}", path.display());

    // Load and parse YAML
    let yaml_content = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Failed to read {}: {}", path.display(), e);
        std::process::exit(1);
    });

    let scenario: ScenarioFile = serde_yaml::from_str(&yaml_content).unwrap_or_else(|e| {
        eprintln!("Failed to parse {}: {}", path.display(), e);
        std::process::exit(1);
    });

    // Print scenario header
    let title = scenario.meta.name.clone().unwrap_or_else(|| {
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("unnamed");
        format!("Scenario: {}", stem)
    });
    println!("\n╔════════════════════════════════════════════════════════╗");
    println!("║  {}{}║", title, " ".repeat(54_usize.saturating_sub(title.chars().count())));
    println!("╚════════════════════════════════════════════════════════╝\n");

    if let Some(ref desc) = scenario.meta.description {
        println!("{}\n", desc);
    }

    if let Some(ref hypothesis) = scenario.meta.hypothesis {
        println!("Hypothesis:");
        println!("  {}\n", hypothesis);
    }

    let mut config = scenario.config;
    config.seed = seed;

    log::set_max_level(if config.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });

    println!("Configuration:");
    println!("  Duration: {} s", config.duration_s);
    println!(
        "  Nodes: {} mobile, {} depot(s)",
        config.mobile_nodes, config.infrastructure_nodes
    );
    println!(
        "  Start charge: {}-{}% of {:.0} J",
        config.battery.min_start_percent,
        config.battery.max_start_percent,
        config.battery.full_energy_j
    );
    println!(
        "  Hop limits: degraded={}, healthy={}",
        config.strategy.degraded_hop_limit, config.strategy.healthy_hop_limit
    );
    println!(
        "  Telemetry: energy={}, delays={}",
        config.telemetry.energy_file.as_deref().unwrap_or("off"),
        config.telemetry.delay_file.as_deref().unwrap_or("off")
    );
    println!("\nStarting simulation...\n");

    // Run simulation
    let runner = OffloadSimRunner::new(config);
    let result = runner.run();

    // Print results
    result.print_summary();

    println!("\n✓ Scenario complete!\n");
}

fn parse_seed_hex(hex: &str) -> [u8; 32] {
    let hex = hex.strip_prefix("0x").unwrap_or(hex);
    let mut seed = [0u8; 32];

    for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
        if i >= 32 {
            break;
        }
        let byte = std::str::from_utf8(chunk)
            .ok()
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .unwrap_or_else(|| {
                eprintln!("Invalid hex seed: {}", hex);
                std::process::exit(1);
            });
        seed[i] = byte;
    }

    seed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seed_hex() {
        let seed = parse_seed_hex("0x0a0B");
        assert_eq!(seed[0], 0x0a);
        assert_eq!(seed[1], 0x0b);
        assert!(seed[2..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_scenario_file_overrides() {
        let yaml = "
meta:
  name: small
config:
  duration_s: 10
  mobile_nodes: 3
  strategy:
    healthy_hop_limit: 4
  telemetry:
    energy_file: ~
";
        let scenario: ScenarioFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(scenario.meta.name.as_deref(), Some("small"));
        assert_eq!(scenario.config.duration_s, 10);
        assert_eq!(scenario.config.mobile_nodes, 3);
        assert_eq!(scenario.config.infrastructure_nodes, 4);
        assert_eq!(scenario.config.strategy.healthy_hop_limit, 4);
        assert_eq!(scenario.config.strategy.degraded_hop_limit, 3);
        assert_eq!(scenario.config.telemetry.energy_file, None);
        assert_eq!(scenario.config.battery.full_energy_j, 31752.0);
    }
}
