//! random-channel-status CLI: generate random bad-channel maps.
//!
//! Usage:
//!   --config=<file>          JSON parameter set ({"BadChanFrac": .., "Mode": .., "Seed": ..})
//!   --frac=<F>               Bad channel fraction (overrides the parameter set)
//!   --mode=<M>               channels | APAs | chips (overrides the parameter set)
//!   --seed=<N>               Generator seed (default: random)
//!
//! Geometry options:
//!   --cryostats=<N>          Number of cryostats (default: 1)
//!   --tpcs=<N>               TPCs per cryostat (default: 12)
//!   --wires=U,V,W            Wires per plane (default: 800,800,960)
//!   --shared-induction       Pair TPCs so their U and V wires share channels
//!
//! Output:
//!   --variations=<N>         Number of independent maps (default: 1)
//!   --output=<path>          Write variations as JSON

use std::collections::HashMap;

use detvar_core::RegularGeometry;
use random_channel_status::{run_variations, ConfigError, Mode, SamplingConfig};

struct CliConfig {
    sampling: SamplingConfig,
    geometry: RegularGeometry,
    variations: usize,
    output: Option<String>,
}

fn parse_opts() -> HashMap<String, String> {
    std::env::args()
        .skip(1)
        .filter_map(|arg| {
            let arg = arg.strip_prefix("--")?;
            match arg.split_once('=') {
                Some((k, v)) => Some((k.to_string(), v.to_string())),
                None => Some((arg.to_string(), String::new())),
            }
        })
        .collect()
}

fn parse_u32(opts: &HashMap<String, String>, key: &str, default: u32) -> u32 {
    opts.get(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_wires(opts: &HashMap<String, String>, default: [u32; 3]) -> [u32; 3] {
    let parsed: Vec<u32> = match opts.get("wires") {
        Some(v) => v.split(',').filter_map(|s| s.trim().parse().ok()).collect(),
        None => return default,
    };
    match parsed.as_slice() {
        &[u, v, w] => [u, v, w],
        _ => {
            eprintln!("Warning: --wires expects three counts, using {:?}", default);
            default
        }
    }
}

fn sampling_config(opts: &HashMap<String, String>) -> Result<SamplingConfig, ConfigError> {
    let from_file = match opts.get("config") {
        Some(path) => Some(SamplingConfig::from_json_file(path)?),
        None => None,
    };

    let fraction = match opts.get("frac") {
        Some(v) => v.parse::<f64>().map_err(|_| ConfigError::InvalidValue {
            key: "BadChanFrac",
            value: v.clone(),
        })?,
        None => match from_file {
            Some(c) => c.bad_fraction,
            None => return Err(ConfigError::Missing("BadChanFrac")),
        },
    };
    let mode = match opts.get("mode") {
        Some(v) => v.parse::<Mode>()?,
        None => match from_file {
            Some(c) => c.mode,
            None => return Err(ConfigError::Missing("Mode")),
        },
    };
    let seed = match opts.get("seed") {
        Some(v) => Some(v.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
            key: "Seed",
            value: v.clone(),
        })?),
        None => from_file.and_then(|c| c.seed),
    };

    let config = SamplingConfig::new(fraction, mode)?;
    Ok(match seed {
        Some(seed) => config.with_seed(seed),
        None => config,
    })
}

fn parse_args() -> Result<CliConfig, ConfigError> {
    let opts = parse_opts();
    let geometry = RegularGeometry::new(
        parse_u32(&opts, "cryostats", 1),
        parse_u32(&opts, "tpcs", 12),
        parse_wires(&opts, [800, 800, 960]),
    )
    .with_shared_induction(opts.contains_key("shared-induction"));

    Ok(CliConfig {
        sampling: sampling_config(&opts)?,
        geometry,
        variations: parse_u32(&opts, "variations", 1).max(1) as usize,
        output: opts.get("output").cloned(),
    })
}

fn write_json<T: serde::Serialize>(value: &T, path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Warning: could not create directory {parent:?}: {e}");
                return;
            }
        }
    }
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            if let Err(e) = std::fs::write(path, json) {
                eprintln!("Warning: could not write {path}: {e}");
            } else {
                println!("\nResults written to {path}");
            }
        }
        Err(e) => eprintln!("Warning: could not serialize results: {e}"),
    }
}

fn main() {
    env_logger::init();

    let cli = match parse_args() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("A fraction (--frac or BadChanFrac) and a mode (--mode or Mode) are required.");
            std::process::exit(1);
        }
    };

    println!("========================================");
    println!("  random-channel-status");
    println!("========================================");
    println!();
    println!(
        "Geometry: {} cryostat(s) x {} TPC(s), wires U/V/W = {:?}{}",
        cli.geometry.cryostats,
        cli.geometry.tpcs_per_cryostat,
        cli.geometry.wires_per_plane,
        if cli.geometry.shared_induction { ", shared induction" } else { "" }
    );
    println!(
        "Mode: {}, bad fraction: {}, variations: {}",
        cli.sampling.mode, cli.sampling.bad_fraction, cli.variations
    );
    println!();

    let variations = match run_variations(&cli.sampling, &cli.geometry, cli.variations) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    println!(
        "{:>5} {:>20} {:>10} {:>10} {:>10} {:>8}",
        "var", "seed", "channels", "bad", "draws", "frac"
    );
    for v in &variations {
        println!(
            "{:>5} {:>20} {:>10} {:>10} {:>10} {:>8.4}",
            v.index,
            v.seed,
            v.summary.total_channels,
            v.summary.bad_channels,
            v.summary.draws,
            v.summary.achieved_fraction
        );
    }

    if let Some(path) = &cli.output {
        write_json(&variations, path);
    }
}
