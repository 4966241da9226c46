//! Tympanic Sim - Entry point
//!
//! Headless middle/inner ear transmission diagnostics.
//!
//! CLI Usage:
//!   cargo run                                  # 1 kHz tone, 500 ticks
//!   cargo run -- -n 1000 -a 1.0 -f 440         # Custom tone and length
//!   cargo run -- --disease acute:0.9 --antibiotic 0.8
//!   cargo run -- --perforation 1.5             # Central perforation, radius in mm
//!   cargo run -- --sweep --json                # Air-bone gap sweep as JSON

use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use glam::Vec3;
use tympanic_sim::{
    audiometry::{best_position, AirBoneGapSweep, SweepSettings, DEFAULT_GRID_POSITIONS, PERFORATION_GRADES},
    config::Parameters,
    coupling::TransmissionOrchestrator,
    pathology::DiseaseStage,
    physics::PerforationZone,
};

/// Parsed command line
struct CliOptions {
    ticks: usize,
    amplitude: f64,
    frequency_hz: f64,
    dt: f64,
    disease: Option<(DiseaseStage, f64)>,
    antibiotic: Option<f64>,
    perforation_radius_mm: Option<f32>,
    sweep: bool,
    json: bool,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            ticks: 500,
            amplitude: 0.5,
            frequency_hz: 1000.0,
            dt: 0.016,
            disease: None,
            antibiotic: None,
            perforation_radius_mm: None,
            sweep: false,
            json: false,
        }
    }
}

/// Run the transmission chain and report its status
fn run_diagnostics(opts: &CliOptions) -> Result<()> {
    let params = Parameters::load_or_default();
    let mut sim = TransmissionOrchestrator::new(&params);

    if let Some(radius) = opts.perforation_radius_mm {
        let zone = PerforationZone::new(Vec3::ZERO, radius, 1.0);
        let marked = sim.membrane_mut().add_perforation_zone(zone)?;
        log::info!("Perforation of {:.2} mm covers {} vertices", radius, marked);
    }
    if let Some((stage, severity)) = opts.disease {
        sim.pathology_mut().trigger(stage, severity);
    }
    if let Some(effectiveness) = opts.antibiotic {
        sim.pathology_mut()
            .start_antibiotic(effectiveness)
            .context("--antibiotic needs --disease")?;
    }

    sim.receive_sound(opts.amplitude, opts.frequency_hz);

    if !opts.json {
        println!("=== Tympanic Sim - Transmission Diagnostics ===\n");
        println!(
            "Tone: amplitude {:.3} at {:.0} Hz, {} ticks of {:.3}s",
            opts.amplitude, opts.frequency_hz, opts.ticks, opts.dt
        );
        println!(
            "Membrane: {} vertices, {:.1} mm², perforation grade {}",
            sim.membrane().mesh().vertex_count(),
            sim.membrane().mesh().calculate_surface_area(),
            sim.membrane().perforation_grade()
        );
        println!("Lever gain at tone: {:.2}x", sim.lever().total_gain(opts.frequency_hz));
        println!("\n--- Running {} ticks ---\n", opts.ticks);
    }

    let start_time = Instant::now();
    for tick in 0..opts.ticks {
        sim.tick(opts.dt);

        // Report progress every 10%
        if !opts.json && opts.ticks >= 10 && tick % (opts.ticks / 10) == 0 {
            let snapshot = sim.status_snapshot();
            println!(
                "  t={:7.3}s: {:5.1} dB SPL, efficiency {:5.1}%, nerve {:5.1}%, {}",
                snapshot.time_sec,
                snapshot.sound_level_db,
                snapshot.transmission_efficiency_percent,
                snapshot.nerve_strength_percent,
                snapshot.overall_health
            );
        }
    }
    let elapsed = start_time.elapsed();

    let snapshot = sim.status_snapshot();
    if opts.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("\n=== Results ===");
    println!("Elapsed time: {:.2?}", elapsed);
    println!("Ticks per second: {:.0}", opts.ticks as f32 / elapsed.as_secs_f32().max(1e-6));
    println!();
    snapshot.print_summary();

    let outputs = sim.outputs();
    println!();
    println!("Membrane vibration: {:.4}", outputs.membrane_vibration);
    println!("Lever output: {:.4}", outputs.lever_output);
    if let Some(nerve) = sim.nerve() {
        println!(
            "Nerve: {} signals, latency {:.2} ms, fatigue {:.1}%",
            nerve.completed_count(),
            nerve.total_latency() * 1000.0,
            nerve.fatigue_percent()
        );
    }

    if sim.pathology().is_active() {
        println!();
        sim.pathology().diagnostics().print_summary();
    }

    // Diagnostic checks
    println!("\n=== Diagnostic Checks ===");
    if opts.amplitude > 0.0 && snapshot.sound_level_db <= 0.0 {
        println!("⚠️  WARNING: No sound reached the cochlea");
    } else {
        println!("✓ Sound level looks reasonable");
    }
    let integrator = sim.membrane().integrator_state();
    if integrator.reset_count > 0 {
        println!("⚠️  WARNING: {} membrane vertices diverged and were reset", integrator.reset_count);
    } else {
        println!("✓ Membrane integration stable");
    }

    Ok(())
}

/// Run the perforation air-bone gap sweep
fn run_sweep(opts: &CliOptions) -> Result<()> {
    let params = Parameters::load_or_default();
    let sweep = AirBoneGapSweep::new(&params, SweepSettings::default());

    let start_time = Instant::now();
    let records = sweep.run_grid(&PERFORATION_GRADES, &DEFAULT_GRID_POSITIONS)?;

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    println!("=== Air-Bone Gap Sweep ({} records, {:.2?}) ===\n", records.len(), start_time.elapsed());
    println!("Grade  PosX  PosY   Ø mm   250   500  1000  2000  3000  4000   Avg");
    for r in &records {
        print!("{:>5}  {:.2}  {:.2}  {:5.2}", r.grade.name(), r.pos_x, r.pos_y, r.perforation_diameter_mm);
        for abg in r.abg_db {
            print!("  {:4.1}", abg);
        }
        println!("  {:4.1}", r.avg_total_db);
    }

    println!("\nBest match per grade:");
    for grade in PERFORATION_GRADES {
        if let Some(best) = best_position(&records, grade) {
            println!(
                "  Grade {}: ({:.2}, {:.2}), error {:.1} dB",
                grade, best.pos_x, best.pos_y, best.error_db
            );
        }
    }

    Ok(())
}

fn next_value<'a>(args: &'a [String], i: &mut usize, flag: &str) -> Result<&'a str> {
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("{} expects a value", flag))
}

fn parse_disease(value: &str) -> Result<(DiseaseStage, f64)> {
    let (stage, severity) = value.split_once(':').unwrap_or((value, "0.7"));
    let stage = DiseaseStage::parse(stage).ok_or_else(|| anyhow!("Unknown disease stage '{}'", stage))?;
    let severity = severity
        .parse()
        .with_context(|| format!("Invalid disease severity '{}'", severity))?;
    Ok((stage, severity))
}

/// Parse CLI arguments
fn parse_args() -> Result<CliOptions> {
    let args: Vec<String> = std::env::args().collect();
    let mut opts = CliOptions::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            // Diagnostics are the default mode
            "--diagnose" | "-d" => {}
            "-n" | "--ticks" => opts.ticks = next_value(&args, &mut i, "-n")?.parse().unwrap_or(500),
            "-a" | "--amplitude" => opts.amplitude = next_value(&args, &mut i, "-a")?.parse().unwrap_or(0.5),
            "-f" | "--frequency" => opts.frequency_hz = next_value(&args, &mut i, "-f")?.parse().unwrap_or(1000.0),
            "--dt" => opts.dt = next_value(&args, &mut i, "--dt")?.parse().unwrap_or(0.016),
            "--disease" => opts.disease = Some(parse_disease(next_value(&args, &mut i, "--disease")?)?),
            "--antibiotic" => {
                opts.antibiotic = Some(
                    next_value(&args, &mut i, "--antibiotic")?
                        .parse()
                        .context("Invalid antibiotic effectiveness")?,
                )
            }
            "--perforation" => {
                opts.perforation_radius_mm = Some(
                    next_value(&args, &mut i, "--perforation")?
                        .parse()
                        .context("Invalid perforation radius")?,
                )
            }
            "--sweep" => opts.sweep = true,
            "--json" => opts.json = true,
            "--help" | "-h" => {
                println!("Tympanic Sim");
                println!();
                println!("Usage: tympanic-sim [OPTIONS]");
                println!();
                println!("Options:");
                println!("  --diagnose, -d          Run transmission diagnostics (default)");
                println!("  -n, --ticks N           Number of ticks (default: 500)");
                println!("  -a, --amplitude A       Tone amplitude (default: 0.5)");
                println!("  -f, --frequency F       Tone frequency in Hz (default: 1000)");
                println!("  --dt S                  Tick length in seconds (default: 0.016)");
                println!("  --disease STAGE:SEV     Start otitis media, e.g. acute:0.9");
                println!("  --antibiotic E          Start antibiotics with effectiveness E");
                println!("  --perforation R         Central perforation of radius R mm");
                println!("  --sweep                 Run the air-bone gap sweep");
                println!("  --json                  Print results as JSON");
                println!("  --help, -h              Show this help");
                std::process::exit(0);
            }
            other => log::warn!("Ignoring unknown argument '{}'", other),
        }
        i += 1;
    }

    Ok(opts)
}

fn main() -> Result<()> {
    env_logger::init();

    let opts = parse_args()?;
    if opts.sweep {
        return run_sweep(&opts);
    }
    run_diagnostics(&opts)
}
