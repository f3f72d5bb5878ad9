//! clinic-sim: headless runner for the clinic flow simulator
//!
//! Usage:
//!   clinic-sim --patients 20 --seed 7
//!   clinic-sim --scenario scenario.json --config clinic.json --output run.json
//!   clinic-sim --tick 30 --patient "Patient 3"

use anyhow::{bail, Context, Result};
use clap::Parser;
use clinic_simulator_core_rs::persistence::HistoryRecord;
use clinic_simulator_core_rs::scenario::{GeneratorConfig, ScenarioGenerator};
use clinic_simulator_core_rs::{
    simulate, NextStep, PatientObservation, Scenario, SimulationConfig, SimulationRun, Snapshot,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "clinic-sim")]
#[command(about = "Simulate patients moving through an occupational-health clinic", long_about = None)]
struct Args {
    /// Number of generated patients
    #[arg(short, long, default_value = "10")]
    patients: usize,

    /// Mean gap between generated arrivals, in ticks
    #[arg(short, long, default_value = "4")]
    interval: usize,

    /// Largest generated battery
    #[arg(short, long, default_value = "3")]
    max_exams: usize,

    /// Tick budget (overrides the config file)
    #[arg(short, long)]
    ticks: Option<usize>,

    /// Generator seed
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Load the scenario from a JSON file instead of generating it
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Catalog, routing and budget overrides as JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// Save the per-tick history record as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the rooms and patients of one snapshot
    #[arg(long)]
    tick: Option<usize>,

    /// Print the journey and next step of one patient
    #[arg(long)]
    patient: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => read_json::<SimulationConfig>(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(ticks) = args.ticks {
        config.tick_budget = ticks;
    }
    let catalog = config.validate().context("invalid simulation config")?;

    let scenario = match &args.scenario {
        Some(path) => read_json::<Scenario>(path)?,
        None => {
            let generator = GeneratorConfig {
                num_patients: args.patients,
                arrival_interval: args.interval,
                max_exams_per_patient: args.max_exams,
                seed: args.seed,
            };
            ScenarioGenerator::new(generator, &catalog)?.generate()
        }
    };

    println!("Clinic flow simulator");
    println!("  patients:  {}", scenario.len());
    println!("  rooms:     {}", catalog.len());
    println!("  ticks:     {}", config.tick_budget);
    println!();

    let run = simulate(config, scenario).context("simulation failed")?;

    print_summary(&run);

    if let Some(tick) = args.tick {
        let snapshot = run
            .history
            .snapshot(tick)
            .with_context(|| format!("tick {} is outside the run (0..{})", tick, run.history.len()))?;
        print_snapshot(snapshot);
    }

    if let Some(patient_id) = &args.patient {
        print_patient(&run, patient_id, args.tick)?;
    }

    if let Some(path) = &args.output {
        HistoryRecord::from(&run)
            .save(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("Saved {} ticks to {}", run.history.len(), path.display());
        println!("History written to {}", path.display());
    }

    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let json =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("failed to parse {}", path.display()))
}

fn print_summary(run: &SimulationRun) {
    let summary = run.history.summary();

    println!("Run {}", run.run_id);
    println!("  ticks simulated:     {}", summary.ticks);
    println!("  patients arrived:    {}", summary.patients_arrived);
    println!("  patients finalized:  {}", summary.patients_finalized);
    println!("  patients in clinic:  {}", summary.patients_active);
    match summary.mean_total_time {
        Some(mean) => println!("  mean total time:     {:.1}", mean),
        None => println!("  mean total time:     -"),
    }
    if let Some(max) = summary.max_total_time {
        println!("  max total time:      {}", max);
    }
    println!();

    println!("{:<24} {:>10} {:>8}", "Room", "Busy", "Util");
    for room in &summary.room_utilization {
        println!(
            "{:<24} {:>10} {:>7.1}%",
            room.exam,
            room.busy_ticks,
            room.utilization * 100.0
        );
    }
    println!();

    let report = run.history.completion_report();
    if report.is_empty() {
        println!("No patient finished within the budget");
    } else {
        println!("{:<16} {:>8} {:>10} {:>10}", "Patient", "Arrival", "Completed", "Total");
        for row in &report {
            println!(
                "{:<16} {:>8} {:>10} {:>10}",
                row.patient_id, row.arrival_tick, row.completion_tick, row.total_time
            );
        }
    }
    println!();
}

fn print_snapshot(snapshot: &Snapshot) {
    println!("Tick {}", snapshot.tick);
    println!("{:<24} {:<16} {:>9}  Queue", "Room", "Occupant", "Remaining");
    for room in &snapshot.rooms {
        let queue: Vec<&str> = room.queue().iter().map(String::as_str).collect();
        println!(
            "{:<24} {:<16} {:>9}  {}",
            room.exam_id(),
            room.occupant().unwrap_or("-"),
            room.remaining(),
            queue.join(", ")
        );
    }
    println!();

    println!("{:<16} {:<32} {:>8}", "Patient", "Location", "Progress");
    for patient in snapshot.active.iter().chain(&snapshot.finalized) {
        let (done, total) = patient.progress();
        println!(
            "{:<16} {:<32} {:>5}/{}",
            patient.id(),
            patient.location().to_string(),
            done,
            total
        );
    }
    println!();

    for event in &snapshot.events {
        println!("  {}", event);
    }
    if !snapshot.events.is_empty() {
        println!();
    }
}

fn print_patient(run: &SimulationRun, patient_id: &str, tick: Option<usize>) -> Result<()> {
    if run.scenario.get(patient_id).is_none() {
        bail!("patient {} is not part of the scenario", patient_id);
    }
    let tick = tick.unwrap_or_else(|| run.history.len().saturating_sub(1));

    println!("Journey of {}", patient_id);
    for event in run.history.events_for_patient(patient_id) {
        println!("  {}", event);
    }

    match run.history.patient_at(tick, patient_id) {
        PatientObservation::NotYetPresent => println!("At tick {}: not yet arrived", tick),
        PatientObservation::Active(p) | PatientObservation::Finalized(p) => {
            let (done, total) = p.progress();
            println!("At tick {}: {} ({}/{} exams)", tick, p.location(), done, total);
        }
    }

    let step = run.next_step(tick, patient_id)?;
    let line = match step {
        NextStep::NotYetPresent => "not in the clinic yet".to_string(),
        NextStep::Finished => "finished".to_string(),
        NextStep::InService { exam } => format!("in {}", exam),
        NextStep::Waiting {
            exam,
            people_ahead,
            estimated_wait,
        } => format!(
            "{} with {} ahead, about {} ticks",
            exam, people_ahead, estimated_wait
        ),
        NextStep::AwaitingRoom => "no room available yet".to_string(),
    };
    println!("Next: {}", line);

    Ok(())
}
