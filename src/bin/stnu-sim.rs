//! Thin CLI front end: load a starting STN from a JSON IR file, run a
//! strategy, and print the assignment trace and counters. Installs the
//! process-wide `log` subscriber the library itself never installs.

use clap::Parser;
use stnu_sim::config::SimOptions;
use stnu_sim::report;
use stnu_sim::srea::ReferenceSrea;
use stnu_sim::stn::ir::StnIr;
use stnu_sim::Simulator;

#[derive(Parser)]
#[command(name = "stnu-sim", about = "Simulate dispatch of an STNU plan")]
struct Args {
    /// Path to a starting STN JSON IR file.
    ir: String,

    /// Execution strategy: early, srea, drea, drea-si, drea-alp, drea-ar, arsi.
    #[arg(long, default_value = "early")]
    strategy: String,

    /// RNG seed for reproducible contingent sampling.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, default_value_t = 0.1)]
    si_threshold: f64,
    #[arg(long, default_value_t = 0.1)]
    ar_threshold: f64,
    #[arg(long, default_value_t = 0.1)]
    alp_threshold: f64,

    /// Write the assignment trace to this JSON file instead of stdout only.
    #[arg(long)]
    json_out: Option<String>,
    /// Write the assignment trace to this CSV file instead of stdout only.
    #[arg(long)]
    csv_out: Option<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let starting_stn = StnIr::load(&args.ir)?;
    let opts = SimOptions {
        si_threshold: args.si_threshold,
        ar_threshold: args.ar_threshold,
        alp_threshold: args.alp_threshold,
    };

    let oracle = ReferenceSrea::new();
    let mut simulator = Simulator::new(args.seed);
    let report = simulator.simulate(&starting_stn, &args.strategy, &oracle, &opts)?;

    println!(
        "stnu-sim: strategy={} seed={:?} success={} reschedules={} sent={}",
        args.strategy, args.seed, report.success, report.num_reschedules, report.num_sent_schedules
    );
    let mut times: Vec<_> = report.assigned_times.iter().collect();
    times.sort_unstable_by_key(|(id, _)| **id);
    for (id, time) in times {
        match time {
            Some(t) => println!("  {id}: {t}"),
            None => println!("  {id}: (unassigned)"),
        }
    }

    if let Some(path) = &args.json_out {
        report::write_json(path, &report)?;
    }
    if let Some(path) = &args.csv_out {
        report::write_csv(path, &report)?;
    }

    Ok(())
}
