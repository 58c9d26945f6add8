use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;
use clap::Parser;
use env_logger::Env;
use log::debug;
use cachelab::config::{CacheConfiguration, PartialConfiguration};
use cachelab::io::open_trace;
use cachelab::simulator::Simulator;

const EXAMPLES: &str = "Examples:
  linux>  csim -s 4 -E 1 -b 4 -t traces/yi.trace
  linux>  csim -v -s 8 -E 2 -b 4 -t traces/yi.trace";

#[derive(Parser, Debug)]
#[command(name = "csim", about = String::from("LRU cache simulator for memory traces"), after_help = EXAMPLES)]
struct Args {
    /// Optional verbose flag.
    #[arg(short, long)]
    verbose: bool,

    /// Number of set index bits.
    #[arg(short = 's', value_name = "num")]
    set_index_bits: Option<u32>,

    /// Number of lines per set.
    #[arg(short = 'E', value_name = "num")]
    associativity: Option<usize>,

    /// Number of block offset bits.
    #[arg(short = 'b', value_name = "num")]
    block_offset_bits: Option<u32>,

    /// Trace file.
    #[arg(short = 't', value_name = "file")]
    trace: PathBuf,

    /// JSON cache geometry, e.g. {"s": 4, "E": 1, "b": 4}. Flags override its values.
    #[arg(long, value_name = "file")]
    config: Option<PathBuf>,

    /// Print the summary as JSON.
    #[arg(long)]
    json: bool,

    /// Print simulation and total execution times.
    #[arg(short, long)]
    performance: bool,
}

impl Args {
    fn configuration(&self) -> Result<CacheConfiguration, String> {
        let from_file = match &self.config {
            Some(path) => {
                let config_file = File::open(path).map_err(|e| format!("Couldn't open the config file at path {}: {e}", path.display()))?;
                PartialConfiguration::from_json_reader(BufReader::new(config_file)).map_err(|e| e.to_string())?
            }
            None => PartialConfiguration::default(),
        };
        let from_flags = PartialConfiguration {
            set_index_bits: self.set_index_bits,
            associativity: self.associativity,
            block_offset_bits: self.block_offset_bits,
        };
        from_file.merge(from_flags).build().map_err(|e| format!("Invalid cache configuration: {e}"))
    }
}

fn main() -> Result<(), String> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let start = Instant::now();
    let args = Args::parse();
    let config = args.configuration()?;
    debug!("Parsed input configuration: {config:?}");
    let mut simulator = Simulator::new(config)
        .map_err(|e| format!("Invalid cache configuration: {e}"))?
        .with_verbose(args.verbose);
    let trace_reader = open_trace(&args.trace).map_err(|e| e.to_string())?;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let summary = simulator.simulate(trace_reader, &mut out).map_err(|e| e.to_string())?;
    if args.json {
        let json = serde_json::to_string_pretty(&summary).map_err(|e| format!("Couldn't serialise the output {e}"))?;
        writeln!(out, "{json}").map_err(|e| format!("Couldn't write the output {e}"))?;
    } else {
        writeln!(out, "{summary}").map_err(|e| format!("Couldn't write the output {e}"))?;
    }
    if args.performance {
        let simulation_time = simulator.get_execution_time();
        let total_time = start.elapsed();
        writeln!(out, "Simulation time: {}s", simulation_time.as_nanos() as f64 / 1e9)
            .and_then(|_| writeln!(out, "Total execution time (includes initial parsing, configuration, and output): {}s", total_time.as_nanos() as f64 / 1e9))
            .map_err(|e| format!("Couldn't write the output {e}"))?;
    }
    out.flush().map_err(|e| format!("Couldn't write the output {e}"))?;
    let cache = simulator.cache();
    debug!("Valid cache lines at exit: {} of {}", cache.valid_line_count(), config.total_lines());
    Ok(())
}
