use std::io::{self, BufRead, Write};
use std::time::{Duration, Instant};
use log::{debug, info};
use crate::cache::{AccessKind, CacheModel};
use crate::config::CacheConfiguration;
use crate::error::{ConfigError, TraceError};
use crate::trace::{parse_line, TraceRecord};

pub use crate::cache::Summary;

/// The simulator feeds trace records through a cache model, and collects results.
///
/// It supports calling simulate multiple times, the same cache keeps being used and the time taken
/// and the results accumulate accordingly
#[derive(Debug)]
pub struct Simulator {
    cache: CacheModel,
    verbose: bool,
    simulation_time: Duration,
}

impl Simulator {
    /// Creates a new simulator with an empty cache, failing if the cache can't be allocated
    pub fn new(config: CacheConfiguration) -> Result<Self, ConfigError> {
        debug!(
            "Simulating {} sets of {} lines with {} byte blocks",
            config.num_sets(),
            config.associativity(),
            1u128 << config.block_offset_bits()
        );
        Ok(Self {
            cache: CacheModel::new(config)?,
            verbose: false,
            simulation_time: Duration::new(0, 0),
        })
    }

    /// When verbose, every simulated record is echoed with its hit, miss and eviction tags
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Performs the accesses for one record: none for an instruction load, two for a modify
    pub fn access_record(&mut self, record: &TraceRecord) -> Vec<AccessKind> {
        (0..record.operation.accesses())
            .map(|_| self.cache.access(record.address).kind)
            .collect()
    }

    /// Simulates every line of a trace
    ///
    /// Lines which don't parse are skipped. In verbose mode one line is written to `out` per load,
    /// store, or modify, e.g. `M 20,1 miss eviction hit`
    ///
    /// # Arguments
    ///
    /// * `reader`: The trace, lines may be of any length
    /// * `out`: Where verbose output goes, untouched when not verbose
    ///
    /// returns: Result<Summary, TraceError>
    pub fn simulate<R: BufRead, W: Write>(&mut self, mut reader: R, out: &mut W) -> Result<Summary, TraceError> {
        let start = Instant::now();
        let mut buffer = Vec::new();
        let mut line_number = 0usize;
        loop {
            buffer.clear();
            if reader.read_until(b'\n', &mut buffer)? == 0 {
                break;
            }
            line_number += 1;
            let line = String::from_utf8_lossy(&buffer);
            let record = match parse_line(&line) {
                Some(record) => record,
                None => {
                    debug!("Skipping malformed trace line {line_number}: {:?}", line.trim_end());
                    continue;
                }
            };
            let kinds = self.access_record(&record);
            if self.verbose && !kinds.is_empty() {
                write_verbose(out, &line, &kinds).map_err(TraceError::Output)?;
            }
        }
        self.simulation_time += start.elapsed();
        let summary = self.cache.summary();
        info!("Simulated {line_number} trace lines: {summary}");
        Ok(summary)
    }

    pub fn cache(&self) -> &CacheModel {
        &self.cache
    }

    pub fn summary(&self) -> Summary {
        self.cache.summary()
    }

    /// Gets the wall-clock execution time spent simulating
    pub fn get_execution_time(&self) -> &Duration {
        &self.simulation_time
    }
}

fn write_verbose<W: Write>(out: &mut W, line: &str, kinds: &[AccessKind]) -> io::Result<()> {
    write!(out, "{}", TraceRecord::display_text(line))?;
    for kind in kinds {
        write!(out, " {kind}")?;
    }
    writeln!(out)
}
