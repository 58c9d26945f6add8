//! # CacheLab
//!
//! Cachelab is a library for simulating a single set-associative cache with LRU replacement
//!
//! Given a geometry (`2^s` sets, `E` lines per set, `2^b` byte blocks) and a trace of loads,
//! stores and modifies, it reproduces the hit, miss and eviction accounting of a real cache. Only
//! tags, validity and recency are modelled, no data is stored
//!
//! ```
//! use cachelab::config::CacheConfiguration;
//! use cachelab::simulator::Simulator;
//!
//! let config = CacheConfiguration::new(0, 1, 0).unwrap();
//! let mut simulator = Simulator::new(config).unwrap();
//! let summary = simulator.simulate(" L 0,1\n L 10,1\n".as_bytes(), &mut std::io::sink()).unwrap();
//! assert_eq!(summary.to_string(), "hits:0 misses:2 evictions:1");
//! ```

/// Contains the cache model: lines, address decomposition and the LRU access algorithm
pub mod cache;

/// Contains the cache geometry, which can be built directly or loaded from JSON
pub mod config;

/// Contains the error types for configuration and trace handling
pub mod error;

/// Contains the trace file opener
pub mod io;

/// Contains the simulator used to run a trace through a cache
pub mod simulator;

/// Contains the trace line format
pub mod trace;

#[cfg(test)]
mod test;
