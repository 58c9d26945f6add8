use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building or loading a cache configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required parameter -{0}")]
    Missing(&'static str),
    #[error("associativity (-E) must be at least 1")]
    ZeroAssociativity,
    #[error("set index bits ({set_index_bits}) and block offset bits ({block_offset_bits}) exceed the 64 bit address width")]
    AddressWidth {
        set_index_bits: u32,
        block_offset_bits: u32,
    },
    #[error("a cache of 2^{set_index_bits} sets with {associativity} lines each can't be allocated")]
    TooLarge {
        set_index_bits: u32,
        associativity: usize,
    },
    #[error("couldn't parse the config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors raised while reading a trace
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("couldn't open the trace file at path {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("couldn't read from the trace: {0}")]
    Read(#[from] io::Error),
    #[error("couldn't write verbose output: {0}")]
    Output(#[source] io::Error),
}
