use std::fmt;
use log::trace;
use serde::{Deserialize, Serialize};
use crate::config::CacheConfiguration;
use crate::error::ConfigError;

/// Cumulative counts for a simulation. Displays as the summary line, and can be serialised to JSON
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hits:{} misses:{} evictions:{}", self.hits, self.misses, self.evictions)
    }
}

/// One cache line slot. Only the metadata is modelled, no data is stored
///
/// `recency` is a per-set logical age: 0 is the most recently used line, larger is older. The tag
/// and recency of an invalid line are meaningless and the line never matches a lookup
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct Line {
    pub valid: bool,
    pub tag: u64,
    pub recency: u64,
}

/// What a single access did to the cache
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AccessKind {
    Hit,
    /// A miss which filled an empty line
    Miss,
    /// A miss on a full set, which overwrote the least recently used line
    MissEviction,
}

impl AccessKind {
    pub fn is_hit(&self) -> bool {
        matches!(self, AccessKind::Hit)
    }
}

impl fmt::Display for AccessKind {
    // These are the tags printed in verbose mode
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessKind::Hit => f.write_str("hit"),
            AccessKind::Miss => f.write_str("miss"),
            AccessKind::MissEviction => f.write_str("miss eviction"),
        }
    }
}

/// The result of [`CacheModel::access`], along with the counters after the access
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AccessOutcome {
    pub kind: AccessKind,
    pub summary: Summary,
}

/// A set-associative cache with LRU replacement
///
/// The grid of sets and lines is stored as a single flat vector, set `i` occupying
/// `lines[i * E..(i + 1) * E]`, so the whole cache is one allocation sized at construction
#[derive(Debug, Clone)]
pub struct CacheModel {
    config: CacheConfiguration,
    set_mask: u64,
    lines: Vec<Line>,
    summary: Summary,
}

impl CacheModel {
    /// Builds an empty cache, every line invalid
    ///
    /// Fails with [`ConfigError::TooLarge`] when the grid of lines can't be allocated, a valid
    /// configuration only guarantees the size is representable
    pub fn new(config: CacheConfiguration) -> Result<Self, ConfigError> {
        debug_assert!(config.validate().is_ok(), "cache built from an invalid configuration");
        let total_lines = config.total_lines();
        let mut lines = Vec::new();
        lines.try_reserve_exact(total_lines).map_err(|_| ConfigError::TooLarge {
            set_index_bits: config.set_index_bits(),
            associativity: config.associativity(),
        })?;
        lines.resize(total_lines, Line::default());
        Ok(Self {
            config,
            set_mask: config.num_sets() as u64 - 1,
            lines,
            summary: Summary::default(),
        })
    }

    /// Splits an address into its set index and tag. The block offset is dropped
    ///
    /// # Arguments
    ///
    /// * `address`: The address of the reference
    ///
    /// returns: (usize, u64)
    pub fn decompose(&self, address: u64) -> (usize, u64) {
        let offset_bits = self.config.block_offset_bits();
        let tag_shift = self.config.set_index_bits() + offset_bits;
        // Shifting a u64 by 64 overflows, when s + b covers the whole address the tag is empty
        let set_index = address.checked_shr(offset_bits).unwrap_or(0) & self.set_mask;
        let tag = address.checked_shr(tag_shift).unwrap_or(0);
        (set_index as usize, tag)
    }

    /// Simulates a single load or store of `address`. A modify is two calls with the same address
    ///
    /// Every line of the set which isn't the final hit or fill target ages by exactly one, the
    /// target's recency is reset to 0. On a miss the first invalid line is filled, and if there is
    /// none the line with the largest recency is evicted, ties going to the lowest index
    pub fn access(&mut self, address: u64) -> AccessOutcome {
        let (set_index, tag) = self.decompose(address);
        let associativity = self.config.associativity();
        let lower = set_index * associativity;
        let set = &mut self.lines[lower..lower + associativity];

        // Age everything, then reset whichever line ends up being used
        let mut hit = None;
        for (way, line) in set.iter_mut().enumerate() {
            if line.valid && line.tag == tag {
                line.recency = 0;
                hit = Some(way);
            } else {
                line.recency += 1;
            }
        }

        let kind = match hit {
            Some(way) => {
                trace!("set {set_index} way {way}: hit for tag {tag:#x}");
                self.summary.hits += 1;
                AccessKind::Hit
            }
            None => {
                self.summary.misses += 1;
                let (way, kind) = match set.iter().position(|line| !line.valid) {
                    Some(way) => (way, AccessKind::Miss),
                    None => {
                        self.summary.evictions += 1;
                        (select_victim(set), AccessKind::MissEviction)
                    }
                };
                trace!("set {set_index} way {way}: {kind} for tag {tag:#x}");
                set[way] = Line {
                    valid: true,
                    tag,
                    recency: 0,
                };
                kind
            }
        };
        AccessOutcome {
            kind,
            summary: self.summary,
        }
    }

    pub fn config(&self) -> &CacheConfiguration {
        &self.config
    }

    /// The running hit, miss and eviction counts
    pub fn summary(&self) -> Summary {
        self.summary
    }

    /// The lines of a single set
    ///
    /// # Panics
    ///
    /// If `index` isn't less than the number of sets
    pub fn set(&self, index: usize) -> &[Line] {
        let associativity = self.config.associativity();
        &self.lines[index * associativity..(index + 1) * associativity]
    }

    /// Gets the number of valid lines across all sets. Useful for analysing cache occupancy or
    /// debugging
    pub fn valid_line_count(&self) -> usize {
        self.lines.iter().filter(|line| line.valid).count()
    }
}

/// Picks the line with the strictly largest recency. The first line holding the maximum is kept, so
/// ties go to the lowest index
pub(crate) fn select_victim(set: &[Line]) -> usize {
    let mut max_index = 0;
    let mut max_recency = set[0].recency;
    for (way, line) in set.iter().enumerate().skip(1) {
        if line.recency > max_recency {
            max_recency = line.recency;
            max_index = way;
        }
    }
    max_index
}
