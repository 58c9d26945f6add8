use std::io::Read;
use std::mem;
use serde::{Deserialize, Serialize};
use crate::cache::Line;
use crate::error::ConfigError;

/// Width of the simulated address space in bits
pub const ADDRESS_BITS: u32 = u64::BITS;

/// The geometry of a single cache: `2^s` sets of `E` lines, with `2^b` byte blocks
///
/// Immutable once built, and always valid: the only ways to obtain one are [`CacheConfiguration::new`]
/// and deserialisation, which both run [`CacheConfiguration::validate`]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PartialConfiguration")]
pub struct CacheConfiguration {
    set_index_bits: u32,
    associativity: usize,
    block_offset_bits: u32,
}

impl CacheConfiguration {
    /// Builds and validates a configuration
    ///
    /// # Arguments
    ///
    /// * `set_index_bits`: `s`, the number of sets is `2^s`
    /// * `associativity`: `E`, the number of lines per set, at least 1
    /// * `block_offset_bits`: `b`, the block size is `2^b` bytes
    ///
    /// returns: Result<CacheConfiguration, ConfigError>
    pub fn new(set_index_bits: u32, associativity: usize, block_offset_bits: u32) -> Result<Self, ConfigError> {
        let config = Self {
            set_index_bits,
            associativity,
            block_offset_bits,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants the cache model relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.associativity == 0 {
            return Err(ConfigError::ZeroAssociativity);
        }
        let address_bits = self.set_index_bits.checked_add(self.block_offset_bits);
        if address_bits.map_or(true, |bits| bits > ADDRESS_BITS) {
            return Err(ConfigError::AddressWidth {
                set_index_bits: self.set_index_bits,
                block_offset_bits: self.block_offset_bits,
            });
        }
        let too_large = ConfigError::TooLarge {
            set_index_bits: self.set_index_bits,
            associativity: self.associativity,
        };
        if self.set_index_bits >= usize::BITS {
            return Err(too_large);
        }
        // Vec refuses allocations over isize::MAX bytes
        let bytes = (1usize << self.set_index_bits)
            .checked_mul(self.associativity)
            .and_then(|lines| lines.checked_mul(mem::size_of::<Line>()));
        match bytes {
            Some(bytes) if bytes <= isize::MAX as usize => Ok(()),
            _ => Err(too_large),
        }
    }

    /// Parses and validates a JSON configuration, e.g. `{"s": 4, "E": 1, "b": 4}`
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        PartialConfiguration::from_json_reader(reader)?.build()
    }

    pub fn set_index_bits(&self) -> u32 {
        self.set_index_bits
    }

    pub fn associativity(&self) -> usize {
        self.associativity
    }

    pub fn block_offset_bits(&self) -> u32 {
        self.block_offset_bits
    }

    /// `2^s`
    pub fn num_sets(&self) -> usize {
        1 << self.set_index_bits
    }

    /// Total number of lines across every set
    pub fn total_lines(&self) -> usize {
        self.num_sets() * self.associativity
    }
}

/// A configuration where every field may still be missing
///
/// Used to merge a JSON configuration file with command line flags before validating the result
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialConfiguration {
    #[serde(default, alias = "s")]
    pub set_index_bits: Option<u32>,
    #[serde(default, alias = "E")]
    pub associativity: Option<usize>,
    #[serde(default, alias = "b")]
    pub block_offset_bits: Option<u32>,
}

impl PartialConfiguration {
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Combines two partial configurations, values present in `overrides` win
    pub fn merge(self, overrides: PartialConfiguration) -> Self {
        Self {
            set_index_bits: overrides.set_index_bits.or(self.set_index_bits),
            associativity: overrides.associativity.or(self.associativity),
            block_offset_bits: overrides.block_offset_bits.or(self.block_offset_bits),
        }
    }

    /// Validates the configuration, every field must be present
    pub fn build(self) -> Result<CacheConfiguration, ConfigError> {
        CacheConfiguration::new(
            self.set_index_bits.ok_or(ConfigError::Missing("s"))?,
            self.associativity.ok_or(ConfigError::Missing("E"))?,
            self.block_offset_bits.ok_or(ConfigError::Missing("b"))?,
        )
    }
}

impl TryFrom<PartialConfiguration> for CacheConfiguration {
    type Error = ConfigError;

    fn try_from(value: PartialConfiguration) -> Result<Self, Self::Error> {
        value.build()
    }
}
