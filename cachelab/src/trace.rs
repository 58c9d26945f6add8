use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // [ ]<op> <hex address>,<size>
    static ref TRACE_LINE: Regex =
        Regex::new(r"^ ?(?P<op>[ILSM])\s*(?:0[xX])?(?P<address>[0-9a-fA-F]+),\s*(?P<size>[0-9]+)\s*$")
            .expect("trace line pattern is valid");
}

/// The kind of memory reference in a trace record
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Operation {
    /// Instruction load, ignored by the simulator
    Instruction,
    Load,
    Store,
    /// A load followed by a store to the same address
    Modify,
}

impl Operation {
    fn from_char(op: char) -> Option<Self> {
        match op {
            'I' => Some(Operation::Instruction),
            'L' => Some(Operation::Load),
            'S' => Some(Operation::Store),
            'M' => Some(Operation::Modify),
            _ => None,
        }
    }

    /// The number of cache accesses the operation performs
    pub fn accesses(&self) -> usize {
        match self {
            Operation::Instruction => 0,
            Operation::Load | Operation::Store => 1,
            Operation::Modify => 2,
        }
    }
}

/// A single parsed trace line
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TraceRecord {
    pub operation: Operation,
    pub address: u64,
    /// Size of the access in bytes. Not used by the cache, only echoed in verbose output
    pub size: u32,
}

impl TraceRecord {
    /// The text echoed for a line in verbose mode: the line without its leading space or line ending
    pub fn display_text(line: &str) -> &str {
        let line = line.trim_end_matches(['\n', '\r']);
        line.strip_prefix(' ').unwrap_or(line)
    }
}

/// Parses one trace line, e.g. ` L 0400d7d4,8`
///
/// Returns `None` for anything that doesn't match the trace format, including unknown operations and
/// addresses or sizes which overflow; such lines are skipped by the simulator
///
/// # Examples
///
/// ```
/// use cachelab::trace::{parse_line, Operation};
/// let record = parse_line(" M 20,1").unwrap();
/// assert_eq!(record.operation, Operation::Modify);
/// assert_eq!(record.address, 0x20);
/// assert_eq!(record.size, 1);
/// ```
pub fn parse_line(line: &str) -> Option<TraceRecord> {
    let tokens = TRACE_LINE.captures(line)?;
    let operation = Operation::from_char(tokens.name("op")?.as_str().chars().next()?)?;
    let address = u64::from_str_radix(tokens.name("address")?.as_str(), 16).ok()?;
    let size = tokens.name("size")?.as_str().parse().ok()?;
    Some(TraceRecord {
        operation,
        address,
        size,
    })
}
