use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use crate::error::TraceError;

/// Opens a trace file for sequential reading
///
/// Failing to open the file is fatal, nothing is read from a trace that couldn't be opened
pub fn open_trace<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>, TraceError> {
    let path = path.as_ref();
    let open_error = |source| TraceError::Open {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(open_error)?;
    // Memory map the file on unix systems, empty files can't be mapped
    #[cfg(unix)]
    {
        use std::io::Cursor;
        use memmap2::{Advice, Mmap};
        let len = file.metadata().map_err(open_error)?.len();
        if len > 0 {
            // The trace is only read, and isn't expected to change while the simulation runs
            let m = unsafe { Mmap::map(&file) }.map_err(open_error)?;
            m.advise(Advice::Sequential).map_err(open_error)?;
            return Ok(Box::new(Cursor::new(m)));
        }
    }
    Ok(Box::new(BufReader::new(file)))
}
