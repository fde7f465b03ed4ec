use std::fmt;
use std::fs::File;
use std::io;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;

/// Debug-build trace file named by `-T`. Truncated on open.
#[derive(Debug)]
pub struct TraceSink {
    out: BufWriter<File>,
}

impl TraceSink {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        let mut sink = Self {
            out: BufWriter::new(file),
        };
        write!(sink.out, "\n===\ntrace: open {}\n", path.display())?;
        sink.out.flush()?;
        Ok(sink)
    }

    pub fn write_line(&mut self, args: fmt::Arguments<'_>) -> io::Result<()> {
        self.out.write_fmt(args)?;
        self.out.write_all(b"\n")
    }

    pub fn close(mut self) -> io::Result<()> {
        self.out.flush()
    }
}
