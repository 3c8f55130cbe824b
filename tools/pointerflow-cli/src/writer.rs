//! Buffered JSONL writer for recognized gesture signals.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use pointerflow_common::error::PointerflowResult;

/// Writes one JSON document per line to a file or stdout.
pub struct SignalWriter {
    writer: BufWriter<Box<dyn Write>>,
    path: Option<PathBuf>,
    lines_written: u64,
}

impl SignalWriter {
    /// Open `path` (truncating it) or fall back to stdout.
    pub fn create(path: Option<&Path>) -> PointerflowResult<Self> {
        let sink: Box<dyn Write> = match path {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                let file = OpenOptions::new()
                    .create(true)
                    .write(true)
                    .truncate(true)
                    .open(path)?;
                Box::new(file)
            }
            None => Box::new(std::io::stdout()),
        };

        Ok(Self {
            writer: BufWriter::new(sink),
            path: path.map(Path::to_path_buf),
            lines_written: 0,
        })
    }

    /// Write a `#` comment line. Readers of the log skip these.
    pub fn write_comment(&mut self, comment: &str) -> PointerflowResult<()> {
        writeln!(self.writer, "# {comment}")?;
        Ok(())
    }

    /// Write one pre-encoded JSON line.
    pub fn write_line(&mut self, line: &str) -> PointerflowResult<()> {
        writeln!(self.writer, "{line}")?;
        self.lines_written += 1;

        if self.lines_written % 1000 == 0 {
            self.flush()?;
        }

        Ok(())
    }

    pub fn flush(&mut self) -> PointerflowResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Number of signal lines written.
    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    /// Output file, or `None` for stdout.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl Drop for SignalWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_writer_writes_lines() {
        let dir = std::env::temp_dir().join("pointerflow_test_writer");
        let _ = std::fs::remove_dir_all(&dir);

        let path = dir.join("nested").join("signals.jsonl");
        {
            let mut writer = SignalWriter::create(Some(&path)).unwrap();
            writer.write_comment("replay of taps.jsonl").unwrap();
            writer.write_line(r#"{"kind":"tap"}"#).unwrap();
            writer.write_line(r#"{"kind":"pan"}"#).unwrap();
            assert_eq!(writer.lines_written(), 2);
            assert_eq!(writer.path(), Some(path.as_path()));
        }

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with('#'));
        assert_eq!(lines[2], r#"{"kind":"pan"}"#);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
