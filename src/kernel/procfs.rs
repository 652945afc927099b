/// Procfs table reader
///
/// Pseudo-files under /proc commonly report a size of zero while holding
/// real content, so nothing here trusts the reported size: it only picks the
/// initial allocation, and the buffer grows until EOF.
use crate::config::types::{ProbeError, Result};
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::ops::ControlFlow;
use std::path::Path;

const CHUNK_SIZE: usize = 4096;

/// Whether a table was read to EOF
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadIntegrity {
    Complete,
    /// An I/O error stopped the read; what was read so far is kept
    Partial,
}

/// Whole-file contents of one table
#[derive(Debug, Clone)]
pub struct TableBuffer {
    pub bytes: Vec<u8>,
    pub integrity: ReadIntegrity,
}

impl TableBuffer {
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    pub fn is_complete(&self) -> bool {
        self.integrity == ReadIntegrity::Complete
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Summary of a line-oriented scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineScan {
    pub lines: usize,
    pub integrity: ReadIntegrity,
    /// The visitor asked to stop before EOF
    pub stopped: bool,
}

/// Read an entire pseudo-file. Fails only when the path cannot be opened.
pub fn read_whole(path: &Path, fallback_capacity: usize) -> Result<TableBuffer> {
    let file = File::open(path).map_err(|e| ProbeError::unavailable(path, e))?;
    let buffer = read_whole_from(file, fallback_capacity);
    if !buffer.is_complete() {
        log::debug!(
            "{}",
            ProbeError::PartialRead {
                path: path.to_path_buf(),
                bytes: buffer.len(),
            }
        );
    }
    Ok(buffer)
}

/// Size-agnostic whole read from any seekable source
pub fn read_whole_from<R: Read + Seek>(mut reader: R, fallback_capacity: usize) -> TableBuffer {
    // procfs either rejects SEEK_END or reports 0; both mean "unknown"
    let reported = reader.seek(SeekFrom::End(0)).unwrap_or(0);
    if let Err(e) = reader.seek(SeekFrom::Start(0)) {
        log::debug!("rewind failed, reading from current offset: {}", e);
    }

    let initial = if reported == 0 {
        fallback_capacity
    } else {
        usize::try_from(reported).unwrap_or(fallback_capacity)
    };

    let mut bytes = Vec::with_capacity(initial);
    let mut chunk = [0u8; CHUNK_SIZE];
    let mut integrity = ReadIntegrity::Complete;

    loop {
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => bytes.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(_) => {
                integrity = ReadIntegrity::Partial;
                break;
            }
        }
    }

    TableBuffer { bytes, integrity }
}

/// Visit every line of a table. Fails only when the path cannot be opened.
pub fn for_each_line<F>(path: &Path, visitor: F) -> Result<LineScan>
where
    F: FnMut(&str) -> ControlFlow<()>,
{
    let file = File::open(path).map_err(|e| ProbeError::unavailable(path, e))?;
    Ok(for_each_line_from(BufReader::new(file), visitor))
}

/// Line scan over any buffered source. Lines are passed without their newline.
pub fn for_each_line_from<R, F>(mut reader: R, mut visitor: F) -> LineScan
where
    R: BufRead,
    F: FnMut(&str) -> ControlFlow<()>,
{
    let mut scan = LineScan {
        lines: 0,
        integrity: ReadIntegrity::Complete,
        stopped: false,
    };
    let mut raw = Vec::new();

    loop {
        raw.clear();
        match reader.read_until(b'\n', &mut raw) {
            Ok(0) => break,
            Ok(_) => {
                scan.lines += 1;
                let line = String::from_utf8_lossy(&raw);
                if visitor(line.trim_end_matches(['\n', '\r'])).is_break() {
                    scan.stopped = true;
                    break;
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(_) => {
                scan.integrity = ReadIntegrity::Partial;
                break;
            }
        }
    }

    scan
}

/// Whole-table text, or `None` when the source is unavailable
pub fn read_text(path: &Path, fallback_capacity: usize) -> Option<String> {
    match read_whole(path, fallback_capacity) {
        Ok(buffer) => Some(buffer.text().into_owned()),
        Err(e) => {
            log::debug!("no evidence from this source: {}", e);
            None
        }
    }
}

/// Collect every line of a table, or `None` when the source is unavailable
pub fn read_lines(path: &Path) -> Option<Vec<String>> {
    let mut lines = Vec::new();
    match for_each_line(path, |line| {
        lines.push(line.to_string());
        ControlFlow::Continue(())
    }) {
        Ok(_) => Some(lines),
        Err(e) => {
            log::debug!("no evidence from this source: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    /// Source that lies about its size the way procfs does
    struct ZeroSizedSource {
        inner: Cursor<Vec<u8>>,
    }

    impl Read for ZeroSizedSource {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.inner.read(buf)
        }
    }

    impl Seek for ZeroSizedSource {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            match pos {
                SeekFrom::End(_) => Ok(0),
                other => self.inner.seek(other),
            }
        }
    }

    /// Source that yields some bytes, then fails
    struct FailingSource {
        served: bool,
    }

    impl Read for FailingSource {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.served {
                return Err(io::Error::new(ErrorKind::Other, "device went away"));
            }
            self.served = true;
            buf[..4].copy_from_slice(b"abc\n");
            Ok(4)
        }
    }

    impl Seek for FailingSource {
        fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
            Err(io::Error::new(ErrorKind::InvalidInput, "unseekable"))
        }
    }

    impl BufRead for FailingSource {
        fn fill_buf(&mut self) -> io::Result<&[u8]> {
            if self.served {
                return Err(io::Error::new(ErrorKind::Other, "device went away"));
            }
            Ok(b"abc\ndef\n")
        }

        fn consume(&mut self, _amt: usize) {
            self.served = true;
        }
    }

    #[test]
    fn test_zero_reported_size_reads_everything() {
        let content: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();
        let source = ZeroSizedSource {
            inner: Cursor::new(content.clone()),
        };

        let buffer = read_whole_from(source, 20_000);
        assert_eq!(buffer.len(), content.len(), "must grow past the fallback");
        assert_eq!(buffer.bytes, content);
        assert!(buffer.is_complete());
    }

    #[test]
    fn test_small_content_under_fallback() {
        let source = ZeroSizedSource {
            inner: Cursor::new(b"tmpfs /dev tmpfs rw 0 0\n".to_vec()),
        };
        let buffer = read_whole_from(source, 20_000);
        assert_eq!(buffer.text(), "tmpfs /dev tmpfs rw 0 0\n");
    }

    #[test]
    fn test_partial_read_keeps_prefix() {
        let buffer = read_whole_from(FailingSource { served: false }, 16);
        assert_eq!(buffer.bytes, b"abc\n");
        assert_eq!(buffer.integrity, ReadIntegrity::Partial);
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let err = read_whole(Path::new("/nonexistent/proc/maps"), 64).unwrap_err();
        assert!(err.is_unavailable());
        assert!(read_text(Path::new("/nonexistent/proc/maps"), 64).is_none());
    }

    #[test]
    fn test_real_procfs_table_is_not_empty() {
        let buffer = read_whole(Path::new("/proc/self/maps"), 64).unwrap();
        assert!(!buffer.is_empty());
        assert!(buffer.text().lines().count() > 1);
    }

    #[test]
    fn test_for_each_line_strips_newlines() {
        let mut seen = Vec::new();
        let scan = for_each_line_from(Cursor::new("a\nb\r\nc"), |line| {
            seen.push(line.to_string());
            ControlFlow::Continue(())
        });
        assert_eq!(seen, vec!["a", "b", "c"]);
        assert_eq!(scan.lines, 3);
        assert_eq!(scan.integrity, ReadIntegrity::Complete);
        assert!(!scan.stopped);
    }

    #[test]
    fn test_for_each_line_visitor_can_stop() {
        let mut seen = 0;
        let scan = for_each_line_from(Cursor::new("a\nb\nc\n"), |_| {
            seen += 1;
            if seen == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(seen, 2);
        assert!(scan.stopped);
    }

    #[test]
    fn test_for_each_line_partial_success() {
        let mut seen = Vec::new();
        let scan = for_each_line_from(FailingSource { served: false }, |line| {
            seen.push(line.to_string());
            ControlFlow::Continue(())
        });
        assert_eq!(seen, vec!["abc"]);
        assert_eq!(scan.integrity, ReadIntegrity::Partial);
    }

    #[test]
    fn test_read_lines_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mounts");
        std::fs::write(&path, "proc /proc proc rw 0 0\nsysfs /sys sysfs rw 0 0\n").unwrap();
        let lines = read_lines(&path).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "sysfs /sys sysfs rw 0 0");
    }
}
