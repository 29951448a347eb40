//! Forward-only text sources
//!
//! Index and column files are far too large to hold in memory and are usually
//! compressed. Compressed files are streamed through the codec's own command
//! line tool (`xz -dc`, `zstd -dc`, `gzip -dc`) so nothing is decompressed to
//! disk or loaded whole.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};

use tracing::debug;

use crate::error::{AlignError, Result};

/// Read buffer per source. Column groups open several sources at once.
const READ_BUFFER: usize = 1024 * 1024;

/// Compression of a source file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Codec {
    /// Pick by file extension
    #[default]
    Auto,
    Xz,
    Zstd,
    Gzip,
    Plain,
}

impl Codec {
    /// Resolve `Auto` against a file name; explicit codecs are returned as-is
    pub fn for_path(self, path: &Path) -> Codec {
        match self {
            Codec::Auto => match path.extension().and_then(|ext| ext.to_str()) {
                Some("xz") | Some("lzma") => Codec::Xz,
                Some("zst") => Codec::Zstd,
                Some("gz") => Codec::Gzip,
                _ => Codec::Plain,
            },
            explicit => explicit,
        }
    }

    fn program(self) -> Option<&'static str> {
        match self {
            Codec::Xz => Some("xz"),
            Codec::Zstd => Some("zstd"),
            Codec::Gzip => Some("gzip"),
            Codec::Auto | Codec::Plain => None,
        }
    }
}

/// A buffered, forward-only line source
///
/// Dropping a source releases it: files are closed and a decompressor that is
/// still running is killed and reaped.
pub struct TextSource {
    label: String,
    inner: BufReader<Box<dyn Read + Send>>,
}

impl TextSource {
    /// Standard input, always read as plain text
    pub fn stdin() -> Self {
        Self::from_reader("<stdin>", io::stdin())
    }

    /// Wrap any reader (tests, in-memory data)
    pub fn from_reader(label: impl Into<String>, reader: impl Read + Send + 'static) -> Self {
        Self {
            label: label.into(),
            inner: BufReader::with_capacity(READ_BUFFER, Box::new(reader)),
        }
    }

    /// Open a file, decompressing it on the fly if `codec` says so
    pub fn open(path: &Path, codec: Codec) -> Result<Self> {
        let file = File::open(path).map_err(|io| AlignError::Open {
            path: path.to_path_buf(),
            io,
        })?;
        let label = path.display().to_string();

        match codec.for_path(path).program() {
            None => {
                debug!(path = %label, "opened plain source");
                Ok(Self::from_reader(label, file))
            }
            Some(program) => {
                let decoder = Decoder::spawn(program, path, file)?;
                debug!(path = %label, program, "opened compressed source");
                Ok(Self::from_reader(label, decoder))
            }
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Read for TextSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl BufRead for TextSource {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.inner.consume(amt)
    }
}

/// Decompressor child process fed from the compressed file on its stdin
///
/// The child's stderr is inherited so its diagnostics land next to ours and
/// a chatty tool can never block on a full pipe.
struct Decoder {
    program: &'static str,
    child: Child,
    stdout: ChildStdout,
    reaped: bool,
}

impl Decoder {
    fn spawn(program: &'static str, path: &Path, file: File) -> Result<Self> {
        let executable =
            which::which(program).map_err(|_| AlignError::MissingDecompressor { program })?;

        let open_error = |io: io::Error| AlignError::Open {
            path: path.to_path_buf(),
            io,
        };

        let mut child = Command::new(executable)
            .arg("-dc")
            .stdin(Stdio::from(file))
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|io| open_error(io))?;

        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(open_error(io::Error::other("decompressor has no stdout pipe")));
            }
        };

        Ok(Self {
            program,
            child,
            stdout,
            reaped: false,
        })
    }

    /// Reap the child at end of stream; a failed decompressor is a read error
    fn finish(&mut self) -> io::Result<()> {
        self.reaped = true;
        let status = self.child.wait()?;
        if status.success() {
            return Ok(());
        }
        Err(io::Error::other(format!("{} exited with {}", self.program, status)))
    }
}

impl Read for Decoder {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.stdout.read(buf)?;
        if n == 0 && !buf.is_empty() && !self.reaped {
            self.finish()?;
        }
        Ok(n)
    }
}

impl Drop for Decoder {
    fn drop(&mut self) {
        if !self.reaped {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}
