use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Value stored by `,` once the input has nothing left to give.
pub const END_OF_INPUT: u8 = 0xFF;

/// Supplies one byte per `,` instruction.
///
/// This is the only place a run may block. Implementations decide what an
/// exhausted source yields; the ones in this module return [`END_OF_INPUT`].
pub trait ByteInput {
    fn read_byte(&mut self) -> io::Result<u8>;
}

/// Consumes one byte per `.` instruction.
pub trait ByteOutput {
    fn write_byte(&mut self, byte: u8) -> io::Result<()>;

    /// Called once when a run ends, whether it completed or failed.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ByteInput for &[u8] {
    fn read_byte(&mut self) -> io::Result<u8> {
        match self.split_first() {
            Some((&b, rest)) => {
                *self = rest;
                Ok(b)
            }
            None => Ok(END_OF_INPUT),
        }
    }
}

impl ByteInput for VecDeque<u8> {
    fn read_byte(&mut self) -> io::Result<u8> {
        Ok(self.pop_front().unwrap_or(END_OF_INPUT))
    }
}

impl ByteOutput for Vec<u8> {
    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.push(byte);
        Ok(())
    }
}

/// Byte input read from a console-like stream.
///
/// With a prompt writer attached the input behaves interactively: the
/// prompt is shown before every read, and the newline the user types after
/// their character is consumed so it does not feed the next `,`.
pub struct ConsoleInput<R, W> {
    reader: R,
    prompt: Option<W>,
}

impl<R: BufRead> ConsoleInput<R, io::Sink> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            prompt: None,
        }
    }
}

impl<R: BufRead, W: Write> ConsoleInput<R, W> {
    pub fn interactive(reader: R, prompt: W) -> Self {
        Self {
            reader,
            prompt: Some(prompt),
        }
    }

    fn next_raw(&mut self) -> io::Result<Option<u8>> {
        let buf = self.reader.fill_buf()?;
        let Some(&b) = buf.first() else {
            return Ok(None);
        };
        self.reader.consume(1);
        Ok(Some(b))
    }
}

impl<R: BufRead, W: Write> ByteInput for ConsoleInput<R, W> {
    fn read_byte(&mut self) -> io::Result<u8> {
        if let Some(prompt) = self.prompt.as_mut() {
            prompt.write_all(b"Enter a character: ")?;
            prompt.flush()?;
        }
        let Some(b) = self.next_raw()? else {
            return Ok(END_OF_INPUT);
        };
        if self.prompt.is_some() && b != b'\n' && self.reader.fill_buf()?.first() == Some(&b'\n') {
            self.reader.consume(1);
        }
        Ok(b)
    }
}

/// Byte output into any [`Write`].
pub struct WriterOutput<W> {
    inner: W,
}

impl<W: Write> WriterOutput<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> ByteOutput for WriterOutput<W> {
    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.inner.write_all(&[byte])
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
