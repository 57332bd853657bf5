use fdeflate::Decompressor;

use super::Limits;
use crate::error::{DataCorruptError, DecodingError, Result};

/// Ergonomics wrapper around `fdeflate::Decompressor` for the zlib stream spread over `IDAT`
/// chunks.
///
/// The stream may be split on arbitrary byte boundaries, so every `IDAT` payload is pushed through
/// [`ZlibStream::decompress`] in encounter order and [`ZlibStream::finish`] flushes the rest.
pub(crate) struct ZlibStream {
    /// Current decoding state.
    state: Box<Decompressor>,
    /// If there has been a call to decompress already.
    started: bool,
    /// Ignore and do not calculate the Adler-32 checksum. Defaults to `true`.
    ///
    /// This flag should not be modified after decompression has started.
    ignore_adler32: bool,
    /// Decompressed bytes in `out[..filled]`. The rest is scratch space for the decompressor.
    out: Vec<u8>,
    filled: usize,
    limits: Limits,
    /// Exact inflated size, if known. Output past it is rejected as soon as it appears.
    expected: Option<usize>,
}

impl ZlibStream {
    /// Initial output allocation, grown on demand up to the limits.
    const INITIAL_BYTES: usize = 32 * 1024;

    pub(crate) fn new(limits: Limits) -> Self {
        ZlibStream {
            state: Box::new(Decompressor::new()),
            started: false,
            ignore_adler32: true,
            out: Vec::new(),
            filled: 0,
            limits,
            expected: None,
        }
    }

    /// Prepares a stream that must inflate to exactly `expected` bytes.
    ///
    /// The buffer starts smaller for large images and grows as data arrives, but never past one
    /// byte more than `expected`. Producing that byte fails with `SizeMismatch`.
    pub(crate) fn with_expected_size(limits: Limits, expected: usize) -> Self {
        let mut stream = ZlibStream::new(limits);
        stream.expected = Some(expected);
        let initial = expected
            .saturating_add(1)
            .min(Self::INITIAL_BYTES.max(expected / 4));
        stream.out.resize(initial, 0);
        stream
    }

    /// Set the `ignore_adler32` flag and return `true` if the flag was
    /// successfully set.
    ///
    /// The default is `true`.
    pub(crate) fn set_ignore_adler32(&mut self, flag: bool) -> bool {
        if !self.started {
            self.ignore_adler32 = flag;
            true
        } else {
            false
        }
    }

    /// Inflates as much of `data` as possible.
    pub(crate) fn decompress(&mut self, mut data: &[u8]) -> Result<()> {
        // There may be more data past the adler32 checksum at the end of the deflate stream. We
        // match libpng's default behavior and ignore any trailing data.
        if self.state.is_done() {
            if !data.is_empty() {
                log::warn!("ignoring {} bytes after the end of the zlib stream", data.len());
            }
            return Ok(());
        }

        if !self.started && self.ignore_adler32 {
            self.state.ignore_adler32();
        }
        self.started = true;

        while !data.is_empty() && !self.state.is_done() {
            self.reserve()?;
            let (in_consumed, out_produced) = self.read(data, false)?;
            self.check_overrun()?;
            data = &data[in_consumed..];

            if in_consumed == 0 && out_produced == 0 {
                // The decompressor holds on to a partial symbol and wants more input.
                break;
            }
        }

        if self.state.is_done() && !data.is_empty() {
            log::warn!("ignoring {} bytes after the end of the zlib stream", data.len());
        }

        Ok(())
    }

    /// Called after all `IDAT` chunks were handled. Flushes buffered output and returns the
    /// inflated stream.
    pub(crate) fn finish(mut self) -> Result<Vec<u8>> {
        if !self.started {
            return Err(DataCorruptError::UnexpectedEndOfStream.into());
        }

        while !self.state.is_done() {
            self.reserve()?;
            let (_, out_produced) = self.read(&[], true)?;
            self.check_overrun()?;
            if out_produced == 0 && !self.state.is_done() {
                return Err(DataCorruptError::UnexpectedEndOfStream.into());
            }
        }

        self.out.truncate(self.filled);
        log::debug!("inflated image data to {} bytes", self.filled);
        Ok(self.out)
    }

    fn read(&mut self, input: &[u8], end_of_input: bool) -> Result<(usize, usize)> {
        let (in_consumed, out_produced) = self
            .state
            .read(input, &mut self.out, self.filled, end_of_input)
            .map_err(DataCorruptError::Inflate)?;
        self.filled += out_produced;
        Ok((in_consumed, out_produced))
    }

    fn check_overrun(&self) -> Result<()> {
        match self.expected {
            Some(expected) if self.filled > expected => Err(DataCorruptError::SizeMismatch {
                expected,
                actual: self.filled,
            }
            .into()),
            _ => Ok(()),
        }
    }

    /// Makes sure there is room for more output, growing the buffer within the limits.
    fn reserve(&mut self) -> Result<()> {
        if self.filled < self.out.len() {
            return Ok(());
        }

        let max_len = match self.expected {
            Some(expected) => expected.saturating_add(1),
            None => self.limits.bytes,
        };
        let len = self.out.len();
        let grown = len
            .saturating_mul(2)
            .max(len.saturating_add(Self::INITIAL_BYTES))
            .min(max_len);
        if grown <= len {
            return Err(DecodingError::LimitsExceeded);
        }
        self.out.resize(grown, 0);
        Ok(())
    }
}
