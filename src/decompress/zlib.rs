use super::{Decompressor, Inflated};
use crate::adler32::Adler32;
use crate::common::*;
use crate::error::{InflateError, InflateResult};
use tracing::{debug, warn};

/// Fields of the 2-byte zlib header (RFC 1950, 2.2).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZlibHeader {
    /// Base-2 logarithm of the window size, minus 8.
    pub cinfo: u8,
    /// Compression level hint, 0 (fastest) to 3 (slowest).
    pub level: u8,
}

impl ZlibHeader {
    /// Window advertised by the encoder. Informational only: match distances
    /// are bounded by the output produced so far, not by this value.
    pub fn window_size(&self) -> usize {
        1 << (self.cinfo as usize + 8)
    }
}

/// Validates the zlib header at the start of `input`.
pub fn parse_header(input: &[u8]) -> InflateResult<ZlibHeader> {
    if input.len() < ZLIB_MIN_HEADER_SIZE {
        return Err(InflateError::ShortInput);
    }
    let hdr = u16::from_be_bytes([input[0], input[1]]);
    if hdr % ZLIB_HEADER_CHECK_DIVISOR != 0 {
        return Err(InflateError::BadHeaderChecksum);
    }
    let method = input[0] & 0xF;
    if method != ZLIB_CM_DEFLATE {
        return Err(InflateError::UnsupportedMethod(method));
    }
    let cinfo = input[0] >> 4;
    if cinfo > ZLIB_CINFO_32K_WINDOW {
        return Err(InflateError::UnsupportedWindow(cinfo));
    }
    if input[1] & ZLIB_FDICT != 0 {
        return Err(InflateError::PresetDictionary);
    }
    Ok(ZlibHeader {
        cinfo,
        level: input[1] >> 6,
    })
}

impl Decompressor {
    /// Decodes a zlib stream. The Adler-32 trailer is only read and compared
    /// when `verify_checksum` is set; otherwise decoding stops after the
    /// final block.
    pub fn decompress_zlib(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        verify_checksum: bool,
    ) -> InflateResult<Inflated> {
        let header = parse_header(input)?;
        debug!(?header, input_len = input.len(), "zlib header");
        let body = &input[ZLIB_MIN_HEADER_SIZE..];

        if !verify_checksum {
            let inflated = self.inflate(body, output, None)?;
            return Ok(Inflated {
                input_consumed: ZLIB_MIN_HEADER_SIZE + inflated.input_consumed,
                ..inflated
            });
        }

        let mut checksum = Adler32::new();
        let inflated = self.inflate(body, output, Some(&mut checksum))?;
        let trailer = body
            .get(inflated.input_consumed..inflated.input_consumed + ZLIB_FOOTER_SIZE)
            .ok_or(InflateError::ShortInput)?;
        let expected = u32::from_be_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
        let computed = checksum.finish();
        if expected != computed {
            warn!(expected, computed, "zlib checksum mismatch");
            return Err(InflateError::ChecksumMismatch { expected, computed });
        }

        Ok(Inflated {
            input_consumed: ZLIB_MIN_HEADER_SIZE + inflated.input_consumed + ZLIB_FOOTER_SIZE,
            output_produced: inflated.output_produced,
        })
    }

    /// Decodes a whole zlib buffer into `output` and returns the number of
    /// bytes written.
    pub fn feed(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        verify_checksum: bool,
    ) -> InflateResult<usize> {
        self.decompress_zlib(input, output, verify_checksum)
            .map(|inflated| inflated.output_produced)
    }
}
