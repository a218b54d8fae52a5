use crate::decompress::{Decompressor as InternalDecompressor, Inflated};
use crate::error::InflateResult;
use std::io;

pub const DEFAULT_LIMIT_RATIO: usize = 2000;
pub const DEFAULT_MAX_MEMORY_LIMIT: usize = 1 << 30;
const LIMIT_SLACK: usize = 4096;

/// `io::Result` front end over the block decoder.
///
/// The allocating methods size their output from `expected_size`, which is
/// bounded both relative to the input length and absolutely so that a tiny
/// hostile input cannot request a huge buffer.
pub struct Decompressor {
    inner: InternalDecompressor,
    verify_checksum: bool,
    limit_ratio: usize,
    max_memory_limit: usize,
}

impl Default for Decompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Decompressor {
    pub fn new() -> Self {
        Self {
            inner: InternalDecompressor::new(),
            verify_checksum: true,
            limit_ratio: DEFAULT_LIMIT_RATIO,
            max_memory_limit: DEFAULT_MAX_MEMORY_LIMIT,
        }
    }

    /// Whether zlib trailers are checked. On by default.
    pub fn set_verify_checksum(&mut self, verify: bool) {
        self.verify_checksum = verify;
    }

    pub fn set_limit_ratio(&mut self, ratio: usize) {
        self.limit_ratio = ratio;
    }

    pub fn set_max_memory_limit(&mut self, limit: usize) {
        self.max_memory_limit = limit;
    }

    pub fn decompress_deflate(&mut self, data: &[u8], expected_size: usize) -> io::Result<Vec<u8>> {
        self.decompress_helper(data, expected_size, |d, data, out| d.decompress(data, out))
    }

    pub fn decompress_deflate_into(&mut self, data: &[u8], output: &mut [u8]) -> io::Result<usize> {
        let res = self.inner.decompress(data, output)?;
        Ok(res.output_produced)
    }

    pub fn decompress_zlib(&mut self, data: &[u8], expected_size: usize) -> io::Result<Vec<u8>> {
        let verify = self.verify_checksum;
        self.decompress_helper(data, expected_size, |d, data, out| {
            d.decompress_zlib(data, out, verify)
        })
    }

    pub fn decompress_zlib_into(&mut self, data: &[u8], output: &mut [u8]) -> io::Result<usize> {
        let res = self.inner.decompress_zlib(data, output, self.verify_checksum)?;
        Ok(res.output_produced)
    }

    fn check_limits(&self, input_len: usize, expected_size: usize) -> io::Result<()> {
        if expected_size > self.max_memory_limit {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "expected size {} exceeds maximum memory limit {}",
                    expected_size, self.max_memory_limit
                ),
            ));
        }
        let ratio_limit = input_len
            .saturating_mul(self.limit_ratio)
            .saturating_add(LIMIT_SLACK);
        if expected_size > ratio_limit {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "expected size {} exceeds safety limit {} for {} input bytes",
                    expected_size, ratio_limit, input_len
                ),
            ));
        }
        Ok(())
    }

    fn decompress_helper<F>(
        &mut self,
        data: &[u8],
        expected_size: usize,
        f: F,
    ) -> io::Result<Vec<u8>>
    where
        F: FnOnce(&mut InternalDecompressor, &[u8], &mut [u8]) -> InflateResult<Inflated>,
    {
        self.check_limits(data.len(), expected_size)?;
        let mut output = vec![0u8; expected_size];
        let res = f(&mut self.inner, data, &mut output)?;
        output.truncate(res.output_produced);
        Ok(output)
    }
}
