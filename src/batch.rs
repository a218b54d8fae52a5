use crate::decompress::Decompressor;
use crate::error::InflateResult;
use rayon::prelude::*;

/// Decodes independent buffers in parallel. Each rayon worker owns its own
/// [`Decompressor`], so no decoder state is shared between streams.
#[derive(Clone, Copy, Debug)]
pub struct BatchDecompressor {
    verify_checksum: bool,
}

impl Default for BatchDecompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchDecompressor {
    pub fn new() -> Self {
        Self {
            verify_checksum: true,
        }
    }

    pub fn with_verify_checksum(mut self, verify: bool) -> Self {
        self.verify_checksum = verify;
        self
    }

    /// Raw DEFLATE streams; `max_out_sizes[i]` bounds the output of `inputs[i]`.
    pub fn decompress_batch(
        &self,
        inputs: &[&[u8]],
        max_out_sizes: &[usize],
    ) -> Vec<InflateResult<Vec<u8>>> {
        inputs
            .par_iter()
            .zip(max_out_sizes.par_iter())
            .map_init(Decompressor::new, |decompressor, (&input, &max_size)| -> InflateResult<Vec<u8>> {
                let mut output = vec![0u8; max_size];
                let res = decompressor.decompress(input, &mut output)?;
                output.truncate(res.output_produced);
                Ok(output)
            })
            .collect()
    }

    /// zlib streams, verified according to this batch's checksum setting.
    pub fn decompress_zlib_batch(
        &self,
        inputs: &[&[u8]],
        max_out_sizes: &[usize],
    ) -> Vec<InflateResult<Vec<u8>>> {
        let verify = self.verify_checksum;
        inputs
            .par_iter()
            .zip(max_out_sizes.par_iter())
            .map_init(Decompressor::new, |decompressor, (&input, &max_size)| -> InflateResult<Vec<u8>> {
                let mut output = vec![0u8; max_size];
                let len = decompressor.feed(input, &mut output, verify)?;
                output.truncate(len);
                Ok(output)
            })
            .collect()
    }
}
