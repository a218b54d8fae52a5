pub mod bitreader;
pub mod huffman;
mod tables;
pub mod zlib;

use self::bitreader::BitReader;
use self::huffman::{BlockCodes, HuffmanTable, static_codes};
use self::tables::*;
use crate::adler32::Adler32;
use crate::common::*;
use crate::error::{InflateError, InflateResult};
use tracing::{debug, trace};

pub use self::zlib::{ZlibHeader, parse_header};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecompressorState {
    BlockHeader,
    UncompressedBody { len: usize },
    HuffmanBody,
    Done,
}

/// Outcome of a successful raw DEFLATE decode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Inflated {
    /// Bytes of input up to and including the last byte of the final block.
    pub input_consumed: usize,
    pub output_produced: usize,
}

/// One-shot DEFLATE block decoder.
///
/// Every call to [`Decompressor::decompress`] starts from a clean state, so a
/// single instance can be reused for unrelated streams.
#[derive(Clone)]
pub struct Decompressor {
    pub(crate) state: DecompressorState,
    pub(crate) is_final_block: bool,
    pub(crate) precode_lens: [u8; DEFLATE_NUM_PRECODE_SYMS],
    pub(crate) lens: [u8; DEFLATE_NUM_LITLEN_SYMS + DEFLATE_NUM_OFFSET_SYMS],
}

impl Default for Decompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Decompressor {
    pub fn new() -> Self {
        Self {
            state: DecompressorState::BlockHeader,
            is_final_block: false,
            precode_lens: [0; DEFLATE_NUM_PRECODE_SYMS],
            lens: [0; DEFLATE_NUM_LITLEN_SYMS + DEFLATE_NUM_OFFSET_SYMS],
        }
    }

    pub fn state(&self) -> DecompressorState {
        self.state
    }

    fn reset(&mut self) {
        self.state = DecompressorState::BlockHeader;
        self.is_final_block = false;
        self.precode_lens = [0; DEFLATE_NUM_PRECODE_SYMS];
        self.lens = [0; DEFLATE_NUM_LITLEN_SYMS + DEFLATE_NUM_OFFSET_SYMS];
    }

    /// Decodes a complete raw DEFLATE stream into `output`.
    pub fn decompress(&mut self, input: &[u8], output: &mut [u8]) -> InflateResult<Inflated> {
        self.inflate(input, output, None)
    }

    /// Runs the block state machine, folding each finished block into
    /// `checksum` when one is supplied.
    pub(crate) fn inflate(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        mut checksum: Option<&mut Adler32>,
    ) -> InflateResult<Inflated> {
        self.reset();
        let mut reader = BitReader::new(input);
        let mut out_idx = 0;
        let mut block_start = 0;
        let mut dynamic_codes: Option<BlockCodes> = None;

        loop {
            match self.state {
                DecompressorState::BlockHeader => {
                    let header = reader.get(3)?;
                    self.is_final_block = header & 1 != 0;
                    let block_type = (header >> 1) as u8;
                    block_start = out_idx;
                    trace!(block_type, is_final = self.is_final_block, out_idx, "block header");

                    self.state = match block_type {
                        DEFLATE_BLOCKTYPE_UNCOMPRESSED => {
                            reader.byte_align()?;
                            let len = reader.get(16)? as u16;
                            let nlen = reader.get(16)? as u16;
                            if len != !nlen {
                                return Err(InflateError::StoredLengthMismatch { len, nlen });
                            }
                            DecompressorState::UncompressedBody { len: len as usize }
                        }
                        DEFLATE_BLOCKTYPE_STATIC_HUFFMAN => DecompressorState::HuffmanBody,
                        DEFLATE_BLOCKTYPE_DYNAMIC_HUFFMAN => {
                            dynamic_codes = Some(self.read_dynamic_huffman_header(&mut reader)?);
                            DecompressorState::HuffmanBody
                        }
                        _ => return Err(InflateError::ReservedBlockType),
                    };
                }
                DecompressorState::UncompressedBody { len } => {
                    let payload = reader.remaining();
                    if payload.len() < len {
                        return Err(InflateError::ShortInput);
                    }
                    let dest = output
                        .get_mut(out_idx..out_idx + len)
                        .ok_or(InflateError::OutputExhausted)?;
                    dest.copy_from_slice(&payload[..len]);
                    reader.adjust_cursor(len as isize)?;
                    out_idx += len;
                    self.finish_block(&output[block_start..out_idx], checksum.as_deref_mut());
                }
                DecompressorState::HuffmanBody => {
                    // Dynamic codes live only for the block that transmitted them.
                    let dynamic = dynamic_codes.take();
                    let codes = match &dynamic {
                        Some(codes) => codes,
                        None => static_codes()?,
                    };
                    decompress_huffman_block(&mut reader, output, &mut out_idx, codes)?;
                    self.finish_block(&output[block_start..out_idx], checksum.as_deref_mut());
                }
                DecompressorState::Done => {
                    reader.byte_align()?;
                    let inflated = Inflated {
                        input_consumed: reader.position(),
                        output_produced: out_idx,
                    };
                    debug!(?inflated, "deflate stream complete");
                    return Ok(inflated);
                }
            }
        }
    }

    fn finish_block(&mut self, produced: &[u8], checksum: Option<&mut Adler32>) {
        if let Some(sum) = checksum {
            sum.update(produced);
        }
        self.state = if self.is_final_block {
            DecompressorState::Done
        } else {
            DecompressorState::BlockHeader
        };
    }

    fn read_dynamic_huffman_header(&mut self, reader: &mut BitReader<'_>) -> InflateResult<BlockCodes> {
        let num_litlen_syms = DEFLATE_MIN_LITLEN_SYMS + reader.get(5)? as usize;
        let num_offset_syms = DEFLATE_MIN_OFFSET_SYMS + reader.get(5)? as usize;
        let num_precode_syms = DEFLATE_MIN_PRECODE_SYMS + reader.get(4)? as usize;

        self.precode_lens = [0; DEFLATE_NUM_PRECODE_SYMS];
        for &sym in &PRECODE_PERMUTATION[..num_precode_syms] {
            self.precode_lens[sym] = reader.get(3)? as u8;
        }
        let precode = HuffmanTable::build(&self.precode_lens)?;

        let total_syms = num_litlen_syms + num_offset_syms;
        let mut i = 0;
        while i < total_syms {
            let presym = precode.decode(reader)?;
            let (value, count) = match presym {
                0..=15 => (presym as u8, 1),
                16 => {
                    if i == 0 {
                        return Err(InflateError::RepeatWithoutPrevious);
                    }
                    (self.lens[i - 1], 3 + reader.get(2)? as usize)
                }
                17 => (0, 3 + reader.get(3)? as usize),
                18 => (0, 11 + reader.get(7)? as usize),
                _ => return Err(InflateError::InvalidCode),
            };
            if i + count > total_syms {
                return Err(InflateError::LengthsOverrun);
            }
            self.lens[i..i + count].fill(value);
            i += count;
        }

        if self.lens[DEFLATE_END_OF_BLOCK] == 0 {
            return Err(InflateError::MissingEndOfBlock);
        }

        trace!(num_litlen_syms, num_offset_syms, num_precode_syms, "dynamic huffman header");
        Ok(BlockCodes {
            litlen: HuffmanTable::build(&self.lens[..num_litlen_syms])?,
            offset: HuffmanTable::build(&self.lens[num_litlen_syms..total_syms])?,
        })
    }
}

/// Decodes literal/length symbols until end-of-block.
fn decompress_huffman_block(
    reader: &mut BitReader<'_>,
    output: &mut [u8],
    out_idx: &mut usize,
    codes: &BlockCodes,
) -> InflateResult<()> {
    loop {
        let sym = codes.litlen.decode(reader)? as usize;
        if sym < DEFLATE_NUM_LITERALS {
            let slot = output.get_mut(*out_idx).ok_or(InflateError::OutputExhausted)?;
            *slot = sym as u8;
            *out_idx += 1;
            continue;
        }
        if sym == DEFLATE_END_OF_BLOCK {
            return Ok(());
        }

        let len_idx = sym - DEFLATE_FIRST_LEN_SYM;
        if len_idx >= LENGTH_BASE.len() {
            return Err(InflateError::InvalidCode);
        }
        let length =
            LENGTH_BASE[len_idx] as usize + reader.get(LENGTH_EXTRA_BITS[len_idx] as u32)? as usize;

        let offset_sym = codes.offset.decode(reader)? as usize;
        if offset_sym >= OFFSET_BASE.len() {
            return Err(InflateError::InvalidCode);
        }
        let offset = OFFSET_BASE[offset_sym] as usize
            + reader.get(OFFSET_EXTRA_BITS[offset_sym] as u32)? as usize;

        if offset > *out_idx {
            return Err(InflateError::DistanceTooFarBack {
                distance: offset,
                produced: *out_idx,
            });
        }
        if output.len() - *out_idx < length {
            return Err(InflateError::OutputExhausted);
        }
        copy_match(output, *out_idx, offset, length);
        *out_idx += length;
    }
}

/// Copies `length` bytes from `offset` bytes back. The regions may overlap,
/// in which case bytes written earlier in the copy are read again.
#[inline]
fn copy_match(output: &mut [u8], dest: usize, offset: usize, length: usize) {
    let src = dest - offset;
    if offset >= length {
        output.copy_within(src..src + length, dest);
    } else if offset == 1 {
        let b = output[src];
        output[dest..dest + length].fill(b);
    } else {
        for i in 0..length {
            output[dest + i] = output[src + i];
        }
    }
}
