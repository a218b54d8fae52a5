use super::bitreader::BitReader;
use super::tables::{STATIC_OFFSET_LENS, static_litlen_lens};
use crate::common::*;
use crate::error::{InflateError, InflateResult};
use std::sync::OnceLock;

/// Codewords up to this length resolve with a single table probe.
pub const FAST_TABLEBITS: u32 = 9;
const FAST_TABLE_SIZE: usize = 1 << FAST_TABLEBITS;
const FAST_TABLE_MASK: u32 = (1 << FAST_TABLEBITS) - 1;

/// Canonical Huffman decode structure.
///
/// `counts[len]` is the number of codewords of each length and `symbols`
/// lists the coded symbols sorted by (length, symbol). `fast` is indexed by
/// the next `FAST_TABLEBITS` stream bits; a nonzero entry packs
/// `symbol << 4 | length`, zero means the codeword is longer (or absent).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HuffmanTable {
    fast: Vec<u16>,
    counts: [u16; DEFLATE_MAX_CODEWORD_LEN + 1],
    symbols: Vec<u16>,
}

impl HuffmanTable {
    /// Builds a decoder from per-symbol code lengths (0 = unused).
    ///
    /// Over-subscribed length sets are rejected. An incomplete set is only
    /// accepted when it is empty or holds a single codeword of length 1.
    pub fn build(lens: &[u8]) -> InflateResult<Self> {
        let mut counts = [0u16; DEFLATE_MAX_CODEWORD_LEN + 1];
        for &len in lens {
            if len as usize > DEFLATE_MAX_CODEWORD_LEN {
                return Err(InflateError::BadHuffmanTable);
            }
            counts[len as usize] += 1;
        }
        counts[0] = 0;

        let mut codespace_left: i32 = 1;
        for &count in &counts[1..] {
            codespace_left <<= 1;
            codespace_left -= count as i32;
            if codespace_left < 0 {
                return Err(InflateError::BadHuffmanTable);
            }
        }

        let num_used: usize = counts.iter().map(|&c| c as usize).sum();
        if codespace_left > 0 && num_used != 0 && !(num_used == 1 && counts[1] == 1) {
            return Err(InflateError::BadHuffmanTable);
        }

        let mut offsets = [0usize; DEFLATE_MAX_CODEWORD_LEN + 1];
        for len in 1..DEFLATE_MAX_CODEWORD_LEN {
            offsets[len + 1] = offsets[len] + counts[len] as usize;
        }
        let mut symbols = vec![0u16; num_used];
        for (sym, &len) in lens.iter().enumerate() {
            if len != 0 {
                symbols[offsets[len as usize]] = sym as u16;
                offsets[len as usize] += 1;
            }
        }

        let mut next_code = [0u32; DEFLATE_MAX_CODEWORD_LEN + 1];
        let mut code = 0u32;
        for len in 1..=DEFLATE_MAX_CODEWORD_LEN {
            code = (code + counts[len - 1] as u32) << 1;
            next_code[len] = code;
        }

        let mut fast = vec![0u16; FAST_TABLE_SIZE];
        for (sym, &len) in lens.iter().enumerate() {
            if len == 0 {
                continue;
            }
            let len = len as u32;
            let codeword = next_code[len as usize];
            next_code[len as usize] += 1;
            if len > FAST_TABLEBITS {
                continue;
            }
            // Codewords are packed MSB-first, the stream is read LSB-first.
            let reversed = (codeword.reverse_bits() >> (32 - len)) as usize;
            let entry = ((sym as u16) << 4) | len as u16;
            let mut index = reversed;
            while index < FAST_TABLE_SIZE {
                fast[index] = entry;
                index += 1 << len;
            }
        }

        Ok(Self {
            fast,
            counts,
            symbols,
        })
    }

    /// Number of symbols with a nonzero code length.
    pub fn num_codewords(&self) -> usize {
        self.symbols.len()
    }

    /// Decodes one symbol, consuming exactly its codeword.
    #[inline]
    pub fn decode(&self, reader: &mut BitReader<'_>) -> InflateResult<u16> {
        reader.refill();
        let bits = reader.peek(DEFLATE_MAX_CODEWORD_LEN as u32);
        let available = reader.bits_available();

        let entry = self.fast[(bits & FAST_TABLE_MASK) as usize];
        if entry != 0 {
            let len = (entry & 0xF) as u32;
            if len > available {
                return Err(InflateError::ShortInput);
            }
            reader.consume(len);
            return Ok(entry >> 4);
        }
        self.decode_slow(reader, bits, available)
    }

    /// Walks the canonical code one bit at a time.
    fn decode_slow(&self, reader: &mut BitReader<'_>, bits: u32, available: u32) -> InflateResult<u16> {
        let mut code: i32 = 0;
        let mut first: i32 = 0;
        let mut index: i32 = 0;
        for len in 1..=DEFLATE_MAX_CODEWORD_LEN as u32 {
            if len > available {
                return Err(InflateError::ShortInput);
            }
            code |= ((bits >> (len - 1)) & 1) as i32;
            let count = self.counts[len as usize] as i32;
            if code - count < first {
                reader.consume(len);
                return Ok(self.symbols[(index + (code - first)) as usize]);
            }
            index += count;
            first += count;
            first <<= 1;
            code <<= 1;
        }
        Err(InflateError::InvalidCode)
    }
}

/// The literal/length and distance codes in effect for one block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockCodes {
    pub litlen: HuffmanTable,
    pub offset: HuffmanTable,
}

static STATIC_CODES: OnceLock<BlockCodes> = OnceLock::new();

/// Fixed codes of block type 01, built once per process.
pub fn static_codes() -> InflateResult<&'static BlockCodes> {
    if let Some(codes) = STATIC_CODES.get() {
        return Ok(codes);
    }
    let codes = BlockCodes {
        litlen: HuffmanTable::build(&static_litlen_lens())?,
        offset: HuffmanTable::build(&STATIC_OFFSET_LENS)?,
    };
    Ok(STATIC_CODES.get_or_init(|| codes))
}
