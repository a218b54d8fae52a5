#![allow(dead_code)]

use libdeflater::{CompressionLvl, Compressor};

pub fn zlib(data: &[u8], level: i32) -> Vec<u8> {
    let mut compressor = Compressor::new(CompressionLvl::new(level).unwrap());
    let mut out = vec![0u8; compressor.zlib_compress_bound(data.len())];
    let size = compressor.zlib_compress(data, &mut out).unwrap();
    out.truncate(size);
    out
}

pub fn deflate(data: &[u8], level: i32) -> Vec<u8> {
    let mut compressor = Compressor::new(CompressionLvl::new(level).unwrap());
    let mut out = vec![0u8; compressor.deflate_compress_bound(data.len())];
    let size = compressor.deflate_compress(data, &mut out).unwrap();
    out.truncate(size);
    out
}

/// Wraps a raw DEFLATE stream in a default zlib header and the trailer for
/// `original`.
pub fn wrap_zlib(deflate: &[u8], original: &[u8]) -> Vec<u8> {
    let mut out = vec![0x78, 0x9C];
    out.extend_from_slice(deflate);
    out.extend_from_slice(&libdeflater::adler32(original).to_be_bytes());
    out
}

/// Deterministic bytes that defeat LZ77 matching.
pub fn noise(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (state >> 16) as u8
        })
        .collect()
}

/// Text with plenty of repeats at short and long distances.
pub fn text(len: usize) -> Vec<u8> {
    let words = [
        "license ", "permission ", "software ", "copyright ", "the ", "of ", "notice ",
        "warranty ", "\n", "MIT ", "Apache ", "BSD ",
    ];
    let mut out = Vec::with_capacity(len);
    let mut i = 0usize;
    while out.len() < len {
        let w = words[(i * 7 + i / 13) % words.len()];
        out.extend_from_slice(w.as_bytes());
        i += 1;
    }
    out.truncate(len);
    out
}

/// LSB-first bit packer for hand-built DEFLATE streams.
pub struct BitWriter {
    out: Vec<u8>,
    bitbuf: u64,
    bitcount: u32,
}

impl BitWriter {
    pub fn new() -> Self {
        Self {
            out: Vec::new(),
            bitbuf: 0,
            bitcount: 0,
        }
    }

    pub fn bits(&mut self, value: u32, n: u32) {
        self.bitbuf |= (value as u64) << self.bitcount;
        self.bitcount += n;
        while self.bitcount >= 8 {
            self.out.push(self.bitbuf as u8);
            self.bitbuf >>= 8;
            self.bitcount -= 8;
        }
    }

    /// Writes a Huffman codeword, most significant bit first.
    pub fn code(&mut self, codeword: u32, len: u32) {
        self.bits(codeword.reverse_bits() >> (32 - len), len);
    }

    pub fn block_header(&mut self, is_final: bool, block_type: u32) {
        self.bits(is_final as u32, 1);
        self.bits(block_type, 2);
    }

    pub fn fixed_litlen(&mut self, sym: u32) {
        match sym {
            0..=143 => self.code(0x30 + sym, 8),
            144..=255 => self.code(0x190 + sym - 144, 9),
            256..=279 => self.code(sym - 256, 7),
            _ => self.code(0xC0 + sym - 280, 8),
        }
    }

    pub fn fixed_offset(&mut self, sym: u32) {
        self.code(sym, 5);
    }

    pub fn align(&mut self) {
        if self.bitcount > 0 {
            self.out.push(self.bitbuf as u8);
            self.bitbuf = 0;
            self.bitcount = 0;
        }
    }

    pub fn bytes(&mut self, data: &[u8]) {
        assert_eq!(self.bitcount, 0);
        self.out.extend_from_slice(data);
    }

    pub fn stored(&mut self, is_final: bool, payload: &[u8]) {
        self.block_header(is_final, 0);
        self.align();
        let len = payload.len() as u16;
        self.bytes(&len.to_le_bytes());
        self.bytes(&(!len).to_le_bytes());
        self.bytes(payload);
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.align();
        self.out
    }
}
