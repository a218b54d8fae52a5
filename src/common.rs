pub const DEFLATE_BLOCKTYPE_UNCOMPRESSED: u8 = 0;
pub const DEFLATE_BLOCKTYPE_STATIC_HUFFMAN: u8 = 1;
pub const DEFLATE_BLOCKTYPE_DYNAMIC_HUFFMAN: u8 = 2;

pub const DEFLATE_MIN_MATCH_LEN: usize = 3;
pub const DEFLATE_MAX_MATCH_LEN: usize = 258;

pub const DEFLATE_MAX_MATCH_OFFSET: usize = 32768;

pub const DEFLATE_NUM_PRECODE_SYMS: usize = 19;
pub const DEFLATE_NUM_LITLEN_SYMS: usize = 288;
pub const DEFLATE_NUM_OFFSET_SYMS: usize = 32;

pub const DEFLATE_NUM_LITERALS: usize = 256;
pub const DEFLATE_END_OF_BLOCK: usize = 256;
pub const DEFLATE_FIRST_LEN_SYM: usize = 257;

pub const DEFLATE_MIN_LITLEN_SYMS: usize = 257;
pub const DEFLATE_MIN_OFFSET_SYMS: usize = 1;
pub const DEFLATE_MIN_PRECODE_SYMS: usize = 4;

pub const DEFLATE_MAX_CODEWORD_LEN: usize = 15;

pub const DEFLATE_MAX_EXTRA_LENGTH_BITS: usize = 5;
pub const DEFLATE_MAX_EXTRA_OFFSET_BITS: usize = 13;

pub const ZLIB_MIN_HEADER_SIZE: usize = 2;
pub const ZLIB_FOOTER_SIZE: usize = 4;

pub const ZLIB_CM_DEFLATE: u8 = 8;
pub const ZLIB_CINFO_32K_WINDOW: u8 = 7;
pub const ZLIB_FDICT: u8 = 0x20;
pub const ZLIB_HEADER_CHECK_DIVISOR: u16 = 31;
