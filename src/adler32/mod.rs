const DIVISOR: u32 = 65521;

// Largest n such that 255n(n+1)/2 + (n+1)(DIVISOR-1) fits in u32.
const MAX_CHUNK_LEN: usize = 5552;

const SHORT_SPAN: usize = 16;

/// Streaming Adler-32 accumulator.
///
/// `s1` is the running byte sum, `s2` the running sum of `s1`; both are kept
/// reduced modulo 65521 between calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Adler32 {
    s1: u32,
    s2: u32,
}

impl Default for Adler32 {
    fn default() -> Self {
        Self::new()
    }
}

impl Adler32 {
    pub fn new() -> Self {
        Self { s1: 1, s2: 0 }
    }

    /// Resumes from a previously finished value.
    pub fn from_checksum(adler: u32) -> Self {
        Self {
            s1: (adler & 0xFFFF) % DIVISOR,
            s2: (adler >> 16) % DIVISOR,
        }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        match bytes.len() {
            0 => {}
            1 => self.update_byte(bytes[0]),
            n if n < SHORT_SPAN => self.update_short(bytes),
            _ => {
                for chunk in bytes.chunks(MAX_CHUNK_LEN) {
                    adler32_chunk(&mut self.s1, &mut self.s2, chunk);
                }
            }
        }
    }

    #[inline]
    fn update_byte(&mut self, b: u8) {
        self.s1 += b as u32;
        if self.s1 >= DIVISOR {
            self.s1 -= DIVISOR;
        }
        self.s2 += self.s1;
        if self.s2 >= DIVISOR {
            self.s2 -= DIVISOR;
        }
    }

    #[inline]
    fn update_short(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.s1 += b as u32;
            self.s2 += self.s1;
        }
        if self.s1 >= DIVISOR {
            self.s1 -= DIVISOR;
        }
        self.s2 %= DIVISOR;
    }

    pub fn finish(&self) -> u32 {
        (self.s2 << 16) | self.s1
    }
}

/// Folds at most `MAX_CHUNK_LEN` bytes with a single reduction at the end.
#[inline]
fn adler32_chunk(s1: &mut u32, s2: &mut u32, p: &[u8]) {
    debug_assert!(p.len() <= MAX_CHUNK_LEN);
    let mut a = *s1;
    let mut b = *s2;

    let mut blocks = p.chunks_exact(16);
    for block in blocks.by_ref() {
        let mut weighted = 0u32;
        let mut sum = 0u32;
        for (i, &byte) in block.iter().enumerate() {
            weighted += (16 - i as u32) * byte as u32;
            sum += byte as u32;
        }
        b += (a << 4) + weighted;
        a += sum;
    }

    for &byte in blocks.remainder() {
        a += byte as u32;
        b += a;
    }

    *s1 = a % DIVISOR;
    *s2 = b % DIVISOR;
}

/// Continues the checksum `adler` over `slice`. Start a new stream with `1`.
pub fn adler32(adler: u32, slice: &[u8]) -> u32 {
    let mut state = Adler32::from_checksum(adler);
    state.update(slice);
    state.finish()
}
