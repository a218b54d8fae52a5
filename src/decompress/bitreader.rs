use crate::error::{InflateError, InflateResult};

/// Width of the shift register in bits.
const BITBUF_BITS: u32 = u64::BITS;

/// LSB-first reader over an in-memory DEFLATE stream.
///
/// Bits are buffered in a 64-bit shift register; `bitcount` low-order bits of
/// `bitbuf` are valid and everything above them is zero. `pos` never exceeds
/// `input.len()`.
#[derive(Clone, Debug)]
pub struct BitReader<'a> {
    input: &'a [u8],
    pos: usize,
    bitbuf: u64,
    bitcount: u32,
}

impl<'a> BitReader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            bitbuf: 0,
            bitcount: 0,
        }
    }

    /// Byte offset of the next unread input byte. Buffered bits are not
    /// accounted for; call `byte_align` first for an exact position.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining_bytes(&self) -> usize {
        self.input.len() - self.pos
    }

    #[inline]
    pub fn bits_available(&self) -> u32 {
        self.bitcount
    }

    /// Pulls four bytes at once when the register is at most half full.
    #[inline]
    pub fn refill(&mut self) {
        if self.bitcount > BITBUF_BITS / 2 {
            return;
        }
        if let Some(word) = self.input.get(self.pos..self.pos + 4) {
            let word = u32::from_le_bytes([word[0], word[1], word[2], word[3]]);
            self.bitbuf |= (word as u64) << self.bitcount;
            self.bitcount += 32;
            self.pos += 4;
        }
    }

    #[inline]
    fn pull_byte(&mut self) -> bool {
        match self.input.get(self.pos) {
            Some(&byte) => {
                self.bitbuf |= (byte as u64) << self.bitcount;
                self.bitcount += 8;
                self.pos += 1;
                true
            }
            None => false,
        }
    }

    /// Returns the next `width` bits (at most 16) without consuming them.
    ///
    /// Near the end of input the result is zero-extended; compare
    /// `bits_available()` against the code length before consuming.
    #[inline]
    pub fn peek(&mut self, width: u32) -> u32 {
        debug_assert!(width <= 16);
        if self.bitcount < width && self.pull_byte() && self.bitcount < width {
            self.pull_byte();
        }
        (self.bitbuf & ((1u64 << width) - 1)) as u32
    }

    /// Drops `n` bits that a previous `peek` showed to be present.
    #[inline]
    pub fn consume(&mut self, n: u32) {
        debug_assert!(n <= self.bitcount, "consumed {} of {} bits", n, self.bitcount);
        self.bitbuf >>= n;
        self.bitcount -= n;
    }

    /// Reads and consumes `width` bits (at most 16).
    #[inline]
    pub fn get(&mut self, width: u32) -> InflateResult<u32> {
        if width == 0 {
            return Ok(0);
        }
        let value = self.peek(width);
        if self.bitcount < width {
            return Err(InflateError::ShortInput);
        }
        self.consume(width);
        Ok(value)
    }

    /// Discards the partial byte and hands whole buffered bytes back to the
    /// input, leaving the register empty on a byte boundary.
    ///
    /// Fails with `CursorUnderflow` if the register holds more whole bytes
    /// than were pulled from the input. Bits only enter the register through
    /// `refill` and `peek`, so this cannot happen while decoding.
    pub fn byte_align(&mut self) -> InflateResult<()> {
        let unused_bytes = (self.bitcount / 8) as usize;
        if unused_bytes > self.pos {
            return Err(InflateError::CursorUnderflow);
        }
        self.pos -= unused_bytes;
        self.bitbuf = 0;
        self.bitcount = 0;
        Ok(())
    }

    /// Unread input after the cursor. Only meaningful when byte aligned.
    #[inline]
    pub fn remaining(&self) -> &'a [u8] {
        debug_assert_eq!(self.bitcount, 0);
        &self.input[self.pos..]
    }

    /// Moves the cursor by `delta` bytes, bypassing the register.
    pub fn adjust_cursor(&mut self, delta: isize) -> InflateResult<()> {
        debug_assert_eq!(self.bitcount, 0);
        let target = if delta < 0 {
            self.pos
                .checked_sub(delta.unsigned_abs())
                .ok_or(InflateError::CursorUnderflow)?
        } else {
            self.pos
                .checked_add(delta as usize)
                .ok_or(InflateError::ShortInput)?
        };
        if target > self.input.len() {
            return Err(InflateError::ShortInput);
        }
        self.pos = target;
        Ok(())
    }
}
