use std::fmt;

/// # Opcodes
/// A raw 16-bit opcode split into the four nibbles the decoder matches on.
///
/// Opcodes are fetched high byte first and laid out as `[family x y n]`:
/// - `family` picks the instruction group
/// - inside groups `0x0`, `0x8`, `0xE` and `0xF` the low nibble, or the low byte, picks the operation
/// - everywhere else `x` and `y` name registers, `nn` is an immediate byte and `nnn` an address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub family: u8,
    pub x: u8,
    pub y: u8,
    pub n: u8,
}

impl Opcode {
    /// `[__nn]`
    pub fn nn(self) -> u8 {
        self.y << 4 | self.n
    }

    /// `[_nnn]`
    pub fn nnn(self) -> u16 {
        u16::from(self.x) << 8 | u16::from(self.nn())
    }

    pub fn word(self) -> u16 {
        u16::from(self.family) << 12 | self.nnn()
    }
}

impl From<u16> for Opcode {
    fn from(word: u16) -> Self {
        let [high, low] = word.to_be_bytes();
        Opcode {
            family: high >> 4,
            x: high & 0xF,
            y: low >> 4,
            n: low & 0xF,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04X}", self.word())
    }
}
