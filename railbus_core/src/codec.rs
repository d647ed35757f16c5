//! Byte <-> bit conversions used to put addresses and
//! data bytes onto the 8-line pin groups. Bit 0 is the
//! least significant bit and maps onto line 0 of a group.

pub type Bits = [bool; 8];

pub fn explode(byte: u8) -> Bits
{
    let mut bits = [false; 8];
    for (k, bit) in bits.iter_mut().enumerate()
    {
        *bit = (byte >> k) & 0x01 != 0;
    }
    bits
}

/// Inverse of `explode`. Folds the most significant
/// bit (index 7) in first.
pub fn implode(bits: &Bits) -> u8
{
    bits.iter()
        .rev()
        .fold(0u8, |byte, bit| (byte << 1) | (*bit as u8))
}
