/*
*   # The bus
*   8 address lines, 8 data lines and the ENABLE/READ/WRITE
*   control lines give access to 256 byte wide slots. The
*   slots are split into two fixed regions:
*
*   * addresses 0..5   : inputs, 48 bits, the first 44 are wired
*   * addresses 6..255 : outputs, 250 bytes = 2000 bits
*
*   `driver` sequences single transactions on the pins,
*   `lock` makes sure only one transaction is on the bus at
*   any time.
*/

pub mod driver;
pub mod lock;

pub const INPUT_BASE: u8 = 0;
pub const INPUT_BYTES: usize = 6;
/// Number of inputs that are actually wired.
pub const INPUT_COUNT: usize = 44;

pub const OUTPUT_BASE: u8 = 6;
pub const OUTPUT_BYTES: usize = 250;
pub const OUTPUT_COUNT: usize = OUTPUT_BYTES * 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region
{
    Input,
    Output
}

impl Region
{
    pub fn base(self) -> u8
    {
        match self
        {
            Region::Input => INPUT_BASE,
            Region::Output => OUTPUT_BASE
        }
    }

    pub fn len(self) -> usize
    {
        match self
        {
            Region::Input => INPUT_BYTES,
            Region::Output => OUTPUT_BYTES
        }
    }

    pub fn contains(self, address: u8) -> bool
    {
        let address = address as usize;
        let base = self.base() as usize;
        address >= base && address < base + self.len()
    }

    /// Address of the byte at `offset` within the region.
    pub fn address(self, offset: usize) -> Option<u8>
    {
        if offset < self.len()
        {
            return Some(self.base() + offset as u8);
        }
        None
    }
}

impl std::fmt::Display for Region
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        match self
        {
            Region::Input => write!(f, "input"),
            Region::Output => write!(f, "output")
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::bus::*;

    #[test]
    fn regions_cover_the_whole_address_space_without_overlap()
    {
        for a in 0..=255u8
        {
            assert!(Region::Input.contains(a) != Region::Output.contains(a));
        }
        assert!(Region::Input.contains(5));
        assert!(Region::Output.contains(6));
        assert!(Region::Output.contains(255));
    }

    #[test]
    fn offset_past_region_end_has_no_address()
    {
        assert_eq!(Some(255), Region::Output.address(249));
        assert_eq!(None, Region::Output.address(250));
        assert_eq!(None, Region::Input.address(6));
    }
}
