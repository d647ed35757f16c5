use crate::{bus::{INPUT_BYTES, INPUT_COUNT, OUTPUT_COUNT}, codec::{implode, Bits}, core::shareable::Shareable};

/// # CachedState
/// Last known value of every I/O point.
///
/// * inputs: one bit per scanned input line (48), only
///   written by the poller, one whole pass at a time.
/// * outputs: one bit per output point (2000), only
///   written by the output writer after a successful
///   bus write, one whole byte at a time.
///
/// Everything starts out as 0, output state is not
/// persisted.
pub struct CachedState
{
    inputs: Shareable<Vec<bool>>,
    outputs: Shareable<Vec<bool>>
}

impl CachedState
{
    pub fn new() -> Self
    {
        CachedState
        {
            inputs: Shareable::new(vec![false; INPUT_BYTES * 8]),
            outputs: Shareable::new(vec![false; OUTPUT_COUNT])
        }
    }

    /// The wired inputs as of the last completed poll pass.
    pub fn inputs_snapshot(&self) -> Vec<bool>
    {
        self.inputs.lock()[..INPUT_COUNT].to_vec()
    }

    /// Replaces the complete input image. Returns true if
    /// any wired input differs from the previous image.
    pub(crate) fn replace_inputs(&self, scanned: Vec<bool>) -> bool
    {
        debug_assert_eq!(INPUT_BYTES * 8, scanned.len());
        let mut inputs = self.inputs.lock();
        let changed = inputs[..INPUT_COUNT] != scanned[..INPUT_COUNT];
        *inputs = scanned;
        changed
    }

    pub fn output(&self, index: usize) -> Option<bool>
    {
        self.outputs.lock().get(index).copied()
    }

    pub fn outputs_snapshot(&self) -> Vec<bool>
    {
        self.outputs.snapshot()
    }

    /// The eight cached bits of output byte `offset`
    /// (counted from the start of the output region).
    pub fn output_bits(&self, offset: usize) -> Bits
    {
        let outputs = self.outputs.lock();
        let mut bits = [false; 8];
        bits.copy_from_slice(&outputs[offset * 8..offset * 8 + 8]);
        bits
    }

    pub fn output_byte(&self, offset: usize) -> u8
    {
        implode(&self.output_bits(offset))
    }

    pub(crate) fn store_output_bits(&self, offset: usize, bits: Bits)
    {
        self.outputs.lock()[offset * 8..offset * 8 + 8].copy_from_slice(&bits);
    }
}

#[cfg(test)]
mod tests {
    use crate::state::*;

    #[test]
    fn starts_all_zero()
    {
        let s = CachedState::new();
        assert_eq!(vec![false; INPUT_COUNT], s.inputs_snapshot());
        assert!(s.outputs_snapshot().iter().all(|b| !b));
        assert_eq!(OUTPUT_COUNT, s.outputs_snapshot().len());
    }

    #[test]
    fn replace_inputs_reports_change_only_on_difference()
    {
        let s = CachedState::new();
        let mut v = vec![false; 48];
        assert!(!s.replace_inputs(v.clone()));
        v[43] = true;
        assert!(s.replace_inputs(v.clone()));
        assert!(!s.replace_inputs(v.clone()));
        assert!(s.inputs_snapshot()[43]);
    }

    #[test]
    fn unwired_input_bits_do_not_count_as_change()
    {
        let s = CachedState::new();
        let mut v = vec![false; 48];
        v[44] = true;
        v[47] = true;
        assert!(!s.replace_inputs(v));
        assert_eq!(INPUT_COUNT, s.inputs_snapshot().len());
    }

    #[test]
    fn output_bytes_are_sliced_on_byte_boundaries()
    {
        let s = CachedState::new();
        let mut bits = [false; 8];
        bits[3] = true;
        s.store_output_bits(1, bits);

        assert_eq!(0, s.output_byte(0));
        assert_eq!(0b0000_1000, s.output_byte(1));
        assert_eq!(0, s.output_byte(2));
        assert_eq!(Some(true), s.output(11));
        assert_eq!(None, s.output(OUTPUT_COUNT));
    }
}
