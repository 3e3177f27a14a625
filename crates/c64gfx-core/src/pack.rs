//! Mapping between palette indices and the bit patterns the VIC-II reads.

use crate::mode::{Mode, SharedColors};

/// Color behind each bit pattern of one cell or sprite.
///
/// Hi-res modes use codes 0..=1, multicolor modes 0..=3. `None` marks a
/// pattern the cell does not use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SlotMap {
    slots: [Option<u8>; 4],
    bits: usize,
}

impl SlotMap {
    /// Slots for a resolved cell: `kept` holds its local colors in rank order.
    pub(crate) fn new(mode: Mode, kept: &[u8], shared: &SharedColors) -> Self {
        let local = |n: usize| kept.get(n).copied();
        let slots = match mode {
            // 1 = screen high nibble, 0 = screen low nibble
            Mode::BitmapHires => [local(1), local(0), None, None],
            // 00 = $D021, 01 = screen high, 10 = screen low, 11 = color RAM
            Mode::BitmapMulticolor => [Some(shared.background), local(0), local(1), local(2)],
            // 0 = transparent, 1 = sprite color
            Mode::SpriteHires => [Some(shared.slot(0)), local(0), None, None],
            // 00 = transparent, 01 = $D025, 10 = sprite color, 11 = $D026
            Mode::SpriteMulticolor => [
                Some(shared.slot(0)),
                Some(shared.slot(1)),
                local(0),
                Some(shared.slot(2)),
            ],
        };
        Self {
            slots,
            bits: mode.bits_per_pixel(),
        }
    }

    /// Bit pattern for `color`; the first matching slot wins.
    pub(crate) fn code(&self, color: u8) -> u8 {
        self.slots
            .iter()
            .position(|s| *s == Some(color))
            .unwrap_or(0) as u8
    }

    /// Pack a row of palette indices MSB first into `out`.
    pub(crate) fn pack_row(&self, row: &[u8], out: &mut [u8]) {
        let per_byte = 8 / self.bits;
        for (byte, chunk) in out.iter_mut().zip(row.chunks(per_byte)) {
            let mut value = 0u8;
            for &color in chunk {
                value = (value << self.bits) | self.code(color);
            }
            *byte = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hires_codes() {
        let shared = SharedColors {
            background: 0,
            slots: vec![],
        };
        let map = SlotMap::new(Mode::BitmapHires, &[1, 6], &shared);
        assert_eq!(map.code(1), 1);
        assert_eq!(map.code(6), 0);

        let mut out = [0u8; 1];
        map.pack_row(&[1, 6, 1, 6, 1, 1, 6, 6], &mut out);
        assert_eq!(out[0], 0b1010_1100);
    }

    #[test]
    fn test_multicolor_codes() {
        let shared = SharedColors {
            background: 0,
            slots: vec![0],
        };
        let map = SlotMap::new(Mode::BitmapMulticolor, &[2, 5, 7], &shared);
        let mut out = [0u8; 1];
        map.pack_row(&[0, 2, 5, 7], &mut out);
        assert_eq!(out[0], 0b00_01_10_11);
    }

    #[test]
    fn test_sprite_multicolor_codes() {
        let shared = SharedColors {
            background: 0,
            slots: vec![0, 11, 12],
        };
        let map = SlotMap::new(Mode::SpriteMulticolor, &[4], &shared);
        assert_eq!(map.code(0), 0);
        assert_eq!(map.code(11), 1);
        assert_eq!(map.code(4), 2);
        assert_eq!(map.code(12), 3);
    }
}
