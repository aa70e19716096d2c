//! Factory calibration coefficients and their register-image decoding.
//!
//! The BME280 stores its compensation coefficients in two non-contiguous
//! register blocks: 26 bytes at 0x88 (temperature and pressure, plus `dig_H1`
//! at the tail) and 7 bytes at 0xE1 (the remaining humidity coefficients).
//! The driver concatenates both blocks into one buffer and this module decodes
//! the fixed little-endian offsets, including the vendor's shared-byte nibble
//! packing for `dig_H4`/`dig_H5`.

/// Size of the low calibration block read from register 0x88.
pub(crate) const LOW_BLOCK_LEN: usize = 26;
/// Size of the high calibration block read from register 0xE1.
pub(crate) const HIGH_BLOCK_LEN: usize = 7;
/// Total calibration image size.
pub(crate) const IMAGE_LEN: usize = LOW_BLOCK_LEN + HIGH_BLOCK_LEN;

/// Per-device compensation coefficients, fused at manufacture.
///
/// Read once during initialization and immutable for the driver's lifetime;
/// the device never changes them short of a power cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    pub dig_t1: u16,
    pub dig_t2: i16,
    pub dig_t3: i16,
    pub dig_p1: u16,
    pub dig_p2: i16,
    pub dig_p3: i16,
    pub dig_p4: i16,
    pub dig_p5: i16,
    pub dig_p6: i16,
    pub dig_p7: i16,
    pub dig_p8: i16,
    pub dig_p9: i16,
    pub dig_h1: u8,
    pub dig_h2: i16,
    pub dig_h3: u8,
    /// 12-bit signed, packed across registers 0xE4/0xE5.
    pub dig_h4: i16,
    /// 12-bit signed, packed across registers 0xE5/0xE6.
    pub dig_h5: i16,
    pub dig_h6: i8,
}

fn u16_le(image: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([image[offset], image[offset + 1]])
}

fn i16_le(image: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes([image[offset], image[offset + 1]])
}

impl Calibration {
    /// Decodes the concatenated 26 + 7 byte calibration image.
    ///
    /// Offsets 0..24 hold `dig_T1..T3` and `dig_P1..P9` as little-endian
    /// 16-bit words, offset 24 is unused padding, offset 25 is `dig_H1`.
    /// The high block starts at offset 26 with `dig_H2`.
    pub fn from_image(image: &[u8; IMAGE_LEN]) -> Self {
        let e4 = image[29];
        let e5 = image[30];
        let e6 = image[31];

        Self {
            dig_t1: u16_le(image, 0),
            dig_t2: i16_le(image, 2),
            dig_t3: i16_le(image, 4),
            dig_p1: u16_le(image, 6),
            dig_p2: i16_le(image, 8),
            dig_p3: i16_le(image, 10),
            dig_p4: i16_le(image, 12),
            dig_p5: i16_le(image, 14),
            dig_p6: i16_le(image, 16),
            dig_p7: i16_le(image, 18),
            dig_p8: i16_le(image, 20),
            dig_p9: i16_le(image, 22),
            dig_h1: image[25],
            dig_h2: i16_le(image, 26),
            dig_h3: image[28],
            // dig_H4[11:4] lives in 0xE4, dig_H4[3:0] in the low nibble of
            // 0xE5; dig_H5[3:0] in the high nibble of 0xE5, dig_H5[11:4] in
            // 0xE6. 0xE5 is shared between the two coefficients.
            dig_h4: (i16::from(e4 as i8) << 4) | i16::from(e5 & 0x0F),
            dig_h5: i16::from(e5 >> 4 & 0x0F) | (i16::from(e6 as i8) << 4),
            dig_h6: image[32] as i8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds the register image for the datasheet worked-example
    /// coefficients plus a humidity set exercising the nibble packing.
    fn reference_image() -> [u8; IMAGE_LEN] {
        let mut image = [0u8; IMAGE_LEN];
        let words: [(usize, u16); 12] = [
            (0, 27504),            // dig_T1
            (2, 26435),            // dig_T2
            (4, -1000i16 as u16),  // dig_T3
            (6, 36477),            // dig_P1
            (8, -10685i16 as u16), // dig_P2
            (10, 3024),            // dig_P3
            (12, 2855),            // dig_P4
            (14, 140),             // dig_P5
            (16, -7i16 as u16),    // dig_P6
            (18, 15500),           // dig_P7
            (20, -14600i16 as u16),// dig_P8
            (22, 6000),            // dig_P9
        ];
        for (offset, word) in words {
            image[offset..offset + 2].copy_from_slice(&word.to_le_bytes());
        }
        image[24] = 0xAA; // padding byte, must be ignored
        image[25] = 75; // dig_H1
        image[26..28].copy_from_slice(&362i16.to_le_bytes()); // dig_H2
        image[28] = 0; // dig_H3
        // dig_H4 = 311 = 0x137 -> e4 = 0x13, e5 low nibble = 0x7
        // dig_H5 = 50 = 0x032  -> e5 high nibble = 0x2, e6 = 0x03
        image[29] = 0x13;
        image[30] = 0x27;
        image[31] = 0x03;
        image[32] = 30; // dig_H6
        image
    }

    fn reference_calibration() -> Calibration {
        Calibration {
            dig_t1: 27504,
            dig_t2: 26435,
            dig_t3: -1000,
            dig_p1: 36477,
            dig_p2: -10685,
            dig_p3: 3024,
            dig_p4: 2855,
            dig_p5: 140,
            dig_p6: -7,
            dig_p7: 15500,
            dig_p8: -14600,
            dig_p9: 6000,
            dig_h1: 75,
            dig_h2: 362,
            dig_h3: 0,
            dig_h4: 311,
            dig_h5: 50,
            dig_h6: 30,
        }
    }

    #[test]
    fn decodes_reference_image() {
        assert_eq!(
            Calibration::from_image(&reference_image()),
            reference_calibration()
        );
    }

    #[test]
    fn h4_h5_share_the_middle_byte() {
        let mut image = reference_image();
        image[29] = 0xAB;
        image[30] = 0xCD;
        image[31] = 0xEF;
        let calib = Calibration::from_image(&image);
        // 0xAB sign-extends: dig_H4 = (-85 << 4) | 0xD = -1347
        assert_eq!(calib.dig_h4, -1347);
        // 0xEF sign-extends: dig_H5 = 0xC | (-17 << 4) = -260
        assert_eq!(calib.dig_h5, 0xC | (-17 << 4));
        assert_eq!(calib.dig_h5, -260);
    }

    #[test]
    fn negative_words_decode_little_endian() {
        let calib = Calibration::from_image(&reference_image());
        assert_eq!(calib.dig_t3, -1000);
        assert_eq!(calib.dig_p2, -10685);
        assert_eq!(calib.dig_p8, -14600);
    }
}
