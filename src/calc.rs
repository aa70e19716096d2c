//! Fixed-point compensation of raw ADC counts.
//!
//! This is the vendor's integer re-derivation of the sensor's physical model.
//! The order of operations, shift widths and intermediate widths (32-bit for
//! temperature and humidity, 64-bit for pressure) are load-bearing: reordering
//! changes rounding in the low digits. Do not "simplify" anything here without
//! checking against the datasheet worked example.

use crate::calib::Calibration;
use crate::Sample;

/// Raw value reported for a skipped temperature or pressure channel.
///
/// A disabled channel reads as 0x80000 in the 20-bit data registers; the
/// sign-extending decode in the driver widens that to this 32-bit value.
pub const SKIPPED_TP: i32 = 0xFFF8_0000_u32 as i32;

/// Raw value reported for a skipped humidity channel (0x8000, sign-extended).
pub const SKIPPED_H: i32 = 0xFFFF_8000_u32 as i32;

/// Compensates one raw reading into physical units.
///
/// Returns temperature in degrees Celsius, pressure in Pascal and relative
/// humidity in percent. A channel whose raw count carries the skip sentinel
/// comes back as `NaN`; pressure and humidity additionally require a valid
/// temperature, since both formulas consume the shared `t_fine` term.
pub fn compensate(adc_t: i32, adc_p: i32, adc_h: i32, calib: &Calibration) -> Sample {
    let mut sample = Sample {
        temperature: f32::NAN,
        pressure: f32::NAN,
        humidity: f32::NAN,
    };

    if adc_t == SKIPPED_TP {
        return sample;
    }

    let (t_fine, temperature) = compensate_temperature(adc_t, calib);
    sample.temperature = temperature;

    if adc_p != SKIPPED_TP {
        sample.pressure = compensate_pressure(adc_p, t_fine, calib);
    }
    if adc_h != SKIPPED_H {
        sample.humidity = compensate_humidity(adc_h, t_fine, calib);
    }

    sample
}

/// Temperature in 0.01 °C resolution, plus the `t_fine` intermediate the
/// pressure and humidity formulas depend on.
fn compensate_temperature(adc_t: i32, calib: &Calibration) -> (i32, f32) {
    let var1 = ((adc_t >> 3) - ((calib.dig_t1 as i32) << 1)) * (calib.dig_t2 as i32) >> 11;
    let var2 = (((adc_t >> 4) - (calib.dig_t1 as i32))
        * ((adc_t >> 4) - (calib.dig_t1 as i32))
        >> 12)
        * (calib.dig_t3 as i32)
        >> 14;
    let t_fine = var1 + var2;
    let centi_deg = (t_fine * 5 + 128) >> 8;
    (t_fine, centi_deg as f32 / 100.0)
}

/// Pressure in Pa. 64-bit intermediates throughout; the 32-bit variant of the
/// vendor formula loses a full Pascal of resolution and overflows sooner.
fn compensate_pressure(adc_p: i32, t_fine: i32, calib: &Calibration) -> f32 {
    let mut var1 = (t_fine as i64) - 128_000;
    let mut var2 = var1 * var1 * (calib.dig_p6 as i64);
    var2 += (var1 * (calib.dig_p5 as i64)) << 17;
    var2 += (calib.dig_p4 as i64) << 35;
    var1 = ((var1 * var1 * (calib.dig_p3 as i64)) >> 8) + ((var1 * (calib.dig_p2 as i64)) << 12);
    var1 = ((1i64 << 47) + var1) * (calib.dig_p1 as i64) >> 33;
    if var1 == 0 {
        // Division below would fault; a zero dig_P1 (blank calibration)
        // drives the denominator here.
        return f32::NAN;
    }

    let mut p = 1_048_576 - (adc_p as i64);
    p = ((p << 31) - var2) * 3125 / var1;
    var1 = ((calib.dig_p9 as i64) * (p >> 13) * (p >> 13)) >> 25;
    var2 = ((calib.dig_p8 as i64) * p) >> 19;
    p = ((p + var1 + var2) >> 8) + ((calib.dig_p7 as i64) << 4);
    p as f32 / 256.0
}

/// Relative humidity in %, clamped to 0..=100 in fixed-point space.
fn compensate_humidity(adc_h: i32, t_fine: i32, calib: &Calibration) -> f32 {
    let var1 = t_fine - 76_800;
    let var2 = (((adc_h << 14) - ((calib.dig_h4 as i32) << 20) - (calib.dig_h5 as i32) * var1
        + 16_384)
        >> 15)
        * ((((((var1 * (calib.dig_h6 as i32) >> 10)
            * ((var1 * (calib.dig_h3 as i32) >> 11) + 32_768))
            >> 10)
            + 2_097_152)
            * (calib.dig_h2 as i32)
            + 8_192)
            >> 14);
    let var3 = var2 - (((var2 >> 15) * (var2 >> 15) >> 7) * (calib.dig_h1 as i32) >> 4);
    // 419430400 is 100 %rH in the pre-scale fixed-point domain.
    let clamped = var3.clamp(0, 419_430_400);
    (clamped >> 12) as f32 / 1024.0
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Datasheet worked-example coefficients, humidity set chosen to exercise
    /// every dig_H term.
    fn calib() -> Calibration {
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

    const ADC_T: i32 = 519888;
    const ADC_P: i32 = 415148;
    const ADC_H: i32 = 29000;

    #[test]
    fn matches_datasheet_worked_example() {
        let calib = calib();
        let (t_fine, temperature) = compensate_temperature(ADC_T, &calib);
        assert_eq!(t_fine, 128422);
        assert!((temperature - 25.08).abs() < 1e-5);
        // 25767233 in Q24.8, converted through f32
        assert_eq!(compensate_pressure(ADC_P, t_fine, &calib), 100653.25);
        assert_eq!(compensate_humidity(ADC_H, t_fine, &calib), 50.14453125);
    }

    #[test]
    fn compensate_is_deterministic() {
        let calib = calib();
        let a = compensate(ADC_T, ADC_P, ADC_H, &calib);
        let b = compensate(ADC_T, ADC_P, ADC_H, &calib);
        assert_eq!(a.temperature.to_bits(), b.temperature.to_bits());
        assert_eq!(a.pressure.to_bits(), b.pressure.to_bits());
        assert_eq!(a.humidity.to_bits(), b.humidity.to_bits());
    }

    #[test]
    fn skipped_temperature_voids_all_channels() {
        let sample = compensate(SKIPPED_TP, ADC_P, ADC_H, &calib());
        assert!(sample.temperature.is_nan());
        assert!(sample.pressure.is_nan());
        assert!(sample.humidity.is_nan());
    }

    #[test]
    fn skipped_pressure_leaves_others_intact() {
        let sample = compensate(ADC_T, SKIPPED_TP, ADC_H, &calib());
        assert!(sample.pressure.is_nan());
        assert!((sample.temperature - 25.08).abs() < 1e-5);
        assert_eq!(sample.humidity, 50.14453125);
    }

    #[test]
    fn skipped_humidity_leaves_others_intact() {
        let sample = compensate(ADC_T, ADC_P, SKIPPED_H, &calib());
        assert!(sample.humidity.is_nan());
        assert!((sample.temperature - 25.08).abs() < 1e-5);
        assert_eq!(sample.pressure, 100653.25);
    }

    #[test]
    fn zero_pressure_denominator_yields_nan() {
        let mut calib = calib();
        calib.dig_p1 = 0;
        let sample = compensate(ADC_T, ADC_P, ADC_H, &calib);
        assert!(sample.pressure.is_nan());
        assert!((sample.temperature - 25.08).abs() < 1e-5);
        assert_eq!(sample.humidity, 50.14453125);
    }

    #[test]
    fn humidity_saturates_at_zero() {
        // adc_h = 0 drives the fixed-point value to -483231889 before the
        // clamp with these coefficients.
        let sample = compensate(ADC_T, ADC_P, 0, &calib());
        assert_eq!(sample.humidity, 0.0);
    }

    #[test]
    fn humidity_saturates_at_hundred_percent() {
        let mut calib = calib();
        calib.dig_h1 = 0;
        calib.dig_h2 = 900;
        // Pre-clamp value 748751874 exceeds the 419430400 bound.
        let sample = compensate(ADC_T, ADC_P, 32767, &calib);
        assert_eq!(sample.humidity, 100.0);
    }
}
