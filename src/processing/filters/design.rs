// src/processing/filters/design.rs
//! IIR coefficient design
//!
//! Butterworth filters are designed in zero-pole-gain form from the analog
//! prototype, moved to the requested band, mapped to the z-plane with a
//! pre-warped bilinear transform and finally split into second-order
//! sections. Notches are a single closed-form biquad.

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::config::constants::band::{MAX_ORDER, MIN_ORDER};
use crate::error::{DspErrorBuilder, DspResult};

/// Poles closer than this to the real axis are treated as real
const REAL_TOLERANCE: f64 = 1e-12;

/// Sample rate the normalized design is carried out at
const DESIGN_FS: f64 = 2.0;

/// Normalized biquad, `a0 == 1`
///
/// `H(z) = (b0 + b1 z^-1 + b2 z^-2) / (1 + a1 z^-1 + a2 z^-2)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoefficients {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoefficients {
    /// Pass-through section
    pub fn identity() -> Self {
        Self { b0: 1.0, b1: 0.0, b2: 0.0, a1: 0.0, a2: 0.0 }
    }

    /// Complex frequency response at `freq_hz`
    pub fn response(&self, freq_hz: f64, sample_rate: f64) -> Complex64 {
        let w = 2.0 * PI * freq_hz / sample_rate;
        let z1 = Complex64::from_polar(1.0, -w);
        let z2 = z1 * z1;
        let num = self.b0 + z1 * self.b1 + z2 * self.b2;
        let den = Complex64::new(1.0, 0.0) + z1 * self.a1 + z2 * self.a2;
        num / den
    }

    /// Both poles strictly inside the unit circle
    pub fn is_stable(&self) -> bool {
        // Jury conditions for a monic quadratic
        self.a2.abs() < 1.0 && self.a1.abs() < 1.0 + self.a2
    }
}

/// Magnitude response of a cascade at `freq_hz`
pub fn cascade_magnitude(sections: &[BiquadCoefficients], freq_hz: f64, sample_rate: f64) -> f64 {
    sections
        .iter()
        .map(|s| s.response(freq_hz, sample_rate))
        .fold(Complex64::new(1.0, 0.0), |acc, h| acc * h)
        .norm()
}

/// What to design
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterSpec {
    Lowpass { order: usize, cutoff_hz: f64 },
    Highpass { order: usize, cutoff_hz: f64 },
    Bandpass { order: usize, low_hz: f64, high_hz: f64 },
    /// Band-stop at `freq_hz` with -3 dB width `freq_hz / q`
    Notch { freq_hz: f64, q: f64 },
}

impl FilterSpec {
    /// Display name used in pipeline statistics
    pub fn name(&self) -> &'static str {
        match self {
            FilterSpec::Lowpass { .. } => "Lowpass",
            FilterSpec::Highpass { .. } => "Highpass",
            FilterSpec::Bandpass { .. } => "Bandpass",
            FilterSpec::Notch { .. } => "Notch",
        }
    }

    fn component(&self) -> &'static str {
        match self {
            FilterSpec::Lowpass { .. } => "lowpass",
            FilterSpec::Highpass { .. } => "highpass",
            FilterSpec::Bandpass { .. } => "bandpass",
            FilterSpec::Notch { .. } => "notch",
        }
    }

    /// Check the parameters against `sample_rate` without designing anything
    pub fn validate(&self, sample_rate: f64) -> DspResult<()> {
        let err = || DspErrorBuilder::new(self.component());

        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(err().configuration(format!("sample rate must be positive, got {}", sample_rate)));
        }
        let nyquist = sample_rate / 2.0;
        let check_cutoff = |hz: f64| -> DspResult<()> {
            if !(hz > 0.0 && hz < nyquist) {
                return Err(err().configuration(format!(
                    "frequency {} Hz must be within (0, {}) Hz",
                    hz, nyquist
                )));
            }
            Ok(())
        };
        let check_order = |order: usize| -> DspResult<()> {
            if !(MIN_ORDER..=MAX_ORDER).contains(&order) {
                return Err(err().configuration(format!(
                    "order must be {}-{}, got {}",
                    MIN_ORDER, MAX_ORDER, order
                )));
            }
            Ok(())
        };

        match *self {
            FilterSpec::Lowpass { order, cutoff_hz } | FilterSpec::Highpass { order, cutoff_hz } => {
                check_order(order)?;
                check_cutoff(cutoff_hz)
            }
            FilterSpec::Bandpass { order, low_hz, high_hz } => {
                check_order(order)?;
                check_cutoff(low_hz)?;
                check_cutoff(high_hz)?;
                if low_hz >= high_hz {
                    return Err(err().configuration(format!(
                        "low edge {} Hz must be below high edge {} Hz",
                        low_hz, high_hz
                    )));
                }
                Ok(())
            }
            FilterSpec::Notch { freq_hz, q } => {
                check_cutoff(freq_hz)?;
                if !(q > 0.0) {
                    return Err(err().configuration(format!("Q must be positive, got {}", q)));
                }
                Ok(())
            }
        }
    }

    /// Design the second-order sections for `sample_rate`
    pub fn design(&self, sample_rate: f64) -> DspResult<Vec<BiquadCoefficients>> {
        self.validate(sample_rate)?;

        let sections = match *self {
            FilterSpec::Notch { freq_hz, q } => vec![notch_biquad(freq_hz, q, sample_rate)],
            FilterSpec::Lowpass { order, cutoff_hz } => {
                let wo = prewarp(cutoff_hz, sample_rate);
                zpk_to_sos(bilinear(lowpass_zpk(order, wo)))
            }
            FilterSpec::Highpass { order, cutoff_hz } => {
                let wo = prewarp(cutoff_hz, sample_rate);
                zpk_to_sos(bilinear(highpass_zpk(order, wo)))
            }
            FilterSpec::Bandpass { order, low_hz, high_hz } => {
                let w1 = prewarp(low_hz, sample_rate);
                let w2 = prewarp(high_hz, sample_rate);
                zpk_to_sos(bilinear(bandpass_zpk(order, w1, w2)))
            }
        };
        Ok(sections)
    }
}

/// Second-order notch with an exact zero at `freq_hz`
fn notch_biquad(freq_hz: f64, q: f64, sample_rate: f64) -> BiquadCoefficients {
    let w0 = 2.0 * PI * freq_hz / sample_rate;
    let bw = w0 / q;
    // -3 dB attenuation at the band edges
    let beta = (bw / 2.0).tan();
    let gain = 1.0 / (1.0 + beta);
    let cos_w0 = w0.cos();

    BiquadCoefficients {
        b0: gain,
        b1: -2.0 * gain * cos_w0,
        b2: gain,
        a1: -2.0 * gain * cos_w0,
        a2: 2.0 * gain - 1.0,
    }
}

/// Analog zeros, poles and gain
struct Zpk {
    zeros: Vec<Complex64>,
    poles: Vec<Complex64>,
    gain: f64,
}

/// Analog frequency for the bilinear transform at `DESIGN_FS`
fn prewarp(freq_hz: f64, sample_rate: f64) -> f64 {
    let normalized = freq_hz / (sample_rate / 2.0);
    2.0 * DESIGN_FS * (PI * normalized / DESIGN_FS).tan()
}

/// Unit-cutoff analog Butterworth prototype
fn prototype_poles(order: usize) -> Vec<Complex64> {
    let n = order as f64;
    (0..order)
        .map(|k| {
            let m = 2.0 * k as f64 - n + 1.0;
            -Complex64::from_polar(1.0, PI * m / (2.0 * n))
        })
        .collect()
}

fn lowpass_zpk(order: usize, wo: f64) -> Zpk {
    Zpk {
        zeros: Vec::new(),
        poles: prototype_poles(order).into_iter().map(|p| p * wo).collect(),
        gain: wo.powi(order as i32),
    }
}

fn highpass_zpk(order: usize, wo: f64) -> Zpk {
    let proto = prototype_poles(order);
    let denom: Complex64 = proto.iter().map(|p| -*p).product();
    Zpk {
        zeros: vec![Complex64::new(0.0, 0.0); order],
        poles: proto.iter().map(|p| wo / *p).collect(),
        gain: 1.0 / denom.re,
    }
}

fn bandpass_zpk(order: usize, w1: f64, w2: f64) -> Zpk {
    let bw = w2 - w1;
    let wo2 = w1 * w2;

    let mut poles = Vec::with_capacity(2 * order);
    for p in prototype_poles(order) {
        let p_lp = p * (bw / 2.0);
        let root = (p_lp * p_lp - wo2).sqrt();
        poles.push(p_lp + root);
        poles.push(p_lp - root);
    }

    Zpk {
        zeros: vec![Complex64::new(0.0, 0.0); order],
        poles,
        gain: bw.powi(order as i32),
    }
}

/// Map an analog design to the z-plane
fn bilinear(analog: Zpk) -> Zpk {
    let fs2 = 2.0 * DESIGN_FS;
    let degree = analog.poles.len() - analog.zeros.len();

    let map = |s: &Complex64| (fs2 + *s) / (fs2 - *s);
    let num: Complex64 = analog.zeros.iter().map(|z| fs2 - *z).product();
    let den: Complex64 = analog.poles.iter().map(|p| fs2 - *p).product();

    let mut zeros: Vec<Complex64> = analog.zeros.iter().map(map).collect();
    zeros.extend(std::iter::repeat(Complex64::new(-1.0, 0.0)).take(degree));

    Zpk {
        zeros,
        poles: analog.poles.iter().map(map).collect(),
        gain: analog.gain * (num / den).re,
    }
}

/// Monic real polynomial from one or two roots, as `[1, c1, c2]`
fn real_quadratic(roots: &[Complex64]) -> [f64; 3] {
    match roots {
        [] => [1.0, 0.0, 0.0],
        [r] => [1.0, -r.re, 0.0],
        [r1, r2] => [1.0, -(*r1 + *r2).re, (*r1 * *r2).re],
        _ => unreachable!("a section holds at most two roots"),
    }
}

/// Group poles into conjugate pairs (or pairs of reals), single real last
fn pole_groups(poles: &[Complex64]) -> Vec<Vec<Complex64>> {
    let mut complex: Vec<Complex64> = poles.iter().copied().filter(|p| p.im > REAL_TOLERANCE).collect();
    let mut real: Vec<Complex64> = poles
        .iter()
        .filter(|p| p.im.abs() <= REAL_TOLERANCE)
        .map(|p| Complex64::new(p.re, 0.0))
        .collect();

    // Poles nearest the unit circle go last
    complex.sort_by(|a, b| (1.0 - b.norm()).total_cmp(&(1.0 - a.norm())));
    real.sort_by(|a, b| a.re.total_cmp(&b.re));

    let mut groups: Vec<Vec<Complex64>> = complex.into_iter().map(|p| vec![p, p.conj()]).collect();
    groups.extend(real.chunks(2).map(|c| c.to_vec()));
    groups
}

/// Pair zeros outermost with innermost (so bandpass sections get one +1 and one -1)
fn zero_groups(zeros: &[Complex64]) -> Vec<Vec<Complex64>> {
    let mut sorted = zeros.to_vec();
    sorted.sort_by(|a, b| a.re.total_cmp(&b.re));

    let m = sorted.len();
    let mut groups = Vec::with_capacity(m.div_ceil(2));
    for i in 0..m / 2 {
        groups.push(vec![sorted[i], sorted[m - 1 - i]]);
    }
    if m % 2 == 1 {
        groups.push(vec![sorted[m / 2]]);
    }
    groups
}

fn zpk_to_sos(digital: Zpk) -> Vec<BiquadCoefficients> {
    let poles = pole_groups(&digital.poles);
    let zeros = zero_groups(&digital.zeros);
    let count = poles.len().max(zeros.len());

    let mut sections: Vec<BiquadCoefficients> = (0..count)
        .map(|i| {
            let b = real_quadratic(zeros.get(i).map_or(&[][..], |g| g.as_slice()));
            let a = real_quadratic(poles.get(i).map_or(&[][..], |g| g.as_slice()));
            BiquadCoefficients { b0: b[0], b1: b[1], b2: b[2], a1: a[1], a2: a[2] }
        })
        .collect();

    if let Some(first) = sections.first_mut() {
        first.b0 *= digital.gain;
        first.b1 *= digital.gain;
        first.b2 *= digital.gain;
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    const FS: f64 = 250.0;

    fn db(mag: f64) -> f64 {
        20.0 * mag.log10()
    }

    #[test]
    fn test_section_counts() {
        for order in 1..=8 {
            let lp = FilterSpec::Lowpass { order, cutoff_hz: 30.0 }.design(FS).unwrap();
            assert_eq!(lp.len(), order.div_ceil(2), "lowpass order {}", order);

            let bp = FilterSpec::Bandpass { order, low_hz: 1.0, high_hz: 40.0 }.design(FS).unwrap();
            assert_eq!(bp.len(), order, "bandpass order {}", order);
        }
    }

    #[test]
    fn test_lowpass_response() {
        let sos = FilterSpec::Lowpass { order: 4, cutoff_hz: 30.0 }.design(FS).unwrap();
        assert!((cascade_magnitude(&sos, 0.0, FS) - 1.0).abs() < 1e-9);
        // Butterworth is -3.01 dB at the cutoff
        assert!((db(cascade_magnitude(&sos, 30.0, FS)) + 3.0103).abs() < 0.01);
        assert!(cascade_magnitude(&sos, 100.0, FS) < 0.01);
        assert!(sos.iter().all(BiquadCoefficients::is_stable));
    }

    #[test]
    fn test_highpass_response() {
        let sos = FilterSpec::Highpass { order: 3, cutoff_hz: 5.0 }.design(FS).unwrap();
        assert!(cascade_magnitude(&sos, 0.0, FS) < 1e-9);
        assert!((db(cascade_magnitude(&sos, 5.0, FS)) + 3.0103).abs() < 0.01);
        assert!((cascade_magnitude(&sos, 124.9, FS) - 1.0).abs() < 1e-3);
        assert!(sos.iter().all(BiquadCoefficients::is_stable));
    }

    #[test]
    fn test_bandpass_response() {
        let sos = FilterSpec::Bandpass { order: 4, low_hz: 0.5, high_hz: 45.0 }.design(FS).unwrap();
        assert!((cascade_magnitude(&sos, 10.0, FS) - 1.0).abs() < 0.01);
        assert!((db(cascade_magnitude(&sos, 0.5, FS)) + 3.0103).abs() < 0.05);
        assert!((db(cascade_magnitude(&sos, 45.0, FS)) + 3.0103).abs() < 0.05);
        assert!(cascade_magnitude(&sos, 0.0, FS) < 1e-9);
        assert!(cascade_magnitude(&sos, 100.0, FS) < 0.01);
        assert!(sos.iter().all(BiquadCoefficients::is_stable));
    }

    #[test]
    fn test_notch_response() {
        let sos = FilterSpec::Notch { freq_hz: 60.0, q: 30.0 }.design(FS).unwrap();
        assert_eq!(sos.len(), 1);
        assert!(cascade_magnitude(&sos, 60.0, FS) < 1e-9);
        assert!((cascade_magnitude(&sos, 0.0, FS) - 1.0).abs() < 1e-12);
        assert!((cascade_magnitude(&sos, 10.0, FS) - 1.0).abs() < 0.01);
        // Band edges at f0 +/- f0/(2Q)
        assert!((db(cascade_magnitude(&sos, 61.0, FS)) + 3.0).abs() < 0.5);
        assert!(sos[0].is_stable());
    }

    #[test]
    fn test_invalid_specs() {
        assert!(FilterSpec::Lowpass { order: 0, cutoff_hz: 10.0 }.design(FS).is_err());
        assert!(FilterSpec::Lowpass { order: 17, cutoff_hz: 10.0 }.design(FS).is_err());
        assert!(FilterSpec::Lowpass { order: 2, cutoff_hz: 125.0 }.design(FS).is_err());
        assert!(FilterSpec::Highpass { order: 2, cutoff_hz: 0.0 }.design(FS).is_err());
        assert!(FilterSpec::Bandpass { order: 2, low_hz: 40.0, high_hz: 10.0 }.design(FS).is_err());
        assert!(FilterSpec::Notch { freq_hz: 60.0, q: 0.0 }.design(FS).is_err());
        assert!(FilterSpec::Notch { freq_hz: 130.0, q: 30.0 }.design(FS).is_err());
        assert!(FilterSpec::Notch { freq_hz: 60.0, q: 30.0 }.design(-1.0).is_err());
    }

    #[test]
    fn test_identity_section() {
        let id = BiquadCoefficients::identity();
        assert!((id.response(17.0, FS).norm() - 1.0).abs() < 1e-12);
    }
}
