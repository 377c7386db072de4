//! Utterance cleanup: removes synthesis artifacts without changing speech.
//!
//! Synthesized speech arrives with high-frequency hiss, tonal beeps in the
//! 1-3 kHz band, and discontinuity clicks at clip edges. The cleanup chain
//! runs, in order:
//!
//! 1. Zero-phase Butterworth low-pass (cascaded biquad sections, run
//!    forward and backward so speech is not phase-shifted)
//! 2. Optional high-Q notch bank at the known artifact frequencies
//! 3. Raised-cosine fade-in/out at the clip edges
//! 4. Peak renormalization
//!
//! No samples are trimmed anywhere; the sample count is preserved exactly.
//! The chain is a pure function of its inputs.

use biquad::{Biquad, Coefficients, DirectForm2Transposed, ToHertz, Type, Q_BUTTERWORTH_F64};
use thiserror::Error;

use crate::config::AudioSettings;
use crate::models::Waveform;

/// Tonal artifact frequencies of the upstream synthesis engine, in Hz.
///
/// Measured from spectrum analysis of defective clips; each gets a narrow
/// notch so the conversational spectrum is untouched.
pub const ARTIFACT_NOTCH_HZ: [f64; 5] = [1000.0, 1500.0, 2000.0, 2500.0, 3000.0];

/// Errors from the cleanup chain.
///
/// These are absorbed by the caller: the unfiltered waveform is used and
/// the failure logged, never escalated to the job level.
#[derive(Error, Debug)]
pub enum CleanupError {
    /// Input waveform has no samples.
    #[error("Cannot clean an empty waveform")]
    EmptyInput,
}

/// Configuration for the cleanup chain.
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// Low-pass cutoff frequency (Hz).
    pub lowpass_cutoff_hz: f64,
    /// Filter order (implemented as cascaded second-order sections).
    pub filter_order: usize,
    /// Whether to apply the notch bank.
    pub notch_enabled: bool,
    /// Notch quality factor.
    pub notch_q: f64,
    /// Edge fade length in milliseconds.
    pub edge_fade_ms: f64,
    /// Peak amplitude after renormalization.
    pub target_peak: f64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self::from_settings(&AudioSettings::default())
    }
}

impl CleanupConfig {
    /// Build a config from the audio settings section.
    pub fn from_settings(settings: &AudioSettings) -> Self {
        Self {
            lowpass_cutoff_hz: settings.lowpass_cutoff_hz,
            filter_order: settings.filter_order as usize,
            notch_enabled: settings.notch_enabled,
            notch_q: settings.notch_q,
            edge_fade_ms: settings.edge_fade_ms,
            target_peak: settings.target_peak,
        }
    }
}

/// Run the full cleanup chain on one utterance waveform.
///
/// Returns a waveform with the same sample count and format. On empty
/// input returns `CleanupError` so the caller can fall back to the
/// original waveform and record a diagnostic.
pub fn clean_waveform(waveform: &Waveform, config: &CleanupConfig) -> Result<Waveform, CleanupError> {
    if waveform.is_empty() {
        return Err(CleanupError::EmptyInput);
    }

    let sample_rate = waveform.format.sample_rate;

    let mut samples = apply_lowpass(
        &waveform.samples,
        sample_rate,
        config.lowpass_cutoff_hz,
        config.filter_order,
    );

    if config.notch_enabled {
        for &freq in &ARTIFACT_NOTCH_HZ {
            samples = apply_notch(&samples, sample_rate, freq, config.notch_q);
        }
    }

    apply_edge_fades(&mut samples, sample_rate, config.edge_fade_ms);
    normalize_peak(&mut samples, config.target_peak);

    Ok(Waveform::new(samples, waveform.format))
}

/// Apply a zero-phase Butterworth low-pass using cascaded biquad sections.
fn apply_lowpass(samples: &[f64], sample_rate: u32, cutoff_hz: f64, order: usize) -> Vec<f64> {
    if samples.is_empty() || cutoff_hz >= sample_rate as f64 / 2.0 {
        return samples.to_vec();
    }

    let fs = sample_rate.hz();
    let f0 = cutoff_hz.hz();

    let coeffs = match Coefficients::<f64>::from_params(Type::LowPass, fs, f0, Q_BUTTERWORTH_F64) {
        Ok(c) => c,
        Err(_) => return samples.to_vec(), // Return unfiltered on error
    };

    zero_phase_cascade(samples, &coeffs, order)
}

/// Apply a zero-phase notch at one frequency.
fn apply_notch(samples: &[f64], sample_rate: u32, freq_hz: f64, q: f64) -> Vec<f64> {
    if samples.is_empty() || freq_hz >= sample_rate as f64 / 2.0 {
        return samples.to_vec();
    }

    let fs = sample_rate.hz();
    let f0 = freq_hz.hz();

    let coeffs = match Coefficients::<f64>::from_params(Type::Notch, fs, f0, q) {
        Ok(c) => c,
        Err(_) => return samples.to_vec(),
    };

    // A notch is second-order; one section forward and backward suffices.
    zero_phase_cascade(samples, &coeffs, 2)
}

/// Run a cascaded biquad forward, then backward over the reversed signal.
///
/// The backward pass cancels the phase shift of the forward pass, the
/// same way `filtfilt`-style filtering does. Each cascade section uses
/// fresh filter state.
fn zero_phase_cascade(samples: &[f64], coeffs: &Coefficients<f64>, order: usize) -> Vec<f64> {
    // A biquad is 2nd order, so we need order/2 sections (minimum 1)
    let num_sections = ((order + 1) / 2).max(1);

    let mut result = samples.to_vec();

    run_cascade(&mut result, coeffs, num_sections);
    result.reverse();
    run_cascade(&mut result, coeffs, num_sections);
    result.reverse();

    result
}

/// Process the buffer in place through `num_sections` fresh filter sections.
fn run_cascade(buffer: &mut [f64], coeffs: &Coefficients<f64>, num_sections: usize) {
    for _ in 0..num_sections {
        let mut filter = DirectForm2Transposed::<f64>::new(*coeffs);
        for sample in buffer.iter_mut() {
            *sample = filter.run(*sample);
        }
    }
}

/// Apply raised-cosine fades at both edges of the buffer, in place.
///
/// The fade length is clamped to half the buffer so short clips are
/// never fully attenuated. Sample count is unchanged.
fn apply_edge_fades(samples: &mut [f64], sample_rate: u32, fade_ms: f64) {
    let requested = (fade_ms / 1000.0 * sample_rate as f64).round() as usize;
    let fade_len = requested.min(samples.len() / 2);
    if fade_len == 0 {
        return;
    }

    let n = samples.len();
    for i in 0..fade_len {
        let phase = std::f64::consts::PI * i as f64 / fade_len as f64;
        let gain = 0.5 * (1.0 - phase.cos());
        samples[i] *= gain;
        samples[n - 1 - i] *= gain;
    }
}

/// Scale the buffer so its peak equals `target_peak`, in place.
///
/// Silent buffers are left untouched.
fn normalize_peak(samples: &mut [f64], target_peak: f64) {
    let peak = samples.iter().fold(0.0f64, |acc, s| acc.max(s.abs()));
    if peak <= 0.0 {
        return;
    }

    let gain = target_peak / peak;
    for sample in samples.iter_mut() {
        *sample *= gain;
    }
}
