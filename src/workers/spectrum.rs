//! Spectral frames for the visualizer.

use spectrum_analyzer::scaling::divide_by_N_sqrt;
use spectrum_analyzer::windows::hann_window;
use spectrum_analyzer::{FrequencyLimit, samples_fft_to_spectrum};

use super::supervisor::StopFlag;

const FFT_SIZE: usize = 2048;
const FREQ_MIN: f32 = 40.0;
const FREQ_MAX: f32 = 16_000.0;

/// Band magnitudes per channel, normalized to `0.0..=1.0` over the track.
/// Mono input yields identical channels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectralFrame {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
}

/// Compute `fps` frames per second of interleaved `pcm`. Returns `None`
/// when `stop` fires part way through.
pub fn spectral_frames(
    pcm: &[f32],
    channels: u16,
    sample_rate: u32,
    fps: u32,
    bands: usize,
    stop: &StopFlag,
) -> Option<Vec<SpectralFrame>> {
    let ch = usize::from(channels.max(1));
    let total = pcm.len() / ch;
    let hop = (sample_rate / fps.max(1)).max(1) as usize;
    let right_ch = if ch > 1 { 1 } else { 0 };

    let mut frames = Vec::with_capacity(total / hop + 1);
    let mut window = vec![0.0f32; FFT_SIZE];
    let mut peak = 0.0f32;

    for start in (0..total).step_by(hop) {
        if frames.len() % 256 == 0 && stop.is_stopped() {
            return None;
        }
        let mut channel_bands = |c: usize| {
            for (i, slot) in window.iter_mut().enumerate() {
                *slot = pcm.get((start + i) * ch + c).copied().unwrap_or(0.0);
            }
            band_magnitudes(&window, sample_rate, bands)
        };
        let left = channel_bands(0);
        let right = if right_ch == 0 {
            left.clone()
        } else {
            channel_bands(right_ch)
        };
        peak = left.iter().chain(&right).fold(peak, |m, &v| m.max(v));
        frames.push(SpectralFrame { left, right });
    }

    if peak > 0.0 {
        for f in &mut frames {
            for v in f.left.iter_mut().chain(f.right.iter_mut()) {
                *v /= peak;
            }
        }
    }
    Some(frames)
}

/// Average magnitude in `bands` log-spaced bands between `FREQ_MIN` and
/// `FREQ_MAX`.
fn band_magnitudes(samples: &[f32], sample_rate: u32, bands: usize) -> Vec<f32> {
    let mut out = vec![0.0f32; bands];
    if bands == 0 {
        return out;
    }
    let nyquist = sample_rate as f32 / 2.0;
    let hi = FREQ_MAX.min(nyquist - 1.0);
    if hi <= FREQ_MIN {
        return out;
    }

    let windowed = hann_window(samples);
    let Ok(spectrum) = samples_fft_to_spectrum(
        &windowed,
        sample_rate,
        FrequencyLimit::Range(FREQ_MIN, hi),
        Some(&divide_by_N_sqrt),
    ) else {
        return out;
    };
    let data: Vec<(f32, f32)> = spectrum
        .data()
        .iter()
        .map(|(f, v)| (f.val(), v.val()))
        .collect();
    if data.is_empty() {
        return out;
    }

    let (log_lo, log_hi) = (FREQ_MIN.ln(), hi.ln());
    let edge = |i: usize| (log_lo + (log_hi - log_lo) * i as f32 / bands as f32).exp();
    for (b, slot) in out.iter_mut().enumerate() {
        let (f0, f1) = (edge(b), edge(b + 1));
        let (sum, n) = data
            .iter()
            .filter(|(f, _)| *f >= f0 && *f < f1)
            .fold((0.0f32, 0usize), |(s, n), (_, v)| (s + v, n + 1));
        *slot = if n > 0 {
            sum / n as f32
        } else {
            // Band narrower than one bin: take the nearest bin.
            let centre = (f0 * f1).sqrt();
            data.iter()
                .min_by(|a, b| (a.0 - centre).abs().total_cmp(&(b.0 - centre).abs()))
                .map_or(0.0, |(_, v)| *v)
        };
    }
    out
}
