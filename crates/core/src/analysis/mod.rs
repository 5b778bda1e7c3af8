use std::{f32::consts::PI, fmt, path::Path, sync::Arc};

use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};
use serde::{Deserialize, Serialize};

use crate::{audio, Result, ToolkitError};

pub const FRAME_SIZE: usize = 2048;
pub const HOP_SIZE: usize = 512;

const MIN_TEMPO_BPM: f32 = 30.0;
const MAX_TEMPO_BPM: f32 = 300.0;
const PRIOR_TEMPO_BPM: f32 = 120.0;
/// Width of the tempo prior in octaves.
const PRIOR_SPREAD: f32 = 1.0;
const TIGHTNESS: f32 = 100.0;

/// Tempo estimate and beat positions for a whole track.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BeatAnalysis {
    pub tempo_bpm: f32,
    /// Beat times in seconds, ascending.
    pub beats: Vec<f32>,
}

impl BeatAnalysis {
    pub fn beat_count(&self) -> usize {
        self.beats.len()
    }
}

/// Decodes `path` and runs it through a fresh [`BeatAnalyzer`].
pub fn analyze_file(path: &Path) -> Result<BeatAnalysis> {
    let decoded = audio::decode_mono(path)?;
    let mut analyzer = BeatAnalyzer::with_sample_rate(decoded.sample_rate);
    analyzer.push_samples(&decoded.samples)?;
    let analysis = analyzer.finish();
    tracing::info!(
        path = %path.display(),
        tempo_bpm = analysis.tempo_bpm,
        beats = analysis.beat_count(),
        "beat analysis complete"
    );
    Ok(analysis)
}

/// Streaming onset detector. Samples are cut into Hann-windowed frames, each
/// frame contributes one spectral flux value to the onset envelope, and
/// [`BeatAnalyzer::finish`] turns the envelope into a tempo and beat grid.
pub struct BeatAnalyzer {
    sample_rate: u32,
    pending: Vec<f32>,
    previous_spectrum: Vec<f32>,
    onset_envelope: Vec<f32>,
    fft_planner: RealFftPlanner<f32>,
    fft: Option<FftResources>,
}

impl BeatAnalyzer {
    /// Creates a new analyzer using a 22.05 kHz sample rate.
    pub fn new() -> Self {
        Self::with_sample_rate(22_050)
    }

    pub fn with_sample_rate(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            pending: Vec::new(),
            previous_spectrum: Vec::new(),
            onset_envelope: Vec::new(),
            fft_planner: RealFftPlanner::new(),
            fft: None,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Onset strength per analysed frame.
    pub fn onset_envelope(&self) -> &[f32] {
        &self.onset_envelope
    }

    /// Clears the accumulated state while preserving configuration.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.previous_spectrum.clear();
        self.onset_envelope.clear();
    }

    /// Consumes mono samples, analysing every complete frame.
    pub fn push_samples(&mut self, samples: &[f32]) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(ToolkitError::msg("beat analysis requires a non-zero sample rate"));
        }

        self.pending.extend_from_slice(samples);
        let mut offset = 0;
        while self.pending.len() - offset >= FRAME_SIZE {
            let spectrum = self.log_spectrum(offset)?;
            let flux = if self.previous_spectrum.is_empty() {
                0.0
            } else {
                spectrum
                    .iter()
                    .zip(&self.previous_spectrum)
                    .map(|(current, previous)| (current - previous).max(0.0))
                    .sum()
            };
            self.onset_envelope.push(flux);
            self.previous_spectrum = spectrum;
            offset += HOP_SIZE;
        }
        self.pending.drain(..offset);
        Ok(())
    }

    /// Estimates tempo and beat times from everything pushed so far.
    pub fn finish(&self) -> BeatAnalysis {
        let Some(onsets) = normalised(&self.onset_envelope) else {
            return BeatAnalysis::default();
        };

        let frame_rate = self.sample_rate as f32 / HOP_SIZE as f32;
        let Some(period) = estimate_period(&onsets, frame_rate) else {
            return BeatAnalysis::default();
        };

        let beats = track_beats(&onsets, period as f32)
            .into_iter()
            .map(|frame| frame as f32 / frame_rate)
            .collect();

        BeatAnalysis {
            tempo_bpm: 60.0 * frame_rate / period as f32,
            beats,
        }
    }

    fn log_spectrum(&mut self, offset: usize) -> Result<Vec<f32>> {
        let fft = prepare_fft(&mut self.fft_planner, &mut self.fft, FRAME_SIZE);
        for (index, value) in self.pending[offset..offset + FRAME_SIZE].iter().enumerate() {
            fft.input[index] = *value * hann_value(index, FRAME_SIZE);
        }

        fft.plan
            .process_with_scratch(&mut fft.input, &mut fft.spectrum, &mut fft.scratch)?;

        Ok(fft.spectrum.iter().map(|bin| bin.norm().ln_1p()).collect())
    }
}

impl Default for BeatAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

struct FftResources {
    size: usize,
    plan: Arc<dyn RealToComplex<f32>>,
    scratch: Vec<Complex32>,
    spectrum: Vec<Complex32>,
    input: Vec<f32>,
}

fn prepare_fft<'a>(
    planner: &mut RealFftPlanner<f32>,
    slot: &'a mut Option<FftResources>,
    size: usize,
) -> &'a mut FftResources {
    if slot.as_ref().map(|fft| fft.size != size).unwrap_or(false) {
        *slot = None;
    }

    slot.get_or_insert_with(|| {
        let plan = planner.plan_fft_forward(size);
        FftResources {
            size,
            scratch: plan.make_scratch_vec(),
            spectrum: plan.make_output_vec(),
            input: plan.make_input_vec(),
            plan,
        }
    })
}

impl fmt::Debug for BeatAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeatAnalyzer")
            .field("sample_rate", &self.sample_rate)
            .field("pending", &self.pending.len())
            .field("onset_frames", &self.onset_envelope.len())
            .finish()
    }
}

impl fmt::Debug for FftResources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FftResources")
            .field("size", &self.size)
            .finish()
    }
}

/// Scales the envelope to unit standard deviation. `None` for flat input.
fn normalised(envelope: &[f32]) -> Option<Vec<f32>> {
    if envelope.len() < 2 {
        return None;
    }
    let mean = envelope.iter().sum::<f32>() / envelope.len() as f32;
    let variance =
        envelope.iter().map(|value| (value - mean).powi(2)).sum::<f32>() / envelope.len() as f32;
    let deviation = variance.sqrt();
    if deviation <= f32::EPSILON {
        return None;
    }
    Some(envelope.iter().map(|value| value / deviation).collect())
}

/// Beat period in frames: the autocorrelation lag with the best score after
/// weighting by a log-Gaussian tempo prior.
fn estimate_period(onsets: &[f32], frame_rate: f32) -> Option<usize> {
    let min_lag = ((60.0 * frame_rate / MAX_TEMPO_BPM).ceil() as usize).max(1);
    let max_lag = ((60.0 * frame_rate / MIN_TEMPO_BPM).floor() as usize).min(onsets.len() - 1);

    let mut best: Option<(usize, f32)> = None;
    for lag in min_lag..=max_lag {
        let correlation: f32 = onsets
            .iter()
            .zip(&onsets[lag..])
            .map(|(a, b)| a * b)
            .sum();
        let bpm = 60.0 * frame_rate / lag as f32;
        let octaves = (bpm / PRIOR_TEMPO_BPM).log2() / PRIOR_SPREAD;
        let score = correlation * (-0.5 * octaves * octaves).exp();
        if score > best.map(|(_, best)| best).unwrap_or(0.0) {
            best = Some((lag, score));
        }
    }

    best.map(|(lag, _)| lag)
}

/// Dynamic-programming beat tracker. Each frame's score is its onset
/// strength plus the best predecessor score, penalised by how far the gap
/// strays from `period`.
fn track_beats(onsets: &[f32], period: f32) -> Vec<usize> {
    let len = onsets.len();
    let mut score = vec![0.0f32; len];
    let mut backlink: Vec<Option<usize>> = vec![None; len];

    for frame in 0..len {
        let latest = frame as f32 - period / 2.0;
        let mut best: Option<(usize, f32)> = None;
        if frame > 0 && latest >= 0.0 {
            let earliest = (frame as f32 - 2.0 * period).max(0.0).round() as usize;
            let latest = (latest.round() as usize).min(frame - 1);
            for previous in earliest..=latest {
                let gap = (frame - previous) as f32;
                let penalty = TIGHTNESS * (gap / period).ln().powi(2);
                let candidate = score[previous] - penalty;
                if best.map(|(_, value)| candidate > value).unwrap_or(true) {
                    best = Some((previous, candidate));
                }
            }
        }

        score[frame] = onsets[frame] + best.map(|(_, value)| value.max(0.0)).unwrap_or(0.0);
        backlink[frame] = best.filter(|(_, value)| *value > 0.0).map(|(index, _)| index);
    }

    let tail_start = len.saturating_sub(period.ceil() as usize);
    let Some(last) = (tail_start..len).max_by(|a, b| score[*a].total_cmp(&score[*b])) else {
        return Vec::new();
    };

    let mut beats = vec![last];
    let mut cursor = last;
    while let Some(previous) = backlink[cursor] {
        beats.push(previous);
        cursor = previous;
    }
    beats.reverse();
    beats
}

fn hann_value(index: usize, len: usize) -> f32 {
    if len <= 1 {
        return 1.0;
    }

    0.5 - 0.5 * ((2.0 * PI * index as f32) / (len as f32 - 1.0)).cos()
}
