//! Speech activity detection
//!
//! Energy-based segmentation of microphone audio into utterances, plus a
//! check for recordings that contain no speech at all.

/// Minimum RMS energy to consider a chunk speech
pub const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum duration of speech for an utterance (in samples at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800; // 0.3 seconds

/// Silence that ends an utterance (in samples at 16kHz)
const SILENCE_SAMPLES: usize = 8000; // 0.5 seconds

/// Longest utterance before it is cut off (in samples at 16kHz)
const MAX_UTTERANCE_SAMPLES: usize = 16000 * 30;

/// State of the speech detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// Waiting for speech
    Idle,
    /// Speech started, accumulating the utterance
    Capturing,
}

/// Splits a sample stream into utterances
#[derive(Debug)]
pub struct SpeechDetector {
    state: DetectorState,
    buffer: Vec<f32>,
    speech_samples: usize,
    silence_counter: usize,
}

impl Default for SpeechDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechDetector {
    /// Create an idle detector
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: DetectorState::Idle,
            buffer: Vec::new(),
            speech_samples: 0,
            silence_counter: 0,
        }
    }

    /// Feed a chunk of samples
    ///
    /// Returns true once an utterance is complete: enough speech followed by
    /// a stretch of silence, or the maximum length was reached. Collect it
    /// with [`take_utterance`](Self::take_utterance).
    pub fn process(&mut self, samples: &[f32]) -> bool {
        let energy = rms(samples);
        let is_speech = energy > ENERGY_THRESHOLD;

        match self.state {
            DetectorState::Idle => {
                if is_speech {
                    self.state = DetectorState::Capturing;
                    self.buffer.clear();
                    self.buffer.extend_from_slice(samples);
                    self.speech_samples = samples.len();
                    self.silence_counter = 0;
                    tracing::trace!(energy, "speech detected");
                }
                false
            }
            DetectorState::Capturing => {
                self.buffer.extend_from_slice(samples);

                if is_speech {
                    self.speech_samples += samples.len();
                    self.silence_counter = 0;
                } else {
                    self.silence_counter += samples.len();
                }

                if self.buffer.len() >= MAX_UTTERANCE_SAMPLES {
                    tracing::debug!(samples = self.buffer.len(), "utterance hit length limit");
                    return true;
                }

                if self.is_utterance_complete() {
                    tracing::debug!(samples = self.buffer.len(), "utterance complete");
                    return true;
                }

                // Too much silence without enough speech: a noise blip
                if self.silence_counter > SILENCE_SAMPLES * 2 {
                    tracing::trace!("discarding short noise");
                    self.reset();
                }

                false
            }
        }
    }

    /// Whether the buffered audio forms a complete utterance
    #[must_use]
    pub fn is_utterance_complete(&self) -> bool {
        self.state == DetectorState::Capturing
            && self.silence_counter > SILENCE_SAMPLES
            && self.speech_samples > MIN_SPEECH_SAMPLES
    }

    /// Take the buffered utterance and return to idle
    pub fn take_utterance(&mut self) -> Vec<f32> {
        let utterance = std::mem::take(&mut self.buffer);
        self.reset();
        utterance
    }

    /// Buffered samples of the utterance in progress
    #[must_use]
    pub fn buffer(&self) -> &[f32] {
        &self.buffer
    }

    /// Drop any buffered audio and return to idle
    pub fn reset(&mut self) {
        self.state = DetectorState::Idle;
        self.buffer.clear();
        self.speech_samples = 0;
        self.silence_counter = 0;
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> DetectorState {
        self.state
    }
}

/// RMS energy of audio samples
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Whether any 100ms window of the recording rises above the speech threshold
#[must_use]
pub fn contains_speech(samples: &[f32], sample_rate: u32) -> bool {
    let window = (sample_rate as usize / 10).max(1);
    samples
        .chunks(window)
        .any(|chunk| rms(chunk) > ENERGY_THRESHOLD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn energy_calculation() {
        assert!(rms(&[0.0f32; 100]) < 0.001);
        assert!(rms(&[0.5f32; 100]) > 0.4);
        assert!(rms(&[]) < f32::EPSILON);
    }

    #[test]
    fn short_burst_counts_as_speech() {
        let mut samples = vec![0.0f32; 16000];
        samples[8000..9600].fill(0.3);
        assert!(contains_speech(&samples, 16000));
        assert!(!contains_speech(&[0.001f32; 16000], 16000));
    }

    #[test]
    fn noise_blip_is_discarded() {
        let mut detector = SpeechDetector::new();

        assert!(!detector.process(&[0.3f32; 800]));
        assert_eq!(detector.state(), DetectorState::Capturing);

        // Long silence after too little speech
        assert!(!detector.process(&[0.0f32; 17000]));
        assert_eq!(detector.state(), DetectorState::Idle);
        assert!(detector.buffer().is_empty());
    }
}
