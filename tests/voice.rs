//! Voice pipeline integration tests
//!
//! Tests voice components without requiring audio hardware

use pantry_assistant::voice::{
    DetectorState, SAMPLE_RATE, SpeechDetector, contains_speech, decode_wav, samples_to_wav,
};

/// Generate sine wave audio samples
fn generate_sine_samples(frequency: f32, duration_secs: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// Generate silence
fn generate_silence(duration_secs: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    vec![0.0; num_samples]
}

/// Feed samples to the detector in 100ms chunks, returning true if an utterance completed
fn feed(detector: &mut SpeechDetector, samples: &[f32]) -> bool {
    samples
        .chunks(SAMPLE_RATE as usize / 10)
        .any(|chunk| detector.process(chunk))
}

#[test]
fn test_detector_starts_idle() {
    let detector = SpeechDetector::new();

    assert_eq!(detector.state(), DetectorState::Idle);
    assert!(!detector.is_utterance_complete());
    assert!(detector.buffer().is_empty());
}

#[test]
fn test_silence_never_triggers() {
    let mut detector = SpeechDetector::new();

    assert!(!feed(&mut detector, &generate_silence(3.0)));
    assert_eq!(detector.state(), DetectorState::Idle);
}

#[test]
fn test_utterance_completes_after_trailing_silence() {
    let mut detector = SpeechDetector::new();

    assert!(!feed(&mut detector, &generate_sine_samples(440.0, 1.0, 0.5)));
    assert_eq!(detector.state(), DetectorState::Capturing);

    assert!(feed(&mut detector, &generate_silence(1.0)));
    assert!(detector.is_utterance_complete());

    let utterance = detector.take_utterance();
    assert!(utterance.len() >= SAMPLE_RATE as usize);
    assert_eq!(detector.state(), DetectorState::Idle);
}

#[test]
fn test_quiet_audio_is_not_speech() {
    let mut detector = SpeechDetector::new();

    assert!(!feed(&mut detector, &generate_sine_samples(440.0, 1.0, 0.01)));
    assert_eq!(detector.state(), DetectorState::Idle);
}

#[test]
fn test_reset_drops_buffer() {
    let mut detector = SpeechDetector::new();
    feed(&mut detector, &generate_sine_samples(440.0, 0.5, 0.5));
    assert!(!detector.buffer().is_empty());

    detector.reset();
    assert!(detector.buffer().is_empty());
    assert_eq!(detector.state(), DetectorState::Idle);
}

#[test]
fn test_samples_to_wav_roundtrip_keeps_speech() {
    let samples = generate_sine_samples(440.0, 0.5, 0.5);
    let wav = samples_to_wav(&samples, SAMPLE_RATE).unwrap();

    assert_eq!(&wav[0..4], b"RIFF");
    assert_eq!(&wav[8..12], b"WAVE");

    let decoded = decode_wav(&wav).unwrap();
    assert_eq!(decoded.sample_rate, SAMPLE_RATE);
    assert_eq!(decoded.samples.len(), samples.len());
    assert!(contains_speech(&decoded.samples, decoded.sample_rate));
}

#[test]
fn test_silent_wav_has_no_speech() {
    let wav = samples_to_wav(&generate_silence(1.0), SAMPLE_RATE).unwrap();
    let decoded = decode_wav(&wav).unwrap();

    assert!(!contains_speech(&decoded.samples, decoded.sample_rate));
}
