//! Voice input and output
//!
//! Microphone capture, speech activity detection, WAV handling,
//! speech-to-text and spoken replies.

mod activity;
mod capture;
mod playback;
pub mod stt;
pub mod tts;
mod wav;

pub use activity::{DetectorState, ENERGY_THRESHOLD, SpeechDetector, contains_speech, rms};
pub use capture::{AudioCapture, SAMPLE_RATE};
pub use playback::AudioPlayback;
pub use stt::{SpeechToText, SttProvider, Transcriber};
pub use tts::{Speaker, TextToSpeech, TtsEngine};
pub use wav::{DecodedAudio, decode_wav, samples_to_wav};
