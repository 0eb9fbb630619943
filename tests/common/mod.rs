//! Shared test utilities

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pantry_assistant::voice::Transcriber;
use pantry_assistant::{CategoryLookup, Error, LanguageModel, MemoryStorage, Pantry, Result};

/// Language model that returns a canned reply (or fails) and counts calls
#[derive(Default)]
pub struct StubModel {
    reply: Option<String>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl StubModel {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply.to_string()),
            ..Self::default()
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for StubModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        self.reply
            .clone()
            .ok_or_else(|| Error::Llm("connection refused".to_string()))
    }
}

/// Transcriber that returns a fixed transcript (or fails) and counts calls
#[derive(Default)]
pub struct StubTranscriber {
    transcript: Option<String>,
    calls: AtomicUsize,
}

impl StubTranscriber {
    pub fn hearing(transcript: &str) -> Arc<Self> {
        Arc::new(Self {
            transcript: Some(transcript.to_string()),
            ..Self::default()
        })
    }

    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for StubTranscriber {
    async fn transcribe(&self, _wav: &[u8]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.transcript
            .clone()
            .ok_or_else(|| Error::Stt("speech service unavailable: connection refused".to_string()))
    }
}

/// In-memory pantry with a small category table
pub fn memory_pantry(blob: Option<&str>) -> Arc<Pantry> {
    let catalog: CategoryLookup = [("milk", "dairy"), ("apples", "produce"), ("bread", "bakery")]
        .into_iter()
        .collect();
    let storage = blob.map_or_else(MemoryStorage::default, MemoryStorage::with_blob);
    Arc::new(Pantry::new(storage, Arc::new(catalog)))
}

/// 16 kHz mono WAV of a constant-amplitude square wave
pub fn tone_wav(seconds: f32, amplitude: f32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let count = (16000.0 * seconds) as usize;
    #[allow(clippy::cast_possible_truncation)]
    let level = (amplitude * 32767.0) as i16;

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for i in 0..count {
            let sample = if (i / 20) % 2 == 0 { level } else { -level };
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// 16 kHz mono WAV of digital silence
pub fn silent_wav(seconds: f32) -> Vec<u8> {
    tone_wav(seconds, 0.0)
}
