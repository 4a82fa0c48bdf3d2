//! Tiny audio files for tests.

const SAMPLE_RATE: u32 = 8_000;
const SAMPLES: usize = 800;

/// A tenth of a second of 16-bit mono PCM silence, as an untagged WAV file.
pub fn silent_wav() -> Vec<u8> {
    let data_len = (SAMPLES * 2) as u32;
    let mut wav = Vec::with_capacity(44 + SAMPLES * 2);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&1u16.to_le_bytes()); // mono
    wav.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    wav.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.resize(wav.len() + SAMPLES * 2, 0);
    wav
}
