//! arcade-tts: voice-cloning text-to-speech server.
//!
//! Text arrives over HTTP, optionally gets random paralinguistic tags
//! (`[sigh]`, `[laugh]`, ...) sprinkled between its words, is rendered by an
//! external voice-cloning model, and lands in a single WAV file.

pub mod api;
pub mod audio;
pub mod config;
pub mod synth;
pub mod tags;
