//! chorda-bridge - live MIDI note and velocity mapper
//!
//! Receives MIDI from a controller, transposes notes and reshapes velocity,
//! and forwards the result to an output port. Note-offs always release the
//! note that was actually sent, so changing the transpose while keys are held
//! cannot leave notes hanging.
//!
//! ```
//! use chorda_bridge::{MappingConfig, MidiEvent, TransformEngine};
//!
//! let mut engine = TransformEngine::new(MappingConfig::default().with_transpose(12));
//! let on = engine.process(&MidiEvent::note_on(0, 60, 100)).unwrap();
//! assert_eq!(on.to_bytes(), vec![0x90, 72, 100]);
//!
//! engine.set_config(engine.config().with_transpose(0));
//! let off = engine.process(&MidiEvent::note_off(0, 60, 0)).unwrap();
//! assert_eq!(off.to_bytes(), vec![0x80, 72, 0]);
//! ```

pub mod config;
pub mod error;
pub mod general;
pub mod io;
pub mod remote;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use general::active_notes::ActiveNoteTable;
pub use general::engine::TransformEngine;
pub use general::event::{MidiEvent, MidiMessage};
pub use general::forwarder::{spawn_forwarder, Command, Forwarder, LiveConfig};
pub use general::mapping::{MappingConfig, MappingPatch};
pub use general::panic::{all_notes_off, panic};
pub use general::preset::{decode, encode, load_preset, save_preset, DeviceIds, PresetMeta};
pub use general::sink::MidiSink;
pub use general::transpose::map_note;
pub use general::velocity::apply_velocity;
