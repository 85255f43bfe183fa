use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::thread;

use super::engine::TransformEngine;
use super::event::MidiEvent;
use super::mapping::{MappingConfig, MappingPatch};
use super::sink::MidiSink;

/// Everything the forwarding thread reacts to, in one ordered stream.
pub enum Command {
    /// Raw bytes from the input callback.
    Midi { stamp: u64, bytes: Vec<u8> },
    Patch(MappingPatch),
    ShiftTranspose(i32),
    Replace(MappingConfig),
    Panic,
    /// Swap the output. Held notes are dropped.
    BindOutput(Box<dyn MidiSink>),
    /// Close the output. Held notes are dropped.
    Unbind,
}

/// Latest configuration, readable from other threads.
#[derive(Clone, Default)]
pub struct LiveConfig(Arc<Mutex<MappingConfig>>);

impl LiveConfig {
    pub fn new(config: MappingConfig) -> Self {
        Self(Arc::new(Mutex::new(config)))
    }

    pub fn get(&self) -> MappingConfig {
        match self.0.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn publish(&self, config: MappingConfig) {
        match self.0.lock() {
            Ok(mut guard) => *guard = config,
            Err(poisoned) => *poisoned.into_inner() = config,
        }
    }
}

/// Owns the engine and the output. Only ever driven from one thread.
pub struct Forwarder {
    engine: TransformEngine,
    sink: Option<Box<dyn MidiSink>>,
    live: LiveConfig,
}

impl Forwarder {
    pub fn new(config: MappingConfig, sink: Option<Box<dyn MidiSink>>) -> Self {
        Self {
            engine: TransformEngine::new(config),
            sink,
            live: LiveConfig::new(config),
        }
    }

    pub fn live_config(&self) -> LiveConfig {
        self.live.clone()
    }

    pub fn engine(&self) -> &TransformEngine {
        &self.engine
    }

    pub fn handle(&mut self, command: Command) {
        match command {
            Command::Midi { stamp, bytes } => {
                let Some(event) = MidiEvent::decode(&bytes, stamp) else {
                    return;
                };
                match self.sink.as_deref_mut() {
                    Some(sink) => self.engine.handle(&event, sink),
                    None => {
                        self.engine.process(&event);
                    }
                }
            }
            Command::Patch(patch) => {
                let config = self.engine.apply_patch(&patch);
                self.publish(config);
            }
            Command::ShiftTranspose(delta) => {
                let config = self.engine.config().shift_transpose(delta);
                self.engine.set_config(config);
                self.publish(config);
            }
            Command::Replace(config) => {
                self.engine.set_config(config);
                self.publish(config);
            }
            Command::Panic => match self.sink.as_deref_mut() {
                Some(sink) => self.engine.panic(Some(sink)),
                None => self.engine.panic(None),
            },
            Command::BindOutput(sink) => {
                log::info!("Output bound to '{}'", sink.name());
                self.engine.rebind();
                self.sink = Some(sink);
            }
            Command::Unbind => {
                if let Some(sink) = &self.sink {
                    log::info!("Output '{}' disconnected", sink.name());
                }
                self.engine.rebind();
                self.sink = None;
            }
        }
    }

    fn publish(&mut self, config: MappingConfig) {
        log::info!("Mapping: {}", config);
        self.live.publish(config);
    }
}

/// Spawn the forwarding thread. It runs until every sender is dropped.
pub fn spawn_forwarder(mut forwarder: Forwarder, rx: Receiver<Command>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for command in rx {
            forwarder.handle(command);
        }
        log::debug!("Forwarder exiting");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::general::event::MidiMessage;

    /// Sink that can be inspected after being moved into the forwarder.
    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<MidiEvent>>>);

    impl MidiSink for Shared {
        fn send(&mut self, event: &MidiEvent) -> Result<()> {
            self.0.lock().unwrap().push(event.clone());
            Ok(())
        }

        fn name(&self) -> &str {
            "shared"
        }
    }

    fn midi(bytes: &[u8]) -> Command {
        Command::Midi { stamp: 0, bytes: bytes.to_vec() }
    }

    #[test]
    fn config_changes_apply_in_order() {
        let out = Shared::default();
        let mut fwd = Forwarder::new(MappingConfig::default(), Some(Box::new(out.clone())));
        let live = fwd.live_config();

        fwd.handle(midi(&[0x90, 60, 100]));
        fwd.handle(Command::Patch(MappingPatch::transpose(12)));
        fwd.handle(midi(&[0x90, 62, 100]));
        fwd.handle(midi(&[0x80, 60, 0]));
        fwd.handle(Command::ShiftTranspose(-2));

        let sent = out.0.lock().unwrap().clone();
        assert_eq!(sent[0].message, MidiMessage::NoteOn { note: 60, velocity: 100 });
        assert_eq!(sent[1].message, MidiMessage::NoteOn { note: 74, velocity: 100 });
        assert_eq!(sent[2].message, MidiMessage::NoteOff { note: 60, velocity: 0 });
        assert_eq!(live.get().transpose(), 10);
    }

    #[test]
    fn unbound_output_still_tracks_notes() {
        let mut fwd = Forwarder::new(MappingConfig::default(), None);
        fwd.handle(midi(&[0x90, 60, 100]));
        assert_eq!(fwd.engine().active_notes().get(60), Some(60));
        fwd.handle(Command::Panic);
        assert!(fwd.engine().active_notes().is_empty());
    }

    #[test]
    fn binding_new_output_drops_held_notes() {
        let first = Shared::default();
        let second = Shared::default();
        let mut fwd = Forwarder::new(MappingConfig::default().with_transpose(3), Some(Box::new(first.clone())));
        fwd.handle(midi(&[0x90, 60, 100]));
        fwd.handle(Command::BindOutput(Box::new(second.clone())));
        assert!(fwd.engine().active_notes().is_empty());
        fwd.handle(midi(&[0x80, 60, 0]));

        assert_eq!(first.0.lock().unwrap().len(), 1);
        let sent = second.0.lock().unwrap().clone();
        assert_eq!(sent, vec![MidiEvent::note_off(0, 63, 0)]);
    }

    #[test]
    fn unbinding_silences_output_and_drops_held_notes() {
        let out = Shared::default();
        let mut fwd = Forwarder::new(MappingConfig::default(), Some(Box::new(out.clone())));
        fwd.handle(midi(&[0x90, 60, 100]));
        fwd.handle(Command::Unbind);
        assert!(fwd.engine().active_notes().is_empty());

        fwd.handle(midi(&[0x80, 60, 0]));
        fwd.handle(midi(&[0x90, 64, 90]));
        fwd.handle(Command::Panic);
        assert_eq!(out.0.lock().unwrap().len(), 1);
        assert!(fwd.engine().active_notes().is_empty());
    }
}
