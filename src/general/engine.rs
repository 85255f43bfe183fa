use super::active_notes::ActiveNoteTable;
use super::event::{MidiEvent, MidiMessage};
use super::mapping::{MappingConfig, MappingPatch};
use super::sink::{send_or_log, MidiSink};
use super::transpose::map_note;
use super::velocity::apply_velocity;

/// Per input/output binding transform state.
///
/// One event in, at most one event out. The held-note table is the only state
/// carried between events.
#[derive(Debug, Clone, Default)]
pub struct TransformEngine {
    config: MappingConfig,
    active: ActiveNoteTable,
}

impl TransformEngine {
    pub fn new(config: MappingConfig) -> Self {
        Self { config, active: ActiveNoteTable::new() }
    }

    pub fn config(&self) -> &MappingConfig {
        &self.config
    }

    /// Takes effect for the next event. Held notes keep their recorded mapping.
    pub fn set_config(&mut self, config: MappingConfig) {
        self.config = config;
    }

    pub fn apply_patch(&mut self, patch: &MappingPatch) -> MappingConfig {
        self.config = self.config.apply(patch);
        self.config
    }

    pub fn active_notes(&self) -> &ActiveNoteTable {
        &self.active
    }

    /// Input or output device changed. Held notes are not migrated.
    pub fn rebind(&mut self) {
        if !self.active.is_empty() {
            log::warn!("Rebinding drops {} held notes; send panic if any hang", self.active.len());
        }
        self.active.clear();
    }

    pub fn process(&mut self, event: &MidiEvent) -> Option<MidiEvent> {
        if !self.config.thru() {
            return None;
        }

        let ch = event.channel;
        let out = match &event.message {
            MidiMessage::NoteOn { note, velocity } if *velocity > 0 => {
                let out_note = map_note(*note, self.config.transpose());
                let out_vel = apply_velocity(*velocity, &self.config);
                self.active.put(*note, out_note);
                MidiEvent::new(ch, MidiMessage::NoteOn { note: out_note, velocity: out_vel }, event.timestamp)
            }
            MidiMessage::NoteOn { note, velocity } | MidiMessage::NoteOff { note, velocity } => {
                let out_note = match self.active.take(*note) {
                    Some(n) => n,
                    None => {
                        let n = map_note(*note, self.config.transpose());
                        log::debug!("ch{} NoteOff n{} had no recorded note-on, using n{}", ch + 1, note, n);
                        n
                    }
                };
                MidiEvent::new(ch, MidiMessage::NoteOff { note: out_note, velocity: *velocity }, event.timestamp)
            }
            MidiMessage::ControlChange { .. }
            | MidiMessage::PitchBend { .. }
            | MidiMessage::Aftertouch { .. }
            | MidiMessage::Other(_) => event.clone(),
        };

        log::debug!("IN {} -> OUT {}", event, out);
        Some(out)
    }

    pub fn handle(&mut self, event: &MidiEvent, sink: &mut dyn MidiSink) {
        if let Some(out) = self.process(event) {
            send_or_log(sink, &out);
        }
    }

    pub fn panic(&mut self, sink: Option<&mut dyn MidiSink>) {
        super::panic::panic(sink, &mut self.active);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(transpose: i32) -> TransformEngine {
        TransformEngine::new(MappingConfig::default().with_transpose(transpose))
    }

    #[test]
    fn note_on_records_mapping() {
        let mut e = engine(7);
        let out = e.process(&MidiEvent::note_on(2, 60, 90)).unwrap();
        assert_eq!(out.message, MidiMessage::NoteOn { note: 67, velocity: 90 });
        assert_eq!(out.channel, 2);
        assert_eq!(e.active_notes().get(60), Some(67));
    }

    #[test]
    fn zero_velocity_note_on_releases_as_note_off() {
        let mut e = engine(-12);
        e.process(&MidiEvent::note_on(0, 60, 90));
        let out = e.process(&MidiEvent::note_on(0, 60, 0)).unwrap();
        assert_eq!(out.message, MidiMessage::NoteOff { note: 48, velocity: 0 });
        assert_eq!(out.to_bytes()[0], 0x80);
        assert!(e.active_notes().is_empty());
    }

    #[test]
    fn release_velocity_is_forwarded_unmodified() {
        let mut e = TransformEngine::new(MappingConfig::new(0, 100, 110, 2.5, true));
        e.process(&MidiEvent::note_on(0, 40, 10));
        let out = e.process(&MidiEvent::note_off(0, 40, 33)).unwrap();
        assert_eq!(out.message, MidiMessage::NoteOff { note: 40, velocity: 33 });
    }

    #[test]
    fn timestamp_is_carried_through() {
        let mut e = engine(0);
        let out = e.process(&MidiEvent::note_on(0, 60, 90).at(1234)).unwrap();
        assert_eq!(out.timestamp, 1234);
    }

    #[test]
    fn rebind_forgets_held_notes() {
        let mut e = engine(12);
        e.process(&MidiEvent::note_on(0, 60, 90));
        e.rebind();
        assert!(e.active_notes().is_empty());
        e.set_config(e.config().with_transpose(0));
        let out = e.process(&MidiEvent::note_off(0, 60, 0)).unwrap();
        assert_eq!(out.message, MidiMessage::NoteOff { note: 60, velocity: 0 });
    }

    #[test]
    fn other_messages_pass_verbatim() {
        let mut e = engine(5);
        let raw = MidiEvent::decode(&[0xC4, 12], 0).unwrap();
        assert_eq!(e.process(&raw).unwrap().to_bytes(), vec![0xC4, 12]);
        let bend = MidiEvent::decode(&[0xE1, 3, 90], 0).unwrap();
        assert_eq!(e.process(&bend).unwrap().to_bytes(), vec![0xE1, 3, 90]);
        let at = MidiEvent::decode(&[0xD0, 50], 0).unwrap();
        assert_eq!(e.process(&at).unwrap().to_bytes(), vec![0xD0, 50]);
    }
}
