//! Decoded MIDI channel messages.
//!
//! Raw bytes are classified once at the input boundary; everything past this
//! point works on `MidiEvent` values only.

pub const STATUS_NOTE_OFF: u8 = 0x80;
pub const STATUS_NOTE_ON: u8 = 0x90;
pub const STATUS_CONTROL_CHANGE: u8 = 0xB0;
pub const STATUS_AFTERTOUCH: u8 = 0xD0;
pub const STATUS_PITCH_BEND: u8 = 0xE0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MidiMessage {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8, velocity: u8 },
    ControlChange { controller: u8, value: u8 },
    PitchBend { lsb: u8, msb: u8 },
    /// Channel pressure, a single data byte.
    Aftertouch { pressure: u8 },
    /// Anything else, kept as the raw bytes (status included).
    Other(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiEvent {
    /// 0-15. Zero for `Other` messages that carry no channel.
    pub channel: u8,
    pub message: MidiMessage,
    /// Arrival time in microseconds, as reported by the input backend.
    pub timestamp: u64,
}

fn data(byte: Option<&u8>) -> Option<u8> {
    byte.copied().filter(|b| *b <= 0x7F)
}

/// Data bytes passed to the constructors saturate at 127.
fn data7(byte: u8) -> u8 {
    byte.min(0x7F)
}

impl MidiEvent {
    pub fn new(channel: u8, message: MidiMessage, timestamp: u64) -> Self {
        Self { channel: channel & 0x0F, message, timestamp }
    }

    pub fn note_on(channel: u8, note: u8, velocity: u8) -> Self {
        Self::new(channel, MidiMessage::NoteOn { note: data7(note), velocity: data7(velocity) }, 0)
    }

    pub fn note_off(channel: u8, note: u8, velocity: u8) -> Self {
        Self::new(channel, MidiMessage::NoteOff { note: data7(note), velocity: data7(velocity) }, 0)
    }

    pub fn control_change(channel: u8, controller: u8, value: u8) -> Self {
        let message = MidiMessage::ControlChange { controller: data7(controller), value: data7(value) };
        Self::new(channel, message, 0)
    }

    pub fn at(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Classify a raw message. Returns `None` only for an empty buffer.
    pub fn decode(bytes: &[u8], timestamp: u64) -> Option<Self> {
        let status = *bytes.first()?;
        let other = || Self {
            channel: if (0x80..0xF0).contains(&status) { status & 0x0F } else { 0 },
            message: MidiMessage::Other(bytes.to_vec()),
            timestamp,
        };
        if !(0x80..0xF0).contains(&status) {
            return Some(other());
        }

        let channel = status & 0x0F;
        let d1 = data(bytes.get(1));
        let d2 = data(bytes.get(2));
        let message = match (status & 0xF0, d1, d2) {
            (STATUS_NOTE_ON, Some(note), Some(velocity)) => MidiMessage::NoteOn { note, velocity },
            (STATUS_NOTE_OFF, Some(note), Some(velocity)) => MidiMessage::NoteOff { note, velocity },
            (STATUS_CONTROL_CHANGE, Some(controller), Some(value)) => {
                MidiMessage::ControlChange { controller, value }
            }
            (STATUS_PITCH_BEND, Some(lsb), Some(msb)) => MidiMessage::PitchBend { lsb, msb },
            (STATUS_AFTERTOUCH, Some(pressure), _) => MidiMessage::Aftertouch { pressure },
            _ => return Some(other()),
        };
        Some(Self { channel, message, timestamp })
    }

    /// Wire form of this event.
    pub fn to_bytes(&self) -> Vec<u8> {
        let ch = self.channel & 0x0F;
        match &self.message {
            MidiMessage::NoteOn { note, velocity } => vec![STATUS_NOTE_ON | ch, *note, *velocity],
            MidiMessage::NoteOff { note, velocity } => vec![STATUS_NOTE_OFF | ch, *note, *velocity],
            MidiMessage::ControlChange { controller, value } => {
                vec![STATUS_CONTROL_CHANGE | ch, *controller, *value]
            }
            MidiMessage::PitchBend { lsb, msb } => vec![STATUS_PITCH_BEND | ch, *lsb, *msb],
            MidiMessage::Aftertouch { pressure } => vec![STATUS_AFTERTOUCH | ch, *pressure],
            MidiMessage::Other(raw) => raw.clone(),
        }
    }

    /// NoteOff, or NoteOn with velocity 0.
    pub fn is_note_release(&self) -> bool {
        matches!(
            self.message,
            MidiMessage::NoteOff { .. } | MidiMessage::NoteOn { velocity: 0, .. }
        )
    }
}

impl std::fmt::Display for MidiEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ch = self.channel + 1;
        match &self.message {
            MidiMessage::NoteOn { note, velocity } => write!(f, "ch{} NoteOn n{} v{}", ch, note, velocity),
            MidiMessage::NoteOff { note, velocity } => write!(f, "ch{} NoteOff n{} v{}", ch, note, velocity),
            MidiMessage::ControlChange { controller, value } => {
                write!(f, "ch{} CC{} = {}", ch, controller, value)
            }
            MidiMessage::PitchBend { lsb, msb } => {
                write!(f, "ch{} PitchBend {}", ch, ((*msb as u16) << 7) | *lsb as u16)
            }
            MidiMessage::Aftertouch { pressure } => write!(f, "ch{} Aftertouch p{}", ch, pressure),
            MidiMessage::Other(raw) => write!(f, "raw {:02X?}", raw),
        }
    }
}
