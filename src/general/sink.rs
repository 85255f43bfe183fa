use crate::error::Result;
use crate::general::event::MidiEvent;

/// Destination for transformed events.
pub trait MidiSink: Send {
    fn send(&mut self, event: &MidiEvent) -> Result<()>;

    fn name(&self) -> &str;
}

/// Collects events in memory.
impl MidiSink for Vec<MidiEvent> {
    fn send(&mut self, event: &MidiEvent) -> Result<()> {
        self.push(event.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Send and log a failure instead of returning it.
pub fn send_or_log(sink: &mut dyn MidiSink, event: &MidiEvent) {
    if let Err(err) = sink.send(event) {
        log::error!("Error sending MIDI message to '{}': {}", sink.name(), err);
    }
}
