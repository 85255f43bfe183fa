use super::active_notes::ActiveNoteTable;
use super::event::MidiEvent;
use super::sink::{send_or_log, MidiSink};

pub const ALL_NOTES_OFF: u8 = 123;
pub const MIDI_CHANNELS: u8 = 16;

/// "All Notes Off" (CC 123, value 0) for channels 0..16, in channel order.
pub fn all_notes_off(timestamp: u64) -> impl Iterator<Item = MidiEvent> {
    (0..MIDI_CHANNELS).map(move |ch| MidiEvent::control_change(ch, ALL_NOTES_OFF, 0).at(timestamp))
}

/// Silence everything downstream and forget held notes.
///
/// Never fails: without a sink only the table is cleared, and send errors are
/// logged.
pub fn panic(sink: Option<&mut dyn MidiSink>, table: &mut ActiveNoteTable) {
    let held = table.len();
    table.clear();
    match sink {
        Some(sink) => {
            for event in all_notes_off(0) {
                send_or_log(sink, &event);
            }
            log::info!("Panic: All Notes Off sent on all channels ({} held notes dropped)", held);
        }
        None => log::warn!("Panic: no output bound, cleared {} held notes", held),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::general::event::MidiMessage;

    #[test]
    fn sends_cc123_on_every_channel() {
        let mut out: Vec<MidiEvent> = Vec::new();
        let mut table = ActiveNoteTable::new();
        table.put(60, 64);
        panic(Some(&mut out), &mut table);

        assert_eq!(out.len(), 16);
        for (ch, ev) in out.iter().enumerate() {
            assert_eq!(ev.channel as usize, ch);
            assert_eq!(ev.message, MidiMessage::ControlChange { controller: 123, value: 0 });
            assert_eq!(ev.to_bytes(), vec![0xB0 | ch as u8, 123, 0]);
        }
        assert!(table.is_empty());
    }

    #[test]
    fn without_sink_only_clears() {
        let mut table = ActiveNoteTable::new();
        table.put(10, 12);
        panic(None, &mut table);
        assert!(table.is_empty());
    }
}
