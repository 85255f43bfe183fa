/// Output note recorded for each held input note.
///
/// Indexed directly by input note number. A note-off resolves through this
/// table so it always releases the note that was actually sent, even if the
/// transpose changed while the key was held.
#[derive(Debug, Clone)]
pub struct ActiveNoteTable {
    slots: [Option<u8>; 128],
}

impl Default for ActiveNoteTable {
    fn default() -> Self {
        Self { slots: [None; 128] }
    }
}

impl ActiveNoteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sent note. A re-trigger without note-off overwrites.
    /// Notes above 127 are not MIDI notes and are never recorded.
    pub fn put(&mut self, input_note: u8, output_note: u8) {
        if let Some(slot) = self.slots.get_mut(input_note as usize) {
            *slot = Some(output_note);
        }
    }

    /// Remove and return the mapping for `input_note`, if any.
    pub fn take(&mut self, input_note: u8) -> Option<u8> {
        self.slots.get_mut(input_note as usize).and_then(Option::take)
    }

    pub fn get(&self, input_note: u8) -> Option<u8> {
        self.slots.get(input_note as usize).copied().flatten()
    }

    pub fn clear(&mut self) {
        self.slots = [None; 128];
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}
