use std::io::{stdin, stdout, Write};

use midir::{MidiOutput, MidiOutputConnection};

use crate::error::{Error, Result};
use crate::general::event::MidiEvent;
use crate::general::sink::MidiSink;

/// Select a MIDI output port. Prefers a port whose name contains
/// `output_port_name_substr` and is not identical to `in_port_name`.
pub fn choose_output_port(midi_out: &MidiOutput, output_port_name_substr: &str, in_port_name: &str) -> Result<usize> {
    let ports = midi_out.ports();
    if ports.is_empty() {
        return Err(Error::Midi("no output port found".into()));
    }

    // Avoid routing a device back into itself
    if let Some(i) = find_output_port(midi_out, output_port_name_substr, in_port_name) {
        log::info!("Choosing output port matching '{}': {}", output_port_name_substr, midi_out.port_name(&ports[i])?);
        return Ok(i);
    }

    // Fallbacks: single port or interactive selection
    if ports.len() == 1 {
        log::info!("Choosing the only available output port: {}", midi_out.port_name(&ports[0])?);
        return Ok(0);
    }

    println!("\nAvailable output ports:");
    for (i, p) in ports.iter().enumerate() {
        println!("{}: {}", i, midi_out.port_name(p)?);
    }

    print!("Please select output port: ");
    stdout().flush()?;
    let mut choice = String::new();
    stdin().read_line(&mut choice)?;
    let idx = choice
        .trim()
        .parse::<usize>()
        .map_err(|_| Error::Midi(format!("invalid output port selection '{}'", choice.trim())))?;
    if idx >= ports.len() {
        return Err(Error::Midi("invalid output port selected".into()));
    }
    Ok(idx)
}

/// First port whose name contains `substr` and differs from `exclude`.
/// An empty `substr` never matches.
pub fn find_output_port(midi_out: &MidiOutput, substr: &str, exclude: &str) -> Option<usize> {
    if substr.is_empty() {
        return None;
    }
    midi_out.ports().iter().position(|p| {
        midi_out
            .port_name(p)
            .map(|name| name.contains(substr) && name != exclude)
            .unwrap_or(false)
    })
}

/// An open output port.
pub struct PortSink {
    conn: MidiOutputConnection,
    port_name: String,
}

impl PortSink {
    pub fn connect(midi_out: MidiOutput, index: usize, client_name: &str) -> Result<Self> {
        let ports = midi_out.ports();
        let port = ports
            .get(index)
            .ok_or_else(|| Error::Midi(format!("output port {} disappeared", index)))?;
        let port_name = midi_out.port_name(port)?;
        let conn = midi_out.connect(port, &format!("{}-output", client_name))?;
        Ok(Self { conn, port_name })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl MidiSink for PortSink {
    fn send(&mut self, event: &MidiEvent) -> Result<()> {
        self.conn.send(&event.to_bytes())?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.port_name
    }
}

/// Non-interactive connect used for live rebinding.
pub fn connect_output(client_name: &str, substr: &str) -> Result<PortSink> {
    let midi_out = MidiOutput::new(&format!("{} output", client_name))?;
    let index = find_output_port(&midi_out, substr, "")
        .ok_or_else(|| Error::Midi(format!("no output port matching '{}'", substr)))?;
    PortSink::connect(midi_out, index, client_name)
}

pub fn list_output_ports(midi_out: &MidiOutput) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for p in midi_out.ports() {
        names.push(midi_out.port_name(&p)?);
    }
    Ok(names)
}
