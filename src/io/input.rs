use std::io::{stdin, stdout, Write};

use midir::MidiInput;

use crate::error::{Error, Result};

/// Select a MIDI input port. First tries to find a port whose name contains
/// `input_port_name_substr`. If no match is found and there are multiple ports,
/// prompts the user to choose one interactively.
pub fn choose_input_port(midi_in: &MidiInput, input_port_name_substr: &str) -> Result<usize> {
    let ports = midi_in.ports();
    if ports.is_empty() {
        return Err(Error::Midi("no input port found".into()));
    }

    // Try substring match first
    if !input_port_name_substr.is_empty() {
        for (i, p) in ports.iter().enumerate() {
            if let Ok(name) = midi_in.port_name(p) {
                if name.contains(input_port_name_substr) {
                    log::info!("Choosing input port matching '{}': {}", input_port_name_substr, name);
                    return Ok(i);
                }
            }
        }
    }

    // Fallbacks: only one port -> choose it, otherwise list and ask
    if ports.len() == 1 {
        log::info!("Choosing the only available input port: {}", midi_in.port_name(&ports[0])?);
        return Ok(0);
    }

    println!("\nAvailable input ports:");
    for (i, p) in ports.iter().enumerate() {
        println!("{}: {}", i, midi_in.port_name(p)?);
    }

    print!("Please select input port: ");
    stdout().flush()?;
    let mut choice = String::new();
    stdin().read_line(&mut choice)?;
    let idx = choice
        .trim()
        .parse::<usize>()
        .map_err(|_| Error::Midi(format!("invalid input port selection '{}'", choice.trim())))?;
    if idx >= ports.len() {
        return Err(Error::Midi("invalid input port selected".into()));
    }
    Ok(idx)
}

pub fn list_input_ports(midi_in: &MidiInput) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for p in midi_in.ports() {
        names.push(midi_in.port_name(&p)?);
    }
    Ok(names)
}
