use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rosc::{decoder, OscMessage, OscPacket, OscType};

use crate::config::OscSettings;
use crate::general::forwarder::Command;
use crate::general::mapping::MappingPatch;

fn numeric(arg: &OscType) -> Option<f64> {
    match *arg {
        OscType::Int(v) => Some(v as f64),
        OscType::Long(v) => Some(v as f64),
        OscType::Float(v) => Some(v as f64),
        OscType::Double(v) => Some(v),
        _ => None,
    }
}

fn integer(arg: &OscType) -> Option<i32> {
    numeric(arg).map(|v| v.round() as i32)
}

/// Button-style argument: 1 or true presses, anything else is ignored.
fn pressed(arg: &OscType) -> bool {
    match *arg {
        OscType::Bool(b) => b,
        _ => numeric(arg).is_some_and(|v| (v - 1.0).abs() < f64::EPSILON),
    }
}

fn switch(arg: &OscType) -> Option<bool> {
    match *arg {
        OscType::Bool(b) => Some(b),
        _ => numeric(arg).map(|v| v != 0.0),
    }
}

/// Map one OSC message to a forwarder command.
pub fn message_command(msg: &OscMessage, osc: &OscSettings) -> Option<Command> {
    let addr = msg.addr.as_str();
    let Some(arg) = msg.args.first() else {
        log::warn!("[OSC] {} without argument ignored", addr);
        return None;
    };

    let command = if addr == osc.transpose_path {
        integer(arg).map(|v| Command::Patch(MappingPatch::transpose(v)))
    } else if addr == osc.transpose_up_path {
        return pressed(arg).then_some(Command::ShiftTranspose(1));
    } else if addr == osc.transpose_down_path {
        return pressed(arg).then_some(Command::ShiftTranspose(-1));
    } else if addr == osc.vel_min_path {
        integer(arg).map(|v| Command::Patch(MappingPatch { vel_min: Some(v), ..Default::default() }))
    } else if addr == osc.vel_max_path {
        integer(arg).map(|v| Command::Patch(MappingPatch { vel_max: Some(v), ..Default::default() }))
    } else if addr == osc.gamma_path {
        numeric(arg).map(|g| Command::Patch(MappingPatch::gamma(g)))
    } else if addr == osc.thru_path {
        switch(arg).map(|b| Command::Patch(MappingPatch::thru(b)))
    } else if addr == osc.panic_path {
        return pressed(arg).then_some(Command::Panic);
    } else {
        log::debug!("[OSC] unhandled path {}", addr);
        return None;
    };

    if command.is_none() {
        log::warn!("[OSC] {} has an unusable argument {:?}", addr, arg);
    }
    command
}

fn handle_packet(packet: OscPacket, osc: &OscSettings, tx: &Sender<Command>) {
    match packet {
        OscPacket::Message(msg) => {
            if let Some(command) = message_command(&msg, osc) {
                log::debug!("[OSC] {} {:?}", msg.addr, msg.args);
                let _ = tx.send(command);
            }
        }
        OscPacket::Bundle(bundle) => {
            // Process all messages in the bundle
            for pkt in bundle.content {
                handle_packet(pkt, osc, tx);
            }
        }
    }
}

/// Spawns a background thread that listens for OSC on the configured address
/// and turns recognized messages into forwarder commands.
/// The thread checks `exit` periodically to shut down gracefully.
pub fn spawn_osc_listener(osc: OscSettings, tx: Sender<Command>, exit: Arc<AtomicBool>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let bind_addr = format!("{}:{}", osc.listening_host, osc.listening_port);
        let socket = match UdpSocket::bind(&bind_addr) {
            Ok(s) => s,
            Err(err) => {
                log::error!("OSC bind failed on {}: {}", bind_addr, err);
                return;
            }
        };

        // Set socket timeout so we can check the exit flag periodically
        socket.set_read_timeout(Some(Duration::from_millis(200))).ok();
        log::info!("OSC listener bound on {}", bind_addr);

        let mut buf = [0u8; decoder::MTU];
        while !exit.load(Ordering::SeqCst) {
            match socket.recv_from(&mut buf) {
                Ok((size, peer_addr)) => match decoder::decode_udp(&buf[..size]) {
                    Ok((_, packet)) => handle_packet(packet, &osc, &tx),
                    Err(err) => log::warn!("OSC decode error from {}: {}", peer_addr, err),
                },
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::WouldBlock || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    continue;
                }
                Err(err) => log::error!("OSC recv error: {}", err),
            }
        }
        log::debug!("OSC listener exiting");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(addr: &str, arg: OscType) -> OscMessage {
        OscMessage { addr: addr.to_string(), args: vec![arg] }
    }

    #[test]
    fn maps_paths_to_commands() {
        let osc = OscSettings::default();
        assert!(matches!(
            message_command(&msg("/transpose", OscType::Float(3.4)), &osc),
            Some(Command::Patch(p)) if p == MappingPatch::transpose(3)
        ));
        assert!(matches!(
            message_command(&msg("/transposeDown", OscType::Int(1)), &osc),
            Some(Command::ShiftTranspose(-1))
        ));
        assert!(matches!(
            message_command(&msg("/gamma", OscType::Double(1.7)), &osc),
            Some(Command::Patch(p)) if p == MappingPatch::gamma(1.7)
        ));
        assert!(matches!(
            message_command(&msg("/thru", OscType::Int(0)), &osc),
            Some(Command::Patch(p)) if p == MappingPatch::thru(false)
        ));
        assert!(matches!(message_command(&msg("/panic", OscType::Bool(true)), &osc), Some(Command::Panic)));
    }

    #[test]
    fn ignores_unpressed_buttons_and_bad_arguments() {
        let osc = OscSettings::default();
        assert!(message_command(&msg("/transposeUp", OscType::Int(0)), &osc).is_none());
        assert!(message_command(&msg("/panic", OscType::Float(0.0)), &osc).is_none());
        assert!(message_command(&msg("/transpose", OscType::String("up".into())), &osc).is_none());
        assert!(message_command(&msg("/unknown", OscType::Int(1)), &osc).is_none());
        let empty = OscMessage { addr: "/transpose".into(), args: vec![] };
        assert!(message_command(&empty, &osc).is_none());
    }
}
