use std::io::stdin;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

use log::LevelFilter;

use super::check::{print_error, print_status};
use super::forwarder::{Command, LiveConfig};
use super::mapping::MappingPatch;
use super::preset::{default_preset_file_name, load_preset, save_preset, DeviceIds, PresetMeta};

/// One parsed console line.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Exit,
    Help,
    Status,
    Debug(bool),
    Patch(MappingPatch),
    Shift(i32),
    Panic,
    Save(Option<PathBuf>),
    Load(PathBuf),
    Name(String),
    Output(String),
    Disconnect,
    Unknown(String),
}

fn on_off(word: &str) -> Option<bool> {
    match word.to_ascii_lowercase().as_str() {
        "on" | "enable" | "1" | "true" => Some(true),
        "off" | "disable" | "0" | "false" => Some(false),
        _ => None,
    }
}

pub fn parse_command(line: &str) -> ConsoleCommand {
    let cmd = line.trim();
    if cmd.is_empty() {
        return ConsoleCommand::Exit;
    }
    if let Ok(v) = cmd.parse::<i32>() {
        return ConsoleCommand::Patch(MappingPatch::transpose(v));
    }

    let mut parts = cmd.split_whitespace();
    let head = parts.next().unwrap_or_default().to_ascii_lowercase();
    let args: Vec<&str> = parts.collect();
    let unknown = || ConsoleCommand::Unknown(cmd.to_string());
    let int = |i: usize| args.get(i).and_then(|a| a.parse::<i32>().ok());

    match (head.as_str(), args.len()) {
        ("exit" | "quit" | "q", 0) => ConsoleCommand::Exit,
        ("help" | "h", 0) => ConsoleCommand::Help,
        ("status" | "s", 0) => ConsoleCommand::Status,
        ("panic" | "p", 0) => ConsoleCommand::Panic,
        ("up" | "+", 0) => ConsoleCommand::Shift(1),
        ("down" | "-", 0) => ConsoleCommand::Shift(-1),
        ("transpose" | "t", 1) => int(0).map_or_else(unknown, |v| ConsoleCommand::Patch(MappingPatch::transpose(v))),
        ("vel", 2) => match (int(0), int(1)) {
            (Some(lo), Some(hi)) => ConsoleCommand::Patch(MappingPatch::vel_range(lo, hi)),
            _ => unknown(),
        },
        ("velmin", 1) => int(0).map_or_else(unknown, |v| {
            ConsoleCommand::Patch(MappingPatch { vel_min: Some(v), ..Default::default() })
        }),
        ("velmax", 1) => int(0).map_or_else(unknown, |v| {
            ConsoleCommand::Patch(MappingPatch { vel_max: Some(v), ..Default::default() })
        }),
        ("gamma", 1) => args[0]
            .parse::<f64>()
            .map_or_else(|_| unknown(), |g| ConsoleCommand::Patch(MappingPatch::gamma(g))),
        ("thru", 1) => on_off(args[0]).map_or_else(unknown, |b| ConsoleCommand::Patch(MappingPatch::thru(b))),
        ("debug", 1) => on_off(args[0]).map_or_else(unknown, ConsoleCommand::Debug),
        ("save", 0) => ConsoleCommand::Save(None),
        ("save", _) => ConsoleCommand::Save(Some(PathBuf::from(args.join(" ")))),
        ("load", n) if n > 0 => ConsoleCommand::Load(PathBuf::from(args.join(" "))),
        ("name", n) if n > 0 => ConsoleCommand::Name(args.join(" ")),
        ("out", 1) if args[0].eq_ignore_ascii_case("none") => ConsoleCommand::Disconnect,
        ("out", n) if n > 0 => ConsoleCommand::Output(args.join(" ")),
        _ => unknown(),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  <number>            - Set transpose in semitones (-24..24)");
    println!("  up / down           - Transpose by one semitone");
    println!("  vel <min> <max>     - Set output velocity range (1..127)");
    println!("  velmin / velmax <n> - Set one end of the velocity range");
    println!("  gamma <x>           - Velocity curve (0.4..2.5, 1 = linear)");
    println!("  thru on/off         - Enable/Disable forwarding");
    println!("  panic               - Send All Notes Off on all channels");
    println!("  save [path]         - Export preset JSON");
    println!("  load <path>         - Import preset JSON");
    println!("  name <text>         - Set preset name used on export");
    println!("  out <name>          - Switch output port (held notes are dropped)");
    println!("  out none            - Disconnect the output");
    println!("  status              - Show current mapping");
    println!("  debug on/off        - Enable/Disable per-event monitor logging");
    println!("  help/h              - Show this help");
    println!("  exit/quit/q         - Exit program");
}

/// State the console needs besides the forwarder channel.
pub struct Console {
    pub tx: Sender<Command>,
    pub live: LiveConfig,
    pub exit: Arc<AtomicBool>,
    pub client_name: String,
    pub meta: PresetMeta,
}

impl Console {
    fn send(&self, command: Command) {
        if self.tx.send(command).is_err() {
            print_error("Forwarder stopped; command dropped");
        }
    }

    fn switch_output(&mut self, name: &str) {
        match crate::io::output::connect_output(&self.client_name, name) {
            Ok(sink) => {
                self.meta.device.output = Some(sink.port_name().to_string());
                self.send(Command::BindOutput(Box::new(sink)));
            }
            Err(err) => print_error(&format!("Output not changed: {}", err)),
        }
    }

    /// Returns false once the console should stop reading.
    pub fn run_command(&mut self, command: ConsoleCommand) -> bool {
        match command {
            ConsoleCommand::Exit => {
                self.exit.store(true, Ordering::SeqCst);
                return false;
            }
            ConsoleCommand::Help => print_help(),
            ConsoleCommand::Status => print_status(&self.live.get()),
            ConsoleCommand::Debug(on) => {
                if std::env::var_os("RUST_LOG").is_some() {
                    println!("RUST_LOG is set; its filter decides what is logged");
                    return true;
                }
                log::set_max_level(if on { LevelFilter::Debug } else { LevelFilter::Info });
                println!("Debug {}", if on { "enabled" } else { "disabled" });
            }
            ConsoleCommand::Patch(patch) => {
                let preview = self.live.get().apply(&patch);
                self.send(Command::Patch(patch));
                print_status(&preview);
            }
            ConsoleCommand::Shift(delta) => {
                let preview = self.live.get().shift_transpose(delta);
                self.send(Command::ShiftTranspose(delta));
                print_status(&preview);
            }
            ConsoleCommand::Panic => self.send(Command::Panic),
            ConsoleCommand::Save(path) => {
                let path = path.unwrap_or_else(|| PathBuf::from(default_preset_file_name()));
                match save_preset(&path, &self.live.get(), &self.meta) {
                    Ok(()) => println!("Saved preset to {}", path.display()),
                    Err(err) => print_error(&format!("Save failed: {}", err)),
                }
            }
            ConsoleCommand::Load(path) => match load_preset(&path, &self.live.get()) {
                Ok((config, meta)) => {
                    self.meta.name = meta.name;
                    self.send(Command::Replace(config));
                    if let Some(out) = output_switch(&self.meta.device, &meta.device) {
                        self.switch_output(out);
                    }
                    print_status(&config);
                }
                Err(err) => print_error(&format!("Import failed, mapping unchanged: {}", err)),
            },
            ConsoleCommand::Name(name) => {
                println!("Preset name set to '{}'", name);
                self.meta.name = name;
            }
            ConsoleCommand::Output(name) => self.switch_output(&name),
            ConsoleCommand::Disconnect => {
                self.meta.device.output = None;
                self.send(Command::Unbind);
                println!("Output disconnected");
            }
            ConsoleCommand::Unknown(cmd) => {
                println!("Unrecognized command: '{}'. Type 'help' for available commands.", cmd);
            }
        }
        true
    }
}

/// Output a loaded preset asks for, when it differs from the bound one.
pub fn output_switch<'a>(current: &DeviceIds, preset: &'a DeviceIds) -> Option<&'a str> {
    let wanted = preset.output.as_deref()?;
    match current.output.as_deref() {
        Some(bound) if bound == wanted || bound.contains(wanted) => None,
        _ => Some(wanted),
    }
}

pub fn device_ids(input: &str, output: &str) -> DeviceIds {
    DeviceIds { input: Some(input.to_string()), output: Some(output.to_string()) }
}

/// Spawn a thread that reads lines from stdin until an exit command or EOF.
pub fn spawn_stdin_handler(mut console: Console) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let stdin = stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.read_line(&mut line) {
                Ok(0) | Err(_) => {
                    console.exit.store(true, Ordering::SeqCst);
                    break;
                }
                Ok(_) => {}
            }
            if !console.run_command(parse_command(&line)) {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mapping_commands() {
        assert_eq!(parse_command("7\n"), ConsoleCommand::Patch(MappingPatch::transpose(7)));
        assert_eq!(parse_command("-12"), ConsoleCommand::Patch(MappingPatch::transpose(-12)));
        assert_eq!(parse_command("vel 20 110"), ConsoleCommand::Patch(MappingPatch::vel_range(20, 110)));
        assert_eq!(parse_command("gamma 0.75"), ConsoleCommand::Patch(MappingPatch::gamma(0.75)));
        assert_eq!(parse_command("THRU off"), ConsoleCommand::Patch(MappingPatch::thru(false)));
        assert_eq!(parse_command("up"), ConsoleCommand::Shift(1));
        assert_eq!(parse_command("down"), ConsoleCommand::Shift(-1));
    }

    #[test]
    fn parses_control_commands() {
        assert_eq!(parse_command(""), ConsoleCommand::Exit);
        assert_eq!(parse_command("Quit"), ConsoleCommand::Exit);
        assert_eq!(parse_command("panic"), ConsoleCommand::Panic);
        assert_eq!(parse_command("save"), ConsoleCommand::Save(None));
        assert_eq!(parse_command("load my preset.json"), ConsoleCommand::Load(PathBuf::from("my preset.json")));
        assert_eq!(parse_command("out IAC Bus 2"), ConsoleCommand::Output("IAC Bus 2".into()));
        assert_eq!(parse_command("out None"), ConsoleCommand::Disconnect);
        assert_eq!(parse_command("debug on"), ConsoleCommand::Debug(true));
    }

    #[test]
    fn rejects_bad_arguments() {
        for line in ["vel 20", "gamma soft", "thru maybe", "load", "transpose x", "dance"] {
            assert!(matches!(parse_command(line), ConsoleCommand::Unknown(_)), "{line}");
        }
    }

    #[test]
    fn disconnect_unbinds_the_output() {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut console = Console {
            tx,
            live: LiveConfig::default(),
            exit: Arc::new(AtomicBool::new(false)),
            client_name: "test".into(),
            meta: PresetMeta { device: device_ids("Keys", "Synth"), ..PresetMeta::default() },
        };
        assert!(console.run_command(parse_command("out none")));
        assert!(matches!(rx.try_recv(), Ok(Command::Unbind)));
        assert_eq!(console.meta.device.output, None);
    }

    #[test]
    fn preset_output_hint_switches_only_when_different() {
        let bound = device_ids("Keys", "IAC Bus 1");
        let same = DeviceIds { input: None, output: Some("IAC Bus 1".into()) };
        let other = DeviceIds { input: None, output: Some("Synth".into()) };
        assert_eq!(output_switch(&bound, &same), None);
        assert_eq!(output_switch(&bound, &other), Some("Synth"));
        assert_eq!(output_switch(&bound, &DeviceIds::default()), None);
        assert_eq!(output_switch(&DeviceIds::default(), &other), Some("Synth"));
    }
}
