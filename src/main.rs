use std::error::Error;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};
use log::LevelFilter;
use midir::{Ignore, MidiInput, MidiOutput};

use chorda_bridge::config::{startup_log_level, AppConfig, DEFAULT_CONFIG_FILE, DEFAULT_LOG_FILTER};
use chorda_bridge::general::check::{print_connections_active, print_error, print_status};
use chorda_bridge::general::forwarder::{spawn_forwarder, Command, Forwarder};
use chorda_bridge::general::preset::{load_preset, PresetMeta};
use chorda_bridge::general::stdin_handler::{device_ids, spawn_stdin_handler, Console};
use chorda_bridge::io::input::{choose_input_port, list_input_ports};
use chorda_bridge::io::output::{choose_output_port, list_output_ports, PortSink};
use chorda_bridge::remote::osc_listener::spawn_osc_listener;
use chorda_bridge::MappingConfig;

#[derive(Parser)]
#[command(name = "chorda-bridge", version, about = "Live MIDI transpose and velocity curve bridge")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Application config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Input port name substring (overrides config)
    #[arg(short, long)]
    input: Option<String>,

    /// Output port name substring (overrides config)
    #[arg(short, long)]
    output: Option<String>,

    /// Preset JSON to import at startup
    #[arg(short, long)]
    preset: Option<PathBuf>,

    /// Starting transpose in semitones (-24..24)
    #[arg(short, long, allow_negative_numbers = true)]
    transpose: Option<i32>,

    /// Log every event in and out
    #[arg(long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List available MIDI ports
    List,
    /// Write a config file with default values
    InitConfig,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);
    if let Err(err) = run(cli) {
        print_error(&format!("Error: {}", err));
        std::process::exit(1);
    }
}

fn init_logging(debug: bool) {
    let from_env = std::env::var_os("RUST_LOG").is_some();
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(DEFAULT_LOG_FILTER));
    if !from_env {
        // Admit debug records; the max level below is what 'debug on/off' moves
        builder.filter_level(LevelFilter::Debug);
    }
    builder.format_timestamp_millis().init();
    if !from_env {
        log::set_max_level(startup_log_level(debug));
    } else if debug {
        log::warn!("RUST_LOG is set; --debug has no effect");
    }
}

fn list_ports(client_name: &str) -> Result<(), Box<dyn Error>> {
    let midi_in = MidiInput::new(&format!("{} input", client_name))?;
    let midi_out = MidiOutput::new(&format!("{} output", client_name))?;
    println!("Input ports:");
    for (i, name) in list_input_ports(&midi_in)?.iter().enumerate() {
        println!("  {}: {}", i, name);
    }
    println!("Output ports:");
    for (i, name) in list_output_ports(&midi_out)?.iter().enumerate() {
        println!("  {}: {}", i, name);
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut app = AppConfig::load_or_default(&cli.config)?;
    if let Some(input) = cli.input {
        app.midi.input_port = input;
    }
    if let Some(output) = cli.output {
        app.midi.output_port = output;
    }

    match cli.command {
        Some(Commands::List) => return list_ports(&app.midi.client_name),
        Some(Commands::InitConfig) => {
            app.save(&cli.config)?;
            println!("Wrote config to {}", cli.config.display());
            return Ok(());
        }
        None => {}
    }

    let mut mapping = MappingConfig::default().with_transpose(app.mapping.transpose);
    let mut meta = PresetMeta::default();
    if let Some(path) = cli.preset.or_else(|| app.mapping.preset.clone()) {
        let (config, loaded) = load_preset(&path, &mapping)?;
        // Device hints from the preset only fill in ports not chosen otherwise
        if app.midi.input_port.is_empty() {
            app.midi.input_port = loaded.device.input.clone().unwrap_or_default();
        }
        if app.midi.output_port.is_empty() {
            app.midi.output_port = loaded.device.output.clone().unwrap_or_default();
        }
        mapping = config;
        meta = loaded;
    }
    if let Some(t) = cli.transpose {
        mapping = mapping.with_transpose(t);
    }

    let client_name = app.midi.client_name.clone();
    let mut midi_in = MidiInput::new(&format!("{} input", client_name))?;
    midi_in.ignore(Ignore::None);
    let midi_out = MidiOutput::new(&format!("{} output", client_name))?;

    let in_ports = midi_in.ports();
    let in_idx = choose_input_port(&midi_in, &app.midi.input_port)?;
    let in_port = in_ports.get(in_idx).ok_or("input port disappeared")?;
    let in_port_name = midi_in.port_name(in_port)?;

    let out_idx = choose_output_port(&midi_out, &app.midi.output_port, &in_port_name)?;
    let sink = PortSink::connect(midi_out, out_idx, &client_name)?;
    let out_port_name = sink.port_name().to_string();
    meta.device = device_ids(&in_port_name, &out_port_name);

    // The forwarder thread owns the engine and the output; everything else talks to it through `tx`
    let (tx, rx) = channel::<Command>();
    let forwarder = Forwarder::new(mapping, Some(Box::new(sink)));
    let live = forwarder.live_config();
    let forward_handle = spawn_forwarder(forwarder, rx);

    let midi_tx = tx.clone();
    let conn_in = midi_in.connect(
        in_port,
        &format!("{}-input", client_name),
        move |stamp, message, _| {
            let _ = midi_tx.send(Command::Midi { stamp, bytes: message.to_vec() });
        },
        (),
    )?;

    print_connections_active(&in_port_name, &out_port_name);
    print_status(&mapping);

    let exit = Arc::new(AtomicBool::new(false));
    let osc_handle = if app.osc.enabled {
        Some(spawn_osc_listener(app.osc.clone(), tx.clone(), exit.clone()))
    } else {
        None
    };
    let stdin_handle = spawn_stdin_handler(Console {
        tx,
        live,
        exit: exit.clone(),
        client_name,
        meta,
    });

    // Wait for exit signal from stdin thread
    while !exit.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(100));
    }

    log::info!("Closing connections and exiting...");
    let _ = stdin_handle.join();
    if let Some(handle) = osc_handle {
        let _ = handle.join();
    }
    // Dropping the input connection drops the last sender and ends the forwarder
    drop(conn_in);
    let _ = forward_handle.join();

    Ok(())
}
