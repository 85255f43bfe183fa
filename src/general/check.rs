use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use super::mapping::MappingConfig;

static BANNER_PRINTED: AtomicBool = AtomicBool::new(false);

fn print_colored(color: Color, line: &str) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(color)).set_intense(true));
    let _ = writeln!(&mut stdout, "{}", line);
    let _ = stdout.reset();
}

// Print the quick help line in blue (works on Windows CMD via termcolor)
pub fn print_quick_help() {
    print_colored(Color::Blue, "Type 'help' for commands, 'exit' to quit");
}

pub fn print_connections_active(input: &str, output: &str) {
    // Ensure we only print one banner overall
    if BANNER_PRINTED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return;
    }
    print_colored(Color::Green, &format!("Bridge active | '{}' -> '{}'", input, output));
    print_quick_help();
}

pub fn print_status(config: &MappingConfig) {
    let color = if config.thru() { Color::Cyan } else { Color::Yellow };
    print_colored(color, &config.to_string());
    if config.vel_min() > config.vel_max() {
        print_colored(Color::Yellow, "Note: velocity min is above max, the curve is inverted");
    }
}

pub fn print_error(line: &str) {
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    let _ = stderr.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_intense(true));
    let _ = writeln!(&mut stderr, "{}", line);
    let _ = stderr.reset();
}
