//! Headless mode for the memory garden.
//!
//! A line-oriented stand-in for the map front end, for scripted runs and
//! manual checks of a configuration.

use garden_core::{EventKind, Garden, GardenEvent, MemoryId, Screen};
use tokio::io::{AsyncBufReadExt, BufReader};

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Complete(MemoryId),
    Screen(Screen),
    Status,
    Pins,
    Reset,
    Help,
    Quit,
}

/// Parse a `#command [arg]` line.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let Some(body) = line.strip_prefix('#') else {
        return Err(format!("Commands start with '#': {line}"));
    };

    let parts: Vec<&str> = body.split_whitespace().collect();
    match parts.as_slice() {
        ["complete", id] | ["c", id] => id
            .parse()
            .map(Command::Complete)
            .map_err(|_| format!("Not a memory id: {id}")),
        ["complete"] | ["c"] => Err("Usage: #complete <id>".to_string()),
        ["screen", name] => name.parse().map(Command::Screen).map_err(|e| e.to_string()),
        ["screen"] => Err("Usage: #screen <landing|map|final>".to_string()),
        ["status"] => Ok(Command::Status),
        ["pins"] => Ok(Command::Pins),
        ["reset"] => Ok(Command::Reset),
        ["help"] => Ok(Command::Help),
        ["quit"] | ["exit"] => Ok(Command::Quit),
        _ => Err(format!("Unknown command: {line}")),
    }
}

/// Print garden events the way a front end would react to them.
fn describe(event: &GardenEvent) -> String {
    match event {
        GardenEvent::MemoryCompleted { id, memory } => {
            format!("[BLOOM] Memory {id} \"{}\" completed", memory.title())
        }
        GardenEvent::ProgressUpdated(progress) => format!(
            "[PROGRESS] {} ({:.0}%) - {}",
            progress.counter(),
            progress.percentage,
            progress.subtitle
        ),
        GardenEvent::StateChanged(change) if change.reset => "[RESET] Garden reset".to_string(),
        GardenEvent::StateChanged(change) => match change.screen {
            Some(screen) => format!("[SCREEN] {screen}"),
            None => "[STATE] changed".to_string(),
        },
        GardenEvent::AllComplete => "[COMPLETE] Every memory has bloomed".to_string(),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  #complete <id>  - Complete a memory (alias #c)");
    println!("  #screen <name>  - Switch screen (landing, map, final)");
    println!("  #status         - Show progress");
    println!("  #pins           - List every pin and its state");
    println!("  #reset          - Forget all progress");
    println!("  #help           - Show this help");
    println!("  #quit           - Save and exit");
}

fn print_status(garden: &Garden) {
    let progress = garden.progress_snapshot();
    println!("[STATUS]");
    println!("  Screen: {}", garden.current_screen());
    println!("  Progress: {} ({:.0}%)", progress.counter(), progress.percentage);
    println!("  {}", progress.subtitle);
}

fn print_pins(garden: &Garden) {
    for memory in garden.memories() {
        let marker = if memory.is_proposal() { " (proposal)" } else { "" };
        println!(
            "  {:>3} {:<9} {}{marker}{}",
            memory.id.get(),
            memory.pin_state().name(),
            memory.title(),
            unlocks_suffix(garden.unlock_graph().successors(memory.id))
        );
    }
}

/// ` -> 2, 3` for a pin that unlocks others, empty otherwise.
fn unlocks_suffix(successors: &[MemoryId]) -> String {
    if successors.is_empty() {
        return String::new();
    }
    let ids: Vec<String> = successors.iter().map(MemoryId::to_string).collect();
    format!(" -> {}", ids.join(", "))
}

/// Run the command loop until `#quit` or end of input.
pub async fn run(mut garden: Garden) -> anyhow::Result<()> {
    for kind in EventKind::ALL {
        garden.subscribe(kind, |event| println!("{}", describe(event)));
    }

    println!("=== Memory Garden Headless Mode ===");
    print_status(&garden);
    print_pins(&garden);
    println!();
    print_help();
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        match parse_command(&line) {
            Ok(Command::Complete(id)) => {
                if !garden.mark_memory_complete(id) {
                    let reason = match garden.memory(id) {
                        None => "unknown memory",
                        Some(m) if m.completed => "already completed",
                        Some(_) => "still locked",
                    };
                    println!("[ERROR] Cannot complete memory {id}: {reason}");
                }
            }
            Ok(Command::Screen(screen)) => garden.set_screen(screen),
            Ok(Command::Status) => print_status(&garden),
            Ok(Command::Pins) => print_pins(&garden),
            Ok(Command::Reset) => garden.reset().await,
            Ok(Command::Help) => print_help(),
            Ok(Command::Quit) => break,
            Err(message) => println!("[ERROR] {message}"),
        }
    }

    if garden.flush().await {
        tracing::debug!("Flushed pending save before exit");
    }
    println!("Goodbye!");
    Ok(())
}
