use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use pillbox_core::collaborators::{spoken_dose, spoken_pill};
use pillbox_core::email::read_outbox;
use pillbox_core::*;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pillbox")]
#[command(about = "Personal medication tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Accept every confirmation prompt
    #[arg(long, short = 'y', global = true)]
    yes: bool,

    /// Show debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a pill to the catalog
    Add {
        name: String,
        #[arg(value_parser = parse_dosage)]
        dosage: f64,
        unit: String,
    },

    /// List catalog pills (or the trash)
    List {
        #[arg(long)]
        trash: bool,
    },

    /// Move a catalog pill to the trash
    Delete { index: usize },

    /// Move a trashed pill back to the catalog
    Restore { index: usize },

    /// Permanently empty the pill trash
    EmptyTrash,

    /// Record a dose session
    Take {
        /// Pill to take as INDEX or INDEXxQTY (e.g. 0x2), repeatable
        #[arg(long = "dose", value_parser = parse_dose_spec)]
        doses: Vec<(usize, u32)>,

        #[arg(long, default_value = "")]
        note: String,

        /// When the pills were taken (RFC 3339)
        #[arg(long)]
        taken_at: Option<DateTime<Utc>>,
    },

    /// Show session history
    History {
        /// Only sessions containing the catalog pill at this index
        #[arg(long)]
        filter: Option<usize>,
    },

    /// Set the history order
    Order { order: OrderArg },

    /// Turn announcements on or off
    Sounds { state: Toggle },

    /// Archive the entire history
    ClearHistory,

    /// Email history entries
    Email {
        /// Recipient, defaults to email.recipient from config
        #[arg(long)]
        to: Option<String>,

        #[arg(long, value_enum, default_value_t = ScopeArg::All)]
        scope: ScopeArg,

        /// Catalog pill index for --scope filtered
        #[arg(long, required_if_eq("scope", "filtered"))]
        filter: Option<usize>,
    },

    /// Export history to CSV
    Export { path: PathBuf },

    /// List emails queued in the outbox
    Outbox,
}

#[derive(Clone, Copy, ValueEnum)]
enum OrderArg {
    NewFirst,
    OldFirst,
    Toggle,
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ScopeArg {
    All,
    Recent,
    Filtered,
}

fn parse_dosage(value: &str) -> std::result::Result<f64, String> {
    let dosage = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid dosage '{}': {}", value, e))?;
    if !dosage.is_finite() || dosage < 0.0 {
        return Err(format!("dosage must be a finite, non-negative number, got {}", value));
    }
    Ok(dosage)
}

fn parse_dose_spec(spec: &str) -> std::result::Result<(usize, u32), String> {
    let (index, quantity) = match spec.split_once(['x', 'X', ':']) {
        Some((index, quantity)) => (index, quantity),
        None => (spec, "1"),
    };
    let index = index
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("invalid pill index '{}': {}", index, e))?;
    let quantity = quantity
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid quantity '{}': {}", quantity, e))?;
    if quantity == 0 {
        return Err("quantity must be at least 1".into());
    }
    Ok((index, quantity))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    pillbox_core::logging::init_with_level(if cli.verbose { "debug" } else { "warn" });

    let mut config = Config::load()?;
    if let Some(data_dir) = cli.data_dir {
        config.data.data_dir = data_dir;
    }

    let store = JsonStateStore::new(config.state_path()).with_fallback(config.initial_state());
    let collaborators = Collaborators {
        prompt: Box::new(StdinPrompt { assume_yes: cli.yes }),
        announcer: Box::new(StdoutAnnouncer),
        notifier: Box::new(StdoutNotifier),
        clock: Box::new(SystemClock),
    };
    let mut pillbox = Pillbox::open(store, collaborators)?;

    match cli.command {
        Commands::Add { name, dosage, unit } => {
            pillbox.add_pill(&name, dosage, &unit)?;
        }
        Commands::List { trash } => {
            let pills = if trash {
                pillbox.catalog().trash()
            } else {
                pillbox.catalog().pills()
            };
            if pills.is_empty() {
                println!("{}", if trash { "Trash is empty." } else { "No pills to take!" });
            }
            for (index, pill) in pills.iter().enumerate() {
                println!("{:>3}. {}", index, pill.label());
            }
        }
        Commands::Delete { index } => {
            let pill = pillbox.delete_pill(index)?;
            println!("Moved {} to trash", pill.label());
        }
        Commands::Restore { index } => {
            let pill = pillbox.restore_pill(index)?;
            println!("Restored {}", pill.label());
        }
        Commands::EmptyTrash => {
            if pillbox.empty_trash()? {
                println!("Trash emptied");
            }
        }
        Commands::Take {
            doses,
            note,
            taken_at,
        } => cmd_take(&mut pillbox, &doses, &note, taken_at)?,
        Commands::History { filter } => {
            let mut shown = 0;
            for record in pillbox.history(filter)? {
                for line in record.display_lines() {
                    println!("{}", line);
                }
                println!();
                shown += 1;
            }
            if shown == 0 {
                println!("No history to show.");
            }
        }
        Commands::Order { order } => {
            let reverse = match order {
                OrderArg::NewFirst => false,
                OrderArg::OldFirst => true,
                OrderArg::Toggle => !pillbox.ledger().is_reverse_order(),
            };
            pillbox.set_reverse_order(reverse)?;
            println!("History order: {}", if reverse { "Old → New" } else { "New → Old" });
        }
        Commands::Sounds { state } => {
            pillbox.set_play_sounds(matches!(state, Toggle::On))?;
        }
        Commands::ClearHistory => {
            if pillbox.clear_history()? {
                println!("Pill history cleared");
            }
        }
        Commands::Email { to, scope, filter } => {
            let recipient = to
                .or_else(|| config.email.recipient.clone())
                .ok_or_else(|| Error::Config("No recipient: pass --to or set email.recipient".into()))?;
            let scope = match scope {
                ScopeArg::All => EmailScope::All,
                ScopeArg::Recent => EmailScope::Recent {
                    days: config.email.recent_days,
                },
                ScopeArg::Filtered => EmailScope::Filtered {
                    pill_index: filter.unwrap_or_default(),
                },
            };
            let mut sender = OutboxSender::new(config.outbox_path());
            pillbox.email_history(&recipient, scope, &mut sender)?;
        }
        Commands::Export { path } => {
            let rows = pillbox.export_history(&path)?;
            println!("Exported {} rows to {}", rows, path.display());
        }
        Commands::Outbox => {
            let entries = read_outbox(&config.outbox_path())?;
            if entries.is_empty() {
                println!("Outbox is empty.");
            }
            for entry in entries {
                println!(
                    "{}  {}  {} records",
                    entry.queued_at.format(DISPLAY_TIME_FORMAT),
                    entry.recipient,
                    entry.records.len()
                );
            }
        }
    }

    Ok(())
}

fn cmd_take<S: StateStore>(
    pillbox: &mut Pillbox<S>,
    doses: &[(usize, u32)],
    note: &str,
    taken_at: Option<DateTime<Utc>>,
) -> Result<()> {
    for &(index, quantity) in doses {
        pillbox.add_dose(index, quantity)?;
    }

    if pillbox.take_session(note, taken_at)?.is_none() {
        println!("Nothing recorded.");
    }
    Ok(())
}

/// Confirmation prompt on stdin/stdout
struct StdinPrompt {
    assume_yes: bool,
}

impl ConfirmPrompt for StdinPrompt {
    fn confirm(&mut self, request: &Confirmation) -> bool {
        if self.assume_yes {
            return true;
        }

        println!("{}", request.title);
        println!("{}", request.message);
        print!(
            "[y] {} / [N] {} > ",
            request.accept_label, request.decline_label
        );
        if io::stdout().flush().is_err() {
            return false;
        }

        let mut input = String::new();
        match io::stdin().lock().read_line(&mut input) {
            Ok(_) => matches!(input.trim().to_lowercase().as_str(), "y" | "yes"),
            Err(e) => {
                tracing::warn!("Failed to read confirmation: {}", e);
                false
            }
        }
    }
}

/// Prints the phrases a speaking front end would say
struct StdoutAnnouncer;

impl Announcer for StdoutAnnouncer {
    fn announce_pills(&mut self, pills: &[Pill]) {
        for pill in pills {
            println!("♪ {}", spoken_pill(pill));
        }
    }

    fn announce_doses(&mut self, doses: &[Dose]) {
        for dose in doses {
            println!("♪ {}", spoken_dose(dose));
        }
    }
}

/// Prints notifications to the terminal
struct StdoutNotifier;

impl Notifier for StdoutNotifier {
    fn notify(&mut self, kind: NoticeKind, title: &str, body: &str) {
        match kind {
            NoticeKind::Success => {
                println!("✓ {}", title);
                for line in body.lines() {
                    println!("  {}", line);
                }
            }
            NoticeKind::Error => {
                eprintln!("✗ {}", title);
                for line in body.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }
}
