use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Context, Result};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use todostore::app::{self, Level, Notification, Notifier, PartialEdit};
use todostore::config::{self, Backend, Config};
use todostore::render;
use todostore::{Category, Confirm, NewTask, Priority, SortKey, StatusFilter, TaskStore};

#[derive(Parser)]
#[command(name = "todo")]
#[command(about = "To-do list manager backed by a persistent task store")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to the store directory (default: platform data directory)
    #[arg(short, long)]
    store_path: Option<PathBuf>,

    /// Storage backend, overriding config.yaml
    #[arg(short, long, value_enum)]
    backend: Option<Backend>,

    /// Do not ask before deleting
    #[arg(short, long)]
    yes: bool,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a task
    Add {
        /// Task text
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Due date (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,

        /// Due time (HH:MM)
        #[arg(short, long)]
        time: Option<String>,

        #[arg(short, long, value_enum, default_value_t = Category::Personal)]
        category: Category,

        #[arg(short, long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
    },

    /// Show tasks and progress
    List {
        #[arg(short, long, value_enum, default_value_t = StatusFilter::All)]
        filter: StatusFilter,

        #[arg(short, long, value_enum, default_value_t = SortKey::Created)]
        sort: SortKey,
    },

    /// Mark a task completed, or reopen it
    Toggle {
        /// Task id or its short id
        id: String,
    },

    /// Change a task; omitted fields keep their value, an empty string clears date/time
    Edit {
        /// Task id or its short id
        id: String,

        #[arg(long)]
        text: Option<String>,

        #[arg(short, long)]
        date: Option<String>,

        #[arg(short, long)]
        time: Option<String>,

        #[arg(short, long, value_enum)]
        category: Option<Category>,

        #[arg(short, long, value_enum)]
        priority: Option<Priority>,
    },

    /// Delete a task
    Delete {
        /// Task id or its short id
        id: String,
    },

    /// Delete all completed tasks
    ClearCompleted,

    /// Show task counts
    Stats,
}

/// Prints notifications, remembering whether any was an error
#[derive(Default)]
struct TerminalNotifier {
    failed: bool,
}

impl Notifier for TerminalNotifier {
    fn notify(&mut self, notification: Notification) {
        match notification.level {
            Level::Success => println!("{}", notification.message.green()),
            Level::Error => {
                self.failed = true;
                eprintln!("{}", notification.message.red());
            }
        }
    }
}

/// Asks on the terminal unless confirmation is switched off
struct PromptConfirm {
    enabled: bool,
}

impl Confirm for PromptConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        if !self.enabled {
            return true;
        }

        print!("{} [y/N] ", prompt);
        if io::stdout().flush().is_err() {
            return false;
        }

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    let store_path = cli.store_path.clone().unwrap_or_else(config::default_store_path);
    let mut config = Config::load(&store_path)?;
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if cli.yes {
        config.confirm = false;
    }

    // Open store
    let storage = config
        .backend
        .open(&store_path)
        .with_context(|| format!("Failed to open store at {}", store_path.display()))?;
    let mut store = TaskStore::open(storage)?;

    let mut notifier = TerminalNotifier::default();
    let mut confirm = PromptConfirm {
        enabled: config.confirm,
    };
    let today = chrono::Local::now().date_naive();

    match cli.command {
        Commands::Add {
            text,
            date,
            time,
            category,
            priority,
        } => {
            let new = NewTask {
                text: text.join(" "),
                date,
                time,
                category,
                priority,
            };
            let added = app::add_task(&mut store, new, &mut notifier);
            if let Some(task) = added.and_then(|id| store.get(&id)) {
                println!("{}", render::format_line(&render::project_task(task, today)));
            }
        }
        Commands::List { filter, sort } => {
            print!("{}", render::format_list(&store.view(filter, sort), today));
            println!();
            print!("{}", render::format_stats(&store.stats()));
        }
        Commands::Toggle { id } => {
            app::toggle_task(&mut store, &id, &mut notifier);
        }
        Commands::Edit {
            id,
            text,
            date,
            time,
            category,
            priority,
        } => {
            let changes = PartialEdit {
                text,
                date,
                time,
                category,
                priority,
            };
            app::edit_task_fields(&mut store, &id, changes, &mut notifier);
        }
        Commands::Delete { id } => {
            app::delete_task(&mut store, &id, &mut confirm, &mut notifier);
        }
        Commands::ClearCompleted => {
            app::clear_completed(&mut store, &mut confirm, &mut notifier);
        }
        Commands::Stats => {
            print!("{}", render::format_stats(&store.stats()));
        }
    }

    if notifier.failed {
        std::process::exit(1);
    }

    Ok(())
}
