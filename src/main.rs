//! FPL sync CLI
//!
//! Keeps a local player table in step with the official FPL snapshot.

use clap::{Parser, Subcommand};
use fplsync::{Config, Result};

#[derive(Parser)]
#[command(name = "fplsync")]
#[command(about = "Fantasy Premier League data sync and player name matching", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "fplsync.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Data management commands
    Data {
        #[command(subcommand)]
        action: DataCommands,
    },
    /// Show which FPL player a local name resolves to
    Resolve {
        /// Local player name
        name: String,
        #[command(flatten)]
        source: SnapshotArgs,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Initialize a new project with default config
    Init,
}

#[derive(Subcommand)]
enum DataCommands {
    /// Update player teams from the FPL API
    Sync {
        #[command(flatten)]
        source: SnapshotArgs,
        /// Report matches without writing them
        #[arg(long)]
        dry_run: bool,
    },
    /// Import players from a JSON file
    Import {
        /// JSON array of { "name": ..., "position": ... }
        file: String,
    },
    /// Show database status
    Status,
}

/// Where the FPL snapshot comes from
#[derive(clap::Args)]
struct SnapshotArgs {
    /// Cache directory for bootstrap snapshots
    #[arg(long)]
    cache: Option<String>,
    /// Use only cached files (no network requests)
    #[arg(long)]
    offline: bool,
    /// Read the snapshot from a file instead of the API
    #[arg(long)]
    snapshot: Option<String>,
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use table or json.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = match cli.command {
        Commands::Data { action } => match action {
            DataCommands::Sync { source, dry_run } => {
                commands::data_sync(&config, &source, dry_run)
            }
            DataCommands::Import { file } => commands::data_import(&config, &file),
            DataCommands::Status => commands::data_status(&config),
        },
        Commands::Resolve {
            name,
            source,
            format,
        } => commands::resolve(&config, &name, &source, format),
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use fplsync::data::{self, Bootstrap, Database, FplClient, SyncOptions};
    use fplsync::matching::MatchIndex;

    const UNMATCHED_SAMPLE: usize = 25;

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("data")?;
        println!("Created data/ directory");

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!("  2. Run 'fplsync data import players.json' to seed local players");
        println!("  3. Run 'fplsync data sync' to match them against FPL");

        Ok(())
    }

    fn load_bootstrap(config: &Config, source: &SnapshotArgs) -> Result<Bootstrap> {
        if let Some(path) = &source.snapshot {
            println!("Reading snapshot from {}", path);
            return Bootstrap::load_file(path);
        }

        let mut client = FplClient::new(&config.api)?;
        if let Some(cache_dir) = &source.cache {
            println!("Using cache directory: {}", cache_dir);
            client = client.with_cache(cache_dir);
        }
        if source.offline {
            println!("Offline mode: using cached files only");
            client = client.offline_only(true);
        }
        client.fetch_bootstrap()
    }

    pub fn data_sync(config: &Config, source: &SnapshotArgs, dry_run: bool) -> Result<()> {
        let mut db = Database::open(&config.data.database_path)?;

        println!("Fetching FPL bootstrap data...");
        let bootstrap = load_bootstrap(config, source)?;
        println!(
            "Fetched {} teams and {} players",
            bootstrap.teams.len(),
            bootstrap.elements.len()
        );

        let options = SyncOptions {
            dry_run: dry_run || config.sync.dry_run,
        };
        let summary = data::sync_player_teams(&mut db, &bootstrap, options)?;

        println!("\nSync Summary");
        println!("───────────────────────────────");
        println!("  Teams upserted: {}", summary.teams_upserted);
        println!("  Matched:        {}", summary.matched);
        println!("  Ambiguous:      {}", summary.ambiguous);
        println!("  Unmatched:      {}", summary.unmatched);
        if options.dry_run {
            println!("  Dry run: no rows updated");
        } else {
            println!("  Rows updated:   {}", summary.updated);
        }

        if !summary.unmatched_names.is_empty() {
            println!("\nUnmatched sample (first {}):", UNMATCHED_SAMPLE);
            for (id, name) in summary.unmatched_names.iter().take(UNMATCHED_SAMPLE) {
                println!("  id={} name={:?}", id.0, name);
            }
        }

        Ok(())
    }

    pub fn data_import(config: &Config, file: &str) -> Result<()> {
        let mut db = Database::open(&config.data.database_path)?;
        let count = data::import_players(&mut db, file)?;
        println!("Imported {} players from {}", count, file);
        Ok(())
    }

    pub fn data_status(config: &Config) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let stats = db.get_stats()?;

        println!("Database Status");
        println!("───────────────────────────────");
        println!("  Path:         {}", config.data.database_path);
        println!("  Teams:        {}", stats.team_count);
        println!("  Players:      {}", stats.player_count);
        println!("  With team:    {}", stats.players_with_team);
        println!("  With FPL id:  {}", stats.players_with_element);
        if let Some(last_sync) = stats.last_sync {
            println!("  Last sync:    {}", last_sync);
        }

        Ok(())
    }

    pub fn resolve(
        config: &Config,
        name: &str,
        source: &SnapshotArgs,
        format: OutputFormat,
    ) -> Result<()> {
        let bootstrap = load_bootstrap(config, source)?;
        let index = MatchIndex::build(&bootstrap.catalog());
        let resolution = index.resolve_detailed(name);

        match format {
            OutputFormat::Table => match resolution {
                Some(r) => {
                    let team = bootstrap
                        .team(r.record.team)
                        .map(|t| t.name.as_str())
                        .unwrap_or("unknown team");
                    println!("{:?} resolves to", name);
                    println!(
                        "  Player:  {} {} ({})",
                        r.record.first_name, r.record.last_name, r.record.display_name
                    );
                    println!("  FPL id:  {}", r.record.id.0);
                    println!("  Team:    {} ({})", team, r.record.team.0);
                    println!("  Step:    {}", r.step);
                    if r.is_ambiguous() {
                        println!("  Warning: {} candidates shared this key", r.candidates);
                    }
                }
                None => println!("{:?}: no match", name),
            },
            OutputFormat::Json => {
                let json = match resolution {
                    Some(r) => serde_json::json!({
                        "name": name,
                        "matched": true,
                        "record": r.record,
                        "step": r.step,
                        "candidates": r.candidates,
                    }),
                    None => serde_json::json!({ "name": name, "matched": false }),
                };
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
        }

        Ok(())
    }
}
