use anyhow::Result;
use clap::{Parser, Subcommand};
use draft_assistant::utils::data::save_picks_to_csv;
use draft_assistant::utils::suggestions::{rank_players, top_suggestions};
use draft_assistant::{refresh_all, AppConfig, CachedFeed, Database, LiveFeed, PlayerView, Position};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "draft-cli", about = "Fantasy football draft assistant")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pull roster, consensus ranks, ADP and news into the database
    Refresh,
    /// List players by blended rank
    Players {
        #[arg(long)]
        position: Option<Position>,
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Show who to draft next
    Suggest {
        #[arg(long)]
        available_only: bool,
    },
    /// List recorded picks
    Picks,
    /// Write recorded picks to CSV
    Export {
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

fn fmt_opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn print_player(index: usize, player: &PlayerView) {
    println!(
        "{:>3}. {:<26} {:<3} {:<3} tier {:<2} ecr {:<4} blend {:<7} adp {:<6} risk {}{}",
        index + 1,
        player.clean_name,
        player.position,
        player.team,
        fmt_opt(player.tier),
        fmt_opt(player.ecr_rank),
        fmt_opt(player.blended_rank.map(|r| format!("{:.1}", r))),
        fmt_opt(player.adp.map(|a| format!("{:.1}", a))),
        fmt_opt(player.injury_risk.map(|r| format!("{:.1}", r))),
        if player.picked { "  (picked)" } else { "" },
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;
    let db = Database::open(&config.db_path)?;
    db.seed_team_slots(config.league_size)?;

    match cli.command {
        Command::Refresh => {
            println!("Refreshing player data...\n");
            let live = LiveFeed::new()?;
            let summary = if config.use_cache {
                let feed = CachedFeed::new(live, &config.cache_dir, config.data_ttl, config.news_ttl);
                refresh_all(&db, &feed).await?
            } else {
                refresh_all(&db, &live).await?
            };

            println!("Players known: {}", summary.players);
            println!(
                "  - Consensus ranks: {} resolved, {} unresolved, {} malformed",
                summary.consensus.resolved, summary.consensus.unresolved, summary.consensus.malformed
            );
            println!(
                "  - Half-PPR ADP: {} resolved, {} unresolved, {} malformed",
                summary.primary_adp.resolved, summary.primary_adp.unresolved, summary.primary_adp.malformed
            );
            if let Some(bestball) = &summary.secondary_adp {
                println!(
                    "  - Best-ball ADP: {} resolved, {} unresolved, {} malformed",
                    bestball.resolved, bestball.unresolved, bestball.malformed
                );
            }
            println!("  - News items: {}", summary.news_items);
            if !summary.degraded_sources.is_empty() {
                println!("Skipped sources: {}", summary.degraded_sources.join(", "));
            }
        }
        Command::Players { position, limit } => {
            let board = db.load_board(position)?;
            let players = rank_players(&board, &config.weights);
            for (i, player) in players.iter().take(limit).enumerate() {
                print_player(i, player);
            }
        }
        Command::Suggest { available_only } => {
            let mut board = db.load_board(None)?;
            if available_only {
                board.retain(|entry| !entry.picked);
            }
            let suggestions = top_suggestions(&board, &config.weights, config.suggest_top, config.suggest_next);

            println!("Top picks:");
            for (i, player) in suggestions.top.iter().enumerate() {
                print_player(i, player);
            }
            println!("\nNext up:");
            for (i, player) in suggestions.next.iter().enumerate() {
                print_player(suggestions.top.len() + i, player);
            }
        }
        Command::Picks => {
            let picks = db.list_picks()?;
            if picks.is_empty() {
                println!("No picks recorded");
            }
            for pick in picks {
                println!(
                    "#{:<3} round {:<2} team {:<2} player {} ({})",
                    pick.overall_no,
                    pick.round_no,
                    pick.team_slot_id,
                    pick.player_id,
                    pick.ts.format("%H:%M:%S")
                );
            }
        }
        Command::Export { path } => {
            let path = path.unwrap_or_else(|| config.export_path.clone());
            let picks = db.list_picks()?;
            save_picks_to_csv(&picks, &path)?;
            println!("Saved {} picks to {}", picks.len(), path.display());
        }
    }

    Ok(())
}
