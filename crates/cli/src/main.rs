use std::{
    collections::HashSet,
    fs::{self, OpenOptions},
    sync::{Arc, Mutex},
};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use playpoint_core::{
    config::{self, AppConfig},
    courts, AuthToken, ChatMessage, CourtFilter, GameId, GameSessionClient, HostedGames,
    HttpGameApi, Schedule, SessionSnapshot, ShuffleType,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{prelude::*, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "playpoint", about = "PlayPoint game session client")]
struct Cli {
    /// Bearer token from `playpoint login`.
    #[arg(long, global = true, env = "PLAYPOINT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Exchange credentials for an access token.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "PLAYPOINT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account.
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "PLAYPOINT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Send a password reset email.
    ResetPassword {
        #[arg(long)]
        email: String,
    },
    /// Browse open courts, optionally filtered.
    Courts {
        /// Part of the location, any case.
        #[arg(long)]
        location: Option<String>,
        /// Highest acceptable price.
        #[arg(long)]
        max_price: Option<f64>,
        /// First acceptable date, `YYYY-MM-DD`.
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,
        /// Last acceptable date, `YYYY-MM-DD`.
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
        /// Start of the wanted time window, `HH:MM`.
        #[arg(long, value_parser = parse_time, requires = "before")]
        after: Option<NaiveTime>,
        /// End of the wanted time window, `HH:MM`.
        #[arg(long, value_parser = parse_time, requires = "after")]
        before: Option<NaiveTime>,
    },
    /// Show a game's details.
    Game {
        game_id: GameId,
        #[arg(long)]
        json: bool,
    },
    /// Reserve a seat in a game.
    Join { game_id: GameId },
    /// Cancel your reservation.
    Unjoin { game_id: GameId },
    /// Split the current players into two teams.
    Shuffle {
        game_id: GameId,
        #[arg(long, default_value_t = ShuffleType::Random)]
        kind: ShuffleType,
    },
    /// Follow a game's chat and send lines from stdin.
    Chat { game_id: GameId },
    /// Manage games you host.
    Hosted {
        #[command(subcommand)]
        action: HostedAction,
    },
}

#[derive(Debug, Subcommand)]
enum HostedAction {
    /// List games you host.
    List,
    /// Host a game on a court, e.g. `--start "2024-05-01 18:00"`.
    Create {
        #[arg(long)]
        court: i64,
        #[arg(long, value_parser = parse_schedule)]
        start: Schedule,
        #[arg(long, value_parser = parse_schedule)]
        end: Schedule,
    },
    /// Delete one of your hosted games.
    Delete { game_id: GameId },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let Cli { token, command } = Cli::parse();
    config::ensure_default_config()?;
    let config = AppConfig::load()?;
    let api = HttpGameApi::from_config(&config)?;

    match command {
        Command::Login { email, password } => {
            let token = api.login(&email, &password).await?;
            println!("{}", token.as_str());
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            let reply = api.register(&username, &email, &password).await?;
            println!("{}", reply.message.as_deref().unwrap_or("Registered"));
        }
        Command::ResetPassword { email } => {
            let reply = api.reset_password(&email).await?;
            println!("{}", reply.message.as_deref().unwrap_or("Reset email sent"));
        }
        Command::Courts {
            location,
            max_price,
            from,
            to,
            after,
            before,
        } => {
            let filter = CourtFilter {
                location,
                max_price,
                dates: from.zip(to),
                window: after.zip(before),
            };
            let listings = courts::list(&api).await?;
            for court in filter.apply(&listings) {
                println!(
                    "{:>6}  {:<24} {:<20} {} {}  {}",
                    court.id.to_string(),
                    court.name,
                    court.location,
                    court.available_date.as_deref().unwrap_or("?"),
                    court.available_time.as_deref().unwrap_or("?"),
                    court
                        .price
                        .map(|price| format!("{price:.2}"))
                        .unwrap_or_else(|| "-".to_string())
                );
            }
        }
        Command::Game { game_id, json } => {
            let session = open(&api, require_token(token)?, game_id, &config).await?;
            let snapshot = session.snapshot();
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot.game)?);
            } else {
                print_details(&snapshot);
            }
        }
        Command::Join { game_id } => {
            let session = open(&api, require_token(token)?, game_id, &config).await?;
            session
                .join()
                .await
                .map_err(|err| anyhow!(err.user_message()))?;
            print_details(&session.snapshot());
        }
        Command::Unjoin { game_id } => {
            let session = open(&api, require_token(token)?, game_id, &config).await?;
            session
                .unjoin()
                .await
                .map_err(|err| anyhow!(err.user_message()))?;
            print_details(&session.snapshot());
        }
        Command::Shuffle { game_id, kind } => {
            let session = open(&api, require_token(token)?, game_id, &config).await?;
            let teams = session
                .shuffle(kind)
                .await
                .map_err(|err| anyhow!(err.user_message()))?;
            println!("Team 1: {}", teams.team1.join(", "));
            println!("Team 2: {}", teams.team2.join(", "));
        }
        Command::Chat { game_id } => {
            let session = open(&api, require_token(token)?, game_id, &config).await?;
            chat(session).await?;
        }
        Command::Hosted { action } => {
            let hosted = HostedGames::new(api, require_token(token)?);
            match action {
                HostedAction::List => {
                    for game in hosted.list().await? {
                        println!(
                            "{:>6}  {:<24} {} - {}  ({} joined)",
                            game.id.to_string(),
                            game.name,
                            game.start_time.as_deref().unwrap_or("?"),
                            game.end_time.as_deref().unwrap_or("?"),
                            game.players_joined
                        );
                    }
                }
                HostedAction::Create { court, start, end } => {
                    if end <= start {
                        bail!("end must be after start");
                    }
                    hosted.create(court, start, end).await?;
                    println!("Game created");
                }
                HostedAction::Delete { game_id } => {
                    hosted.delete(game_id).await?;
                    println!("Game {game_id} deleted");
                }
            }
        }
    }

    Ok(())
}

fn require_token(token: Option<String>) -> Result<AuthToken> {
    token
        .map(AuthToken::new)
        .ok_or_else(|| anyhow!("no token; pass --token or set PLAYPOINT_TOKEN"))
}

async fn open(
    api: &HttpGameApi,
    token: AuthToken,
    game_id: GameId,
    config: &AppConfig,
) -> Result<GameSessionClient> {
    GameSessionClient::open(
        Arc::new(api.clone()),
        token,
        game_id,
        config.poll_interval(),
    )
    .await
    .map_err(|err| anyhow!(err.user_message()))
}

async fn chat(session: GameSessionClient) -> Result<()> {
    if !session.snapshot().is_user_joined() {
        bail!("join the game before opening its chat");
    }
    session.set_focused(true);
    if let Err(err) = session.refresh_messages().await {
        tracing::warn!("Initial chat refresh failed: {err}");
        eprintln!("{}", err.user_message());
    }

    let mut updates = session.subscribe();
    let mut seen = HashSet::new();
    print_new_messages(&updates.borrow_and_update().messages, &mut seen);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let messages = updates.borrow_and_update().messages.clone();
                print_new_messages(&messages, &mut seen);
            }
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                if line.trim() == "/quit" {
                    break;
                }
                if let Err(err) = session.send_message(&line).await {
                    tracing::error!("Chat send failed: {err}");
                    eprintln!("{}", err.user_message());
                }
            }
        }
    }

    session.set_focused(false);
    session.close();
    Ok(())
}

fn print_new_messages(messages: &[ChatMessage], seen: &mut HashSet<i64>) {
    for message in messages {
        if seen.insert(message.message_id) {
            println!(
                "[{}] {}: {}",
                message.timestamp, message.username, message.content
            );
        }
    }
}

fn print_details(snapshot: &SessionSnapshot) {
    let game = &snapshot.game;
    println!("{} (#{})", game.name, game.game_id);
    if let Some(location) = &game.location {
        println!("  Location: {location}");
    }
    if let Some(window) = game.time_range_label() {
        let date = game
            .starts_at()
            .map(|start| start.date_label())
            .unwrap_or_default();
        println!("  When:     {date} {window}");
    }
    if let Some(price) = game.price {
        println!("  Price:    {price:.2}");
    }
    if let Some(level) = &game.level {
        println!("  Level:    {level}");
    }
    println!(
        "  Players:  {} joined, {} seats open",
        game.players_joined, game.available_seats
    );
    let you = if game.is_user_joined {
        "joined"
    } else {
        "not joined"
    };
    println!("  You:      {you}");
    if let Some(teams) = &game.shuffle_result {
        println!("  Team 1:   {}", teams.team1.join(", "));
        println!("  Team 2:   {}", teams.team2.join(", "));
    }
}

fn parse_schedule(raw: &str) -> Result<Schedule, String> {
    Schedule::parse(raw)
        .ok_or_else(|| format!("unrecognised date and time `{raw}`"))
}

fn parse_time(raw: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|err| format!("unrecognised time `{raw}`: {err}"))
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("playpoint.log"))?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_ansi(false)
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}
