//! Standalone command-line check of the schedule API.
//!
//! Fetches the feed once and prints what the bot would answer, without
//! connecting to Telegram.

use std::process::ExitCode;

use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use tefcon_bot::commands::{next_events_reply, render_current_events, render_rooms};
use tefcon_bot::config::FeedSettings;
use tefcon_bot::schedule::{self, FeedClient, ScheduleError, ScheduleItem};

/// Which part of the feed to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum View {
    Rooms,
    Current,
    Next,
    All,
}

/// Schedule API check.
#[derive(Parser, Debug)]
#[command(name = "schedule_probe")]
#[command(about = "Fetches the conference schedule API and prints the bot's replies")]
#[command(version)]
struct Args {
    /// Schedule API base URL (defaults to `SCHEDULE_API_URL` or the public API).
    #[arg(short, long)]
    url: Option<String>,

    /// What to print.
    #[arg(short, long, value_enum, default_value = "all")]
    view: View,

    /// Evaluate next events at this RFC 3339 instant instead of now.
    #[arg(long, value_parser = parse_instant)]
    at: Option<DateTime<Utc>>,

    /// Print the snapshot as JSON instead of the rendered replies (only the selected slot for `next`).
    #[arg(long)]
    json: bool,
}

fn parse_instant(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {e}"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .init();

    if let Err(e) = dotenvy::dotenv() {
        debug!("Could not load .env file: {}", e);
    }

    let mut settings = FeedSettings::from_env_with_defaults();
    if let Some(url) = args.url {
        settings.base_url = url;
    }

    let client = match FeedClient::new(&settings) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("✗ Failed to build HTTP client: {e}");
            return ExitCode::FAILURE;
        }
    };

    println!("Schedule API: {}\n", client.base_url());

    let now = args.at.unwrap_or_else(Utc::now);

    let result = if args.json {
        print_json(&client, args.view, now).await
    } else {
        print_replies(&client, args.view, now).await
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("✗ {e}");
            ExitCode::FAILURE
        }
    }
}

async fn print_replies(
    client: &FeedClient,
    view: View,
    now: DateTime<Utc>,
) -> Result<(), ScheduleError> {
    if matches!(view, View::Rooms | View::All) {
        let rooms = client.fetch_rooms().await?;
        println!("== /rooms ({} rooms)", rooms.len());
        println!("{}", render_rooms(&rooms));
    }

    if matches!(view, View::Current | View::Next | View::All) {
        let items = client.fetch_schedule().await?;

        if matches!(view, View::Current | View::All) {
            let current = schedule::current_events(&items);
            println!("== /current_events ({} of {} items)", current.len(), items.len());
            println!("{}", render_current_events(&current));
        }

        if matches!(view, View::Next | View::All) {
            println!("== /next_events (at {})", now.to_rfc3339());
            println!("{}", next_events_reply(&items, now));
        }
    }

    Ok(())
}

/// Prints the snapshot as JSON. `next` prints only the selected slot.
async fn print_json(
    client: &FeedClient,
    view: View,
    now: DateTime<Utc>,
) -> Result<(), ScheduleError> {
    if matches!(view, View::Rooms | View::All) {
        let rooms = client.fetch_rooms().await?;
        println!("{}", serde_json::to_string_pretty(&rooms)?);
    }

    if matches!(view, View::Current | View::Next | View::All) {
        let items = client.fetch_schedule().await?;
        let items = items_for_view(view, items, now)?;
        println!("{}", serde_json::to_string_pretty(&items)?);
    }

    Ok(())
}

/// Narrows a snapshot to the items a view reports on.
fn items_for_view(
    view: View,
    items: Vec<ScheduleItem>,
    now: DateTime<Utc>,
) -> Result<Vec<ScheduleItem>, ScheduleError> {
    Ok(match view {
        View::Current => schedule::current_events(&items),
        View::Next => schedule::select_next(&items, now)?.items,
        View::Rooms | View::All => items,
    })
}
