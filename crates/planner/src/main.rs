//! Command-line front end for the campground scheduling calendar.
//! It loads a month from the calendar API, draws the grid as text and runs
//! moves, blackouts and availability checks through the optimistic store.

mod config;
mod render;

use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use calendar_grid::{Candidate, InteractionSession, ItemKind, OccupancyIndex};
use campground_model::{BlackoutDraft, CalendarSnapshot, MonthRange, Placement};
use chrono::{Local, NaiveDate};
use reservation_sync::{
    AvailabilityProbe, CalendarStore, HttpCalendarApi, LogNotifier, RescheduleRequest,
};

use crate::config::PlannerConfig;
use crate::render::{HeadlessHost, render_agenda, render_month};

const USAGE: &str = "Usage:
  planner show [YYYY-MM] [--json]
  planner available <check-in> <check-out> <guests>
  planner move <reservation-id> <site-code|unassigned> <check-in> <check-out>
  planner blackout <site-code|all> <start> <end> <reason>
  planner watch [YYYY-MM]";

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", value))
}

fn arg<'a>(args: &'a [String], index: usize, name: &str) -> Result<&'a str> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("Missing <{}>\n\n{}", name, USAGE))
}

/// Resolve a site code (or id) typed by the user. `unassigned` and `all` map to
/// the pseudo placements.
fn resolve_placement(snapshot: &CalendarSnapshot, value: &str) -> Result<Placement> {
    match value.to_ascii_lowercase().as_str() {
        "unassigned" => return Ok(Placement::Unassigned),
        "all" => return Ok(Placement::AllSites),
        _ => {}
    }

    snapshot
        .campsites
        .iter()
        .find(|site| site.code.eq_ignore_ascii_case(value) || site.id == value)
        .map(|site| Placement::Site(site.id.clone()))
        .ok_or_else(|| anyhow!("Unknown campsite '{}'", value))
}

fn month_arg(args: &[String], index: usize, config: &PlannerConfig) -> Result<MonthRange> {
    match args.get(index).filter(|a| !a.starts_with("--")) {
        Some(value) => value.parse().context("Month must be in YYYY-MM form"),
        None => Ok(config
            .month
            .unwrap_or_else(|| MonthRange::containing(Local::now().date_naive()))),
    }
}

fn print_month(snapshot: Arc<CalendarSnapshot>, month: MonthRange, json: bool) -> Result<()> {
    let session = InteractionSession::new(HeadlessHost::default(), snapshot, month, None);
    let view = session.compose_view();

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    print!("{}", render_month(&view));
    for line in render_agenda(&view) {
        println!("{}", line);
    }
    Ok(())
}

async fn show(store: &CalendarStore, month: MonthRange, json: bool) -> Result<()> {
    store.load_month(month).await?;
    print_month(store.snapshot(), month, json)
}

async fn available(store: &CalendarStore, args: &[String]) -> Result<()> {
    let check_in = parse_date(arg(args, 1, "check-in")?)?;
    let check_out = parse_date(arg(args, 2, "check-out")?)?;
    let guests: u32 = arg(args, 3, "guests")?
        .parse()
        .context("Guests must be a number")?;

    store.load_month(MonthRange::containing(check_in)).await?;
    let snapshot = store.snapshot();
    let index = OccupancyIndex::new(snapshot.clone());
    let candidates = index.available_sites(check_in, check_out, guests);

    if candidates.is_empty() {
        log::info!("🚫 No campsite is free from {} to {}", check_in, check_out);
        return Ok(());
    }

    for site in candidates {
        let probe = AvailabilityProbe {
            campsite_id: site.id.clone(),
            check_in,
            check_out,
            guests,
            exclude_reservation_id: None,
        };
        let result = store.check_availability(&probe).await?;

        if result.available {
            println!("✅ {} {} ({})", site.code, site.name, site.campsite_type.label());
        } else {
            let reasons: Vec<&str> = result.conflicts.iter().map(|c| c.message.as_str()).collect();
            println!("❌ {} {}: {}", site.code, site.name, reasons.join("; "));
        }
    }
    Ok(())
}

async fn move_reservation(store: &CalendarStore, args: &[String]) -> Result<()> {
    let reservation_id = arg(args, 1, "reservation-id")?.to_string();
    let target = arg(args, 2, "site-code")?;
    let check_in = parse_date(arg(args, 3, "check-in")?)?;
    let check_out = parse_date(arg(args, 4, "check-out")?)?;

    store.load_month(MonthRange::containing(check_in)).await?;
    let snapshot = store.snapshot();
    let placement = resolve_placement(&snapshot, target)?;
    if placement == Placement::AllSites {
        bail!("A reservation cannot be placed on every campsite");
    }

    let index = OccupancyIndex::new(snapshot);
    index
        .validate(&Candidate {
            kind: ItemKind::Reservation,
            exclude_id: Some(reservation_id.as_str()),
            placement: &placement,
            start: check_in,
            end: check_out,
        })
        .map_err(|e| anyhow!("{}", e))?;

    let request = RescheduleRequest {
        reservation_id,
        campsite_id: placement.campsite_id().map(str::to_string),
        check_in,
        check_out,
    };
    let response = store.reschedule(request).await?;
    log::info!(
        "✅ {} now stays {} - {}",
        response.reservation.guest_name(),
        response.reservation.check_in,
        response.reservation.check_out
    );
    Ok(())
}

async fn create_blackout(store: &CalendarStore, args: &[String]) -> Result<()> {
    let target = arg(args, 1, "site-code")?;
    let start_date = parse_date(arg(args, 2, "start")?)?;
    let end_date = parse_date(arg(args, 3, "end")?)?;
    let reason = args.get(4..).map(|rest| rest.join(" ")).unwrap_or_default();

    store.load_month(MonthRange::containing(start_date)).await?;
    let snapshot = store.snapshot();
    let placement = resolve_placement(&snapshot, target)?;
    if placement == Placement::Unassigned {
        bail!("A blackout needs a campsite or 'all'");
    }

    let index = OccupancyIndex::new(snapshot);
    index
        .validate(&Candidate {
            kind: ItemKind::Blackout,
            exclude_id: None,
            placement: &placement,
            start: start_date,
            end: end_date,
        })
        .map_err(|e| anyhow!("{}", e))?;

    let draft = BlackoutDraft {
        campsite_id: placement.campsite_id().map(str::to_string),
        start_date,
        end_date,
        reason,
    };
    let blackout = store.create_blackout(draft).await?;
    log::info!("🚧 Blackout {} created", blackout.id);
    Ok(())
}

async fn watch(store: Arc<CalendarStore>, month: MonthRange) -> Result<()> {
    store.load_month(month).await?;
    store.start_failsafe().await;

    let mut updates = store.subscribe();
    print_month(store.snapshot(), month, false)?;

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                print_month(snapshot, month, false)?;
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("👋 Stopping planner");
                break;
            }
        }
    }

    store.stop_failsafe().await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = PlannerConfig::from_env()?;
    log::info!("🏕️ Calendar API: {}", config.api_url);

    let api = Arc::new(HttpCalendarApi::new(
        config.api_url.clone(),
        config.api_token.clone(),
    )?);
    let store = Arc::new(CalendarStore::new(
        api,
        Arc::new(LogNotifier),
        Some(config.sync.clone()),
    ));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("show");
    let json = args.iter().any(|a| a == "--json");

    match command {
        "show" => show(&store, month_arg(&args, 1, &config)?, json).await,
        "available" => available(&store, &args).await,
        "move" => move_reservation(&store, &args).await,
        "blackout" => create_blackout(&store, &args).await,
        "watch" => {
            let month = month_arg(&args, 1, &config)?;
            watch(store, month).await
        }
        "help" | "--help" | "-h" => {
            println!("{}", USAGE);
            Ok(())
        }
        other => bail!("Unknown command '{}'\n\n{}", other, USAGE),
    }
}
