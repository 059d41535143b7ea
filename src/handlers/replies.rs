//! User-facing reply text

use crate::lottery::{DrawPlan, DrawPreview, LotteryRun, RunOutcome};
use crate::models::{GeoPoint, StatusCounts};
use crate::utils::errors::{LotteryError, PickMeError};

/// Short explanation of a failure, distinct per error kind
pub fn describe_error(err: &PickMeError) -> String {
    match err {
        PickMeError::Lottery(e) => describe_lottery_error(e),
        PickMeError::EventNotFound { event_id } => format!("❌ Event {} does not exist.", event_id),
        PickMeError::EntrantNotFound { event_id, .. } => {
            format!("❌ You are not on the waiting list of event {}.", event_id)
        }
        PickMeError::AlreadyJoined { event_id, .. } => {
            format!("ℹ️ You are already on the waiting list of event {}.", event_id)
        }
        PickMeError::WaitingListFull { event_id, max_entrants } => {
            format!("🚫 The waiting list of event {} is full ({} entrants).", event_id, max_entrants)
        }
        PickMeError::InvalidStateTransition { from, .. } => {
            format!("⚠️ That is not possible right now: your entry is {}.", from)
        }
        PickMeError::InvalidInput(reason) => format!("⚠️ {}", reason),
        _ => "❌ Something went wrong. Please try again later.".to_string(),
    }
}

fn describe_lottery_error(err: &LotteryError) -> String {
    match err {
        LotteryError::NotAuthorized { event_id, .. } => {
            format!("🔒 Only the organizer of event {} can do that.", event_id)
        }
        LotteryError::EventAlreadyOccurred { event_id, event_date } => format!(
            "📅 Event {} already took place on {}.",
            event_id,
            event_date.format("%Y-%m-%d %H:%M UTC")
        ),
        LotteryError::Configuration { event_id, reason } => {
            format!("🛠 Event {} is misconfigured: {}.", event_id, reason)
        }
        LotteryError::EventNotFound { event_id } => format!("❌ Event {} does not exist.", event_id),
        LotteryError::ConcurrentModification { .. } => {
            "🔁 The waiting list changed while we were working. Please try again.".to_string()
        }
        LotteryError::RunInProgress { event_id } => {
            format!("⏳ A draw for event {} is already running. Try again in a moment.", event_id)
        }
        LotteryError::TimedOut { event_id } => {
            format!("⏱ The draw for event {} took too long and nothing was changed. Please retry.", event_id)
        }
        LotteryError::StorageUnavailable(_) => {
            "💾 Storage is unavailable right now. Please retry later.".to_string()
        }
    }
}

pub fn format_run(run: &LotteryRun) -> String {
    match run.outcome {
        RunOutcome::Drawn => {
            let mut text = format!(
                "🎉 Drew {} of {} waiting entrants for event {}.",
                run.winners.len(),
                run.pool_size,
                run.event_id
            );
            if !run.excluded.is_empty() {
                text.push_str(&format!(
                    "\n{} drawn entrants left the list during the draw; run again to fill their seats.",
                    run.excluded.len()
                ));
            }
            text
        }
        RunOutcome::NothingToDraw => format!(
            "✅ Event {} already has enough invited entrants (or nobody is waiting). Nothing drawn.",
            run.event_id
        ),
        RunOutcome::CapacityReached => format!("🚫 Event {} is at capacity. Nothing drawn.", run.event_id),
    }
}

pub fn format_preview(event_id: i64, preview: &DrawPreview) -> String {
    let plan = match preview.plan {
        DrawPlan::Draw(n) => format!("The next draw picks {} of {} waiting entrants.", n, preview.pool_size),
        DrawPlan::NothingToDraw => "The next draw would pick nobody.".to_string(),
        DrawPlan::CapacityReached => "The event is at capacity.".to_string(),
    };
    format!("🔮 Event {}\n{}\n\n{}", event_id, plan, format_counts(&preview.counts))
}

pub fn format_counts(counts: &StatusCounts) -> String {
    format!(
        "Waiting: {}\nInvited: {}\nAccepted: {}\nDeclined: {}\nCancelled: {}",
        counts.waiting, counts.selected, counts.accepted, counts.rejected, counts.cancelled
    )
}

/// Parse `/join` arguments: `<event> [latitude longitude]`
pub fn parse_join_args(args: &str) -> Result<(i64, Option<GeoPoint>), PickMeError> {
    let usage = || PickMeError::InvalidInput("Usage: /join <event> [latitude longitude]".to_string());
    let parts: Vec<&str> = args.split_whitespace().collect();

    match parts.as_slice() {
        [event] => Ok((event.parse().map_err(|_| usage())?, None)),
        [event, lat, lon] => {
            let event_id = event.parse().map_err(|_| usage())?;
            let latitude: f64 = lat.parse().map_err(|_| usage())?;
            let longitude: f64 = lon.parse().map_err(|_| usage())?;
            if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
                return Err(PickMeError::InvalidInput("Coordinates are out of range".to_string()));
            }
            Ok((event_id, Some(GeoPoint { latitude, longitude })))
        }
        _ => Err(usage()),
    }
}
