use crate::utils::get_store;
use campus_shared::Event;
use chrono::NaiveDate;
use serenity::{
    client::Context,
    model::{channel::ChannelType, id::GuildId},
    Error as SerenityError,
};
use std::time::Duration;
use tracing::{info, warn};

pub const ANNOUNCEMENTS_CHANNEL: &str = "announcements";

const PERIOD: Duration = Duration::from_secs(60 * 60 * 24);

#[derive(Debug, Default)]
pub struct ReminderBuckets {
    pub today: Vec<Event>,
    pub tomorrow: Vec<Event>,
    pub next_week: Vec<Event>,
}

impl ReminderBuckets {
    pub fn is_empty(&self) -> bool {
        self.today.is_empty() && self.tomorrow.is_empty() && self.next_week.is_empty()
    }
}

/// Buckets events by whole-calendar-day distance from `today`: due today,
/// due tomorrow, due in exactly one week. Everything else is dropped, and
/// events with unparseable dates are skipped silently.
pub fn bucket_events<'a, I>(events: I, today: NaiveDate) -> ReminderBuckets
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut buckets = ReminderBuckets::default();
    for event in events {
        let date = match event.parse_date() {
            Some(date) => date,
            None => continue,
        };
        match (date - today).num_days() {
            0 => buckets.today.push(event.clone()),
            1 => buckets.tomorrow.push(event.clone()),
            7 => buckets.next_week.push(event.clone()),
            _ => {}
        }
    }
    buckets
}

pub fn format_bucket(header: &str, events: &[Event]) -> String {
    let lines: Vec<String> = events
        .iter()
        .map(|e| format!("• **{}**: {}", e.get_module(), e.get_description()))
        .collect();
    format!("{}\n{}", header, lines.join("\n"))
}

/// The recurring reminder task. Spawned once after the gateway reports
/// ready; the only way out is an abort at shutdown.
pub async fn run(context: Context) {
    info!("Reminder loop started.");
    let mut ticker = tokio::time::interval(PERIOD);
    loop {
        ticker.tick().await;
        if let Err(why) = sweep(&context).await {
            warn!("Reminder sweep failed: {:?}.", why);
        }
    }
}

async fn sweep(context: &Context) -> Result<(), SerenityError> {
    let store = get_store(context).await;
    let events: Vec<Event> = store.events().into_iter().map(|(_, e)| e).collect();
    if events.is_empty() {
        return Ok(());
    }

    let today = chrono::Local::now().date_naive();
    let buckets = bucket_events(events.iter(), today);
    if buckets.is_empty() {
        return Ok(());
    }

    for guild in context.cache.guilds().await {
        // One broken guild must not starve the rest of the sweep.
        if let Err(why) = remind_guild(context, guild, &buckets).await {
            warn!("Reminders for guild {} failed: {:?}.", guild, why);
        }
    }
    Ok(())
}

async fn remind_guild(
    context: &Context,
    guild: GuildId,
    buckets: &ReminderBuckets,
) -> Result<(), SerenityError> {
    let channels = guild.channels(&context.http).await?;
    let channel = match channels
        .values()
        .find(|c| c.kind == ChannelType::Text && c.name == ANNOUNCEMENTS_CHANNEL)
    {
        Some(channel) => channel.id,
        None => return Ok(()),
    };

    if !buckets.today.is_empty() {
        channel
            .say(
                &context.http,
                format_bucket("🔴 **Events TODAY:**", &buckets.today),
            )
            .await?;
    }
    if !buckets.tomorrow.is_empty() {
        channel
            .say(
                &context.http,
                format_bucket("⚠️ **Events TOMORROW:**", &buckets.tomorrow),
            )
            .await?;
    }
    if !buckets.next_week.is_empty() {
        channel
            .say(
                &context.http,
                format_bucket("📅 **Events in 1 week:**", &buckets.next_week),
            )
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(date: &str) -> Event {
        Event::new("COS1501".to_string(), date.to_string(), "Exam".to_string())
    }

    #[test]
    fn events_land_in_exactly_one_bucket() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        let events = vec![
            event("2026-08-28"), // yesterday: dropped
            event("2026-08-29"), // today
            event("2026-08-30"), // tomorrow
            event("2026-09-04"), // six days out: dropped
            event("2026-09-05"), // exactly one week
            event("2026-09-06"), // eight days out: dropped
        ];

        let buckets = bucket_events(events.iter(), today);
        assert_eq!(1, buckets.today.len());
        assert_eq!("2026-08-29", buckets.today[0].get_date());
        assert_eq!(1, buckets.tomorrow.len());
        assert_eq!("2026-08-30", buckets.tomorrow[0].get_date());
        assert_eq!(1, buckets.next_week.len());
        assert_eq!("2026-09-05", buckets.next_week[0].get_date());
    }

    #[test]
    fn unparseable_dates_are_skipped() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        let events = vec![event("next tuesday"), event("2026-13-40")];

        assert!(bucket_events(events.iter(), today).is_empty());
    }

    #[test]
    fn bucket_formatting_lists_one_event_per_line() {
        let events = vec![
            Event::new("COS1501".into(), "2026-08-29".into(), "Exam".into()),
            Event::new("MAT1512".into(), "2026-08-29".into(), "Assignment 1 due".into()),
        ];

        let text = format_bucket("🔴 **Events TODAY:**", &events);
        assert_eq!(
            "🔴 **Events TODAY:**\n• **COS1501**: Exam\n• **MAT1512**: Assignment 1 due",
            text
        );
    }
}
