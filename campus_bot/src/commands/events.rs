use crate::utils::{checks::*, get_store, messages};
use campus_shared::{event::DATE_FORMAT, Event};
use chrono::NaiveDate;
use serenity::{
    client::Context,
    framework::standard::{macros::command, Args, CommandResult},
    model::{channel::Message, misc::Mentionable},
    utils::Colour,
};

#[command]
#[checks(Admin)]
#[only_in(guilds)]
async fn addevent(ctx: &Context, msg: &Message, mut args: Args) -> CommandResult {
    let (module, date) = match (args.single::<String>(), args.single::<String>()) {
        (Ok(module), Ok(date)) => (module.to_uppercase(), date),
        _ => {
            msg.channel_id
                .say(
                    &ctx.http,
                    "Usage: `!addevent <module> <YYYY-MM-DD> <description>`",
                )
                .await?;
            return Ok(());
        }
    };
    let description = args.rest().trim().to_string();
    if description.is_empty() {
        msg.channel_id
            .say(
                &ctx.http,
                "Usage: `!addevent <module> <YYYY-MM-DD> <description>`",
            )
            .await?;
        return Ok(());
    }

    let event_date = match NaiveDate::parse_from_str(&date, DATE_FORMAT) {
        Ok(event_date) => event_date,
        Err(_) => {
            messages::send_embed(
                ctx,
                msg.channel_id,
                Colour::RED,
                "❌ Invalid Date",
                "Date must be in format: YYYY-MM-DD\nExample: 2026-06-15",
            )
            .await?;
            return Ok(());
        }
    };

    let store = get_store(ctx).await;
    if !store.module_exists(&module) {
        messages::send_embed(
            ctx,
            msg.channel_id,
            Colour::ORANGE,
            "⚠️ Warning",
            &format!(
                "Module **{}** doesn't exist, but the event will be created anyway.",
                module
            ),
        )
        .await?;
    }

    let _ = store.add_event(&module, &date, &description);

    let days_until = (event_date - chrono::Local::now().date_naive()).num_days();
    messages::send_embed(
        ctx,
        msg.channel_id,
        Colour::DARK_GREEN,
        "✅ Event Added",
        &format!(
            "**{}** - {}\n\n**Date:** {}\n**Days until:** {}",
            module, description, date, days_until
        ),
    )
    .await?;

    if let Some(guild) = msg.guild_id {
        messages::log_action(
            ctx,
            guild,
            &format!(
                "📅 {} added event: **{}** on {}",
                msg.author.mention(),
                module,
                date
            ),
            Colour::BLUE,
        )
        .await;
    }
    Ok(())
}

#[command]
#[aliases("schedule")]
async fn events(ctx: &Context, msg: &Message, mut args: Args) -> CommandResult {
    let module = args.single::<String>().ok().map(|m| m.to_uppercase());
    let store = get_store(ctx).await;
    let events = match &module {
        Some(module) => store.events_for(module),
        None => store.events(),
    };

    let title = match &module {
        Some(module) => format!("📅 Events for {}", module),
        None => "📅 All Events".to_string(),
    };

    if events.is_empty() {
        let text = match &module {
            Some(module) => format!("No events found for **{}**.", module),
            None => "No events scheduled.".to_string(),
        };
        messages::send_embed(ctx, msg.channel_id, Colour::BLUE, &title, &text).await?;
        return Ok(());
    }

    let mut sorted: Vec<&Event> = events.values().collect();
    sorted.sort_by(|a, b| a.get_date().cmp(b.get_date()));

    let today = chrono::Local::now().date_naive();
    let mut upcoming = Vec::new();
    let mut past = Vec::new();
    for event in sorted {
        let line = format!(
            "**{}** - {}\n{}",
            event.get_module(),
            event.get_date(),
            event.get_description()
        );
        match event.parse_date() {
            Some(date) => {
                let days_until = (date - today).num_days();
                if days_until >= 0 {
                    upcoming.push(format!("{}{}", line, urgency_marker(days_until)));
                } else {
                    past.push(line);
                }
            }
            // Unparseable dates still show up, just without a countdown.
            None => upcoming.push(line),
        }
    }

    let total = events.len();
    msg.channel_id
        .send_message(&ctx.http, |m| {
            m.embed(|e| {
                e.title(&title).colour(Colour::BLUE);
                if !upcoming.is_empty() {
                    let shown: Vec<_> = upcoming.iter().take(10).cloned().collect();
                    e.field("📅 Upcoming Events", shown.join("\n\n"), false);
                }
                if !past.is_empty() && upcoming.len() < 5 {
                    let shown: Vec<_> = past.iter().take(5).cloned().collect();
                    e.field("📋 Past Events", shown.join("\n\n"), false);
                }
                e.footer(|f| f.text(format!("Total: {} events", total)))
            })
        })
        .await?;
    Ok(())
}

fn urgency_marker(days_until: i64) -> String {
    match days_until {
        0 => " 🔴 **TODAY**".to_string(),
        1 => " ⚠️ **TOMORROW**".to_string(),
        d if d <= 7 => format!(" ⚠️ **{} days**", d),
        d => format!(" ({} days)", d),
    }
}

#[command]
#[checks(Admin)]
#[only_in(guilds)]
#[aliases("removeevent")]
async fn delevent(ctx: &Context, msg: &Message, mut args: Args) -> CommandResult {
    let (module, date) = match (args.single::<String>(), args.single::<String>()) {
        (Ok(module), Ok(date)) => (module.to_uppercase(), date),
        _ => {
            msg.channel_id
                .say(&ctx.http, "Usage: `!delevent <module> <YYYY-MM-DD>`")
                .await?;
            return Ok(());
        }
    };

    let store = get_store(ctx).await;
    let key = match store.find_event(&module, &date) {
        Some(key) => key,
        None => {
            messages::send_embed(
                ctx,
                msg.channel_id,
                Colour::RED,
                "❌ Not Found",
                &format!("No event found for **{}** on {}.", module, date),
            )
            .await?;
            return Ok(());
        }
    };

    if store.remove_event(&key) {
        messages::send_embed(
            ctx,
            msg.channel_id,
            Colour::DARK_GREEN,
            "✅ Event Deleted",
            &format!("Event for **{}** on {} has been deleted.", module, date),
        )
        .await?;
        if let Some(guild) = msg.guild_id {
            messages::log_action(
                ctx,
                guild,
                &format!(
                    "🗑️ {} deleted event: **{}** on {}",
                    msg.author.mention(),
                    module,
                    date
                ),
                Colour::ORANGE,
            )
            .await;
        }
    } else {
        messages::send_embed(
            ctx,
            msg.channel_id,
            Colour::RED,
            "❌ Delete Failed",
            "Failed to delete the event.",
        )
        .await?;
    }
    Ok(())
}

#[command]
#[aliases("upcomingevents")]
async fn upcoming(ctx: &Context, msg: &Message, mut args: Args) -> CommandResult {
    let days = args.single::<i64>().unwrap_or(7);
    if !(1..=365).contains(&days) {
        messages::send_embed(
            ctx,
            msg.channel_id,
            Colour::RED,
            "❌ Invalid Range",
            "Days must be between 1 and 365.",
        )
        .await?;
        return Ok(());
    }

    let store = get_store(ctx).await;
    let today = chrono::Local::now().date_naive();

    let mut entries: Vec<(NaiveDate, String)> = Vec::new();
    for event in store.events().values() {
        let date = match event.parse_date() {
            Some(date) => date,
            None => continue,
        };
        let days_until = (date - today).num_days();
        if (0..=days).contains(&days_until) {
            entries.push((
                date,
                format!(
                    "**{}** - {}{}\n{}",
                    event.get_module(),
                    event.get_date(),
                    urgency_marker(days_until),
                    event.get_description()
                ),
            ));
        }
    }

    if entries.is_empty() {
        messages::send_embed(
            ctx,
            msg.channel_id,
            Colour::BLUE,
            "📅 Upcoming Events",
            &format!("No events in the next {} days.", days),
        )
        .await?;
        return Ok(());
    }

    entries.sort_by_key(|(date, _)| *date);
    let list = entries
        .iter()
        .map(|(_, text)| text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    messages::send_embed(
        ctx,
        msg.channel_id,
        Colour::BLUE,
        &format!("📅 Events in Next {} Days", days),
        &list,
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urgency_markers_scale_with_distance() {
        assert_eq!(" 🔴 **TODAY**", urgency_marker(0));
        assert_eq!(" ⚠️ **TOMORROW**", urgency_marker(1));
        assert_eq!(" ⚠️ **3 days**", urgency_marker(3));
        assert_eq!(" (30 days)", urgency_marker(30));
    }
}
