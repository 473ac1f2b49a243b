use super::*;

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};
use teloxide::utils::html;

use crate::catalog::EventDetails;
use crate::choices::back_keyboard;

pub(super) const MENU_TEXT: &str = "Welcome to <b>ShowTracker</b> \u{1f3b6}\n\nSearch the <i>Ticketmaster</i> catalog \u{1f3ab} and pick an option:";

pub(super) fn parse_command(text: &str) -> Option<&str> {
    let first = text.split_whitespace().next()?;
    if !first.starts_with('/') {
        return None;
    }
    let cmd = first.trim_start_matches('/');
    Some(cmd.split('@').next().unwrap_or(cmd))
}

pub(super) fn menu_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("\u{1f50d} Search artist", token::ARTIST_SEARCH),
        InlineKeyboardButton::callback("\u{1f4c5} Search event", token::EVENT_SEARCH),
        InlineKeyboardButton::callback("\u{2764}\u{fe0f} Following", token::FOLLOWING),
    ]])
}

pub(super) async fn send_menu(bot: &Bot, chat_id: ChatId) -> Result<()> {
    bot.send_message(chat_id, MENU_TEXT)
        .parse_mode(ParseMode::Html)
        .reply_markup(menu_keyboard())
        .await?;
    Ok(())
}

pub(super) async fn send_html(bot: &Bot, chat_id: ChatId, text: &str) -> Result<()> {
    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

pub(super) async fn send_html_with_back(bot: &Bot, chat_id: ChatId, text: &str) -> Result<()> {
    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(back_keyboard())
        .await?;
    Ok(())
}

/// User-visible notice for a recoverable catalog or encoding fault. The
/// conversation keeps going; the details only land in the log.
pub(super) async fn send_search_error(bot: &Bot, chat_id: ChatId) -> Result<()> {
    bot.send_message(
        chat_id,
        "Something went wrong with that search \u{26a0}\u{fe0f}. Try a different query.",
    )
    .await?;
    Ok(())
}

pub(super) fn format_event_details(event: &EventDetails) -> String {
    let mut text = format!("<b><i>{}</i></b>\n\n", html::escape(&event.name));

    match event.status.as_deref() {
        Some("onsale") => text.push_str("\u{1f7e2} <b>On sale</b>\n"),
        Some(status) => text.push_str(&format!("\u{1f7e0} <b>{}</b>\n", html::escape(status))),
        None => text.push_str("<b>Status unavailable</b>\n"),
    }

    match &event.price_range {
        Some(range) => text.push_str(&format!(
            "From <b>{:.2} {}</b> to <b>{:.2} {}</b>\n\n",
            range.min,
            html::escape(&range.currency),
            range.max,
            html::escape(&range.currency),
        )),
        None => text.push_str("<b>Price range unavailable</b>\n\n"),
    }

    let date = event.local_date.as_deref().unwrap_or("Unavailable");
    let time = event.local_time.as_deref().unwrap_or("Unavailable");
    text.push_str(&format!("<b>Date:</b> {}\n", html::escape(date)));
    text.push_str(&format!("<b>Time:</b> {}\n\n", html::escape(time)));

    if event.venues.is_empty() {
        text.push_str("<b>Venue:</b> Unavailable\n");
    } else {
        let venues = event
            .venues
            .iter()
            .map(|venue| html::escape(venue))
            .collect::<Vec<_>>()
            .join("; ");
        text.push_str(&format!("<b>Venue:</b> {venues}\n"));
    }

    if let Some(url) = &event.url {
        text.push_str(&format!("<a href=\"{}\">Tickets</a>\n", html::escape(url)));
    }

    text.trim_end().to_string()
}
