use super::*;

use crate::catalog::CatalogEntity;
use crate::choices::{build_choices, choice_keyboard, ChoiceKind, CHOICE_CAP};
use crate::dialog::{route, ConversationState, Route, Trigger};
use crate::helpers::{parse_command, send_menu, send_search_error};

pub(super) async fn handle_message(
    bot: Bot,
    msg: Message,
    state: std::sync::Arc<AppState>,
) -> Result<()> {
    let text = match msg.text() {
        Some(text) => text.to_string(),
        None => return Ok(()),
    };
    let chat_id = msg.chat.id;

    if let Some(cmd) = parse_command(&text) {
        match cmd {
            "start" | "help" => {
                send_menu(&bot, chat_id).await?;
                state
                    .engine
                    .lock()
                    .await
                    .transition(chat_id.0, ConversationState::Menu);
            }
            _ => {
                // Unknown commands are ignored.
            }
        }
        return Ok(());
    }

    let current = state.engine.lock().await.current(chat_id.0);
    match route(current, &Trigger::Text(&text)) {
        Route::RunArtistSearch => run_artist_search(&bot, chat_id, &state, &text).await?,
        Route::RunEventSearch => run_event_search(&bot, chat_id, &state, &text).await?,
        _ => {
            // Free text outside a query prompt carries no meaning here.
        }
    }
    Ok(())
}

async fn run_artist_search(
    bot: &Bot,
    chat_id: ChatId,
    state: &std::sync::Arc<AppState>,
    query: &str,
) -> Result<()> {
    bot.send_message(chat_id, "Searching for the artist, hold on...")
        .await?;
    let artists = match state.catalog.find_artists(query).await {
        Ok(artists) => artists,
        Err(err) => {
            error!("artist search for {:?} failed: {}", query, err);
            send_search_error(bot, chat_id).await?;
            return Ok(());
        }
    };
    if artists.is_empty() {
        // Not an error; stay put so the user can type another query.
        bot.send_message(chat_id, format!("No artists found for \"{query}\"."))
            .await?;
        return Ok(());
    }
    present_choices(
        bot,
        chat_id,
        state,
        &artists,
        ChoiceKind::Artist,
        true,
        "Pick an artist:",
    )
    .await
}

async fn run_event_search(
    bot: &Bot,
    chat_id: ChatId,
    state: &std::sync::Arc<AppState>,
    query: &str,
) -> Result<()> {
    bot.send_message(chat_id, "Searching for the event, hold on...")
        .await?;
    let events = match state.catalog.find_events(query).await {
        Ok(events) => events,
        Err(err) => {
            error!("event search for {:?} failed: {}", query, err);
            send_search_error(bot, chat_id).await?;
            return Ok(());
        }
    };
    if events.is_empty() {
        bot.send_message(chat_id, format!("No events found for \"{query}\"."))
            .await?;
        return Ok(());
    }
    present_choices(
        bot,
        chat_id,
        state,
        &events,
        ChoiceKind::Event,
        false,
        "Pick an event:",
    )
    .await
}

/// Sends a deduplicated, capped choice keyboard and moves the dialog to the
/// results state. A token that cannot be encoded within the callback budget
/// is reported as a search error instead of reaching the user as a button.
pub(super) async fn present_choices(
    bot: &Bot,
    chat_id: ChatId,
    state: &std::sync::Arc<AppState>,
    entities: &[CatalogEntity],
    kind: ChoiceKind,
    include_follow_toggle: bool,
    prompt: &str,
) -> Result<()> {
    present_choices_into(
        bot,
        chat_id,
        state,
        entities,
        kind,
        include_follow_toggle,
        prompt,
        ConversationState::Results,
    )
    .await
}

pub(super) async fn present_choices_into(
    bot: &Bot,
    chat_id: ChatId,
    state: &std::sync::Arc<AppState>,
    entities: &[CatalogEntity],
    kind: ChoiceKind,
    include_follow_toggle: bool,
    prompt: &str,
    next: ConversationState,
) -> Result<()> {
    let follows = {
        let follows = state.follows.lock().await;
        follows.get(&chat_id.0).cloned().unwrap_or_default()
    };

    let choices = match build_choices(entities, kind, &follows, include_follow_toggle, CHOICE_CAP)
    {
        Ok(choices) => choices,
        Err(err) => {
            error!("choice encoding failed: {}", err);
            send_search_error(bot, chat_id).await?;
            return Ok(());
        }
    };

    bot.send_message(chat_id, prompt)
        .reply_markup(choice_keyboard(&choices))
        .await?;
    state.engine.lock().await.transition(chat_id.0, next);
    Ok(())
}
