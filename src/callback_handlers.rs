use super::*;

use teloxide::types::ParseMode;
use teloxide::utils::html;

use crate::catalog::CatalogEntity;
use crate::choices::{back_keyboard, ChoiceKind};
use crate::dialog::{route, ConversationState, Route, Trigger};
use crate::helpers::{format_event_details, send_html, send_html_with_back, send_menu, send_search_error};
use crate::message_handlers::{present_choices, present_choices_into};
use crate::token::CallbackAction;

pub(super) async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: std::sync::Arc<AppState>,
) -> Result<()> {
    let Some(message) = q.message.clone() else {
        bot.answer_callback_query(q.id).await?;
        return Ok(());
    };
    let chat_id = message.chat.id;

    // Decode once at the boundary; presses this bot never produced are
    // simply acknowledged and dropped.
    let Some(action) = q.data.as_deref().and_then(token::decode) else {
        bot.answer_callback_query(q.id).await?;
        return Ok(());
    };

    let current = state.engine.lock().await.current(chat_id.0);
    match route(current, &Trigger::Action(&action)) {
        Route::ShowMenu => {
            send_menu(&bot, chat_id).await?;
            state
                .engine
                .lock()
                .await
                .transition(chat_id.0, ConversationState::Menu);
        }
        Route::PromptArtistQuery => {
            bot.send_message(chat_id, "Type the artist you want to find:")
                .await?;
            state
                .engine
                .lock()
                .await
                .transition(chat_id.0, ConversationState::AwaitingArtistQuery);
        }
        Route::PromptEventQuery => {
            bot.send_message(chat_id, "Type the event you want to find:")
                .await?;
            state
                .engine
                .lock()
                .await
                .transition(chat_id.0, ConversationState::AwaitingEventQuery);
        }
        Route::ListFollowed => {
            list_followed(&bot, chat_id, &state).await?;
        }
        Route::ArtistDetail => {
            if let CallbackAction::ArtistInfo { name, .. } = &action {
                artist_detail(&bot, chat_id, &state, name).await?;
            }
        }
        Route::EventDetail => {
            if let CallbackAction::EventInfo { name, .. } = &action {
                event_detail(&bot, chat_id, &state, name).await?;
            }
        }
        Route::ToggleFollow { follow } => {
            toggle_follow(&bot, &message, &state, &action, follow).await?;
        }
        Route::RunArtistSearch | Route::RunEventSearch | Route::Ignore => {}
    }

    bot.answer_callback_query(q.id).await?;
    Ok(())
}

async fn list_followed(
    bot: &Bot,
    chat_id: ChatId,
    state: &std::sync::Arc<AppState>,
) -> Result<()> {
    let entries = {
        let follows = state.follows.lock().await;
        follows
            .get(&chat_id.0)
            .map(|store| store.sorted_entries())
            .unwrap_or_default()
    };

    if entries.is_empty() {
        bot.send_message(chat_id, "You are not following any artists yet.")
            .await?;
        return Ok(());
    }

    let entities: Vec<CatalogEntity> = entries
        .into_iter()
        .map(|(id, name)| CatalogEntity { id, name })
        .collect();
    present_choices_into(
        bot,
        chat_id,
        state,
        &entities,
        ChoiceKind::Artist,
        true,
        "Your followed artists:",
        ConversationState::BrowsingFollowed,
    )
    .await
}

/// The navigation token only carries a fingerprint of the artist id, so the
/// detail lookup goes by the (possibly truncated) name.
async fn artist_detail(
    bot: &Bot,
    chat_id: ChatId,
    state: &std::sync::Arc<AppState>,
    name: &str,
) -> Result<()> {
    if name.is_empty() {
        bot.send_message(chat_id, "Artist not found.").await?;
        return Ok(());
    }

    let events = match state.catalog.find_events(name).await {
        Ok(events) => events,
        Err(err) => {
            error!("event lookup for artist {:?} failed: {}", name, err);
            send_search_error(bot, chat_id).await?;
            return Ok(());
        }
    };
    if events.is_empty() {
        send_html(
            bot,
            chat_id,
            &format!("No events for artist <b>{}</b>.", html::escape(name)),
        )
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

async fn event_detail(
    bot: &Bot,
    chat_id: ChatId,
    state: &std::sync::Arc<AppState>,
    name: &str,
) -> Result<()> {
    if name.is_empty() {
        bot.send_message(chat_id, "Event not found.").await?;
        return Ok(());
    }

    let details = match state.catalog.find_event_details(name).await {
        Ok(details) => details,
        Err(err) => {
            error!("event detail lookup for {:?} failed: {}", name, err);
            send_search_error(bot, chat_id).await?;
            return Ok(());
        }
    };
    if details.is_empty() {
        send_html(
            bot,
            chat_id,
            &format!("No information for event <b>{}</b>.", html::escape(name)),
        )
        .await?;
        return Ok(());
    }

    let last = details.len() - 1;
    for (index, event) in details.iter().enumerate() {
        let text = format_event_details(event);
        if index == last {
            send_html_with_back(bot, chat_id, &text).await?;
        } else {
            send_html(bot, chat_id, &text).await?;
        }
    }

    state
        .engine
        .lock()
        .await
        .transition(chat_id.0, ConversationState::Results);
    Ok(())
}

/// Follow toggles mutate the store and edit the pressed message in place.
/// The dialog state is deliberately left alone.
async fn toggle_follow(
    bot: &Bot,
    message: &Message,
    state: &std::sync::Arc<AppState>,
    action: &CallbackAction,
    follow: bool,
) -> Result<()> {
    let (id, name) = match action {
        CallbackAction::Follow { id, name } | CallbackAction::Unfollow { id, name } => (id, name),
        _ => return Ok(()),
    };
    let chat_id = message.chat.id;

    let text = {
        let mut follows = state.follows.lock().await;
        let store = follows.entry(chat_id.0).or_default();
        let text = if follow {
            store.follow(id, name);
            format!("<i>Now following <b>{}</b>.</i>", html::escape(name))
        } else {
            store.unfollow(id);
            format!("<i>Unfollowed <b>{}</b>.</i>", html::escape(name))
        };
        save_follows(&state.follows_path, &follows)?;
        text
    };

    bot.edit_message_text(chat_id, message.id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(back_keyboard())
        .await?;
    Ok(())
}
