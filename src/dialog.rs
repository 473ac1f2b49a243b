use std::collections::HashMap;

use crate::token::CallbackAction;

/// Where a chat currently sits in the dialog. Every chat starts at the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(super) enum ConversationState {
    #[default]
    Menu,
    AwaitingArtistQuery,
    AwaitingEventQuery,
    BrowsingFollowed,
    Results,
}

/// An inbound turn, already decoded: a command, free text, or a button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Trigger<'a> {
    Start,
    Text(&'a str),
    Action(&'a CallbackAction),
}

/// What a handler should do for one turn. `route` decides; the handler
/// executes and sets the next state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Route {
    ShowMenu,
    PromptArtistQuery,
    PromptEventQuery,
    ListFollowed,
    RunArtistSearch,
    RunEventSearch,
    ArtistDetail,
    EventDetail,
    /// Mutates the follow store and edits the message in place; never a
    /// state change.
    ToggleFollow { follow: bool },
    Ignore,
}

/// The transition table. Pure so it can be tested exhaustively. `/start` and
/// the back button reach the menu from every state.
pub(super) fn route(state: ConversationState, trigger: &Trigger<'_>) -> Route {
    use CallbackAction::*;
    use ConversationState::*;

    match (state, trigger) {
        (_, Trigger::Start) => Route::ShowMenu,
        (_, Trigger::Action(StartOver)) => Route::ShowMenu,

        (Menu, Trigger::Action(ArtistSearch)) => Route::PromptArtistQuery,
        (Menu, Trigger::Action(EventSearch)) => Route::PromptEventQuery,
        (Menu, Trigger::Action(Following)) => Route::ListFollowed,

        (AwaitingArtistQuery, Trigger::Text(_)) => Route::RunArtistSearch,
        (AwaitingEventQuery, Trigger::Text(_)) => Route::RunEventSearch,

        (Results | BrowsingFollowed, Trigger::Action(ArtistInfo { .. })) => Route::ArtistDetail,
        (Results | BrowsingFollowed, Trigger::Action(EventInfo { .. })) => Route::EventDetail,
        (Results | BrowsingFollowed, Trigger::Action(Follow { .. })) => {
            Route::ToggleFollow { follow: true }
        }
        (Results | BrowsingFollowed, Trigger::Action(Unfollow { .. })) => {
            Route::ToggleFollow { follow: false }
        }

        _ => Route::Ignore,
    }
}

/// Per-chat dialog positions. The Telegram transport delivers one update at a
/// time per chat, so a plain map behind the app-state mutex is enough.
#[derive(Debug, Default)]
pub(super) struct DialogEngine {
    states: HashMap<i64, ConversationState>,
}

impl DialogEngine {
    pub(super) fn new() -> Self {
        DialogEngine::default()
    }

    pub(super) fn current(&self, chat_id: i64) -> ConversationState {
        self.states.get(&chat_id).copied().unwrap_or_default()
    }

    pub(super) fn transition(&mut self, chat_id: i64, next: ConversationState) {
        self.states.insert(chat_id, next);
    }
}
