use std::collections::HashSet;

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::catalog::CatalogEntity;
use crate::follow::FollowStore;
use crate::token::{self, TokenError};

/// Hard cap observed in the product: one screen of buttons, no pagination.
pub(super) const CHOICE_CAP: usize = 20;

const FOLLOWED_HEART: &str = "\u{2764}\u{fe0f}";
const UNFOLLOWED_HEART: &str = "\u{2661}";
const BACK_LABEL: &str = "\u{2b05} Back";

/// Which info token a choice press produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ChoiceKind {
    Artist,
    Event,
}

impl ChoiceKind {
    fn info_prefix(self) -> &'static str {
        match self {
            ChoiceKind::Artist => token::ARTIST_INFO,
            ChoiceKind::Event => token::EVENT_INFO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct FollowToggle {
    pub(super) label: &'static str,
    pub(super) token: String,
}

/// One selectable row: the (possibly truncated) display name, the navigation
/// token behind it, and an optional follow toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Choice {
    pub(super) label: String,
    pub(super) token: String,
    pub(super) toggle: Option<FollowToggle>,
}

/// Projects a result batch into at most `cap` unique choices, in input order.
///
/// Deduplication is by display name, not id: two catalog entities sharing a
/// name collapse to the first one seen. That mirrors what the buttons show
/// the user and is intentional, not a masked bug. A token that cannot fit the
/// 64-byte budget at all aborts the whole batch; the handler reports it as a
/// search error rather than presenting a broken button.
pub(super) fn build_choices(
    entities: &[CatalogEntity],
    kind: ChoiceKind,
    follows: &FollowStore,
    include_follow_toggle: bool,
    cap: usize,
) -> Result<Vec<Choice>, TokenError> {
    let mut seen_names: HashSet<&str> = HashSet::new();
    let mut choices = Vec::new();

    for entity in entities {
        if !seen_names.insert(entity.name.as_str()) {
            continue;
        }

        let primary = token::encode(kind.info_prefix(), &entity.id, &entity.name)?;
        // Button label matches the name portion of the token, so what the
        // user taps is exactly what the handler gets back.
        let label = match token::decode(&primary) {
            Some(
                token::CallbackAction::ArtistInfo { name, .. }
                | token::CallbackAction::EventInfo { name, .. },
            ) => name,
            _ => entity.name.clone(),
        };

        let toggle = if include_follow_toggle {
            let (prefix, heart) = if follows.is_following(&entity.id) {
                (token::UNFOLLOW, FOLLOWED_HEART)
            } else {
                (token::FOLLOW, UNFOLLOWED_HEART)
            };
            Some(FollowToggle {
                label: heart,
                token: token::encode_raw(prefix, &entity.id, &entity.name)?,
            })
        } else {
            None
        };

        choices.push(Choice {
            label,
            token: primary,
            toggle,
        });

        if choices.len() >= cap {
            break;
        }
    }

    Ok(choices)
}

/// Renders one keyboard row per choice plus the reserved back row, so a batch
/// is never more than `cap + 1` rows.
pub(super) fn choice_keyboard(choices: &[Choice]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::with_capacity(choices.len() + 1);
    for choice in choices {
        let mut row = vec![InlineKeyboardButton::callback(
            choice.label.clone(),
            choice.token.clone(),
        )];
        if let Some(toggle) = &choice.toggle {
            row.push(InlineKeyboardButton::callback(
                toggle.label.to_string(),
                toggle.token.clone(),
            ));
        }
        rows.push(row);
    }
    rows.push(back_row());
    InlineKeyboardMarkup::new(rows)
}

pub(super) fn back_row() -> Vec<InlineKeyboardButton> {
    vec![InlineKeyboardButton::callback(
        BACK_LABEL.to_string(),
        token::START_OVER.to_string(),
    )]
}

pub(super) fn back_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![back_row()])
}
