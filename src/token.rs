use sha1::{Digest, Sha1};
use thiserror::Error;

/// Telegram rejects callback data longer than 64 bytes, which is the whole
/// reason this module exists.
pub(super) const MAX_CALLBACK_BYTES: usize = 64;

const SEP: char = '_';

// Fixed menu tokens.
pub(super) const ARTIST_SEARCH: &str = "ARTIST_SEARCH";
pub(super) const EVENT_SEARCH: &str = "EVENT_SEARCH";
pub(super) const FOLLOWING: &str = "FOLLOWING";
pub(super) const START_OVER: &str = "START_OVER";

// Entity token prefixes. Info tokens carry a fingerprint of the id; the
// follow toggles carry the raw id because their handlers need it back.
pub(super) const ARTIST_INFO: &str = "ARTIST_INFO";
pub(super) const EVENT_INFO: &str = "EVENT_INFO";
pub(super) const FOLLOW: &str = "FOLLOW";
pub(super) const UNFOLLOW: &str = "UNFOLLOW";

#[derive(Debug, Error, PartialEq, Eq)]
pub(super) enum TokenError {
    #[error("token budget exhausted: `{prefix}` leaves no room for a name")]
    BudgetExhausted { prefix: String },
}

/// Every button press the bot can receive, decoded once at the transport
/// boundary. Handlers match on this instead of splitting strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum CallbackAction {
    ArtistSearch,
    EventSearch,
    Following,
    StartOver,
    ArtistInfo { fingerprint: String, name: String },
    EventInfo { fingerprint: String, name: String },
    Follow { id: String, name: String },
    Unfollow { id: String, name: String },
}

/// 40 lowercase hex chars, constant length regardless of the id's length or
/// alphabet.
pub(super) fn fingerprint(id: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(id.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Navigation token: `prefix_fingerprint(id)_name`. The id itself is not
/// recoverable from the token, only its fingerprint.
pub(super) fn encode(prefix: &str, id: &str, name: &str) -> Result<String, TokenError> {
    encode_with_middle(prefix, &fingerprint(id), name)
}

/// Follow-toggle token: `prefix_id_name` with the literal id. The toggle
/// handler mutates the follow store by id, so a fingerprint is not enough.
pub(super) fn encode_raw(prefix: &str, id: &str, name: &str) -> Result<String, TokenError> {
    encode_with_middle(prefix, id, name)
}

fn encode_with_middle(prefix: &str, middle: &str, name: &str) -> Result<String, TokenError> {
    let base = format!("{prefix}{SEP}{middle}{SEP}");
    let budget = match MAX_CALLBACK_BYTES.checked_sub(base.len()) {
        Some(budget) => budget,
        None => {
            return Err(TokenError::BudgetExhausted {
                prefix: prefix.to_string(),
            })
        }
    };
    let truncated = truncate_to_byte_budget(name, budget);
    if truncated.is_empty() && !name.is_empty() {
        // An unusable token (no name left at all) is a defect, not data.
        return Err(TokenError::BudgetExhausted {
            prefix: prefix.to_string(),
        });
    }
    Ok(format!("{base}{truncated}"))
}

/// Longest prefix of `name`, by code point, whose UTF-8 encoding fits in
/// `budget` bytes. Never splits a multi-byte sequence.
fn truncate_to_byte_budget(name: &str, budget: usize) -> &str {
    if name.len() <= budget {
        return name;
    }
    let mut end = 0;
    for (idx, ch) in name.char_indices() {
        let next = idx + ch.len_utf8();
        if next > budget {
            break;
        }
        end = next;
    }
    &name[..end]
}

/// Parses incoming callback data. Returns `None` for anything this bot never
/// produced; the dispatcher ignores such presses. Decoded names may have been
/// truncated at encode time, so they are not guaranteed to match the catalog
/// verbatim.
pub(super) fn decode(data: &str) -> Option<CallbackAction> {
    match data {
        ARTIST_SEARCH => return Some(CallbackAction::ArtistSearch),
        EVENT_SEARCH => return Some(CallbackAction::EventSearch),
        FOLLOWING => return Some(CallbackAction::Following),
        START_OVER => return Some(CallbackAction::StartOver),
        _ => {}
    }
    if let Some((fingerprint, name)) = split_payload(data, ARTIST_INFO) {
        return Some(CallbackAction::ArtistInfo { fingerprint, name });
    }
    if let Some((fingerprint, name)) = split_payload(data, EVENT_INFO) {
        return Some(CallbackAction::EventInfo { fingerprint, name });
    }
    if let Some((id, name)) = split_payload(data, UNFOLLOW) {
        return Some(CallbackAction::Unfollow { id, name });
    }
    if let Some((id, name)) = split_payload(data, FOLLOW) {
        return Some(CallbackAction::Follow { id, name });
    }
    None
}

fn split_payload(data: &str, prefix: &str) -> Option<(String, String)> {
    let rest = data.strip_prefix(prefix)?.strip_prefix(SEP)?;
    let (middle, name) = rest.split_once(SEP)?;
    Some((middle.to_string(), name.to_string()))
}
