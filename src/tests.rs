use super::*;

use serde_json::json;
use tempfile::TempDir;

use crate::catalog::{parse_entities, parse_event_details, CatalogEntity, CatalogError};
use crate::choices::{build_choices, choice_keyboard, ChoiceKind, CHOICE_CAP};
use crate::dialog::{route, ConversationState, DialogEngine, Route, Trigger};
use crate::helpers::{format_event_details, parse_command};
use crate::token::{self, CallbackAction, TokenError, MAX_CALLBACK_BYTES};

fn entity(id: &str, name: &str) -> CatalogEntity {
    CatalogEntity {
        id: id.to_string(),
        name: name.to_string(),
    }
}

const ALL_STATES: [ConversationState; 5] = [
    ConversationState::Menu,
    ConversationState::AwaitingArtistQuery,
    ConversationState::AwaitingEventQuery,
    ConversationState::BrowsingFollowed,
    ConversationState::Results,
];

#[test]
fn fingerprint_is_stable_forty_hex() {
    let a = token::fingerprint("K8vZ917G7x0");
    let b = token::fingerprint("K8vZ917G7x0");
    let c = token::fingerprint("K8vZ917Gku7");
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.len(), 40);
    assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
}

#[test]
fn encode_fits_budget_for_long_names() {
    let name = "A".repeat(70);
    let tok = token::encode(token::ARTIST_INFO, "K8vZ917G7x0", &name).unwrap();
    assert_eq!(tok.len(), MAX_CALLBACK_BYTES);

    let decoded = token::decode(&tok).unwrap();
    match decoded {
        CallbackAction::ArtistInfo {
            fingerprint,
            name: decoded_name,
        } => {
            assert_eq!(fingerprint, token::fingerprint("K8vZ917G7x0"));
            assert!(name.starts_with(&decoded_name));
            assert!(!decoded_name.is_empty());
        }
        other => panic!("unexpected action: {:?}", other),
    }
}

#[test]
fn truncation_never_splits_code_points() {
    // ARTIST_INFO base takes 53 bytes, leaving 11 for the name.
    let name = "\u{e9}".repeat(50);
    let tok = token::encode(token::ARTIST_INFO, "id", &name).unwrap();
    assert!(tok.len() <= MAX_CALLBACK_BYTES);
    match token::decode(&tok).unwrap() {
        CallbackAction::ArtistInfo {
            name: decoded_name, ..
        } => assert_eq!(decoded_name, "\u{e9}".repeat(5)),
        other => panic!("unexpected action: {:?}", other),
    }

    let emoji = "\u{1f3b8}".repeat(6);
    let tok = token::encode(token::ARTIST_INFO, "id", &emoji).unwrap();
    match token::decode(&tok).unwrap() {
        CallbackAction::ArtistInfo {
            name: decoded_name, ..
        } => assert_eq!(decoded_name, "\u{1f3b8}".repeat(2)),
        other => panic!("unexpected action: {:?}", other),
    }
}

#[test]
fn encode_raw_keeps_literal_id() {
    let tok = token::encode_raw(token::FOLLOW, "K8vZ917G7x0", "Muse").unwrap();
    assert_eq!(tok, "FOLLOW_K8vZ917G7x0_Muse");
    assert_eq!(
        token::decode(&tok),
        Some(CallbackAction::Follow {
            id: "K8vZ917G7x0".to_string(),
            name: "Muse".to_string(),
        })
    );

    let tok = token::encode_raw(token::UNFOLLOW, "K8vZ917G7x0", "Muse").unwrap();
    assert_eq!(
        token::decode(&tok),
        Some(CallbackAction::Unfollow {
            id: "K8vZ917G7x0".to_string(),
            name: "Muse".to_string(),
        })
    );
}

#[test]
fn encode_rejects_exhausted_budget() {
    // Base alone blows past the limit.
    let oversized_prefix = "X".repeat(70);
    assert_eq!(
        token::encode(&oversized_prefix, "id", "name"),
        Err(TokenError::BudgetExhausted {
            prefix: oversized_prefix.clone(),
        })
    );

    // Three bytes of room cannot hold any prefix of a four-byte code point;
    // an empty name would make the button unusable.
    let prefix = "P".repeat(19);
    assert!(matches!(
        token::encode(&prefix, "id", "\u{1f3b8}"),
        Err(TokenError::BudgetExhausted { .. })
    ));
}

#[test]
fn decode_handles_menu_tokens_and_rejects_foreign_data() {
    assert_eq!(
        token::decode("ARTIST_SEARCH"),
        Some(CallbackAction::ArtistSearch)
    );
    assert_eq!(
        token::decode("EVENT_SEARCH"),
        Some(CallbackAction::EventSearch)
    );
    assert_eq!(token::decode("FOLLOWING"), Some(CallbackAction::Following));
    assert_eq!(token::decode("START_OVER"), Some(CallbackAction::StartOver));

    assert_eq!(token::decode(""), None);
    assert_eq!(token::decode("garbage"), None);
    assert_eq!(token::decode("FOLLOWING_extra"), None);
    assert_eq!(token::decode("ARTIST_INFO"), None);
}

#[test]
fn decoded_name_survives_embedded_underscores() {
    let tok = token::encode(token::EVENT_INFO, "id", "mr_bright").unwrap();
    match token::decode(&tok).unwrap() {
        CallbackAction::EventInfo { name, .. } => assert_eq!(name, "mr_bright"),
        other => panic!("unexpected action: {:?}", other),
    }
}

#[test]
fn build_choices_dedups_by_display_name() {
    let entities = vec![
        entity("1", "Muse"),
        entity("2", "Muse"),
        entity("3", "Editors"),
    ];
    let choices = build_choices(
        &entities,
        ChoiceKind::Artist,
        &FollowStore::default(),
        false,
        CHOICE_CAP,
    )
    .unwrap();

    assert_eq!(choices.len(), 2);
    assert_eq!(choices[0].label, "Muse");
    // The retained "Muse" is the first one seen.
    match token::decode(&choices[0].token).unwrap() {
        CallbackAction::ArtistInfo { fingerprint, .. } => {
            assert_eq!(fingerprint, token::fingerprint("1"));
        }
        other => panic!("unexpected action: {:?}", other),
    }
}

#[test]
fn build_choices_caps_batch_and_keyboard_adds_back_row() {
    let entities: Vec<CatalogEntity> = (0..25)
        .map(|i| entity(&format!("id-{i}"), &format!("Muse {i}")))
        .collect();
    let choices = build_choices(
        &entities,
        ChoiceKind::Artist,
        &FollowStore::default(),
        true,
        CHOICE_CAP,
    )
    .unwrap();
    assert_eq!(choices.len(), 20);

    let keyboard = choice_keyboard(&choices);
    assert_eq!(keyboard.inline_keyboard.len(), 21);
}

#[test]
fn build_choices_toggle_reflects_follow_state() {
    let mut follows = FollowStore::default();
    follows.follow("a1", "Muse");

    let entities = vec![entity("a1", "Muse"), entity("b2", "Editors")];
    let choices = build_choices(&entities, ChoiceKind::Artist, &follows, true, CHOICE_CAP)
        .unwrap();

    let followed = choices[0].toggle.as_ref().unwrap();
    assert_eq!(followed.token, "UNFOLLOW_a1_Muse");
    let unfollowed = choices[1].toggle.as_ref().unwrap();
    assert_eq!(unfollowed.token, "FOLLOW_b2_Editors");
}

#[test]
fn build_choices_label_matches_token_name() {
    let long_name = "The Symphonic Rock Orchestra of Greater Ensiferum".to_string();
    let entities = vec![entity("x", &long_name)];
    let choices = build_choices(
        &entities,
        ChoiceKind::Artist,
        &FollowStore::default(),
        false,
        CHOICE_CAP,
    )
    .unwrap();
    assert!(long_name.starts_with(&choices[0].label));
    assert!(choices[0].token.ends_with(&choices[0].label));
    assert!(choices[0].token.len() <= MAX_CALLBACK_BYTES);
}

#[test]
fn follow_store_semantics() {
    let mut store = FollowStore::default();
    assert!(!store.is_following("a1"));

    store.follow("a1", "Muse");
    assert!(store.is_following("a1"));

    store.unfollow("a1");
    assert!(!store.is_following("a1"));

    // Unfollowing an unknown id leaves the mapping unchanged.
    store.follow("b2", "Editors");
    store.unfollow("missing");
    assert_eq!(store.len(), 1);
    assert!(store.is_following("b2"));
}

#[test]
fn follow_overwrites_stored_name() {
    let mut store = FollowStore::default();
    store.follow("a1", "A");
    store.follow("a1", "B");
    assert_eq!(store.len(), 1);
    assert_eq!(store.name_of("a1"), Some("B"));
}

#[test]
fn sorted_entries_are_ordered_by_name() {
    let mut store = FollowStore::default();
    store.follow("z", "Muse");
    store.follow("a", "Editors");
    let entries = store.sorted_entries();
    assert_eq!(
        entries,
        vec![
            ("a".to_string(), "Editors".to_string()),
            ("z".to_string(), "Muse".to_string()),
        ]
    );
}

#[test]
fn back_reaches_menu_from_every_state() {
    for state in ALL_STATES {
        assert_eq!(
            route(state, &Trigger::Action(&CallbackAction::StartOver)),
            Route::ShowMenu,
            "back from {:?}",
            state
        );
        assert_eq!(route(state, &Trigger::Start), Route::ShowMenu);
    }
}

#[test]
fn transition_table_routes_menu_and_queries() {
    assert_eq!(
        route(
            ConversationState::Menu,
            &Trigger::Action(&CallbackAction::ArtistSearch)
        ),
        Route::PromptArtistQuery
    );
    assert_eq!(
        route(
            ConversationState::Menu,
            &Trigger::Action(&CallbackAction::EventSearch)
        ),
        Route::PromptEventQuery
    );
    assert_eq!(
        route(
            ConversationState::Menu,
            &Trigger::Action(&CallbackAction::Following)
        ),
        Route::ListFollowed
    );
    assert_eq!(
        route(ConversationState::AwaitingArtistQuery, &Trigger::Text("Muse")),
        Route::RunArtistSearch
    );
    assert_eq!(
        route(ConversationState::AwaitingEventQuery, &Trigger::Text("gig")),
        Route::RunEventSearch
    );
}

#[test]
fn transition_table_routes_results_actions() {
    let info = CallbackAction::ArtistInfo {
        fingerprint: "f".repeat(40),
        name: "Muse".to_string(),
    };
    let follow = CallbackAction::Follow {
        id: "a1".to_string(),
        name: "Muse".to_string(),
    };

    for state in [
        ConversationState::Results,
        ConversationState::BrowsingFollowed,
    ] {
        assert_eq!(route(state, &Trigger::Action(&info)), Route::ArtistDetail);
        assert_eq!(
            route(state, &Trigger::Action(&follow)),
            Route::ToggleFollow { follow: true }
        );
    }

    // Out-of-state presses and stray text are ignored.
    assert_eq!(
        route(ConversationState::Menu, &Trigger::Action(&follow)),
        Route::Ignore
    );
    assert_eq!(
        route(ConversationState::Results, &Trigger::Text("hello")),
        Route::Ignore
    );
}

#[test]
fn dialog_engine_defaults_to_menu_and_tracks_chats() {
    let mut engine = DialogEngine::new();
    assert_eq!(engine.current(7), ConversationState::Menu);

    engine.transition(7, ConversationState::Results);
    assert_eq!(engine.current(7), ConversationState::Results);
    // Other chats are untouched.
    assert_eq!(engine.current(8), ConversationState::Menu);
}

#[test]
fn parse_entities_reads_embedded_records() {
    let body = json!({
        "_embedded": {
            "attractions": [
                { "id": "K8vZ917G7x0", "name": "Muse" },
                { "id": "K8vZ917Gku7", "name": "Editors" }
            ]
        }
    });
    let entities = parse_entities(&body, "attractions").unwrap();
    assert_eq!(
        entities,
        vec![entity("K8vZ917G7x0", "Muse"), entity("K8vZ917Gku7", "Editors")]
    );
}

#[test]
fn parse_entities_treats_missing_section_as_empty() {
    let body = json!({ "page": { "totalElements": 0 } });
    assert!(parse_entities(&body, "events").unwrap().is_empty());
}

#[test]
fn parse_entities_flags_malformed_records() {
    let body = json!({
        "_embedded": { "events": [ { "id": "only-an-id" } ] }
    });
    let err = parse_entities(&body, "events").unwrap_err();
    assert!(matches!(err, CatalogError::MalformedRecord("name")));
}

#[test]
fn parse_event_details_reads_full_record() {
    let body = json!({
        "_embedded": {
            "events": [{
                "id": "e1",
                "name": "Muse: Will of the People Tour",
                "url": "https://www.ticketmaster.com/event/e1",
                "dates": {
                    "status": { "code": "onsale" },
                    "start": {
                        "localDate": "2026-09-12",
                        "localTime": "20:30:00",
                        "dateTime": "2026-09-12T18:30:00Z"
                    }
                },
                "priceRanges": [ { "min": 45.0, "max": 120.0, "currency": "EUR" } ],
                "_embedded": {
                    "venues": [ { "name": "Wizink Center", "city": { "name": "Madrid" } } ]
                }
            }]
        }
    });
    let details = parse_event_details(&body).unwrap();
    assert_eq!(details.len(), 1);
    let event = &details[0];
    assert_eq!(event.name, "Muse: Will of the People Tour");
    assert_eq!(event.status.as_deref(), Some("onsale"));
    let range = event.price_range.as_ref().unwrap();
    assert_eq!(range.min, 45.0);
    assert_eq!(range.currency, "EUR");
    assert_eq!(event.local_date.as_deref(), Some("2026-09-12"));
    assert_eq!(event.local_time.as_deref(), Some("20:30:00"));
    assert_eq!(event.venues, vec!["Wizink Center, Madrid".to_string()]);
}

#[test]
fn parse_event_details_falls_back_to_utc_timestamp() {
    let body = json!({
        "_embedded": {
            "events": [{
                "id": "e2",
                "name": "Late Announce",
                "dates": { "start": { "dateTime": "2026-03-01T19:30:00Z" } }
            }]
        }
    });
    let details = parse_event_details(&body).unwrap();
    assert_eq!(details[0].local_date.as_deref(), Some("2026-03-01"));
    assert_eq!(details[0].local_time.as_deref(), Some("19:30"));
    assert!(details[0].venues.is_empty());
}

#[test]
fn format_event_details_escapes_html() {
    let body = json!({
        "_embedded": {
            "events": [{
                "id": "e3",
                "name": "AC/DC <Live & Loud>",
                "dates": { "status": { "code": "offsale" } }
            }]
        }
    });
    let details = parse_event_details(&body).unwrap();
    let text = format_event_details(&details[0]);
    assert!(text.contains("AC/DC &lt;Live &amp; Loud&gt;"));
    assert!(text.contains("offsale"));
    assert!(text.contains("Price range unavailable"));
}

#[test]
fn follows_round_trip_through_snapshot() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("follows.json");

    let mut follows: HashMap<i64, FollowStore> = HashMap::new();
    follows.entry(7).or_default().follow("a1", "Muse");
    follows.entry(9).or_default().follow("b2", "Editors");
    save_follows(&path, &follows).unwrap();

    let loaded = load_follows(&path).unwrap();
    assert!(loaded.get(&7).unwrap().is_following("a1"));
    assert_eq!(loaded.get(&9).unwrap().name_of("b2"), Some("Editors"));
    assert!(loaded.get(&8).is_none());
}

#[test]
fn load_follows_on_missing_file_is_empty() {
    let temp = TempDir::new().unwrap();
    let loaded = load_follows(&temp.path().join("absent.json")).unwrap();
    assert!(loaded.is_empty());
}

#[test]
fn parse_command_strips_slash_and_bot_suffix() {
    assert_eq!(parse_command("/start"), Some("start"));
    assert_eq!(parse_command("/start@showtracker_bot"), Some("start"));
    assert_eq!(parse_command("Muse"), None);
}
