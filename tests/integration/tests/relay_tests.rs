//! End-to-end scenarios for the private side: verification, flood control,
//! moderation, relaying, edits, reactions and deletion

use integration_tests::*;
use relay_core::{
    Chat, ChatId, ClassifierError, MessageId, ReactionKind, TopicId, UserId, STAFF_MESSAGE_REASON,
};
use relay_service::RelayService;
use std::sync::Arc;

const USER: i64 = 1001;

fn user_chat() -> ChatId {
    private_chat(USER)
}

// ============================================================================
// Verification
// ============================================================================

#[tokio::test]
async fn test_start_issues_challenge() {
    let bot = TestBot::new();

    let route = bot.send(private_text(USER, 1, "/start")).await;

    assert_eq!(route, Some("start"));
    assert_eq!(bot.gateway.texts_to(user_chat()), vec!["Please wait..."]);
    let captions = bot.gateway.captions();
    assert_eq!(captions.len(), 1);
    assert!(captions[0].starts_with("Hello! Before sending messages"));

    // The wait notice is removed once the image is ready
    assert_eq!(bot.gateway.deletes().len(), 1);

    let record = bot.store.verification(UserId::new(USER)).expect("challenge stored");
    assert_eq!(record.code, FIXED_CODE);
    assert!(!record.verified);
}

#[tokio::test]
async fn test_first_plain_message_is_held_for_challenge() {
    let bot = TestBot::new();

    bot.send(private_text(USER, 1, "hello there")).await;

    let captions = bot.gateway.captions();
    assert_eq!(captions.len(), 1);
    assert!(captions[0].starts_with("Hello! Before your messages can be delivered"));
    assert!(bot.gateway.copies().is_empty());
    assert!(bot.store.mappings().is_empty());
}

#[tokio::test]
async fn test_three_wrong_answers_block() {
    let bot = TestBot::new();

    bot.send(private_text(USER, 1, "/start")).await;
    bot.send(private_text(USER, 2, "WRONG")).await;
    bot.send(private_text(USER, 3, "xxxxx")).await;
    bot.send(private_text(USER, 4, "nope")).await;
    bot.send(private_text(USER, 5, FIXED_CODE)).await;

    assert_eq!(
        bot.gateway.texts_to(user_chat()),
        vec![
            "Please wait...",
            "Wrong code, you have 2 attempts left.",
            "Wrong code, you have 1 attempts left.",
            "Too many wrong codes, you have been banned.",
            "You have been banned",
        ]
    );
    let block = bot.store.block(UserId::new(USER)).expect("user blocked");
    assert_eq!(block.pinned_message_id, None);
    assert!(bot.gateway.created_topics().is_empty());
}

#[tokio::test]
async fn test_correct_code_after_misses_resets_attempts() {
    let bot = TestBot::new();

    bot.send(private_text(USER, 1, "/start")).await;
    bot.send(private_text(USER, 2, "WRONG")).await;
    bot.send(private_text(USER, 3, "xxxxx")).await;
    bot.send(private_text(USER, 4, FIXED_CODE)).await;

    assert_eq!(
        bot.gateway.texts_to(user_chat()),
        vec![
            "Please wait...",
            "Wrong code, you have 2 attempts left.",
            "Wrong code, you have 1 attempts left.",
            "Verification passed, you can send messages now",
        ]
    );
    let user_id = UserId::new(USER);
    assert_eq!(bot.ctx.cache().attempts(user_id), 0);
    assert!(bot.store.verification(user_id).unwrap().verified);
    assert!(bot.store.block(user_id).is_none());
    assert_eq!(bot.gateway.created_topics(), vec!["Ann Lee 1001"]);
}

#[tokio::test]
async fn test_verification_block_stored_when_notice_fails() {
    let bot = TestBot::new();

    bot.send(private_text(USER, 1, "/start")).await;
    bot.send(private_text(USER, 2, "WRONG")).await;
    bot.send(private_text(USER, 3, "xxxxx")).await;
    bot.gateway.forbid_texts_to(user_chat());
    bot.send(private_text(USER, 4, "nope")).await;

    assert!(bot.store.block(UserId::new(USER)).is_some());
    assert_eq!(bot.ctx.cache().is_blocked(UserId::new(USER)), Some(true));
    assert_eq!(bot.gateway.texts_to(STAFF), vec!["Bot error, check the logs"]);
}

#[tokio::test]
async fn test_correct_code_verifies_and_creates_topic() {
    let bot = TestBot::new();

    bot.send(private_text(USER, 1, "/start")).await;
    bot.send(private_text(USER, 2, " abcde ")).await;

    assert!(bot
        .gateway
        .texts_to(user_chat())
        .contains(&"Verification passed, you can send messages now".to_string()));
    assert!(bot.store.verification(UserId::new(USER)).unwrap().verified);
    assert_eq!(bot.gateway.created_topics(), vec!["Ann Lee 1001"]);

    let user = bot.store.user(UserId::new(USER)).expect("user row created");
    let intro = bot
        .gateway
        .sent_texts()
        .into_iter()
        .find(|msg| msg.chat_id == STAFF)
        .expect("topic intro posted");
    assert_eq!(intro.thread_id, Some(user.topic));
    assert!(intro.text.contains("User ID 1001"));

    // The answer itself is not relayed
    assert!(bot.gateway.copies().is_empty());

    bot.send(private_text(USER, 3, "hello there")).await;
    let copies = bot.gateway.copies();
    assert_eq!(copies.len(), 1);
    let Call::Copy {
        chat_id,
        thread_id,
        from_chat_id,
        message_id,
        result,
    } = copies[0].clone()
    else {
        unreachable!()
    };
    assert_eq!(chat_id, STAFF);
    assert_eq!(thread_id, Some(user.topic));
    assert_eq!(from_chat_id, user_chat());
    assert_eq!(message_id, MessageId::new(3));

    let mappings = bot.store.mappings();
    assert_eq!(mappings.len(), 1);
    assert_eq!(mappings[0].topic_message_id, result);
    assert!(!mappings[0].spam);
}

#[tokio::test]
async fn test_start_is_silent_once_verified() {
    let bot = TestBot::new();
    bot.seed_verified(USER, 77);

    let route = bot.send(private_text(USER, 1, "/start")).await;

    assert_eq!(route, Some("start"));
    assert!(bot.gateway.calls().is_empty());
}

#[tokio::test]
async fn test_expired_code_issues_new_challenge() {
    let bot = TestBot::new();

    bot.send(private_text(USER, 1, "/start")).await;
    bot.store.expire_challenge(UserId::new(USER));
    bot.send(private_text(USER, 2, FIXED_CODE)).await;

    let captions = bot.gateway.captions();
    assert_eq!(captions.len(), 2);
    assert_eq!(
        captions[1],
        "The code has expired, please enter the new one (case-insensitive)"
    );
    let record = bot.store.verification(UserId::new(USER)).unwrap();
    assert!(!record.verified);
    assert!(!record.is_expired());

    // The fresh challenge accepts the code
    bot.send(private_text(USER, 3, FIXED_CODE)).await;
    assert!(bot.store.verification(UserId::new(USER)).unwrap().verified);
}

// ============================================================================
// Flood control
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_flood_warns_then_blocks() {
    let bot = TestBot::new();
    bot.seed_verified(USER, 77);

    for message_id in 1..=11 {
        bot.send(private_text(USER, message_id, "hello there")).await;
    }

    let texts = bot.gateway.texts_to(user_chat());
    let warnings = texts
        .iter()
        .filter(|text| *text == "Please stop flooding or you will be banned")
        .count();
    assert_eq!(warnings, 3);
    assert_eq!(
        texts.last().map(String::as_str),
        Some("You have been banned, reason: flooding")
    );
    assert_eq!(bot.gateway.copies().len(), 10);
    assert!(bot.store.block(UserId::new(USER)).is_some());

    bot.send(private_text(USER, 12, "hello there")).await;
    assert_eq!(
        bot.gateway.texts_to(user_chat()).last().map(String::as_str),
        Some("You have been banned")
    );
    assert_eq!(bot.gateway.copies().len(), 10);
}

#[tokio::test(start_paused = true)]
async fn test_flood_block_stored_when_notice_fails() {
    let bot = TestBot::new();
    bot.seed_verified(USER, 77);

    for message_id in 1..=10 {
        bot.send(private_text(USER, message_id, "hello there")).await;
    }
    bot.gateway.forbid_texts_to(user_chat());
    bot.send(private_text(USER, 11, "hello there")).await;

    assert!(bot.store.block(UserId::new(USER)).is_some());
    assert_eq!(bot.ctx.cache().is_blocked(UserId::new(USER)), Some(true));
    assert_eq!(bot.gateway.copies().len(), 10);
}

#[tokio::test(start_paused = true)]
async fn test_flood_window_slides() {
    let bot = TestBot::new();
    bot.seed_verified(USER, 77);

    for message_id in 1..=8 {
        bot.send(private_text(USER, message_id, "hello there")).await;
    }
    tokio::time::advance(std::time::Duration::from_secs(5)).await;
    bot.send(private_text(USER, 9, "hello there")).await;

    let warnings = bot
        .gateway
        .texts_to(user_chat())
        .into_iter()
        .filter(|text| text == "Please stop flooding or you will be banned")
        .count();
    assert_eq!(warnings, 1);
    assert_eq!(bot.gateway.copies().len(), 9);
}

// ============================================================================
// Moderation
// ============================================================================

#[tokio::test]
async fn test_spam_goes_to_spam_topic() {
    let bot = TestBot::with_classifier(ScriptedClassifier::new([Script::verdict(
        true,
        "advertising",
    )]));
    bot.seed_verified(USER, 77);
    bot.ctx.set_spam_topic(Some(TopicId::new(900)));

    bot.send(private_text(USER, 5, "visit my shop")).await;

    assert!(bot.gateway.copies().is_empty());
    let forwards = bot.gateway.forwards();
    assert_eq!(forwards.len(), 1);
    let Call::Forward {
        chat_id,
        thread_id,
        from_chat_id,
        result,
        ..
    } = forwards[0].clone()
    else {
        unreachable!()
    };
    assert_eq!(chat_id, STAFF);
    assert_eq!(thread_id, Some(TopicId::new(900)));
    assert_eq!(from_chat_id, user_chat());

    let note = bot
        .gateway
        .sent_texts()
        .into_iter()
        .find(|msg| msg.text == "advertising")
        .expect("reason posted");
    assert_eq!(note.reply_to, Some(result));
    assert_eq!(note.thread_id, Some(TopicId::new(900)));

    let mapping = &bot.store.mappings()[0];
    assert!(mapping.spam);
    assert_eq!(mapping.reason, "advertising");
    assert_eq!(mapping.topic_message_id, result);
}

#[tokio::test(start_paused = true)]
async fn test_classifier_timeout_falls_back_to_keywords() {
    let bot = TestBot::with_classifier(ScriptedClassifier::new([Script::Hang]));
    bot.seed_verified(USER, 77);
    bot.ctx.set_spam_topic(Some(TopicId::new(900)));

    bot.send(private_text(USER, 5, "free money wire now")).await;

    let mappings = bot.store.mappings();
    assert_eq!(mappings.len(), 1);
    assert!(mappings[0].spam);
    assert_eq!(mappings[0].reason, "matched keyword: free money");
    assert_eq!(bot.gateway.forwards().len(), 1);
    // The typing indicator ran while the classifier hung
    assert!(bot.gateway.typing_count() >= 1);
}

#[tokio::test]
async fn test_invalid_answer_falls_back_to_keywords() {
    let bot = TestBot::with_classifier(ScriptedClassifier::new([
        Script::Answer("I think this is fine".to_string()),
        Script::Fail(ClassifierError::Backend("503".to_string())),
    ]));
    bot.seed_verified(USER, 77);

    bot.send(private_text(USER, 1, "hello there")).await;
    bot.send(private_text(USER, 2, "casino bonus today")).await;

    assert_eq!(bot.classifier.calls(), 2);
    let mappings = bot.store.mappings();
    assert_eq!(mappings.len(), 2);
    assert!(!mappings[0].spam);
    assert_eq!(mappings[0].reason, "no keyword matched");
    assert!(mappings[1].spam);
    assert_eq!(mappings[1].reason, "matched keyword: casino bonus");
}

#[tokio::test]
async fn test_unknown_classifier_failure_reported_to_staff() {
    let bot = TestBot::with_classifier(ScriptedClassifier::new([Script::Fail(
        ClassifierError::Unknown("boom".to_string()),
    )]));
    bot.seed_verified(USER, 77);

    let route = bot.send(private_text(USER, 1, "hello there")).await;

    assert_eq!(route, Some("private_to_staff"));
    assert!(bot.store.mappings().is_empty());
    assert!(bot.gateway.copies().is_empty());
    assert_eq!(
        bot.gateway.texts_to(STAFF),
        vec!["Bot error, check the logs"]
    );
}

#[tokio::test]
async fn test_media_skips_classification() {
    let bot = TestBot::with_classifier(ScriptedClassifier::new([]));
    bot.seed_verified(USER, 77);

    bot.send(private_media(USER, 1)).await;

    assert_eq!(bot.classifier.calls(), 0);
    assert_eq!(bot.gateway.copies().len(), 1);
    assert_eq!(bot.store.mappings()[0].reason, "non-text message");
}

// ============================================================================
// Relaying failures
// ============================================================================

#[tokio::test]
async fn test_gateway_timeout_tells_user() {
    let bot = TestBot::new();
    bot.seed_verified(USER, 77);
    bot.gateway.set_timed_out(true);

    bot.send(private_text(USER, 1, "hello there")).await;

    let texts = bot.gateway.texts_to(user_chat());
    assert_eq!(texts.len(), 1);
    assert!(texts[0].starts_with("The bot timed out"));
    assert!(bot.store.mappings().is_empty());
    assert!(bot.gateway.texts_to(STAFF).is_empty());
}

#[tokio::test]
async fn test_topic_creation_failure_notifies_admin() {
    let bot = TestBot::new();
    // Verified but without a topic yet
    let mut record = relay_core::VerificationRecord::issue(
        UserId::new(USER),
        FIXED_CODE,
        chrono::Duration::seconds(30),
    );
    record.verified = true;
    bot.store.put_verification(record);
    bot.gateway.fail_topic_creation();

    bot.send(private_text(USER, 1, "hello there")).await;

    let to_admin = bot.gateway.texts_to(ChatId::from(ADMIN));
    assert_eq!(to_admin.len(), 1);
    assert!(to_admin[0].starts_with("Failed to create a topic for Ann Lee (1001)"));
    assert!(bot.gateway.texts_to(user_chat())[0].starts_with("Bot error, relaying is unavailable"));
    assert_eq!(
        bot.gateway.texts_to(STAFF),
        vec!["Bot error, check the logs"]
    );
    assert!(bot.store.user(UserId::new(USER)).is_none());
}

// ============================================================================
// Staff side
// ============================================================================

#[tokio::test]
async fn test_staff_reply_copied_to_user() {
    let bot = TestBot::new();
    bot.seed_verified(USER, 77);

    let route = bot.send(staff_text(Some(77), 10, "we are on it")).await;

    assert_eq!(route, Some("staff_to_private"));
    let copies = bot.gateway.copies();
    assert_eq!(copies.len(), 1);
    let Call::Copy {
        chat_id,
        thread_id,
        result,
        ..
    } = copies[0].clone()
    else {
        unreachable!()
    };
    assert_eq!(chat_id, user_chat());
    assert_eq!(thread_id, None);

    let mapping = &bot.store.mappings()[0];
    assert_eq!(mapping.topic_message_id, MessageId::new(10));
    assert_eq!(mapping.private_message_id, result);
    assert_eq!(mapping.reason, STAFF_MESSAGE_REASON);
}

#[tokio::test]
async fn test_blocked_recipient_reported_in_thread() {
    let bot = TestBot::new();
    bot.seed_verified(USER, 77);
    bot.gateway.forbid_copies_to(user_chat());

    bot.send(staff_text(Some(77), 10, "we are on it")).await;

    assert!(bot.store.mappings().is_empty());
    let notice = bot
        .gateway
        .sent_texts()
        .into_iter()
        .find(|msg| msg.chat_id == STAFF)
        .expect("notice posted");
    assert_eq!(notice.text, "Delivery failed, the user has blocked the bot");
    assert_eq!(notice.thread_id, Some(TopicId::new(77)));
}

#[tokio::test]
async fn test_unknown_topic_owner() {
    let bot = TestBot::new();

    bot.send(staff_text(Some(999), 10, "anyone?")).await;

    assert_eq!(bot.gateway.texts_to(STAFF), vec!["No user belongs to this topic"]);
    assert!(bot.gateway.copies().is_empty());
}

#[tokio::test]
async fn test_non_admin_staff_message_ignored() {
    let bot = TestBot::new();
    bot.seed_verified(USER, 77);
    let mut msg = staff_msg(Some(77), 10, "I am not the admin");
    msg.from = Some(relay_core::UserProfile::new(UserId::new(55), "Bob"));

    let route = bot.send(relay_core::Update::Message(msg)).await;

    assert_eq!(route, None);
    assert!(bot.gateway.calls().is_empty());
}

// ============================================================================
// Mapping consistency
// ============================================================================

#[tokio::test]
async fn test_concurrent_duplicate_mapping_stored_once() {
    let bot = TestBot::new();
    let mapping = relay_core::MessageMapping::from_staff(
        UserId::new(USER),
        MessageId::new(5),
        MessageId::new(2005),
    );
    let relay = RelayService::new(&bot.ctx);

    let (first, second) = tokio::join!(relay.record_mapping(&mapping), relay.record_mapping(&mapping));

    assert!(first.is_ok());
    assert!(second.is_ok());
    assert_eq!(bot.store.mappings().len(), 1);
}

#[tokio::test]
async fn test_conflict_without_row_is_fatal() {
    let bot = TestBot::new();
    bot.store.inject_phantom_conflict();
    let mapping = relay_core::MessageMapping::from_staff(
        UserId::new(USER),
        MessageId::new(5),
        MessageId::new(2005),
    );

    let err = RelayService::new(&bot.ctx)
        .record_mapping(&mapping)
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "FATAL_CONSISTENCY");
    assert!(bot.store.mappings().is_empty());
}

// ============================================================================
// Edits
// ============================================================================

#[tokio::test]
async fn test_staff_edit_mirrored() {
    let bot = TestBot::new();
    bot.seed_verified(USER, 77);
    bot.seed_mapping(USER, 5, 2005);

    let route = bot.send(staff_edit(Some(77), 2005, "fixed typo")).await;

    assert_eq!(route, Some("edit_from_staff"));
    assert_eq!(
        bot.gateway.calls(),
        vec![Call::Edit {
            chat_id: user_chat(),
            message_id: MessageId::new(5),
            text: "fixed typo".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_clean_user_edit_mirrored() {
    let bot = TestBot::new();
    bot.seed_verified(USER, 77);
    bot.seed_mapping(USER, 5, 2005);

    let route = bot.send(private_edit(USER, 5, "hello again")).await;

    assert_eq!(route, Some("edit_from_user"));
    assert_eq!(
        bot.gateway.calls(),
        vec![Call::Edit {
            chat_id: STAFF,
            message_id: MessageId::new(2005),
            text: "hello again".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_user_edit_reclassified_as_spam() {
    let bot = TestBot::new();
    bot.seed_verified(USER, 77);
    bot.seed_mapping(USER, 5, 2005);
    bot.ctx.set_spam_topic(Some(TopicId::new(900)));

    bot.send(private_edit(USER, 5, "free money wire now")).await;

    assert!(bot
        .gateway
        .matching(|call| matches!(call, Call::Edit { .. }))
        .is_empty());
    assert_eq!(bot.gateway.forwards().len(), 1);
    assert_eq!(
        bot.gateway.texts_to(user_chat()),
        vec!["Message rejected, reason: matched keyword: free money"]
    );
    // The original mapping is untouched
    assert_eq!(bot.store.mappings().len(), 1);
}

#[tokio::test]
async fn test_edit_of_unmapped_message_ignored() {
    let bot = TestBot::new();
    bot.seed_verified(USER, 77);

    bot.send(private_edit(USER, 5, "hello again")).await;

    assert!(bot.gateway.calls().is_empty());
}

// ============================================================================
// Reactions
// ============================================================================

#[tokio::test]
async fn test_user_reaction_clamped_to_first() {
    let bot = TestBot::new();
    bot.seed_mapping(USER, 5, 2005);

    let route = bot
        .send(reaction(Chat::private(user_chat()), 5, &["👍", "🔥", "❤"]))
        .await;

    assert_eq!(route, Some("reaction"));
    assert_eq!(bot.gateway.texts_to(user_chat()).len(), 1);
    let reactions = bot
        .gateway
        .matching(|call| matches!(call, Call::Reaction { .. }));
    assert_eq!(
        reactions,
        vec![Call::Reaction {
            chat_id: STAFF,
            message_id: MessageId::new(2005),
            reaction: Some(emoji("👍")),
        }]
    );
}

#[tokio::test]
async fn test_staff_reaction_mirrored_to_user() {
    let bot = TestBot::new();
    bot.seed_mapping(USER, 5, 2005);

    bot.send(reaction(Chat::forum(STAFF), 2005, &["🔥"])).await;

    assert_eq!(
        bot.gateway.calls(),
        vec![Call::Reaction {
            chat_id: user_chat(),
            message_id: MessageId::new(5),
            reaction: Some(ReactionKind::Emoji {
                emoji: "🔥".to_string()
            }),
        }]
    );
}

#[tokio::test]
async fn test_cleared_reaction_clears_counterpart() {
    let bot = TestBot::new();
    bot.seed_mapping(USER, 5, 2005);

    bot.send(reaction(Chat::private(user_chat()), 5, &[])).await;

    assert_eq!(
        bot.gateway.calls(),
        vec![Call::Reaction {
            chat_id: STAFF,
            message_id: MessageId::new(2005),
            reaction: None,
        }]
    );
}

// ============================================================================
// Deletion
// ============================================================================

#[tokio::test]
async fn test_user_delete_removes_both_copies() {
    let bot = TestBot::new();
    bot.seed_mapping(USER, 5, 2005);

    let route = bot.send(replying(private_msg(USER, 6, "/d"), 5)).await;

    assert_eq!(route, Some("delete"));
    assert_eq!(
        bot.gateway.deletes(),
        vec![(user_chat(), MessageId::new(5)), (STAFF, MessageId::new(2005))]
    );
    assert!(bot.store.mappings().is_empty());
}

#[tokio::test]
async fn test_staff_delete_resolves_topic_copy() {
    let bot = TestBot::new();
    bot.seed_mapping(USER, 5, 2005);

    bot.send(replying(staff_msg(Some(77), 11, "/d"), 2005)).await;

    assert_eq!(
        bot.gateway.deletes(),
        vec![(user_chat(), MessageId::new(5)), (STAFF, MessageId::new(2005))]
    );
    assert!(bot.store.mappings().is_empty());
}

#[tokio::test]
async fn test_failed_private_delete_keeps_mapping() {
    let bot = TestBot::new();
    bot.seed_mapping(USER, 5, 2005);
    bot.gateway.fail_deletes_in(user_chat());

    bot.send(replying(private_msg(USER, 6, "/d"), 5)).await;

    assert!(bot.gateway.deletes().is_empty());
    let mappings = bot.store.mappings();
    assert_eq!(mappings.len(), 1);
    assert_eq!(mappings[0].topic_message_id, MessageId::new(2005));
    assert_eq!(bot.gateway.texts_to(STAFF), vec!["Bot error, check the logs"]);
}

#[tokio::test]
async fn test_failed_topic_delete_keeps_mapping() {
    let bot = TestBot::new();
    bot.seed_mapping(USER, 5, 2005);
    bot.gateway.fail_deletes_in(STAFF);

    bot.send(replying(staff_msg(Some(77), 11, "/d"), 2005)).await;

    // The private copy is already gone; the row stays for a retry
    assert_eq!(bot.gateway.deletes(), vec![(user_chat(), MessageId::new(5))]);
    let mappings = bot.store.mappings();
    assert_eq!(mappings.len(), 1);
    assert_eq!(mappings[0].private_message_id, MessageId::new(5));
}

#[tokio::test]
async fn test_delete_needs_a_stored_reply_target() {
    let bot = TestBot::new();

    bot.send(private_text(USER, 6, "/d")).await;
    bot.send(replying(private_msg(USER, 7, "/d"), 5)).await;

    assert_eq!(
        bot.gateway.texts_to(user_chat()),
        vec![
            "Please reply to a message",
            "The replied message can no longer be deleted",
        ]
    );
    assert!(bot.gateway.deletes().is_empty());
}

// ============================================================================
// Ordering
// ============================================================================

fn copied_ids(bot: &TestBot, from: ChatId) -> Vec<i64> {
    bot.gateway
        .copies()
        .into_iter()
        .filter_map(|call| match call {
            Call::Copy {
                from_chat_id,
                message_id,
                ..
            } if from_chat_id == from => Some(i64::from(message_id)),
            _ => None,
        })
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_each_users_messages_relayed_in_arrival_order() {
    const OTHER: i64 = 1002;
    let mut settings = test_settings();
    settings.flood_window = std::time::Duration::ZERO;
    let bot = TestBot::build(ScriptedClassifier::unconfigured(), settings);
    bot.seed_verified(USER, 77);
    bot.seed_verified(OTHER, 78);

    let mut handles = Vec::new();
    for message_id in 1..=150 {
        for user in [USER, OTHER] {
            let update = private_text(user, message_id, "hello there");
            let turn = bot.dispatcher.enqueue(&update);
            let dispatcher = Arc::clone(&bot.dispatcher);
            handles.push(tokio::spawn(async move {
                dispatcher.dispatch_in_turn(&update, turn).await
            }));
        }
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), Some("private_to_staff"));
    }

    let expected: Vec<i64> = (1..=150).collect();
    assert_eq!(copied_ids(&bot, user_chat()), expected);
    assert_eq!(copied_ids(&bot, private_chat(OTHER)), expected);
    assert_eq!(bot.store.mappings().len(), 300);
}
