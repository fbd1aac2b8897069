//! Admin commands, diagnostics, the startup self-test and maintenance jobs

use integration_tests::*;
use relay_core::{
    BotRights, ChatKind, MemberStatus, MessageId, TopicId, User, UserId, SPAM_TOPIC_KEY,
};
use relay_service::jobs::{Job, Scheduler, SelfTest, SPAM_TOPIC_NAME};
use relay_service::services::help::{register_commands, BOT_COMMANDS, HELP_TEXT};

use std::time::Duration;

const USER: i64 = 1001;

fn pinned_ids(bot: &TestBot) -> Vec<MessageId> {
    bot.gateway
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::Pin { message_id, .. } => Some(message_id),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Ban / unban
// ============================================================================

#[tokio::test]
async fn test_ban_pins_announcement_and_blocks() {
    let bot = TestBot::new();
    bot.seed_verified(USER, 77);

    let route = bot.send(staff_text(Some(77), 10, "/ban")).await;

    assert_eq!(route, Some("admin_command"));
    let announcement = bot
        .gateway
        .sent_texts()
        .into_iter()
        .find(|msg| msg.text == "This user has been banned")
        .expect("announcement posted");
    assert_eq!(announcement.thread_id, Some(TopicId::new(77)));
    assert_eq!(announcement.reply_to, Some(MessageId::new(10)));

    let pinned = pinned_ids(&bot);
    assert_eq!(pinned.len(), 1);
    let block = bot.store.block(UserId::new(USER)).expect("user blocked");
    assert_eq!(block.pinned_message_id, Some(pinned[0]));

    bot.send(private_text(USER, 3, "hello there")).await;
    assert_eq!(
        bot.gateway.texts_to(private_chat(USER)),
        vec!["You have been banned"]
    );
    assert!(bot.gateway.copies().is_empty());
}

#[tokio::test]
async fn test_unban_removes_announcement_and_restores_relay() {
    let bot = TestBot::new();
    bot.seed_verified(USER, 77);
    bot.send(staff_text(Some(77), 10, "/ban")).await;
    let pinned = pinned_ids(&bot)[0];
    bot.gateway.clear();

    bot.send(staff_text(Some(77), 11, "/unban")).await;

    assert_eq!(bot.gateway.deletes(), vec![(STAFF, pinned)]);
    assert!(bot.store.block(UserId::new(USER)).is_none());
    assert_eq!(bot.gateway.texts_to(STAFF), vec!["User unbanned"]);

    bot.send(private_text(USER, 4, "hello there")).await;
    assert_eq!(bot.gateway.copies().len(), 1);
}

#[tokio::test]
async fn test_ban_waits_for_users_pipeline() {
    let bot = TestBot::new();
    bot.seed_verified(USER, 77);
    let held = bot.ctx.cache().lock(UserId::new(USER)).await;

    let ban = bot.send(staff_text(Some(77), 10, "/ban"));
    tokio::pin!(ban);
    let early = tokio::time::timeout(Duration::from_millis(20), &mut ban).await;
    assert!(early.is_err());
    assert!(bot.gateway.sent_texts().is_empty());
    assert!(pinned_ids(&bot).is_empty());

    drop(held);
    assert_eq!(ban.await, Some("admin_command"));
    assert_eq!(pinned_ids(&bot).len(), 1);
    assert!(bot.store.block(UserId::new(USER)).is_some());
}

#[tokio::test]
async fn test_unban_waits_for_users_pipeline() {
    let bot = TestBot::new();
    bot.seed_verified(USER, 77);
    bot.send(staff_text(Some(77), 10, "/ban")).await;
    bot.gateway.clear();
    let held = bot.ctx.cache().lock(UserId::new(USER)).await;

    let unban = bot.send(staff_text(Some(77), 11, "/unban"));
    tokio::pin!(unban);
    let early = tokio::time::timeout(Duration::from_millis(20), &mut unban).await;
    assert!(early.is_err());
    assert!(bot.gateway.deletes().is_empty());
    assert!(bot.store.block(UserId::new(USER)).is_some());

    drop(held);
    unban.await;
    assert!(bot.store.block(UserId::new(USER)).is_none());
    assert_eq!(bot.gateway.texts_to(STAFF), vec!["User unbanned"]);
}

#[tokio::test]
async fn test_unban_of_unblocked_user() {
    let bot = TestBot::new();
    bot.seed_verified(USER, 77);

    bot.send(staff_text(Some(77), 11, "/unban")).await;

    assert_eq!(bot.gateway.texts_to(STAFF), vec!["This user is not blocked"]);
}

#[tokio::test]
async fn test_admin_command_needs_a_topic_user() {
    let bot = TestBot::new();

    bot.send(staff_text(None, 10, "/ban")).await;
    bot.send(staff_text(Some(404), 11, "/ban")).await;

    assert_eq!(
        bot.gateway.texts_to(STAFF),
        vec!["No user specified", "This user is invalid"]
    );
    assert!(pinned_ids(&bot).is_empty());
}

#[tokio::test]
async fn test_ban_command_from_user_is_relayed_not_run() {
    let bot = TestBot::new();
    bot.seed_verified(USER, 77);

    // Commands in a private chat never reach the admin routes
    let route = bot.send(private_text(USER, 1, "/ban")).await;

    assert_eq!(route, None);
    assert!(bot.store.block(UserId::new(USER)).is_none());
}

// ============================================================================
// Verify override
// ============================================================================

#[tokio::test]
async fn test_verify_true_lets_user_through() {
    let bot = TestBot::new();
    let user = UserId::new(1002);
    bot.store
        .put_user(User::new(&profile(1002), TopicId::new(78)));

    bot.send(staff_text(Some(78), 10, "/verify true")).await;

    assert_eq!(
        bot.gateway.texts_to(private_chat(1002)),
        vec!["An administrator has verified you, you can send messages directly"]
    );
    assert_eq!(bot.ctx.cache().is_verified(user), Some(true));

    bot.send(private_text(1002, 1, "hello there")).await;
    assert!(bot.gateway.captions().is_empty());
    let copies = bot.gateway.copies();
    assert_eq!(copies.len(), 1);
    assert!(matches!(
        copies[0],
        Call::Copy { thread_id: Some(topic), .. } if topic == TopicId::new(78)
    ));
}

#[tokio::test]
async fn test_verify_false_clears_flag() {
    let bot = TestBot::new();
    bot.seed_verified(USER, 77);

    bot.send(staff_text(Some(77), 10, "/verify FALSE")).await;

    assert!(!bot.store.verification(UserId::new(USER)).unwrap().verified);
    assert_eq!(bot.ctx.cache().is_verified(UserId::new(USER)), Some(false));
    assert_eq!(
        bot.gateway.texts_to(private_chat(USER)),
        vec!["An administrator has cleared your verification, please verify again"]
    );
}

#[tokio::test]
async fn test_verify_rejects_bad_arguments() {
    let bot = TestBot::new();
    bot.seed_verified(USER, 77);

    bot.send(staff_text(Some(77), 10, "/verify maybe")).await;
    bot.send(staff_text(Some(77), 11, "/verify")).await;
    bot.send(staff_text(None, 12, "/verify true")).await;

    assert_eq!(
        bot.gateway.texts_to(STAFF),
        vec![
            "Usage: /verify <true|false>",
            "Usage: /verify <true|false>",
            "No user specified",
        ]
    );
    assert!(bot.gateway.texts_to(private_chat(USER)).is_empty());
}

// ============================================================================
// Info and help
// ============================================================================

#[tokio::test]
async fn test_info_in_general_thread_reports_bot() {
    let bot = TestBot::new();
    bot.seed_verified(USER, 77);
    bot.seed_mapping(USER, 5, 2005);

    bot.send(staff_text(None, 10, "/info")).await;

    let report = &bot.gateway.texts_to(STAFF)[0];
    assert!(report.starts_with("Bot:\n> Name: Relay"));
    assert!(report.contains("> Backend: memory"));
    assert!(report.contains("> Status: ok"));
    assert!(report.contains("> Verified users: 1"));
    assert!(report.contains("> Topics: 1"));
    assert!(report.contains("> Stored messages: 1"));
    assert!(report.contains("Cache:"));
}

#[tokio::test]
async fn test_info_in_topic_reports_user() {
    let bot = TestBot::new();
    bot.seed_verified(USER, 77);
    bot.seed_mapping(USER, 5, 2005);

    bot.send(staff_text(Some(77), 10, "/info")).await;

    let report = &bot.gateway.texts_to(STAFF)[0];
    assert!(report.starts_with("User:\n> User ID: 1001"));
    assert!(report.contains("> Blocked: no"));
    assert!(report.contains("> Stored messages: 1"));
}

#[tokio::test]
async fn test_info_on_reply_reports_message() {
    let bot = TestBot::new();
    bot.seed_verified(USER, 77);
    bot.seed_mapping(USER, 5, 2005);

    bot.send(replying(staff_msg(Some(77), 10, "/info"), 2005)).await;
    bot.send(replying(staff_msg(Some(77), 11, "/info"), 3000)).await;

    let texts = bot.gateway.texts_to(STAFF);
    assert!(texts[0].starts_with("Message:\n> Message ID: 2005\n> Private message ID: 5"));
    assert!(texts[0].contains("> Spam: no"));
    assert_eq!(texts[1], "This message is invalid or not stored");
}

#[tokio::test]
async fn test_help_answers_anywhere() {
    let bot = TestBot::new();

    assert_eq!(bot.send(private_text(USER, 1, "/help")).await, Some("help"));
    assert_eq!(
        bot.send(staff_text(Some(77), 2, "/help@relay_bot")).await,
        Some("help")
    );

    let texts = bot.gateway.sent_texts();
    assert_eq!(texts.len(), 2);
    assert!(texts.iter().all(|msg| msg.text == HELP_TEXT));
    assert_eq!(texts[1].thread_id, Some(TopicId::new(77)));
}

#[tokio::test]
async fn test_register_commands_publishes_menu() {
    let bot = TestBot::new();

    register_commands(&bot.ctx).await.unwrap();

    assert_eq!(bot.gateway.calls(), vec![Call::SetCommands(BOT_COMMANDS.len())]);
}

// ============================================================================
// Self-test
// ============================================================================

#[tokio::test]
async fn test_self_test_creates_spam_topic() {
    let bot = TestBot::new();

    let report = SelfTest::new(&bot.ctx).run().await;

    assert!(report.all_passed());
    assert!(bot.ctx.is_ready());
    assert_eq!(bot.gateway.created_topics(), vec![SPAM_TOPIC_NAME]);

    let topic = bot.ctx.spam_topic().expect("spam topic set");
    assert_eq!(bot.store.setting(SPAM_TOPIC_KEY), Some(topic.to_string()));

    let texts = bot.gateway.texts_to(STAFF);
    assert_eq!(texts.first().map(String::as_str), Some("Self-test starting"));
    assert_eq!(texts.last().map(String::as_str), Some("Self-test passed"));
}

#[tokio::test]
async fn test_self_test_reuses_stored_spam_topic() {
    let bot = TestBot::new();
    bot.store.put_setting(SPAM_TOPIC_KEY, "900");

    let report = SelfTest::new(&bot.ctx).run().await;

    assert!(report.spam_topic);
    assert!(bot.gateway.created_topics().is_empty());
    assert_eq!(bot.ctx.spam_topic(), Some(TopicId::new(900)));

    // The probe was posted in the thread and removed again
    let probe = bot
        .gateway
        .sent_texts()
        .into_iter()
        .find(|msg| msg.thread_id == Some(TopicId::new(900)))
        .expect("probe posted");
    assert_eq!(probe.text, "Checking the spam topic");
    assert_eq!(bot.gateway.deletes().len(), 1);
}

#[tokio::test]
async fn test_self_test_drops_missing_spam_topic() {
    let bot = TestBot::new();
    bot.store.put_setting(SPAM_TOPIC_KEY, "900");
    bot.gateway.remove_thread(TopicId::new(900));

    let report = SelfTest::new(&bot.ctx).run().await;

    assert!(!report.spam_topic);
    assert!(!bot.ctx.is_ready());
    assert_eq!(bot.store.setting(SPAM_TOPIC_KEY), None);
    assert_eq!(bot.ctx.spam_topic(), None);
    let texts = bot.gateway.texts_to(STAFF);
    assert!(texts
        .iter()
        .any(|text| text.ends_with("restart the bot to create a new one")));
    assert_eq!(
        texts.last().map(String::as_str),
        Some("Self-test failed, fix the configuration and restart the bot")
    );
}

#[tokio::test]
async fn test_self_test_drops_unparsable_spam_topic() {
    let bot = TestBot::new();
    bot.store.put_setting(SPAM_TOPIC_KEY, "not-a-number");

    let report = SelfTest::new(&bot.ctx).run().await;

    assert!(!report.spam_topic);
    assert_eq!(bot.store.setting(SPAM_TOPIC_KEY), None);
}

#[tokio::test]
async fn test_self_test_reports_every_failed_check() {
    let bot = TestBot::new();
    bot.gateway.set_chat(ChatKind::Group, false);
    bot.gateway.set_privacy_mode(true);
    bot.gateway
        .set_member(MemberStatus::Member, BotRights::DELETE_MESSAGES);

    let report = SelfTest::new(&bot.ctx).run().await;

    assert!(!report.supergroup);
    assert!(!report.forum);
    assert!(!report.privacy_disabled);
    assert!(!report.administrator);
    assert!(!report.manage_topics);
    assert!(!report.spam_topic);
    assert!(!bot.ctx.is_ready());
    assert!(bot.gateway.created_topics().is_empty());

    let texts = bot.gateway.texts_to(STAFF);
    for expected in [
        "The staff chat is not a supergroup",
        "Topics are not enabled in the staff chat",
        "Privacy mode is enabled, disable it with BotFather",
        "The bot is not an administrator of the staff chat",
        "The bot cannot manage topics",
    ] {
        assert!(texts.iter().any(|text| text == expected), "missing: {expected}");
    }
}

// ============================================================================
// Maintenance jobs
// ============================================================================

#[tokio::test]
async fn test_cleanup_db_deletes_expired_mappings() {
    let bot = TestBot::new();
    bot.seed_old_mapping(USER, 1, 2001, 3);
    bot.seed_mapping(USER, 2, 2002);

    Job::cleanup_db(bot.ctx.clone()).run().await.unwrap();

    let mappings = bot.store.mappings();
    assert_eq!(mappings.len(), 1);
    assert_eq!(mappings[0].private_message_id, MessageId::new(2));
}

#[tokio::test]
async fn test_cleanup_cache_falls_back_to_repository() {
    let bot = TestBot::new();
    bot.seed_verified(USER, 77);
    bot.send(private_text(USER, 1, "hello there")).await;
    assert_eq!(bot.ctx.cache().is_verified(UserId::new(USER)), Some(true));

    Job::cleanup_cache(bot.ctx.clone()).run().await.unwrap();

    assert_eq!(bot.ctx.cache().is_verified(UserId::new(USER)), None);
    assert!(bot.ctx.cache().locks().is_empty());

    // The repository still knows the user
    bot.send(private_text(USER, 2, "hello again")).await;
    assert_eq!(bot.gateway.copies().len(), 2);
}

#[tokio::test]
async fn test_scheduler_runs_standard_jobs() {
    let bot = TestBot::new();
    bot.seed_old_mapping(USER, 1, 2001, 3);

    let scheduler = Scheduler::new(relay_service::jobs::daily_jobs(&bot.ctx));
    let names: Vec<_> = scheduler.jobs().iter().map(Job::name).collect();
    assert_eq!(names, vec!["cleanup_cache", "cleanup_db"]);

    assert_eq!(scheduler.run_all().await, 0);
    assert!(bot.store.mappings().is_empty());
}
