//! 引擎端到端流程测试
//!
//! 使用内存存储驱动完整的事件处理链路：规则匹配 -> 原子记账 ->
//! 徽章发放 -> 排名派生。覆盖幂等发放、并发无丢失更新、账本审计、
//! 分页稳定性等核心性质。

use std::sync::Arc;

use engageforge_engine::{
    EventProcessor, LedgerWriter, MemoryStore, ProcessOutcome, RankingService,
    store::GamifyStore,
};
use engageforge_shared::events::ActivityEvent;
use serde_json::json;

const CHAT: &str = "chat.message.created";

fn chat_event(user_id: &str, company_id: &str) -> ActivityEvent {
    ActivityEvent::new(CHAT, json!({"user_id": user_id, "company_id": company_id}))
}

/// C1 配置两条同事件类型规则：R1 +10 无徽章，R2 +5 带徽章 B1
fn seed_two_rule_company(store: &MemoryStore) -> i64 {
    let badge = store.add_badge("C1", "B1");
    store.add_rule("C1", CHAT, 10, None);
    store.add_rule("C1", CHAT, 5, Some(badge));
    badge
}

#[tokio::test]
async fn test_first_event_awards_xp_and_badge() {
    let store = Arc::new(MemoryStore::new());
    seed_two_rule_company(&store);
    let processor = EventProcessor::new(store.clone());

    let outcome = processor.process(&chat_event("U1", "C1"), "C1").await.unwrap();
    assert_eq!(
        outcome,
        ProcessOutcome {
            xp_awarded: 15,
            badges_earned: vec!["B1".to_string()],
            level_up: false,
            new_level: None,
        }
    );

    let user = store.find_user("U1").await.unwrap().unwrap();
    assert_eq!(user.xp, 15);
    assert_eq!(user.level, 1);
}

#[tokio::test]
async fn test_duplicate_event_repeats_xp_but_not_badge() {
    let store = Arc::new(MemoryStore::new());
    seed_two_rule_company(&store);
    let processor = EventProcessor::new(store.clone());

    let event = chat_event("U1", "C1");
    processor.process(&event, "C1").await.unwrap();
    let second = processor.process(&event, "C1").await.unwrap();

    // XP 不去重，徽章幂等
    assert_eq!(second.xp_awarded, 15);
    assert!(second.badges_earned.is_empty());
    assert!(!second.level_up);

    let user = store.find_user("U1").await.unwrap().unwrap();
    assert_eq!(user.xp, 30);
    assert_eq!(store.user_badges("U1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_level_up_at_boundary() {
    let store = Arc::new(MemoryStore::new());
    store.add_rule("C1", "challenge.completed", 95, None);
    store.add_rule("C1", CHAT, 10, None);
    let processor = EventProcessor::new(store.clone());

    let warmup = ActivityEvent::new(
        "challenge.completed",
        json!({"user_id": "U1", "company_id": "C1"}),
    );
    processor.process(&warmup, "C1").await.unwrap();
    let user = store.find_user("U1").await.unwrap().unwrap();
    assert_eq!((user.xp, user.level), (95, 1));

    let outcome = processor.process(&chat_event("U1", "C1"), "C1").await.unwrap();
    assert!(outcome.level_up);
    assert_eq!(outcome.new_level, Some(2));

    let user = store.find_user("U1").await.unwrap().unwrap();
    assert_eq!((user.xp, user.level), (105, 2));
}

#[tokio::test]
async fn test_skip_cases_return_zero_outcome() {
    let store = Arc::new(MemoryStore::new());
    seed_two_rule_company(&store);
    let processor = EventProcessor::new(store.clone());

    // 无 user_id
    let system_event = ActivityEvent::new(CHAT, json!({"company_id": "C1"}));
    assert_eq!(
        processor.process(&system_event, "C1").await.unwrap(),
        ProcessOutcome::skipped()
    );

    // 无匹配规则的事件类型
    let unmatched = ActivityEvent::new("poll.voted", json!({"user_id": "U1", "company_id": "C1"}));
    assert_eq!(
        processor.process(&unmatched, "C1").await.unwrap(),
        ProcessOutcome::skipped()
    );

    // 其他公司的规则不参与匹配
    assert_eq!(
        processor.process(&chat_event("U1", "C9"), "C9").await.unwrap(),
        ProcessOutcome::skipped()
    );

    // 跳过场景不产生任何用户
    assert!(store.find_user("U1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_deactivated_rule_does_not_fire() {
    let store = Arc::new(MemoryStore::new());
    let rule_id = store.add_rule("C1", CHAT, 10, None);
    store.deactivate_rule(rule_id);
    let processor = EventProcessor::new(store.clone());

    let outcome = processor.process(&chat_event("U1", "C1"), "C1").await.unwrap();
    assert_eq!(outcome, ProcessOutcome::skipped());
}

#[tokio::test]
async fn test_dangling_badge_reference_degrades_to_no_badge() {
    let store = Arc::new(MemoryStore::new());
    let badge = store.add_badge("C1", "B1");
    store.add_rule("C1", CHAT, 5, Some(badge));
    // 匹配与发放之间徽章被带外删除
    store.remove_badge(badge);
    let processor = EventProcessor::new(store.clone());

    let outcome = processor.process(&chat_event("U1", "C1"), "C1").await.unwrap();
    assert_eq!(outcome.xp_awarded, 5);
    assert!(outcome.badges_earned.is_empty());

    let user = store.find_user("U1").await.unwrap().unwrap();
    assert_eq!(user.xp, 5);
}

#[tokio::test]
async fn test_two_rules_sharing_one_badge_grant_once() {
    let store = Arc::new(MemoryStore::new());
    let badge = store.add_badge("C1", "B1");
    store.add_rule("C1", CHAT, 10, Some(badge));
    store.add_rule("C1", CHAT, 5, Some(badge));
    let processor = EventProcessor::new(store.clone());

    let outcome = processor.process(&chat_event("U1", "C1"), "C1").await.unwrap();
    assert_eq!(outcome.xp_awarded, 15);
    assert_eq!(outcome.badges_earned, vec!["B1".to_string()]);
    assert_eq!(store.user_badges("U1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_concurrent_events_lose_no_updates() {
    let store = Arc::new(MemoryStore::new());
    store.add_rule("C1", CHAT, 5, None);
    let processor = Arc::new(EventProcessor::new(store.clone()));

    const N: usize = 50;
    let tasks: Vec<_> = (0..N)
        .map(|_| {
            let processor = processor.clone();
            tokio::spawn(async move {
                processor.process(&chat_event("U1", "C1"), "C1").await
            })
        })
        .collect();

    for task in futures::future::join_all(tasks).await {
        task.unwrap().unwrap();
    }

    let user = store.find_user("U1").await.unwrap().unwrap();
    assert_eq!(user.xp, N as i64 * 5, "并发下丢失了 XP 增量");

    // 账本合计与 XP 一致
    let writer = LedgerWriter::new(store.clone());
    writer.verify_balance("U1").await.unwrap();
}

#[tokio::test]
async fn test_ledger_sum_matches_xp_after_mixed_sequence() {
    let store = Arc::new(MemoryStore::new());
    let badge = store.add_badge("C1", "B1");
    store.add_rule("C1", CHAT, 10, None);
    store.add_rule("C1", CHAT, 5, Some(badge));
    store.add_rule("C1", "payment.succeeded", 50, None);
    let processor = EventProcessor::new(store.clone());

    for _ in 0..3 {
        processor.process(&chat_event("U1", "C1"), "C1").await.unwrap();
    }
    let payment = ActivityEvent::new(
        "payment.succeeded",
        json!({"user_id": "U1", "company_id": "C1", "amount": 4999}),
    );
    processor.process(&payment, "C1").await.unwrap();

    let user = store.find_user("U1").await.unwrap().unwrap();
    assert_eq!(user.xp, 3 * 15 + 50);
    assert_eq!(store.ledger_total("U1").await.unwrap(), user.xp);

    LedgerWriter::new(store.clone()).verify_balance("U1").await.unwrap();
}

#[tokio::test]
async fn test_leaderboard_pagination_is_stable() {
    let store = Arc::new(MemoryStore::new());
    store.add_rule("C1", CHAT, 10, None);
    let processor = EventProcessor::new(store.clone());

    // U1..U12，Ui 处理 i 次 -> xp = 10*i，全部互不相同
    for i in 1..=12 {
        let user_id = format!("U{i}");
        for _ in 0..i {
            processor.process(&chat_event(&user_id, "C1"), "C1").await.unwrap();
        }
    }

    let ranking = RankingService::new(store.clone());
    let first = ranking.leaderboard("C1", 5, 0).await.unwrap();
    let second = ranking.leaderboard("C1", 5, 5).await.unwrap();

    let ranks: Vec<i64> = first.iter().chain(&second).map(|e| e.rank).collect();
    assert_eq!(ranks, (1..=10).collect::<Vec<_>>());

    let users: std::collections::HashSet<&str> = first
        .iter()
        .chain(&second)
        .map(|e| e.user_id.as_str())
        .collect();
    assert_eq!(users.len(), 10, "分页出现重复用户");

    // XP 降序
    assert_eq!(first[0].user_id, "U12");
    assert_eq!(first[0].xp, 120);
    assert!(first.windows(2).all(|w| w[0].xp >= w[1].xp));
    assert!(second[0].xp <= first[4].xp);
}

#[tokio::test]
async fn test_tied_xp_rank_vs_leaderboard_position() {
    let store = Arc::new(MemoryStore::new());
    store.add_rule("C1", CHAT, 10, None);
    let processor = EventProcessor::new(store.clone());

    processor.process(&chat_event("U1", "C1"), "C1").await.unwrap();
    processor.process(&chat_event("U2", "C1"), "C1").await.unwrap();

    let ranking = RankingService::new(store.clone());

    // 排行榜按创建顺序打破并列：U1 第 1，U2 第 2
    let page = ranking.leaderboard("C1", 10, 0).await.unwrap();
    assert_eq!(page[0].user_id, "U1");
    assert_eq!(page[0].rank, 1);
    assert_eq!(page[1].user_id, "U2");
    assert_eq!(page[1].rank, 2);

    // 个体名次对并列用户给出相同数字——与排行榜位置刻意不同
    assert_eq!(ranking.rank("U1", "C1").await.unwrap(), 1);
    assert_eq!(ranking.rank("U2", "C1").await.unwrap(), 1);
}

#[tokio::test]
async fn test_rank_of_unknown_user_counts_against_zero_xp() {
    let store = Arc::new(MemoryStore::new());
    store.add_rule("C1", CHAT, 10, None);
    let processor = EventProcessor::new(store.clone());
    processor.process(&chat_event("U1", "C1"), "C1").await.unwrap();

    let ranking = RankingService::new(store.clone());
    assert_eq!(ranking.rank("ghost", "C1").await.unwrap(), 2);
}

#[tokio::test]
async fn test_lazy_user_creation_on_profile_view() {
    let store = Arc::new(MemoryStore::new());
    let user = store.get_or_create_user("U1", "C1").await.unwrap();
    assert_eq!(user.xp, 0);
    assert_eq!(user.level, 1);

    // 再次获取返回同一用户而非重建
    let again = store.get_or_create_user("U1", "C1").await.unwrap();
    assert_eq!(again.created_at, user.created_at);
}

#[tokio::test]
async fn test_display_name_fallback_in_leaderboard() {
    let store = Arc::new(MemoryStore::new());
    store.add_rule("C1", CHAT, 10, None);
    store.set_display_name("U1", "C1", "Alice");
    let processor = EventProcessor::new(store.clone());
    processor.process(&chat_event("U1", "C1"), "C1").await.unwrap();
    processor.process(&chat_event("U2", "C1"), "C1").await.unwrap();

    let page = RankingService::new(store.clone())
        .leaderboard("C1", 10, 0)
        .await
        .unwrap();
    assert_eq!(page[0].display_name, "Alice");
    assert_eq!(page[1].display_name, "Anonymous");
}
