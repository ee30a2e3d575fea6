//! Integration tests for the conversation store.
//!
//! These exercise the store the way the orchestrator does: exchanges are
//! appended concurrently and context is read back between them.

use std::collections::BTreeSet;
use std::sync::Arc;

use brain_common::{AgentRole, Turn};
use brain_memory::{ConversationMemory, MemoryConfig};

fn exchange(i: u64) -> (Turn, Turn) {
    (
        Turn::user(format!("question {i}"), i * 10),
        Turn::assistant(
            format!("answer {i}"),
            BTreeSet::from([AgentRole::Marketing]),
            i * 10 + 1,
        ),
    )
}

#[tokio::test]
async fn test_concurrent_exchanges_never_interleave() {
    let memory = Arc::new(ConversationMemory::new(MemoryConfig {
        max_turns: 200,
        ..Default::default()
    }));

    let mut handles = Vec::new();
    for i in 0..20 {
        let memory = Arc::clone(&memory);
        handles.push(tokio::spawn(async move {
            let (q, a) = exchange(i);
            memory.append_exchange("shared", q, a).await;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let turns = memory.recent("shared", 100).await;
    assert_eq!(turns.len(), 40);

    for pair in turns.chunks(2) {
        assert!(pair[0].is_user());
        assert!(!pair[1].is_user());
        let n = pair[0].content.trim_start_matches("question ");
        assert_eq!(pair[1].content, format!("answer {n}"));
    }

    for window in turns.windows(2) {
        assert!(window[0].timestamp < window[1].timestamp);
    }
}

#[tokio::test]
async fn test_recent_is_oldest_first_and_bounded_by_k() {
    let memory = ConversationMemory::default();
    for i in 0..3 {
        let (q, a) = exchange(i);
        memory.append_exchange("u", q, a).await;
    }

    let recent = memory.recent("u", 2).await;
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].content, "question 2");
    assert_eq!(recent[1].content, "answer 2");
}

#[tokio::test]
async fn test_clear_only_affects_one_user() {
    let memory = ConversationMemory::default();
    let (q, a) = exchange(1);
    memory.append_exchange("alice", q.clone(), a.clone()).await;
    memory.append_exchange("bob", q, a).await;

    assert!(memory.clear("alice").await);
    assert!(memory.recent("alice", 10).await.is_empty());
    assert_eq!(memory.recent("bob", 10).await.len(), 2);
}

#[tokio::test]
async fn test_stats_for_unknown_user_are_empty() {
    let memory = ConversationMemory::default();
    let stats = memory.stats("nobody").await;
    assert_eq!(stats.total_turns, 0);
    assert!(stats.first_timestamp.is_none());
    assert!(stats.agents_used.is_empty());
}

#[tokio::test]
async fn test_context_clips_long_answers() {
    let memory = ConversationMemory::new(MemoryConfig {
        preview_chars: 10,
        ..Default::default()
    });
    memory
        .append_exchange(
            "u",
            Turn::user("How did Facebook perform?", 1),
            Turn::assistant(
                "Facebook returned 2.0x ROAS on $100,000 spend",
                BTreeSet::from([AgentRole::Marketing]),
                2,
            ),
        )
        .await;

    let context = memory.context_string("u", 2).await;
    assert!(context.contains("User: How did Facebook perform?"));
    assert!(context.contains("Assistant (marketing): Facebook r..."));
}
