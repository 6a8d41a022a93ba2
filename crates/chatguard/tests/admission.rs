use anyhow::Result;
use chatguard::{
    attachments::{digest_attachments, Attachment, CSV_MIME_TYPE},
    budget::TokenBudgetGuard,
    conversation::Conversation,
    models::profile::ModelCatalog,
};

#[test]
fn test_budget_tracks_a_growing_conversation() -> Result<()> {
    let guard = TokenBudgetGuard::new()?;
    let catalog = ModelCatalog::builtin();
    let gpt4o = catalog.require("gpt-4o")?;

    let mut log = Conversation::new();
    let mut previous = guard.estimate_tokens(log.messages(), "gpt-4o");
    for round in 0..5 {
        log.append_user_message(format!("question number {}", round));
        log.append_assistant_message(format!("answer number {}", round));
        let estimate = guard.estimate_tokens(log.messages(), "gpt-4o");
        assert!(estimate > previous);
        previous = estimate;
    }
    assert!(guard.can_submit(log.messages(), gpt4o));

    for profile in catalog.profiles() {
        let estimate = guard.estimate_for_profile(log.messages(), profile);
        assert_eq!(
            guard.can_submit(log.messages(), profile),
            estimate + profile.max_output_tokens <= profile.context_window_tokens
        );
    }
    Ok(())
}

#[test]
fn test_large_upload_is_rejected_by_small_window() -> Result<()> {
    let guard = TokenBudgetGuard::new()?;
    let catalog = ModelCatalog::builtin();

    let mut csv = String::from("id,comment\n");
    for i in 0..2_000 {
        csv.push_str(&format!("{},the quick brown fox jumps over the lazy dog\n", i));
    }
    let digest = digest_attachments(&[Attachment::new(
        "big.csv",
        CSV_MIME_TYPE,
        csv.into_bytes(),
    )]);

    let mut log = Conversation::new();
    log.append_user_message("summarize");
    log.append_file_digest(digest.text.unwrap());

    assert!(!guard.can_submit(log.messages(), catalog.require("gpt-4")?));
    assert!(guard.can_submit(log.messages(), catalog.require("gpt-4o")?));
    Ok(())
}
