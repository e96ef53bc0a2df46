//! Selector race and bounded wait behaviour under a paused clock.

mod support;

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use storewalk_scraper::{
    await_condition, race_conditions, require_condition, Condition, RaceError, ScraperError,
    WaitOutcome,
};
use support::{policy, FakePage, PageFixture};

#[tokio::test(start_paused = true)]
async fn first_observed_condition_wins() {
    let page = FakePage::showing(
        PageFixture::new()
            .element_after("#carousel", Duration::from_secs(3))
            .element_after("#grid", Duration::from_secs(1)),
    );
    let conditions = [Condition::present("#carousel"), Condition::present("#grid")];

    let winner = race_conditions(&page, &conditions, policy(30_000), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(winner.index, 1);
    assert_eq!(winner.condition.selector, "#grid");
}

#[tokio::test(start_paused = true)]
async fn exactly_one_winner_when_all_conditions_hold() {
    let selectors: Vec<String> = (0..8).map(|i| format!("#layout-{i}")).collect();
    let fixture = selectors
        .iter()
        .fold(PageFixture::new(), |f, s| f.element(s));
    let page = FakePage::showing(fixture);
    let conditions: Vec<Condition> = selectors
        .iter()
        .map(|s| Condition::present(s.as_str()))
        .collect();

    let winner = race_conditions(&page, &conditions, policy(1_000), &CancellationToken::new())
        .await
        .unwrap();

    assert!(winner.index < conditions.len());
    assert_eq!(winner.condition, conditions[winner.index]);
}

#[tokio::test(start_paused = true)]
async fn winner_is_always_one_of_the_conditions_that_hold() {
    let selectors: Vec<String> = (0..4).map(|i| format!("#variant-{i}")).collect();
    let conditions: Vec<Condition> = selectors
        .iter()
        .map(|s| Condition::present(s.as_str()))
        .collect();

    for mask in 1u32..16 {
        let holding: Vec<usize> = (0..4).filter(|i| mask & (1 << i) != 0).collect();
        let fixture = holding.iter().fold(PageFixture::new(), |f, &i| {
            f.element_after(&selectors[i], Duration::from_millis(100 * (i as u64 + 1)))
        });
        let page = FakePage::showing(fixture);

        let winner = race_conditions(&page, &conditions, policy(5_000), &CancellationToken::new())
            .await
            .unwrap();
        assert!(
            holding.contains(&winner.index),
            "mask {mask:04b}: winner {} does not hold",
            winner.index
        );

        let probes_at_return = page.probe_count();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(page.probe_count(), probes_at_return, "mask {mask:04b}");
    }
}

#[tokio::test(start_paused = true)]
async fn watchers_stop_probing_after_the_race_returns() {
    let page = FakePage::showing(
        PageFixture::new()
            .element_after("#grid", Duration::from_millis(500))
            .element_after("#never", Duration::from_secs(3_600)),
    );
    let conditions = [Condition::present("#never"), Condition::present("#grid")];

    race_conditions(&page, &conditions, policy(30_000), &CancellationToken::new())
        .await
        .unwrap();
    let probes_at_return = page.probe_count();

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(page.probe_count(), probes_at_return);
}

#[tokio::test(start_paused = true)]
async fn times_out_when_nothing_appears() {
    let page = FakePage::showing(PageFixture::new());
    let conditions = [Condition::present("#carousel"), Condition::present("#grid")];

    let err = race_conditions(&page, &conditions, policy(2_000), &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        RaceError::Timeout { waited, last_cause } => {
            assert!(waited >= Duration::from_secs(2));
            assert!(last_cause.is_none());
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn zero_deadline_times_out() {
    let page = FakePage::showing(PageFixture::new());
    let conditions = [Condition::present("#carousel")];

    let err = race_conditions(&page, &conditions, policy(0), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, RaceError::Timeout { .. }));
}

#[tokio::test(start_paused = true)]
async fn timeout_reports_last_probe_failure() {
    let page = FakePage::showing(PageFixture::new().failing_probe("#grid"));
    let conditions = [Condition::present("#carousel"), Condition::present("#grid")];

    let err = race_conditions(&page, &conditions, policy(1_000), &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        RaceError::Timeout { last_cause, .. } => {
            assert_eq!(
                last_cause.as_deref(),
                Some("script evaluation failed: execution context was destroyed")
            );
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn probe_errors_do_not_decide_the_race() {
    let page = FakePage::showing(
        PageFixture::new()
            .failing_probe("#broken")
            .element_after("#grid", Duration::from_secs(2)),
    );
    let conditions = [Condition::present("#broken"), Condition::present("#grid")];

    let winner = race_conditions(&page, &conditions, policy(5_000), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(winner.index, 1);
}

#[tokio::test(start_paused = true)]
async fn empty_condition_list_is_rejected() {
    let page = FakePage::showing(PageFixture::new());

    let err = race_conditions(&page, &[], policy(1_000), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, RaceError::NoConditions));
    assert_eq!(page.probe_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancelled_token_ends_the_race() {
    let page = FakePage::showing(PageFixture::new());
    let conditions = [Condition::present("#carousel"), Condition::present("#grid")];
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let err = race_conditions(&page, &conditions, policy(30_000), &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, RaceError::Cancelled));
}

#[tokio::test(start_paused = true)]
async fn wait_finds_element_that_appears_late() {
    let page = FakePage::showing(
        PageFixture::new().element_after("#catalog", Duration::from_secs(4)),
    );

    let outcome = await_condition(
        &page,
        &Condition::visible("#catalog"),
        policy(5_000),
        &CancellationToken::new(),
    )
    .await;

    assert_eq!(outcome, WaitOutcome::Found);
}

#[tokio::test(start_paused = true)]
async fn wait_reports_not_found_for_hidden_element() {
    let page = FakePage::showing(PageFixture::new().hidden_element("#catalog"));
    let cancel = CancellationToken::new();

    let visible = await_condition(
        &page,
        &Condition::visible("#catalog"),
        policy(1_000),
        &cancel,
    )
    .await;
    let present = await_condition(
        &page,
        &Condition::present("#catalog"),
        policy(1_000),
        &cancel,
    )
    .await;

    assert_eq!(visible, WaitOutcome::NotFound);
    assert!(present.is_found());
}

#[tokio::test(start_paused = true)]
async fn require_condition_distinguishes_timeout_from_cancellation() {
    let page = FakePage::showing(PageFixture::new());
    let condition = Condition::visible("#catalog");

    let timed_out = require_condition(&page, &condition, policy(1_000), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(
        timed_out,
        ScraperError::WaitTimeout { ref selector, .. } if selector == "#catalog"
    ));

    let cancel = CancellationToken::new();
    cancel.cancel();
    let cancelled = require_condition(&page, &condition, policy(1_000), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(cancelled, ScraperError::Cancelled));
}
