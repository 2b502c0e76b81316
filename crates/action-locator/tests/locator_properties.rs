//! Resolution-order and timing properties of the resilient locator,
//! exercised against the in-memory page.

use std::sync::Arc;
use std::time::Duration;

use action_locator::{
    ActPlan, CandidateList, CandidateOutcome, ElementAction, ElementFilter, LocateOptions,
    ResilientLocator, Verification,
};
use action_primitives::mock::{MockAction, MockElement, MockPage};
use action_primitives::{ActionError, AnchorDescriptor, SelectMethod};
use tokio::time::Instant;

fn locator(page: &Arc<MockPage>) -> ResilientLocator {
    ResilientLocator::new(page.clone())
}

#[tokio::test(start_paused = true)]
async fn single_resolving_candidate_is_returned() {
    let page = Arc::new(MockPage::new("https://www.easemytrip.com/home/list"));
    page.add(MockElement::new("button").matching("#continueBtn"));

    let candidates = CandidateList::css([".continue-btn", "#continueBtn", ".proceed-btn"]);
    let res = locator(&page)
        .locate("continue", &candidates, &LocateOptions::default())
        .await
        .unwrap();

    assert_eq!(res.candidate, Some(1));
    assert_eq!(
        res.element,
        Some(AnchorDescriptor::css("#continueBtn").nth(0))
    );
    assert_eq!(res.attempts.len(), 2);
    assert_eq!(res.attempts[0].outcome, CandidateOutcome::NoMatch);
}

#[tokio::test(start_paused = true)]
async fn earliest_resolving_candidate_wins() {
    let page = Arc::new(MockPage::new("about:blank"));
    page.add(MockElement::new("a").matching("a.reset"));
    page.add(MockElement::new("button").matching("button.reset"));

    let candidates = CandidateList::css(["button.reset", "a.reset"]);
    for _ in 0..3 {
        let res = locator(&page)
            .locate("reset", &candidates, &LocateOptions::default())
            .await
            .unwrap();
        assert_eq!(res.candidate, Some(0));
        assert_eq!(res.attempts.len(), 1);
    }
}

#[tokio::test(start_paused = true)]
async fn title_select_falls_back_to_class_selector() {
    let page = Arc::new(MockPage::new("about:blank"));
    let title = page.add(
        MockElement::new("select")
            .matching("select.title")
            .options(&["Title", "Mr", "Mrs", "Ms"]),
    );

    let candidates = CandidateList::css(["select#title", "select.title"]);
    let plan = ActPlan::new(ElementAction::Select {
        method: SelectMethod::Text,
        item: "Mr".into(),
    });
    let res = locator(&page)
        .locate_and_act("title", &candidates, &LocateOptions::default(), &plan)
        .await
        .unwrap();

    assert_eq!(res.candidate, Some(1));
    assert_eq!(page.element(title).unwrap().value, "Mr");
}

#[tokio::test(start_paused = true)]
async fn booked_seat_is_skipped() {
    let page = Arc::new(MockPage::new("about:blank"));
    let s1 = page.add(MockElement::new("div").matching("[class*=\"seat\"]").class("seat"));
    let s2 = page.add(
        MockElement::new("div")
            .matching("[class*=\"seat\"]")
            .class("seat booked"),
    );
    let s3 = page.add(MockElement::new("div").matching("[class*=\"seat\"]").class("seat"));

    let opts = LocateOptions::default().with_filter(ElementFilter::exclude_classes(["booked"]));
    let res = locator(&page)
        .locate_and_act(
            "seat",
            &CandidateList::css(["[class*=\"seat\"]"]),
            &opts,
            &ActPlan::click(true),
        )
        .await
        .unwrap();

    let clicked = page.clicked();
    assert_eq!(clicked.len(), 1);
    assert_ne!(clicked[0], s2);
    assert!(clicked[0] == s1 || clicked[0] == s3);
    assert!(res.is_found());
}

#[tokio::test(start_paused = true)]
async fn lookup_error_is_treated_as_no_match() {
    let page = Arc::new(MockPage::new("about:blank"));
    page.fail_lookups(
        AnchorDescriptor::css("select:near(title)"),
        ActionError::Cdp("unsupported pseudo-class".into()),
    );
    page.add(MockElement::new("select").matching("select[name*=\"title\"]"));

    let candidates = CandidateList::css(["select:near(title)", "select[name*=\"title\"]"]);
    let res = locator(&page)
        .locate("title", &candidates, &LocateOptions::default())
        .await
        .unwrap();

    assert_eq!(res.candidate, Some(1));
    assert!(matches!(
        res.attempts[0].outcome,
        CandidateOutcome::Failed { .. }
    ));
}

#[tokio::test(start_paused = true)]
async fn exhausted_list_reports_not_found_within_summed_timeouts() {
    let page = Arc::new(MockPage::new("about:blank"));
    let candidates = CandidateList::css(["#a", "#b", "#c", "#d", "#e"]);
    for c in candidates.iter() {
        page.stall_lookups(c.anchor.clone());
    }

    let started = Instant::now();
    let res = locator(&page)
        .locate("wallet", &candidates, &LocateOptions::default())
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert!(res.is_not_found());
    assert_eq!(res.attempts.len(), 5);
    assert!(res
        .attempts
        .iter()
        .all(|a| a.outcome == CandidateOutcome::TimedOut { after_ms: 2000 }));
    assert!(elapsed >= Duration::from_millis(10_000));
    assert!(elapsed < Duration::from_millis(10_100), "took {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn absent_candidates_wait_their_timeout_then_report_no_match() {
    let page = Arc::new(MockPage::new("about:blank"));
    let candidates = CandidateList::css(["#nothing", "#still-nothing"]);
    let started = Instant::now();
    let res = locator(&page)
        .locate("nothing", &candidates, &LocateOptions::default())
        .await
        .unwrap();

    assert!(res.is_not_found());
    assert!(res
        .attempts
        .iter()
        .all(|a| a.outcome == CandidateOutcome::NoMatch));
    assert!(started.elapsed() <= Duration::from_millis(4_100));
}

#[tokio::test(start_paused = true)]
async fn element_appearing_within_timeout_is_found() {
    let page = Arc::new(MockPage::new("about:blank"));
    page.add(
        MockElement::new("li")
            .matching(".auto-sugg-pre ul li")
            .text("Kolkata, West Bengal")
            .appears_after(Duration::from_millis(700)),
    );

    let candidates: CandidateList =
        [AnchorDescriptor::text(".auto-sugg-pre ul li", "Kolkata")].into_iter().collect();
    let res = locator(&page)
        .locate("city", &candidates, &LocateOptions::default())
        .await
        .unwrap();
    assert!(res.is_found());
    assert!(res.elapsed_ms >= 700 && res.elapsed_ms < 2000);
}

#[tokio::test(start_paused = true)]
async fn hidden_matches_are_skipped_for_first_visible() {
    let page = Arc::new(MockPage::new("about:blank"));
    page.add(MockElement::new("label").matching("label[ng-click]").hidden());
    page.add(MockElement::new("label").matching("label[ng-click]"));

    let res = locator(&page)
        .locate(
            "label",
            &CandidateList::css(["label[ng-click]"]),
            &LocateOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(res.element.unwrap().index, 1);
}

#[tokio::test(start_paused = true)]
async fn invisible_only_candidate_reports_not_visible() {
    let page = Arc::new(MockPage::new("about:blank"));
    page.add(MockElement::new("a").matching(".btn-continue").hidden());
    let res = locator(&page)
        .locate(
            "continue",
            &CandidateList::css([".btn-continue"]),
            &LocateOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(
        res.attempts[0].outcome,
        CandidateOutcome::NotVisible { checked: 1 }
    );
}

#[tokio::test(start_paused = true)]
async fn nth_pick_requires_that_index() {
    let page = Arc::new(MockPage::new("about:blank"));
    for _ in 0..3 {
        page.add(MockElement::new("span").matching("[ng-click*=\"SelectSeat\"]"));
    }
    let seats = CandidateList::css(["[ng-click*=\"SelectSeat\"]"]);

    let res = locator(&page)
        .locate("seat", &seats, &LocateOptions::default().nth(4))
        .await
        .unwrap();
    assert!(res.is_not_found());
    assert_eq!(
        res.attempts[0].outcome,
        CandidateOutcome::TooFew {
            found: 3,
            required: 5
        }
    );

    for _ in 0..2 {
        page.add(MockElement::new("span").matching("[ng-click*=\"SelectSeat\"]"));
    }
    let res = locator(&page)
        .locate("seat", &seats, &LocateOptions::default().nth(4))
        .await
        .unwrap();
    assert_eq!(res.element.unwrap().index, 4);
}

#[tokio::test(start_paused = true)]
async fn min_matches_treats_sparse_candidates_as_missing() {
    let page = Arc::new(MockPage::new("about:blank"));
    page.add(MockElement::new("span").matching("#myModal span"));
    let res = locator(&page)
        .locate(
            "numbered",
            &CandidateList::css(["#myModal span"]),
            &LocateOptions::default().with_min_matches(5),
        )
        .await
        .unwrap();
    assert!(res.is_not_found());
}

#[tokio::test(start_paused = true)]
async fn failed_verification_substitutes_next_match() {
    let page = Arc::new(MockPage::new("about:blank"));
    // click does nothing visible on the first seat
    let stuck = page.add(MockElement::new("div").matching("[class*=\"avail\"]").class("seat avail"));
    let good = page.add(
        MockElement::new("div")
            .matching("[class*=\"avail\"]")
            .class("seat avail")
            .on_click_class("seat avail selected"),
    );

    let plan = ActPlan::click(true)
        .scroll_first()
        .settle(Duration::from_millis(1500))
        .verify(Verification::ClassChanged);
    let res = locator(&page)
        .locate_and_act(
            "seat",
            &CandidateList::css(["[class*=\"avail\"]"]),
            &LocateOptions::default(),
            &plan,
        )
        .await
        .unwrap();

    assert_eq!(page.clicked(), vec![stuck, good]);
    assert_eq!(res.element.unwrap().index, 1);
}

#[tokio::test(start_paused = true)]
async fn failed_action_moves_to_next_candidate() {
    let page = Arc::new(MockPage::new("about:blank"));
    page.add(
        MockElement::new("input")
            .matching("input[name*=\"mobile\"]")
            .attr("type", "tel")
            .failing_clicks(ActionError::Cdp("detached".into())),
    );
    let tel = page.add(
        MockElement::new("input")
            .matching("input[type=\"tel\"]")
            .attr("type", "tel")
            .attr("maxlength", "10"),
    );

    let plan = ActPlan::new(ElementAction::Type {
        text: "8445121366".into(),
        delay_ms: 50,
        clear: true,
    })
    .verify(Verification::ValueContains {
        any_of: vec!["8445121366".into(), "844512".into()],
    });
    let res = locator(&page)
        .locate_and_act(
            "mobile",
            &CandidateList::css(["input[name*=\"mobile\"]", "input[type=\"tel\"]"]),
            &LocateOptions::default(),
            &plan,
        )
        .await
        .unwrap();

    assert!(matches!(
        res.attempts[0].outcome,
        CandidateOutcome::ActionFailed { .. }
    ));
    assert_eq!(res.candidate, Some(1));
    assert_eq!(page.element(tel).unwrap().value, "8445121366");
    assert!(page
        .actions()
        .contains(&MockAction::Type {
            id: tel,
            text: "8445121366".into()
        }));
}

#[tokio::test(start_paused = true)]
async fn country_code_field_is_excluded_by_maxlength() {
    let page = Arc::new(MockPage::new("about:blank"));
    page.add(
        MockElement::new("input")
            .matching("input[type=\"tel\"]")
            .attr("type", "tel")
            .attr("maxlength", "3"),
    );
    let mobile = page.add(
        MockElement::new("input")
            .matching("input[type=\"tel\"]")
            .attr("type", "tel")
            .attr("maxlength", "10"),
    );

    let opts = LocateOptions::default()
        .with_filter(ElementFilter::ExcludeNumericAttrBelow {
            name: "maxlength".into(),
            threshold: 8,
        })
        .with_filter(ElementFilter::RequireAttrOneOf {
            name: "type".into(),
            values: vec!["tel".into(), "text".into(), "number".into()],
        });
    let plan = ActPlan::new(ElementAction::Fill {
        value: "8445121366".into(),
    });
    locator(&page)
        .locate_and_act(
            "mobile",
            &CandidateList::css(["input[type=\"tel\"]"]),
            &opts,
            &plan,
        )
        .await
        .unwrap();
    assert_eq!(page.element(mobile).unwrap().value, "8445121366");
}

#[tokio::test(start_paused = true)]
async fn element_detached_during_filtering_is_skipped() {
    let page = Arc::new(MockPage::new("https://www.easemytrip.com/home/list"));
    page.add(
        MockElement::new("select")
            .matching("select.boarding")
            .options(&["Select", "Sindhi Camp"])
            .detached_children(),
    );
    page.add(
        MockElement::new("select")
            .matching("select.boarding")
            .options(&["Select", "Ajmeri Gate"]),
    );

    let opts = LocateOptions::default().with_filter(ElementFilter::MinDescendants {
        css: "option".into(),
        min: 2,
    });
    let res = locator(&page)
        .locate("boarding", &CandidateList::css(["select.boarding"]), &opts)
        .await
        .unwrap();

    assert_eq!(
        res.element,
        Some(AnchorDescriptor::css("select.boarding").nth(1))
    );
    assert_eq!(res.attempts.len(), 1);
    assert!(res.attempts[0].outcome.is_accepted());
}
