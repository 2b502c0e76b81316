//! Selector lists for the EaseMyTrip bus pages.
//!
//! `:has-text(...)` selectors become text anchors scoped by the CSS part,
//! and `X:has-text(..) Y` becomes a nested anchor.

use std::time::Duration;

use action_locator::{CandidateList, ElementFilter, LocateOptions};
use action_primitives::AnchorDescriptor as A;

use crate::intent::Intent;
use crate::table::Recipe;

/// Classes marking a seat that cannot be booked.
pub const UNAVAILABLE_SEAT_CLASSES: [&str; 5] =
    ["booked", "grey", "disabled", "blocked", "unavailable"];

fn css(selectors: &[&str]) -> CandidateList {
    CandidateList::css(selectors.iter().copied())
}

fn timeout(ms: u64) -> LocateOptions {
    LocateOptions::default().with_timeout(Duration::from_millis(ms))
}

fn checkbox_filter(value: &str, id: &str, label: &str) -> CandidateList {
    CandidateList::new()
        .push(A::css(format!(
            "input[type=\"checkbox\"][value*=\"{}\"]",
            value
        )))
        .push(A::text("label", label))
        .push(A::css(format!(
            "input[id*=\"{}\"][type=\"checkbox\"]",
            id
        )))
        .push(A::text("[class*=\"filter\"] input", label))
}

fn dropdown(selectors: &[&str]) -> Recipe {
    Recipe::new(css(selectors)).with_options(
        timeout(3000).with_filter(ElementFilter::MinDescendants {
            css: "option".into(),
            min: 2,
        }),
    )
}

/// Default recipe for `intent`.
pub fn recipe(intent: Intent) -> Recipe {
    match intent {
        Intent::SourceCity => Recipe::new(css(&["#txtSrcCity"])),
        Intent::DestinationCity => Recipe::new(css(&["#txtDesCity"])),
        // scopes for the suggestion text anchor built at run time
        Intent::CitySuggestion => {
            Recipe::new(css(&[".auto-sugg-pre ul li"])).with_options(timeout(10_000))
        }
        Intent::DatePicker => Recipe::new(css(&["#datepicker"])),
        Intent::SearchButton => Recipe::new(css(&["#srcbtn"])),
        Intent::SelectSeatButton => Recipe::new(
            CandidateList::new()
                .push(A::text("button", "Select Seat"))
                .push(A::text("a", "Select Seat")),
        )
        .with_options(timeout(20_000)),
        Intent::IndexedSelectSeat => indexed_select_seat(),
        Intent::AcFilter => Recipe::new(
            CandidateList::new()
                .push(A::css(
                    "input[type=\"checkbox\"][value*=\"AC\"], input[type=\"checkbox\"][id*=\"ac\"]",
                ))
                .push(A::text("label", "AC"))
                .push(A::css("input[value*=\"A/C\"][type=\"checkbox\"]"))
                .push(A::text("[class*=\"filter\"] input", "AC")),
        ),
        Intent::NonAcFilter => Recipe::new(
            CandidateList::new()
                .push(A::css("input[type=\"checkbox\"][value*=\"Non AC\"]"))
                .push(A::text("label", "Non AC"))
                .push(A::css("input[value*=\"Non A/C\"][type=\"checkbox\"]")),
        ),
        Intent::SleeperFilter => Recipe::new(checkbox_filter("Sleeper", "sleeper", "Sleeper")),
        Intent::SeaterFilter => Recipe::new(checkbox_filter("Seater", "seater", "Seater")),
        Intent::OperatorFilter => Recipe::new(
            css(&[
                "[class*=\"operator\"] input[type=\"checkbox\"]",
                "[class*=\"travels\"] input[type=\"checkbox\"]",
                "input[type=\"checkbox\"][name*=\"operator\"]",
            ])
            .push(A::nested(
                A::text("label", "Travels"),
                "input[type=\"checkbox\"]",
            )),
        ),
        Intent::ResetFilter => Recipe::new(
            CandidateList::new()
                .push(A::text("button", "Reset"))
                .push(A::text("a", "Reset"))
                .push(A::text("button", "Clear"))
                .push(A::css("[class*=\"reset\"]"))
                .push(A::css("[id*=\"reset\"]")),
        ),
        Intent::BusListing => Recipe::new(css(&[
            "[class*=\"bus\"], [class*=\"list-item\"], .result-item, div[ng-repeat]",
        ])),
        Intent::AvailableSeat => Recipe::new(css(&[
            "[class*=\"avail\"]:not([class*=\"booked\"]):not([class*=\"grey\"]):not([class*=\"disabled\"])",
            "[ng-click*=\"SelectSeat\"]:not([class*=\"booked\"]):not([class*=\"grey\"])",
            ".seat.available, .available-seat",
            "[class*=\"seat\"]:not([class*=\"booked\"]):not([class*=\"grey\"]):not([class*=\"blocked\"])",
        ]))
        .with_options(
            LocateOptions::default()
                .with_scan_limit(10)
                .with_filter(ElementFilter::exclude_classes(UNAVAILABLE_SEAT_CLASSES)),
        ),
        Intent::QuickSeat => quick_seat(),
        Intent::IndexedSeat => Recipe::new(css(&[
            "[ng-click*=\"SelectSeat\"], [ng-click*=\"selectSeat\"]",
        ]))
        .with_options(timeout(5000).nth(4)),
        Intent::ModalSeatNumber => Recipe::new(
            [A::text_pattern("#myModal span, #myModal div", "^[0-9]+$")]
                .into_iter()
                .collect(),
        )
        .with_options(LocateOptions::default().nth(4).with_min_matches(5)),
        Intent::ModalClickable => {
            Recipe::new(css(&["#myModal [onclick], #myModal [ng-click]"]))
        }
        Intent::BoardingPointDropdown => dropdown(&[
            "select[name*=\"boarding\"]",
            "select[id*=\"boarding\"]",
            "select[name*=\"pickup\"]",
            "#boardingPoint",
            ".boarding-point select",
            "select.boarding",
            "select[name=\"boardingPointId\"]",
            "select[class*=\"boarding\"]",
        ]),
        Intent::DroppingPointDropdown => dropdown(&[
            "select[name*=\"dropping\"]",
            "select[id*=\"dropping\"]",
            "select[name*=\"drop\"]",
            "#droppingPoint",
            ".dropping-point select",
            "select.dropping",
            "select[name=\"droppingPointId\"]",
            "select[class*=\"dropping\"]",
        ]),
        Intent::PointLabel => Recipe::new(css(&["label[ng-click]"])),
        Intent::ContinueButton => Recipe::new(
            CandidateList::new()
                .push(A::text("button", "Continue"))
                .push(A::text("a", "Continue"))
                .push(A::css("input[value=\"Continue\"]"))
                .push(A::css("button[type=\"submit\"]"))
                .push(A::css(".continue-btn"))
                .push(A::css("[class*=\"continue\"]")),
        ),
        Intent::IndexedContinue => indexed_continue(),
        Intent::ProceedButton => Recipe::new(
            CandidateList::new()
                .push(A::text("button", "Continue"))
                .push(A::text("a", "Continue"))
                .push(A::css("input[value*=\"Continue\"]"))
                .push(A::text("button", "Proceed"))
                .push(A::text("button", "Next"))
                .push(A::css("button[type=\"submit\"]"))
                .push(A::css("a[class*=\"continue\"]"))
                .push(A::css("button[class*=\"continue\"]"))
                .push(A::css(".btn-continue"))
                .push(A::text("a.btn", "Continue"))
                .push(A::text("button.btn", "Continue")),
        ),
        Intent::TitleSelect => Recipe::new(css(&[
            "select[name*=\"title\"], select[id*=\"title\"]",
            "select.title",
            "[name*=\"Title\"]",
        ])),
        Intent::FirstName => Recipe::new(css(&[
            "input[name*=\"firstName\"], input[id*=\"firstName\"]",
            "input[name*=\"firstname\"], input[id*=\"firstname\"]",
            "input[placeholder*=\"First Name\"]",
            "input[placeholder*=\"first name\"]",
        ])),
        Intent::LastName => Recipe::new(css(&[
            "input[name*=\"lastName\"], input[id*=\"lastName\"]",
            "input[name*=\"lastname\"], input[id*=\"lastname\"]",
            "input[placeholder*=\"Last Name\"]",
            "input[placeholder*=\"last name\"]",
        ])),
        Intent::Age => Recipe::new(css(&[
            "input[name*=\"age\"], input[id*=\"age\"]",
            "input[placeholder*=\"Age\"]",
            "input[placeholder*=\"age\"]",
            "select[name*=\"age\"], select[id*=\"age\"]",
        ])),
        Intent::InsuranceYes => Recipe::new(
            css(&[
                "input[value=\"yes\"][type=\"radio\"]",
                "input[value=\"Yes\"][type=\"radio\"]",
                "input[id*=\"insurance\"][value*=\"yes\"]",
            ])
            .push(A::text("label", "Yes"))
            .push(A::css("input[name*=\"insurance\"]")),
        ),
        Intent::InsuranceConsent => Recipe::new(
            css(&[
                "input[type=\"checkbox\"][name*=\"insurance\"]",
                "input[type=\"checkbox\"][id*=\"insurance\"]",
            ])
            .push(A::nested(
                A::text("label", "I accept"),
                "input[type=\"checkbox\"]",
            ))
            .push(A::css("input[type=\"checkbox\"].insurance")),
        ),
        Intent::Email => Recipe::new(css(&[
            "input[type=\"email\"]",
            "input[name*=\"email\"]",
            "input[id*=\"email\"]",
            "input[placeholder*=\"email\"]",
            "input[placeholder*=\"Email\"]",
        ])),
        Intent::Mobile => Recipe::new(css(&[
            "input[maxlength=\"10\"][type=\"tel\"]",
            "input[name*=\"mobile\"]:not([name*=\"country\"]):not([maxlength=\"3\"])",
            "input[name*=\"Mobile\"]:not([name*=\"country\"]):not([maxlength=\"3\"])",
            "input[id*=\"mobile\"]:not([id*=\"country\"]):not([maxlength=\"3\"])",
            "input[placeholder*=\"mobile\"]:not([maxlength=\"3\"])",
            "input[placeholder*=\"Mobile Number\"]",
            "input[type=\"tel\"]:not([name*=\"country\"]):not([id*=\"country\"]):not([maxlength=\"3\"])",
        ]))
        .with_options(
            mobile_type_filter(LocateOptions::default()).with_filter(
                ElementFilter::ExcludeNumericAttrBelow {
                    name: "maxlength".into(),
                    threshold: 8,
                },
            ),
        ),
        Intent::QuickMobile => quick_mobile(),
        Intent::WalletOption => Recipe::new(
            [A::role("listitem", Some("Wallet"))].into_iter().collect(),
        )
        .with_options(timeout(3000)),
        Intent::BajajPay => Recipe::new(
            CandidateList::new()
                .push(A::text("label", "Bajaj"))
                .push(A::text("div", "Bajaj Pay"))
                .push(A::text("span", "Bajaj"))
                .push(A::css("input[value*=\"Bajaj\"][type=\"radio\"]"))
                .push(A::css("input[value*=\"bajaj\"][type=\"radio\"]"))
                .push(A::css("[id*=\"bajaj\"]"))
                .push(A::css("[name*=\"bajaj\"]")),
        ),
    }
}

fn mobile_type_filter(options: LocateOptions) -> LocateOptions {
    options.with_filter(ElementFilter::RequireAttrOneOf {
        name: "type".into(),
        values: vec!["tel".into(), "text".into(), "number".into()],
    })
}

/// Mobile field as the quick run looks for it: broader names, no
/// maxlength check.
fn quick_mobile() -> Recipe {
    Recipe::new(css(&[
        "input[type=\"tel\"]:not([name*=\"country\"]):not([id*=\"country\"])",
        "input[name*=\"mobile\"]:not([name*=\"country\"])",
        "input[name*=\"phone\"]:not([name*=\"country\"])",
        "input[name*=\"Mobile\"]:not([name*=\"country\"])",
        "input[name*=\"Phone\"]:not([name*=\"country\"])",
        "input[id*=\"mobile\"]:not([id*=\"country\"])",
        "input[id*=\"phone\"]:not([id*=\"country\"])",
        "input[placeholder*=\"mobile\"]",
        "input[placeholder*=\"Mobile\"]",
        "input[placeholder*=\"Phone\"]",
        "input[maxlength=\"10\"][type=\"tel\"]",
    ]))
    .with_options(mobile_type_filter(LocateOptions::default()))
}

/// First visible seat of the layout, waited on for up to ten seconds.
fn quick_seat() -> Recipe {
    Recipe::new(css(&["[class*=\"avail\"]"])).with_options(timeout(10_000))
}

/// "Select Seat" as the indexed run looks for it.
fn indexed_select_seat() -> Recipe {
    Recipe::new(
        CandidateList::new()
            .push(A::text("button", "Select Seat"))
            .push(A::text("a", "Select Seat"))
            .push(A::css(".select-seat-btn")),
    )
    .with_options(timeout(20_000))
}

/// Continue/proceed buttons after the indexed run's boarding selection.
fn indexed_continue() -> Recipe {
    Recipe::new(
        CandidateList::new()
            .push(A::text("button", "Continue"))
            .push(A::text("button", "Proceed"))
            .push(A::text("button", "Next"))
            .push(A::text("button", "CONTINUE"))
            .push(A::css(".continue-btn"))
            .push(A::css(".proceed-btn"))
            .push(A::css("#continueBtn"))
            .push(A::css("#proceedBtn"))
            .push(A::css("button[type=\"submit\"]"))
            .push(A::text("a", "Continue"))
            .push(A::text("a", "Proceed")),
    )
    .with_options(timeout(3000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_intent_has_candidates() {
        for intent in Intent::ALL {
            assert!(!recipe(*intent).candidates.is_empty(), "{}", intent);
        }
    }

    #[test]
    fn mobile_excludes_short_fields() {
        let mobile = recipe(Intent::Mobile);
        assert!(mobile.options.filters.contains(&ElementFilter::ExcludeNumericAttrBelow {
            name: "maxlength".into(),
            threshold: 8,
        }));
        assert!(!recipe(Intent::QuickMobile)
            .options
            .filters
            .iter()
            .any(|f| matches!(f, ElementFilter::ExcludeNumericAttrBelow { .. })));
    }

    #[test]
    fn has_text_selectors_become_text_anchors() {
        let reset = recipe(Intent::ResetFilter);
        assert_eq!(reset.candidates.0[0].anchor, A::text("button", "Reset"));
        let consent = recipe(Intent::InsuranceConsent);
        assert!(matches!(
            consent.candidates.0[2].anchor,
            A::Nested { .. }
        ));
    }
}
