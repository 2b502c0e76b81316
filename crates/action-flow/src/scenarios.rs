//! EaseMyTrip booking runs expressed as flows.
//!
//! Three variants share the search setup (landing page, cities, date,
//! search) and differ in what follows:
//! - `full`: filters with AC / Non-AC checks, seat, points, passenger, payment
//! - `quick`: first available seat, points, passenger
//! - `indexed`: seat by position or modal number, dropdown points, continue

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use action_gate::{BusCategory, Condition, ExpectSpec};
use action_locator::{ActPlan, ElementAction, Verification};
use action_primitives::{ScrollTarget, SelectMethod, WaitTier};
use busflow_recipes::Intent;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::pacing::{Pacing, PacingProfile};
use crate::types::{ActionType, Flow, FlowNode};

pub const DEFAULT_BASE_URL: &str = "https://www.easemytrip.com/bus/";
const LANDING_PATTERN: &str = r".*easemytrip\.com/bus/.*";
const LISTING_PATTERN: &str = r".*easemytrip\.com/home/list.*";
const LISTING_TIMEOUT_MS: u64 = 60_000;
/// Furthest travel date a booking may ask for, in days from today.
pub const MAX_DAYS_AHEAD: u64 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    #[default]
    Full,
    Quick,
    Indexed,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Full, Variant::Quick, Variant::Indexed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Full => "full",
            Variant::Quick => "quick",
            Variant::Indexed => "indexed",
        }
    }

    /// Pacing the variant was tuned with.
    pub fn default_pacing(&self) -> Pacing {
        match self {
            Variant::Full => Pacing::Fast,
            Variant::Quick | Variant::Indexed => Pacing::Slow,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "full" => Ok(Variant::Full),
            "quick" => Ok(Variant::Quick),
            "indexed" => Ok(Variant::Indexed),
            other => Err(format!(
                "unknown variant '{}', expected full, quick or indexed",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Passenger {
    pub title: String,
    pub first_name: String,
    pub last_name: String,
    pub age: String,
    pub email: String,
    pub mobile: String,
}

impl Default for Passenger {
    fn default() -> Self {
        Self {
            title: "Mr".into(),
            first_name: "test".into(),
            last_name: "test".into(),
            age: "25".into(),
            email: "cs@gmail.com".into(),
            mobile: "8445121366".into(),
        }
    }
}

impl Passenger {
    /// Accepted field contents after typing: the whole number or its
    /// first six digits.
    fn mobile_prefixes(&self) -> Vec<String> {
        let mut accepted = vec![self.mobile.clone()];
        let prefix: String = self.mobile.chars().take(6).collect();
        if prefix != self.mobile {
            accepted.push(prefix);
        }
        accepted
    }
}

/// Route and traveller for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Booking {
    pub base_url: String,
    pub from: String,
    pub to: String,
    pub days_ahead: u64,
    pub passenger: Passenger,
}

impl Default for Booking {
    fn default() -> Self {
        Self::for_variant(Variant::Full)
    }
}

impl Booking {
    /// Route each variant runs by default.
    pub fn for_variant(variant: Variant) -> Self {
        let (from, to, days_ahead) = match variant {
            Variant::Full => ("Kolkata", "Ranchi", 5),
            Variant::Quick => ("Delhi", "Jaipur", 5),
            Variant::Indexed => ("Delhi", "Jaipur", 7),
        };
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            from: from.into(),
            to: to.into(),
            days_ahead,
            passenger: Passenger::default(),
        }
    }

    /// `days_ahead` past [`MAX_DAYS_AHEAD`] is capped.
    pub fn travel_date(&self, today: NaiveDate) -> NaiveDate {
        let days = self.days_ahead.min(MAX_DAYS_AHEAD);
        if days < self.days_ahead {
            warn!(days_ahead = self.days_ahead, max = MAX_DAYS_AHEAD, "travel date capped");
        }
        today
            .checked_add_days(Days::new(days))
            .unwrap_or(NaiveDate::MAX)
    }
}

/// Build the flow of `variant` for a run starting on `today`.
pub fn build_flow(variant: Variant, booking: &Booking, pacing: Pacing, today: NaiveDate) -> Flow {
    let profile = pacing.profile();
    let date = booking.travel_date(today);
    let mut sections = vec![search_section(variant, booking, &profile, date)];
    match variant {
        Variant::Full => {
            sections.push(filter_section(&profile));
            sections.push(full_seat_section(&profile));
            sections.push(points_section(&profile));
            sections.push(passenger_section(&booking.passenger, &profile, Intent::Mobile));
            sections.push(proceed_section(&profile));
            sections.push(payment_section(&profile));
        }
        Variant::Quick => {
            sections.push(quick_seat_section(&profile));
            sections.push(points_section(&profile));
            sections.push(passenger_section(
                &booking.passenger,
                &profile,
                Intent::QuickMobile,
            ));
            sections.push(proceed_section(&profile));
        }
        Variant::Indexed => {
            sections.push(indexed_seat_section(&profile));
            sections.push(dropdown_points_section(&profile));
        }
    }

    Flow::new(
        format!("easemytrip-{}", variant),
        format!("EaseMyTrip bus booking ({})", variant),
        FlowNode::sequence("booking", sections),
    )
    .with_description(format!(
        "{} to {} on {}, {} pacing",
        booking.from, booking.to, date, pacing
    ))
    .with_metadata("variant", serde_json::json!(variant))
    .with_metadata("pacing", serde_json::json!(pacing))
    .with_metadata("travel_date", serde_json::json!(date.to_string()))
}

fn locate(intent: Intent, act: ActPlan) -> ActionType {
    ActionType::Locate {
        intent,
        act,
        candidates: None,
        options: None,
        required: false,
    }
}

fn locate_required(intent: Intent, act: ActPlan) -> ActionType {
    ActionType::Locate {
        intent,
        act,
        candidates: None,
        options: None,
        required: true,
    }
}

fn pause(id: &str, ms: u64) -> FlowNode {
    FlowNode::action(id, ActionType::Pause { ms })
}

fn fill(value: &str) -> ActPlan {
    ActPlan::new(ElementAction::Fill {
        value: value.to_string(),
    })
}

fn search_section(
    variant: Variant,
    booking: &Booking,
    profile: &PacingProfile,
    date: NaiveDate,
) -> FlowNode {
    FlowNode::sequence(
        "search",
        vec![
            FlowNode::required(
                "open-search",
                ActionType::Navigate {
                    url: booking.base_url.clone(),
                    wait_tier: WaitTier::DomReady,
                },
            ),
            FlowNode::required(
                "check-landing",
                ActionType::ExpectUrl {
                    pattern: LANDING_PATTERN.into(),
                },
            ),
            pause("settle-landing", profile.landing_ms),
            FlowNode::required(
                "source-city",
                ActionType::PickCity {
                    input: Intent::SourceCity,
                    city: booking.from.clone(),
                },
            ),
            pause("settle-source", profile.city_ms),
            FlowNode::required(
                "destination-city",
                ActionType::PickCity {
                    input: Intent::DestinationCity,
                    city: booking.to.clone(),
                },
            ),
            pause("settle-destination", profile.city_ms),
            FlowNode::required(
                "travel-date",
                ActionType::PickDate {
                    date,
                    navigate_months: variant == Variant::Indexed,
                },
            ),
            pause("settle-date", profile.date_ms),
            FlowNode::required(
                "search",
                locate_required(Intent::SearchButton, ActPlan::click(false)),
            ),
            FlowNode::required(
                "wait-listing",
                ActionType::WaitForUrl {
                    pattern: LISTING_PATTERN.into(),
                    timeout_ms: LISTING_TIMEOUT_MS,
                },
            ),
            pause("settle-listing", profile.results_ms),
        ],
    )
}

fn verify_category(id: &str, expected: BusCategory) -> FlowNode {
    FlowNode::action(
        id,
        ActionType::Verify {
            expect: ExpectSpec::new().with_all(Condition::listing(expected)),
        },
    )
}

fn filter_section(profile: &PacingProfile) -> FlowNode {
    let mut steps = Vec::new();
    let filters = [
        ("ac", Intent::AcFilter, Some(BusCategory::Ac)),
        ("non-ac", Intent::NonAcFilter, Some(BusCategory::NonAc)),
        ("sleeper", Intent::SleeperFilter, None),
        ("seater", Intent::SeaterFilter, None),
        ("operator", Intent::OperatorFilter, None),
    ];
    for (name, intent, check) in filters {
        steps.push(FlowNode::action(
            &format!("filter-{}", name),
            locate(intent, ActPlan::click(true)),
        ));
        steps.push(pause(&format!("settle-filter-{}", name), profile.filter_ms));
        if let Some(expected) = check {
            steps.push(verify_category(&format!("verify-{}", name), expected));
        }
        steps.push(FlowNode::action(
            &format!("reset-after-{}", name),
            locate(Intent::ResetFilter, ActPlan::click(true)),
        ));
        steps.push(pause(&format!("settle-reset-{}", name), profile.filter_ms));
    }
    FlowNode::sequence("filters", steps)
}

fn open_seat_layout(intent: Intent) -> FlowNode {
    FlowNode::required(
        "open-seat-layout",
        locate_required(intent, ActPlan::click(false)),
    )
}

fn full_seat_section(profile: &PacingProfile) -> FlowNode {
    FlowNode::sequence(
        "seat",
        vec![
            open_seat_layout(Intent::SelectSeatButton),
            pause("settle-seat-layout", profile.seat_layout_ms),
            FlowNode::action(
                "pick-seat",
                locate(
                    Intent::AvailableSeat,
                    ActPlan::click(true)
                        .scroll_first()
                        .settle(Duration::from_millis(1500))
                        .verify(Verification::ClassChanged),
                ),
            ),
        ],
    )
}

fn quick_seat_section(profile: &PacingProfile) -> FlowNode {
    FlowNode::sequence(
        "seat",
        vec![
            open_seat_layout(Intent::SelectSeatButton),
            pause("settle-seat-layout", profile.seat_layout_ms),
            FlowNode::action(
                "pick-seat",
                locate(Intent::QuickSeat, ActPlan::click(false)),
            ),
        ],
    )
}

fn points_section(profile: &PacingProfile) -> FlowNode {
    FlowNode::sequence(
        "points",
        vec![
            pause("settle-points", profile.field_ms),
            FlowNode::action(
                "boarding-dropping",
                ActionType::ClickLabels {
                    intent: Intent::PointLabel,
                    count: 2,
                    pause_ms: profile.label_ms,
                },
            ),
            FlowNode::action(
                "continue",
                locate(Intent::ContinueButton, ActPlan::click(true)),
            ),
            pause("settle-passenger-page", profile.page_load_ms),
            FlowNode::action(
                "wait-passenger-page",
                ActionType::WaitForLoad {
                    tier: WaitTier::Idle,
                    timeout_ms: 30_000,
                },
            ),
        ],
    )
}

fn passenger_section(
    passenger: &Passenger,
    profile: &PacingProfile,
    mobile: Intent,
) -> FlowNode {
    let type_mobile = ActPlan::new(ElementAction::Type {
        text: passenger.mobile.clone(),
        delay_ms: 50,
        clear: true,
    })
    .verify(Verification::ValueContains {
        any_of: passenger.mobile_prefixes(),
    });
    let mobile_step = locate(mobile, type_mobile);

    FlowNode::sequence(
        "passenger",
        vec![
            pause("settle-form", profile.field_ms),
            FlowNode::action(
                "title",
                locate(
                    Intent::TitleSelect,
                    ActPlan::new(ElementAction::Select {
                        method: SelectMethod::Text,
                        item: passenger.title.clone(),
                    }),
                ),
            ),
            FlowNode::action(
                "first-name",
                locate(Intent::FirstName, fill(&passenger.first_name)),
            ),
            FlowNode::action(
                "last-name",
                locate(Intent::LastName, fill(&passenger.last_name)),
            ),
            FlowNode::action("age", locate(Intent::Age, fill(&passenger.age))),
            pause("settle-details", profile.field_ms),
            FlowNode::action(
                "insurance",
                locate(Intent::InsuranceYes, ActPlan::click(true)),
            ),
            FlowNode::action(
                "insurance-consent",
                locate(Intent::InsuranceConsent, ActPlan::new(ElementAction::Check)),
            ),
            FlowNode::action("email", locate(Intent::Email, fill(&passenger.email))),
            pause("settle-email", profile.field_ms),
            FlowNode::action("mobile", mobile_step),
        ],
    )
}

fn proceed_section(profile: &PacingProfile) -> FlowNode {
    FlowNode::sequence(
        "proceed",
        vec![
            FlowNode::action(
                "scroll-to-proceed",
                ActionType::ScrollPage {
                    target: ScrollTarget::Bottom,
                },
            ),
            pause("settle-scroll", profile.field_ms),
            FlowNode::action(
                "proceed",
                locate(Intent::ProceedButton, ActPlan::click(true).scroll_first()),
            ),
            pause("settle-payment-page", profile.page_load_ms),
            FlowNode::action(
                "wait-payment-page",
                ActionType::WaitForLoad {
                    tier: WaitTier::DomReady,
                    timeout_ms: 30_000,
                },
            ),
        ],
    )
}

fn payment_section(profile: &PacingProfile) -> FlowNode {
    FlowNode::sequence(
        "payment",
        vec![
            pause("settle-payment-options", profile.page_load_ms),
            FlowNode::action(
                "scroll-top",
                ActionType::ScrollPage {
                    target: ScrollTarget::Top,
                },
            ),
            FlowNode::action(
                "scroll-to-options",
                ActionType::ScrollPage {
                    target: ScrollTarget::Pixels(400),
                },
            ),
            FlowNode::action(
                "payment-screenshot",
                ActionType::Screenshot {
                    name: "payment-options.png".into(),
                    full_page: false,
                },
            ),
            FlowNode::action(
                "wallet",
                locate(Intent::WalletOption, ActPlan::click(true)),
            ),
            pause("settle-wallet", profile.label_ms),
            FlowNode::action("bajaj-pay", locate(Intent::BajajPay, ActPlan::click(true))),
        ],
    )
}

fn indexed_seat_section(profile: &PacingProfile) -> FlowNode {
    FlowNode::sequence(
        "seat",
        vec![
            open_seat_layout(Intent::IndexedSelectSeat),
            pause("settle-seat-layout", profile.page_load_ms),
            FlowNode::action(
                "pick-seat",
                ActionType::LocateFirstOf {
                    intents: vec![
                        Intent::IndexedSeat,
                        Intent::ModalSeatNumber,
                        Intent::ModalClickable,
                    ],
                    act: ActPlan::click(true),
                },
            ),
            pause("settle-seat", profile.seat_layout_ms),
        ],
    )
}

fn dropdown_points_section(profile: &PacingProfile) -> FlowNode {
    FlowNode::sequence(
        "points",
        vec![
            FlowNode::action(
                "boarding-point",
                ActionType::SelectIfPresent {
                    intent: Intent::BoardingPointDropdown,
                    index: 1,
                    settle_ms: 1000,
                },
            ),
            FlowNode::action(
                "dropping-point",
                ActionType::SelectIfPresent {
                    intent: Intent::DroppingPointDropdown,
                    index: 1,
                    settle_ms: 1000,
                },
            ),
            FlowNode::action(
                "continue",
                locate(Intent::IndexedContinue, ActPlan::click(true)),
            ),
            pause("settle-continue", profile.date_ms),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FailureStrategy;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 30).unwrap()
    }

    fn step_ids(node: &FlowNode, out: &mut Vec<String>) {
        match node {
            FlowNode::Sequence { steps, .. } => steps.iter().for_each(|s| step_ids(s, out)),
            FlowNode::Action { id, .. } => out.push(id.to_string()),
        }
    }

    fn ids(flow: &Flow) -> Vec<String> {
        let mut out = Vec::new();
        step_ids(&flow.root, &mut out);
        out
    }

    #[test]
    fn variants_parse_case_insensitively() {
        assert_eq!("Quick".parse::<Variant>().unwrap(), Variant::Quick);
        assert!("fastest".parse::<Variant>().is_err());
        assert_eq!(Variant::Indexed.to_string(), "indexed");
    }

    #[test]
    fn bookings_follow_variant_routes() {
        let full = Booking::for_variant(Variant::Full);
        assert_eq!((full.from.as_str(), full.to.as_str()), ("Kolkata", "Ranchi"));
        let indexed = Booking::for_variant(Variant::Indexed);
        assert_eq!(
            indexed.travel_date(today()),
            NaiveDate::from_ymd_opt(2024, 2, 6).unwrap()
        );
    }

    #[test]
    fn far_travel_dates_are_capped() {
        let booking = Booking {
            days_ahead: u64::MAX,
            ..Booking::for_variant(Variant::Quick)
        };
        assert_eq!(
            booking.travel_date(today()),
            today() + Days::new(MAX_DAYS_AHEAD)
        );
    }

    #[test]
    fn full_flow_checks_both_categories_and_pays() {
        let flow = build_flow(
            Variant::Full,
            &Booking::default(),
            Pacing::Fast,
            today(),
        );
        let ids = ids(&flow);
        for id in ["verify-ac", "verify-non-ac", "mobile", "payment-screenshot", "bajaj-pay"] {
            assert!(ids.iter().any(|s| s == id), "missing {}", id);
        }
        let ac = ids.iter().position(|s| s == "filter-ac").unwrap();
        let verify = ids.iter().position(|s| s == "verify-ac").unwrap();
        let reset = ids.iter().position(|s| s == "reset-after-ac").unwrap();
        assert!(ac < verify && verify < reset);
    }

    #[test]
    fn quick_flow_stops_before_payment() {
        let flow = build_flow(
            Variant::Quick,
            &Booking::for_variant(Variant::Quick),
            Pacing::Slow,
            today(),
        );
        let ids = ids(&flow);
        assert_eq!(ids.last().map(String::as_str), Some("wait-payment-page"));
        assert!(!ids.iter().any(|s| s.starts_with("filter-")));
        assert!(!ids.iter().any(|s| s == "wallet"));
    }

    #[test]
    fn only_indexed_pages_the_calendar() {
        for variant in Variant::ALL {
            let flow = build_flow(variant, &Booking::for_variant(variant), Pacing::Fast, today());
            let json = serde_json::to_value(&flow).unwrap();
            let text = json.to_string();
            let navigates = text.contains("\"navigate_months\":true");
            assert_eq!(navigates, variant == Variant::Indexed, "{}", variant);
        }
    }

    #[test]
    fn search_steps_are_required() {
        let flow = build_flow(Variant::Full, &Booking::default(), Pacing::Fast, today());
        let FlowNode::Sequence { steps, .. } = &flow.root else {
            panic!("root is a sequence");
        };
        let FlowNode::Sequence { steps: search, .. } = &steps[0] else {
            panic!("search is a sequence");
        };
        let required: Vec<_> = search
            .iter()
            .filter_map(|s| match s {
                FlowNode::Action {
                    id,
                    failure_strategy: Some(FailureStrategy::Abort),
                    ..
                } => Some(id.to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(
            required,
            vec![
                "open-search",
                "check-landing",
                "source-city",
                "destination-city",
                "travel-date",
                "search",
                "wait-listing"
            ]
        );
    }

    #[test]
    fn mobile_accepts_full_number_or_prefix() {
        assert_eq!(
            Passenger::default().mobile_prefixes(),
            vec!["8445121366".to_string(), "844512".to_string()]
        );
    }
}
