use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::RecipeError;

macro_rules! intents {
    ($($variant:ident => $name:literal,)+) => {
        /// Logical element a booking step is looking for.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "kebab-case")]
        pub enum Intent {
            $($variant,)+
        }

        impl Intent {
            pub const ALL: &'static [Intent] = &[$(Intent::$variant,)+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Intent::$variant => $name,)+
                }
            }
        }

        impl FromStr for Intent {
            type Err = RecipeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Intent::$variant),)+
                    other => Err(RecipeError::UnknownIntent(other.to_string())),
                }
            }
        }
    };
}

intents! {
    SourceCity => "source-city",
    DestinationCity => "destination-city",
    CitySuggestion => "city-suggestion",
    DatePicker => "date-picker",
    SearchButton => "search-button",
    SelectSeatButton => "select-seat-button",
    IndexedSelectSeat => "indexed-select-seat",
    AcFilter => "ac-filter",
    NonAcFilter => "non-ac-filter",
    SleeperFilter => "sleeper-filter",
    SeaterFilter => "seater-filter",
    OperatorFilter => "operator-filter",
    ResetFilter => "reset-filter",
    BusListing => "bus-listing",
    AvailableSeat => "available-seat",
    QuickSeat => "quick-seat",
    IndexedSeat => "indexed-seat",
    ModalSeatNumber => "modal-seat-number",
    ModalClickable => "modal-clickable",
    BoardingPointDropdown => "boarding-point-dropdown",
    DroppingPointDropdown => "dropping-point-dropdown",
    PointLabel => "point-label",
    ContinueButton => "continue-button",
    IndexedContinue => "indexed-continue",
    ProceedButton => "proceed-button",
    TitleSelect => "title-select",
    FirstName => "first-name",
    LastName => "last-name",
    Age => "age",
    InsuranceYes => "insurance-yes",
    InsuranceConsent => "insurance-consent",
    Email => "email",
    Mobile => "mobile",
    QuickMobile => "quick-mobile",
    WalletOption => "wallet-option",
    BajajPay => "bajaj-pay",
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
