//! Listing samples read off the result page

use action_primitives::{ActionError, AnchorDescriptor, BrowserPort};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::conditions::{classify, BusCategory};
use crate::types::{Evidence, EvidenceType};

/// Characters of listing text kept in evidence.
const EXCERPT_CHARS: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingSample {
    pub index: usize,
    pub category: BusCategory,
    pub excerpt: String,
}

/// Reads and classifies up to `sample` listings matching `listing`.
///
/// A listing whose text cannot be read is left out of the sample.
pub async fn sample_listings(
    port: &dyn BrowserPort,
    listing: &AnchorDescriptor,
    sample: usize,
) -> Result<Vec<ListingSample>, ActionError> {
    let total = port.count(listing).await?;
    let mut samples = Vec::new();
    for index in 0..total.min(sample) {
        let text = match port.text_content(&listing.nth(index)).await {
            Ok(text) => text,
            Err(err) => {
                debug!(index, error = %err, "listing text unavailable");
                continue;
            }
        };
        let excerpt: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
        samples.push(ListingSample {
            index,
            category: classify(&text),
            excerpt: excerpt.chars().take(EXCERPT_CHARS).collect(),
        });
    }
    Ok(samples)
}

/// Number of samples in `category`.
pub fn count_category(samples: &[ListingSample], category: BusCategory) -> usize {
    samples.iter().filter(|s| s.category == category).count()
}

pub fn listing_evidence(expected: BusCategory, samples: &[ListingSample]) -> Evidence {
    Evidence::new(
        EvidenceType::Listing,
        format!("{} listings sampled, expecting {}", samples.len(), expected),
        json!({
            "ac": count_category(samples, BusCategory::Ac),
            "non_ac": count_category(samples, BusCategory::NonAc),
            "unknown": count_category(samples, BusCategory::Unknown),
            "samples": samples,
        }),
    )
}

pub fn url_evidence(url: &str) -> Evidence {
    Evidence::new(EvidenceType::Url, "current url", json!(url))
}
