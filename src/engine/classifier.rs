//! Reservation-type classification.
//!
//! Total function: every record resolves to exactly one type, first matching
//! rule wins. Walk-in-only venues are excluded from calibration entirely,
//! since "difficulty" has no meaning for a venue that does not take bookings.

use crate::engine::tuning::ClassifierRules;
use crate::record::RestaurantRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationType {
    LikelyReservable,
    MaybeReservable,
    WalkInOnly,
}

pub fn classify(record: &RestaurantRecord, rules: &ClassifierRules) -> ReservationType {
    if record.has_booking_link {
        return ReservationType::LikelyReservable;
    }

    let price = record.price_tier();
    let reviews = record.review_count;

    // Expensive and well-reviewed implies a reservation culture even when no
    // link was captured.
    if price.is_some_and(|p| p >= rules.linkless_price_tier) && reviews >= rules.linkless_review_count
    {
        return ReservationType::LikelyReservable;
    }

    if price == Some(rules.moderate_price_tier) && reviews >= rules.moderate_review_count {
        return ReservationType::MaybeReservable;
    }

    let quick_service = {
        let text = record.search_text();
        rules.walk_in_keywords.iter().any(|kw| text.contains(kw))
    };
    let cheap_or_unknown = price.is_none_or(|p| p <= 2);
    if quick_service && cheap_or_unknown && reviews < rules.walk_in_review_ceiling {
        return ReservationType::WalkInOnly;
    }

    ReservationType::MaybeReservable
}
