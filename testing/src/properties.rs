//! proptest strategies for outcomes and exposure groups.

use formulaic_core::variants::UnexpectedError;
use formulaic_core::{ExposureGroups, Outcome, group};
use proptest::prelude::*;
use serde_json::json;
use std::fmt::Debug;

/// Entity-like names.
fn entity_name() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{2,10}"
}

/// Any outcome that does not carry data.
pub fn non_data_outcome<T>() -> BoxedStrategy<Outcome<T>>
where
    T: Clone + Debug + 'static,
{
    prop_oneof![
        Just(Outcome::empty()),
        entity_name().prop_map(|name| Outcome::access_forbidden(name)),
        (entity_name(), any::<Option<u32>>()).prop_map(|(name, id)| {
            Outcome::entity_not_found(name, id.map(|id| json!({ "id": id })))
        }),
        Just(Outcome::missing_permission()),
        "[A-Z][A-Za-z]{3,16}".prop_map(|code| {
            Outcome::UnexpectedError(UnexpectedError::new().with_code(code))
        }),
        (400u16..600).prop_map(|status| Outcome::failed_request(status, None)),
        Just(Outcome::skipped()),
        Just(Outcome::pending()),
        Just(Outcome::never_fetched()),
    ]
    .boxed()
}

/// `Literal` outcomes carrying values from `data`.
pub fn data_outcome<T>(data: impl Strategy<Value = T> + 'static) -> BoxedStrategy<Outcome<T>>
where
    T: Clone + Debug + 'static,
{
    (data, any::<bool>())
        .prop_map(|(value, created)| {
            if created {
                Outcome::created(value)
            } else {
                Outcome::literal(value)
            }
        })
        .boxed()
}

/// Any outcome, with payloads drawn from `data`.
pub fn any_outcome<T>(data: impl Strategy<Value = T> + 'static) -> BoxedStrategy<Outcome<T>>
where
    T: Clone + Debug + 'static,
{
    prop_oneof![data_outcome(data), non_data_outcome()].boxed()
}

/// Any subset of the well-known exposure groups.
pub fn exposure_groups() -> impl Strategy<Value = ExposureGroups> {
    proptest::sample::subsequence(
        vec![
            group::INFO,
            group::DEBUG,
            group::STRUCTURE,
            group::EXPOSE_FORBIDDEN,
            group::EXPOSE_UNEXPECTED_TYPE,
        ],
        0..=5,
    )
    .prop_map(|groups| groups.into_iter().collect())
}
