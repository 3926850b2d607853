//! Property-based tests for the filter engine.
//!
//! Streams of chip variants are generated in detection order and run
//! through `OrdinalCounter`, `Claims` and `evaluate` the way a scan does.

use d2xx_core::filter::{evaluate, Claims, Decision, Filter, OrdinalCounter};
use d2xx_core::DevType;
use proptest::prelude::*;

fn dev_type_strategy() -> impl Strategy<Value = DevType> {
    prop_oneof![
        Just(DevType::Ft232H),
        Just(DevType::Ft232R),
        Just(DevType::Ft2232H),
        Just(DevType::FtXSeries),
    ]
}

fn filter_strategy() -> impl Strategy<Value = Filter> {
    (prop::option::of(dev_type_strategy()), -3i64..4).prop_map(|(t, idx)| {
        let base = match t {
            Some(t) => Filter::only(t),
            None => Filter::any(),
        };
        base.raw_index(idx)
    })
}

/// Decisions for a whole stream
fn decisions(stream: &[DevType], filters: &[Filter]) -> Vec<Decision> {
    let mut counter = OrdinalCounter::new();
    let mut claims = Claims::new();
    stream
        .iter()
        .map(|&t| {
            let ordinal = counter.next(t);
            evaluate(filters, &mut claims, t, ordinal)
        })
        .collect()
}

fn decide(stream: &[DevType], filters: &[Filter]) -> Vec<bool> {
    decisions(stream, filters)
        .into_iter()
        .map(Decision::is_accept)
        .collect()
}

proptest! {
    /// No filters means every device is kept.
    #[test]
    fn empty_filter_list_accepts_everything(
        stream in prop::collection::vec(dev_type_strategy(), 0..16),
    ) {
        prop_assert!(decide(&stream, &[]).into_iter().all(|kept| kept));
    }

    /// An ordinal filter for variant V keeps a device iff exactly k earlier
    /// devices of V were seen, independently of other variants.
    #[test]
    fn ordinal_filter_keeps_only_kth_of_variant(
        stream in prop::collection::vec(dev_type_strategy(), 0..16),
        wanted in dev_type_strategy(),
        k in 0usize..4,
    ) {
        let decisions = decide(&stream, &[Filter::only(wanted).index(k)]);
        for (i, (&t, kept)) in stream.iter().zip(decisions).enumerate() {
            let earlier = stream[..i].iter().filter(|&&s| s == wanted).count();
            prop_assert_eq!(kept, t == wanted && earlier == k);
        }
    }

    /// An any-index filter for variant V keeps only the first device of V.
    #[test]
    fn any_index_filter_keeps_first_of_variant(
        stream in prop::collection::vec(dev_type_strategy(), 0..16),
        wanted in dev_type_strategy(),
    ) {
        let decisions = decide(&stream, &[Filter::only(wanted).raw_index(-1)]);
        let first = stream.iter().position(|&t| t == wanted);
        for (i, kept) in decisions.into_iter().enumerate() {
            prop_assert_eq!(kept, Some(i) == first);
        }
    }

    /// No filter position is credited with more than one accepted device.
    #[test]
    fn each_filter_accepts_at_most_once(
        stream in prop::collection::vec(dev_type_strategy(), 0..16),
        filters in prop::collection::vec(filter_strategy(), 1..4),
    ) {
        let mut credited = vec![0usize; filters.len()];
        for decision in decisions(&stream, &filters) {
            if let Decision::Accept { filter } = decision {
                prop_assert!(filter.is_some());
                if let Some(pos) = filter {
                    credited[pos] += 1;
                }
            }
        }
        prop_assert!(credited.iter().all(|&n| n <= 1));
    }

    /// Re-running the same stream yields the same decisions.
    #[test]
    fn decisions_are_repeatable(
        stream in prop::collection::vec(dev_type_strategy(), 0..16),
        filters in prop::collection::vec(filter_strategy(), 0..4),
    ) {
        prop_assert_eq!(decide(&stream, &filters), decide(&stream, &filters));
    }
}
