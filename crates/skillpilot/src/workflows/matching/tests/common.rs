use std::sync::Arc;

use crate::workflows::matching::{MatchNotifier, MatchPair, RenderedPair};
use crate::workflows::portal::testing::SpyGateway;

pub(super) fn pair(student: &str, opportunity: &str) -> MatchPair {
    MatchPair::new(student, opportunity)
}

pub(super) fn three_pairs() -> Vec<MatchPair> {
    vec![
        pair("s-100", "opp-1"),
        pair("s-200", "opp-1"),
        pair("s-300", "opp-2"),
    ]
}

pub(super) fn loaded_notifier(
    pairs: &[MatchPair],
) -> (Arc<SpyGateway>, MatchNotifier<SpyGateway>) {
    let gateway = SpyGateway::new();
    let notifier = MatchNotifier::new(gateway.clone());
    notifier.load(pairs.iter().cloned().map(RenderedPair::from));
    (gateway, notifier)
}
