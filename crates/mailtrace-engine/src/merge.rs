use mailtrace_core::ResolutionResult;

/// Merge per-adapter results by rank, where rank 0 is the highest priority.
///
/// Results are folded from the lowest priority to the highest, so on a key
/// collision the higher-priority adapter's record replaces the other one
/// wholesale. Input order does not matter; equal ranks keep input order.
#[must_use]
pub fn merge_by_priority<I>(ranked: I) -> ResolutionResult
where
    I: IntoIterator<Item = (usize, ResolutionResult)>,
{
    let mut ranked: Vec<(usize, ResolutionResult)> = ranked.into_iter().collect();
    ranked.sort_by(|(a, _), (b, _)| b.cmp(a));

    ranked
        .into_iter()
        .fold(ResolutionResult::new(), |mut merged, (_, result)| {
            merged.overlay(result);
            merged
        })
}
