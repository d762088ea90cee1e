use crate::models::Trend;

/// Classify a candidate weight against the most recent known weight.
///
/// `prior` is the weight of the latest dated record that has one, read before
/// the candidate is written. It is not necessarily the record for the
/// previous calendar day, so backdated entries compare against the newest
/// weight on file.
#[must_use]
pub fn compute_trend(candidate: Option<f64>, prior: Option<f64>) -> Trend {
    let Some(weight) = candidate else {
        return Trend::NoWeightProvided;
    };
    let Some(previous) = prior else {
        return Trend::NoTrend;
    };

    if weight > previous {
        Trend::Increasing
    } else if weight < previous {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}
