use crate::models::{Candidate, Method};

/// Score assigned to every affinity candidate when their raw scores are all equal
const FLAT_AFFINITY_SCORE: f64 = 0.5;

/// Candidates sharing one native score scale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScaleGroup {
    Affinity,
    /// Content and content-counter candidates come from the same similarity model
    Content,
    Unscaled,
}

impl From<Method> for ScaleGroup {
    fn from(method: Method) -> Self {
        match method {
            Method::Affinity => ScaleGroup::Affinity,
            Method::Content | Method::ContentCounter => ScaleGroup::Content,
            Method::Unrecognized => ScaleGroup::Unscaled,
        }
    }
}

/// Min-max normalizes raw scores independently within each scale group
///
/// Affinity and content scores are not comparable, so each group is rescaled to
/// [0, 1] on its own. When a group's scores are all identical there is nothing to
/// discriminate: affinity candidates get 0.5, while content candidates keep their
/// raw similarity, which that model already reports on a [0, 1] scale. Candidates
/// of an unrecognized method keep their raw score clamped to [0, 1].
pub fn normalize_scores(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    normalize_group(&mut candidates, ScaleGroup::Affinity);
    normalize_group(&mut candidates, ScaleGroup::Content);

    for candidate in candidates
        .iter_mut()
        .filter(|c| ScaleGroup::from(c.method) == ScaleGroup::Unscaled)
    {
        candidate.normalized_score = Some(candidate.raw_score.clamp(0.0, 1.0));
    }

    candidates
}

fn normalize_group(candidates: &mut [Candidate], group: ScaleGroup) {
    let bounds = candidates
        .iter()
        .filter(|c| ScaleGroup::from(c.method) == group)
        .map(|c| c.raw_score)
        .fold(None, |acc: Option<(f64, f64)>, score| match acc {
            None => Some((score, score)),
            Some((min, max)) => Some((min.min(score), max.max(score))),
        });

    let Some((min, max)) = bounds else {
        return;
    };

    let members = candidates
        .iter_mut()
        .filter(|c| ScaleGroup::from(c.method) == group);

    let mut count = 0usize;
    for candidate in members {
        let normalized = if max > min {
            rescale(candidate.raw_score, min, max)
        } else if group == ScaleGroup::Affinity {
            FLAT_AFFINITY_SCORE
        } else {
            candidate.raw_score
        };
        candidate.normalized_score = Some(normalized.clamp(0.0, 1.0));
        count += 1;
    }

    tracing::debug!(group = ?group, count, min, max, "Normalized scores");
}

/// Maps `raw` from `[min, max]` onto `[0, 1]`; requires `max > min`
///
/// The span of two large finite scores can overflow to infinity, in which case
/// the halved bounds are used instead.
fn rescale(raw: f64, min: f64, max: f64) -> f64 {
    if raw >= max {
        return 1.0;
    }

    let span = max - min;
    if span.is_finite() {
        (raw - min) / span
    } else {
        (raw / 2.0 - min / 2.0) / (max / 2.0 - min / 2.0)
    }
}
