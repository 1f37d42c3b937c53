use crate::analyzers::types::{AupsValue, DistrictRanking};

/// Orders districts by their latest score, highest first.
///
/// `normalized_score` rescales each score against the top district so the
/// leader reads 100. When no district has a positive score every normalized
/// value is 0.
pub fn rank_districts(latest: &[AupsValue]) -> Vec<DistrictRanking> {
    let mut sorted: Vec<&AupsValue> = latest.iter().collect();
    sorted.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.district_id.cmp(&b.district_id))
    });

    let max_score = sorted.first().map(|v| v.score).unwrap_or(0.0);

    sorted
        .into_iter()
        .enumerate()
        .map(|(i, value)| DistrictRanking {
            rank: i + 1,
            district_id: value.district_id.clone(),
            period: value.period,
            score: value.score,
            normalized_score: if max_score > 0.0 {
                value.score / max_score * 100.0
            } else {
                0.0
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(district_id: &str, score: f64) -> AupsValue {
        AupsValue {
            district_id: district_id.to_string(),
            period: 1,
            score,
        }
    }

    #[test]
    fn test_rank_order_and_normalization() {
        let ranking = rank_districts(&[value("A", 40.0), value("B", 160.0), value("C", 80.0)]);

        let ids: Vec<&str> = ranking.iter().map(|r| r.district_id.as_str()).collect();
        assert_eq!(ids, vec!["B", "C", "A"]);
        assert_eq!(ranking[0].rank, 1);
        assert_eq!(ranking[0].normalized_score, 100.0);
        assert_eq!(ranking[1].normalized_score, 50.0);
        assert_eq!(ranking[2].normalized_score, 25.0);
    }

    #[test]
    fn test_ties_break_by_district_id() {
        let ranking = rank_districts(&[value("Z", 10.0), value("A", 10.0)]);
        assert_eq!(ranking[0].district_id, "A");
    }

    #[test]
    fn test_all_zero_scores() {
        let ranking = rank_districts(&[value("A", 0.0), value("B", 0.0)]);
        assert!(ranking.iter().all(|r| r.normalized_score == 0.0));
    }

    #[test]
    fn test_empty() {
        assert!(rank_districts(&[]).is_empty());
    }
}
