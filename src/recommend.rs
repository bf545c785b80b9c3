use serde::Serialize;
use std::fmt;

/// Top-1 probability above which only the single best crop is reported.
pub const CONFIDENCE_THRESHOLD: f64 = 0.8;

pub const TOP_N: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCrop {
    pub crop: String,
    pub confidence: f64,
}

/// The `n` most probable classes, most probable first. Ties keep class order.
pub fn rank_top(probabilities: &[f64], classes: &[String], n: usize) -> Vec<RankedCrop> {
    let mut order: Vec<usize> = (0..probabilities.len().min(classes.len())).collect();
    order.sort_by(|&a, &b| probabilities[b].total_cmp(&probabilities[a]));

    order
        .into_iter()
        .take(n)
        .map(|i| RankedCrop {
            crop: classes[i].clone(),
            confidence: probabilities[i],
        })
        .collect()
}

/// What gets shown to the grower.
#[derive(Debug, Clone, PartialEq)]
pub enum Recommendation {
    Single(RankedCrop),
    TopThree(Vec<RankedCrop>),
}

impl Recommendation {
    pub fn from_ranked(mut ranked: Vec<RankedCrop>) -> Self {
        let confident = ranked
            .first()
            .map(|best| best.confidence > CONFIDENCE_THRESHOLD)
            .unwrap_or(false);

        if confident {
            ranked.truncate(1);
            if let Some(best) = ranked.pop() {
                return Recommendation::Single(best);
            }
        }
        Recommendation::TopThree(ranked)
    }

    pub fn crops(&self) -> &[RankedCrop] {
        match self {
            Recommendation::Single(crop) => std::slice::from_ref(crop),
            Recommendation::TopThree(crops) => crops,
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::Single(crop) => write!(
                f,
                "Recommended Crop: {} (Confidence: {:.2}%)",
                crop.crop,
                crop.confidence * 100.0
            ),
            Recommendation::TopThree(crops) => {
                write!(f, "Top 3 Recommended Crops with Confidence Scores:")?;
                for crop in crops {
                    write!(
                        f,
                        "\n  {} - Confidence: {:.2}%",
                        crop.crop,
                        crop.confidence * 100.0
                    )?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_rank_top_orders_descending() {
        let ranked = rank_top(
            &[0.1, 0.5, 0.05, 0.35],
            &classes(&["rice", "maize", "jute", "coffee"]),
            3,
        );
        let names: Vec<_> = ranked.iter().map(|r| r.crop.as_str()).collect();
        assert_eq!(names, vec!["maize", "coffee", "rice"]);
        assert_eq!(ranked[0].confidence, 0.5);
    }

    #[test]
    fn test_rank_top_with_fewer_classes() {
        let ranked = rank_top(&[0.3, 0.7], &classes(&["rice", "maize"]), 3);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].crop, "maize");
    }

    #[test]
    fn test_confident_prediction_reports_single_crop() {
        let ranked = rank_top(&[0.85, 0.10, 0.05], &classes(&["rice", "maize", "jute"]), 3);
        let rec = Recommendation::from_ranked(ranked);
        match &rec {
            Recommendation::Single(crop) => assert_eq!(crop.crop, "rice"),
            other => panic!("Expected single crop, got {:?}", other),
        }
        assert_eq!(
            rec.to_string(),
            "Recommended Crop: rice (Confidence: 85.00%)"
        );
    }

    #[test]
    fn test_uncertain_prediction_reports_top_three() {
        let ranked = rank_top(&[0.5, 0.3, 0.2], &classes(&["rice", "maize", "jute"]), 3);
        let rec = Recommendation::from_ranked(ranked);
        assert_eq!(rec.crops().len(), 3);
        let text = rec.to_string();
        assert!(text.contains("rice - Confidence: 50.00%"));
        assert!(text.contains("maize - Confidence: 30.00%"));
        assert!(text.contains("jute - Confidence: 20.00%"));
    }

    #[test]
    fn test_threshold_is_strict() {
        let ranked = rank_top(&[0.8, 0.15, 0.05], &classes(&["rice", "maize", "jute"]), 3);
        assert!(matches!(
            Recommendation::from_ranked(ranked),
            Recommendation::TopThree(_)
        ));
    }
}
