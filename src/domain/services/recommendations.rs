use crate::domain::entities::{
    GroupCount, PerformanceMetrics, Recommendation, RecommendationKind, RecommendationPriority,
};

const MIN_SATISFACTION: f64 = 3.5;
/// Minutes
const MAX_RESPONSE_TIME: f64 = 60.0;
/// Percent
const MIN_RESOLUTION_RATE: f64 = 70.0;
const MIN_TICKETS_FOR_INSIGHTS: i64 = 10;

/// Resolved or closed tickets as a percentage of all tickets.
pub fn resolution_rate(total: i64, resolved: i64) -> f64 {
    if total > 0 {
        resolved as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Turn agent performance figures into tuning advice.
///
/// `metrics.resolution_rate` is expected unrounded.
pub fn build_recommendations(
    metrics: &PerformanceMetrics,
    unresolved_categories: &[GroupCount],
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if metrics.avg_satisfaction < MIN_SATISFACTION {
        recommendations.push(Recommendation {
            kind: RecommendationKind::Satisfaction,
            priority: RecommendationPriority::High,
            title: "Improve Customer Satisfaction".to_string(),
            description: "Your average satisfaction score is below 3.5. Consider reviewing recent conversations and adding more training data.".to_string(),
            action: "Upload training data for common issues".to_string(),
        });
    }

    if metrics.avg_response_time > MAX_RESPONSE_TIME {
        recommendations.push(Recommendation {
            kind: RecommendationKind::ResponseTime,
            priority: RecommendationPriority::Medium,
            title: "Reduce Response Time".to_string(),
            description: "Average response time is above 1 minute. Optimize your agent configuration or add more specific training.".to_string(),
            action: "Review agent settings and training data".to_string(),
        });
    }

    if metrics.resolution_rate < MIN_RESOLUTION_RATE {
        recommendations.push(Recommendation {
            kind: RecommendationKind::ResolutionRate,
            priority: RecommendationPriority::High,
            title: "Improve Resolution Rate".to_string(),
            description: format!(
                "Current resolution rate is {:.1}%. Add training data for common unresolved issues.",
                metrics.resolution_rate
            ),
            action: "Focus on training for top unresolved categories".to_string(),
        });
    }

    if !unresolved_categories.is_empty() {
        let top: Vec<&str> = unresolved_categories
            .iter()
            .take(3)
            .map(|c| c.key.as_deref().unwrap_or("Uncategorized"))
            .collect();
        recommendations.push(Recommendation {
            kind: RecommendationKind::Training,
            priority: RecommendationPriority::Medium,
            title: "Add Training for Common Issues".to_string(),
            description: format!("Top unresolved categories: {}", top.join(", ")),
            action: "Create training data for these categories".to_string(),
        });
    }

    if metrics.total_tickets < MIN_TICKETS_FOR_INSIGHTS {
        recommendations.push(Recommendation {
            kind: RecommendationKind::Data,
            priority: RecommendationPriority::Low,
            title: "Insufficient Data".to_string(),
            description: "You need more interaction data to get better insights. Promote your agent to get more conversations.".to_string(),
            action: "Increase agent visibility and usage".to_string(),
        });
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn healthy() -> PerformanceMetrics {
        PerformanceMetrics {
            total_tickets: 50,
            avg_response_time: 5.0,
            avg_resolution_time: 30.0,
            avg_satisfaction: 4.6,
            total_interactions: 200,
            resolved_tickets: 45,
            resolution_rate: 90.0,
        }
    }

    #[test]
    fn test_healthy_agent_gets_no_advice() {
        assert!(build_recommendations(&healthy(), &[]).is_empty());
    }

    #[test]
    fn test_new_agent_triggers_data_satisfaction_and_resolution() {
        let kinds: Vec<_> = build_recommendations(&PerformanceMetrics::default(), &[])
            .into_iter()
            .map(|r| r.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                RecommendationKind::Satisfaction,
                RecommendationKind::ResolutionRate,
                RecommendationKind::Data,
            ]
        );
    }

    #[test]
    fn test_slow_responses_are_flagged() {
        let mut metrics = healthy();
        metrics.avg_response_time = 61.0;
        let recs = build_recommendations(&metrics, &[]);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].kind, RecommendationKind::ResponseTime);
        assert_eq!(recs[0].priority, RecommendationPriority::Medium);
    }

    #[test]
    fn test_unresolved_categories_name_top_three() {
        let categories: Vec<GroupCount> = ["Billing", "Shipping", "Returns", "Other"]
            .iter()
            .map(|c| GroupCount {
                key: Some(c.to_string()),
                count: 2,
            })
            .collect();
        let recs = build_recommendations(&healthy(), &categories);
        assert_eq!(
            recs[0].description,
            "Top unresolved categories: Billing, Shipping, Returns"
        );
    }

    #[test]
    fn test_resolution_rate_and_rounding() {
        assert_eq!(resolution_rate(0, 0), 0.0);
        assert_eq!(round2(resolution_rate(3, 2)), 66.67);
    }
}
