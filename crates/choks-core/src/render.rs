//! Result card rendering
//!
//! `ResultCard` is the display model of one successful analysis. It is a
//! pure function of the payload; `to_html` turns it into the markup placed
//! in the results container. Every backend string is escaped.

use std::fmt::Write;

use crate::types::AnalysisResult;
use crate::validation::business_type_label;

/// `data-action` value of the save button.
pub const ACTION_SAVE: &str = "save";
/// `data-action` value of the new-analysis button.
pub const ACTION_NEW_ANALYSIS: &str = "new-analysis";

pub const SAVED_BANNER_MESSAGE: &str = "Analysis saved successfully!";
pub const SAVE_FAILED_BANNER_MESSAGE: &str = "Could not save this analysis in your browser";

/// Transient banner shown above the results content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Success,
    Error,
}

impl BannerKind {
    pub fn class_name(self) -> &'static str {
        match self {
            BannerKind::Success => "success-banner",
            BannerKind::Error => "error-banner",
        }
    }

    fn role(self) -> &'static str {
        match self {
            BannerKind::Success => "status",
            BannerKind::Error => "alert",
        }
    }
}

/// Badge color tier derived from the raw confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    pub fn from_score(score: f64) -> Self {
        if score >= 70.0 {
            ConfidenceTier::High
        } else if score >= 50.0 {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    pub fn class_name(self) -> &'static str {
        match self {
            ConfidenceTier::High => "confidence-high",
            ConfidenceTier::Medium => "confidence-medium",
            ConfidenceTier::Low => "confidence-low",
        }
    }
}

/// Round half up, like `Math.round`.
pub fn round_display(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricTile {
    pub label: &'static str,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultCard {
    pub analysis_id: Option<String>,
    /// "Food Truck in Downtown Plaza" when the request context is known
    pub subtitle: Option<String>,
    pub confidence: i64,
    pub tier: ConfidenceTier,
    pub metrics: [MetricTile; 4],
    pub reasoning: String,
    pub revenue_potential: String,
    pub optimal_hours: String,
    pub category_gaps: Vec<String>,
    pub nearby_attractions: Vec<String>,
    pub risk_factors: Vec<String>,
    pub setup_requirements: Vec<String>,
    pub recommended_duration: String,
}

impl ResultCard {
    pub fn new(result: &AnalysisResult) -> Self {
        let rec = &result.recommendation;
        let insights = &rec.insights;

        Self {
            analysis_id: result.analysis_id.clone(),
            subtitle: None,
            confidence: round_display(rec.confidence_score),
            tier: ConfidenceTier::from_score(rec.confidence_score),
            metrics: [
                MetricTile {
                    label: "Foot Traffic Score",
                    value: round_display(insights.foot_traffic_score),
                },
                // Passed through literally; the backend has not said whether
                // density should be inverted for display.
                MetricTile {
                    label: "Market Opportunity",
                    value: round_display(insights.competition_density),
                },
                MetricTile {
                    label: "Demographic Match",
                    value: round_display(insights.demographic_match),
                },
                MetricTile {
                    label: "Market Gaps",
                    value: insights.category_gaps.len() as i64,
                },
            ],
            reasoning: rec.reasoning.clone(),
            revenue_potential: rec.estimated_revenue_potential.clone(),
            optimal_hours: insights.optimal_hours.join(", "),
            category_gaps: insights.category_gaps.clone(),
            nearby_attractions: insights.nearby_attractions.clone(),
            risk_factors: insights.risk_factors.clone(),
            setup_requirements: rec.setup_requirements.clone(),
            recommended_duration: rec.recommended_duration.clone(),
        }
    }

    pub fn with_subject(mut self, location: &str, business_type: &str) -> Self {
        let location = location.trim();
        let business = business_type_label(business_type);
        self.subtitle = match (business.is_empty(), location.is_empty()) {
            (true, true) => None,
            (false, true) => Some(business),
            (true, false) => Some(location.to_string()),
            (false, false) => Some(format!("{} in {}", business, location)),
        };
        self
    }

    pub fn badge_text(&self) -> String {
        format!("{}% Confidence", self.confidence)
    }

    pub fn to_html(&self) -> String {
        let mut html = String::with_capacity(2048);
        html.push_str(r#"<div class="result-card">"#);

        html.push_str(r#"<div class="result-header"><div><h3>Location Analysis Results</h3>"#);
        if let Some(subtitle) = &self.subtitle {
            let _ = write!(html, r#"<p class="result-subtitle">{}</p>"#, escape_html(subtitle));
        }
        let _ = write!(
            html,
            r#"</div><span class="confidence-badge {}">{}</span></div>"#,
            self.tier.class_name(),
            self.badge_text()
        );

        html.push_str(r#"<div class="metrics-grid">"#);
        for tile in &self.metrics {
            let _ = write!(
                html,
                r#"<div class="metric-tile"><span class="metric-value">{}</span><span class="metric-label">{}</span></div>"#,
                tile.value, tile.label
            );
        }
        html.push_str("</div>");

        push_text_section(&mut html, "reasoning", "Analysis", &self.reasoning);
        push_text_section(
            &mut html,
            "revenue-potential",
            "Revenue Potential",
            &self.revenue_potential,
        );
        push_text_section(&mut html, "optimal-hours", "Optimal Hours", &self.optimal_hours);

        if !self.category_gaps.is_empty() {
            push_tag_section(&mut html, "category-gaps", "Market Gaps", &self.category_gaps);
        }
        if !self.nearby_attractions.is_empty() {
            push_tag_section(
                &mut html,
                "nearby-attractions",
                "Nearby Attractions",
                &self.nearby_attractions,
            );
        }
        if !self.risk_factors.is_empty() {
            push_list_section(&mut html, "risk-factors", "Risk Factors", &self.risk_factors);
        }

        push_list_section(
            &mut html,
            "setup-requirements",
            "Setup Requirements",
            &self.setup_requirements,
        );
        push_text_section(
            &mut html,
            "recommended-duration",
            "Recommended Duration",
            &self.recommended_duration,
        );

        html.push_str(r#"<div class="result-actions">"#);
        match &self.analysis_id {
            Some(id) => {
                let _ = write!(
                    html,
                    r#"<button type="button" class="btn btn-primary" data-action="{}" data-analysis-id="{}">Save Analysis</button>"#,
                    ACTION_SAVE,
                    escape_html(id)
                );
            }
            None => {
                let _ = write!(
                    html,
                    r#"<button type="button" class="btn btn-primary" data-action="{}" disabled>Save Analysis</button>"#,
                    ACTION_SAVE
                );
            }
        }
        let _ = write!(
            html,
            r#"<button type="button" class="btn btn-secondary" data-action="{}">New Analysis</button>"#,
            ACTION_NEW_ANALYSIS
        );
        html.push_str("</div></div>");

        html
    }
}

fn push_text_section(html: &mut String, class: &str, title: &str, text: &str) {
    let _ = write!(
        html,
        r#"<div class="result-section {}"><h4>{}</h4><p>{}</p></div>"#,
        class,
        title,
        escape_html(text)
    );
}

fn push_tag_section(html: &mut String, class: &str, title: &str, items: &[String]) {
    let _ = write!(
        html,
        r#"<div class="result-section {}"><h4>{}</h4><div class="tag-list">"#,
        class, title
    );
    for item in items {
        let _ = write!(html, r#"<span class="tag">{}</span>"#, escape_html(item));
    }
    html.push_str("</div></div>");
}

fn push_list_section(html: &mut String, class: &str, title: &str, items: &[String]) {
    let _ = write!(
        html,
        r#"<div class="result-section {}"><h4>{}</h4><ul>"#,
        class, title
    );
    for item in items {
        let _ = write!(html, "<li>{}</li>", escape_html(item));
    }
    html.push_str("</ul></div>");
}

/// Markup for the error slot.
pub fn error_panel_html(message: &str) -> String {
    format!(
        r#"<div class="error-message" role="alert"><h4>Analysis Error</h4><p>{}</p></div>"#,
        escape_html(message)
    )
}

/// Markup for the transient banner shown above the card.
pub fn banner_html(kind: BannerKind, message: &str) -> String {
    format!(
        r#"<div class="{}" role="{}">{}</div>"#,
        kind.class_name(),
        kind.role(),
        escape_html(message)
    )
}

/// Escape text for element content and double-quoted attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
