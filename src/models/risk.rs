//! Hazard risk assessment model

use serde::{Deserialize, Serialize};

/// Overall risk band derived from the 1-10 score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskBand {
    /// Band for a 1-10 risk score
    #[must_use]
    pub fn from_score(score: f32) -> Self {
        match score {
            s if s <= 3.0 => RiskBand::Low,
            s if s <= 6.0 => RiskBand::Moderate,
            s if s <= 8.0 => RiskBand::High,
            _ => RiskBand::Critical,
        }
    }
}

impl std::fmt::Display for RiskBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskBand::Low => write!(f, "Low"),
            RiskBand::Moderate => write!(f, "Moderate"),
            RiskBand::High => write!(f, "High"),
            RiskBand::Critical => write!(f, "Critical"),
        }
    }
}

/// Disaster risk prediction for a coordinate
///
/// All scores live on a 1-10 scale; `confidence` is 0-1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub overall: RiskBand,
    pub risk_score: f32,
    pub flood: f32,
    pub fire: f32,
    pub earthquake: f32,
    pub storm: f32,
    pub confidence: f32,
}

impl RiskAssessment {
    /// Build an assessment with every score clamped to its documented range
    #[must_use]
    pub fn clamped(
        risk_score: f32,
        flood: f32,
        fire: f32,
        earthquake: f32,
        storm: f32,
        confidence: f32,
    ) -> Self {
        let risk_score = risk_score.clamp(1.0, 10.0);
        Self {
            overall: RiskBand::from_score(risk_score),
            risk_score,
            flood: flood.clamp(1.0, 10.0),
            fire: fire.clamp(1.0, 10.0),
            earthquake: earthquake.clamp(1.0, 10.0),
            storm: storm.clamp(1.0, 10.0),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_thresholds() {
        assert_eq!(RiskBand::from_score(1.0), RiskBand::Low);
        assert_eq!(RiskBand::from_score(3.0), RiskBand::Low);
        assert_eq!(RiskBand::from_score(4.0), RiskBand::Moderate);
        assert_eq!(RiskBand::from_score(6.5), RiskBand::High);
        assert_eq!(RiskBand::from_score(9.0), RiskBand::Critical);
    }

    #[test]
    fn test_clamping() {
        let assessment = RiskAssessment::clamped(14.0, 0.0, 5.0, -3.0, 11.0, 1.7);
        assert_eq!(assessment.risk_score, 10.0);
        assert_eq!(assessment.overall, RiskBand::Critical);
        assert_eq!(assessment.flood, 1.0);
        assert_eq!(assessment.earthquake, 1.0);
        assert_eq!(assessment.storm, 10.0);
        assert_eq!(assessment.confidence, 1.0);
    }
}
