// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Behavioral,
    EyeTracking,
    FacialAnalysis,
    Complete,
    Health,
    ApiRoot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl Endpoint {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Behavioral => "behavioral",
            Self::EyeTracking => "eye_tracking",
            Self::FacialAnalysis => "facial_analysis",
            Self::Complete => "complete",
            Self::Health => "health",
            Self::ApiRoot => "api_root",
        }
    }

    /// Path relative to the service base URL.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Behavioral => "/api/assessment/behavioral",
            Self::EyeTracking => "/api/assessment/eye_tracking",
            Self::FacialAnalysis => "/api/assessment/facial_analysis",
            Self::Complete => "/api/assessment/complete",
            Self::Health => "/api/health",
            Self::ApiRoot => "/api/",
        }
    }

    #[must_use]
    pub const fn method(self) -> HttpMethod {
        match self {
            Self::Health | Self::ApiRoot => HttpMethod::Get,
            _ => HttpMethod::Post,
        }
    }

    /// Scoring endpoints answer with a prediction and a probability.
    #[must_use]
    pub const fn is_scoring(self) -> bool {
        !matches!(self, Self::Health | Self::ApiRoot)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_paths_follow_service_surface() {
        assert_eq!(Endpoint::Behavioral.path(), "/api/assessment/behavioral");
        assert_eq!(Endpoint::ApiRoot.path(), "/api/");
        assert_eq!(Endpoint::Health.method(), HttpMethod::Get);
        assert_eq!(Endpoint::Complete.method(), HttpMethod::Post);
    }

    #[test]
    fn only_assessment_endpoints_are_scoring() {
        let every = [
            Endpoint::Behavioral,
            Endpoint::EyeTracking,
            Endpoint::FacialAnalysis,
            Endpoint::Complete,
            Endpoint::Health,
            Endpoint::ApiRoot,
        ];
        let scoring = every
            .into_iter()
            .filter(|e| e.is_scoring())
            .collect::<Vec<_>>();
        assert_eq!(
            scoring,
            vec![
                Endpoint::Behavioral,
                Endpoint::EyeTracking,
                Endpoint::FacialAnalysis,
                Endpoint::Complete
            ]
        );
    }
}
