//! Compatibility and disambiguation rules consulted by the resolver.

use crate::types::ArtifactType;

/// Declares that a produced type may stand in for a requested type.
pub trait CompatibilityRule: Send + Sync {
    /// Returns `true` if an artifact of type `produced` satisfies a request
    /// for `requested`.
    fn is_compatible(&self, requested: &ArtifactType, produced: &ArtifactType) -> bool;
}

/// Picks one candidate type when several equally short chains remain.
pub trait DisambiguationRule: Send + Sync {
    /// Returns the closest match among `candidates` for a request of
    /// `requested`, or `None` if this rule does not apply.
    ///
    /// `candidates` is sorted and deduplicated. A returned type must be one
    /// of the candidates.
    fn closest_match(
        &self,
        requested: &ArtifactType,
        candidates: &[ArtifactType],
    ) -> Option<ArtifactType>;
}

/// Compatibility between one fixed `(requested, produced)` pair.
#[derive(Debug, Clone)]
pub struct CompatiblePair {
    requested: ArtifactType,
    produced: ArtifactType,
}

impl CompatiblePair {
    /// Declares `produced` usable wherever `requested` is asked for.
    pub fn new(requested: ArtifactType, produced: ArtifactType) -> Self {
        Self {
            requested,
            produced,
        }
    }
}

impl CompatibilityRule for CompatiblePair {
    fn is_compatible(&self, requested: &ArtifactType, produced: &ArtifactType) -> bool {
        *requested == self.requested && *produced == self.produced
    }
}

/// For one requested type, prefer a fixed candidate whenever it is present.
#[derive(Debug, Clone)]
pub struct PreferCandidate {
    requested: ArtifactType,
    preferred: ArtifactType,
}

impl PreferCandidate {
    /// When `requested` is ambiguous, pick `preferred` if it is a candidate.
    pub fn new(requested: ArtifactType, preferred: ArtifactType) -> Self {
        Self {
            requested,
            preferred,
        }
    }
}

impl DisambiguationRule for PreferCandidate {
    fn closest_match(
        &self,
        requested: &ArtifactType,
        candidates: &[ArtifactType],
    ) -> Option<ArtifactType> {
        if *requested != self.requested {
            return None;
        }
        candidates
            .iter()
            .find(|c| **c == self.preferred)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_is_directional() {
        let rule = CompatiblePair::new(
            ArtifactType::HILT_ALL_CLASSES,
            ArtifactType::ANDROID_CLASSES_JAR,
        );
        assert!(rule.is_compatible(
            &ArtifactType::HILT_ALL_CLASSES,
            &ArtifactType::ANDROID_CLASSES_JAR
        ));
        assert!(!rule.is_compatible(
            &ArtifactType::ANDROID_CLASSES_JAR,
            &ArtifactType::HILT_ALL_CLASSES
        ));
    }

    #[test]
    fn prefer_only_applies_to_its_request() {
        let rule = PreferCandidate::new(
            ArtifactType::HILT_ALL_CLASSES,
            ArtifactType::ANDROID_CLASSES_JAR,
        );
        let candidates = vec![
            ArtifactType::ANDROID_CLASSES_JAR,
            ArtifactType::HILT_ALL_CLASSES,
        ];
        assert_eq!(
            rule.closest_match(&ArtifactType::HILT_ALL_CLASSES, &candidates),
            Some(ArtifactType::ANDROID_CLASSES_JAR)
        );
        assert_eq!(rule.closest_match(&ArtifactType::JAR, &candidates), None);
    }

    #[test]
    fn prefer_absent_candidate_is_none() {
        let rule = PreferCandidate::new(
            ArtifactType::HILT_ALL_CLASSES,
            ArtifactType::ANDROID_CLASSES_JAR,
        );
        let candidates = vec![ArtifactType::HILT_ALL_CLASSES];
        assert_eq!(
            rule.closest_match(&ArtifactType::HILT_ALL_CLASSES, &candidates),
            None
        );
    }
}
