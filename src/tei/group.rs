//! Alignment grouping & identifier assignment
//!
//! Turns each retained correspondence into its durable, identifier-bearing
//! form. Every participant gets its own identifier — never shared, even
//! between co-participants of a many-to-many group; earlier versions of this
//! pipeline reused one identifier per side and produced links that could not
//! distinguish the participants. Group membership is carried separately by
//! the link record, so nothing is lost by minting per participant.

use std::collections::HashSet;

use crate::tei::align::{ParticipantSpec, ResolvedCorrespondence, Side};
use crate::tei::error::AlignmentPipelineError;

/// Identifier source. The default mints random UUIDs; tests and
/// reproducible runs can inject [`SequentialMinter`].
pub trait IdMinter {
    fn mint(&mut self) -> String;
}

/// Random 128-bit identifiers in lowercase hyphenated hex form.
#[derive(Debug, Clone, Default)]
pub struct UuidMinter;

impl UuidMinter {
    pub fn new() -> Self {
        Self
    }
}

impl IdMinter for UuidMinter {
    fn mint(&mut self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Deterministic `prefix-N` identifiers.
#[derive(Debug, Clone)]
pub struct SequentialMinter {
    prefix: String,
    next: usize,
}

impl SequentialMinter {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 0,
        }
    }
}

impl IdMinter for SequentialMinter {
    fn mint(&mut self) -> String {
        self.next += 1;
        format!("{}-{}", self.prefix, self.next)
    }
}

/// One identifier-bearing participant.
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub side: Side,
    pub spec: ParticipantSpec,
    pub id: String,
}

/// The finalized form of one correspondence: a group identifier and its
/// participants, source side first, each side in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentGroup {
    pub id: String,
    pub participants: Vec<Participant>,
}

/// Mint identifiers for every retained correspondence. A repeated
/// identifier anywhere in the request is an invariant violation, not a
/// user-facing condition.
pub fn build_groups(
    correspondences: Vec<ResolvedCorrespondence>,
    minter: &mut dyn IdMinter,
) -> Result<Vec<AlignmentGroup>, AlignmentPipelineError> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut claim = |id: String| -> Result<String, AlignmentPipelineError> {
        if !seen.insert(id.clone()) {
            return Err(AlignmentPipelineError::IdentifierCollision(id));
        }
        Ok(id)
    };

    let mut groups = Vec::with_capacity(correspondences.len());
    for cor in correspondences {
        let id = claim(minter.mint())?;
        let mut participants =
            Vec::with_capacity(cor.source.len() + cor.target.len());
        for spec in cor.source {
            participants.push(Participant {
                side: Side::Source,
                spec,
                id: claim(minter.mint())?,
            });
        }
        for spec in cor.target {
            participants.push(Participant {
                side: Side::Target,
                spec,
                id: claim(minter.mint())?,
            });
        }
        groups.push(AlignmentGroup { id, participants });
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tei::align::Granularity;

    fn many_to_one() -> Vec<ResolvedCorrespondence> {
        vec![ResolvedCorrespondence {
            source: vec![
                ParticipantSpec::Whole { unit: 0 },
                ParticipantSpec::Whole { unit: 1 },
            ],
            target: vec![ParticipantSpec::Whole { unit: 0 }],
            score: 1.0,
            granularity: Granularity::Unit,
        }]
    }

    #[test]
    fn every_participant_gets_its_own_identifier() {
        let mut minter = SequentialMinter::new("id");
        let groups = build_groups(many_to_one(), &mut minter).expect("grouping failed");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].id, "id-1");
        let ids: Vec<&str> = groups[0]
            .participants
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, vec!["id-2", "id-3", "id-4"]);
        assert_eq!(groups[0].participants[0].side, Side::Source);
        assert_eq!(groups[0].participants[2].side, Side::Target);
    }

    #[test]
    fn uuid_minter_mints_lowercase_hyphenated_hex() {
        let mut minter = UuidMinter::new();
        let id = minter.mint();
        assert_eq!(id.len(), 36);
        assert!(id
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase() || c == '-'));
        assert_ne!(id, minter.mint());
    }

    #[test]
    fn a_repeated_identifier_is_a_fatal_collision() {
        struct StuckMinter;
        impl IdMinter for StuckMinter {
            fn mint(&mut self) -> String {
                "same".to_string()
            }
        }
        let err = build_groups(many_to_one(), &mut StuckMinter).expect_err("should fail");
        assert!(matches!(
            err,
            AlignmentPipelineError::IdentifierCollision(id) if id == "same"
        ));
    }
}
