//! Universals conditioned on the dominant clause order (81A)
//!
//! Mixed noun-phrase orders (both attested, none dominant) never violate a
//! rule. A language with no dominant adposition type is not applicable, as
//! are positions that cannot be read as before/after.

use super::{UniversalRule, Verdict};
use crate::features::{Adposition, BasicOrder, FeatureCode, VerbObject};
use crate::join::LanguageRecord;

pub const RULES: &[UniversalRule] = &[
    UniversalRule {
        id: "3",
        statement: "Languages with dominant VSO order are always prepositional.",
        depends_on: &[FeatureCode::WordOrder, FeatureCode::AdpositionOrder],
        predicate: universal_3,
    },
    UniversalRule {
        id: "4",
        statement: "With overwhelmingly greater than chance frequency, languages with normal SOV order are postpositional.",
        depends_on: &[FeatureCode::WordOrder, FeatureCode::AdpositionOrder],
        predicate: universal_4,
    },
    UniversalRule {
        id: "17",
        statement: "With overwhelmingly more than chance frequency, languages with dominant order VSO have the adjective after the noun.",
        depends_on: &[FeatureCode::WordOrder, FeatureCode::AdjectiveOrder],
        predicate: universal_17,
    },
    UniversalRule {
        id: "23",
        statement: "If the verb precedes the object (VO), the adjective likewise precedes the noun.",
        depends_on: &[FeatureCode::WordOrder, FeatureCode::AdjectiveOrder],
        predicate: universal_23,
    },
    UniversalRule {
        id: "24",
        statement: "If the verb follows the object (OV), the adjective likewise follows the noun.",
        depends_on: &[FeatureCode::WordOrder, FeatureCode::AdjectiveOrder],
        predicate: universal_24,
    },
    UniversalRule {
        id: "41",
        statement: "If in a language the verb follows both the nominal subject and nominal object as the dominant order, the language almost always has a case system.",
        depends_on: &[FeatureCode::WordOrder, FeatureCode::CaseCountBucket],
        predicate: universal_41,
    },
];

/// Prepositions vs postpositions; anything else is not evidence either way
fn adposition_verdict(record: &LanguageRecord, expected: Adposition) -> Verdict {
    match record.dominant_adposition() {
        Some(a) => Verdict::violated_if(a != expected),
        None => Verdict::NotApplicable,
    }
}

/// Verdict on adjective position given the order the rule requires
fn adjective_verdict(record: &LanguageRecord, must_precede: bool) -> Verdict {
    let Some(adj) = record.noun_order(FeatureCode::AdjectiveOrder) else {
        return Verdict::NotApplicable;
    };
    if !adj.is_observable() {
        return Verdict::NotApplicable;
    }
    if must_precede {
        Verdict::violated_if(adj.strictly_after())
    } else {
        Verdict::violated_if(adj.strictly_before())
    }
}

pub fn universal_3(record: &LanguageRecord) -> Verdict {
    if record.word_order() != Some(BasicOrder::Vso) {
        return Verdict::NotApplicable;
    }
    adposition_verdict(record, Adposition::Prepositions)
}

pub fn universal_4(record: &LanguageRecord) -> Verdict {
    if record.word_order() != Some(BasicOrder::Sov) {
        return Verdict::NotApplicable;
    }
    adposition_verdict(record, Adposition::Postpositions)
}

pub fn universal_17(record: &LanguageRecord) -> Verdict {
    if record.word_order() != Some(BasicOrder::Vso) {
        return Verdict::NotApplicable;
    }
    adjective_verdict(record, false)
}

pub fn universal_23(record: &LanguageRecord) -> Verdict {
    match record.word_order().and_then(BasicOrder::verb_object) {
        Some(VerbObject::Vo) => adjective_verdict(record, true),
        _ => Verdict::NotApplicable,
    }
}

pub fn universal_24(record: &LanguageRecord) -> Verdict {
    match record.word_order().and_then(BasicOrder::verb_object) {
        Some(VerbObject::Ov) => adjective_verdict(record, false),
        _ => Verdict::NotApplicable,
    }
}

pub fn universal_41(record: &LanguageRecord) -> Verdict {
    if !record.word_order().is_some_and(BasicOrder::is_verb_final) {
        return Verdict::NotApplicable;
    }
    match record.case_bucket().and_then(|b| b.has_case_system()) {
        Some(has_case) => Verdict::violated_if(!has_case),
        None => Verdict::NotApplicable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lang(order: &str) -> LanguageRecord {
        LanguageRecord::new("x").with_feature(FeatureCode::WordOrder, Some(order))
    }

    #[test]
    fn test_universal_3() {
        let vso_pre = lang("VSO").with_feature(FeatureCode::AdpositionOrder, Some("Prepositions"));
        let vso_post = lang("VSO").with_feature(FeatureCode::AdpositionOrder, Some("Postpositions"));
        let vso_none = lang("VSO").with_feature(FeatureCode::AdpositionOrder, Some("No adpositions"));
        let vso_mixed = lang("VSO").with_feature(
            FeatureCode::AdpositionOrder,
            Some("More than one type with none dominant"),
        );
        let svo_post = lang("SVO").with_feature(FeatureCode::AdpositionOrder, Some("Postpositions"));

        assert_eq!(universal_3(&vso_pre), Verdict::Satisfied);
        assert_eq!(universal_3(&vso_post), Verdict::Violated);
        assert_eq!(universal_3(&vso_none), Verdict::NotApplicable);
        assert_eq!(universal_3(&vso_mixed), Verdict::NotApplicable);
        assert_eq!(universal_3(&svo_post), Verdict::NotApplicable);
    }

    #[test]
    fn test_universal_4_mixed_adpositions_are_not_applicable() {
        let sov_mixed = lang("SOV").with_feature(
            FeatureCode::AdpositionOrder,
            Some("More than one type with none dominant"),
        );
        let sov_post = lang("SOV").with_feature(FeatureCode::AdpositionOrder, Some("Postpositions"));
        let sov_pre = lang("SOV").with_feature(FeatureCode::AdpositionOrder, Some("Prepositions"));

        assert_eq!(universal_4(&sov_mixed), Verdict::NotApplicable);
        assert_eq!(universal_4(&sov_post), Verdict::Satisfied);
        assert_eq!(universal_4(&sov_pre), Verdict::Violated);
    }

    #[test]
    fn test_universal_23_and_24_are_directional() {
        let vo_adj_n = lang("SVO").with_feature(FeatureCode::AdjectiveOrder, Some("Adjective-Noun"));
        let vo_n_adj = lang("VOS").with_feature(FeatureCode::AdjectiveOrder, Some("Noun-Adjective"));
        let ov_adj_n = lang("SOV").with_feature(FeatureCode::AdjectiveOrder, Some("Adjective-Noun"));
        let ov_mixed = lang("OVS").with_feature(FeatureCode::AdjectiveOrder, Some("No dominant order"));

        assert_eq!(universal_23(&vo_adj_n), Verdict::Satisfied);
        assert_eq!(universal_23(&vo_n_adj), Verdict::Violated);
        assert_eq!(universal_23(&ov_adj_n), Verdict::NotApplicable);

        assert_eq!(universal_24(&ov_adj_n), Verdict::Violated);
        assert_eq!(universal_24(&ov_mixed), Verdict::Satisfied);
        assert_eq!(universal_24(&vo_adj_n), Verdict::NotApplicable);
    }

    #[test]
    fn test_universal_17() {
        let vso_n_adj = lang("VSO").with_feature(FeatureCode::AdjectiveOrder, Some("Noun-Adjective"));
        let vso_adj_n = lang("VSO").with_feature(FeatureCode::AdjectiveOrder, Some("Adjective-Noun"));
        assert_eq!(universal_17(&vso_n_adj), Verdict::Satisfied);
        assert_eq!(universal_17(&vso_adj_n), Verdict::Violated);
    }

    #[test]
    fn test_universal_41() {
        let sov_cases = lang("SOV").with_feature(FeatureCode::CaseCountBucket, Some("5+"));
        let osv_none = lang("OSV").with_feature(FeatureCode::CaseCountBucket, Some("none"));
        let sov_borderline = lang("SOV").with_feature(FeatureCode::CaseCountBucket, Some("borderline"));
        let ovs_cases = lang("OVS").with_feature(FeatureCode::CaseCountBucket, Some("2-4"));

        assert_eq!(universal_41(&sov_cases), Verdict::Satisfied);
        assert_eq!(universal_41(&osv_none), Verdict::Violated);
        assert_eq!(universal_41(&sov_borderline), Verdict::NotApplicable);
        // OVS is object-initial, not verb-final
        assert_eq!(universal_41(&ovs_cases), Verdict::NotApplicable);
    }
}
