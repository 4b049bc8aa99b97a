//! Universals about modifier order inside the noun phrase (85A-89A)
//!
//! As in `word_order`, a language with no dominant adposition type is not
//! applicable to an adposition universal.

use super::{UniversalRule, Verdict};
use crate::features::{Adposition, FeatureCode, NounOrder};
use crate::join::LanguageRecord;

const MODIFIERS: [FeatureCode; 3] = [
    FeatureCode::AdjectiveOrder,
    FeatureCode::DemonstrativeOrder,
    FeatureCode::NumeralOrder,
];

pub const RULES: &[UniversalRule] = &[
    UniversalRule {
        id: "2",
        statement: "In languages with prepositions, the genitive almost always follows the governing noun, while in languages with postpositions it almost always precedes.",
        depends_on: &[FeatureCode::AdpositionOrder, FeatureCode::GenitiveOrder],
        predicate: universal_2,
    },
    UniversalRule {
        id: "19",
        statement: "If the descriptive adjective follows the noun, then the demonstrative and the numeral likewise follow.",
        depends_on: &[
            FeatureCode::AdjectiveOrder,
            FeatureCode::DemonstrativeOrder,
            FeatureCode::NumeralOrder,
        ],
        predicate: universal_19,
    },
    UniversalRule {
        id: "20",
        statement: "If any of adjective, demonstrative or numeral precedes the noun, the genitive precedes the noun.",
        depends_on: &[
            FeatureCode::AdjectiveOrder,
            FeatureCode::DemonstrativeOrder,
            FeatureCode::NumeralOrder,
            FeatureCode::GenitiveOrder,
        ],
        predicate: universal_20,
    },
    UniversalRule {
        id: "21",
        statement: "If any of adjective, demonstrative or numeral follows the noun, the genitive follows the noun.",
        depends_on: &[
            FeatureCode::AdjectiveOrder,
            FeatureCode::DemonstrativeOrder,
            FeatureCode::NumeralOrder,
            FeatureCode::GenitiveOrder,
        ],
        predicate: universal_21,
    },
];

fn observable(record: &LanguageRecord, code: FeatureCode) -> Option<NounOrder> {
    record.noun_order(code).filter(|o| o.is_observable())
}

pub fn universal_2(record: &LanguageRecord) -> Verdict {
    let Some(genitive) = observable(record, FeatureCode::GenitiveOrder) else {
        return Verdict::NotApplicable;
    };
    match record.dominant_adposition() {
        Some(Adposition::Prepositions) => Verdict::violated_if(genitive.strictly_before()),
        Some(Adposition::Postpositions) => Verdict::violated_if(genitive.strictly_after()),
        _ => Verdict::NotApplicable,
    }
}

pub fn universal_19(record: &LanguageRecord) -> Verdict {
    let adjective_after = record
        .noun_order(FeatureCode::AdjectiveOrder)
        .is_some_and(NounOrder::attested_after);
    if !adjective_after {
        return Verdict::NotApplicable;
    }

    let (Some(dem), Some(num)) = (
        observable(record, FeatureCode::DemonstrativeOrder),
        observable(record, FeatureCode::NumeralOrder),
    ) else {
        return Verdict::NotApplicable;
    };

    Verdict::violated_if(dem.strictly_before() || num.strictly_before())
}

pub fn universal_20(record: &LanguageRecord) -> Verdict {
    let any_before = MODIFIERS
        .iter()
        .any(|&code| record.noun_order(code).is_some_and(NounOrder::attested_before));
    if !any_before {
        return Verdict::NotApplicable;
    }
    match observable(record, FeatureCode::GenitiveOrder) {
        Some(genitive) => Verdict::violated_if(genitive.strictly_after()),
        None => Verdict::NotApplicable,
    }
}

pub fn universal_21(record: &LanguageRecord) -> Verdict {
    let any_after = MODIFIERS
        .iter()
        .any(|&code| record.noun_order(code).is_some_and(NounOrder::attested_after));
    if !any_after {
        return Verdict::NotApplicable;
    }
    match observable(record, FeatureCode::GenitiveOrder) {
        Some(genitive) => Verdict::violated_if(genitive.strictly_before()),
        None => Verdict::NotApplicable,
    }
}
