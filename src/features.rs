//! WALS feature codes and typed views over their categorical values
//!
//! Values are kept as the WALS description label (e.g. "Noun-Adjective").
//! The enums here interpret a label for the rule predicates. A label none of
//! them can read maps to `None`; `FeatureCode::recognizes` lets the evaluator
//! tell such values apart from genuinely missing ones.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Typological features joined into the wide table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureCode {
    WordOrder,
    AdpositionOrder,
    GenitiveOrder,
    AdjectiveOrder,
    DemonstrativeOrder,
    NumeralOrder,
    RelativeClauseOrder,
    CaseCountBucket,
}

impl FeatureCode {
    /// Canonical column order of the wide table
    pub const ALL: [FeatureCode; 8] = [
        FeatureCode::WordOrder,
        FeatureCode::AdpositionOrder,
        FeatureCode::GenitiveOrder,
        FeatureCode::AdjectiveOrder,
        FeatureCode::DemonstrativeOrder,
        FeatureCode::NumeralOrder,
        FeatureCode::RelativeClauseOrder,
        FeatureCode::CaseCountBucket,
    ];

    pub fn wals_id(self) -> &'static str {
        match self {
            FeatureCode::WordOrder => "81A",
            FeatureCode::AdpositionOrder => "85A",
            FeatureCode::GenitiveOrder => "86A",
            FeatureCode::AdjectiveOrder => "87A",
            FeatureCode::DemonstrativeOrder => "88A",
            FeatureCode::NumeralOrder => "89A",
            FeatureCode::RelativeClauseOrder => "90A",
            FeatureCode::CaseCountBucket => "49A",
        }
    }

    pub fn column_name(self) -> &'static str {
        match self {
            FeatureCode::WordOrder => "word_order",
            FeatureCode::AdpositionOrder => "adposition_order",
            FeatureCode::GenitiveOrder => "genitive_order",
            FeatureCode::AdjectiveOrder => "adjective_order",
            FeatureCode::DemonstrativeOrder => "demonstrative_order",
            FeatureCode::NumeralOrder => "numeral_order",
            FeatureCode::RelativeClauseOrder => "relative_clause_order",
            FeatureCode::CaseCountBucket => "case_count_bucket",
        }
    }

    /// Human-readable WALS feature title
    pub fn title(self) -> &'static str {
        match self {
            FeatureCode::WordOrder => "Order of Subject, Object and Verb",
            FeatureCode::AdpositionOrder => "Order of Adposition and Noun Phrase",
            FeatureCode::GenitiveOrder => "Order of Genitive and Noun",
            FeatureCode::AdjectiveOrder => "Order of Adjective and Noun",
            FeatureCode::DemonstrativeOrder => "Order of Demonstrative and Noun",
            FeatureCode::NumeralOrder => "Order of Numeral and Noun",
            FeatureCode::RelativeClauseOrder => "Order of Relative Clause and Noun",
            FeatureCode::CaseCountBucket => "Number of Cases",
        }
    }

    pub fn from_wals_id(id: &str) -> Option<Self> {
        let id = id.trim();
        Self::ALL
            .into_iter()
            .find(|code| code.wals_id().eq_ignore_ascii_case(id))
    }

    pub fn from_column_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|code| code.column_name() == name)
    }

    /// Normalize a raw source label for storage in the wide table
    ///
    /// Only 49A is rewritten (into its case-count bucket); other labels are
    /// kept verbatim apart from surrounding whitespace. A case label that
    /// cannot be bucketed is kept as-is so it is reported, not dropped.
    pub fn normalize_value(self, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        match self {
            FeatureCode::CaseCountBucket => Some(
                CaseBucket::from_label(trimmed)
                    .map_or_else(|| trimmed.to_string(), |b| b.label().to_string()),
            ),
            _ => Some(trimmed.to_string()),
        }
    }

    /// Whether the typed view of this feature can interpret `value`
    pub fn recognizes(self, value: &str) -> bool {
        match self {
            FeatureCode::WordOrder => BasicOrder::from_label(value).is_some(),
            FeatureCode::AdpositionOrder => Adposition::from_label(value).is_some(),
            FeatureCode::CaseCountBucket => CaseBucket::from_label(value).is_some(),
            FeatureCode::GenitiveOrder
            | FeatureCode::AdjectiveOrder
            | FeatureCode::DemonstrativeOrder
            | FeatureCode::NumeralOrder
            | FeatureCode::RelativeClauseOrder => NounOrder::from_label(value).is_some(),
        }
    }
}

impl fmt::Display for FeatureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// Dominant order of subject, object and verb (81A)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicOrder {
    Sov,
    Svo,
    Vso,
    Vos,
    Ovs,
    Osv,
    NoDominant,
}

/// Relative order of verb and object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerbObject {
    Vo,
    Ov,
}

impl VerbObject {
    pub fn label(self) -> &'static str {
        match self {
            VerbObject::Vo => "VO",
            VerbObject::Ov => "OV",
        }
    }
}

impl BasicOrder {
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        match label.to_ascii_uppercase().as_str() {
            "SOV" => Some(BasicOrder::Sov),
            "SVO" => Some(BasicOrder::Svo),
            "VSO" => Some(BasicOrder::Vso),
            "VOS" => Some(BasicOrder::Vos),
            "OVS" => Some(BasicOrder::Ovs),
            "OSV" => Some(BasicOrder::Osv),
            _ if label.to_ascii_lowercase().contains("no dominant") => Some(BasicOrder::NoDominant),
            _ => None,
        }
    }

    pub fn verb_object(self) -> Option<VerbObject> {
        match self {
            BasicOrder::Svo | BasicOrder::Vso | BasicOrder::Vos => Some(VerbObject::Vo),
            BasicOrder::Sov | BasicOrder::Osv | BasicOrder::Ovs => Some(VerbObject::Ov),
            BasicOrder::NoDominant => None,
        }
    }

    /// Verb follows both nominal subject and object
    pub fn is_verb_final(self) -> bool {
        matches!(self, BasicOrder::Sov | BasicOrder::Osv)
    }
}

/// Adposition type (85A)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adposition {
    Prepositions,
    Postpositions,
    Inpositions,
    NoDominant,
    NoAdpositions,
}

impl Adposition {
    pub fn from_label(label: &str) -> Option<Self> {
        let l = label.trim().to_ascii_lowercase();
        if l.starts_with("preposition") {
            Some(Adposition::Prepositions)
        } else if l.starts_with("postposition") {
            Some(Adposition::Postpositions)
        } else if l.starts_with("inposition") {
            Some(Adposition::Inpositions)
        } else if l.contains("none dominant") || l.contains("no dominant") {
            Some(Adposition::NoDominant)
        } else if l.contains("no adposition") {
            Some(Adposition::NoAdpositions)
        } else {
            None
        }
    }

    /// WALS label used when a classifier predicts this value
    pub fn label(self) -> &'static str {
        match self {
            Adposition::Prepositions => "Prepositions",
            Adposition::Postpositions => "Postpositions",
            Adposition::Inpositions => "Inpositions",
            Adposition::NoDominant => "More than one type with none dominant",
            Adposition::NoAdpositions => "No adpositions",
        }
    }
}

/// Position of a nominal modifier relative to its noun (86A-90A)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NounOrder {
    BeforeNoun,
    AfterNoun,
    /// Both orders attested, none dominant
    Mixed,
    /// Position not expressible as before/after (internally headed, etc.)
    Other,
}

/// WALS 86A-90A values that name a construction rather than a position
const NON_POSITIONAL: [&str; 6] = [
    "internally",
    "correlative",
    "adjoined",
    "doubly",
    "only modifies",
    "does not modify",
];

impl NounOrder {
    pub fn from_label(label: &str) -> Option<Self> {
        let l = label.trim().to_ascii_lowercase();
        if l.is_empty() {
            return None;
        }
        if l.contains("no dominant") || l == "mixed" || l.contains("before and after") {
            return Some(NounOrder::Mixed);
        }
        if l.contains("before noun") || l.ends_with("prefix") {
            return Some(NounOrder::BeforeNoun);
        }
        if l.contains("after noun") || l.ends_with("suffix") {
            return Some(NounOrder::AfterNoun);
        }
        if NON_POSITIONAL.iter().any(|m| l.contains(m)) {
            return Some(NounOrder::Other);
        }
        let parts: Vec<&str> = l.split('-').map(str::trim).collect();
        match parts.as_slice() {
            ["noun", rest] if !rest.is_empty() => Some(NounOrder::AfterNoun),
            [rest, "noun"] if !rest.is_empty() => Some(NounOrder::BeforeNoun),
            _ => None,
        }
    }

    /// Strictly before the noun (mixed orders excluded)
    pub fn strictly_before(self) -> bool {
        self == NounOrder::BeforeNoun
    }

    pub fn strictly_after(self) -> bool {
        self == NounOrder::AfterNoun
    }

    /// Before the noun, alone or as one of several orders
    pub fn attested_before(self) -> bool {
        matches!(self, NounOrder::BeforeNoun | NounOrder::Mixed)
    }

    pub fn attested_after(self) -> bool {
        matches!(self, NounOrder::AfterNoun | NounOrder::Mixed)
    }

    pub fn is_observable(self) -> bool {
        self != NounOrder::Other
    }
}

/// Bucketed number of morphological cases (49A)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseBucket {
    NoCase,
    Few,
    Many,
    Borderline,
}

impl CaseBucket {
    /// Accepts raw WALS labels ("4 cases", "6-7 cases", ...) and bucket labels
    pub fn from_label(label: &str) -> Option<Self> {
        let l = label.trim().to_ascii_lowercase();
        if l == "none" || l.starts_with("no morphological case") {
            return Some(CaseBucket::NoCase);
        }
        if l.contains("borderline") {
            return Some(CaseBucket::Borderline);
        }
        let digits: String = l.chars().take_while(|c| c.is_ascii_digit()).collect();
        match digits.parse::<u32>().ok()? {
            0 | 1 => Some(CaseBucket::NoCase),
            2..=4 => Some(CaseBucket::Few),
            _ => Some(CaseBucket::Many),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CaseBucket::NoCase => "none",
            CaseBucket::Few => "2-4",
            CaseBucket::Many => "5+",
            CaseBucket::Borderline => "borderline",
        }
    }

    /// `None` when case-marking is only borderline
    pub fn has_case_system(self) -> Option<bool> {
        match self {
            CaseBucket::NoCase => Some(false),
            CaseBucket::Few | CaseBucket::Many => Some(true),
            CaseBucket::Borderline => None,
        }
    }
}
