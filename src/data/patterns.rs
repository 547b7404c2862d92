// ============================================================
// Layer 4 — Pattern Catalogue
// ============================================================
// The fixed set of regexes the tagger recognises, grouped by
// category:
//
//   regex_facts    → facts_vector
//   regex_demands  → demands_vector
//   regex_outcomes → outcomes_vector
//
// Each PatternEntry owns one label, one or more compiled matchers
// and a value kind. The order of entries inside a category IS the
// order of the vector slots, so editing a catalogue changes the
// meaning of every trained model and requires a retrain.
//
// A catalogue is either the built-in one (residential lease
// judgments, French phrasing) or a JSON file:
//
//   {
//     "regex_facts": [
//       { "label": "tenant_owes_rent",
//         "patterns": ["loyers? impayés?"],
//         "case_insensitive": true,
//         "kind": "BOOLEAN" }
//     ],
//     "regex_demands": [...],
//     "regex_outcomes": [...]
//   }

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::domain::error::TaggerError;
use crate::domain::labels::IntentIndex;
use crate::domain::record::Category;

/// How a pattern hit turns into a vector value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValueKind {
    /// 1 if any matcher hits, else 0
    Boolean,
    /// First captured number of the first matcher that hits, else 0
    Numeric,
}

/// One compiled rule. Immutable once built.
#[derive(Debug, Clone)]
pub struct PatternEntry {
    label:    String,
    matchers: Vec<Regex>,
    kind:     ValueKind,
}

impl PatternEntry {
    /// Build an entry from already compiled regexes
    pub fn new(label: impl Into<String>, matchers: Vec<Regex>, kind: ValueKind) -> Self {
        Self { label: label.into(), matchers, kind }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// The entry as catalogue source. Case folding is already part
    /// of each compiled pattern (`(?i)`), so the spec says `false`.
    pub fn to_spec(&self) -> PatternSpec {
        PatternSpec {
            label:    self.label.clone(),
            patterns: self.matchers.iter().map(|m| m.as_str().to_string()).collect(),
            case_insensitive: false,
            kind:     self.kind,
        }
    }

    /// Evaluate this entry against normalised text.
    pub fn evaluate(&self, text: &str) -> f64 {
        match self.kind {
            ValueKind::Boolean => {
                if self.matchers.iter().any(|m| m.is_match(text)) { 1.0 } else { 0.0 }
            }
            ValueKind::Numeric => self.first_number(text).unwrap_or(0.0),
        }
    }

    fn first_number(&self, text: &str) -> Option<f64> {
        let caps = self.matchers.iter().find_map(|m| m.captures(text))?;
        // Group 1 when the pattern captures, else the whole match
        let token = caps.get(1).or_else(|| caps.get(0))?.as_str();
        let value = parse_amount(token);
        if value.is_none() {
            tracing::warn!("'{}' matched but '{}' is not a number, recorded as 0", self.label, token);
        }
        value
    }
}

/// Parse an amount written the way judgments write them:
/// `1 500,25`, `1500.25`, `1,500.25`, `2.400.000`, `80`. Leading text
/// before the first digit and trailing text after the number are
/// ignored. Only the last `,` or `.` can be a decimal mark, and only
/// when one or two digits follow it; every other one groups thousands.
pub fn parse_amount(token: &str) -> Option<f64> {
    let start = token.find(|c: char| c.is_ascii_digit())?;
    let mut digits    = String::new();
    let mut last_mark = None;

    for c in token[start..].chars() {
        match c {
            '0'..='9' => digits.push(c),
            ',' | '.' => last_mark = Some(digits.len()),
            ' ' => continue,
            _ => break,
        }
    }

    let number = match last_mark {
        Some(at) if (1..=2).contains(&(digits.len() - at)) => {
            format!("{}.{}", &digits[..at], &digits[at..])
        }
        _ => digits,
    };
    number.parse::<f64>().ok()
}

// ─── Catalogue source format ──────────────────────────────────────────────────
/// One entry as written in a catalogue file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSpec {
    pub label:    String,
    pub patterns: Vec<String>,
    #[serde(default = "default_case_insensitive")]
    pub case_insensitive: bool,
    pub kind:     ValueKind,
}

fn default_case_insensitive() -> bool {
    true
}

impl PatternSpec {
    fn new(label: &str, patterns: &[&str], kind: ValueKind) -> Self {
        Self {
            label:    label.to_string(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            case_insensitive: true,
            kind,
        }
    }

    fn compile(&self) -> Result<PatternEntry, TaggerError> {
        let matchers = self
            .patterns
            .iter()
            .map(|p| {
                let pattern = if self.case_insensitive { format!("(?i){p}") } else { p.clone() };
                Regex::new(&pattern).map_err(|source| TaggerError::InvalidPattern {
                    label: self.label.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PatternEntry::new(self.label.clone(), matchers, self.kind))
    }
}

/// Uncompiled catalogue, as stored on disk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogueSpec {
    #[serde(default)]
    pub regex_facts:    Vec<PatternSpec>,
    #[serde(default)]
    pub regex_demands:  Vec<PatternSpec>,
    #[serde(default)]
    pub regex_outcomes: Vec<PatternSpec>,
}

// ─── Compiled catalogue ───────────────────────────────────────────────────────
/// Compiled pattern entries per category, in slot order.
#[derive(Debug, Clone, Default)]
pub struct PatternCatalogue {
    facts:    Vec<PatternEntry>,
    demands:  Vec<PatternEntry>,
    outcomes: Vec<PatternEntry>,
}

impl PatternCatalogue {
    /// Assemble a catalogue from compiled entries
    pub fn new(
        facts:    Vec<PatternEntry>,
        demands:  Vec<PatternEntry>,
        outcomes: Vec<PatternEntry>,
    ) -> Self {
        Self { facts, demands, outcomes }
    }

    /// Compile every pattern of a catalogue spec
    pub fn compile(spec: &CatalogueSpec) -> Result<Self, TaggerError> {
        let build = |specs: &[PatternSpec]| {
            specs.iter().map(PatternSpec::compile).collect::<Result<Vec<_>, _>>()
        };
        Ok(Self {
            facts:    build(&spec.regex_facts)?,
            demands:  build(&spec.regex_demands)?,
            outcomes: build(&spec.regex_outcomes)?,
        })
    }

    /// Read and compile a JSON catalogue file
    pub fn from_file(path: &Path) -> Result<Self, TaggerError> {
        let invalid = |reason: String| TaggerError::InvalidCatalogue {
            path: path.to_path_buf(),
            reason,
        };
        let json = fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        let spec: CatalogueSpec = serde_json::from_str(&json).map_err(|e| invalid(e.to_string()))?;
        tracing::info!(
            "Pattern catalogue '{}': {} facts, {} demands, {} outcomes",
            path.display(),
            spec.regex_facts.len(),
            spec.regex_demands.len(),
            spec.regex_outcomes.len()
        );
        Self::compile(&spec)
    }

    /// The built-in residential lease catalogue
    pub fn builtin() -> Result<Self, TaggerError> {
        Self::compile(&builtin_spec())
    }

    pub fn entries(&self, category: Category) -> &[PatternEntry] {
        match category {
            Category::Facts    => &self.facts,
            Category::Demands  => &self.demands,
            Category::Outcomes => &self.outcomes,
        }
    }

    /// Source form of the compiled catalogue, in slot order. Two
    /// catalogues that tag alike have equal specs.
    pub fn to_spec(&self) -> CatalogueSpec {
        let specs = |category| self.entries(category).iter().map(PatternEntry::to_spec).collect();
        CatalogueSpec {
            regex_facts:    specs(Category::Facts),
            regex_demands:  specs(Category::Demands),
            regex_outcomes: specs(Category::Outcomes),
        }
    }

    /// Vector width of a category
    pub fn width(&self, category: Category) -> usize {
        self.entries(category).len()
    }

    /// Position → label for every category, in slot order.
    pub fn intent_index(&self) -> IntentIndex {
        Category::ALL
            .iter()
            .map(|&category| {
                let pairs: Vec<(usize, String)> = self
                    .entries(category)
                    .iter()
                    .enumerate()
                    .map(|(i, e)| (i, e.label().to_string()))
                    .collect();
                (category.vector_name().to_string(), pairs)
            })
            .collect()
    }
}

// ─── Built-in catalogue ───────────────────────────────────────────────────────
// Amounts are written "1 500,00 $" after normalisation.
const AMOUNT: &str = r"(\d[\d ]*(?:[,.]\d{1,2})?) ?\$";

/// Residential lease judgments (rental board decisions, French).
pub fn builtin_spec() -> CatalogueSpec {
    use crate::data::patterns::ValueKind::{Boolean, Numeric};

    let facts = vec![
        PatternSpec::new("tenant_owes_rent", &[
            r"(?:loyers?|montants?) (?:impayés?|dûs?|en souffrance)",
            r"n'a pas payé (?:le|son|ses) loyers?",
        ], Boolean),
        PatternSpec::new("tenant_rent_not_paid_more_3_weeks", &[
            r"(?:plus de|depuis plus de) trois semaines",
            r"retard de plus de 3 semaines",
        ], Boolean),
        PatternSpec::new("tenant_continuous_late_payment", &[
            r"retards? (?:fréquents?|répétés?|continuels?)",
            r"paie (?:son loyer )?(?:fréquemment|régulièrement) en retard",
        ], Boolean),
        PatternSpec::new("tenant_left_without_paying", &[
            r"(?:a quitté|a déguerpi|a abandonné) (?:le logement|les lieux)",
        ], Boolean),
        PatternSpec::new("tenant_damaged_rental", &[
            r"dommages? (?:causés? )?(?:au|aux) (?:logement|lieux)",
            r"(?:a endommagé|détériorations?)",
        ], Boolean),
        PatternSpec::new("tenant_is_bothered", &[
            r"troubl(?:e|é) (?:dans )?(?:sa|la) jouissance",
        ], Boolean),
        PatternSpec::new("landlord_sends_demand_regie_logement", &[
            r"(?:mise en demeure|avis de (?:résiliation|reprise))",
        ], Boolean),
        PatternSpec::new("tenant_not_present_at_hearing", &[
            r"(?:locataires?|défendeurs?) (?:n'est|ne sont|n'était|n'étaient) pas présents?",
            r"absence (?:du|des) locataires?",
        ], Boolean),
        PatternSpec::new("tenant_monthly_payment", &[
            &format!(r"loyer (?:mensuel )?(?:est )?de {AMOUNT}"),
        ], Numeric),
    ];

    let demands = vec![
        PatternSpec::new("landlord_claim_lease_termination", &[
            r"(?:demande|demandent) la résiliation du bail",
        ], Boolean),
        PatternSpec::new("landlord_claim_unpaid_rent", &[
            r"réclame (?:le|les) (?:loyers?|montants?)",
            r"recouvrement (?:du|des) loyers?",
        ], Boolean),
        PatternSpec::new("landlord_claim_interest_damages", &[
            r"intérêts? (?:et|ainsi que) (?:l'indemnité|les dommages)",
        ], Boolean),
        PatternSpec::new("landlord_claim_legal_fees", &[
            r"frais (?:judiciaires|de justice)",
        ], Boolean),
        PatternSpec::new("tenant_claims_damages", &[
            r"(?:locataires?) (?:réclame|réclament|demande|demandent) des dommages",
        ], Boolean),
    ];

    let outcomes = vec![
        PatternSpec::new("orders_resiliation", &[
            r"résilie le bail",
        ], Boolean),
        PatternSpec::new("orders_expulsion", &[
            r"ordonne l'expulsion",
        ], Boolean),
        PatternSpec::new("additional_indemnity_money", &[
            &format!(r"indemnité additionnelle[^$\d]{{0,60}}{AMOUNT}"),
        ], Numeric),
        PatternSpec::new("tenant_ordered_to_pay_landlord", &[
            &format!(r"condamne (?:le|la|les) locataires? [^$\d]{{0,60}}la somme de {AMOUNT}"),
        ], Numeric),
        PatternSpec::new("tenant_ordered_to_pay_landlord_legal_fees", &[
            &format!(r"frais judiciaires (?:de|au montant de) {AMOUNT}"),
        ], Numeric),
        PatternSpec::new("application_rejected", &[
            r"rejette la demande",
        ], Boolean),
    ];

    CatalogueSpec {
        regex_facts:    facts,
        regex_demands:  demands,
        regex_outcomes: outcomes,
    }
}
