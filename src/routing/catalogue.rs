// src/routing/catalogue.rs
// The intent catalogue: rule kinds, base weights, and the shipped default set

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use anyhow::{Result, bail};

use super::entities::{EntitySlot, contains_phrase, normalize, tokenize};
use super::types::{EventPhase, QueryContext};

/// Hard ceiling on any confidence score. Leaves room for a model-based
/// review to override a deterministic match when configured to do so.
pub const CONFIDENCE_CEILING: f32 = 0.95;

/// Floor applied to intents that declare no `min_confidence` of their own.
pub const GLOBAL_CONFIDENCE_FLOOR: f32 = 0.3;

/// Base weight class for a pattern rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleWeight {
    /// Direct keyword/phrase or alias hit.
    Direct,
    /// Partial or synonym-level hit.
    Supporting,
    /// Match derived from context flags alone.
    Contextual,
}

impl RuleWeight {
    /// Base contribution before the saturating combination. Values tuned so
    /// one Direct hit outscores several Contextual ones.
    pub fn base(&self) -> f32 {
        match self {
            RuleWeight::Direct => 0.6,
            RuleWeight::Supporting => 0.35,
            RuleWeight::Contextual => 0.15,
        }
    }
}

/// Conditions a context boost or context rule can test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextCondition {
    EventActive,
    PreEvent,
    PostEvent,
}

impl ContextCondition {
    pub fn holds(&self, ctx: &QueryContext) -> bool {
        match self {
            ContextCondition::EventActive => ctx.event_active,
            ContextCondition::PreEvent => ctx.phase == EventPhase::Pre,
            ContextCondition::PostEvent => ctx.phase == EventPhase::Post,
        }
    }
}

/// Closed set of rule kinds. Keeping these as tagged variants (instead of a
/// regex engine) keeps the scoring function auditable and the weight of each
/// rule explicit.
#[derive(Debug, Clone)]
pub enum RuleMatcher {
    /// Contiguous token-phrase match against the normalized query.
    LiteralPhrase(Vec<String>),
    /// Fires when the extractor filled this slot from a reference table.
    AliasSet(EntitySlot),
    /// Fires when any time reference was extracted.
    TimeReference,
    /// Fires from context flags alone, independent of the text.
    ContextFlag(ContextCondition),
}

/// One scoring rule: a matcher plus its weight class.
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub matcher: RuleMatcher,
    pub weight: RuleWeight,
}

impl PatternRule {
    /// Literal phrase rule. The phrase is normalized once here, so matching
    /// is insensitive to case and punctuation at query time.
    pub fn phrase(weight: RuleWeight, text: &str) -> Self {
        Self {
            matcher: RuleMatcher::LiteralPhrase(tokenize(&normalize(text))),
            weight,
        }
    }

    pub fn alias(weight: RuleWeight, slot: EntitySlot) -> Self {
        Self {
            matcher: RuleMatcher::AliasSet(slot),
            weight,
        }
    }

    pub fn time_reference(weight: RuleWeight) -> Self {
        Self {
            matcher: RuleMatcher::TimeReference,
            weight,
        }
    }

    /// Context-only rules always carry the low weight class.
    pub fn context(condition: ContextCondition) -> Self {
        Self {
            matcher: RuleMatcher::ContextFlag(condition),
            weight: RuleWeight::Contextual,
        }
    }

    pub(crate) fn matches(
        &self,
        tokens: &[String],
        entities: &BTreeMap<EntitySlot, String>,
        ctx: &QueryContext,
    ) -> bool {
        match &self.matcher {
            RuleMatcher::LiteralPhrase(phrase) => contains_phrase(tokens, phrase),
            RuleMatcher::AliasSet(slot) => entities.contains_key(slot),
            RuleMatcher::TimeReference => entities.contains_key(&EntitySlot::TimeReference),
            RuleMatcher::ContextFlag(condition) => condition.holds(ctx),
        }
    }
}

/// Multiplies an intent's score when the condition holds.
#[derive(Debug, Clone, Copy)]
pub struct ContextBoost {
    pub condition: ContextCondition,
    pub multiplier: f32,
}

/// One named intent with its ordered rule list.
#[derive(Debug, Clone)]
pub struct IntentDefinition {
    pub name: String,
    pub rules: Vec<PatternRule>,
    /// Floor below which a win for this intent is discarded as noise. `None`
    /// means the global floor applies.
    pub min_confidence: Option<f32>,
    pub boosts: Vec<ContextBoost>,
}

impl IntentDefinition {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rules: Vec::new(),
            min_confidence: None,
            boosts: Vec::new(),
        }
    }

    pub fn rule(mut self, rule: PatternRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn floor(mut self, min_confidence: f32) -> Self {
        self.min_confidence = Some(min_confidence);
        self
    }

    pub fn boost(mut self, condition: ContextCondition, multiplier: f32) -> Self {
        self.boosts.push(ContextBoost {
            condition,
            multiplier,
        });
        self
    }
}

/// Immutable intent catalogue. Built once at startup, shared via `Arc`, and
/// never mutated afterwards, so classification needs no locks.
#[derive(Debug, Clone)]
pub struct IntentCatalogue {
    intents: Vec<IntentDefinition>,
}

impl IntentCatalogue {
    /// Validates intent-name uniqueness; duplicates are a startup failure.
    pub fn new(intents: Vec<IntentDefinition>) -> Result<Self> {
        let mut seen = HashSet::new();
        for intent in &intents {
            if !seen.insert(intent.name.as_str()) {
                bail!("duplicate intent name '{}' in catalogue", intent.name);
            }
        }
        Ok(Self { intents })
    }

    pub fn iter(&self) -> impl Iterator<Item = &IntentDefinition> {
        self.intents.iter()
    }

    pub fn lookup(&self, name: &str) -> Option<&IntentDefinition> {
        self.intents.iter().find(|i| i.name == name)
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

/// The catalogue shipped with the event-discovery assistant. Declaration
/// order matters: it is the final tie-break.
pub fn default_catalogue() -> IntentCatalogue {
    use ContextCondition::*;
    use EntitySlot::*;
    use RuleWeight::*;

    let intents = vec![
        IntentDefinition::new("project_search")
            .rule(PatternRule::phrase(Direct, "projects"))
            .rule(PatternRule::phrase(Direct, "project"))
            .rule(PatternRule::alias(Direct, Category))
            .rule(PatternRule::phrase(Supporting, "show me"))
            .rule(PatternRule::phrase(Supporting, "find"))
            .rule(PatternRule::phrase(Supporting, "search"))
            .rule(PatternRule::phrase(Supporting, "looking for")),
        IntentDefinition::new("project_details")
            .rule(PatternRule::phrase(Direct, "tell me about"))
            .rule(PatternRule::phrase(Direct, "more about"))
            .rule(PatternRule::alias(Direct, ProjectName))
            .rule(PatternRule::phrase(Supporting, "details"))
            .rule(PatternRule::phrase(Supporting, "describe")),
        IntentDefinition::new("time_based_schedule")
            .rule(PatternRule::phrase(Direct, "what's happening"))
            .rule(PatternRule::phrase(Direct, "what's next"))
            .rule(PatternRule::phrase(Direct, "what's on"))
            .rule(PatternRule::time_reference(Supporting))
            .rule(PatternRule::phrase(Supporting, "going on"))
            .rule(PatternRule::phrase(Supporting, "schedule"))
            .boost(EventActive, 1.2),
        IntentDefinition::new("session_search")
            .rule(PatternRule::phrase(Direct, "session"))
            .rule(PatternRule::phrase(Direct, "sessions"))
            .rule(PatternRule::phrase(Direct, "agenda"))
            .rule(PatternRule::phrase(Direct, "workshop"))
            .rule(PatternRule::phrase(Direct, "workshops"))
            .rule(PatternRule::phrase(Supporting, "when is"))
            .rule(PatternRule::alias(Supporting, Category)),
        IntentDefinition::new("speaker_lookup")
            .rule(PatternRule::phrase(Direct, "speaker"))
            .rule(PatternRule::phrase(Direct, "speakers"))
            .rule(PatternRule::phrase(Direct, "presenting"))
            .rule(PatternRule::phrase(Direct, "presenter"))
            .rule(PatternRule::phrase(Supporting, "keynote"))
            .rule(PatternRule::phrase(Supporting, "talk"))
            .rule(PatternRule::alias(Supporting, PersonName)),
        IntentDefinition::new("people_lookup")
            .rule(PatternRule::phrase(Direct, "who is"))
            .rule(PatternRule::alias(Direct, PersonName))
            .rule(PatternRule::phrase(Supporting, "who's"))
            .rule(PatternRule::phrase(Supporting, "contact"))
            .rule(PatternRule::phrase(Supporting, "reach")),
        IntentDefinition::new("location_lookup")
            .rule(PatternRule::phrase(Direct, "where is"))
            .rule(PatternRule::phrase(Direct, "location"))
            .rule(PatternRule::phrase(Supporting, "where's"))
            .rule(PatternRule::phrase(Supporting, "room"))
            .rule(PatternRule::phrase(Supporting, "building"))
            .rule(PatternRule::phrase(Supporting, "directions")),
        IntentDefinition::new("event_info")
            .rule(PatternRule::phrase(Direct, "when does"))
            .rule(PatternRule::phrase(Supporting, "event"))
            .rule(PatternRule::phrase(Supporting, "start"))
            .rule(PatternRule::phrase(Supporting, "end"))
            .rule(PatternRule::phrase(Supporting, "venue"))
            .rule(PatternRule::phrase(Supporting, "doors open"))
            .floor(0.5),
        IntentDefinition::new("category_browse")
            .rule(PatternRule::phrase(Direct, "categories"))
            .rule(PatternRule::phrase(Direct, "topics"))
            .rule(PatternRule::phrase(Supporting, "what kind of"))
            .rule(PatternRule::phrase(Supporting, "areas"))
            .rule(PatternRule::alias(Supporting, Category)),
        IntentDefinition::new("recording_status")
            .rule(PatternRule::phrase(Direct, "recording"))
            .rule(PatternRule::phrase(Direct, "recorded"))
            .rule(PatternRule::phrase(Supporting, "replay"))
            .rule(PatternRule::phrase(Supporting, "watch later"))
            .rule(PatternRule::phrase(Supporting, "video"))
            .boost(PostEvent, 1.25),
        IntentDefinition::new("knowledge_search")
            .rule(PatternRule::phrase(Direct, "notes"))
            .rule(PatternRule::phrase(Direct, "summary"))
            .rule(PatternRule::phrase(Supporting, "takeaways"))
            .rule(PatternRule::phrase(Supporting, "key points"))
            .rule(PatternRule::phrase(Supporting, "recap")),
        IntentDefinition::new("registration_help")
            .rule(PatternRule::phrase(Direct, "register"))
            .rule(PatternRule::phrase(Direct, "registration"))
            .rule(PatternRule::phrase(Supporting, "sign up"))
            .rule(PatternRule::phrase(Supporting, "rsvp"))
            .rule(PatternRule::phrase(Supporting, "ticket")),
        IntentDefinition::new("feedback_submit")
            .rule(PatternRule::phrase(Direct, "feedback"))
            .rule(PatternRule::phrase(Supporting, "suggestion"))
            .rule(PatternRule::phrase(Supporting, "report a problem")),
        IntentDefinition::new("help")
            .rule(PatternRule::phrase(Direct, "help"))
            .rule(PatternRule::phrase(Supporting, "how do i"))
            .rule(PatternRule::phrase(Supporting, "what can you do"))
            .floor(0.4),
        // Reachable only through DirectAction::ExportResults; no text
        // patterns on purpose.
        IntentDefinition::new("export_results"),
    ];

    IntentCatalogue::new(intents).expect("default catalogue has unique intent names")
}
