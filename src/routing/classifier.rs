// src/routing/classifier.rs
// Scores every intent in the catalogue against a query and selects the winner

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use super::catalogue::{CONFIDENCE_CEILING, GLOBAL_CONFIDENCE_FLOOR, IntentCatalogue, IntentDefinition};
use super::entities::{EntitySlot, normalize, tokenize};
use super::types::{ClassificationResult, QueryContext};

/// Deterministic intent classifier over an immutable catalogue.
///
/// Pure function of (query text, entities, context): no I/O, no shared
/// mutable state, safe to call from any number of concurrent tasks.
pub struct QueryClassifier {
    catalogue: Arc<IntentCatalogue>,
}

impl QueryClassifier {
    pub fn new(catalogue: Arc<IntentCatalogue>) -> Self {
        Self { catalogue }
    }

    pub fn catalogue(&self) -> &IntentCatalogue {
        &self.catalogue
    }

    /// Classifies a query given already-extracted entities and context flags.
    ///
    /// Never fails: empty, garbled, or hostile input degrades to the
    /// unclassified sentinel with confidence 0.0.
    pub fn classify(
        &self,
        query: &str,
        entities: &BTreeMap<EntitySlot, String>,
        ctx: &QueryContext,
    ) -> ClassificationResult {
        let tokens = tokenize(&normalize(query));
        if tokens.is_empty() {
            return ClassificationResult::unclassified(entities.clone(), 0);
        }

        // Selection: strictly highest score wins; exact ties prefer more
        // matched rules, then earlier catalogue declaration order.
        let mut winner: Option<(&IntentDefinition, f32, usize)> = None;
        for def in self.catalogue.iter() {
            let (score, matched) = score_intent(def, &tokens, entities, ctx);
            if matched == 0 || score <= 0.0 {
                continue;
            }
            let replace = match &winner {
                None => true,
                Some((_, best_score, best_matched)) => {
                    score > *best_score || (score == *best_score && matched > *best_matched)
                }
            };
            if replace {
                winner = Some((def, score, matched));
            }
        }

        let Some((def, score, matched)) = winner else {
            debug!(query_tokens = tokens.len(), "no intent matched");
            return ClassificationResult::unclassified(entities.clone(), 0);
        };

        let floor = def.min_confidence.unwrap_or(GLOBAL_CONFIDENCE_FLOOR);
        if score < floor {
            debug!(
                intent = %def.name,
                score,
                floor,
                "winning score below confidence floor; downgrading to unclassified"
            );
            return ClassificationResult::unclassified(entities.clone(), matched);
        }

        debug!(intent = %def.name, confidence = score, patterns = matched, "classified query");
        ClassificationResult {
            intent: def.name.clone(),
            confidence: score,
            matched_entities: entities.clone(),
            patterns_matched: matched,
        }
    }
}

/// Saturating score for one intent: each matched rule contributes
/// `weight * (1 - score_so_far)`, so many weak matches cannot trivially
/// outscore one sharp match, then context boosts multiply and the ceiling
/// caps the result. Commutative over rule order, monotone in matched rules.
fn score_intent(
    def: &IntentDefinition,
    tokens: &[String],
    entities: &BTreeMap<EntitySlot, String>,
    ctx: &QueryContext,
) -> (f32, usize) {
    let mut score = 0.0f32;
    let mut matched = 0usize;
    for rule in &def.rules {
        if rule.matches(tokens, entities, ctx) {
            matched += 1;
            score += rule.weight.base() * (1.0 - score);
        }
    }
    if matched == 0 {
        return (0.0, 0);
    }
    for boost in &def.boosts {
        if boost.condition.holds(ctx) {
            score *= boost.multiplier;
        }
    }
    (score.min(CONFIDENCE_CEILING), matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::catalogue::{ContextCondition, IntentDefinition, PatternRule, RuleWeight};
    use crate::routing::types::EventPhase;

    fn classifier_for(intents: Vec<IntentDefinition>) -> QueryClassifier {
        QueryClassifier::new(IntentCatalogue::new(intents).unwrap().into_shared())
    }

    fn classify(classifier: &QueryClassifier, query: &str) -> ClassificationResult {
        classifier.classify(query, &BTreeMap::new(), &QueryContext::inactive())
    }

    #[test]
    fn test_empty_query_is_unclassified() {
        let classifier = classifier_for(vec![
            IntentDefinition::new("greet").rule(PatternRule::phrase(RuleWeight::Direct, "hello")),
        ]);
        for query in ["", "   ", "\t\n"] {
            let result = classify(&classifier, query);
            assert!(result.is_unclassified());
            assert_eq!(result.confidence, 0.0);
            assert_eq!(result.patterns_matched, 0);
        }
    }

    #[test]
    fn test_single_direct_match_scores_base_weight() {
        let classifier = classifier_for(vec![
            IntentDefinition::new("greet").rule(PatternRule::phrase(RuleWeight::Direct, "hello")),
        ]);
        let result = classify(&classifier, "hello there");
        assert_eq!(result.intent, "greet");
        assert_eq!(result.confidence, RuleWeight::Direct.base());
        assert_eq!(result.patterns_matched, 1);
    }

    #[test]
    fn test_one_sharp_match_beats_many_weak_ones() {
        let weak = IntentDefinition::new("weak")
            .rule(PatternRule::context(ContextCondition::EventActive))
            .rule(PatternRule::phrase(RuleWeight::Contextual, "the"))
            .rule(PatternRule::phrase(RuleWeight::Contextual, "a"))
            .floor(0.0);
        let sharp = IntentDefinition::new("sharp")
            .rule(PatternRule::phrase(RuleWeight::Direct, "recording"));
        let classifier = classifier_for(vec![weak, sharp]);

        let ctx = QueryContext::new(true, EventPhase::During);
        let result = classifier.classify("is the a recording up", &BTreeMap::new(), &ctx);
        assert_eq!(result.intent, "sharp");
    }

    #[test]
    fn test_score_is_monotone_in_added_patterns() {
        let base = IntentDefinition::new("x")
            .rule(PatternRule::phrase(RuleWeight::Direct, "schedule"));
        let extended = IntentDefinition::new("x")
            .rule(PatternRule::phrase(RuleWeight::Direct, "schedule"))
            .rule(PatternRule::phrase(RuleWeight::Supporting, "today"));

        let before = classify(&classifier_for(vec![base]), "schedule for today");
        let after = classify(&classifier_for(vec![extended]), "schedule for today");
        assert!(after.confidence >= before.confidence);
        assert_eq!(after.patterns_matched, 2);
    }

    #[test]
    fn test_confidence_never_exceeds_ceiling() {
        let mut def = IntentDefinition::new("stacked");
        for word in ["alpha", "beta", "gamma", "delta", "epsilon", "zeta"] {
            def = def.rule(PatternRule::phrase(RuleWeight::Direct, word));
        }
        let classifier = classifier_for(vec![def]);
        let result = classify(&classifier, "alpha beta gamma delta epsilon zeta");
        assert!(result.confidence <= CONFIDENCE_CEILING);
        assert_eq!(result.confidence, CONFIDENCE_CEILING);
    }

    #[test]
    fn test_boost_multiplies_and_still_caps() {
        let def = IntentDefinition::new("now_playing")
            .rule(PatternRule::phrase(RuleWeight::Direct, "happening"))
            .boost(ContextCondition::EventActive, 1.2);
        let classifier = classifier_for(vec![def]);

        let idle = classifier.classify("happening", &BTreeMap::new(), &QueryContext::inactive());
        let active = classifier.classify(
            "happening",
            &BTreeMap::new(),
            &QueryContext::new(true, EventPhase::During),
        );
        assert!(active.confidence > idle.confidence);
        assert!(active.confidence <= CONFIDENCE_CEILING);
    }

    #[test]
    fn test_exact_tie_prefers_more_matched_rules() {
        // Both intents reach the ceiling; the second matches more rules.
        let mut a = IntentDefinition::new("a");
        let mut b = IntentDefinition::new("b");
        for word in ["one", "two", "three", "four", "five", "six"] {
            a = a.rule(PatternRule::phrase(RuleWeight::Direct, word));
            b = b.rule(PatternRule::phrase(RuleWeight::Direct, word));
        }
        b = b.rule(PatternRule::phrase(RuleWeight::Direct, "seven"));
        let classifier = classifier_for(vec![a, b]);
        let result = classify(&classifier, "one two three four five six seven");
        assert_eq!(result.intent, "b");
    }

    #[test]
    fn test_exact_tie_falls_back_to_declaration_order() {
        let a = IntentDefinition::new("declared_first")
            .rule(PatternRule::phrase(RuleWeight::Direct, "agenda"));
        let b = IntentDefinition::new("declared_second")
            .rule(PatternRule::phrase(RuleWeight::Direct, "agenda"));
        let classifier = classifier_for(vec![a, b]);
        let result = classify(&classifier, "agenda please");
        assert_eq!(result.intent, "declared_first");
    }

    #[test]
    fn test_floor_downgrades_but_keeps_pattern_count() {
        let def = IntentDefinition::new("picky")
            .rule(PatternRule::phrase(RuleWeight::Supporting, "maybe"))
            .floor(0.9);
        let classifier = classifier_for(vec![def]);
        let result = classify(&classifier, "maybe later");
        assert!(result.is_unclassified());
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.patterns_matched, 1);
    }

    #[test]
    fn test_global_floor_applies_when_intent_declares_none() {
        let def = IntentDefinition::new("faint")
            .rule(PatternRule::context(ContextCondition::EventActive));
        let classifier = classifier_for(vec![def]);
        // Contextual-only score (0.15) sits below the global floor.
        let result = classifier.classify(
            "unrelated words",
            &BTreeMap::new(),
            &QueryContext::new(true, EventPhase::During),
        );
        assert!(result.is_unclassified());
    }

    #[test]
    fn test_classification_is_deterministic() {
        let classifier = classifier_for(vec![
            IntentDefinition::new("a").rule(PatternRule::phrase(RuleWeight::Direct, "projects")),
            IntentDefinition::new("b").rule(PatternRule::phrase(RuleWeight::Direct, "projects")),
        ]);
        let first = classify(&classifier, "projects");
        for _ in 0..10 {
            assert_eq!(classify(&classifier, "projects"), first);
        }
    }
}
