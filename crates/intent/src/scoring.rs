//! Ranking of catalogue intents against one input embedding.

use thea_core::ApplicationContext;

use crate::catalogue::IntentCatalogue;
use crate::embedding::EmbeddingCache;
use crate::relevance::context_relevance;
use crate::result::IntentMatch;
use crate::similarity::cosine_similarity;

/// Score every intent against `input` and return one match per intent,
/// highest combined score first.
///
/// Examples without a cache entry are skipped; an intent with no cached
/// examples produces no match. Within an intent the first example reaching the
/// maximum wins, and intents with equal combined scores keep catalogue order.
pub fn rank_intents(
    input: &[f32],
    catalogue: &IntentCatalogue,
    cache: &EmbeddingCache,
    context: &ApplicationContext,
) -> Vec<IntentMatch> {
    let mut matches: Vec<IntentMatch> = Vec::with_capacity(catalogue.len());

    for intent in catalogue.iter() {
        let relevance = context_relevance(intent, context);
        let mut best: Option<IntentMatch> = None;

        for example in &intent.examples {
            let Some(vector) = cache.get(example) else {
                continue;
            };
            let candidate =
                IntentMatch::new(&intent.name, example, cosine_similarity(input, vector), relevance);
            let better = best
                .as_ref()
                .map_or(true, |b| candidate.combined_score > b.combined_score);
            if better {
                best = Some(candidate);
            }
        }

        if let Some(m) = best {
            matches.push(m);
        }
    }

    // sort_by is stable: ties keep catalogue order.
    matches.sort_by(|a, b| b.combined_score.total_cmp(&a.combined_score));
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::{ContextRelevanceRule, Intent};
    use thea_core::View;

    fn unit(angle: f32) -> Vec<f32> {
        vec![angle.cos(), angle.sin()]
    }

    fn greeting_cache() -> (IntentCatalogue, EmbeddingCache) {
        let catalogue = IntentCatalogue::new(vec![
            Intent::new("greeting", ["Hello", "Hi"]),
            Intent::new("farewell", ["Bye"]),
        ])
        .unwrap();
        let mut cache = EmbeddingCache::new();
        cache.insert("Hello", unit(0.9f32.acos()));
        cache.insert("Hi", unit(0.4f32.acos()));
        cache.insert("Bye", unit(0.2f32.acos()));
        (catalogue, cache)
    }

    #[test]
    fn keeps_max_example_per_intent() {
        let (catalogue, cache) = greeting_cache();
        let ranked = rank_intents(&[1.0, 0.0], &catalogue, &cache, &ApplicationContext::default());

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].intent, "greeting");
        assert_eq!(ranked[0].example, "Hello");
        assert!((ranked[0].combined_score - 0.9).abs() < 1e-5);
        assert!((ranked[1].combined_score - 0.2).abs() < 1e-5);
    }

    #[test]
    fn missing_cache_entries_are_skipped() {
        let (catalogue, mut cache) = greeting_cache();
        cache.remove("Hello");
        cache.remove("Bye");

        let ranked = rank_intents(&[1.0, 0.0], &catalogue, &cache, &ApplicationContext::default());
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].example, "Hi");
        assert!((ranked[0].score - 0.4).abs() < 1e-5);
    }

    #[test]
    fn empty_cache_gives_empty_ranking() {
        let (catalogue, _) = greeting_cache();
        let ranked = rank_intents(
            &[1.0, 0.0],
            &catalogue,
            &EmbeddingCache::new(),
            &ApplicationContext::default(),
        );
        assert!(ranked.is_empty());
    }

    #[test]
    fn ties_keep_catalogue_order() {
        let catalogue = IntentCatalogue::new(vec![
            Intent::new("first", ["a", "b"]),
            Intent::new("second", ["c"]),
            Intent::new("third", ["d"]),
        ])
        .unwrap();
        let mut cache = EmbeddingCache::new();
        for text in ["a", "b", "c", "d"] {
            cache.insert(text, vec![1.0, 0.0]);
        }

        let ranked = rank_intents(&[1.0, 0.0], &catalogue, &cache, &ApplicationContext::default());
        let order: Vec<&str> = ranked.iter().map(|m| m.intent.as_str()).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
        // Within an intent the first equal example wins.
        assert_eq!(ranked[0].example, "a");
    }

    #[test]
    fn relevance_reweights_ranking() {
        let catalogue = IntentCatalogue::new(vec![
            Intent::new("in_summary", ["x"]).with_rule(ContextRelevanceRule {
                views: Some(vec!["summary".to_string()]),
                ..Default::default()
            }),
            Intent::new("anywhere", ["y"]),
        ])
        .unwrap();
        let mut cache = EmbeddingCache::new();
        cache.insert("x", vec![1.0, 0.0]);
        cache.insert("y", unit(0.5f32.acos()));

        let timeline = ApplicationContext::new(View::Timeline);
        let ranked = rank_intents(&[1.0, 0.0], &catalogue, &cache, &timeline);
        assert_eq!(ranked[0].intent, "anywhere");
        assert!((ranked[1].combined_score - 0.3).abs() < 1e-5);
        assert_eq!(ranked[1].context_relevance, 0.3);

        let summary = ApplicationContext::new(View::Summary);
        let ranked = rank_intents(&[1.0, 0.0], &catalogue, &cache, &summary);
        assert_eq!(ranked[0].intent, "in_summary");
    }

    #[test]
    fn negative_similarity_clamped_to_zero() {
        let catalogue = IntentCatalogue::new(vec![Intent::new("opposite", ["z"])]).unwrap();
        let mut cache = EmbeddingCache::new();
        cache.insert("z", vec![-1.0, 0.0]);
        let ranked = rank_intents(&[1.0, 0.0], &catalogue, &cache, &ApplicationContext::default());
        assert_eq!(ranked[0].score, 0.0);
    }
}
