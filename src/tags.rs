//! Paralinguistic tag injection.
//!
//! Inserts a random number of bracketed cue tokens (`[sigh]`, `[laugh]`, ...)
//! between the words of a text before it is handed to the voice model.
//! Each injection makes three independent draws from the caller's RNG:
//! the tag count, the tag identities, and the gap positions.

use rand::seq::index;
use rand::Rng;

use crate::config::{ConfigError, TagConfig};

/// The random draws for one injection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPlan {
    /// Drawn tags, in draw order. May be longer than `positions`.
    pub tags: Vec<String>,
    /// Distinct gap indices in `0..=N`, sorted descending.
    pub positions: Vec<usize>,
}

/// Validated tag vocabulary and count bounds.
#[derive(Debug, Clone)]
pub struct TagInjector {
    tags: Vec<String>,
    min_tags: usize,
    max_tags: usize,
}

impl TagInjector {
    pub fn new(config: TagConfig) -> Result<Self, ConfigError> {
        if config.tags.is_empty() {
            return Err(ConfigError::EmptyTagSet);
        }
        if config.min_tags > config.max_tags {
            return Err(ConfigError::TagRange {
                min: config.min_tags,
                max: config.max_tags,
            });
        }

        Ok(Self {
            tags: config.tags,
            min_tags: config.min_tags,
            max_tags: config.max_tags,
        })
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Draw count, tags and gap positions for a text of `token_count` words.
    pub fn plan<R: Rng>(&self, token_count: usize, rng: &mut R) -> TagPlan {
        let count = rng.gen_range(self.min_tags..=self.max_tags);

        let tags = (0..count)
            .map(|_| self.tags[rng.gen_range(0..self.tags.len())].clone())
            .collect();

        let gaps = token_count + 1;
        let mut positions = index::sample(rng, gaps, count.min(gaps)).into_vec();
        positions.sort_unstable_by(|a, b| b.cmp(a));

        TagPlan { tags, positions }
    }

    /// Inject tags into `text`. Text without any words comes back untouched.
    pub fn inject<R: Rng>(&self, text: &str, rng: &mut R) -> String {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return text.to_string();
        }

        let plan = self.plan(words.len(), rng);
        apply_plan(words, &plan).join(" ")
    }
}

/// Insert the planned tags into `words`.
///
/// Positions are walked highest first so an insertion never shifts a gap
/// still waiting to be filled. Drawn tags beyond the number of positions
/// are dropped.
pub fn apply_plan<'a>(mut words: Vec<&'a str>, plan: &'a TagPlan) -> Vec<&'a str> {
    for (&pos, tag) in plan.positions.iter().zip(&plan.tags) {
        words.insert(pos.min(words.len()), tag.as_str());
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn injector(tags: &[&str], min_tags: usize, max_tags: usize) -> TagInjector {
        TagInjector::new(TagConfig {
            tags: tags.iter().map(|t| t.to_string()).collect(),
            min_tags,
            max_tags,
            seed: None,
        })
        .unwrap()
    }

    fn default_injector() -> TagInjector {
        TagInjector::new(TagConfig::default()).unwrap()
    }

    #[test]
    fn empty_and_blank_input_is_returned_as_is() {
        let inj = default_injector();
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(inj.inject("", &mut rng), "");
        assert_eq!(inj.inject("   \t\n ", &mut rng), "   \t\n ");
    }

    #[test]
    fn forced_gap_between_two_words() {
        let plan = TagPlan {
            tags: vec!["[sigh]".into()],
            positions: vec![1],
        };
        let out = apply_plan(vec!["hello", "world"], &plan).join(" ");
        assert_eq!(out, "hello [sigh] world");
    }

    #[test]
    fn gaps_at_both_ends() {
        let plan = TagPlan {
            tags: vec!["[laugh]".into(), "[cough]".into()],
            positions: vec![2, 0],
        };
        let out = apply_plan(vec!["hello", "world"], &plan).join(" ");
        assert_eq!(out, "[cough] hello world [laugh]");
    }

    #[test]
    fn excess_tags_are_dropped_when_gaps_run_out() {
        let inj = injector(&["[sigh]"], 3, 3);
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let plan = inj.plan(1, &mut rng);
            assert_eq!(plan.tags.len(), 3);
            assert_eq!(plan.positions, vec![1, 0]);

            let mut rng = StdRng::seed_from_u64(seed);
            let out = inj.inject("a", &mut rng);
            assert_eq!(out, "[sigh] a [sigh]");
        }
    }

    #[test]
    fn single_tag_single_gap_choice() {
        let inj = injector(&["[sigh]"], 1, 1);
        let mut seen = std::collections::HashSet::new();
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let out = inj.inject("hello world", &mut rng);
            assert!(
                ["[sigh] hello world", "hello [sigh] world", "hello world [sigh]"]
                    .contains(&out.as_str()),
                "unexpected output {out:?}"
            );
            seen.insert(out);
        }
        // every gap is reachable
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn words_survive_in_order_and_only_configured_tags_appear() {
        let inj = default_injector();
        let text = "the  quick brown\tfox jumps over the lazy dog";
        let words: Vec<&str> = text.split_whitespace().collect();

        for seed in 0..500 {
            let mut rng = StdRng::seed_from_u64(seed);
            let out = inj.inject(text, &mut rng);
            let tokens: Vec<&str> = out.split(' ').collect();

            let kept: Vec<&str> = tokens
                .iter()
                .copied()
                .filter(|t| !inj.tags().iter().any(|tag| tag.as_str() == *t))
                .collect();
            assert_eq!(kept, words);

            let inserted = tokens.len() - words.len();
            assert!((1..=3).contains(&inserted), "inserted {inserted} tags");
        }
    }

    #[test]
    fn plan_positions_are_distinct_descending_and_in_range() {
        let inj = default_injector();
        for n in 1..6 {
            for seed in 0..100 {
                let mut rng = StdRng::seed_from_u64(seed);
                let plan = inj.plan(n, &mut rng);

                assert!((1..=3).contains(&plan.tags.len()));
                assert_eq!(plan.positions.len(), plan.tags.len().min(n + 1));
                assert!(plan.positions.windows(2).all(|w| w[0] > w[1]));
                assert!(plan.positions.iter().all(|&p| p <= n));
            }
        }
    }

    #[test]
    fn output_joins_with_single_spaces() {
        let inj = injector(&["[chuckle]"], 0, 0);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(inj.inject("  spaced \n  out  ", &mut rng), "spaced out");
    }

    #[test]
    fn same_seed_same_output() {
        let inj = default_injector();
        let text = "one two three four five";
        let a = inj.inject(text, &mut StdRng::seed_from_u64(42));
        let b = inj.inject(text, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let empty = TagConfig {
            tags: vec![],
            ..TagConfig::default()
        };
        assert!(matches!(
            TagInjector::new(empty),
            Err(ConfigError::EmptyTagSet)
        ));

        let inverted = TagConfig {
            min_tags: 4,
            max_tags: 2,
            ..TagConfig::default()
        };
        assert!(matches!(
            TagInjector::new(inverted),
            Err(ConfigError::TagRange { min: 4, max: 2 })
        ));
    }
}
