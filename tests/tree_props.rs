//! Property tests: structural and probabilistic invariants of learned trees
//! over randomly generated corpora.

use proptest::prelude::*;
use songpst::learn::learn_tree;
use songpst::tree::fix_paths;
use songpst::{FrequencyTables, PstConfig};

fn corpora() -> impl Strategy<Value = Vec<Vec<String>>> {
    // 3..12 songs of 2..20 syllables over a 5-symbol alphabet.
    let syllable = (0u8..5).prop_map(|i| ((b'a' + i) as char).to_string());
    let sequence = proptest::collection::vec(syllable, 2..20);
    proptest::collection::vec(sequence, 3..12)
}

fn configs() -> impl Strategy<Value = PstConfig> {
    (1usize..4, 0.0f64..0.2, prop_oneof![Just(1.2f64), Just(1.6), Just(2.5)]).prop_map(
        |(max_order, p_min, r)| PstConfig {
            max_order,
            p_min,
            g_min: 0.01,
            r,
            alpha: 17.5,
            smoothing: true,
        },
    )
}

proptest! {
    #[test]
    fn learned_trees_are_structurally_sound(corpus in corpora(), config in configs()) {
        let tables = FrequencyTables::from_sequences(&corpus, config.max_order, None)
            .expect("corpus is non-empty");
        let tree = learn_tree(&tables, &config).expect("learning succeeds");

        for (at, node) in tree.iter() {
            // Depth bucket matches context length, capped at L.
            prop_assert_eq!(node.context.len(), at.depth);
            prop_assert!(at.depth <= config.max_order);

            if at.is_root() {
                prop_assert_eq!(&node.label, "epsilon");
                continue;
            }

            // No depth gaps; parent context is a one-symbol-shorter suffix.
            prop_assert_eq!(node.parent.depth, at.depth - 1);
            let parent = tree.node(node.parent);
            prop_assert_eq!(parent.context.as_slice(), &node.context[1..]);
        }
    }

    #[test]
    fn smoothed_distributions_are_valid(corpus in corpora(), config in configs()) {
        let tables = FrequencyTables::from_sequences(&corpus, config.max_order, None)
            .expect("corpus is non-empty");
        let tree = learn_tree(&tables, &config).expect("learning succeeds");

        for (_, node) in tree.iter() {
            let sum: f64 = node.smoothed_distribution.iter().sum();
            prop_assert!((sum - 1.0).abs() < 1e-9, "smoothed sums to {}", sum);
            prop_assert!(node.smoothed_distribution.iter().all(|&g| g >= config.g_min));

            let raw_sum: f64 = node.raw_distribution.iter().sum();
            prop_assert!(raw_sum <= 1.0 + 1e-9);
            prop_assert!(node.context_probability <= 1.0 + 1e-9);
        }
    }

    #[test]
    fn repair_is_idempotent_on_learned_trees(corpus in corpora(), config in configs()) {
        let tables = FrequencyTables::from_sequences(&corpus, config.max_order, None)
            .expect("corpus is non-empty");
        let mut tree = learn_tree(&tables, &config).expect("learning succeeds");

        let report = fix_paths(&mut tree, tables.alphabet()).expect("repair converges");
        prop_assert_eq!(report.inserted, 0);
        prop_assert_eq!(report.tightened, 0);
    }

    #[test]
    fn contexts_are_unique_within_a_depth(corpus in corpora(), config in configs()) {
        let tables = FrequencyTables::from_sequences(&corpus, config.max_order, None)
            .expect("corpus is non-empty");
        let tree = learn_tree(&tables, &config).expect("learning succeeds");

        for depth in 0..=tree.max_depth() {
            let level = tree.level(depth);
            for i in 0..level.len() {
                for j in (i + 1)..level.len() {
                    prop_assert_ne!(&level[i].context, &level[j].context);
                }
            }
        }
    }
}
