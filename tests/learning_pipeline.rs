//! End-to-end learning tests: counting, seeding, admission, repair,
//! smoothing, and scoring against the reference corpus.

mod test_helpers;
use test_helpers::*;

use songpst::learn::{learn_tree, seed_candidates, smooth};
use songpst::{Node, NodeRef, Pst, PstConfig, SuffixTree};

#[test]
fn reference_corpus_counts() {
    let tables = reference_tables(2);
    assert_eq!(tables.alphabet().symbols(), ["A", "B", "C", "D", "E"]);
    assert_eq!(
        tables.next_symbol_frequencies(&[]).unwrap(),
        vec![1.0, 2.0, 3.0, 2.0, 1.0]
    );
    assert_eq!(tables.p_starting_symbol(), [1.0, 1.0, 1.0, 0.0, 0.0]);
    assert_eq!(tables.total_windows(0), 9.0);
}

#[test]
fn seeding_admits_every_symbol_clearing_p_min() {
    // Order-0 probabilities: 1/9, 2/9, 3/9, 2/9, 1/9 -- all >= 0.05, E's
    // 0.111 included.
    let seeds = seed_candidates(&reference_tables(1), 0.05).unwrap();
    assert_eq!(seeds.len(), 5);
    assert_eq!(seeds, vec![vec![0], vec![1], vec![2], vec![3], vec![4]]);
}

#[test]
fn order_2_slice_has_single_nonzero_entry() {
    // Exactly three trigrams exist; context (A, B) is always followed by C.
    let tables = reference_tables(2);
    let freqs = tables.next_symbol_frequencies(&[0, 1]).unwrap();
    assert_eq!(freqs, vec![0.0, 0.0, 1.0, 0.0, 0.0]);
}

#[test]
fn zero_count_context_is_not_an_error() {
    let tables = reference_tables(2);
    // (E, A) never occurs.
    let freqs = tables.next_symbol_frequencies(&[4, 0]).unwrap();
    assert!(freqs.iter().all(|&f| f == 0.0));
    assert_eq!(tables.total_occurrences(&[4, 0]).unwrap(), 0.0);

    let mut tree = SuffixTree::new(2);
    tree.push(Node::new(vec![4, 0], NodeRef::ROOT, "EA".into(), false));
    smooth(&mut tree, &tables, &test_config(2)).unwrap();

    let node = tree.node(tree.find(&[4, 0]).unwrap());
    assert!(node.raw_distribution.iter().all(|&p| p == 0.0));
    assert!(node.smoothed_distribution.iter().all(|&g| g >= 0.01));
}

#[test]
fn structured_corpus_learns_second_order_contexts() {
    let model = Pst::fit(&structured_corpus(10), test_config(3)).unwrap();
    let tree = model.tree();
    assert!(!tree.is_root_only());

    // "b" alone is ambiguous (followed by c or a); the second-order contexts
    // disambiguate and must be retained.
    let alphabet = model.alphabet();
    let a = alphabet.index_of("a").unwrap();
    let b = alphabet.index_of("b").unwrap();
    let c = alphabet.index_of("c").unwrap();
    let d = alphabet.index_of("d").unwrap();

    let ab = tree.find(&[a, b]).expect("context (a, b) retained");
    let db = tree.find(&[d, b]).expect("context (d, b) retained");

    // After (a, b) comes c; after (d, b) comes a.
    let ab_raw = &tree.node(ab).raw_distribution;
    assert!(ab_raw[c] > 0.99);
    let db_raw = &tree.node(db).raw_distribution;
    assert!(db_raw[a] > 0.99);
}

#[test]
fn learned_tree_satisfies_structural_invariants() {
    let model = Pst::fit(&structured_corpus(10), test_config(3)).unwrap();
    let tree = model.tree();

    for (at, node) in tree.iter() {
        assert_eq!(node.context.len(), at.depth);
        if at.is_root() {
            continue;
        }
        // No depth gaps, and each parent context is the node's with the
        // oldest symbol dropped.
        assert_eq!(node.parent.depth, at.depth - 1);
        let parent = tree.node(node.parent);
        assert_eq!(parent.context.as_slice(), &node.context[1..]);
    }
}

#[test]
fn smoothed_distributions_are_floored_and_normalized() {
    let model = Pst::fit(&structured_corpus(10), test_config(3)).unwrap();
    let g_min = model.config().g_min;

    for (_, node) in model.tree().iter() {
        let sum: f64 = node.smoothed_distribution.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9, "sums to {sum}");
        assert!(node.smoothed_distribution.iter().all(|&g| g >= g_min));
    }
}

#[test]
fn degenerate_threshold_keeps_only_the_root() {
    let config = PstConfig {
        p_min: 0.9,
        ..test_config(2)
    };
    let tree = learn_tree(&reference_tables(2), &config).unwrap();
    assert!(tree.is_root_only());
}

#[test]
fn exploring_beyond_table_depth_is_a_dimension_error() {
    // Config wants order 3 but the tables stop at order 1.
    let tables = reference_tables(1);
    let err = learn_tree(&tables, &test_config(3)).unwrap_err();
    assert!(matches!(err, songpst::LearnError::Dimension(_)));
}

#[test]
fn trained_model_prefers_its_own_songs() {
    let model = Pst::fit(&structured_corpus(10), test_config(3)).unwrap();
    let familiar = model.log_likelihood(&song("abcdba")).unwrap();
    let scrambled = model.log_likelihood(&song("cadbab")).unwrap();
    assert!(familiar > scrambled);
}

#[test]
fn shared_alphabet_aligns_two_corpora() {
    use songpst::score::compare_distributions;
    use songpst::Alphabet;

    let pre_songs = structured_corpus(10);
    let post_songs: Vec<Vec<String>> = (0..10).map(|_| song("abcba")).collect();
    let mut all = pre_songs.clone();
    all.extend(post_songs.clone());
    let alphabet = Alphabet::from_sequences(&all);

    let pre = Pst::fit_with_alphabet(&pre_songs, test_config(2), alphabet.clone()).unwrap();
    let post = Pst::fit_with_alphabet(&post_songs, test_config(2), alphabet.clone()).unwrap();

    let b = alphabet.index_of("b").unwrap();
    let pre_b = pre.tree().find(&[b]).map(|at| pre.tree().node(at));
    let post_b = post.tree().find(&[b]).map(|at| post.tree().node(at));
    if let (Some(pre_b), Some(post_b)) = (pre_b, post_b) {
        let comparison =
            compare_distributions(&pre_b.smoothed_distribution, &post_b.smoothed_distribution);
        assert!(comparison.kl_divergence >= 0.0);
        assert!(comparison.earth_movers_distance >= 0.0);
    }
}
