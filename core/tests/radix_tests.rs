use search_core::RadixTree;
use std::collections::BTreeSet;

#[test]
fn autocomplete_languages() {
    let mut tree = RadixTree::new();
    for word in ["python", "pythonic", "java", "javascript"] {
        tree.insert(word);
    }
    let set = |v: Vec<String>| v.into_iter().collect::<BTreeSet<_>>();
    assert_eq!(set(tree.autocomplete("py")), BTreeSet::from(["python".to_string(), "pythonic".to_string()]));
    assert_eq!(set(tree.autocomplete("ja")), BTreeSet::from(["java".to_string(), "javascript".to_string()]));
    assert!(tree.autocomplete("z").is_empty());
}

#[test]
fn every_prefix_returns_exactly_matching_words() {
    let words = [
        "search", "searcher", "sea", "seal", "season", "engine", "engineer", "engineering",
        "eng", "a", "ab", "abc", "abd", "b", "rust", "rusty", "rustacean", "trie", "tree", "treat",
    ];
    let tree: RadixTree = words.iter().collect();
    tree.validate().unwrap();
    assert_eq!(tree.len(), words.len());

    for word in &words {
        for end in 0..=word.len() {
            let prefix = &word[..end];
            let got: BTreeSet<String> = tree.autocomplete(prefix).into_iter().collect();
            let want: BTreeSet<String> =
                words.iter().filter(|w| w.starts_with(prefix)).map(|w| w.to_string()).collect();
            assert_eq!(got, want, "prefix {prefix:?}");
        }
    }
}

#[test]
fn suggestions_are_lexicographic() {
    let tree: RadixTree = ["delta", "alpha", "charlie", "bravo", "alphabet"].into_iter().collect();
    assert_eq!(tree.words(), vec!["alpha", "alphabet", "bravo", "charlie", "delta"]);
}

#[test]
fn insertion_order_does_not_change_structure() {
    let words = ["romane", "romanus", "romulus", "rubens", "ruber", "rubicon", "rubicundus"];
    let forward: RadixTree = words.iter().collect();
    let backward: RadixTree = words.iter().rev().collect();
    assert_eq!(forward.words(), backward.words());
    forward.validate().unwrap();
    backward.validate().unwrap();
}
