use search_core::{DocId, RankingQueue};

#[test]
fn top_two_documents() {
    let mut ranking = RankingQueue::new();
    ranking.insert(0.9, DocId::from("doc1"));
    ranking.insert(0.7, DocId::from("doc2"));
    ranking.insert(0.85, DocId::from("doc3"));
    let top: Vec<String> = ranking.get_top(2).into_iter().map(|e| e.doc.to_string()).collect();
    assert_eq!(top, vec!["doc1", "doc3"]);
    assert!(!ranking.is_empty());
}

#[test]
fn draining_everything_returns_every_entry() {
    let mut ranking = RankingQueue::new();
    let scores = [0.1, 0.5, 0.5, 0.3, 0.9, 0.0];
    for (i, s) in scores.iter().enumerate() {
        ranking.insert(*s, DocId::from(i as u64));
    }
    let all = ranking.get_top(100);
    assert_eq!(all.len(), scores.len());
    assert!(all.windows(2).all(|w| w[0].score >= w[1].score));
    assert_eq!(all[0].doc, DocId::from(4u64));
    assert!(ranking.is_empty());
    assert!(ranking.get_top(1).is_empty());
}
