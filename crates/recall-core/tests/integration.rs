//! Integration tests exercising the full pipeline across modules:
//! IDF update → embed → rank → assemble → snapshot.

use approx::assert_abs_diff_eq;
use proptest::prelude::*;
use recall_core::compose::{ELLIPSIS, PINNED_HEADER, RELEVANT_HEADER};
use recall_core::{
    ContextAssembler, ContextBudget, Document, MemorySource, Note, NoteRead, NoteSource,
    RecallError, SharedVectorizer, Vectorizer, build_context, cosine_similarity, find_similar,
    smart_truncate,
};

fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

fn vault() -> MemorySource {
    [
        Note::new(
            "standup.md",
            "Standup",
            "Daily standup meeting notes.\n\nBlocked on the deploy pipeline. Review pending.",
        ),
        Note::new(
            "roadmap.md",
            "Roadmap",
            "Quarterly roadmap and planning. Launch the beta in March. Hire two engineers.",
        ),
        Note::new(
            "recipes.md",
            "Recipes",
            "Pancakes need flour, eggs and milk. Whisk thoroughly before frying.",
        ),
        Note::new(
            "ideas.md",
            "Ideas",
            "Brainstorm: a plugin that summarizes meeting transcripts. Another concept is offline sync.",
        ),
    ]
    .into_iter()
    .collect()
}

/// IDF from a three-document corpus; the cat document must outrank the dog one.
#[test]
fn idf_weighted_ranking_scenario() {
    let mut v = Vectorizer::default();
    v.update_idf(&["the cat sat", "the dog ran", "cats and dogs"]);

    let items = vec![
        Document::new("a", "a cat sat on a mat"),
        Document::new("b", "dogs are loyal"),
    ];
    let top = find_similar(&mut v, "cat", &items, 1).unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].id, "a");

    let query = v.embed("cat");
    let b_score = cosine_similarity(&query, &v.embed("dogs are loyal")).unwrap();
    assert!(top[0].score > b_score, "{} <= {b_score}", top[0].score);
}

/// One 1000-character pinned note with no blank lines in a 200-character budget.
#[test]
fn pinned_note_truncated_to_tier_ceiling() {
    let pinned: Vec<NoteRead> = vec![Ok(Note::new("long", "Long", "w".repeat(1000)))];
    let out = build_context("", &pinned, &[], 200);

    assert!(out.starts_with(PINNED_HEADER));
    let tier1 = out.split("\n\n===").next().unwrap();
    assert!(tier1.chars().count() <= 120, "tier 1 is {} chars", tier1.chars().count());
    assert!(tier1.ends_with(ELLIPSIS));
}

#[test]
fn megabyte_pinned_note_stays_in_budget() {
    let body = "lorem ipsum dolor ".repeat(60_000);
    assert!(body.len() > 1_000_000);
    let pinned: Vec<NoteRead> = vec![Ok(Note::new("huge", "Huge", body.clone()))];
    let candidates: Vec<NoteRead> = vec![Ok(Note::new("other", "Lorem", body))];

    for budget in [0, 1, 50, 200, 4000, 20_000] {
        let out = build_context("lorem ipsum", &pinned, &candidates, budget);
        assert!(out.chars().count() <= budget, "budget {budget}: {} chars", out.chars().count());
    }
}

#[test]
fn vault_pipeline_end_to_end() {
    let source = vault();
    let ids = source.list_ids();
    let notes: Vec<Note> = source.read_many(&ids).into_iter().map(|r| r.unwrap()).collect();

    let shared = SharedVectorizer::default();
    let bodies: Vec<&str> = notes.iter().map(|n| n.body.as_str()).collect();
    shared.update_idf(&bodies);

    let docs: Vec<Document> = notes.iter().map(Document::from).collect();
    let ranked = shared.find_similar("meeting standup review", &docs, 2).unwrap();
    assert_eq!(ranked[0].id, "standup.md");

    let result = ContextAssembler::new(ContextBudget::with_total(1200)).build_from_source(
        "roadmap launch planning",
        &["standup.md".to_string(), "deleted.md".to_string()],
        &ids,
        &source,
    );
    assert_eq!(result.metrics.skipped, 1);
    assert_eq!(result.included_ids[0], "standup.md");
    assert!(result.included_ids.contains(&"roadmap.md".to_string()));
    assert!(result.context.contains(RELEVANT_HEADER));
    assert!(result.context.chars().count() <= 1200);
}

#[test]
fn snapshot_restores_identical_rankings() {
    let source = vault();
    let notes: Vec<Note> = source
        .read_many(&source.list_ids())
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    let docs: Vec<Document> = notes.iter().map(Document::from).collect();

    let mut original = Vectorizer::default();
    let bodies: Vec<&str> = notes.iter().map(|n| n.body.as_str()).collect();
    original.update_idf(&bodies);
    let probes = ["meeting", "pancakes eggs", "beta launch", "offline plugin"];
    for probe in probes {
        find_similar(&mut original, probe, &docs, 4).unwrap();
    }

    let payload = original.serialize().unwrap();
    let mut restored = Vectorizer::default();
    restored.deserialize(&payload).unwrap();

    for probe in probes {
        assert_eq!(
            find_similar(&mut original, probe, &docs, 4).unwrap(),
            find_similar(&mut restored, probe, &docs, 4).unwrap(),
            "probe '{probe}'"
        );
    }
}

#[test]
fn corrupt_snapshot_is_atomic() {
    let shared = SharedVectorizer::default();
    shared.update_idf(&["alpha beta", "gamma"]);
    let before = shared.serialize().unwrap();

    let truncated = &before[..before.len() / 2];
    let err = shared.deserialize(truncated).unwrap_err();
    assert!(matches!(err, RecallError::SerializationCorrupt(_)));
    assert_eq!(shared.serialize().unwrap(), before);
}

#[test]
fn semantic_priors_group_related_words() {
    let mut v = Vectorizer::default();
    let task = v.embed("task");
    let todo = v.embed("todo");
    let zebra = v.embed("zebra");
    assert!(cosine_similarity(&task, &todo).unwrap() > cosine_similarity(&task, &zebra).unwrap());
}

proptest! {
    #[test]
    fn embed_is_unit_or_zero(text in "[a-zA-Z0-9 ,.!?']{0,120}") {
        let mut v = Vectorizer::default();
        let e = v.embed(&text);
        prop_assert_eq!(e.len(), 128);
        if recall_core::tokenize(&text).is_empty() {
            prop_assert!(e.iter().all(|x| *x == 0.0));
        } else {
            prop_assert!((norm(&e) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn embed_is_unit_or_zero_after_idf_update(
        corpus in prop::collection::vec("[a-z ]{0,60}", 1..5),
        text in "[a-z ]{0,80}",
    ) {
        let mut v = Vectorizer::default();
        v.update_idf(&corpus);
        // Query drawn from the corpus too, so zero-IDF tokens are common
        for t in corpus.iter().chain(std::iter::once(&text)) {
            let e = v.embed(t);
            if recall_core::tokenize(t).is_empty() {
                prop_assert!(e.iter().all(|x| *x == 0.0));
            } else {
                prop_assert!((norm(&e) - 1.0).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn embed_is_deterministic(text in "[a-z ]{0,80}") {
        let mut v = Vectorizer::default();
        let a = v.embed(&text);
        let b = v.embed(&text);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn cosine_is_symmetric(a in "[a-z ]{3,60}", b in "[a-z ]{3,60}") {
        let mut v = Vectorizer::default();
        let ea = v.embed(&a);
        let eb = v.embed(&b);
        let ab = cosine_similarity(&ea, &eb).unwrap();
        let ba = cosine_similarity(&eb, &ea).unwrap();
        prop_assert_eq!(ab, ba);
        prop_assert!((-1.0..=1.0).contains(&ab));
    }

    #[test]
    fn cosine_self_is_one(values in proptest::collection::vec(-100.0f64..100.0, 1..64)) {
        prop_assume!(values.iter().any(|x| x.abs() > 1e-3));
        let sim = cosine_similarity(&values, &values).unwrap();
        assert_abs_diff_eq!(sim, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn find_similar_bounded_and_sorted(
        texts in proptest::collection::vec("[a-z ]{0,40}", 0..12),
        query in "[a-z ]{0,30}",
        top_k in 0usize..8,
    ) {
        let mut v = Vectorizer::default();
        let items: Vec<Document> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| Document::new(i.to_string(), t.clone()))
            .collect();
        let results = find_similar(&mut v, &query, &items, top_k).unwrap();
        prop_assert!(results.len() <= top_k);
        prop_assert!(results.len() <= items.len());
        prop_assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn context_never_exceeds_budget(
        pinned in proptest::collection::vec(("[A-Za-z ]{0,30}", "[a-z .!?\n]{0,2500}"), 0..4),
        candidates in proptest::collection::vec(("[A-Za-z ]{0,30}", "[a-z .!?\n]{0,2500}"), 0..6),
        query in "[a-z ]{0,40}",
        budget in 0usize..3000,
    ) {
        let to_reads = |items: &[(String, String)], prefix: &str| -> Vec<NoteRead> {
            items
                .iter()
                .enumerate()
                .map(|(i, (title, body))| Ok(Note::new(format!("{prefix}{i}"), title.clone(), body.clone())))
                .collect()
        };
        let pinned = to_reads(&pinned, "p");
        let candidates = to_reads(&candidates, "c");
        let out = build_context(&query, &pinned, &candidates, budget);
        prop_assert!(out.chars().count() <= budget);
    }

    #[test]
    fn truncation_keeps_fitting_first_paragraph(
        first in "[a-z ]{1,80}",
        rest in "[a-z ]{0,400}",
        cap in 0usize..300,
    ) {
        let first = first.trim().to_string();
        prop_assume!(!first.is_empty() && !rest.trim().is_empty());
        let text = format!("{first}\n\n{rest}");
        let out = smart_truncate(&text, cap);
        if first.chars().count() <= cap {
            prop_assert!(out.starts_with(&first));
            let first_with_ellipsis = format!("{first}{ELLIPSIS}");
            prop_assert!(!out.starts_with(&first_with_ellipsis));
        } else {
            prop_assert!(out.ends_with(ELLIPSIS));
        }
    }
}
