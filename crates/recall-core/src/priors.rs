//! Semantic-group priors.
//!
//! Ten hand-picked topic clusters, each with a base direction and a list of
//! seed words. Every seed word starts life as its group's base vector plus a
//! small jitter, so words in the same cluster embed nearly parallel.
//!
//! The generator is seeded with [`PRIOR_SEED`], making priors identical across
//! processes and keeping serialized word-vector snapshots compatible.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::constants::{PRIOR_JITTER, PRIOR_SEED};
use crate::vectorizer::{Embedding, l2_normalize};

/// A topic cluster and its curated seed words.
#[derive(Debug, Clone, Copy)]
pub struct SemanticGroup {
    pub name: &'static str,
    pub seeds: &'static [&'static str],
}

pub const SEMANTIC_GROUPS: [SemanticGroup; 10] = [
    SemanticGroup {
        name: "task",
        seeds: &["task", "tasks", "todo", "todos", "action", "chore", "assignment", "errand"],
    },
    SemanticGroup {
        name: "time",
        seeds: &["time", "date", "deadline", "schedule", "today", "tomorrow", "week", "calendar"],
    },
    SemanticGroup {
        name: "project",
        seeds: &["project", "projects", "initiative", "milestone", "goal", "objective", "deliverable"],
    },
    SemanticGroup {
        name: "note",
        seeds: &["note", "notes", "memo", "journal", "entry", "record", "writeup"],
    },
    SemanticGroup {
        name: "importance",
        seeds: &["important", "urgent", "priority", "critical", "essential", "crucial", "vital"],
    },
    SemanticGroup {
        name: "completion",
        seeds: &["done", "complete", "completed", "finished", "finish", "resolved", "closed"],
    },
    SemanticGroup {
        name: "planning",
        seeds: &["plan", "plans", "planning", "strategy", "roadmap", "outline", "agenda"],
    },
    SemanticGroup {
        name: "meeting",
        seeds: &["meeting", "meetings", "call", "discussion", "sync", "standup", "conference"],
    },
    SemanticGroup {
        name: "idea",
        seeds: &["idea", "ideas", "concept", "thought", "brainstorm", "insight", "inspiration"],
    },
    SemanticGroup {
        name: "review",
        seeds: &["review", "feedback", "evaluate", "evaluation", "assessment", "retrospective", "retro"],
    },
];

/// Generate the seed-word vectors for every semantic group at `dimension`.
///
/// Returns `(word, vector)` pairs; every vector is unit-normalized.
pub fn semantic_priors(dimension: usize) -> Vec<(String, Embedding)> {
    let mut rng = SmallRng::seed_from_u64(PRIOR_SEED);
    let mut priors = Vec::new();

    for group in &SEMANTIC_GROUPS {
        let mut base: Embedding = (0..dimension)
            .map(|_| rng.random_range(-1.0..1.0))
            .collect();
        l2_normalize(&mut base);

        for seed in group.seeds {
            let mut vector: Embedding = base
                .iter()
                .map(|b| b + rng.random_range(-PRIOR_JITTER..PRIOR_JITTER))
                .collect();
            l2_normalize(&mut vector);
            priors.push((seed.to_string(), vector));
        }
    }

    priors
}

/// Name of the group a seed word belongs to, if any.
pub fn group_of(word: &str) -> Option<&'static str> {
    SEMANTIC_GROUPS
        .iter()
        .find(|g| g.seeds.contains(&word))
        .map(|g| g.name)
}
