//! Deterministic demo data.

use taskboard_core::{Category, Status, Task, TaskId};
use time::{Date, Duration};

/// Days back from `today` that generated tasks may fall on.
pub const SAMPLE_WINDOW_DAYS: u16 = 90;

static TITLES: [(Category, [&str; 10]); 4] = [
    (
        Category::A,
        [
            "Implement responsive navigation",
            "Create reusable button component",
            "Add form validation",
            "Optimize bundle size",
            "Fix CSS layout issues",
            "Implement dark mode",
            "Add loading states",
            "Create error boundaries",
            "Implement infinite scroll",
            "Add accessibility features",
        ],
    ),
    (
        Category::B,
        [
            "Design REST API endpoints",
            "Implement authentication",
            "Add database migrations",
            "Optimize query performance",
            "Implement caching layer",
            "Add rate limiting",
            "Create API documentation",
            "Implement webhooks",
            "Add logging system",
            "Setup monitoring",
        ],
    ),
    (
        Category::C,
        [
            "Create wireframes",
            "Design component library",
            "Update brand guidelines",
            "Create user flow diagrams",
            "Design mobile layouts",
            "Create icon set",
            "Design loading animations",
            "Update color palette",
            "Create style guide",
            "Design error states",
        ],
    ),
    (
        Category::D,
        [
            "Write unit tests",
            "Add integration tests",
            "Implement E2E tests",
            "Add performance tests",
            "Create test fixtures",
            "Add accessibility tests",
            "Implement visual regression tests",
            "Add load testing",
            "Create test documentation",
            "Setup CI/CD pipeline",
        ],
    ),
];

/// `SplitMix64` step; good enough to spread demo values, not for anything else.
const fn mix(seed: u64) -> u64 {
    let mut z = seed.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

fn pick(state: &mut u64, bound: usize) -> usize {
    *state = mix(*state);
    let bound = u64::try_from(bound).unwrap_or(u64::MAX);
    usize::try_from(*state % bound).unwrap_or_default()
}

/// Generate `count` tasks dated within [`SAMPLE_WINDOW_DAYS`] before `today`, sorted by
/// date. The same `seed` always yields the same tasks.
#[must_use]
pub fn sample_tasks(count: usize, today: Date, seed: u64) -> Vec<Task> {
    let start = today.saturating_sub(Duration::days(i64::from(SAMPLE_WINDOW_DAYS)));
    let mut state = seed;
    let mut tasks: Vec<Task> = (1..=count)
        .map(|n| {
            let (category, titles) = &TITLES[pick(&mut state, TITLES.len())];
            let title = titles[pick(&mut state, titles.len())];
            let status = Status::CANONICAL[pick(&mut state, Status::CANONICAL.len())].clone();
            let offset = i64::try_from(pick(&mut state, usize::from(SAMPLE_WINDOW_DAYS))).unwrap_or_default();
            let amount = f64::from(u32::try_from(100 + pick(&mut state, 900)).unwrap_or(100));
            Task {
                id: TaskId::sequential(n),
                title: format!("{title} #{n}"),
                category: category.clone(),
                status,
                date: start + Duration::days(offset),
                amount,
            }
        })
        .collect();
    tasks.sort_by_key(|task| task.date);
    tasks
}
