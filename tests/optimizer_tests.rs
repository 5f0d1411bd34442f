use rinkroster::config::RosterConstraints;
use rinkroster::optimizer::sweep::sweep_salary_caps;
use rinkroster::parallel::WorkerPool;
use rinkroster::{optimize_roster, Candidate, OptimizeError, Position, PositionCategory};

/// Deterministic linear congruential generator so pools are reproducible without a rand crate.
struct Lcg(u64);

impl Lcg {
    fn next_unit(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
}

fn random_pool(seed: u64, forwards: usize, defensemen: usize, goalies: usize) -> Vec<Candidate> {
    let mut rng = Lcg(seed);
    let mut pool = Vec::new();
    let groups = [
        (Position::Center, forwards),
        (Position::Defenseman, defensemen),
        (Position::Goalie, goalies),
    ];
    for (position, count) in groups {
        for index in 0..count {
            let score = (rng.next_unit() * 100.0).round() / 10.0;
            let cap_hit = (1.0 + rng.next_unit() * 9.0).round();
            pool.push(Candidate::new(
                format!("{}{index}", position.code()),
                position,
                score,
                cap_hit,
            ));
        }
    }
    pool
}

/// Exhaustive search over every subset. Only usable for tiny pools.
fn brute_force_best(candidates: &[Candidate], constraints: &RosterConstraints) -> Option<f64> {
    let mut best: Option<f64> = None;
    for mask in 0u32..(1u32 << candidates.len()) {
        let picked: Vec<&Candidate> = candidates
            .iter()
            .enumerate()
            .filter(|(index, _)| mask & (1 << index) != 0)
            .map(|(_, candidate)| candidate)
            .collect();
        let quotas_met = PositionCategory::ALL.iter().all(|&category| {
            picked.iter().filter(|c| c.category() == category).count()
                == constraints.quota(category) as usize
        });
        let spent: f64 = picked.iter().map(|c| c.cap_hit).sum();
        if !quotas_met || spent > constraints.salary_cap {
            continue;
        }
        let score: f64 = picked.iter().map(|c| c.score).sum();
        if best.map_or(true, |current| score > current) {
            best = Some(score);
        }
    }
    best
}

#[test]
fn cheaper_goalie_wins_under_tight_cap() {
    let candidates = vec![
        Candidate::new("Goalie A", Position::Goalie, 10.0, 5.0),
        Candidate::new("Goalie B", Position::Goalie, 8.0, 3.0),
    ];
    let constraints = RosterConstraints::default()
        .with_quotas(0, 0, 1)
        .with_salary_cap(4.0);

    let solution = optimize_roster(&candidates, &constraints).expect("roster should solve");
    assert_eq!(solution.selected.len(), 1);
    assert_eq!(solution.selected[0].id, "Goalie B");
    assert_eq!(solution.total_score, 8.0);
    assert_eq!(solution.total_cap_hit, 3.0);
    assert_eq!(solution.cap_space, 1.0);
}

#[test]
fn tied_rosters_return_an_optimal_choice() {
    let candidates = vec![
        Candidate::new("x", Position::Defenseman, 5.0, 2.0),
        Candidate::new("y", Position::Defenseman, 5.0, 2.0),
    ];
    let constraints = RosterConstraints::default()
        .with_quotas(0, 1, 0)
        .with_salary_cap(2.0);

    let solution = optimize_roster(&candidates, &constraints).expect("roster should solve");
    assert_eq!(solution.selected.len(), 1);
    assert_eq!(solution.total_score, 5.0);
    assert!(["x", "y"].contains(&solution.selected[0].id.as_str()));
}

#[test]
fn matches_exhaustive_search_on_small_pools() {
    for seed in 1..=8u64 {
        let candidates = random_pool(seed, 6, 4, 3);
        let constraints = RosterConstraints::default()
            .with_quotas(3, 2, 1)
            .with_salary_cap(25.0);

        let expected = brute_force_best(&candidates, &constraints);
        match (optimize_roster(&candidates, &constraints), expected) {
            (Ok(solution), Some(best)) => {
                assert!(
                    (solution.total_score - best).abs() < 1e-6,
                    "seed {seed}: solver {} vs exhaustive {best}",
                    solution.total_score
                );
            }
            (Err(OptimizeError::Infeasible(_)), None) => {}
            (outcome, expected) => panic!("seed {seed}: {outcome:?} vs {expected:?}"),
        }
    }
}

#[test]
fn solution_meets_every_quota_and_the_cap() {
    let candidates = random_pool(42, 30, 15, 6);
    let constraints = RosterConstraints::default()
        .with_quotas(12, 6, 2)
        .with_salary_cap(110.0);

    let solution = optimize_roster(&candidates, &constraints).expect("roster should solve");
    assert_eq!(solution.count(PositionCategory::Forward), 12);
    assert_eq!(solution.count(PositionCategory::Defenseman), 6);
    assert_eq!(solution.count(PositionCategory::Goalie), 2);
    assert!(solution.total_cap_hit <= constraints.salary_cap);
    assert_eq!(solution.cap_space, constraints.salary_cap - solution.total_cap_hit);

    let mut ids: Vec<&str> = solution.selected.iter().map(|c| c.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 20);
}

#[test]
fn raising_the_cap_never_lowers_the_score() {
    let candidates = random_pool(7, 10, 6, 3);
    let base = RosterConstraints::default().with_quotas(4, 2, 1);
    let caps = [20.0, 30.0, 40.0, 60.0, 100.0];

    let points = sweep_salary_caps(&candidates, &base, &caps, &WorkerPool::with_workers(2))
        .expect("sweep should run");
    let scores: Vec<f64> = points
        .iter()
        .filter(|point| point.is_optimal())
        .filter_map(|point| point.total_score)
        .collect();
    assert!(!scores.is_empty());
    for pair in scores.windows(2) {
        assert!(pair[1] + 1e-9 >= pair[0], "scores should not decrease: {scores:?}");
    }
}

#[test]
fn too_few_goalies_is_infeasible() {
    let candidates = random_pool(3, 14, 7, 1);
    let err = optimize_roster(&candidates, &RosterConstraints::default())
        .expect_err("two goalies cannot be found in a pool of one");
    assert!(matches!(err, OptimizeError::Infeasible(_)));
    assert!(err.to_string().contains("goalie"));
}

#[test]
fn generous_time_limit_still_solves() {
    let candidates = random_pool(11, 8, 4, 2);
    let constraints = RosterConstraints::default()
        .with_quotas(4, 2, 1)
        .with_salary_cap(50.0)
        .with_time_limit_seconds(30.0);

    let solution = optimize_roster(&candidates, &constraints).expect("roster should solve");
    assert_eq!(solution.selected.len(), 7);
}

#[test]
fn free_players_fit_a_zero_cap() {
    let candidates = vec![
        Candidate::new("a", Position::LeftWing, 3.0, 0.0),
        Candidate::new("b", Position::RightWing, 4.0, 1.0),
    ];
    let constraints = RosterConstraints::default()
        .with_quotas(1, 0, 0)
        .with_salary_cap(0.0);

    let solution = optimize_roster(&candidates, &constraints).expect("roster should solve");
    assert_eq!(solution.selected[0].id, "a");
    assert_eq!(solution.cap_space, 0.0);
}

#[test]
fn whole_dollar_margin_under_a_league_cap_is_respected() {
    let candidates = vec![
        Candidate::new("a", Position::Center, 5.0, 41_750_001.0),
        Candidate::new("b", Position::Center, 5.0, 41_749_999.0),
        Candidate::new("c", Position::Center, 1.0, 1.0),
    ];
    let constraints = RosterConstraints::default()
        .with_quotas(2, 0, 0)
        .with_salary_cap(83_499_999.0);

    let solution = optimize_roster(&candidates, &constraints).expect("roster should solve");
    assert_eq!(solution.total_score, 6.0);
    assert_eq!(solution.total_cap_hit, 41_750_000.0);
    let mut ids: Vec<&str> = solution.selected.iter().map(|c| c.id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["b", "c"]);
}
