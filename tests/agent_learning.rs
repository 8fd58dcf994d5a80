//! Learning behavior of the agent core: quantization, table indexing,
//! action selection and credit assignment.

mod common;

use std::collections::HashMap;

use common::{RecordingControl, random_key};
use pinball_bot::agent::{
    Action, ActionValues, Agent, AgentConfig, CreditAssignment, Aggregate, DEFAULT_REWARD,
    LastActions, MIN_REWARD, Quantizer, QuantizerConfig, StateKey, ValueTable, Vec2, epsilon_greedy,
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use statrs::distribution::{ChiSquared, ContinuousCDF};

#[test]
fn quantize_is_idempotent_over_sane_range() {
    let quantizer = Quantizer::new(QuantizerConfig::default());
    let mut rng = StdRng::seed_from_u64(11);

    for _ in 0..2_000 {
        let position = Vec2::new(rng.random_range(-10.0..10.0), rng.random_range(-10.0..10.0));
        let velocity = Vec2::new(rng.random_range(-10.0..10.0), rng.random_range(-10.0..10.0));
        let key = quantizer.quantize(position, velocity);

        let [px, py, vx, vy] = quantizer.decode(&key);
        let again = quantizer.quantize(Vec2::new(px, py), Vec2::new(vx, vy));
        assert_eq!(again, key, "re-quantizing {key} moved it");
    }
}

#[test]
fn find_or_insert_is_stable_without_intervening_inserts() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut table = ValueTable::new();

    for _ in 0..500 {
        let key = random_key(&mut rng);
        let (first, _) = table.find_or_insert(key);
        let (second, inserted) = table.find_or_insert(key);
        assert_eq!(first, second);
        assert!(!inserted);
        assert_eq!(table.key(first), &key);
    }
}

/// The window must keep pointing at the same states while the table grows
/// underneath it.
#[test]
fn window_indices_follow_their_states_across_insertions() {
    let mut rng = StdRng::seed_from_u64(2024);

    for _ in 0..20 {
        let mut table = ValueTable::new();
        let mut window = LastActions::new(16);
        // checked model: the keys the window entries refer to, oldest first
        let mut model: Vec<StateKey> = Vec::new();

        for _ in 0..300 {
            let key = random_key(&mut rng);
            let before: Vec<usize> = window.iter().map(|d| d.state_index).collect();

            let (index, inserted) = table.find_or_insert(key);
            if inserted {
                window.rebase(index);
                for (old, decision) in before.iter().zip(window.iter()) {
                    if *old >= index {
                        assert_eq!(decision.state_index, old + 1);
                    } else {
                        assert_eq!(decision.state_index, *old);
                    }
                }
            }
            for (decision, expected) in window.iter().zip(&model) {
                assert_eq!(table.key(decision.state_index), expected);
            }

            if rng.random_bool(0.6) {
                window.push(index, Action::ALL[rng.random_range(0..4)]);
                model.push(key);
                if model.len() > window.capacity() {
                    model.remove(0);
                }
            }
            assert_eq!(window.len(), model.len());
        }
    }
}

#[test]
fn greedy_with_unique_maximum_is_deterministic() {
    let mut values = ActionValues::new();
    values.ensure(&Action::ALL);
    values.set(Action::DisableRightFlipper, 0.8);
    values.set(Action::EnableLeftFlipper, 0.6);

    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..1_000 {
        assert_eq!(
            epsilon_greedy(&values, &Action::ALL, 0.0, &mut rng),
            Action::DisableRightFlipper
        );
    }
}

#[test]
fn pure_exploration_is_uniform() {
    let mut values = ActionValues::new();
    values.ensure(&Action::ALL);
    values.set(Action::EnableRightFlipper, 0.99);

    let draws = 40_000;
    let mut rng = StdRng::seed_from_u64(77);
    let mut counts: HashMap<Action, usize> = HashMap::new();
    for _ in 0..draws {
        *counts
            .entry(epsilon_greedy(&values, &Action::ALL, 1.0, &mut rng))
            .or_default() += 1;
    }

    let expected = draws as f64 / Action::ALL.len() as f64;
    let statistic: f64 = Action::ALL
        .iter()
        .map(|action| {
            let observed = counts.get(action).copied().unwrap_or(0) as f64;
            (observed - expected).powi(2) / expected
        })
        .sum();
    let critical = ChiSquared::new((Action::ALL.len() - 1) as f64)
        .unwrap()
        .inverse_cdf(0.999);
    assert!(
        statistic < critical,
        "chi-squared {statistic:.2} exceeds {critical:.2}: {counts:?}"
    );
}

#[test]
fn ties_are_broken_across_all_tied_actions() {
    let mut values = ActionValues::new();
    values.ensure(&Action::ALL);
    values.set(Action::EnableLeftFlipper, 0.7);
    values.set(Action::EnableRightFlipper, 0.7);

    let mut rng = StdRng::seed_from_u64(3);
    let mut seen: HashMap<Action, usize> = HashMap::new();
    for _ in 0..2_000 {
        *seen
            .entry(epsilon_greedy(&values, &Action::ALL, 0.0, &mut rng))
            .or_default() += 1;
    }
    assert_eq!(seen.len(), 2);
    assert!(seen[&Action::EnableLeftFlipper] > 800);
    assert!(seen[&Action::EnableRightFlipper] > 800);
}

#[test]
fn update_has_reward_as_fixed_point() {
    let credit = CreditAssignment::new(0.3, Aggregate::Average).unwrap();
    for value in [0.0, 0.25, 0.5, 0.9, 1.0] {
        assert_eq!(credit.apply_rewards(value, &[value]), value);
    }
}

#[test]
fn update_converges_monotonically() {
    let credit = CreditAssignment::new(0.25, Aggregate::Average).unwrap();
    let target = 0.9;
    let mut value = DEFAULT_REWARD;
    for _ in 0..50 {
        let next = credit.smooth(value, target);
        assert!(next >= value && next <= target);
        value = next;
    }
    assert!((value - target).abs() < 1e-6);
}

/// Three ticks through distinct states A, B, C with rewards `[]`, `[]`,
/// `[0.9]`: the decisions at A and B both move one alpha step towards 0.9.
#[test]
fn reward_is_backported_across_the_window() {
    let alpha = 0.25;
    let mut agent = Agent::new(
        AgentConfig::default()
            .with_alpha(alpha)
            .with_epsilon(0.0)
            .with_seed(8),
    )
    .unwrap();
    let mut control = RecordingControl::default();

    // inserted out of order so later inserts shift earlier indices
    let a = StateKey::from_buckets(10, 40, 0, 1);
    let b = StateKey::from_buckets(30, 40, 0, 1);
    let c = StateKey::from_buckets(-5, 40, 0, 1);

    let action_a = agent.think(a, &[], 0, &mut control);
    let action_b = agent.think(b, &[], 1, &mut control);
    let action_c = agent.think(c, &[0.9], 2, &mut control);

    let expected = DEFAULT_REWARD + alpha * (0.9 - DEFAULT_REWARD);
    let table = agent.table();
    assert!((table.get(&a).unwrap().get(action_a) - expected).abs() < 1e-12);
    assert!((table.get(&b).unwrap().get(action_b) - expected).abs() < 1e-12);
    assert_eq!(table.get(&c).unwrap().get(action_c), DEFAULT_REWARD);

    // everything A or B did not choose stays at the default
    for action in Action::ALL {
        if action != action_a {
            assert_eq!(table.get(&a).unwrap().get(action), DEFAULT_REWARD);
        }
    }
    assert_eq!(control.commands, 3);
}

/// A lost ball is an ordinary reward of 0.0: every decision in the window
/// takes one alpha step towards it.
#[test]
fn terminal_reward_updates_the_whole_window() {
    let alpha = 0.25;
    let mut agent = Agent::new(
        AgentConfig::default()
            .with_alpha(alpha)
            .with_epsilon(0.0)
            .with_seed(12),
    )
    .unwrap();
    let mut control = RecordingControl::default();

    let path = [
        StateKey::from_buckets(20, 70, 1, 2),
        StateKey::from_buckets(22, 75, 1, 2),
        StateKey::from_buckets(24, 80, 1, 3),
    ];
    let drained = StateKey::from_buckets(25, 99, 1, 3);

    let taken: Vec<Action> = path
        .iter()
        .enumerate()
        .map(|(tick, &key)| agent.think(key, &[], tick as u64, &mut control))
        .collect();
    assert_eq!(agent.recent_decisions().len(), 3);
    agent.think(drained, &[MIN_REWARD], 3, &mut control);

    let expected = DEFAULT_REWARD + alpha * (MIN_REWARD - DEFAULT_REWARD);
    for (key, action) in path.iter().zip(&taken) {
        let value = agent.table().get(key).unwrap().get(*action);
        assert!(
            (value - expected).abs() < 1e-12,
            "{key} / {action}: {value} != {expected}"
        );
    }
}

#[test]
fn quiet_ticks_pull_towards_the_current_state() {
    let mut agent = Agent::new(
        AgentConfig::default()
            .with_alpha(0.5)
            .with_epsilon(0.0)
            .with_seed(4),
    )
    .unwrap();
    let mut control = RecordingControl::default();
    let good = StateKey::from_buckets(1, 1, 0, 0);
    let before = StateKey::from_buckets(2, 2, 0, 0);

    // teach `good` that one action is worth 1.0
    let chosen = agent.think(good, &[], 0, &mut control);
    agent.think(before, &[1.0], 1, &mut control);
    assert_eq!(agent.table().get(&good).unwrap().get(chosen), 0.75);
    agent.forget_recent();

    // a quiet move from `before` into `good` pulls towards good's average
    let from_before = agent.think(before, &[], 2, &mut control);
    agent.think(good, &[], 3, &mut control);
    let updated = agent.table().get(&before).unwrap().get(from_before);
    assert!((updated - (0.5 + 0.5 * (0.75 - 0.5))).abs() < 1e-12);
}

#[test]
fn clear_states_drops_uninformative_rows() {
    let mut agent = Agent::new(AgentConfig::default().with_seed(1)).unwrap();
    let mut control = RecordingControl::default();
    for x in 0..10 {
        agent.think(StateKey::from_buckets(x, 0, 0, 0), &[], x as u64, &mut control);
    }
    agent.think(StateKey::from_buckets(100, 0, 0, 0), &[1.0], 10, &mut control);

    let informative = agent.table().informative_len();
    assert!(informative > 0);
    let removed = agent.clear_states();
    assert_eq!(agent.table().len(), informative);
    assert_eq!(removed, 11 - informative);
    assert!(agent.recent_decisions().is_empty());
}
