//! Randomized properties of the quantum solver building blocks.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use quartz_smt::quantum::prover::parse_model;
use quartz_smt::quantum::random_state::sample_state;
use quartz_smt::smtlib::to_smtlib;
use quartz_smt::terms::SmtTerm;

proptest! {
    /// Sampled fallback states are unit vectors for any power-of-two
    /// dimension.
    #[test]
    fn sampled_states_have_unit_l2_norm(exp in 0usize..8, seed in any::<u64>()) {
        let dim = 1usize << exp;
        let mut rng = StdRng::seed_from_u64(seed);
        let state = sample_state(dim, &mut rng);
        prop_assert_eq!(state.len(), dim);
        let norm: f64 = state.iter().map(|a| a.norm_sqr()).sum();
        prop_assert!((norm - 1.0).abs() < 1e-9, "norm was {}", norm);
    }

    /// Real literals survive a print/parse round trip through the model
    /// value grammar.
    #[test]
    fn printed_reals_parse_back(v in -1.0e6f64..1.0e6) {
        let printed = to_smtlib(&SmtTerm::real(v));
        let wrapped = format!("sat\n(define-fun x () Real {printed})\n");
        let model = parse_model(&wrapped);
        let (_, got) = model.first().expect("one entry");
        prop_assert!((got - v).abs() < 1e-6_f64.max(v.abs() * 1e-12));
    }
}
