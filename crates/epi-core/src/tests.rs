//! Unit tests for epi-core primitives.

#[cfg(test)]
mod suids {
    use crate::{Suid, SuidGenerator};

    #[test]
    fn nil_is_zero() {
        assert!(Suid::NIL.is_nil());
        assert!(!Suid(1).is_nil());
        assert_eq!(Suid::default(), Suid::NIL);
    }

    #[test]
    fn single_rank_counts_up() {
        let mut g = SuidGenerator::new(0, 1);
        assert_eq!(g.next_suid(), Suid(1));
        assert_eq!(g.next_suid(), Suid(2));
        assert_eq!(g.next_suid(), Suid(3));
    }

    #[test]
    fn stripes_are_disjoint() {
        let mut g0 = SuidGenerator::new(0, 3);
        let mut g1 = SuidGenerator::new(1, 3);
        let mut g2 = SuidGenerator::new(2, 3);

        let mut seen = std::collections::HashSet::new();
        for _ in 0..100 {
            assert!(seen.insert(g0.next_suid()));
            assert!(seen.insert(g1.next_suid()));
            assert!(seen.insert(g2.next_suid()));
        }
    }

    #[test]
    fn never_produces_nil() {
        for rank in 0..4 {
            let mut g = SuidGenerator::new(rank, 4);
            for _ in 0..50 {
                assert!(!g.next_suid().is_nil());
            }
        }
    }

    #[test]
    #[should_panic]
    fn rank_out_of_range_panics() {
        let _ = SuidGenerator::new(2, 2);
    }
}

#[cfg(test)]
mod time {
    use crate::{SimClock, SimParams};

    #[test]
    fn advance_accumulates_days() {
        let mut clock = SimClock::new(1.0, 2000.0);
        assert_eq!(clock.time, 0.0);
        clock.advance();
        clock.advance();
        assert_eq!(clock.time, 2.0);
        assert_eq!(clock.timestep, 2);
    }

    #[test]
    fn year_tracks_elapsed_time() {
        let mut clock = SimClock::new(1.0, 2000.0);
        for _ in 0..365 {
            clock.advance();
        }
        assert!((clock.year() - 2001.0).abs() < 1e-3);
    }

    #[test]
    fn params_duration() {
        let p = SimParams { total_timesteps: 10, dt_days: 0.5, ..SimParams::default() };
        assert_eq!(p.duration_days(), 5.0);
        assert_eq!(p.make_clock().dt, 0.5);
    }
}

#[cfg(test)]
mod rng {
    use crate::{NodeRng, Suid};

    #[test]
    fn deterministic_same_seed() {
        let mut r1 = NodeRng::new(42, Suid(7));
        let mut r2 = NodeRng::new(42, Suid(7));
        for _ in 0..100 {
            assert_eq!(r1.uniform01(), r2.uniform01());
        }
    }

    #[test]
    fn different_nodes_diverge() {
        let mut r1 = NodeRng::new(42, Suid(1));
        let mut r2 = NodeRng::new(42, Suid(2));
        let a: f32 = r1.uniform01();
        let b: f32 = r2.uniform01();
        assert_ne!(a, b);
    }

    #[test]
    fn smart_draw_extremes_consume_no_randomness() {
        let mut r1 = NodeRng::new(1, Suid(1));
        let mut r2 = NodeRng::new(1, Suid(1));
        assert!(!r1.smart_draw(0.0));
        assert!(r1.smart_draw(1.0));
        assert!(!r1.smart_draw(-0.5));
        assert!(r1.smart_draw(2.0));
        // Streams still aligned after degenerate draws.
        assert_eq!(r1.uniform01(), r2.uniform01());
    }

    #[test]
    fn exponential_zero_rate_is_instant() {
        let mut rng = NodeRng::new(0, Suid(1));
        assert_eq!(rng.exponential(0.0), 0.0);
        assert_eq!(rng.exponential(-1.0), 0.0);
    }

    #[test]
    fn exponential_mean_matches_rate() {
        let mut rng = NodeRng::new(123, Suid(5));
        let n = 20_000;
        let rate = 0.25f32;
        let mean: f64 = (0..n).map(|_| rng.exponential(rate) as f64).sum::<f64>() / n as f64;
        let expected = 1.0 / rate as f64;
        assert!(
            (mean - expected).abs() / expected < 0.05,
            "mean {mean} vs expected {expected}"
        );
    }

    #[test]
    fn poisson_zero_lambda() {
        let mut rng = NodeRng::new(0, Suid(1));
        assert_eq!(rng.poisson(0.0), 0);
    }

    #[test]
    fn poisson_mean_matches_lambda() {
        let mut rng = NodeRng::new(9, Suid(3));
        let n = 20_000u64;
        let lambda = 4.0;
        let total: u64 = (0..n).map(|_| rng.poisson(lambda)).sum();
        let mean = total as f64 / n as f64;
        assert!((mean - lambda).abs() / lambda < 0.05, "mean {mean}");
    }
}

#[cfg(test)]
mod geo {
    use crate::GeoPoint;

    #[test]
    fn zero_distance() {
        let p = GeoPoint::new(12.5, 3.0);
        assert!(p.distance_km(p) < 1e-4);
    }

    #[test]
    fn one_degree_latitude() {
        let a = GeoPoint::new(0.0, 10.0);
        let b = GeoPoint::new(1.0, 10.0);
        let d = a.distance_km(b);
        assert!((d - 111.2).abs() < 1.0, "got {d}");
    }
}

#[cfg(test)]
mod properties {
    use crate::PropertyBag;

    #[test]
    fn set_and_get() {
        let mut bag = PropertyBag::new();
        bag.set("Risk", "High");
        assert_eq!(bag.get("Risk"), Some("High"));
        assert_eq!(bag.get("Accessibility"), None);
    }

    #[test]
    fn matches_restrictions() {
        let mut bag = PropertyBag::new();
        bag.set("Risk", "High");
        bag.set("Place", "Urban");

        assert!(bag.matches([("Risk", "High")]));
        assert!(bag.matches([("Risk", "High"), ("Place", "Urban")]));
        assert!(!bag.matches([("Risk", "Low")]));
        assert!(!bag.matches([("Missing", "X")]));
        assert!(bag.matches(std::iter::empty()));
    }
}

#[cfg(test)]
mod enums {
    use crate::{HumanStateChange, MigrationType};

    #[test]
    fn death_kinds() {
        assert!(HumanStateChange::KilledByInfection.is_death());
        assert!(HumanStateChange::DiedFromNaturalCauses.is_death());
        assert!(HumanStateChange::KilledByMcSampling.is_death());
        assert!(!HumanStateChange::Migrating.is_death());
        assert!(!HumanStateChange::None.is_death());
    }

    #[test]
    fn file_backed_types() {
        assert_eq!(MigrationType::FILE_BACKED.len(), 4);
        assert!(!MigrationType::FILE_BACKED.contains(&MigrationType::Family));
    }
}

#[cfg(test)]
mod event {
    use crate::EventTrigger;

    #[test]
    fn builtins_compare_to_custom() {
        assert_eq!(EventTrigger::EMIGRATING, EventTrigger::custom("Emigrating"));
        assert_ne!(EventTrigger::EMIGRATING, EventTrigger::IMMIGRATING);
        assert_eq!(EventTrigger::BIRTHS.as_str(), "Births");
    }
}
