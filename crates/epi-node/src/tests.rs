//! Unit tests for epi-node.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use epi_core::{
    EventTrigger, Gender, GeoPoint, MigrationType, Suid, VitalBirthDependence,
};
use epi_human::{FamilyTripRequest, HumanConfig, IndividualHuman};
use epi_migration::MigrationInfo;

use crate::{
    ConstantClimate, IdGenerators, Node, NodeConfig, NodeEventObserver, StaticDemographics,
    TransmissionPools,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

const NODE_A: Suid = Suid(1);
const NODE_B: Suid = Suid(2);

fn make_node(suid: Suid, human_config: HumanConfig, node_config: NodeConfig) -> Node {
    make_node_with_demographics(suid, human_config, node_config, StaticDemographics::default())
}

fn make_node_with_demographics(
    suid: Suid,
    human_config: HumanConfig,
    node_config: NodeConfig,
    demographics: StaticDemographics,
) -> Node {
    Node::new(
        suid,
        suid.0 as u32,
        GeoPoint::new(0.0, 0.0),
        42,
        Arc::new(human_config),
        Arc::new(node_config),
        Arc::new(demographics),
        Box::new(ConstantClimate::default()),
    )
}

fn ids() -> IdGenerators {
    IdGenerators::new(0, 1)
}

fn quiet_human_config() -> HumanConfig {
    // No spontaneous migration so tests control movement explicitly.
    HumanConfig {
        migration_structure: epi_core::MigrationStructure::FixedRate,
        ..HumanConfig::default()
    }
}

fn step(node: &mut Node, ids: &mut IdGenerators, day: f32) -> Vec<IndividualHuman> {
    node.update(day, 1.0, 2015.0 + day / 365.0, ids, |_| {})
}

// ── Population setup ─────────────────────────────────────────────────────────

#[cfg(test)]
mod population {
    use super::*;

    #[test]
    fn populate_registers_home_ids() {
        let mut node = make_node(NODE_A, quiet_human_config(), NodeConfig::default());
        let mut ids = ids();
        node.populate_from_demographics(50, &mut ids);

        assert_eq!(node.individuals().len(), 50);
        assert_eq!(node.home_individual_ids().len(), 50);
        for ind in node.individuals() {
            assert_eq!(ind.home_node_id(), NODE_A);
            assert!(node.home_individual_ids().contains(&ind.suid()));
        }
    }

    #[test]
    fn stat_pop_counts_mc_weight() {
        let node_config = NodeConfig { sample_rate: 0.25, ..NodeConfig::default() };
        let mut node = make_node(NODE_A, quiet_human_config(), node_config);
        let mut ids = ids();
        node.populate_from_demographics(10, &mut ids);

        step(&mut node, &mut ids, 0.0);
        assert!((node.stat_pop() - 40.0).abs() < 1e-3, "10 individuals × weight 4");
    }

    #[test]
    fn initial_prevalence_seeds_infections() {
        let node_config = NodeConfig { enable_initial_prevalence: true, ..NodeConfig::default() };
        let demographics =
            StaticDemographics { initial_prevalence: 1.0, ..StaticDemographics::default() };
        let mut node = make_node_with_demographics(
            NODE_A,
            quiet_human_config(),
            node_config,
            demographics,
        );
        let mut ids = ids();
        node.populate_from_demographics(20, &mut ids);

        assert!(node.individuals().iter().all(IndividualHuman::is_infected));
    }
}

// ── Transmission ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod transmission {
    use super::*;

    #[test]
    fn contagion_spreads_within_a_node() {
        let mut cfg = quiet_human_config();
        cfg.infection.infectiousness = 100.0; // overwhelming force
        cfg.infection.mean_duration_days = 1000.0;
        let node_config = NodeConfig { enable_initial_prevalence: true, ..NodeConfig::default() };
        let demographics =
            StaticDemographics { initial_prevalence: 0.1, ..StaticDemographics::default() };
        let mut node =
            make_node_with_demographics(NODE_A, cfg, node_config, demographics);
        let mut ids = ids();
        node.populate_from_demographics(100, &mut ids);

        for day in 0..5 {
            step(&mut node, &mut ids, day as f32);
        }
        assert!(
            node.infected() > 90.0,
            "epidemic should sweep the node, infected = {}",
            node.infected()
        );
    }

    #[test]
    fn no_infections_means_no_infectivity() {
        let mut node = make_node(NODE_A, quiet_human_config(), NodeConfig::default());
        let mut ids = ids();
        node.populate_from_demographics(30, &mut ids);

        step(&mut node, &mut ids, 0.0);
        assert_eq!(node.infectivity(), 0.0);
        assert_eq!(node.infected(), 0.0);
    }

    #[test]
    fn property_key_partitions_pools() {
        let mut pools = TransmissionPools::new(Some("Place".into()));
        let mut urban = epi_core::PropertyBag::new();
        urban.set("Place", "Urban");
        let mut rural = epi_core::PropertyBag::new();
        rural.set("Place", "Rural");

        let gu = pools.group_for(&urban);
        let gr = pools.group_for(&rural);
        assert_ne!(gu, gr);

        pools.accumulate_population(gu, 10.0);
        pools.accumulate_population(gr, 10.0);
        pools.deposit(gu, 5.0);
        pools.end_update(1.0);

        assert!(pools.force_of_infection(Some(gu)) > 0.0);
        assert_eq!(pools.force_of_infection(Some(gr)), 0.0);
        assert_eq!(pools.force_of_infection(None), 0.0);
    }
}

// ── Vital dynamics ───────────────────────────────────────────────────────────

#[cfg(test)]
mod vitals {
    use super::*;

    #[test]
    fn fixed_rate_births_accumulate() {
        let node_config = NodeConfig {
            enable_births:    true,
            birth_dependence: VitalBirthDependence::FixedBirthRate,
            birth_rate:       2.0, // births/node/day
            ..NodeConfig::default()
        };
        let mut node = make_node(NODE_A, quiet_human_config(), node_config);
        let mut ids = ids();

        for day in 0..100 {
            step(&mut node, &mut ids, day as f32);
        }
        // Poisson(2/day × 100 days): mean 200, be generous on bounds.
        assert!(
            (140.0..260.0).contains(&node.births()),
            "births = {}",
            node.births()
        );
        assert_eq!(node.individuals().len(), node.births() as usize);
    }

    #[test]
    fn newborns_are_home_residents_aged_zero() {
        let node_config = NodeConfig {
            enable_births:    true,
            birth_dependence: VitalBirthDependence::FixedBirthRate,
            birth_rate:       5.0,
            ..NodeConfig::default()
        };
        let mut node = make_node(NODE_A, quiet_human_config(), node_config);
        let mut ids = ids();
        step(&mut node, &mut ids, 0.0);

        for baby in node.individuals() {
            assert!(baby.age_days() <= 1.0);
            assert_eq!(baby.home_node_id(), NODE_A);
            assert!(node.home_individual_ids().contains(&baby.suid()));
        }
    }

    #[test]
    fn pregnancy_model_delivers_after_gestation() {
        let node_config = NodeConfig {
            enable_births:    true,
            birth_dependence: VitalBirthDependence::IndividualPregnancies,
            birth_rate:       0.0, // unused in this mode
            ..NodeConfig::default()
        };
        let demographics = StaticDemographics {
            fertility_rate: 1.0, // conceive immediately
            female_ratio:   1.0,
            max_initial_age_years: 0.1, // then we age them into the window below
            ..StaticDemographics::default()
        };
        let mut node = make_node_with_demographics(
            NODE_A,
            quiet_human_config(),
            node_config,
            demographics,
        );
        let mut ids = ids();
        node.populate_from_demographics(10, &mut ids);
        // Age everyone into the possible-mother window.
        for ind in node.individuals_mut() {
            *ind = IndividualHuman::new(
                ind.suid(),
                NODE_A,
                25.0 * 365.0,
                Gender::Female,
                1.0,
                1.0,
                1.0,
            );
        }

        let mut first_birth_day = None;
        for day in 0..400 {
            step(&mut node, &mut ids, day as f32);
            if node.births() > 0.0 && first_birth_day.is_none() {
                first_birth_day = Some(day);
            }
        }
        let day = first_birth_day.expect("someone should deliver");
        assert!(
            (230..=340).contains(&day),
            "first delivery on day {day}, expected ~280"
        );
    }

    #[test]
    fn death_at_home_destroys_and_unregisters() {
        let mut cfg = quiet_human_config();
        cfg.enable_natural_mortality = true;
        let demographics =
            StaticDemographics { mortality_rate: 1.0, ..StaticDemographics::default() };
        let mut node = make_node_with_demographics(
            NODE_A,
            cfg,
            NodeConfig::default(),
            demographics,
        );
        let mut ids = ids();
        node.populate_from_demographics(10, &mut ids);

        let emigrants = step(&mut node, &mut ids, 0.0);
        assert!(emigrants.is_empty(), "deaths at home never emigrate");
        assert!(node.individuals().is_empty());
        assert!(node.home_individual_ids().is_empty());
        assert!((node.non_disease_deaths() - 10.0).abs() < 1e-3);
    }
}

// ── Migration mechanics ──────────────────────────────────────────────────────

#[cfg(test)]
mod migration {
    use super::*;

    #[test]
    fn forced_migration_emigrates_through_sweep() {
        let mut node = make_node(NODE_A, quiet_human_config(), NodeConfig::default());
        let mut ids = ids();
        node.populate_from_demographics(3, &mut ids);

        node.individuals_mut()[0].set_migrating(
            NODE_A,
            NODE_B,
            MigrationType::Intervention,
            0.0,
            10.0,
            false,
        );

        let emigrants = step(&mut node, &mut ids, 0.0);
        assert_eq!(emigrants.len(), 1);
        assert_eq!(emigrants[0].migration_destination(), NODE_B);
        assert_eq!(node.individuals().len(), 2);
        // Residents by right even while away.
        assert_eq!(node.home_individual_ids().len(), 3);
    }

    #[test]
    fn visitor_dying_away_is_sent_home_not_destroyed() {
        let mut cfg = quiet_human_config();
        cfg.enable_natural_mortality = true;
        let lethal = StaticDemographics { mortality_rate: 1.0, ..StaticDemographics::default() };
        let mut node_b = make_node_with_demographics(
            NODE_B,
            cfg,
            NodeConfig::default(),
            lethal,
        );
        let mut ids = ids();

        // A visitor whose home is node A arrives at node B.
        let visitor = IndividualHuman::new(
            ids.humans.next_suid(),
            NODE_A,
            30.0 * 365.0,
            Gender::Male,
            1.0,
            1.0,
            1.0,
        );
        let visitor_suid = visitor.suid();
        node_b.process_immigrating(visitor);
        assert_eq!(node_b.individuals().len(), 1);

        let emigrants = step(&mut node_b, &mut ids, 0.0);
        assert_eq!(emigrants.len(), 1, "dead visitor must be routed home");
        assert!(emigrants[0].is_dead());
        assert_eq!(emigrants[0].suid(), visitor_suid);
        assert_eq!(emigrants[0].migration_destination(), NODE_A);
        assert!(node_b.individuals().is_empty());
    }

    #[test]
    fn dead_arrival_at_home_is_consumed() {
        let mut node_a = make_node(NODE_A, quiet_human_config(), NodeConfig::default());
        let mut ids = ids();
        node_a.populate_from_demographics(1, &mut ids);
        let suid = node_a.individuals()[0].suid();

        // Simulate the round trip: resident leaves, dies away, comes home.
        let mut away = node_a.individuals_mut().pop().unwrap();
        away.die(epi_core::HumanStateChange::DiedFromNaturalCauses);
        away.go_home();

        node_a.process_immigrating(away);
        assert!(node_a.individuals().is_empty());
        assert!(
            !node_a.home_individual_ids().contains(&suid),
            "finishing a death at home unregisters the resident"
        );
    }

    #[test]
    fn new_home_arrival_is_registered_as_resident() {
        let mut node_b = make_node(NODE_B, quiet_human_config(), NodeConfig::default());
        let mut ids = ids();

        let mut mover = IndividualHuman::new(
            ids.humans.next_suid(),
            NODE_A,
            20.0 * 365.0,
            Gender::Female,
            1.0,
            1.0,
            1.0,
        );
        mover.set_migrating(NODE_A, NODE_B, MigrationType::Intervention, 0.0, 0.0, true);

        node_b.process_immigrating(mover);
        let settled = &node_b.individuals()[0];
        assert_eq!(settled.home_node_id(), NODE_B);
        assert!(node_b.home_individual_ids().contains(&settled.suid()));
    }
}

// ── Family trips ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod family {
    use super::*;

    fn family_trip() -> FamilyTripRequest {
        FamilyTripRequest {
            destination:             NODE_B,
            trip_type:               MigrationType::Family,
            time_until_trip:         0.0,
            time_at_destination:     5.0,
            is_destination_new_home: false,
        }
    }

    #[test]
    fn everyone_home_releases_whole_household() {
        let mut node = make_node(NODE_A, quiet_human_config(), NodeConfig::default());
        let mut ids = ids();
        node.populate_from_demographics(4, &mut ids);

        node.set_waiting_for_family_trip(family_trip());
        let emigrants = step(&mut node, &mut ids, 0.0);

        assert_eq!(emigrants.len(), 4, "whole household travels together");
        for e in &emigrants {
            assert_eq!(e.migration_destination(), NODE_B);
            assert!(e.is_on_family_trip());
        }
        assert!(node.individuals().is_empty());
        assert_eq!(node.home_individual_ids().len(), 4);
    }

    #[test]
    fn missing_member_holds_the_trip() {
        let mut node = make_node(NODE_A, quiet_human_config(), NodeConfig::default());
        let mut ids = ids();
        node.populate_from_demographics(3, &mut ids);

        // One member is away (physically absent but still on the manifest).
        let away = node.individuals_mut().pop().unwrap();
        assert!(!node.is_everyone_home());

        node.set_waiting_for_family_trip(family_trip());
        let emigrants = step(&mut node, &mut ids, 0.0);
        assert!(emigrants.is_empty(), "trip must wait for the missing member");

        // The missing member returns; next step the family leaves.
        node.process_immigrating(away);
        let emigrants = step(&mut node, &mut ids, 1.0);
        assert_eq!(emigrants.len(), 3);
    }

    #[test]
    fn visitors_do_not_join_family_trips() {
        let mut node = make_node(NODE_A, quiet_human_config(), NodeConfig::default());
        let mut ids = ids();
        node.populate_from_demographics(2, &mut ids);

        // A visitor from node B is present but not on the manifest.
        let visitor = IndividualHuman::new(
            ids.humans.next_suid(),
            NODE_B,
            40.0 * 365.0,
            Gender::Male,
            1.0,
            1.0,
            1.0,
        );
        node.process_immigrating(visitor);

        node.set_waiting_for_family_trip(family_trip());
        let emigrants = step(&mut node, &mut ids, 0.0);
        assert_eq!(emigrants.len(), 2, "only manifest members leave");
        assert_eq!(node.individuals().len(), 1, "visitor stays");
        assert_eq!(node.individuals()[0].home_node_id(), NODE_B);
    }
}

// ── Event observers ──────────────────────────────────────────────────────────

#[cfg(test)]
mod events {
    use super::*;

    struct Counter {
        trigger: EventTrigger,
        hits:    Arc<AtomicUsize>,
    }

    impl NodeEventObserver for Counter {
        fn on_event(&mut self, _individual: &mut IndividualHuman, trigger: &EventTrigger) {
            if *trigger == self.trigger {
                self.hits.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn births_event_fires_per_newborn() {
        let node_config = NodeConfig {
            enable_births:    true,
            birth_dependence: VitalBirthDependence::FixedBirthRate,
            birth_rate:       3.0,
            ..NodeConfig::default()
        };
        let mut node = make_node(NODE_A, quiet_human_config(), node_config);
        let hits = Arc::new(AtomicUsize::new(0));
        node.register_observer(Box::new(Counter {
            trigger: EventTrigger::BIRTHS,
            hits:    Arc::clone(&hits),
        }));

        let mut ids = ids();
        for day in 0..50 {
            step(&mut node, &mut ids, day as f32);
        }
        assert_eq!(hits.load(Ordering::SeqCst), node.births() as usize);
    }

    #[test]
    fn external_events_reach_every_individual() {
        let mut node = make_node(NODE_A, quiet_human_config(), NodeConfig::default());
        let mut ids = ids();
        node.populate_from_demographics(7, &mut ids);

        let hits = Arc::new(AtomicUsize::new(0));
        let alert = EventTrigger::custom("OutbreakAlert");
        node.register_observer(Box::new(Counter {
            trigger: alert.clone(),
            hits:    Arc::clone(&hits),
        }));

        node.add_events_from_other_nodes(vec![alert]);
        step(&mut node, &mut ids, 0.0);
        assert_eq!(hits.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn emigrating_event_fires_on_departure() {
        let mut node = make_node(NODE_A, quiet_human_config(), NodeConfig::default());
        let mut ids = ids();
        node.populate_from_demographics(1, &mut ids);

        let hits = Arc::new(AtomicUsize::new(0));
        node.register_observer(Box::new(Counter {
            trigger: EventTrigger::EMIGRATING,
            hits:    Arc::clone(&hits),
        }));

        node.individuals_mut()[0].set_migrating(
            NODE_A,
            NODE_B,
            MigrationType::Intervention,
            0.0,
            1.0,
            false,
        );
        step(&mut node, &mut ids, 0.0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}

// ── Migration info wiring ────────────────────────────────────────────────────

#[cfg(test)]
mod info_wiring {
    use super::*;

    #[test]
    fn rate_based_migration_drains_a_node() {
        let mut node = make_node(NODE_A, quiet_human_config(), NodeConfig::default());
        node.set_migration_info(MigrationInfo::new(vec![(
            NODE_B,
            MigrationType::Local,
            5.0,
        )]));
        let mut ids = ids();
        node.populate_from_demographics(20, &mut ids);

        let mut total_emigrants = 0;
        for day in 0..30 {
            total_emigrants += step(&mut node, &mut ids, day as f32).len();
        }
        assert!(
            total_emigrants >= 19,
            "rate-5/day should drain the node, got {total_emigrants}"
        );
    }
}
