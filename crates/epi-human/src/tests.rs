//! Unit tests for epi-human.

use epi_core::{Gender, HumanStateChange, MigrationType, NodeRng, Suid, SuidGenerator};
use epi_migration::MigrationInfo;

use crate::{
    FamilyTripRequest, HeldIntervention, HumanConfig, HumanContext, IndividualHuman,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

const HOME: Suid = Suid(100);
const AWAY: Suid = Suid(200);

fn adult(suid: i32) -> IndividualHuman {
    IndividualHuman::new(Suid(suid), HOME, 30.0 * 365.0, Gender::Male, 1.0, 1.0, 1.0)
}

fn config() -> HumanConfig {
    HumanConfig::default()
}

struct Services {
    rng:           NodeRng,
    infection_ids: SuidGenerator,
}

impl Services {
    fn new() -> Self {
        Self {
            rng:           NodeRng::new(7, HOME),
            infection_ids: SuidGenerator::new(0, 1),
        }
    }

    fn ctx<'a>(
        &'a mut self,
        config: &'a HumanConfig,
        info: &'a MigrationInfo,
        foi: f32,
    ) -> HumanContext<'a> {
        HumanContext {
            time: 0.0,
            dt: 1.0,
            config,
            migration_info: info,
            force_of_infection: foi,
            natural_mortality_rate: 0.0,
            rng: &mut self.rng,
            infection_ids: &mut self.infection_ids,
        }
    }
}

fn single_destination_info(rate: f32) -> MigrationInfo {
    MigrationInfo::new(vec![(AWAY, MigrationType::Local, rate)])
}

// ── Migration state machine ──────────────────────────────────────────────────

#[cfg(test)]
mod migration {
    use super::*;

    #[test]
    fn isolated_node_never_migrates() {
        let cfg = config();
        let info = MigrationInfo::empty();
        let mut svc = Services::new();
        let mut person = adult(1);

        for _ in 0..200 {
            person.update(&mut svc.ctx(&cfg, &info, 0.0));
            assert!(!person.is_migrating());
            assert!(person.migration_destination().is_nil());
        }
    }

    #[test]
    fn fixed_rate_eventually_departs() {
        let cfg = config();
        let info = single_destination_info(1.0);
        let mut svc = Services::new();
        let mut person = adult(1);

        let mut departed = false;
        for _ in 0..100 {
            person.update(&mut svc.ctx(&cfg, &info, 0.0));
            if person.is_migrating() {
                departed = true;
                break;
            }
        }
        assert!(departed, "rate-1.0 trip should depart within 100 days");
        assert_eq!(person.migration_destination(), AWAY);
        assert_eq!(person.migration_type(), MigrationType::Local);
    }

    #[test]
    fn outbound_roundtrip_pushes_waypoint_on_depart() {
        let mut cfg = config();
        cfg.local_roundtrip.probability = 1.0; // always a round trip
        let info = single_destination_info(10.0);
        let mut svc = Services::new();
        let mut person = adult(1);

        while !person.is_migrating() {
            person.update(&mut svc.ctx(&cfg, &info, 0.0));
        }
        person.on_depart(HOME);

        assert_eq!(person.waypoints().len(), 1);
        assert_eq!(person.waypoints()[0].node, HOME);
        assert_eq!(person.waypoints()[0].trip_type, MigrationType::Local);
    }

    #[test]
    fn one_way_trip_leaves_no_waypoints() {
        let mut cfg = config();
        cfg.local_roundtrip.probability = 0.0; // never return
        let info = single_destination_info(10.0);
        let mut svc = Services::new();
        let mut person = adult(1);

        while !person.is_migrating() {
            person.update(&mut svc.ctx(&cfg, &info, 0.0));
        }
        person.on_depart(HOME);
        person.on_arrive(AWAY);

        assert!(person.waypoints().is_empty());
        assert!(person.migration_destination().is_nil());
        assert_eq!(person.home_node_id(), HOME, "trip not flagged as a new home");
    }

    #[test]
    fn full_round_trip_returns_home_with_empty_waypoints() {
        let mut cfg = config();
        cfg.local_roundtrip = crate::RoundTripConfig::with_mean_days(1.0, 2.0);
        cfg.max_waypoints = 1;
        let info = single_destination_info(10.0);
        let mut svc = Services::new();
        let mut person = adult(1);

        // Leg 1: home → away.
        while !person.is_migrating() {
            person.update(&mut svc.ctx(&cfg, &info, 0.0));
        }
        person.on_depart(HOME);
        person.on_arrive(AWAY);
        assert_eq!(person.waypoints().len(), 1);

        // Leg 2: away → home (waypoint stack at max forces the turnaround;
        // the destination node is isolated from AWAY's perspective, which
        // must not trap a visitor).
        let away_info = MigrationInfo::empty();
        while !person.is_migrating() {
            person.update(&mut svc.ctx(&cfg, &away_info, 0.0));
        }
        assert_eq!(person.migration_destination(), HOME);
        person.on_depart(AWAY);
        person.on_arrive(HOME);

        assert!(person.waypoints().is_empty());
        assert!(person.at_home(HOME));
        assert!(person.migration_destination().is_nil());
    }

    #[test]
    fn family_draw_stages_request_instead_of_departing() {
        let cfg = config();
        let info = MigrationInfo::new(vec![(AWAY, MigrationType::Family, 10.0)]);
        let mut svc = Services::new();
        let mut person = adult(1);

        let mut request = None;
        for _ in 0..50 {
            let outcome = person.update(&mut svc.ctx(&cfg, &info, 0.0));
            if outcome.family_trip_request.is_some() {
                request = outcome.family_trip_request;
                break;
            }
        }

        let request = request.expect("family trip should be drawn");
        assert_eq!(request.destination, AWAY);
        assert_eq!(request.trip_type, MigrationType::Family);
        assert!(person.is_waiting_for_family_trip());
        assert!(person.migration_destination().is_nil());
        assert!(!person.is_migrating());
    }

    #[test]
    fn released_family_member_departs_next_step() {
        let cfg = config();
        let info = MigrationInfo::empty();
        let mut svc = Services::new();
        let mut person = adult(1);

        person.set_going_on_family_trip(FamilyTripRequest {
            destination:             AWAY,
            trip_type:               MigrationType::Family,
            time_until_trip:         0.5,
            time_at_destination:     3.0,
            is_destination_new_home: false,
        });

        person.update(&mut svc.ctx(&cfg, &info, 0.0));
        assert!(person.is_migrating());
        assert_eq!(person.migration_destination(), AWAY);
        assert!(person.is_on_family_trip());

        person.on_depart(HOME);
        person.on_arrive(AWAY);
        assert!(person.is_on_family_trip(), "still on the trip while away");

        // Returning home ends the family trip.
        person.go_home();
        person.on_depart(AWAY);
        person.on_arrive(HOME);
        assert!(!person.is_on_family_trip());
    }

    #[test]
    fn settle_as_new_home_rewrites_home_and_itinerary() {
        let cfg = config();
        let info = MigrationInfo::empty();
        let mut svc = Services::new();
        let mut person = adult(1);

        person.set_migrating(HOME, AWAY, MigrationType::Intervention, 0.0, 0.0, true);
        person.update(&mut svc.ctx(&cfg, &info, 0.0));
        assert!(person.is_migrating());

        person.on_depart(HOME);
        person.on_arrive(AWAY);
        assert!(person.settle_as_new_home(AWAY));
        assert_eq!(person.home_node_id(), AWAY);
        assert!(person.waypoints().is_empty());
        assert!(person.at_home(AWAY));
    }

    #[test]
    fn go_home_targets_home_node() {
        let mut person = adult(1);
        person.go_home();
        assert_eq!(person.migration_destination(), HOME);
    }

    #[test]
    fn timer_epsilon_tolerates_round_numbers() {
        // A forced trip with an exactly-1.0-day timer must fire after one
        // 1.0-day step despite float rounding.
        let cfg = config();
        let info = MigrationInfo::empty();
        let mut svc = Services::new();
        let mut person = adult(1);

        person.set_migrating(HOME, AWAY, MigrationType::Intervention, 1.0, 5.0, false);
        person.update(&mut svc.ctx(&cfg, &info, 0.0));
        assert!(person.is_migrating());
    }
}

// ── Disease state ────────────────────────────────────────────────────────────

#[cfg(test)]
mod disease {
    use super::*;

    #[test]
    fn high_force_of_infection_infects() {
        let cfg = config();
        let info = MigrationInfo::empty();
        let mut svc = Services::new();
        let mut person = adult(1);

        person.update(&mut svc.ctx(&cfg, &info, 1000.0));
        assert!(person.is_infected());
        assert!(person.had_new_infection_this_step());
    }

    #[test]
    fn zero_force_of_infection_never_infects() {
        let cfg = config();
        let info = MigrationInfo::empty();
        let mut svc = Services::new();
        let mut person = adult(1);

        for _ in 0..100 {
            person.update(&mut svc.ctx(&cfg, &info, 0.0));
        }
        assert!(!person.is_infected());
    }

    #[test]
    fn fully_immune_never_infects() {
        let cfg = config();
        let info = MigrationInfo::empty();
        let mut svc = Services::new();
        let mut person =
            IndividualHuman::new(Suid(1), HOME, 10_000.0, Gender::Female, 1.0, 0.0, 1.0);

        for _ in 0..100 {
            person.update(&mut svc.ctx(&cfg, &info, 1000.0));
        }
        assert!(!person.is_infected());
    }

    #[test]
    fn infection_clears_and_immunity_applies() {
        let mut cfg = config();
        cfg.infection.mean_duration_days = 2.0;
        cfg.infection.case_fatality = 0.0;
        cfg.post_infection_acquisition_multiplier = 0.5;
        let info = MigrationInfo::empty();
        let mut svc = Services::new();
        let mut person = adult(1);

        person.update(&mut svc.ctx(&cfg, &info, 1000.0));
        assert!(person.is_infected());

        for _ in 0..200 {
            person.update(&mut svc.ctx(&cfg, &info, 0.0));
            if !person.is_infected() {
                break;
            }
        }
        assert!(!person.is_infected(), "infection should clear");
        assert!(person.susceptibility().mod_acquire <= 0.5);
    }

    #[test]
    fn fatal_infection_kills() {
        let mut cfg = config();
        cfg.infection.mean_duration_days = 1.0;
        cfg.infection.case_fatality = 1.0;
        let info = MigrationInfo::empty();
        let mut svc = Services::new();
        let mut person = adult(1);

        person.update(&mut svc.ctx(&cfg, &info, 1000.0));
        for _ in 0..100 {
            if person.is_dead() {
                break;
            }
            person.update(&mut svc.ctx(&cfg, &info, 0.0));
        }
        assert!(person.is_dead());
        assert_eq!(person.state_change(), HumanStateChange::KilledByInfection);
    }

    #[test]
    fn death_preempts_migration_within_a_step() {
        // Certain-fatal disease and an extremely high migration rate: the
        // ordering contract says the death check runs before the migration
        // check, so the step that kills never also departs.
        let mut cfg = config();
        cfg.infection.mean_duration_days = 0.5;
        cfg.infection.case_fatality = 1.0;
        let info = single_destination_info(1e6);
        let mut svc = Services::new();
        let mut person = adult(1);

        person.update(&mut svc.ctx(&cfg, &info, 1e9));
        assert!(person.is_infected());
        for _ in 0..50 {
            if person.is_dead() {
                break;
            }
            person.update(&mut svc.ctx(&cfg, &info, 0.0));
        }
        assert!(person.is_dead());
        assert!(!person.is_migrating());
    }

    #[test]
    fn no_superinfection_by_default() {
        let cfg = config();
        let info = MigrationInfo::empty();
        let mut svc = Services::new();
        let mut person = adult(1);

        for _ in 0..10 {
            person.update(&mut svc.ctx(&cfg, &info, 1000.0));
        }
        // Stays at exactly one infection while the first is active.
        assert!(person.is_infected());
        assert!(person.infectiousness() <= cfg.infection.infectiousness + 1e-6);
    }

    #[test]
    fn update_infectiousness_weights_by_mc_weight() {
        let mut cfg = config();
        cfg.infection.infectiousness = 2.0;
        let info = MigrationInfo::empty();
        let mut svc = Services::new();
        let mut person =
            IndividualHuman::new(Suid(1), HOME, 10_000.0, Gender::Male, 5.0, 1.0, 1.0);

        person.update(&mut svc.ctx(&cfg, &info, 1000.0));
        assert!(person.is_infected());

        let deposit = person.update_infectiousness();
        assert!((deposit - 10.0).abs() < 1e-5, "mc_weight 5 × shedding 2");
        assert!((person.infectiousness() - 2.0).abs() < 1e-5);
    }
}

// ── Interventions ────────────────────────────────────────────────────────────

#[cfg(test)]
mod interventions {
    use super::*;

    #[test]
    fn vaccine_blocks_acquisition() {
        let cfg = config();
        let info = MigrationInfo::empty();
        let mut svc = Services::new();
        let mut person = adult(1);

        let vaccine = HeldIntervention::with_effects("vaccine", 0.0, 1.0, 1.0, 0.0);
        assert!(person.give_intervention(vaccine));

        for _ in 0..50 {
            person.update(&mut svc.ctx(&cfg, &info, 1000.0));
        }
        assert!(!person.is_infected());
    }

    #[test]
    fn intervention_expires_after_duration() {
        let mut person = adult(1);
        let short = HeldIntervention::with_effects("short", 0.5, 1.0, 1.0, 2.0);
        assert!(person.give_intervention(short));
        assert_eq!(person.interventions().len(), 1);

        let props = person.properties().clone();
        person.interventions_mut().update(1.0, &props);
        assert_eq!(person.interventions().len(), 1);
        person.interventions_mut().update(1.5, &props);
        assert_eq!(person.interventions().len(), 0);
        assert!((person.interventions().acquire_modifier() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn status_property_written_on_distribution() {
        let mut person = adult(1);
        let mut iv = HeldIntervention::with_effects("tagged", 1.0, 1.0, 1.0, 10.0);
        iv.status_property = Some(("InterventionStatus".into(), "Vaccinated".into()));

        assert!(person.give_intervention(iv));
        assert_eq!(person.properties().get("InterventionStatus"), Some("Vaccinated"));
    }

    #[test]
    fn disqualifying_property_refuses_distribution() {
        let mut person = adult(1);
        person.properties_mut().set("Risk", "Low");

        let mut iv = HeldIntervention::with_effects("high-risk-only", 0.5, 1.0, 1.0, 100.0);
        iv.disqualifying_properties = vec![("Risk".into(), "Low".into())];
        assert!(!person.give_intervention(iv));
        assert!(person.interventions().is_empty());
    }

    #[test]
    fn disqualifying_property_forces_expiry() {
        let mut person = adult(1);
        person.properties_mut().set("Risk", "High");

        let mut iv = HeldIntervention::with_effects("high-risk-only", 0.5, 1.0, 1.0, 100.0);
        iv.disqualifying_properties = vec![("Risk".into(), "Low".into())];
        assert!(person.give_intervention(iv));

        let props = person.properties().clone();
        person.interventions_mut().update(1.0, &props);
        assert_eq!(person.interventions().len(), 1);

        // Property flips to a disqualifying value; the intervention must
        // expire on the next update.
        person.properties_mut().set("Risk", "Low");
        let props = person.properties().clone();
        person.interventions_mut().update(1.0, &props);
        assert_eq!(person.interventions().len(), 0);
    }
}

// ── Vital dynamics ───────────────────────────────────────────────────────────

#[cfg(test)]
mod vitals {
    use super::*;

    #[test]
    fn possible_mother_window() {
        let young = IndividualHuman::new(Suid(1), HOME, 5.0 * 365.0, Gender::Female, 1.0, 1.0, 1.0);
        let adult_f =
            IndividualHuman::new(Suid(2), HOME, 25.0 * 365.0, Gender::Female, 1.0, 1.0, 1.0);
        let adult_m =
            IndividualHuman::new(Suid(3), HOME, 25.0 * 365.0, Gender::Male, 1.0, 1.0, 1.0);

        assert!(!young.is_possible_mother());
        assert!(adult_f.is_possible_mother());
        assert!(!adult_m.is_possible_mother());
    }

    #[test]
    fn pregnancy_runs_about_forty_weeks() {
        let mut rng = NodeRng::new(1, HOME);
        let mut person =
            IndividualHuman::new(Suid(1), HOME, 25.0 * 365.0, Gender::Female, 1.0, 1.0, 1.0);

        person.initiate_pregnancy(&mut rng);
        assert!(person.is_pregnant());

        let mut days = 0;
        while !person.update_pregnancy(1.0) {
            days += 1;
            assert!(days < 400, "pregnancy should end");
        }
        assert!(!person.is_pregnant());
        assert!((230..=330).contains(&days), "delivered after {days} days");
    }

    #[test]
    fn natural_mortality_kills_at_rate_one() {
        let cfg = {
            let mut c = config();
            c.enable_natural_mortality = true;
            c
        };
        let info = MigrationInfo::empty();
        let mut svc = Services::new();
        let mut person = adult(1);

        let mut ctx = svc.ctx(&cfg, &info, 0.0);
        ctx.natural_mortality_rate = 1.0;
        person.update(&mut ctx);
        assert!(person.is_dead());
        assert_eq!(person.state_change(), HumanStateChange::DiedFromNaturalCauses);
    }
}

// ── Serialization ────────────────────────────────────────────────────────────

#[cfg(test)]
mod wire {
    use super::*;

    #[test]
    fn individual_roundtrips_through_bitcode_shaped_serde() {
        let cfg = config();
        let info = single_destination_info(10.0);
        let mut svc = Services::new();
        let mut person = adult(1);
        person.properties_mut().set("Risk", "High");
        person.update(&mut svc.ctx(&cfg, &info, 1000.0));

        let json = serde_json::to_string(&person).unwrap();
        let back: IndividualHuman = serde_json::from_str(&json).unwrap();

        assert_eq!(back.suid(), person.suid());
        assert_eq!(back.home_node_id(), person.home_node_id());
        assert_eq!(back.is_infected(), person.is_infected());
        assert_eq!(back.properties().get("Risk"), Some("High"));
        // Derived pool membership is not serialized.
        assert_eq!(back.transmission_group(), None);
    }
}
