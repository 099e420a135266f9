//! The `Node`: exclusive owner of a resident population, updated once per
//! timestep.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::debug;

use epi_core::{
    EventTrigger, Gender, GeoPoint, HumanStateChange, NodeRng, PropertyBag, Suid, SuidGenerator,
    VitalBirthDependence,
};
use epi_human::{
    FamilyTripRequest, HumanConfig, HumanContext, HumanUpdateOutcome, IndividualHuman,
    InterventionsContainer,
};
use epi_migration::MigrationInfo;

use crate::{Climate, DemographicsProvider, NodeConfig, TransmissionPools};

// ── IdGenerators ─────────────────────────────────────────────────────────────

/// The rank's suid allocators, one per entity class.
///
/// Owned by the simulation and lent to nodes during population and update;
/// all nodes on a rank share the same stripes.
#[derive(Debug)]
pub struct IdGenerators {
    pub humans:     SuidGenerator,
    pub infections: SuidGenerator,
}

impl IdGenerators {
    pub fn new(rank: usize, num_tasks: usize) -> Self {
        Self {
            humans:     SuidGenerator::new(rank, num_tasks),
            infections: SuidGenerator::new(rank, num_tasks),
        }
    }
}

// ── NodeEventObserver ────────────────────────────────────────────────────────

/// Observer hook for events fired on a node's individuals (intervention
/// triggers, reporting listeners).  The effect logic behind these hooks is
/// outside the core.
pub trait NodeEventObserver: Send {
    fn on_event(&mut self, individual: &mut IndividualHuman, trigger: &EventTrigger);
}

// ── Node ─────────────────────────────────────────────────────────────────────

/// One geographic population unit.
///
/// Owns its residents exclusively: an individual is in at most one node's
/// vector at any time, and leaves only by value through the emigrant list
/// returned from [`update`](Node::update).
pub struct Node {
    suid:        Suid,
    external_id: u32,
    position:    GeoPoint,

    rng: NodeRng,

    individuals: Vec<IndividualHuman>,
    /// Residents by right, independent of current physical presence.
    home_individual_ids: FxHashSet<Suid>,

    migration_info: MigrationInfo,
    pools:          TransmissionPools,

    climate:      Box<dyn Climate>,
    demographics: Arc<dyn DemographicsProvider>,
    human_config: Arc<HumanConfig>,
    node_config:  Arc<NodeConfig>,

    properties:    PropertyBag,
    interventions: InterventionsContainer,

    observers:               Vec<Box<dyn NodeEventObserver>>,
    events_from_other_nodes: Vec<EventTrigger>,

    /// Staged family departure; released only when everyone on the manifest
    /// is physically present.
    family_trip: Option<FamilyTripRequest>,

    // ── Per-timestep counters (derived, reset every step) ─────────────────
    stat_pop:         f32,
    infected:         f32,
    possible_mothers: f32,
    new_infections:   f32,
    /// Total contagion deposited this timestep.
    infectivity: f32,

    // ── Cumulative counters ───────────────────────────────────────────────
    births:             f32,
    disease_deaths:     f32,
    non_disease_deaths: f32,

    susceptibility_dynamic_scaling: f32,
}

impl Node {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        suid: Suid,
        external_id: u32,
        position: GeoPoint,
        global_seed: u64,
        human_config: Arc<HumanConfig>,
        node_config: Arc<NodeConfig>,
        demographics: Arc<dyn DemographicsProvider>,
        climate: Box<dyn Climate>,
    ) -> Self {
        let pools = TransmissionPools::new(node_config.transmission_property_key.clone());
        Self {
            suid,
            external_id,
            position,
            rng: NodeRng::new(global_seed, suid),
            individuals: Vec::new(),
            home_individual_ids: FxHashSet::default(),
            migration_info: MigrationInfo::empty(),
            pools,
            climate,
            demographics,
            human_config,
            node_config,
            properties: PropertyBag::new(),
            interventions: InterventionsContainer::new(),
            observers: Vec::new(),
            events_from_other_nodes: Vec::new(),
            family_trip: None,
            stat_pop: 0.0,
            infected: 0.0,
            possible_mothers: 0.0,
            new_infections: 0.0,
            infectivity: 0.0,
            births: 0.0,
            disease_deaths: 0.0,
            non_disease_deaths: 0.0,
            susceptibility_dynamic_scaling: 0.0,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn suid(&self) -> Suid {
        self.suid
    }

    #[inline]
    pub fn external_id(&self) -> u32 {
        self.external_id
    }

    #[inline]
    pub fn position(&self) -> GeoPoint {
        self.position
    }

    pub fn individuals(&self) -> &[IndividualHuman] {
        &self.individuals
    }

    /// Mutable resident access for campaign-style hooks (intervention
    /// distribution, outbreak seeding).
    pub fn individuals_mut(&mut self) -> &mut Vec<IndividualHuman> {
        &mut self.individuals
    }

    pub fn home_individual_ids(&self) -> &FxHashSet<Suid> {
        &self.home_individual_ids
    }

    pub fn migration_info(&self) -> &MigrationInfo {
        &self.migration_info
    }

    pub fn set_migration_info(&mut self, info: MigrationInfo) {
        self.migration_info = info;
    }

    pub fn properties(&self) -> &PropertyBag {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertyBag {
        &mut self.properties
    }

    pub fn node_interventions_mut(&mut self) -> &mut InterventionsContainer {
        &mut self.interventions
    }

    pub fn register_observer(&mut self, observer: Box<dyn NodeEventObserver>) {
        self.observers.push(observer);
    }

    /// Queue externally-originated events for dispatch at the start of the
    /// next update.
    pub fn add_events_from_other_nodes(&mut self, events: Vec<EventTrigger>) {
        self.events_from_other_nodes.extend(events);
    }

    pub fn rng_mut(&mut self) -> &mut NodeRng {
        &mut self.rng
    }

    // Counters.

    #[inline]
    pub fn stat_pop(&self) -> f32 {
        self.stat_pop
    }

    #[inline]
    pub fn infected(&self) -> f32 {
        self.infected
    }

    #[inline]
    pub fn possible_mothers(&self) -> f32 {
        self.possible_mothers
    }

    #[inline]
    pub fn new_infections(&self) -> f32 {
        self.new_infections
    }

    #[inline]
    pub fn infectivity(&self) -> f32 {
        self.infectivity
    }

    #[inline]
    pub fn births(&self) -> f32 {
        self.births
    }

    #[inline]
    pub fn disease_deaths(&self) -> f32 {
        self.disease_deaths
    }

    #[inline]
    pub fn non_disease_deaths(&self) -> f32 {
        self.non_disease_deaths
    }

    // ── Population setup ──────────────────────────────────────────────────

    /// Create `count` individuals from the demographics provider's initial
    /// distributions, seeding infections at the initial prevalence when
    /// enabled.
    pub fn populate_from_demographics(&mut self, count: usize, ids: &mut IdGenerators) {
        let seed_infections = self.node_config.enable_initial_prevalence;
        let prevalence = self.demographics.initial_prevalence();

        for _ in 0..count {
            let age = self.demographics.draw_initial_age_days(&mut self.rng);
            let gender = if self.rng.smart_draw(self.demographics.female_ratio()) {
                Gender::Female
            } else {
                Gender::Male
            };
            let acquisition = self.demographics.draw_initial_acquisition(age, &mut self.rng);
            let migration_mod = self.demographics.draw_migration_heterogeneity(&mut self.rng);

            let suid = ids.humans.next_suid();
            let mut individual = IndividualHuman::new(
                suid,
                self.suid,
                age,
                gender,
                self.node_config.mc_weight(),
                acquisition,
                migration_mod,
            );

            if seed_infections && self.rng.smart_draw(prevalence) {
                let mut scratch = HumanUpdateOutcome::default();
                individual.acquire_new_infection(
                    &mut self.rng,
                    &mut ids.infections,
                    &self.human_config,
                    &mut scratch,
                );
            }

            self.home_individual_ids.insert(suid);
            self.individuals.push(individual);
        }
    }

    // ── Family-trip coordination ──────────────────────────────────────────

    /// Stage a family departure drawn by one household member.  A later draw
    /// replaces an unreleased earlier one.
    pub fn set_waiting_for_family_trip(&mut self, request: FamilyTripRequest) {
        self.family_trip = Some(request);
    }

    /// `true` when every individual on the home manifest is physically
    /// present (visitors from elsewhere don't count against it).
    pub fn is_everyone_home(&self) -> bool {
        if self.individuals.len() < self.home_individual_ids.len() {
            return false;
        }
        let wanted = self.home_individual_ids.len();
        let mut found = 0;
        for individual in &self.individuals {
            if self.home_individual_ids.contains(&individual.suid()) {
                found += 1;
                if found == wanted {
                    return true;
                }
            }
        }
        false
    }

    fn manage_family_trip(&mut self, dt: f32) {
        let Some(mut trip) = self.family_trip.take() else {
            return;
        };
        let everyone_home = self.is_everyone_home();

        let home_ids = &self.home_individual_ids;
        for individual in &mut self.individuals {
            if !home_ids.contains(&individual.suid()) {
                continue;
            }
            if everyone_home {
                individual.set_going_on_family_trip(trip);
            } else {
                individual.set_waiting_to_go_on_family_trip();
            }
        }

        if !everyone_home {
            trip.time_until_trip -= dt;
            self.family_trip = Some(trip);
        }
    }

    // ── The per-timestep update ───────────────────────────────────────────

    /// Advance this node by one timestep and return the individuals leaving
    /// it (migrating, or dead away from home and being sent back).
    ///
    /// `log_individual` is invoked once per resident after all residents
    /// have updated, for reports that need per-individual data.
    pub fn update<F>(
        &mut self,
        time: f32,
        dt: f32,
        year: f32,
        ids: &mut IdGenerators,
        mut log_individual: F,
    ) -> Vec<IndividualHuman>
    where
        F: FnMut(&IndividualHuman),
    {
        // 1. Weather.
        self.climate.update_weather(time, dt, &mut self.rng);

        // 2. Node-owned interventions, then externally-triggered events.
        //    Order matters: an event must not act through an intervention
        //    that was due to expire this timestep.
        self.interventions.update(dt, &self.properties);
        let external_events = std::mem::take(&mut self.events_from_other_nodes);
        if !external_events.is_empty() {
            let observers = &mut self.observers;
            let individuals = &mut self.individuals;
            for trigger in &external_events {
                for individual in individuals.iter_mut() {
                    for observer in observers.iter_mut() {
                        observer.on_event(individual, trigger);
                    }
                }
            }
        }

        // 3. Release or keep holding the staged family departure.
        self.manage_family_trip(dt);

        // 4. Reset the per-timestep counters.
        self.reset_state_counters();

        // 5. Start-of-timestep infectivity.  Individuals added or removed
        //    later this step must not affect this step's force of infection.
        self.update_infectivity();

        // 6. Per-individual updates.
        let (step_events, family_request) = self.update_individuals(time, dt, year, ids);
        if let Some(request) = family_request {
            self.set_waiting_for_family_trip(request);
        }
        self.fire_individual_events(step_events);

        // Reports and state counters see every resident post-update, before
        // vital dynamics and removal.
        for individual in &self.individuals {
            log_individual(individual);
        }
        self.update_state_counters();

        // 7. Vital dynamics.
        if self.node_config.enable_births {
            self.update_vital_dynamics(dt, year, ids);
        }

        // 8. Removal sweep: dead and migrating individuals leave the vector.
        let emigrants = self.removal_sweep();

        // 9. Susceptibility ramp.
        if self.node_config.enable_susceptibility_scaling {
            self.susceptibility_dynamic_scaling = (self.susceptibility_dynamic_scaling
                + dt * self.node_config.susceptibility_scaling_rate)
                .min(1.0);
        }

        emigrants
    }

    fn reset_state_counters(&mut self) {
        self.stat_pop = 0.0;
        self.infected = 0.0;
        self.possible_mothers = 0.0;
        self.new_infections = 0.0;
    }

    fn update_infectivity(&mut self) {
        self.pools.clear();
        let pools = &mut self.pools;
        for individual in &mut self.individuals {
            let group = pools.group_for(individual.properties());
            individual.set_transmission_group(Some(group));
            pools.accumulate_population(group, individual.mc_weight());
            let deposit = individual.update_infectiousness();
            if deposit > 0.0 {
                pools.deposit(group, deposit);
            }
        }
        self.infectivity = pools.total_contagion();
        pools.end_update(1.0);
    }

    fn update_individuals(
        &mut self,
        time: f32,
        dt: f32,
        year: f32,
        ids: &mut IdGenerators,
    ) -> (Vec<(usize, Vec<EventTrigger>)>, Option<FamilyTripRequest>) {
        let mut step_events = Vec::new();
        let mut family_request = None;

        let rng = &mut self.rng;
        let pools = &self.pools;
        let config: &HumanConfig = &self.human_config;
        let demographics = &self.demographics;
        let migration_info = &self.migration_info;
        let scale = if self.node_config.enable_susceptibility_scaling {
            self.susceptibility_dynamic_scaling
        } else {
            1.0
        };

        for (i, individual) in self.individuals.iter_mut().enumerate() {
            let force =
                pools.force_of_infection(individual.transmission_group()) * scale;
            let mortality = if config.enable_natural_mortality {
                demographics.mortality_rate(individual.gender(), individual.age_days(), year)
            } else {
                0.0
            };

            let mut ctx = HumanContext {
                time,
                dt,
                config,
                migration_info,
                force_of_infection: force,
                natural_mortality_rate: mortality,
                rng,
                infection_ids: &mut ids.infections,
            };
            let outcome = individual.update(&mut ctx);

            if outcome.family_trip_request.is_some() {
                family_request = outcome.family_trip_request;
            }
            if !outcome.events.is_empty() {
                step_events.push((i, outcome.events));
            }
        }

        (step_events, family_request)
    }

    fn fire_individual_events(&mut self, step_events: Vec<(usize, Vec<EventTrigger>)>) {
        if self.observers.is_empty() {
            return;
        }
        for (i, events) in step_events {
            let observers = &mut self.observers;
            let individual = &mut self.individuals[i];
            for trigger in &events {
                for observer in observers.iter_mut() {
                    observer.on_event(individual, trigger);
                }
            }
        }
    }

    fn update_state_counters(&mut self) {
        for individual in &self.individuals {
            let mcw = individual.mc_weight();
            self.stat_pop += mcw;
            if individual.is_infected() {
                self.infected += mcw;
            }
            if individual.is_possible_mother() {
                self.possible_mothers += mcw;
            }
            if individual.had_new_infection_this_step() {
                self.new_infections += mcw;
            }
        }
    }

    // ── Vital dynamics ────────────────────────────────────────────────────

    fn update_vital_dynamics(&mut self, dt: f32, year: f32, ids: &mut IdGenerators) {
        let step_birthrate = self.node_config.birth_rate * dt * self.node_config.x_birth;

        let newborns = match self.node_config.birth_dependence {
            VitalBirthDependence::FixedBirthRate => {
                self.rng.poisson(step_birthrate as f64)
            }
            VitalBirthDependence::PopulationDepRate => {
                self.rng.poisson((step_birthrate * self.stat_pop) as f64)
            }
            VitalBirthDependence::DemographicDepRate => {
                self.rng.poisson((step_birthrate * self.possible_mothers) as f64)
            }
            VitalBirthDependence::IndividualPregnancies => {
                self.update_pregnancies(dt, year)
            }
        };

        self.populate_newborns(newborns, ids);
    }

    /// Count down active pregnancies and draw new conceptions; returns the
    /// number of deliveries this timestep.
    fn update_pregnancies(&mut self, dt: f32, year: f32) -> u64 {
        let mut deliveries = 0;
        let x_birth = self.node_config.x_birth;
        let rng = &mut self.rng;
        let demographics = &self.demographics;

        for individual in &mut self.individuals {
            if individual.update_pregnancy(dt) {
                deliveries += 1;
            } else if individual.is_possible_mother() && !individual.is_pregnant() {
                let rate = demographics.fertility_rate(individual.age_days(), year);
                if rng.smart_draw(rate * dt * x_birth) {
                    individual.initiate_pregnancy(rng);
                }
            }
        }
        deliveries
    }

    fn populate_newborns(&mut self, count: u64, ids: &mut IdGenerators) {
        for _ in 0..count {
            let gender = if self.rng.smart_draw(self.demographics.female_ratio()) {
                Gender::Female
            } else {
                Gender::Male
            };
            let migration_mod = self.demographics.draw_migration_heterogeneity(&mut self.rng);
            let mcw = self.node_config.mc_weight();
            let suid = ids.humans.next_suid();

            let mut baby = IndividualHuman::new(
                suid, self.suid, 0.0, gender, mcw, 1.0, migration_mod,
            );

            self.births += mcw;
            self.home_individual_ids.insert(suid);
            for observer in &mut self.observers {
                observer.on_event(&mut baby, &EventTrigger::BIRTHS);
            }
            self.individuals.push(baby);
        }
    }

    // ── Removal sweep ─────────────────────────────────────────────────────

    /// Remove dead and migrating individuals from the live vector.
    ///
    /// `swap_remove` keeps removal O(1); resident order is explicitly not a
    /// published guarantee.  Dead individuals die in place only at home —
    /// anyone dying away is routed home first and emigrates like any other
    /// traveler.
    fn removal_sweep(&mut self) -> Vec<IndividualHuman> {
        let mut emigrants = Vec::new();
        let mut i = 0;
        while i < self.individuals.len() {
            if self.individuals[i].is_dead() {
                let mut individual = self.individuals.swap_remove(i);
                match individual.state_change() {
                    HumanStateChange::KilledByInfection => {
                        self.disease_deaths += individual.mc_weight();
                    }
                    _ => {
                        self.non_disease_deaths += individual.mc_weight();
                    }
                }
                if individual.at_home(self.suid) {
                    self.home_individual_ids.remove(&individual.suid());
                } else {
                    // Must finish dying at home.
                    individual.go_home();
                    emigrants.push(self.process_emigrating(individual));
                }
            } else if self.individuals[i].is_migrating() {
                // Still a resident by right; only physical presence changes.
                let individual = self.individuals.swap_remove(i);
                emigrants.push(self.process_emigrating(individual));
            } else {
                i += 1;
            }
        }
        emigrants
    }

    /// Departure bookkeeping for one individual leaving this node.
    fn process_emigrating(&mut self, mut individual: IndividualHuman) -> IndividualHuman {
        debug!(
            individual = %individual.suid(),
            from = %self.suid,
            to = %individual.migration_destination(),
            "emigrating"
        );
        for observer in &mut self.observers {
            observer.on_event(&mut individual, &EventTrigger::EMIGRATING);
        }
        if individual.migration_is_destination_new_home()
            && individual.home_node_id() == self.suid
        {
            self.home_individual_ids.remove(&individual.suid());
        }
        individual.on_depart(self.suid);
        individual
    }

    // ── Immigration ───────────────────────────────────────────────────────

    /// Take ownership of an arriving individual.
    ///
    /// A dead arrival is finishing its trip home: it is consumed here (its
    /// death was already counted at the node where it died).
    pub fn process_immigrating(&mut self, mut individual: IndividualHuman) {
        if individual.is_dead() {
            individual.on_arrive(self.suid);
            debug_assert!(individual.at_home(self.suid), "the dead only travel home");
            self.home_individual_ids.remove(&individual.suid());
            return;
        }

        individual.on_arrive(self.suid);
        if individual.settle_as_new_home(self.suid) {
            self.home_individual_ids.insert(individual.suid());
        }

        let group = self.pools.group_for(individual.properties());
        individual.set_transmission_group(Some(group));

        for observer in &mut self.observers {
            observer.on_event(&mut individual, &EventTrigger::IMMIGRATING);
        }
        self.individuals.push(individual);
    }
}
