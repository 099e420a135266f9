//! `IndividualHuman` — the agent — and its per-timestep update.

use epi_core::{
    EventTrigger, Gender, HumanStateChange, MigrationStructure, MigrationType, NodeRng,
    PropertyBag, Suid, SuidGenerator, DAYS_PER_YEAR,
};
use epi_migration::MigrationInfo;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    HumanConfig, Infection, InfectionStateChange, InterventionsContainer, Susceptibility,
};

/// Migration timers land on round numbers when driven by integer-day
/// interventions; comparing against this epsilon instead of zero keeps those
/// trips departing on the expected timestep.
const TRIP_TIMER_EPSILON: f32 = 1e-7;

/// Gestation countdown mean, in days (40 weeks).
const GESTATION_DAYS: f64 = 280.0;

// ── Support types ────────────────────────────────────────────────────────────

/// One stacked return destination for a multi-stop round trip.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Waypoint {
    pub node:      Suid,
    pub trip_type: MigrationType,
}

/// A family trip drawn by one household member, staged on the node until
/// everyone is home.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FamilyTripRequest {
    pub destination:             Suid,
    pub trip_type:               MigrationType,
    pub time_until_trip:         f32,
    pub time_at_destination:     f32,
    pub is_destination_new_home: bool,
}

/// What the node must act on after one individual's update.
#[derive(Debug, Default)]
pub struct HumanUpdateOutcome {
    /// This individual drew a family trip; the node stages it for the whole
    /// household.
    pub family_trip_request: Option<FamilyTripRequest>,
    /// Events to broadcast to this node's observers.
    pub events: Vec<EventTrigger>,
}

/// Per-individual services borrowed from the owning node for one update
/// call.
pub struct HumanContext<'a> {
    /// Simulation time in days at the start of the timestep.
    pub time: f32,
    pub dt:   f32,
    pub config: &'a HumanConfig,
    pub migration_info: &'a MigrationInfo,
    /// Force of infection (per day) in this individual's transmission pool.
    pub force_of_infection: f32,
    /// Non-disease death rate (per day) for this individual's age/sex/year;
    /// zero when natural mortality is disabled.
    pub natural_mortality_rate: f32,
    pub rng: &'a mut NodeRng,
    pub infection_ids: &'a mut SuidGenerator,
}

// ── IndividualHuman ──────────────────────────────────────────────────────────

/// One simulated person, possibly standing in for several real people via
/// `mc_weight`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndividualHuman {
    suid: Suid,

    // ── Demographics ──────────────────────────────────────────────────────
    age_days:      f32,
    gender:        Gender,
    mc_weight:     f32,
    above_poverty: bool,
    properties:    PropertyBag,

    // ── Health state ──────────────────────────────────────────────────────
    infections:     Vec<Infection>,
    susceptibility: Susceptibility,
    interventions:  InterventionsContainer,
    /// Aggregate shed contagion/day after modifiers; recomputed at the
    /// start of each timestep by the owning node.
    infectiousness: f32,
    is_infected:    bool,
    new_infection_this_step: bool,
    state_change:   HumanStateChange,

    // ── Vital dynamics ────────────────────────────────────────────────────
    is_pregnant:     bool,
    pregnancy_timer: f32,

    // ── Migration state machine ───────────────────────────────────────────
    home_node_id:  Suid,
    migration_mod: f32,

    migration_destination:             Suid,
    migration_type:                    MigrationType,
    migration_time_until_trip:         f32,
    migration_time_at_destination:     f32,
    migration_is_destination_new_home: bool,
    migration_will_return:             bool,
    migration_outbound:                bool,

    waypoints: Vec<Waypoint>,

    // Family-trip staging: separate from the regular fields so a pending
    // family departure doesn't clobber an in-flight solo itinerary.
    waiting_for_family_trip: bool,
    leave_on_family_trip:    bool,
    is_on_family_trip:       bool,
    family_trip:             Option<FamilyTripRequest>,

    /// Index into the owning node's transmission pools.  Derived state:
    /// cheap to recompute and meaningless on another node, so it is
    /// reconstructed after every arrival instead of being serialized.
    #[serde(skip)]
    transmission_group: Option<usize>,
}

impl IndividualHuman {
    /// Create a new individual resident at `home_node_id`.
    pub fn new(
        suid: Suid,
        home_node_id: Suid,
        age_days: f32,
        gender: Gender,
        mc_weight: f32,
        initial_acquisition: f32,
        migration_mod: f32,
    ) -> Self {
        Self {
            suid,
            age_days,
            gender,
            mc_weight,
            above_poverty: false,
            properties: PropertyBag::new(),
            infections: Vec::new(),
            susceptibility: Susceptibility::new(initial_acquisition),
            interventions: InterventionsContainer::new(),
            infectiousness: 0.0,
            is_infected: false,
            new_infection_this_step: false,
            state_change: HumanStateChange::None,
            is_pregnant: false,
            pregnancy_timer: 0.0,
            home_node_id,
            migration_mod,
            migration_destination: Suid::NIL,
            migration_type: MigrationType::None,
            migration_time_until_trip: 0.0,
            migration_time_at_destination: 0.0,
            migration_is_destination_new_home: false,
            migration_will_return: true,
            migration_outbound: true,
            waypoints: Vec::new(),
            waiting_for_family_trip: false,
            leave_on_family_trip: false,
            is_on_family_trip: false,
            family_trip: None,
            transmission_group: None,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn suid(&self) -> Suid {
        self.suid
    }

    #[inline]
    pub fn age_days(&self) -> f32 {
        self.age_days
    }

    #[inline]
    pub fn age_years(&self) -> f32 {
        self.age_days / DAYS_PER_YEAR
    }

    #[inline]
    pub fn gender(&self) -> Gender {
        self.gender
    }

    #[inline]
    pub fn mc_weight(&self) -> f32 {
        self.mc_weight
    }

    #[inline]
    pub fn home_node_id(&self) -> Suid {
        self.home_node_id
    }

    #[inline]
    pub fn is_infected(&self) -> bool {
        self.is_infected
    }

    #[inline]
    pub fn had_new_infection_this_step(&self) -> bool {
        self.new_infection_this_step
    }

    #[inline]
    pub fn infectiousness(&self) -> f32 {
        self.infectiousness
    }

    #[inline]
    pub fn state_change(&self) -> HumanStateChange {
        self.state_change
    }

    pub fn properties(&self) -> &PropertyBag {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertyBag {
        &mut self.properties
    }

    pub fn interventions(&self) -> &InterventionsContainer {
        &self.interventions
    }

    pub fn interventions_mut(&mut self) -> &mut InterventionsContainer {
        &mut self.interventions
    }

    /// Distribute an intervention to this individual (the node-side
    /// `GiveIntervention` hook).  Returns whether it was applied.
    pub fn give_intervention(&mut self, intervention: crate::HeldIntervention) -> bool {
        self.interventions.give_intervention(intervention, &mut self.properties)
    }

    pub fn susceptibility(&self) -> &Susceptibility {
        &self.susceptibility
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn migration_destination(&self) -> Suid {
        self.migration_destination
    }

    pub fn migration_type(&self) -> MigrationType {
        self.migration_type
    }

    pub fn migration_is_destination_new_home(&self) -> bool {
        self.migration_is_destination_new_home
    }

    pub fn is_waiting_for_family_trip(&self) -> bool {
        self.waiting_for_family_trip
    }

    pub fn is_on_family_trip(&self) -> bool {
        self.is_on_family_trip
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.state_change.is_death()
    }

    #[inline]
    pub fn is_migrating(&self) -> bool {
        self.state_change == HumanStateChange::Migrating
    }

    /// `true` when this individual is at its home node.
    #[inline]
    pub fn at_home(&self, current_node: Suid) -> bool {
        self.home_node_id == current_node
    }

    /// A female of child-bearing age (14–45 years).
    pub fn is_possible_mother(&self) -> bool {
        let age = self.age_years();
        self.gender == Gender::Female && age > 14.0 && age < 45.0
    }

    pub fn is_pregnant(&self) -> bool {
        self.is_pregnant
    }

    /// Transmission pool index on the current node, if assigned.
    pub fn transmission_group(&self) -> Option<usize> {
        self.transmission_group
    }

    pub fn set_transmission_group(&mut self, group: Option<usize>) {
        self.transmission_group = group;
    }

    // ── Per-timestep update ───────────────────────────────────────────────

    /// Advance this individual by one timestep.
    ///
    /// Ordering is a contract (disease first, then death, then migration):
    /// a dead individual must not draw a trip, and exposure must use the
    /// start-of-timestep force of infection computed by the node before any
    /// individual updated.
    pub fn update(&mut self, ctx: &mut HumanContext<'_>) -> HumanUpdateOutcome {
        let mut outcome = HumanUpdateOutcome::default();
        self.state_change = HumanStateChange::None;
        self.new_infection_this_step = false;

        if ctx.config.enable_aging {
            self.update_age(ctx.dt, &mut outcome);
        }

        self.update_infections(ctx);
        self.susceptibility.update(ctx.dt, ctx.config.immunity_waning_rate);
        self.interventions.update(ctx.dt, &self.properties);

        if self.state_change == HumanStateChange::None {
            self.expose_to_infectivity(ctx, &mut outcome);
        }
        self.is_infected = !self.infections.is_empty();

        if self.state_change == HumanStateChange::None && ctx.config.enable_natural_mortality {
            self.check_vital_dynamics(ctx);
        }

        if self.state_change == HumanStateChange::None
            && ctx.config.migration_structure != MigrationStructure::NoMigration
        {
            outcome.family_trip_request = self.check_for_migration(ctx);
        }

        outcome
    }

    fn update_age(&mut self, dt: f32, outcome: &mut HumanUpdateOutcome) {
        let age_was = self.age_days;
        self.age_days += dt;

        // Broadcast when a birthday falls inside this step.
        let whole_years = (self.age_days / DAYS_PER_YEAR).floor();
        let birthday = whole_years * DAYS_PER_YEAR;
        if age_was < birthday && birthday <= self.age_days {
            outcome.events.push(EventTrigger::HAPPY_BIRTHDAY);
        }
    }

    fn update_infections(&mut self, ctx: &mut HumanContext<'_>) {
        if self.infections.is_empty() {
            return;
        }

        let mortality_modifier =
            self.interventions.mortality_modifier() * self.susceptibility.mod_mortality;

        let mut i = 0;
        while i < self.infections.len() {
            self.infections[i].update(ctx.dt, ctx.rng, &ctx.config.infection, mortality_modifier);
            match self.infections[i].state_change() {
                InfectionStateChange::Cleared => {
                    self.susceptibility.update_infection_cleared(
                        ctx.config.post_infection_acquisition_multiplier,
                    );
                    self.infections.swap_remove(i);
                }
                InfectionStateChange::Fatal => {
                    self.die(HumanStateChange::KilledByInfection);
                    break;
                }
                InfectionStateChange::None => i += 1,
            }
        }
    }

    fn expose_to_infectivity(&mut self, ctx: &mut HumanContext<'_>, outcome: &mut HumanUpdateOutcome) {
        if ctx.force_of_infection <= 0.0 {
            return;
        }
        let rate = ctx.force_of_infection
            * self.susceptibility.mod_acquire
            * self.interventions.acquire_modifier();
        let p_infect = 1.0 - (-rate * ctx.dt).exp();
        if ctx.rng.smart_draw(p_infect) {
            self.acquire_new_infection(ctx.rng, ctx.infection_ids, ctx.config, outcome);
        }
    }

    /// Add a new infection if the superinfection policy allows it.
    pub fn acquire_new_infection(
        &mut self,
        rng: &mut NodeRng,
        infection_ids: &mut SuidGenerator,
        config: &HumanConfig,
        outcome: &mut HumanUpdateOutcome,
    ) {
        let n = self.infections.len();
        let allowed =
            n == 0 || (config.enable_superinfection && n < config.max_infections);
        if !allowed {
            return;
        }

        let infection = Infection::new(infection_ids.next_suid(), rng, &config.infection);
        self.infectiousness += infection.infectiousness();
        self.infections.push(infection);
        self.is_infected = true;
        self.new_infection_this_step = true;
        outcome.events.push(EventTrigger::NEW_INFECTION);
    }

    fn check_vital_dynamics(&mut self, ctx: &mut HumanContext<'_>) {
        if ctx.rng.smart_draw(ctx.natural_mortality_rate * ctx.dt) {
            self.die(HumanStateChange::DiedFromNaturalCauses);
        }
    }

    /// Mark this individual as dying this timestep.  The owning node decides
    /// whether that means destruction (at home) or a final trip home.
    pub fn die(&mut self, kind: HumanStateChange) {
        debug_assert!(kind.is_death());
        self.state_change = kind;
    }

    // ── Infectiousness (start-of-timestep shedding) ───────────────────────

    /// Recompute aggregate infectiousness and return the contagion to
    /// deposit (weighted by `mc_weight`) into this individual's pool.
    ///
    /// Called by the node before any individual updates, so the deposit
    /// reflects the start-of-timestep population.
    pub fn update_infectiousness(&mut self) -> f32 {
        self.infectiousness = 0.0;
        if self.infections.is_empty() {
            return 0.0;
        }
        let raw: f32 = self.infections.iter().map(Infection::infectiousness).sum();
        let modifiers =
            self.susceptibility.mod_transmit * self.interventions.transmit_modifier();
        self.infectiousness = raw * modifiers;
        self.mc_weight * self.infectiousness
    }

    // ── Migration state machine ───────────────────────────────────────────

    /// Decide whether this individual departs this timestep.
    ///
    /// Returns a staged family trip for the node to register, if one was
    /// drawn.
    fn check_for_migration(&mut self, ctx: &mut HumanContext<'_>) -> Option<FamilyTripRequest> {
        debug_assert_eq!(ctx.config.migration_structure, MigrationStructure::FixedRate);

        let mut family_request = None;

        if self.leave_on_family_trip {
            let trip = self.family_trip.take().unwrap_or(FamilyTripRequest {
                destination:             Suid::NIL,
                trip_type:               MigrationType::None,
                time_until_trip:         0.0,
                time_at_destination:     0.0,
                is_destination_new_home: false,
            });
            self.migration_outbound                = true;
            self.migration_will_return             = true;
            self.migration_destination             = trip.destination;
            self.migration_type                    = trip.trip_type;
            self.migration_time_until_trip         = trip.time_until_trip;
            self.migration_time_at_destination     = trip.time_at_destination;
            self.migration_is_destination_new_home = trip.is_destination_new_home;
            self.is_on_family_trip                 = true;
            self.leave_on_family_trip              = false;
        } else if !self.waiting_for_family_trip && self.migration_destination.is_nil() {
            family_request = self.set_next_migration(ctx);
        }

        if !self.migration_destination.is_nil() {
            self.migration_time_until_trip -= ctx.dt;
            if self.migration_time_until_trip <= TRIP_TIMER_EPSILON {
                debug!(individual = %self.suid, destination = %self.migration_destination, "departing");
                self.state_change = HumanStateChange::Migrating;
            }
        }

        family_request
    }

    /// Draw the next leg of this individual's itinerary.
    ///
    /// Outbound individuals sample the node's migration CDF; individuals at
    /// their waypoint limit (or already inbound) walk the waypoint stack
    /// back toward home.  The reachable-node check deliberately gates only
    /// the outbound draw: a visitor must be able to leave a node whose own
    /// residents never migrate.
    fn set_next_migration(&mut self, ctx: &mut HumanContext<'_>) -> Option<FamilyTripRequest> {
        if self.waypoints.is_empty() {
            self.migration_outbound = true;
        } else if self.waypoints.len() >= ctx.config.max_waypoints {
            self.migration_outbound = false;
        }

        if self.migration_outbound && !ctx.migration_info.is_empty() {
            let step = ctx.migration_info.pick_migration_step(ctx.rng, self.migration_mod)?;

            if step.trip_type == MigrationType::Family {
                self.waiting_for_family_trip = true;
                self.migration_will_return = true; // family trips must return

                let time_at_destination = self.draw_roundtrip_duration(
                    MigrationType::Family,
                    ctx,
                );
                return Some(FamilyTripRequest {
                    destination:             step.destination,
                    trip_type:               step.trip_type,
                    time_until_trip:         step.time,
                    time_at_destination,
                    is_destination_new_home: false,
                });
            }

            self.migration_destination     = step.destination;
            self.migration_type            = step.trip_type;
            self.migration_time_until_trip = step.time;
            self.migration_will_return =
                ctx.rng.smart_draw(ctx.config.roundtrip(step.trip_type).probability);
        } else if let Some(waypoint) = self.waypoints.last().copied() {
            self.migration_destination = waypoint.node;
            if self.migration_time_at_destination > 0.0 {
                self.migration_time_until_trip     = self.migration_time_at_destination;
                self.migration_time_at_destination = 0.0;
            } else {
                self.migration_time_until_trip =
                    self.draw_roundtrip_duration(waypoint.trip_type, ctx);
            }
        }

        None
    }

    fn draw_roundtrip_duration(&self, trip_type: MigrationType, ctx: &mut HumanContext<'_>) -> f32 {
        let rate = ctx.config.roundtrip(trip_type).duration_rate;
        if rate > 0.0 {
            ctx.rng.exponential(rate)
        } else {
            0.0
        }
    }

    /// Route this individual home (to finish dying, or because an
    /// intervention recalled it).
    pub fn go_home(&mut self) {
        self.migration_destination = self.home_node_id;
    }

    /// Intervention-forced relocation to `destination`.
    pub fn set_migrating(
        &mut self,
        current_node: Suid,
        destination: Suid,
        trip_type: MigrationType,
        time_until_trip: f32,
        time_at_destination: f32,
        is_destination_new_home: bool,
    ) {
        if current_node == destination {
            return;
        }
        self.migration_destination             = destination;
        self.migration_type                    = trip_type;
        self.migration_time_until_trip         = time_until_trip;
        // The return logic keys off a positive stay; clamp zero stays up.
        self.migration_time_at_destination     = time_at_destination.max(0.001);
        self.migration_is_destination_new_home = is_destination_new_home;
        self.migration_outbound                = !is_destination_new_home;
        self.migration_will_return             = !is_destination_new_home;
    }

    // ── Family-trip staging (driven by the node) ──────────────────────────

    /// Release this individual onto the staged family trip next timestep.
    pub fn set_going_on_family_trip(&mut self, mut trip: FamilyTripRequest) {
        // The return logic keys off a positive stay; clamp zero stays up.
        if trip.time_at_destination <= 0.0 {
            trip.time_at_destination = 0.001;
        }
        self.leave_on_family_trip    = true;
        self.family_trip             = Some(trip);
        self.waiting_for_family_trip = false;
    }

    /// Hold this individual at the node until the family can leave together.
    pub fn set_waiting_to_go_on_family_trip(&mut self) {
        self.waiting_for_family_trip   = true;
        self.migration_destination     = Suid::NIL;
        self.migration_time_until_trip = 0.0;
    }

    // ── Ownership-transfer hooks ──────────────────────────────────────────

    /// Called by the source node as the individual leaves it.
    ///
    /// On an outbound round-trip leg, the departure point is pushed so the
    /// reverse trip can pop it; on an inbound leg the just-finished waypoint
    /// is popped.
    pub fn on_depart(&mut self, from_node: Suid) {
        if self.migration_outbound {
            if self.migration_will_return {
                self.waypoints.push(Waypoint {
                    node:      from_node,
                    trip_type: self.migration_type,
                });
            }
        } else if !self.waypoints.is_empty() {
            self.waypoints.pop();
        }
    }

    /// Called by the destination node as the individual arrives.
    pub fn on_arrive(&mut self, node: Suid) {
        if node == self.migration_destination {
            // Back where this itinerary started: reset so a fresh
            // destination can be drawn.
            if !self.migration_outbound
                && self.waypoints.len() == 1
                && self.waypoints[0].node == self.migration_destination
            {
                self.waypoints.clear();
                self.migration_outbound    = true;
                self.migration_will_return = true;
            }
            self.migration_destination = Suid::NIL;
        }

        if self.is_on_family_trip && node == self.home_node_id {
            self.is_on_family_trip = false;
        }

        // Pool membership is node-local; recomputed by the new owner.
        self.transmission_group = None;
    }

    /// If this trip was flagged as a permanent move, make `node` home and
    /// clear the itinerary.  Returns `true` when the home changed.
    pub fn settle_as_new_home(&mut self, node: Suid) -> bool {
        if !self.migration_is_destination_new_home {
            return false;
        }
        self.home_node_id                      = node;
        self.migration_is_destination_new_home = false;
        self.migration_outbound                = false;
        self.migration_will_return             = false;
        self.waypoints.clear();
        true
    }

    // ── Vital-dynamics hooks (driven by the node) ─────────────────────────

    /// Begin a pregnancy with a 40-week Poisson countdown.
    pub fn initiate_pregnancy(&mut self, rng: &mut NodeRng) {
        debug_assert!(!self.is_pregnant);
        self.is_pregnant = true;
        self.pregnancy_timer = rng.poisson(GESTATION_DAYS) as f32;
    }

    /// Count down an active pregnancy; returns `true` when delivery happens
    /// this timestep.
    pub fn update_pregnancy(&mut self, dt: f32) -> bool {
        if !self.is_pregnant {
            return false;
        }
        self.pregnancy_timer -= dt;
        if self.pregnancy_timer <= 0.0 {
            self.is_pregnant     = false;
            self.pregnancy_timer = 0.0;
            true
        } else {
            false
        }
    }
}
