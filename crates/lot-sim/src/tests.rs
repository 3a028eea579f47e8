//! Integration-style tests for lot-sim.
//!
//! Every test runs real worker threads on a short tick and bounds every wait.

#[cfg(test)]
mod helpers {
    use std::sync::{Arc, Mutex};

    use lot_core::{AgentId, Pos, SimConfig};
    use lot_grid::{CellKind, GridBuilder, GridMap};
    use lot_motion::{AffectedAgentInfo, LotObserver, ReplanReport, TravelRecord};
    use lot_planner::AStarPlanner;

    use crate::{SimBuilder, Simulation};

    pub fn config(quantum_ms: u64, gate: Pos) -> SimConfig {
        SimConfig {
            tick_quantum_ms: quantum_ms,
            dwell_ticks: 2,
            entrance: gate,
            exit: gate,
            ..SimConfig::default()
        }
    }

    pub fn sim(config: SimConfig, grid: GridMap) -> Simulation<AStarPlanner> {
        SimBuilder::new(config, grid, AStarPlanner::default()).build().unwrap()
    }

    /// 8 × 8 of wall with one corridor:
    ///
    /// ```text
    ///   # E # …      E = (0,1)
    ///   # . # …      corridor (1..=6, 1)
    ///   …
    ///   # P # …      P = (7,1)
    /// ```
    pub fn corridor_lot() -> GridMap {
        GridBuilder::filled(8, 8, CellKind::Wall)
            .cell(Pos::new(0, 1), CellKind::Entrance)
            .rect(Pos::new(1, 1), Pos::new(6, 1), CellKind::Aisle)
            .cell(Pos::new(7, 1), CellKind::ParkingSpace)
            .build()
    }

    /// 3 × 6 open lot, entrance top-left, one space bottom-right.
    ///
    /// ```text
    ///   E . . . . .
    ///   . . . . . .
    ///   . . . . . P
    /// ```
    pub fn open_lot() -> GridMap {
        GridBuilder::new(3, 6)
            .cell(Pos::new(0, 0), CellKind::Entrance)
            .cell(Pos::new(2, 5), CellKind::ParkingSpace)
            .build()
    }

    /// Collects observer events as strings.
    #[derive(Default)]
    pub struct Recorder {
        pub events: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn push(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }

        pub fn count(&self, prefix: &str) -> usize {
            self.events.lock().unwrap().iter().filter(|e| e.starts_with(prefix)).count()
        }
    }

    impl LotObserver for Recorder {
        fn on_assignment(&self, agent: AgentId, space: Pos) {
            self.push(format!("assign {} {space}", agent.0));
        }
        fn on_leg_complete(&self, record: &TravelRecord) {
            self.push(format!("leg {} {}", record.agent.0, record.leg.as_str()));
        }
        fn on_interrupted(&self, info: &AffectedAgentInfo) {
            self.push(format!("interrupted {}", info.agent.0));
        }
        fn on_replan(&self, report: &ReplanReport) {
            self.push(format!("replan {}", report.agent.0));
        }
        fn on_obstruction(&self, cell: Pos) {
            self.push(format!("closed {cell}"));
        }
    }

    pub fn recorder() -> Arc<Recorder> {
        Arc::new(Recorder::default())
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use lot_core::{LotError, Pos, SimConfig};
    use lot_grid::GridBuilder;
    use lot_planner::AStarPlanner;

    use super::helpers::{config, corridor_lot};
    use crate::{SimBuilder, SimError};

    #[test]
    fn zero_quantum_is_rejected() {
        let cfg = SimConfig { tick_quantum_ms: 0, ..config(1, Pos::new(0, 1)) };
        let err = SimBuilder::new(cfg, corridor_lot(), AStarPlanner::default()).build().err();
        assert!(matches!(err, Some(SimError::Lot(LotError::Config(_)))));
    }

    #[test]
    fn gates_must_be_roadway() {
        let on_wall = config(1, Pos::new(0, 0));
        let err = SimBuilder::new(on_wall, corridor_lot(), AStarPlanner::default()).build().err();
        assert!(matches!(err, Some(SimError::Lot(LotError::InvalidPosition { .. }))));

        let off_grid = config(1, Pos::new(-1, 0));
        let grid = GridBuilder::new(2, 2).build();
        assert!(SimBuilder::new(off_grid, grid, AStarPlanner::default()).build().is_err());
    }

    #[test]
    fn entrance_may_double_as_exit() {
        let sim = SimBuilder::new(config(1, Pos::new(0, 1)), corridor_lot(), AStarPlanner::default())
            .build();
        assert!(sim.is_ok());
    }
}

// ── Admission & release ───────────────────────────────────────────────────────

#[cfg(test)]
mod admission {
    use std::time::Duration;

    use lot_core::{AgentClass, AgentId, LotError, Pos, SimRng};
    use lot_grid::{CellKind, GridBuilder};
    use lot_motion::{AgentFate, LegKind};
    use lot_planner::{AStarPlanner, PlanError};

    use super::helpers::{config, open_lot, recorder, sim};
    use crate::{SimBuilder, SimError};

    #[test]
    fn admitted_agent_parks_and_reports_stats() {
        let rec = recorder();
        let mut sim = SimBuilder::new(config(2, Pos::new(0, 0)), open_lot(), AStarPlanner::default())
            .observer(rec.clone())
            .build()
            .unwrap();
        let space = Pos::new(2, 5);
        sim.admit_agent(space, AgentId(0), AgentClass::Privileged).unwrap();

        // Reserved straight away.
        assert!(sim.free_spaces().is_empty());
        assert!(sim.wait_settled(Duration::from_secs(5)));

        assert_eq!(sim.fate(AgentId(0)), Some(AgentFate::Parked));
        assert_eq!(sim.snapshot().occupants(), vec![(AgentId(0), space)]);
        let stats = sim.completion_stats();
        assert_eq!(stats.len(), 1);
        // Entrance (0,0) to the approach (1,5): six steps, then two settling ticks.
        assert_eq!(stats[0], (AgentId(0), 6 + 2));
        assert_eq!(rec.count("assign 0"), 1);
        assert_eq!(rec.count("leg 0 inbound"), 1);
        sim.shutdown();
    }

    #[test]
    fn release_drives_to_the_exit_and_frees_the_space() {
        let sim = sim(config(2, Pos::new(0, 0)), open_lot());
        let space = Pos::new(2, 5);
        sim.admit_agent(space, AgentId(4), AgentClass::Exempt).unwrap();
        assert!(sim.wait_settled(Duration::from_secs(5)));

        sim.release_agent(AgentId(4)).unwrap();
        assert_eq!(sim.free_spaces(), vec![space]);
        assert!(sim.wait_settled(Duration::from_secs(5)));

        assert_eq!(sim.fate(AgentId(4)), Some(AgentFate::Departed));
        assert!(sim.snapshot().occupants().is_empty());
        let legs: Vec<_> = sim.travel_records().iter().map(|r| r.leg).collect();
        assert_eq!(legs, vec![LegKind::Inbound { space }, LegKind::Outbound]);
        // Outbound legs do not count as completions.
        assert_eq!(sim.completion_stats().len(), 1);
        assert_eq!(sim.grid().cell(Pos::new(0, 0)).unwrap().kind, CellKind::Entrance);
    }

    #[test]
    fn non_space_destination_is_rejected() {
        let sim = sim(config(2, Pos::new(0, 0)), open_lot());
        let err = sim.admit_agent(Pos::new(1, 1), AgentId(0), AgentClass::Privileged);
        assert!(matches!(err, Err(SimError::Lot(LotError::InvalidPosition { .. }))));
        assert!(sim.admit_agent(Pos::new(9, 9), AgentId(0), AgentClass::Privileged).is_err());
        // The identity was not consumed.
        sim.admit_agent(Pos::new(2, 5), AgentId(0), AgentClass::Privileged).unwrap();
    }

    #[test]
    fn space_without_passable_neighbour_is_rejected() {
        let grid = GridBuilder::new(3, 3)
            .cell(Pos::new(0, 0), CellKind::Entrance)
            .rect(Pos::new(1, 1), Pos::new(2, 2), CellKind::Wall)
            .cell(Pos::new(2, 2), CellKind::ParkingSpace)
            .build();
        let sim = sim(config(2, Pos::new(0, 0)), grid);
        let err = sim.admit_agent(Pos::new(2, 2), AgentId(1), AgentClass::Privileged);
        assert!(matches!(err, Err(SimError::Lot(LotError::InvalidPosition { .. }))));
        assert_eq!(sim.grid().cell(Pos::new(2, 2)).unwrap().kind, CellKind::ParkingSpace);
    }

    #[test]
    fn unreachable_space_leaves_no_trace() {
        // The space's only neighbour is cut off from the entrance.
        let grid = GridBuilder::new(3, 3)
            .cell(Pos::new(0, 0), CellKind::Entrance)
            .rect(Pos::new(0, 1), Pos::new(2, 1), CellKind::Wall)
            .cell(Pos::new(0, 2), CellKind::ParkingSpace)
            .build();
        let sim = sim(config(2, Pos::new(0, 0)), grid);
        let err = sim.admit_agent(Pos::new(0, 2), AgentId(1), AgentClass::Privileged);
        assert!(matches!(err, Err(SimError::Plan(PlanError::NoPathFound { .. }))));
        let cell = sim.grid().cell(Pos::new(0, 2)).unwrap();
        assert_eq!((cell.kind, cell.occupant), (CellKind::ParkingSpace, None));
        assert_eq!(sim.fate(AgentId(1)), None);
        assert_eq!(sim.active_agents(), 0);
    }

    #[test]
    fn duplicate_identity_is_rejected() {
        let grid = GridBuilder::new(2, 3)
            .cell(Pos::new(0, 0), CellKind::Entrance)
            .cell(Pos::new(1, 1), CellKind::ParkingSpace)
            .cell(Pos::new(1, 2), CellKind::ParkingSpace)
            .build();
        let sim = sim(config(2, Pos::new(0, 0)), grid);
        sim.admit_agent(Pos::new(1, 1), AgentId(3), AgentClass::Privileged).unwrap();
        let err = sim.admit_agent(Pos::new(1, 2), AgentId(3), AgentClass::Privileged);
        assert!(matches!(err, Err(SimError::Lot(LotError::DuplicateAgent(AgentId(3))))));
        assert_eq!(sim.free_spaces(), vec![Pos::new(1, 2)]);
    }

    #[test]
    fn release_requires_a_parked_agent() {
        let sim = sim(config(2, Pos::new(0, 0)), open_lot());
        assert!(matches!(
            sim.release_agent(AgentId(8)),
            Err(SimError::Lot(LotError::AgentNotFound(AgentId(8))))
        ));
        sim.admit_agent(Pos::new(2, 5), AgentId(8), AgentClass::Privileged).unwrap();
        // Still driving in: not parked yet.
        assert!(matches!(sim.release_agent(AgentId(8)), Err(SimError::NotParked(AgentId(8)))));
    }

    #[test]
    fn random_free_space_skips_reserved_spaces() {
        let grid = GridBuilder::new(2, 4)
            .cell(Pos::new(0, 0), CellKind::Entrance)
            .rect(Pos::new(1, 1), Pos::new(1, 3), CellKind::ParkingSpace)
            .build();
        let sim = sim(config(2, Pos::new(0, 0)), grid);
        sim.admit_agent(Pos::new(1, 2), AgentId(0), AgentClass::Exempt).unwrap();
        let mut rng = SimRng::new(11);
        for _ in 0..20 {
            let pick = sim.random_free_space(&mut rng).unwrap();
            assert!(pick == Pos::new(1, 1) || pick == Pos::new(1, 3));
        }
    }
}

// ── Obstructions & replanning ─────────────────────────────────────────────────

#[cfg(test)]
mod replanning {
    use std::time::Duration;

    use lot_core::{AgentClass, AgentId, ObstructionSpec, Pos, SimConfig};
    use lot_grid::CellKind;
    use lot_motion::{AgentFate, ReplanOutcome};
    use lot_planner::{AStarPlanner, PathPlanner, PlanRequest};

    use super::helpers::{config, corridor_lot, open_lot, recorder, sim};
    use crate::{SimBuilder, SimError};

    #[test]
    fn corridor_closure_is_unsolvable() {
        let grid = corridor_lot();
        let entrance = Pos::new(0, 1);
        let space = Pos::new(7, 1);

        // The admission route runs the whole corridor: six cells + entrance.
        let route = AStarPlanner::default()
            .plan(&grid, &PlanRequest::new(entrance, Pos::new(6, 1)))
            .unwrap();
        assert_eq!(route.len(), 6 + 1);

        let sim = sim(SimConfig { dwell_ticks: 9, ..config(20, entrance) }, grid);
        sim.admit_agent(space, AgentId(0), AgentClass::Privileged).unwrap();
        sim.trigger_obstruction(Pos::new(5, 1)).unwrap();
        assert!(sim.wait_settled(Duration::from_secs(5)));

        assert!(matches!(
            sim.outcome(AgentId(0)),
            Err(SimError::UnsolvableAfterObstruction(AgentId(0)))
        ));
        assert_eq!(sim.unsolvable_agents(), vec![AgentId(0)]);
        let reports = sim.replan_reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].outcome, ReplanOutcome::Unsolvable);
        // Reservation released; the agent is stuck short of the closure.
        assert_eq!(sim.grid().cell(space).unwrap().kind, CellKind::ParkingSpace);
        let occupants = sim.snapshot().occupants();
        assert_eq!(occupants.len(), 1);
        assert!(occupants[0].1.row < 5);
        assert!(sim.completion_stats().is_empty());
    }

    #[test]
    fn closed_approach_is_rerouted_around() {
        let rec = recorder();
        let sim = SimBuilder::new(config(10, Pos::new(0, 0)), open_lot(), AStarPlanner::default())
            .observer(rec.clone())
            .build()
            .unwrap();
        let space = Pos::new(2, 5);
        sim.admit_agent(space, AgentId(0), AgentClass::Privileged).unwrap();
        // The approach cell (1,5) closes before the agent gets near it.
        sim.trigger_obstruction(Pos::new(1, 5)).unwrap();
        assert!(sim.wait_settled(Duration::from_secs(5)));

        let reports = sim.replan_reports();
        assert_eq!(reports.len(), 1);
        let ReplanOutcome::Rerouted { destination, .. } = reports[0].outcome else {
            panic!("expected a reroute")
        };
        assert_eq!(destination, Pos::new(2, 4));
        assert_eq!(sim.outcome(AgentId(0)).unwrap(), AgentFate::Parked);
        let records = sim.travel_records();
        assert_eq!(records.len(), 1);
        assert!(records[0].replanned);
        assert_eq!(rec.count("closed (1, 5)"), 1);
        assert_eq!(rec.count("interrupted 0"), 1);
        assert_eq!(rec.count("replan 0"), 1);
    }

    #[test]
    fn trigger_rejects_non_aisles() {
        let sim = sim(config(2, Pos::new(0, 0)), open_lot());
        assert!(sim.trigger_obstruction(Pos::new(0, 0)).is_err());
        assert!(sim.trigger_obstruction(Pos::new(2, 5)).is_err());
        assert!(sim.replan_reports().is_empty());
    }

    #[test]
    fn configured_closure_is_raised_by_the_monitor() {
        let cfg = SimConfig {
            obstructions: vec![ObstructionSpec { delay_ticks: 1, cell: Some(Pos::new(1, 2)) }],
            ..config(2, Pos::new(0, 0))
        };
        let mut sim = sim(cfg, open_lot());
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while sim.context().obstructions.count() == 0 && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(sim.grid().cell(Pos::new(1, 2)).unwrap().kind, CellKind::ClosedAisle);
        sim.shutdown();
    }

    #[test]
    fn unknown_agent_outcome() {
        let sim = sim(config(2, Pos::new(0, 0)), open_lot());
        assert!(matches!(sim.outcome(AgentId(5)), Err(SimError::Lot(_))));
    }
}

// ── Concurrency & lifecycle ───────────────────────────────────────────────────

#[cfg(test)]
mod lifecycle {
    use std::collections::HashSet;
    use std::time::{Duration, Instant};

    use lot_core::{AgentClass, AgentId, Pos};
    use lot_grid::{CellKind, GridBuilder};
    use lot_motion::AgentFate;

    use super::helpers::{config, open_lot, sim};

    #[test]
    fn occupancy_invariant_holds_with_many_agents() {
        let sim = sim(config(2, Pos::new(0, 4)), GridBuilder::reference_lot());
        let spaces = [1, 2, 6, 7, 8, 9, 10].map(|c| Pos::new(0, c));
        for (i, &space) in spaces.iter().enumerate() {
            let class = if i % 2 == 0 { AgentClass::Privileged } else { AgentClass::Exempt };
            sim.admit_agent(space, AgentId(i as u32), class).unwrap();
        }

        let deadline = Instant::now() + Duration::from_secs(10);
        while sim.active_agents() > 0 && Instant::now() < deadline {
            let grid = sim.snapshot();
            let mut agents = HashSet::new();
            for (agent, pos) in grid.occupants() {
                assert!(agents.insert(agent), "{agent} holds two cells");
                let kind = grid.cell(pos).unwrap().surface;
                assert!(kind != CellKind::Wall && kind != CellKind::ClosedAisle);
            }
        }

        assert!(sim.wait_settled(Duration::from_secs(1)));
        for i in 0..spaces.len() {
            assert_eq!(sim.fate(AgentId(i as u32)), Some(AgentFate::Parked));
        }
        let mut stats = sim.completion_stats();
        assert_eq!(stats.len(), spaces.len());
        stats.sort_by_key(|&(a, _)| a);
        // Nobody beats the free-flow time to its approach cell.
        for (agent, elapsed) in stats {
            let approach_col = spaces[agent.index()].col;
            let free_flow = 1 + (approach_col - 4).unsigned_abs() as u64;
            assert!(elapsed >= free_flow, "{agent} took {elapsed} < {free_flow}");
        }
    }

    #[test]
    fn shutdown_unblocks_a_stuck_agent() {
        let mut sim = sim(config(2, Pos::new(0, 0)), open_lot());
        // A stationary vehicle parked across the only way out of the entrance
        // row and column.
        sim.grid().with(|g| g.occupy(Pos::new(0, 1), AgentId(90), false)).unwrap();
        sim.grid().with(|g| g.occupy(Pos::new(1, 0), AgentId(91), false)).unwrap();
        sim.admit_agent(Pos::new(2, 5), AgentId(0), AgentClass::Privileged).unwrap();

        assert!(!sim.wait_settled(Duration::from_millis(30)));
        assert_eq!(sim.active_agents(), 1);
        sim.shutdown();
        assert_eq!(sim.active_agents(), 0);
        // Idempotent.
        sim.shutdown();
    }

    #[test]
    fn drop_joins_workers() {
        let sim = sim(config(2, Pos::new(0, 0)), open_lot());
        sim.admit_agent(Pos::new(2, 5), AgentId(0), AgentClass::Privileged).unwrap();
        let ctx = sim.context().clone();
        drop(sim);
        assert!(ctx.is_shutting_down());
        assert!(ctx.affected.is_closed());
    }
}
