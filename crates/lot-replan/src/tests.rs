//! Unit tests for lot-replan.
//!
//! Affected agents are placed on the grid by hand and pushed straight into
//! the queue, so each test controls exactly what the coordinator sees.

#[cfg(test)]
mod helpers {
    use std::sync::Arc;
    use std::time::Duration;

    use lot_core::{AgentClass, AgentId, CostMode, Pos, SimConfig};
    use lot_grid::{GridMap, SharedGrid};
    use lot_motion::{AffectedAgentInfo, LegKind, NoopObserver, SimulationContext, Supervisor};
    use lot_planner::AStarPlanner;

    use crate::ReplanCoordinator;

    pub fn ctx(grid: GridMap) -> Arc<SimulationContext> {
        let config = SimConfig { tick_quantum_ms: 2, dwell_ticks: 2, ..SimConfig::default() };
        Arc::new(SimulationContext::new(config, SharedGrid::new(grid), Arc::new(NoopObserver)))
    }

    pub fn coordinator(
        ctx: &Arc<SimulationContext>,
    ) -> (ReplanCoordinator<AStarPlanner>, Arc<Supervisor>) {
        let sup = Supervisor::new();
        let planner = Arc::new(AStarPlanner::new(CostMode::CongestionAware));
        (ReplanCoordinator::new(Arc::clone(ctx), planner, Arc::clone(&sup)), sup)
    }

    /// Put `agent` on `current` as an interrupted (stationary) vehicle and
    /// describe it the way an executor would.
    pub fn interrupted(
        ctx: &SimulationContext,
        agent: u32,
        leg: LegKind,
        current: Pos,
        previous: Option<Pos>,
        destination: Pos,
        remaining_len: usize,
    ) -> AffectedAgentInfo {
        let id = AgentId(agent);
        ctx.grid.with(|g| g.occupy(current, id, false)).unwrap();
        AffectedAgentInfo {
            agent: id,
            class: AgentClass::Privileged,
            leg,
            remaining: vec![current, destination],
            remaining_len,
            current,
            previous,
            destination,
            admission_index: agent as usize,
            elapsed_ticks: 3,
            delay_ticks: 1,
        }
    }

    pub fn settle(ctx: &SimulationContext, sup: &Supervisor) {
        assert!(sup.wait_until(Duration::from_secs(5), Duration::from_millis(2), || {
            ctx.affected.is_idle()
        }));
        sup.join_all();
    }
}

// ── ReplanCoordinator ─────────────────────────────────────────────────────────

#[cfg(test)]
mod coordinator {
    use std::thread;
    use std::time::Duration;

    use lot_core::{AgentId, Pos};
    use lot_grid::{CellKind, GridBuilder};
    use lot_motion::{AgentFate, LegKind, ReplanOutcome};

    use super::helpers::{coordinator, ctx, interrupted, settle};

    #[test]
    fn shortest_remaining_route_is_replanned_first() {
        let ctx = ctx(GridBuilder::new(3, 8).build());
        let (coord, sup) = coordinator(&ctx);
        let long = interrupted(&ctx, 1, LegKind::Outbound, Pos::new(0, 0), None, Pos::new(0, 7), 7);
        let short = interrupted(&ctx, 2, LegKind::Outbound, Pos::new(2, 0), None, Pos::new(2, 3), 3);
        ctx.affected.push(long);
        ctx.affected.push(short);

        let reports = coord.drain_once();
        let order: Vec<_> = reports.iter().map(|r| (r.order, r.agent, r.remaining_len)).collect();
        assert_eq!(order, vec![(0, AgentId(2), 3), (1, AgentId(1), 7)]);
        assert!(reports.iter().all(|r| matches!(r.outcome, ReplanOutcome::Rerouted { .. })));

        settle(&ctx, &sup);
        let ledger = ctx.ledger.lock();
        assert_eq!(ledger.replans().len(), 2);
        assert_eq!(ledger.records().len(), 2);
        assert!(ledger.records().iter().all(|r| r.replanned));
        assert_eq!(ledger.fate(AgentId(1)), Some(AgentFate::Departed));
    }

    #[test]
    fn alternate_route_avoids_the_closed_cell() {
        let ctx = ctx(GridBuilder::new(3, 5).build());
        ctx.raise_obstruction(Pos::new(0, 2)).unwrap();
        let (coord, sup) = coordinator(&ctx);
        let info = interrupted(
            &ctx,
            1,
            LegKind::Outbound,
            Pos::new(0, 1),
            Some(Pos::new(0, 0)),
            Pos::new(0, 4),
            4,
        );
        ctx.affected.push(info);

        let reports = coord.drain_once();
        assert_eq!(
            reports[0].outcome,
            ReplanOutcome::Rerouted { route_len: 6, destination: Pos::new(0, 4), reentered: false }
        );
        settle(&ctx, &sup);
        let ledger = ctx.ledger.lock();
        let record = ledger.records()[0];
        assert!(record.replanned);
        // Counters carried over from before the interruption.
        assert!(record.elapsed_ticks >= 3 + 5);
        assert!(record.delay_ticks >= 1);
    }

    #[test]
    fn u_turn_is_allowed_only_as_fallback() {
        //      c0 c1 c2 c3 c4
        // r0:  .  .  A  X  .
        // r1:  .  #  #  #  .
        // r2:  .  .  .  .  .
        let grid = GridBuilder::new(3, 5)
            .rect(Pos::new(1, 1), Pos::new(1, 3), CellKind::Wall)
            .build();
        let ctx = ctx(grid);
        ctx.raise_obstruction(Pos::new(0, 3)).unwrap();
        let (coord, sup) = coordinator(&ctx);
        let info = interrupted(
            &ctx,
            1,
            LegKind::Outbound,
            Pos::new(0, 2),
            Some(Pos::new(0, 1)),
            Pos::new(0, 4),
            3,
        );
        ctx.affected.push(info);

        let reports = coord.drain_once();
        let ReplanOutcome::Rerouted { reentered, route_len, .. } = reports[0].outcome else {
            panic!("expected a reroute")
        };
        assert!(reentered);
        assert_eq!(route_len, 11);
        settle(&ctx, &sup);
    }

    #[test]
    fn dead_end_is_unsolvable_and_releases_reserved_space() {
        // Single corridor from the entrance down to one space; the corridor
        // is cut below the agent.
        let space = Pos::new(5, 0);
        let grid = GridBuilder::new(6, 1)
            .cell(Pos::new(0, 0), CellKind::Entrance)
            .cell(space, CellKind::ParkingSpace)
            .build();
        let ctx = ctx(grid);
        ctx.grid.with(|g| g.occupy(space, AgentId(1), false)).unwrap();
        ctx.raise_obstruction(Pos::new(3, 0)).unwrap();
        let (coord, sup) = coordinator(&ctx);
        let info = interrupted(
            &ctx,
            1,
            LegKind::Inbound { space },
            Pos::new(2, 0),
            Some(Pos::new(1, 0)),
            Pos::new(4, 0),
            3,
        );
        ctx.affected.push(info);

        let reports = coord.drain_once();
        assert_eq!(reports[0].outcome, ReplanOutcome::Unsolvable);
        assert_eq!(sup.active(), 0);
        assert!(ctx.affected.is_idle());

        let space_cell = ctx.grid.cell(space).unwrap();
        assert_eq!(space_cell.kind, CellKind::ParkingSpace);
        assert_eq!(space_cell.occupant, None);
        // The agent stays where it stopped, stationary.
        let held = ctx.grid.cell(Pos::new(2, 0)).unwrap();
        assert_eq!(held.occupant, Some(AgentId(1)));
        assert!(!held.is_moving);
        assert_eq!(ctx.ledger.lock().fate(AgentId(1)), Some(AgentFate::Unsolvable));
    }

    #[test]
    fn closed_destination_is_substituted_by_a_neighbour() {
        let ctx = ctx(GridBuilder::new(3, 5).build());
        ctx.raise_obstruction(Pos::new(0, 4)).unwrap();
        let (coord, sup) = coordinator(&ctx);
        let info =
            interrupted(&ctx, 1, LegKind::Outbound, Pos::new(0, 0), None, Pos::new(0, 4), 5);
        ctx.affected.push(info);

        let reports = coord.drain_once();
        let ReplanOutcome::Rerouted { destination, .. } = reports[0].outcome else {
            panic!("expected a reroute")
        };
        // Up is out of bounds; down is the first passable neighbour.
        assert_eq!(destination, Pos::new(1, 4));
        settle(&ctx, &sup);
    }

    #[test]
    fn inbound_approach_is_substituted_around_the_space() {
        //      c0 c1 c2
        // r0:  E  .  .
        // r1:  .  .  .
        // r2:  .  P  .      approach (1,1) closed; (2,0) is next in order
        let space = Pos::new(2, 1);
        let grid = GridBuilder::new(3, 3)
            .cell(Pos::new(0, 0), CellKind::Entrance)
            .cell(space, CellKind::ParkingSpace)
            .build();
        let ctx = ctx(grid);
        ctx.grid.with(|g| g.occupy(space, AgentId(1), false)).unwrap();
        ctx.raise_obstruction(Pos::new(1, 1)).unwrap();
        let (coord, sup) = coordinator(&ctx);
        let info = interrupted(
            &ctx,
            1,
            LegKind::Inbound { space },
            Pos::new(0, 1),
            Some(Pos::new(0, 0)),
            Pos::new(1, 1),
            2,
        );
        ctx.affected.push(info);

        let reports = coord.drain_once();
        let ReplanOutcome::Rerouted { destination, .. } = reports[0].outcome else {
            panic!("expected a reroute")
        };
        assert_eq!(destination, Pos::new(2, 0));
        settle(&ctx, &sup);
        assert_eq!(ctx.ledger.lock().parked_space(AgentId(1)), Some(space));
    }

    #[test]
    fn own_cell_next_to_the_space_is_a_usable_substitute() {
        //      c0 c1 c2
        // r0:  E  .  .
        // r1:  .  X  .      approach (1,1) closed
        // r2:  A  P  #      agent already beside its space
        let space = Pos::new(2, 1);
        let grid = GridBuilder::new(3, 3)
            .cell(Pos::new(0, 0), CellKind::Entrance)
            .cell(space, CellKind::ParkingSpace)
            .cell(Pos::new(2, 2), CellKind::Wall)
            .build();
        let ctx = ctx(grid);
        ctx.grid.with(|g| g.occupy(space, AgentId(1), false)).unwrap();
        ctx.raise_obstruction(Pos::new(1, 1)).unwrap();
        let (coord, sup) = coordinator(&ctx);
        let info = interrupted(
            &ctx,
            1,
            LegKind::Inbound { space },
            Pos::new(2, 0),
            Some(Pos::new(1, 0)),
            Pos::new(1, 1),
            2,
        );
        ctx.affected.push(info);

        let reports = coord.drain_once();
        assert_eq!(
            reports[0].outcome,
            ReplanOutcome::Rerouted { route_len: 1, destination: Pos::new(2, 0), reentered: false }
        );
        settle(&ctx, &sup);
        assert_eq!(ctx.ledger.lock().parked_space(AgentId(1)), Some(space));
        assert_eq!(ctx.grid.cell(space).unwrap().occupant, Some(AgentId(1)));
        assert_eq!(ctx.grid.cell(Pos::new(2, 0)).unwrap().occupant, None);
    }

    #[test]
    fn occupied_exit_is_kept_as_the_destination() {
        //      c0 c1 c2 c3 c4
        // r0:  .  A  X  .  V      V: stationary vehicle on the exit
        // r1:  .  .  .  .  .
        // r2:  .  .  .  .  .
        let exit = Pos::new(0, 4);
        let ctx = ctx(GridBuilder::new(3, 5).build());
        ctx.grid.with(|g| g.occupy(exit, AgentId(9), false)).unwrap();
        ctx.raise_obstruction(Pos::new(0, 2)).unwrap();
        let (coord, sup) = coordinator(&ctx);
        let info =
            interrupted(&ctx, 1, LegKind::Outbound, Pos::new(0, 1), Some(Pos::new(0, 0)), exit, 4);
        ctx.affected.push(info);

        let reports = coord.drain_once();
        let ReplanOutcome::Rerouted { destination, .. } = reports[0].outcome else {
            panic!("expected a reroute")
        };
        assert_eq!(destination, exit);

        // The rerouted agent waits behind the vehicle until it leaves.
        thread::sleep(Duration::from_millis(40));
        assert_ne!(ctx.ledger.lock().fate(AgentId(1)), Some(AgentFate::Departed));
        ctx.grid.with(|g| g.vacate(exit, AgentId(9)));

        settle(&ctx, &sup);
        let ledger = ctx.ledger.lock();
        assert_eq!(ledger.fate(AgentId(1)), Some(AgentFate::Departed));
        assert!(ledger.records()[0].delay_ticks > 1);
    }

    #[test]
    fn standing_loop_exits_when_queue_closes() {
        let ctx = ctx(GridBuilder::new(1, 4).build());
        let (coord, sup) = coordinator(&ctx);
        let handle = coord.spawn().unwrap();

        let info =
            interrupted(&ctx, 1, LegKind::Outbound, Pos::new(0, 0), None, Pos::new(0, 3), 4);
        ctx.affected.push(info);
        settle(&ctx, &sup);
        assert_eq!(ctx.ledger.lock().replans().len(), 1);

        ctx.request_shutdown();
        handle.join().unwrap();
    }
}

// ── EventMonitor ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod monitor {
    use std::sync::Arc;

    use lot_core::{AgentId, ObstructionSpec, Pos, SimConfig, SimRng};
    use lot_grid::{CellKind, GridBuilder, SharedGrid};
    use lot_motion::{NoopObserver, SimulationContext};

    use crate::{EventMonitor, random_closable_cell};

    fn ctx_with(obstructions: Vec<ObstructionSpec>) -> Arc<SimulationContext> {
        let grid = GridBuilder::new(2, 3)
            .cell(Pos::new(0, 0), CellKind::Entrance)
            .cell(Pos::new(1, 0), CellKind::Wall)
            .build();
        let config = SimConfig { tick_quantum_ms: 1, obstructions, ..SimConfig::default() };
        Arc::new(SimulationContext::new(config, SharedGrid::new(grid), Arc::new(NoopObserver)))
    }

    #[test]
    fn random_cell_skips_congested_and_occupied_aisles() {
        let mut grid = GridBuilder::filled(1, 3, CellKind::Aisle).build();
        grid.publish_wait(Pos::new(0, 0), AgentId(1), 4);
        grid.occupy(Pos::new(0, 1), AgentId(2), true).unwrap();
        let mut rng = SimRng::new(7);
        for _ in 0..10 {
            assert_eq!(random_closable_cell(&grid, &mut rng), Some(Pos::new(0, 2)));
        }
    }

    #[test]
    fn random_cell_none_when_nothing_qualifies() {
        let grid = GridBuilder::filled(2, 2, CellKind::Wall).build();
        assert_eq!(random_closable_cell(&grid, &mut SimRng::new(1)), None);
    }

    #[test]
    fn configured_cell_is_closed() {
        let spec = ObstructionSpec { delay_ticks: 2, cell: Some(Pos::new(0, 2)) };
        let ctx = ctx_with(vec![spec]);
        let raised = EventMonitor::new(Arc::clone(&ctx), SimRng::new(1)).run();
        assert_eq!(raised, 1);
        assert_eq!(ctx.grid.cell(Pos::new(0, 2)).unwrap().kind, CellKind::ClosedAisle);
        assert!(ctx.obstructions.is_raised());
    }

    #[test]
    fn invalid_cells_are_skipped() {
        let specs = vec![
            ObstructionSpec { delay_ticks: 0, cell: Some(Pos::new(1, 0)) },
            ObstructionSpec { delay_ticks: 0, cell: Some(Pos::new(0, 0)) },
            ObstructionSpec { delay_ticks: 0, cell: Some(Pos::new(9, 9)) },
        ];
        let ctx = ctx_with(specs);
        assert_eq!(EventMonitor::new(Arc::clone(&ctx), SimRng::new(1)).run(), 0);
        assert!(!ctx.obstructions.is_raised());
    }

    #[test]
    fn random_closures_pick_distinct_aisles() {
        let specs = vec![ObstructionSpec { delay_ticks: 0, cell: None }; 3];
        let ctx = ctx_with(specs);
        let raised = EventMonitor::new(Arc::clone(&ctx), SimRng::new(3)).spawn().unwrap();
        // Aisles: (0,1) (0,2) (1,1) (1,2); three get closed.
        assert_eq!(raised.join().unwrap(), 3);
        let mut closed = ctx.obstructions.closed_cells();
        closed.sort();
        closed.dedup();
        assert_eq!(closed.len(), 3);
    }

    #[test]
    fn shutdown_stops_a_pending_schedule() {
        let spec = ObstructionSpec { delay_ticks: 10_000, cell: Some(Pos::new(0, 2)) };
        let ctx = ctx_with(vec![spec]);
        let handle = EventMonitor::new(Arc::clone(&ctx), SimRng::new(1)).spawn().unwrap();
        ctx.request_shutdown();
        assert_eq!(handle.join().unwrap(), 0);
    }
}
