//! Eco-room balancer.
//!
//! Primary path: a small MILP (`good_lp`, `highs` backend). Per staff and
//! eco-bearing floor, an integer `e[staff,building,floor]` variable draws
//! eco rooms, only created for staff with a positive outstanding eco
//! shortage in that building (a staff with no eco quota left there is never
//! offered a variable, matching [`pick_eco_candidate`]'s eligibility gate);
//! a staff already present there (via bath, twin, or single) can draw freely
//! up to their remaining shortage, while a staff opening a new floor needs a
//! binary `opens` indicator, consuming one unit of their combined
//! (cross-building) floor-cap budget unless the floor is adjacent
//! (`|Δ| <= 1`) to one they already hold, or they are a contractor. Bath
//! cleaners never open a new floor for eco. A heavily-penalized slack
//! variable absorbs any floor's eco supply the model cannot otherwise place,
//! and the objective also minimizes per-staff shortage against quota and the
//! spread between the most- and least-loaded staff, so eco counts on a
//! shared floor land within one of each other without a separate balancing
//! pass.
//!
//! Falls back to a deterministic greedy placer ([`solve_eco_fallback`]) if
//! the MILP has nothing to place or `highs` itself fails.

use std::collections::BTreeMap;
use std::time::Duration;

use good_lp::solvers::highs::highs;
use good_lp::{constraint, variable, Expression, ProblemVariables, Solution, SolverModel, Variable};

use crate::allocation::StaffAssignment;
use crate::building::BuildingData;
use crate::floor_pool::FloorPools;
use crate::staff::{max_floors, StaffConstraints, StaffDistribution};
use crate::types::{Building, StaffId};

const UNASSIGNED_PENALTY_WEIGHT: f64 = 1000.0;
const SHORTAGE_WEIGHT: f64 = 1000.0;
/// Tiny tie-break nudging `opens` to zero whenever the corresponding `e` is
/// already zero, so the model doesn't arbitrarily mark a floor opened when
/// nothing forces it to.
const OPENS_EPSILON: f64 = 0.01;

/// Runs the eco solver in place over `assignments`, drawing from `pools`.
///
/// Returns the total number of eco rooms placed, for diagnostics; any
/// shortfall shows up later as unassigned eco rooms (component I).
#[allow(clippy::too_many_arguments)]
pub fn solve_eco(
    building_data: &BuildingData,
    pools: &mut FloorPools,
    assignments: &mut BTreeMap<StaffId, StaffAssignment>,
    staff_order: &[StaffId],
    distribution: &BTreeMap<StaffId, StaffDistribution>,
    constraints: &BTreeMap<StaffId, StaffConstraints>,
    timeout: Duration,
    fallback_timeout: Duration,
) -> u32 {
    if let Some(placement) =
        solve_eco_milp(building_data, pools, assignments, staff_order, distribution, constraints, timeout)
    {
        let mut placed_total = 0;
        for ((staff, building, floor), count) in placement {
            if count == 0 {
                continue;
            }
            let Some(pool) = pools.get_mut(building, floor) else { continue };
            let taken = pool.allocate_eco(count);
            if taken == 0 {
                continue;
            }
            assignments
                .get_mut(&staff)
                .unwrap()
                .assignments_mut(building)
                .entry(floor)
                .or_default()
                .add_eco(taken);
            placed_total += taken;
        }

        #[cfg(feature = "trace")]
        tracing::info!(target: "eco", placed = placed_total as u64, "eco solver (milp) complete");

        return placed_total;
    }

    solve_eco_fallback(building_data, pools, assignments, staff_order, distribution, constraints, fallback_timeout)
}

/// Builds and solves the eco MILP without mutating `pools`/`assignments`;
/// the caller applies the returned placement itself. Returns `None` when
/// there is no eco supply to place, or `highs` fails to solve.
#[allow(clippy::too_many_arguments)]
fn solve_eco_milp(
    building_data: &BuildingData,
    pools: &FloorPools,
    assignments: &BTreeMap<StaffId, StaffAssignment>,
    staff_order: &[StaffId],
    distribution: &BTreeMap<StaffId, StaffDistribution>,
    constraints: &BTreeMap<StaffId, StaffConstraints>,
    timeout: Duration,
) -> Option<BTreeMap<(StaffId, Building, i32), u32>> {
    if staff_order.is_empty() {
        return None;
    }

    let mut supply: BTreeMap<(Building, i32), u32> = BTreeMap::new();
    for building in [Building::Main, Building::Annex] {
        for floor in building_data.floors(building) {
            if let Some(pool) = pools.get(building, floor.floor_number) {
                if pool.eco_remaining() > 0 {
                    supply.insert((building, floor.floor_number), pool.eco_remaining());
                }
            }
        }
    }
    if supply.is_empty() {
        return None;
    }

    let mut vars = ProblemVariables::new();
    let mut e: BTreeMap<(StaffId, Building, i32), Variable> = BTreeMap::new();
    let mut opens: BTreeMap<(StaffId, Building, i32), Variable> = BTreeMap::new();
    let mut budget_keys: BTreeMap<StaffId, Vec<(Building, i32)>> = BTreeMap::new();

    for (&(building, floor), &cap) in &supply {
        for &staff in staff_order {
            let assignment = &assignments[&staff];
            let already_present = assignment.is_present(building, floor);
            let cons = constraints.get(&staff).copied().unwrap_or_default();

            if !already_present && cons.is_bath_cleaner() {
                continue;
            }

            let target = distribution.get(&staff).map(|d| d.eco(building)).unwrap_or(0);
            let assigned: u32 = assignment.assignments(building).values().map(|a| a.eco_rooms).sum();
            let quota_remaining = target.saturating_sub(assigned);
            if quota_remaining == 0 {
                continue; // no outstanding eco shortage here, matches the fallback's eligibility gate
            }

            let v = vars.add(variable().integer().min(0.0).max(cap.min(quota_remaining) as f64));
            e.insert((staff, building, floor), v);

            if !already_present {
                let ov = vars.add(variable().binary());
                opens.insert((staff, building, floor), ov);
                if !cons.is_contractor() && !is_adjacent_to_existing(assignment, building, floor) {
                    budget_keys.entry(staff).or_default().push((building, floor));
                }
            }
        }
    }

    let mut slack: BTreeMap<(Building, i32), Variable> = BTreeMap::new();
    for (&key, &cap) in &supply {
        slack.insert(key, vars.add(variable().integer().min(0.0).max(cap as f64)));
    }

    let mut shortage: BTreeMap<(StaffId, Building), Variable> = BTreeMap::new();
    for &staff in staff_order {
        for building in [Building::Main, Building::Annex] {
            let target = distribution.get(&staff).map(|d| d.eco(building)).unwrap_or(0);
            if target > 0 {
                shortage.insert((staff, building), vars.add(variable().integer().min(0.0).max(target as f64)));
            }
        }
    }

    let max_total = vars.add(variable().integer().min(0.0));
    let min_total = vars.add(variable().integer().min(0.0));

    let mut objective = Expression::from(0.0);
    for &v in slack.values() {
        objective = objective + UNASSIGNED_PENALTY_WEIGHT * v;
    }
    for &v in shortage.values() {
        objective = objective + SHORTAGE_WEIGHT * v;
    }
    for &v in opens.values() {
        objective = objective + OPENS_EPSILON * v;
    }
    objective = objective + (max_total - min_total);

    let mut problem = vars
        .minimise(objective)
        .using(highs)
        .set_time_limit(timeout.as_secs_f64());

    // Exhaustion-with-slack, one constraint per eco-bearing floor.
    for (&(building, floor), &cap) in &supply {
        let mut sum = Expression::from(0.0);
        for (&(_, b, f), &v) in &e {
            if b == building && f == floor {
                sum = sum + v;
            }
        }
        let s = slack[&(building, floor)];
        problem = problem.with((sum + s).eq(cap as f64));
    }

    // opens/e linking for floors not already held.
    for (&(staff, building, floor), &ov) in &opens {
        let cap = supply[&(building, floor)];
        let ev = e[&(staff, building, floor)];
        problem = problem.with(constraint!(ev <= cap as f64 * ov));
    }

    // Combined cross-building floor-cap budget, consuming only non-adjacent
    // new-floor opens (matching the fallback's flat per-staff counter).
    for &staff in staff_order {
        let Some(keys) = budget_keys.get(&staff) else { continue };
        let cons = constraints.get(&staff).copied().unwrap_or_default();
        let cap = max_floors(&cons);
        let used = assignments[&staff].floor_count() as u32;
        let remaining = cap.saturating_sub(used);
        let mut sum = Expression::from(0.0);
        for &(building, floor) in keys {
            sum = sum + opens[&(staff, building, floor)];
        }
        problem = problem.with(constraint!(sum <= remaining as f64));
    }

    // Shortage linking against quota.
    for (&(staff, building), &sv) in &shortage {
        let target = distribution.get(&staff).map(|d| d.eco(building)).unwrap_or(0);
        let mut assigned = Expression::from(0.0);
        for (&(s, b, _), &v) in &e {
            if s == staff && b == building {
                assigned = assigned + v;
            }
        }
        problem = problem.with(constraint!(sv + assigned >= target as f64));
    }

    // Balance linking: total rooms per staff (fixed pre-eco total + newly
    // placed eco) bounded between `min_total` and `max_total`.
    for &staff in staff_order {
        let fixed = assignments[&staff].total_rooms() as f64;
        let mut total = Expression::from(fixed);
        for (&(s, _, _), &v) in &e {
            if s == staff {
                total = total + v;
            }
        }
        problem = problem.with(constraint!(max_total >= total.clone()));
        problem = problem.with(constraint!(min_total <= total));
    }

    let solution = match problem.solve() {
        Ok(s) => s,
        Err(_err) => {
            #[cfg(feature = "trace")]
            tracing::warn!(target: "eco", error = %_err, "eco solver MILP failed, falling back to greedy");
            return None;
        }
    };

    let mut placement = BTreeMap::new();
    for (&key, &v) in &e {
        let val = solution.value(v).round();
        if val > 0.5 {
            placement.insert(key, val as u32);
        }
    }
    Some(placement)
}

/// Deterministic greedy fallback: each floor's eco rooms are handed out one
/// at a time to whichever eligible staff has the largest outstanding eco
/// shortage. A staff member already present on the floor (via bath, twin,
/// or single rooms) may always take eco there. Opening a *new* floor for
/// eco consumes one unit of that staff's remaining floor-cap budget; once
/// the budget is exhausted, a new floor is only eligible if it is adjacent
/// (`|Δ| <= 1`) to a floor the staff already covers in the same building,
/// unless the staff is a contractor (effectively unlimited cap) or a bath
/// cleaner (never opens a new floor at all).
#[allow(clippy::too_many_arguments)]
fn solve_eco_fallback(
    building_data: &BuildingData,
    pools: &mut FloorPools,
    assignments: &mut BTreeMap<StaffId, StaffAssignment>,
    staff_order: &[StaffId],
    distribution: &BTreeMap<StaffId, StaffDistribution>,
    constraints: &BTreeMap<StaffId, StaffConstraints>,
    fallback_timeout: Duration,
) -> u32 {
    let started = std::time::Instant::now();
    let mut placed_total = 0;
    let mut timed_out = false;

    let mut floor_budget_used: BTreeMap<StaffId, u32> = staff_order
        .iter()
        .map(|&s| {
            let used = assignments
                .get(&s)
                .map(|a| a.floor_count() as u32)
                .unwrap_or(0);
            (s, used)
        })
        .collect();

    'buildings: for building in [Building::Main, Building::Annex] {
        for floor in building_data.floors(building) {
            loop {
                if started.elapsed() >= fallback_timeout {
                    timed_out = true;
                    break 'buildings;
                }

                let Some(pool) = pools.get(building, floor.floor_number) else {
                    break;
                };
                if pool.eco_remaining() == 0 {
                    break;
                }

                let Some((staff, opens_new_floor)) = pick_eco_candidate(
                    assignments,
                    staff_order,
                    distribution,
                    constraints,
                    &floor_budget_used,
                    building,
                    floor.floor_number,
                ) else {
                    break;
                };

                let pool = pools.get_mut(building, floor.floor_number).unwrap();
                let taken = pool.allocate_eco(1);
                if taken == 0 {
                    break;
                }

                assignments
                    .get_mut(&staff)
                    .unwrap()
                    .assignments_mut(building)
                    .entry(floor.floor_number)
                    .or_default()
                    .add_eco(taken);
                if opens_new_floor {
                    *floor_budget_used.entry(staff).or_insert(0) += 1;
                }
                placed_total += taken;
            }
        }
    }

    #[cfg(feature = "trace")]
    if timed_out {
        tracing::warn!(target: "eco", placed = placed_total as u64, "eco solver (fallback) hit fallback_timeout, remainder left as shortage");
    } else {
        tracing::info!(target: "eco", placed = placed_total as u64, "eco solver (fallback) complete");
    }
    #[cfg(not(feature = "trace"))]
    let _ = timed_out;

    placed_total
}

/// Picks the eligible staff with the largest outstanding eco shortage for
/// one floor. Returns the staff id and whether taking this room opens a new
/// floor for them (for floor-budget bookkeeping).
fn pick_eco_candidate(
    assignments: &BTreeMap<StaffId, StaffAssignment>,
    staff_order: &[StaffId],
    distribution: &BTreeMap<StaffId, StaffDistribution>,
    constraints: &BTreeMap<StaffId, StaffConstraints>,
    floor_budget_used: &BTreeMap<StaffId, u32>,
    building: Building,
    floor_number: i32,
) -> Option<(StaffId, bool)> {
    let mut best: Option<(i64, usize, StaffId, bool)> = None;

    for (order_index, &staff) in staff_order.iter().enumerate() {
        let Some(assignment) = assignments.get(&staff) else {
            continue;
        };
        let already_present = assignment.is_present(building, floor_number);

        let opens_new_floor = if already_present {
            false
        } else {
            let cons = constraints.get(&staff).copied().unwrap_or_default();
            if cons.is_bath_cleaner() {
                continue; // bath cleaners never open a new floor, even for eco
            }

            let cap = max_floors(&cons);
            let used = floor_budget_used.get(&staff).copied().unwrap_or(0);
            if used < cap {
                true
            } else if cons.is_contractor() {
                true // effectively unlimited cap; already covered by `used < cap` in practice
            } else if is_adjacent_to_existing(assignment, building, floor_number) {
                false // rides on an adjacent floor's budget, doesn't open a new one
            } else {
                continue;
            }
        };

        let target = distribution.get(&staff).map(|d| d.eco(building)).unwrap_or(0) as i64;
        let assigned: i64 = assignment
            .assignments(building)
            .values()
            .map(|a| a.eco_rooms as i64)
            .sum();
        let shortage = target - assigned;
        if shortage <= 0 {
            continue;
        }

        match &best {
            None => best = Some((shortage, order_index, staff, opens_new_floor)),
            Some((best_shortage, _, _, _)) if shortage > *best_shortage => {
                best = Some((shortage, order_index, staff, opens_new_floor));
            }
            _ => {}
        }
    }

    best.map(|(_, _, staff, opens_new_floor)| (staff, opens_new_floor))
}

/// True if `floor_number` is within 1 of some floor the staff already
/// covers in `building`.
fn is_adjacent_to_existing(assignment: &StaffAssignment, building: Building, floor_number: i32) -> bool {
    assignment
        .assignments(building)
        .keys()
        .any(|&f| (f - floor_number).abs() <= 1)
}
