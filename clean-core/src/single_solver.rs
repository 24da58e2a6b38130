//! Single-room solver: per-staff singles as an integer program.
//!
//! Floors with outstanding single-like supply are exhausted by a small MILP
//! built fresh per call (`good_lp`, `highs` backend): an integer
//! `x[staff,building,floor,code]` per eligible staff/floor/code, a binary
//! `y[staff,building,floor]` indicating a newly opened floor, and a slack
//! variable per floor/code absorbing any supply the hard per-staff floor
//! caps or the max-staff-per-floor cap cannot place. Slack is penalized
//! heavily in the objective so the model stays feasible even when a hard
//! cap conflicts with fully exhausting a floor, rather than the whole
//! solve failing outright. A per-staff/per-building `shortage` variable is
//! linked to `target - sum(x)` and minimized alongside slack, so the
//! solver actually prefers handing rooms to the staff who still needs them
//! over exhausting a floor onto whoever happens to be eligible. A hard
//! constraint also requires any staff with a nonzero eco quota in a
//! building to end up present on at least one eco-bearing floor there,
//! when a candidate floor for that exists.
//!
//! Up to `enumeration_cap` distinct candidates are produced by re-solving
//! with a no-good cut added against each previously found floor-opening
//! pattern, stopping once a cut makes the model worse than the first
//! (optimal) solve.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use good_lp::solvers::highs::highs;
use good_lp::{constraint, variable, Expression, ProblemVariables, Solution, SolverModel, Variable};

use crate::allocation::{PartialSolutionResult, StaffAssignment};
use crate::building::BuildingData;
use crate::floor_pool::FloorPools;
use crate::staff::{BathCleaningType, BuildingAssignment, StaffConstraints, StaffDistribution};
use crate::types::{Building, RoomType, RoomTypeSet, StaffId};

/// Weight on the exhaustion slack in the objective: must dominate any
/// realistic shortage total so the solver only leaves a floor short of
/// full exhaustion when no staff can legally take the remainder.
const UNASSIGNED_PENALTY_WEIGHT: f64 = 1000.0;

type Placement = BTreeMap<(StaffId, Building, i32, RoomType), u32>;
type Signature = BTreeSet<(StaffId, Building, i32)>;

struct StaffCtx {
    building_assignment: BuildingAssignment,
    single_target: BTreeMap<Building, u32>,
    eco_target: BTreeMap<Building, u32>,
    max_floors_per_building: BTreeMap<Building, u32>,
}

/// Runs the MILP base solve plus up to `enumeration_cap` additional
/// no-good-cut re-solves, returning each as one [`PartialSolutionResult`].
/// The first element is always the unconstrained optimum.
#[allow(clippy::too_many_arguments)]
pub fn solve_singles(
    building_data: &BuildingData,
    pools: &mut FloorPools,
    staff_order: &[StaffId],
    twin_stage: &BTreeMap<StaffId, StaffAssignment>,
    constraints: &BTreeMap<StaffId, StaffConstraints>,
    distribution: &BTreeMap<StaffId, StaffDistribution>,
    max_staff_per_floor: u32,
    room_types: &RoomTypeSet,
    enumeration_cap: usize,
    timeout: Duration,
) -> Vec<PartialSolutionResult> {
    let ctx = build_ctx(staff_order, constraints, distribution);

    let mut assignments = twin_stage.clone();
    for &staff in staff_order {
        assignments
            .entry(staff)
            .or_insert_with(|| StaffAssignment::new(staff, BathCleaningType::None));
    }

    if staff_order.is_empty() {
        return vec![snapshot(&assignments, &ctx, room_types)];
    }

    // Fix physical supply up front: drain every eligible floor's
    // single-like rooms from the pool once, used identically across every
    // enumeration iteration below. Floors with zero building-eligible staff
    // are left untouched, surfacing naturally as unassigned later.
    let mut floor_supply: BTreeMap<(Building, i32), BTreeMap<RoomType, u32>> = BTreeMap::new();
    for building in [Building::Main, Building::Annex] {
        let has_eligible_staff = ctx.values().any(|c| c.building_assignment.allows(building));
        if !has_eligible_staff {
            continue;
        }
        for floor in building_data.floors(building) {
            let Some(pool) = pools.get_mut(building, floor.floor_number) else {
                continue;
            };
            let total: u32 = pool
                .normal_remaining()
                .iter()
                .filter(|(c, _)| room_types.is_single_like(c))
                .map(|(_, &n)| n)
                .sum();
            if total == 0 {
                continue;
            }
            let taken = pool.allocate_normal_matching(total, |c| room_types.is_single_like(c));
            if !taken.is_empty() {
                floor_supply.insert((building, floor.floor_number), taken);
            }
        }
    }

    if floor_supply.is_empty() {
        return vec![snapshot(&assignments, &ctx, room_types)];
    }

    let twin_floor_budget_used: BTreeMap<(StaffId, Building), u32> = assignments
        .iter()
        .flat_map(|(&staff, a)| {
            [Building::Main, Building::Annex].map(|b| ((staff, b), a.floor_count_in(b) as u32))
        })
        .collect();

    let eco_bearing_floors: BTreeSet<(Building, i32)> = [Building::Main, Building::Annex]
        .into_iter()
        .flat_map(|b| building_data.floors(b).iter().map(move |f| (b, f.floor_number)))
        .filter(|&(b, f)| pools.get(b, f).is_some_and(|p| p.eco_remaining() > 0))
        .collect();

    let mut results = Vec::new();
    let mut found_signatures: Vec<Signature> = Vec::new();
    let mut base_shortage: Option<u32> = None;

    while results.len() < enumeration_cap.max(1) {
        let Some((placement, signature)) = solve_once(
            &ctx,
            &assignments,
            &floor_supply,
            &twin_floor_budget_used,
            &eco_bearing_floors,
            max_staff_per_floor,
            &found_signatures,
            timeout,
        ) else {
            break;
        };

        let mut candidate_assignments = assignments.clone();
        for ((staff, building, floor, code), count) in &placement {
            if *count == 0 {
                continue;
            }
            candidate_assignments
                .get_mut(staff)
                .unwrap()
                .assignments_mut(*building)
                .entry(*floor)
                .or_default()
                .add(code.clone(), *count);
        }

        let snap = snapshot(&candidate_assignments, &ctx, room_types);
        let shortage = snap.shortage();
        match base_shortage {
            None => base_shortage = Some(shortage),
            Some(base) if shortage > base => break,
            Some(_) => {}
        }

        results.push(snap);
        found_signatures.push(signature);
    }

    if results.is_empty() {
        results.push(snapshot(&assignments, &ctx, room_types));
    }

    results
}

fn build_ctx(
    staff_order: &[StaffId],
    constraints: &BTreeMap<StaffId, StaffConstraints>,
    distribution: &BTreeMap<StaffId, StaffDistribution>,
) -> BTreeMap<StaffId, StaffCtx> {
    staff_order
        .iter()
        .map(|&staff| {
            let cons = constraints.get(&staff).copied().unwrap_or_default();
            let dist = distribution.get(&staff).copied().unwrap_or_default();

            let mut single_target = BTreeMap::new();
            single_target.insert(Building::Main, dist.main_single);
            single_target.insert(Building::Annex, dist.annex_single);

            let mut eco_target = BTreeMap::new();
            eco_target.insert(Building::Main, dist.main_eco);
            eco_target.insert(Building::Annex, dist.annex_eco);

            let cap = crate::staff::max_floors_per_building(&cons, &dist);
            let mut max_floors_per_building = BTreeMap::new();
            max_floors_per_building.insert(Building::Main, cap);
            max_floors_per_building.insert(Building::Annex, cap);

            (
                staff,
                StaffCtx {
                    building_assignment: cons.building_assignment,
                    single_target,
                    eco_target,
                    max_floors_per_building,
                },
            )
        })
        .collect()
}

/// Builds and solves one MILP instance, forbidding every signature in
/// `banned_signatures` via a no-good cut. Returns `None` on solver failure
/// (should only happen if `highs` itself errors, since slack keeps the
/// model feasible by construction).
#[allow(clippy::too_many_arguments)]
fn solve_once(
    ctx: &BTreeMap<StaffId, StaffCtx>,
    assignments: &BTreeMap<StaffId, StaffAssignment>,
    floor_supply: &BTreeMap<(Building, i32), BTreeMap<RoomType, u32>>,
    twin_floor_budget_used: &BTreeMap<(StaffId, Building), u32>,
    eco_bearing_floors: &BTreeSet<(Building, i32)>,
    max_staff_per_floor: u32,
    banned_signatures: &[Signature],
    timeout: Duration,
) -> Option<(Placement, Signature)> {
    let mut vars = ProblemVariables::new();

    let mut x: BTreeMap<(StaffId, Building, i32, RoomType), Variable> = BTreeMap::new();
    let mut slack: BTreeMap<(Building, i32, RoomType), Variable> = BTreeMap::new();
    let mut has_candidate: BTreeSet<(StaffId, Building, i32)> = BTreeSet::new();

    for (&(building, floor), codes) in floor_supply {
        for (code, &count) in codes {
            if count == 0 {
                continue;
            }
            for (&staff, sctx) in ctx {
                if !sctx.building_assignment.allows(building) {
                    continue;
                }
                let v = vars.add(variable().integer().min(0.0).max(count as f64));
                x.insert((staff, building, floor, code.clone()), v);
                has_candidate.insert((staff, building, floor));
            }
            let s = vars.add(variable().integer().min(0.0).max(count as f64));
            slack.insert((building, floor, code.clone()), s);
        }
    }

    let mut y: BTreeMap<(StaffId, Building, i32), Variable> = BTreeMap::new();
    for &(staff, building, floor) in &has_candidate {
        if !assignments[&staff].is_present(building, floor) {
            let v = vars.add(variable().binary());
            y.insert((staff, building, floor), v);
        }
    }

    let mut shortage: BTreeMap<(StaffId, Building), Variable> = BTreeMap::new();
    for (&staff, sctx) in ctx {
        for building in [Building::Main, Building::Annex] {
            let target = sctx.single_target[&building];
            if target > 0 {
                let v = vars.add(variable().integer().min(0.0).max(target as f64));
                shortage.insert((staff, building), v);
            }
        }
    }

    let mut objective = Expression::from(0.0);
    for &v in slack.values() {
        objective = objective + UNASSIGNED_PENALTY_WEIGHT * v;
    }
    for &v in shortage.values() {
        objective = objective + v;
    }

    let mut problem = vars
        .minimise(objective)
        .using(highs)
        .set_time_limit(timeout.as_secs_f64());

    // 1. Exhaustion-with-slack: every unit of real supply is either
    //    assigned or explicitly left as penalized slack.
    for (&(building, floor), codes) in floor_supply {
        for (code, &count) in codes {
            if count == 0 {
                continue;
            }
            let mut sum = Expression::from(0.0);
            for (&staff, _) in ctx {
                if let Some(&v) = x.get(&(staff, building, floor, code.clone())) {
                    sum = sum + v;
                }
            }
            let s = slack[&(building, floor, code.clone())];
            problem = problem.with((sum + s).eq(count as f64));
        }
    }

    // 2. y/x linking: a staff can only draw on a floor they don't already
    //    hold if `y` for that (staff, building, floor) is set.
    for (&(staff, building, floor), &yv) in &y {
        let codes_here = &floor_supply[&(building, floor)];
        let total_supply: u32 = codes_here.values().sum();
        let mut sum = Expression::from(0.0);
        for code in codes_here.keys() {
            if let Some(&v) = x.get(&(staff, building, floor, code.clone())) {
                sum = sum + v;
            }
        }
        problem = problem.with(constraint!(yv <= sum.clone()));
        problem = problem.with(constraint!(sum <= total_supply as f64 * yv));
    }

    // 3. Shortage linking: shortage[staff,building] >= target - assigned,
    //    the `max(0, target - sum(x))` the objective is meant to minimize.
    //    The variable's own lower bound of 0 covers the other half of the max.
    for (&(staff, building), &sv) in &shortage {
        let target = ctx[&staff].single_target[&building];
        let mut assigned = Expression::from(0.0);
        for (&(s, b, _, _), &v) in &x {
            if s == staff && b == building {
                assigned = assigned + v;
            }
        }
        problem = problem.with(constraint!(sv + assigned >= target as f64));
    }

    // 4. Residual per-staff/per-building floor cap, net of floors already
    //    used by the twin stage. Hard; never softened.
    for (&staff, sctx) in ctx {
        for building in [Building::Main, Building::Annex] {
            if !sctx.building_assignment.allows(building) {
                continue;
            }
            let cap = sctx.max_floors_per_building[&building];
            let used = twin_floor_budget_used.get(&(staff, building)).copied().unwrap_or(0);
            let budget = cap.saturating_sub(used);
            let mut sum = Expression::from(0.0);
            for (&(s, b, _), &yv) in &y {
                if s == staff && b == building {
                    sum = sum + yv;
                }
            }
            problem = problem.with(constraint!(sum <= budget as f64));
        }
    }

    // 5. Max staff per floor: pre-existing (twin) presence plus newly
    //    opened presence may not exceed the cap.
    for &(building, floor) in floor_supply.keys() {
        let existing_presence = ctx
            .keys()
            .filter(|&&s| assignments[&s].is_present(building, floor))
            .count() as u32;
        let mut sum = Expression::from(0.0);
        for (&(_, b, f), &yv) in &y {
            if b == building && f == floor {
                sum = sum + yv;
            }
        }
        problem = problem.with(constraint!(existing_presence as f64 + sum <= max_staff_per_floor as f64));
    }

    // 6. Eco-floor participation: a staff with a nonzero eco quota in a
    //    building must end up present on at least one eco-bearing floor
    //    there, if a candidate floor exists for them. Skipped gracefully
    //    when no candidate exists at all (e.g. a purely-eco floor with no
    //    single-like supply to draw them there).
    for (&staff, sctx) in ctx {
        for building in [Building::Main, Building::Annex] {
            if sctx.eco_target[&building] == 0 {
                continue;
            }
            let already_on_eco_floor = eco_bearing_floors
                .iter()
                .any(|&(b, f)| b == building && assignments[&staff].is_present(b, f));
            if already_on_eco_floor {
                continue;
            }
            let mut sum = Expression::from(0.0);
            let mut any = false;
            for &(b, f) in eco_bearing_floors {
                if b != building {
                    continue;
                }
                if let Some(&yv) = y.get(&(staff, b, f)) {
                    sum = sum + yv;
                    any = true;
                }
            }
            if any {
                problem = problem.with(constraint!(sum >= 1));
            }
        }
    }

    // 7. No-good cuts: forbid repeating a previously-found floor-opening
    //    pattern exactly.
    for banned in banned_signatures {
        let mut sum_out = Expression::from(0.0);
        let mut sum_in = Expression::from(0.0);
        for (&key, &yv) in &y {
            if banned.contains(&key) {
                sum_in = sum_in + yv;
            } else {
                sum_out = sum_out + yv;
            }
        }
        let rhs = 1.0 - banned.len() as f64;
        problem = problem.with(constraint!(sum_out - sum_in >= rhs));
    }

    let solution = match problem.solve() {
        Ok(s) => s,
        Err(_err) => {
            #[cfg(feature = "trace")]
            tracing::warn!(target: "single", error = %_err, "single solver MILP failed");
            return None;
        }
    };

    let mut placement = Placement::new();
    for (key, &v) in &x {
        let val = solution.value(v).round();
        if val > 0.5 {
            placement.insert(key.clone(), val as u32);
        }
    }

    let mut signature = Signature::new();
    for (&key, &v) in &y {
        if solution.value(v) > 0.5 {
            signature.insert(key);
        }
    }

    Some((placement, signature))
}

/// Shortage against `sctx`'s single-room targets only: twin and eco rooms
/// the same staff holds on a floor don't count toward filling a single
/// quota, even though they live in the same `room_counts` map.
fn staff_shortage(assignment: &StaffAssignment, sctx: &StaffCtx, room_types: &RoomTypeSet) -> u32 {
    [Building::Main, Building::Annex]
        .iter()
        .map(|&building| {
            let assigned = assignment
                .assignments(building)
                .values()
                .map(|a| {
                    a.room_counts
                        .iter()
                        .filter(|(c, _)| room_types.is_single_like(c))
                        .map(|(_, &n)| n)
                        .sum::<u32>()
                })
                .sum::<u32>();
            sctx.single_target[&building].saturating_sub(assigned)
        })
        .sum()
}

fn per_staff_shortage(
    assignments: &BTreeMap<StaffId, StaffAssignment>,
    ctx: &BTreeMap<StaffId, StaffCtx>,
    room_types: &RoomTypeSet,
) -> BTreeMap<StaffId, u32> {
    ctx.iter()
        .map(|(&staff, sctx)| (staff, staff_shortage(&assignments[&staff], sctx, room_types)))
        .collect()
}

fn snapshot(
    assignments: &BTreeMap<StaffId, StaffAssignment>,
    ctx: &BTreeMap<StaffId, StaffCtx>,
    room_types: &RoomTypeSet,
) -> PartialSolutionResult {
    let total_target: u32 = ctx.values().map(|c| c.single_target.values().sum::<u32>()).sum();
    let per_staff_shortage = per_staff_shortage(assignments, ctx, room_types);
    let shortage: u32 = per_staff_shortage.values().sum();
    let total_assigned = total_target.saturating_sub(shortage);

    PartialSolutionResult {
        assignments: assignments.values().cloned().collect(),
        total_assigned,
        total_target,
        per_staff_shortage,
    }
}
