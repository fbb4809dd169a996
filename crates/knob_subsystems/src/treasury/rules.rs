//! The treasury tick pipeline.

use knob_sim::rules::{clamp_unit, composite, smooth_toward};
use knob_sim::{FnRule, Pipeline, RuleError, Severity, TickContext};

use super::knobs::{DEFENSE_FUNDING_PRIORITY, RESERVE_TARGET, SPENDING_DISCIPLINE, TAX_EFFICIENCY};
use super::state::{BASE_REVENUE, TreasuryState, TreasurySignals};

type Ctx<'a> = TickContext<'a, TreasurySignals>;

/// Fraction of the gap to the defense target closed per tick.
const OUTLAY_RATE: f64 = 0.3;
/// Defense outlay never exceeds this share of revenue.
const DEFENSE_CAP: f64 = 0.5;
/// Ticks per fiscal year.
const TICKS_PER_YEAR: f64 = 12.0;

/// The ordered treasury pipeline.
#[must_use]
pub fn pipeline() -> Pipeline<TreasuryState, TreasurySignals> {
    Pipeline::new()
        .rule(FnRule::new("revenue", collect_revenue))
        .rule(FnRule::new("defense_outlay", fund_defense))
        .rule(FnRule::new("reserves", accumulate_reserves))
        .rule(FnRule::new("fiscal_stress", assess_stress))
}

/// Writes `revenue_index`, `revenue`, `civil_spending` and `last_update_ms`.
pub fn collect_revenue(state: &mut TreasuryState, ctx: &Ctx<'_>) -> Result<(), RuleError> {
    let tax = ctx.knob(TAX_EFFICIENCY, 0.6);
    let discipline = ctx.knob(SPENDING_DISCIPLINE, 0.5);

    state.revenue_index = clamp_unit(composite(&[(tax, 0.7), (discipline, 0.3)]));
    state.revenue = BASE_REVENUE * (0.5 + state.revenue_index * 0.5);
    state.civil_spending = state.revenue * (0.85 - discipline * 0.3);
    state.last_update_ms = ctx.now_ms;
    Ok(())
}

/// Writes `defense_demand`, `defense_outlay` and `funding_availability`.
pub fn fund_defense(state: &mut TreasuryState, ctx: &Ctx<'_>) -> Result<(), RuleError> {
    if let Some(demand) = &ctx.signals.defense_demand {
        if !demand.budget_request.is_finite() {
            return Err(RuleError::new("defense demand is not a finite amount"));
        }
        state.defense_demand = demand.budget_request.max(0.0);
    }

    let priority = ctx.knob(DEFENSE_FUNDING_PRIORITY, 0.5);
    let target = (state.defense_demand * clamp_unit(0.5 + priority)).min(state.revenue * DEFENSE_CAP);
    state.defense_outlay = smooth_toward(state.defense_outlay, target, OUTLAY_RATE).max(0.0);
    state.funding_availability = if state.defense_demand > 0.0 {
        clamp_unit(state.defense_outlay / state.defense_demand)
    } else {
        1.0
    };
    Ok(())
}

/// Writes `reserves`. Reserves never go negative.
pub fn accumulate_reserves(state: &mut TreasuryState, _ctx: &Ctx<'_>) -> Result<(), RuleError> {
    state.reserves = (state.reserves + state.balance() / TICKS_PER_YEAR).max(0.0);
    Ok(())
}

/// Writes `stress_level` and `fiscal_stress`.
pub fn assess_stress(state: &mut TreasuryState, ctx: &Ctx<'_>) -> Result<(), RuleError> {
    let target = ctx.knob(RESERVE_TARGET, 0.2);
    let revenue = state.revenue.max(1.0);

    let outlay_ratio = clamp_unit(state.defense_outlay / revenue);
    let reserve_cover = if target > 0.0 {
        clamp_unit(state.reserve_ratio() / target)
    } else {
        1.0
    };
    let deficit = clamp_unit(-state.balance() / revenue);

    state.stress_level = clamp_unit(composite(&[
        (outlay_ratio, 0.4),
        (1.0 - reserve_cover, 0.4),
        (deficit, 0.2),
    ]));
    state.fiscal_stress = Severity::from_level(state.stress_level);
    Ok(())
}
