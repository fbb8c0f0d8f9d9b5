use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace};

use crate::models::ship::Ship;
use crate::scheduler::{DeferredAction, TickScheduler};
use crate::world::ShipView;

/// 交戦様式
///
/// Ranged は射撃戦、Melee は全砲塔喪失後の体当たり戦を表します。
/// Ranged → Melee は一方向で、以後復帰しません。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BattleMode {
    /// 射撃戦（砲塔が残存）
    Ranged,
    /// 近接戦（全砲塔喪失後）
    Melee,
}

/// 移動様式
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MovementMode {
    /// 追跡（距離を詰める）
    Chasing,
    /// 離脱（距離を開ける）
    Avoiding,
}

/// 艦の戦術状態
///
/// 交戦様式と移動様式のペア（態勢）、最終遷移時刻、保留中の遅延遷移の
/// 有無を保持します。保留中の遷移は常に高々1つで、保留中の再トリガーは
/// 無視されます。
#[derive(Debug, Clone)]
pub struct TacticState {
    pub battle_mode: BattleMode,
    pub movement_mode: MovementMode,
    /// 最後に移動様式が切り替わった時刻（シミュレーション秒）
    pub last_transition_time: f64,
    /// 遅延遷移が予約済みかどうか（二重予約の抑止）
    pub transition_pending: bool,
}

impl TacticState {
    pub fn new() -> Self {
        Self {
            battle_mode: BattleMode::Ranged,
            movement_mode: MovementMode::Chasing,
            last_transition_time: 0.0,
            transition_pending: false,
        }
    }
}

impl Default for TacticState {
    fn default() -> Self {
        Self::new()
    }
}

/// 戦術状態機械の毎ティック更新
///
/// 目標との距離と現在の態勢に応じて、即時遷移の実行と遅延遷移の予約を
/// 行います。処理順序は操舵合成より先で、合成器は更新後の態勢を参照します。
///
/// - Melee+Chasing: 距離がミス距離（双方の衝突半径の和）を下回ったら
///   即座に Avoiding へ移り、復帰遷移を予約します。
/// - Melee+Avoiding: 予約済みの復帰、距離が追跡範囲の2/3超、滞在4秒超の
///   いずれか最初に成立した条件で Chasing へ戻ります。
/// - Ranged: 目標が存在する間、抽選した滞在時間で Chasing と Avoiding を
///   交互に往復します。
///
/// いずれの予約も `transition_pending` が立っている間は行いません。
pub fn update_tactics(
    ship: &mut Ship,
    target: Option<&ShipView>,
    now: f64,
    scheduler: &mut TickScheduler,
    rng: &mut ChaCha8Rng,
) {
    let Some(target) = target else {
        return; // 目標なし：態勢は維持、予約もしない
    };

    let distance = ship.position.distance(&target.position);

    match ship.tactics.battle_mode {
        BattleMode::Melee => match ship.tactics.movement_mode {
            MovementMode::Chasing => {
                let miss_range = ship.radius + target.radius;
                if distance < miss_range && !ship.tactics.transition_pending {
                    // すれ違い完了：即時離脱し、復帰を予約する
                    execute_posture_shift(ship, MovementMode::Avoiding, now);
                    scheduler.schedule(
                        now + ship.params.melee_recover_delay_s,
                        DeferredAction::PostureShift {
                            ship_id: ship.id.clone(),
                            to: MovementMode::Chasing,
                        },
                    );
                    ship.tactics.transition_pending = true;
                }
            }
            MovementMode::Avoiding => {
                let dwell = now - ship.tactics.last_transition_time;
                let far_enough = distance > ship.params.chase_range_m * (2.0 / 3.0);
                let stalled = dwell > ship.params.melee_max_avoid_dwell_s;
                if far_enough || stalled {
                    // 距離条件または滞在上限での早期復帰：保留中の復帰予約は破棄
                    scheduler.cancel_posture_shift(&ship.id);
                    ship.tactics.transition_pending = false;
                    execute_posture_shift(ship, MovementMode::Chasing, now);
                }
            }
        },
        BattleMode::Ranged => {
            if !ship.tactics.transition_pending {
                let (to, dwell) = match ship.tactics.movement_mode {
                    MovementMode::Chasing => (
                        MovementMode::Avoiding,
                        rng.gen_range(ship.params.chase_dwell_min_s..=ship.params.chase_dwell_max_s),
                    ),
                    MovementMode::Avoiding => (
                        MovementMode::Chasing,
                        rng.gen_range(ship.params.avoid_dwell_min_s..=ship.params.avoid_dwell_max_s),
                    ),
                };
                scheduler.schedule(
                    now + dwell,
                    DeferredAction::PostureShift {
                        ship_id: ship.id.clone(),
                        to,
                    },
                );
                ship.tactics.transition_pending = true;
                trace!(
                    ship_id = %ship.id,
                    to = ?to,
                    dwell_s = dwell,
                    "TACTIC_SHIFT_SCHEDULED: 射撃戦態勢の交代を予約しました"
                );
            }
        }
    }
}

/// 移動様式遷移の実行
///
/// 即時遷移および予約済み遷移の発火の双方から呼ばれます。
/// `transition_pending` のクリアは発火経路（スケジューラ側）の責務です。
pub fn execute_posture_shift(ship: &mut Ship, to: MovementMode, now: f64) {
    let previous = ship.tactics.movement_mode;
    if previous == to {
        return;
    }
    ship.tactics.movement_mode = to;
    ship.tactics.last_transition_time = now;

    debug!(
        ship_id = %ship.id,
        battle_mode = ?ship.tactics.battle_mode,
        previous_mode = ?previous,
        current_mode = ?to,
        time = now,
        "SHIP_MODE_TRANSITION: 艦の移動様式が切り替わりました"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::common::{Team, Vec2};
    use crate::models::ship::{Ship, ShipAiParams};
    use rand::SeedableRng;

    fn test_ship(id: &str) -> Ship {
        Ship::new(
            id.to_string(),
            Team::Blue,
            Vec2::ZERO,
            0.0,
            12.0,
            40.0,
            ShipAiParams::default(),
            Vec::new(),
        )
    }

    fn enemy_view(x: f64, y: f64) -> ShipView {
        ShipView {
            id: "R01".to_string(),
            team: Team::Red,
            position: Vec2::new(x, y),
            velocity: Vec2::ZERO,
            radius: 12.0,
        }
    }

    #[test]
    fn test_ranged_schedules_single_pending_transition() {
        let mut ship = test_ship("B01");
        let mut scheduler = TickScheduler::new();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let target = enemy_view(300.0, 0.0);

        update_tactics(&mut ship, Some(&target), 0.0, &mut scheduler, &mut rng);
        assert!(ship.tactics.transition_pending);
        assert_eq!(scheduler.pending_count(), 1);

        // 保留中の再トリガーは無視される
        update_tactics(&mut ship, Some(&target), 0.1, &mut scheduler, &mut rng);
        update_tactics(&mut ship, Some(&target), 0.2, &mut scheduler, &mut rng);
        assert_eq!(scheduler.pending_count(), 1);
    }

    #[test]
    fn test_no_target_schedules_nothing() {
        let mut ship = test_ship("B01");
        let mut scheduler = TickScheduler::new();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        update_tactics(&mut ship, None, 0.0, &mut scheduler, &mut rng);
        assert!(!ship.tactics.transition_pending);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn test_melee_close_pass_switches_to_avoiding() {
        let mut ship = test_ship("B01");
        ship.tactics.battle_mode = BattleMode::Melee;
        let mut scheduler = TickScheduler::new();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        // ミス距離 24m 未満まで接近
        let target = enemy_view(20.0, 0.0);

        update_tactics(&mut ship, Some(&target), 10.0, &mut scheduler, &mut rng);
        assert_eq!(ship.tactics.movement_mode, MovementMode::Avoiding);
        assert!(ship.tactics.transition_pending);
        assert_eq!(scheduler.pending_count(), 1);

        // 復帰予約は recover_delay 後に発火する
        let due = scheduler.pop_due(10.0 + ship.params.melee_recover_delay_s);
        assert_eq!(due.len(), 1);
    }

    #[test]
    fn test_melee_avoiding_exits_on_distance() {
        let mut ship = test_ship("B01");
        ship.tactics.battle_mode = BattleMode::Melee;
        ship.tactics.movement_mode = MovementMode::Avoiding;
        ship.tactics.transition_pending = true;
        ship.tactics.last_transition_time = 10.0;
        let mut scheduler = TickScheduler::new();
        scheduler.schedule(
            10.3,
            DeferredAction::PostureShift {
                ship_id: "B01".to_string(),
                to: MovementMode::Chasing,
            },
        );
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        // 追跡範囲の2/3を超えた距離
        let far = ship.params.chase_range_m * 0.8;
        let target = enemy_view(far, 0.0);
        update_tactics(&mut ship, Some(&target), 10.1, &mut scheduler, &mut rng);

        assert_eq!(ship.tactics.movement_mode, MovementMode::Chasing);
        assert!(!ship.tactics.transition_pending);
        // 保留中だった復帰予約は破棄済み
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn test_melee_avoiding_exits_on_max_dwell() {
        let mut ship = test_ship("B01");
        ship.tactics.battle_mode = BattleMode::Melee;
        ship.tactics.movement_mode = MovementMode::Avoiding;
        ship.tactics.last_transition_time = 10.0;
        let mut scheduler = TickScheduler::new();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        // 近距離のまま滞在上限4秒を超過
        let target = enemy_view(30.0, 0.0);
        let after_dwell = 10.0 + ship.params.melee_max_avoid_dwell_s + 0.1;
        update_tactics(&mut ship, Some(&target), after_dwell, &mut scheduler, &mut rng);

        assert_eq!(ship.tactics.movement_mode, MovementMode::Chasing);
    }
}
