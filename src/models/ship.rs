use tracing::{info, warn};

use crate::models::common::{AgentStatus, Team, Vec2};
use crate::models::steering::WanderState;
use crate::models::tactics::{BattleMode, TacticState};
use crate::models::traits::{IAgent, IMovable, ITeamable};
use crate::models::turret::Turret;

/// 艦のAI調整パラメータ
///
/// 範囲の不変条件 `chase_range > avoid_range` と `chase_range > attack_range`
/// は構築時に自動補正されます（実行時エラーにはしません）。
#[derive(Debug, Clone)]
pub struct ShipAiParams {
    /// 追跡範囲（m）：これより遠い目標は追わない
    pub chase_range_m: f64,
    /// 回避範囲（m）：障害物・僚艦への反発が働く距離
    pub avoid_range_m: f64,
    /// 攻撃範囲（m）：射撃戦でこの距離を保とうとする
    pub attack_range_m: f64,
    /// 個体回避の重み（回避成分の基礎ゲインに加算）
    pub entity_avoidance: f64,
    /// 徘徊方位の再抽選間隔の下限・上限（秒）
    pub wander_period_min_s: f64,
    pub wander_period_max_s: f64,
    /// 徘徊方位の振れ幅（現在方位から±この角度、度）
    pub wander_angle_deg: f64,
    /// 随伴リーシュ距離（m）
    pub leash_distance_m: f64,
    /// 敵弾回避の反応時間上限（秒）
    pub projectile_react_time_s: f64,
    /// 近接戦：離脱から追跡への復帰遅延（秒）
    pub melee_recover_delay_s: f64,
    /// 近接戦：離脱の最大滞在時間（秒）
    pub melee_max_avoid_dwell_s: f64,
    /// 射撃戦：追跡滞在時間の抽選範囲（秒）
    pub chase_dwell_min_s: f64,
    pub chase_dwell_max_s: f64,
    /// 射撃戦：離脱滞在時間の抽選範囲（秒）
    pub avoid_dwell_min_s: f64,
    pub avoid_dwell_max_s: f64,
}

impl Default for ShipAiParams {
    fn default() -> Self {
        Self {
            chase_range_m: 900.0,
            avoid_range_m: 220.0,
            attack_range_m: 450.0,
            entity_avoidance: 0.35,
            wander_period_min_s: 2.0,
            wander_period_max_s: 6.0,
            wander_angle_deg: 60.0,
            leash_distance_m: 400.0,
            projectile_react_time_s: 1.5,
            melee_recover_delay_s: 0.3,
            melee_max_avoid_dwell_s: 4.0,
            chase_dwell_min_s: 3.0,
            chase_dwell_max_s: 7.0,
            avoid_dwell_min_s: 1.0,
            avoid_dwell_max_s: 3.0,
        }
    }
}

impl ShipAiParams {
    /// 範囲不変条件の自動補正
    ///
    /// `chase_range` が `avoid_range` または `attack_range` 以下の場合、
    /// 違反した境界の1.5倍まで引き上げて警告ログを出します。
    ///
    /// # 戻り値
    ///
    /// 補正が行われた場合はtrue
    pub fn auto_correct(&mut self, ship_id: &str) -> bool {
        let mut corrected = false;

        if self.chase_range_m <= self.avoid_range_m {
            let old = self.chase_range_m;
            self.chase_range_m = self.avoid_range_m * 1.5;
            warn!(
                ship_id = %ship_id,
                old_chase_range_m = old,
                avoid_range_m = self.avoid_range_m,
                new_chase_range_m = self.chase_range_m,
                "AI_PARAMS_CORRECTED: chase_rangeがavoid_range以下のため自動補正しました"
            );
            corrected = true;
        }

        if self.chase_range_m <= self.attack_range_m {
            let old = self.chase_range_m;
            self.chase_range_m = self.attack_range_m * 1.5;
            warn!(
                ship_id = %ship_id,
                old_chase_range_m = old,
                attack_range_m = self.attack_range_m,
                new_chase_range_m = self.chase_range_m,
                "AI_PARAMS_CORRECTED: chase_rangeがattack_range以下のため自動補正しました"
            );
            corrected = true;
        }

        corrected
    }
}

/// 艦エージェント
///
/// 自律戦闘AIを搭載した艦です。戦術状態・徘徊状態・砲塔群を排他的に
/// 所有し、毎ティックの判断結果を移動意図ベクトルとして外部ムーバーに
/// 公開します。
#[derive(Debug, Clone)]
pub struct Ship {
    pub id: String,
    pub team: Team,
    pub position: Vec2,
    pub velocity: Vec2,
    /// 艦首方位（度、世界座標）
    pub heading: f64,
    /// 衝突半径（m）
    pub radius: f64,
    /// 最大速力（m/s）
    pub max_speed: f64,
    /// 残存砲塔数
    pub gun_count: u32,
    pub status: AgentStatus,
    /// 随伴対象の艦ID（設定されていればリーシュ追従する）
    pub follow_target: Option<String>,
    /// 移動意図を世界座標系で出力するか（falseなら艦体座標系）
    pub use_global_force: bool,
    pub params: ShipAiParams,
    pub tactics: TacticState,
    pub wander: WanderState,
    pub turrets: Vec<Turret>,
    /// 最後に合成した移動意図ベクトル（外部ムーバーが消費）
    pub movement_intent: Vec2,
}

impl Ship {
    pub fn new(
        id: String,
        team: Team,
        position: Vec2,
        heading_deg: f64,
        radius: f64,
        max_speed: f64,
        mut params: ShipAiParams,
        turrets: Vec<Turret>,
    ) -> Self {
        params.auto_correct(&id);
        let gun_count = turrets.len() as u32;
        let battle_mode = if gun_count > 0 {
            BattleMode::Ranged
        } else {
            BattleMode::Melee
        };

        let mut tactics = TacticState::new();
        tactics.battle_mode = battle_mode;

        Self {
            id,
            team,
            position,
            velocity: Vec2::ZERO,
            heading: heading_deg,
            radius,
            max_speed,
            gun_count,
            status: AgentStatus::Active,
            follow_target: None,
            use_global_force: true,
            params,
            tactics,
            wander: WanderState::new(heading_deg),
            turrets,
            movement_intent: Vec2::ZERO,
        }
    }

    /// 合成済みの移動意図を設定（毎ティック1回、外部ムーバー向け）
    pub fn set_movement_intent(&mut self, intent: Vec2) {
        self.movement_intent = intent;
    }

    /// 現在の戦術状態（UI・デバッグ表示用の読み取り専用アクセス）
    pub fn tactic_state(&self) -> &TacticState {
        &self.tactics
    }

    /// 砲塔喪失の通知
    ///
    /// 被弾で砲塔を1基失った際に呼ばれます。残存砲塔がゼロになった時点で
    /// 交戦様式は Ranged から Melee へ一方向に退化し、以後この通知が
    /// 再び呼ばれても（仮に砲塔数が補充されても）復帰しません。
    pub fn notify_gun_destroyed(&mut self) {
        self.gun_count = self.gun_count.saturating_sub(1);

        if let Some(turret) = self.turrets.iter_mut().find(|t| t.operational) {
            turret.operational = false;
        }

        if self.gun_count == 0 && self.tactics.battle_mode == BattleMode::Ranged {
            self.tactics.battle_mode = BattleMode::Melee;
            info!(
                ship_id = %self.id,
                team = ?self.team,
                "SHIP_BATTLE_MODE_DEGRADED: 全砲塔を喪失し近接戦へ移行しました"
            );
        }
    }

    /// 撃破処理（呼び出し側でスケジューラの保留イベント破棄が必要）
    pub fn destroy(&mut self) {
        self.status = AgentStatus::Destroyed;
    }
}

impl IAgent for Ship {
    fn get_id(&self) -> String {
        self.id.clone()
    }

    fn is_active(&self) -> bool {
        self.status == AgentStatus::Active
    }
}

impl IMovable for Ship {
    fn get_position(&self) -> Vec2 {
        self.position
    }

    fn get_velocity(&self) -> Vec2 {
        self.velocity
    }
}

impl ITeamable for Ship {
    fn get_team(&self) -> Team {
        self.team
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::turret::Turret;

    fn test_turret(index: usize) -> Turret {
        Turret::new(index, 0.0, 45.0, 45.0, true, 90.0, 600.0, 1.2)
    }

    #[test]
    fn test_auto_correct_chase_below_avoid() {
        let mut params = ShipAiParams::default();
        params.chase_range_m = 100.0;
        params.avoid_range_m = 200.0;
        params.attack_range_m = 50.0;

        assert!(params.auto_correct("B01"));
        assert!(params.chase_range_m > params.avoid_range_m);
        assert!(params.chase_range_m > params.attack_range_m);
    }

    #[test]
    fn test_auto_correct_chase_below_attack() {
        let mut params = ShipAiParams::default();
        params.chase_range_m = 100.0;
        params.avoid_range_m = 50.0;
        params.attack_range_m = 300.0;

        assert!(params.auto_correct("B01"));
        assert!(params.chase_range_m > params.attack_range_m);
    }

    #[test]
    fn test_valid_params_untouched() {
        let mut params = ShipAiParams::default();
        assert!(!params.auto_correct("B01"));
        assert_eq!(params.chase_range_m, 900.0);
    }

    #[test]
    fn test_gun_destroyed_degrades_to_melee_permanently() {
        let mut ship = Ship::new(
            "B01".to_string(),
            Team::Blue,
            Vec2::ZERO,
            0.0,
            12.0,
            40.0,
            ShipAiParams::default(),
            vec![test_turret(0), test_turret(1)],
        );
        assert_eq!(ship.tactics.battle_mode, BattleMode::Ranged);

        ship.notify_gun_destroyed();
        assert_eq!(ship.tactics.battle_mode, BattleMode::Ranged);
        assert_eq!(ship.gun_count, 1);

        ship.notify_gun_destroyed();
        assert_eq!(ship.tactics.battle_mode, BattleMode::Melee);

        // 砲塔数が（仮に）補充されても近接戦のまま
        ship.gun_count = 2;
        ship.notify_gun_destroyed();
        assert_eq!(ship.tactics.battle_mode, BattleMode::Melee);
    }

    #[test]
    fn test_gun_destroyed_marks_turret_inoperational() {
        let mut ship = Ship::new(
            "B01".to_string(),
            Team::Blue,
            Vec2::ZERO,
            0.0,
            12.0,
            40.0,
            ShipAiParams::default(),
            vec![test_turret(0), test_turret(1)],
        );

        ship.notify_gun_destroyed();
        assert_eq!(ship.turrets.iter().filter(|t| t.operational).count(), 1);
    }
}
