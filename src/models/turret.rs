use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use crate::models::common::{Vec2, math_utils};
use crate::models::intercept::predict_intercept_point;
use crate::scheduler::{DeferredAction, TickScheduler};
use crate::world::ShipView;

/// 旋回限界の継ぎ目判定に用いる許容誤差（度）
///
/// 境界ちょうどでの浮動小数点の振動を防ぐため、厳密比較ではなく
/// この許容値付きで比較します。
const SEAM_EPSILON_DEG: f64 = 0.001;

/// アイドルスキャン方位の再抽選間隔（秒）
const IDLE_SCAN_MIN_S: f64 = 3.0;
const IDLE_SCAN_MAX_S: f64 = 8.0;

/// 発射判定に用いる照準一致許容角（度）
pub const FIRE_TOLERANCE_DEG: f64 = 2.0;

/// 砲塔エージェント
///
/// 艦に複数基搭載され、それぞれ独立に旋回・照準します。
/// 方位は全て砲塔マウントの中立方向を0度とした相対角で保持します。
#[derive(Debug, Clone)]
pub struct Turret {
    /// 艦内での搭載インデックス
    pub index: usize,
    /// マウント中立方向（艦首基準のオフセット角、度）
    pub mount_angle_deg: f64,
    /// 左旋回限界（中立からの角度、度）
    pub left_limit_deg: f64,
    /// 右旋回限界（中立からの角度、度）
    pub right_limit_deg: f64,
    /// 旋回限界を適用するかどうか（全周旋回砲塔はfalse）
    pub limit_traversal: bool,
    /// 最大旋回速度（deg/s）
    pub angular_speed_deg_s: f64,
    /// 弾の初速（m/s、射撃リード計算用）
    pub muzzle_speed_mps: f64,
    /// 発射間隔（秒）
    pub fire_cooldown_s: f64,

    /// 現在の照準方位（中立基準、度）
    pub current_bearing_deg: f64,
    /// アイドルスキャン方位（中立基準、度）
    pub idle_bearing_deg: f64,
    /// アイドルスキャン再抽選が予約済みかどうか
    pub idle_reroll_pending: bool,
    /// 残り発射クールダウン（秒）
    pub cooldown_remaining_s: f64,
    /// 稼働状態（被弾で失われるとfalse）
    pub operational: bool,
}

/// 照準更新の結果
#[derive(Debug, Clone, Copy)]
pub struct AimUpdate {
    /// このティックで適用した旋回量（度）
    pub applied_delta_deg: f64,
    /// 目標に照準が一致しているか（発射判定用）
    pub on_target: bool,
}

impl Turret {
    pub fn new(
        index: usize,
        mount_angle_deg: f64,
        left_limit_deg: f64,
        right_limit_deg: f64,
        limit_traversal: bool,
        angular_speed_deg_s: f64,
        muzzle_speed_mps: f64,
        fire_cooldown_s: f64,
    ) -> Self {
        Self {
            index,
            mount_angle_deg,
            left_limit_deg,
            right_limit_deg,
            limit_traversal,
            angular_speed_deg_s,
            muzzle_speed_mps,
            fire_cooldown_s,
            current_bearing_deg: 0.0,
            idle_bearing_deg: 0.0,
            idle_reroll_pending: false,
            cooldown_remaining_s: 0.0,
            operational: true,
        }
    }

    /// 砲塔の照準方向（世界座標の角度、度）
    pub fn world_aim_deg(&self, ship_heading_deg: f64) -> f64 {
        math_utils::normalize_angle(ship_heading_deg + self.mount_angle_deg + self.current_bearing_deg)
    }

    /// 照準の毎ティック更新
    ///
    /// 目標があれば予測会合点への方位、なければアイドルスキャン方位へ、
    /// 旋回限界と継ぎ目補正を適用した上で最大 `angular_speed · dt` だけ
    /// 旋回します。目標消失はエラーではなく「目標なし」として扱います。
    ///
    /// # 引数
    ///
    /// * `ship_id` - 搭載艦のID（イベント予約用）
    /// * `ship_pos` - 搭載艦の位置
    /// * `ship_heading_deg` - 搭載艦の艦首方位（度）
    /// * `target` - 視認中の目標（存在しない場合None）
    /// * `now` - 現在のシミュレーション時刻（秒）
    /// * `dt` - 時間刻み（秒）
    pub fn update_aim(
        &mut self,
        ship_id: &str,
        ship_pos: Vec2,
        ship_heading_deg: f64,
        target: Option<&ShipView>,
        now: f64,
        dt: f64,
        scheduler: &mut TickScheduler,
        rng: &mut ChaCha8Rng,
    ) -> AimUpdate {
        if !self.operational {
            return AimUpdate {
                applied_delta_deg: 0.0,
                on_target: false,
            };
        }

        self.cooldown_remaining_s = (self.cooldown_remaining_s - dt).max(0.0);

        let neutral_world_deg =
            math_utils::normalize_angle(ship_heading_deg + self.mount_angle_deg);

        let desired_bearing = match target {
            Some(target) => {
                let aim_point = predict_intercept_point(
                    ship_pos,
                    target.position,
                    target.velocity,
                    self.muzzle_speed_mps,
                );
                let bearing_world = (aim_point - ship_pos).angle_deg();
                math_utils::angle_difference(neutral_world_deg, bearing_world)
            }
            None => {
                // 目標なし：アイドルスキャン。再抽選は3〜8秒間隔で予約する
                if !self.idle_reroll_pending {
                    scheduler.schedule(
                        now + rng.gen_range(IDLE_SCAN_MIN_S..=IDLE_SCAN_MAX_S),
                        DeferredAction::IdleScanReroll {
                            ship_id: ship_id.to_string(),
                            turret_index: self.index,
                        },
                    );
                    self.idle_reroll_pending = true;
                }
                self.idle_bearing_deg
            }
        };

        let mut delta = if self.limit_traversal {
            let clamped = desired_bearing.clamp(-self.right_limit_deg, self.left_limit_deg);
            let candidate = math_utils::angle_difference(self.current_bearing_deg, clamped);
            correct_seam_crossing(
                candidate,
                self.current_bearing_deg,
                self.left_limit_deg,
                self.right_limit_deg,
            )
        } else {
            math_utils::angle_difference(self.current_bearing_deg, desired_bearing)
        };

        // 旋回速度制限
        let max_step = self.angular_speed_deg_s * dt;
        delta = delta.clamp(-max_step, max_step);

        self.current_bearing_deg = if self.limit_traversal {
            // 限界内で動くため正規化は不要（継ぎ目をまたがない）
            self.current_bearing_deg + delta
        } else {
            math_utils::normalize_angle(self.current_bearing_deg + delta)
        };

        let on_target = match target {
            Some(_) => {
                let remaining =
                    math_utils::angle_difference(self.current_bearing_deg, desired_bearing);
                remaining.abs() < FIRE_TOLERANCE_DEG
            }
            None => false,
        };

        AimUpdate {
            applied_delta_deg: delta,
            on_target,
        }
    }

    /// アイドルスキャン方位の再抽選（IdleScanRerollイベント発火時）
    pub fn reroll_idle_bearing(&mut self, ship_id: &str, rng: &mut ChaCha8Rng) {
        let (lo, hi) = if self.limit_traversal {
            (-self.right_limit_deg, self.left_limit_deg)
        } else {
            (-180.0, 180.0)
        };
        self.idle_bearing_deg = rng.gen_range(lo..=hi);
        self.idle_reroll_pending = false;

        trace!(
            ship_id = %ship_id,
            turret_index = self.index,
            idle_bearing_deg = self.idle_bearing_deg,
            "TURRET_IDLE_REROLL: アイドルスキャン方位を再抽選しました"
        );
    }

    /// 発射可能かどうか（クールダウン完了かつ稼働中）
    pub fn ready_to_fire(&self) -> bool {
        self.operational && self.cooldown_remaining_s <= 0.0
    }
}

/// 旋回限界の継ぎ目補正
///
/// 最短経路の旋回が `+left_limit` と `-right_limit` の間の閉塞弧
/// （旋回円錐の背面）をまたぐ場合、±360度して開いた弧を通る遠回りの
/// 経路に差し替えます。候補の旋回量と現在方位から各限界までの角距離を
/// 許容誤差付きで比較します。
///
/// # 引数
///
/// * `candidate_delta_deg` - 最短経路として計算された旋回量（度）
/// * `current_bearing_deg` - 現在の照準方位（中立基準、度）
/// * `left_limit_deg` - 左旋回限界（度）
/// * `right_limit_deg` - 右旋回限界（度）
pub fn correct_seam_crossing(
    candidate_delta_deg: f64,
    current_bearing_deg: f64,
    left_limit_deg: f64,
    right_limit_deg: f64,
) -> f64 {
    if candidate_delta_deg > 0.0 {
        // 左回り：左限界までの残り角度を超える旋回は背面をまたぐ
        let headroom = left_limit_deg - current_bearing_deg;
        if candidate_delta_deg > headroom + SEAM_EPSILON_DEG {
            return candidate_delta_deg - 360.0;
        }
    } else if candidate_delta_deg < 0.0 {
        // 右回り：右限界までの残り角度を超える旋回は背面をまたぐ
        let headroom = current_bearing_deg + right_limit_deg;
        if -candidate_delta_deg > headroom + SEAM_EPSILON_DEG {
            return candidate_delta_deg + 360.0;
        }
    }
    candidate_delta_deg
}
