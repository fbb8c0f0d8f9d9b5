//! # Steering モジュール
//!
//! 毎ティックの操舵ベクトル合成を提供します。
//!
//! 追跡・障害物回避・敵弾回避・徘徊の各寄与を1本の有界な移動意図ベクトル
//! にまとめ、外部のムーバーに渡します。追跡が弱いほど徘徊が混ざり、
//! 衝突が差し迫るほど敵弾回避より障害物回避が優先されます。

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use crate::models::common::{Vec2, math_utils};
use crate::models::intercept::predict_intercept_point;
use crate::models::ship::Ship;
use crate::models::tactics::{BattleMode, MovementMode};
use crate::models::threat::projectile_threat_vector;
use crate::world::{ShipView, WorldSnapshot};

/// 徘徊状態
///
/// 徘徊方位は固定周期ではなく、抽選された間隔で再抽選されます。
#[derive(Debug, Clone)]
pub struct WanderState {
    /// 現在の徘徊方位（度、世界座標）
    pub heading_deg: f64,
    /// 再抽選回数（診断用）
    pub reroll_count: u64,
}

impl WanderState {
    pub fn new(initial_heading_deg: f64) -> Self {
        Self {
            heading_deg: initial_heading_deg,
            reroll_count: 0,
        }
    }
}

/// 徘徊方位の再抽選
///
/// 現在の艦首方位を中心に ±wander_angle_deg の範囲で新しい方位を引きます。
/// スケジューラの WanderReroll イベント発火時に呼ばれます。
pub fn reroll_wander_heading(ship: &mut Ship, rng: &mut ChaCha8Rng) {
    let half_angle = ship.params.wander_angle_deg;
    let offset = rng.gen_range(-half_angle..=half_angle);
    ship.wander.heading_deg = math_utils::normalize_angle(ship.heading + offset);
    ship.wander.reroll_count += 1;

    trace!(
        ship_id = %ship.id,
        new_heading_deg = ship.wander.heading_deg,
        reroll_count = ship.wander.reroll_count,
        "WANDER_REROLL: 徘徊方位を再抽選しました"
    );
}

/// 次回の徘徊再抽選までの間隔を抽選
pub fn next_wander_delay(ship: &Ship, rng: &mut ChaCha8Rng) -> f64 {
    rng.gen_range(ship.params.wander_period_min_s..=ship.params.wander_period_max_s)
}

/// 徘徊・随伴ベクトルの計算
///
/// 随伴対象が設定されていてリーシュ距離を超えている場合、徘徊は
/// `(距離 - リーシュ)/リーシュ` に比例した引き戻しベクトルに置き換わります。
/// リーシュ内では寄与ゼロ、随伴対象がなければ徘徊方位の単位ベクトルです。
pub fn wander_vector(ship: &Ship, follow: Option<&ShipView>) -> Vec2 {
    if let Some(follow) = follow {
        let dp = follow.position - ship.position;
        let distance = dp.magnitude();
        let leash = ship.params.leash_distance_m;
        if distance > leash && leash > 0.0 {
            return dp.normalize() * ((distance - leash) / leash);
        }
        return Vec2::ZERO;
    }

    Vec2::from_angle_deg(ship.wander.heading_deg)
}

/// 障害物・僚艦回避ベクトルの計算
///
/// 追跡範囲外の物体は走査から除外し、回避範囲内の物体のみが
/// 距離の2乗に反比例する反発を与えます。回避範囲と追跡範囲の間は
/// あえて寄与ゼロ（なだらかな減衰ではなくハードカットオフ）とし、
/// 遠方の密集による恒常的なドリフトを防ぎます。
pub fn obstacle_avoidance(ship: &Ship, world: &WorldSnapshot) -> Vec2 {
    let mut repulsion = Vec2::ZERO;
    let chase_range = ship.params.chase_range_m;
    let avoid_range = ship.params.avoid_range_m;

    let mut bodies: Vec<Vec2> = Vec::new();
    for ally in world.ally_bodies(ship.team, &ship.id) {
        bodies.push(ally.position);
    }
    for obstacle in &world.obstacles {
        bodies.push(obstacle.position);
    }

    for body_pos in bodies {
        let dp = body_pos - ship.position;
        let distance = dp.magnitude();
        if distance > chase_range || distance > avoid_range {
            continue;
        }
        if distance < 1e-9 {
            continue; // 同一点：方向が定義できない
        }
        repulsion = repulsion + (-(dp * (1.0 / distance))) * (1.0 / (distance * distance));
    }

    repulsion
}

/// 追跡ベクトルの計算（態勢規則）
///
/// 目標なし・追跡範囲外ではゼロ。態勢ごとの規則：
///
/// - Ranged+Chasing・攻撃範囲外: 予測会合点へ向かう方向に
///   `距離 - 攻撃範囲` の大きさ（会合点は艦速ベースの移動リード）
/// - Ranged+Chasing・攻撃範囲内: 目標と反対方向に `1/(攻撃範囲 - 距離)`
///   （距離を攻撃範囲まで開ける後退）
/// - Melee+Chasing: 目標の現在位置へ距離比例で直進（リードなし）
/// - Avoiding（いずれの交戦様式でも）: 目標と反対方向の単位ベクトル
pub fn chase_vector(ship: &Ship, target: Option<&ShipView>) -> Vec2 {
    let Some(target) = target else {
        return Vec2::ZERO;
    };

    let dp = target.position - ship.position;
    let distance = dp.magnitude();
    if distance > ship.params.chase_range_m || distance < 1e-9 {
        return Vec2::ZERO;
    }
    let direction = dp * (1.0 / distance);

    match (ship.tactics.battle_mode, ship.tactics.movement_mode) {
        (BattleMode::Ranged, MovementMode::Chasing) => {
            let attack_range = ship.params.attack_range_m;
            if distance >= attack_range {
                let aim_point = predict_intercept_point(
                    ship.position,
                    target.position,
                    target.velocity,
                    ship.max_speed,
                );
                let to_intercept = (aim_point - ship.position).normalize();
                to_intercept * (distance - attack_range)
            } else {
                -direction * (1.0 / (attack_range - distance))
            }
        }
        (BattleMode::Melee, MovementMode::Chasing) => direction * distance,
        (_, MovementMode::Avoiding) => -direction,
    }
}

/// 操舵ベクトルの合成（毎ティック1回）
///
/// 1. 態勢規則に基づく追跡ベクトル
/// 2. 敵弾回避は `(1 - clamp(|障害物回避|, 0, 1))` で減衰
///    （衝突回避が敵弾回避に優先する）
/// 3. 回避ベクトル = 障害物回避 + 減衰済み敵弾回避
/// 4. 追跡の強さが1未満なら不足分だけ徘徊を混合
/// 5. 合成 = 駆動成分の正規化 × 駆動強度
///    + 回避成分の正規化 × (1 + 個体回避重み - 追跡強度)
///
/// 出力は `use_global_force` に応じて世界座標系または艦体座標系の
/// 2次元意図ベクトルで、外部ムーバーがそのまま消費します。
pub fn compose_steering(ship: &Ship, target: Option<&ShipView>, world: &WorldSnapshot) -> Vec2 {
    let chase = chase_vector(ship, target);

    let obstacle = obstacle_avoidance(ship, world);
    let hostiles = world.hostile_projectiles(ship.team);
    let projectile = projectile_threat_vector(
        ship.position,
        ship.radius,
        ship.params.projectile_react_time_s,
        &hostiles,
    );
    let projectile_scale = 1.0 - obstacle.magnitude().clamp(0.0, 1.0);
    let avoidance = obstacle + projectile * projectile_scale;

    let chase_len = chase.magnitude().clamp(0.0, 1.0);
    let follow = ship
        .follow_target
        .as_deref()
        .and_then(|id| world.find_ship(id));
    let wander = wander_vector(ship, follow);

    // 追跡が支配的でない分だけ徘徊を混合した駆動成分
    let drive = chase + wander * (1.0 - chase_len);
    let drive_len = drive.magnitude().clamp(0.0, 1.0);

    let force =
        drive.normalize() * drive_len + avoidance.normalize() * (1.0 + ship.params.entity_avoidance - chase_len);

    if ship.use_global_force {
        force
    } else {
        force.rotate_deg(-ship.heading)
    }
}
