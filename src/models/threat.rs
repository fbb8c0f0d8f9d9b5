use crate::models::common::Vec2;
use crate::world::ProjectileView;

/// 最接近オフセットがこれ未満の場合は正面直撃とみなす（m）
const HEAD_ON_PASS_FLOOR_M: f64 = 1e-6;

/// 敵弾回避ベクトルの評価
///
/// 既知の敵弾それぞれについて最接近距離と最接近時刻を射線投影で求め、
/// 緊急度で重み付けした反発ベクトルの総和を返します。
///
/// 各弾について：
/// 1. 相対位置 Δp（自艦→弾）が接近中か判定（dot(v, Δp) < 0）。
///    遠ざかる・平行な弾は寄与ゼロ。
/// 2. Δp を弾速度方向に分解し、垂直成分（最接近オフセット）が
///    艦のサイズを超えるなら外れる弾として寄与ゼロ。
/// 3. 緊急度 = max(0, 反応時間 - 最接近時刻)² / |最接近オフセット|。
///    方向は最接近オフセットの逆向き。
///
/// 総和の大きさはここではクランプしません（合成器側に委ねます）。
///
/// # 引数
///
/// * `ship_pos` - 自艦位置
/// * `ship_radius` - 自艦の衝突半径（m）
/// * `react_time_s` - 回避反応を始める最接近までの残り時間の上限（秒）
/// * `projectiles` - 敵弾のスナップショットビュー
pub fn projectile_threat_vector(
    ship_pos: Vec2,
    ship_radius: f64,
    react_time_s: f64,
    projectiles: &[&ProjectileView],
) -> Vec2 {
    let mut repulsion = Vec2::ZERO;

    for projectile in projectiles {
        let dp = projectile.position - ship_pos;

        // 接近判定：速度と相対位置の内積が負のときのみ脅威
        if projectile.velocity.dot(&dp) >= 0.0 {
            continue;
        }

        let speed = projectile.velocity.magnitude();
        if speed < 1e-9 {
            continue;
        }
        let track_dir = projectile.velocity * (1.0 / speed);

        // 射線方向成分と垂直成分（最接近オフセット）に分解
        let along_track = dp.dot(&track_dir);
        let pass = dp - track_dir * along_track;
        let pass_len = pass.magnitude();

        if pass_len > ship_radius {
            continue; // 外れる弾
        }

        let time_to_closest = along_track.abs() / speed;
        let urgency = (react_time_s - time_to_closest).max(0.0);
        if urgency <= 0.0 {
            continue;
        }

        // 正面直撃は射線の垂直方向へ逃がす
        let (dodge_dir, divisor) = if pass_len < HEAD_ON_PASS_FLOOR_M {
            (track_dir.perpendicular(), HEAD_ON_PASS_FLOOR_M)
        } else {
            (-(pass * (1.0 / pass_len)), pass_len)
        };

        repulsion = repulsion + dodge_dir * (urgency * urgency / divisor);
    }

    repulsion
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::common::Team;

    fn projectile(x: f64, y: f64, vx: f64, vy: f64) -> ProjectileView {
        ProjectileView {
            id: "P001".to_string(),
            team: Team::Red,
            position: Vec2::new(x, y),
            velocity: Vec2::new(vx, vy),
        }
    }

    #[test]
    fn test_receding_projectile_contributes_zero() {
        // 弾は自艦から遠ざかる方向に飛んでいる
        let p = projectile(100.0, 0.0, 50.0, 0.0);
        let result = projectile_threat_vector(Vec2::ZERO, 10.0, 1.5, &[&p]);
        assert_eq!(result, Vec2::ZERO);
    }

    #[test]
    fn test_parallel_projectile_contributes_zero() {
        // dot(v, Δp) == 0 のちょうど平行なケース
        let p = projectile(100.0, 0.0, 0.0, 30.0);
        let result = projectile_threat_vector(Vec2::ZERO, 10.0, 1.5, &[&p]);
        assert_eq!(result, Vec2::ZERO);
    }

    #[test]
    fn test_missing_projectile_contributes_zero() {
        // 最接近オフセット20m > 艦半径10m なので外れる
        let p = projectile(100.0, 20.0, -200.0, 0.0);
        let result = projectile_threat_vector(Vec2::ZERO, 10.0, 1.5, &[&p]);
        assert_eq!(result, Vec2::ZERO);
    }

    #[test]
    fn test_incoming_projectile_pushes_away_from_track() {
        // +X方向から接近、射線は自艦の+Y側5mを通過する
        let p = projectile(100.0, 5.0, -200.0, 0.0);
        let result = projectile_threat_vector(Vec2::ZERO, 10.0, 1.5, &[&p]);
        // 反発は射線から離れる-Y方向
        assert!(result.y < 0.0);
        assert!(result.x.abs() < 1e-9);
    }

    #[test]
    fn test_head_on_projectile_dodges_sideways() {
        let p = projectile(100.0, 0.0, -200.0, 0.0);
        let result = projectile_threat_vector(Vec2::ZERO, 10.0, 1.5, &[&p]);
        // 正面直撃でも有限の横方向回避が出る
        assert!(result.magnitude() > 0.0);
        assert!(result.magnitude().is_finite());
        assert!(result.x.abs() < 1e-9);
    }

    #[test]
    fn test_closer_approach_time_is_more_urgent() {
        let near = projectile(50.0, 5.0, -200.0, 0.0);
        let far = projectile(250.0, 5.0, -200.0, 0.0);
        let near_mag = projectile_threat_vector(Vec2::ZERO, 10.0, 1.5, &[&near]).magnitude();
        let far_mag = projectile_threat_vector(Vec2::ZERO, 10.0, 1.5, &[&far]).magnitude();
        assert!(near_mag > far_mag);
    }
}
