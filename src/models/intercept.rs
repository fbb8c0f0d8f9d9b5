use crate::models::common::Vec2;

/// 迎撃予測点の計算
///
/// 自機位置から接近速度で直進した場合に移動目標と会合する予測点を
/// 閉形式の2次方程式で求めます。移動リード（操舵）と射撃リード（照準）の
/// 双方から呼び出される純粋関数で、副作用を持ちません。
///
/// 飛翔時間 t は |Δp + v·t| = s·t を満たす最小の正根として解きます：
/// (|v|² - s²)t² + 2(Δp·v)t + |Δp|² = 0
///
/// # 引数
///
/// * `origin` - 自機（または砲塔）の現在位置
/// * `target_pos` - 目標の現在位置
/// * `target_vel` - 目標の速度ベクトル
/// * `closing_speed` - 接近速度（m/s、艦速または弾速）
///
/// # 戻り値
///
/// 予測会合点。静止目標はそのままの位置、接近速度ゼロや会合不能
/// （目標が接近速度より速く遠ざかる等）の場合は現在の目標位置を
/// フォールバックとして返します。発散はしません。
pub fn predict_intercept_point(
    origin: Vec2,
    target_pos: Vec2,
    target_vel: Vec2,
    closing_speed: f64,
) -> Vec2 {
    // 静止目標はリード不要
    if target_vel.magnitude() < 1e-9 {
        return target_pos;
    }

    // 接近速度ゼロでは会合時刻が定義できない
    if closing_speed <= 0.0 {
        return target_pos;
    }

    let dp = target_pos - origin;
    let a = target_vel.dot(&target_vel) - closing_speed * closing_speed;
    let b = 2.0 * dp.dot(&target_vel);
    let c = dp.dot(&dp);

    let time_of_flight = if a.abs() < 1e-9 {
        // 目標速度と接近速度がほぼ等しい場合は1次方程式に退化する
        if b.abs() < 1e-9 {
            return target_pos;
        }
        let t = -c / b;
        if t > 0.0 { Some(t) } else { None }
    } else {
        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            None
        } else {
            let sqrt_d = discriminant.sqrt();
            let t1 = (-b - sqrt_d) / (2.0 * a);
            let t2 = (-b + sqrt_d) / (2.0 * a);
            // 最小の正根を採用
            match (t1 > 0.0, t2 > 0.0) {
                (true, true) => Some(t1.min(t2)),
                (true, false) => Some(t1),
                (false, true) => Some(t2),
                (false, false) => None,
            }
        }
    };

    match time_of_flight {
        Some(t) if t.is_finite() => target_pos + target_vel * t,
        _ => target_pos, // 会合不能：現在位置へのフォールバック
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stationary_target_returns_target_position() {
        let origin = Vec2::new(0.0, 0.0);
        let target = Vec2::new(100.0, 50.0);
        let predicted = predict_intercept_point(origin, target, Vec2::ZERO, 300.0);
        assert_eq!(predicted, target);
    }

    #[test]
    fn test_crossing_target_leads_ahead() {
        // 目標は+Y方向へ10m/s、自機は原点から速度100m/sで会合
        let origin = Vec2::new(0.0, 0.0);
        let target = Vec2::new(100.0, 0.0);
        let velocity = Vec2::new(0.0, 10.0);
        let predicted = predict_intercept_point(origin, target, velocity, 100.0);

        // 予測点は進行方向の前方にある
        assert!(predicted.y > 0.0);
        // 会合点までの距離 = 弾の移動距離 の整合性を確認
        let t = predicted.y / 10.0;
        let travelled = predicted.distance(&origin);
        assert!((travelled - 100.0 * t).abs() < 1e-6);
    }

    #[test]
    fn test_receding_faster_target_falls_back() {
        // 目標が接近速度より速く遠ざかる場合は現在位置を返す
        let origin = Vec2::new(0.0, 0.0);
        let target = Vec2::new(100.0, 0.0);
        let velocity = Vec2::new(50.0, 0.0);
        let predicted = predict_intercept_point(origin, target, velocity, 20.0);
        assert_eq!(predicted, target);
    }

    #[test]
    fn test_zero_closing_speed_falls_back() {
        let origin = Vec2::new(0.0, 0.0);
        let target = Vec2::new(100.0, 0.0);
        let velocity = Vec2::new(0.0, 10.0);
        let predicted = predict_intercept_point(origin, target, velocity, 0.0);
        assert_eq!(predicted, target);
    }

    #[test]
    fn test_equal_speed_head_on_still_finite() {
        // 同速で正面から接近：1次方程式の退化ケース
        let origin = Vec2::new(0.0, 0.0);
        let target = Vec2::new(100.0, 0.0);
        let velocity = Vec2::new(-50.0, 0.0);
        let predicted = predict_intercept_point(origin, target, velocity, 50.0);
        assert!(predicted.x.is_finite());
        // 中間地点で会合する
        assert!((predicted.x - 50.0).abs() < 1e-6);
    }
}
