//! # World モジュール
//!
//! 毎ティック冒頭で取得する世界状態のスナップショットと空間クエリを提供します。
//!
//! 元の系では敵・味方・障害物・弾のリストがグローバルなレジストリとして
//! 保持されていましたが、本実装ではティック内のスポーン／消滅で
//! イテレーションが無効化されないよう、クエリ時点の防御的コピーを取り、
//! 各艦の更新処理に明示的に注入します。スナップショットは読み取り専用で、
//! 複数の読み手が同時に参照しても安全です。

use crate::models::common::{Team, Vec2};
use crate::models::obstacle::Obstacle;
use crate::models::projectile::Projectile;
use crate::models::ship::Ship;
use crate::models::traits::{IAgent, IMovable, ITeamable};

/// 艦の読み取り専用ビュー
#[derive(Debug, Clone)]
pub struct ShipView {
    pub id: String,
    pub team: Team,
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f64,
}

/// 弾体の読み取り専用ビュー
#[derive(Debug, Clone)]
pub struct ProjectileView {
    pub id: String,
    pub team: Team,
    pub position: Vec2,
    pub velocity: Vec2,
}

/// 障害物の読み取り専用ビュー
#[derive(Debug, Clone)]
pub struct ObstacleView {
    pub id: String,
    pub position: Vec2,
    pub radius: f64,
}

/// ティック開始時点の世界状態スナップショット
#[derive(Debug, Clone, Default)]
pub struct WorldSnapshot {
    pub ships: Vec<ShipView>,
    pub projectiles: Vec<ProjectileView>,
    pub obstacles: Vec<ObstacleView>,
}

impl WorldSnapshot {
    /// 現在の世界状態から防御的コピーを取得
    pub fn capture(ships: &[Ship], projectiles: &[Projectile], obstacles: &[Obstacle]) -> Self {
        let ship_views = ships
            .iter()
            .filter(|s| s.is_active())
            .map(|s| ShipView {
                id: s.get_id(),
                team: s.get_team(),
                position: s.get_position(),
                velocity: s.get_velocity(),
                radius: s.radius,
            })
            .collect();

        let projectile_views = projectiles
            .iter()
            .filter(|p| p.is_active())
            .map(|p| ProjectileView {
                id: p.get_id(),
                team: p.get_team(),
                position: p.get_position(),
                velocity: p.get_velocity(),
            })
            .collect();

        let obstacle_views = obstacles
            .iter()
            .map(|o| ObstacleView {
                id: o.id.clone(),
                position: o.position,
                radius: o.radius,
            })
            .collect();

        Self {
            ships: ship_views,
            projectiles: projectile_views,
            obstacles: obstacle_views,
        }
    }

    /// 指定位置から最も近い敵艦を検索
    ///
    /// # 戻り値
    ///
    /// 最近傍の敵艦ビュー、敵が存在しない場合はNone
    pub fn closest_enemy(&self, position: Vec2, team: Team) -> Option<&ShipView> {
        self.ships
            .iter()
            .filter(|s| team.is_enemy(s.team))
            .min_by(|a, b| {
                let da = a.position.distance(&position);
                let db = b.position.distance(&position);
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    /// 指定艦を除く同一陣営の艦体リスト（障害物回避の対象）
    pub fn ally_bodies(&self, team: Team, exclude_id: &str) -> Vec<&ShipView> {
        self.ships
            .iter()
            .filter(|s| s.team.is_ally(team) && s.id != exclude_id)
            .collect()
    }

    /// 指定陣営にとって敵対する弾体のリスト
    pub fn hostile_projectiles(&self, team: Team) -> Vec<&ProjectileView> {
        self.projectiles
            .iter()
            .filter(|p| team.is_enemy(p.team))
            .collect()
    }

    /// IDで艦を検索（随伴対象の解決に使用、消滅済みならNone）
    pub fn find_ship(&self, id: &str) -> Option<&ShipView> {
        self.ships.iter().find(|s| s.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(id: &str, team: Team, x: f64, y: f64) -> ShipView {
        ShipView {
            id: id.to_string(),
            team,
            position: Vec2::new(x, y),
            velocity: Vec2::ZERO,
            radius: 10.0,
        }
    }

    #[test]
    fn test_closest_enemy_picks_nearest_hostile() {
        let snapshot = WorldSnapshot {
            ships: vec![
                view("B01", Team::Blue, 0.0, 0.0),
                view("R01", Team::Red, 500.0, 0.0),
                view("R02", Team::Red, 200.0, 0.0),
            ],
            projectiles: Vec::new(),
            obstacles: Vec::new(),
        };

        let enemy = snapshot.closest_enemy(Vec2::ZERO, Team::Blue);
        assert_eq!(enemy.map(|e| e.id.as_str()), Some("R02"));
    }

    #[test]
    fn test_closest_enemy_ignores_allies_and_neutrals() {
        let snapshot = WorldSnapshot {
            ships: vec![view("B01", Team::Blue, 0.0, 0.0), view("B02", Team::Blue, 50.0, 0.0)],
            projectiles: Vec::new(),
            obstacles: Vec::new(),
        };
        assert!(snapshot.closest_enemy(Vec2::ZERO, Team::Blue).is_none());
        assert!(snapshot.closest_enemy(Vec2::ZERO, Team::Neutral).is_none());
    }

    #[test]
    fn test_ally_bodies_excludes_self() {
        let snapshot = WorldSnapshot {
            ships: vec![
                view("B01", Team::Blue, 0.0, 0.0),
                view("B02", Team::Blue, 50.0, 0.0),
                view("R01", Team::Red, 100.0, 0.0),
            ],
            projectiles: Vec::new(),
            obstacles: Vec::new(),
        };

        let allies = snapshot.ally_bodies(Team::Blue, "B01");
        assert_eq!(allies.len(), 1);
        assert_eq!(allies[0].id, "B02");
    }
}
