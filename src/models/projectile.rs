use tracing::trace;

use crate::models::common::{AgentStatus, Team, Vec2};
use crate::models::traits::{IAgent, IMovable, ITeamable};

/// 弾体エージェント
///
/// 砲塔から発射され、等速直線運動する弾体です。寿命が尽きるか命中すると
/// 消滅します。誘導は行いません。
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: String,
    pub team: Team,
    pub position: Vec2,
    pub velocity: Vec2,
    /// 経過飛翔時間（秒）
    pub age_s: f64,
    /// 寿命（秒）
    pub lifetime_s: f64,
    pub status: AgentStatus,
}

impl Projectile {
    pub fn new(id: String, team: Team, position: Vec2, velocity: Vec2, lifetime_s: f64) -> Self {
        Self {
            id,
            team,
            position,
            velocity,
            age_s: 0.0,
            lifetime_s,
            status: AgentStatus::Active,
        }
    }

    /// 1ティックの運動更新と寿命判定
    pub fn tick(&mut self, dt: f64) {
        if self.status != AgentStatus::Active {
            return;
        }

        self.position = self.position + self.velocity * dt;
        self.age_s += dt;

        if self.age_s >= self.lifetime_s {
            self.status = AgentStatus::Expired;
            trace!(
                projectile_id = %self.id,
                age_s = self.age_s,
                "PROJECTILE_EXPIRED: 弾体が寿命切れで消滅しました"
            );
        }
    }

    /// 命中処理（衝突判定は外部の簡易ダメージ処理が行う）
    pub fn mark_spent(&mut self) {
        self.status = AgentStatus::Inactive;
    }
}

impl IAgent for Projectile {
    fn get_id(&self) -> String {
        self.id.clone()
    }

    fn is_active(&self) -> bool {
        self.status == AgentStatus::Active
    }
}

impl IMovable for Projectile {
    fn get_position(&self) -> Vec2 {
        self.position
    }

    fn get_velocity(&self) -> Vec2 {
        self.velocity
    }
}

impl ITeamable for Projectile {
    fn get_team(&self) -> Team {
        self.team
    }
}
