use crate::models::common::{Team, Vec2};
use crate::models::traits::{IAgent, IMovable, ITeamable};

/// 静的障害物
///
/// どの陣営にも属さない静止物体です。操舵合成の障害物回避のみが参照し、
/// 位置と半径以外の状態を持ちません。
#[derive(Debug, Clone)]
pub struct Obstacle {
    pub id: String,
    pub position: Vec2,
    pub radius: f64,
}

impl Obstacle {
    pub fn new(id: String, position: Vec2, radius: f64) -> Self {
        Self {
            id,
            position,
            radius,
        }
    }
}

impl IAgent for Obstacle {
    fn get_id(&self) -> String {
        self.id.clone()
    }

    fn is_active(&self) -> bool {
        true
    }
}

impl IMovable for Obstacle {
    fn get_position(&self) -> Vec2 {
        self.position
    }

    fn get_velocity(&self) -> Vec2 {
        Vec2::ZERO
    }
}

impl ITeamable for Obstacle {
    fn get_team(&self) -> Team {
        Team::Neutral
    }
}
