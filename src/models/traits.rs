use crate::models::common::*;

/// 全てのシミュレーションエージェントが実装する基本インターフェース
pub trait IAgent {
    /// エージェントIDの取得
    fn get_id(&self) -> String;

    /// エージェントがアクティブかどうか
    fn is_active(&self) -> bool;
}

/// 移動可能なエージェントのインターフェース
pub trait IMovable {
    /// 現在位置の取得
    fn get_position(&self) -> Vec2;

    /// 現在速度の取得
    fn get_velocity(&self) -> Vec2;
}

/// 陣営に所属するエージェントのインターフェース
pub trait ITeamable {
    /// 所属陣営の取得
    fn get_team(&self) -> Team;
}
