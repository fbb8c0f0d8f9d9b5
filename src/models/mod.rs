// 基本的なデータ型と数学ユーティリティ
pub mod common;

// エージェントの基本インターフェース（trait）定義
pub mod traits;

// 各エージェントモデルの実装
pub mod obstacle;
pub mod projectile;
pub mod ship;

// 戦闘AIの判断コンポーネント
pub mod intercept;
pub mod steering;
pub mod tactics;
pub mod threat;
pub mod turret;

// 便利な re-export
pub use common::*;
pub use intercept::predict_intercept_point;
pub use obstacle::Obstacle;
pub use projectile::Projectile;
pub use ship::{Ship, ShipAiParams};
pub use steering::{WanderState, compose_steering};
pub use tactics::{BattleMode, MovementMode, TacticState};
pub use threat::projectile_threat_vector;
pub use traits::*;
pub use turret::{AimUpdate, Turret};
