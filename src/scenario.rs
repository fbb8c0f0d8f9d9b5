use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::models::common::Team;
use crate::models::ship::ShipAiParams;

/// シナリオメタデータ
#[derive(Debug, Deserialize, Serialize)]
pub struct ScenarioMeta {
    pub version: String,
    pub name: String,
    pub description: String,
}

/// シミュレーション設定
#[derive(Debug, Deserialize, Serialize)]
pub struct SimulationConfig {
    pub dt_s: f64,
    pub t_max_s: f64,
    pub seed: u64,
}

/// 世界設定
#[derive(Debug, Deserialize, Serialize)]
pub struct WorldConfig {
    pub region_rect: RegionRect,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RegionRect {
    pub xmin_m: f64,
    pub xmax_m: f64,
    pub ymin_m: f64,
    pub ymax_m: f64,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Position2D {
    pub x_m: f64,
    pub y_m: f64,
}

/// AI調整パラメータのデフォルト設定
///
/// 全艦共通のAIパラメータです。範囲の不変条件はShip構築時に
/// 自動補正されます。
#[derive(Debug, Deserialize, Serialize)]
pub struct AiDefaultsConfig {
    pub chase_range_m: f64,
    pub avoid_range_m: f64,
    pub attack_range_m: f64,
    pub entity_avoidance: f64,
    pub wander_period_min_s: f64,
    pub wander_period_max_s: f64,
    pub wander_angle_deg: f64,
    pub leash_distance_m: f64,
    pub projectile_react_time_s: f64,
    pub melee_recover_delay_s: f64,
    pub melee_max_avoid_dwell_s: f64,
    pub chase_dwell_min_s: f64,
    pub chase_dwell_max_s: f64,
    pub avoid_dwell_min_s: f64,
    pub avoid_dwell_max_s: f64,
    pub use_global_force: bool,
}

impl AiDefaultsConfig {
    /// 設定値からAIパラメータ構造体を生成
    pub fn to_params(&self) -> ShipAiParams {
        ShipAiParams {
            chase_range_m: self.chase_range_m,
            avoid_range_m: self.avoid_range_m,
            attack_range_m: self.attack_range_m,
            entity_avoidance: self.entity_avoidance,
            wander_period_min_s: self.wander_period_min_s,
            wander_period_max_s: self.wander_period_max_s,
            wander_angle_deg: self.wander_angle_deg,
            leash_distance_m: self.leash_distance_m,
            projectile_react_time_s: self.projectile_react_time_s,
            melee_recover_delay_s: self.melee_recover_delay_s,
            melee_max_avoid_dwell_s: self.melee_max_avoid_dwell_s,
            chase_dwell_min_s: self.chase_dwell_min_s,
            chase_dwell_max_s: self.chase_dwell_max_s,
            avoid_dwell_min_s: self.avoid_dwell_min_s,
            avoid_dwell_max_s: self.avoid_dwell_max_s,
        }
    }
}

/// 砲塔のデフォルト設定
#[derive(Debug, Deserialize, Serialize)]
pub struct TurretDefaultsConfig {
    pub left_limit_deg: f64,
    pub right_limit_deg: f64,
    pub limit_traversal: bool,
    pub angular_speed_deg_s: f64,
    pub muzzle_speed_mps: f64,
    pub fire_cooldown_s: f64,
    pub projectile_lifetime_s: f64,
}

/// 艦隊設定
#[derive(Debug, Deserialize, Serialize)]
pub struct FleetConfig {
    pub team: Team,
    pub ships: Vec<ShipConfig>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ShipConfig {
    pub id: String,
    pub pos: Position2D,
    pub heading_deg: f64,
    pub radius_m: f64,
    pub max_speed_mps: f64,
    /// 随伴対象の艦ID（省略可）
    pub follow: Option<String>,
    pub turrets: Vec<TurretConfig>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TurretConfig {
    pub mount_angle_deg: f64,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ObstacleConfig {
    pub id: String,
    pub pos: Position2D,
    pub radius_m: f64,
}

/// 完全なシナリオ設定
#[derive(Debug, Deserialize, Serialize)]
pub struct ScenarioConfig {
    pub meta: ScenarioMeta,
    pub sim: SimulationConfig,
    pub world: WorldConfig,
    pub ai_defaults: AiDefaultsConfig,
    pub turret_defaults: TurretDefaultsConfig,
    pub fleets: Vec<FleetConfig>,
    #[serde(default)]
    pub obstacles: Vec<ObstacleConfig>,
}

impl ScenarioConfig {
    /// YAMLファイルからシナリオ設定を読み込み
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| ScenarioError::IoError(path.to_path_buf(), e))?;

        let config: ScenarioConfig = serde_yaml::from_str(&contents)
            .map_err(|e| ScenarioError::ParseError(path.to_path_buf(), e))?;

        config.validate()?;

        Ok(config)
    }

    /// 設定の基本的な検証
    ///
    /// 範囲の不変条件（chase > avoid / attack）はここでは検証しません。
    /// それらは構築時に自動補正される仕様です。
    pub fn validate(&self) -> Result<(), ScenarioError> {
        // 時間設定の検証
        if self.sim.dt_s <= 0.0 {
            return Err(ScenarioError::ValidationError(
                "dt_s must be positive".to_string(),
            ));
        }
        if self.sim.t_max_s <= 0.0 {
            return Err(ScenarioError::ValidationError(
                "t_max_s must be positive".to_string(),
            ));
        }

        // 座標範囲の検証
        let region = &self.world.region_rect;
        if region.xmin_m >= region.xmax_m || region.ymin_m >= region.ymax_m {
            return Err(ScenarioError::ValidationError(
                "Invalid region bounds".to_string(),
            ));
        }

        // 抽選区間の検証
        let ai = &self.ai_defaults;
        if ai.wander_period_min_s > ai.wander_period_max_s {
            return Err(ScenarioError::ValidationError(
                "wander_period_min_s > wander_period_max_s".to_string(),
            ));
        }
        if ai.chase_dwell_min_s > ai.chase_dwell_max_s
            || ai.avoid_dwell_min_s > ai.avoid_dwell_max_s
        {
            return Err(ScenarioError::ValidationError(
                "dwell time range is inverted".to_string(),
            ));
        }

        // 砲塔限界の検証
        let turret = &self.turret_defaults;
        if turret.limit_traversal
            && !(0.0..=180.0).contains(&turret.left_limit_deg)
        {
            return Err(ScenarioError::ValidationError(
                "left_limit_deg must be within 0-180".to_string(),
            ));
        }
        if turret.limit_traversal
            && !(0.0..=180.0).contains(&turret.right_limit_deg)
        {
            return Err(ScenarioError::ValidationError(
                "right_limit_deg must be within 0-180".to_string(),
            ));
        }

        // 艦IDの一意性と配置位置の検証
        let mut seen_ids = std::collections::HashSet::new();
        for fleet in &self.fleets {
            for ship in &fleet.ships {
                if !seen_ids.insert(ship.id.clone()) {
                    return Err(ScenarioError::ValidationError(format!(
                        "Duplicate ship id: {}",
                        ship.id
                    )));
                }
                if !self.is_position_in_bounds(ship.pos.x_m, ship.pos.y_m) {
                    return Err(ScenarioError::ValidationError(format!(
                        "Ship {} outside region bounds",
                        ship.id
                    )));
                }
                if ship.max_speed_mps <= 0.0 {
                    return Err(ScenarioError::ValidationError(format!(
                        "Ship {} max_speed_mps must be positive",
                        ship.id
                    )));
                }
            }
        }

        // 随伴対象の存在検証
        for fleet in &self.fleets {
            for ship in &fleet.ships {
                if let Some(follow_id) = &ship.follow {
                    if !seen_ids.contains(follow_id) {
                        return Err(ScenarioError::ValidationError(format!(
                            "Ship {} follows unknown ship {}",
                            ship.id, follow_id
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// 位置が領域内かどうかをチェック
    fn is_position_in_bounds(&self, x: f64, y: f64) -> bool {
        let region = &self.world.region_rect;
        x >= region.xmin_m && x <= region.xmax_m && y >= region.ymin_m && y <= region.ymax_m
    }

    /// シナリオの概要を表示
    pub fn print_summary(&self) {
        println!("=== シナリオ情報 ===");
        println!("名前: {}", self.meta.name);
        println!("説明: {}", self.meta.description);
        println!("バージョン: {}", self.meta.version);
        println!();

        println!("=== シミュレーション設定 ===");
        println!("時間刻み: {:.3}秒", self.sim.dt_s);
        println!(
            "最大時間: {:.1}秒 ({:.1}分)",
            self.sim.t_max_s,
            self.sim.t_max_s / 60.0
        );
        println!("シード値: {}", self.sim.seed);
        println!();

        println!("=== 戦力 ===");
        for fleet in &self.fleets {
            let total_turrets: usize = fleet.ships.iter().map(|s| s.turrets.len()).sum();
            println!(
                "{:?}陣営: {}隻 (砲塔 {}基)",
                fleet.team,
                fleet.ships.len(),
                total_turrets
            );
            for ship in &fleet.ships {
                match &ship.follow {
                    Some(follow_id) => {
                        println!("  {}: 砲塔{}基, {}に随伴", ship.id, ship.turrets.len(), follow_id)
                    }
                    None => println!("  {}: 砲塔{}基", ship.id, ship.turrets.len()),
                }
            }
        }
        println!("障害物: {}個", self.obstacles.len());
    }
}

/// シナリオ読み込みエラー
#[derive(Debug)]
pub enum ScenarioError {
    FileNotFound(std::path::PathBuf),
    IoError(std::path::PathBuf, std::io::Error),
    ParseError(std::path::PathBuf, serde_yaml::Error),
    ValidationError(String),
}

impl std::fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScenarioError::FileNotFound(path) => {
                write!(f, "シナリオファイルが見つかりません: {}", path.display())
            }
            ScenarioError::IoError(path, err) => {
                write!(f, "ファイル読み込みエラー {}: {}", path.display(), err)
            }
            ScenarioError::ParseError(path, err) => {
                write!(f, "YAML解析エラー {}: {}", path.display(), err)
            }
            ScenarioError::ValidationError(msg) => {
                write!(f, "設定検証エラー: {}", msg)
            }
        }
    }
}

impl std::error::Error for ScenarioError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_yaml(chase_range: f64, avoid_range: f64) -> String {
        format!(
            r#"
meta:
  version: "1.0"
  name: "test"
  description: "unit test scenario"
sim:
  dt_s: 0.1
  t_max_s: 60.0
  seed: 42
world:
  region_rect:
    xmin_m: -5000.0
    xmax_m: 5000.0
    ymin_m: -5000.0
    ymax_m: 5000.0
ai_defaults:
  chase_range_m: {chase_range}
  avoid_range_m: {avoid_range}
  attack_range_m: 450.0
  entity_avoidance: 0.35
  wander_period_min_s: 2.0
  wander_period_max_s: 6.0
  wander_angle_deg: 60.0
  leash_distance_m: 400.0
  projectile_react_time_s: 1.5
  melee_recover_delay_s: 0.3
  melee_max_avoid_dwell_s: 4.0
  chase_dwell_min_s: 3.0
  chase_dwell_max_s: 7.0
  avoid_dwell_min_s: 1.0
  avoid_dwell_max_s: 3.0
  use_global_force: true
turret_defaults:
  left_limit_deg: 45.0
  right_limit_deg: 45.0
  limit_traversal: true
  angular_speed_deg_s: 90.0
  muzzle_speed_mps: 600.0
  fire_cooldown_s: 1.2
  projectile_lifetime_s: 4.0
fleets:
  - team: blue
    ships:
      - id: B01
        pos: {{ x_m: -1000.0, y_m: 0.0 }}
        heading_deg: 0.0
        radius_m: 12.0
        max_speed_mps: 40.0
        turrets:
          - mount_angle_deg: 0.0
  - team: red
    ships:
      - id: R01
        pos: {{ x_m: 1000.0, y_m: 0.0 }}
        heading_deg: 180.0
        radius_m: 12.0
        max_speed_mps: 40.0
        turrets:
          - mount_angle_deg: 0.0
"#
        )
    }

    #[test]
    fn test_parse_and_validate_minimal_scenario() {
        let config: ScenarioConfig = serde_yaml::from_str(&minimal_yaml(900.0, 220.0)).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.fleets.len(), 2);
        assert_eq!(config.fleets[0].team, Team::Blue);
        assert!(config.obstacles.is_empty());
    }

    #[test]
    fn test_invalid_range_auto_corrected_not_rejected() {
        // chase <= avoid は検証エラーではなく構築時の自動補正対象
        let config: ScenarioConfig = serde_yaml::from_str(&minimal_yaml(100.0, 220.0)).unwrap();
        assert!(config.validate().is_ok());

        let mut params = config.ai_defaults.to_params();
        assert!(params.auto_correct("B01"));
        assert!(params.chase_range_m > params.avoid_range_m);
        assert!(params.chase_range_m > params.attack_range_m);
    }

    #[test]
    fn test_validation_rejects_bad_timing() {
        let mut config: ScenarioConfig =
            serde_yaml::from_str(&minimal_yaml(900.0, 220.0)).unwrap();
        config.sim.dt_s = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_duplicate_ids() {
        let mut config: ScenarioConfig =
            serde_yaml::from_str(&minimal_yaml(900.0, 220.0)).unwrap();
        config.fleets[1].ships[0].id = "B01".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_unknown_follow_target() {
        let mut config: ScenarioConfig =
            serde_yaml::from_str(&minimal_yaml(900.0, 220.0)).unwrap();
        config.fleets[0].ships[0].follow = Some("GHOST".to_string());
        assert!(config.validate().is_err());
    }
}
