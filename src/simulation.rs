//! # Simulation モジュール
//!
//! 艦隊戦シミュレーションの中核となるシミュレーションエンジンを提供します。
//!
//! 固定時間刻み（Δt）の協調的シングルスレッドループで、各艦の意思決定
//! （戦術状態機械 → 操舵合成 → 照準更新）を毎ティック同期的に実行します。
//! エージェント間の並列処理は行いません。共有レジストリ上の競合を
//! 避けるための意図的な設計です。
//!
//! ## ティック内の処理順序
//!
//! 1. **スナップショット取得**: 世界状態の防御的コピー
//! 2. **遅延イベント発火**: スケジューラ上の予約済みイベントを処理
//! 3. **艦の意思決定**: 戦術更新 → 操舵合成 → 砲塔照準（艦ごとに同期実行）
//! 4. **ムーバー**: 移動意図から速度・位置を積分（外部協調系の簡易代替）
//! 5. **弾体処理**: 直進・寿命・簡易命中判定
//! 6. **後始末**: 撃破艦の保留イベント破棄と除去
//!
//! ## 使用例
//!
//! ```rust
//! use shipsim::scenario::ScenarioConfig;
//! use shipsim::simulation::SimulationEngine;
//!
//! let config = ScenarioConfig::from_file("scenarios/skirmish_basic.yaml")?;
//! let mut engine = SimulationEngine::new(config, 1); // verbose_level=1
//! engine.initialize()?;
//! engine.run()?;
//! ```

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, trace};

use crate::models::common::{AgentStatus, Team, Vec2};
use crate::models::obstacle::Obstacle;
use crate::models::projectile::Projectile;
use crate::models::ship::Ship;
use crate::models::steering::{self, compose_steering};
use crate::models::tactics::{self, update_tactics};
use crate::models::traits::IAgent;
use crate::models::turret::Turret;
use crate::scenario::ScenarioConfig;
use crate::scheduler::{DeferredAction, TickScheduler};
use crate::world::WorldSnapshot;

/// ムーバーの一次遅れ時定数（秒）：意図速度への漸近の速さ
const MOVER_RESPONSE_S: f64 = 1.0;

/// 暴走防止のステップ数上限
const MAX_STEPS: u64 = 1_000_000;

pub struct SimulationEngine {
    pub current_time: f64,
    pub dt: f64,
    pub max_time: f64,
    pub seed: u64,
    pub step_count: u64,

    pub ships: Vec<Ship>,
    pub projectiles: Vec<Projectile>,
    pub obstacles: Vec<Obstacle>,

    pub scheduler: TickScheduler,
    pub rng: ChaCha8Rng,

    pub scenario_config: ScenarioConfig,
    pub verbose_level: u8,

    projectile_counter: u64,
}

impl SimulationEngine {
    pub fn new(scenario: ScenarioConfig, verbose_level: u8) -> Self {
        let dt = scenario.sim.dt_s;
        let max_time = scenario.sim.t_max_s;
        let seed = scenario.sim.seed;

        Self {
            current_time: 0.0,
            dt,
            max_time,
            seed,
            step_count: 0,
            ships: Vec::new(),
            projectiles: Vec::new(),
            obstacles: Vec::new(),
            scheduler: TickScheduler::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            scenario_config: scenario,
            verbose_level,
            projectile_counter: 0,
        }
    }

    pub fn initialize(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if self.verbose_level > 0 {
            info!("シミュレーションエンジンを初期化中...");
        }

        self.initialize_fleets();
        self.initialize_obstacles();

        if self.verbose_level > 0 {
            info!("初期化完了:");
            for team in [Team::Blue, Team::Red] {
                let count = self.ships.iter().filter(|s| s.team == team).count();
                info!("  {:?}陣営: {}隻", team, count);
            }
            info!("  障害物: {}個", self.obstacles.len());
        }

        Ok(())
    }

    fn initialize_fleets(&mut self) {
        let turret_defaults = &self.scenario_config.turret_defaults;

        for fleet in &self.scenario_config.fleets {
            for ship_config in &fleet.ships {
                let turrets: Vec<Turret> = ship_config
                    .turrets
                    .iter()
                    .enumerate()
                    .map(|(index, turret_config)| {
                        Turret::new(
                            index,
                            turret_config.mount_angle_deg,
                            turret_defaults.left_limit_deg,
                            turret_defaults.right_limit_deg,
                            turret_defaults.limit_traversal,
                            turret_defaults.angular_speed_deg_s,
                            turret_defaults.muzzle_speed_mps,
                            turret_defaults.fire_cooldown_s,
                        )
                    })
                    .collect();

                let mut ship = Ship::new(
                    ship_config.id.clone(),
                    fleet.team,
                    Vec2::new(ship_config.pos.x_m, ship_config.pos.y_m),
                    ship_config.heading_deg,
                    ship_config.radius_m,
                    ship_config.max_speed_mps,
                    self.scenario_config.ai_defaults.to_params(),
                    turrets,
                );
                ship.follow_target = ship_config.follow.clone();
                ship.use_global_force = self.scenario_config.ai_defaults.use_global_force;

                // 徘徊再抽選の連鎖を起動（以後はイベント発火時に次回を予約）
                let first_delay = steering::next_wander_delay(&ship, &mut self.rng);
                self.scheduler.schedule(
                    first_delay,
                    DeferredAction::WanderReroll {
                        ship_id: ship.id.clone(),
                    },
                );

                if self.verbose_level > 1 {
                    debug!(
                        "艦初期化: {} ({:?}陣営, 砲塔{}基)",
                        ship.id,
                        ship.team,
                        ship.turrets.len()
                    );
                }

                self.ships.push(ship);
            }
        }
    }

    fn initialize_obstacles(&mut self) {
        for obstacle_config in &self.scenario_config.obstacles {
            self.obstacles.push(Obstacle::new(
                obstacle_config.id.clone(),
                Vec2::new(obstacle_config.pos.x_m, obstacle_config.pos.y_m),
                obstacle_config.radius_m,
            ));
        }
    }

    pub fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        info!("=== シミュレーション実行開始 ===");

        while self.current_time < self.max_time {
            self.step();

            if self.verbose_level > 2 {
                trace!(
                    "時刻: {:.1}秒 (ステップ: {}, 残存艦: {})",
                    self.current_time,
                    self.step_count,
                    self.ships.len()
                );
            }

            if self.step_count % 100 == 0 && self.verbose_level > 0 {
                let progress = (self.current_time / self.max_time) * 100.0;
                info!(
                    "進行状況: {:.1}% ({:.1}/{:.1}秒, 残存艦: {}, 飛翔弾: {})",
                    progress,
                    self.current_time,
                    self.max_time,
                    self.ships.len(),
                    self.projectiles.len()
                );
            }

            if self.step_count > MAX_STEPS {
                break;
            }
        }

        info!("=== シミュレーション完了 ===");
        info!("実行時間: {:.1}秒", self.current_time);
        info!("総ステップ数: {}", self.step_count);
        for team in [Team::Blue, Team::Red] {
            let count = self.ships.iter().filter(|s| s.team == team).count();
            info!("  {:?}陣営 残存: {}隻", team, count);
        }

        Ok(())
    }

    fn step(&mut self) {
        let snapshot = WorldSnapshot::capture(&self.ships, &self.projectiles, &self.obstacles);

        self.dispatch_due_events();
        self.process_ships(&snapshot);
        self.apply_movement();
        self.process_projectiles();
        self.cleanup_destroyed();

        self.current_time += self.dt;
        self.step_count += 1;
    }

    /// 発火時刻に達した遅延イベントの処理
    ///
    /// 消滅済みの艦宛てのイベントは（破棄漏れがあっても）単に読み捨てます。
    fn dispatch_due_events(&mut self) {
        let due = self.scheduler.pop_due(self.current_time);
        let now = self.current_time;

        for event in due {
            match event.action {
                DeferredAction::PostureShift { ship_id, to } => {
                    if let Some(ship) = self
                        .ships
                        .iter_mut()
                        .find(|s| s.id == ship_id && s.is_active())
                    {
                        // 予約済み遷移の実行。pendingのクリアは実行時のみ
                        ship.tactics.transition_pending = false;
                        tactics::execute_posture_shift(ship, to, now);
                    }
                }
                DeferredAction::WanderReroll { ship_id } => {
                    if let Some(ship) = self
                        .ships
                        .iter_mut()
                        .find(|s| s.id == ship_id && s.is_active())
                    {
                        steering::reroll_wander_heading(ship, &mut self.rng);
                        let delay = steering::next_wander_delay(ship, &mut self.rng);
                        self.scheduler.schedule(
                            now + delay,
                            DeferredAction::WanderReroll {
                                ship_id: ship.id.clone(),
                            },
                        );
                    }
                }
                DeferredAction::IdleScanReroll {
                    ship_id,
                    turret_index,
                } => {
                    if let Some(ship) = self
                        .ships
                        .iter_mut()
                        .find(|s| s.id == ship_id && s.is_active())
                    {
                        let id = ship.id.clone();
                        if let Some(turret) = ship.turrets.get_mut(turret_index) {
                            turret.reroll_idle_bearing(&id, &mut self.rng);
                        }
                    }
                }
            }
        }
    }

    /// 各艦の意思決定（戦術更新 → 操舵合成 → 砲塔照準）
    fn process_ships(&mut self, snapshot: &WorldSnapshot) {
        let now = self.current_time;
        let dt = self.dt;
        let projectile_lifetime = self.scenario_config.turret_defaults.projectile_lifetime_s;
        let mut fired: Vec<Projectile> = Vec::new();

        for ship in self.ships.iter_mut() {
            if !ship.is_active() {
                continue;
            }

            let enemy = snapshot.closest_enemy(ship.position, ship.team);

            update_tactics(ship, enemy, now, &mut self.scheduler, &mut self.rng);

            let intent = compose_steering(ship, enemy, snapshot);
            ship.set_movement_intent(intent);

            // 砲塔の視認目標：追跡範囲内の最近傍敵のみ
            let turret_target = enemy
                .filter(|e| e.position.distance(&ship.position) <= ship.params.chase_range_m);

            let ship_id = ship.id.clone();
            let ship_pos = ship.position;
            let ship_heading = ship.heading;
            let ship_radius = ship.radius;
            let ship_team = ship.team;
            let attack_range = ship.params.attack_range_m;

            for turret in ship.turrets.iter_mut() {
                let update = turret.update_aim(
                    &ship_id,
                    ship_pos,
                    ship_heading,
                    turret_target,
                    now,
                    dt,
                    &mut self.scheduler,
                    &mut self.rng,
                );

                // 簡易トリガー（本来は外部の火器管制が担う）：
                // 照準一致かつ攻撃範囲内ならクールダウン明けに発射
                if update.on_target && turret.ready_to_fire() {
                    if let Some(target) = turret_target {
                        if target.position.distance(&ship_pos) <= attack_range {
                            turret.cooldown_remaining_s = turret.fire_cooldown_s;
                            self.projectile_counter += 1;
                            let projectile_id =
                                format!("{}_P{:04}", ship_id, self.projectile_counter);
                            let direction =
                                Vec2::from_angle_deg(turret.world_aim_deg(ship_heading));
                            let muzzle_pos = ship_pos + direction * (ship_radius + 1.0);

                            debug!(
                                ship_id = %ship_id,
                                turret_index = turret.index,
                                projectile_id = %projectile_id,
                                target_id = %target.id,
                                "PROJECTILE_FIRED: 砲塔が発射しました"
                            );

                            fired.push(Projectile::new(
                                projectile_id,
                                ship_team,
                                muzzle_pos,
                                direction * turret.muzzle_speed_mps,
                                projectile_lifetime,
                            ));
                        }
                    }
                }
            }
        }

        self.projectiles.extend(fired);
    }

    /// 外部ムーバーの簡易代替：移動意図から速度・位置を積分
    fn apply_movement(&mut self) {
        let region = &self.scenario_config.world.region_rect;
        let blend = (self.dt / MOVER_RESPONSE_S).min(1.0);

        for ship in self.ships.iter_mut() {
            if !ship.is_active() {
                continue;
            }

            let world_intent = if ship.use_global_force {
                ship.movement_intent
            } else {
                ship.movement_intent.rotate_deg(ship.heading)
            };
            let desired_velocity = world_intent.clamp_magnitude(1.0) * ship.max_speed;

            ship.velocity = ship.velocity + (desired_velocity - ship.velocity) * blend;
            ship.position = ship.position + ship.velocity * self.dt;

            if ship.velocity.magnitude() > 1e-6 {
                ship.heading = ship.velocity.angle_deg();
            }

            ship.position.x = ship.position.x.clamp(region.xmin_m, region.xmax_m);
            ship.position.y = ship.position.y.clamp(region.ymin_m, region.ymax_m);
        }
    }

    /// 弾体の運動・寿命・簡易命中判定
    ///
    /// 命中時の被害処理は簡易版：砲塔1基の喪失通知、全砲塔喪失後の
    /// 被弾で撃破。本格的なダメージ解決は外部協調系の責務です。
    fn process_projectiles(&mut self) {
        let dt = self.dt;

        for projectile in self.projectiles.iter_mut() {
            if !projectile.is_active() {
                continue;
            }

            projectile.tick(dt);
            if !projectile.is_active() {
                continue;
            }

            for ship in self.ships.iter_mut() {
                if !ship.is_active() || !projectile.team.is_enemy(ship.team) {
                    continue;
                }
                if projectile.position.distance(&ship.position) <= ship.radius {
                    info!(
                        projectile_id = %projectile.id,
                        ship_id = %ship.id,
                        gun_count = ship.gun_count,
                        "PROJECTILE_HIT: 弾体が命中しました"
                    );

                    if ship.gun_count == 0 {
                        ship.destroy();
                    } else {
                        ship.notify_gun_destroyed();
                    }
                    projectile.mark_spent();
                    break;
                }
            }
        }
    }

    /// 撃破・消滅したエージェントの除去と保留イベントの破棄
    fn cleanup_destroyed(&mut self) {
        let destroyed: Vec<String> = self
            .ships
            .iter()
            .filter(|s| s.status == AgentStatus::Destroyed)
            .map(|s| s.id.clone())
            .collect();

        for ship_id in destroyed {
            let cancelled = self.scheduler.cancel_for_ship(&ship_id);
            info!(
                ship_id = %ship_id,
                cancelled_events = cancelled,
                time = self.current_time,
                "SHIP_DESTROYED: 艦が撃破されました"
            );
        }

        self.ships.retain(|s| s.is_active());
        self.projectiles.retain(|p| p.is_active());
    }
}
