//! # Scheduler モジュール
//!
//! シミュレーションクロック上で駆動されるワンショット遅延イベントキューを提供します。
//!
//! 徘徊方位の再抽選、戦術モードの遅延遷移、砲塔アイドルスキャンの再抽選など、
//! 時間差で発火する全ての処理はこのキューに登録されます。イベントは
//! 発火時刻と登録順で決定的に並ぶため、同一シードのシナリオは常に同じ
//! 結果を再現します。OSタイマーやスレッドは使用しません。
//!
//! ## 重複登録と破棄
//!
//! 同一目的のイベントが既に保留中の場合、呼び出し側は `transition_pending`
//! などのフラグで二重登録を抑止します。エージェントが撃破された場合は
//! `cancel_for_ship` で保留イベントを全て破棄し、消滅済みの状態への発火を
//! 防ぎます。

use tracing::trace;

use crate::models::tactics::MovementMode;

/// 遅延イベントの内容
#[derive(Debug, Clone, PartialEq)]
pub enum DeferredAction {
    /// 戦術移動モードの遅延遷移
    PostureShift { ship_id: String, to: MovementMode },
    /// 徘徊方位の再抽選
    WanderReroll { ship_id: String },
    /// 砲塔アイドルスキャン方位の再抽選
    IdleScanReroll { ship_id: String, turret_index: usize },
}

impl DeferredAction {
    /// イベントが属する艦のID
    pub fn ship_id(&self) -> &str {
        match self {
            DeferredAction::PostureShift { ship_id, .. } => ship_id,
            DeferredAction::WanderReroll { ship_id } => ship_id,
            DeferredAction::IdleScanReroll { ship_id, .. } => ship_id,
        }
    }
}

/// 登録済みの遅延イベント
#[derive(Debug, Clone)]
pub struct DeferredEvent {
    /// 発火予定時刻（シミュレーション秒）
    pub fire_time: f64,
    /// 登録順序（同時刻イベントのタイブレーカー）
    pub seq: u64,
    /// イベント内容
    pub action: DeferredAction,
}

/// ティッククロック駆動の遅延イベントキュー
#[derive(Debug, Default)]
pub struct TickScheduler {
    events: Vec<DeferredEvent>,
    next_seq: u64,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            next_seq: 0,
        }
    }

    /// イベントを登録
    ///
    /// # 引数
    ///
    /// * `fire_time` - 発火予定時刻（シミュレーション秒）
    /// * `action` - 発火時に実行するイベント内容
    pub fn schedule(&mut self, fire_time: f64, action: DeferredAction) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.events.push(DeferredEvent {
            fire_time,
            seq,
            action,
        });
    }

    /// 発火時刻に達したイベントを取り出す
    ///
    /// 現在時刻以前に発火予定のイベントを（発火時刻、登録順）の順で
    /// 返し、キューから取り除きます。
    pub fn pop_due(&mut self, now: f64) -> Vec<DeferredEvent> {
        let mut due: Vec<DeferredEvent> = Vec::new();
        let mut remaining: Vec<DeferredEvent> = Vec::new();

        for event in self.events.drain(..) {
            if event.fire_time <= now {
                due.push(event);
            } else {
                remaining.push(event);
            }
        }

        self.events = remaining;
        due.sort_by(|a, b| {
            a.fire_time
                .partial_cmp(&b.fire_time)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.seq.cmp(&b.seq))
        });
        due
    }

    /// 指定艦の保留イベントを全て破棄（撃破時に使用）
    ///
    /// # 戻り値
    ///
    /// 破棄したイベント数
    pub fn cancel_for_ship(&mut self, ship_id: &str) -> usize {
        let before = self.events.len();
        self.events.retain(|e| e.action.ship_id() != ship_id);
        let cancelled = before - self.events.len();
        if cancelled > 0 {
            trace!(
                ship_id = %ship_id,
                cancelled_events = cancelled,
                "SCHEDULER_CANCEL: 撃破された艦の保留イベントを破棄しました"
            );
        }
        cancelled
    }

    /// 指定艦の保留中の戦術遷移イベントのみ破棄
    ///
    /// 近接回避モードを距離条件で早期離脱する際、保留中の復帰遷移を
    /// 無効化するために使用します。
    pub fn cancel_posture_shift(&mut self, ship_id: &str) -> bool {
        let before = self.events.len();
        self.events.retain(|e| {
            !matches!(&e.action, DeferredAction::PostureShift { ship_id: id, .. } if id == ship_id)
        });
        before != self.events.len()
    }

    /// 保留中のイベント数
    pub fn pending_count(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_due_in_time_then_insertion_order() {
        let mut scheduler = TickScheduler::new();
        scheduler.schedule(
            2.0,
            DeferredAction::WanderReroll {
                ship_id: "B01".to_string(),
            },
        );
        scheduler.schedule(
            1.0,
            DeferredAction::WanderReroll {
                ship_id: "B02".to_string(),
            },
        );
        scheduler.schedule(
            1.0,
            DeferredAction::WanderReroll {
                ship_id: "B03".to_string(),
            },
        );

        let due = scheduler.pop_due(1.5);
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].action.ship_id(), "B02");
        assert_eq!(due[1].action.ship_id(), "B03");
        assert_eq!(scheduler.pending_count(), 1);

        let rest = scheduler.pop_due(10.0);
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].action.ship_id(), "B01");
    }

    #[test]
    fn test_cancel_for_ship_removes_all_events() {
        let mut scheduler = TickScheduler::new();
        scheduler.schedule(
            1.0,
            DeferredAction::WanderReroll {
                ship_id: "R01".to_string(),
            },
        );
        scheduler.schedule(
            2.0,
            DeferredAction::PostureShift {
                ship_id: "R01".to_string(),
                to: MovementMode::Chasing,
            },
        );
        scheduler.schedule(
            3.0,
            DeferredAction::IdleScanReroll {
                ship_id: "B01".to_string(),
                turret_index: 0,
            },
        );

        assert_eq!(scheduler.cancel_for_ship("R01"), 2);
        assert_eq!(scheduler.pending_count(), 1);
        assert_eq!(scheduler.pop_due(5.0)[0].action.ship_id(), "B01");
    }

    #[test]
    fn test_cancel_posture_shift_leaves_other_events() {
        let mut scheduler = TickScheduler::new();
        scheduler.schedule(
            1.0,
            DeferredAction::PostureShift {
                ship_id: "B01".to_string(),
                to: MovementMode::Avoiding,
            },
        );
        scheduler.schedule(
            1.0,
            DeferredAction::WanderReroll {
                ship_id: "B01".to_string(),
            },
        );

        assert!(scheduler.cancel_posture_shift("B01"));
        assert_eq!(scheduler.pending_count(), 1);
        assert!(!scheduler.cancel_posture_shift("B01"));
    }
}
