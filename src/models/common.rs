use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// 2次元ベクトル（位置・速度・操舵力を共通で表現）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec2 {
    pub x: f64, // m / m/s / 無次元（用途による）
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// 角度（度）から単位ベクトルを生成
    pub fn from_angle_deg(angle_deg: f64) -> Self {
        let rad = math_utils::deg_to_rad(angle_deg);
        Self::new(rad.cos(), rad.sin())
    }

    /// ベクトルの長さ
    pub fn magnitude(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2)).sqrt()
    }

    /// 2点間の距離
    pub fn distance(&self, other: &Vec2) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// 内積
    pub fn dot(&self, other: &Vec2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// ベクトルを正規化（長さゼロの場合はゼロベクトルを返す）
    pub fn normalize(&self) -> Self {
        let mag = self.magnitude();
        if mag > 1e-12 {
            Self::new(self.x / mag, self.y / mag)
        } else {
            Self::ZERO
        }
    }

    /// 長さの上限でクリップ
    pub fn clamp_magnitude(&self, max_length: f64) -> Self {
        let mag = self.magnitude();
        if mag > max_length && mag > 0.0 {
            let factor = max_length / mag;
            Self::new(self.x * factor, self.y * factor)
        } else {
            *self
        }
    }

    /// X軸正方向を0度とした方位角（度、-180〜180）
    pub fn angle_deg(&self) -> f64 {
        math_utils::rad_to_deg(self.y.atan2(self.x))
    }

    /// 左90度方向の垂直ベクトル
    pub fn perpendicular(&self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// 指定角度（度）だけ回転
    pub fn rotate_deg(&self, angle_deg: f64) -> Self {
        let rad = math_utils::deg_to_rad(angle_deg);
        let (sin, cos) = rad.sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar)
    }
}

impl Neg for Vec2 {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y)
    }
}

/// 陣営を表す列挙型
///
/// 陣営間の敵味方関係の問い合わせに使用します。中立は障害物など
/// どの陣営にも属さないエンティティに割り当てられます。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Blue,
    Red,
    Neutral,
}

impl Team {
    /// 同一陣営かどうか（中立同士は味方扱いしない）
    pub fn is_ally(&self, other: Team) -> bool {
        *self != Team::Neutral && *self == other
    }

    /// 敵対陣営かどうか
    pub fn is_enemy(&self, other: Team) -> bool {
        *self != Team::Neutral && other != Team::Neutral && *self != other
    }

    /// 中立かどうか
    pub fn is_neutral(&self) -> bool {
        *self == Team::Neutral
    }
}

/// エージェントの状態を表す列挙型
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AgentStatus {
    Active,    // アクティブ
    Destroyed, // 撃破
    Expired,   // 寿命切れ（弾体の場合）
    Inactive,  // 非アクティブ
}

/// 数学ユーティリティ関数
pub mod math_utils {
    /// 度をラジアンに変換
    pub fn deg_to_rad(degrees: f64) -> f64 {
        degrees * std::f64::consts::PI / 180.0
    }

    /// ラジアンを度に変換
    pub fn rad_to_deg(radians: f64) -> f64 {
        radians * 180.0 / std::f64::consts::PI
    }

    /// 角度を-180度〜180度の範囲に正規化
    pub fn normalize_angle(angle_deg: f64) -> f64 {
        let mut normalized = angle_deg % 360.0;
        if normalized > 180.0 {
            normalized -= 360.0;
        } else if normalized <= -180.0 {
            normalized += 360.0;
        }
        normalized
    }

    /// 2つの角度の差を計算（-180度〜180度の範囲）
    pub fn angle_difference(angle1_deg: f64, angle2_deg: f64) -> f64 {
        normalize_angle(angle2_deg - angle1_deg)
    }
}
