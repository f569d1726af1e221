// 该文件是 Xunse （寻色） 项目的一部分。
// src/model.rs - 检测与决策模型
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::fmt;

use serde::{Deserialize, Serialize};

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 高度无效时使用的距离哨兵值（毫米），比任何有效距离都远
pub const UNBOUNDED_DISTANCE_MM: f64 = 1e9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetColor {
  Blue,
  Red,
}

impl TargetColor {
  pub const ALL: [TargetColor; 2] = [TargetColor::Blue, TargetColor::Red];

  pub fn to_label_str(&self) -> &'static str {
    match self {
      TargetColor::Blue => "blue",
      TargetColor::Red => "red",
    }
  }
}

impl fmt::Display for TargetColor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.to_label_str())
  }
}

/// 像素坐标下的轴对齐外接矩形
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
  pub x: u32,
  pub y: u32,
  pub width: u32,
  pub height: u32,
}

impl PixelRect {
  pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
    Self {
      x,
      y,
      width,
      height,
    }
  }

  pub fn center_x(&self) -> f64 {
    self.x as f64 + self.width as f64 / 2.0
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Detection {
  pub color: TargetColor,
  pub rect: PixelRect,
  pub distance_mm: f64,
  pub angle_rad: f64,
}

impl Detection {
  pub fn angle_deg(&self) -> f64 {
    self.angle_rad.to_degrees()
  }
}

/// 单帧的检测与转向结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SteeringResult {
  pub blue: Option<Detection>,
  pub red: Option<Detection>,
  /// 转向角（整数度）
  pub steering_deg: i32,
}

impl SteeringResult {
  pub fn is_empty(&self) -> bool {
    self.blue.is_none() && self.red.is_none()
  }

  pub fn detection(&self, color: TargetColor) -> Option<&Detection> {
    match color {
      TargetColor::Blue => self.blue.as_ref(),
      TargetColor::Red => self.red.as_ref(),
    }
  }

  pub fn detections(&self) -> impl Iterator<Item = &Detection> {
    self.blue.iter().chain(self.red.iter())
  }
}

pub mod blob;
pub mod decision;
pub mod geometry;
pub mod segment;
pub mod select;

mod color_target;
pub use self::color_target::ColorTargetModel;
