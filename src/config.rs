// 该文件是 Xunse （寻色） 项目的一部分。
// src/config.rs - 标定与决策参数
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

//! # 参数配置
//!
//! 所有标定常量、颜色阈值与决策参数集中在 [`SteeringConfig`] 中，
//! 启动时加载一次，之后只读地传入每个处理阶段。
//!
//! JSON 文件中缺省的字段（包括 `intrinsics` 内的单个字段）使用参考配置补齐，
//! 颜色配置 `blue`/`red` 则需整体给出：
//!
//! ```json
//! {
//!   "intrinsics": { "fx": 1430.0, "fy": 1450.0, "cx": 635.0, "cy": 60.0 },
//!   "max_effective_distance_mm": 800.0
//! }
//! ```
//!
//! HSV 采用 8 位约定：H ∈ [0, 180)，S、V ∈ [0, 255]。

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::model::TargetColor;

/// HSV 色相上限（不含）
pub const HUE_LIMIT: u8 = 180;

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("配置文件读取错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("配置文件解析错误: {0}")]
  ParseError(#[from] serde_json::Error),
  #[error("配置无效: {0}")]
  Invalid(String),
}

impl ConfigError {
  fn invalid(msg: impl Into<String>) -> Self {
    ConfigError::Invalid(msg.into())
  }
}

/// 闭区间 HSV 阈值，`[h, s, v]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
  pub lower: [u8; 3],
  pub upper: [u8; 3],
}

impl HsvRange {
  pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
    Self { lower, upper }
  }

  pub fn contains(&self, hsv: [u8; 3]) -> bool {
    hsv
      .iter()
      .zip(self.lower.iter().zip(self.upper.iter()))
      .all(|(value, (lo, hi))| lo <= value && value <= hi)
  }
}

/// 针孔相机内参（像素）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraIntrinsics {
  pub fx: f64,
  pub fy: f64,
  pub cx: f64,
  pub cy: f64,
}

impl Default for CameraIntrinsics {
  fn default() -> Self {
    Self {
      fx: 1430.0,
      fy: 1450.0,
      cx: 635.0,
      cy: 60.0,
    }
  }
}

/// 单个目标颜色的阈值集合与转向偏置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorProfile {
  /// 任意一个区间命中即视为该颜色
  pub ranges: Vec<HsvRange>,
  /// 叠加到方位角上的固定偏置（度）
  pub adjust_deg: f64,
}

impl ColorProfile {
  /// 参考配置中的“蓝色”，色相覆盖 40-100（青绿到天蓝）
  pub fn reference_blue() -> Self {
    Self {
      ranges: vec![
        HsvRange::new([40, 100, 100], [70, 255, 255]),
        HsvRange::new([70, 100, 100], [100, 255, 255]),
      ],
      adjust_deg: -20.0,
    }
  }

  /// 参考配置中的红色，跨越色相环的两端
  pub fn reference_red() -> Self {
    Self {
      ranges: vec![
        HsvRange::new([0, 100, 100], [10, 255, 255]),
        HsvRange::new([160, 100, 100], [179, 255, 255]),
      ],
      adjust_deg: 20.0,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SteeringConfig {
  /// 目标物理高度（毫米）
  pub known_height_mm: f64,
  pub intrinsics: CameraIntrinsics,
  pub blue: ColorProfile,
  pub red: ColorProfile,
  /// 大于等于该距离的目标不参与决策
  pub max_effective_distance_mm: f64,
  /// 轮廓面积小于该值视为噪声（像素²）
  pub min_contour_area: f64,
  /// 形态学方形结构元边长，须为奇数
  pub morph_kernel_size: u8,
}

impl Default for SteeringConfig {
  fn default() -> Self {
    Self {
      known_height_mm: 100.0,
      intrinsics: CameraIntrinsics::default(),
      blue: ColorProfile::reference_blue(),
      red: ColorProfile::reference_red(),
      max_effective_distance_mm: 600.0,
      min_contour_area: 1000.0,
      morph_kernel_size: 5,
    }
  }
}

impl SteeringConfig {
  pub fn profile(&self, color: TargetColor) -> &ColorProfile {
    match color {
      TargetColor::Blue => &self.blue,
      TargetColor::Red => &self.red,
    }
  }

  pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
    let config: SteeringConfig = serde_json::from_str(text)?;
    config.validate()?;
    Ok(config)
  }

  pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    debug!("读取配置文件: {}", path.display());
    let text = std::fs::read_to_string(path)?;
    Self::from_json_str(&text)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    let CameraIntrinsics { fx, fy, cx, cy } = self.intrinsics;
    if !(fx.is_finite() && fx > 0.0 && fy.is_finite() && fy > 0.0) {
      return Err(ConfigError::invalid(format!(
        "焦距必须为正数: fx={}, fy={}",
        fx, fy
      )));
    }
    if !(cx.is_finite() && cy.is_finite()) {
      return Err(ConfigError::invalid("主点坐标必须为有限值"));
    }
    if !(self.known_height_mm.is_finite() && self.known_height_mm > 0.0) {
      return Err(ConfigError::invalid(format!(
        "目标物理高度必须为正数: {}",
        self.known_height_mm
      )));
    }
    if self.max_effective_distance_mm.is_nan() || self.max_effective_distance_mm <= 0.0 {
      return Err(ConfigError::invalid(format!(
        "最大有效距离必须为正数: {}",
        self.max_effective_distance_mm
      )));
    }
    if !(self.min_contour_area.is_finite() && self.min_contour_area >= 0.0) {
      return Err(ConfigError::invalid(format!(
        "最小轮廓面积不能为负: {}",
        self.min_contour_area
      )));
    }
    if self.morph_kernel_size == 0 || self.morph_kernel_size % 2 == 0 {
      return Err(ConfigError::invalid(format!(
        "结构元边长必须为正奇数: {}",
        self.morph_kernel_size
      )));
    }

    for color in TargetColor::ALL {
      let profile = self.profile(color);
      if profile.ranges.is_empty() {
        return Err(ConfigError::invalid(format!("{} 没有配置 HSV 区间", color)));
      }
      if !profile.adjust_deg.is_finite() {
        return Err(ConfigError::invalid(format!("{} 的转向偏置无效", color)));
      }
      for range in &profile.ranges {
        if range.lower[0] >= HUE_LIMIT || range.upper[0] >= HUE_LIMIT {
          return Err(ConfigError::invalid(format!(
            "{} 的色相超出范围 [0, {}): {:?}",
            color, HUE_LIMIT, range
          )));
        }
        if range.lower.iter().zip(range.upper.iter()).any(|(lo, hi)| lo > hi) {
          return Err(ConfigError::invalid(format!(
            "{} 的 HSV 区间上下界颠倒: {:?}",
            color, range
          )));
        }
      }
    }

    Ok(())
  }
}
