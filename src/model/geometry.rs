// 该文件是 Xunse （寻色） 项目的一部分。
// src/model/geometry.rs - 针孔模型距离与方位估计
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

use crate::config::{CameraIntrinsics, SteeringConfig};
use crate::model::{Detection, PixelRect, TargetColor, UNBOUNDED_DISTANCE_MM};

/// 相似三角形：`known_height_mm * fy / height_px`，高度不为正时返回哨兵值
pub fn distance_mm(height_px: f64, known_height_mm: f64, fy: f64) -> f64 {
  if height_px > 0.0 {
    known_height_mm * fy / height_px
  } else {
    UNBOUNDED_DISTANCE_MM
  }
}

/// 目标水平中心相对光轴的方位角（弧度），右侧为正
pub fn bearing_rad(center_x_px: f64, intrinsics: &CameraIntrinsics) -> f64 {
  ((center_x_px - intrinsics.cx) / intrinsics.fx).atan()
}

pub fn estimate(config: &SteeringConfig, color: TargetColor, rect: PixelRect) -> Detection {
  Detection {
    color,
    rect,
    distance_mm: distance_mm(
      rect.height as f64,
      config.known_height_mm,
      config.intrinsics.fy,
    ),
    angle_rad: bearing_rad(rect.center_x(), &config.intrinsics),
  }
}
