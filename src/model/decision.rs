// 该文件是 Xunse （寻色） 项目的一部分。
// src/model/decision.rs - 优先级转向决策
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

use crate::config::SteeringConfig;
use crate::model::Detection;

/// 按固定顺序求转向角（整数度，向零截断）：
///
/// 1. 默认 0；
/// 2. 蓝色在有效距离内时取 `蓝色方位 + 蓝色偏置`；
/// 3. 红色在有效距离内，且没有蓝色或红色不比蓝色远时，覆盖为 `红色方位 + 红色偏置`。
///
/// 距离相等时红色优先。
pub fn decide_steering(
  config: &SteeringConfig,
  blue: Option<&Detection>,
  red: Option<&Detection>,
) -> i32 {
  let in_range = |d: &Detection| d.distance_mm < config.max_effective_distance_mm;

  let mut candidate = 0.0;

  if let Some(blue) = blue.filter(|d| in_range(d)) {
    candidate = blue.angle_deg() + config.blue.adjust_deg;
  }

  if let Some(red) = red.filter(|d| in_range(d))
    && blue.is_none_or(|blue| red.distance_mm <= blue.distance_mm)
  {
    candidate = red.angle_deg() + config.red.adjust_deg;
  }

  candidate.trunc() as i32
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{PixelRect, TargetColor, UNBOUNDED_DISTANCE_MM};

  fn detection(color: TargetColor, distance_mm: f64, angle_rad: f64) -> Detection {
    Detection {
      color,
      rect: PixelRect::new(0, 0, 10, 10),
      distance_mm,
      angle_rad,
    }
  }

  #[test]
  fn nothing_detected_means_straight() {
    let config = SteeringConfig::default();
    assert_eq!(decide_steering(&config, None, None), 0);
  }

  #[test]
  fn far_targets_are_ignored() {
    let config = SteeringConfig::default();
    let blue = detection(TargetColor::Blue, 600.0, 0.3);
    let red = detection(TargetColor::Red, 900.0, -0.3);
    assert_eq!(decide_steering(&config, Some(&blue), Some(&red)), 0);
  }

  #[test]
  fn blue_alone_uses_blue_offset() {
    let config = SteeringConfig::default();
    let blue = detection(TargetColor::Blue, 300.0, 0.1);
    // 5.73 - 20 = -14.27
    assert_eq!(decide_steering(&config, Some(&blue), None), -14);
  }

  #[test]
  fn nearer_red_overrides_blue() {
    let config = SteeringConfig::default();
    let blue = detection(TargetColor::Blue, 300.0, 0.1);
    let red = detection(TargetColor::Red, 200.0, -0.2);
    // -11.46 + 20 = 8.54
    assert_eq!(decide_steering(&config, Some(&blue), Some(&red)), 8);
  }

  #[test]
  fn farther_red_keeps_blue() {
    let config = SteeringConfig::default();
    let blue = detection(TargetColor::Blue, 200.0, 0.1);
    let red = detection(TargetColor::Red, 300.0, -0.2);
    assert_eq!(decide_steering(&config, Some(&blue), Some(&red)), -14);
  }

  #[test]
  fn exact_tie_favors_red() {
    let config = SteeringConfig::default();
    let blue = detection(TargetColor::Blue, 400.0, 0.0);
    let red = detection(TargetColor::Red, 400.0, 0.0);
    assert_eq!(decide_steering(&config, Some(&blue), Some(&red)), 20);
  }

  #[test]
  fn red_alone_uses_red_offset() {
    let config = SteeringConfig::default();
    let red = detection(TargetColor::Red, 100.0, 0.0);
    assert_eq!(decide_steering(&config, None, Some(&red)), 20);
  }

  #[test]
  fn out_of_range_blue_yields_to_red() {
    let config = SteeringConfig {
      max_effective_distance_mm: 500.0,
      ..SteeringConfig::default()
    };
    let blue = detection(TargetColor::Blue, UNBOUNDED_DISTANCE_MM, 0.0);
    let red = detection(TargetColor::Red, 450.0, 0.0);
    assert_eq!(decide_steering(&config, Some(&blue), Some(&red)), 20);
  }

  #[test]
  fn truncates_toward_zero() {
    let config = SteeringConfig::default();
    // 约 -19.43 + 20 = 0.57
    let red = detection(TargetColor::Red, 100.0, (-19.43f64).to_radians());
    assert_eq!(decide_steering(&config, None, Some(&red)), 0);
    // 约 -0.57 - 20 = -20.57
    let blue = detection(TargetColor::Blue, 100.0, (-0.57f64).to_radians());
    assert_eq!(decide_steering(&config, Some(&blue), None), -20);
  }
}
