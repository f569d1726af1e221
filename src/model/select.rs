// 该文件是 Xunse （寻色） 项目的一部分。
// src/model/select.rs - 最近目标选择
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
use crate::model::geometry::estimate;
use crate::model::{Detection, PixelRect, TargetColor};

/// 对同一颜色的候选矩形逐一估计，取距离最小者
pub fn nearest_detection(
  config: &SteeringConfig,
  color: TargetColor,
  rects: impl IntoIterator<Item = PixelRect>,
) -> Option<Detection> {
  rects
    .into_iter()
    .map(|rect| estimate(config, color, rect))
    .min_by(|a, b| a.distance_mm.total_cmp(&b.distance_mm))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn rects() -> Vec<PixelRect> {
    vec![
      PixelRect::new(10, 10, 40, 100),
      PixelRect::new(300, 50, 40, 260),
      PixelRect::new(900, 20, 80, 0),
      PixelRect::new(500, 40, 40, 180),
    ]
  }

  #[test]
  fn empty_input_has_no_detection() {
    let config = SteeringConfig::default();
    assert!(nearest_detection(&config, TargetColor::Blue, Vec::new()).is_none());
  }

  #[test]
  fn picks_tallest_box() {
    let config = SteeringConfig::default();
    let nearest = nearest_detection(&config, TargetColor::Red, rects()).expect("detection");
    assert_eq!(nearest.rect, PixelRect::new(300, 50, 40, 260));
    assert_eq!(nearest.color, TargetColor::Red);
  }

  #[test]
  fn result_does_not_depend_on_order() {
    let config = SteeringConfig::default();
    let forward = nearest_detection(&config, TargetColor::Blue, rects());
    let backward = nearest_detection(&config, TargetColor::Blue, rects().into_iter().rev());
    assert_eq!(forward, backward);
  }

  #[test]
  fn zero_height_box_never_wins() {
    let config = SteeringConfig::default();
    let nearest = nearest_detection(
      &config,
      TargetColor::Blue,
      [PixelRect::new(0, 0, 10, 0), PixelRect::new(0, 0, 10, 1)],
    )
    .expect("detection");
    assert_eq!(nearest.rect.height, 1);
  }
}
