// 该文件是 Xunse （寻色） 项目的一部分。
// src/model/color_target.rs - 颜色目标检测与转向模型
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

use std::convert::Infallible;

use image::RgbImage;
use tracing::debug;

use crate::{
  config::{ConfigError, SteeringConfig},
  frame::Frame,
  model::{
    Detection, Model, SteeringResult, TargetColor,
    blob::extract_blobs,
    decision::decide_steering,
    segment::{HsvImage, build_mask, to_hsv},
    select::nearest_detection,
  },
};

/// 分割 → 轮廓过滤 → 最近目标 → 优先级决策，每帧独立求值
#[derive(Debug, Clone)]
pub struct ColorTargetModel {
  config: SteeringConfig,
}

impl ColorTargetModel {
  pub fn new(config: SteeringConfig) -> Result<Self, ConfigError> {
    config.validate()?;
    Ok(Self { config })
  }

  pub fn detect_color(&self, hsv: &HsvImage, color: TargetColor) -> Option<Detection> {
    let profile = self.config.profile(color);
    let mask = build_mask(hsv, &profile.ranges, self.config.morph_kernel_size);
    let blobs = extract_blobs(&mask, self.config.min_contour_area);
    let nearest = nearest_detection(&self.config, color, blobs.iter().map(|b| b.rect));
    if let Some(d) = &nearest {
      debug!(
        "{}: {} 个候选，最近 {:.1}mm / {:.1}deg @ {:?}",
        color,
        blobs.len(),
        d.distance_mm,
        d.angle_deg(),
        d.rect
      );
    }
    nearest
  }

  pub fn evaluate(&self, image: &RgbImage) -> SteeringResult {
    let hsv = to_hsv(image);
    let blue = self.detect_color(&hsv, TargetColor::Blue);
    let red = self.detect_color(&hsv, TargetColor::Red);
    let steering_deg = decide_steering(&self.config, blue.as_ref(), red.as_ref());
    SteeringResult {
      blue,
      red,
      steering_deg,
    }
  }
}

impl Default for ColorTargetModel {
  fn default() -> Self {
    Self {
      config: SteeringConfig::default(),
    }
  }
}

impl Model for ColorTargetModel {
  type Input = Frame;
  type Output = SteeringResult;
  type Error = Infallible;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    Ok(self.evaluate(&input.image))
  }
}
