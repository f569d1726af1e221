// 该文件是 Xunse （寻色） 项目的一部分。
// src/output/draw.rs - 检测结果与转向角可视化
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

use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
  frame::Frame,
  model::{Detection, SteeringResult, TargetColor},
  query_value,
};

// 文本渲染常量
const LABEL_FONT_SIZE: f32 = 18.0;
const DISTANCE_LABEL_OFFSET: i32 = 25;
const ANGLE_LABEL_OFFSET: i32 = 8;
const BOX_THICKNESS: u32 = 2;
const MANGLE_POSITION: (i32, i32) = (10, 25);
const MANGLE_COLOR: [u8; 3] = [0, 255, 0];

#[derive(Error, Debug)]
pub enum DrawError {
  #[error("字体读取错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("字体无效: {0}")]
  InvalidFont(String),
}

pub fn box_color(color: TargetColor) -> Rgb<u8> {
  match color {
    TargetColor::Blue => Rgb([0, 0, 255]),
    TargetColor::Red => Rgb([255, 0, 0]),
  }
}

pub trait ToRgbImage {
  fn to_rgb_image(&self) -> RgbImage;
}

impl ToRgbImage for Frame {
  fn to_rgb_image(&self) -> RgbImage {
    self.image.clone()
  }
}

/// 边框总是绘制；文字需要通过 `font` 参数提供 TTF 字体
pub struct Draw {
  font: Option<FontVec>,
  font_size: f32,
}

impl Default for Draw {
  fn default() -> Self {
    Self {
      font: None,
      font_size: LABEL_FONT_SIZE,
    }
  }
}

impl Draw {
  pub fn with_font_file(path: impl AsRef<Path>) -> Result<Self, DrawError> {
    let path = path.as_ref();
    let data = std::fs::read(path)?;
    let font = FontVec::try_from_vec(data)
      .map_err(|_| DrawError::InvalidFont(path.display().to_string()))?;
    info!("加载字体: {}", path.display());
    Ok(Self {
      font: Some(font),
      ..Self::default()
    })
  }

  /// 读取 URL 中的 `font` 查询参数
  pub fn from_url(url: &Url) -> Result<Self, DrawError> {
    match query_value(url, "font") {
      Some(path) => Self::with_font_file(path),
      None => Ok(Self::default()),
    }
  }

  pub fn draw_result<F: ToRgbImage>(&self, frame: &F, result: &SteeringResult) -> RgbImage {
    let mut image = frame.to_rgb_image();
    self.annotate(&mut image, result);
    image
  }

  pub fn annotate(&self, image: &mut RgbImage, result: &SteeringResult) {
    for detection in result.detections() {
      self.draw_detection(image, detection);
    }
    let (x, y) = MANGLE_POSITION;
    self.draw_label(
      image,
      x,
      y,
      &format!("mangle {}", result.steering_deg),
      Rgb(MANGLE_COLOR),
    );
  }

  fn draw_detection(&self, image: &mut RgbImage, detection: &Detection) {
    let color = box_color(detection.color);
    let rect = detection.rect;
    let (x, y) = (rect.x as i32, rect.y as i32);

    for t in 0..BOX_THICKNESS {
      let (w, h) = (
        rect.width.saturating_sub(2 * t),
        rect.height.saturating_sub(2 * t),
      );
      if w == 0 || h == 0 {
        break;
      }
      draw_hollow_rect_mut(image, Rect::at(x + t as i32, y + t as i32).of_size(w, h), color);
    }

    self.draw_label(
      image,
      x,
      y - DISTANCE_LABEL_OFFSET,
      &format!("{}: {:.1}mm", detection.color, detection.distance_mm),
      color,
    );
    self.draw_label(
      image,
      x,
      y - ANGLE_LABEL_OFFSET,
      &format!("ang {:.1}deg", detection.angle_deg()),
      color,
    );
  }

  fn draw_label(&self, image: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>) {
    if let Some(font) = &self.font {
      let scale = PxScale::from(self.font_size);
      draw_text_mut(image, color, x.max(0), y.max(0), scale, font, text);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::PixelRect;

  fn result() -> SteeringResult {
    SteeringResult {
      blue: Some(Detection {
        color: TargetColor::Blue,
        rect: PixelRect::new(10, 12, 30, 20),
        distance_mm: 450.0,
        angle_rad: 0.1,
      }),
      red: None,
      steering_deg: -14,
    }
  }

  #[test]
  fn draws_two_pixel_box_in_target_color() {
    let mut image = RgbImage::new(64, 48);
    Draw::default().annotate(&mut image, &result());

    let blue = box_color(TargetColor::Blue);
    assert_eq!(image.get_pixel(10, 12), &blue);
    assert_eq!(image.get_pixel(11, 13), &blue);
    assert_eq!(image.get_pixel(39, 31), &blue);
    assert_eq!(image.get_pixel(25, 22), &Rgb([0, 0, 0]));
  }

  #[test]
  fn no_font_means_no_text() {
    let mut image = RgbImage::new(64, 48);
    let empty = SteeringResult {
      blue: None,
      red: None,
      steering_deg: 0,
    };
    Draw::default().annotate(&mut image, &empty);
    assert!(image.pixels().all(|p| *p == Rgb([0, 0, 0])));
  }

  #[test]
  fn invalid_font_file_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("broken.ttf");
    std::fs::write(&path, b"not a font").expect("write");
    assert!(matches!(
      Draw::with_font_file(&path),
      Err(DrawError::InvalidFont(_))
    ));
  }
}
