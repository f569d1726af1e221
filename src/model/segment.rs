// 该文件是 Xunse （寻色） 项目的一部分。
// src/model/segment.rs - HSV 颜色分割
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

use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, open};

use crate::config::{HUE_LIMIT, HsvRange};

/// 三个通道依次为 H、S、V 的图像
pub type HsvImage = ImageBuffer<Rgb<u8>, Vec<u8>>;

pub const MASK_ON: Luma<u8> = Luma([255]);
pub const MASK_OFF: Luma<u8> = Luma([0]);

/// RGB 转 8 位 HSV（H 取半角，范围 [0, 180)）
pub fn rgb_to_hsv(Rgb([r, g, b]): Rgb<u8>) -> [u8; 3] {
  let (r, g, b) = (r as f32, g as f32, b as f32);
  let v = r.max(g).max(b);
  let diff = v - r.min(g).min(b);

  let s = if v > 0.0 { 255.0 * diff / v } else { 0.0 };

  let h = if diff == 0.0 {
    0.0
  } else if v == r {
    60.0 * (g - b) / diff
  } else if v == g {
    120.0 + 60.0 * (b - r) / diff
  } else {
    240.0 + 60.0 * (r - g) / diff
  };
  let h = if h < 0.0 { h + 360.0 } else { h };
  let h = ((h / 2.0).round() as u16 % HUE_LIMIT as u16) as u8;

  [h, s.round() as u8, v as u8]
}

pub fn to_hsv(image: &RgbImage) -> HsvImage {
  HsvImage::from_fn(image.width(), image.height(), |x, y| {
    Rgb(rgb_to_hsv(*image.get_pixel(x, y)))
  })
}

/// 像素落在任意一个区间内即置位
pub fn in_ranges(hsv: &HsvImage, ranges: &[HsvRange]) -> GrayImage {
  GrayImage::from_fn(hsv.width(), hsv.height(), |x, y| {
    let Rgb(pixel) = *hsv.get_pixel(x, y);
    if ranges.iter().any(|range| range.contains(pixel)) {
      MASK_ON
    } else {
      MASK_OFF
    }
  })
}

/// 先闭运算填补小缺口，再开运算去除噪点，结构元为 `kernel_size` 的方形
pub fn clean_mask(mask: &GrayImage, kernel_size: u8) -> GrayImage {
  let radius = kernel_size / 2;
  if radius == 0 {
    return mask.clone();
  }
  let closed = close(mask, Norm::LInf, radius);
  open(&closed, Norm::LInf, radius)
}

pub fn build_mask(hsv: &HsvImage, ranges: &[HsvRange], kernel_size: u8) -> GrayImage {
  clean_mask(&in_ranges(hsv, ranges), kernel_size)
}
