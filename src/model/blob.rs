// 该文件是 Xunse （寻色） 项目的一部分。
// src/model/blob.rs - 外轮廓提取与面积过滤
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

use image::GrayImage;
use imageproc::contours::{BorderType, Contour, find_contours};
use imageproc::point::Point;
use tracing::debug;

use crate::model::PixelRect;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blob {
  pub rect: PixelRect,
  /// 轮廓包围面积（像素²）
  pub area: f64,
}

/// 以边界像素中心为顶点的多边形面积（鞋带公式）
pub fn contour_area(points: &[Point<i32>]) -> f64 {
  if points.len() < 3 {
    return 0.0;
  }
  let twice: i64 = points
    .iter()
    .zip(points.iter().cycle().skip(1))
    .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
    .sum();
  twice.abs() as f64 / 2.0
}

/// 包含所有边界像素的最小矩形，宽高按像素个数计
pub fn bounding_rect(points: &[Point<i32>]) -> Option<PixelRect> {
  let first = points.first()?;
  let (mut x_min, mut y_min, mut x_max, mut y_max) = (first.x, first.y, first.x, first.y);
  for p in &points[1..] {
    x_min = x_min.min(p.x);
    y_min = y_min.min(p.y);
    x_max = x_max.max(p.x);
    y_max = y_max.max(p.y);
  }

  Some(PixelRect::new(
    x_min.max(0) as u32,
    y_min.max(0) as u32,
    (x_max - x_min + 1) as u32,
    (y_max - y_min + 1) as u32,
  ))
}

/// 只保留最外层轮廓，孔洞及孔洞内部的轮廓都被忽略
pub fn external_contours(mask: &GrayImage) -> Vec<Contour<i32>> {
  find_contours::<i32>(mask)
    .into_iter()
    .filter(|c| c.parent.is_none() && matches!(c.border_type, BorderType::Outer))
    .collect()
}

/// 面积小于 `min_area` 的轮廓被丢弃，恰好等于时保留
pub fn filter_blobs<'a>(
  contours: impl IntoIterator<Item = &'a [Point<i32>]>,
  min_area: f64,
) -> Vec<Blob> {
  contours
    .into_iter()
    .filter_map(|points| {
      let area = contour_area(points);
      if area < min_area {
        return None;
      }
      bounding_rect(points).map(|rect| Blob { rect, area })
    })
    .collect()
}

pub fn extract_blobs(mask: &GrayImage, min_area: f64) -> Vec<Blob> {
  let contours = external_contours(mask);
  let blobs = filter_blobs(contours.iter().map(|c| c.points.as_slice()), min_area);
  debug!(
    "外轮廓 {} 个，面积过滤后剩余 {} 个",
    contours.len(),
    blobs.len()
  );
  blobs
}
