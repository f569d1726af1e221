// 该文件是 Xunse （寻色） 项目的一部分。
// src/input/v4l_input.rs - V4L 摄像头输入
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

//! # V4L 摄像头输入
//!
//! URL 格式：`v4l:///dev/video0?width=1280&height=720&fourcc=YUYV`
//!
//! 支持 `RGB3`、`YUYV`、`MJPG` 三种像素格式，统一转换为 RGB。
//! 采集失败时记录错误并结束迭代，由上层任务退出循环。

use std::time::Instant;

use image::{ImageFormat, RgbImage};
use ouroboros::self_referencing;
use thiserror::Error;
use tracing::{error, info, warn};
use url::Url;
use v4l::{
  Device, FourCC,
  buffer::Type,
  io::{mmap::Stream, traits::CaptureStream},
  video::Capture,
};

use crate::{FromUrl, FromUrlWithScheme, frame::Frame, query_value};

const V4L_DEFAULT_DEVICE: &str = "/dev/video0";
const V4L_BUFFER_COUNT: u32 = 4;

#[derive(Error, Debug)]
pub enum V4lInputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("参数无效: {0}")]
  InvalidParameter(String),
  #[error("不支持的像素格式: {0}")]
  UnsupportedPixelFormat(String),
  #[error("帧数据长度不足: 期望 {expected}, 实际 {actual}")]
  BufferTooShort { expected: usize, actual: usize },
  #[error("MJPG 解码错误: {0}")]
  DecodeError(#[from] image::ImageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
  Rgb3,
  Yuyv,
  Mjpg,
}

impl PixelFormat {
  pub fn fourcc(&self) -> FourCC {
    match self {
      PixelFormat::Rgb3 => FourCC::new(b"RGB3"),
      PixelFormat::Yuyv => FourCC::new(b"YUYV"),
      PixelFormat::Mjpg => FourCC::new(b"MJPG"),
    }
  }

  pub fn from_fourcc(fourcc: &[u8; 4]) -> Option<Self> {
    match fourcc {
      b"RGB3" => Some(PixelFormat::Rgb3),
      b"YUYV" => Some(PixelFormat::Yuyv),
      b"MJPG" => Some(PixelFormat::Mjpg),
      _ => None,
    }
  }

  /// 把一帧原始数据转换为 RGB 图像
  pub fn to_rgb(&self, data: &[u8], width: u32, height: u32) -> Result<RgbImage, V4lInputError> {
    match self {
      PixelFormat::Rgb3 => {
        let expected = width as usize * height as usize * 3;
        if data.len() < expected {
          return Err(V4lInputError::BufferTooShort {
            expected,
            actual: data.len(),
          });
        }
        RgbImage::from_raw(width, height, data[..expected].to_vec()).ok_or(
          V4lInputError::BufferTooShort {
            expected,
            actual: data.len(),
          },
        )
      }
      PixelFormat::Yuyv => yuyv_to_rgb(data, width, height),
      PixelFormat::Mjpg => {
        Ok(image::load_from_memory_with_format(data, ImageFormat::Jpeg)?.to_rgb8())
      }
    }
  }
}

/// YUYV 4:2:2 转 RGB，系数为 BT.601
pub fn yuyv_to_rgb(data: &[u8], width: u32, height: u32) -> Result<RgbImage, V4lInputError> {
  let expected = width as usize * height as usize * 2;
  if width % 2 != 0 {
    return Err(V4lInputError::InvalidParameter(format!(
      "YUYV 宽度必须为偶数: {}",
      width
    )));
  }
  if data.len() < expected {
    return Err(V4lInputError::BufferTooShort {
      expected,
      actual: data.len(),
    });
  }

  let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
  for chunk in data[..expected].chunks_exact(4) {
    let (y0, u, y1, v) = (chunk[0], chunk[1], chunk[2], chunk[3]);
    rgb.extend_from_slice(&yuv_to_rgb(y0, u, v));
    rgb.extend_from_slice(&yuv_to_rgb(y1, u, v));
  }

  RgbImage::from_raw(width, height, rgb).ok_or(V4lInputError::BufferTooShort {
    expected,
    actual: data.len(),
  })
}

fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
  let y = y as f32;
  let u = u as f32 - 128.0;
  let v = v as f32 - 128.0;
  let r = y + 1.402 * v;
  let g = y - 0.344_136 * u - 0.714_136 * v;
  let b = y + 1.772 * u;
  [
    r.round().clamp(0.0, 255.0) as u8,
    g.round().clamp(0.0, 255.0) as u8,
    b.round().clamp(0.0, 255.0) as u8,
  ]
}

#[self_referencing]
struct V4lStream {
  device: Device,
  #[borrows(device)]
  #[covariant]
  stream: Stream<'this>,
}

pub struct V4lInput {
  device_path: String,
  width: u32,
  height: u32,
  format: PixelFormat,
  state: V4lStream,
  frame_index: u64,
  started: Instant,
}

impl FromUrlWithScheme for V4lInput {
  const SCHEME: &'static str = "v4l";
}

fn parse_query<T: std::str::FromStr>(url: &Url, key: &str) -> Result<Option<T>, V4lInputError> {
  query_value(url, key)
    .map(|v| {
      v.parse()
        .map_err(|_| V4lInputError::InvalidParameter(format!("{}={}", key, v)))
    })
    .transpose()
}

impl FromUrl for V4lInput {
  type Error = V4lInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI 方案不匹配: 期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(V4lInputError::SchemeMismatch);
    }

    let device_path = if url.path().is_empty() || url.path() == "/" {
      V4L_DEFAULT_DEVICE.to_string()
    } else {
      url.path().to_string()
    };
    let requested = match query_value(url, "fourcc") {
      Some(code) => {
        let bytes: [u8; 4] = code
          .as_bytes()
          .try_into()
          .map_err(|_| V4lInputError::UnsupportedPixelFormat(code.clone()))?;
        PixelFormat::from_fourcc(&bytes).ok_or(V4lInputError::UnsupportedPixelFormat(code))?
      }
      None => PixelFormat::Yuyv,
    };
    let width: Option<u32> = parse_query(url, "width")?;
    let height: Option<u32> = parse_query(url, "height")?;

    info!("打开摄像头: {}", device_path);
    let device = Device::with_path(&device_path)?;

    let mut format = device.format()?;
    if let Some(width) = width {
      format.width = width;
    }
    if let Some(height) = height {
      format.height = height;
    }
    format.fourcc = requested.fourcc();
    let format = match device.set_format(&format) {
      Ok(format) => format,
      Err(e) => {
        warn!("设置摄像头格式失败: {}, 使用设备当前格式", e);
        device.format()?
      }
    };

    let pixel_format = PixelFormat::from_fourcc(&format.fourcc.repr).ok_or_else(|| {
      V4lInputError::UnsupportedPixelFormat(String::from_utf8_lossy(&format.fourcc.repr).into())
    })?;
    if pixel_format != requested {
      warn!("摄像头不支持 {:?}, 实际使用 {:?}", requested, pixel_format);
    }

    let state = V4lStreamTryBuilder {
      device,
      stream_builder: |device| Stream::with_buffers(device, Type::VideoCapture, V4L_BUFFER_COUNT),
    }
    .try_build()?;

    info!(
      "摄像头已打开: {} {}x{} {:?}",
      device_path, format.width, format.height, pixel_format
    );

    Ok(V4lInput {
      device_path,
      width: format.width,
      height: format.height,
      format: pixel_format,
      state,
      frame_index: 0,
      started: Instant::now(),
    })
  }
}

impl V4lInput {
  fn capture_frame(&mut self) -> Result<RgbImage, V4lInputError> {
    let (format, width, height) = (self.format, self.width, self.height);
    self.state.with_stream_mut(|stream| {
      let (buf, meta) = stream.next()?;
      let used = (meta.bytesused as usize).min(buf.len());
      let data = if used > 0 { &buf[..used] } else { buf };
      format.to_rgb(data, width, height)
    })
  }
}

impl Iterator for V4lInput {
  type Item = Frame;

  fn next(&mut self) -> Option<Self::Item> {
    match self.capture_frame() {
      Ok(image) => {
        let frame = Frame::new(
          image,
          self.frame_index,
          self.started.elapsed().as_millis() as u64,
        );
        self.frame_index += 1;
        Some(frame)
      }
      Err(e) => {
        error!("摄像头采集失败: {}", e);
        None
      }
    }
  }
}

impl Drop for V4lInput {
  fn drop(&mut self) {
    info!("释放摄像头: {}", self.device_path);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::Rgb;

  #[test]
  fn yuyv_gray_maps_to_gray() {
    let data = [128u8, 128, 200, 128];
    let image = yuyv_to_rgb(&data, 2, 1).expect("convert");
    assert_eq!(image.get_pixel(0, 0), &Rgb([128, 128, 128]));
    assert_eq!(image.get_pixel(1, 0), &Rgb([200, 200, 200]));
  }

  #[test]
  fn yuyv_rejects_short_buffer() {
    let err = yuyv_to_rgb(&[0u8; 6], 2, 2).unwrap_err();
    assert!(matches!(
      err,
      V4lInputError::BufferTooShort {
        expected: 8,
        actual: 6
      }
    ));
  }

  #[test]
  fn rgb3_is_copied() {
    let data: Vec<u8> = (0..12).collect();
    let image = PixelFormat::Rgb3.to_rgb(&data, 2, 2).expect("convert");
    assert_eq!(image.get_pixel(1, 1), &Rgb([9, 10, 11]));
  }

  #[test]
  fn fourcc_round_trip_for_supported_formats() {
    for format in [PixelFormat::Rgb3, PixelFormat::Yuyv, PixelFormat::Mjpg] {
      assert_eq!(PixelFormat::from_fourcc(&format.fourcc().repr), Some(format));
    }
    assert_eq!(PixelFormat::from_fourcc(b"NV12"), None);
  }
}
