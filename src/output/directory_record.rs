// 该文件是 Xunse （寻色） 项目的一部分。
// src/output/directory_record.rs - 目录记录输出
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

use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{Datelike, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::Frame,
  model::SteeringResult,
  output::{
    Render,
    draw::{Draw, DrawError},
  },
};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("记录序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("绘制错误: {0}")]
  DrawError(#[from] DrawError),
  #[error("帧计数器已损坏")]
  Poisoned,
}

/// 与标注图像同名的 JSON 记录
#[derive(Debug, Serialize)]
struct FrameRecord<'a> {
  index: u64,
  timestamp_ms: u64,
  #[serde(flatten)]
  result: &'a SteeringResult,
}

/// 按日期分目录保存标注帧：`<dir>/YYYY/MM/DD/HH-MM-SS-XXXX.png` + `.json`
///
/// 默认只保存有检测结果的帧，URL 带 `always` 时保存每一帧。
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  draw: Draw,
  frame_counter: Mutex<u16>,
  always: bool,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    let always = uri.query_pairs().any(|(k, _)| k == "always");

    Ok(DirectoryRecordOutput {
      directory: PathBuf::from(uri.path()),
      draw: Draw::from_url(uri)?,
      frame_counter: Mutex::new(0),
      always,
    })
  }
}

impl DirectoryRecordOutput {
  fn frame_id(&self) -> Result<u16, DirectoryRecordOutputError> {
    let mut counter = self
      .frame_counter
      .lock()
      .map_err(|_| DirectoryRecordOutputError::Poisoned)?;
    *counter = counter.wrapping_add(1);
    Ok(*counter)
  }

  fn frame_path(&self) -> Result<PathBuf, DirectoryRecordOutputError> {
    let now = Utc::now();
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    std::fs::create_dir_all(&directory)?;

    Ok(directory.join(format!(
      "{}-{:04X}.png",
      now.format("%H-%M-%S"),
      self.frame_id()?
    )))
  }
}

impl Render<Frame, SteeringResult> for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(&self, frame: &Frame, result: &SteeringResult) -> Result<(), Self::Error> {
    if !self.always && result.is_empty() {
      return Ok(());
    }

    let path = self.frame_path()?;
    self.draw.draw_result(frame, result).save(&path)?;

    let record = FrameRecord {
      index: frame.index,
      timestamp_ms: frame.timestamp_ms,
      result,
    };
    std::fs::write(
      path.with_extension("json"),
      serde_json::to_string_pretty(&record)?,
    )?;
    debug!("记录帧 {} 到 {}", frame.index, path.display());

    Ok(())
  }
}
