// 该文件是 Xunse （寻色） 项目的一部分。
// src/output.rs - 输出定义
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

use thiserror::Error;
use tracing::{info, warn};
use url::Url;

#[cfg(any(feature = "save_image_file", feature = "directory_record"))]
use crate::FromUrlWithScheme;
use crate::{FromUrl, frame::Frame, model::SteeringResult};

pub trait Render<Frame, Output>: Sized {
  type Error;
  fn render_result(&self, frame: &Frame, result: &Output) -> Result<(), Self::Error>;
}

#[cfg(any(feature = "save_image_file", feature = "directory_record"))]
pub mod draw;

#[cfg(feature = "save_image_file")]
mod save_image_file;
#[cfg(feature = "save_image_file")]
pub use self::save_image_file::{SaveImageFileError, SaveImageFileOutput};

#[cfg(feature = "directory_record")]
mod directory_record;
#[cfg(feature = "directory_record")]
pub use self::directory_record::{DirectoryRecordOutput, DirectoryRecordOutputError};

#[cfg(feature = "serial_output")]
mod serial_output;
#[cfg(feature = "serial_output")]
pub use self::serial_output::{
  SerialOutput, SerialOutputError, SerialSettings, encode_command,
};

#[derive(Error, Debug)]
pub enum OutputError {
  #[cfg(feature = "save_image_file")]
  #[error("保存图像文件错误: {0}")]
  SaveImageFileError(#[from] SaveImageFileError),
  #[cfg(feature = "directory_record")]
  #[error("目录记录输出错误: {0}")]
  DirectoryRecordOutputError(#[from] DirectoryRecordOutputError),
  #[cfg(feature = "serial_output")]
  #[error("串口输出错误: {0}")]
  SerialOutputError(#[from] SerialOutputError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

/// 可视化输出
pub enum OutputWrapper {
  #[cfg(feature = "save_image_file")]
  SaveImageFileOutput(SaveImageFileOutput),
  #[cfg(feature = "directory_record")]
  DirectoryRecordOutput(DirectoryRecordOutput),
}

impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      #[cfg(feature = "save_image_file")]
      SaveImageFileOutput::SCHEME => {
        let output = SaveImageFileOutput::from_url(url)?;
        Ok(OutputWrapper::SaveImageFileOutput(output))
      }
      #[cfg(feature = "directory_record")]
      DirectoryRecordOutput::SCHEME => {
        let output = DirectoryRecordOutput::from_url(url)?;
        Ok(OutputWrapper::DirectoryRecordOutput(output))
      }
      scheme => Err(OutputError::SchemeMismatch(scheme.to_string())),
    }
  }
}

impl Render<Frame, SteeringResult> for OutputWrapper {
  type Error = OutputError;

  fn render_result(&self, frame: &Frame, result: &SteeringResult) -> Result<(), Self::Error> {
    match self {
      #[cfg(feature = "save_image_file")]
      OutputWrapper::SaveImageFileOutput(output) => output
        .render_result(frame, result)
        .map_err(OutputError::from),
      #[cfg(feature = "directory_record")]
      OutputWrapper::DirectoryRecordOutput(output) => output
        .render_result(frame, result)
        .map_err(OutputError::from),
    }
  }
}

/// 可视化输出与串口执行器的组合
///
/// 字段按声明顺序释放：先可视化输出，后串口。
pub struct OutputSet<V = OutputWrapper> {
  visual: Vec<V>,
  #[cfg(feature = "serial_output")]
  actuator: Option<SerialOutput>,
}

impl OutputSet {
  /// 串口打不开时只告警，其余输出照常工作
  pub fn from_urls(serial: Option<&Url>, outputs: &[Url]) -> Result<Self, OutputError> {
    let visual = outputs
      .iter()
      .map(OutputWrapper::from_url)
      .collect::<Result<Vec<_>, _>>()?;

    let mut set = OutputSet::new(visual);
    if let Some(url) = serial {
      set.attach_serial(url)?;
    }

    info!("可视化输出 {} 个", set.visual.len());
    Ok(set)
  }
}

impl<V> OutputSet<V> {
  pub fn new(visual: Vec<V>) -> Self {
    OutputSet {
      visual,
      #[cfg(feature = "serial_output")]
      actuator: None,
    }
  }

  #[cfg(feature = "serial_output")]
  pub fn with_actuator(mut self, actuator: SerialOutput) -> Self {
    self.actuator = Some(actuator);
    self
  }

  #[cfg(feature = "serial_output")]
  fn attach_serial(&mut self, url: &Url) -> Result<(), OutputError> {
    let settings = SerialSettings::from_url(url)?;
    match SerialOutput::open(settings) {
      Ok(port) => self.actuator = Some(port),
      Err(e) => warn!("无法打开串口，转向指令将不会发送: {}", e),
    }
    Ok(())
  }

  #[cfg(not(feature = "serial_output"))]
  fn attach_serial(&mut self, url: &Url) -> Result<(), OutputError> {
    Err(OutputError::SchemeMismatch(url.scheme().to_string()))
  }

  pub fn has_actuator(&self) -> bool {
    #[cfg(feature = "serial_output")]
    {
      self.actuator.is_some()
    }
    #[cfg(not(feature = "serial_output"))]
    {
      false
    }
  }

  pub fn is_empty(&self) -> bool {
    self.visual.is_empty() && !self.has_actuator()
  }
}

/// 先发送转向指令，再写可视化输出；任何一路失败都只告警，不中断任务
impl<V> Render<Frame, SteeringResult> for OutputSet<V>
where
  V: Render<Frame, SteeringResult>,
  V::Error: std::fmt::Display,
{
  type Error = OutputError;

  fn render_result(&self, frame: &Frame, result: &SteeringResult) -> Result<(), Self::Error> {
    #[cfg(feature = "serial_output")]
    if let Some(actuator) = &self.actuator
      && let Err(e) = actuator.render_result(frame, result)
    {
      warn!("串口写入失败，跳过第 {} 帧: {}", frame.index, e);
    }

    for (i, output) in self.visual.iter().enumerate() {
      if let Err(e) = output.render_result(frame, result) {
        warn!("第 {} 个可视化输出失败，跳过第 {} 帧: {}", i, frame.index, e);
      }
    }
    Ok(())
  }
}
